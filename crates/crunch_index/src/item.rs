//! Items: the base install and the mods being indexed.
//!
//! Rows from the external item list arrive as loosely typed
//! [`PlaysetEntry`] values. They are validated once, here, and turned into
//! [`Item`]s; nothing past this module sees a partial record.

use crate::error::{Error, Result};
use crate::quarantine::Relocation;
use crate::pool::PoolKind;
use camino::{Utf8Path, Utf8PathBuf};
use crunch_playset::{Playset, PlaysetEntry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Registry id used when the item list does not provide one.
pub const UNREGISTERED: &str = "unregistered";

/// Marker file that excludes an item from indexing.
pub const SKIP_MARKER: &str = ".skip";

/// Longest clean name kept, in characters.
pub const MAX_CLEAN_NAME_LEN: usize = 240;

const WORKSHOP_URL: &str = "https://steamcommunity.com/sharedfiles/filedetails/?id=";

/// Characters that are not allowed in file names on at least one platform.
const INVALID_NAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Strip characters that are invalid in file names and cap the length.
pub fn clean_file_system_name(name: &str) -> String {
    name.chars()
        .filter(|c| !INVALID_NAME_CHARS.contains(c) && !c.is_control())
        .take(MAX_CLEAN_NAME_LEN)
        .collect::<String>()
        .trim()
        .to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    /// The unmodded game install every mod is compared against.
    Base,
    Mod,
}

/// A base install or a single mod.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub kind: ItemKind,
    pub display_name: String,
    /// Filesystem-safe form of `display_name`.
    pub clean_name: String,
    pub source_path: Utf8PathBuf,
    pub archive_path: Option<Utf8PathBuf>,
    pub registry_id: String,
    pub remote_id: Option<String>,
    pub load_order_position: Option<u32>,
    pub tags: Vec<String>,
    pub version: Option<String>,
    pub picture: Option<String>,
    /// Abbreviation fixed up front instead of derived (the base install).
    pub preset_abbreviation: Option<String>,
}

impl Item {
    /// A mod item with only the required fields set.
    pub fn new(display_name: impl Into<String>, source_path: impl Into<Utf8PathBuf>) -> Self {
        let display_name = display_name.into();
        Self {
            kind: ItemKind::Mod,
            clean_name: clean_file_system_name(&display_name),
            display_name,
            source_path: source_path.into(),
            archive_path: None,
            registry_id: UNREGISTERED.to_string(),
            remote_id: None,
            load_order_position: None,
            tags: Vec::new(),
            version: None,
            picture: None,
            preset_abbreviation: None,
        }
    }

    /// The base install item.
    pub fn base(
        name: impl Into<String>,
        game_root: impl Into<Utf8PathBuf>,
        abbreviation: impl Into<String>,
    ) -> Self {
        Self {
            kind: ItemKind::Base,
            preset_abbreviation: Some(abbreviation.into()),
            ..Self::new(name, game_root)
        }
    }

    /// Validate a playset row and convert it.
    ///
    /// Rows without a display name or directory are rejected; a missing
    /// registry id defaults to [`UNREGISTERED`].
    pub fn from_entry(entry: &PlaysetEntry) -> Result<Self> {
        let display_name = entry
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::InvalidItemRecord("missing displayName".to_string()))?;

        let source_path = entry
            .dir_path
            .clone()
            .filter(|p| !p.as_str().is_empty())
            .ok_or_else(|| {
                Error::InvalidItemRecord(format!("'{}' is missing dirPath", display_name))
            })?;

        let mut item = Self::new(display_name, source_path);
        if item.clean_name.is_empty() {
            return Err(Error::InvalidItemRecord(format!(
                "'{}' has no usable characters for a file name",
                display_name
            )));
        }

        item.archive_path = entry.archive_path.clone();
        item.registry_id = non_empty(entry.game_registry_id.as_deref())
            .unwrap_or(UNREGISTERED)
            .to_string();
        item.remote_id = non_empty(entry.steam_id.as_deref()).map(str::to_string);
        item.load_order_position = entry.position.or(entry.load_order);
        item.tags = entry.tags.to_vec();
        item.version = non_empty(entry.version.as_deref()).map(str::to_string);
        item.picture = non_empty(entry.thumbnail_url.as_deref()).map(str::to_string);
        Ok(item)
    }

    /// Token combined with the abbreviation: the remote id, else the registry id.
    pub fn id_token(&self) -> &str {
        self.remote_id.as_deref().unwrap_or(&self.registry_id)
    }

    /// Public page of the item, when it has a remote id.
    pub fn reference_url(&self) -> Option<String> {
        self.remote_id
            .as_ref()
            .map(|id| format!("{}{}", WORKSHOP_URL, id))
    }

    pub fn is_base(&self) -> bool {
        self.kind == ItemKind::Base
    }

    /// Whether the item's source carries a [`SKIP_MARKER`].
    pub fn has_skip_marker(&self) -> bool {
        self.source_path.join(SKIP_MARKER).as_std_path().exists()
    }
}

impl TryFrom<&PlaysetEntry> for Item {
    type Error = Error;

    fn try_from(entry: &PlaysetEntry) -> Result<Self> {
        Item::from_entry(entry)
    }
}

/// Convert every row of a playset, keeping its order.
///
/// The first invalid row fails the whole list, naming its position.
pub fn items_from_playset(playset: &Playset) -> Result<Vec<Item>> {
    playset
        .mods
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            Item::from_entry(entry).map_err(|e| match e {
                Error::InvalidItemRecord(msg) => {
                    Error::InvalidItemRecord(format!("row {}: {}", index, msg))
                }
                other => other,
            })
        })
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Which allow-listed content categories exist as directories under `root`.
pub fn content_categories_present(root: &Utf8Path, categories: &[String]) -> BTreeSet<String> {
    categories
        .iter()
        .filter(|c| root.join(c.as_str()).as_std_path().is_dir())
        .cloned()
        .collect()
}

/// An item after a [`Sequencer`](crate::Sequencer) placed it in a pool.
#[derive(Debug, Clone)]
pub struct SequencedItem {
    pub item: Item,
    pub pool: PoolKind,
    /// Zero-padded ordinal within the pool.
    pub sequence: String,
    pub abbreviation: String,
    /// `{sequence}-[{abbreviation}]`, unique within the pool.
    pub identifier: String,
    pub destination_root: Utf8PathBuf,
    /// Where content is read from: the source path, or the extraction output.
    pub effective_source: Utf8PathBuf,
    pub categories: BTreeSet<String>,
    /// Occupants this item pushed into quarantine.
    pub replaced_files: Vec<Relocation>,
}
