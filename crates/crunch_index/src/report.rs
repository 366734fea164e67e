//! The run report, persisted as `crunch.json` in the report directory.
//!
//! # JSON format
//!
//! ```json
//! {
//!   "version": 1,
//!   "rootOverrides": {
//!     "common/x.txt": { "item": "ModA", "identifier": "000002-[MA-unregistered]", "modFile": "...", "indexFile": "..." }
//!   },
//!   "includedMedia": ["/mods/a/gfx/icon.dds"],
//!   "indexedMods": { "merge": { "ModA": { "sequence": "000002", ... } } },
//!   "mergeManifest": [{ "name": "ModA", "sequence": "000002", ... }]
//! }
//! ```

use crate::error::{io_at, Result};
use crate::item::{ItemKind, SequencedItem};
use crate::munger::OverrideMap;
use crate::pool::PoolKind;
use crate::quarantine::Relocation;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// File name of the report inside the report directory.
pub const REPORT_FILE_NAME: &str = "crunch.json";

const REPORT_VERSION: u32 = 1;

/// An item as it was indexed into one pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedEntry {
    pub name: String,
    pub clean_name: String,
    pub kind: ItemKind,
    pub sequence: String,
    pub identifier: String,
    pub registry_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_order_position: Option<u32>,
    pub source_path: Utf8PathBuf,
    pub effective_source: Utf8PathBuf,
    pub destination_root: Utf8PathBuf,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub replaced_files: Vec<Relocation>,
}

impl From<&SequencedItem> for IndexedEntry {
    fn from(sequenced: &SequencedItem) -> Self {
        let item = &sequenced.item;
        Self {
            name: item.display_name.clone(),
            clean_name: item.clean_name.clone(),
            kind: item.kind,
            sequence: sequenced.sequence.clone(),
            identifier: sequenced.identifier.clone(),
            registry_id: item.registry_id.clone(),
            remote_id: item.remote_id.clone(),
            load_order_position: item.load_order_position,
            source_path: item.source_path.clone(),
            effective_source: sequenced.effective_source.clone(),
            destination_root: sequenced.destination_root.clone(),
            tags: item.tags.clone(),
            categories: sequenced.categories.clone(),
            replaced_files: sequenced.replaced_files.clone(),
        }
    }
}

/// One line of the merge manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub name: String,
    pub version: Option<String>,
    pub sequence: String,
    pub identifier: String,
    pub reference_url: Option<String>,
    pub picture_link: Option<String>,
}

impl From<&SequencedItem> for ManifestEntry {
    fn from(sequenced: &SequencedItem) -> Self {
        let item = &sequenced.item;
        Self {
            name: item.display_name.clone(),
            version: item.version.clone(),
            sequence: sequenced.sequence.clone(),
            identifier: sequenced.identifier.clone(),
            reference_url: item.reference_url(),
            picture_link: item.picture.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrunchReport {
    pub version: u32,
    pub root_overrides: OverrideMap,
    pub included_media: Vec<Utf8PathBuf>,
    pub indexed_mods: BTreeMap<PoolKind, BTreeMap<String, IndexedEntry>>,
    pub merge_manifest: Vec<ManifestEntry>,
}

impl Default for CrunchReport {
    fn default() -> Self {
        Self {
            version: REPORT_VERSION,
            root_overrides: OverrideMap::new(),
            included_media: Vec::new(),
            indexed_mods: BTreeMap::new(),
            merge_manifest: Vec::new(),
        }
    }
}

impl CrunchReport {
    /// Load a report.
    ///
    /// Returns `Ok(None)` if the file doesn't exist.
    pub fn load(path: &Utf8Path) -> Result<Option<Self>> {
        if !path.as_std_path().exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path.as_std_path()).map_err(io_at(path))?;
        let report: Self = serde_json::from_str(&contents)?;
        Ok(Some(report))
    }

    /// Save the report, creating parent directories if needed.
    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent.as_std_path()).map_err(io_at(parent))?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_std_path(), contents).map_err(io_at(path))?;
        Ok(())
    }

    /// Number of items indexed into `pool`.
    pub fn pool_len(&self, pool: PoolKind) -> usize {
        self.indexed_mods.get(&pool).map_or(0, BTreeMap::len)
    }
}
