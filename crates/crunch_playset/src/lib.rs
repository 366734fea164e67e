//! Types and loaders for playset exports.
//!
//! A playset is the ordered list of mods the launcher has enabled, as exported
//! from its data store. The indexer never talks to the data store directly; it
//! consumes one of these exports (JSON or TOML) and converts every row into a
//! strongly typed item at its own boundary.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Errors that can occur while loading a playset export.
#[derive(Error, Debug)]
pub enum PlaysetError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported playset format: {0} (expected .json or .toml)")]
    UnsupportedFormat(Utf8PathBuf),
}

/// Tags as stored by the launcher.
///
/// The launcher database keeps tags as a JSON-encoded string (`"[\"Graphics\"]"`),
/// hand-written exports usually use a plain array. Both are accepted.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(untagged)]
pub enum EntryTags {
    List(Vec<String>),
    Encoded(String),
}

impl Default for EntryTags {
    fn default() -> Self {
        EntryTags::List(Vec::new())
    }
}

impl EntryTags {
    /// Returns the tags as a flat list, decoding the string form if needed.
    ///
    /// A string that is not a JSON array is treated as a single tag.
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            EntryTags::List(tags) => tags.clone(),
            EntryTags::Encoded(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Vec::new();
                }
                serde_json::from_str::<Vec<String>>(trimmed)
                    .unwrap_or_else(|_| vec![trimmed.to_string()])
            }
        }
    }
}

/// One row of a playset export.
///
/// Every field is optional here: rows come from an external store and are
/// validated when they are converted into indexer items, not while parsing.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaysetEntry {
    /// Human readable mod name.
    ///
    /// Example: `Extra Doll House`
    pub display_name: Option<String>,

    /// Directory the mod was installed to.
    pub dir_path: Option<Utf8PathBuf>,

    /// Archive the mod ships as, when the launcher did not unpack it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_path: Option<Utf8PathBuf>,

    /// Remote (workshop) id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steam_id: Option<String>,

    /// Launcher registry id, e.g. `mod/ugc_1688887083.mod`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_registry_id: Option<String>,

    /// Position inside the playset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_order: Option<u32>,

    pub tags: EntryTags,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub playset_id: Option<String>,

    /// Name of the playset the row was exported from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// An ordered playset.
///
/// Row order is significant: it is the load order, and later rows shadow
/// earlier ones when the indexer merges them.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
pub struct Playset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub mods: Vec<PlaysetEntry>,
}

/// On-disk shapes accepted for a playset export.
#[derive(Deserialize)]
#[serde(untagged)]
enum PlaysetFile {
    Rows(Vec<PlaysetEntry>),
    Named(Playset),
}

impl From<PlaysetFile> for Playset {
    fn from(file: PlaysetFile) -> Self {
        match file {
            PlaysetFile::Rows(mods) => Playset { name: None, mods },
            PlaysetFile::Named(playset) => playset,
        }
    }
}

impl Playset {
    /// Parse a JSON export, either a bare array of rows or `{ "name", "mods" }`.
    pub fn from_json_str(contents: &str) -> Result<Self, PlaysetError> {
        let file: PlaysetFile = serde_json::from_str(contents.trim_start_matches('\u{feff}'))?;
        Ok(file.into())
    }

    /// Parse a TOML export (`name = ...` plus `[[mods]]` tables).
    pub fn from_toml_str(contents: &str) -> Result<Self, PlaysetError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load an export from disk, picking the parser from the file extension.
    pub fn load(path: &Utf8Path) -> Result<Self, PlaysetError> {
        let contents = std::fs::read_to_string(path.as_std_path())?;
        match path.extension().map(|e| e.to_ascii_lowercase()).as_deref() {
            Some("json") => Self::from_json_str(&contents),
            Some("toml") => Self::from_toml_str(&contents),
            _ => Err(PlaysetError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }
}
