//! Run configuration and output layout.

use crate::pool::{PadStyle, PoolConfig, PoolKind};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Content categories the walker descends into, in walk order.
///
/// These are the directories the game engine loads and that can meaningfully
/// collide between mods. Anything else under an item's root is ignored.
pub const DEFAULT_CONTENT_CATEGORIES: &[&str] = &[
    "common",
    "events",
    "prescripted_countries",
    "map",
    "flags",
    "interface",
    "gfx",
    "music",
    "sound",
    "locales",
    "localisation",
    "fonts",
];

/// Binary/media formats referenced by literal path from game scripts.
pub const DEFAULT_ASSET_EXTENSIONS: &[&str] = &[
    "dds", "tga", "png", "jpg", "jpeg", "bmp", "gif", "psd", "ogg", "wav", "mp3", "flac", "mesh",
    "anim", "bk2", "ttf", "otf", "fnt", "cur", "ani", "ico",
];

/// Asset formats a thumbnail can be rendered for.
pub const VISUAL_ASSET_EXTENSIONS: &[&str] = &["dds", "tga", "png", "jpg", "jpeg", "bmp"];

/// Configuration of a single indexing run.
///
/// Every field has a default, so a partial TOML table is enough:
///
/// ```toml
/// game_root = "C:/SteamHome/steamapps/common/Stellaris"
/// output_root = "C:/StellarisIndex"
/// nomunge = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CrunchConfig {
    /// Base game install. Must exist.
    pub game_root: Utf8PathBuf,
    /// Directory all pools, links, and the report are written under.
    pub output_root: Utf8PathBuf,
    /// Game documents directory, linked from `links/` for convenience.
    pub documents_root: Option<Utf8PathBuf>,
    /// Game log directory, linked from `links/` for convenience.
    pub logs_root: Option<Utf8PathBuf>,

    /// Display name of the base item.
    pub base_name: String,
    /// Fixed abbreviation of the base item.
    pub base_abbreviation: String,

    /// Shared subdirectory of the merge pool (empty: the pool root itself).
    pub merge_root_name: String,
    /// Keep natural names for mod files that shadow a base-install file.
    pub nomunge: bool,
    /// Quarantine a previous merge tree wholesale before indexing.
    pub clean_merge: bool,
    /// Overwrite files already present in an extraction directory.
    pub overwrite_extracted: bool,

    pub thumbnails: bool,
    pub thumbnail_size: u32,

    pub content_categories: Vec<String>,
    pub asset_extensions: Vec<String>,

    pub standalone_pad: PadStyle,
    pub all_pad: PadStyle,
    pub merge_pad: PadStyle,
}

impl Default for CrunchConfig {
    fn default() -> Self {
        Self {
            game_root: Utf8PathBuf::new(),
            output_root: Utf8PathBuf::from("crunch-index"),
            documents_root: None,
            logs_root: None,
            base_name: "Stellaris".to_string(),
            base_abbreviation: "STELLA".to_string(),
            merge_root_name: String::new(),
            nomunge: false,
            clean_merge: false,
            overwrite_extracted: false,
            thumbnails: false,
            thumbnail_size: 400,
            content_categories: DEFAULT_CONTENT_CATEGORIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            asset_extensions: DEFAULT_ASSET_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            standalone_pad: PadStyle::new('0', 6),
            all_pad: PadStyle::new('X', 6),
            merge_pad: PadStyle::new('0', 6),
        }
    }
}

impl CrunchConfig {
    pub fn new(game_root: Utf8PathBuf, output_root: Utf8PathBuf) -> Self {
        Self {
            game_root,
            output_root,
            ..Default::default()
        }
    }

    /// Pool configuration for `kind` under the given output layout.
    pub fn pool_config(&self, kind: PoolKind, layout: &OutputLayout) -> PoolConfig {
        match kind {
            PoolKind::Standalone => {
                PoolConfig::new(kind, layout.standalone.clone(), self.standalone_pad)
            }
            PoolKind::AllInstalled => PoolConfig::new(kind, layout.all.clone(), self.all_pad),
            PoolKind::Merge => PoolConfig {
                merge_root_name: Some(self.merge_root_name.clone()),
                nomunge: self.nomunge,
                ..PoolConfig::new(kind, layout.merge.clone(), self.merge_pad)
            },
        }
    }
}

/// Directory layout of the output root.
///
/// ```text
/// output_root/
///   mod/            standalone pool (one link per playset item)
///   all/            all-installed pool
///   merge/          merged tree
///   crunch/         report
///   links/          convenience links to the install, documents, logs
///   extracted/      archive extraction staging
///   thumbnails/     rendered asset previews
///   .quarantine/    previous merge trees
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub root: Utf8PathBuf,
    pub standalone: Utf8PathBuf,
    pub all: Utf8PathBuf,
    pub merge: Utf8PathBuf,
    pub report: Utf8PathBuf,
    pub links: Utf8PathBuf,
    pub extracted: Utf8PathBuf,
    pub thumbnails: Utf8PathBuf,
}

impl OutputLayout {
    pub fn new(root: &Utf8Path) -> Self {
        Self {
            root: root.to_path_buf(),
            standalone: root.join("mod"),
            all: root.join("all"),
            merge: root.join("merge"),
            report: root.join("crunch"),
            links: root.join("links"),
            extracted: root.join("extracted"),
            thumbnails: root.join("thumbnails"),
        }
    }

    /// Directories created during output preparation.
    pub fn directories(&self) -> [&Utf8PathBuf; 8] {
        [
            &self.root,
            &self.standalone,
            &self.all,
            &self.merge,
            &self.report,
            &self.links,
            &self.extracted,
            &self.thumbnails,
        ]
    }
}
