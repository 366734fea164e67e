//! Deterministic symlink overlay indexer for moddable game installs.
//!
//! This crate composes a base game install with an ordered list of mods into
//! one merged directory tree made entirely of symbolic links. No file content
//! is copied. It provides:
//!
//! - **Sequencing**: stable, pool-unique identifiers per item, persisted next
//!   to each item's source so reruns reproduce them
//! - **Munging**: identifier-prefixed names for mod files, natural names for
//!   assets and, with `nomunge`, for deliberate base overrides
//! - **Quarantine**: occupied destinations are moved aside, never overwritten
//! - **Reporting**: overrides, included media, indexed items and a merge
//!   manifest in `crunch/crunch.json`
//!
//! # Example
//!
//! ```no_run
//! use crunch_index::{CrunchBuilder, CrunchConfig, Item};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CrunchConfig::new(
//!     "C:/SteamHome/steamapps/common/Stellaris".into(),
//!     "C:/StellarisIndex".into(),
//! );
//!
//! let mut builder = CrunchBuilder::new(config).with_progress(|progress| {
//!     println!("Stage: {:?}, Progress: {}/{}",
//!         progress.stage, progress.current, progress.total);
//! });
//!
//! builder.set_playset(vec![Item::new("Extra Doll House", "C:/mods/edh")]);
//!
//! let result = builder.build()?;
//! println!("Indexed {}, skipped {}", result.indexed, result.skipped);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod collaborators;
pub mod config;
pub mod crunchfile;
pub mod error;
pub mod item;
pub mod munger;
pub mod pool;
pub mod quarantine;
pub mod report;
pub mod run;
pub mod sequencer;
pub mod utils;
pub mod walker;


// Re-export main types
pub use builder::{CrunchBuildResult, CrunchBuilder, CrunchProgress, CrunchStage};
pub use collaborators::{ArchiveExtractor, ThumbnailRenderer};
pub use config::{CrunchConfig, OutputLayout};
pub use crunchfile::CrunchFile;
pub use error::{Error, Result};
pub use item::{clean_file_system_name, items_from_playset, Item, ItemKind, SequencedItem};
pub use munger::{AssetSet, Munger, OverrideRecord, Resolution};
pub use pool::{PadStyle, PoolConfig, PoolKind};
pub use quarantine::{CollisionGuard, Eviction, Relocation};
pub use report::{CrunchReport, IndexedEntry, ManifestEntry};
pub use run::RunContext;
pub use sequencer::{derive_abbreviation, Sequencer};
pub use walker::{DirectoryWalker, EntryKind, WalkStats};
