//! Per-item identifier metadata.
//!
//! After an item is sequenced, a [`CrunchFile`] is written as
//! `.crunchfile.json` into the item's source directory. On the next run the
//! sequencer loads it and reuses the recorded abbreviation instead of deriving
//! one again, so identifiers stay stable even when the derivation rules or the
//! set of colliding items change.
//!
//! # JSON format
//!
//! ```json
//! {
//!   "version": 1,
//!   "abbrev": "EDH-1688887083",
//!   "cleanName": "Extra Doll House",
//!   "pools": {
//!     "merge": { "sequence": "000001", "abbrev": "EDH-1688887083", "identifier": "000001-[EDH-1688887083]" }
//!   }
//! }
//! ```

use crate::error::{io_at, Result};
use crate::pool::PoolKind;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// File name of the metadata record inside an item's source directory.
pub const CRUNCHFILE_NAME: &str = ".crunchfile.json";

const CRUNCHFILE_VERSION: u32 = 1;

/// Assignment of an item within one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolAssignment {
    pub sequence: String,
    pub abbrev: String,
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrunchFile {
    pub version: u32,
    /// Abbreviation derived on first sight, before any pool disambiguation.
    /// Pools that had to disambiguate keep their own in [`PoolAssignment`].
    pub abbrev: String,
    pub clean_name: String,
    #[serde(default)]
    pub pools: BTreeMap<PoolKind, PoolAssignment>,
}

impl CrunchFile {
    pub fn new(abbrev: impl Into<String>, clean_name: impl Into<String>) -> Self {
        Self {
            version: CRUNCHFILE_VERSION,
            abbrev: abbrev.into(),
            clean_name: clean_name.into(),
            pools: BTreeMap::new(),
        }
    }

    /// Load the record from a source directory.
    ///
    /// Returns `Ok(None)` if the directory has no record.
    pub fn load(source_dir: &Utf8Path) -> Result<Option<Self>> {
        let path = source_dir.join(CRUNCHFILE_NAME);
        if !path.as_std_path().is_file() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path.as_std_path()).map_err(io_at(&path))?;
        let record: Self = serde_json::from_str(&contents)?;
        Ok(Some(record))
    }

    /// Write the record into a source directory.
    pub fn save(&self, source_dir: &Utf8Path) -> Result<()> {
        let path = source_dir.join(CRUNCHFILE_NAME);
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_std_path(), contents).map_err(io_at(&path))?;
        Ok(())
    }

    /// Abbreviation to reuse in `pool`: the pool's own, else the first-derived one.
    pub fn abbrev_for(&self, pool: PoolKind) -> &str {
        self.pools
            .get(&pool)
            .map(|a| a.abbrev.as_str())
            .unwrap_or(&self.abbrev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_returns_none() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        assert!(CrunchFile::load(&root).unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        let mut record = CrunchFile::new("EDH-1688887083", "Extra Doll House");
        record.pools.insert(
            PoolKind::Merge,
            PoolAssignment {
                sequence: "000001".to_string(),
                abbrev: "EDH-1688887083~2".to_string(),
                identifier: "000001-[EDH-1688887083~2]".to_string(),
            },
        );
        record.save(&root).unwrap();

        let loaded = CrunchFile::load(&root).unwrap().unwrap();
        assert_eq!(loaded, record);
        assert_eq!(loaded.abbrev_for(PoolKind::Merge), "EDH-1688887083~2");
        assert_eq!(loaded.abbrev_for(PoolKind::Standalone), "EDH-1688887083");
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::write(root.join(CRUNCHFILE_NAME), "{ not json").unwrap();

        assert!(CrunchFile::load(&root).is_err());
    }
}
