//! Collision quarantine.
//!
//! Nothing in the output tree is overwritten. When a destination is already
//! occupied, its occupant is moved into a `.quarantine` directory next to it,
//! under the first free name of the form `NNN.<file name>`. A link whose twin
//! (same name, same target) is already preserved there is dropped instead of
//! being moved a second time, so a rerun adds no new entries.

use crate::error::{io_at, Error, Result};
use crate::item::SequencedItem;
use crate::utils::{ensure_dir, path_occupied};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;

/// Name of the quarantine directory created beside an evicted path.
pub const QUARANTINE_DIR: &str = ".quarantine";

/// Candidate names tried before quarantining fails.
pub const MAX_QUARANTINE_ATTEMPTS: usize = 100;

/// One evicted occupant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relocation {
    pub original: Utf8PathBuf,
    pub quarantined: Utf8PathBuf,
}

/// Outcome of evicting one occupant for an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eviction {
    pub relocation: Relocation,
    /// `false` when an identical link was already preserved and the occupant
    /// was dropped.
    pub moved: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct CollisionGuard {
    max_attempts: usize,
}

impl Default for CollisionGuard {
    fn default() -> Self {
        Self {
            max_attempts: MAX_QUARANTINE_ATTEMPTS,
        }
    }
}

impl CollisionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different retry budget.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Move whatever occupies `existing` into quarantine and return its new path.
    ///
    /// Links are moved as links, so a quarantined link still points at the
    /// same source file.
    pub fn quarantine(&self, existing: &Utf8Path) -> Result<Utf8PathBuf> {
        self.place(existing).map(|(path, _)| path)
    }

    /// Quarantine `existing` and record the eviction against `evicting`.
    pub fn quarantine_for(
        &self,
        existing: &Utf8Path,
        evicting: &mut SequencedItem,
    ) -> Result<Eviction> {
        let (quarantined, moved) = self.place(existing)?;
        let relocation = Relocation {
            original: existing.to_path_buf(),
            quarantined,
        };
        evicting.replaced_files.push(relocation.clone());
        Ok(Eviction { relocation, moved })
    }

    /// Returns the quarantine path of `existing` and whether it was moved there.
    fn place(&self, existing: &Utf8Path) -> Result<(Utf8PathBuf, bool)> {
        let (Some(parent), Some(file_name)) = (existing.parent(), existing.file_name()) else {
            return Err(Error::Other(format!("Cannot quarantine {}", existing)));
        };

        let quarantine_dir = parent.join(QUARANTINE_DIR);
        ensure_dir(&quarantine_dir)?;

        let link_target = fs::read_link(existing.as_std_path()).ok();
        let mut free = None;
        for n in 0..self.max_attempts {
            let candidate = quarantine_dir.join(format!("{:03}.{}", n, file_name));
            if !path_occupied(&candidate) {
                free.get_or_insert(candidate);
                continue;
            }
            let is_twin = match (&link_target, fs::read_link(candidate.as_std_path())) {
                (Some(target), Ok(preserved)) => *target == preserved,
                _ => false,
            };
            if is_twin {
                fs::remove_file(existing.as_std_path())
                    .or_else(|_| fs::remove_dir(existing.as_std_path()))
                    .map_err(io_at(existing))?;
                tracing::debug!("{} already preserved as {}", existing, candidate);
                return Ok((candidate, false));
            }
        }

        let target = free.ok_or_else(|| Error::QuarantineBudgetExceeded {
            path: existing.to_path_buf(),
            attempts: self.max_attempts,
        })?;

        fs::rename(existing.as_std_path(), target.as_std_path()).map_err(io_at(existing))?;
        tracing::info!("Quarantined {} -> {}", existing, target);
        Ok((target, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn evicting(name: &str) -> SequencedItem {
        let item = crate::item::Item::new(name, format!("/mods/{}", name));
        SequencedItem {
            effective_source: item.source_path.clone(),
            item,
            pool: crate::pool::PoolKind::Merge,
            sequence: "000001".to_string(),
            abbreviation: "M".to_string(),
            identifier: "000001-[M]".to_string(),
            destination_root: Utf8PathBuf::from("/out/merge"),
            categories: Default::default(),
            replaced_files: Vec::new(),
        }
    }

    fn root(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_quarantine_moves_file() {
        let dir = tempdir().unwrap();
        let root = root(&dir);
        let file = root.join("x.txt");
        std::fs::write(&file, "first").unwrap();

        let moved = CollisionGuard::new().quarantine(&file).unwrap();

        assert_eq!(moved, root.join(".quarantine").join("000.x.txt"));
        assert!(!file.exists());
        assert_eq!(std::fs::read_to_string(&moved).unwrap(), "first");
    }

    #[test]
    fn test_quarantine_picks_next_free_name() {
        let dir = tempdir().unwrap();
        let root = root(&dir);
        let file = root.join("x.txt");
        let guard = CollisionGuard::new();

        std::fs::write(&file, "first").unwrap();
        guard.quarantine(&file).unwrap();
        std::fs::write(&file, "second").unwrap();
        let moved = guard.quarantine(&file).unwrap();

        assert_eq!(moved, root.join(".quarantine").join("001.x.txt"));
        assert_eq!(
            std::fs::read_to_string(root.join(".quarantine").join("000.x.txt")).unwrap(),
            "first"
        );
    }

    #[test]
    fn test_budget_exceeded_is_fatal() {
        let dir = tempdir().unwrap();
        let root = root(&dir);
        let file = root.join("x.txt");
        let guard = CollisionGuard::new().with_max_attempts(2);

        for _ in 0..2 {
            std::fs::write(&file, "data").unwrap();
            guard.quarantine(&file).unwrap();
        }
        std::fs::write(&file, "data").unwrap();

        let err = guard.quarantine(&file).unwrap_err();
        assert!(matches!(
            err,
            Error::QuarantineBudgetExceeded { attempts: 2, .. }
        ));
        assert!(file.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_preserved_link_is_not_moved_twice() {
        let dir = tempdir().unwrap();
        let root = root(&dir);
        let source = root.join("source.txt");
        let other = root.join("other.txt");
        std::fs::write(&source, "s").unwrap();
        std::fs::write(&other, "o").unwrap();
        let link = root.join("x.txt");
        let guard = CollisionGuard::new();

        crate::utils::make_symlink(&source, &link, false).unwrap();
        assert_eq!(
            guard.quarantine(&link).unwrap(),
            root.join(".quarantine/000.x.txt")
        );
        crate::utils::make_symlink(&other, &link, false).unwrap();
        guard.quarantine(&link).unwrap();

        crate::utils::make_symlink(&source, &link, false).unwrap();
        let mut item = evicting("Mod");
        let eviction = guard.quarantine_for(&link, &mut item).unwrap();

        assert!(!eviction.moved);
        assert_eq!(
            eviction.relocation.quarantined,
            root.join(".quarantine/000.x.txt")
        );
        assert!(!path_occupied(&link));
        assert_eq!(std::fs::read_dir(root.join(".quarantine")).unwrap().count(), 2);
        assert_eq!(item.replaced_files, vec![eviction.relocation]);
    }

    #[test]
    fn test_quarantine_directory() {
        let dir = tempdir().unwrap();
        let root = root(&dir);
        let merge = root.join("merge");
        std::fs::create_dir_all(merge.join("common")).unwrap();

        let moved = CollisionGuard::new().quarantine(&merge).unwrap();

        assert_eq!(moved, root.join(".quarantine").join("000.merge"));
        assert!(moved.join("common").is_dir());
    }
}
