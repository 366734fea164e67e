//! State accumulated over a single run.

use crate::item::SequencedItem;
use crate::munger::OverrideMap;
use crate::pool::PoolKind;
use crate::report::{CrunchReport, IndexedEntry, ManifestEntry};
use camino::Utf8PathBuf;
use std::collections::{BTreeMap, BTreeSet};

/// Registries threaded through every indexing step of a run.
///
/// Owned by the builder for the duration of [`CrunchBuilder::build`](crate::CrunchBuilder::build)
/// and turned into a [`CrunchReport`] at the end.
#[derive(Debug, Default)]
pub struct RunContext {
    /// Items per pool, keyed by clean name.
    pub indexed: BTreeMap<PoolKind, BTreeMap<String, IndexedEntry>>,
    pub overrides: OverrideMap,
    /// Source paths of every asset linked into the merge tree.
    pub included_media: Vec<Utf8PathBuf>,
    pub manifest: Vec<ManifestEntry>,
    /// Archive -> extraction directory, so each archive is unpacked once per run.
    pub extracted: BTreeMap<Utf8PathBuf, Utf8PathBuf>,
    /// Merge-tree links created or confirmed by this run. Anything else found
    /// at a destination is left over from an earlier run.
    pub written: BTreeSet<Utf8PathBuf>,
    /// Occupants actually moved into quarantine by this run.
    pub quarantined: usize,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an item with this clean name is already in `pool`.
    pub fn is_indexed(&self, pool: PoolKind, clean_name: &str) -> bool {
        self.indexed
            .get(&pool)
            .is_some_and(|items| items.contains_key(clean_name))
    }

    /// Record a fully indexed item.
    pub fn record(&mut self, sequenced: &SequencedItem) {
        self.indexed
            .entry(sequenced.pool)
            .or_default()
            .insert(sequenced.item.clean_name.clone(), IndexedEntry::from(sequenced));

        if sequenced.pool.is_merge() {
            self.manifest.push(ManifestEntry::from(sequenced));
        }
    }

    pub fn into_report(self) -> CrunchReport {
        CrunchReport {
            root_overrides: self.overrides,
            included_media: self.included_media,
            indexed_mods: self.indexed,
            merge_manifest: self.manifest,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;
    use std::collections::BTreeSet;

    fn sequenced(name: &str, pool: PoolKind) -> SequencedItem {
        let item = Item::new(name, format!("/mods/{}", name));
        SequencedItem {
            effective_source: item.source_path.clone(),
            item,
            pool,
            sequence: "000000".to_string(),
            abbreviation: "A".to_string(),
            identifier: "000000-[A]".to_string(),
            destination_root: Utf8PathBuf::from("/out"),
            categories: BTreeSet::new(),
            replaced_files: Vec::new(),
        }
    }

    #[test]
    fn test_duplicates_are_per_pool() {
        let mut ctx = RunContext::new();
        ctx.record(&sequenced("Alpha", PoolKind::Standalone));

        assert!(ctx.is_indexed(PoolKind::Standalone, "Alpha"));
        assert!(!ctx.is_indexed(PoolKind::Merge, "Alpha"));
        assert!(!ctx.is_indexed(PoolKind::Standalone, "Beta"));
    }

    #[test]
    fn test_manifest_only_lists_merge_items() {
        let mut ctx = RunContext::new();
        ctx.record(&sequenced("Alpha", PoolKind::Standalone));
        ctx.record(&sequenced("Alpha", PoolKind::Merge));
        ctx.record(&sequenced("Beta", PoolKind::AllInstalled));

        let report = ctx.into_report();
        assert_eq!(report.merge_manifest.len(), 1);
        assert_eq!(report.pool_len(PoolKind::Standalone), 1);
        assert_eq!(report.pool_len(PoolKind::AllInstalled), 1);
    }
}
