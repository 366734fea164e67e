//! Sequence numbers and identifiers within a pool.

use crate::crunchfile::{CrunchFile, PoolAssignment};
use crate::error::{Error, Result};
use crate::item::{Item, SequencedItem};
use crate::pool::{PadStyle, PoolConfig, PoolKind};
use camino::Utf8PathBuf;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

/// `~N` suffixes tried before falling back to the item's sequence.
pub const MAX_ABBREVIATION_SUFFIXES: usize = 100;

const MAX_ABBREVIATION_LEN: usize = 12;
const SINGLE_WORD_LEN: usize = 6;
const FALLBACK_ABBREVIATION: &str = "MOD";

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{L}+|\p{N}+").expect("word pattern is valid"));

/// Derive a short abbreviation from a clean name and an id token.
///
/// Words contribute their initial, numbers are kept whole. A single word
/// contributes its first six letters instead. The id token is slugified and
/// appended, so two items with the same name still differ when their ids do.
///
/// ```
/// use crunch_index::derive_abbreviation;
///
/// assert_eq!(derive_abbreviation("Extra Doll House", "1688887083"), "EDH-1688887083");
/// assert_eq!(derive_abbreviation("Patch 2", "unregistered"), "P2-unregistered");
/// assert_eq!(derive_abbreviation("Gigastructures", "1121692237"), "GIGAST-1121692237");
/// ```
pub fn derive_abbreviation(clean_name: &str, token: &str) -> String {
    let words: Vec<&str> = WORD_PATTERN
        .find_iter(clean_name)
        .map(|m| m.as_str())
        .collect();

    let mut abbreviation: String = match words.as_slice() {
        [] => FALLBACK_ABBREVIATION.to_string(),
        [single] if !single.starts_with(|c: char| c.is_numeric()) => {
            single.chars().take(SINGLE_WORD_LEN).collect()
        }
        _ => words
            .iter()
            .flat_map(|word| {
                if word.starts_with(|c: char| c.is_numeric()) {
                    word.chars().collect::<Vec<_>>()
                } else {
                    word.chars().take(1).collect()
                }
            })
            .collect(),
    };
    abbreviation = abbreviation
        .to_uppercase()
        .chars()
        .take(MAX_ABBREVIATION_LEN)
        .collect();

    let token = slug::slugify(token);
    if token.is_empty() {
        abbreviation
    } else {
        format!("{}-{}", abbreviation, token)
    }
}

/// Assigns sequence numbers and identifiers for one pool.
///
/// Items must be added in processing order; the counter only moves forward.
#[derive(Debug)]
pub struct Sequencer {
    kind: PoolKind,
    root: Utf8PathBuf,
    pad: PadStyle,
    counter: u32,
    merge_root_name: Option<String>,
    /// abbreviation -> clean name of the item holding it
    names: HashMap<String, String>,
}

impl Sequencer {
    /// Fails with [`Error::MissingIndexRoot`] if the pool has no root.
    pub fn new(config: &PoolConfig) -> Result<Self> {
        let root = config
            .index_root
            .clone()
            .filter(|r| !r.as_str().is_empty())
            .ok_or_else(|| Error::MissingIndexRoot {
                pool: config.kind.to_string(),
            })?;

        Ok(Self {
            kind: config.kind,
            root,
            pad: config.pad,
            counter: config.starting_index,
            merge_root_name: config.merge_root_name.clone(),
            names: HashMap::new(),
        })
    }

    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    pub fn root(&self) -> &Utf8PathBuf {
        &self.root
    }

    /// Number of items sequenced so far.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Sequence `item` into this pool.
    ///
    /// Assigns the next sequence number, the destination root and an
    /// identifier, then records the assignment in the item's
    /// [`CrunchFile`]. The base install is never written to, and a failed
    /// write only logs a warning.
    pub fn add(&mut self, item: Item) -> Result<SequencedItem> {
        let sequence = self.pad.format(self.counter);
        let destination_root = match (self.kind.is_merge(), self.merge_root_name.as_deref()) {
            (true, Some(name)) if !name.is_empty() => self.root.join(name),
            (true, _) => self.root.clone(),
            (false, _) => self.root.join(format!("{}-{}", sequence, item.clean_name)),
        };

        let mut record = if item.is_base() {
            None
        } else {
            match CrunchFile::load(&item.source_path) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(
                        "Ignoring unreadable metadata for '{}': {}",
                        item.display_name,
                        e
                    );
                    None
                }
            }
        };

        let (abbreviation, identifier) = self.identify(&item, &sequence, record.as_ref());
        self.counter += 1;

        if !item.is_base() {
            let record = record.get_or_insert_with(|| {
                CrunchFile::new(self.candidate(&item, None), item.clean_name.clone())
            });
            record.clean_name = item.clean_name.clone();
            record.pools.insert(
                self.kind,
                PoolAssignment {
                    sequence: sequence.clone(),
                    abbrev: abbreviation.clone(),
                    identifier: identifier.clone(),
                },
            );
            if let Err(e) = record.save(&item.source_path) {
                tracing::warn!(
                    "Could not persist identifier for '{}': {}",
                    item.display_name,
                    e
                );
            }
        }

        tracing::debug!("[{}] {} -> {}", self.kind, item.display_name, identifier);

        Ok(SequencedItem {
            effective_source: item.source_path.clone(),
            item,
            pool: self.kind,
            sequence,
            abbreviation,
            identifier,
            destination_root,
            categories: BTreeSet::new(),
            replaced_files: Vec::new(),
        })
    }

    /// The abbreviation `item` asks for, before disambiguation.
    fn candidate(&self, item: &Item, record: Option<&CrunchFile>) -> String {
        match (&item.preset_abbreviation, record) {
            (Some(preset), _) => preset.clone(),
            (None, Some(record)) => record.abbrev_for(self.kind).to_string(),
            (None, None) => derive_abbreviation(&item.clean_name, item.id_token()),
        }
    }

    /// Pick the abbreviation for `item` and build its identifier.
    ///
    /// A preset or persisted abbreviation is reused; otherwise one is derived.
    /// Collisions within the pool get a `~N` suffix and a warning.
    pub fn identify(
        &mut self,
        item: &Item,
        sequence: &str,
        record: Option<&CrunchFile>,
    ) -> (String, String) {
        let candidate = self.candidate(item, record);
        let abbreviation = self.disambiguate(candidate, sequence);
        self.names
            .insert(abbreviation.clone(), item.clean_name.clone());

        let identifier = format!("{}-[{}]", sequence, abbreviation);
        (abbreviation, identifier)
    }

    fn disambiguate(&self, candidate: String, sequence: &str) -> String {
        let Some(holder) = self.names.get(&candidate) else {
            return candidate;
        };

        tracing::warn!(
            "Abbreviation collision in pool '{}': {} is used by '{}'",
            self.kind,
            candidate,
            holder
        );

        for n in 2..MAX_ABBREVIATION_SUFFIXES + 2 {
            let suffixed = format!("{}~{}", candidate, n);
            if !self.names.contains_key(&suffixed) {
                return suffixed;
            }
        }

        // Sequences are unique within a pool.
        let fallback = format!("{}~s{}", candidate, sequence);
        tracing::warn!(
            "Abbreviation {} collided {} times in pool '{}', using {}",
            candidate,
            MAX_ABBREVIATION_SUFFIXES,
            self.kind,
            fallback
        );
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crunchfile::CRUNCHFILE_NAME;
    use camino::Utf8Path;
    use tempfile::tempdir;

    fn pool(kind: PoolKind, root: &Utf8Path) -> PoolConfig {
        PoolConfig::new(kind, root.to_path_buf(), PadStyle::new('0', 6))
    }

    fn mod_dir(root: &Utf8Path, name: &str) -> Utf8PathBuf {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_derive_abbreviation() {
        assert_eq!(
            derive_abbreviation("Extra Doll House", "1688887083"),
            "EDH-1688887083"
        );
        assert_eq!(derive_abbreviation("Patch 2", "unregistered"), "P2-unregistered");
        assert_eq!(derive_abbreviation("!!!", ""), "MOD");
        assert_eq!(derive_abbreviation("2200", "x"), "2200-x");
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let config = PoolConfig {
            index_root: None,
            ..PoolConfig::new(PoolKind::Merge, Utf8PathBuf::new(), PadStyle::new('0', 6))
        };
        assert!(matches!(
            Sequencer::new(&config),
            Err(Error::MissingIndexRoot { .. })
        ));

        let empty = PoolConfig::new(PoolKind::Merge, Utf8PathBuf::new(), PadStyle::new('0', 6));
        assert!(Sequencer::new(&empty).is_err());
    }

    #[test]
    fn test_add_assigns_sequence_and_destination() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let mut sequencer = Sequencer::new(&pool(PoolKind::Standalone, &root.join("mod"))).unwrap();

        let first = sequencer
            .add(Item::new("Alpha Mod", mod_dir(&root, "alpha")))
            .unwrap();
        let second = sequencer
            .add(Item::new("Beta Mod", mod_dir(&root, "beta")))
            .unwrap();

        assert_eq!(first.sequence, "000000");
        assert_eq!(second.sequence, "000001");
        assert_eq!(first.identifier, "000000-[AM-unregistered]");
        assert_eq!(second.destination_root, root.join("mod").join("000001-Beta Mod"));
        assert!(root.join("alpha").join(CRUNCHFILE_NAME).is_file());
    }

    #[test]
    fn test_merge_pool_shares_root() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let config = PoolConfig {
            merge_root_name: Some("000-merged".to_string()),
            ..pool(PoolKind::Merge, &root.join("merge"))
        };
        let mut sequencer = Sequencer::new(&config).unwrap();

        let item = sequencer.add(Item::new("Alpha", mod_dir(&root, "a"))).unwrap();
        assert_eq!(item.destination_root, root.join("merge").join("000-merged"));
    }

    #[test]
    fn test_collision_gets_suffix() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let mut sequencer = Sequencer::new(&pool(PoolKind::Merge, &root.join("merge"))).unwrap();

        let a = sequencer.add(Item::new("Big Ships", mod_dir(&root, "a"))).unwrap();
        let b = sequencer.add(Item::new("Better Sounds", mod_dir(&root, "b"))).unwrap();
        let c = sequencer.add(Item::new("Blue Sky", mod_dir(&root, "c"))).unwrap();

        assert_eq!(a.abbreviation, "BS-unregistered");
        assert_eq!(b.abbreviation, "BS-unregistered~2");
        assert_eq!(c.abbreviation, "BS-unregistered~3");
        assert_eq!(sequencer.len(), 3);
    }

    #[test]
    fn test_collisions_past_suffix_budget_use_sequence() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let mut sequencer = Sequencer::new(&pool(PoolKind::Merge, &root.join("merge"))).unwrap();

        let total = MAX_ABBREVIATION_SUFFIXES + 2;
        let mut identifiers = BTreeSet::new();
        let mut last = None;
        for i in 0..total {
            let tag: String = [i / 26, i % 26]
                .iter()
                .map(|&n| char::from(b'a' + n as u8))
                .collect();
            let name = format!("B{} Ships", tag);
            let item = sequencer
                .add(Item::new(name.as_str(), mod_dir(&root, &format!("m{}", i))))
                .unwrap();
            identifiers.insert(item.identifier.clone());
            last = Some(item);
        }

        let last = last.unwrap();
        assert_eq!(identifiers.len(), total);
        assert_eq!(last.abbreviation, format!("BS-unregistered~s{}", last.sequence));
        assert_eq!(
            CrunchFile::load(&root.join(format!("m{}", total - 1)))
                .unwrap()
                .unwrap()
                .abbrev,
            "BS-unregistered"
        );
    }

    #[test]
    fn test_persisted_abbreviation_is_reused() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let source = mod_dir(&root, "a");
        CrunchFile::new("CUSTOM", "Alpha").save(&source).unwrap();

        let mut sequencer = Sequencer::new(&pool(PoolKind::Merge, &root.join("merge"))).unwrap();
        let item = sequencer.add(Item::new("Alpha", source.clone())).unwrap();
        assert_eq!(item.identifier, "000000-[CUSTOM]");

        let record = CrunchFile::load(&source).unwrap().unwrap();
        assert_eq!(record.pools[&PoolKind::Merge].identifier, "000000-[CUSTOM]");
    }

    #[test]
    fn test_base_uses_preset_and_is_not_written() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let game = mod_dir(&root, "game");

        let mut sequencer = Sequencer::new(&pool(PoolKind::Merge, &root.join("merge"))).unwrap();
        let base = sequencer.add(Item::base("Stellaris", game.clone(), "STELLA")).unwrap();

        assert_eq!(base.identifier, "000000-[STELLA]");
        assert!(!game.join(CRUNCHFILE_NAME).exists());
    }

    #[test]
    fn test_unwritable_source_is_not_fatal() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let mut sequencer = Sequencer::new(&pool(PoolKind::Merge, &root.join("merge"))).unwrap();

        let item = sequencer
            .add(Item::new("Ghost", root.join("does-not-exist")))
            .unwrap();
        assert_eq!(item.sequence, "000000");
    }
}
