//! Destination naming in the merge tree.
//!
//! Every file linked into the merge tree gets a destination name from
//! [`Munger::resolve`]. Rules, first match wins:
//!
//! 1. Assets keep their name. Game scripts reference them by literal path.
//! 2. Files of the base install keep their name. The base is the reference tree.
//! 3. With `nomunge` set, a file shadowing a base-install file at the same
//!    relative path keeps its name and an [`OverrideRecord`] is stored.
//! 4. Everything else is prefixed with the item identifier: `{identifier}-{file}`.

use crate::item::SequencedItem;
use crate::utils::normalize_rel_key;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Base-relative path (`/`-separated) -> the item currently overriding it.
pub type OverrideMap = BTreeMap<String, OverrideRecord>;

/// A base-install file shadowed by a mod file of the same relative path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideRecord {
    pub item: String,
    pub identifier: String,
    pub mod_file: Utf8PathBuf,
    pub index_file: Utf8PathBuf,
}

/// File extensions exempt from munging, matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct AssetSet {
    extensions: HashSet<String>,
}

impl AssetSet {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn contains_file(&self, file_name: &str) -> bool {
        Utf8Path::new(file_name)
            .extension()
            .is_some_and(|ext| self.extensions.contains(&ext.to_ascii_lowercase()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Asset,
    Base,
    Override,
    Munged,
}

/// Outcome of [`Munger::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub file_name: String,
    pub dest_path: Utf8PathBuf,
    pub kind: Resolution,
}

#[derive(Debug, Clone)]
pub struct Munger {
    base_root: Utf8PathBuf,
    nomunge: bool,
    assets: AssetSet,
}

impl Munger {
    pub fn new(base_root: impl Into<Utf8PathBuf>, nomunge: bool, assets: AssetSet) -> Self {
        Self {
            base_root: base_root.into(),
            nomunge,
            assets,
        }
    }

    pub fn assets(&self) -> &AssetSet {
        &self.assets
    }

    pub fn is_asset(&self, file_name: &str) -> bool {
        self.assets.contains_file(file_name)
    }

    /// Resolve the destination of `file_name` found in `rel_dir` of `item`.
    ///
    /// `rel_dir` is relative to the item root and starts with the content
    /// category (`common/buildings`). `dest_dir` is its mirror in the merge
    /// tree. An override is registered in `overrides` under the base-relative
    /// path, replacing the record of any earlier item.
    pub fn resolve(
        &self,
        item: &SequencedItem,
        rel_dir: &Utf8Path,
        file_name: &str,
        dest_dir: &Utf8Path,
        overrides: &mut OverrideMap,
    ) -> Resolved {
        let rel_path = rel_dir.join(file_name);

        let (kind, name) = if self.is_asset(file_name) {
            (Resolution::Asset, file_name.to_string())
        } else if item.item.is_base() {
            (Resolution::Base, file_name.to_string())
        } else if self.nomunge && self.base_root.join(&rel_path).as_std_path().is_file() {
            (Resolution::Override, file_name.to_string())
        } else {
            (
                Resolution::Munged,
                format!("{}-{}", item.identifier, file_name),
            )
        };

        let dest_path = dest_dir.join(&name);

        if kind == Resolution::Override {
            let key = normalize_rel_key(&rel_path);
            tracing::debug!("{} overrides base file {}", item.identifier, key);
            overrides.insert(
                key,
                OverrideRecord {
                    item: item.item.display_name.clone(),
                    identifier: item.identifier.clone(),
                    mod_file: item.effective_source.join(&rel_path),
                    index_file: dest_path.clone(),
                },
            );
        }

        Resolved {
            file_name: name,
            dest_path,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;
    use crate::pool::PoolKind;
    use std::collections::BTreeSet;
    use tempfile::tempdir;

    fn sequenced(item: Item, identifier: &str) -> SequencedItem {
        SequencedItem {
            effective_source: item.source_path.clone(),
            item,
            pool: PoolKind::Merge,
            sequence: "000001".to_string(),
            abbreviation: "M".to_string(),
            identifier: identifier.to_string(),
            destination_root: Utf8PathBuf::from("/out/merge"),
            categories: BTreeSet::new(),
            replaced_files: Vec::new(),
        }
    }

    fn base_with(file: &str) -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let path = root.join(file);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "vanilla").unwrap();
        (dir, root)
    }

    #[test]
    fn test_asset_set_matching() {
        let assets = AssetSet::new([".DDS", "ogg"]);
        assert!(assets.contains_file("icon.dds"));
        assert!(assets.contains_file("ICON.DDS"));
        assert!(assets.contains_file("theme.ogg"));
        assert!(!assets.contains_file("x.txt"));
        assert!(!assets.contains_file("dds"));
    }

    #[test]
    fn test_assets_are_never_renamed() {
        let (_dir, base) = base_with("gfx/icon.dds");
        let item = sequenced(Item::new("Mod", "/mods/m"), "000001-[M]");
        let mut overrides = OverrideMap::new();

        for nomunge in [false, true] {
            let munger = Munger::new(base.clone(), nomunge, AssetSet::new(["dds"]));
            let resolved = munger.resolve(
                &item,
                Utf8Path::new("gfx"),
                "icon.dds",
                Utf8Path::new("/out/merge/gfx"),
                &mut overrides,
            );
            assert_eq!(resolved.kind, Resolution::Asset);
            assert_eq!(resolved.dest_path, Utf8PathBuf::from("/out/merge/gfx/icon.dds"));
        }
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_nomunge_override_is_recorded() {
        let (_dir, base) = base_with("common/x.txt");
        let munger = Munger::new(base, true, AssetSet::default());
        let item = sequenced(Item::new("ModB", "/mods/b"), "000001-[MB]");
        let mut overrides = OverrideMap::new();

        let resolved = munger.resolve(
            &item,
            Utf8Path::new("common"),
            "x.txt",
            Utf8Path::new("/out/merge/common"),
            &mut overrides,
        );

        assert_eq!(resolved.kind, Resolution::Override);
        assert_eq!(resolved.file_name, "x.txt");
        let record = &overrides["common/x.txt"];
        assert_eq!(record.item, "ModB");
        assert_eq!(record.mod_file, Utf8PathBuf::from("/mods/b/common/x.txt"));
        assert_eq!(record.index_file, Utf8PathBuf::from("/out/merge/common/x.txt"));
    }

    #[test]
    fn test_munged_by_default() {
        let (_dir, base) = base_with("common/x.txt");
        let munger = Munger::new(base, false, AssetSet::default());
        let item = sequenced(Item::new("ModB", "/mods/b"), "000001-[MB]");
        let mut overrides = OverrideMap::new();

        let shadowing = munger.resolve(
            &item,
            Utf8Path::new("common"),
            "x.txt",
            Utf8Path::new("/m/common"),
            &mut overrides,
        );
        assert_eq!(shadowing.kind, Resolution::Munged);
        assert_eq!(shadowing.file_name, "000001-[MB]-x.txt");
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_new_file_is_munged_even_with_nomunge() {
        let (_dir, base) = base_with("common/x.txt");
        let munger = Munger::new(base, true, AssetSet::default());
        let item = sequenced(Item::new("ModB", "/mods/b"), "000001-[MB]");
        let mut overrides = OverrideMap::new();

        let resolved = munger.resolve(
            &item,
            Utf8Path::new("common"),
            "y.txt",
            Utf8Path::new("/m/common"),
            &mut overrides,
        );
        assert_eq!(resolved.kind, Resolution::Munged);
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_base_keeps_names() {
        let (_dir, base) = base_with("common/x.txt");
        let munger = Munger::new(base.clone(), true, AssetSet::default());
        let item = sequenced(Item::base("Stellaris", base, "STELLA"), "000000-[STELLA]");
        let mut overrides = OverrideMap::new();

        let resolved = munger.resolve(
            &item,
            Utf8Path::new("common"),
            "x.txt",
            Utf8Path::new("/m/common"),
            &mut overrides,
        );
        assert_eq!(resolved.kind, Resolution::Base);
        assert!(overrides.is_empty());
    }
}
