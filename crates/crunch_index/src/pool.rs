//! Numbering pools.
//!
//! A pool is a namespace in which items receive sequence numbers and
//! identifiers. Each pool owns one [`Sequencer`](crate::Sequencer) and one
//! root directory.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three pools a run fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PoolKind {
    /// Active playset, one directory link per item.
    Standalone,
    /// Every installed mod, one directory link per item.
    #[serde(rename = "all")]
    AllInstalled,
    /// Active playset merged into one tree, files linked individually.
    Merge,
}

impl PoolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolKind::Standalone => "standalone",
            PoolKind::AllInstalled => "all",
            PoolKind::Merge => "merge",
        }
    }

    /// Merge pools are walked per file; the others link whole directories.
    pub fn is_merge(&self) -> bool {
        matches!(self, PoolKind::Merge)
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sequence padding for a pool, e.g. `'0'` x 6 gives `000042`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadStyle {
    pub pad_char: char,
    pub pad_len: usize,
}

impl PadStyle {
    pub const fn new(pad_char: char, pad_len: usize) -> Self {
        Self { pad_char, pad_len }
    }

    /// Left-pad `value` to the configured width.
    ///
    /// Values wider than the pad length are returned unpadded.
    pub fn format(&self, value: u32) -> String {
        let digits = value.to_string();
        let fill = self.pad_len.saturating_sub(digits.len());
        let mut out = String::with_capacity(fill + digits.len());
        out.extend(std::iter::repeat(self.pad_char).take(fill));
        out.push_str(&digits);
        out
    }
}

/// Everything a [`Sequencer`](crate::Sequencer) needs to know about its pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub kind: PoolKind,
    /// Root directory of the pool. Required; a missing root is fatal.
    pub index_root: Option<Utf8PathBuf>,
    pub pad: PadStyle,
    pub starting_index: u32,
    /// Shared subdirectory every item of a merge pool lands in.
    ///
    /// `None` (or an empty name) places the merged tree directly in the pool root.
    pub merge_root_name: Option<String>,
    /// Keep natural names for files that shadow a base-install file.
    pub nomunge: bool,
}

impl PoolConfig {
    pub fn new(kind: PoolKind, index_root: Utf8PathBuf, pad: PadStyle) -> Self {
        Self {
            kind,
            index_root: Some(index_root),
            pad,
            starting_index: 0,
            merge_root_name: None,
            nomunge: false,
        }
    }
}
