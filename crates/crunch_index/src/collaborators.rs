//! External collaborators of a run.
//!
//! The indexer does not read archives or decode images itself. The CLI plugs
//! in implementations from `crunch_extract`; tests plug in recording fakes.
//! Both calls are synchronous and block the run until they return.

use crate::error::Result;
use camino::{Utf8Path, Utf8PathBuf};

/// Unpacks an item's archive into a directory that then serves as its source.
pub trait ArchiveExtractor: Send + Sync {
    /// Extract `archive` into `destination`.
    ///
    /// Files already present in `destination` are kept unless `overwrite` is set.
    fn extract(&self, archive: &Utf8Path, destination: &Utf8Path, overwrite: bool) -> Result<()>;
}

/// Renders a preview image for a visual asset.
///
/// Failures are reported to the caller, which logs them and carries on.
pub trait ThumbnailRenderer: Send + Sync {
    /// Render `source` at most `size` pixels wide into `destination_dir`.
    ///
    /// `label` is `{identifier}.{kind}`, with the identifier of the item that
    /// linked the asset and `kind` one of [`THUMBNAIL_LABEL_NEW`] or
    /// [`THUMBNAIL_LABEL_REPLACED`]. Returns the path of the written image.
    fn render_thumbnail(
        &self,
        source: &Utf8Path,
        label: &str,
        size: u32,
        destination_dir: &Utf8Path,
    ) -> Result<Utf8PathBuf>;
}

/// Thumbnail label of a newly linked asset.
pub const THUMBNAIL_LABEL_NEW: &str = "crunch";

/// Thumbnail label of an asset that was pushed into quarantine.
pub const THUMBNAIL_LABEL_REPLACED: &str = "replaced";
