use camino::{Utf8Path, Utf8PathBuf};
use crunch_index::ThumbnailRenderer;
use image::ImageFormat;

use crate::error::ExtractError;

/// Renders PNG previews of image assets (DDS, TGA, PNG, JPEG, BMP).
///
/// Previews are written as `{file name}.{label}.png`. Labels carry the
/// identifier of the item that linked the asset, so each item's preview and
/// the preview of what it replaced share that identifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngThumbnailer;

impl PngThumbnailer {
    pub fn new() -> Self {
        Self
    }

    /// Render `source` into `destination_dir`, at most `size` pixels on either side.
    pub fn render(
        &self,
        source: &Utf8Path,
        label: &str,
        size: u32,
        destination_dir: &Utf8Path,
    ) -> Result<Utf8PathBuf, ExtractError> {
        let file_name = source
            .file_name()
            .ok_or_else(|| ExtractError::NoFileName(source.to_path_buf()))?;
        let output_path = destination_dir.join(format!("{}.{}.png", file_name, label));

        let img = image::open(source.as_std_path())?;
        let thumbnail = if img.width() > size || img.height() > size {
            img.thumbnail(size, size)
        } else {
            img
        };

        std::fs::create_dir_all(destination_dir.as_std_path())?;
        thumbnail.save_with_format(output_path.as_std_path(), ImageFormat::Png)?;
        Ok(output_path)
    }
}

impl ThumbnailRenderer for PngThumbnailer {
    fn render_thumbnail(
        &self,
        source: &Utf8Path,
        label: &str,
        size: u32,
        destination_dir: &Utf8Path,
    ) -> crunch_index::Result<Utf8PathBuf> {
        self.render(source, label, size, destination_dir)
            .map_err(|e| crunch_index::Error::Thumbnail {
                file: source.to_path_buf(),
                message: e.to_string(),
            })
    }
}
