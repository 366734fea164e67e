use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while extracting archives or rendering thumbnails.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Archive not found: {0}")]
    MissingArchive(Utf8PathBuf),

    #[error("Path has no file name: {0}")]
    NoFileName(Utf8PathBuf),
}

