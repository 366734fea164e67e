//! Collaborators of the crunch indexer that touch file formats.
//!
//! [`ZipExtractor`] unpacks item archives and [`PngThumbnailer`] renders
//! previews of image assets. Both implement the collaborator traits of
//! `crunch_index` and are plugged into a
//! [`CrunchBuilder`](crunch_index::CrunchBuilder) by the CLI.

pub mod error;
mod extractor;
mod thumbnail;

pub use error::ExtractError;
pub use extractor::{ExtractSummary, ZipExtractor, extract_reader};
pub use thumbnail::PngThumbnailer;
