use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use camino::Utf8Path;
use crunch_index::ArchiveExtractor;
use zip::ZipArchive;

use crate::error::ExtractError;

/// Counts of a single extraction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractSummary {
    pub written: usize,
    /// Files left alone because they already existed.
    pub kept: usize,
    /// Entries whose name would escape the destination.
    pub rejected: usize,
}

/// Extracts ZIP archives (the format workshop items ship in) into a directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipExtractor;

impl ZipExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the archive at `archive` into `output_dir`.
    pub fn extract_file(
        &self,
        archive: &Utf8Path,
        output_dir: &Utf8Path,
        overwrite: bool,
    ) -> Result<ExtractSummary, ExtractError> {
        if !archive.as_std_path().is_file() {
            return Err(ExtractError::MissingArchive(archive.to_path_buf()));
        }
        let file = File::open(archive.as_std_path())?;
        extract_reader(file, output_dir.as_std_path(), overwrite)
    }
}

/// Extract every entry of a ZIP stream into `output_dir`.
///
/// Entry names that would land outside `output_dir` are rejected and logged.
pub fn extract_reader<R: Read + Seek>(
    reader: R,
    output_dir: &Path,
    overwrite: bool,
) -> Result<ExtractSummary, ExtractError> {
    let mut archive = ZipArchive::new(reader)?;
    let mut summary = ExtractSummary::default();

    if !output_dir.exists() {
        std::fs::create_dir_all(output_dir)?;
    }

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let Some(relative_path) = file.enclosed_name() else {
            tracing::warn!("Rejecting archive entry '{}'", file.name());
            summary.rejected += 1;
            continue;
        };
        let output_path = output_dir.join(relative_path);

        if file.is_dir() {
            std::fs::create_dir_all(&output_path)?;
            continue;
        }

        if output_path.exists() && !overwrite {
            summary.kept += 1;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut outfile = File::create(&output_path)?;
        std::io::copy(&mut file, &mut outfile)?;
        summary.written += 1;
    }

    Ok(summary)
}

impl ArchiveExtractor for ZipExtractor {
    fn extract(
        &self,
        archive: &Utf8Path,
        destination: &Utf8Path,
        overwrite: bool,
    ) -> crunch_index::Result<()> {
        let summary = self
            .extract_file(archive, destination, overwrite)
            .map_err(|e| crunch_index::Error::Archive {
                archive: archive.to_path_buf(),
                message: e.to_string(),
            })?;

        tracing::debug!(
            "Extracted {}: {} written, {} kept, {} rejected",
            archive,
            summary.written,
            summary.kept,
            summary.rejected
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::io::{Cursor, Write};
    use tempfile::tempdir;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn create_test_archive() -> Vec<u8> {
        let buffer = Vec::new();
        let cursor = Cursor::new(buffer);
        let mut zip = ZipWriter::new(cursor);
        let options = SimpleFileOptions::default();

        zip.add_directory("common/buildings", options).unwrap();
        zip.start_file("common/buildings/01_extra.txt", options)
            .unwrap();
        zip.write_all(b"building = {}").unwrap();

        zip.start_file("gfx/icon.dds", options).unwrap();
        zip.write_all(b"DDS ").unwrap();

        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_extract_archive() {
        let temp_dir = tempdir().unwrap();
        let summary =
            extract_reader(Cursor::new(create_test_archive()), temp_dir.path(), false).unwrap();

        assert_eq!(summary.written, 2);
        assert!(
            temp_dir
                .path()
                .join("common/buildings/01_extra.txt")
                .exists()
        );
        assert!(temp_dir.path().join("gfx/icon.dds").exists());
    }

    #[test]
    fn test_existing_files_kept_unless_overwrite() {
        let temp_dir = tempdir().unwrap();
        let target = temp_dir.path().join("gfx/icon.dds");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, b"local").unwrap();

        let summary =
            extract_reader(Cursor::new(create_test_archive()), temp_dir.path(), false).unwrap();
        assert_eq!(summary.kept, 1);
        assert_eq!(std::fs::read(&target).unwrap(), b"local");

        let summary =
            extract_reader(Cursor::new(create_test_archive()), temp_dir.path(), true).unwrap();
        assert_eq!(summary.written, 2);
        assert_eq!(std::fs::read(&target).unwrap(), b"DDS ");
    }

    #[test]
    fn test_rejects_escaping_entries() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        zip.start_file("../outside.txt", options).unwrap();
        zip.write_all(b"nope").unwrap();
        let buffer = zip.finish().unwrap().into_inner();

        let temp_dir = tempdir().unwrap();
        let output = temp_dir.path().join("out");
        let summary = extract_reader(Cursor::new(buffer), &output, false).unwrap();

        assert_eq!(summary.rejected, 1);
        assert!(!temp_dir.path().join("outside.txt").exists());
    }

    #[test]
    fn test_trait_reports_missing_archive() {
        let temp_dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).unwrap();

        let result = ZipExtractor::new().extract(&root.join("missing.zip"), &root.join("out"), false);
        assert!(matches!(result, Err(crunch_index::Error::Archive { .. })));
    }
}
