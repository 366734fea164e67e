//! Mirrors an item's content categories into the merge tree.
//!
//! Only the allow-listed category directories directly under an item's root
//! are visited. Directories are recreated, regular files are linked under the
//! name the [`Munger`] picks, and anything occupying a destination is handed
//! to the [`CollisionGuard`] first. Links found inside a source tree are
//! reported and skipped, never followed.

use crate::collaborators::{ThumbnailRenderer, THUMBNAIL_LABEL_NEW, THUMBNAIL_LABEL_REPLACED};
use crate::error::{io_at, Error, Result};
use crate::item::SequencedItem;
use crate::munger::{AssetSet, Munger, Resolution};
use crate::quarantine::CollisionGuard;
use crate::run::RunContext;
use crate::utils::{ensure_dir, link_points_to, make_symlink, path_occupied};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::FileType;
use walkdir::WalkDir;

/// What a directory entry is, without following links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    RegularFile,
    SymbolicLink,
    Other,
}

impl From<FileType> for EntryKind {
    fn from(file_type: FileType) -> Self {
        if file_type.is_symlink() {
            EntryKind::SymbolicLink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::RegularFile
        } else {
            EntryKind::Other
        }
    }
}

impl EntryKind {
    /// Kind of whatever sits at `path`, or `None` if nothing does.
    pub fn of(path: &Utf8Path) -> Option<Self> {
        std::fs::symlink_metadata(path.as_std_path())
            .ok()
            .map(|meta| meta.file_type().into())
    }
}

/// Counters of a single [`DirectoryWalker::walk`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub directories_created: usize,
    pub links_created: usize,
    /// Destinations that already linked to the same source.
    pub links_reused: usize,
    /// Links left by an earlier run and rebuilt by this one.
    pub links_replaced: usize,
    pub quarantined: usize,
    pub skipped: usize,
}

/// Thumbnail settings of a walker.
pub struct ThumbnailOptions<'a> {
    pub renderer: &'a dyn ThumbnailRenderer,
    /// Previews land under this root, mirroring the category path.
    pub root: Utf8PathBuf,
    pub size: u32,
    /// Asset formats the renderer can decode.
    pub visual: AssetSet,
}

pub struct DirectoryWalker<'a> {
    categories: Vec<String>,
    munger: Munger,
    guard: CollisionGuard,
    thumbnails: Option<ThumbnailOptions<'a>>,
}

impl<'a> DirectoryWalker<'a> {
    pub fn new(categories: Vec<String>, munger: Munger) -> Self {
        Self {
            categories,
            munger,
            guard: CollisionGuard::new(),
            thumbnails: None,
        }
    }

    pub fn with_guard(mut self, guard: CollisionGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_thumbnails(mut self, options: ThumbnailOptions<'a>) -> Self {
        self.thumbnails = Some(options);
        self
    }

    pub fn guard(&self) -> &CollisionGuard {
        &self.guard
    }

    /// Mirror the content categories of `source_root` into `dest_root`.
    ///
    /// `source_root` must be absolute; link targets are taken from it verbatim.
    pub fn walk(
        &self,
        item: &mut SequencedItem,
        source_root: &Utf8Path,
        dest_root: &Utf8Path,
        ctx: &mut RunContext,
    ) -> Result<WalkStats> {
        let mut stats = WalkStats::default();

        for category in &self.categories {
            let category_root = source_root.join(category);
            match EntryKind::of(&category_root) {
                Some(EntryKind::Directory) => {}
                Some(EntryKind::SymbolicLink) => {
                    tracing::warn!("Skipping linked category {} in source tree", category_root);
                    stats.skipped += 1;
                    continue;
                }
                Some(EntryKind::RegularFile | EntryKind::Other) | None => continue,
            }

            item.categories.insert(category.clone());
            if ensure_dir(&dest_root.join(category))? {
                stats.directories_created += 1;
            }

            let entries = WalkDir::new(category_root.as_std_path())
                .min_depth(1)
                .follow_links(false)
                .sort_by_file_name();

            for entry in entries {
                let entry = entry?;
                let path = Utf8Path::from_path(entry.path())
                    .ok_or_else(|| Error::NonUtf8Path(entry.path().to_path_buf()))?;
                let rel_path = path
                    .strip_prefix(source_root)
                    .map_err(|_| format!("{} is not under {}", path, source_root))?;

                match EntryKind::from(entry.file_type()) {
                    EntryKind::Directory => {
                        if ensure_dir(&dest_root.join(rel_path))? {
                            stats.directories_created += 1;
                        }
                    }
                    EntryKind::RegularFile => {
                        self.link_file(item, path, rel_path, dest_root, ctx, &mut stats)?;
                    }
                    EntryKind::SymbolicLink => {
                        tracing::warn!("Skipping link {} in source tree", path);
                        stats.skipped += 1;
                    }
                    EntryKind::Other => {
                        tracing::warn!("Skipping special file {} in source tree", path);
                        stats.skipped += 1;
                    }
                }
            }
        }

        Ok(stats)
    }

    fn link_file(
        &self,
        item: &mut SequencedItem,
        source: &Utf8Path,
        rel_path: &Utf8Path,
        dest_root: &Utf8Path,
        ctx: &mut RunContext,
        stats: &mut WalkStats,
    ) -> Result<()> {
        if item.identifier.is_empty() {
            return Err(Error::MissingIdentifier {
                item: item.item.display_name.clone(),
                path: source.to_path_buf(),
            });
        }

        let rel_dir = rel_path.parent().unwrap_or(Utf8Path::new(""));
        let file_name = rel_path
            .file_name()
            .ok_or_else(|| format!("{} has no file name", rel_path))?;
        let dest_dir = dest_root.join(rel_dir);

        let resolved = self
            .munger
            .resolve(item, rel_dir, file_name, &dest_dir, &mut ctx.overrides);
        let is_asset = resolved.kind == Resolution::Asset;

        if path_occupied(&resolved.dest_path) {
            if link_points_to(&resolved.dest_path, source) {
                stats.links_reused += 1;
                ctx.written.insert(resolved.dest_path.clone());
                if is_asset {
                    ctx.included_media.push(source.to_path_buf());
                }
                return Ok(());
            }

            let stale_link = !ctx.written.contains(&resolved.dest_path)
                && EntryKind::of(&resolved.dest_path) == Some(EntryKind::SymbolicLink);
            if stale_link {
                tracing::debug!("Replacing link {} from an earlier run", resolved.dest_path);
                std::fs::remove_file(resolved.dest_path.as_std_path())
                    .map_err(io_at(&resolved.dest_path))?;
                stats.links_replaced += 1;
            } else {
                let eviction = self.guard.quarantine_for(&resolved.dest_path, item)?;
                if eviction.moved {
                    stats.quarantined += 1;
                    ctx.quarantined += 1;
                }
                if is_asset {
                    let label = format!("{}.{}", item.identifier, THUMBNAIL_LABEL_REPLACED);
                    self.render_thumbnail(&eviction.relocation.quarantined, rel_dir, &label);
                }
            }
        }

        make_symlink(source, &resolved.dest_path, false)?;
        ctx.written.insert(resolved.dest_path.clone());
        stats.links_created += 1;

        if is_asset {
            ctx.included_media.push(source.to_path_buf());
            let label = format!("{}.{}", item.identifier, THUMBNAIL_LABEL_NEW);
            self.render_thumbnail(source, rel_dir, &label);
        }
        Ok(())
    }

    fn render_thumbnail(&self, file: &Utf8Path, rel_dir: &Utf8Path, label: &str) {
        let Some(options) = &self.thumbnails else {
            return;
        };
        let Some(file_name) = file.file_name() else {
            return;
        };
        if !options.visual.contains_file(file_name) {
            return;
        }

        let destination = options.root.join(rel_dir);
        let rendered = ensure_dir(&destination).and_then(|_| {
            options
                .renderer
                .render_thumbnail(file, label, options.size, &destination)
        });
        if let Err(e) = rendered {
            tracing::warn!("Thumbnail failed for {}: {}", file, e);
        }
    }
}
