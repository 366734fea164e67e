//! Main index builder implementation.
//!
//! The [`CrunchBuilder`] drives a full run through these stages:
//!
//! 1. **PrepareOutput**: check that the base install exists, quarantine the
//!    previous merge tree if `clean_merge` is set, create the output layout
//!    and the convenience links.
//! 2. **IndexBase**: sequence the base install into the standalone pool (one
//!    directory link) and into the merge pool (walked per file, names kept).
//! 3. **IndexStandaloneItems**: sequence the playset into the standalone pool
//!    and every installed mod into the all-installed pool, one directory link
//!    per item.
//! 4. **IndexMergeItems**: sequence the playset into the merge pool and walk
//!    each item per file. Later items shadow earlier ones; shadowed links are
//!    quarantined.
//! 5. **Finalize**: write the [`CrunchReport`].
//!
//! The first fatal error aborts the run and leaves the output tree as it is.

use crate::collaborators::{ArchiveExtractor, ThumbnailRenderer};
use crate::config::{CrunchConfig, OutputLayout, VISUAL_ASSET_EXTENSIONS};
use crate::error::{Error, Result};
use crate::item::{content_categories_present, Item, SequencedItem};
use crate::munger::{AssetSet, Munger};
use crate::pool::PoolKind;
use crate::quarantine::CollisionGuard;
use crate::report::{CrunchReport, REPORT_FILE_NAME};
use crate::run::RunContext;
use crate::sequencer::Sequencer;
use crate::utils::{absolute_utf8, ensure_dir, link_points_to, make_symlink, path_occupied};
use crate::walker::{DirectoryWalker, ThumbnailOptions};
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Progress information emitted during a run.
///
/// `current`/`total` count items within the current stage.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrunchProgress {
    pub stage: CrunchStage,
    /// Display name of the item being indexed.
    pub current_item: Option<String>,
    pub current: u32,
    pub total: u32,
}

/// Stages of a run, emitted in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CrunchStage {
    PrepareOutput,
    IndexBase,
    IndexStandaloneItems,
    IndexMergeItems,
    Finalize,
    /// Run finished successfully.
    Complete,
}

/// Summary returned after a run completes.
#[derive(Debug)]
pub struct CrunchBuildResult {
    pub output_root: Utf8PathBuf,
    pub report_path: Utf8PathBuf,
    pub report: CrunchReport,
    /// (item, pool) pairs indexed.
    pub indexed: usize,
    /// (item, pool) pairs skipped with a log message.
    pub skipped: usize,
    /// Occupants moved into quarantine by this run.
    pub quarantined: usize,
    pub build_time: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Indexed,
    Skipped,
}

type ProgressCallback = Arc<dyn Fn(CrunchProgress) + Send + Sync>;

/// Orchestrates an indexing run.
///
/// Create a builder with [`new`](Self::new), hand it the item lists with
/// [`set_playset`](Self::set_playset) and [`set_installed`](Self::set_installed),
/// plug in collaborators, then call [`build`](Self::build).
pub struct CrunchBuilder {
    config: CrunchConfig,
    playset: Vec<Item>,
    installed: Vec<Item>,
    extractor: Option<Box<dyn ArchiveExtractor>>,
    thumbnailer: Option<Box<dyn ThumbnailRenderer>>,
    progress_callback: Option<ProgressCallback>,
}

impl CrunchBuilder {
    pub fn new(config: CrunchConfig) -> Self {
        Self {
            config,
            playset: Vec::new(),
            installed: Vec::new(),
            extractor: None,
            thumbnailer: None,
            progress_callback: None,
        }
    }

    pub fn config(&self) -> &CrunchConfig {
        &self.config
    }

    /// Register a progress callback.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(CrunchProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Extractor for items that come as an archive.
    ///
    /// Without one, archive items are read from their directory path.
    pub fn with_extractor(mut self, extractor: impl ArchiveExtractor + 'static) -> Self {
        self.extractor = Some(Box::new(extractor));
        self
    }

    /// Renderer for asset previews. Only used when `thumbnails` is enabled.
    pub fn with_thumbnailer(mut self, thumbnailer: impl ThumbnailRenderer + 'static) -> Self {
        self.thumbnailer = Some(Box::new(thumbnailer));
        self
    }

    /// Set the active playset, in load order.
    ///
    /// Order matters: when two items produce the same merge path, the later
    /// one wins and the earlier one's link is quarantined.
    pub fn set_playset(&mut self, items: Vec<Item>) {
        self.playset = items;
    }

    /// Set every installed mod, for the all-installed pool.
    pub fn set_installed(&mut self, items: Vec<Item>) {
        self.installed = items;
    }

    /// Run all stages. See module-level docs.
    pub fn build(&mut self) -> Result<CrunchBuildResult> {
        let start_time = std::time::Instant::now();

        let game_root = absolute_utf8(&self.config.game_root)?;
        let layout = OutputLayout::new(&absolute_utf8(&self.config.output_root)?);

        tracing::info!("Building index...");
        tracing::info!("Game root: {}", game_root);
        tracing::info!("Output root: {}", layout.root);
        tracing::info!(
            "Playset items: {}, installed items: {}",
            self.playset.len(),
            self.installed.len()
        );

        self.emit_progress(CrunchStage::PrepareOutput, None, 0, 0);
        let guard = CollisionGuard::new();
        self.prepare_output(&game_root, &layout, &guard)?;

        let mut standalone =
            Sequencer::new(&self.config.pool_config(PoolKind::Standalone, &layout))?;
        let mut all = Sequencer::new(&self.config.pool_config(PoolKind::AllInstalled, &layout))?;
        let merge_config = self.config.pool_config(PoolKind::Merge, &layout);
        let mut merge = Sequencer::new(&merge_config)?;

        let munger = Munger::new(
            game_root.clone(),
            merge_config.nomunge,
            AssetSet::new(&self.config.asset_extensions),
        );
        let mut walker = DirectoryWalker::new(self.config.content_categories.clone(), munger)
            .with_guard(guard);
        if self.config.thumbnails {
            match &self.thumbnailer {
                Some(renderer) => {
                    walker = walker.with_thumbnails(ThumbnailOptions {
                        renderer: renderer.as_ref(),
                        root: layout.thumbnails.clone(),
                        size: self.config.thumbnail_size,
                        visual: AssetSet::new(VISUAL_ASSET_EXTENSIONS),
                    });
                }
                None => tracing::warn!("Thumbnails enabled but no renderer configured"),
            }
        }

        let mut ctx = RunContext::new();
        let mut tally = Tally::default();
        let base = Item::base(
            self.config.base_name.as_str(),
            game_root.clone(),
            self.config.base_abbreviation.as_str(),
        );

        self.emit_progress(CrunchStage::IndexBase, Some(&base.display_name), 1, 2);
        tally.add(self.add_item(base.clone(), &mut standalone, &walker, &layout, &mut ctx)?);
        self.emit_progress(CrunchStage::IndexBase, Some(&base.display_name), 2, 2);
        tally.add(self.add_item(base, &mut merge, &walker, &layout, &mut ctx)?);

        let total = (self.playset.len() + self.installed.len()) as u32;
        let standalone_items = self
            .playset
            .iter()
            .map(|item| (item, PoolKind::Standalone))
            .chain(self.installed.iter().map(|item| (item, PoolKind::AllInstalled)));
        for (index, (item, pool)) in standalone_items.enumerate() {
            self.emit_progress(
                CrunchStage::IndexStandaloneItems,
                Some(&item.display_name),
                index as u32 + 1,
                total,
            );
            let sequencer = match pool {
                PoolKind::AllInstalled => &mut all,
                _ => &mut standalone,
            };
            tally.add(self.add_item(item.clone(), sequencer, &walker, &layout, &mut ctx)?);
        }

        let total = self.playset.len() as u32;
        for (index, item) in self.playset.iter().enumerate() {
            self.emit_progress(
                CrunchStage::IndexMergeItems,
                Some(&item.display_name),
                index as u32 + 1,
                total,
            );
            tally.add(self.add_item(item.clone(), &mut merge, &walker, &layout, &mut ctx)?);
        }

        self.emit_progress(CrunchStage::Finalize, None, 0, 0);
        let quarantined = ctx.quarantined;
        let report = ctx.into_report();
        let report_path = layout.report.join(REPORT_FILE_NAME);
        report.save(&report_path)?;

        tracing::info!(
            "Index complete: {} indexed, {} skipped, {} quarantined, {} overrides",
            tally.indexed,
            tally.skipped,
            quarantined,
            report.root_overrides.len()
        );
        self.emit_progress(CrunchStage::Complete, None, 0, 0);

        Ok(CrunchBuildResult {
            output_root: layout.root,
            report_path,
            report,
            indexed: tally.indexed,
            skipped: tally.skipped,
            quarantined,
            build_time: start_time.elapsed(),
        })
    }

    fn prepare_output(
        &self,
        game_root: &Utf8Path,
        layout: &OutputLayout,
        guard: &CollisionGuard,
    ) -> Result<()> {
        if !game_root.as_std_path().is_dir() {
            return Err(Error::BaseInstallMissing(game_root.to_path_buf()));
        }

        if self.config.clean_merge && path_occupied(&layout.merge) {
            let moved = guard.quarantine(&layout.merge)?;
            tracing::info!("Previous merge tree moved to {}", moved);
        }

        for dir in layout.directories() {
            ensure_dir(dir)?;
        }

        let base = &self.config.base_name;
        let mut links = vec![(format!("000_{}Install", base), game_root.to_path_buf())];
        if let Some(documents) = &self.config.documents_root {
            links.push((format!("002_{}Documents", base), absolute_utf8(documents)?));
        }
        if let Some(logs) = &self.config.logs_root {
            links.push(("003_Logs".to_string(), absolute_utf8(logs)?));
        }

        for (name, target) in links {
            let link = layout.links.join(name);
            if link_points_to(&link, &target) {
                continue;
            }
            if path_occupied(&link) {
                tracing::warn!("Leaving existing {} in place", link);
                continue;
            }
            make_symlink(&target, &link, true)?;
        }

        Ok(())
    }

    /// Sequence one item into the pool of `sequencer` and materialize it.
    fn add_item(
        &self,
        item: Item,
        sequencer: &mut Sequencer,
        walker: &DirectoryWalker<'_>,
        layout: &OutputLayout,
        ctx: &mut RunContext,
    ) -> Result<Outcome> {
        let pool = sequencer.kind();

        let origin = item.archive_path.as_ref().unwrap_or(&item.source_path);
        if !origin.as_std_path().exists() {
            tracing::info!(
                "[{}] Skipping '{}': {} does not exist",
                pool,
                item.display_name,
                origin
            );
            return Ok(Outcome::Skipped);
        }
        if item.has_skip_marker() {
            tracing::warn!("[{}] Skipping '{}': marked to skip", pool, item.display_name);
            return Ok(Outcome::Skipped);
        }
        if ctx.is_indexed(pool, &item.clean_name) {
            tracing::warn!(
                "[{}] Skipping duplicate '{}' ({})",
                pool,
                item.display_name,
                item.clean_name
            );
            return Ok(Outcome::Skipped);
        }

        let Some(source) = self.effective_source(&item, layout, ctx)? else {
            return Ok(Outcome::Skipped);
        };

        tracing::info!("[{}] Indexing '{}'", pool, item.display_name);
        let mut sequenced = sequencer.add(item)?;
        sequenced.effective_source = absolute_utf8(&source)?;

        let destination = sequenced.destination_root.clone();
        if pool.is_merge() {
            let source = sequenced.effective_source.clone();
            let stats = walker.walk(&mut sequenced, &source, &destination, ctx)?;
            tracing::debug!("[{}] {}: {:?}", pool, sequenced.identifier, stats);
        } else {
            sequenced.categories = content_categories_present(
                &sequenced.effective_source,
                &self.config.content_categories,
            );
            self.link_whole_directory(&mut sequenced, walker.guard(), ctx)?;
        }

        ctx.record(&sequenced);
        Ok(Outcome::Indexed)
    }

    /// Link a standalone-pool item's whole source directory.
    ///
    /// A link from an earlier run to the same source is kept; anything else at
    /// the destination is quarantined.
    fn link_whole_directory(
        &self,
        sequenced: &mut SequencedItem,
        guard: &CollisionGuard,
        ctx: &mut RunContext,
    ) -> Result<()> {
        let destination = sequenced.destination_root.clone();
        let source = sequenced.effective_source.clone();

        if path_occupied(&destination) {
            if link_points_to(&destination, &source) {
                tracing::debug!("Reusing link {}", destination);
                return Ok(());
            }
            if guard.quarantine_for(&destination, sequenced)?.moved {
                ctx.quarantined += 1;
            }
        }

        if let Some(parent) = destination.parent() {
            ensure_dir(parent)?;
        }
        make_symlink(&source, &destination, true)
    }

    /// Directory content is read from: the extraction output for archive
    /// items, the source path otherwise. `None` skips the item.
    fn effective_source(
        &self,
        item: &Item,
        layout: &OutputLayout,
        ctx: &mut RunContext,
    ) -> Result<Option<Utf8PathBuf>> {
        let Some(archive) = &item.archive_path else {
            return Ok(Some(item.source_path.clone()));
        };
        if let Some(extracted) = ctx.extracted.get(archive) {
            return Ok(Some(extracted.clone()));
        }

        let Some(extractor) = &self.extractor else {
            tracing::warn!(
                "No extractor configured, reading '{}' from {}",
                item.display_name,
                item.source_path
            );
            return Ok(item
                .source_path
                .as_std_path()
                .is_dir()
                .then(|| item.source_path.clone()));
        };

        let destination = layout.extracted.join(slug::slugify(&item.clean_name));
        tracing::info!("Extracting {} -> {}", archive, destination);
        match extractor.extract(archive, &destination, self.config.overwrite_extracted) {
            Ok(()) => {
                ctx.extracted.insert(archive.clone(), destination.clone());
                Ok(Some(destination))
            }
            Err(e) => {
                tracing::warn!("Skipping '{}': {}", item.display_name, e);
                Ok(None)
            }
        }
    }

    /// Emit a progress event if a callback was registered.
    fn emit_progress(&self, stage: CrunchStage, item: Option<&str>, current: u32, total: u32) {
        if let Some(callback) = &self.progress_callback {
            callback(CrunchProgress {
                stage,
                current_item: item.map(str::to_string),
                current,
                total,
            });
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    indexed: usize,
    skipped: usize,
}

impl Tally {
    fn add(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Indexed => self.indexed += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }
}
