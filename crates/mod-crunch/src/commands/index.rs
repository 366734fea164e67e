use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::AppConfig;
use crate::utils::print_ansi_boxed_lines;
use camino::{Utf8Path, Utf8PathBuf};
use colored::Colorize;
use crunch_extract::{PngThumbnailer, ZipExtractor};
use crunch_index::{items_from_playset, CrunchBuilder, CrunchConfig, CrunchStage, Item, PoolKind};
use crunch_playset::Playset;
use miette::Result;

pub struct IndexArgs {
    pub playset: String,
    pub installed: Option<String>,
    pub game_root: Option<String>,
    pub output: Option<String>,
    pub nomunge: bool,
    pub clean_merge: bool,
    pub thumbnails: bool,
}

fn load_items(path: &Utf8Path) -> Result<Vec<Item>, CliError> {
    let playset =
        Playset::load(path).map_err(|e| CliError::playset_load_failed(path.to_path_buf(), e))?;
    items_from_playset(&playset).map_err(|e| CliError::invalid_playset_row(path.to_path_buf(), e))
}

fn resolve_game_root(flag: Option<String>, cfg: &AppConfig) -> Result<Utf8PathBuf, CliError> {
    let game_root = flag
        .map(Utf8PathBuf::from)
        .or_else(|| cfg.game_root.clone())
        .ok_or(CliError::GameRootNotSet)?;

    if !crunch_core::is_valid_game_root(&game_root) {
        return Err(CliError::invalid_game_root(game_root));
    }
    Ok(game_root)
}

/// Merge command line flags over the stored configuration.
fn run_config(args: &IndexArgs, cfg: &AppConfig, game_root: Utf8PathBuf) -> CrunchConfig {
    let output_root = args
        .output
        .as_ref()
        .map(Utf8PathBuf::from)
        .unwrap_or_else(|| cfg.resolved_output_root());
    let documents_root = cfg.resolved_documents_root();

    let mut config = CrunchConfig {
        logs_root: documents_root.as_deref().map(crunch_core::game_logs_root),
        documents_root,
        nomunge: args.nomunge || cfg.nomunge,
        clean_merge: args.clean_merge,
        thumbnails: args.thumbnails || cfg.thumbnails,
        ..CrunchConfig::new(game_root, output_root)
    };
    if let Some(merge_root_name) = &cfg.merge_root_name {
        config.merge_root_name = merge_root_name.clone();
    }
    config
}

fn stage_label(stage: CrunchStage) -> &'static str {
    match stage {
        CrunchStage::PrepareOutput => "Preparing output",
        CrunchStage::IndexBase => "Indexing base install",
        CrunchStage::IndexStandaloneItems => "Linking standalone items",
        CrunchStage::IndexMergeItems => "Merging playset",
        CrunchStage::Finalize => "Writing report",
        CrunchStage::Complete => "Done",
    }
}

pub fn index_playset(args: IndexArgs, cfg: &AppConfig) -> Result<()> {
    let game_root = resolve_game_root(args.game_root.clone(), cfg)?;

    let playset_path = Utf8PathBuf::from(&args.playset);
    let playset = load_items(&playset_path)?;
    let installed = match &args.installed {
        Some(path) => load_items(Utf8Path::new(path))?,
        None => Vec::new(),
    };

    let config = run_config(&args, cfg, game_root);

    println_pad!(
        "{} {}",
        "🔗 Indexing playset:".bright_blue().bold(),
        playset_path.as_str().bright_cyan().bold()
    );
    println_pad!(
        "{} {} {} {}",
        "Items:".bright_white(),
        playset.len().to_string().bright_cyan(),
        "installed:".bright_white(),
        installed.len().to_string().bright_cyan()
    );
    println_pad!(
        "{} {}",
        "Merge policy:".bright_white(),
        if config.nomunge {
            "nomunge (overrides by name)".bright_yellow()
        } else {
            "munged".bright_green()
        }
    );

    let mut builder = CrunchBuilder::new(config)
        .with_progress(|progress| {
            if progress.current <= 1 {
                tracing::info!("{}", stage_label(progress.stage));
            }
            if let Some(item) = &progress.current_item {
                tracing::debug!(
                    "{} [{}/{}] {}",
                    stage_label(progress.stage),
                    progress.current,
                    progress.total,
                    item
                );
            }
        })
        .with_extractor(ZipExtractor::new())
        .with_thumbnailer(PngThumbnailer::new());
    builder.set_playset(playset);
    builder.set_installed(installed);

    let result = builder.build().map_err(CliError::from)?;

    println!();
    print_ansi_boxed_lines(&[
        format!(
            "{} {}",
            "Indexed:".bright_white().bold(),
            result.indexed.to_string().bright_green()
        ),
        format!(
            "{} {}",
            "Skipped:".bright_white().bold(),
            result.skipped.to_string().bright_yellow()
        ),
        format!(
            "{} {}",
            "Quarantined:".bright_white().bold(),
            result.quarantined.to_string().bright_yellow()
        ),
        format!(
            "{} {}",
            "Overrides:".bright_white().bold(),
            result.report.root_overrides.len().to_string().bright_cyan()
        ),
        format!(
            "{} {}",
            "Merged items:".bright_white().bold(),
            result.report.pool_len(PoolKind::Merge).to_string().bright_cyan()
        ),
        format!(
            "{} {:.2?}",
            "Took:".bright_white().bold(),
            result.build_time
        ),
    ]);
    println!();
    println_pad!(
        "{} {}",
        "📄 Report:".bright_green().bold(),
        result.report_path.as_str().bright_white()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn args() -> IndexArgs {
        IndexArgs {
            playset: "playset.json".to_string(),
            installed: None,
            game_root: None,
            output: Some("/srv/index".to_string()),
            nomunge: false,
            clean_merge: false,
            thumbnails: false,
        }
    }

    #[test]
    fn test_flags_override_stored_config() {
        let cfg = AppConfig {
            merge_root_name: Some("000-merged".to_string()),
            documents_root: Some("/docs/Stellaris".into()),
            thumbnails: true,
            ..Default::default()
        };
        let args = IndexArgs {
            nomunge: true,
            clean_merge: true,
            ..args()
        };

        let config = run_config(&args, &cfg, "/games/Stellaris".into());
        assert!(config.nomunge);
        assert!(config.clean_merge);
        assert!(config.thumbnails);
        assert_eq!(config.output_root, Utf8PathBuf::from("/srv/index"));
        assert_eq!(config.merge_root_name, "000-merged");
        assert_eq!(
            config.logs_root,
            Some(Utf8PathBuf::from("/docs/Stellaris/logs"))
        );
    }

    #[test]
    fn test_game_root_must_be_set() {
        let result = resolve_game_root(None, &AppConfig::default());
        assert!(matches!(result, Err(CliError::GameRootNotSet)));
    }

    #[test]
    fn test_invalid_game_root_is_rejected() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path().to_str().unwrap().to_string();

        let result = resolve_game_root(Some(root), &AppConfig::default());
        assert!(matches!(result, Err(CliError::InvalidGameRoot { .. })));
    }

    #[test]
    fn test_load_items_reports_bad_rows() {
        let temp_dir = tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp_dir.path().join("playset.json")).unwrap();
        fs::write(&path, r#"[{ "displayName": "No Path" }]"#).unwrap();

        let result = load_items(&path);
        assert!(matches!(result, Err(CliError::InvalidPlaysetRow { .. })));
    }

    #[test]
    fn test_load_items_rejects_unknown_format() {
        let temp_dir = tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp_dir.path().join("playset.txt")).unwrap();
        fs::write(&path, "").unwrap();

        let result = load_items(&path);
        assert!(matches!(result, Err(CliError::PlaysetLoadFailed { .. })));
    }
}
