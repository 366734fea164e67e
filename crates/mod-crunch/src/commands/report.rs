use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::AppConfig;
use camino::{Utf8Path, Utf8PathBuf};
use colored::Colorize;
use crunch_index::{CrunchReport, OutputLayout, PoolKind};
use miette::{IntoDiagnostic, Result};

pub struct ReportArgs {
    /// Index output root, or a report file.
    pub output: Option<String>,
    pub json: bool,
}

/// Accepts either the output root of an index or the report file itself.
fn report_path(target: &Utf8Path) -> Utf8PathBuf {
    if target.extension() == Some("json") {
        target.to_path_buf()
    } else {
        OutputLayout::new(target)
            .report
            .join(crunch_index::report::REPORT_FILE_NAME)
    }
}

fn load_report(path: &Utf8Path) -> Result<CrunchReport, CliError> {
    CrunchReport::load(path)
        .map_err(|source| CliError::ReportUnreadable {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| CliError::report_not_found(path.to_path_buf()))
}

pub fn show_report(args: ReportArgs, cfg: &AppConfig) -> Result<()> {
    let target = args
        .output
        .map(Utf8PathBuf::from)
        .unwrap_or_else(|| cfg.resolved_output_root());
    let path = report_path(&target);
    let report = load_report(&path)?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report.merge_manifest).into_diagnostic()?
        );
        return Ok(());
    }

    println_pad!(
        "{} {}",
        "📄 Report:".bright_blue().bold(),
        path.as_str().bright_cyan().bold()
    );
    println_pad!(
        "{} {}",
        "🔀 Overrides:".bright_green(),
        report.root_overrides.len().to_string().bright_white().bold()
    );
    println_pad!(
        "{} {}",
        "🖼️ Included media:".bright_yellow(),
        report.included_media.len().to_string().bright_white().bold()
    );

    println_pad!("\n{}", "🗂️  Pools:".bright_magenta().bold());
    for pool in [PoolKind::Standalone, PoolKind::AllInstalled, PoolKind::Merge] {
        println_pad!(
            "   {} {} {}",
            "•".bright_cyan(),
            pool.as_str().bright_cyan().bold(),
            format!("({} items)", report.pool_len(pool)).dimmed()
        );
    }

    println_pad!("\n{}", "🧾 Merge manifest:".bright_magenta().bold());
    for entry in &report.merge_manifest {
        let version = entry.version.as_deref().unwrap_or("-");
        match &entry.reference_url {
            Some(url) => println_pad!(
                "   {} {} {} {}",
                entry.sequence.dimmed(),
                entry.name.bright_white().bold(),
                format!("({})", version).dimmed(),
                url.bright_blue()
            ),
            None => println_pad!(
                "   {} {} {}",
                entry.sequence.dimmed(),
                entry.name.bright_white().bold(),
                format!("({})", version).dimmed()
            ),
        }
    }

    if !report.root_overrides.is_empty() {
        println_pad!("\n{}", "🔀 Base overrides:".bright_magenta().bold());
        for (base_file, record) in &report.root_overrides {
            println_pad!(
                "   {} {} {}",
                base_file.bright_white(),
                "←".dimmed(),
                record.item.bright_cyan()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_report_path_from_output_root() {
        assert_eq!(
            report_path(Utf8Path::new("/srv/index")),
            Utf8PathBuf::from("/srv/index/crunch/crunch.json")
        );
        assert_eq!(
            report_path(Utf8Path::new("/tmp/old.json")),
            Utf8PathBuf::from("/tmp/old.json")
        );
    }

    #[test]
    fn test_missing_report() {
        let temp_dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).unwrap();

        let result = load_report(&report_path(&root));
        assert!(matches!(result, Err(CliError::ReportNotFound { .. })));
    }

    #[test]
    fn test_saved_report_loads() {
        let temp_dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).unwrap();
        let path = report_path(&root);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        CrunchReport::default().save(&path).unwrap();

        let report = load_report(&path).unwrap();
        assert!(report.merge_manifest.is_empty());
    }
}
