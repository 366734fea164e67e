use crate::errors::CliError;
use crate::utils::config::{self, AppConfig};
use camino::Utf8PathBuf;
use colored::Colorize;
use miette::Result;

fn update_game_root_in_config(path: Utf8PathBuf) -> Result<()> {
    let mut cfg = config::load_config();
    cfg.game_root = Some(path);
    config::save_config(&cfg).map_err(|e| CliError::config_save_failed(e).into())
}

/// Print a config path entry with status indicator
fn print_path_config(
    name: &str,
    path: Option<&Utf8PathBuf>,
    validator: impl Fn(&Utf8PathBuf) -> bool,
) {
    match path {
        Some(p) => {
            let status = if validator(p) {
                "✓".bright_green()
            } else {
                "✗".bright_red()
            };
            println!("  {} {} {}", format!("{}:", name).bright_white(), p, status);
        }
        None => {
            println!(
                "  {} {}",
                format!("{}:", name).bright_white(),
                "(not set)".bright_yellow()
            );
        }
    }
}

fn print_flag_config(name: &str, value: bool) {
    println!(
        "  {} {}",
        format!("{}:", name).bright_white(),
        if value {
            "on".bright_green()
        } else {
            "off".dimmed()
        }
    );
}

pub fn show_config() -> Result<()> {
    let cfg = config::load_config();
    let config_path = config::default_config_path()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    println!();
    println!("  {} {}", "config_file:".bright_white(), config_path);

    print_path_config("game_root", cfg.game_root.as_ref(), |p| {
        crunch_core::is_valid_game_root(p)
    });
    print_path_config(
        "output_root",
        Some(&cfg.resolved_output_root()),
        |p| p.exists(),
    );
    print_path_config(
        "documents_root",
        cfg.resolved_documents_root().as_ref(),
        |p| p.exists(),
    );
    println!(
        "  {} {}",
        "merge_root_name:".bright_white(),
        cfg.merge_root_name.as_deref().unwrap_or("(pool root)")
    );
    print_flag_config("nomunge", cfg.nomunge);
    print_flag_config("thumbnails", cfg.thumbnails);

    println!();
    Ok(())
}

pub fn set_game_root(path: String) -> Result<()> {
    let path = Utf8PathBuf::from(&path);
    if !crunch_core::is_valid_game_root(&path) {
        eprintln!(
            "  {}",
            "The path must point to the game's install directory.".bright_yellow()
        );
        eprintln!(
            "  {}",
            "Example: C:\\SteamHome\\steamapps\\common\\Stellaris".bright_yellow()
        );
        eprintln!();
        eprintln!("  {} The directory does not exist", "•".bright_red());
        eprintln!(
            "  {} The directory has no 'common' folder or no game executable",
            "•".bright_red()
        );

        return Err(CliError::invalid_game_root(path).into());
    }

    update_game_root_in_config(path.clone())?;

    println!("{}", "✓ Game root set successfully!".bright_green().bold());
    println!();
    println!(
        "  {} {}",
        "Path:".bright_white().bold(),
        path.as_str().bright_green()
    );

    Ok(())
}

pub fn auto_detect_game_root() -> Result<()> {
    println!("{}", "Searching for the game install...".bright_cyan());
    println!();

    match crunch_core::auto_detect_game_root() {
        Some(detected_path) => {
            println!("{}", "✓ Found the game install!".bright_green().bold());
            println!();
            println!(
                "  {} {}",
                "Path:".bright_white().bold(),
                detected_path.as_str().bright_green()
            );
            println!();

            update_game_root_in_config(detected_path)?;

            println!(
                "{}",
                "✓ Configuration updated successfully!"
                    .bright_green()
                    .bold()
            );
        }
        None => {
            println!(
                "{}",
                "✗ Could not automatically detect the game install"
                    .bright_red()
                    .bold()
            );
            println!();
            println!(
                "  {} Use 'mod-crunch config set-game-root <path>' to set the path manually",
                "•".bright_cyan()
            );
            println!(
                "  {} C:\\SteamHome\\steamapps\\common\\Stellaris",
                "Example:".bright_white().bold()
            );
        }
    }

    Ok(())
}

pub fn reset_config() -> Result<()> {
    let config_path = config::default_config_path()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    config::save_config(&AppConfig::default()).map_err(CliError::config_save_failed)?;

    println!(
        "{}",
        "✓ Configuration reset to defaults".bright_green().bold()
    );
    println!();
    println!("  {} {}", "Config file:".bright_white().bold(), config_path);
    println!();
    println!(
        "  {}",
        "Run 'mod-crunch config detect' to find your game install".bright_cyan()
    );

    Ok(())
}
