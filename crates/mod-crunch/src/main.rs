use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{
    auto_detect_game_root, index_playset, reset_config, set_game_root, show_config, show_report,
    IndexArgs, ReportArgs,
};
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod errors;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Log every indexed item, link and quarantine
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the symlink index of the game install and a playset
    Index {
        /// The playset export to index, in load order (.json or .toml)
        #[arg(short, long)]
        playset: String,

        /// Export of every installed mod, for the all-installed pool
        #[arg(short, long)]
        installed: Option<String>,

        /// The game install directory (overrides config.toml)
        #[arg(short, long)]
        game_root: Option<String>,

        /// The directory to write the index to (overrides config.toml)
        #[arg(short, long)]
        output: Option<String>,

        /// Keep natural names for mod files that replace a base file
        #[arg(long)]
        nomunge: bool,

        /// Quarantine the previous merge tree before indexing
        #[arg(long)]
        clean_merge: bool,

        /// Render previews of new and replaced image assets
        #[arg(long)]
        thumbnails: bool,
    },
    /// Show a summary of an existing index report
    Report {
        /// The index output directory, or the report file
        #[arg(short, long)]
        output: Option<String>,

        /// Print the merge manifest as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change the stored configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the current configuration
    Show,
    /// Store the game install directory
    SetGameRoot { path: String },
    /// Search for the game install and store it
    Detect,
    /// Reset the configuration to defaults
    Reset,
}

fn parse_args() -> Args {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "mod_crunch=debug,crunch_index=debug,crunch_extract=debug"
    } else {
        "mod_crunch=info,crunch_index=info,crunch_extract=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> Result<()> {
    let args = parse_args();
    init_logging(args.verbose);

    let cfg = utils::config::load_config();

    match args.command {
        Commands::Index {
            playset,
            installed,
            game_root,
            output,
            nomunge,
            clean_merge,
            thumbnails,
        } => index_playset(
            IndexArgs {
                playset,
                installed,
                game_root,
                output,
                nomunge,
                clean_merge,
                thumbnails,
            },
            &cfg,
        ),
        Commands::Report { output, json } => show_report(ReportArgs { output, json }, &cfg),
        Commands::Config { action } => match action {
            ConfigCommands::Show => show_config(),
            ConfigCommands::SetGameRoot { path } => set_game_root(path),
            ConfigCommands::Detect => auto_detect_game_root(),
            ConfigCommands::Reset => reset_config(),
        },
    }
}
