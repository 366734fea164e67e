use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Game install not configured")]
    #[diagnostic(
        code(config::game_root_missing),
        help("Run 'mod-crunch config detect', 'mod-crunch config set-game-root <path>', or pass --game-root")
    )]
    GameRootNotSet,

    #[error("Not a game install: {path}")]
    #[diagnostic(
        code(config::invalid_game_root),
        help("The directory must contain the 'common' folder and the game executable (e.g. C:\\SteamHome\\steamapps\\common\\Stellaris)")
    )]
    InvalidGameRoot { path: Utf8PathBuf },

    #[error("Failed to load playset export: {path}")]
    #[diagnostic(
        code(playset::load_failed),
        help("Playset exports must be .json (an array of rows or {{ name, mods }}) or .toml ([[mods]] tables)")
    )]
    PlaysetLoadFailed {
        path: Utf8PathBuf,
        #[source]
        source: crunch_playset::PlaysetError,
    },

    #[error("Invalid playset row in {path}")]
    #[diagnostic(
        code(playset::invalid_row),
        help("Every row needs at least 'displayName' and 'dirPath'")
    )]
    InvalidPlaysetRow {
        path: Utf8PathBuf,
        #[source]
        source: crunch_index::Error,
    },

    #[error("Indexing failed")]
    #[diagnostic(
        code(index::failed),
        help("Nothing was rolled back; fix the cause and rerun, identifiers are reused")
    )]
    IndexFailed {
        #[source]
        source: crunch_index::Error,
    },

    #[error("Report not found: {path}")]
    #[diagnostic(
        code(report::not_found),
        help("Run 'mod-crunch index' first, or point --output at an existing index")
    )]
    ReportNotFound { path: Utf8PathBuf },

    #[error("Report could not be read: {path}")]
    #[diagnostic(code(report::unreadable))]
    ReportUnreadable {
        path: Utf8PathBuf,
        #[source]
        source: crunch_index::Error,
    },

    #[error("Failed to save configuration")]
    #[diagnostic(
        code(config::save_failed),
        help("The configuration lives next to the executable; check that directory is writable")
    )]
    ConfigSaveFailed {
        #[source]
        source: std::io::Error,
    },

    #[error("IO operation failed")]
    #[diagnostic(code(io::operation_failed))]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn invalid_game_root(path: Utf8PathBuf) -> Self {
        Self::InvalidGameRoot { path }
    }

    pub fn playset_load_failed(path: Utf8PathBuf, source: crunch_playset::PlaysetError) -> Self {
        Self::PlaysetLoadFailed { path, source }
    }

    pub fn invalid_playset_row(path: Utf8PathBuf, source: crunch_index::Error) -> Self {
        Self::InvalidPlaysetRow { path, source }
    }

    pub fn report_not_found(path: Utf8PathBuf) -> Self {
        Self::ReportNotFound { path }
    }

    pub fn config_save_failed(source: std::io::Error) -> Self {
        Self::ConfigSaveFailed { source }
    }
}

impl From<crunch_index::Error> for CliError {
    fn from(source: crunch_index::Error) -> Self {
        Self::IndexFailed { source }
    }
}
