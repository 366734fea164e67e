//! Core shared logic for the crunch tools.
//!
//! This crate locates and validates the base game install and the game's
//! documents directory, for the `mod-crunch` CLI.

mod game_path;

pub use game_path::{
    auto_detect_game_root, game_documents_root, game_logs_root, is_valid_game_root,
    parse_library_folders,
};
