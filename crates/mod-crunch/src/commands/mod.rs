mod config;
mod index;
mod report;

pub use config::{auto_detect_game_root, reset_config, set_game_root, show_config};
pub use index::{index_playset, IndexArgs};
pub use report::{show_report, ReportArgs};
