//! Game install and documents directory detection.

use camino::{Utf8Path, Utf8PathBuf};
use directories_next::BaseDirs;
use std::fs;
use sysinfo::{Disks, System};

const GAME_FOLDER: &str = "Stellaris";
const GAME_EXECUTABLES: &[&str] = &["stellaris.exe", "stellaris"];
const PUBLISHER_FOLDER: &str = "Paradox Interactive";

/// Validates if a path points to a game install root.
///
/// A root is a directory holding the `common` content folder and one of the
/// game executables.
pub fn is_valid_game_root(path: &Utf8Path) -> bool {
    if !path.is_dir() || !path.join("common").is_dir() {
        return false;
    }
    GAME_EXECUTABLES
        .iter()
        .any(|exe| path.join(exe).is_file())
}

/// The game's per-user directory (playsets, launcher database, logs) under
/// the user's documents directory.
pub fn game_documents_root(documents_dir: &Utf8Path) -> Utf8PathBuf {
    documents_dir.join(PUBLISHER_FOLDER).join(GAME_FOLDER)
}

pub fn game_logs_root(documents_root: &Utf8Path) -> Utf8PathBuf {
    documents_root.join("logs")
}

/// Extract library folder paths from the contents of Steam's `libraryfolders.vdf`.
///
/// Only the `"path"` keys are read; escaped backslashes are unescaped.
pub fn parse_library_folders(contents: &str) -> Vec<Utf8PathBuf> {
    let mut libraries = Vec::new();

    for line in contents.lines() {
        let mut quoted = line.split('"').skip(1).step_by(2);
        if quoted.next() != Some("path") {
            continue;
        }
        if let Some(value) = quoted.next() {
            let value = value.replace("\\\\", "\\");
            if !value.is_empty() {
                libraries.push(Utf8PathBuf::from(value));
            }
        }
    }

    libraries
}

fn game_root_in_library(library: &Utf8Path) -> Utf8PathBuf {
    library.join("steamapps").join("common").join(GAME_FOLDER)
}

fn home_dir() -> Option<Utf8PathBuf> {
    let dirs = BaseDirs::new()?;
    Utf8PathBuf::from_path_buf(dirs.home_dir().to_path_buf()).ok()
}

/// Steam install directories under a user's home directory.
fn steam_roots_in_home(home: &Utf8Path) -> Vec<Utf8PathBuf> {
    vec![
        home.join(".steam").join("steam"),
        home.join(".local").join("share").join("Steam"),
        home.join("Library")
            .join("Application Support")
            .join("Steam"),
    ]
}

/// Get all available drives using sysinfo (cross-platform).
fn get_available_drives() -> Vec<String> {
    let disks = Disks::new_with_refreshed_list();

    let mut drives: Vec<String> = disks
        .iter()
        .filter_map(|disk| disk.mount_point().to_str().map(|s| s.to_string()))
        .collect();

    // Fallback to common Windows drives if detection fails
    if drives.is_empty() && cfg!(target_os = "windows") {
        drives = vec!["C:", "D:", "E:", "F:"]
            .into_iter()
            .map(String::from)
            .collect();
    }

    drives
}

/// Steam install directories worth looking for a `libraryfolders.vdf` in.
fn steam_roots() -> Vec<Utf8PathBuf> {
    let mut roots = Vec::new();

    if let Some(steam) = steam_root_from_registry() {
        roots.push(steam);
    }
    if let Some(home) = home_dir() {
        roots.extend(steam_roots_in_home(&home));
    }
    roots.push(Utf8PathBuf::from("C:/Program Files (x86)/Steam"));

    roots
}

/// Detect the install through the library folders Steam knows about.
fn detect_from_steam_libraries() -> Option<Utf8PathBuf> {
    for steam in steam_roots() {
        let vdf = steam.join("steamapps").join("libraryfolders.vdf");
        let Ok(contents) = fs::read_to_string(vdf.as_std_path()) else {
            continue;
        };

        let found = parse_library_folders(&contents)
            .iter()
            .map(|library| game_root_in_library(library))
            .find(|root| is_valid_game_root(root));
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Detect the install from a running game process using sysinfo.
fn detect_from_running_process() -> Option<Utf8PathBuf> {
    let system = System::new_all();

    for &name in GAME_EXECUTABLES {
        for process in system.processes_by_name(name.as_ref()) {
            let root = process
                .exe()
                .and_then(|p| Utf8PathBuf::from_path_buf(p.to_path_buf()).ok())
                .and_then(|exe| exe.parent().map(Utf8Path::to_path_buf));

            if let Some(root) = root.filter(|root| is_valid_game_root(root)) {
                return Some(root);
            }
        }
    }
    None
}

/// Check common library locations on all available drives.
fn detect_from_common_paths() -> Option<Utf8PathBuf> {
    let drives = get_available_drives();
    let mut paths_to_check = Vec::new();

    for drive in &drives {
        let drive_root = Utf8PathBuf::from(drive.trim_end_matches(['\\', '/']));

        paths_to_check.push(game_root_in_library(&drive_root.join("SteamHome")));
        paths_to_check.push(game_root_in_library(&drive_root.join("SteamLibrary")));
        paths_to_check.push(game_root_in_library(&drive_root.join("Steam")));
        paths_to_check.push(game_root_in_library(
            &drive_root.join("Program Files (x86)").join("Steam"),
        ));
    }

    paths_to_check
        .into_iter()
        .find(|path| is_valid_game_root(path))
}

/// Read Steam's install directory from the Windows Registry.
fn steam_root_from_registry() -> Option<Utf8PathBuf> {
    if cfg!(not(target_os = "windows")) {
        return None;
    }

    let output = std::process::Command::new("reg")
        .args(["query", "HKCU\\Software\\Valve\\Steam", "/v", "SteamPath"])
        .output()
        .ok()?;

    let stdout = String::from_utf8(output.stdout).ok()?;

    stdout
        .lines()
        .filter(|line| line.contains("SteamPath") && line.contains("REG_SZ"))
        .find_map(|line| line.split("REG_SZ").nth(1))
        .map(|value| Utf8PathBuf::from(value.trim()))
}

/// Auto-detect the game install root.
///
/// Detection methods (in order of reliability):
/// 1. Steam library folders
/// 2. Running game process
/// 3. Common library locations on every drive
pub fn auto_detect_game_root() -> Option<Utf8PathBuf> {
    detect_from_steam_libraries()
        .or_else(detect_from_running_process)
        .or_else(detect_from_common_paths)
}
