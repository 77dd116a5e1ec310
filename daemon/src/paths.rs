/// Canonical file paths for dragscroll data files.
///
/// Following the XDG base directory layout:
///   - ~/.config/dragscroll/config.toml       Written by the user, read by the daemon.
///   - ~/.local/state/dragscroll/status.toml  Written by the daemon for inspection.
use std::path::PathBuf;

const APP_DIR_NAME: &str = "dragscroll";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const STATUS_FILE_NAME: &str = "status.toml";

/// Returns the dragscroll configuration directory: $XDG_CONFIG_HOME/dragscroll/
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .expect("could not determine the user configuration directory")
        .join(APP_DIR_NAME)
}

/// Returns the dragscroll state directory: $XDG_STATE_HOME/dragscroll/
/// Falls back to the config directory on platforms without a state dir.
pub fn state_dir() -> PathBuf {
    dirs::state_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(config_dir)
}

/// Returns the full path to the config file.
pub fn config_file_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Returns the full path to the status file.
pub fn status_file_path() -> PathBuf {
    state_dir().join(STATUS_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_dir_ends_with_app_name() {
        assert_eq!(config_dir().file_name().unwrap(), APP_DIR_NAME);
    }

    #[test]
    fn state_dir_ends_with_app_name() {
        assert_eq!(state_dir().file_name().unwrap(), APP_DIR_NAME);
    }

    #[test]
    fn config_file_path_has_correct_name() {
        assert_eq!(config_file_path().file_name().unwrap(), CONFIG_FILE_NAME);
    }

    #[test]
    fn status_file_path_has_correct_name() {
        assert_eq!(status_file_path().file_name().unwrap(), STATUS_FILE_NAME);
    }
}
