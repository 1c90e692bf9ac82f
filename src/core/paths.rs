// src/core/paths.rs

use crate::constants::{CONFIG_DIR_NAME, CONFIG_FILENAME};
use lazy_static::lazy_static;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

lazy_static! {
    static ref CONSH_CONFIG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);
}

/// Why a config path could not be resolved.
#[derive(Error, Debug)]
pub enum PathError {
    /// The platform has no config directory.
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    /// `~/.config/consh` could not be created.
    #[error("Could not create config directory at '{path}': {source}")]
    ConfigDirCreation {
        /// The directory that could not be created.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Tilde or variable expansion of a user path failed.
    #[error("Could not expand path '{path}': {message}")]
    Expansion {
        /// The path as given.
        path: String,
        /// What the expander reported.
        message: String,
    },
}

/// Returns the consh configuration directory (`~/.config/consh`), creating it
/// if needed.
///
/// Memoized: only the first call touches the filesystem.
pub fn get_config_dir() -> Result<PathBuf, PathError> {
    let mut cached = CONSH_CONFIG_DIR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(path) = &*cached {
        return Ok(path.clone());
    }

    let config_path = dirs::config_dir()
        .ok_or(PathError::ConfigDirNotFound)?
        .join(CONFIG_DIR_NAME);

    if !config_path.exists() {
        fs::create_dir_all(&config_path).map_err(|e| PathError::ConfigDirCreation {
            path: config_path.display().to_string(),
            source: e,
        })?;
    }

    *cached = Some(config_path.clone());
    Ok(config_path)
}

/// Returns the path to the default `config.toml`.
pub fn get_config_path() -> Result<PathBuf, PathError> {
    get_config_dir().map(|dir| dir.join(CONFIG_FILENAME))
}

/// Expands `~` and environment variables in a user-supplied path.
pub fn expand_user_path(path: &str) -> Result<PathBuf, PathError> {
    shellexpand::full(path)
        .map(|expanded| PathBuf::from(expanded.into_owned()))
        .map_err(|e| PathError::Expansion {
            path: path.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_user_path_resolves_home() {
        let expanded = expand_user_path("~/consh.toml").unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.ends_with("consh.toml"));
    }

    #[test]
    fn test_expand_user_path_leaves_plain_paths() {
        assert_eq!(
            expand_user_path("/etc/consh.toml").unwrap(),
            PathBuf::from("/etc/consh.toml")
        );
    }
}
