// src/core/config.rs

use crate::core::paths::{self, PathError};
use crate::models::ShellConfig;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why the configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config directory could not be resolved.
    #[error(transparent)]
    Path(#[from] PathError),
    /// An explicitly given config file is missing.
    #[error("Config file '{0}' does not exist.")]
    NotFound(PathBuf),
    /// Reading or writing the file failed.
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not a valid config.
    #[error("Failed to parse config.toml: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// The default config could not be written out.
    #[error("Failed to serialize config to TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Loads the shell configuration.
///
/// With an explicit path (tilde-expanded), the file must exist. Without one,
/// `~/.config/consh/config.toml` is used and written with defaults if missing.
pub fn load_config(explicit: Option<&str>) -> Result<ShellConfig, ConfigError> {
    match explicit {
        Some(raw) => {
            let path = paths::expand_user_path(raw)?;
            if !path.exists() {
                return Err(ConfigError::NotFound(path));
            }
            read_config(&path)
        }
        None => load_or_create(&paths::get_config_path()?),
    }
}

/// Reads `path`, or writes the default config there first if it does not exist.
pub fn load_or_create(path: &Path) -> Result<ShellConfig, ConfigError> {
    if !path.exists() {
        log::debug!("Writing default config to {}", path.display());
        let default_config = ShellConfig::default();
        let toml_string = toml::to_string_pretty(&default_config)?;
        fs::write(path, toml_string)?;
        Ok(default_config)
    } else {
        read_config(path)
    }
}

fn read_config(path: &Path) -> Result<ShellConfig, ConfigError> {
    log::debug!("Loading config from {}", path.display());
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Fills the prompt template's `{user}` and `{cwd}` placeholders. The working
/// directory is shown relative to `~` when it lies under the home directory.
pub fn render_prompt(template: &str, user: &str, cwd: &str, home: &str) -> String {
    let cwd = match cwd.strip_prefix(home) {
        Some(rest) if !home.is_empty() && (rest.is_empty() || rest.starts_with('/')) => {
            format!("~{}", rest)
        }
        _ => cwd.to_string(),
    };
    template.replace("{user}", user).replace("{cwd}", &cwd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_default_file_is_created() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = load_or_create(&path).unwrap();
        assert_eq!(config, ShellConfig::default());
        assert!(path.exists());

        // The written file reads back identically.
        assert_eq!(load_or_create(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "user = \"ada\"\nhistory_limit = 10\n\n[env]\nEDITOR = \"ed\"\n\n[aliases]\nll = \"help -a\"\n",
        )
        .unwrap();

        let config = load_config(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.user, "ada");
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.home, ShellConfig::default().home);
        assert_eq!(config.env.get("EDITOR").map(String::as_str), Some("ed"));
        assert_eq!(config.aliases.get("ll").map(String::as_str), Some("help -a"));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let err = load_config(Some(path.to_str().unwrap())).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "user = [").unwrap();
        assert!(matches!(
            load_or_create(&path),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_render_prompt() {
        let prompt = render_prompt("{user}@desktop:{cwd}$ ", "guest", "/home/guest/docs", "/home/guest");
        assert_eq!(prompt, "guest@desktop:~/docs$ ");
        assert_eq!(render_prompt("{cwd}>", "u", "/tmp", "/home/guest"), "/tmp>");
        assert_eq!(render_prompt("{cwd}>", "u", "/home/guestx", "/home/guest"), "/home/guestx>");
    }
}
