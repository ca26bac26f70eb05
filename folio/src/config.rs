use crate::error::{FolioError, FolioResult};
use crate::format::DisplayFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Persisted settings for folio
///
/// Stored as TOML at `<config dir>/folio/config.toml` and organized into a
/// `[general]` section for file selection and a `[viewer]` section for how
/// notes are shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Base directory for relative paths typed into the open prompt.
    pub root_folder: Option<PathBuf>,
    /// Reopen `last_file` when started without a file argument.
    pub reopen_last: bool,
    pub last_file: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            reopen_last: true,
            last_file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub display_format: DisplayFormat,
    /// Poll the file every N milliseconds instead of using native events.
    pub poll_interval_ms: Option<u64>,
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub format: Option<DisplayFormat>,
    pub root_folder: Option<PathBuf>,
    pub poll_interval_ms: Option<u64>,
}

/// Settings for one run and where they go back on exit.
#[derive(Debug)]
pub struct Session {
    pub config: Config,
    /// `None` when nothing may be written: there is no settings location, or
    /// the file there could not be loaded and is left as the user wrote it.
    pub save_path: Option<PathBuf>,
    /// Why defaults are in use, if loading failed.
    pub warning: Option<FolioError>,
}

impl Config {
    /// Load the settings file at `path` (writing defaults if it is missing).
    /// A file that fails to load is never saved over.
    pub fn load_session(path: Option<PathBuf>) -> Session {
        let Some(path) = path else {
            return Session {
                config: Self::default(),
                save_path: None,
                warning: None,
            };
        };
        match Self::load_from(&path) {
            Ok(config) => Session {
                config,
                save_path: Some(path),
                warning: None,
            },
            Err(err) => Session {
                config: Self::default(),
                save_path: None,
                warning: Some(err),
            },
        }
    }

    pub fn load_from(path: &Path) -> FolioResult<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }
        let contents = fs::read_to_string(path).map_err(|e| FolioError::read(path, e))?;
        toml::from_str(&contents).map_err(|source| FolioError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_to(&self, path: &Path) -> FolioResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> FolioResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(FolioError::NoConfigDir)?;
        Ok(config_dir.join("folio").join("config.toml"))
    }

    pub fn apply_cli(&mut self, cli: CliOverrides) {
        if let Some(format) = cli.format {
            self.viewer.display_format = format;
        }
        if let Some(root) = cli.root_folder {
            self.general.root_folder = Some(root);
        }
        if let Some(ms) = cli.poll_interval_ms {
            self.viewer.poll_interval_ms = Some(ms);
        }
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        self.viewer
            .poll_interval_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    /// Note to open at start-up when no file was given on the command line.
    pub fn startup_file(&self) -> Option<&Path> {
        if self.general.reopen_last {
            self.general.last_file.as_deref()
        } else {
            None
        }
    }

    /// Turn what the user typed into a path: `~` expands to the home
    /// directory and relative paths are taken from `root_folder`, if set.
    pub fn resolve(&self, input: &str) -> PathBuf {
        let input = input.trim();
        if input == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
        if let Some(rest) = input.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        let path = PathBuf::from(input);
        match &self.general.root_folder {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        }
    }
}
