// Configuration loading and parsing (leaguedesk.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::money::Money;

/// File name of the configuration file inside `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "leaguedesk.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub entry: EntryConfig,
    pub pot: PotConfig,
    pub data: DataConfig,
}

/// `[entry]`: behavior of the participant entry form.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EntryConfig {
    /// Delay between a field losing focus and its list closing / explicit
    /// validation, so a pointer click on a suggestion can land first.
    pub grace_delay_ms: u64,
    /// Empty team rows created when no teams are pre-populated.
    pub default_team_rows: usize,
    /// Complete teams needed before a tournament can be recorded.
    pub min_complete_teams: usize,
}

impl Default for EntryConfig {
    fn default() -> Self {
        EntryConfig {
            grace_delay_ms: 200,
            default_team_rows: 5,
            min_complete_teams: 2,
        }
    }
}

impl EntryConfig {
    pub fn grace_delay(&self) -> Duration {
        Duration::from_millis(self.grace_delay_ms)
    }
}

/// `[pot]`: ace pot figures, in dollars.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PotConfig {
    pub cap: f64,
    pub contribution: f64,
}

impl Default for PotConfig {
    fn default() -> Self {
        PotConfig {
            cap: 100.0,
            contribution: 1.0,
        }
    }
}

impl PotConfig {
    pub fn cap_amount(&self) -> Money {
        Money::from_dollars_f64(self.cap)
    }

    pub fn contribution_amount(&self) -> Money {
        Money::from_dollars_f64(self.contribution)
    }
}

/// `[data]`: input files.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// CSV file with the player roster. Relative paths resolve against the
    /// working directory.
    pub roster_path: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/leaguedesk.toml` relative to `base_dir`.
///
/// Does not copy defaults; `load_config()` does that first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    load_config_file(&base_dir.join("config").join(CONFIG_FILE))
}

/// Load and validate one config file.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let text = read_file(path)?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }

        let target = config_dir.join(file_name);
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Load config relative to the current working directory, copying defaults
/// first. When the working directory has neither `defaults/` nor `config/`,
/// the platform config directory is tried instead. A missing file yields the
/// built-in defaults.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;

    let path = match ensure_config_files(&cwd) {
        Ok(copied) => {
            for path in &copied {
                info!("Copied default config to {}", path.display());
            }
            cwd.join("config").join(CONFIG_FILE)
        }
        Err(ConfigError::DefaultsCopyError { message }) => match platform_config_path() {
            Some(path) => {
                info!("{message}; using {}", path.display());
                path
            }
            None => {
                warn!("{message}; using built-in defaults");
                return Ok(Config::default());
            }
        },
        Err(e) => return Err(e),
    };

    match load_config_file(&path) {
        Err(ConfigError::FileNotFound { path }) => {
            warn!("{} not found; using built-in defaults", path.display());
            Ok(Config::default())
        }
        other => other,
    }
}

/// `<platform config dir>/leaguedesk.toml`, e.g. `~/.config/leaguedesk/`.
pub fn platform_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "leaguedesk")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Upper bound for configured dollar amounts.
const MAX_DOLLARS: f64 = 1_000_000_000.0;

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.entry.grace_delay_ms > 10_000 {
        return Err(ConfigError::ValidationError {
            field: "entry.grace_delay_ms".into(),
            message: format!("must be at most 10000, got {}", config.entry.grace_delay_ms),
        });
    }

    let counts: &[(&str, usize)] = &[
        ("entry.default_team_rows", config.entry.default_team_rows),
        ("entry.min_complete_teams", config.entry.min_complete_teams),
    ];
    for (name, val) in counts {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    let amounts: &[(&str, f64)] = &[
        ("pot.cap", config.pot.cap),
        ("pot.contribution", config.pot.contribution),
    ];
    for (name, val) in amounts {
        if !val.is_finite() || *val <= 0.0 || *val > MAX_DOLLARS {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be > 0 and at most {MAX_DOLLARS}, got {val}"),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
