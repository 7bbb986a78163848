use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::context::DEFAULT_OP_TIMEOUT;

/// Environment variable overriding the database location.
pub const DB_ENV: &str = "LANES_DB";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanesConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Project used when `--project` is not given.
    #[serde(default)]
    pub default_project: Option<String>,
    #[serde(default = "default_op_timeout_secs")]
    pub op_timeout_secs: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            default_project: None,
            op_timeout_secs: default_op_timeout_secs(),
        }
    }
}

impl BoardConfig {
    /// Per-operation deadline. Zero falls back to the default.
    #[must_use]
    pub const fn op_timeout(&self) -> Duration {
        if self.op_timeout_secs == 0 {
            DEFAULT_OP_TIMEOUT
        } else {
            Duration::from_secs(self.op_timeout_secs)
        }
    }
}

/// `<config_dir>/lanes/config.toml`, if the platform has a config dir.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("lanes").join("config.toml"))
}

/// Load the user config. A missing file yields defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config() -> Result<LanesConfig> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(LanesConfig::default()),
    }
}

/// Load a config file from an explicit path. A missing file yields defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config_from(path: &Path) -> Result<LanesConfig> {
    if !path.exists() {
        return Ok(LanesConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<LanesConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the database path: flag, then `LANES_DB`, then config, then
/// `<data_dir>/lanes/lanes.db`.
///
/// # Errors
///
/// Returns an error when no candidate applies and the platform has no data
/// directory.
pub fn resolve_db_path(cli_db: Option<&Path>, config: &LanesConfig) -> Result<PathBuf> {
    resolve_db_path_with(
        cli_db,
        env::var_os(DB_ENV).map(PathBuf::from),
        config,
        dirs::data_dir(),
    )
}

fn resolve_db_path_with(
    cli_db: Option<&Path>,
    env_db: Option<PathBuf>,
    config: &LanesConfig,
    data_dir: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(path) = cli_db {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = env_db.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(path);
    }
    if let Some(path) = &config.storage.db_path {
        return Ok(path.clone());
    }
    data_dir
        .map(|dir| dir.join("lanes").join("lanes.db"))
        .context("no data directory on this platform; pass --db or set LANES_DB")
}

/// Resolve the output mode: `--json`, then `FORMAT`, then config, then
/// `pretty` on a terminal and `text` otherwise.
///
/// # Errors
///
/// Currently infallible; kept fallible for future validation.
pub fn resolve_output(cli_json: bool, config: &LanesConfig) -> Result<String> {
    resolve_output_with(cli_json, config.output.clone(), env::var("FORMAT").ok())
}

fn resolve_output_with(
    cli_json: bool,
    user_output: Option<String>,
    env_format: Option<String>,
) -> Result<String> {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "plain" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return Ok("json".to_string());
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return Ok(mode.to_string());
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return Ok(mode.to_string());
    }

    if std::io::stdout().is_terminal() {
        Ok("pretty".to_string())
    } else {
        Ok("text".to_string())
    }
}

const fn default_op_timeout_secs() -> u64 {
    DEFAULT_OP_TIMEOUT.as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_uses_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cfg = load_config_from(&dir.path().join("absent.toml")).expect("load should succeed");
        assert_eq!(cfg, LanesConfig::default());
        assert_eq!(cfg.board.op_timeout_secs, 30);
        assert_eq!(cfg.board.op_timeout(), DEFAULT_OP_TIMEOUT);
    }

    #[test]
    fn config_file_parses_all_sections() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
output = "json"

[storage]
db_path = "/srv/lanes/board.db"

[board]
default_project = "home"
op_timeout_secs = 5
"#,
        )
        .expect("write config");

        let cfg = load_config_from(&path).expect("parse");
        assert_eq!(cfg.output.as_deref(), Some("json"));
        assert_eq!(cfg.storage.db_path, Some(PathBuf::from("/srv/lanes/board.db")));
        assert_eq!(cfg.board.default_project.as_deref(), Some("home"));
        assert_eq!(cfg.board.op_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[board\nop_timeout_secs = ").expect("write");
        assert!(load_config_from(&path).is_err());
    }

    #[test]
    fn db_path_precedence() {
        let config = LanesConfig {
            storage: StorageConfig {
                db_path: Some(PathBuf::from("/cfg.db")),
            },
            ..LanesConfig::default()
        };
        let data = Some(PathBuf::from("/data"));

        let flag = resolve_db_path_with(
            Some(Path::new("/flag.db")),
            Some(PathBuf::from("/env.db")),
            &config,
            data.clone(),
        )
        .expect("flag");
        assert_eq!(flag, PathBuf::from("/flag.db"));

        let env_db =
            resolve_db_path_with(None, Some(PathBuf::from("/env.db")), &config, data.clone())
                .expect("env");
        assert_eq!(env_db, PathBuf::from("/env.db"));

        let from_config = resolve_db_path_with(None, None, &config, data.clone()).expect("config");
        assert_eq!(from_config, PathBuf::from("/cfg.db"));

        let fallback =
            resolve_db_path_with(None, None, &LanesConfig::default(), data).expect("data dir");
        assert_eq!(fallback, PathBuf::from("/data/lanes/lanes.db"));

        assert!(resolve_db_path_with(None, None, &LanesConfig::default(), None).is_err());
    }

    #[test]
    fn cli_json_overrides_env_and_config() {
        let output = resolve_output_with(true, Some("pretty".to_string()), Some("text".to_string()))
            .expect("resolve should succeed");
        assert_eq!(output, "json");
    }

    #[test]
    fn env_beats_config_and_aliases_normalize() {
        let text = resolve_output_with(false, Some("human".to_string()), Some("plain".to_string()))
            .expect("resolve should succeed");
        assert_eq!(text, "text");

        let pretty = resolve_output_with(false, Some("human".to_string()), Some("bogus".to_string()))
            .expect("resolve should succeed");
        assert_eq!(pretty, "pretty");
    }
}
