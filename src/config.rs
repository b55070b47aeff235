//! Configuration for bookshelf paths.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (BOOKSHELF_HOME, BOOKSHELF_DATA)
//! 2. Config file (.bookshelf/config.yaml)
//! 3. Defaults (~/.bookshelf, <home>/books.json)
//!
//! Config file discovery:
//! - Searches current directory and parents for .bookshelf/config.yaml
//! - `paths.home` is relative to the .bookshelf/ directory
//! - `paths.data_file` is relative to the resolved home

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const DEFAULT_DATA_FILE: &str = "books.json";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .bookshelf/)
    pub home: Option<String>,
    /// Snapshot file (relative to home)
    pub data_file: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to bookshelf home
    pub home: PathBuf,
    /// Path to the catalog snapshot
    pub data_file: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(".bookshelf").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Resolve paths from an optional config file plus env overrides
fn resolve(
    config_file: Option<PathBuf>,
    env_home: Option<String>,
    env_data: Option<String>,
    default_home: PathBuf,
) -> Result<ResolvedConfig> {
    let paths = match config_file {
        Some(ref config_path) => load_config_file(config_path)?.paths,
        None => PathsConfig::default(),
    };

    let home = if let Some(env_home) = env_home {
        PathBuf::from(env_home)
    } else if let (Some(home_path), Some(config_path)) = (&paths.home, &config_file) {
        let bookshelf_dir = config_path.parent().unwrap_or(Path::new("."));
        resolve_path(bookshelf_dir, home_path)
    } else {
        default_home
    };

    let data_file = if let Some(env_data) = env_data {
        PathBuf::from(env_data)
    } else if let Some(ref data_path) = paths.data_file {
        resolve_path(&home, data_path)
    } else {
        home.join(DEFAULT_DATA_FILE)
    };

    Ok(ResolvedConfig {
        home,
        data_file,
        config_file,
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".bookshelf");

    let config_file = std::env::current_dir()
        .ok()
        .and_then(|cwd| find_config_file(&cwd));

    resolve(
        config_file,
        std::env::var("BOOKSHELF_HOME").ok(),
        std::env::var("BOOKSHELF_DATA").ok(),
        default_home,
    )
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

/// Get the bookshelf home directory
pub fn bookshelf_home() -> Result<PathBuf> {
    Ok(config()?.home.clone())
}

/// Get the catalog snapshot path
pub fn data_file_path() -> Result<PathBuf> {
    Ok(config()?.data_file.clone())
}
