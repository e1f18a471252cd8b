//! Configuration for the content mirror.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (MIRROR_HOME, MIRROR_OUTPUT, NOTION_DATABASE_ID)
//! 2. Config file (.mirror/config.yaml)
//! 3. Defaults (~/.content-mirror)
//!
//! Config file discovery:
//! - Searches current directory and parents for .mirror/config.yaml
//! - Paths in config file are relative to the project root (parent of .mirror/)
//!
//! The API token is only ever read from `NOTION_TOKEN`.

pub mod paths;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::notion::{DEFAULT_API_VERSION, DEFAULT_BASE_URL};
use crate::adapters::StatusFilter;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Environment variable holding the API token
pub const TOKEN_ENV: &str = "NOTION_TOKEN";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
    #[serde(default)]
    pub sync: Option<SyncConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to project root)
    pub home: Option<String>,
    /// Backup output directory (relative to project root)
    pub output: Option<String>,
    /// Media directory (relative to project root)
    pub media: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    pub base_url: Option<String>,
    pub api_version: Option<String>,
    pub database_id: Option<String>,
    pub status_property: Option<String>,
    pub visible_states: Option<Vec<String>>,
    pub published_state: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    pub concurrency: Option<usize>,
    pub block_depth: Option<usize>,
    pub mark_published: Option<bool>,
    pub media_prefix: Option<String>,
}

/// Remote store settings
#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub base_url: String,
    pub api_version: String,
    pub database_id: Option<String>,
    pub status_property: String,
    /// Lifecycle states treated as visible (logical OR)
    pub visible_states: Vec<String>,
    /// State a page is moved to after a successful sync
    pub published_state: String,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            database_id: None,
            status_property: "Status".to_string(),
            visible_states: vec!["Ready to Publish".to_string(), "Published".to_string()],
            published_state: "Published".to_string(),
        }
    }
}

impl RemoteSettings {
    pub fn status_filter(&self) -> StatusFilter {
        StatusFilter::new(&self.status_property, &self.visible_states)
    }
}

/// Sync run settings
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub concurrency: usize,
    pub block_depth: usize,
    pub mark_published: bool,
    /// Public path prefix of cached media
    pub media_prefix: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            concurrency: 8,
            block_depth: 0,
            mark_published: false,
            media_prefix: "/media".to_string(),
        }
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// State directory
    pub home: PathBuf,
    /// Backup output directory
    pub output: PathBuf,
    /// Cached media directory
    pub media: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub remote: RemoteSettings,
    pub sync: SyncSettings,
}

impl ResolvedConfig {
    /// Database to sync, required for any remote operation
    pub fn database_id(&self) -> Result<&str> {
        self.remote.database_id.as_deref().context(
            "No database configured. Set NOTION_DATABASE_ID or remote.database_id in .mirror/config.yaml",
        )
    }
}

/// Read the API token from the environment
pub fn api_token() -> Result<String> {
    std::env::var(TOKEN_ENV).with_context(|| format!("{} is not set", TOKEN_ENV))
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".mirror").join("config.yaml");
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

/// Resolve a path that may be relative to the project root
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

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name).ok().map(PathBuf::from)
}

/// Merge a parsed config file over defaults. `base_dir` is the project root.
fn resolve(config: Option<(ConfigFile, &Path)>, default_home: PathBuf) -> ResolvedConfig {
    let (paths, remote_cfg, sync_cfg, base_dir) = match config {
        Some((file, base)) => (file.paths, file.remote, file.sync, Some(base)),
        None => (PathsConfig::default(), None, None, None),
    };

    let from_file = |value: &Option<String>| -> Option<PathBuf> {
        match (value, base_dir) {
            (Some(v), Some(base)) => Some(resolve_path(base, v)),
            (Some(v), None) => Some(PathBuf::from(v)),
            _ => None,
        }
    };

    let home = env_path("MIRROR_HOME")
        .or_else(|| from_file(&paths.home))
        .unwrap_or(default_home);

    let output = env_path("MIRROR_OUTPUT")
        .or_else(|| from_file(&paths.output))
        .unwrap_or_else(|| home.join("backup"));

    let media = from_file(&paths.media).unwrap_or_else(|| output.join("media"));

    let mut remote = RemoteSettings::default();
    if let Some(cfg) = remote_cfg {
        if let Some(v) = cfg.base_url {
            remote.base_url = v;
        }
        if let Some(v) = cfg.api_version {
            remote.api_version = v;
        }
        remote.database_id = cfg.database_id;
        if let Some(v) = cfg.status_property {
            remote.status_property = v;
        }
        if let Some(v) = cfg.visible_states.filter(|s| !s.is_empty()) {
            remote.visible_states = v;
        }
        if let Some(v) = cfg.published_state {
            remote.published_state = v;
        }
    }
    if let Ok(id) = std::env::var("NOTION_DATABASE_ID") {
        remote.database_id = Some(id);
    }

    let mut sync = SyncSettings::default();
    if let Some(cfg) = sync_cfg {
        if let Some(v) = cfg.concurrency {
            sync.concurrency = v.max(1);
        }
        if let Some(v) = cfg.block_depth {
            sync.block_depth = v;
        }
        if let Some(v) = cfg.mark_published {
            sync.mark_published = v;
        }
        if let Some(v) = cfg.media_prefix {
            sync.media_prefix = v;
        }
    }

    ResolvedConfig {
        home,
        output,
        media,
        config_file: None,
        remote,
        sync,
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".content-mirror");

    let config_file = find_config_file();

    let mut resolved = match config_file {
        Some(ref config_path) => {
            let parsed = load_config_file(config_path)?;

            // Base directory is the parent of .mirror/ (grandparent of config.yaml)
            let base_dir = config_path
                .parent()
                .and_then(|p| p.parent())
                .unwrap_or(Path::new("."));

            resolve(Some((parsed, base_dir)), default_home)
        }
        None => resolve(None, default_home),
    };

    resolved.config_file = config_file;
    Ok(resolved)
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
