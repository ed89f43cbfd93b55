//! Configuration for reelscout.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (REELSCOUT_BASE_URL)
//! 2. Config file (.reelscout/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - REELSCOUT_CONFIG, when set, names the file directly
//! - Otherwise searches current directory and parents for .reelscout/config.yaml
//! - Falls back to ~/.reelscout/config.yaml

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::resolver::ResolverSettings;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<std::result::Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub service: Option<ServiceSection>,
    #[serde(default)]
    pub keys: Option<KeysSection>,
    #[serde(default)]
    pub polling: Option<PollingSection>,
    #[serde(default)]
    pub limits: Option<LimitsSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceSection {
    pub base_url: Option<String>,
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeysSection {
    pub input_prefix: Option<String>,
    pub result_prefix: Option<String>,
    pub result_suffix: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PollingSection {
    pub interval_seconds: Option<u64>,
    pub max_attempts: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitsSection {
    pub max_upload_bytes: Option<u64>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Service endpoint settings
    pub service: ServiceSettings,
    /// Object key conventions
    pub keys: KeySettings,
    /// Polling cadence and budget
    pub polling: PollingSettings,
    /// Upload limits
    pub limits: LimitSettings,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Base URL of the resolution service; required for network commands
    pub base_url: Option<String>,
    pub request_timeout_seconds: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeySettings {
    pub input_prefix: String,
    pub result_prefix: String,
    pub result_suffix: String,
}

impl Default for KeySettings {
    fn default() -> Self {
        Self {
            input_prefix: "input-videos".to_string(),
            result_prefix: "highlight-videos".to_string(),
            result_suffix: "-highlights.mp4".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollingSettings {
    pub interval_seconds: u64,
    pub max_attempts: u32,
    pub page_size: u32,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_seconds: 10,
            max_attempts: 30,
            page_size: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LimitSettings {
    pub max_upload_bytes: u64,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_upload_bytes: 5 * 1024 * 1024 * 1024, // 5GB
        }
    }
}

impl ResolvedConfig {
    /// The base URL, or an error naming where to set it
    pub fn require_base_url(&self) -> Result<&str> {
        self.service.base_url.as_deref().context(
            "service base URL is not configured; set REELSCOUT_BASE_URL or service.base_url in .reelscout/config.yaml",
        )
    }

    /// Resolver settings drawn from this configuration
    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            result_prefix: self.keys.result_prefix.clone(),
            result_suffix: self.keys.result_suffix.clone(),
            max_attempts: self.polling.max_attempts,
            page_size: self.polling.page_size,
        }
    }
}

/// Find config file by searching current directory and parents,
/// then the home directory
fn find_config_file() -> Option<PathBuf> {
    // An explicit path must not silently fall back to discovery; a
    // missing file errors at load time instead.
    if let Ok(explicit) = std::env::var("REELSCOUT_CONFIG") {
        return Some(PathBuf::from(explicit));
    }

    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".reelscout").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    let home_config = dirs::home_dir()?.join(".reelscout").join("config.yaml");
    if home_config.exists() {
        return Some(home_config);
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

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let config_file = find_config_file();

    let file = match &config_file {
        Some(path) => Some(load_config_file(path)?),
        None => None,
    };

    let base_url = if let Ok(env_url) = std::env::var("REELSCOUT_BASE_URL") {
        Some(env_url)
    } else {
        file.as_ref()
            .and_then(|f| f.service.as_ref())
            .and_then(|s| s.base_url.clone())
    };

    let service = ServiceSettings {
        base_url,
        request_timeout_seconds: file
            .as_ref()
            .and_then(|f| f.service.as_ref())
            .and_then(|s| s.request_timeout_seconds)
            .unwrap_or(30),
    };

    let keys = KeySettings {
        input_prefix: file
            .as_ref()
            .and_then(|f| f.keys.as_ref())
            .and_then(|k| k.input_prefix.clone())
            .unwrap_or_else(|| "input-videos".to_string()),
        result_prefix: file
            .as_ref()
            .and_then(|f| f.keys.as_ref())
            .and_then(|k| k.result_prefix.clone())
            .unwrap_or_else(|| "highlight-videos".to_string()),
        result_suffix: file
            .as_ref()
            .and_then(|f| f.keys.as_ref())
            .and_then(|k| k.result_suffix.clone())
            .unwrap_or_else(|| "-highlights.mp4".to_string()),
    };

    let polling = PollingSettings {
        interval_seconds: file
            .as_ref()
            .and_then(|f| f.polling.as_ref())
            .and_then(|p| p.interval_seconds)
            .unwrap_or(10),
        max_attempts: file
            .as_ref()
            .and_then(|f| f.polling.as_ref())
            .and_then(|p| p.max_attempts)
            .unwrap_or(30),
        page_size: file
            .as_ref()
            .and_then(|f| f.polling.as_ref())
            .and_then(|p| p.page_size)
            .unwrap_or(100),
    };

    let limits = LimitSettings {
        max_upload_bytes: file
            .as_ref()
            .and_then(|f| f.limits.as_ref())
            .and_then(|l| l.max_upload_bytes)
            .unwrap_or(5 * 1024 * 1024 * 1024),
    };

    Ok(ResolvedConfig {
        service,
        keys,
        polling,
        limits,
        config_file,
    })
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
