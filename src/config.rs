//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/avx/avx.toml`
//! 3. Environment variables: `AVIATRIX_*` prefix

use std::fmt;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{Credentials, ExportProtocol};

/// Prefix shared by all environment overrides.
pub const ENV_PREFIX: &str = "AVIATRIX";

pub const ENV_CONTROLLER_IP: &str = "AVIATRIX_CONTROLLER_IP";
pub const ENV_USERNAME: &str = "AVIATRIX_USERNAME";
pub const ENV_PASSWORD: &str = "AVIATRIX_PASSWORD";

const REDACTED: &str = "********";

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub controller_ip: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub export_protocol: Option<ExportProtocol>,
}

/// Unified configuration for avx.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    /// Controller host or IP (a leading `http://`/`https://` is honored)
    pub controller_ip: String,
    /// Controller account name
    pub username: String,
    /// Controller account password
    pub password: String,
    /// Export handshake spoken by the controller
    pub export_protocol: ExportProtocol,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("controller_ip", &self.controller_ip)
            .field("username", &self.username)
            .field("password", &REDACTED)
            .field("export_protocol", &self.export_protocol)
            .finish()
    }
}

/// Get the XDG config directory for avx.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "avx").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("avx.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Merge overlay config onto self (base): overlay wins where specified.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            controller_ip: overlay
                .controller_ip
                .clone()
                .unwrap_or_else(|| self.controller_ip.clone()),
            username: overlay
                .username
                .clone()
                .unwrap_or_else(|| self.username.clone()),
            password: overlay
                .password
                .clone()
                .unwrap_or_else(|| self.password.clone()),
            export_protocol: overlay.export_protocol.unwrap_or(self.export_protocol),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/avx/avx.toml`
    /// 3. Environment variables: `AVIATRIX_*` prefix
    pub fn load() -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref())
    }

    /// Load settings using `config_file` in place of the global config.
    ///
    /// A missing file is skipped; an unreadable one is an error.
    pub fn load_from(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Config file
        if let Some(path) = config_file {
            if path.exists() {
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Environment variables (explicit override)
        Self::apply_env_overrides(current, Self::env_source())
    }

    fn env_source() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .ignore_empty(true)
    }

    /// Apply AVIATRIX_* environment variables as explicit overrides.
    ///
    /// An empty variable counts as unset.
    fn apply_env_overrides(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(env)
            .build()
            .map_err(config_err)?;
        let get = |key: &str| config.get_string(key).ok().filter(|v| !v.is_empty());

        if let Some(val) = get("controller_ip") {
            settings.controller_ip = val;
        }
        if let Some(val) = get("username") {
            settings.username = val;
        }
        if let Some(val) = get("password") {
            settings.password = val;
        }
        if let Some(val) = get("export_protocol") {
            settings.export_protocol = val.parse().map_err(|e| ApplicationError::Config {
                message: format!("AVIATRIX_EXPORT_PROTOCOL: {e}"),
            })?;
        }

        Ok(settings)
    }

    /// Validated login credentials.
    ///
    /// Reports every missing value at once, named by its environment variable.
    pub fn credentials(&self) -> Result<Credentials, ApplicationError> {
        let not_found: Vec<&str> = [
            (ENV_CONTROLLER_IP, &self.controller_ip),
            (ENV_USERNAME, &self.username),
            (ENV_PASSWORD, &self.password),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if !not_found.is_empty() {
            return Err(ApplicationError::Config {
                message: format!("environment variables {not_found:?} must be set"),
            });
        }

        Ok(Credentials {
            address: self.controller_ip.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        })
    }

    /// Show the effective configuration as TOML, password masked.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        let mut shown = self.clone();
        if !shown.password.is_empty() {
            shown.password = REDACTED.to_string();
        }
        toml::to_string_pretty(&shown).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# avx configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/avx/avx.toml
#   Env:    AVIATRIX_* environment variables (explicit overrides)
#
# Credentials are usually supplied through the environment:
#   AVIATRIX_CONTROLLER_IP, AVIATRIX_USERNAME, AVIATRIX_PASSWORD

# Controller host or IP; prefix with http:// to skip TLS
# controller_ip = "10.0.0.10"

# Controller account
# username = "admin"
# password = ""

# Export handshake: "direct-form-export" (current controllers)
# or "two-step-download" (older controllers)
# export_protocol = "direct-form-export"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
