//! Settings schema definitions for the Ignite client core.
//!
//! All settings structs use `#[serde(default)]` to allow partial configuration files.
//! Missing fields are filled with sensible defaults.

use serde::{Deserialize, Serialize};

use crate::linking::DEFAULT_PREFIXES;

/// Root settings structure.
///
/// Loaded from `~/.ignite/settings.toml` with environment variable interpolation support.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IgniteSettings {
    /// Schema version for migrations
    pub version: u32,

    /// Deep link prefixes
    pub linking: LinkingSettings,

    /// Push provider configuration
    pub notifications: NotificationSettings,

    /// Session persistence
    pub session: SessionSettings,

    /// Log filtering
    pub logging: LoggingSettings,
}

/// Accepted deep link prefixes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkingSettings {
    /// URI scheme prefixes, tried in order
    pub prefixes: Vec<String>,

    /// Universal-link hosts, e.g. "https://ignitegym.app"
    pub universal_link_hosts: Vec<String>,
}

/// Push provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Provider application id (supports $ENV_VAR syntax)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,

    /// Ask the OS for notification permission on startup
    pub request_permission: bool,
}

/// Where the signed-in identity is cached.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SessionSettings {
    /// Session file path (default: ~/.ignite/session.json)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing_subscriber` filter directive
    pub filter: String,
}

impl Default for IgniteSettings {
    fn default() -> Self {
        Self {
            version: 1,
            linking: LinkingSettings::default(),
            notifications: NotificationSettings::default(),
            session: SessionSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for LinkingSettings {
    fn default() -> Self {
        Self {
            prefixes: DEFAULT_PREFIXES.iter().map(|p| p.to_string()).collect(),
            universal_link_hosts: Vec::new(),
        }
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            app_id: None,
            request_permission: true,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "ignite_gym=info".to_string(),
        }
    }
}

impl LinkingSettings {
    /// Scheme prefixes followed by universal-link hosts.
    pub fn all_prefixes(&self) -> Vec<String> {
        self.prefixes
            .iter()
            .chain(self.universal_link_hosts.iter())
            .cloned()
            .collect()
    }
}
