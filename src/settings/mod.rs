//! TOML-based settings for the Ignite client core.
//!
//! Settings are loaded from `~/.ignite/settings.toml` with environment variable
//! interpolation support. Values that also have a conventional environment
//! variable (such as `ONESIGNAL_APP_ID`) go through `get_with_env_fallback`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::settings::{SettingsManager, get_with_env_fallback};
//!
//! let manager = SettingsManager::new().await?;
//! let settings = manager.get().await;
//!
//! let app_id = get_with_env_fallback(
//!     &settings.notifications.app_id,
//!     &["ONESIGNAL_APP_ID"],
//!     None,
//! );
//! ```

pub mod loader;
pub mod schema;

pub use loader::{get_with_env_fallback, ignite_dir, SettingsManager};
pub use schema::IgniteSettings;
