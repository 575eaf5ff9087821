//! Session-gated navigation and push-notification delivery for the Ignite Gym client.
//!
//! The host platform supplies its collaborators through the traits in
//! [`platform`]; [`state::AppState`] wires the application-scoped pieces and
//! [`navigation::NavigationSurface`] the mount-scoped ones.

pub mod error;
pub mod linking;
pub mod navigation;
pub mod notifications;
pub mod platform;
pub mod session;
pub mod settings;
pub mod state;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{IgniteError, Result};
pub use navigation::NavigationSurface;
pub use platform::{CoreEvent, EventSink};
pub use state::{AppState, Platform, PushSetup};
