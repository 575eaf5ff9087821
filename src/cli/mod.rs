//! CLI module for headless scenario replay.
//!
//! This module wires the client core against in-process platform
//! collaborators so notification, deep-link and session flows can be
//! scripted and inspected without a device.
//!
//! # Architecture
//!
//! Core components emit through the `EventSink` trait. The CLI installs a
//! `ChannelEventSink` whose receiver is drained by the output handler.
//!
//! ```text
//! +-----------------+     +------------------+     +---------------+
//! | runner.rs       | --> | AppState /       | --> | output.rs     |
//! | (scenario step) |     | NavigationSurface|     | (print/JSON)  |
//! +-----------------+     +------------------+     +---------------+
//! ```

mod args;
mod bootstrap;
mod output;
mod runner;

pub use args::Args;
pub use bootstrap::{initialize, CliContext};
pub use output::run_event_loop;
pub use runner::{parse_scenario, run_scenario, ScenarioStep};
