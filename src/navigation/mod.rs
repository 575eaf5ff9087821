//! Route gate and navigation container.
//!
//! The gate decides which route tree is mounted from the session state; the
//! container tracks the current screen and routes deep links into it.

mod container;
mod gate;
mod surface;

pub use container::{NavigationContainer, NavigationOutcome};
pub use gate::MountedTree;
pub use surface::NavigationSurface;
