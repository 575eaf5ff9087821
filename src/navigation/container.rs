use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use super::gate::MountedTree;
use crate::error::Result;
use crate::linking::{LinkResolution, LinkResolver, LinkingConfig, ScreenName};
use crate::platform::{CoreEvent, EventSink};

/// What happened to a navigation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NavigationOutcome {
    Navigated {
        screen: ScreenName,
        params: BTreeMap<String, String>,
    },
    /// The link resolved, but the mounted tree has no such screen
    NotHandled { screen: ScreenName },
    /// No route matched the link
    Unmatched,
}

struct Position {
    tree: MountedTree,
    screen: Option<ScreenName>,
    params: BTreeMap<String, String>,
}

/// Holds the mounted tree and the current screen, and routes deep links.
pub struct NavigationContainer {
    resolver: LinkResolver,
    position: RwLock<Position>,
    sink: Arc<dyn EventSink>,
}

impl NavigationContainer {
    /// Build a container from the linking configuration supplied at mount.
    pub fn new(linking: LinkingConfig, sink: Arc<dyn EventSink>) -> Result<Self> {
        linking.validate()?;
        Ok(Self {
            resolver: LinkResolver::new(linking),
            position: RwLock::new(Position {
                tree: MountedTree::Placeholder,
                screen: None,
                params: BTreeMap::new(),
            }),
            sink,
        })
    }

    pub fn mounted_tree(&self) -> MountedTree {
        self.position.read().tree
    }

    pub fn current_screen(&self) -> Option<ScreenName> {
        self.position.read().screen
    }

    pub fn current_params(&self) -> BTreeMap<String, String> {
        self.position.read().params.clone()
    }

    /// Swap the mounted tree, resetting to its initial screen.
    ///
    /// Mounting the tree that is already mounted keeps the current screen.
    pub fn mount_tree(&self, tree: MountedTree) {
        {
            let mut position = self.position.write();
            if position.tree == tree {
                return;
            }
            position.tree = tree;
            position.screen = tree.initial_screen();
            position.params.clear();
        }

        tracing::info!("Mounted {:?} route tree", tree);
        self.sink.emit_lossy(CoreEvent::RouteTreeMounted { tree });
    }

    /// Resolve a deep link and navigate to it.
    ///
    /// Links to screens outside the mounted tree are reported as
    /// `NotHandled`; they are not deferred or replayed after a session change.
    pub fn open_url(&self, uri: &str) -> NavigationOutcome {
        let outcome = match self.resolver.resolve(uri) {
            LinkResolution::Matched(link) => self.navigate(link.screen, link.params),
            LinkResolution::Unmatched => NavigationOutcome::Unmatched,
        };

        self.sink.emit_lossy(CoreEvent::Navigation {
            uri: uri.to_string(),
            outcome: outcome.clone(),
        });
        outcome
    }

    pub fn navigate(&self, screen: ScreenName, params: BTreeMap<String, String>) -> NavigationOutcome {
        let mut position = self.position.write();
        if !position.tree.contains(screen) {
            tracing::debug!(
                "Screen {} is not part of the {:?} tree",
                screen,
                position.tree
            );
            return NavigationOutcome::NotHandled { screen };
        }

        position.screen = Some(screen);
        position.params = params.clone();
        tracing::debug!("Navigated to {}", screen);
        NavigationOutcome::Navigated { screen, params }
    }
}
