use std::sync::Arc;

use super::container::{NavigationContainer, NavigationOutcome};
use super::gate::MountedTree;
use crate::error::Result;
use crate::notifications::BannerController;
use crate::platform::{ForegroundHandler, ForegroundWillDisplay, ListenerRegistration};
use crate::session::Subscription;
use crate::state::AppState;

/// The mounted navigation surface.
///
/// Owns everything whose lifetime is tied to the mount: the navigation
/// container, the banner controller, its foreground listener and the session
/// subscription that drives the route gate. Dropping the surface unmounts it.
pub struct NavigationSurface {
    container: Arc<NavigationContainer>,
    banner: Arc<BannerController>,
    _session: Subscription,
    _foreground: ListenerRegistration,
}

impl NavigationSurface {
    pub fn mount(app: &AppState) -> Result<Self> {
        let banner = Arc::new(BannerController::new(
            Arc::clone(&app.opener),
            Arc::clone(&app.sink),
        ));

        let weak_banner = Arc::downgrade(&banner);
        let handler: ForegroundHandler = Arc::new(move |event: &dyn ForegroundWillDisplay| {
            if let Some(banner) = weak_banner.upgrade() {
                banner.on_foreground_notification(event);
            }
        });
        let foreground = ListenerRegistration::foreground(Arc::clone(&app.push), handler);

        // An error from here on drops `foreground`, removing the listener
        let container = Arc::new(NavigationContainer::new(
            app.linking.clone(),
            Arc::clone(&app.sink),
        )?);

        // Subscribe before reading the state so no transition falls in between
        let weak_container = Arc::downgrade(&container);
        let session = app.session.subscribe(move |state| {
            if let Some(container) = weak_container.upgrade() {
                container.mount_tree(MountedTree::for_session(state));
            }
        });
        container.mount_tree(MountedTree::for_session(&app.session.state()));

        tracing::info!("Navigation surface mounted");
        Ok(Self {
            container,
            banner,
            _session: session,
            _foreground: foreground,
        })
    }

    pub fn container(&self) -> &NavigationContainer {
        &self.container
    }

    pub fn banner(&self) -> &BannerController {
        &self.banner
    }

    pub fn open_url(&self, uri: &str) -> NavigationOutcome {
        self.container.open_url(uri)
    }

    pub fn unmount(self) {
        // Drop does the work
    }
}

impl Drop for NavigationSurface {
    fn drop(&mut self) {
        self.banner.tear_down();
        tracing::info!("Navigation surface unmounted");
    }
}
