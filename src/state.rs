use std::sync::Arc;

use crate::linking::LinkingConfig;
use crate::notifications::{AttributeTagger, ClickRouter, NotificationClickEvent};
use crate::platform::{
    ClickHandler, CoreEvent, EventSink, ListenerRegistration, PushProvider, SessionPersistence,
    TagTransport, UriOpener,
};
use crate::session::{SessionStore, Subscription};

/// The collaborators the host platform provides.
pub struct Platform {
    pub persistence: Arc<dyn SessionPersistence>,
    pub push: Arc<dyn PushProvider>,
    pub opener: Arc<dyn UriOpener>,
    pub tags: Arc<dyn TagTransport>,
    pub sink: Arc<dyn EventSink>,
}

/// Startup configuration for the push provider.
#[derive(Debug, Clone, Default)]
pub struct PushSetup {
    /// Provider application id; the provider stays uninitialized without one
    pub app_id: Option<String>,
    /// Prompt for notification permission at startup
    pub request_permission: bool,
}

/// Application-scoped state, alive for the whole process.
///
/// Mount-scoped pieces live in [`crate::navigation::NavigationSurface`].
pub struct AppState {
    pub session: Arc<SessionStore>,
    pub tagger: Arc<AttributeTagger>,
    pub clicks: Arc<ClickRouter>,
    pub push: Arc<dyn PushProvider>,
    pub opener: Arc<dyn UriOpener>,
    pub sink: Arc<dyn EventSink>,
    pub linking: LinkingConfig,
    _observers: Vec<Subscription>,
    _click_listener: ListenerRegistration,
}

impl AppState {
    /// Wire up the application. Starts session restoration, so this must run
    /// inside a Tokio runtime.
    pub fn new(platform: Platform, linking: LinkingConfig, push_setup: PushSetup) -> Self {
        match push_setup.app_id.as_deref() {
            Some(app_id) if !app_id.trim().is_empty() => platform.push.initialize(app_id),
            _ => tracing::warn!("No push provider app id configured, provider left uninitialized"),
        }
        if push_setup.request_permission {
            platform.push.request_permission();
        }

        let session = SessionStore::new(platform.persistence);
        let tagger = Arc::new(AttributeTagger::new(platform.tags));
        let clicks = Arc::new(ClickRouter::new(Arc::clone(&platform.sink)));

        let session_sink = Arc::clone(&platform.sink);
        let observers = vec![
            session.subscribe(move |state| {
                tracing::info!("Session is now {}", state.name());
                session_sink.emit_lossy(CoreEvent::SessionChanged {
                    state: state.clone(),
                });
            }),
            tagger.observe(&session),
        ];

        let router = Arc::clone(&clicks);
        let on_click: ClickHandler = Arc::new(move |event: &NotificationClickEvent| {
            router.on_click(event);
        });
        let click_listener = ListenerRegistration::click(Arc::clone(&platform.push), on_click);

        Self {
            session,
            tagger,
            clicks,
            push: platform.push,
            opener: platform.opener,
            sink: platform.sink,
            linking,
            _observers: observers,
            _click_listener: click_listener,
        }
    }
}
