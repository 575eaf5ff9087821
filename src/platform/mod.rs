// Platform abstraction for the collaborators this core does not own.
//
// The mobile OS, the push provider SDK, credential storage and the URI
// launcher all live behind the traits below. `local` provides in-process
// implementations used by the CLI runtime and the tests.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::navigation::{MountedTree, NavigationOutcome};
use crate::notifications::{ClickAction, NotificationClickEvent, RawNotification};
use crate::session::{SessionState, UserIdentity};

pub mod local;

pub use local::{
    ChannelEventSink, EventUriOpener, FileSessionPersistence, LocalPushProvider,
    LoggingTagTransport,
};

/// Platform collaborator errors
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Event receiver closed")]
    ReceiverClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Events emitted to the host runtime
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoreEvent {
    /// Session store transitioned
    SessionChanged { state: SessionState },

    /// Route gate mounted a different tree
    RouteTreeMounted { tree: MountedTree },

    /// In-app banner became visible (or replaced the previous one)
    BannerShown {
        title: String,
        redirect_uri: Option<String>,
    },

    /// In-app banner was hidden
    BannerDismissed,

    /// An external URI was handed to the platform
    UriOpened { uri: String },

    /// A deep link went through the navigation container
    Navigation {
        uri: String,
        outcome: NavigationOutcome,
    },

    /// A segmentation tag reached the provider
    TagWritten { key: String, value: String },

    /// The provider showed its own banner because nobody intercepted
    NativePresentation { title: String },

    /// The user clicked a delivered notification
    NotificationClicked { action: ClickAction },

    /// The push provider was initialized with an application id
    PushInitialized { app_id: String },

    /// Notification permission was requested from the OS
    PermissionRequested,
}

/// Sink for [`CoreEvent`]s.
pub trait EventSink: Send + Sync + 'static {
    /// Emit an event to the host.
    ///
    /// # Errors
    /// Returns `PlatformError::ReceiverClosed` if the host stopped listening.
    fn emit(&self, event: CoreEvent) -> Result<(), PlatformError>;

    /// Emit, logging instead of failing. Events are informational.
    fn emit_lossy(&self, event: CoreEvent) {
        if let Err(e) = self.emit(event) {
            tracing::debug!("Dropped core event: {}", e);
        }
    }
}

/// Persisted-credential lookup.
#[async_trait]
pub trait SessionPersistence: Send + Sync + 'static {
    /// Look up the cached identity. `Ok(None)` means no session.
    async fn restore(&self) -> Result<Option<UserIdentity>, PlatformError>;

    async fn persist(&self, user: &UserIdentity) -> Result<(), PlatformError>;

    async fn clear(&self) -> Result<(), PlatformError>;
}

/// Platform facility that opens an absolute URI outside the app.
#[async_trait]
pub trait UriOpener: Send + Sync + 'static {
    async fn open(&self, uri: &str) -> Result<(), PlatformError>;
}

/// Key/value attribute upsert at the push provider.
///
/// The device/user identity the tag applies to is managed by the provider.
#[async_trait]
pub trait TagTransport: Send + Sync + 'static {
    async fn add_tag(&self, key: &str, value: &str) -> Result<(), PlatformError>;
}

/// A notification about to be displayed while the app is in the foreground.
pub trait ForegroundWillDisplay: Send + Sync {
    fn notification(&self) -> &RawNotification;

    /// Suppress the provider's native presentation of this notification.
    fn prevent_default(&self);
}

pub type ListenerId = Uuid;
pub type ForegroundHandler = Arc<dyn Fn(&dyn ForegroundWillDisplay) + Send + Sync>;
pub type ClickHandler = Arc<dyn Fn(&NotificationClickEvent) + Send + Sync>;

/// Push provider SDK hooks.
pub trait PushProvider: Send + Sync + 'static {
    /// Bind the provider to its application id. Called once at startup.
    fn initialize(&self, app_id: &str);

    /// Ask the OS for permission to display notifications.
    ///
    /// The outcome arrives asynchronously through the OS; this only starts
    /// the prompt.
    fn request_permission(&self);

    fn add_foreground_listener(&self, handler: ForegroundHandler) -> ListenerId;

    fn remove_foreground_listener(&self, id: ListenerId);

    fn add_click_listener(&self, handler: ClickHandler) -> ListenerId;

    fn remove_click_listener(&self, id: ListenerId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListenerKind {
    Foreground,
    Click,
}

/// Scoped registration of a push provider listener.
///
/// The listener is removed when the registration is dropped, including
/// during unwinding, so a remount never stacks a second handler.
pub struct ListenerRegistration {
    provider: Arc<dyn PushProvider>,
    id: ListenerId,
    kind: ListenerKind,
}

impl ListenerRegistration {
    pub fn foreground(provider: Arc<dyn PushProvider>, handler: ForegroundHandler) -> Self {
        let id = provider.add_foreground_listener(handler);
        tracing::debug!("Registered foreground listener {}", id);
        Self {
            provider,
            id,
            kind: ListenerKind::Foreground,
        }
    }

    pub fn click(provider: Arc<dyn PushProvider>, handler: ClickHandler) -> Self {
        let id = provider.add_click_listener(handler);
        tracing::debug!("Registered click listener {}", id);
        Self {
            provider,
            id,
            kind: ListenerKind::Click,
        }
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        match self.kind {
            ListenerKind::Foreground => self.provider.remove_foreground_listener(self.id),
            ListenerKind::Click => self.provider.remove_click_listener(self.id),
        }
        tracing::debug!("Removed {:?} listener {}", self.kind, self.id);
    }
}

