//! In-process platform collaborators.
//!
//! Used by the CLI runtime to replay scenarios, and by the tests. The push
//! provider dispatches to registered listeners the way the mobile SDK does,
//! and falls back to "native presentation" when nobody intercepts.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::{
    ClickHandler, CoreEvent, EventSink, ForegroundHandler, ForegroundWillDisplay, ListenerId,
    PlatformError, PushProvider, SessionPersistence, TagTransport, UriOpener,
};
use crate::notifications::{NotificationClickEvent, RawNotification};
use crate::session::UserIdentity;

// ============================================================================
// ChannelEventSink
// ============================================================================

/// Forwards events to an unbounded channel consumed by the host.
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<CoreEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::UnboundedSender<CoreEvent>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<CoreEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: CoreEvent) -> Result<(), PlatformError> {
        self.tx
            .send(event)
            .map_err(|_| PlatformError::ReceiverClosed)
    }
}

// ============================================================================
// LocalPushProvider
// ============================================================================

struct LocalWillDisplay {
    notification: RawNotification,
    prevented: AtomicBool,
}

impl ForegroundWillDisplay for LocalWillDisplay {
    fn notification(&self) -> &RawNotification {
        &self.notification
    }

    fn prevent_default(&self) {
        self.prevented.store(true, Ordering::SeqCst);
    }
}

/// Push provider that delivers notifications handed to it in-process.
pub struct LocalPushProvider {
    app_id: RwLock<Option<String>>,
    permission_requested: AtomicBool,
    foreground: RwLock<Vec<(ListenerId, ForegroundHandler)>>,
    click: RwLock<Vec<(ListenerId, ClickHandler)>>,
    sink: Arc<dyn EventSink>,
}

impl LocalPushProvider {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            app_id: RwLock::new(None),
            permission_requested: AtomicBool::new(false),
            foreground: RwLock::new(Vec::new()),
            click: RwLock::new(Vec::new()),
            sink,
        }
    }

    /// Deliver a notification while the app is in the foreground.
    ///
    /// Returns `true` if the provider presented it natively because no
    /// listener called `prevent_default`.
    pub fn deliver_foreground(&self, notification: RawNotification) -> bool {
        let event = LocalWillDisplay {
            notification,
            prevented: AtomicBool::new(false),
        };

        // Snapshot so handlers can (de)register without deadlocking
        let handlers: Vec<ForegroundHandler> = self
            .foreground
            .read()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(&event);
        }

        if event.prevented.load(Ordering::SeqCst) {
            return false;
        }
        tracing::info!(
            "Presenting notification '{}' natively",
            event.notification.title
        );
        self.sink.emit_lossy(CoreEvent::NativePresentation {
            title: event.notification.title,
        });
        true
    }

    /// Deliver a click on a notification.
    pub fn deliver_click(&self, event: NotificationClickEvent) {
        let handlers: Vec<ClickHandler> = self
            .click
            .read()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(&event);
        }
    }

    /// Application id passed to `initialize`, if any.
    pub fn app_id(&self) -> Option<String> {
        self.app_id.read().clone()
    }

    pub fn permission_requested(&self) -> bool {
        self.permission_requested.load(Ordering::SeqCst)
    }

    pub fn foreground_listener_count(&self) -> usize {
        self.foreground.read().len()
    }
}

impl PushProvider for LocalPushProvider {
    fn initialize(&self, app_id: &str) {
        let previous = self.app_id.write().replace(app_id.to_string());
        if let Some(previous) = previous {
            tracing::warn!("Push provider re-initialized, replacing app id {}", previous);
        }
        tracing::info!("Push provider initialized for app {}", app_id);
        self.sink.emit_lossy(CoreEvent::PushInitialized {
            app_id: app_id.to_string(),
        });
    }

    fn request_permission(&self) {
        self.permission_requested.store(true, Ordering::SeqCst);
        tracing::info!("Requesting notification permission");
        self.sink.emit_lossy(CoreEvent::PermissionRequested);
    }

    fn add_foreground_listener(&self, handler: ForegroundHandler) -> ListenerId {
        let id = Uuid::new_v4();
        self.foreground.write().push((id, handler));
        id
    }

    fn remove_foreground_listener(&self, id: ListenerId) {
        self.foreground.write().retain(|(existing, _)| *existing != id);
    }

    fn add_click_listener(&self, handler: ClickHandler) -> ListenerId {
        let id = Uuid::new_v4();
        self.click.write().push((id, handler));
        id
    }

    fn remove_click_listener(&self, id: ListenerId) {
        self.click.write().retain(|(existing, _)| *existing != id);
    }
}

// ============================================================================
// EventUriOpener
// ============================================================================

/// "Opens" a URI by validating it and reporting it to the host.
pub struct EventUriOpener {
    sink: Arc<dyn EventSink>,
}

impl EventUriOpener {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl UriOpener for EventUriOpener {
    async fn open(&self, uri: &str) -> Result<(), PlatformError> {
        let parsed = url::Url::parse(uri)
            .map_err(|e| PlatformError::Rejected(format!("{}: {}", uri, e)))?;
        tracing::debug!("Opening {} URI", parsed.scheme());
        self.sink.emit(CoreEvent::UriOpened {
            uri: uri.to_string(),
        })
    }
}

// ============================================================================
// FileSessionPersistence
// ============================================================================

/// Stores the signed-in identity as JSON on disk.
pub struct FileSessionPersistence {
    path: PathBuf,
}

impl FileSessionPersistence {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl SessionPersistence for FileSessionPersistence {
    async fn restore(&self) -> Result<Option<UserIdentity>, PlatformError> {
        if !self.path.exists() {
            tracing::debug!("No session file at {:?}", self.path);
            return Ok(None);
        }

        let contents = tokio::fs::read_to_string(&self.path).await?;
        let user = serde_json::from_str(&contents)?;
        Ok(Some(user))
    }

    async fn persist(&self, user: &UserIdentity) -> Result<(), PlatformError> {
        let json = serde_json::to_string_pretty(user)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Atomic write: write to temp file, then rename
        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, json).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        tracing::debug!("Persisted session to {:?}", self.path);
        Ok(())
    }

    async fn clear(&self) -> Result<(), PlatformError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// LoggingTagTransport
// ============================================================================

/// Keeps the latest value per tag and reports each write to the host.
pub struct LoggingTagTransport {
    tags: Mutex<BTreeMap<String, String>>,
    sink: Arc<dyn EventSink>,
}

impl LoggingTagTransport {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            tags: Mutex::new(BTreeMap::new()),
            sink,
        }
    }

    pub fn tags(&self) -> BTreeMap<String, String> {
        self.tags.lock().clone()
    }
}

#[async_trait]
impl TagTransport for LoggingTagTransport {
    async fn add_tag(&self, key: &str, value: &str) -> Result<(), PlatformError> {
        self.tags.lock().insert(key.to_string(), value.to_string());
        tracing::info!("Tag {} = {}", key, value);
        self.sink.emit(CoreEvent::TagWritten {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}
