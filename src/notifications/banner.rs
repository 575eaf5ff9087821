use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use super::decoder::{decode, DecodedNotification};
use crate::platform::{CoreEvent, EventSink, ForegroundWillDisplay, UriOpener};

/// At most one banner is visible at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BannerState {
    None,
    Showing(DecodedNotification),
}

struct Slot {
    state: BannerState,
    /// Bumped on every show so a slow `act()` never hides a newer banner
    generation: u64,
    torn_down: bool,
}

/// Owns the in-app banner for notifications that arrive in the foreground.
///
/// New notifications replace the visible one; there is no queue.
pub struct BannerController {
    slot: RwLock<Slot>,
    opener: Arc<dyn UriOpener>,
    sink: Arc<dyn EventSink>,
}

impl BannerController {
    pub fn new(opener: Arc<dyn UriOpener>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            slot: RwLock::new(Slot {
                state: BannerState::None,
                generation: 0,
                torn_down: false,
            }),
            opener,
            sink,
        }
    }

    pub fn state(&self) -> BannerState {
        self.slot.read().state.clone()
    }

    /// Foreground "will display" hook.
    ///
    /// Native presentation is suppressed before this returns. Undecodable
    /// payloads still show a title-only banner.
    pub fn on_foreground_notification(&self, event: &dyn ForegroundWillDisplay) {
        let raw = event.notification();
        let decoded = match decode(raw) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!("Notification {} degraded to title only: {}", raw.id, e);
                DecodedNotification::title_only(raw.title.clone())
            }
        };
        self.show(event, decoded);
    }

    fn show(&self, event: &dyn ForegroundWillDisplay, decoded: DecodedNotification) {
        let replaced = {
            let mut slot = self.slot.write();
            if slot.torn_down {
                // Leave the notification to the provider's own presentation
                tracing::debug!("Banner controller torn down, ignoring notification");
                return;
            }
            event.prevent_default();
            slot.generation += 1;
            let previous = std::mem::replace(&mut slot.state, BannerState::Showing(decoded.clone()));
            matches!(previous, BannerState::Showing(_))
        };

        if replaced {
            tracing::debug!("Replacing visible banner with '{}'", decoded.title);
        }
        self.sink.emit_lossy(CoreEvent::BannerShown {
            title: decoded.title,
            redirect_uri: decoded.redirect_uri,
        });
    }

    /// Hide the banner. No-op when nothing is showing.
    pub fn dismiss(&self) {
        let was_showing = {
            let mut slot = self.slot.write();
            matches!(
                std::mem::replace(&mut slot.state, BannerState::None),
                BannerState::Showing(_)
            )
        };
        if was_showing {
            self.sink.emit_lossy(CoreEvent::BannerDismissed);
        }
    }

    /// Hide the banner only if it is still the one shown at `generation`.
    fn dismiss_generation(&self, generation: u64) {
        let was_showing = {
            let mut slot = self.slot.write();
            if slot.generation != generation {
                tracing::debug!("Banner replaced while acting, keeping the newer one");
                return;
            }
            matches!(
                std::mem::replace(&mut slot.state, BannerState::None),
                BannerState::Showing(_)
            )
        };
        if was_showing {
            self.sink.emit_lossy(CoreEvent::BannerDismissed);
        }
    }

    /// Tap on the banner: open the redirect (if any), then hide.
    pub async fn act(&self) {
        let (redirect, generation) = {
            let slot = self.slot.read();
            match &slot.state {
                BannerState::None => return,
                BannerState::Showing(decoded) => (decoded.redirect_uri.clone(), slot.generation),
            }
        };

        if let Some(uri) = redirect {
            tracing::info!("Opening notification redirect {}", uri);
            if let Err(e) = self.opener.open(&uri).await {
                tracing::warn!("Failed to open {}: {}", uri, e);
            }
        }
        self.dismiss_generation(generation);
    }

    /// Called on unmount. Later events are left to the provider.
    pub fn tear_down(&self) {
        let mut slot = self.slot.write();
        slot.torn_down = true;
        slot.state = BannerState::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::RawNotification;
    use crate::platform::{ChannelEventSink, PlatformError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::{mpsc, Notify};

    struct TestEvent {
        notification: RawNotification,
        prevented: AtomicBool,
    }

    impl TestEvent {
        fn new(title: &str, payload: &str) -> Self {
            Self {
                notification: RawNotification::new(title, "", payload.as_bytes().to_vec()),
                prevented: AtomicBool::new(false),
            }
        }
    }

    impl ForegroundWillDisplay for TestEvent {
        fn notification(&self) -> &RawNotification {
            &self.notification
        }

        fn prevent_default(&self) {
            self.prevented.store(true, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct RecordingOpener {
        opened: Mutex<Vec<String>>,
        gate: Option<Arc<Notify>>,
        fail: bool,
    }

    #[async_trait]
    impl UriOpener for RecordingOpener {
        async fn open(&self, uri: &str) -> Result<(), PlatformError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.opened.lock().push(uri.to_string());
            if self.fail {
                return Err(PlatformError::Rejected(uri.to_string()));
            }
            Ok(())
        }
    }

    fn controller(
        opener: Arc<RecordingOpener>,
    ) -> (BannerController, mpsc::UnboundedReceiver<CoreEvent>) {
        let (sink, rx) = ChannelEventSink::channel();
        (BannerController::new(opener, Arc::new(sink)), rx)
    }

    const REDIRECT: &str = r#"{"custom":"{\"u\":\"igniteGym://exercise/42\"}"}"#;

    fn showing(title: &str, redirect: Option<&str>) -> BannerState {
        BannerState::Showing(DecodedNotification {
            title: title.to_string(),
            redirect_uri: redirect.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn test_act_opens_redirect_and_dismisses() {
        let opener = Arc::new(RecordingOpener::default());
        let (banner, _rx) = controller(opener.clone());
        let event = TestEvent::new("New PR!", REDIRECT);

        banner.on_foreground_notification(&event);
        assert!(event.prevented.load(Ordering::SeqCst));
        assert_eq!(
            banner.state(),
            showing("New PR!", Some("igniteGym://exercise/42"))
        );

        banner.act().await;
        assert_eq!(*opener.opened.lock(), vec!["igniteGym://exercise/42"]);
        assert_eq!(banner.state(), BannerState::None);
    }

    #[tokio::test]
    async fn test_act_without_redirect_only_dismisses() {
        let opener = Arc::new(RecordingOpener::default());
        let (banner, _rx) = controller(opener.clone());

        banner.on_foreground_notification(&TestEvent::new("Hi", r#"{"custom":"{}"}"#));
        banner.act().await;

        assert!(opener.opened.lock().is_empty());
        assert_eq!(banner.state(), BannerState::None);
    }

    #[tokio::test]
    async fn test_open_failure_still_dismisses() {
        let opener = Arc::new(RecordingOpener {
            fail: true,
            ..Default::default()
        });
        let (banner, _rx) = controller(opener);

        banner.on_foreground_notification(&TestEvent::new("New PR!", REDIRECT));
        banner.act().await;
        assert_eq!(banner.state(), BannerState::None);
    }

    #[test]
    fn test_malformed_payload_degrades_to_title_only() {
        let (banner, _rx) = controller(Arc::new(RecordingOpener::default()));
        let event = TestEvent::new("Treino novo", "{broken");

        banner.on_foreground_notification(&event);
        assert!(event.prevented.load(Ordering::SeqCst));
        assert_eq!(banner.state(), showing("Treino novo", None));
    }

    #[test]
    fn test_dismiss_on_none_is_noop() {
        let (banner, mut rx) = controller(Arc::new(RecordingOpener::default()));
        banner.dismiss();
        assert_eq!(banner.state(), BannerState::None);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_slow_open_does_not_hide_newer_banner() {
        let gate = Arc::new(Notify::new());
        let opener = Arc::new(RecordingOpener {
            gate: Some(Arc::clone(&gate)),
            ..Default::default()
        });
        let (banner, _rx) = controller(opener);
        let banner = Arc::new(banner);

        banner.on_foreground_notification(&TestEvent::new("a", REDIRECT));
        let acting = {
            let banner = Arc::clone(&banner);
            tokio::spawn(async move { banner.act().await })
        };
        tokio::task::yield_now().await;

        banner.on_foreground_notification(&TestEvent::new("b", r#"{"custom":"{}"}"#));
        gate.notify_one();
        acting.await.unwrap();

        assert_eq!(banner.state(), showing("b", None));
    }

    #[test]
    fn test_torn_down_controller_leaves_native_presentation() {
        let (banner, _rx) = controller(Arc::new(RecordingOpener::default()));
        banner.tear_down();

        let event = TestEvent::new("late", REDIRECT);
        banner.on_foreground_notification(&event);

        assert!(!event.prevented.load(Ordering::SeqCst));
        assert_eq!(banner.state(), BannerState::None);
    }

    #[test]
    fn test_stale_generation_keeps_newer_banner() {
        let (banner, mut rx) = controller(Arc::new(RecordingOpener::default()));
        banner.on_foreground_notification(&TestEvent::new("a", REDIRECT));
        let stale = banner.slot.read().generation;
        banner.on_foreground_notification(&TestEvent::new("b", r#"{"custom":"{}"}"#));
        while rx.try_recv().is_ok() {}

        banner.dismiss_generation(stale);
        assert_eq!(banner.state(), showing("b", None));
        assert!(rx.try_recv().is_err());

        banner.dismiss_generation(stale + 1);
        assert_eq!(banner.state(), BannerState::None);
        assert!(matches!(rx.try_recv(), Ok(CoreEvent::BannerDismissed)));
    }

    #[tokio::test]
    async fn test_tear_down_while_acting_rejects_later_notifications() {
        let gate = Arc::new(Notify::new());
        let opener = Arc::new(RecordingOpener {
            gate: Some(Arc::clone(&gate)),
            ..Default::default()
        });
        let (banner, _rx) = controller(opener);
        let banner = Arc::new(banner);

        banner.on_foreground_notification(&TestEvent::new("a", REDIRECT));
        let acting = {
            let banner = Arc::clone(&banner);
            tokio::spawn(async move { banner.act().await })
        };
        tokio::task::yield_now().await;

        banner.tear_down();
        let late = TestEvent::new("late", r#"{"custom":"{}"}"#);
        banner.on_foreground_notification(&late);
        gate.notify_one();
        acting.await.unwrap();

        assert!(banner.slot.read().torn_down);
        assert!(!late.prevented.load(Ordering::SeqCst));
        assert_eq!(banner.state(), BannerState::None);
    }

    proptest! {
        /// Only the most recent notification is ever showing.
        #[test]
        fn prop_last_write_wins(titles in proptest::collection::vec("[a-zA-Z ]{1,16}", 1..8)) {
            let (banner, _rx) = controller(Arc::new(RecordingOpener::default()));
            for title in &titles {
                banner.on_foreground_notification(&TestEvent::new(title, r#"{"custom":"{}"}"#));
            }
            let last = titles.last().unwrap();
            prop_assert_eq!(banner.state(), showing(last, None));
        }
    }
}
