use std::sync::Arc;

use serde::Serialize;

use super::decoder::RawNotification;
use crate::platform::{CoreEvent, EventSink};

/// Payload of the provider's "user clicked" hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationClickEvent {
    /// Application-defined action button id, absent for a plain tap
    pub action_id: Option<String>,
    pub notification: RawNotification,
}

/// Coarse branch taken on a notification click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickAction {
    ViewAll,
    ViewOrder,
    None,
}

impl ClickAction {
    pub fn from_action_id(action_id: Option<&str>) -> Self {
        match action_id {
            Some("1") => ClickAction::ViewAll,
            Some("2") => ClickAction::ViewOrder,
            _ => ClickAction::None,
        }
    }
}

/// Handles notification clicks at application scope.
///
/// Only logs the branch taken; the banner state machine never sees clicks.
pub struct ClickRouter {
    sink: Arc<dyn EventSink>,
}

impl ClickRouter {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    pub fn on_click(&self, event: &NotificationClickEvent) -> ClickAction {
        let action = ClickAction::from_action_id(event.action_id.as_deref());
        match action {
            ClickAction::ViewAll => tracing::info!("Notification action: view all"),
            ClickAction::ViewOrder => tracing::info!("Notification action: view order"),
            ClickAction::None => tracing::info!("No notification action button selected"),
        }
        self.sink.emit_lossy(CoreEvent::NotificationClicked { action });
        action
    }
}
