//! CLI output handling - Event receiver loop.
//!
//! Receives core events through the channel sink and renders them based on
//! output mode (terminal, JSON, or quiet). The loop ends when every sender
//! has been dropped.

use std::io::{self, Write};

use anyhow::Result;
use tokio::sync::mpsc;

use crate::navigation::NavigationOutcome;
use crate::platform::CoreEvent;

/// Run the event loop, processing events until the channel closes.
///
/// # Arguments
///
/// * `event_rx` - Channel receiver for core events
/// * `json_mode` - If true, output events as JSON lines
/// * `quiet_mode` - If true, only output navigation results and opened URIs
pub async fn run_event_loop(
    mut event_rx: mpsc::UnboundedReceiver<CoreEvent>,
    json_mode: bool,
    quiet_mode: bool,
) -> Result<()> {
    while let Some(event) = event_rx.recv().await {
        if json_mode {
            println!("{}", serde_json::to_string(&event)?);
            io::stdout().flush()?;
        } else if !quiet_mode || is_result_event(&event) {
            println!("{}", format_event(&event));
        }
    }

    Ok(())
}

fn is_result_event(event: &CoreEvent) -> bool {
    matches!(
        event,
        CoreEvent::Navigation { .. } | CoreEvent::UriOpened { .. }
    )
}

/// Render an event as a single terminal line.
fn format_event(event: &CoreEvent) -> String {
    match event {
        CoreEvent::SessionChanged { state } => match state.user() {
            Some(user) => format!("[session] {} ({})", state.name(), user.email),
            None => format!("[session] {}", state.name()),
        },
        CoreEvent::RouteTreeMounted { tree } => format!("[routes] mounted {:?}", tree),
        CoreEvent::BannerShown {
            title,
            redirect_uri,
        } => match redirect_uri {
            Some(uri) => format!("[banner] {} -> {}", title, uri),
            None => format!("[banner] {}", title),
        },
        CoreEvent::BannerDismissed => "[banner] dismissed".to_string(),
        CoreEvent::UriOpened { uri } => format!("[open] {}", uri),
        CoreEvent::Navigation { uri, outcome } => match outcome {
            NavigationOutcome::Navigated { screen, params } if params.is_empty() => {
                format!("[nav] {} -> {}", uri, screen)
            }
            NavigationOutcome::Navigated { screen, params } => {
                let params: Vec<String> =
                    params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                format!("[nav] {} -> {} ({})", uri, screen, params.join(", "))
            }
            NavigationOutcome::NotHandled { screen } => {
                format!("[nav] {} -> {} (not in mounted tree)", uri, screen)
            }
            NavigationOutcome::Unmatched => format!("[nav] {} -> no match", uri),
        },
        CoreEvent::TagWritten { key, value } => format!("[tag] {} = {}", key, value),
        CoreEvent::NativePresentation { title } => format!("[native] {}", title),
        CoreEvent::NotificationClicked { action } => format!("[click] {:?}", action),
        CoreEvent::PushInitialized { app_id } => format!("[push] initialized for {}", app_id),
        CoreEvent::PermissionRequested => "[push] permission requested".to_string(),
    }
}
