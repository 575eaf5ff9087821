//! CLI bootstrap - Wire the client core against in-process platform collaborators.
//!
//! This module provides `CliContext`, which owns the same application and
//! mount scoped state a mobile host would, with the push provider, URI
//! launcher and tag transport replaced by their local implementations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;

use crate::linking::LinkingConfig;
use crate::navigation::NavigationSurface;
use crate::platform::{
    ChannelEventSink, EventSink, EventUriOpener, FileSessionPersistence, LocalPushProvider,
    LoggingTagTransport,
};
use crate::settings::{get_with_env_fallback, ignite_dir, IgniteSettings, SettingsManager};
use crate::state::{AppState, Platform, PushSetup};

use super::args::Args;
use super::output::run_event_loop;

/// How long shutdown waits for the output handler to drain.
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Context for CLI execution containing all initialized services.
///
/// Field order matters: the surface must unmount before the app state goes.
pub struct CliContext {
    /// Mounted navigation surface (banner, container, route gate)
    pub surface: NavigationSurface,

    /// Application-scoped state
    pub app: AppState,

    /// Local push provider, used to inject notifications and clicks
    pub push: Arc<LocalPushProvider>,

    /// Local tag transport, holding the latest value per tag
    pub tags: Arc<LoggingTagTransport>,

    /// Settings manager
    pub settings_manager: Arc<SettingsManager>,

    /// Command-line arguments
    pub args: Args,

    /// Background task printing core events
    output: Option<JoinHandle<Result<()>>>,
}

impl CliContext {
    /// Graceful shutdown - unmount, release the platform, drain output.
    pub async fn shutdown(mut self) -> Result<()> {
        let output = self.output.take();
        // Dropping the context releases every event sender
        drop(self);

        if let Some(handle) = output {
            match tokio::time::timeout(OUTPUT_DRAIN_TIMEOUT, handle).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => tracing::warn!("Output handler error: {}", e),
                Ok(Err(e)) => tracing::warn!("Output handler panicked: {}", e),
                Err(_) => tracing::warn!("Output handler did not drain in time"),
            }
        }

        Ok(())
    }
}

/// Initialize the CLI context with all services.
///
/// This is the CLI counterpart of a mobile host's startup: load settings,
/// build the platform collaborators, start session restoration and mount the
/// navigation surface.
pub async fn initialize(args: &Args) -> Result<CliContext> {
    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        // Only warn on errors other than file not found
        if !matches!(e, dotenvy::Error::Io(_)) {
            tracing::warn!("Failed to load .env file: {}", e);
        }
    }

    // Load settings
    let settings_manager = Arc::new(match args.settings {
        Some(ref path) => SettingsManager::with_path(path.clone()).await,
        None => SettingsManager::new().await,
    }
    .context("Failed to initialize settings manager")?);

    if args.init_settings {
        if let Err(e) = settings_manager.ensure_settings_file().await {
            tracing::warn!("Failed to create settings template: {}", e);
        }
    }

    let settings = settings_manager.get().await;
    init_logging(&settings, args.verbose);

    if args.verbose {
        eprintln!(
            "[cli] Settings loaded from {}",
            settings_manager.path().display()
        );
    }

    let push_setup = PushSetup {
        app_id: get_with_env_fallback(&settings.notifications.app_id, &["ONESIGNAL_APP_ID"], None),
        request_permission: settings.notifications.request_permission,
    };

    let linking = LinkingConfig::with_prefixes(settings.linking.all_prefixes())
        .context("Invalid linking settings")?;
    linking.validate().context("Invalid linking settings")?;

    let session_path = resolve_session_path(&settings, args);
    if args.verbose {
        eprintln!("[cli] Session file: {}", session_path.display());
    }

    // Create event channel and start printing before anything can emit
    let (sink, event_rx) = ChannelEventSink::channel();
    let sink: Arc<dyn EventSink> = Arc::new(sink);
    let json_mode = args.json;
    let quiet_mode = args.quiet;
    let output = tokio::spawn(async move { run_event_loop(event_rx, json_mode, quiet_mode).await });

    let push = Arc::new(LocalPushProvider::new(Arc::clone(&sink)));
    let tags = Arc::new(LoggingTagTransport::new(Arc::clone(&sink)));
    let platform = Platform {
        persistence: Arc::new(FileSessionPersistence::new(session_path)),
        push: push.clone(),
        opener: Arc::new(EventUriOpener::new(Arc::clone(&sink))),
        tags: tags.clone(),
        sink,
    };

    let app = AppState::new(platform, linking, push_setup);
    let surface = NavigationSurface::mount(&app).context("Failed to mount navigation surface")?;

    Ok(CliContext {
        surface,
        app,
        push,
        tags,
        settings_manager,
        args: args.clone(),
        output: Some(output),
    })
}

fn init_logging(settings: &IgniteSettings, verbose: bool) {
    let directive = if verbose {
        "ignite_gym=debug"
    } else {
        settings.logging.filter.as_str()
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(directive))
        .unwrap_or_else(|e| {
            eprintln!("[cli] Invalid log filter '{}': {}", directive, e);
            tracing_subscriber::EnvFilter::new("ignite_gym=warn")
        });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Session file: CLI argument, then settings, then `~/.ignite/session.json`.
fn resolve_session_path(settings: &IgniteSettings, args: &Args) -> PathBuf {
    if let Some(ref path) = args.session_file {
        return path.clone();
    }

    match settings.session.storage_path.as_deref() {
        Some(path) if !path.trim().is_empty() => expand_home(path),
        _ => ignite_dir().join("session.json"),
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
