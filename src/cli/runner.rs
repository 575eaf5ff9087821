//! CLI scenario runner.
//!
//! A scenario is a JSON-lines script of host-side stimuli: notifications
//! arriving, clicks, banner taps, deep links and session changes. Each step
//! is applied to the context in order; the resulting core events are printed
//! by the output handler.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Deserialize;

use crate::linking::ScreenName;
use crate::notifications::tags::CREATE_WEEK_AMOUNT_PARAM;
use crate::notifications::{HistoryDay, NotificationClickEvent, RawNotification};
use crate::session::UserIdentity;

use super::bootstrap::CliContext;

/// One line of a scenario file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// A notification arrives while the app is in the foreground.
    ///
    /// A string `payload` is delivered verbatim; any other JSON value is
    /// serialized first.
    ForegroundNotification {
        title: String,
        #[serde(default)]
        body: String,
        #[serde(default)]
        payload: serde_json::Value,
    },
    /// The user clicks a delivered notification.
    Click {
        #[serde(default)]
        action_id: Option<String>,
        #[serde(default)]
        title: String,
    },
    TapBanner,
    DismissBanner,
    OpenUrl {
        uri: String,
    },
    SignIn {
        user: UserIdentity,
    },
    SignOut,
    UpdateProfile {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        avatar: Option<String>,
    },
    /// An exercise was marked as done.
    Activity {
        exercise: String,
    },
    /// The history screen finished loading.
    ///
    /// The weekly amount is tagged when the current history screen was opened
    /// with `createWeekExercisesAmount`, or when the step asks for it.
    HistoryLoaded {
        days: Vec<HistoryDay>,
        #[serde(default)]
        create_week_exercises_amount: bool,
    },
    /// Wait for the persisted session lookup to finish.
    WaitSession,
}

impl ScenarioStep {
    fn label(&self) -> &'static str {
        match self {
            ScenarioStep::ForegroundNotification { .. } => "foreground_notification",
            ScenarioStep::Click { .. } => "click",
            ScenarioStep::TapBanner => "tap_banner",
            ScenarioStep::DismissBanner => "dismiss_banner",
            ScenarioStep::OpenUrl { .. } => "open_url",
            ScenarioStep::SignIn { .. } => "sign_in",
            ScenarioStep::SignOut => "sign_out",
            ScenarioStep::UpdateProfile { .. } => "update_profile",
            ScenarioStep::Activity { .. } => "activity",
            ScenarioStep::HistoryLoaded { .. } => "history_loaded",
            ScenarioStep::WaitSession => "wait_session",
        }
    }
}

/// Parse a scenario, skipping blank lines and `#` comments.
///
/// Errors carry the 1-based line number.
pub fn parse_scenario(source: &str) -> Result<Vec<ScenarioStep>> {
    source
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(number, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid step on line {}", number))
        })
        .collect()
}

/// Parse and run a scenario. Returns the number of steps applied.
///
/// Execution stops on the first failing step.
pub async fn run_scenario(ctx: &CliContext, source: &str) -> Result<usize> {
    let steps = parse_scenario(source)?;
    if steps.is_empty() {
        anyhow::bail!("Scenario contains no steps");
    }

    let total = steps.len();
    for (i, step) in steps.into_iter().enumerate() {
        if ctx.args.verbose {
            eprintln!("[scenario] [{}/{}] {}", i + 1, total, step.label());
        }
        let label = step.label();
        apply_step(ctx, step)
            .await
            .with_context(|| format!("Step {} ({}) failed", i + 1, label))?;

        // Let spawned tag writes and restoration make progress between steps
        tokio::task::yield_now().await;
    }

    Ok(total)
}

async fn apply_step(ctx: &CliContext, step: ScenarioStep) -> Result<()> {
    match step {
        ScenarioStep::ForegroundNotification {
            title,
            body,
            payload,
        } => {
            let raw_payload = match payload {
                serde_json::Value::Null => Vec::new(),
                serde_json::Value::String(text) => text.into_bytes(),
                other => serde_json::to_vec(&other)?,
            };
            ctx.push
                .deliver_foreground(RawNotification::new(title, body, raw_payload));
        }
        ScenarioStep::Click { action_id, title } => {
            ctx.push.deliver_click(NotificationClickEvent {
                action_id,
                notification: RawNotification::new(title, "", Vec::new()),
            });
        }
        ScenarioStep::TapBanner => ctx.surface.banner().act().await,
        ScenarioStep::DismissBanner => ctx.surface.banner().dismiss(),
        ScenarioStep::OpenUrl { uri } => {
            ctx.surface.open_url(&uri);
        }
        ScenarioStep::SignIn { user } => ctx.app.session.sign_in(user).await?,
        ScenarioStep::SignOut => ctx.app.session.sign_out().await,
        ScenarioStep::UpdateProfile { name, avatar } => {
            ctx.app
                .session
                .update_profile(|user| {
                    if let Some(name) = name {
                        user.name = name;
                    }
                    if avatar.is_some() {
                        user.avatar = avatar;
                    }
                })
                .await?
        }
        ScenarioStep::Activity { exercise } => ctx.app.tagger.on_activity(&exercise),
        ScenarioStep::HistoryLoaded {
            days,
            create_week_exercises_amount,
        } => {
            let container = ctx.surface.container();
            let mut params = if container.current_screen() == Some(ScreenName::History) {
                container.current_params()
            } else {
                BTreeMap::new()
            };
            if create_week_exercises_amount {
                params.insert(CREATE_WEEK_AMOUNT_PARAM.to_string(), "true".to_string());
            }
            if let Some(amount) = ctx.app.tagger.on_history_screen(&days, &params, Utc::now()) {
                tracing::debug!("History loaded, {} exercise(s) this month", amount);
            }
        }
        ScenarioStep::WaitSession => ctx.app.session.wait_restored().await,
    }
    Ok(())
}
