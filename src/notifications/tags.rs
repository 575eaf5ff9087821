//! Segmentation tags pushed to the notification provider.
//!
//! Every write is independent and best-effort: failures are logged and
//! dropped, and no ordering between writes is guaranteed.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::TagTransport;
use crate::session::{SessionStore, Subscription, UserIdentity};

pub const TAG_USER_NAME: &str = "user_name";
pub const TAG_USER_EMAIL: &str = "user_email";
pub const TAG_LAST_EXERCISE: &str = "last_exercise";
pub const TAG_LAST_EXERCISE_TIME: &str = "last_exerciseTime";
pub const TAG_WEEKLY_EXERCISES_AMOUNT: &str = "weekly_exercises_amount";

/// History screen param requesting the weekly amount tag.
pub const CREATE_WEEK_AMOUNT_PARAM: &str = "createWeekExercisesAmount";

/// One logged exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub group: String,
    pub created_at: DateTime<Utc>,
}

/// History section: one day and the exercises logged on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryDay {
    pub title: String,
    pub data: Vec<HistoryEntry>,
}

/// Number of exercises logged in the calendar month of `now`.
///
/// Both year and month must match, compared in UTC.
pub fn exercises_this_month(days: &[HistoryDay], now: DateTime<Utc>) -> usize {
    days.iter()
        .flat_map(|day| &day.data)
        .filter(|entry| {
            entry.created_at.year() == now.year() && entry.created_at.month() == now.month()
        })
        .count()
}

/// Fire-and-forget attribute writer.
pub struct AttributeTagger {
    transport: Arc<dyn TagTransport>,
}

impl AttributeTagger {
    pub fn new(transport: Arc<dyn TagTransport>) -> Self {
        Self { transport }
    }

    /// Tag identity on every transition into `Authenticated`.
    pub fn observe(self: &Arc<Self>, store: &SessionStore) -> Subscription {
        let tagger = Arc::clone(self);
        store.subscribe(move |state| {
            if let Some(user) = state.user() {
                tagger.on_sign_in(user);
            }
        })
    }

    pub fn on_sign_in(&self, user: &UserIdentity) {
        self.write(TAG_USER_NAME, user.name.clone());
        self.write(TAG_USER_EMAIL, user.email.clone());
    }

    pub fn on_activity(&self, exercise: &str) {
        self.write(TAG_LAST_EXERCISE, exercise.to_string());
        self.write(TAG_LAST_EXERCISE_TIME, Utc::now().timestamp().to_string());
    }

    pub fn on_weekly_amount_computed(&self, amount: usize) {
        self.write(TAG_WEEKLY_EXERCISES_AMOUNT, amount.to_string());
    }

    /// Count this month's exercises from a loaded history and tag the amount.
    pub fn on_history_loaded(&self, days: &[HistoryDay], now: DateTime<Utc>) -> usize {
        let amount = exercises_this_month(days, now);
        self.on_weekly_amount_computed(amount);
        amount
    }

    /// History screen finished loading with the params it was opened with.
    ///
    /// The amount is only tagged when the screen was opened with
    /// `createWeekExercisesAmount` set; returns the tagged amount.
    pub fn on_history_screen(
        &self,
        days: &[HistoryDay],
        params: &BTreeMap<String, String>,
        now: DateTime<Utc>,
    ) -> Option<usize> {
        let requested = params
            .get(CREATE_WEEK_AMOUNT_PARAM)
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);
        if !requested {
            tracing::debug!("History loaded without {}, not tagging", CREATE_WEEK_AMOUNT_PARAM);
            return None;
        }
        Some(self.on_history_loaded(days, now))
    }

    fn write(&self, key: &'static str, value: String) {
        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            match transport.add_tag(key, &value).await {
                Ok(()) => tracing::debug!("Tagged {}={}", key, value),
                Err(e) => tracing::warn!("Failed to write tag {}: {}", key, e),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformError;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use tokio::sync::mpsc;

    struct ChannelTransport {
        tx: mpsc::UnboundedSender<(String, String)>,
        fail_key: Option<&'static str>,
    }

    #[async_trait]
    impl TagTransport for ChannelTransport {
        async fn add_tag(&self, key: &str, value: &str) -> Result<(), PlatformError> {
            if self.fail_key == Some(key) {
                return Err(PlatformError::Unavailable("provider".to_string()));
            }
            let _ = self.tx.send((key.to_string(), value.to_string()));
            Ok(())
        }
    }

    fn tagger(fail_key: Option<&'static str>) -> (AttributeTagger, mpsc::UnboundedReceiver<(String, String)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            AttributeTagger::new(Arc::new(ChannelTransport { tx, fail_key })),
            rx,
        )
    }

    async fn collect(rx: &mut mpsc::UnboundedReceiver<(String, String)>, n: usize) -> Vec<(String, String)> {
        let mut tags = Vec::new();
        for _ in 0..n {
            tags.push(rx.recv().await.unwrap());
        }
        tags.sort();
        tags
    }

    fn entry(id: &str, created_at: DateTime<Utc>) -> HistoryEntry {
        HistoryEntry {
            id: id.to_string(),
            name: "Supino".to_string(),
            group: "peito".to_string(),
            created_at,
        }
    }

    #[tokio::test]
    async fn test_sign_in_tags_identity() {
        let (tagger, mut rx) = tagger(None);
        tagger.on_sign_in(&UserIdentity {
            id: "1".to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            avatar: None,
        });

        assert_eq!(
            collect(&mut rx, 2).await,
            vec![
                ("user_email".to_string(), "ana@example.com".to_string()),
                ("user_name".to_string(), "Ana".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_activity_tags_exercise_and_time() {
        let (tagger, mut rx) = tagger(None);
        let before = Utc::now().timestamp();
        tagger.on_activity("Remada curvada");

        let tags = collect(&mut rx, 2).await;
        assert_eq!(tags[0], ("last_exercise".to_string(), "Remada curvada".to_string()));
        assert_eq!(tags[1].0, "last_exerciseTime");
        assert!(tags[1].1.parse::<i64>().unwrap() >= before);
    }

    #[tokio::test]
    async fn test_failed_write_does_not_affect_others() {
        let (tagger, mut rx) = tagger(Some(TAG_LAST_EXERCISE));
        tagger.on_activity("Agachamento");

        let (key, _) = rx.recv().await.unwrap();
        assert_eq!(key, TAG_LAST_EXERCISE_TIME);
    }

    #[tokio::test]
    async fn test_history_amount_counts_current_month() {
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap();
        let days = vec![
            HistoryDay {
                title: "20.05.24".to_string(),
                data: vec![entry("1", now), entry("2", now)],
            },
            HistoryDay {
                title: "30.04.24".to_string(),
                data: vec![entry("3", Utc.with_ymd_and_hms(2024, 4, 30, 9, 0, 0).unwrap())],
            },
            HistoryDay {
                title: "20.05.23".to_string(),
                data: vec![entry("4", Utc.with_ymd_and_hms(2023, 5, 20, 9, 0, 0).unwrap())],
            },
        ];

        let (tagger, mut rx) = tagger(None);
        assert_eq!(tagger.on_history_loaded(&days, now), 2);
        assert_eq!(
            rx.recv().await.unwrap(),
            ("weekly_exercises_amount".to_string(), "2".to_string())
        );
    }

    #[tokio::test]
    async fn test_history_screen_tags_only_when_requested() {
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap();
        let days = vec![HistoryDay {
            title: "20.05.24".to_string(),
            data: vec![entry("1", now)],
        }];
        let (tagger, mut rx) = tagger(None);

        assert_eq!(tagger.on_history_screen(&days, &BTreeMap::new(), now), None);

        let mut params = BTreeMap::new();
        params.insert(CREATE_WEEK_AMOUNT_PARAM.to_string(), "false".to_string());
        assert_eq!(tagger.on_history_screen(&days, &params, now), None);

        params.insert(CREATE_WEEK_AMOUNT_PARAM.to_string(), "true".to_string());
        assert_eq!(tagger.on_history_screen(&days, &params, now), Some(1));

        // Only the requested load reached the provider
        assert_eq!(
            rx.recv().await.unwrap(),
            ("weekly_exercises_amount".to_string(), "1".to_string())
        );
        assert!(rx.try_recv().is_err());
    }
}
