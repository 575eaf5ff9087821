//! Authentication session state.
//!
//! The [`SessionStore`] is the single owner of [`SessionState`]. Everything
//! else observes it through `state()` and `subscribe()`.

mod store;

use serde::{Deserialize, Serialize};

pub use store::{SessionListener, SessionStore, Subscription};

/// The signed-in user as cached by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Avatar file reference on the API, if the user uploaded one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Current authentication state. Exactly one variant holds at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    /// Persisted-session lookup still pending
    Loading,
    Unauthenticated,
    Authenticated { user: UserIdentity },
}

impl SessionState {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Loading => "loading",
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authenticated { .. } => "authenticated",
        }
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        match self {
            SessionState::Authenticated { user } => Some(user),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_serializes_tagged() {
        let state = SessionState::Authenticated {
            user: UserIdentity {
                id: "7".to_string(),
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                avatar: None,
            },
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["status"], "authenticated");
        assert_eq!(json["user"]["email"], "ana@example.com");
        assert!(json["user"].get("avatar").is_none());
    }

    #[test]
    fn test_session_state_accessors() {
        assert!(SessionState::Loading.is_loading());
        assert_eq!(SessionState::Unauthenticated.name(), "unauthenticated");
        assert!(SessionState::Unauthenticated.user().is_none());
    }
}
