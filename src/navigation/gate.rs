use serde::Serialize;

use crate::linking::ScreenName;
use crate::session::SessionState;

/// Route tree mounted under the navigation container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MountedTree {
    /// Loading placeholder while the session is restored
    Placeholder,
    Unauthenticated,
    Authenticated,
}

const UNAUTHENTICATED_SCREENS: &[ScreenName] = &[ScreenName::SignIn, ScreenName::SignUp];
const AUTHENTICATED_SCREENS: &[ScreenName] = &[
    ScreenName::Home,
    ScreenName::Exercise,
    ScreenName::Profile,
    ScreenName::History,
];

impl MountedTree {
    /// The route gate: the mounted tree is a pure function of session state.
    pub fn for_session(state: &SessionState) -> Self {
        match state {
            SessionState::Loading => MountedTree::Placeholder,
            SessionState::Unauthenticated => MountedTree::Unauthenticated,
            SessionState::Authenticated { .. } => MountedTree::Authenticated,
        }
    }

    pub fn screens(&self) -> &'static [ScreenName] {
        match self {
            MountedTree::Placeholder => &[],
            MountedTree::Unauthenticated => UNAUTHENTICATED_SCREENS,
            MountedTree::Authenticated => AUTHENTICATED_SCREENS,
        }
    }

    pub fn initial_screen(&self) -> Option<ScreenName> {
        self.screens().first().copied()
    }

    pub fn contains(&self, screen: ScreenName) -> bool {
        self.screens().contains(&screen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::UserIdentity;

    fn authenticated() -> SessionState {
        SessionState::Authenticated {
            user: UserIdentity {
                id: "1".to_string(),
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                avatar: None,
            },
        }
    }

    #[test]
    fn test_gate_maps_each_state() {
        assert_eq!(
            MountedTree::for_session(&SessionState::Loading),
            MountedTree::Placeholder
        );
        assert_eq!(
            MountedTree::for_session(&SessionState::Unauthenticated),
            MountedTree::Unauthenticated
        );
        assert_eq!(
            MountedTree::for_session(&authenticated()),
            MountedTree::Authenticated
        );
    }

    #[test]
    fn test_trees_do_not_share_screens() {
        for screen in MountedTree::Unauthenticated.screens() {
            assert!(!MountedTree::Authenticated.contains(*screen));
        }
        assert_eq!(MountedTree::Placeholder.initial_screen(), None);
        assert_eq!(
            MountedTree::Unauthenticated.initial_screen(),
            Some(ScreenName::SignIn)
        );
        assert_eq!(
            MountedTree::Authenticated.initial_screen(),
            Some(ScreenName::Home)
        );
    }
}
