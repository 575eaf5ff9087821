use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use uuid::Uuid;

use super::{SessionState, UserIdentity};
use crate::error::{IgniteError, Result};
use crate::platform::SessionPersistence;

/// Callback invoked on every session transition.
pub type SessionListener = Arc<dyn Fn(&SessionState) + Send + Sync>;

type ListenerList = Mutex<Vec<(Uuid, SessionListener)>>;

struct Current {
    state: SessionState,
    /// Bumped on every transition so async writers can detect a newer one
    generation: u64,
}

/// Owns the authentication state and notifies subscribers on change.
pub struct SessionStore {
    current: RwLock<Current>,
    listeners: Arc<ListenerList>,
    persistence: Arc<dyn SessionPersistence>,
    /// Flipped to `true` once restoration has finished (either way)
    restored: watch::Sender<bool>,
}

impl SessionStore {
    /// Create the store in `Loading` and start restoring the persisted session.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(persistence: Arc<dyn SessionPersistence>) -> Arc<Self> {
        let store = Arc::new(Self::unrestored(persistence));

        let task_store = Arc::clone(&store);
        tokio::spawn(async move {
            task_store.restore().await;
        });

        store
    }

    fn unrestored(persistence: Arc<dyn SessionPersistence>) -> Self {
        let (restored, _) = watch::channel(false);
        Self {
            current: RwLock::new(Current {
                state: SessionState::Loading,
                generation: 0,
            }),
            listeners: Arc::new(Mutex::new(Vec::new())),
            persistence,
            restored,
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.current.read().state.clone()
    }

    /// Register a listener. It stays registered until the returned
    /// [`Subscription`] is dropped or unsubscribed.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        self.listeners.lock().push((id, Arc::new(listener)));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    pub fn set_authenticated(&self, user: UserIdentity) {
        self.transition(SessionState::Authenticated { user });
    }

    pub fn set_unauthenticated(&self) {
        self.transition(SessionState::Unauthenticated);
    }

    /// Persist the identity, then transition to `Authenticated`.
    ///
    /// On persistence failure the state is left untouched.
    pub async fn sign_in(&self, user: UserIdentity) -> Result<()> {
        self.persistence.persist(&user).await?;
        tracing::info!("Signed in as {}", user.email);
        self.set_authenticated(user);
        Ok(())
    }

    /// Clear the persisted identity, then transition to `Unauthenticated`.
    pub async fn sign_out(&self) {
        if let Err(e) = self.persistence.clear().await {
            tracing::warn!("Failed to clear persisted session: {}", e);
        }
        tracing::info!("Signed out");
        self.set_unauthenticated();
    }

    /// Mutate the authenticated identity, persist it and re-publish.
    ///
    /// If the session changes while the identity is being persisted (for
    /// example a sign-out), the update is abandoned with `NotAuthenticated`
    /// and the persisted identity is brought back in line with the newer
    /// state.
    pub async fn update_profile<F>(&self, update: F) -> Result<()>
    where
        F: FnOnce(&mut UserIdentity),
    {
        let (mut user, generation) = {
            let current = self.current.read();
            let user = current
                .state
                .user()
                .cloned()
                .ok_or(IgniteError::NotAuthenticated)?;
            (user, current.generation)
        };
        update(&mut user);

        self.persistence.persist(&user).await?;

        let superseded = {
            let mut current = self.current.write();
            let same_user = current.state.user().map(|u| u.id.as_str()) == Some(user.id.as_str());
            if current.generation == generation && same_user {
                current.generation += 1;
                current.state = SessionState::Authenticated { user: user.clone() };
                None
            } else {
                Some(current.state.clone())
            }
        };

        match superseded {
            None => {
                tracing::debug!("Profile updated for user {}", user.id);
                self.notify(&SessionState::Authenticated { user });
                Ok(())
            }
            Some(newer) => {
                tracing::warn!(
                    "Session changed to {} while updating profile, discarding update",
                    newer.name()
                );
                self.resync_persisted(&newer).await;
                Err(IgniteError::NotAuthenticated)
            }
        }
    }

    /// Rewrite the persisted identity to match `state`, logging failures.
    async fn resync_persisted(&self, state: &SessionState) {
        let result = match state.user() {
            Some(user) => self.persistence.persist(user).await,
            None => self.persistence.clear().await,
        };
        if let Err(e) = result {
            tracing::warn!("Failed to resync persisted session: {}", e);
        }
    }

    /// Resolve once the startup restoration has finished.
    pub async fn wait_restored(&self) {
        let mut rx = self.restored.subscribe();
        let _ = rx.wait_for(|done| *done).await;
    }

    async fn restore(&self) {
        let next = match self.persistence.restore().await {
            Ok(Some(user)) => {
                tracing::info!("Restored session for {}", user.email);
                SessionState::Authenticated { user }
            }
            Ok(None) => {
                tracing::debug!("No persisted session found");
                SessionState::Unauthenticated
            }
            Err(e) => {
                // Never retried; a failed lookup counts as no session
                tracing::warn!("Session restore failed: {}", e);
                SessionState::Unauthenticated
            }
        };

        {
            let mut current = self.current.write();
            if !current.state.is_loading() {
                // An explicit sign-in/sign-out already happened
                tracing::debug!(
                    "Discarding restored session, state is {}",
                    current.state.name()
                );
                drop(current);
                self.restored.send_replace(true);
                return;
            }
            current.generation += 1;
            current.state = next.clone();
        }

        self.notify(&next);
        self.restored.send_replace(true);
    }

    fn transition(&self, next: SessionState) {
        {
            let mut current = self.current.write();
            current.generation += 1;
            current.state = next.clone();
        }
        tracing::debug!("Session transitioned to {}", next.name());
        self.notify(&next);
    }

    fn notify(&self, state: &SessionState) {
        // Snapshot so listeners may subscribe/unsubscribe re-entrantly
        let listeners: Vec<SessionListener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(state);
        }
    }
}

/// Handle returned by [`SessionStore::subscribe`].
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    id: Uuid,
    listeners: Weak<ListenerList>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.lock().retain(|(id, _)| *id != self.id);
        }
    }
}
