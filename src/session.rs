//! Session store: the mocked sign-in flow and the persisted identity.
//!
//! Login is a simulated handshake. After the configured delay it fails with
//! probability `failure_rate`, otherwise it hands out the configured demo
//! profile under a fresh id and writes it to the `"user"` key.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::storage::Storage;

/// Message stored in [`SessionState::error`] when a login attempt fails
pub const AUTH_FAILED_MESSAGE: &str = "Authentication failed. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Signed in. `warning` is set when the identity could not be persisted.
    Authenticated {
        identity: Identity,
        warning: Option<String>,
    },
    Failed(String),
}

/// Holds a loading flag up for as long as it lives
struct LoadingFlag<'a>(&'a mut bool);

impl<'a> LoadingFlag<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

#[derive(Debug)]
pub struct SessionStore {
    state: SessionState,
    storage: Storage,
    config: SessionConfig,
    rng: StdRng,
}

impl SessionStore {
    pub fn new(storage: Storage, config: SessionConfig, rng: StdRng) -> Self {
        Self {
            state: SessionState::default(),
            storage,
            config,
            rng,
        }
    }

    /// Restore the persisted identity, if any.
    ///
    /// With `normalize_profile_on_load` the stored name and email are
    /// replaced by the configured profile and written back. A stored value
    /// that cannot be read counts as signed out.
    pub fn hydrate(&mut self) {
        let stored = match self.storage.load_identity() {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(%err, "ignoring unreadable stored identity");
                None
            }
        };

        let Some(mut identity) = stored else {
            self.state.identity = None;
            return;
        };

        if self.config.normalize_profile_on_load {
            let profile = &self.config.profile;
            if identity.name != profile.name || identity.email != profile.email {
                identity.name = profile.name.clone();
                identity.email = profile.email.clone();
                if let Err(err) = self.storage.save_identity(&identity) {
                    tracing::warn!(%err, "failed to persist normalized identity");
                }
            }
        }

        tracing::debug!(id = %identity.id, "restored session");
        self.state.identity = Some(identity);
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.state.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.identity.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    pub async fn login(&mut self) -> LoginOutcome {
        let _loading = LoadingFlag::raise(&mut self.state.is_loading);
        self.state.error = None;

        tokio::time::sleep(self.config.login_delay()).await;

        let rate = if self.config.failure_rate.is_finite() {
            self.config.failure_rate.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if self.rng.random_bool(rate) {
            tracing::info!("login rejected");
            self.state.error = Some(AUTH_FAILED_MESSAGE.to_string());
            return LoginOutcome::Failed(AUTH_FAILED_MESSAGE.to_string());
        }

        let profile = &self.config.profile;
        let identity = Identity {
            id: uuid::Uuid::new_v4().to_string(),
            email: profile.email.clone(),
            name: profile.name.clone(),
            picture: profile.picture.clone(),
        };

        let warning = match self.storage.save_identity(&identity) {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!(%err, "failed to persist identity");
                Some(format!("session not saved: {err}"))
            }
        };

        tracing::info!(id = %identity.id, "signed in");
        self.state.identity = Some(identity.clone());
        LoginOutcome::Authenticated { identity, warning }
    }

    /// Sign out and wipe the persisted identity and task list.
    ///
    /// Returns a warning when storage could not be cleared; the in-memory
    /// session is cleared regardless.
    pub fn logout(&mut self) -> Option<String> {
        self.state.identity = None;
        self.state.error = None;

        let mut failures = Vec::new();
        if let Err(err) = self.storage.clear_identity() {
            failures.push(err.to_string());
        }
        if let Err(err) = self.storage.clear_tasks() {
            failures.push(err.to_string());
        }

        tracing::info!("signed out");
        if failures.is_empty() {
            None
        } else {
            tracing::warn!(errors = ?failures, "failed to clear stored session data");
            Some(format!("stored data not cleared: {}", failures.join("; ")))
        }
    }

    pub fn clear_error(&mut self) {
        self.state.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfileConfig;
    use crate::storage::{TODOS_KEY, USER_KEY};
    use rand::SeedableRng;

    fn config(failure_rate: f64) -> SessionConfig {
        SessionConfig {
            login_delay_ms: 1500,
            failure_rate,
            normalize_profile_on_load: true,
            profile: ProfileConfig::default(),
        }
    }

    fn store(storage: &Storage, failure_rate: f64) -> SessionStore {
        SessionStore::new(storage.clone(), config(failure_rate), StdRng::seed_from_u64(7))
    }

    #[tokio::test(start_paused = true)]
    async fn successful_login_persists_identity() {
        let storage = Storage::in_memory();
        let mut session = store(&storage, 0.0);

        let outcome = session.login().await;
        let LoginOutcome::Authenticated { identity, warning } = outcome else {
            panic!("expected success");
        };
        assert!(warning.is_none());
        assert_eq!(identity.name, "Demo User");
        assert!(uuid::Uuid::parse_str(&identity.id).is_ok());
        assert!(session.is_authenticated());
        assert!(!session.is_loading());
        assert_eq!(storage.load_identity().unwrap(), Some(identity));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_login_sets_error_and_stays_signed_out() {
        let storage = Storage::in_memory();
        let mut session = store(&storage, 1.0);

        assert_eq!(
            session.login().await,
            LoginOutcome::Failed(AUTH_FAILED_MESSAGE.to_string())
        );
        assert!(!session.is_authenticated());
        assert_eq!(session.state().error.as_deref(), Some(AUTH_FAILED_MESSAGE));
        assert!(storage.get(USER_KEY).unwrap().is_none());

        session.clear_error();
        assert!(session.state().error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn login_waits_for_the_configured_delay() {
        let storage = Storage::in_memory();
        let mut session = store(&storage, 0.0);

        let start = tokio::time::Instant::now();
        session.login().await;
        assert!(start.elapsed() >= std::time::Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_login_clears_loading_flag() {
        let storage = Storage::in_memory();
        let mut session = store(&storage, 0.0);

        let cancelled =
            tokio::time::timeout(std::time::Duration::from_millis(10), session.login()).await;
        assert!(cancelled.is_err());
        assert!(!session.is_loading());
        assert!(!session.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn logout_clears_user_and_todos() {
        let storage = Storage::in_memory();
        storage.set(TODOS_KEY, "[]").unwrap();
        let mut session = store(&storage, 0.0);
        session.login().await;

        assert!(session.logout().is_none());
        assert!(!session.is_authenticated());
        assert!(storage.get(USER_KEY).unwrap().is_none());
        assert!(storage.get(TODOS_KEY).unwrap().is_none());
    }

    #[test]
    fn hydrate_normalizes_stored_profile() {
        let storage = Storage::in_memory();
        storage
            .save_identity(&Identity {
                id: "u-1".to_string(),
                email: "old@example.com".to_string(),
                name: "Old Name".to_string(),
                picture: None,
            })
            .unwrap();

        let mut session = store(&storage, 0.0);
        session.hydrate();
        let identity = session.identity().expect("identity");
        assert_eq!(identity.id, "u-1");
        assert_eq!(identity.name, "Demo User");
        assert_eq!(identity.email, "demo@example.com");
        assert_eq!(storage.load_identity().unwrap().unwrap().name, "Demo User");
    }

    #[test]
    fn hydrate_treats_corrupt_identity_as_signed_out() {
        let storage = Storage::in_memory();
        storage.set(USER_KEY, "{broken").unwrap();

        let mut session = store(&storage, 0.0);
        session.hydrate();
        assert!(!session.is_authenticated());
        assert_eq!(storage.get(USER_KEY).unwrap().as_deref(), Some("{broken"));
    }
}
