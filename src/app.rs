//! Application context: the session and task stores, built once at startup.
//!
//! Task access is gated on a signed-in session. Both stores are driven
//! through `&mut self`, so a second login or refresh cannot start while one
//! is in flight, and dropping an in-flight call clears its loading flag.

use std::path::Path;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::{LoginOutcome, SessionStore};
use crate::storage::Storage;
use crate::store::TaskStore;

/// Which top-level screen the session state selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Tasks,
}

#[derive(Debug)]
pub struct App {
    session: SessionStore,
    tasks: TaskStore,
    /// Hydration problems not yet shown to the user
    warnings: Vec<String>,
}

impl App {
    /// Build both stores over `storage` and hydrate them
    pub fn start(config: &Config, storage: Storage, clock: Arc<dyn Clock>, rng: StdRng) -> Self {
        let mut session = SessionStore::new(storage.clone(), config.session.clone(), rng);
        session.hydrate();

        let mut tasks = TaskStore::new(storage, clock, config.tasks.clone());
        let mut warnings = Vec::new();
        if session.is_authenticated() {
            warnings.extend(tasks.hydrate());
        }

        Self {
            session,
            tasks,
            warnings,
        }
    }

    /// File-backed app over `dir`, using the wall clock and an OS-seeded rng
    pub fn open(dir: &Path, config: &Config) -> Self {
        Self::start(
            config,
            Storage::open(dir),
            Arc::new(SystemClock),
            StdRng::from_os_rng(),
        )
    }

    pub fn screen(&self) -> Screen {
        if self.session.is_authenticated() {
            Screen::Tasks
        } else {
            Screen::Login
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Drain warnings raised while restoring stored data
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    pub fn tasks(&self) -> Result<&TaskStore> {
        if self.session.is_authenticated() {
            Ok(&self.tasks)
        } else {
            Err(Error::NotAuthenticated)
        }
    }

    pub fn tasks_mut(&mut self) -> Result<&mut TaskStore> {
        if self.session.is_authenticated() {
            Ok(&mut self.tasks)
        } else {
            Err(Error::NotAuthenticated)
        }
    }

    /// Sign in. Already signed in returns the current identity unchanged.
    pub async fn login(&mut self) -> LoginOutcome {
        if let Some(identity) = self.session.identity() {
            return LoginOutcome::Authenticated {
                identity: identity.clone(),
                warning: None,
            };
        }

        let outcome = self.session.login().await;
        if matches!(outcome, LoginOutcome::Authenticated { .. }) {
            self.warnings.extend(self.tasks.hydrate());
        }
        outcome
    }

    /// Sign out, wiping stored data and the in-memory task list
    pub fn logout(&mut self) -> Option<String> {
        let warning = self.session.logout();
        self.tasks.reset();
        warning
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.tasks_mut()?.refresh().await;
        Ok(())
    }
}
