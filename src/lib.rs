//! zenith - local task tracking library
//!
//! This library provides the core of the zenith CLI: a task store driven by
//! a pure state transition function, a mocked session, and the storage they
//! persist into.
//!
//! # Core Concepts
//!
//! - **Tasks**: titled items with a due date and an open/complete status
//! - **Actions**: every change is a [`task::TaskAction`] applied by [`task::reduce`]
//! - **View**: filter, sort and search are applied on read, never stored
//! - **Session**: a demo sign-in that gates access to tasks
//!
//! # Module Organization
//!
//! - `app`: Composes the session and task stores
//! - `cli`: Command-line interface using clap
//! - `clock`: Injectable time source
//! - `config`: Configuration loading from `config.toml`
//! - `error`: Error types and result aliases
//! - `form`: Task field validation
//! - `lock`: File locking and atomic writes
//! - `output`: Human and JSON rendering
//! - `session`: Sign-in state and the persisted identity
//! - `storage`: Key-value storage backends
//! - `store`: Task store with persistence
//! - `task`: Task model, actions and the transition function
//! - `view`: Derived views (visible tasks, counts, due labels)

pub mod app;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod form;
pub mod lock;
pub mod output;
pub mod session;
pub mod storage;
pub mod store;
pub mod task;
pub mod view;

pub use error::{Error, Result};
