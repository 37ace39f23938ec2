//! Command-line interface for zenith
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::app::App;
use crate::config::Config;
use crate::error::Result;
use crate::lock::{FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::output::OutputOptions;
use crate::storage::{self, DATA_DIR_ENV};

mod session;
mod task;

/// zenith - local task tracking
///
/// Sign in, then add, edit, toggle, filter and search tasks. State is kept
/// in a data directory between runs.
#[derive(Parser, Debug)]
#[command(name = "zenith")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (defaults to the platform data directory)
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    pub dir: Option<PathBuf>,

    /// Configuration file (defaults to config.toml in the data directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in with the demo profile
    Login,

    /// Sign out and clear stored tasks
    Logout,

    /// Show the signed-in identity
    Whoami,

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task
    Add {
        /// Task title (1-100 characters)
        title: String,

        /// Optional description (up to 500 characters)
        #[arg(short, long, default_value = "")]
        description: String,

        /// Due date: YYYY-MM-DD, "today" or "tomorrow"
        #[arg(long)]
        due: String,
    },

    /// Edit a task's title, description or due date
    Edit {
        /// Task id or unique prefix
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// Due date: YYYY-MM-DD, "today" or "tomorrow"
        #[arg(long)]
        due: Option<String>,
    },

    /// Flip a task between open and complete
    Toggle {
        /// Task id or unique prefix
        id: String,
    },

    /// Delete a task
    #[command(alias = "delete")]
    Rm {
        /// Task id or unique prefix
        id: String,
    },

    /// List tasks in the current view
    #[command(alias = "list")]
    Ls {
        /// Status tab: all, open, complete
        #[arg(short, long)]
        filter: Option<String>,

        /// Sort order: due-date, created-at, title
        #[arg(short, long)]
        sort: Option<String>,

        /// Case-insensitive text to find in title or description
        #[arg(long)]
        search: Option<String>,
    },

    /// Count tasks per status tab
    Count {
        /// Status tab: all, open, complete
        #[arg(short, long)]
        filter: Option<String>,

        /// Case-insensitive text to find in title or description
        #[arg(long)]
        search: Option<String>,
    },

    /// Simulate a sync with the server
    Refresh,
}

/// Held by every command for its whole run
const DATA_DIR_LOCK_FILE: &str = "zenith.lock";

/// Resolved per-invocation settings shared by every command
pub(crate) struct Context {
    pub dir: PathBuf,
    pub config: Config,
    pub output: OutputOptions,
}

impl Context {
    fn resolve(cli: &Cli) -> Result<Self> {
        let dir = storage::resolve_data_dir(cli.dir.as_deref())?;
        let config = match cli.config.as_deref() {
            Some(path) => Config::load(path)?,
            None => Config::load_from_dir(&dir),
        };
        tracing::debug!(dir = %dir.display(), "resolved data directory");
        Ok(Self {
            dir,
            config,
            output: OutputOptions {
                json: cli.json,
                quiet: cli.quiet,
            },
        })
    }

    /// Lock the data directory, then build the app over it.
    ///
    /// The lock is held for the whole command so a load, change and save
    /// cycle never interleaves with another zenith process.
    pub fn open_app(&self) -> Result<(FileLock, App)> {
        let path = self.dir.join(DATA_DIR_LOCK_FILE);
        let lock = match FileLock::try_acquire(&path)? {
            Some(lock) => lock,
            None => {
                tracing::info!(path = %path.display(), "waiting for another zenith process");
                FileLock::acquire(&path, DEFAULT_LOCK_TIMEOUT_MS)?
            }
        };
        tracing::debug!(path = %lock.path().display(), "locked data directory");
        Ok((lock, App::open(&self.dir, &self.config)))
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let ctx = Context::resolve(&self)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        runtime.block_on(dispatch(ctx, self.command))
    }
}

async fn dispatch(ctx: Context, command: Commands) -> Result<()> {
    match command {
        Commands::Login => session::run_login(&ctx).await,
        Commands::Logout => session::run_logout(&ctx),
        Commands::Whoami => session::run_whoami(&ctx),
        Commands::Task(cmd) => match cmd {
            TaskCommands::Add {
                title,
                description,
                due,
            } => task::run_add(
                &ctx,
                task::AddOptions {
                    title,
                    description,
                    due,
                },
            ),
            TaskCommands::Edit {
                id,
                title,
                description,
                due,
            } => task::run_edit(
                &ctx,
                task::EditOptions {
                    id,
                    title,
                    description,
                    due,
                },
            ),
            TaskCommands::Toggle { id } => task::run_toggle(&ctx, &id),
            TaskCommands::Rm { id } => task::run_rm(&ctx, &id),
            TaskCommands::Ls {
                filter,
                sort,
                search,
            } => task::run_ls(
                &ctx,
                task::ViewOptions {
                    filter,
                    sort,
                    search,
                },
            ),
            TaskCommands::Count { filter, search } => task::run_count(
                &ctx,
                task::ViewOptions {
                    filter,
                    sort: None,
                    search,
                },
            ),
            TaskCommands::Refresh => task::run_refresh(&ctx).await,
        },
    }
}
