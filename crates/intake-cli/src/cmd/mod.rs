pub mod agent;
pub mod client;
pub mod hierarchy;
pub mod init;
pub mod pool;
pub mod star;
pub mod sweep;
pub mod transition;

use crate::actor;
use crate::output::{CliError, OutputMode, render_error};
use anyhow::Context as _;
use intake_core::config::{self, IntakeConfig};
use intake_core::db;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Everything a command needs to locate and open the project store.
#[derive(Debug, Clone)]
pub struct Context {
    pub project_root: PathBuf,
    pub config: IntakeConfig,
    pub db_path: PathBuf,
    pub output: OutputMode,
    pub actor_flag: Option<String>,
}

impl Context {
    /// Load `.intake/config.toml` under `project_root` and resolve the store
    /// path, honoring a `--db` override.
    pub fn load(
        project_root: &Path,
        db_override: Option<&Path>,
        output: OutputMode,
        actor_flag: Option<String>,
    ) -> anyhow::Result<Self> {
        let config = config::load_config(project_root)?;
        let db_path =
            db_override.map_or_else(|| config.store_path(project_root), Path::to_path_buf);
        Ok(Self {
            project_root: project_root.to_path_buf(),
            config,
            db_path,
            output,
            actor_flag,
        })
    }

    /// Open the existing store. Commands other than `init` never create it.
    pub fn open_store(&self) -> anyhow::Result<Connection> {
        if !self.db_path.exists() {
            let msg = format!("No intake store at {}", self.db_path.display());
            render_error(
                self.output,
                &CliError::with_details(
                    &msg,
                    "Run 'intake init' to create a new store",
                    "not_initialized",
                ),
            )
            .ok();
            anyhow::bail!("{msg}");
        }
        db::open_store(&self.db_path)
            .with_context(|| format!("open store {}", self.db_path.display()))
    }

    /// Resolve the acting identity or render a `missing_actor` error.
    pub fn require_actor(&self) -> anyhow::Result<String> {
        match actor::require_actor(self.actor_flag.as_deref()) {
            Ok(actor) => Ok(actor),
            Err(e) => {
                render_error(
                    self.output,
                    &CliError::with_details(&e.message, "Set --actor or INTAKE_ACTOR", e.code),
                )?;
                anyhow::bail!("{}", e.message);
            }
        }
    }
}
