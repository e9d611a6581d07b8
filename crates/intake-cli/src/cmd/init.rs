use crate::cmd::Context;
use crate::output::render;
use anyhow::{Context as _, Result};
use clap::Args;
use intake_core::db::{self, migrations};
use serde::Serialize;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing `.intake/config.toml` with the default template.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TOML: &str = "[execution]\n\
    deadline_days = 3\n\
    platforms = [\"draftkings\", \"fanduel\", \"betmgm\", \"caesars\"]\n\
    \n\
    [notifications]\n\
    enabled = true\n\
    \n\
    [store]\n\
    path = \".intake/intake.sqlite3\"\n";

#[derive(Debug, Serialize)]
struct InitOutput {
    config_path: String,
    config_written: bool,
    db_path: String,
    schema_version: u32,
}

/// Execute `intake init`. Creates the project skeleton:
///
/// ```text
/// .intake/
///   config.toml         (default project config template)
///   intake.sqlite3      (migrated store; path configurable)
/// ```
///
/// Re-running is safe: the store is only migrated, and the config is left
/// alone unless `--force` is set.
///
/// # Errors
///
/// Returns an error if any filesystem or store operation fails.
pub fn run_init(args: &InitArgs, ctx: &Context) -> Result<()> {
    let intake_dir = ctx.project_root.join(".intake");
    std::fs::create_dir_all(&intake_dir)
        .with_context(|| format!("Failed to create {}", intake_dir.display()))?;

    let config_path = intake_dir.join("config.toml");
    let config_written = args.force || !config_path.exists();
    if config_written {
        std::fs::write(&config_path, CONFIG_TOML)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
    }

    let conn = db::open_store(&ctx.db_path)?;
    let schema_version =
        migrations::current_schema_version(&conn).context("read schema version")?;

    tracing::info!(db = %ctx.db_path.display(), schema_version, "store initialized");

    let payload = InitOutput {
        config_path: config_path.display().to_string(),
        config_written,
        db_path: ctx.db_path.display().to_string(),
        schema_version,
    };
    render(ctx.output, &payload, |p, w| {
        writeln!(w, "✓ intake project ready")?;
        writeln!(w, "  store:  {} (schema v{})", p.db_path, p.schema_version)?;
        if p.config_written {
            writeln!(w, "  config: {} (written)", p.config_path)
        } else {
            writeln!(w, "  config: {} (kept)", p.config_path)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::config::IntakeConfig;

    #[test]
    fn config_template_parses_to_defaults() {
        let parsed: IntakeConfig = toml::from_str(CONFIG_TOML).expect("template parses");
        assert_eq!(parsed, IntakeConfig::default());
    }
}
