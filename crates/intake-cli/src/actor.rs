//! Actor identity resolution for CLI commands.
//!
//! The resolution chain: `--actor` flag > `INTAKE_ACTOR` env.
//! Commands that write audit entries require an actor; read-only commands
//! work without one.

use std::env;

/// Errors from actor resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorResolutionError {
    /// Human-readable description.
    pub message: String,
    /// Machine error code.
    pub code: &'static str,
}

impl std::fmt::Display for ActorResolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ActorResolutionError {}

/// Environment reader trait for dependency injection in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
}

struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

fn resolve_actor_with(cli_flag: Option<&str>, env: &dyn EnvReader) -> Option<String> {
    if let Some(actor) = cli_flag.map(str::trim).filter(|a| !a.is_empty()) {
        return Some(actor.to_string());
    }
    env.get("INTAKE_ACTOR").map(|v| v.trim().to_string())
}

/// Resolve the acting identity, or `None` if neither source is set.
pub fn resolve_actor(cli_flag: Option<&str>) -> Option<String> {
    resolve_actor_with(cli_flag, &RealEnv)
}

/// Resolve the acting identity, returning an error if not found.
pub fn require_actor(cli_flag: Option<&str>) -> Result<String, ActorResolutionError> {
    resolve_actor(cli_flag).ok_or_else(|| ActorResolutionError {
        message: "Actor identity required for this command. \
                  Set --actor or the INTAKE_ACTOR environment variable."
            .to_string(),
        code: "missing_actor",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockEnv {
        vars: HashMap<String, String>,
    }

    impl MockEnv {
        fn new() -> Self {
            Self {
                vars: HashMap::new(),
            }
        }

        fn var(mut self, key: &str, val: &str) -> Self {
            self.vars.insert(key.to_string(), val.to_string());
            self
        }
    }

    impl EnvReader for MockEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.vars.get(key).filter(|v| !v.trim().is_empty()).cloned()
        }
    }

    #[test]
    fn flag_takes_precedence() {
        let env = MockEnv::new().var("INTAKE_ACTOR", "from-env");
        assert_eq!(
            resolve_actor_with(Some("from-flag"), &env),
            Some("from-flag".to_string())
        );
    }

    #[test]
    fn env_used_when_flag_missing_or_blank() {
        let env = MockEnv::new().var("INTAKE_ACTOR", "ops-admin");
        assert_eq!(resolve_actor_with(None, &env), Some("ops-admin".to_string()));
        assert_eq!(resolve_actor_with(Some("  "), &env), Some("ops-admin".to_string()));
    }

    #[test]
    fn nothing_set_resolves_to_none() {
        let env = MockEnv::new().var("INTAKE_ACTOR", "");
        assert_eq!(resolve_actor_with(None, &env), None);
    }
}
