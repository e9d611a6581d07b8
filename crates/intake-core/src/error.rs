use std::fmt;

/// Machine-readable error codes for callers that branch on failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ValidationFailed,
    ConfigParseError,
    NotFound,
    IllegalTransition,
    AlreadyDistributed,
    MissingReferenceData,
    PersistenceFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ValidationFailed => "E1001",
            Self::ConfigParseError => "E1002",
            Self::NotFound => "E2001",
            Self::IllegalTransition => "E2002",
            Self::AlreadyDistributed => "E2003",
            Self::MissingReferenceData => "E2004",
            Self::PersistenceFailed => "E3001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ValidationFailed => "Invalid input",
            Self::ConfigParseError => "Config file parse error",
            Self::NotFound => "Record not found",
            Self::IllegalTransition => "Illegal status transition",
            Self::AlreadyDistributed => "Bonus pool already distributed",
            Self::MissingReferenceData => "Required reference data missing",
            Self::PersistenceFailed => "Storage operation failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ValidationFailed => Some("Check the identifiers and values passed in."),
            Self::ConfigParseError => Some("Fix syntax in .intake/config.toml and retry."),
            Self::NotFound => None,
            Self::IllegalTransition => {
                Some("Follow the intake pipeline; terminal statuses cannot be left.")
            }
            Self::AlreadyDistributed => None,
            Self::MissingReferenceData => {
                Some("Create at least one active administrator before running the sweep.")
            }
            Self::PersistenceFailed => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failure of a core operation.
///
/// Messages are safe to show to end users; storage details only go to logs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("{entity} not found: '{id}'")]
    NotFound { entity: &'static str, id: String },

    #[error("cannot move client from {from} to {to}")]
    IllegalTransition { from: String, to: String },

    #[error("bonus pool {pool_id} has already been distributed")]
    AlreadyDistributed { pool_id: i64 },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("storage operation failed: {0}")]
    Persistence(String),

    #[error("missing reference data: {0}")]
    MissingReferenceData(String),
}

impl IntakeError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::IllegalTransition { .. } => ErrorCode::IllegalTransition,
            Self::AlreadyDistributed { .. } => ErrorCode::AlreadyDistributed,
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::Persistence(_) => ErrorCode::PersistenceFailed,
            Self::MissingReferenceData(_) => ErrorCode::MissingReferenceData,
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Wrap a storage failure, logging the detail and keeping it out of the
    /// user-facing message.
    pub(crate) fn storage(operation: &str, err: &rusqlite::Error) -> Self {
        tracing::error!(operation, error = %err, "storage failure");
        Self::Persistence(operation.to_string())
    }
}

/// Extension for tagging `rusqlite` results with the operation that failed.
pub(crate) trait StorageContext<T> {
    fn storage(self, operation: &str) -> Result<T, IntakeError>;
}

impl<T> StorageContext<T> for rusqlite::Result<T> {
    fn storage(self, operation: &str) -> Result<T, IntakeError> {
        self.map_err(|err| IntakeError::storage(operation, &err))
    }
}

/// Reject empty or whitespace-only identifiers.
pub(crate) fn require_id(kind: &str, id: &str) -> Result<(), IntakeError> {
    if id.trim().is_empty() {
        return Err(IntakeError::Validation(format!("{kind} id must not be empty")));
    }
    Ok(())
}
