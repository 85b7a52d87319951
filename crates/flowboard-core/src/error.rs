use std::fmt;

use crate::model::issue::IssueId;

/// Machine-readable error codes for scripts and agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    StorageOpenFailed,
    IssueNotFound,
    ValidationFailed,
    InvalidEnumValue,
    PersistenceFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::StorageOpenFailed => "E1003",
            Self::IssueNotFound => "E2001",
            Self::ValidationFailed => "E2002",
            Self::InvalidEnumValue => "E2003",
            Self::PersistenceFailed => "E5001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Workspace not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::StorageOpenFailed => "Issue database could not be opened",
            Self::IssueNotFound => "Issue not found",
            Self::ValidationFailed => "Issue failed validation",
            Self::InvalidEnumValue => "Invalid type/priority/status value",
            Self::PersistenceFailed => "Persistence call failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `fb init` to initialize this directory."),
            Self::ConfigParseError => Some("Fix syntax in .flowboard/config.toml and retry."),
            Self::StorageOpenFailed => Some("Check the `database` path and its permissions."),
            Self::IssueNotFound => None,
            Self::ValidationFailed => Some("Every issue needs a non-empty title."),
            Self::InvalidEnumValue => {
                Some("Use one of the documented type/priority/status values.")
            }
            Self::PersistenceFailed => {
                Some("The local change was rolled back. Retry once the backend is reachable.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failure reported by a [`crate::gateway::PersistenceGateway`] call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The backend does not know the issue.
    #[error("issue #{0} not found in backend")]
    NotFound(IssueId),

    /// The backend could not be reached.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend answered but refused or failed the request.
    #[error("backend rejected request: {0}")]
    Rejected(String),

    /// Storage-level failure inside the backend (I/O, SQL, encoding).
    #[error("backend storage error: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for GatewayError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Errors surfaced by store, workflow, and workspace operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// No issue with this id exists in the store.
    #[error("issue #{id} not found")]
    NotFound { id: IssueId },

    /// A required field is missing or empty at edit-commit time.
    #[error("invalid {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: &'static str,
    },

    /// The persistence collaborator failed; local state was rolled back.
    #[error("persistence failed: {0}")]
    Persistence(#[from] GatewayError),
}

impl CoreError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::IssueNotFound,
            Self::Validation { .. } => ErrorCode::ValidationFailed,
            Self::Persistence(_) => ErrorCode::PersistenceFailed,
        }
    }

    /// Optional remediation hint for operators and agents.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}
