//! Shared primitives for all Rust crates in Tablegate.

#![forbid(unsafe_code)]

/// Authorization denial details shared by every enforcement path.
pub mod acl;
/// Acting identity passed explicitly into every gateway call.
pub mod identity;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use acl::{AclDenial, AclDenialKind};
pub use identity::{GroupId, Identity, UserId};

/// Result type used across Tablegate crates.
pub type AppResult<T> = Result<T, AppError>;

/// Result type returned by storage adapters.
pub type StorageResult<T> = Result<T, StorageError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Deployment mode controlling how much query detail errors may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentMode {
    /// Rendered query text is attached to execution failures.
    #[default]
    Development,
    /// Execution failures stay opaque so schema details do not leak.
    Production,
}

impl DeploymentMode {
    /// Returns whether rendered queries may be attached to errors.
    #[must_use]
    pub fn exposes_query_text(&self) -> bool {
        !matches!(self, Self::Production)
    }

    /// Returns a stable configuration value for this mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl FromStr for DeploymentMode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" | "staging" | "test" => Ok(Self::Development),
            other => Err(AppError::Validation(format!(
                "unknown deployment mode '{other}'"
            ))),
        }
    }
}

/// Failure reported by a storage adapter while executing a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The query references unknown tables or columns or is malformed.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The query violated a storage constraint.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The storage backend could not be reached.
    #[error("storage unavailable: {0}")]
    Connectivity(String),
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Acting identity is blocked by an access rule.
    #[error("forbidden: {0}")]
    Forbidden(Box<AclDenial>),

    /// A composite value was supplied where a scalar column value is required.
    #[error("array supplied as the value for column `{table}`.`{column}`")]
    ArrayAsScalarColumnValue {
        /// Target table.
        table: String,
        /// Offending column.
        column: String,
    },

    /// The ownership sub-query could not be evaluated.
    #[error("ownership resolution failed: {0}")]
    Resolution(String),

    /// Storage rejected an already authorized query.
    #[error("query execution failed: {reason}{}", query_suffix(.query))]
    ExecutionFailed {
        /// Storage failure description.
        reason: String,
        /// Rendered query text, only present outside production.
        query: Option<String>,
    },

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

fn query_suffix(query: &Option<String>) -> String {
    query
        .as_deref()
        .map(|query| format!(" (query: {query})"))
        .unwrap_or_default()
}

impl AppError {
    /// Returns the denial when this error is an authorization failure.
    #[must_use]
    pub fn denial(&self) -> Option<&AclDenial> {
        match self {
            Self::Forbidden(denial) => Some(denial.as_ref()),
            _ => None,
        }
    }
}

impl From<AclDenial> for AppError {
    fn from(value: AclDenial) -> Self {
        Self::Forbidden(Box::new(value))
    }
}
