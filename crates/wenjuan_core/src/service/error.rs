//! Service-level error taxonomy.
//!
//! # Invariants
//! - Every service failure is exactly one of `Validation`, `NotFound`,
//!   `Conflict` or `Storage`.
//! - Repository `NotFound`/`Conflict` keep their kind when crossing into the
//!   service layer; everything else from storage becomes `Storage`.

use crate::db::DbError;
use crate::model::questionnaire::QuestionnaireValidationError;
use crate::repo::{EntityKind, RepoError};
use log::{debug, error};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type SurveyResult<T> = Result<T, SurveyError>;

/// Error returned by every survey service operation.
#[derive(Debug)]
pub enum SurveyError {
    /// Malformed or empty input; correctable by the caller.
    Validation(String),
    /// Referenced entity is absent.
    NotFound { kind: EntityKind, id: Uuid },
    /// Uniqueness or usage violation.
    Conflict(String),
    /// Persistence failure; not recoverable by the caller.
    Storage(RepoError),
}

/// Coarse classification of [`SurveyError`] used at the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Storage,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Storage => "storage",
        }
    }

    /// HTTP status used when this kind crosses the request gateway.
    pub fn status_code(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Storage => 500,
        }
    }
}

impl SurveyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    pub(crate) fn not_found(kind: EntityKind, id: Uuid) -> Self {
        Self::NotFound { kind, id }
    }
}

impl Display for SurveyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "validation failed: {message}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Conflict(message) => write!(f, "{message}"),
            Self::Storage(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for SurveyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for SurveyError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            RepoError::Conflict(message) => Self::Conflict(message),
            other => Self::Storage(other),
        }
    }
}

impl From<DbError> for SurveyError {
    fn from(value: DbError) -> Self {
        Self::Storage(RepoError::Db(value))
    }
}

impl From<QuestionnaireValidationError> for SurveyError {
    fn from(value: QuestionnaireValidationError) -> Self {
        Self::Validation(value.to_string())
    }
}

/// Logs a failed operation and hands the result back unchanged.
///
/// Storage failures are logged at `error`; caller mistakes at `debug`.
pub(crate) fn observe<T>(event: &str, result: SurveyResult<T>) -> SurveyResult<T> {
    if let Err(err) = &result {
        match err.kind() {
            ErrorKind::Storage => error!(
                "event={event} module=survey status=error error_kind=storage error={err}"
            ),
            kind => debug!(
                "event={event} module=survey status=rejected error_kind={}",
                kind.as_str()
            ),
        }
    }
    result
}
