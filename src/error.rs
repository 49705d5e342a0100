//! Error types.
//!
//! - `MergeError`: failures raised by the profile model and the pipeline stages.
//! - `AppError`: what the binary reports (message + process exit code).

use thiserror::Error;

/// Coarse classification of a [`MergeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    TypeMismatch,
    SchemaMismatch,
    DegenerateInput,
    /// A stage ran before the stage it depends on.
    Ordering,
    InvalidInput,
}

#[derive(Debug, Clone, Error)]
pub enum MergeError {
    #[error("profile '{profile}': missing flag '{flag}'")]
    MissingFlag { profile: String, flag: String },

    #[error("profile '{profile}': flag '{flag}' expects {expected}, got {found}")]
    FlagType {
        profile: String,
        flag: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("profile '{profile}': flag '{flag}' is declared as {found}, expected {expected}")]
    SchemaMismatch {
        profile: String,
        flag: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("profile '{profile}': flag '{flag}' is not set for point {id}")]
    IncompleteFlag { profile: String, flag: String, id: usize },

    #[error("profile '{profile}': intervals for flag '{flag}' are stale or were never built")]
    StaleIntervals { profile: String, flag: String },

    #[error("profile '{profile}': point id {id} out of range (len={len})")]
    PointOutOfRange { profile: String, id: usize, len: usize },

    #[error("profile '{0}' has no interpolant (fitting has not run)")]
    MissingInterpolant(String),

    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl MergeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MergeError::MissingFlag { .. } => ErrorKind::NotFound,
            MergeError::PointOutOfRange { .. } => ErrorKind::NotFound,
            MergeError::FlagType { .. } => ErrorKind::TypeMismatch,
            MergeError::SchemaMismatch { .. } => ErrorKind::SchemaMismatch,
            MergeError::IncompleteFlag { .. } => ErrorKind::Ordering,
            MergeError::StaleIntervals { .. } => ErrorKind::Ordering,
            MergeError::MissingInterpolant(_) => ErrorKind::Ordering,
            MergeError::DegenerateInput(_) => ErrorKind::DegenerateInput,
            MergeError::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<MergeError> for AppError {
    fn from(err: MergeError) -> Self {
        let exit_code = match err.kind() {
            ErrorKind::InvalidInput | ErrorKind::TypeMismatch => 2,
            ErrorKind::DegenerateInput => 3,
            _ => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
