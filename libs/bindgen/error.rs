use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// One catalog problem, located by section, index and accessor name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    pub location: String,
    pub message: String,
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Every problem found in a catalog; generation is aborted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaValidationError {
    pub issues: Vec<SchemaIssue>,
}

impl SchemaValidationError {
    /// Whether any issue message contains `needle`
    pub fn mentions(&self, needle: &str) -> bool {
        self.issues.iter().any(|issue| issue.message.contains(needle))
    }
}

impl fmt::Display for SchemaValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event catalog has {} problem(s)", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaValidationError {}

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog document: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] SchemaValidationError),

    #[error("Invalid binding options: {0}")]
    Options(String),
}

pub type Result<T> = std::result::Result<T, CompileError>;
