//! Error types for Boss
//!
//! All modules use `BossResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Boss operations
pub type BossResult<T> = Result<T, BossError>;

/// All errors that can occur in Boss
#[derive(Error, Debug)]
pub enum BossError {
    // Git errors
    #[error("git not found. Install git and make sure it is on PATH")]
    GitNotFound,

    #[error("git {command} failed for {repository}: {stderr}")]
    GitCommand {
        repository: String,
        command: String,
        stderr: String,
    },

    #[error("Failed to check out {reference} of {repository}: {reason}")]
    CheckoutFailed {
        repository: String,
        reference: String,
        reason: String,
    },

    #[error("No default branch (main or master) found for {0}")]
    NoDefaultBranch(String),

    // Manifest errors
    #[error("Manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    #[error("Invalid manifest at {path}: {reason}")]
    ManifestInvalid { path: PathBuf, reason: String },

    #[error("Invalid lock file at {path}: {reason}")]
    LockInvalid { path: PathBuf, reason: String },

    // Resolution errors
    #[error("Invalid dependency '{spec}': {reason}")]
    InvalidDependency { spec: String, reason: String },

    #[error("Invalid version constraint '{spec}': {reason}")]
    InvalidConstraint { spec: String, reason: String },

    #[error("Dependency cycle detected between: {}", .0.join(", "))]
    CycleDetected(Vec<String>),

    // Build errors
    #[error("Compiler failed for {project}: {output}")]
    CompilerFailed { project: String, output: String },

    #[error("Script not found: {0}")]
    ScriptNotFound(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    User(String),
}

impl BossError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Errors that abort an install run instead of being recorded and skipped
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::GitNotFound
                | Self::CheckoutFailed { .. }
                | Self::ManifestNotFound(_)
                | Self::ManifestInvalid { .. }
                | Self::CycleDetected(_)
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::GitNotFound => Some("Install git from https://git-scm.com"),
            Self::ManifestNotFound(_) => Some("Run: boss init"),
            Self::CycleDetected(_) => Some("Remove one of the listed dependencies from its boss.json"),
            Self::CheckoutFailed { .. } => {
                Some("Discard local changes under modules/ or delete the module directory")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = BossError::GitNotFound;
        assert!(err.to_string().contains("git not found"));
    }

    #[test]
    fn cycle_lists_members() {
        let err = BossError::CycleDetected(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "Dependency cycle detected between: a, b");
    }

    #[test]
    fn error_hint() {
        let err = BossError::ManifestNotFound(PathBuf::from("boss.json"));
        assert_eq!(err.hint(), Some("Run: boss init"));
        assert!(BossError::User("x".to_string()).hint().is_none());
    }

    #[test]
    fn error_fatal() {
        assert!(BossError::GitNotFound.is_fatal());
        assert!(!BossError::InvalidConstraint {
            spec: "^x".to_string(),
            reason: "bad".to_string()
        }
        .is_fatal());
    }
}
