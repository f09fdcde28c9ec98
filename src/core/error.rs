//! Typed error types for profile management.
//!
//! Callers at the operation boundary match on these variants to tell
//! "nothing happened" failures apart from partial ones.

use std::io;

use thiserror::Error;

/// Why a submitted profile name was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    /// The name was empty after trimming whitespace.
    Empty,
    /// The name contains characters outside `A-Z a-z 0-9 _ -`.
    InvalidCharacters,
    /// A profile with this name already exists.
    Duplicate,
}

impl std::fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "profile name cannot be empty"),
            Self::InvalidCharacters => write!(
                f,
                "profile name can only contain letters, numbers, underscores, and dashes"
            ),
            Self::Duplicate => write!(f, "profile name already exists"),
        }
    }
}

/// Top-level error type for the profile lifecycle, registry, and backups.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The submitted profile name was rejected. Nothing was changed.
    #[error("{0}")]
    Validation(ValidationReason),

    /// The referenced profile is not in the registry. Nothing was changed.
    #[error("profile '{0}' does not exist")]
    NotFound(String),

    /// First-run seeding could not read the launcher's live settings file.
    #[error("cannot seed the initial profile: failed to read '{path}': {source}")]
    Initialization {
        /// Path of the live settings file.
        path: String,
        #[source]
        source: io::Error,
    },

    /// The registry file exists but could not be parsed, or violates its
    /// invariants. Never silently replaced with defaults.
    #[error("profile registry at '{path}' is corrupt ({detail}); refusing to overwrite it")]
    CorruptRegistry { path: String, detail: String },

    /// Writing the registry file failed. The in-memory registry was
    /// rolled back to its pre-mutation value.
    #[error("failed to persist the profile registry to '{path}': {detail}")]
    Persistence { path: String, detail: String },

    /// A profile snapshot file could not be read or written.
    #[error("snapshot file '{path}': {source}")]
    Snapshot {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The live/snapshot exchange failed. `detail` states what was and
    /// was not changed; `live_file_at_risk` is set when the live file
    /// may need manual recovery from the outgoing snapshot.
    #[error("profile switch failed: {detail}")]
    Switch {
        detail: String,
        live_file_at_risk: bool,
    },

    /// Backup archive creation failed. The partial archive was removed.
    #[error("backup failed: {0}")]
    Archive(String),

    /// The launcher process is running; destructive operations are refused.
    #[error("the EVE launcher is currently running; close it and try again")]
    LauncherRunning,
}
