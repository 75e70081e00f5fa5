//! Error types for results data and run configuration.
//!
//! Only *data* problems are represented here: malformed documents, bad text
//! encodings, invalid selections. Defects in a benchmark definition itself
//! (bad task titles, inconsistent stopwatch use, unregistered input keys)
//! are programmer errors and panic at the point of misuse instead.

use std::fmt;

/// Error raised when loading, parsing, or resolving benchmark data fails.
///
/// Each variant carries enough context to point at the offending field.
/// The operation that produced the error is aborted; previously stored
/// data is left untouched.
#[derive(Debug)]
pub enum Error {
    /// File I/O failed.
    Io {
        /// What we were doing with the file.
        context: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The document is not valid JSON, or its shape is wrong.
    Json {
        /// The underlying decode/encode error.
        source: serde_json::Error,
    },

    /// The document declares a schema version this crate does not support.
    UnsupportedVersion {
        /// The version value found in the document.
        found: i64,
    },

    /// Two task entries in a document share the same task ID.
    DuplicateTask {
        /// Canonical text form of the colliding task ID.
        id: String,
    },

    /// A task entry contains the same size key twice.
    DuplicateSize {
        /// Canonical text form of the task the size belongs to.
        task: String,
        /// The colliding size key.
        size: String,
    },

    /// A task name does not parse as a valid task ID.
    InvalidTaskName {
        /// The offending name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A size string does not parse.
    InvalidSize {
        /// The offending text.
        text: String,
    },

    /// A time string does not parse.
    InvalidTime {
        /// The offending text.
        text: String,
    },

    /// A selection names a task this benchmark does not define.
    UnknownTask {
        /// The unknown task title.
        name: String,
    },

    /// No tasks were selected for an operation that needs at least one.
    EmptyTaskSelection,

    /// No sizes were selected for an operation that needs at least one.
    EmptySizeSelection,

    /// The selected size list contains the same size twice.
    DuplicateSizeEntry {
        /// Text form of the repeated size.
        size: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io { context, source } => write!(f, "{}: {}", context, source),
            Error::Json { source } => write!(f, "invalid results document: {}", source),
            Error::UnsupportedVersion { found } => {
                write!(f, "unsupported results version {}", found)
            }
            Error::DuplicateTask { id } => write!(f, "duplicate task ID '{}'", id),
            Error::DuplicateSize { task, size } => {
                write!(f, "duplicate size '{}' in task '{}'", size, task)
            }
            Error::InvalidTaskName { name, reason } => {
                write!(f, "invalid task name '{}': {}", name, reason)
            }
            Error::InvalidSize { text } => write!(f, "invalid size '{}'", text),
            Error::InvalidTime { text } => write!(f, "invalid time '{}'", text),
            Error::UnknownTask { name } => write!(f, "unknown task: '{}'", name),
            Error::EmptyTaskSelection => write!(f, "no tasks selected"),
            Error::EmptySizeSelection => write!(f, "no sizes selected"),
            Error::DuplicateSizeEntry { size } => {
                write!(f, "invalid size list: duplicate entry '{}'", size)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            Error::Json { source } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Error::Json { source }
    }
}
