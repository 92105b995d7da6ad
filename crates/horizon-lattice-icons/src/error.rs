//! Error types for icon theme lookup.

use std::path::PathBuf;

/// Result type alias for icon theme operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading themes or resolving icons.
///
/// A missing icon is never an error; lookups report it as `Ok(None)`.
/// Unreadable icon directories are treated as empty and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No descriptor for the theme exists under any search path.
    ///
    /// Only reported in strict mode; otherwise the theme is skipped.
    #[error("Icon theme '{theme}' not found in any search path")]
    ThemeNotFound { theme: String },

    /// A descriptor file exists but could not be interpreted.
    #[error("Malformed descriptor '{path}': {message}")]
    Descriptor { path: PathBuf, message: String },

    /// Reading a descriptor file failed.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a theme-not-found error.
    pub fn theme_not_found(theme: impl Into<String>) -> Self {
        Self::ThemeNotFound {
            theme: theme.into(),
        }
    }

    /// Create a descriptor error.
    pub fn descriptor(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Descriptor {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if this error means a theme could not be located.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ThemeNotFound { .. })
    }
}
