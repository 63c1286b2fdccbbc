//! Domain-specific error types for the installer.
//!
//! This module defines `InstallerError`, a `thiserror`-based enum that
//! classifies every failure the provisioning engine can surface. Engine
//! operations (components, the container client, the driver) return
//! `Result<T, InstallerError>` so callers can match on the error kind,
//! while the outer `run_*` entry points use `anyhow::Result`.
//!
//! `InstallerError` implements `Into<anyhow::Error>`, so the `?` operator
//! converts it automatically at those boundaries.

use std::io;

/// Formats an IO error kind into a human-readable message.
///
/// Falls back to the OS-level message for kinds without a dedicated text.
pub(crate) fn io_error_kind_message(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => "I/O error: not found".to_string(),
        io::ErrorKind::PermissionDenied => "I/O error: permission denied".to_string(),
        io::ErrorKind::IsADirectory => "I/O error: is a directory".to_string(),
        _ => format!("I/O error: {}", err),
    }
}

/// Error taxonomy of the provisioning engine.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum InstallerError {
    /// Missing or invalid TLS material or install parameter.
    ///
    /// Raised before any daemon call is made and never retried.
    #[error("configuration error: {0}")]
    Config(String),

    /// The daemon could not be reached (connection refused, TLS handshake
    /// failure, request timeout, broken stream).
    #[error("transport error during {operation}: {message}")]
    Transport {
        /// Daemon operation that was in flight (e.g. `"create container mongo"`).
        operation: String,
        /// Underlying transport message.
        message: String,
    },

    /// The daemon answered with an error status. The daemon's message is
    /// kept verbatim.
    #[error("daemon rejected {operation}: {message}")]
    DaemonRejected {
        /// Daemon operation that was rejected.
        operation: String,
        /// HTTP status code returned by the daemon. `None` for errors reported
        /// inside a streamed response (e.g. an image pull).
        status_code: Option<u16>,
        /// Error text as returned by the daemon.
        message: String,
    },

    /// The named container does not exist on the daemon.
    #[error("container not found: {0}")]
    NotFound(String),

    /// A component failed to install; carries the component name so the
    /// operator can tell which service broke.
    #[error("failed to install component {component}")]
    ComponentFailed {
        /// Name of the failing component.
        component: String,
        /// The error returned by the component.
        #[source]
        source: Box<InstallerError>,
    },

    /// The run was cancelled before the named component was attempted.
    #[error("install run cancelled before component {0}")]
    Cancelled(String),

    /// An I/O operation failed with contextual information.
    #[error("{context}: {message}")]
    Io {
        /// What was being done when the error occurred.
        context: String,
        /// Human-readable description derived from [`io_error_kind_message`].
        message: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl InstallerError {
    /// Creates an `Io` variant with the `message` derived from `source`.
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            message: io_error_kind_message(&source),
            source,
        }
    }

    /// Returns true if this error (or the component error it wraps) means
    /// the container does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::ComponentFailed { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Returns true if this error (or the component error it wraps) is a
    /// transport failure.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::ComponentFailed { source, .. } => source.is_transport(),
            _ => false,
        }
    }

    /// Returns the failing component's name for driver failures.
    pub fn component(&self) -> Option<&str> {
        match self {
            Self::ComponentFailed { component, .. } => Some(component),
            Self::Cancelled(component) => Some(component),
            _ => None,
        }
    }
}
