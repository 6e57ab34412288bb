// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for pipeline construction and task execution.
//!
//! Internally every failure is an [`Error`] variant. At the parameter-block
//! boundary ([`crate::Dispatcher`]) errors collapse into a [`Status`] code, which
//! is all a caller on the other side of that boundary ever sees.

use crate::handle::Handle;

/// Convenience result type using [`Error`] as the error variant.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur while building or driving a media graph.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No registered recognizer matched the probed buffer.
    #[error("Unrecognized input format")]
    UnrecognizedInput,

    /// An allocation, pad, container or thread could not be created.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Graph construction failed: element lookup, append or pad link.
    #[error("Link failed: {0}")]
    LinkFailed(String),

    /// The media framework has not been initialized for this process.
    #[error("Media framework unavailable")]
    Unavailable,

    /// The handle does not refer to a live record (never created, or already
    /// destroyed).
    #[error("Invalid handle {0}")]
    InvalidHandle(Handle),

    /// The container refused or failed a state transition.
    #[error("State change failed: {0}")]
    StateChange(String),

    /// A bounded state wait expired before the transition completed.
    #[error("Timeout")]
    Timeout,

    /// The configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Collapses this error into the status code reported across the
    /// parameter-block boundary.
    pub fn status(&self) -> Status {
        match self {
            Error::Unavailable => Status::Unavailable,
            _ => Status::Unsuccessful,
        }
    }
}

/// Status code returned by every parameter-block call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Status {
    Success = 0,
    Unsuccessful = 1,
    Unavailable = 2,
}

impl Status {
    /// Converts a typed result into a status code.
    pub fn from_result<T>(result: &Result<T>) -> Status {
        match result {
            Ok(_) => Status::Success,
            Err(error) => error.status(),
        }
    }

    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

/// Error codes within the thread error domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadErrorCode {
    /// A thread could not be created because resources are exhausted.
    Again,
}

/// Error reported by [`crate::TaskPool::push`] when a thread cannot be
/// started.
///
/// Mirrors the shape of a framework error: a domain (always "thread"), a
/// code and a human readable message.
#[derive(Debug, thiserror::Error)]
#[error("Error creating thread: {message}")]
pub struct ThreadError {
    pub code: ThreadErrorCode,
    pub message: String,
}

impl ThreadError {
    pub const DOMAIN: &'static str = "thread";

    pub(crate) fn again(message: impl Into<String>) -> Self {
        ThreadError {
            code: ThreadErrorCode::Again,
            message: message.into(),
        }
    }
}

impl From<ThreadError> for Error {
    fn from(error: ThreadError) -> Self {
        Error::ResourceExhausted(error.to_string())
    }
}
