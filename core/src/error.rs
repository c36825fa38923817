//! Error types for the weeb.sh client.
//!
//! # Design
//! The service reports failures only through a status code and a free-text
//! `message`, so a handful of known messages get dedicated variants (see
//! `response::translate`). Every other non-2xx response lands in `Http` with
//! the raw status code and body, untouched. Callers must treat `Http` and
//! `Transport` as the residual "unknown failure" categories.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by every client operation.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The token is empty, or the server rejected it with 401.
    #[error("bad credentials: {0}")]
    BadCredentials(String),

    /// The server returned 413.
    #[error("payload too large: {0}")]
    TooLarge(String),

    /// The uploaded file has a MIME type the service does not accept.
    #[error("unsupported media type: {0}")]
    InvalidMediaType(String),

    #[error("duplicate tag: {0}")]
    DuplicateTag(String),

    /// The image exists but is hidden from this account.
    #[error("private resource: {0}")]
    PrivateResource(String),

    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// The token lacks a scope required by the endpoint.
    #[error("insufficient permission: {0}")]
    InsufficientPermission(String),

    /// The server returned 500.
    #[error("server failure: {0}")]
    ServerFailure(String),

    /// A local file handed to an upload could not be opened.
    #[error("cannot open '{}': {reason}", path.display())]
    FileAccess {
        path: PathBuf,
        reason: FileAccessReason,
        #[source]
        source: io::Error,
    },

    /// A non-2xx response that none of the known messages matched.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response.
    #[error("transport failure: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A 2xx response whose body did not have the expected shape.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// An id or path component that cannot address a resource: empty,
    /// `.` or `..`.
    #[error("invalid id: {0:?}")]
    InvalidId(String),

    /// Configuration could not be extracted from its sources.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Why a local file could not be opened for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAccessReason {
    NotFound,
    PermissionDenied,
    NameTooLong,
    Other,
}

impl FileAccessReason {
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => FileAccessReason::NotFound,
            io::ErrorKind::PermissionDenied => FileAccessReason::PermissionDenied,
            io::ErrorKind::InvalidFilename => FileAccessReason::NameTooLong,
            _ => FileAccessReason::Other,
        }
    }
}

impl std::fmt::Display for FileAccessReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            FileAccessReason::NotFound => "file not found",
            FileAccessReason::PermissionDenied => "permission denied",
            FileAccessReason::NameTooLong => "name too long",
            FileAccessReason::Other => "unknown",
        };
        f.write_str(text)
    }
}

impl ApiError {
    pub(crate) fn deserialization(err: impl std::fmt::Display) -> Self {
        ApiError::Deserialization(err.to_string())
    }

    pub(crate) fn serialization(err: impl std::fmt::Display) -> Self {
        ApiError::Serialization(err.to_string())
    }

    pub(crate) fn file_access(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ApiError::FileAccess {
            path: path.into(),
            reason: FileAccessReason::from_io(&source),
            source,
        }
    }

    /// HTTP status carried by a server-side failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::TooLarge(_) => Some(413),
            ApiError::BadCredentials(_) => None,
            ApiError::InvalidMediaType(_)
            | ApiError::DuplicateTag(_)
            | ApiError::PrivateResource(_)
            | ApiError::ResourceNotFound(_) => Some(400),
            ApiError::InsufficientPermission(_) => Some(403),
            ApiError::ServerFailure(_) => Some(500),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
