//! Error types for slot staging, preview handles and the network boundary.

use thiserror::Error;

use crate::registry::EntityClass;

/// A file rejected before it reaches the selection store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Picker closed or drop carried no file
    #[error("No file selected")]
    NoFile,

    /// MIME type not in the accepted list
    #[error("Unsupported file type '{mime_type}' (accepted: {accepted})")]
    UnsupportedType {
        /// The reported MIME type of the file
        mime_type: String,
        /// Comma-separated accepted types
        accepted: String,
    },

    /// File larger than the configured ceiling
    #[error("File too large: {byte_size} bytes (limit {max_bytes} bytes)")]
    TooLarge {
        /// Size of the rejected file
        byte_size: u64,
        /// Configured ceiling
        max_bytes: u64,
    },

    /// Slot code not part of the entity class
    #[error("Unknown slot '{code}' for {class:?}")]
    UnknownSlot {
        /// The code that failed to resolve
        code: String,
        /// The entity class it was looked up in
        class: EntityClass,
    },
}

impl ValidationError {
    /// Create an unsupported type error.
    pub fn unsupported_type(mime_type: impl Into<String>, accepted: &[String]) -> Self {
        Self::UnsupportedType {
            mime_type: mime_type.into(),
            accepted: accepted.join(", "),
        }
    }

    /// Create an unknown slot error.
    pub fn unknown_slot(code: impl Into<String>, class: EntityClass) -> Self {
        Self::UnknownSlot {
            code: code.into(),
            class,
        }
    }
}

/// Errors from the two network operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Request never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success status
    #[error("Server error: {status} - {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        message: String,
    },

    /// Response body lacked the expected structure
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    /// Create a malformed response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

/// Errors that stop a batch commit from being applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommitError {
    /// Another commit for this entity has not resolved yet
    #[error("A commit is already in flight")]
    InFlight,

    /// Transport failure or malformed response; nothing was applied
    #[error("Upload failed: {0}")]
    Total(#[from] ApiError),
}

/// Failure to create a local preview handle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreviewError {
    /// The platform refused to create an object URL
    #[error("Could not create preview: {0}")]
    CreateFailed(String),
}
