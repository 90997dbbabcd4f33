//! Local file model shared by the picker, drop and commit paths.

/// Platform payload of a selected file.
#[cfg(target_arch = "wasm32")]
pub type FilePayload = web_sys::File;

#[cfg(not(target_arch = "wasm32"))]
pub type FilePayload = Vec<u8>; // raw bytes

/// A file chosen by the operator, not yet persisted anywhere.
#[derive(Debug, Clone)]
pub struct LocalFile {
    /// File name as reported by the picker or drop
    pub name: String,
    /// MIME type as reported by the browser (may be empty)
    pub mime_type: String,
    /// Size in bytes
    pub byte_size: u64,
    /// Platform payload, handed to preview and upload
    pub payload: FilePayload,
}

impl LocalFile {
    /// Create a file from its parts.
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        byte_size: u64,
        payload: FilePayload,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            byte_size,
            payload,
        }
    }

    /// Create a file from raw bytes (native).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        let byte_size = bytes.len() as u64;
        Self::new(name, mime_type, byte_size, bytes)
    }

    /// Wrap a browser `File`.
    #[cfg(target_arch = "wasm32")]
    pub fn from_web(file: web_sys::File) -> Self {
        let name = file.name();
        let mime_type = file.type_();
        let byte_size = file.size() as u64;
        Self::new(name, mime_type, byte_size, file)
    }
}
