//! Global constants for the slot uploader

/// Default upload size ceiling per file (5 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// MIME types accepted by default for slot images
pub const DEFAULT_ACCEPTED_MIME_TYPES: &[&str] =
    &["image/png", "image/jpeg", "image/jpg", "image/webp"];

/// Value of the `accept` attribute for hidden file inputs
pub const FILE_INPUT_ACCEPT: &str = "image/*";

/// Default API base URL when no configuration is found
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

/// Query parameter appended to committed URLs when cache busting is on
pub const CACHE_BUST_PARAM: &str = "t";

/// Placeholder replaced by the entity id in endpoint templates
pub const ENTITY_ID_PLACEHOLDER: &str = "{id}";

/// Reason reported for a submitted slot the server said nothing about
pub const MISSING_RESULT_REASON: &str = "no result reported for this slot";
