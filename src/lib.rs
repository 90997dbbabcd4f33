//! Slot Uploader - staged multi-slot image uploads for browser admin pages.
//!
//! An entity (user, match, team) owns a fixed set of image slots. Operators
//! stage files into slots by picking or dropping them, preview them locally
//! and commit every staged slot in one batch request.

pub mod api;
pub mod commit;
pub mod config;
pub mod constants;
pub mod drop_target;
pub mod error;
pub mod logging;
pub mod model;
pub mod preview;
pub mod reconcile;
pub mod registry;
pub mod state;
pub mod uploader;

pub use config::UploaderConfig;
pub use registry::{EntityClass, EntityRef, SlotCode, SlotRegistry};
pub use state::{SessionView, SlotSession};
pub use uploader::SlotUploader;

#[cfg(target_arch = "wasm32")]
pub mod browser;

// WASM entry point
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::*;
