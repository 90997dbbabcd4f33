//! The two network operations the uploader depends on.
//!
//! Implementations decode responses with [`decode`] before returning, so the
//! rest of the crate only sees canonical slot→URL maps.

pub mod decode;

#[cfg(target_arch = "wasm32")]
mod http;

#[cfg(target_arch = "wasm32")]
pub use http::HttpSlotApi;

use std::future::Future;
use std::rc::Rc;

pub use decode::{CommitOutcome, cache_busted, decode_commit, decode_snapshot, parse_body};

use crate::commit::UploadPart;
use crate::error::ApiError;
use crate::model::SlotUrlMap;
use crate::registry::EntityRef;

/// Upload progress callback, called with bytes sent and bytes total.
pub type ProgressFn = Rc<dyn Fn(u64, u64)>;

/// Snapshot load and batch commit for one entity.
pub trait SlotApi {
    /// Fetch the persisted slot→URL mapping. Absent slots are omitted.
    fn load_snapshot(&self, entity: &EntityRef)
    -> impl Future<Output = Result<SlotUrlMap, ApiError>>;

    /// Upload one part per staged slot in a single request, reporting
    /// upload progress while the body is sent.
    fn commit_batch(
        &self,
        entity: &EntityRef,
        parts: &[UploadPart],
        progress: ProgressFn,
    ) -> impl Future<Output = Result<CommitOutcome, ApiError>>;
}
