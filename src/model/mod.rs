//! Data models for slot uploads.

mod file;
mod notice;
mod slot;

pub use file::{FilePayload, LocalFile};
pub use notice::{Notice, NoticeKind};
pub use slot::{
    HandleOrigin, PreviewSource, RemoteAsset, SlotStatus, SlotUrlMap, SlotViewState, StageId,
    StagedFile,
};
