//! Per-slot records and the derived view state.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::LocalFile;
use crate::registry::SlotCode;

/// Identifies one selection within a session. Increases monotonically, so a
/// re-selected slot always carries a newer id than the file it replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct StageId(pub u64);

/// Persisted URL per slot, in the canonical shape produced at the wire boundary.
pub type SlotUrlMap = BTreeMap<SlotCode, String>;

/// Last known persisted asset for a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteAsset {
    pub slot: SlotCode,
    pub url: String,
}

/// A locally selected file waiting for commit.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub slot: SlotCode,
    pub stage_id: StageId,
    pub file: LocalFile,
}

/// Who owns the URL a preview points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleOrigin {
    /// Object URL created here; must be revoked here
    Local,
    /// Server URL; never revoked
    Remote,
}

/// What an image element should display for a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewSource {
    pub url: String,
    pub origin: HandleOrigin,
}

impl PreviewSource {
    pub fn local(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            origin: HandleOrigin::Local,
        }
    }

    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            origin: HandleOrigin::Remote,
        }
    }
}

/// Display status of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SlotStatus {
    /// Nothing staged, nothing persisted
    Empty,
    /// Persisted asset shown
    Server,
    /// Local selection shown, waiting for commit
    Pending,
}

/// Derived, render-ready state of one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotViewState {
    pub slot: SlotCode,
    pub status: SlotStatus,
    pub preview: Option<PreviewSource>,
    /// Id of the registry group the slot is shown in
    pub group: Option<&'static str>,
    /// Whether a drag is hovering over this slot
    pub hovered: bool,
}
