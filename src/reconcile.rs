//! Derive per-slot display state from local and remote state.
//!
//! Local intent always shadows the server: a staged file makes the slot
//! `Pending` with its local preview even when a persisted asset exists, until
//! the file is committed or cancelled.

use crate::drop_target::DropTargetAdapter;
use crate::model::{PreviewSource, SlotStatus, SlotViewState};
use crate::preview::PreviewResourceManager;
use crate::registry::{SlotCode, SlotRegistry};
use crate::state::{LocalSelectionStore, RemoteSnapshotStore};

/// Compute the view state of one slot.
pub fn reconcile_slot(
    slot: SlotCode,
    remote: &RemoteSnapshotStore,
    local: &LocalSelectionStore,
    previews: &PreviewResourceManager,
) -> SlotViewState {
    let (status, preview) = if let Some(staged) = local.get(slot) {
        (SlotStatus::Pending, previews.source(slot, staged.stage_id))
    } else if let Some(asset) = remote.get(slot) {
        (SlotStatus::Server, Some(PreviewSource::remote(asset.url.clone())))
    } else {
        (SlotStatus::Empty, None)
    };

    SlotViewState {
        slot,
        status,
        preview,
        group: None,
        hovered: false,
    }
}

/// Compute the view state of every registry slot, in display order.
pub fn reconcile(
    registry: &SlotRegistry,
    remote: &RemoteSnapshotStore,
    local: &LocalSelectionStore,
    previews: &PreviewResourceManager,
    drop_target: &DropTargetAdapter,
) -> Vec<SlotViewState> {
    registry
        .slots()
        .map(|slot| SlotViewState {
            group: registry.group_of(slot).map(|group| group.id),
            hovered: drop_target.is_hovered(slot),
            ..reconcile_slot(slot, remote, local, previews)
        })
        .collect()
}
