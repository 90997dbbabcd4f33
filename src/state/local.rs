//! Staged local selections keyed by slot.

use std::collections::BTreeMap;

use crate::model::{StageId, StagedFile};
use crate::registry::SlotCode;

/// Files selected by the operator and not yet committed.
///
/// Mutations are only reachable through the session, which pairs each one
/// with the matching preview call in the same synchronous step.
#[derive(Debug, Default)]
pub struct LocalSelectionStore {
    staged: BTreeMap<SlotCode, StagedFile>,
}

impl LocalSelectionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a file, returning the entry it replaced.
    pub(crate) fn set(&mut self, staged: StagedFile) -> Option<StagedFile> {
        log::debug!("Staged {} ({})", staged.slot, staged.file.name);
        self.staged.insert(staged.slot, staged)
    }

    /// Remove the staged entry for a slot.
    pub(crate) fn clear(&mut self, slot: SlotCode) -> Option<StagedFile> {
        self.staged.remove(&slot)
    }

    /// Remove several slots in one mutation.
    pub(crate) fn clear_many(&mut self, slots: &[SlotCode]) -> Vec<StagedFile> {
        slots
            .iter()
            .filter_map(|slot| self.staged.remove(slot))
            .collect()
    }

    /// Remove a slot only if it still holds the given selection.
    pub(crate) fn clear_if_stage(
        &mut self,
        slot: SlotCode,
        stage_id: StageId,
    ) -> Option<StagedFile> {
        if self.stage_id(slot) == Some(stage_id) {
            self.staged.remove(&slot)
        } else {
            None
        }
    }

    /// Remove everything.
    pub(crate) fn clear_all(&mut self) -> Vec<StagedFile> {
        std::mem::take(&mut self.staged).into_values().collect()
    }

    pub fn get(&self, slot: SlotCode) -> Option<&StagedFile> {
        self.staged.get(&slot)
    }

    pub fn contains(&self, slot: SlotCode) -> bool {
        self.staged.contains_key(&slot)
    }

    pub fn stage_id(&self, slot: SlotCode) -> Option<StageId> {
        self.staged.get(&slot).map(|staged| staged.stage_id)
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Staged entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &StagedFile> {
        self.staged.values()
    }
}
