//! Last known persisted asset per slot.

use std::collections::BTreeMap;

use crate::model::{RemoteAsset, SlotUrlMap};
use crate::registry::SlotCode;

/// Persisted URLs as last reported by the server.
///
/// Only slots with a persisted asset have an entry; absent slots are simply
/// missing. Entries are replaced wholesale, never merged field by field.
#[derive(Debug, Default)]
pub struct RemoteSnapshotStore {
    assets: BTreeMap<SlotCode, RemoteAsset>,
}

impl RemoteSnapshotStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole store with a freshly loaded snapshot.
    pub(crate) fn replace_all(&mut self, snapshot: SlotUrlMap) {
        self.assets = snapshot
            .into_iter()
            .map(|(slot, url)| (slot, RemoteAsset { slot, url }))
            .collect();
        log::debug!("Remote snapshot replaced: {} assets", self.assets.len());
    }

    /// Replace entries for exactly the given slots, leaving others untouched.
    pub(crate) fn merge(&mut self, partial: SlotUrlMap) {
        for (slot, url) in partial {
            log::debug!("Remote asset for {} -> {}", slot, url);
            self.assets.insert(slot, RemoteAsset { slot, url });
        }
    }

    /// Forget everything (failed load, entity switch).
    pub(crate) fn clear(&mut self) {
        self.assets.clear();
    }

    pub fn get(&self, slot: SlotCode) -> Option<&RemoteAsset> {
        self.assets.get(&slot)
    }

    pub fn url(&self, slot: SlotCode) -> Option<&str> {
        self.assets.get(&slot).map(|asset| asset.url.as_str())
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
