//! Local preview handle ownership.
//!
//! Preview handles are object URLs pointing at staged files. This module is
//! the only place that creates or revokes them, which keeps three rules easy
//! to check:
//!
//! 1. At most one live handle per slot.
//! 2. A handle is revoked exactly once. [`PreviewHandle`] is not `Clone` and
//!    revoking consumes it, so the manager forgets a handle before the
//!    backend ever sees its URL.
//! 3. A handle is never revoked while it is the active preview. Creation is
//!    scheduled by [`PreviewResourceManager::create_or_replace`] and carried
//!    out by [`PreviewResourceManager::materialize`] at the render boundary,
//!    which installs the new handle first and revokes the old one after.
//!
//! Because creation waits for the render boundary, staging and clearing a
//! slot before anything is rendered creates no handle at all.

use std::collections::BTreeMap;

use crate::error::PreviewError;
use crate::model::{HandleOrigin, LocalFile, PreviewSource, StageId, StagedFile};
use crate::registry::SlotCode;

/// Platform operations behind preview handles.
pub trait ObjectUrlBackend {
    /// Create a revocable URL for a local file.
    fn create(&mut self, file: &LocalFile) -> Result<String, PreviewError>;

    /// Revoke a URL previously returned by `create`. Treated as infallible.
    fn revoke(&mut self, url: &str);
}

/// A live object URL bound to one staged selection.
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewHandle {
    url: String,
    stage_id: StageId,
}

impl PreviewHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn stage_id(&self) -> StageId {
        self.stage_id
    }

    /// The render source for this handle.
    pub fn source(&self) -> PreviewSource {
        PreviewSource::local(self.url.clone())
    }
}

/// A handle creation waiting for the next render boundary.
#[derive(Debug)]
struct ScheduledPreview {
    stage_id: StageId,
    file: LocalFile,
}

/// Owns every preview handle of one session.
pub struct PreviewResourceManager {
    backend: Box<dyn ObjectUrlBackend>,
    live: BTreeMap<SlotCode, PreviewHandle>,
    scheduled: BTreeMap<SlotCode, ScheduledPreview>,
}

impl PreviewResourceManager {
    /// Create a manager over the given backend.
    pub fn new(backend: Box<dyn ObjectUrlBackend>) -> Self {
        Self {
            backend,
            live: BTreeMap::new(),
            scheduled: BTreeMap::new(),
        }
    }

    /// Schedule a handle for a new selection. An older handle for the slot
    /// stays active until [`Self::materialize`] replaces it.
    pub fn create_or_replace(&mut self, staged: &StagedFile) {
        let previous = self.scheduled.insert(
            staged.slot,
            ScheduledPreview {
                stage_id: staged.stage_id,
                file: staged.file.clone(),
            },
        );
        if previous.is_some() {
            log::trace!("Preview for {} rescheduled before render", staged.slot);
        }
    }

    /// Drop any scheduled creation and revoke the live handle for a slot.
    pub fn release(&mut self, slot: SlotCode) {
        if self.scheduled.remove(&slot).is_some() {
            log::trace!("Preview for {} cancelled before creation", slot);
        }
        if let Some(handle) = self.live.remove(&slot) {
            self.revoke(slot, handle);
        }
    }

    /// Release whatever a rendered source refers to. Remote sources are not
    /// owned here, so they are ignored.
    pub fn release_source(&mut self, slot: SlotCode, source: &PreviewSource) {
        if source.origin == HandleOrigin::Remote {
            log::trace!("Ignoring release of remote preview for {}", slot);
            return;
        }
        let matches = self
            .live
            .get(&slot)
            .is_some_and(|handle| handle.url == source.url);
        if matches {
            self.release(slot);
        }
    }

    /// Revoke every handle and forget every scheduled creation.
    pub fn release_all(&mut self) {
        self.scheduled.clear();
        let live = std::mem::take(&mut self.live);
        if !live.is_empty() {
            log::debug!("Releasing {} preview handles", live.len());
        }
        for (slot, handle) in live {
            self.revoke(slot, handle);
        }
    }

    /// Create all scheduled handles. Each new handle becomes active before
    /// the handle it replaces is revoked.
    ///
    /// Returns the slots whose handle could not be created; those slots
    /// render without a preview.
    pub fn materialize(&mut self) -> Vec<(SlotCode, PreviewError)> {
        let mut failures = Vec::new();
        for (slot, scheduled) in std::mem::take(&mut self.scheduled) {
            match self.backend.create(&scheduled.file) {
                Ok(url) => {
                    log::debug!("Preview for {} created: {}", slot, url);
                    let handle = PreviewHandle {
                        url,
                        stage_id: scheduled.stage_id,
                    };
                    if let Some(old) = self.live.insert(slot, handle) {
                        self.revoke(slot, old);
                    }
                }
                Err(e) => {
                    log::warn!("Preview for {} failed: {}", slot, e);
                    // The old handle shows a file that is no longer staged
                    if let Some(old) = self.live.remove(&slot) {
                        self.revoke(slot, old);
                    }
                    failures.push((slot, e));
                }
            }
        }
        failures
    }

    /// Active source for a slot, if its live handle belongs to `stage_id`.
    pub fn source(&self, slot: SlotCode, stage_id: StageId) -> Option<PreviewSource> {
        self.live
            .get(&slot)
            .filter(|handle| handle.stage_id == stage_id)
            .map(PreviewHandle::source)
    }

    pub fn handle(&self, slot: SlotCode) -> Option<&PreviewHandle> {
        self.live.get(&slot)
    }

    /// Number of live handles.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Whether creations are waiting for the next render boundary.
    pub fn has_scheduled(&self) -> bool {
        !self.scheduled.is_empty()
    }

    fn revoke(&mut self, slot: SlotCode, handle: PreviewHandle) {
        log::debug!("Preview for {} revoked: {}", slot, handle.url);
        self.backend.revoke(&handle.url);
    }
}

impl Drop for PreviewResourceManager {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl std::fmt::Debug for PreviewResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewResourceManager")
            .field("live", &self.live)
            .field("scheduled", &self.scheduled.keys().collect::<Vec<_>>())
            .finish()
    }
}
