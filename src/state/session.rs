//! Per-entity session owning every store.
//!
//! A [`SlotSession`] is created when an entity is mounted and torn down
//! synchronously when the entity changes or the component unmounts. All
//! staging goes through it, so a store write and its preview transition
//! always happen in the same call.

use serde::Serialize;

use super::{LocalSelectionStore, RemoteSnapshotStore};
use crate::api::CommitOutcome;
use crate::commit::{BatchCommitController, CommitBatch, CommitReport, CommitStart};
use crate::config::UploaderConfig;
use crate::drop_target::{DropTargetAdapter, InputSource};
use crate::error::{ApiError, CommitError, ValidationError};
use crate::model::{LocalFile, Notice, NoticeKind, SlotUrlMap, SlotViewState, StageId, StagedFile};
use crate::preview::{ObjectUrlBackend, PreviewResourceManager};
use crate::reconcile::reconcile;
use crate::registry::{EntityRef, SlotCode, SlotRegistry};

/// Identifies one suspended load or commit.
///
/// A result is applied only while its ticket is still the session's latest
/// for that operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub entity: EntityRef,
    pub generation: u64,
    pub sequence: u64,
}

/// Snapshot load progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    /// Rendered as zero persisted assets until a retry succeeds
    Failed { message: String },
}

/// What happened to a load result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadResolution {
    Loaded { assets: usize },
    Failed(ApiError),
    /// The result belonged to an older load or entity and was dropped
    Stale,
}

/// What happened to a commit result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitResolution {
    Applied(CommitReport),
    Rejected(CommitError),
    Stale,
}

/// Render-ready snapshot of the whole session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub entity: EntityRef,
    pub load: LoadState,
    pub slots: Vec<SlotViewState>,
    /// Number of staged slots
    pub staged: usize,
    pub commit_in_flight: bool,
    /// Percent of the commit body sent, while a commit is in flight
    pub upload_progress: Option<u8>,
}

/// All slot state for one mounted entity.
#[derive(Debug)]
pub struct SlotSession {
    entity: EntityRef,
    generation: u64,
    registry: SlotRegistry,
    remote: RemoteSnapshotStore,
    local: LocalSelectionStore,
    previews: PreviewResourceManager,
    drop_target: DropTargetAdapter,
    commits: BatchCommitController,
    load_state: LoadState,
    load_sequence: u64,
    /// Commit results applied since the latest load started
    merged_since_load: SlotUrlMap,
    commit_sequence: u64,
    upload_progress: Option<u8>,
    next_stage: u64,
    notices: Vec<Notice>,
    torn_down: bool,
}

impl SlotSession {
    /// Create a session for `entity`. `generation` distinguishes this session
    /// from earlier ones for the same entity.
    pub fn new(
        entity: EntityRef,
        generation: u64,
        config: &UploaderConfig,
        backend: Box<dyn ObjectUrlBackend>,
    ) -> Self {
        log::debug!("Session {} opened (generation {})", entity, generation);
        Self {
            registry: entity.class.registry(),
            entity,
            generation,
            remote: RemoteSnapshotStore::new(),
            local: LocalSelectionStore::new(),
            previews: PreviewResourceManager::new(backend),
            drop_target: DropTargetAdapter::new(config.validation.clone()),
            commits: BatchCommitController::new(config.cache_bust_urls),
            load_state: LoadState::Idle,
            load_sequence: 0,
            merged_since_load: SlotUrlMap::new(),
            commit_sequence: 0,
            upload_progress: None,
            next_stage: 0,
            notices: Vec::new(),
            torn_down: false,
        }
    }

    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    pub fn registry(&self) -> &SlotRegistry {
        &self.registry
    }

    pub fn remote(&self) -> &RemoteSnapshotStore {
        &self.remote
    }

    pub fn local(&self) -> &LocalSelectionStore {
        &self.local
    }

    pub fn previews(&self) -> &PreviewResourceManager {
        &self.previews
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn is_commit_in_flight(&self) -> bool {
        self.commits.is_in_flight()
    }

    pub fn lookup(&self, code: &str) -> Result<SlotCode, ValidationError> {
        self.registry.lookup(code)
    }

    /// Resolve a slot code from the host, raising a notice if unknown.
    pub fn resolve(&mut self, code: &str) -> Option<SlotCode> {
        match self.registry.lookup(code) {
            Ok(slot) => Some(slot),
            Err(e) => {
                log::warn!("{}", e);
                self.notices.push(Notice::new(NoticeKind::Validation, e.to_string()));
                None
            }
        }
    }

    /// Validate and stage a file in one step.
    pub fn stage(&mut self, slot: SlotCode, file: LocalFile) -> Result<StageId, ValidationError> {
        self.check_slot(slot)?;
        self.drop_target.drag_leave(slot);
        match self.drop_target.validate(file) {
            Ok(file) => Ok(self.stage_validated(slot, file)),
            Err(e) => Err(self.reject(slot, e)),
        }
    }

    /// Handle a picker or drop event for a slot.
    pub fn receive(
        &mut self,
        slot: SlotCode,
        source: InputSource,
        files: Vec<LocalFile>,
    ) -> Result<StageId, ValidationError> {
        self.check_slot(slot)?;
        match self.drop_target.receive(slot, source, files) {
            Ok(file) => Ok(self.stage_validated(slot, file)),
            Err(e) => Err(self.reject(slot, e)),
        }
    }

    /// Resolve a host slot code and receive files for it.
    ///
    /// `None` when the code is unknown or the files are rejected; both
    /// queue a notice.
    pub fn receive_code(
        &mut self,
        code: &str,
        source: InputSource,
        files: Vec<LocalFile>,
    ) -> Option<StageId> {
        let slot = self.resolve(code)?;
        match self.receive(slot, source, files) {
            Ok(stage_id) => Some(stage_id),
            Err(e) => {
                log::info!("Selection for {} rejected: {}", slot, e);
                None
            }
        }
    }

    fn check_slot(&mut self, slot: SlotCode) -> Result<(), ValidationError> {
        if self.registry.contains(slot) {
            return Ok(());
        }
        let error = ValidationError::unknown_slot(slot.as_str(), self.registry.class());
        log::warn!("{}", error);
        self.notices
            .push(Notice::new(NoticeKind::Validation, error.to_string()));
        Err(error)
    }

    fn stage_validated(&mut self, slot: SlotCode, file: LocalFile) -> StageId {
        self.next_stage += 1;
        let stage_id = StageId(self.next_stage);
        let staged = StagedFile {
            slot,
            stage_id,
            file,
        };
        self.previews.create_or_replace(&staged);
        self.local.set(staged);
        stage_id
    }

    fn reject(&mut self, slot: SlotCode, error: ValidationError) -> ValidationError {
        self.notices
            .push(Notice::new(NoticeKind::Validation, error.to_string()).for_slot(slot));
        error
    }

    /// Drop the staged file for a slot, reverting it to its persisted state.
    pub fn cancel(&mut self, slot: SlotCode) {
        if self.local.clear(slot).is_some() {
            log::debug!("Cancelled {}", slot);
        }
        self.previews.release(slot);
    }

    /// Drop the staged files of several slots in one mutation.
    pub fn cancel_many(&mut self, slots: &[SlotCode]) {
        for staged in self.local.clear_many(slots) {
            self.previews.release(staged.slot);
        }
    }

    /// Drop every staged file.
    pub fn cancel_all(&mut self) {
        let cleared = self.local.clear_all();
        for staged in &cleared {
            self.previews.release(staged.slot);
        }
        log::debug!("Cancelled {} staged slots", cleared.len());
    }

    pub fn drag_enter(&mut self, slot: SlotCode) {
        self.drop_target.drag_enter(slot);
    }

    pub fn drag_leave(&mut self, slot: SlotCode) {
        self.drop_target.drag_leave(slot);
    }

    /// Start a snapshot load. Any earlier load's result becomes stale.
    pub fn begin_load(&mut self) -> Ticket {
        self.load_sequence += 1;
        self.merged_since_load.clear();
        self.load_state = LoadState::Loading;
        log::debug!("Loading snapshot for {}", self.entity);
        self.ticket(self.load_sequence)
    }

    /// Apply a snapshot load result.
    pub fn finish_load(
        &mut self,
        ticket: &Ticket,
        result: Result<SlotUrlMap, ApiError>,
    ) -> LoadResolution {
        if !self.is_current(ticket, self.load_sequence) {
            log::debug!("Dropping stale snapshot for {}", ticket.entity);
            return LoadResolution::Stale;
        }

        match result {
            Ok(snapshot) => {
                let assets = snapshot.len();
                self.remote.replace_all(snapshot);
                self.remote.merge(self.merged_since_load.clone());
                self.load_state = LoadState::Loaded;
                log::info!("Loaded {} persisted images for {}", assets, self.entity);
                LoadResolution::Loaded { assets }
            }
            Err(e) => {
                log::warn!("Snapshot load for {} failed: {}", self.entity, e);
                self.remote.clear();
                self.remote.merge(self.merged_since_load.clone());
                self.load_state = LoadState::Failed {
                    message: e.to_string(),
                };
                self.notices.push(Notice::new(
                    NoticeKind::SnapshotLoad,
                    format!("Could not load saved images: {}", e),
                ));
                LoadResolution::Failed(e)
            }
        }
    }

    /// Start a batch commit of every staged slot.
    ///
    /// Returns `Ok(None)` when nothing is staged.
    pub fn begin_commit(&mut self) -> Result<Option<(Ticket, CommitBatch)>, CommitError> {
        match self.commits.begin(&self.local) {
            Ok(CommitStart::Started(batch)) => {
                self.commit_sequence += 1;
                self.upload_progress = Some(0);
                Ok(Some((self.ticket(self.commit_sequence), batch)))
            }
            Ok(CommitStart::NothingToCommit) => {
                self.notices
                    .push(Notice::new(NoticeKind::NothingToCommit, "No images selected"));
                Ok(None)
            }
            Err(e) => {
                self.notices.push(Notice::new(NoticeKind::Busy, e.to_string()));
                Err(e)
            }
        }
    }

    /// Record upload progress of the in-flight commit.
    pub fn report_progress(&mut self, ticket: &Ticket, sent: u64, total: u64) {
        if !self.is_current(ticket, self.commit_sequence) || !self.commits.is_in_flight() {
            return;
        }
        let percent = if total == 0 {
            100
        } else {
            (sent.min(total) * 100 / total) as u8
        };
        log::trace!("Upload progress for {}: {}%", self.entity, percent);
        self.upload_progress = Some(percent);
    }

    /// Apply a batch commit result.
    pub fn finish_commit(
        &mut self,
        ticket: &Ticket,
        result: Result<CommitOutcome, ApiError>,
    ) -> CommitResolution {
        if !self.is_current(ticket, self.commit_sequence) || !self.commits.is_in_flight() {
            log::debug!("Dropping stale commit result for {}", ticket.entity);
            return CommitResolution::Stale;
        }
        self.upload_progress = None;

        let applied = self.commits.finish(
            result,
            &mut self.remote,
            &mut self.local,
            &mut self.previews,
        );
        match applied {
            Ok(report) => {
                self.merged_since_load.extend(report.persisted.clone());
                if let Some(summary) = report.failure_summary() {
                    self.notices
                        .push(Notice::new(NoticeKind::PartialCommit, summary));
                    for (slot, reason) in &report.failed {
                        self.notices.push(
                            Notice::new(
                                NoticeKind::PartialCommit,
                                format!("{}: {}", slot, reason),
                            )
                            .for_slot(*slot),
                        );
                    }
                } else if !report.persisted.is_empty() {
                    self.notices.push(Notice::new(
                        NoticeKind::Committed,
                        format!("Saved {} images", report.persisted.len()),
                    ));
                }
                CommitResolution::Applied(report)
            }
            Err(e) => {
                self.notices
                    .push(Notice::new(NoticeKind::TotalCommit, e.to_string()));
                CommitResolution::Rejected(e)
            }
        }
    }

    /// Render boundary: create scheduled previews, then derive slot states.
    pub fn view(&mut self) -> SessionView {
        for (slot, e) in self.previews.materialize() {
            self.notices
                .push(Notice::new(NoticeKind::Preview, e.to_string()).for_slot(slot));
        }
        SessionView {
            entity: self.entity.clone(),
            load: self.load_state.clone(),
            slots: reconcile(
                &self.registry,
                &self.remote,
                &self.local,
                &self.previews,
                &self.drop_target,
            ),
            staged: self.local.len(),
            commit_in_flight: self.commits.is_in_flight(),
            upload_progress: self.upload_progress,
        }
    }

    /// Drain pending operator notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Release every handle and invalidate all outstanding tickets.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.commits.abandon();
        self.upload_progress = None;
        self.local.clear_all();
        self.previews.release_all();
        self.drop_target.reset();
        self.remote.clear();
        log::debug!("Session {} torn down", self.entity);
    }

    fn ticket(&self, sequence: u64) -> Ticket {
        Ticket {
            entity: self.entity.clone(),
            generation: self.generation,
            sequence,
        }
    }

    fn is_current(&self, ticket: &Ticket, sequence: u64) -> bool {
        !self.torn_down
            && ticket.generation == self.generation
            && ticket.entity == self.entity
            && ticket.sequence == sequence
    }
}

impl Drop for SlotSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
