//! Batch commit of staged selections.
//!
//! A commit snapshots the staged slots together with their stage ids. When
//! the response arrives, successes are merged into the remote snapshot and
//! local entries are cleared only if they still hold the submitted file, so
//! a slot re-selected mid-commit keeps its newer selection.

use std::collections::BTreeMap;

use crate::api::{CommitOutcome, cache_busted};
use crate::constants::MISSING_RESULT_REASON;
use crate::error::{ApiError, CommitError};
use crate::model::{LocalFile, SlotUrlMap, StageId};
use crate::preview::PreviewResourceManager;
use crate::registry::SlotCode;
use crate::state::{LocalSelectionStore, RemoteSnapshotStore};

/// One file of a batch request.
#[derive(Debug, Clone)]
pub struct UploadPart {
    pub slot: SlotCode,
    pub stage_id: StageId,
    pub file: LocalFile,
}

/// Request payload captured when a commit starts.
#[derive(Debug, Clone)]
pub struct CommitBatch {
    pub parts: Vec<UploadPart>,
}

/// Result of trying to start a commit.
#[derive(Debug)]
pub enum CommitStart {
    /// A request should be sent with this batch
    Started(CommitBatch),
    /// Nothing staged; no request is made
    NothingToCommit,
}

/// How a resolved commit was applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Slots persisted and cleared locally
    pub committed: Vec<SlotCode>,
    /// Slots that stay staged, with the server's reason
    pub failed: Vec<(SlotCode, String)>,
    /// Slots persisted whose local selection was replaced mid-commit
    pub superseded: Vec<SlotCode>,
    /// Slots cancelled mid-commit; their server result is not a retry task
    pub cancelled: Vec<SlotCode>,
    /// Every URL merged into the remote snapshot
    pub persisted: SlotUrlMap,
}

impl CommitReport {
    /// Every submitted slot succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Summary line for partial failures, listing the failed slot codes.
    pub fn failure_summary(&self) -> Option<String> {
        if self.failed.is_empty() {
            return None;
        }
        let codes: Vec<&str> = self.failed.iter().map(|(slot, _)| slot.as_str()).collect();
        Some(format!("Upload failed for: {}", codes.join(", ")))
    }
}

#[derive(Debug)]
struct InFlight {
    submitted: BTreeMap<SlotCode, StageId>,
}

/// Runs at most one commit at a time for a session.
#[derive(Debug, Default)]
pub struct BatchCommitController {
    in_flight: Option<InFlight>,
    cache_bust: bool,
}

impl BatchCommitController {
    /// Create a controller. With `cache_bust`, committed URLs get a
    /// timestamp parameter so browsers refetch replaced images.
    pub fn new(cache_bust: bool) -> Self {
        Self {
            in_flight: None,
            cache_bust,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Snapshot the staged slots into a batch.
    pub fn begin(&mut self, local: &LocalSelectionStore) -> Result<CommitStart, CommitError> {
        if self.in_flight.is_some() {
            log::warn!("Commit refused: another commit is in flight");
            return Err(CommitError::InFlight);
        }
        if local.is_empty() {
            log::info!("Nothing to commit");
            return Ok(CommitStart::NothingToCommit);
        }

        let parts: Vec<UploadPart> = local
            .iter()
            .map(|staged| UploadPart {
                slot: staged.slot,
                stage_id: staged.stage_id,
                file: staged.file.clone(),
            })
            .collect();
        let submitted = parts.iter().map(|p| (p.slot, p.stage_id)).collect();

        log::info!("Committing {} slots", parts.len());
        self.in_flight = Some(InFlight { submitted });
        Ok(CommitStart::Started(CommitBatch { parts }))
    }

    /// Apply the response of the in-flight commit.
    ///
    /// A transport failure or malformed response changes nothing. Otherwise
    /// each submitted slot is either committed or left staged with a reason.
    pub fn finish(
        &mut self,
        result: Result<CommitOutcome, ApiError>,
        remote: &mut RemoteSnapshotStore,
        local: &mut LocalSelectionStore,
        previews: &mut PreviewResourceManager,
    ) -> Result<CommitReport, CommitError> {
        let Some(in_flight) = self.in_flight.take() else {
            log::warn!("Commit response arrived with no commit in flight");
            return Ok(CommitReport::default());
        };

        let mut outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("Commit failed: {}", e);
                return Err(CommitError::Total(e));
            }
        };

        for slot in outcome.uploaded.keys() {
            if !in_flight.submitted.contains_key(slot) {
                log::warn!("Ignoring upload result for unsubmitted slot {}", slot);
            }
        }

        let stamp = self.cache_bust.then(|| {
            web_time::SystemTime::now()
                .duration_since(web_time::UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default()
        });

        let mut report = CommitReport::default();
        for (&slot, &stage_id) in &in_flight.submitted {
            let still_staged = local.contains(slot);
            if let Some(url) = outcome.uploaded.remove(&slot) {
                let url = match stamp {
                    Some(stamp) => cache_busted(&url, stamp),
                    None => url,
                };
                report.persisted.insert(slot, url);

                if local.clear_if_stage(slot, stage_id).is_some() {
                    previews.release(slot);
                    report.committed.push(slot);
                } else if still_staged {
                    log::debug!("Slot {} was re-selected during commit", slot);
                    report.superseded.push(slot);
                } else {
                    log::debug!("Slot {} was cancelled during commit", slot);
                    report.cancelled.push(slot);
                }
            } else {
                let reason = outcome
                    .failed
                    .remove(&slot)
                    .unwrap_or_else(|| MISSING_RESULT_REASON.to_string());
                if still_staged {
                    log::warn!("Slot {} failed: {}", slot, reason);
                    report.failed.push((slot, reason));
                } else {
                    log::debug!("Slot {} failed after being cancelled: {}", slot, reason);
                    report.cancelled.push(slot);
                }
            }
        }
        remote.merge(report.persisted.clone());

        log::info!(
            "Commit applied: {} committed, {} failed, {} superseded, {} cancelled",
            report.committed.len(),
            report.failed.len(),
            report.superseded.len(),
            report.cancelled.len()
        );
        Ok(report)
    }

    /// Forget the in-flight commit; its response will be ignored.
    pub fn abandon(&mut self) {
        if self.in_flight.take().is_some() {
            log::debug!("In-flight commit abandoned");
        }
    }
}
