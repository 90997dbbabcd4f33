//! Operator-visible notices.

use serde::Serialize;

use crate::registry::SlotCode;

/// Category of an operator notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// A dropped or picked file was rejected
    Validation,
    /// The persisted snapshot could not be loaded
    SnapshotLoad,
    /// Some slots of a batch failed
    PartialCommit,
    /// The whole batch failed
    TotalCommit,
    /// Submit pressed with nothing staged
    NothingToCommit,
    /// Submit pressed while a commit is still running
    Busy,
    /// A local preview could not be created
    Preview,
    /// A batch committed completely
    Committed,
}

impl NoticeKind {
    /// Whether this notice reports a failure.
    pub fn is_error(&self) -> bool {
        !matches!(
            self,
            NoticeKind::NothingToCommit | NoticeKind::Busy | NoticeKind::Committed
        )
    }
}

/// A message for the operator, drained by the host page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    /// The slot the notice is about, if any
    pub slot: Option<SlotCode>,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            slot: None,
            message: message.into(),
        }
    }

    /// Attach the slot this notice concerns.
    pub fn for_slot(mut self, slot: SlotCode) -> Self {
        self.slot = Some(slot);
        self
    }
}
