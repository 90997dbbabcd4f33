//! Per-entity state: persisted snapshot, staged selections and the session
//! that owns them.

mod local;
mod remote;
mod session;

#[cfg(test)]
mod tests;

pub use local::LocalSelectionStore;
pub use remote::RemoteSnapshotStore;
pub use session::{
    CommitResolution, LoadResolution, LoadState, SessionView, SlotSession, Ticket,
};
