//! Session-level tests driving the stores through their public commands.

mod session_tests;

use crate::config::UploaderConfig;
use crate::model::{LocalFile, SlotViewState};
use crate::preview::testing::RecordingUrls;
use crate::registry::{EntityClass, EntityRef, SlotCode};
use crate::state::{SessionView, SlotSession};

const MIB: u64 = 1024 * 1024;

fn user(id: &str) -> EntityRef {
    EntityRef::new(EntityClass::UserStats, id)
}

fn session_for(entity: EntityRef, generation: u64) -> (SlotSession, RecordingUrls) {
    let backend = RecordingUrls::default();
    let session = SlotSession::new(
        entity,
        generation,
        &UploaderConfig::default(),
        Box::new(backend.clone()),
    );
    (session, backend)
}

fn session() -> (SlotSession, RecordingUrls) {
    session_for(user("42"), 1)
}

fn file(name: &str, mime: &str, byte_size: u64) -> LocalFile {
    LocalFile::new(name, mime, byte_size, Vec::new())
}

fn png(name: &str) -> LocalFile {
    file(name, "image/png", 1024)
}

fn slot_state(view: &SessionView, slot: SlotCode) -> &SlotViewState {
    view.slots
        .iter()
        .find(|state| state.slot == slot)
        .expect("slot missing from view")
}
