//! Handle lifecycle, commit bookkeeping and staleness.

use super::*;
use crate::api::CommitOutcome;
use crate::drop_target::InputSource;
use crate::error::{ApiError, CommitError, ValidationError};
use crate::model::{HandleOrigin, NoticeKind, SlotStatus, SlotUrlMap};
use crate::state::{CommitResolution, LoadResolution, LoadState, Ticket};

#[test]
fn test_staged_shadows_remote_for_every_slot() {
    let (mut session, _backend) = session();
    let snapshot: SlotUrlMap = session
        .registry()
        .slots()
        .map(|slot| (slot, format!("https://cdn/x/{}.png", slot)))
        .collect();
    let ticket = session.begin_load();
    session.finish_load(&ticket, Ok(snapshot));

    let slots: Vec<_> = session.registry().slots().collect();
    for slot in &slots {
        session.stage(*slot, png("local.png")).unwrap();
    }

    let view = session.view();
    for state in &view.slots {
        assert_eq!(state.status, SlotStatus::Pending);
        let preview = state.preview.as_ref().unwrap();
        assert_eq!(preview.origin, HandleOrigin::Local);
        assert_eq!(preview.url, session.previews().handle(state.slot).unwrap().url());
    }
}

#[test]
fn test_remote_urls_never_revoked() {
    let (mut session, backend) = session();
    let spd = session.lookup("SPD").unwrap();
    let ticket = session.begin_load();
    session.finish_load(
        &ticket,
        Ok(SlotUrlMap::from([(spd, "https://cdn/x/SPD.png".to_string())])),
    );

    session.stage(spd, png("a.png")).unwrap();
    session.view();
    session.stage(spd, png("b.png")).unwrap();
    session.view();
    session.cancel(spd);
    session.cancel(spd);
    session.view();
    session.teardown();

    let log = backend.log.borrow();
    assert_eq!(log.revoke_count("https://cdn/x/SPD.png"), 0);
    assert!(log.revoked.iter().all(|url| url.starts_with("blob:")));
    assert_eq!(log.live(), 0);
}

#[test]
fn test_mixed_commit_outcome() {
    let (mut session, backend) = session();
    let a = session.lookup("SHO").unwrap();
    let b = session.lookup("DRI").unwrap();
    session.stage(a, png("a.png")).unwrap();
    session.stage(b, png("b.png")).unwrap();
    let view = session.view();
    let a_url = slot_state(&view, a).preview.clone().unwrap().url;
    let b_url = slot_state(&view, b).preview.clone().unwrap().url;

    let (ticket, _batch) = session.begin_commit().unwrap().unwrap();
    let outcome = CommitOutcome {
        uploaded: SlotUrlMap::from([(a, "https://cdn/x/url1.png".to_string())]),
        failed: [(b, "reason".to_string())].into_iter().collect(),
    };
    let CommitResolution::Applied(report) = session.finish_commit(&ticket, Ok(outcome)) else {
        panic!("commit should apply");
    };
    assert_eq!(report.committed, vec![a]);

    let view = session.view();
    assert_eq!(slot_state(&view, a).status, SlotStatus::Server);
    assert_eq!(
        slot_state(&view, a).preview.as_ref().unwrap().url,
        "https://cdn/x/url1.png"
    );
    assert_eq!(slot_state(&view, b).status, SlotStatus::Pending);
    assert_eq!(slot_state(&view, b).preview.as_ref().unwrap().url, b_url);

    let log = backend.log.borrow();
    assert_eq!(log.revoke_count(&a_url), 1);
    assert_eq!(log.revoke_count(&b_url), 0);

    let notices = session.take_notices();
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0].kind, NoticeKind::PartialCommit);
    assert_eq!(notices[0].message, "Upload failed for: DRI");
    assert_eq!(notices[0].slot, None);
    assert_eq!(notices[1].kind, NoticeKind::PartialCommit);
    assert_eq!(notices[1].slot, Some(b));
}

#[test]
fn test_reselect_replaces_without_empty_frame() {
    let (mut session, backend) = session();
    let spd = session.lookup("SPD").unwrap();
    session.stage(spd, png("first.png")).unwrap();
    let first = session.view();
    let old_url = slot_state(&first, spd).preview.clone().unwrap().url;

    session.stage(spd, png("second.png")).unwrap();
    // Old handle is still the active one until the next render
    assert!(backend.log.borrow().revoked.is_empty());

    let second = session.view();
    let state = slot_state(&second, spd);
    assert_eq!(state.status, SlotStatus::Pending);
    let new_url = &state.preview.as_ref().unwrap().url;
    assert_ne!(new_url, &old_url);

    let log = backend.log.borrow();
    assert_eq!(log.revoked, vec![old_url]);
    assert_eq!(log.live(), 1);
}

#[test]
fn test_identical_reselect_still_replaces_handle() {
    let (mut session, backend) = session();
    let spd = session.lookup("SPD").unwrap();
    session.stage(spd, png("same.png")).unwrap();
    session.view();
    session.stage(spd, png("same.png")).unwrap();
    session.view();
    assert_eq!(backend.log.borrow().created.len(), 2);
    assert_eq!(backend.log.borrow().revoked.len(), 1);
}

#[test]
fn test_stage_then_cancel_before_render_creates_nothing() {
    let (mut session, backend) = session();
    let spd = session.lookup("SPD").unwrap();
    session.stage(spd, png("a.png")).unwrap();
    session.cancel(spd);
    session.view();

    let log = backend.log.borrow();
    assert!(log.created.is_empty());
    assert!(log.revoked.is_empty());
}

#[test]
fn test_preview_failure_keeps_slot_pending() {
    let (mut session, backend) = session();
    let spd = session.lookup("SPD").unwrap();
    backend.log.borrow_mut().fail_next = true;
    session.stage(spd, png("a.png")).unwrap();

    let view = session.view();
    assert_eq!(slot_state(&view, spd).status, SlotStatus::Pending);
    assert!(slot_state(&view, spd).preview.is_none());

    let notices = session.take_notices();
    assert_eq!(notices[0].kind, NoticeKind::Preview);
    assert_eq!(notices[0].slot, Some(spd));
}

#[test]
fn test_reselect_during_commit_keeps_newer_file() {
    let (mut session, _backend) = session();
    let spd = session.lookup("SPD").unwrap();
    session.stage(spd, png("old.png")).unwrap();
    session.view();
    let (ticket, _batch) = session.begin_commit().unwrap().unwrap();

    let newer = session.stage(spd, png("new.png")).unwrap();
    let outcome = CommitOutcome {
        uploaded: SlotUrlMap::from([(spd, "https://cdn/x/SPD.png".to_string())]),
        ..Default::default()
    };
    session.finish_commit(&ticket, Ok(outcome));

    assert_eq!(session.local().stage_id(spd), Some(newer));
    assert_eq!(session.remote().url(spd), Some("https://cdn/x/SPD.png"));
    let view = session.view();
    assert_eq!(slot_state(&view, spd).status, SlotStatus::Pending);
}

#[test]
fn test_malformed_commit_clears_nothing() {
    let (mut session, backend) = session();
    let spd = session.lookup("SPD").unwrap();
    session.stage(spd, png("a.png")).unwrap();
    session.view();
    let (ticket, _batch) = session.begin_commit().unwrap().unwrap();

    let resolution = session.finish_commit(&ticket, Err(ApiError::malformed("no uploaded map")));
    assert!(matches!(
        resolution,
        CommitResolution::Rejected(CommitError::Total(ApiError::Malformed(_)))
    ));
    assert!(session.local().contains(spd));
    assert!(session.remote().is_empty());
    assert!(backend.log.borrow().revoked.is_empty());
    assert!(!session.is_commit_in_flight());

    let notices = session.take_notices();
    assert_eq!(notices[0].kind, NoticeKind::TotalCommit);

    // Batch stays retryable
    assert!(session.begin_commit().unwrap().is_some());
}

#[test]
fn test_commit_guards() {
    let (mut session, _backend) = session();
    assert!(session.begin_commit().unwrap().is_none());
    assert_eq!(session.take_notices()[0].kind, NoticeKind::NothingToCommit);

    let spd = session.lookup("SPD").unwrap();
    session.stage(spd, png("a.png")).unwrap();
    session.begin_commit().unwrap();
    assert_eq!(session.begin_commit().unwrap_err(), CommitError::InFlight);
    assert_eq!(session.take_notices()[0].kind, NoticeKind::Busy);
}

#[test]
fn test_failed_load_renders_empty() {
    let (mut session, _backend) = session();
    let ticket = session.begin_load();
    let resolution = session.finish_load(
        &ticket,
        Err(ApiError::Server {
            status: 500,
            message: "boom".to_string(),
        }),
    );
    assert!(matches!(resolution, LoadResolution::Failed(_)));
    assert!(matches!(session.load_state(), LoadState::Failed { .. }));

    let view = session.view();
    assert!(view.slots.iter().all(|s| s.status == SlotStatus::Empty));
    assert_eq!(session.take_notices()[0].kind, NoticeKind::SnapshotLoad);

    // Retry
    let spd = session.lookup("SPD").unwrap();
    let ticket = session.begin_load();
    session.finish_load(&ticket, Ok(SlotUrlMap::from([(spd, "u".to_string())])));
    assert_eq!(session.load_state(), &LoadState::Loaded);
}

#[test]
fn test_superseded_load_is_stale() {
    let (mut session, _backend) = session();
    let spd = session.lookup("SPD").unwrap();
    let first = session.begin_load();
    let second = session.begin_load();

    assert_eq!(
        session.finish_load(&first, Ok(SlotUrlMap::from([(spd, "old".to_string())]))),
        LoadResolution::Stale
    );
    assert!(session.remote().is_empty());
    session.finish_load(&second, Ok(SlotUrlMap::from([(spd, "new".to_string())])));
    assert_eq!(session.remote().url(spd), Some("new"));
}

#[test]
fn test_entity_switch_drops_in_flight_results() {
    let (mut old, old_backend) = session_for(user("1"), 1);
    let spd = old.lookup("SPD").unwrap();
    old.stage(spd, png("a.png")).unwrap();
    old.view();
    let load = old.begin_load();
    let (commit, _batch) = old.begin_commit().unwrap().unwrap();

    old.teardown();
    assert_eq!(old_backend.log.borrow().live(), 0);

    let (mut new, new_backend) = session_for(user("2"), 2);
    let snapshot = SlotUrlMap::from([(spd, "https://cdn/1/SPD.png".to_string())]);
    assert_eq!(new.finish_load(&load, Ok(snapshot.clone())), LoadResolution::Stale);
    assert_eq!(old.finish_load(&load, Ok(snapshot.clone())), LoadResolution::Stale);

    let outcome = CommitOutcome {
        uploaded: snapshot,
        ..Default::default()
    };
    assert_eq!(new.finish_commit(&commit, Ok(outcome)), CommitResolution::Stale);

    assert!(new.remote().is_empty());
    assert!(new.local().is_empty());
    assert!(new.take_notices().is_empty());
    assert!(new_backend.log.borrow().created.is_empty());
}

#[test]
fn test_hover_and_unknown_codes() {
    let (mut session, _backend) = session();
    let tac = session.lookup("TAC").unwrap();
    session.drag_enter(tac);
    assert!(slot_state(&session.view(), tac).hovered);

    session
        .receive(tac, InputSource::Drop, vec![png("t.png")])
        .unwrap();
    assert!(!slot_state(&session.view(), tac).hovered);

    assert!(session.resolve("OVR").is_none());
    assert_eq!(session.take_notices()[0].kind, NoticeKind::Validation);
    assert_eq!(slot_state(&session.view(), tac).group, Some("positional"));
}

#[test]
fn test_upload_progress_tracks_current_commit() {
    let (mut session, _backend) = session();
    let spd = session.lookup("SPD").unwrap();
    session.stage(spd, png("s.png")).unwrap();
    assert_eq!(session.view().upload_progress, None);

    let (ticket, _batch) = session.begin_commit().unwrap().unwrap();
    assert_eq!(session.view().upload_progress, Some(0));
    session.report_progress(&ticket, 512, 2048);
    assert_eq!(session.view().upload_progress, Some(25));
    session.report_progress(&ticket, 4096, 2048);
    assert_eq!(session.view().upload_progress, Some(100));

    let old = Ticket {
        sequence: ticket.sequence - 1,
        ..ticket.clone()
    };
    session.report_progress(&old, 0, 2048);
    assert_eq!(session.view().upload_progress, Some(100));

    session.finish_commit(&ticket, Err(ApiError::Network("offline".to_string())));
    assert_eq!(session.view().upload_progress, None);
    session.report_progress(&ticket, 10, 20);
    assert_eq!(session.view().upload_progress, None);
}

#[test]
fn test_receive_by_code() {
    let (mut session, _backend) = session();
    let spd = session.lookup("SPD").unwrap();

    let staged = session.receive_code("spd", InputSource::Picker, vec![png("a.png")]);
    assert_eq!(staged, session.local().stage_id(spd));
    assert!(staged.is_some());

    let big = file("big.png", "image/png", 6 * MIB);
    assert!(session.receive_code("SPD", InputSource::Drop, vec![big]).is_none());
    assert!(session.receive_code("OVR", InputSource::Drop, vec![png("b.png")]).is_none());
    assert_eq!(session.local().stage_id(spd), staged);

    let notices = session.take_notices();
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0].slot, Some(spd));
    assert_eq!(notices[1].slot, None);
}

#[test]
fn test_stage_clears_hover() {
    let (mut session, _backend) = session();
    let pas = session.lookup("PAS").unwrap();
    let sho = session.lookup("SHO").unwrap();
    session.drag_enter(pas);
    session.drag_enter(sho);

    session.stage(pas, png("p.png")).unwrap();
    let view = session.view();
    assert!(!slot_state(&view, pas).hovered);
    assert!(slot_state(&view, sho).hovered);

    session.drag_enter(sho);
    assert!(session.stage(sho, file("s.gif", "image/gif", 10)).is_err());
    assert!(!slot_state(&session.view(), sho).hovered);
}

#[test]
fn test_slot_from_another_class_is_rejected() {
    let formation = EntityRef::new(EntityClass::MatchFormation, "m1");
    let (mut session, backend) = session_for(formation, 1);
    let spd = EntityClass::UserStats.registry().lookup("SPD").unwrap();

    let err = session.stage(spd, png("a.png")).unwrap_err();
    assert!(matches!(err, ValidationError::UnknownSlot { .. }));
    let err = session
        .receive(spd, InputSource::Picker, vec![png("b.png")])
        .unwrap_err();
    assert!(matches!(err, ValidationError::UnknownSlot { .. }));

    assert!(session.local().is_empty());
    let view = session.view();
    assert!(view.slots.iter().all(|s| s.slot != spd));
    assert_eq!(backend.log.borrow().created.len(), 0);
    let notices = session.take_notices();
    assert_eq!(notices.len(), 2);
    assert!(notices.iter().all(|n| n.kind == NoticeKind::Validation));
    assert!(session.begin_commit().unwrap().is_none());
}

#[test]
fn test_older_snapshot_keeps_committed_url() {
    let (mut session, _backend) = session();
    let pas = session.lookup("PAS").unwrap();
    let spd = session.lookup("SPD").unwrap();
    session.stage(pas, png("p.png")).unwrap();
    session.view();

    let load = session.begin_load();
    let (ticket, _batch) = session.begin_commit().unwrap().unwrap();
    let outcome = CommitOutcome {
        uploaded: SlotUrlMap::from([(pas, "https://cdn/x/PAS-new.png".to_string())]),
        ..Default::default()
    };
    session.finish_commit(&ticket, Ok(outcome));

    let older = SlotUrlMap::from([
        (pas, "https://cdn/x/PAS-old.png".to_string()),
        (spd, "https://cdn/x/SPD.png".to_string()),
    ]);
    assert_eq!(
        session.finish_load(&load, Ok(older)),
        LoadResolution::Loaded { assets: 2 }
    );
    assert_eq!(session.remote().url(pas), Some("https://cdn/x/PAS-new.png"));
    assert_eq!(session.remote().url(spd), Some("https://cdn/x/SPD.png"));

    let reload = session.begin_load();
    let fresh = SlotUrlMap::from([(pas, "https://cdn/x/PAS-other.png".to_string())]);
    session.finish_load(&reload, Ok(fresh));
    assert_eq!(session.remote().url(pas), Some("https://cdn/x/PAS-other.png"));
    assert!(session.remote().get(spd).is_none());
}

#[test]
fn test_cancel_during_commit_is_not_a_failure() {
    let (mut session, backend) = session();
    let spd = session.lookup("SPD").unwrap();
    let pas = session.lookup("PAS").unwrap();
    let pac = session.lookup("PAC").unwrap();
    session.stage(spd, png("s.png")).unwrap();
    session.stage(pas, png("p.png")).unwrap();
    session.stage(pac, png("c.png")).unwrap();
    session.view();

    let (ticket, _batch) = session.begin_commit().unwrap().unwrap();
    session.cancel(spd);
    session.cancel(pas);
    let outcome = CommitOutcome {
        uploaded: SlotUrlMap::from([
            (spd, "https://cdn/x/SPD.png".to_string()),
            (pac, "https://cdn/x/PAC.png".to_string()),
        ]),
        failed: [(pas, "bad".to_string())].into_iter().collect(),
    };
    let CommitResolution::Applied(report) = session.finish_commit(&ticket, Ok(outcome)) else {
        panic!("commit should apply");
    };

    assert!(report.is_complete());
    assert_eq!(report.committed, vec![pac]);
    assert!(report.superseded.is_empty());
    assert_eq!(report.cancelled, vec![pas, spd]);

    let view = session.view();
    assert_eq!(slot_state(&view, spd).status, SlotStatus::Server);
    assert_eq!(slot_state(&view, pas).status, SlotStatus::Empty);
    assert_eq!(backend.log.borrow().live(), 0);

    let notices = session.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::Committed);
    assert_eq!(notices[0].message, "Saved 2 images");
}

#[test]
fn test_cancel_all_and_view_json() {
    let (mut session, backend) = session();
    for code in ["SPD", "PAS", "PAC"] {
        let slot = session.lookup(code).unwrap();
        session.stage(slot, png("x.png")).unwrap();
    }
    session.view();
    let spd = session.lookup("SPD").unwrap();
    let pas = session.lookup("PAS").unwrap();
    session.cancel_many(&[spd, pas]);
    assert_eq!(session.local().len(), 1);
    assert_eq!(backend.log.borrow().live(), 1);

    session.cancel_all();
    let view = session.view();
    assert_eq!(view.staged, 0);
    assert_eq!(backend.log.borrow().live(), 0);

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["entity"]["class"], "user_stats");
    assert_eq!(json["load"]["state"], "idle");
    assert_eq!(json["slots"][0]["slot"], "SPD");
    assert_eq!(json["slots"][0]["status"], "EMPTY");
}
