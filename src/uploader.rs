//! Async driver connecting a [`SlotSession`] to a [`SlotApi`].
//!
//! The session lives in `Rc<RefCell<_>>`. Every borrow ends before the
//! driver awaits the network, and results re-enter through ticketed
//! `finish_*` calls, so a response for an entity that is no longer mounted
//! is dropped without touching state.

use std::cell::RefCell;
use std::rc::Rc;

use crate::api::{ProgressFn, SlotApi};
use crate::config::UploaderConfig;
use crate::model::Notice;
use crate::preview::ObjectUrlBackend;
use crate::registry::EntityRef;
use crate::state::{CommitResolution, LoadResolution, SessionView, SlotSession, Ticket};

/// Creates the preview backend for each new session.
pub type BackendFactory = Rc<dyn Fn() -> Box<dyn ObjectUrlBackend>>;

#[derive(Default)]
struct Inner {
    session: Option<SlotSession>,
    generation: u64,
}

/// Mounts entities and runs their loads and commits.
pub struct SlotUploader<A: SlotApi> {
    api: Rc<A>,
    config: Rc<UploaderConfig>,
    backends: BackendFactory,
    inner: Rc<RefCell<Inner>>,
}

impl<A: SlotApi> Clone for SlotUploader<A> {
    fn clone(&self) -> Self {
        Self {
            api: Rc::clone(&self.api),
            config: Rc::clone(&self.config),
            backends: Rc::clone(&self.backends),
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A: SlotApi> SlotUploader<A> {
    pub fn new(api: A, config: UploaderConfig, backends: BackendFactory) -> Self {
        Self {
            api: Rc::new(api),
            config: Rc::new(config),
            backends,
            inner: Rc::new(RefCell::new(Inner::default())),
        }
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    /// Tear down the current session and open one for `entity`.
    ///
    /// Every handle of the old session is released before this returns.
    /// The returned ticket is for the new session's initial load.
    pub fn switch_entity(&self, entity: EntityRef) -> Ticket {
        let mut inner = self.inner.borrow_mut();
        if let Some(mut old) = inner.session.take() {
            log::info!("Switching from {} to {}", old.entity(), entity);
            old.teardown();
        }
        inner.generation += 1;
        let backend = (self.backends)();
        let mut session = SlotSession::new(entity, inner.generation, &self.config, backend);
        let ticket = session.begin_load();
        inner.session = Some(session);
        ticket
    }

    /// Mount `entity` and load its persisted snapshot.
    pub async fn mount(&self, entity: EntityRef) -> LoadResolution {
        let ticket = self.switch_entity(entity);
        self.load(ticket).await
    }

    /// Reload the snapshot of the mounted entity. `None` if nothing is mounted.
    pub async fn reload(&self) -> Option<LoadResolution> {
        let ticket = self.with_session(SlotSession::begin_load)?;
        Some(self.load(ticket).await)
    }

    /// Run the load a ticket was issued for and apply its result.
    pub async fn load(&self, ticket: Ticket) -> LoadResolution {
        let result = self.api.load_snapshot(&ticket.entity).await;
        self.with_session(|session| session.finish_load(&ticket, result))
            .unwrap_or(LoadResolution::Stale)
    }

    /// Commit every staged slot of the mounted entity.
    ///
    /// `None` when no request was sent: nothing mounted, nothing staged or a
    /// commit already running. The session queues a notice for the latter two.
    pub async fn commit(&self) -> Option<CommitResolution> {
        let (ticket, batch) = match self.with_session(SlotSession::begin_commit)? {
            Ok(Some(started)) => started,
            Ok(None) | Err(_) => return None,
        };
        let progress = self.progress_for(ticket.clone());
        let result = self
            .api
            .commit_batch(&ticket.entity, &batch.parts, progress)
            .await;
        let resolution = self
            .with_session(|session| session.finish_commit(&ticket, result))
            .unwrap_or(CommitResolution::Stale);
        Some(resolution)
    }

    /// Route upload progress to the session the ticket belongs to.
    fn progress_for(&self, ticket: Ticket) -> ProgressFn {
        let inner = Rc::clone(&self.inner);
        Rc::new(move |sent, total| {
            if let Some(session) = inner.borrow_mut().session.as_mut() {
                session.report_progress(&ticket, sent, total);
            }
        })
    }

    /// Tear down the mounted session, if any.
    pub fn unmount(&self) {
        if let Some(mut session) = self.inner.borrow_mut().session.take() {
            log::info!("Unmounting {}", session.entity());
            session.teardown();
        }
    }

    /// Run a synchronous command against the mounted session.
    pub fn with_session<R>(&self, f: impl FnOnce(&mut SlotSession) -> R) -> Option<R> {
        self.inner.borrow_mut().session.as_mut().map(f)
    }

    pub fn mounted(&self) -> Option<EntityRef> {
        self.inner
            .borrow()
            .session
            .as_ref()
            .map(|session| session.entity().clone())
    }

    /// Render the mounted session.
    pub fn view(&self) -> Option<SessionView> {
        self.with_session(SlotSession::view)
    }

    pub fn take_notices(&self) -> Vec<Notice> {
        self.with_session(SlotSession::take_notices)
            .unwrap_or_default()
    }
}
