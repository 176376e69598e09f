//! Application context shared by every search session.
//!
//! The context owns the engine binding, the ranked results and the status
//! line. Sessions borrow them through reference-counted handles; results are
//! never reset between submissions, so a context accumulates everything its
//! sessions discover until it is torn down with [`AppContext::finish`].

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::collector::{LabelList, RankedResults, ResultMirror};
use crate::coords::Coordinate;
use crate::engine::{ResultSink, SearchEngine};
use crate::error::SessionError;
use crate::request::SearchRequest;
use crate::session::{SessionController, SessionId, SessionState, SessionSummary};
use crate::status::{SearchStatus, StatusLine, StatusSurface};

pub type SessionResult = Result<SessionSummary, SessionError>;

/// Final state of a context after all of its sessions have finished.
#[derive(Debug, Clone)]
pub struct ContextReport {
    pub results: Vec<Coordinate>,
    pub status: SearchStatus,
    pub sessions: Vec<SessionResult>,
}

impl ContextReport {
    /// Number of sessions that ran to exhaustion.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.sessions.iter().filter(|session| session.is_ok()).count()
    }
}

pub struct AppContext<M: ResultMirror + 'static = LabelList> {
    engine: Rc<dyn SearchEngine>,
    results: Rc<RefCell<RankedResults<M>>>,
    status: Rc<RefCell<StatusLine>>,
    next_session: Cell<u64>,
    pending: RefCell<Vec<JoinHandle<SessionResult>>>,
    states: RefCell<Vec<(SessionId, Rc<Cell<SessionState>>)>>,
}

impl AppContext<LabelList> {
    pub fn new(engine: Rc<dyn SearchEngine>) -> Self {
        Self::with_mirror(engine, LabelList::new())
    }
}

impl<M: ResultMirror + 'static> AppContext<M> {
    pub fn with_mirror(engine: Rc<dyn SearchEngine>, mirror: M) -> Self {
        debug!(engine = engine.name(), "search context created");
        Self {
            engine,
            results: Rc::new(RefCell::new(RankedResults::with_mirror(mirror))),
            status: Rc::new(RefCell::new(StatusLine::new())),
            next_session: Cell::new(0),
            pending: RefCell::new(Vec::new()),
            states: RefCell::new(Vec::new()),
        }
    }

    /// Borrow the ranked results. Do not hold the borrow across an `.await`.
    #[must_use]
    pub fn results(&self) -> Ref<'_, RankedResults<M>> {
        self.results.borrow()
    }

    #[must_use]
    pub fn status(&self) -> SearchStatus {
        self.status.borrow().current()
    }

    /// Number of submitted sessions that have not finished yet.
    #[must_use]
    pub fn running(&self) -> usize {
        self.pending
            .borrow()
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Lifecycle state of a session started by this context.
    #[must_use]
    pub fn session_state(&self, id: SessionId) -> Option<SessionState> {
        self.states
            .borrow()
            .iter()
            .find(|(session, _)| *session == id)
            .map(|(_, state)| state.get())
    }

    fn controller(&self) -> SessionController {
        let id = SessionId(self.next_session.get() + 1);
        self.next_session.set(id.0);
        let controller = SessionController::new(
            id,
            Rc::clone(&self.engine),
            Rc::clone(&self.results) as Rc<RefCell<dyn ResultSink>>,
            Rc::clone(&self.status) as Rc<RefCell<dyn StatusSurface>>,
        );
        self.states.borrow_mut().push((id, controller.state_cell()));
        controller
    }

    /// Run one session on the current task and wait for it.
    pub async fn run(&self, request: SearchRequest) -> SessionResult {
        self.controller().run(request).await
    }

    /// Start a session in the background on the current [`tokio::task::LocalSet`].
    ///
    /// Sessions submitted this way interleave with each other at their yield
    /// points. Returns the id the session will log under.
    pub fn submit(&self, request: SearchRequest) -> SessionId {
        let controller = self.controller();
        let id = controller.id();
        info!(%id, seed = request.seed, floor = %request.floor, "search submitted");
        let handle = tokio::task::spawn_local(controller.run(request));
        self.pending.borrow_mut().push(handle);
        id
    }

    /// Wait for every submitted session, then hand back the accumulated state.
    pub async fn finish(self) -> ContextReport {
        let pending = self.pending.take();
        let mut sessions = Vec::with_capacity(pending.len());
        for handle in pending {
            match handle.await {
                Ok(result) => sessions.push(result),
                Err(err) => {
                    warn!(error = %err, "search session task did not complete");
                }
            }
        }

        let results = self.results.borrow().snapshot();
        let status = self.status.borrow().current();
        debug!(sessions = sessions.len(), results = results.len(), "search context finished");
        ContextReport {
            results,
            status,
            sessions,
        }
    }
}
