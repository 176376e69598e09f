//! Driving one search session from `init` to release.
//!
//! A session initializes the engine, then alternates between one engine step
//! and one cooperative yield until the engine reports exhaustion. The engine
//! handle is held by a guard for the whole session so it is released exactly
//! once on every exit path: exhaustion, an engine error, a caught panic, or
//! the session future being dropped mid-flight.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use tracing::{debug, error, trace, warn};

use crate::coords::Coordinate;
use crate::engine::{EngineHandle, ResultSink, SearchEngine};
use crate::error::{EngineError, SessionError};
use crate::request::SearchRequest;
use crate::status::{SearchStatus, StatusSurface};

/// Identifier assigned to each submitted session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Initializing,
    Running,
    Completed,
    Failed,
}

/// What a finished session did.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub id: SessionId,
    pub state: SessionState,
    /// Number of `step` calls made, including the final one.
    pub steps: u64,
    /// Coordinates this session reported into the shared results.
    pub reported: usize,
}

/// Owns the engine handle for the lifetime of a session.
struct HandleGuard<'e> {
    engine: &'e dyn SearchEngine,
    handle: Option<EngineHandle>,
}

impl<'e> HandleGuard<'e> {
    fn new(engine: &'e dyn SearchEngine, handle: EngineHandle) -> Self {
        Self {
            engine,
            handle: Some(handle),
        }
    }

    fn handle(&self) -> EngineHandle {
        match self.handle {
            Some(handle) => handle,
            None => unreachable!("handle is only taken on release"),
        }
    }

    fn release(mut self) {
        self.release_in_place();
    }

    fn release_in_place(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.engine.deinit(handle);
            trace!(%handle, "engine handle released");
        }
    }
}

impl Drop for HandleGuard<'_> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            warn!("search session dropped before completion; releasing engine handle");
            self.release_in_place();
        }
    }
}

/// Counts reports while forwarding them to the shared sink.
struct CountingSink<'a> {
    inner: &'a mut dyn ResultSink,
    reported: usize,
}

impl ResultSink for CountingSink<'_> {
    fn report(&mut self, coordinate: Coordinate) {
        self.reported += 1;
        self.inner.report(coordinate);
    }
}

/// Drives a single search session against a shared engine.
pub struct SessionController {
    id: SessionId,
    engine: Rc<dyn SearchEngine>,
    results: Rc<RefCell<dyn ResultSink>>,
    status: Rc<RefCell<dyn StatusSurface>>,
    state: Rc<Cell<SessionState>>,
}

impl SessionController {
    pub fn new(
        id: SessionId,
        engine: Rc<dyn SearchEngine>,
        results: Rc<RefCell<dyn ResultSink>>,
        status: Rc<RefCell<dyn StatusSurface>>,
    ) -> Self {
        Self {
            id,
            engine,
            results,
            status,
            state: Rc::new(Cell::new(SessionState::Initializing)),
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Shared view of the session's lifecycle that stays readable after
    /// [`run`](Self::run) has taken the controller.
    #[must_use]
    pub fn state_cell(&self) -> Rc<Cell<SessionState>> {
        Rc::clone(&self.state)
    }

    /// Run the session to exhaustion.
    ///
    /// On an init failure no step is attempted and the status surface is left
    /// untouched. On exhaustion the status becomes [`SearchStatus::Done`].
    /// Engine errors and panics end the session as failed; in every case the
    /// engine handle has been released by the time this returns.
    pub async fn run(self, request: SearchRequest) -> Result<SessionSummary, SessionError> {
        let id = self.id;
        let engine = Rc::clone(&self.engine);
        debug!(%id, engine = engine.name(), ?request, "initializing search");

        let Some(handle) = engine.init(&request) else {
            self.state.set(SessionState::Failed);
            error!(%id, "error initializing search");
            return Err(SessionError::Initialization);
        };

        let guard = HandleGuard::new(engine.as_ref(), handle);
        self.state.set(SessionState::Running);
        debug!(%id, %handle, "search running");

        let mut steps = 0u64;
        let mut reported = 0usize;
        let finished = loop {
            steps += 1;
            let more = match self.step(guard.handle(), &mut reported) {
                Ok(more) => more,
                Err(err) => break Err(err),
            };
            if !more {
                break Ok(());
            }

            let fraction = match self.progress(guard.handle()) {
                Ok(fraction) => fraction,
                Err(err) => break Err(err),
            };
            self.status.borrow_mut().publish(SearchStatus::searching(fraction));
            trace!(%id, steps, fraction, "step complete");

            tokio::task::yield_now().await;
        };

        guard.release();

        match finished {
            Ok(()) => {
                self.state.set(SessionState::Completed);
                self.status.borrow_mut().publish(SearchStatus::Done);
                debug!(%id, steps, reported, "search complete");
                Ok(SessionSummary {
                    id,
                    state: SessionState::Completed,
                    steps,
                    reported,
                })
            }
            Err(err) => {
                self.state.set(SessionState::Failed);
                error!(%id, steps, reported, error = %err, "search failed");
                Err(SessionError::Engine(err))
            }
        }
    }

    fn step(&self, handle: EngineHandle, reported: &mut usize) -> Result<bool, EngineError> {
        let mut results = self.results.borrow_mut();
        let mut sink = CountingSink {
            inner: &mut *results,
            reported: 0,
        };
        let outcome = catch_unwind(AssertUnwindSafe(|| self.engine.step(handle, &mut sink)));
        *reported += sink.reported;
        outcome.unwrap_or_else(|payload| Err(EngineError::Panicked(panic_message(payload))))
    }

    fn progress(&self, handle: EngineHandle) -> Result<f64, EngineError> {
        let fraction = catch_unwind(AssertUnwindSafe(|| self.engine.progress(handle)))
            .unwrap_or_else(|payload| Err(EngineError::Panicked(panic_message(payload))))?;
        if fraction.is_nan() || !(0.0..=1.0).contains(&fraction) {
            return Err(EngineError::InvalidProgress(fraction));
        }
        Ok(fraction)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
