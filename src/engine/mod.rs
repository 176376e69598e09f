//! Contract between the session driver and an opaque search engine.
//!
//! An engine enumerates candidate coordinates inside a bounded region. The
//! driver hands it a [`SearchRequest`], receives an [`EngineHandle`], and then
//! calls [`SearchEngine::step`] until the engine reports that the search space
//! is exhausted. During each step the engine may call back into a
//! [`ResultSink`] any number of times before `step` returns.

pub mod native;
pub mod scan;

use std::fmt;
use std::num::NonZeroUsize;

use crate::coords::Coordinate;
use crate::error::EngineError;
use crate::request::SearchRequest;

pub use native::NativeEngine;
pub use scan::{ScanEngine, ScanTuning};

/// Tracing target engines use for their diagnostic output.
pub const ENGINE_LOG_TARGET: &str = "bedscan::engine";

/// Opaque, non-zero identifier of one engine-side search.
///
/// The zero value is reserved as the failure sentinel and never wrapped in a
/// handle; [`SearchEngine::init`] returns `None` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineHandle(NonZeroUsize);

impl EngineHandle {
    /// Wrap a raw handle, mapping the zero sentinel to `None`.
    #[must_use]
    pub const fn from_raw(raw: usize) -> Option<Self> {
        match NonZeroUsize::new(raw) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Receiver for coordinates discovered during a step.
///
/// `report` may fire many times before the `step` that triggered it returns.
/// Implementations must not call back into the engine.
pub trait ResultSink {
    fn report(&mut self, coordinate: Coordinate);
}

impl<F> ResultSink for F
where
    F: FnMut(Coordinate),
{
    fn report(&mut self, coordinate: Coordinate) {
        self(coordinate);
    }
}

/// A search engine driven one bounded quantum at a time.
///
/// Engines are shared by every session in a context, so all operations take
/// `&self`; per-search state lives behind the handle.
pub trait SearchEngine {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Start a search. `None` signals that the engine could not initialize it.
    fn init(&self, request: &SearchRequest) -> Option<EngineHandle>;

    /// Perform one bounded unit of work, reporting discoveries into `sink`.
    ///
    /// Returns `Ok(true)` while more work remains.
    fn step(&self, handle: EngineHandle, sink: &mut dyn ResultSink) -> Result<bool, EngineError>;

    /// Fraction of the search space covered so far, in `[0, 1]`.
    fn progress(&self, handle: EngineHandle) -> Result<f64, EngineError>;

    /// Release everything tied to `handle`. The handle is dead afterwards.
    fn deinit(&self, handle: EngineHandle);
}
