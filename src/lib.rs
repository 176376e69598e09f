//! Incremental driver for long-running coordinate searches.
//!
//! An opaque [`SearchEngine`] enumerates a bounded region one quantum at a
//! time. A [`SessionController`] drives it cooperatively, yielding to the
//! executor between quanta, while every discovered coordinate lands in a
//! [`RankedResults`] collection that stays ordered by distance to the origin.
//! [`AppContext`] ties an engine, the shared results and a status line
//! together and lets several sessions run side by side.

pub mod app_dirs;
pub mod collector;
pub mod context;
pub mod coords;
pub mod engine;
pub mod error;
pub mod logging;
pub mod request;
pub mod session;
pub mod status;

pub use collector::{LabelList, RankedResults, ResultMirror};
pub use context::{AppContext, ContextReport, SessionResult};
pub use coords::{BlockPos, Coordinate, precedes};
pub use engine::{EngineHandle, NativeEngine, ResultSink, ScanEngine, ScanTuning, SearchEngine};
pub use error::{EngineError, LoadError, RequestError, SeedError, SessionError};
pub use request::{DEFAULT_LAYER, Floor, SearchRequest, parse_seed};
pub use session::{SessionController, SessionId, SessionState, SessionSummary};
pub use status::{SearchStatus, StatusLine, StatusSurface};
