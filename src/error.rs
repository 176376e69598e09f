use std::path::PathBuf;

use thiserror::Error;

use crate::engine::EngineHandle;

/// A textual seed that is not an integer literal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SeedError {
    #[error("seed '{0}' is not an integer")]
    Invalid(String),
}

/// Invalid search parameters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("search range must not be negative (got {0})")]
    NegativeRange(i32),

    #[error("unknown floor '{0}'")]
    UnknownFloor(String),
}

/// Failures raised by an engine while a session is running.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    /// The engine does not recognise the handle it was given.
    #[error("engine handle {0} is not live")]
    UnknownHandle(EngineHandle),

    /// The engine reported a progress value outside `[0, 1]`.
    #[error("engine reported progress {0} outside [0, 1]")]
    InvalidProgress(f64),

    #[error("engine step failed: {0}")]
    Step(String),

    /// The engine panicked while being driven.
    #[error("engine panicked: {0}")]
    Panicked(String),
}

/// Terminal failures of a search session.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    /// The engine returned its failure sentinel from `init`.
    #[error("error initializing search")]
    Initialization,

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Problems binding a native engine library.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to load engine library {}: {source}", .path.display())]
    Library {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("engine library {} does not export '{symbol}'", .path.display())]
    MissingSymbol { path: PathBuf, symbol: &'static str },

    #[error("engine library {} rejected host ABI version {host}", .path.display())]
    IncompatibleAbi { path: PathBuf, host: u32 },
}
