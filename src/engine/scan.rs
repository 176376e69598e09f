//! Built-in engine that sweeps the region column by column.
//!
//! Each cell is scored with a SplitMix64 mix of the seed, floor and position;
//! cells scoring under the density threshold are reported. This keeps the
//! binary usable without a native engine and gives tests a deterministic
//! engine that honours the full contract.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ENGINE_LOG_TARGET, EngineHandle, ResultSink, SearchEngine};
use crate::coords::Coordinate;
use crate::error::EngineError;
use crate::request::SearchRequest;

pub const DEFAULT_COLUMNS_PER_STEP: usize = 64;
pub const DEFAULT_DENSITY: f64 = 1.0 / 256.0;

/// Knobs controlling how much work one step does and how often cells match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanTuning {
    /// Number of `(x, z)` columns processed per step.
    pub columns_per_step: usize,
    /// Fraction of cells reported, in `[0, 1]`.
    pub density: f64,
}

impl Default for ScanTuning {
    fn default() -> Self {
        Self {
            columns_per_step: DEFAULT_COLUMNS_PER_STEP,
            density: DEFAULT_DENSITY,
        }
    }
}

impl ScanTuning {
    /// Highest cell score that still matches, or `None` when nothing can.
    fn threshold(&self) -> Option<u64> {
        if self.density.is_nan() || self.density <= 0.0 {
            None
        } else if self.density >= 1.0 {
            Some(u64::MAX)
        } else {
            Some((self.density * u64::MAX as f64) as u64)
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Sweep {
    request: SearchRequest,
    z_span: u128,
    total_columns: u128,
    next_column: u128,
}

impl Sweep {
    fn new(request: SearchRequest) -> Option<Self> {
        let SearchRequest { min, max, .. } = request;
        if min.x() > max.x() || min.y() > max.y() || min.z() > max.z() {
            return None;
        }
        let x_span = span(min.x(), max.x());
        let z_span = span(min.z(), max.z());
        Some(Self {
            request,
            z_span,
            total_columns: x_span * z_span,
            next_column: 0,
        })
    }

    fn column(&self, index: u128) -> (i32, i32) {
        let x = i64::from(self.request.min.x()) + (index / self.z_span) as i64;
        let z = i64::from(self.request.min.z()) + (index % self.z_span) as i64;
        (x as i32, z as i32)
    }

    fn progress(&self) -> f64 {
        self.next_column as f64 / self.total_columns as f64
    }

    fn is_exhausted(&self) -> bool {
        self.next_column >= self.total_columns
    }
}

fn span(low: i32, high: i32) -> u128 {
    (i64::from(high) - i64::from(low) + 1) as u128
}

/// Deterministic column-sweeping engine.
#[derive(Debug, Default)]
pub struct ScanEngine {
    tuning: ScanTuning,
    sweeps: RefCell<HashMap<EngineHandle, Sweep>>,
    next_handle: Cell<usize>,
}

impl ScanEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::with_tuning(ScanTuning::default())
    }

    #[must_use]
    pub fn with_tuning(tuning: ScanTuning) -> Self {
        Self {
            tuning,
            sweeps: RefCell::new(HashMap::new()),
            next_handle: Cell::new(0),
        }
    }

    /// Number of searches currently holding a live handle.
    #[must_use]
    pub fn live_searches(&self) -> usize {
        self.sweeps.borrow().len()
    }

    fn allocate_handle(&self) -> Option<EngineHandle> {
        let raw = self.next_handle.get().checked_add(1)?;
        self.next_handle.set(raw);
        EngineHandle::from_raw(raw)
    }

    fn sweep(&self, handle: EngineHandle) -> Result<Sweep, EngineError> {
        self.sweeps
            .borrow()
            .get(&handle)
            .copied()
            .ok_or(EngineError::UnknownHandle(handle))
    }
}

impl SearchEngine for ScanEngine {
    fn name(&self) -> &str {
        "scan"
    }

    fn init(&self, request: &SearchRequest) -> Option<EngineHandle> {
        let Some(sweep) = Sweep::new(*request) else {
            debug!(target: ENGINE_LOG_TARGET, ?request, "rejecting inverted search region");
            return None;
        };
        let handle = self.allocate_handle()?;
        debug!(
            target: ENGINE_LOG_TARGET,
            %handle,
            columns = %sweep.total_columns,
            "scan initialized"
        );
        self.sweeps.borrow_mut().insert(handle, sweep);
        Some(handle)
    }

    fn step(&self, handle: EngineHandle, sink: &mut dyn ResultSink) -> Result<bool, EngineError> {
        let mut sweep = self.sweep(handle)?;
        let threshold = self.tuning.threshold();
        let budget = self.tuning.columns_per_step.max(1) as u128;
        let end = sweep.total_columns.min(sweep.next_column + budget);
        let SearchRequest {
            seed, floor, min, max, ..
        } = sweep.request;

        for index in sweep.next_column..end {
            let (x, z) = sweep.column(index);
            for y in min.y()..=max.y() {
                let score = cell_score(seed, floor.selector(), x, y, z);
                if threshold.is_some_and(|limit| score <= limit) {
                    sink.report(Coordinate::new(x, y, z));
                }
            }
        }
        sweep.next_column = end;

        let more = !sweep.is_exhausted();
        self.sweeps.borrow_mut().insert(handle, sweep);
        Ok(more)
    }

    fn progress(&self, handle: EngineHandle) -> Result<f64, EngineError> {
        Ok(self.sweep(handle)?.progress())
    }

    fn deinit(&self, handle: EngineHandle) {
        if self.sweeps.borrow_mut().remove(&handle).is_some() {
            debug!(target: ENGINE_LOG_TARGET, %handle, "scan released");
        }
    }
}

fn cell_score(seed: i64, floor: i32, x: i32, y: i32, z: i32) -> u64 {
    let mut state = seed as u64;
    for part in [floor, x, y, z] {
        state = splitmix64(state ^ u64::from(part as u32));
    }
    state
}

fn splitmix64(value: u64) -> u64 {
    let mut z = value.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
