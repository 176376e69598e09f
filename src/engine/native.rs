//! Engine loaded from a dynamic library over a small C ABI.
//!
//! The library exports five functions:
//!
//! ```text
//! bool   searchBindHost(const EngineHostV1 *host);
//! size_t searchInit(int64_t seed, int32_t floor,
//!                   int32_t x0, int32_t y0, int32_t z0,
//!                   int32_t x1, int32_t y1, int32_t z1);
//! bool   searchStep(size_t handle);
//! double searchProgress(size_t handle);
//! void   searchDeinit(size_t handle);
//! ```
//!
//! `searchBindHost` is called once after loading and hands the library the
//! host callbacks. `searchInit` returns `0` on failure. During `searchStep` the
//! library may call `result_callback` any number of times; those calls are
//! routed to the sink passed to [`SearchEngine::step`] through a thread-local
//! slot that is only populated for the duration of the step.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use libloading::Library;
use tracing::{debug, info, warn};

use super::{ENGINE_LOG_TARGET, EngineHandle, ResultSink, SearchEngine};
use crate::coords::Coordinate;
use crate::error::{EngineError, LoadError};
use crate::request::SearchRequest;

pub const ENGINE_ABI_VERSION: u32 = 1;

/// Host callbacks handed to the library by `searchBindHost`.
#[repr(C)]
pub struct EngineHostV1 {
    pub abi_version: u32,
    pub result_callback: extern "C" fn(x: i32, y: i32, z: i32),
    pub console_log: extern "C" fn(ptr: *const u8, len: usize),
}

type BindHostFn = unsafe extern "C" fn(host: *const EngineHostV1) -> bool;
type InitFn = unsafe extern "C" fn(
    seed: i64,
    floor: i32,
    x0: i32,
    y0: i32,
    z0: i32,
    x1: i32,
    y1: i32,
    z1: i32,
) -> usize;
type StepFn = unsafe extern "C" fn(handle: usize) -> bool;
type ProgressFn = unsafe extern "C" fn(handle: usize) -> f64;
type DeinitFn = unsafe extern "C" fn(handle: usize);

static HOST: EngineHostV1 = EngineHostV1 {
    abi_version: ENGINE_ABI_VERSION,
    result_callback: host_result_callback,
    console_log: host_console_log,
};

thread_local! {
    static ACTIVE_SINK: Cell<Option<*mut (dyn ResultSink + 'static)>> = const { Cell::new(None) };
}

/// Restores the previously active sink when a step ends, even by unwinding.
struct ActiveSink {
    previous: Option<*mut (dyn ResultSink + 'static)>,
}

impl ActiveSink {
    fn install(sink: &mut dyn ResultSink) -> Self {
        let raw: *mut (dyn ResultSink + '_) = sink;
        // SAFETY: the pointer only lives in the slot while `self` is alive, and
        // `self` never outlives the borrow of `sink` it was created from.
        let erased: *mut (dyn ResultSink + 'static) = unsafe { std::mem::transmute(raw) };
        let previous = ACTIVE_SINK.with(|slot| slot.replace(Some(erased)));
        Self { previous }
    }
}

impl Drop for ActiveSink {
    fn drop(&mut self) {
        ACTIVE_SINK.with(|slot| slot.set(self.previous));
    }
}

extern "C" fn host_result_callback(x: i32, y: i32, z: i32) {
    let coordinate = Coordinate::new(x, y, z);
    match ACTIVE_SINK.with(Cell::get) {
        // SAFETY: the slot is only populated while a step holds the sink
        // mutably, and the library calls back on the stepping thread.
        Some(sink) => unsafe { (*sink).report(coordinate) },
        None => warn!(
            target: ENGINE_LOG_TARGET,
            %coordinate,
            "engine reported a result outside of a step; dropping it"
        ),
    }
}

extern "C" fn host_console_log(ptr: *const u8, len: usize) {
    if ptr.is_null() {
        return;
    }
    // SAFETY: the library guarantees `ptr` points at `len` readable bytes for
    // the duration of this call.
    let bytes = unsafe { std::slice::from_raw_parts(ptr, len) };
    info!(target: ENGINE_LOG_TARGET, "{}", decode_log(bytes));
}

fn decode_log(bytes: &[u8]) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

/// Look up `name` and copy the function pointer out of the library.
///
/// # Safety
/// `T` must match the signature the library exports under `name`.
unsafe fn symbol<T: Copy>(
    library: &Library,
    path: &Path,
    name: &'static str,
) -> Result<T, LoadError> {
    match unsafe { library.get::<T>(name.as_bytes()) } {
        Ok(symbol) => Ok(*symbol),
        Err(_) => Err(LoadError::MissingSymbol {
            path: path.to_path_buf(),
            symbol: name,
        }),
    }
}

/// Engine backed by a dynamically loaded library.
pub struct NativeEngine {
    path: PathBuf,
    init: InitFn,
    step: StepFn,
    progress: ProgressFn,
    deinit: DeinitFn,
    live: RefCell<HashSet<EngineHandle>>,
    // Keeps the function pointers above valid.
    _library: Library,
}

impl NativeEngine {
    /// Load an engine library and bind the host callbacks.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref().to_path_buf();
        // SAFETY: loading runs the library's initialisers; engine libraries are
        // trusted code selected by the user.
        let library = unsafe { Library::new(&path) }.map_err(|source| LoadError::Library {
            path: path.clone(),
            source,
        })?;

        // SAFETY: the signatures follow the engine ABI documented above.
        let (bind, init, step, progress, deinit) = unsafe {
            (
                symbol::<BindHostFn>(&library, &path, "searchBindHost")?,
                symbol::<InitFn>(&library, &path, "searchInit")?,
                symbol::<StepFn>(&library, &path, "searchStep")?,
                symbol::<ProgressFn>(&library, &path, "searchProgress")?,
                symbol::<DeinitFn>(&library, &path, "searchDeinit")?,
            )
        };

        // SAFETY: `HOST` is a static and outlives the library.
        if !unsafe { bind(&HOST) } {
            return Err(LoadError::IncompatibleAbi {
                path,
                host: ENGINE_ABI_VERSION,
            });
        }

        debug!(path = %path.display(), "engine library loaded");
        Ok(Self {
            path,
            init,
            step,
            progress,
            deinit,
            live: RefCell::new(HashSet::new()),
            _library: library,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_live(&self, handle: EngineHandle) -> Result<(), EngineError> {
        if self.live.borrow().contains(&handle) {
            Ok(())
        } else {
            Err(EngineError::UnknownHandle(handle))
        }
    }
}

impl SearchEngine for NativeEngine {
    fn name(&self) -> &str {
        "native"
    }

    fn init(&self, request: &SearchRequest) -> Option<EngineHandle> {
        let SearchRequest {
            seed,
            floor,
            min,
            max,
        } = *request;
        // SAFETY: plain scalar arguments per the engine ABI.
        let raw = unsafe {
            (self.init)(
                seed,
                floor.selector(),
                min.x(),
                min.y(),
                min.z(),
                max.x(),
                max.y(),
                max.z(),
            )
        };
        let handle = EngineHandle::from_raw(raw)?;
        self.live.borrow_mut().insert(handle);
        Some(handle)
    }

    fn step(&self, handle: EngineHandle, sink: &mut dyn ResultSink) -> Result<bool, EngineError> {
        self.ensure_live(handle)?;
        let _active = ActiveSink::install(sink);
        // SAFETY: `handle` came from `searchInit` and has not been released.
        Ok(unsafe { (self.step)(handle.get()) })
    }

    fn progress(&self, handle: EngineHandle) -> Result<f64, EngineError> {
        self.ensure_live(handle)?;
        // SAFETY: as for `step`.
        Ok(unsafe { (self.progress)(handle.get()) })
    }

    fn deinit(&self, handle: EngineHandle) {
        if self.live.borrow_mut().remove(&handle) {
            // SAFETY: the handle is live and is removed from the set first, so
            // it is released exactly once.
            unsafe { (self.deinit)(handle.get()) };
        }
    }
}

impl Drop for NativeEngine {
    fn drop(&mut self) {
        let leaked: Vec<_> = self.live.get_mut().drain().collect();
        for handle in leaked {
            warn!(%handle, "releasing engine handle still live at unload");
            // SAFETY: the handle is live and the library is still loaded.
            unsafe { (self.deinit)(handle.get()) };
        }
    }
}

/// Whether `path` looks like a loadable engine library on this platform.
#[must_use]
pub fn is_engine_library(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("so" | "dylib" | "dll")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callbacks_reach_the_installed_sink() {
        let mut found = Vec::new();
        {
            let mut sink = |coordinate: Coordinate| found.push(coordinate);
            let _active = ActiveSink::install(&mut sink);
            host_result_callback(1, -60, 2);
            host_result_callback(-3, -60, 4);
        }
        assert_eq!(
            found,
            vec![Coordinate::new(1, -60, 2), Coordinate::new(-3, -60, 4)]
        );
        assert!(ACTIVE_SINK.with(Cell::get).is_none());
    }

    #[test]
    fn nested_sinks_restore_the_outer_one() {
        let mut outer = Vec::new();
        let mut inner = Vec::new();
        {
            let mut outer_sink = |coordinate: Coordinate| outer.push(coordinate);
            let _outer = ActiveSink::install(&mut outer_sink);
            {
                let mut inner_sink = |coordinate: Coordinate| inner.push(coordinate);
                let _inner = ActiveSink::install(&mut inner_sink);
                host_result_callback(0, 0, 1);
            }
            host_result_callback(0, 0, 2);
        }
        assert_eq!(inner, vec![Coordinate::new(0, 0, 1)]);
        assert_eq!(outer, vec![Coordinate::new(0, 0, 2)]);
    }

    #[test]
    fn stray_callbacks_are_dropped() {
        host_result_callback(5, 5, 5);
        assert!(ACTIVE_SINK.with(Cell::get).is_none());
    }

    #[test]
    fn log_text_is_decoded_lossily() {
        assert_eq!(decode_log(b"scan started"), "scan started");
        assert_eq!(decode_log(&[b'o', b'k', 0xFF]), "ok\u{FFFD}");
        host_console_log(std::ptr::null(), 4);
    }

    #[test]
    fn missing_library_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent-engine.so");
        let err = NativeEngine::load(&path).err().expect("load should fail");
        assert!(matches!(err, LoadError::Library { .. }));
        assert!(err.to_string().contains("absent-engine.so"));
    }

    #[test]
    fn recognises_library_extensions() {
        assert!(is_engine_library(Path::new("engines/bedrock.so")));
        assert!(is_engine_library(Path::new("bedrock.dll")));
        assert!(!is_engine_library(Path::new("bedrock.wasm")));
    }
}
