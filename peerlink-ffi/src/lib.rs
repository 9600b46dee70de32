//! C ABI boundary for the peerlink real-time communication engine
//!
//! Every entry point takes and returns only primitive types, flat
//! `#[repr(C)]` structs, and opaque handles, and reports failures through
//! the closed [`types::ResultCode`] enumeration; no panic ever crosses the
//! boundary. Handles are integer ids owned by the registry in
//! [`handle`]; asynchronous engine work runs on a process-wide tokio
//! runtime.

#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![allow(clippy::not_unsafe_ptr_arg_deref)]
#![allow(clippy::missing_safety_doc)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

pub mod types;

/// Data channel entry points
pub mod channel;
/// Capture device and format enumeration entry points
pub mod device;
/// Raw memory helpers
pub mod mem;
/// Peer connection lifecycle and callback registration entry points
pub mod peer;
/// SDP codec filtering entry point
pub mod sdp;
/// Statistics entry points
pub mod stats;

mod handle;

use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};

use once_cell::sync::{Lazy, OnceCell};
use peerlink_core::EngineFactory;

pub use types::ResultCode;

/// Global runtime for asynchronous engine operations
static RUNTIME: Lazy<Option<tokio::runtime::Runtime>> = Lazy::new(|| {
    // At least two workers so a consumer re-entering the boundary from an
    // engine callback cannot starve the runtime
    let workers = std::thread::available_parallelism().map_or(2, |n| n.get().max(2));
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .enable_all()
        .thread_name("peerlink-runtime")
        .build()
        .ok()
});

/// Global engine factory, loopback-bound unless installed explicitly
static FACTORY: OnceCell<EngineFactory> = OnceCell::new();

/// Install the engine factory used by every subsequent entry point
///
/// Must run before the first boundary call that touches the engine;
/// afterwards the factory is fixed for the process lifetime and the
/// supplied one is handed back as the error value.
pub fn install_engine_factory(factory: EngineFactory) -> Result<(), EngineFactory> {
    FACTORY.set(factory)
}

pub(crate) fn runtime() -> Result<&'static tokio::runtime::Runtime, ResultCode> {
    RUNTIME.as_ref().ok_or(ResultCode::UnknownError)
}

pub(crate) fn factory() -> Result<&'static EngineFactory, ResultCode> {
    FACTORY
        .get_or_try_init(EngineFactory::loopback)
        .map_err(|err| {
            tracing::warn!(%err, "engine factory unavailable");
            ResultCode::InvalidOperation
        })
}

/// Run an engine future to completion and hand back its output
///
/// The future is spawned onto the runtime and the calling thread parks on
/// a reply channel, so the call is safe from consumer threads and from
/// inside engine callbacks alike.
pub(crate) fn run_sync<F>(future: F) -> Result<F::Output, ResultCode>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let runtime = runtime()?;
    let (reply_tx, reply_rx) = std::sync::mpsc::channel();
    runtime.spawn(async move {
        let _ = reply_tx.send(future.await);
    });
    reply_rx.recv().map_err(|_| ResultCode::UnknownError)
}

/// Contain panics inside an entry point; a panic reports `UnknownError`
pub(crate) fn ffi_guard(body: impl FnOnce() -> ResultCode) -> ResultCode {
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(code) => code,
        Err(_) => {
            tracing::error!("panic caught at the boundary");
            ResultCode::UnknownError
        }
    }
}

/// Install the process-wide tracing subscriber
///
/// Filtering follows the standard environment filter variable; calling
/// more than once is harmless.
#[no_mangle]
pub extern "C" fn peerlink_logging_init() -> ResultCode {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
    ResultCode::Success
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_and_factory_initialize() {
        assert!(runtime().is_ok());
        assert!(factory().is_ok());
    }

    #[test]
    fn run_sync_returns_future_output() {
        let value = run_sync(async { 6 * 7 }).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn run_sync_works_from_inside_the_runtime() {
        // A consumer re-entering the boundary from a callback raised on a
        // runtime thread must not deadlock or panic
        let nested = run_sync(async { run_sync(async { 1 + 1 }) }).unwrap();
        assert_eq!(nested, Ok(2));
    }

    #[test]
    fn ffi_guard_contains_panics() {
        let code = ffi_guard(|| panic!("boom"));
        assert_eq!(code, ResultCode::UnknownError);
        let code = ffi_guard(|| ResultCode::Success);
        assert_eq!(code, ResultCode::Success);
    }

    #[test]
    fn logging_init_is_idempotent() {
        assert_eq!(peerlink_logging_init(), ResultCode::Success);
        assert_eq!(peerlink_logging_init(), ResultCode::Success);
    }
}
