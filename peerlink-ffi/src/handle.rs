//! Opaque handle registry
//!
//! Native objects cross the boundary as integer handles disguised as
//! pointers. The registry owns one `Arc` per live handle on behalf of the
//! caller; releasing the handle drops that reference and the underlying
//! object tears down when the last reference goes away. Resolving a
//! handle validates both liveness and dynamic kind, so a stale or
//! mistyped handle yields `InvalidNativeHandle` instead of undefined
//! access.

use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use peerlink_core::{DataChannel, LocalVideoTrack, PeerConnection, StatsReport, VideoSource};

use crate::types::ResultCode;

/// One registry entry, tagged by object kind
pub(crate) enum HandleEntry {
    Peer(Arc<PeerConnection>),
    VideoTrack(Arc<LocalVideoTrack>),
    VideoSource(Arc<VideoSource>),
    DataChannel(Arc<DataChannel>),
    StatsReport(Arc<StatsReport>),
}

/// Global handle storage
static HANDLES: Lazy<Mutex<HashMap<usize, HandleEntry>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Handle counter; 0 is never a valid handle
static HANDLE_COUNTER: AtomicUsize = AtomicUsize::new(1);

/// Register an object and hand out its handle
pub(crate) fn alloc(entry: HandleEntry) -> *mut c_void {
    let id = HANDLE_COUNTER.fetch_add(1, Ordering::SeqCst);
    HANDLES.lock().insert(id, entry);
    id as *mut c_void
}

fn with_entry<T>(
    handle: *mut c_void,
    pick: impl FnOnce(&HandleEntry) -> Option<T>,
) -> Result<T, ResultCode> {
    if handle.is_null() {
        return Err(ResultCode::InvalidNativeHandle);
    }
    let handles = HANDLES.lock();
    handles
        .get(&(handle as usize))
        .and_then(pick)
        .ok_or(ResultCode::InvalidNativeHandle)
}

/// Resolve a peer connection handle
pub(crate) fn peer(handle: *mut c_void) -> Result<Arc<PeerConnection>, ResultCode> {
    with_entry(handle, |entry| match entry {
        HandleEntry::Peer(peer) => Some(Arc::clone(peer)),
        _ => None,
    })
}

/// Resolve a local video track handle
pub(crate) fn video_track(handle: *mut c_void) -> Result<Arc<LocalVideoTrack>, ResultCode> {
    with_entry(handle, |entry| match entry {
        HandleEntry::VideoTrack(track) => Some(Arc::clone(track)),
        _ => None,
    })
}

/// Resolve a video source handle
pub(crate) fn video_source(handle: *mut c_void) -> Result<Arc<VideoSource>, ResultCode> {
    with_entry(handle, |entry| match entry {
        HandleEntry::VideoSource(source) => Some(Arc::clone(source)),
        _ => None,
    })
}

/// Resolve a data channel handle
pub(crate) fn data_channel(handle: *mut c_void) -> Result<Arc<DataChannel>, ResultCode> {
    with_entry(handle, |entry| match entry {
        HandleEntry::DataChannel(channel) => Some(Arc::clone(channel)),
        _ => None,
    })
}

/// Resolve a stats report handle
pub(crate) fn stats_report(handle: *mut c_void) -> Result<Arc<StatsReport>, ResultCode> {
    with_entry(handle, |entry| match entry {
        HandleEntry::StatsReport(report) => Some(Arc::clone(report)),
        _ => None,
    })
}

/// Kinds a handle can be released as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Peer,
    VideoTrack,
    VideoSource,
    DataChannel,
    StatsReport,
}

fn kind_of(entry: &HandleEntry) -> Kind {
    match entry {
        HandleEntry::Peer(_) => Kind::Peer,
        HandleEntry::VideoTrack(_) => Kind::VideoTrack,
        HandleEntry::VideoSource(_) => Kind::VideoSource,
        HandleEntry::DataChannel(_) => Kind::DataChannel,
        HandleEntry::StatsReport(_) => Kind::StatsReport,
    }
}

/// Drop the registry's reference for a handle of the expected kind
///
/// A mismatched kind leaves the entry in place and reports
/// `InvalidNativeHandle`; the caller's reference was not consumed.
pub(crate) fn release(handle: *mut c_void, expected: Kind) -> ResultCode {
    if handle.is_null() {
        return ResultCode::InvalidNativeHandle;
    }
    let mut handles = HANDLES.lock();
    let id = handle as usize;
    match handles.get(&id) {
        Some(entry) if kind_of(entry) == expected => {
            handles.remove(&id);
            ResultCode::Success
        }
        _ => ResultCode::InvalidNativeHandle,
    }
}

/// Find the live handle of a data channel, if one is registered
pub(crate) fn find_data_channel(channel: &Arc<DataChannel>) -> Option<*mut c_void> {
    let handles = HANDLES.lock();
    handles.iter().find_map(|(id, entry)| match entry {
        HandleEntry::DataChannel(existing) if Arc::ptr_eq(existing, channel) => {
            Some(*id as *mut c_void)
        }
        _ => None,
    })
}

#[cfg(test)]
pub(crate) fn live_count() -> usize {
    HANDLES.lock().len()
}
