//! Per-connection callback dispatch table
//!
//! One typed slot per event kind. Registration is idempotent and
//! last-writer-wins; clearing a slot prevents any further invocation of
//! that event kind. Events fired while a slot is empty are dropped
//! silently. Invocation happens synchronously on whatever thread the
//! originating engine event is raised on; this layer performs no thread
//! hopping and adds no ordering of its own.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::connection::DataChannel;
use crate::frame::{i420_to_argb32, Argb32Frame, AudioFrame, VideoFrame};
use crate::types::{IceCandidate, IceConnectionState, SessionDescription, TrackKind};

/// One registration slot for an event carrying arguments of type `A`
pub struct CallbackSlot<A: ?Sized> {
    handler: Mutex<Option<Arc<dyn Fn(&A) + Send + Sync>>>,
}

impl<A: ?Sized> Default for CallbackSlot<A> {
    fn default() -> Self {
        Self {
            handler: Mutex::new(None),
        }
    }
}

impl<A: ?Sized> CallbackSlot<A> {
    /// Replace the registered handler; `None` clears the slot
    pub fn set(&self, handler: Option<Box<dyn Fn(&A) + Send + Sync>>) {
        *self.handler.lock() = handler.map(Arc::from);
    }

    /// Whether a handler is currently registered
    pub fn is_set(&self) -> bool {
        self.handler.lock().is_some()
    }

    /// Invoke the registered handler, if any
    ///
    /// The handler reference is cloned out before the call so a handler may
    /// re-register or clear its own slot without deadlocking.
    pub fn invoke(&self, args: &A) {
        let handler = self.handler.lock().clone();
        if let Some(handler) = handler {
            handler(args);
        }
    }
}

/// Data-channel lifecycle event payload
#[derive(Clone)]
pub struct DataChannelEvent {
    /// The channel the event refers to
    pub channel: Arc<DataChannel>,
}

/// The per-connection table of event callback slots
///
/// Shared between the connection object (which exposes registration) and
/// the engine driver (which fires the `notify_*` entry points).
#[derive(Default)]
pub struct ConnectionEvents {
    /// Connection established with the remote peer
    pub connected: CallbackSlot<()>,
    /// A local session description is ready to be signaled
    pub local_description_ready: CallbackSlot<SessionDescription>,
    /// A local ICE candidate is ready to be signaled
    pub ice_candidate_ready: CallbackSlot<IceCandidate>,
    /// ICE connection state changed
    pub ice_state_changed: CallbackSlot<IceConnectionState>,
    /// Session renegotiation is needed
    pub renegotiation_needed: CallbackSlot<()>,
    /// A remote track was added
    pub track_added: CallbackSlot<TrackKind>,
    /// A remote track was removed
    pub track_removed: CallbackSlot<TrackKind>,
    /// A data channel was announced by the remote peer
    pub data_channel_added: CallbackSlot<DataChannelEvent>,
    /// A data channel was torn down
    pub data_channel_removed: CallbackSlot<DataChannelEvent>,
    /// Decoded remote video frame, I420A layout
    pub i420_video_frame: CallbackSlot<VideoFrame>,
    /// Decoded remote video frame, packed ARGB32 layout
    pub argb32_video_frame: CallbackSlot<Argb32Frame>,
    /// Captured local audio frame
    pub local_audio_frame: CallbackSlot<AudioFrame>,
    /// Received remote audio frame
    pub remote_audio_frame: CallbackSlot<AudioFrame>,
}

impl ConnectionEvents {
    /// Create a table with every slot empty
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Deliver a decoded remote video frame to whichever formats are selected
    ///
    /// The ARGB32 conversion is performed only when that slot is
    /// registered; both slots may be active at once and each receives the
    /// frame independently.
    pub fn notify_video_frame(&self, frame: &VideoFrame) {
        self.i420_video_frame.invoke(frame);
        if self.argb32_video_frame.is_set() {
            let converted = i420_to_argb32(frame);
            self.argb32_video_frame.invoke(&converted);
        }
    }

    /// Clear every slot; used at connection teardown
    pub fn clear_all(&self) {
        self.connected.set(None);
        self.local_description_ready.set(None);
        self.ice_candidate_ready.set(None);
        self.ice_state_changed.set(None);
        self.renegotiation_needed.set(None);
        self.track_added.set(None);
        self.track_removed.set(None);
        self.data_channel_added.set(None);
        self.data_channel_removed.set(None);
        self.i420_video_frame.set(None);
        self.argb32_video_frame.set(None);
        self.local_audio_frame.set(None);
        self.remote_audio_frame.set(None);
    }
}
