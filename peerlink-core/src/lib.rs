//! Peerlink - engine-facing core of a real-time peer-communication boundary
//!
//! This crate is the native side of a language-agnostic communication
//! boundary: peer connections, local media tracks, data channels, and
//! telemetry of an underlying real-time engine, exposed through plain
//! value types, trait seams, and per-connection callback tables. The
//! engine itself (transport negotiation, codecs, network I/O) stays
//! behind the [`connection::SessionDriver`] and [`capture::CaptureDriver`]
//! traits; the bundled loopback engine implements them deterministically
//! for tests and headless embeddings.
//!
//! # Examples
//!
//! ```rust
//! use peerlink_core::{EngineFactory, PeerConnectionConfiguration};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let factory = EngineFactory::loopback()?;
//! let connection = factory.create_peer_connection(&PeerConnectionConfiguration::default())?;
//!
//! connection
//!     .events()
//!     .local_description_ready
//!     .set(Some(Box::new(|description| {
//!         println!("signal {} to the remote peer", description.kind.as_str());
//!     })));
//!
//! connection.create_offer().await?;
//! connection.close().await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

/// Error taxonomy shared by every boundary operation
pub mod error;

/// Value types crossing the boundary
pub mod types;

/// Video and audio frame buffers
pub mod frame;

/// Designated engine execution thread
pub mod worker;

/// Capture devices, capability negotiation, and video sources
pub mod capture;

/// Per-connection callback dispatch table
pub mod dispatch;

/// Peer connections, tracks, and data channels
pub mod connection;

/// Statistics report model and snapshot transcoding
pub mod stats;

/// Session description codec filtering
pub mod sdp;

/// Engine factory and shared engine state
pub mod factory;

/// Loopback engine collaborator
#[cfg(feature = "loopback")]
pub mod loopback;

// Re-export main types at crate root
pub use capture::{
    enumerate_capabilities, enumerate_devices, open_video_source, CaptureDriver, CaptureModule,
    FrameBroadcaster, FrameSink, VideoSource,
};
pub use connection::{
    BufferingChanged, ChannelCallbacks, DataChannel, DataChannelBackend, LocalAudioTrack,
    LocalVideoTrack, PeerConnection, SessionDriver, StateChanged, LOCAL_AUDIO_LABEL,
};
pub use dispatch::{CallbackSlot, ConnectionEvents, DataChannelEvent};
pub use error::{Error, Result};
pub use factory::{EngineContext, EngineFactory, EngineFactoryBuilder};
pub use frame::{copy_plane, i420_to_argb32, Argb32Frame, AudioFrame, VideoFrame};
#[cfg(feature = "loopback")]
pub use loopback::{LoopbackCapture, LoopbackSession};
pub use sdp::{force_codecs, CodecFilter};
pub use stats::{
    AudioReceiverStats, AudioSenderStats, DataChannelStats, StatsObject, StatsRecord, StatsReport,
    StatsValue, TransportStats, VideoReceiverStats, VideoSenderStats,
};
pub use types::*;
pub use worker::EngineWorker;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::capture::{CaptureDriver, FrameSink, VideoSource};
    pub use crate::connection::{DataChannel, PeerConnection, SessionDriver};
    pub use crate::dispatch::ConnectionEvents;
    pub use crate::error::{Error, Result};
    pub use crate::factory::EngineFactory;
    pub use crate::sdp::{force_codecs, CodecFilter};
    pub use crate::stats::{StatsObject, StatsReport};
    pub use crate::types::{
        CaptureCapability, DeviceDescriptor, PeerConnectionConfiguration, SdpMessageType,
        VideoDeviceConfiguration,
    };
}
