//! Peer connections, local tracks, and data channels
//!
//! The engine's session object model is reached through the
//! [`SessionDriver`] and [`DataChannelBackend`] traits. A
//! [`PeerConnection`] owns the callback dispatch table, the local track
//! and channel lists, and delegates every engine-facing operation to its
//! driver; engine-driven events flow back through the shared
//! [`ConnectionEvents`] table.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::capture::{open_video_source, VideoSource};
use crate::dispatch::{CallbackSlot, ConnectionEvents};
use crate::error::{Error, Result};
use crate::factory::EngineContext;
use crate::stats::StatsReport;
use crate::types::{
    BitrateSettings, DataChannelInit, DataChannelState, IceCandidate, SdpMessageType,
    SessionDescription, VideoDeviceConfiguration,
};

/// Label used for the single local audio track
pub const LOCAL_AUDIO_LABEL: &str = "local_audio";

/// Fallback name for tracks added from an external source
const EXTERNAL_TRACK_LABEL: &str = "external_track";

/// Engine-side session operations
///
/// Implemented by the engine collaborator; every method may be called from
/// any thread. Events raised by the engine are delivered through the
/// [`ConnectionEvents`] table handed to the driver at construction.
#[async_trait]
pub trait SessionDriver: Send + Sync {
    /// Build an offer describing the current local session
    async fn create_offer(&self) -> Result<SessionDescription>;

    /// Build an answer to the pending remote offer
    async fn create_answer(&self) -> Result<SessionDescription>;

    /// Apply a description signaled by the remote peer
    async fn set_remote_description(&self, kind: SdpMessageType, sdp: &str) -> Result<()>;

    /// Add a candidate signaled by the remote peer
    async fn add_ice_candidate(&self, candidate: &IceCandidate) -> Result<()>;

    /// Apply connection-wide bitrate settings
    async fn set_bitrate(&self, bitrate: &BitrateSettings) -> Result<()>;

    /// Attach a local video track fed by `source`
    async fn add_video_track(&self, name: &str, source: Arc<VideoSource>) -> Result<()>;

    /// Detach a local video track by name
    async fn remove_video_track(&self, name: &str) -> Result<()>;

    /// Attach the local audio track
    async fn add_audio_track(&self, label: &str) -> Result<()>;

    /// Detach the local audio track
    async fn remove_audio_track(&self) -> Result<()>;

    /// Mute or unmute the local audio track at the engine
    async fn set_audio_enabled(&self, enabled: bool) -> Result<()>;

    /// Open a data channel; callbacks receive channel-scoped events
    async fn create_data_channel(
        &self,
        init: &DataChannelInit,
        callbacks: Arc<ChannelCallbacks>,
    ) -> Result<Arc<dyn DataChannelBackend>>;

    /// Tear down a data channel by its assigned id
    async fn remove_data_channel(&self, id: i32) -> Result<()>;

    /// Collect a point-in-time statistics report
    async fn collect_stats(&self) -> Result<StatsReport>;

    /// Tear the session down
    async fn close(&self) -> Result<()>;
}

/// Engine-side transport of one data channel
#[async_trait]
pub trait DataChannelBackend: Send + Sync {
    /// Channel id assigned at negotiation
    fn id(&self) -> i32;

    /// Current channel state
    fn state(&self) -> DataChannelState;

    /// Send one message
    async fn send(&self, data: Bytes) -> Result<()>;

    /// Close the channel transport
    async fn close(&self) -> Result<()>;
}

/// Buffering change event payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferingChanged {
    /// Buffered byte count before the change
    pub previous: u64,
    /// Buffered byte count after the change
    pub current: u64,
    /// Backpressure limit of the channel
    pub limit: u64,
}

/// State change event payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChanged {
    /// New channel state
    pub state: DataChannelState,
    /// Channel id
    pub id: i32,
}

/// Per-channel callback slots
#[derive(Default)]
pub struct ChannelCallbacks {
    /// A message arrived from the remote peer
    pub message: CallbackSlot<[u8]>,
    /// The buffered amount changed
    pub buffering: CallbackSlot<BufferingChanged>,
    /// The channel state changed
    pub state: CallbackSlot<StateChanged>,
}

/// One data channel of a connection
pub struct DataChannel {
    label: String,
    ordered: bool,
    reliable: bool,
    binding_token: usize,
    backend: Arc<dyn DataChannelBackend>,
    callbacks: Arc<ChannelCallbacks>,
}

impl DataChannel {
    pub(crate) fn new(
        init: &DataChannelInit,
        binding_token: usize,
        backend: Arc<dyn DataChannelBackend>,
        callbacks: Arc<ChannelCallbacks>,
    ) -> Arc<Self> {
        Arc::new(Self {
            label: init.label.clone(),
            ordered: init.ordered,
            reliable: init.reliable,
            binding_token,
            backend,
            callbacks,
        })
    }

    /// Channel id assigned at negotiation
    pub fn id(&self) -> i32 {
        self.backend.id()
    }

    /// Channel label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether messages are delivered in order
    pub fn ordered(&self) -> bool {
        self.ordered
    }

    /// Whether lost messages are retransmitted
    pub fn reliable(&self) -> bool {
        self.reliable
    }

    /// Opaque consumer token bound at creation
    pub fn binding_token(&self) -> usize {
        self.binding_token
    }

    /// Current channel state
    pub fn state(&self) -> DataChannelState {
        self.backend.state()
    }

    /// Channel-scoped callback slots
    pub fn callbacks(&self) -> &Arc<ChannelCallbacks> {
        &self.callbacks
    }

    /// Send one message to the remote peer
    pub async fn send(&self, data: Bytes) -> Result<()> {
        self.backend.send(data).await
    }
}

/// One peer connection exposed across the boundary
pub struct PeerConnection {
    events: Arc<ConnectionEvents>,
    driver: Arc<dyn SessionDriver>,
    context: Arc<EngineContext>,
    video_tracks: Mutex<Vec<Arc<LocalVideoTrack>>>,
    audio_track: Mutex<Option<Arc<LocalAudioTrack>>>,
    data_channels: Mutex<Vec<Arc<DataChannel>>>,
    closed: AtomicBool,
}

impl std::fmt::Debug for PeerConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerConnection").finish_non_exhaustive()
    }
}

/// A local video track feeding the connection from a video source
pub struct LocalVideoTrack {
    name: String,
    source: Arc<VideoSource>,
}

impl std::fmt::Debug for LocalVideoTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalVideoTrack")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl LocalVideoTrack {
    /// Track name, unique within its connection
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The source feeding this track
    pub fn source(&self) -> &Arc<VideoSource> {
        &self.source
    }
}

/// The connection's single local audio track
pub struct LocalAudioTrack {
    label: String,
    enabled: AtomicBool,
}

impl LocalAudioTrack {
    /// Track label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the track currently produces audio
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

impl PeerConnection {
    pub(crate) fn new(
        events: Arc<ConnectionEvents>,
        driver: Arc<dyn SessionDriver>,
        context: Arc<EngineContext>,
    ) -> Arc<Self> {
        Arc::new(Self {
            events,
            driver,
            context,
            video_tracks: Mutex::new(Vec::new()),
            audio_track: Mutex::new(None),
            data_channels: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    /// The connection's callback dispatch table
    pub fn events(&self) -> &Arc<ConnectionEvents> {
        &self.events
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::InvalidOperation("connection closed".into()));
        }
        Ok(())
    }

    /// Build an offer and deliver it through the description-ready slot
    pub async fn create_offer(&self) -> Result<()> {
        self.ensure_open()?;
        let description = self.driver.create_offer().await?;
        tracing::debug!(kind = description.kind.as_str(), "local description ready");
        self.events.local_description_ready.invoke(&description);
        Ok(())
    }

    /// Build an answer and deliver it through the description-ready slot
    pub async fn create_answer(&self) -> Result<()> {
        self.ensure_open()?;
        let description = self.driver.create_answer().await?;
        tracing::debug!(kind = description.kind.as_str(), "local description ready");
        self.events.local_description_ready.invoke(&description);
        Ok(())
    }

    /// Apply a description signaled by the remote peer
    pub async fn set_remote_description(&self, kind: SdpMessageType, sdp: &str) -> Result<()> {
        self.ensure_open()?;
        if sdp.is_empty() {
            return Err(Error::InvalidParameter("sdp"));
        }
        self.driver.set_remote_description(kind, sdp).await
    }

    /// Add a candidate signaled by the remote peer
    pub async fn add_ice_candidate(&self, candidate: &IceCandidate) -> Result<()> {
        self.ensure_open()?;
        if candidate.candidate.is_empty() {
            return Err(Error::InvalidParameter("candidate"));
        }
        self.driver.add_ice_candidate(candidate).await
    }

    /// Apply connection-wide bitrate settings
    pub async fn set_bitrate(&self, bitrate: &BitrateSettings) -> Result<()> {
        self.ensure_open()?;
        self.driver.set_bitrate(bitrate).await
    }

    /// Open a capture device matching `config` and feed a new local track
    ///
    /// Device selection and opening run on the designated engine thread;
    /// the call blocks until the device is open. The returned track is
    /// shared with the connection; the caller holds its own reference.
    pub async fn add_local_video_track(
        &self,
        track_name: &str,
        config: &VideoDeviceConfiguration,
    ) -> Result<Arc<LocalVideoTrack>> {
        self.ensure_open()?;
        if track_name.is_empty() {
            return Err(Error::InvalidParameter("track_name"));
        }
        let source = open_video_source(
            Arc::clone(&self.context.capture),
            &self.context.worker,
            config,
        )?;
        self.attach_video_track(track_name, source).await
    }

    /// Feed a new local track from an externally driven source
    ///
    /// An empty `track_name` falls back to a generic label.
    pub async fn add_local_video_track_from_source(
        &self,
        track_name: &str,
        source: Arc<VideoSource>,
    ) -> Result<Arc<LocalVideoTrack>> {
        self.ensure_open()?;
        let name = if track_name.is_empty() {
            EXTERNAL_TRACK_LABEL
        } else {
            track_name
        };
        self.attach_video_track(name, source).await
    }

    async fn attach_video_track(
        &self,
        name: &str,
        source: Arc<VideoSource>,
    ) -> Result<Arc<LocalVideoTrack>> {
        if self
            .video_tracks
            .lock()
            .iter()
            .any(|track| track.name() == name)
        {
            return Err(Error::InvalidOperation(format!(
                "track name already in use: {name}"
            )));
        }
        self.driver
            .add_video_track(name, Arc::clone(&source))
            .await?;
        let track = Arc::new(LocalVideoTrack {
            name: name.to_string(),
            source,
        });
        self.video_tracks.lock().push(Arc::clone(&track));
        tracing::debug!(track = name, "local video track added");
        Ok(track)
    }

    /// Detach one local video track
    pub async fn remove_local_video_track(&self, track: &Arc<LocalVideoTrack>) -> Result<()> {
        self.ensure_open()?;
        let found = {
            let mut tracks = self.video_tracks.lock();
            match tracks.iter().position(|t| Arc::ptr_eq(t, track)) {
                Some(position) => {
                    tracks.remove(position);
                    true
                }
                None => false,
            }
        };
        if !found {
            return Err(Error::InvalidOperation(
                "track is not attached to this connection".into(),
            ));
        }
        self.driver.remove_video_track(track.name()).await
    }

    /// Detach every local video track fed by `source`
    pub async fn remove_local_video_tracks_from_source(
        &self,
        source: &Arc<VideoSource>,
    ) -> Result<()> {
        self.ensure_open()?;
        let removed: Vec<Arc<LocalVideoTrack>> = {
            let mut tracks = self.video_tracks.lock();
            let (matching, remaining) = tracks
                .drain(..)
                .partition(|track| Arc::ptr_eq(track.source(), source));
            *tracks = remaining;
            matching
        };
        for track in removed {
            self.driver.remove_video_track(track.name()).await?;
        }
        Ok(())
    }

    /// Add the connection's single local audio track
    pub async fn add_local_audio_track(&self) -> Result<()> {
        self.ensure_open()?;
        {
            let guard = self.audio_track.lock();
            if guard.is_some() {
                return Err(Error::InvalidOperation("audio track already added".into()));
            }
        }
        self.driver.add_audio_track(LOCAL_AUDIO_LABEL).await?;
        *self.audio_track.lock() = Some(Arc::new(LocalAudioTrack {
            label: LOCAL_AUDIO_LABEL.to_string(),
            enabled: AtomicBool::new(true),
        }));
        Ok(())
    }

    /// Remove the local audio track; a no-op when none was added
    pub async fn remove_local_audio_track(&self) -> Result<()> {
        self.ensure_open()?;
        if self.audio_track.lock().take().is_some() {
            self.driver.remove_audio_track().await?;
        }
        Ok(())
    }

    /// Mute or unmute the local audio track; a no-op when none was added
    pub async fn set_local_audio_track_enabled(&self, enabled: bool) -> Result<()> {
        self.ensure_open()?;
        let track = self.audio_track.lock().clone();
        if let Some(track) = track {
            track.enabled.store(enabled, Ordering::SeqCst);
            self.driver.set_audio_enabled(enabled).await?;
        }
        Ok(())
    }

    /// Whether the local audio track currently produces audio
    ///
    /// `false` when no audio track was added.
    pub fn is_local_audio_track_enabled(&self) -> bool {
        self.audio_track
            .lock()
            .as_ref()
            .is_some_and(|track| track.is_enabled())
    }

    /// Open a new data channel
    ///
    /// `binding_token` is an opaque consumer value carried by channel
    /// lifecycle events; the engine never interprets it.
    pub async fn add_data_channel(
        &self,
        init: &DataChannelInit,
        binding_token: usize,
    ) -> Result<Arc<DataChannel>> {
        self.ensure_open()?;
        let callbacks = Arc::new(ChannelCallbacks::default());
        let backend = self
            .driver
            .create_data_channel(init, Arc::clone(&callbacks))
            .await?;
        let channel = DataChannel::new(init, binding_token, backend, callbacks);
        self.data_channels.lock().push(Arc::clone(&channel));
        tracing::debug!(label = %channel.label(), id = channel.id(), "data channel added");
        Ok(channel)
    }

    /// Tear down one data channel
    pub async fn remove_data_channel(&self, channel: &Arc<DataChannel>) -> Result<()> {
        self.ensure_open()?;
        let found = {
            let mut channels = self.data_channels.lock();
            match channels.iter().position(|c| Arc::ptr_eq(c, channel)) {
                Some(position) => {
                    channels.remove(position);
                    true
                }
                None => false,
            }
        };
        if !found {
            return Err(Error::InvalidOperation(
                "data channel is not attached to this connection".into(),
            ));
        }
        channel.backend.close().await?;
        self.driver.remove_data_channel(channel.id()).await
    }

    /// Collect a point-in-time statistics report
    pub async fn get_stats(&self) -> Result<StatsReport> {
        self.ensure_open()?;
        self.driver.collect_stats().await
    }

    /// Close the connection and clear every callback slot; idempotent
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if let Err(err) = self.driver.close().await {
            tracing::warn!(%err, "engine close reported an error");
        }
        self.video_tracks.lock().clear();
        *self.audio_track.lock() = None;
        self.data_channels.lock().clear();
        self.events.clear_all();
        tracing::debug!("peer connection closed");
        Ok(())
    }
}
