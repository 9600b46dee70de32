//! Loopback engine collaborator
//!
//! Deterministic, in-process implementations of the engine traits, with no
//! network or hardware behind them: a synthetic capture driver producing
//! generated frames, a session driver that assembles descriptions from the
//! current tracks and channels, and data channels that echo sent messages
//! back to their own message callback. Used by tests and headless
//! embeddings; real engines plug in through the same traits.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::capture::{CaptureDriver, CaptureModule, FrameSink, VideoSource};
use crate::connection::{
    BufferingChanged, ChannelCallbacks, DataChannelBackend, SessionDriver, StateChanged,
};
use crate::dispatch::ConnectionEvents;
use crate::error::{Error, Result};
use crate::frame::VideoFrame;
use crate::stats::{StatsRecord, StatsReport};
use crate::types::{
    BitrateSettings, CaptureCapability, DataChannelInit, DataChannelState, DeviceDescriptor,
    IceCandidate, IceConnectionState, PixelFormat, SdpMessageType, SessionDescription, TrackKind,
};

/// Backpressure limit reported by loopback data channels, in bytes
const CHANNEL_BUFFER_LIMIT: u64 = 16 * 1024 * 1024;

/// Nominal payload bytes accounted per synthetic video frame
const BYTES_PER_FRAME: u64 = 1200;

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

struct LoopbackDevice {
    descriptor: DeviceDescriptor,
    capabilities: Vec<CaptureCapability>,
    busy: Arc<AtomicBool>,
}

/// Synthetic capture driver with a configurable device table
///
/// Every device enforces the single-session rule: opening a device that is
/// already open fails with `InvalidOperation` instead of creating a second
/// module.
pub struct LoopbackCapture {
    devices: Vec<LoopbackDevice>,
}

impl LoopbackCapture {
    /// Driver with one default device (`loopback-0`)
    pub fn new() -> Self {
        Self::with_devices(vec![(
            DeviceDescriptor {
                id: "loopback-0".into(),
                name: "Loopback Synthetic Camera".into(),
            },
            vec![
                CaptureCapability {
                    width: 640,
                    height: 480,
                    max_framerate: 30.0,
                    pixel_format: PixelFormat::I420,
                },
                CaptureCapability {
                    width: 1280,
                    height: 720,
                    max_framerate: 30.0,
                    pixel_format: PixelFormat::I420,
                },
                CaptureCapability {
                    width: 640,
                    height: 480,
                    max_framerate: 15.0,
                    pixel_format: PixelFormat::Nv12,
                },
            ],
        )])
    }

    /// Driver with an explicit device table
    pub fn with_devices(devices: Vec<(DeviceDescriptor, Vec<CaptureCapability>)>) -> Self {
        Self {
            devices: devices
                .into_iter()
                .map(|(descriptor, capabilities)| LoopbackDevice {
                    descriptor,
                    capabilities,
                    busy: Arc::new(AtomicBool::new(false)),
                })
                .collect(),
        }
    }

    fn device(&self, device_id: &str) -> Result<&LoopbackDevice> {
        self.devices
            .iter()
            .find(|device| device.descriptor.id == device_id)
            .ok_or_else(|| Error::NotFound(format!("capture device {device_id}")))
    }
}

impl Default for LoopbackCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureDriver for LoopbackCapture {
    fn devices(&self) -> Result<Vec<DeviceDescriptor>> {
        Ok(self
            .devices
            .iter()
            .map(|device| device.descriptor.clone())
            .collect())
    }

    fn capabilities(&self, device_id: &str) -> Result<Vec<CaptureCapability>> {
        Ok(self.device(device_id)?.capabilities.clone())
    }

    fn open(
        &self,
        device_id: &str,
        capability: &CaptureCapability,
    ) -> Result<Box<dyn CaptureModule>> {
        let device = self.device(device_id)?;
        if device
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::InvalidOperation(format!(
                "capture device busy: {device_id}"
            )));
        }
        tracing::debug!(device_id, width = capability.width, "loopback capture opened");
        Ok(Box::new(LoopbackModule {
            busy: Arc::clone(&device.busy),
            stop: Arc::new(AtomicBool::new(false)),
            generator: None,
        }))
    }
}

struct LoopbackModule {
    busy: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    generator: Option<JoinHandle<()>>,
}

impl CaptureModule for LoopbackModule {
    fn start(&mut self, capability: &CaptureCapability, sink: Arc<dyn FrameSink>) -> Result<()> {
        if self.generator.is_some() {
            return Err(Error::InvalidOperation("capture already started".into()));
        }
        let width = capability.width;
        let height = capability.height;
        let fps = capability.max_framerate.max(1.0);
        let period = Duration::from_secs_f64(1.0 / fps);
        let stop = Arc::clone(&self.stop);

        let generator = thread::Builder::new()
            .name("peerlink-capture".into())
            .spawn(move || {
                let mut index: u8 = 0;
                while !stop.load(Ordering::SeqCst) {
                    // Luma ramp makes successive frames distinguishable
                    if let Ok(frame) = VideoFrame::solid(width, height, 16 + index % 220, 128, 128)
                    {
                        sink.on_frame(&frame);
                    }
                    index = index.wrapping_add(1);
                    thread::sleep(period);
                }
            })
            .map_err(Error::engine)?;
        self.generator = Some(generator);
        Ok(())
    }

    fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(generator) = self.generator.take() {
            let _ = generator.join();
        }
        self.busy.store(false, Ordering::SeqCst);
    }
}

impl Drop for LoopbackModule {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Data channels
// ---------------------------------------------------------------------------

struct LoopbackChannel {
    id: i32,
    callbacks: Arc<ChannelCallbacks>,
    state: Mutex<DataChannelState>,
    messages_sent: AtomicU64,
    bytes_sent: AtomicU64,
    messages_received: AtomicU64,
    bytes_received: AtomicU64,
}

#[async_trait]
impl DataChannelBackend for LoopbackChannel {
    fn id(&self) -> i32 {
        self.id
    }

    fn state(&self) -> DataChannelState {
        *self.state.lock()
    }

    async fn send(&self, data: Bytes) -> Result<()> {
        if self.state() != DataChannelState::Open {
            return Err(Error::InvalidOperation("data channel not open".into()));
        }
        let size = data.len() as u64;
        self.messages_sent.fetch_add(1, Ordering::SeqCst);
        self.bytes_sent.fetch_add(size, Ordering::SeqCst);
        self.callbacks.buffering.invoke(&BufferingChanged {
            previous: 0,
            current: size,
            limit: CHANNEL_BUFFER_LIMIT,
        });

        // The echo counts as received traffic on the same channel
        self.messages_received.fetch_add(1, Ordering::SeqCst);
        self.bytes_received.fetch_add(size, Ordering::SeqCst);

        // Echo delivery happens off the send path, like a real wire
        let callbacks = Arc::clone(&self.callbacks);
        tokio::spawn(async move {
            callbacks.message.invoke(&data);
            callbacks.buffering.invoke(&BufferingChanged {
                previous: size,
                current: 0,
                limit: CHANNEL_BUFFER_LIMIT,
            });
        });
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        *self.state.lock() = DataChannelState::Closed;
        self.callbacks.state.invoke(&StateChanged {
            state: DataChannelState::Closed,
            id: self.id,
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

struct FrameCounter {
    frames: AtomicU64,
}

impl FrameSink for FrameCounter {
    fn on_frame(&self, _frame: &VideoFrame) {
        self.frames.fetch_add(1, Ordering::SeqCst);
    }
}

struct VideoTrackEntry {
    name: String,
    source: Arc<VideoSource>,
    counter: Arc<FrameCounter>,
    stats_id: String,
}

struct AudioTrackEntry {
    label: String,
    stats_id: String,
}

/// Loopback session driver
///
/// Descriptions are assembled from the tracks and channels currently
/// attached; applying a remote description announces one remote track per
/// media section, and once both descriptions are present the ICE state
/// walks to connected.
pub struct LoopbackSession {
    events: Arc<ConnectionEvents>,
    next_channel_id: AtomicI32,
    channels: Mutex<Vec<Arc<LoopbackChannel>>>,
    video_tracks: Mutex<Vec<VideoTrackEntry>>,
    audio_track: Mutex<Option<AudioTrackEntry>>,
    audio_enabled: AtomicBool,
    local_description_set: AtomicBool,
    remote_description_set: AtomicBool,
    bitrate: Mutex<BitrateSettings>,
    remote_candidates: Mutex<Vec<IceCandidate>>,
    closed: AtomicBool,
}

impl LoopbackSession {
    /// Create a session firing events into `events`
    pub fn new(events: Arc<ConnectionEvents>) -> Arc<Self> {
        Arc::new(Self {
            events,
            next_channel_id: AtomicI32::new(0),
            channels: Mutex::new(Vec::new()),
            video_tracks: Mutex::new(Vec::new()),
            audio_track: Mutex::new(None),
            audio_enabled: AtomicBool::new(true),
            local_description_set: AtomicBool::new(false),
            remote_description_set: AtomicBool::new(false),
            bitrate: Mutex::new(BitrateSettings::default()),
            remote_candidates: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    /// Bitrate settings last applied to the session
    pub fn bitrate(&self) -> BitrateSettings {
        *self.bitrate.lock()
    }

    /// Candidates received from the remote peer so far
    pub fn remote_candidate_count(&self) -> usize {
        self.remote_candidates.lock().len()
    }

    /// Whether the local audio track is unmuted at the engine
    pub fn is_audio_enabled(&self) -> bool {
        self.audio_enabled.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::InvalidOperation("session closed".into()));
        }
        Ok(())
    }

    fn build_description(&self, kind: SdpMessageType) -> SessionDescription {
        let mut lines: Vec<String> = vec![
            "v=0".into(),
            "o=- 1 2 IN IP4 127.0.0.1".into(),
            "s=-".into(),
            "t=0 0".into(),
        ];
        let mut mid = 0;
        if self.audio_track.lock().is_some() {
            lines.push("m=audio 9 UDP/TLS/RTP/SAVPF 111 0 8".into());
            lines.push(format!("a=mid:{mid}"));
            lines.push("a=rtpmap:111 opus/48000/2".into());
            lines.push("a=fmtp:111 minptime=10;useinbandfec=1".into());
            lines.push("a=rtpmap:0 PCMU/8000".into());
            lines.push("a=rtpmap:8 PCMA/8000".into());
            mid += 1;
        }
        for track in self.video_tracks.lock().iter() {
            lines.push("m=video 9 UDP/TLS/RTP/SAVPF 96 98".into());
            lines.push(format!("a=mid:{mid}"));
            lines.push(format!("a=msid:- {}", track.name));
            lines.push("a=rtpmap:96 VP8/90000".into());
            lines.push("a=rtpmap:98 H264/90000".into());
            lines.push("a=fmtp:98 packetization-mode=1".into());
            mid += 1;
        }
        if !self.channels.lock().is_empty() {
            lines.push("m=application 9 UDP/DTLS/SCTP webrtc-datachannel".into());
            lines.push(format!("a=mid:{mid}"));
            lines.push("a=sctp-port:5000".into());
        }
        let mut sdp = lines.join("\r\n");
        sdp.push_str("\r\n");
        SessionDescription { kind, sdp }
    }

    fn maybe_connect(&self) {
        if self.local_description_set.load(Ordering::SeqCst)
            && self.remote_description_set.load(Ordering::SeqCst)
        {
            self.events
                .ice_state_changed
                .invoke(&IceConnectionState::Checking);
            self.events
                .ice_state_changed
                .invoke(&IceConnectionState::Connected);
            self.events.connected.invoke(&());
        }
    }

    fn timestamp_us() -> i64 {
        Utc::now().timestamp_micros()
    }
}

#[async_trait]
impl SessionDriver for LoopbackSession {
    async fn create_offer(&self) -> Result<SessionDescription> {
        self.ensure_open()?;
        let description = self.build_description(SdpMessageType::Offer);
        self.local_description_set.store(true, Ordering::SeqCst);
        self.maybe_connect();
        Ok(description)
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        self.ensure_open()?;
        if !self.remote_description_set.load(Ordering::SeqCst) {
            return Err(Error::InvalidOperation("no pending remote offer".into()));
        }
        let description = self.build_description(SdpMessageType::Answer);
        self.local_description_set.store(true, Ordering::SeqCst);
        self.maybe_connect();
        Ok(description)
    }

    async fn set_remote_description(&self, kind: SdpMessageType, sdp: &str) -> Result<()> {
        self.ensure_open()?;
        if kind == SdpMessageType::Answer && !self.local_description_set.load(Ordering::SeqCst) {
            return Err(Error::InvalidOperation("answer without local offer".into()));
        }
        self.remote_description_set.store(true, Ordering::SeqCst);
        // Each remote media section announces one remote track
        for line in sdp.lines() {
            if line.starts_with("m=audio") {
                self.events.track_added.invoke(&TrackKind::Audio);
            } else if line.starts_with("m=video") {
                self.events.track_added.invoke(&TrackKind::Video);
            }
        }
        self.maybe_connect();
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: &IceCandidate) -> Result<()> {
        self.ensure_open()?;
        self.remote_candidates.lock().push(candidate.clone());
        Ok(())
    }

    async fn set_bitrate(&self, bitrate: &BitrateSettings) -> Result<()> {
        self.ensure_open()?;
        *self.bitrate.lock() = *bitrate;
        Ok(())
    }

    async fn add_video_track(&self, name: &str, source: Arc<VideoSource>) -> Result<()> {
        self.ensure_open()?;
        let counter = Arc::new(FrameCounter {
            frames: AtomicU64::new(0),
        });
        source.add_sink(Arc::clone(&counter) as Arc<dyn FrameSink>);
        self.video_tracks.lock().push(VideoTrackEntry {
            name: name.to_string(),
            source,
            counter,
            stats_id: format!("RTCMediaStreamTrack_sender_{}", Uuid::new_v4().simple()),
        });
        self.events.renegotiation_needed.invoke(&());
        Ok(())
    }

    async fn remove_video_track(&self, name: &str) -> Result<()> {
        self.ensure_open()?;
        let entry = {
            let mut tracks = self.video_tracks.lock();
            let position = tracks.iter().position(|entry| entry.name == name);
            position.map(|position| tracks.remove(position))
        };
        let Some(entry) = entry else {
            return Err(Error::NotFound(format!("video track {name}")));
        };
        let sink: Arc<dyn FrameSink> = entry.counter;
        entry.source.remove_sink(&sink);
        self.events.renegotiation_needed.invoke(&());
        Ok(())
    }

    async fn add_audio_track(&self, label: &str) -> Result<()> {
        self.ensure_open()?;
        *self.audio_track.lock() = Some(AudioTrackEntry {
            label: label.to_string(),
            stats_id: format!("RTCMediaStreamTrack_sender_{}", Uuid::new_v4().simple()),
        });
        self.events.renegotiation_needed.invoke(&());
        Ok(())
    }

    async fn remove_audio_track(&self) -> Result<()> {
        self.ensure_open()?;
        *self.audio_track.lock() = None;
        self.events.renegotiation_needed.invoke(&());
        Ok(())
    }

    async fn set_audio_enabled(&self, enabled: bool) -> Result<()> {
        self.ensure_open()?;
        self.audio_enabled.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    async fn create_data_channel(
        &self,
        init: &DataChannelInit,
        callbacks: Arc<ChannelCallbacks>,
    ) -> Result<Arc<dyn DataChannelBackend>> {
        self.ensure_open()?;
        let id = if init.id >= 0 {
            init.id
        } else {
            self.next_channel_id.fetch_add(1, Ordering::SeqCst)
        };
        let channel = Arc::new(LoopbackChannel {
            id,
            callbacks,
            state: Mutex::new(DataChannelState::Open),
            messages_sent: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
        });
        self.channels.lock().push(Arc::clone(&channel));
        self.events.renegotiation_needed.invoke(&());
        Ok(channel)
    }

    async fn remove_data_channel(&self, id: i32) -> Result<()> {
        self.ensure_open()?;
        self.channels.lock().retain(|channel| channel.id != id);
        Ok(())
    }

    async fn collect_stats(&self) -> Result<StatsReport> {
        self.ensure_open()?;
        let now = Self::timestamp_us();
        let mut records = Vec::new();
        let mut transport_sent = 0u64;
        let mut transport_received = 0u64;

        for channel in self.channels.lock().iter() {
            let bytes_sent = channel.bytes_sent.load(Ordering::SeqCst);
            let bytes_received = channel.bytes_received.load(Ordering::SeqCst);
            transport_sent += bytes_sent;
            transport_received += bytes_received;
            records.push(
                StatsRecord::new("data-channel", &format!("RTCDataChannel_{}", channel.id), now)
                    .with("dataChannelIdentifier", channel.id)
                    .with("messagesSent", channel.messages_sent.load(Ordering::SeqCst))
                    .with("bytesSent", bytes_sent)
                    .with(
                        "messagesReceived",
                        channel.messages_received.load(Ordering::SeqCst),
                    )
                    .with("bytesReceived", bytes_received),
            );
        }

        for (index, track) in self.video_tracks.lock().iter().enumerate() {
            let frames = track.counter.frames.load(Ordering::SeqCst);
            transport_sent += frames * BYTES_PER_FRAME;
            records.push(
                StatsRecord::new(
                    "outbound-rtp",
                    &format!("RTCOutboundRTPVideoStream_{index}"),
                    now,
                )
                .with("kind", "video")
                .with("trackId", track.stats_id.as_str())
                .with("packetsSent", frames)
                .with("bytesSent", frames * BYTES_PER_FRAME)
                .with("framesEncoded", frames),
            );
            records.push(
                StatsRecord::new("track", &track.stats_id, now)
                    .with("kind", "video")
                    .with("remoteSource", false)
                    .with("trackIdentifier", track.name.as_str())
                    .with("framesSent", frames)
                    .with("hugeFramesSent", 0u64),
            );
        }

        if let Some(audio) = self.audio_track.lock().as_ref() {
            records.push(
                StatsRecord::new("outbound-rtp", "RTCOutboundRTPAudioStream_0", now)
                    .with("kind", "audio")
                    .with("trackId", audio.stats_id.as_str())
                    .with("packetsSent", 0u64)
                    .with("bytesSent", 0u64),
            );
            records.push(
                StatsRecord::new("track", &audio.stats_id, now)
                    .with("kind", "audio")
                    .with("remoteSource", false)
                    .with("trackIdentifier", audio.label.as_str())
                    .with("totalAudioEnergy", 0.0)
                    .with("totalSamplesDuration", 0.0),
            );
        }

        records.push(
            StatsRecord::new("transport", "RTCTransport_0", now)
                .with("bytesSent", transport_sent)
                .with("bytesReceived", transport_received),
        );

        let report = StatsReport::new(records);
        tracing::debug!(report = %report.to_json(), "loopback stats collected");
        Ok(report)
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        for channel in self.channels.lock().iter() {
            *channel.state.lock() = DataChannelState::Closed;
        }
        self.events
            .ice_state_changed
            .invoke(&IceConnectionState::Closed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatsObject;

    #[tokio::test]
    async fn offer_reflects_attached_tracks_and_channels() {
        let session = LoopbackSession::new(ConnectionEvents::new());
        session.add_audio_track("local_audio").await.unwrap();
        session
            .add_video_track("cam", VideoSource::external())
            .await
            .unwrap();
        session
            .create_data_channel(
                &DataChannelInit {
                    id: -1,
                    label: "chat".into(),
                    ordered: true,
                    reliable: true,
                },
                Arc::new(ChannelCallbacks::default()),
            )
            .await
            .unwrap();

        let offer = session.create_offer().await.unwrap();
        assert_eq!(offer.kind, SdpMessageType::Offer);
        assert!(offer.sdp.contains("m=audio"));
        assert!(offer.sdp.contains("m=video"));
        assert!(offer.sdp.contains("m=application"));
        assert!(offer.sdp.ends_with("\r\n"));
    }

    #[tokio::test]
    async fn answer_requires_a_remote_offer() {
        let session = LoopbackSession::new(ConnectionEvents::new());
        let err = session.create_answer().await.unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn remote_description_announces_tracks_and_connects() {
        let events = ConnectionEvents::new();
        let added = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&added);
        events.track_added.set(Some(Box::new(move |kind: &TrackKind| {
            sink.lock().push(*kind);
        })));
        let connected = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&connected);
        events.connected.set(Some(Box::new(move |()| {
            flag.store(true, Ordering::SeqCst);
        })));

        let session = LoopbackSession::new(Arc::clone(&events));
        session.create_offer().await.unwrap();
        session
            .set_remote_description(
                SdpMessageType::Answer,
                "v=0\r\nm=audio 9 UDP/TLS/RTP/SAVPF 111\r\nm=video 9 UDP/TLS/RTP/SAVPF 96\r\n",
            )
            .await
            .unwrap();

        assert_eq!(*added.lock(), vec![TrackKind::Audio, TrackKind::Video]);
        assert!(connected.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn channel_echoes_messages_back() {
        let session = LoopbackSession::new(ConnectionEvents::new());
        let callbacks = Arc::new(ChannelCallbacks::default());
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        callbacks.message.set(Some(Box::new(move |data: &[u8]| {
            sink.lock().push(data.to_vec());
        })));

        let backend = session
            .create_data_channel(
                &DataChannelInit {
                    id: 5,
                    label: "echo".into(),
                    ordered: true,
                    reliable: true,
                },
                Arc::clone(&callbacks),
            )
            .await
            .unwrap();
        assert_eq!(backend.id(), 5);
        backend.send(Bytes::from_static(b"ping")).await.unwrap();

        // Echo delivery is queued on the runtime
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(*received.lock(), vec![b"ping".to_vec()]);
    }

    #[tokio::test]
    async fn stats_report_contains_channel_and_transport_records() {
        let session = LoopbackSession::new(ConnectionEvents::new());
        let backend = session
            .create_data_channel(
                &DataChannelInit {
                    id: -1,
                    label: "d".into(),
                    ordered: true,
                    reliable: true,
                },
                Arc::new(ChannelCallbacks::default()),
            )
            .await
            .unwrap();
        backend.send(Bytes::from_static(b"12345")).await.unwrap();

        let report = session.collect_stats().await.unwrap();
        let mut channels = Vec::new();
        report.get_objects("DataChannelStats", |object| channels.push(object));
        assert_eq!(channels.len(), 1);
        let StatsObject::DataChannel(stats) = &channels[0] else {
            panic!("wrong variant");
        };
        assert_eq!(stats.messages_sent, 1);
        assert_eq!(stats.bytes_sent, 5);

        let mut transports = Vec::new();
        report.get_objects("TransportStats", |object| transports.push(object));
        assert_eq!(transports.len(), 1);
    }

    #[tokio::test]
    async fn closed_session_rejects_operations() {
        let session = LoopbackSession::new(ConnectionEvents::new());
        session.close().await.unwrap();
        let err = session.create_offer().await.unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(_)));
    }
}
