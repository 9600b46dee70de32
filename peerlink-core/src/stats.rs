//! Statistics report model and snapshot transcoding
//!
//! The engine delivers telemetry as a point-in-time report: an unordered
//! bag of self-describing records, each tagged with a category string and
//! carrying optionally-present named fields. [`StatsReport::get_objects`]
//! flattens that bag into purpose-specific snapshot structs, joining the
//! partial records that describe the same logical stream by their shared
//! track identifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One field value inside a stats record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatsValue {
    /// Boolean flag
    Bool(bool),
    /// Unsigned counter
    U64(u64),
    /// Signed integer
    I64(i64),
    /// Floating point measurement
    F64(f64),
    /// Identifier or label
    Text(String),
}

impl From<bool> for StatsValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}
impl From<u32> for StatsValue {
    fn from(v: u32) -> Self {
        Self::U64(u64::from(v))
    }
}
impl From<u64> for StatsValue {
    fn from(v: u64) -> Self {
        Self::U64(v)
    }
}
impl From<i32> for StatsValue {
    fn from(v: i32) -> Self {
        Self::I64(i64::from(v))
    }
}
impl From<i64> for StatsValue {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}
impl From<f64> for StatsValue {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}
impl From<&str> for StatsValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}
impl From<String> for StatsValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// One typed record inside a report
///
/// A field that the engine did not report is simply absent; readers must
/// not assume presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsRecord {
    id: String,
    category: String,
    timestamp_us: i64,
    fields: Vec<(String, StatsValue)>,
}

impl StatsRecord {
    /// Create an empty record
    pub fn new(category: &str, id: &str, timestamp_us: i64) -> Self {
        Self {
            id: id.to_string(),
            category: category.to_string(),
            timestamp_us,
            fields: Vec::new(),
        }
    }

    /// Builder-style field append
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<StatsValue>) -> Self {
        self.fields.push((name.to_string(), value.into()));
        self
    }

    /// The record's own identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The record's category string
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Capture timestamp in microseconds
    pub fn timestamp_us(&self) -> i64 {
        self.timestamp_us
    }

    /// Raw field lookup
    pub fn field(&self, name: &str) -> Option<&StatsValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Text field, `None` when absent or not text
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.field(name) {
            Some(StatsValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    /// Unsigned field with the documented zero default when absent
    pub fn u64_or_zero(&self, name: &str) -> u64 {
        match self.field(name) {
            Some(StatsValue::U64(value)) => *value,
            Some(StatsValue::I64(value)) => u64::try_from(*value).unwrap_or(0),
            _ => 0,
        }
    }

    /// Unsigned field narrowed to 32 bits, saturating
    pub fn u32_or_zero(&self, name: &str) -> u32 {
        u32::try_from(self.u64_or_zero(name)).unwrap_or(u32::MAX)
    }

    /// Signed field with the documented zero default when absent
    pub fn i64_or_zero(&self, name: &str) -> i64 {
        match self.field(name) {
            Some(StatsValue::I64(value)) => *value,
            Some(StatsValue::U64(value)) => i64::try_from(*value).unwrap_or(0),
            _ => 0,
        }
    }

    /// Floating point field with the documented zero default when absent
    pub fn f64_or_zero(&self, name: &str) -> f64 {
        match self.field(name) {
            Some(StatsValue::F64(value)) => *value,
            Some(StatsValue::U64(value)) => *value as f64,
            Some(StatsValue::I64(value)) => *value as f64,
            _ => 0.0,
        }
    }

    /// Boolean field with an explicit default
    pub fn bool_or(&self, name: &str, default: bool) -> bool {
        match self.field(name) {
            Some(StatsValue::Bool(value)) => *value,
            _ => default,
        }
    }

    /// Debug rendering of the record
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        object.insert("id".into(), self.id.clone().into());
        object.insert("type".into(), self.category.clone().into());
        object.insert("timestampUs".into(), self.timestamp_us.into());
        for (name, value) in &self.fields {
            let rendered = match value {
                StatsValue::Bool(v) => serde_json::Value::from(*v),
                StatsValue::U64(v) => serde_json::Value::from(*v),
                StatsValue::I64(v) => serde_json::Value::from(*v),
                StatsValue::F64(v) => serde_json::Value::from(*v),
                StatsValue::Text(v) => serde_json::Value::from(v.clone()),
            };
            object.insert(name.clone(), rendered);
        }
        serde_json::Value::Object(object)
    }
}

/// Point-in-time snapshot of one connection's telemetry records
///
/// Request-scoped: produced per query and released by the caller through
/// the matching release entry point.
#[derive(Debug, Clone)]
pub struct StatsReport {
    collected_at: DateTime<Utc>,
    records: Vec<StatsRecord>,
}

/// Statistics on one data channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataChannelStats {
    /// Capture timestamp in microseconds
    pub timestamp_us: i64,
    /// SCTP stream id of the channel
    pub data_channel_identifier: i32,
    /// Messages sent so far
    pub messages_sent: u32,
    /// Payload bytes sent so far
    pub bytes_sent: u64,
    /// Messages received so far
    pub messages_received: u32,
    /// Payload bytes received so far
    pub bytes_received: u64,
}

/// Statistics on one locally sourced audio stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioSenderStats {
    /// Capture timestamp of the RTP record, microseconds
    pub rtp_stats_timestamp_us: i64,
    /// RTP packets sent
    pub packets_sent: u32,
    /// RTP payload bytes sent
    pub bytes_sent: u64,
    /// Capture timestamp of the track record, microseconds
    pub track_stats_timestamp_us: i64,
    /// Application-visible track identifier
    pub track_identifier: String,
    /// Instantaneous audio level, 0 when unreported
    pub audio_level: f64,
    /// Accumulated audio energy
    pub total_audio_energy: f64,
    /// Accumulated duration of processed samples, seconds
    pub total_samples_duration: f64,
}

/// Statistics on one remotely sourced audio stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioReceiverStats {
    /// Capture timestamp of the RTP record, microseconds
    pub rtp_stats_timestamp_us: i64,
    /// RTP packets received
    pub packets_received: u32,
    /// RTP payload bytes received
    pub bytes_received: u64,
    /// Capture timestamp of the track record, microseconds
    pub track_stats_timestamp_us: i64,
    /// Application-visible track identifier
    pub track_identifier: String,
    /// Instantaneous audio level, 0 when unreported
    pub audio_level: f64,
    /// Accumulated audio energy
    pub total_audio_energy: f64,
    /// Samples received so far, 0 when unreported
    pub total_samples_received: u64,
    /// Accumulated duration of processed samples, seconds
    pub total_samples_duration: f64,
}

/// Statistics on one locally sourced video stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoSenderStats {
    /// Capture timestamp of the RTP record, microseconds
    pub rtp_stats_timestamp_us: i64,
    /// RTP packets sent
    pub packets_sent: u32,
    /// RTP payload bytes sent
    pub bytes_sent: u64,
    /// Frames delivered to the encoder
    pub frames_encoded: u32,
    /// Capture timestamp of the track record, microseconds
    pub track_stats_timestamp_us: i64,
    /// Application-visible track identifier
    pub track_identifier: String,
    /// Frames sent, 0 when unreported
    pub frames_sent: u32,
    /// Unusually large frames sent, 0 when unreported
    pub huge_frames_sent: u32,
}

/// Statistics on one remotely sourced video stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoReceiverStats {
    /// Capture timestamp of the RTP record, microseconds
    pub rtp_stats_timestamp_us: i64,
    /// RTP packets received
    pub packets_received: u32,
    /// RTP payload bytes received
    pub bytes_received: u64,
    /// Frames produced by the decoder
    pub frames_decoded: u32,
    /// Capture timestamp of the track record, microseconds
    pub track_stats_timestamp_us: i64,
    /// Application-visible track identifier
    pub track_identifier: String,
    /// Frames received, 0 when unreported
    pub frames_received: u32,
    /// Frames dropped, 0 when unreported
    pub frames_dropped: u32,
}

/// Statistics on the connection transport
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportStats {
    /// Capture timestamp in microseconds
    pub timestamp_us: i64,
    /// Bytes sent over the transport
    pub bytes_sent: u64,
    /// Bytes received over the transport
    pub bytes_received: u64,
}

/// One flattened snapshot delivered by [`StatsReport::get_objects`]
#[derive(Debug, Clone, PartialEq)]
pub enum StatsObject {
    /// Data channel snapshot
    DataChannel(DataChannelStats),
    /// Audio sender snapshot
    AudioSender(AudioSenderStats),
    /// Audio receiver snapshot
    AudioReceiver(AudioReceiverStats),
    /// Video sender snapshot
    VideoSender(VideoSenderStats),
    /// Video receiver snapshot
    VideoReceiver(VideoReceiverStats),
    /// Transport snapshot
    Transport(TransportStats),
}

// Ordered by first-seen identifier so delivery order is deterministic.
fn find_or_insert<'a, T: Default>(entries: &'a mut Vec<(String, T)>, id: &str) -> &'a mut T {
    if let Some(position) = entries.iter().position(|(key, _)| key == id) {
        return &mut entries[position].1;
    }
    entries.push((id.to_string(), T::default()));
    let last = entries.len() - 1;
    &mut entries[last].1
}

impl StatsReport {
    /// Build a report captured now
    pub fn new(records: Vec<StatsRecord>) -> Self {
        Self {
            collected_at: Utc::now(),
            records,
        }
    }

    /// When the report was collected
    pub fn collected_at(&self) -> DateTime<Utc> {
        self.collected_at
    }

    /// The raw records of the report
    pub fn records(&self) -> &[StatsRecord] {
        &self.records
    }

    /// Debug rendering of the full report
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.records.iter().map(StatsRecord::to_json).collect())
    }

    /// Flatten the report into snapshots of one category
    ///
    /// Joined categories merge RTP and track records sharing a track
    /// identifier; every accumulated entry is visited exactly once, in
    /// first-seen order. An unrecognized `category` visits nothing, since
    /// this is a query facility rather than a validation facility.
    pub fn get_objects<F: FnMut(StatsObject)>(&self, category: &str, mut visit: F) {
        match category {
            "DataChannelStats" => {
                for record in self.records_of("data-channel") {
                    visit(StatsObject::DataChannel(DataChannelStats {
                        timestamp_us: record.timestamp_us(),
                        data_channel_identifier: record.i64_or_zero("dataChannelIdentifier")
                            as i32,
                        messages_sent: record.u32_or_zero("messagesSent"),
                        bytes_sent: record.u64_or_zero("bytesSent"),
                        messages_received: record.u32_or_zero("messagesReceived"),
                        bytes_received: record.u64_or_zero("bytesReceived"),
                    }));
                }
            }
            "AudioSenderStats" => {
                let mut pending: Vec<(String, AudioSenderStats)> = Vec::new();
                for record in self.rtp_records("outbound-rtp", "audio") {
                    // A removed track leaves a trackless RTP stream behind
                    let Some(track_id) = record.text("trackId") else {
                        continue;
                    };
                    let entry = find_or_insert(&mut pending, track_id);
                    entry.rtp_stats_timestamp_us = record.timestamp_us();
                    entry.packets_sent = record.u32_or_zero("packetsSent");
                    entry.bytes_sent = record.u64_or_zero("bytesSent");
                }
                for record in self.track_records("audio", false) {
                    let entry = find_or_insert(&mut pending, record.id());
                    entry.track_stats_timestamp_us = record.timestamp_us();
                    entry.track_identifier =
                        record.text("trackIdentifier").unwrap_or_default().to_string();
                    entry.audio_level = record.f64_or_zero("audioLevel");
                    entry.total_audio_energy = record.f64_or_zero("totalAudioEnergy");
                    entry.total_samples_duration = record.f64_or_zero("totalSamplesDuration");
                }
                for (_, snapshot) in pending {
                    visit(StatsObject::AudioSender(snapshot));
                }
            }
            "AudioReceiverStats" => {
                let mut pending: Vec<(String, AudioReceiverStats)> = Vec::new();
                for record in self.rtp_records("inbound-rtp", "audio") {
                    let Some(track_id) = record.text("trackId") else {
                        continue;
                    };
                    let entry = find_or_insert(&mut pending, track_id);
                    entry.rtp_stats_timestamp_us = record.timestamp_us();
                    entry.packets_received = record.u32_or_zero("packetsReceived");
                    entry.bytes_received = record.u64_or_zero("bytesReceived");
                }
                for record in self.track_records("audio", true) {
                    let entry = find_or_insert(&mut pending, record.id());
                    entry.track_stats_timestamp_us = record.timestamp_us();
                    entry.track_identifier =
                        record.text("trackIdentifier").unwrap_or_default().to_string();
                    entry.audio_level = record.f64_or_zero("audioLevel");
                    entry.total_audio_energy = record.f64_or_zero("totalAudioEnergy");
                    entry.total_samples_received = record.u64_or_zero("totalSamplesReceived");
                    entry.total_samples_duration = record.f64_or_zero("totalSamplesDuration");
                }
                for (_, snapshot) in pending {
                    visit(StatsObject::AudioReceiver(snapshot));
                }
            }
            "VideoSenderStats" => {
                let mut pending: Vec<(String, VideoSenderStats)> = Vec::new();
                for record in self.rtp_records("outbound-rtp", "video") {
                    let Some(track_id) = record.text("trackId") else {
                        continue;
                    };
                    let entry = find_or_insert(&mut pending, track_id);
                    entry.rtp_stats_timestamp_us = record.timestamp_us();
                    entry.packets_sent = record.u32_or_zero("packetsSent");
                    entry.bytes_sent = record.u64_or_zero("bytesSent");
                    entry.frames_encoded = record.u32_or_zero("framesEncoded");
                }
                for record in self.track_records("video", false) {
                    let entry = find_or_insert(&mut pending, record.id());
                    entry.track_stats_timestamp_us = record.timestamp_us();
                    entry.track_identifier =
                        record.text("trackIdentifier").unwrap_or_default().to_string();
                    entry.frames_sent = record.u32_or_zero("framesSent");
                    entry.huge_frames_sent = record.u32_or_zero("hugeFramesSent");
                }
                for (_, snapshot) in pending {
                    visit(StatsObject::VideoSender(snapshot));
                }
            }
            "VideoReceiverStats" => {
                let mut pending: Vec<(String, VideoReceiverStats)> = Vec::new();
                for record in self.rtp_records("inbound-rtp", "video") {
                    let Some(track_id) = record.text("trackId") else {
                        continue;
                    };
                    let entry = find_or_insert(&mut pending, track_id);
                    entry.rtp_stats_timestamp_us = record.timestamp_us();
                    entry.packets_received = record.u32_or_zero("packetsReceived");
                    entry.bytes_received = record.u64_or_zero("bytesReceived");
                    entry.frames_decoded = record.u32_or_zero("framesDecoded");
                }
                for record in self.track_records("video", true) {
                    let entry = find_or_insert(&mut pending, record.id());
                    entry.track_stats_timestamp_us = record.timestamp_us();
                    entry.track_identifier =
                        record.text("trackIdentifier").unwrap_or_default().to_string();
                    entry.frames_received = record.u32_or_zero("framesReceived");
                    entry.frames_dropped = record.u32_or_zero("framesDropped");
                }
                for (_, snapshot) in pending {
                    visit(StatsObject::VideoReceiver(snapshot));
                }
            }
            "TransportStats" => {
                for record in self.records_of("transport") {
                    visit(StatsObject::Transport(TransportStats {
                        timestamp_us: record.timestamp_us(),
                        bytes_sent: record.u64_or_zero("bytesSent"),
                        bytes_received: record.u64_or_zero("bytesReceived"),
                    }));
                }
            }
            other => {
                tracing::debug!(category = other, "unrecognized stats category");
            }
        }
    }

    fn records_of<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a StatsRecord> {
        self.records
            .iter()
            .filter(move |record| record.category() == category)
    }

    fn rtp_records<'a>(
        &'a self,
        category: &'a str,
        kind: &'a str,
    ) -> impl Iterator<Item = &'a StatsRecord> {
        self.records_of(category)
            .filter(move |record| record.text("kind") == Some(kind))
    }

    fn track_records<'a>(
        &'a self,
        kind: &'a str,
        remote_source: bool,
    ) -> impl Iterator<Item = &'a StatsRecord> {
        self.records_of("track").filter(move |record| {
            record.text("kind") == Some(kind)
                && record.bool_or("remoteSource", false) == remote_source
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn collect(report: &StatsReport, category: &str) -> Vec<StatsObject> {
        let mut seen = Vec::new();
        report.get_objects(category, |object| seen.push(object));
        seen
    }

    #[test]
    fn video_sender_join_combines_rtp_and_track_records() {
        let report = StatsReport::new(vec![
            StatsRecord::new("outbound-rtp", "RTCOutboundRTPVideoStream_1", 1_000)
                .with("kind", "video")
                .with("trackId", "T1")
                .with("packetsSent", 250u64)
                .with("bytesSent", 40_000u64)
                .with("framesEncoded", 10u64),
            StatsRecord::new("track", "T1", 1_001)
                .with("kind", "video")
                .with("remoteSource", false)
                .with("trackIdentifier", "camera-track")
                .with("framesSent", 9u64),
        ]);

        let objects = collect(&report, "VideoSenderStats");
        assert_eq!(objects.len(), 1);
        assert_eq!(
            objects[0],
            StatsObject::VideoSender(VideoSenderStats {
                rtp_stats_timestamp_us: 1_000,
                packets_sent: 250,
                bytes_sent: 40_000,
                frames_encoded: 10,
                track_stats_timestamp_us: 1_001,
                track_identifier: "camera-track".into(),
                frames_sent: 9,
                huge_frames_sent: 0,
            })
        );
    }

    #[test]
    fn trackless_rtp_records_are_ignored() {
        // A removed track leaves an RTP stream with no track association
        let report = StatsReport::new(vec![StatsRecord::new("outbound-rtp", "orphan", 5)
            .with("kind", "video")
            .with("framesEncoded", 3u64)]);
        assert!(collect(&report, "VideoSenderStats").is_empty());
    }

    #[test]
    fn track_only_records_still_produce_a_snapshot() {
        let report = StatsReport::new(vec![StatsRecord::new("track", "T9", 7)
            .with("kind", "audio")
            .with("remoteSource", true)
            .with("trackIdentifier", "mic")
            .with("totalSamplesReceived", 480u64)]);

        let objects = collect(&report, "AudioReceiverStats");
        assert_eq!(objects.len(), 1);
        let StatsObject::AudioReceiver(snapshot) = &objects[0] else {
            panic!("wrong variant");
        };
        assert_eq!(snapshot.track_identifier, "mic");
        assert_eq!(snapshot.total_samples_received, 480);
        // RTP half never reported: zero defaults
        assert_eq!(snapshot.packets_received, 0);
        assert_eq!(snapshot.rtp_stats_timestamp_us, 0);
    }

    #[test]
    fn absent_fields_default_to_zero() {
        let report = StatsReport::new(vec![
            StatsRecord::new("inbound-rtp", "in1", 10)
                .with("kind", "audio")
                .with("trackId", "T1"),
            StatsRecord::new("track", "T1", 11)
                .with("kind", "audio")
                .with("remoteSource", true)
                .with("trackIdentifier", "speaker"),
        ]);

        let objects = collect(&report, "AudioReceiverStats");
        let StatsObject::AudioReceiver(snapshot) = &objects[0] else {
            panic!("wrong variant");
        };
        // audio_level deliberately stays 0.0 when unreported
        assert_eq!(snapshot.audio_level, 0.0);
        assert_eq!(snapshot.total_samples_received, 0);
        assert_eq!(snapshot.bytes_received, 0);
    }

    #[test]
    fn delivery_order_is_first_seen() {
        let report = StatsReport::new(vec![
            StatsRecord::new("outbound-rtp", "o1", 1)
                .with("kind", "audio")
                .with("trackId", "TA"),
            StatsRecord::new("outbound-rtp", "o2", 2)
                .with("kind", "audio")
                .with("trackId", "TB"),
            // Track records arrive in the opposite order
            StatsRecord::new("track", "TB", 3)
                .with("kind", "audio")
                .with("remoteSource", false)
                .with("trackIdentifier", "b"),
            StatsRecord::new("track", "TA", 4)
                .with("kind", "audio")
                .with("remoteSource", false)
                .with("trackIdentifier", "a"),
            // A track never seen in pass one appends at the end
            StatsRecord::new("track", "TC", 5)
                .with("kind", "audio")
                .with("remoteSource", false)
                .with("trackIdentifier", "c"),
        ]);

        let identifiers: Vec<String> = collect(&report, "AudioSenderStats")
            .into_iter()
            .map(|object| match object {
                StatsObject::AudioSender(snapshot) => snapshot.track_identifier,
                _ => panic!("wrong variant"),
            })
            .collect();
        assert_eq!(identifiers, vec!["a", "b", "c"]);
    }

    #[test]
    fn media_kinds_and_directions_do_not_mix() {
        let report = StatsReport::new(vec![
            StatsRecord::new("outbound-rtp", "o1", 1)
                .with("kind", "video")
                .with("trackId", "TV"),
            StatsRecord::new("track", "TV", 2)
                .with("kind", "video")
                // remote source: belongs to the receiver view
                .with("remoteSource", true)
                .with("framesReceived", 4u64),
        ]);

        let senders = collect(&report, "VideoSenderStats");
        assert_eq!(senders.len(), 1);
        let StatsObject::VideoSender(snapshot) = &senders[0] else {
            panic!("wrong variant");
        };
        // The remote-source track record must not merge into the sender
        assert_eq!(snapshot.track_identifier, "");

        let receivers = collect(&report, "VideoReceiverStats");
        assert_eq!(receivers.len(), 1);
    }

    #[test]
    fn data_channel_and_transport_records_map_directly() {
        let report = StatsReport::new(vec![
            StatsRecord::new("data-channel", "dc1", 50)
                .with("dataChannelIdentifier", 3i64)
                .with("messagesSent", 12u64)
                .with("bytesSent", 1_024u64)
                .with("messagesReceived", 11u64)
                .with("bytesReceived", 900u64),
            StatsRecord::new("transport", "t1", 51)
                .with("bytesSent", 5_000u64)
                .with("bytesReceived", 4_000u64),
        ]);

        assert_eq!(
            collect(&report, "DataChannelStats"),
            vec![StatsObject::DataChannel(DataChannelStats {
                timestamp_us: 50,
                data_channel_identifier: 3,
                messages_sent: 12,
                bytes_sent: 1_024,
                messages_received: 11,
                bytes_received: 900,
            })]
        );
        assert_eq!(
            collect(&report, "TransportStats"),
            vec![StatsObject::Transport(TransportStats {
                timestamp_us: 51,
                bytes_sent: 5_000,
                bytes_received: 4_000,
            })]
        );
    }

    #[test]
    fn unrecognized_category_visits_nothing() {
        let report = StatsReport::new(vec![StatsRecord::new("transport", "t1", 1)]);
        assert!(collect(&report, "CertificateStats").is_empty());
    }

    #[test]
    fn record_json_rendering_includes_fields() {
        let record = StatsRecord::new("transport", "t1", 9)
            .with("bytesSent", 10u64)
            .with("kind", "video");
        let json = record.to_json();
        assert_eq!(json["type"], "transport");
        assert_eq!(json["bytesSent"], 10);
        assert_eq!(json["kind"], "video");
    }
}
