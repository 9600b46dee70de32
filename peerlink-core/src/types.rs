//! Value types crossing the boundary

use serde::{Deserialize, Serialize};

/// One capture device known to the system
///
/// `id` is stable and unique per physical or logical device; `name` is a
/// display label with no uniqueness guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Stable unique device identifier
    pub id: String,
    /// Human-readable display label
    pub name: String,
}

/// Raw pixel layout of captured frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Planar YUV 4:2:0
    I420,
    /// Planar YUV 4:2:0, U/V swapped naming
    Iyuv,
    /// Packed 24-bit RGB
    Rgb24,
    /// Packed 32-bit ABGR
    Abgr,
    /// Packed 32-bit ARGB
    Argb,
    /// Packed 16-bit ARGB 4:4:4:4
    Argb4444,
    /// Packed 16-bit RGB 5:6:5
    Rgb565,
    /// Packed 16-bit ARGB 1:5:5:5
    Argb1555,
    /// Packed YUV 4:2:2
    Yuy2,
    /// Planar YVU 4:2:0
    Yv12,
    /// Packed YUV 4:2:2, U first
    Uyvy,
    /// Motion JPEG
    Mjpeg,
    /// Semi-planar YVU 4:2:0
    Nv21,
    /// Semi-planar YUV 4:2:0
    Nv12,
    /// Packed 32-bit BGRA
    Bgra,
    /// Format not representable at this boundary
    Unknown,
}

/// Wildcard four-character code reported for unmapped formats
pub const FOURCC_ANY: u32 = 0xFFFF_FFFF;

const fn fourcc(a: u8, b: u8, c: u8, d: u8) -> u32 {
    (a as u32) | ((b as u32) << 8) | ((c as u32) << 16) | ((d as u32) << 24)
}

impl PixelFormat {
    /// Four-character code identifying this layout across the boundary
    ///
    /// Fixed lookup table; formats without a mapping report [`FOURCC_ANY`]
    /// and are filtered out of capability enumeration.
    pub const fn to_fourcc(self) -> u32 {
        match self {
            Self::I420 => fourcc(b'I', b'4', b'2', b'0'),
            Self::Iyuv => fourcc(b'I', b'Y', b'U', b'V'),
            // 24-bit RGB maps to the byte-reversed code used by the engine
            Self::Rgb24 => fourcc(b'2', b'4', b'B', b'G'),
            Self::Abgr => fourcc(b'A', b'B', b'G', b'R'),
            Self::Argb => fourcc(b'A', b'R', b'G', b'B'),
            Self::Argb4444 => fourcc(b'R', b'4', b'4', b'4'),
            Self::Rgb565 => fourcc(b'R', b'G', b'B', b'P'),
            Self::Argb1555 => fourcc(b'R', b'G', b'B', b'O'),
            Self::Yuy2 => fourcc(b'Y', b'U', b'Y', b'2'),
            Self::Yv12 => fourcc(b'Y', b'V', b'1', b'2'),
            Self::Uyvy => fourcc(b'U', b'Y', b'V', b'Y'),
            Self::Mjpeg => fourcc(b'M', b'J', b'P', b'G'),
            Self::Nv21 => fourcc(b'N', b'V', b'2', b'1'),
            Self::Nv12 => fourcc(b'N', b'V', b'1', b'2'),
            Self::Bgra => fourcc(b'B', b'G', b'R', b'A'),
            Self::Unknown => FOURCC_ANY,
        }
    }
}

/// One mode a capture device can be opened in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureCapability {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Maximum frame rate in frames per second
    pub max_framerate: f64,
    /// Raw pixel layout produced in this mode
    pub pixel_format: PixelFormat,
}

/// Caller-supplied constraints for opening a video capture device
///
/// Empty or zero fields mean "unconstrained".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoDeviceConfiguration {
    /// Unique id of a specific device, or empty for any device
    pub device_id: String,
    /// Required frame width, or 0
    pub width: u32,
    /// Required frame height, or 0
    pub height: u32,
    /// Required frame rate, or 0.0
    pub framerate: f64,
}

impl VideoDeviceConfiguration {
    /// Whether any of width/height/framerate is constrained
    pub fn has_capability_constraint(&self) -> bool {
        self.width > 0 || self.height > 0 || self.framerate > 0.0
    }

    /// Whether `capability` satisfies every constrained field exactly
    ///
    /// Width and height compare for equality; framerates are rounded to the
    /// nearest integer before comparing.
    pub fn matches(&self, capability: &CaptureCapability) -> bool {
        if self.width > 0 && capability.width != self.width {
            return false;
        }
        if self.height > 0 && capability.height != self.height {
            return false;
        }
        if self.framerate > 0.0 {
            let wanted = (self.framerate + 0.5) as u32;
            let offered = (capability.max_framerate + 0.5) as u32;
            if offered != wanted {
                return false;
            }
        }
        true
    }
}

/// Kind of a media track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    /// Audio track
    Audio,
    /// Video track
    Video,
}

/// Type of a session description message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SdpMessageType {
    /// An offer initiating renegotiation
    Offer,
    /// An answer completing renegotiation
    Answer,
}

impl SdpMessageType {
    /// Canonical lowercase wire name ("offer" / "answer")
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Offer => "offer",
            Self::Answer => "answer",
        }
    }

    /// Parse the canonical wire name
    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value {
            "offer" => Some(Self::Offer),
            "answer" => Some(Self::Answer),
            _ => None,
        }
    }
}

/// A session description ready to be signaled to the remote peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    /// Offer or answer
    pub kind: SdpMessageType,
    /// SDP text
    pub sdp: String,
}

/// One ICE candidate ready to be signaled to the remote peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceCandidate {
    /// Candidate string
    pub candidate: String,
    /// Index of the media line this candidate belongs to
    pub sdp_mline_index: i32,
    /// Media stream identification tag
    pub sdp_mid: String,
}

/// ICE connection state as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IceConnectionState {
    /// Gathering has not started
    New,
    /// Connectivity checks in progress
    Checking,
    /// At least one usable candidate pair
    Connected,
    /// All components connected
    Completed,
    /// No usable candidate pair
    Failed,
    /// Connectivity lost
    Disconnected,
    /// Connection closed
    Closed,
}

/// Target bitrates for the connection, in bits per second
///
/// `None` fields are left at the engine default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitrateSettings {
    /// Minimum bitrate
    pub min_bps: Option<u32>,
    /// Starting bitrate
    pub start_bps: Option<u32>,
    /// Maximum bitrate
    pub max_bps: Option<u32>,
}

impl BitrateSettings {
    /// Build from raw values where a negative value means "leave unset"
    pub fn from_raw(min: i32, start: i32, max: i32) -> Self {
        let keep = |v: i32| (v >= 0).then_some(v as u32);
        Self {
            min_bps: keep(min),
            start_bps: keep(start),
            max_bps: keep(max),
        }
    }
}

/// Configuration for a new data channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataChannelInit {
    /// Negotiated channel id, or negative to let the engine pick one
    pub id: i32,
    /// Channel label
    pub label: String,
    /// Deliver messages in order
    pub ordered: bool,
    /// Retransmit lost messages
    pub reliable: bool,
}

/// State of a data channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataChannelState {
    /// Transport being established
    Connecting,
    /// Messages can be sent
    Open,
    /// Shutdown in progress
    Closing,
    /// No longer usable
    Closed,
}

/// Configuration for a new peer connection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerConnectionConfiguration {
    /// ICE server URIs, one per entry
    pub ice_servers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fourcc_codes_are_ascii_packed() {
        assert_eq!(PixelFormat::I420.to_fourcc(), u32::from_le_bytes(*b"I420"));
        assert_eq!(PixelFormat::Nv12.to_fourcc(), u32::from_le_bytes(*b"NV12"));
        assert_eq!(PixelFormat::Rgb24.to_fourcc(), u32::from_le_bytes(*b"24BG"));
        assert_eq!(PixelFormat::Unknown.to_fourcc(), FOURCC_ANY);
    }

    #[test]
    fn unconstrained_configuration_matches_everything() {
        let config = VideoDeviceConfiguration::default();
        assert!(!config.has_capability_constraint());
        assert!(config.matches(&CaptureCapability {
            width: 123,
            height: 45,
            max_framerate: 7.0,
            pixel_format: PixelFormat::Mjpeg,
        }));
    }

    #[test]
    fn framerate_matching_rounds_to_nearest_integer() {
        let config = VideoDeviceConfiguration {
            framerate: 29.97,
            ..Default::default()
        };
        let ntsc = CaptureCapability {
            width: 640,
            height: 480,
            max_framerate: 30.0,
            pixel_format: PixelFormat::I420,
        };
        // 29.97 rounds to 30
        assert!(config.matches(&ntsc));

        let slow = CaptureCapability {
            max_framerate: 15.0,
            ..ntsc
        };
        assert!(!config.matches(&slow));
    }

    #[test]
    fn constrained_fields_require_exact_equality() {
        let config = VideoDeviceConfiguration {
            width: 640,
            height: 480,
            ..Default::default()
        };
        let exact = CaptureCapability {
            width: 640,
            height: 480,
            max_framerate: 30.0,
            pixel_format: PixelFormat::I420,
        };
        assert!(config.matches(&exact));
        assert!(!config.matches(&CaptureCapability {
            width: 1280,
            ..exact
        }));
        assert!(!config.matches(&CaptureCapability {
            height: 720,
            ..exact
        }));
    }

    #[test]
    fn bitrate_negative_means_unset() {
        let settings = BitrateSettings::from_raw(-1, 300_000, -1);
        assert_eq!(settings.min_bps, None);
        assert_eq!(settings.start_bps, Some(300_000));
        assert_eq!(settings.max_bps, None);
    }

    #[test]
    fn sdp_message_type_round_trips() {
        assert_eq!(
            SdpMessageType::from_str_opt("offer"),
            Some(SdpMessageType::Offer)
        );
        assert_eq!(
            SdpMessageType::from_str_opt("answer"),
            Some(SdpMessageType::Answer)
        );
        assert_eq!(SdpMessageType::from_str_opt("pranswer"), None);
        assert_eq!(SdpMessageType::Offer.as_str(), "offer");
    }
}
