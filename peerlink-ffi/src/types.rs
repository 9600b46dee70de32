//! ABI surface types: result codes, flat structs, callback signatures

use std::ffi::{c_char, c_void, CStr};

use peerlink_core::{
    DataChannelState, Error, IceConnectionState, SdpMessageType, TrackKind,
    VideoDeviceConfiguration,
};

/// Result code returned by every boundary entry point
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    /// Operation succeeded
    Success = 0,
    /// Null/empty required argument or undersized buffer
    InvalidParameter = 1,
    /// Handle null, released, or of the wrong kind
    InvalidNativeHandle = 2,
    /// Requested object does not exist
    NotFound = 3,
    /// Operation not possible in the current state
    InvalidOperation = 4,
    /// Engine-level failure with no finer classification
    UnknownError = 99,
}

impl From<&Error> for ResultCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::InvalidParameter(_) => Self::InvalidParameter,
            Error::InvalidNativeHandle => Self::InvalidNativeHandle,
            Error::NotFound(_) => Self::NotFound,
            Error::InvalidOperation(_) => Self::InvalidOperation,
            Error::Unknown(_) => Self::UnknownError,
        }
    }
}

impl ResultCode {
    /// Collapse a fallible core operation to its result code
    pub fn of<T>(result: &Result<T, Error>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(err) => Self::from(err),
        }
    }
}

/// Boolean crossing the boundary as a stable 32-bit value
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeBool {
    /// False
    False = 0,
    /// True
    True = 1,
}

impl From<bool> for NativeBool {
    fn from(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }
}

impl From<NativeBool> for bool {
    fn from(value: NativeBool) -> Self {
        value == NativeBool::True
    }
}

/// Media kind of a track event
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKindCode {
    /// Audio track
    Audio = 0,
    /// Video track
    Video = 1,
}

impl From<TrackKind> for MediaKindCode {
    fn from(kind: TrackKind) -> Self {
        match kind {
            TrackKind::Audio => Self::Audio,
            TrackKind::Video => Self::Video,
        }
    }
}

/// ICE connection state code
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceStateCode {
    /// Gathering has not started
    New = 0,
    /// Connectivity checks in progress
    Checking = 1,
    /// At least one usable candidate pair
    Connected = 2,
    /// All components connected
    Completed = 3,
    /// No usable candidate pair
    Failed = 4,
    /// Connectivity lost
    Disconnected = 5,
    /// Connection closed
    Closed = 6,
}

impl From<IceConnectionState> for IceStateCode {
    fn from(state: IceConnectionState) -> Self {
        match state {
            IceConnectionState::New => Self::New,
            IceConnectionState::Checking => Self::Checking,
            IceConnectionState::Connected => Self::Connected,
            IceConnectionState::Completed => Self::Completed,
            IceConnectionState::Failed => Self::Failed,
            IceConnectionState::Disconnected => Self::Disconnected,
            IceConnectionState::Closed => Self::Closed,
        }
    }
}

/// Data channel state code
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataChannelStateCode {
    /// Transport being established
    Connecting = 0,
    /// Messages can be sent
    Open = 1,
    /// Shutdown in progress
    Closing = 2,
    /// No longer usable
    Closed = 3,
}

impl From<DataChannelState> for DataChannelStateCode {
    fn from(state: DataChannelState) -> Self {
        match state {
            DataChannelState::Connecting => Self::Connecting,
            DataChannelState::Open => Self::Open,
            DataChannelState::Closing => Self::Closing,
            DataChannelState::Closed => Self::Closed,
        }
    }
}

/// Peer connection configuration
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PeerConnectionConfigC {
    /// Newline-separated ICE server URIs, or null
    pub ice_servers: *const c_char,
}

/// Video capture device constraints
///
/// Null/empty id and zero numeric fields mean "unconstrained".
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VideoDeviceConfigC {
    /// Unique capture device id, or null for any device
    pub video_device_id: *const c_char,
    /// Required frame width, or 0
    pub width: u32,
    /// Required frame height, or 0
    pub height: u32,
    /// Required frame rate, or 0.0
    pub framerate: f64,
}

impl VideoDeviceConfigC {
    /// Convert to the core configuration type
    ///
    /// # Safety
    ///
    /// `video_device_id` must be null or a valid null-terminated C string.
    pub unsafe fn to_core(&self) -> VideoDeviceConfiguration {
        VideoDeviceConfiguration {
            device_id: c_str_to_string(self.video_device_id).unwrap_or_default(),
            width: self.width,
            height: self.height,
            framerate: self.framerate,
        }
    }
}

/// Codec filter for one media kind
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SdpFilterC {
    /// Codec name to keep, or null/empty for no filtering
    pub codec_name: *const c_char,
    /// Extra parameters as "key=value;key2=value2", or null
    pub params: *const c_char,
}

/// Data channel configuration flag: deliver messages in order
pub const DATA_CHANNEL_FLAG_ORDERED: u32 = 0x1;
/// Data channel configuration flag: retransmit lost messages
pub const DATA_CHANNEL_FLAG_RELIABLE: u32 = 0x2;

/// Data channel configuration
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DataChannelConfigC {
    /// Negotiated channel id, or negative for engine-assigned
    pub id: i32,
    /// Channel label, or null
    pub label: *const c_char,
    /// Bitwise OR of `DATA_CHANNEL_FLAG_*`
    pub flags: u32,
}

/// Per-channel callbacks registered at creation
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DataChannelCallbacksC {
    /// Message received
    pub message_callback: Option<DataChannelMessageCallback>,
    /// Context for `message_callback`
    pub message_user_data: *mut c_void,
    /// Buffered amount changed
    pub buffering_callback: Option<DataChannelBufferingCallback>,
    /// Context for `buffering_callback`
    pub buffering_user_data: *mut c_void,
    /// Channel state changed
    pub state_callback: Option<DataChannelStateCallback>,
    /// Context for `state_callback`
    pub state_user_data: *mut c_void,
}

/// Decoded video frame in I420A layout
///
/// Plane pointers are valid only for the duration of the callback.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct I420VideoFrameView {
    /// Luma plane
    pub y_data: *const u8,
    /// Blue-difference chroma plane
    pub u_data: *const u8,
    /// Red-difference chroma plane
    pub v_data: *const u8,
    /// Alpha plane, or null
    pub a_data: *const u8,
    /// Luma row stride in bytes
    pub y_stride: i32,
    /// U plane row stride in bytes
    pub u_stride: i32,
    /// V plane row stride in bytes
    pub v_stride: i32,
    /// Alpha row stride in bytes, 0 without alpha
    pub a_stride: i32,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

/// Decoded video frame in packed ARGB32 layout
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Argb32VideoFrameView {
    /// Packed pixel data, B,G,R,A byte order
    pub data: *const u8,
    /// Row stride in bytes
    pub stride: i32,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

/// Block of audio samples
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AudioFrameView {
    /// Raw interleaved sample data
    pub data: *const u8,
    /// Bits per sample
    pub bits_per_sample: u32,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channel_count: u32,
    /// Number of sample frames
    pub frame_count: u32,
}

/// Data channel statistics snapshot
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DataChannelStatsC {
    /// Capture timestamp in microseconds
    pub timestamp_us: i64,
    /// SCTP stream id
    pub data_channel_identifier: i32,
    /// Messages sent
    pub messages_sent: u32,
    /// Payload bytes sent
    pub bytes_sent: u64,
    /// Messages received
    pub messages_received: u32,
    /// Payload bytes received
    pub bytes_received: u64,
}

/// Audio sender statistics snapshot
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AudioSenderStatsC {
    /// RTP record timestamp in microseconds
    pub rtp_stats_timestamp_us: i64,
    /// RTP packets sent
    pub packets_sent: u32,
    /// RTP payload bytes sent
    pub bytes_sent: u64,
    /// Track record timestamp in microseconds
    pub track_stats_timestamp_us: i64,
    /// Track identifier, valid for the duration of the callback
    pub track_identifier: *const c_char,
    /// Instantaneous audio level, 0 when unreported
    pub audio_level: f64,
    /// Accumulated audio energy
    pub total_audio_energy: f64,
    /// Accumulated sample duration, seconds
    pub total_samples_duration: f64,
}

/// Audio receiver statistics snapshot
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AudioReceiverStatsC {
    /// RTP record timestamp in microseconds
    pub rtp_stats_timestamp_us: i64,
    /// RTP packets received
    pub packets_received: u32,
    /// RTP payload bytes received
    pub bytes_received: u64,
    /// Track record timestamp in microseconds
    pub track_stats_timestamp_us: i64,
    /// Track identifier, valid for the duration of the callback
    pub track_identifier: *const c_char,
    /// Instantaneous audio level, 0 when unreported
    pub audio_level: f64,
    /// Accumulated audio energy
    pub total_audio_energy: f64,
    /// Samples received, 0 when unreported
    pub total_samples_received: u64,
    /// Accumulated sample duration, seconds
    pub total_samples_duration: f64,
}

/// Video sender statistics snapshot
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VideoSenderStatsC {
    /// RTP record timestamp in microseconds
    pub rtp_stats_timestamp_us: i64,
    /// RTP packets sent
    pub packets_sent: u32,
    /// RTP payload bytes sent
    pub bytes_sent: u64,
    /// Frames delivered to the encoder
    pub frames_encoded: u32,
    /// Track record timestamp in microseconds
    pub track_stats_timestamp_us: i64,
    /// Track identifier, valid for the duration of the callback
    pub track_identifier: *const c_char,
    /// Frames sent, 0 when unreported
    pub frames_sent: u32,
    /// Unusually large frames sent, 0 when unreported
    pub huge_frames_sent: u32,
}

/// Video receiver statistics snapshot
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VideoReceiverStatsC {
    /// RTP record timestamp in microseconds
    pub rtp_stats_timestamp_us: i64,
    /// RTP packets received
    pub packets_received: u32,
    /// RTP payload bytes received
    pub bytes_received: u64,
    /// Frames produced by the decoder
    pub frames_decoded: u32,
    /// Track record timestamp in microseconds
    pub track_stats_timestamp_us: i64,
    /// Track identifier, valid for the duration of the callback
    pub track_identifier: *const c_char,
    /// Frames received, 0 when unreported
    pub frames_received: u32,
    /// Frames dropped, 0 when unreported
    pub frames_dropped: u32,
}

/// Transport statistics snapshot
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct TransportStatsC {
    /// Capture timestamp in microseconds
    pub timestamp_us: i64,
    /// Bytes sent over the transport
    pub bytes_sent: u64,
    /// Bytes received over the transport
    pub bytes_received: u64,
}

/// Capture device enumeration visitor
pub type DeviceEnumCallback =
    extern "C" fn(id: *const c_char, name: *const c_char, user_data: *mut c_void);
/// Capture device enumeration completion
pub type DeviceEnumCompletedCallback = extern "C" fn(user_data: *mut c_void);
/// Capture format enumeration visitor
pub type FormatEnumCallback =
    extern "C" fn(width: u32, height: u32, framerate: f64, fourcc: u32, user_data: *mut c_void);
/// Capture format enumeration completion, carries the enumeration result
pub type FormatEnumCompletedCallback = extern "C" fn(result: ResultCode, user_data: *mut c_void);

/// Connection established
pub type ConnectedCallback = extern "C" fn(user_data: *mut c_void);
/// Local description ready; `kind` is "offer" or "answer"
pub type LocalDescriptionCallback =
    extern "C" fn(user_data: *mut c_void, kind: *const c_char, sdp: *const c_char);
/// Local ICE candidate ready
pub type IceCandidateCallback = extern "C" fn(
    user_data: *mut c_void,
    candidate: *const c_char,
    sdp_mline_index: i32,
    sdp_mid: *const c_char,
);
/// ICE connection state changed
pub type IceStateChangedCallback = extern "C" fn(user_data: *mut c_void, state: IceStateCode);
/// Renegotiation needed
pub type RenegotiationNeededCallback = extern "C" fn(user_data: *mut c_void);
/// Remote track added or removed
pub type TrackChangedCallback = extern "C" fn(user_data: *mut c_void, kind: MediaKindCode);
/// Data channel added or removed; carries the channel's binding token
pub type DataChannelChangedCallback =
    extern "C" fn(user_data: *mut c_void, binding: *mut c_void, channel: *mut c_void);
/// Decoded video frame, I420A layout
pub type I420VideoFrameCallback =
    extern "C" fn(user_data: *mut c_void, frame: *const I420VideoFrameView);
/// Decoded video frame, packed ARGB32 layout
pub type Argb32VideoFrameCallback =
    extern "C" fn(user_data: *mut c_void, frame: *const Argb32VideoFrameView);
/// Captured or received audio frame
pub type AudioFrameCallback = extern "C" fn(user_data: *mut c_void, frame: *const AudioFrameView);
/// Statistics report ready
pub type GetStatsCallback = extern "C" fn(user_data: *mut c_void, report: *mut c_void);
/// One flattened statistics snapshot; the object pointer's layout depends
/// on the requested category
pub type StatsObjectCallback = extern "C" fn(user_data: *mut c_void, object: *const c_void);
/// Data channel message received
pub type DataChannelMessageCallback =
    extern "C" fn(user_data: *mut c_void, data: *const u8, size: u64);
/// Data channel buffered amount changed
pub type DataChannelBufferingCallback =
    extern "C" fn(user_data: *mut c_void, previous: u64, current: u64, limit: u64);
/// Data channel state changed
pub type DataChannelStateCallback =
    extern "C" fn(user_data: *mut c_void, state: DataChannelStateCode, id: i32);

/// User-context pointer captured into event closures
///
/// The consumer guarantees its context outlives the registration, so the
/// wrapper is sound to move across threads.
#[derive(Clone, Copy)]
pub(crate) struct UserData(pub *mut c_void);

unsafe impl Send for UserData {}
unsafe impl Sync for UserData {}

/// Convert a C string to an owned Rust string
///
/// # Safety
///
/// `ptr` must be null or a valid null-terminated C string.
pub unsafe fn c_str_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Whether a C string is null or empty
///
/// # Safety
///
/// `ptr` must be null or a valid null-terminated C string.
pub unsafe fn c_str_is_null_or_empty(ptr: *const c_char) -> bool {
    ptr.is_null() || *ptr == 0
}

/// Parse the wire name of a session description type
///
/// # Safety
///
/// `ptr` must be null or a valid null-terminated C string.
pub unsafe fn parse_sdp_type(ptr: *const c_char) -> Option<SdpMessageType> {
    c_str_to_string(ptr).and_then(|s| SdpMessageType::from_str_opt(&s))
}
