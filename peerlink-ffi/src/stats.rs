//! Statistics collection and transcoding entry points

use std::ffi::{c_char, c_void, CString};
use std::sync::Arc;

use peerlink_core::StatsObject;

use crate::handle::{self, HandleEntry, Kind};
use crate::types::{
    c_str_to_string, AudioReceiverStatsC, AudioSenderStatsC, DataChannelStatsC, GetStatsCallback,
    ResultCode, StatsObjectCallback, TransportStatsC, UserData, VideoReceiverStatsC,
    VideoSenderStatsC,
};
use crate::{factory, ffi_guard, runtime};

/// Trigger an asynchronous statistics collection
///
/// The callback receives a report handle carrying one reference owned by
/// the caller, to be dropped through `peerlink_stats_report_release`.
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_get_simple_stats(
    peer_handle: *mut c_void,
    callback: Option<GetStatsCallback>,
    user_data: *mut c_void,
) -> ResultCode {
    let Some(callback) = callback else {
        return ResultCode::InvalidParameter;
    };
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    ffi_guard(|| {
        // The factory must exist before collection is queued
        if let Err(code) = factory() {
            return code;
        }
        let runtime = match runtime() {
            Ok(runtime) => runtime,
            Err(code) => return code,
        };
        let context = UserData(user_data);
        runtime.spawn(async move {
            let context = context;
            match peer.get_stats().await {
                Ok(report) => {
                    let handle = handle::alloc(HandleEntry::StatsReport(Arc::new(report)));
                    callback(context.0, handle);
                }
                Err(err) => {
                    tracing::warn!(%err, "stats collection failed");
                }
            }
        });
        ResultCode::Success
    })
}

/// Flatten a statistics report into snapshots of one category
///
/// The callback runs once per snapshot with a pointer to a
/// category-specific `*StatsC` struct valid for the duration of that
/// invocation. An unrecognized category succeeds with zero invocations.
#[no_mangle]
pub extern "C" fn peerlink_stats_report_get_objects(
    report_handle: *mut c_void,
    category: *const c_char,
    callback: Option<StatsObjectCallback>,
    user_data: *mut c_void,
) -> ResultCode {
    let report = match handle::stats_report(report_handle) {
        Ok(report) => report,
        Err(code) => return code,
    };
    let Some(category) = (unsafe { c_str_to_string(category) }) else {
        return ResultCode::InvalidParameter;
    };
    let Some(callback) = callback else {
        return ResultCode::InvalidParameter;
    };

    ffi_guard(|| {
        report.get_objects(&category, |object| match object {
            StatsObject::DataChannel(stats) => {
                let view = DataChannelStatsC {
                    timestamp_us: stats.timestamp_us,
                    data_channel_identifier: stats.data_channel_identifier,
                    messages_sent: stats.messages_sent,
                    bytes_sent: stats.bytes_sent,
                    messages_received: stats.messages_received,
                    bytes_received: stats.bytes_received,
                };
                callback(user_data, &view as *const _ as *const c_void);
            }
            StatsObject::AudioSender(stats) => {
                let track_identifier =
                    CString::new(stats.track_identifier.clone()).unwrap_or_default();
                let view = AudioSenderStatsC {
                    rtp_stats_timestamp_us: stats.rtp_stats_timestamp_us,
                    packets_sent: stats.packets_sent,
                    bytes_sent: stats.bytes_sent,
                    track_stats_timestamp_us: stats.track_stats_timestamp_us,
                    track_identifier: track_identifier.as_ptr(),
                    audio_level: stats.audio_level,
                    total_audio_energy: stats.total_audio_energy,
                    total_samples_duration: stats.total_samples_duration,
                };
                callback(user_data, &view as *const _ as *const c_void);
            }
            StatsObject::AudioReceiver(stats) => {
                let track_identifier =
                    CString::new(stats.track_identifier.clone()).unwrap_or_default();
                let view = AudioReceiverStatsC {
                    rtp_stats_timestamp_us: stats.rtp_stats_timestamp_us,
                    packets_received: stats.packets_received,
                    bytes_received: stats.bytes_received,
                    track_stats_timestamp_us: stats.track_stats_timestamp_us,
                    track_identifier: track_identifier.as_ptr(),
                    audio_level: stats.audio_level,
                    total_audio_energy: stats.total_audio_energy,
                    total_samples_received: stats.total_samples_received,
                    total_samples_duration: stats.total_samples_duration,
                };
                callback(user_data, &view as *const _ as *const c_void);
            }
            StatsObject::VideoSender(stats) => {
                let track_identifier =
                    CString::new(stats.track_identifier.clone()).unwrap_or_default();
                let view = VideoSenderStatsC {
                    rtp_stats_timestamp_us: stats.rtp_stats_timestamp_us,
                    packets_sent: stats.packets_sent,
                    bytes_sent: stats.bytes_sent,
                    frames_encoded: stats.frames_encoded,
                    track_stats_timestamp_us: stats.track_stats_timestamp_us,
                    track_identifier: track_identifier.as_ptr(),
                    frames_sent: stats.frames_sent,
                    huge_frames_sent: stats.huge_frames_sent,
                };
                callback(user_data, &view as *const _ as *const c_void);
            }
            StatsObject::VideoReceiver(stats) => {
                let track_identifier =
                    CString::new(stats.track_identifier.clone()).unwrap_or_default();
                let view = VideoReceiverStatsC {
                    rtp_stats_timestamp_us: stats.rtp_stats_timestamp_us,
                    packets_received: stats.packets_received,
                    bytes_received: stats.bytes_received,
                    frames_decoded: stats.frames_decoded,
                    track_stats_timestamp_us: stats.track_stats_timestamp_us,
                    track_identifier: track_identifier.as_ptr(),
                    frames_received: stats.frames_received,
                    frames_dropped: stats.frames_dropped,
                };
                callback(user_data, &view as *const _ as *const c_void);
            }
            StatsObject::Transport(stats) => {
                let view = TransportStatsC {
                    timestamp_us: stats.timestamp_us,
                    bytes_sent: stats.bytes_sent,
                    bytes_received: stats.bytes_received,
                };
                callback(user_data, &view as *const _ as *const c_void);
            }
        });
        ResultCode::Success
    })
}

/// Drop the caller's reference on a statistics report
#[no_mangle]
pub extern "C" fn peerlink_stats_report_release(report_handle: *mut c_void) -> ResultCode {
    handle::release(report_handle, Kind::StatsReport)
}
