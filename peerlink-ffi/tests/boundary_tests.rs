//! End-to-end boundary tests against the loopback engine
//!
//! These drive the extern "C" surface exactly as a foreign consumer
//! would: opaque handles, registered callbacks, flat structs, and result
//! codes. All tests share the process-wide handle registry and engine
//! factory, so they run serialized.

use std::ffi::{c_char, c_void, CStr, CString};
use std::sync::mpsc::{channel, Sender};
use std::time::Duration;

use peerlink_ffi::channel::{
    peerlink_data_channel_send, peerlink_peer_connection_add_data_channel,
    peerlink_peer_connection_remove_data_channel,
};
use peerlink_ffi::peer::{
    peerlink_external_video_source_create, peerlink_external_video_source_release,
    peerlink_local_video_track_release, peerlink_peer_connection_add_local_audio_track,
    peerlink_peer_connection_add_local_video_track,
    peerlink_peer_connection_add_local_video_track_from_external_source,
    peerlink_peer_connection_close, peerlink_peer_connection_create,
    peerlink_peer_connection_create_offer, peerlink_peer_connection_is_local_audio_track_enabled,
    peerlink_peer_connection_register_connected_callback,
    peerlink_peer_connection_register_local_description_ready_callback,
    peerlink_peer_connection_register_track_added_callback,
    peerlink_peer_connection_remove_local_video_track,
    peerlink_peer_connection_set_bitrate, peerlink_peer_connection_set_local_audio_track_enabled,
    peerlink_peer_connection_set_remote_description,
};
use peerlink_ffi::sdp::peerlink_sdp_force_codecs;
use peerlink_ffi::stats::{
    peerlink_peer_connection_get_simple_stats, peerlink_stats_report_get_objects,
    peerlink_stats_report_release,
};
use peerlink_ffi::types::{
    DataChannelCallbacksC, DataChannelConfigC, DataChannelStatsC, MediaKindCode, NativeBool,
    PeerConnectionConfigC, ResultCode, SdpFilterC, VideoDeviceConfigC, DATA_CHANNEL_FLAG_ORDERED,
    DATA_CHANNEL_FLAG_RELIABLE,
};
use serial_test::serial;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn create_peer() -> *mut c_void {
    let mut handle: *mut c_void = std::ptr::null_mut();
    let code = peerlink_peer_connection_create(
        PeerConnectionConfigC {
            ice_servers: std::ptr::null(),
        },
        &mut handle,
    );
    assert_eq!(code, ResultCode::Success);
    assert!(!handle.is_null());
    handle
}

fn null_filter() -> SdpFilterC {
    SdpFilterC {
        codec_name: std::ptr::null(),
        params: std::ptr::null(),
    }
}

extern "C" fn on_description(user_data: *mut c_void, kind: *const c_char, sdp: *const c_char) {
    let tx = unsafe { &*(user_data as *const Sender<(String, String)>) };
    let kind = unsafe { CStr::from_ptr(kind) }.to_string_lossy().into_owned();
    let sdp = unsafe { CStr::from_ptr(sdp) }.to_string_lossy().into_owned();
    let _ = tx.send((kind, sdp));
}

extern "C" fn on_connected(user_data: *mut c_void) {
    let tx = unsafe { &*(user_data as *const Sender<()>) };
    let _ = tx.send(());
}

extern "C" fn on_track_added(user_data: *mut c_void, kind: MediaKindCode) {
    let tx = unsafe { &*(user_data as *const Sender<MediaKindCode>) };
    let _ = tx.send(kind);
}

extern "C" fn on_message(user_data: *mut c_void, data: *const u8, size: u64) {
    let tx = unsafe { &*(user_data as *const Sender<Vec<u8>>) };
    let payload = unsafe { std::slice::from_raw_parts(data, size as usize) }.to_vec();
    let _ = tx.send(payload);
}

extern "C" fn on_stats_report(user_data: *mut c_void, report: *mut c_void) {
    let tx = unsafe { &*(user_data as *const Sender<usize>) };
    let _ = tx.send(report as usize);
}

extern "C" fn collect_data_channel_stats(user_data: *mut c_void, object: *const c_void) {
    let out = unsafe { &mut *(user_data as *mut Vec<DataChannelStatsC>) };
    out.push(unsafe { *(object as *const DataChannelStatsC) });
}

#[test]
#[serial]
fn offer_flows_through_the_description_callback() {
    let peer = create_peer();
    let (tx, rx) = channel::<(String, String)>();
    assert_eq!(
        peerlink_peer_connection_register_local_description_ready_callback(
            peer,
            Some(on_description),
            &tx as *const _ as *mut c_void,
        ),
        ResultCode::Success
    );
    assert_eq!(
        peerlink_peer_connection_add_local_audio_track(peer),
        ResultCode::Success
    );
    assert_eq!(peerlink_peer_connection_create_offer(peer), ResultCode::Success);

    let (kind, sdp) = rx.recv_timeout(RECV_TIMEOUT).unwrap();
    assert_eq!(kind, "offer");
    assert!(sdp.contains("m=audio"));

    assert_eq!(peerlink_peer_connection_close(peer), ResultCode::Success);
    // The handle is gone after close
    assert_eq!(
        peerlink_peer_connection_create_offer(peer),
        ResultCode::InvalidNativeHandle
    );
}

#[test]
#[serial]
fn remote_description_announces_tracks_and_connects() {
    let peer = create_peer();
    let (track_tx, track_rx) = channel::<MediaKindCode>();
    let (conn_tx, conn_rx) = channel::<()>();
    peerlink_peer_connection_register_track_added_callback(
        peer,
        Some(on_track_added),
        &track_tx as *const _ as *mut c_void,
    );
    peerlink_peer_connection_register_connected_callback(
        peer,
        Some(on_connected),
        &conn_tx as *const _ as *mut c_void,
    );

    assert_eq!(peerlink_peer_connection_create_offer(peer), ResultCode::Success);
    let sdp_type = CString::new("answer").unwrap();
    let sdp = CString::new("v=0\r\nm=video 9 UDP/TLS/RTP/SAVPF 96\r\n").unwrap();
    assert_eq!(
        peerlink_peer_connection_set_remote_description(peer, sdp_type.as_ptr(), sdp.as_ptr()),
        ResultCode::Success
    );

    assert_eq!(
        track_rx.recv_timeout(RECV_TIMEOUT).unwrap(),
        MediaKindCode::Video
    );
    conn_rx.recv_timeout(RECV_TIMEOUT).unwrap();
    peerlink_peer_connection_close(peer);
}

#[test]
#[serial]
fn data_channel_echo_and_stats_round_trip() {
    let peer = create_peer();
    let (msg_tx, msg_rx) = channel::<Vec<u8>>();

    let label = CString::new("chat").unwrap();
    let config = DataChannelConfigC {
        id: -1,
        label: label.as_ptr(),
        flags: DATA_CHANNEL_FLAG_ORDERED | DATA_CHANNEL_FLAG_RELIABLE,
    };
    let callbacks = DataChannelCallbacksC {
        message_callback: Some(on_message),
        message_user_data: &msg_tx as *const _ as *mut c_void,
        buffering_callback: None,
        buffering_user_data: std::ptr::null_mut(),
        state_callback: None,
        state_user_data: std::ptr::null_mut(),
    };
    let mut channel_handle: *mut c_void = std::ptr::null_mut();
    let binding = 0xBEEF_usize as *mut c_void;
    assert_eq!(
        peerlink_peer_connection_add_data_channel(
            peer,
            binding,
            config,
            callbacks,
            &mut channel_handle
        ),
        ResultCode::Success
    );
    assert!(!channel_handle.is_null());

    let payload = b"hello peer";
    assert_eq!(
        peerlink_data_channel_send(
            channel_handle,
            payload.as_ptr() as *const c_void,
            payload.len() as u64
        ),
        ResultCode::Success
    );
    assert_eq!(msg_rx.recv_timeout(RECV_TIMEOUT).unwrap(), payload.to_vec());

    // Collect a report and flatten its data-channel records
    let (report_tx, report_rx) = channel::<usize>();
    assert_eq!(
        peerlink_peer_connection_get_simple_stats(
            peer,
            Some(on_stats_report),
            &report_tx as *const _ as *mut c_void,
        ),
        ResultCode::Success
    );
    let report = report_rx.recv_timeout(RECV_TIMEOUT).unwrap() as *mut c_void;
    assert!(!report.is_null());

    let category = CString::new("DataChannelStats").unwrap();
    let mut seen: Vec<DataChannelStatsC> = Vec::new();
    assert_eq!(
        peerlink_stats_report_get_objects(
            report,
            category.as_ptr(),
            Some(collect_data_channel_stats),
            &mut seen as *mut _ as *mut c_void,
        ),
        ResultCode::Success
    );
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].messages_sent, 1);
    assert_eq!(seen[0].bytes_sent, payload.len() as u64);

    // Unrecognized categories succeed with zero invocations
    let bogus = CString::new("CertificateStats").unwrap();
    let mut none: Vec<DataChannelStatsC> = Vec::new();
    assert_eq!(
        peerlink_stats_report_get_objects(
            report,
            bogus.as_ptr(),
            Some(collect_data_channel_stats),
            &mut none as *mut _ as *mut c_void,
        ),
        ResultCode::Success
    );
    assert!(none.is_empty());

    assert_eq!(peerlink_stats_report_release(report), ResultCode::Success);
    assert_eq!(
        peerlink_stats_report_release(report),
        ResultCode::InvalidNativeHandle
    );

    assert_eq!(
        peerlink_peer_connection_remove_data_channel(peer, channel_handle),
        ResultCode::Success
    );
    peerlink_peer_connection_close(peer);
}

#[test]
#[serial]
fn capture_track_lifecycle_against_the_loopback_device() {
    let peer = create_peer();
    let name = CString::new("camera").unwrap();

    // Exact capability of the loopback device
    let config = VideoDeviceConfigC {
        video_device_id: std::ptr::null(),
        width: 640,
        height: 480,
        framerate: 30.0,
    };
    let mut track: *mut c_void = std::ptr::null_mut();
    assert_eq!(
        peerlink_peer_connection_add_local_video_track(peer, name.as_ptr(), config, &mut track),
        ResultCode::Success
    );
    assert!(!track.is_null());

    // The device is busy while the first session is live
    let second_name = CString::new("camera2").unwrap();
    let mut second: *mut c_void = std::ptr::null_mut();
    assert_eq!(
        peerlink_peer_connection_add_local_video_track(
            peer,
            second_name.as_ptr(),
            config,
            &mut second
        ),
        ResultCode::InvalidOperation
    );

    assert_eq!(
        peerlink_peer_connection_remove_local_video_track(peer, track),
        ResultCode::Success
    );
    assert_eq!(peerlink_local_video_track_release(track), ResultCode::Success);
    peerlink_peer_connection_close(peer);
}

#[test]
#[serial]
fn capture_selection_error_split() {
    let peer = create_peer();
    let name = CString::new("camera").unwrap();

    // A specific device id that does not exist: NotFound
    let ghost = CString::new("ghost-cam").unwrap();
    let config = VideoDeviceConfigC {
        video_device_id: ghost.as_ptr(),
        width: 0,
        height: 0,
        framerate: 0.0,
    };
    let mut track: *mut c_void = std::ptr::null_mut();
    assert_eq!(
        peerlink_peer_connection_add_local_video_track(peer, name.as_ptr(), config, &mut track),
        ResultCode::NotFound
    );

    // Devices exist but no capability matches: InvalidOperation
    let config = VideoDeviceConfigC {
        video_device_id: std::ptr::null(),
        width: 1024,
        height: 768,
        framerate: 30.0,
    };
    assert_eq!(
        peerlink_peer_connection_add_local_video_track(peer, name.as_ptr(), config, &mut track),
        ResultCode::InvalidOperation
    );
    peerlink_peer_connection_close(peer);
}

#[test]
#[serial]
fn external_source_feeds_tracks() {
    let peer = create_peer();
    let mut source: *mut c_void = std::ptr::null_mut();
    assert_eq!(
        peerlink_external_video_source_create(&mut source),
        ResultCode::Success
    );

    let mut track: *mut c_void = std::ptr::null_mut();
    assert_eq!(
        peerlink_peer_connection_add_local_video_track_from_external_source(
            peer,
            std::ptr::null(),
            source,
            &mut track
        ),
        ResultCode::Success
    );

    assert_eq!(
        peerlink_peer_connection_remove_local_video_track(peer, track),
        ResultCode::Success
    );
    assert_eq!(peerlink_local_video_track_release(track), ResultCode::Success);
    assert_eq!(
        peerlink_external_video_source_release(source),
        ResultCode::Success
    );
    peerlink_peer_connection_close(peer);
}

#[test]
#[serial]
fn audio_track_enable_round_trip() {
    let peer = create_peer();
    assert_eq!(
        peerlink_peer_connection_is_local_audio_track_enabled(peer),
        NativeBool::False
    );
    assert_eq!(
        peerlink_peer_connection_add_local_audio_track(peer),
        ResultCode::Success
    );
    assert_eq!(
        peerlink_peer_connection_is_local_audio_track_enabled(peer),
        NativeBool::True
    );
    assert_eq!(
        peerlink_peer_connection_set_local_audio_track_enabled(peer, NativeBool::False),
        ResultCode::Success
    );
    assert_eq!(
        peerlink_peer_connection_is_local_audio_track_enabled(peer),
        NativeBool::False
    );
    assert_eq!(
        peerlink_peer_connection_set_bitrate(peer, -1, 300_000, -1),
        ResultCode::Success
    );
    peerlink_peer_connection_close(peer);
}

#[test]
#[serial]
fn force_codecs_buffer_protocol() {
    let offer = "v=0\r\nm=audio 9 UDP/TLS/RTP/SAVPF 111 0 8\r\n\
a=rtpmap:111 opus/48000/2\r\na=rtpmap:0 PCMU/8000\r\na=rtpmap:8 PCMA/8000\r\n";
    let message = CString::new(offer).unwrap();
    let opus = CString::new("opus").unwrap();
    let audio = SdpFilterC {
        codec_name: opus.as_ptr(),
        params: std::ptr::null(),
    };

    // First call with a zero-capacity buffer reports the required size
    let mut probe = [0u8; 1];
    let mut size: u64 = 0;
    assert_eq!(
        peerlink_sdp_force_codecs(
            message.as_ptr(),
            audio,
            null_filter(),
            probe.as_mut_ptr() as *mut c_char,
            &mut size,
        ),
        ResultCode::InvalidParameter
    );
    assert!(size > 1);
    let required = size;

    // One byte short still fails and reports the same requirement
    let mut short = vec![0xFFu8; (required - 1) as usize];
    let mut short_size = required - 1;
    assert_eq!(
        peerlink_sdp_force_codecs(
            message.as_ptr(),
            audio,
            null_filter(),
            short.as_mut_ptr() as *mut c_char,
            &mut short_size,
        ),
        ResultCode::InvalidParameter
    );
    assert_eq!(short_size, required);
    // Nothing was written
    assert!(short.iter().all(|byte| *byte == 0xFF));

    // Exact capacity succeeds, NUL-terminated
    let mut buffer = vec![0u8; required as usize];
    let mut exact_size = required;
    assert_eq!(
        peerlink_sdp_force_codecs(
            message.as_ptr(),
            audio,
            null_filter(),
            buffer.as_mut_ptr() as *mut c_char,
            &mut exact_size,
        ),
        ResultCode::Success
    );
    assert_eq!(exact_size, required);
    let filtered = CStr::from_bytes_until_nul(&buffer).unwrap().to_str().unwrap();
    assert!(filtered.contains("m=audio 9 UDP/TLS/RTP/SAVPF 111\r\n"));
    assert!(!filtered.contains("PCMU"));
    assert_eq!(filtered.len() + 1, required as usize);
}

#[test]
#[serial]
fn mismatched_handles_are_invalid() {
    let mut source: *mut c_void = std::ptr::null_mut();
    peerlink_external_video_source_create(&mut source);

    // A video source handle is not a peer connection
    assert_eq!(
        peerlink_peer_connection_create_offer(source),
        ResultCode::InvalidNativeHandle
    );
    // Nor a data channel
    assert_eq!(
        peerlink_data_channel_send(source, std::ptr::null(), 0),
        ResultCode::InvalidNativeHandle
    );
    // Null is always invalid
    assert_eq!(
        peerlink_peer_connection_create_offer(std::ptr::null_mut()),
        ResultCode::InvalidNativeHandle
    );
    assert_eq!(
        peerlink_external_video_source_release(source),
        ResultCode::Success
    );
}
