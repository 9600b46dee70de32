//! Peer connection lifecycle and callback registration entry points

use std::ffi::{c_char, c_void, CString};
use std::sync::Arc;

use peerlink_core::{
    copy_plane, Argb32Frame, AudioFrame, BitrateSettings, DataChannelEvent, IceCandidate,
    PeerConnectionConfiguration, SessionDescription, VideoFrame, VideoSource,
};

use crate::handle::{self, HandleEntry, Kind};
use crate::types::{
    c_str_is_null_or_empty, c_str_to_string, parse_sdp_type, Argb32VideoFrameCallback,
    Argb32VideoFrameView, AudioFrameCallback, AudioFrameView, ConnectedCallback,
    I420VideoFrameCallback, I420VideoFrameView, IceCandidateCallback, IceStateChangedCallback,
    IceStateCode, LocalDescriptionCallback, MediaKindCode, NativeBool, PeerConnectionConfigC,
    RenegotiationNeededCallback, ResultCode, TrackChangedCallback, UserData, VideoDeviceConfigC,
    DataChannelChangedCallback,
};
use crate::{factory, ffi_guard, run_sync};

/// Create a new peer connection
///
/// On success `*peer_handle_out` receives the connection handle; the
/// caller releases it through `peerlink_peer_connection_close`.
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_create(
    config: PeerConnectionConfigC,
    peer_handle_out: *mut *mut c_void,
) -> ResultCode {
    if peer_handle_out.is_null() {
        return ResultCode::InvalidParameter;
    }
    unsafe { *peer_handle_out = std::ptr::null_mut() };

    ffi_guard(|| {
        let ice_servers = unsafe { c_str_to_string(config.ice_servers) }
            .map(|list| {
                list.lines()
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let core_config = PeerConnectionConfiguration { ice_servers };

        let factory = match factory() {
            Ok(factory) => factory,
            Err(code) => return code,
        };
        match factory.create_peer_connection(&core_config) {
            Ok(peer) => {
                let handle = handle::alloc(HandleEntry::Peer(peer));
                unsafe { *peer_handle_out = handle };
                ResultCode::Success
            }
            Err(err) => ResultCode::from(&err),
        }
    })
}

/// Register or clear the connection-established callback
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_register_connected_callback(
    peer_handle: *mut c_void,
    callback: Option<ConnectedCallback>,
    user_data: *mut c_void,
) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    let slot = &peer.events().connected;
    match callback {
        Some(callback) => {
            let context = UserData(user_data);
            slot.set(Some(Box::new(move |()| {
                let context = context;
                callback(context.0)
            })));
        }
        None => slot.set(None),
    }
    ResultCode::Success
}

/// Register or clear the local-description-ready callback
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_register_local_description_ready_callback(
    peer_handle: *mut c_void,
    callback: Option<LocalDescriptionCallback>,
    user_data: *mut c_void,
) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    let slot = &peer.events().local_description_ready;
    match callback {
        Some(callback) => {
            let context = UserData(user_data);
            slot.set(Some(Box::new(move |description: &SessionDescription| {
                let context = context;
                let (Ok(kind), Ok(sdp)) = (
                    CString::new(description.kind.as_str()),
                    CString::new(description.sdp.clone()),
                ) else {
                    return;
                };
                callback(context.0, kind.as_ptr(), sdp.as_ptr());
            })));
        }
        None => slot.set(None),
    }
    ResultCode::Success
}

/// Register or clear the ICE-candidate-ready callback
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_register_ice_candidate_ready_callback(
    peer_handle: *mut c_void,
    callback: Option<IceCandidateCallback>,
    user_data: *mut c_void,
) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    let slot = &peer.events().ice_candidate_ready;
    match callback {
        Some(callback) => {
            let context = UserData(user_data);
            slot.set(Some(Box::new(move |candidate: &IceCandidate| {
                let context = context;
                let (Ok(text), Ok(mid)) = (
                    CString::new(candidate.candidate.clone()),
                    CString::new(candidate.sdp_mid.clone()),
                ) else {
                    return;
                };
                callback(
                    context.0,
                    text.as_ptr(),
                    candidate.sdp_mline_index,
                    mid.as_ptr(),
                );
            })));
        }
        None => slot.set(None),
    }
    ResultCode::Success
}

/// Register or clear the ICE-state-changed callback
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_register_ice_state_changed_callback(
    peer_handle: *mut c_void,
    callback: Option<IceStateChangedCallback>,
    user_data: *mut c_void,
) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    let slot = &peer.events().ice_state_changed;
    match callback {
        Some(callback) => {
            let context = UserData(user_data);
            slot.set(Some(Box::new(move |state| {
                let context = context;
                callback(context.0, IceStateCode::from(*state));
            })));
        }
        None => slot.set(None),
    }
    ResultCode::Success
}

/// Register or clear the renegotiation-needed callback
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_register_renegotiation_needed_callback(
    peer_handle: *mut c_void,
    callback: Option<RenegotiationNeededCallback>,
    user_data: *mut c_void,
) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    let slot = &peer.events().renegotiation_needed;
    match callback {
        Some(callback) => {
            let context = UserData(user_data);
            slot.set(Some(Box::new(move |()| {
                let context = context;
                callback(context.0)
            })));
        }
        None => slot.set(None),
    }
    ResultCode::Success
}

/// Register or clear the remote-track-added callback
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_register_track_added_callback(
    peer_handle: *mut c_void,
    callback: Option<TrackChangedCallback>,
    user_data: *mut c_void,
) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    let slot = &peer.events().track_added;
    match callback {
        Some(callback) => {
            let context = UserData(user_data);
            slot.set(Some(Box::new(move |kind| {
                let context = context;
                callback(context.0, MediaKindCode::from(*kind));
            })));
        }
        None => slot.set(None),
    }
    ResultCode::Success
}

/// Register or clear the remote-track-removed callback
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_register_track_removed_callback(
    peer_handle: *mut c_void,
    callback: Option<TrackChangedCallback>,
    user_data: *mut c_void,
) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    let slot = &peer.events().track_removed;
    match callback {
        Some(callback) => {
            let context = UserData(user_data);
            slot.set(Some(Box::new(move |kind| {
                let context = context;
                callback(context.0, MediaKindCode::from(*kind));
            })));
        }
        None => slot.set(None),
    }
    ResultCode::Success
}

/// Register or clear the data-channel-added callback
///
/// The callback receives the channel's binding token and a fresh channel
/// handle owned by the consumer.
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_register_data_channel_added_callback(
    peer_handle: *mut c_void,
    callback: Option<DataChannelChangedCallback>,
    user_data: *mut c_void,
) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    let slot = &peer.events().data_channel_added;
    match callback {
        Some(callback) => {
            let context = UserData(user_data);
            slot.set(Some(Box::new(move |event: &DataChannelEvent| {
                let context = context;
                let channel_handle =
                    handle::alloc(HandleEntry::DataChannel(Arc::clone(&event.channel)));
                callback(
                    context.0,
                    event.channel.binding_token() as *mut c_void,
                    channel_handle,
                );
            })));
        }
        None => slot.set(None),
    }
    ResultCode::Success
}

/// Register or clear the data-channel-removed callback
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_register_data_channel_removed_callback(
    peer_handle: *mut c_void,
    callback: Option<DataChannelChangedCallback>,
    user_data: *mut c_void,
) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    let slot = &peer.events().data_channel_removed;
    match callback {
        Some(callback) => {
            let context = UserData(user_data);
            slot.set(Some(Box::new(move |event: &DataChannelEvent| {
                let context = context;
                let channel_handle =
                    handle::find_data_channel(&event.channel).unwrap_or(std::ptr::null_mut());
                callback(
                    context.0,
                    event.channel.binding_token() as *mut c_void,
                    channel_handle,
                );
            })));
        }
        None => slot.set(None),
    }
    ResultCode::Success
}

/// Register or clear the I420A remote video frame callback
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_register_i420_video_frame_callback(
    peer_handle: *mut c_void,
    callback: Option<I420VideoFrameCallback>,
    user_data: *mut c_void,
) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    let slot = &peer.events().i420_video_frame;
    match callback {
        Some(callback) => {
            let context = UserData(user_data);
            slot.set(Some(Box::new(move |frame: &VideoFrame| {
                let context = context;
                let view = I420VideoFrameView {
                    y_data: frame.y.as_ptr(),
                    u_data: frame.u.as_ptr(),
                    v_data: frame.v.as_ptr(),
                    a_data: frame
                        .a
                        .as_ref()
                        .map_or(std::ptr::null(), |plane| plane.as_ptr()),
                    y_stride: frame.y_stride as i32,
                    u_stride: frame.u_stride as i32,
                    v_stride: frame.v_stride as i32,
                    a_stride: frame.a_stride as i32,
                    width: frame.width,
                    height: frame.height,
                };
                callback(context.0, &view);
            })));
        }
        None => slot.set(None),
    }
    ResultCode::Success
}

/// Register or clear the ARGB32 remote video frame callback
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_register_argb32_video_frame_callback(
    peer_handle: *mut c_void,
    callback: Option<Argb32VideoFrameCallback>,
    user_data: *mut c_void,
) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    let slot = &peer.events().argb32_video_frame;
    match callback {
        Some(callback) => {
            let context = UserData(user_data);
            slot.set(Some(Box::new(move |frame: &Argb32Frame| {
                let context = context;
                let view = Argb32VideoFrameView {
                    data: frame.data.as_ptr(),
                    stride: frame.stride as i32,
                    width: frame.width,
                    height: frame.height,
                };
                callback(context.0, &view);
            })));
        }
        None => slot.set(None),
    }
    ResultCode::Success
}

fn set_audio_frame_slot(
    slot: &peerlink_core::CallbackSlot<AudioFrame>,
    callback: Option<AudioFrameCallback>,
    user_data: *mut c_void,
) {
    match callback {
        Some(callback) => {
            let context = UserData(user_data);
            slot.set(Some(Box::new(move |frame: &AudioFrame| {
                let context = context;
                let view = AudioFrameView {
                    data: frame.data.as_ptr(),
                    bits_per_sample: frame.bits_per_sample,
                    sample_rate: frame.sample_rate,
                    channel_count: frame.channel_count,
                    frame_count: frame.frame_count,
                };
                callback(context.0, &view);
            })));
        }
        None => slot.set(None),
    }
}

/// Register or clear the captured local audio frame callback
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_register_local_audio_frame_callback(
    peer_handle: *mut c_void,
    callback: Option<AudioFrameCallback>,
    user_data: *mut c_void,
) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    set_audio_frame_slot(&peer.events().local_audio_frame, callback, user_data);
    ResultCode::Success
}

/// Register or clear the received remote audio frame callback
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_register_remote_audio_frame_callback(
    peer_handle: *mut c_void,
    callback: Option<AudioFrameCallback>,
    user_data: *mut c_void,
) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    set_audio_frame_slot(&peer.events().remote_audio_frame, callback, user_data);
    ResultCode::Success
}

/// Open a capture device and add a local video track fed by it
///
/// Blocks until the device is open on the designated engine thread. On
/// success `*track_handle_out` receives a track handle the caller must
/// release through `peerlink_local_video_track_release`.
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_add_local_video_track(
    peer_handle: *mut c_void,
    track_name: *const c_char,
    config: VideoDeviceConfigC,
    track_handle_out: *mut *mut c_void,
) -> ResultCode {
    if unsafe { c_str_is_null_or_empty(track_name) } {
        return ResultCode::InvalidParameter;
    }
    if track_handle_out.is_null() {
        return ResultCode::InvalidParameter;
    }
    unsafe { *track_handle_out = std::ptr::null_mut() };

    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    let Some(name) = (unsafe { c_str_to_string(track_name) }) else {
        return ResultCode::InvalidParameter;
    };
    let core_config = unsafe { config.to_core() };

    ffi_guard(|| {
        let result = run_sync(async move { peer.add_local_video_track(&name, &core_config).await });
        match result {
            Ok(Ok(track)) => {
                let handle = handle::alloc(HandleEntry::VideoTrack(track));
                unsafe { *track_handle_out = handle };
                ResultCode::Success
            }
            Ok(Err(err)) => ResultCode::from(&err),
            Err(code) => code,
        }
    })
}

/// Add a local video track fed by an external source
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_add_local_video_track_from_external_source(
    peer_handle: *mut c_void,
    track_name: *const c_char,
    source_handle: *mut c_void,
    track_handle_out: *mut *mut c_void,
) -> ResultCode {
    if track_handle_out.is_null() {
        return ResultCode::InvalidParameter;
    }
    unsafe { *track_handle_out = std::ptr::null_mut() };

    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    let source = match handle::video_source(source_handle) {
        Ok(source) => source,
        Err(code) => return code,
    };
    let name = unsafe { c_str_to_string(track_name) }.unwrap_or_default();

    ffi_guard(|| {
        let result =
            run_sync(async move { peer.add_local_video_track_from_source(&name, source).await });
        match result {
            Ok(Ok(track)) => {
                let handle = handle::alloc(HandleEntry::VideoTrack(track));
                unsafe { *track_handle_out = handle };
                ResultCode::Success
            }
            Ok(Err(err)) => ResultCode::from(&err),
            Err(code) => code,
        }
    })
}

/// Remove a local video track from its connection
///
/// The track handle itself stays valid until released.
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_remove_local_video_track(
    peer_handle: *mut c_void,
    track_handle: *mut c_void,
) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    let track = match handle::video_track(track_handle) {
        Ok(track) => track,
        Err(code) => return code,
    };
    ffi_guard(|| {
        match run_sync(async move { peer.remove_local_video_track(&track).await }) {
            Ok(result) => ResultCode::of(&result),
            Err(code) => code,
        }
    })
}

/// Remove every local video track fed by the given source
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_remove_local_video_tracks_from_source(
    peer_handle: *mut c_void,
    source_handle: *mut c_void,
) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    let source = match handle::video_source(source_handle) {
        Ok(source) => source,
        Err(code) => return code,
    };
    ffi_guard(|| {
        match run_sync(async move { peer.remove_local_video_tracks_from_source(&source).await }) {
            Ok(result) => ResultCode::of(&result),
            Err(code) => code,
        }
    })
}

/// Release a local video track handle
#[no_mangle]
pub extern "C" fn peerlink_local_video_track_release(track_handle: *mut c_void) -> ResultCode {
    handle::release(track_handle, Kind::VideoTrack)
}

/// Create an externally fed video source
///
/// The caller pushes frames through
/// `peerlink_external_video_source_push_frame` and releases the handle
/// through `peerlink_external_video_source_release`.
#[no_mangle]
pub extern "C" fn peerlink_external_video_source_create(
    source_handle_out: *mut *mut c_void,
) -> ResultCode {
    if source_handle_out.is_null() {
        return ResultCode::InvalidParameter;
    }
    let handle = handle::alloc(HandleEntry::VideoSource(VideoSource::external()));
    unsafe { *source_handle_out = handle };
    ResultCode::Success
}

/// Push one I420 frame into an external video source
#[no_mangle]
pub extern "C" fn peerlink_external_video_source_push_frame(
    source_handle: *mut c_void,
    frame: *const I420VideoFrameView,
) -> ResultCode {
    let source = match handle::video_source(source_handle) {
        Ok(source) => source,
        Err(code) => return code,
    };
    if frame.is_null() {
        return ResultCode::InvalidParameter;
    }
    let view = unsafe { *frame };
    if view.y_data.is_null() || view.u_data.is_null() || view.v_data.is_null() {
        return ResultCode::InvalidParameter;
    }
    if view.width == 0 || view.height == 0 {
        return ResultCode::InvalidParameter;
    }

    ffi_guard(|| {
        let width = view.width as usize;
        let height = view.height as usize;
        let chroma_width = (width + 1) / 2;
        let chroma_height = (height + 1) / 2;

        if (view.y_stride as usize) < width
            || (view.u_stride as usize) < chroma_width
            || (view.v_stride as usize) < chroma_width
            || view.y_stride < 0
            || view.u_stride < 0
            || view.v_stride < 0
            || (!view.a_data.is_null() && ((view.a_stride as usize) < width || view.a_stride < 0))
        {
            return ResultCode::InvalidParameter;
        }

        // Repack the caller's planes tightly, honoring their strides
        let gather = |data: *const u8, stride: i32, row_bytes: usize, rows: usize| {
            let stride = stride as usize;
            let total = stride * (rows - 1) + row_bytes;
            let src = unsafe { std::slice::from_raw_parts(data, total) };
            let mut plane = vec![0u8; row_bytes * rows];
            copy_plane(&mut plane, row_bytes, src, stride, row_bytes, rows).map(|()| plane)
        };

        let y = gather(view.y_data, view.y_stride, width, height);
        let u = gather(view.u_data, view.u_stride, chroma_width, chroma_height);
        let v = gather(view.v_data, view.v_stride, chroma_width, chroma_height);
        let (Ok(y), Ok(u), Ok(v)) = (y, u, v) else {
            return ResultCode::InvalidParameter;
        };
        let a = if view.a_data.is_null() {
            None
        } else {
            match gather(view.a_data, view.a_stride, width, height) {
                Ok(plane) => Some(plane),
                Err(_) => return ResultCode::InvalidParameter,
            }
        };

        let owned = VideoFrame {
            width: view.width,
            height: view.height,
            y,
            u,
            v,
            a_stride: if a.is_some() { view.width } else { 0 },
            a,
            y_stride: view.width,
            u_stride: chroma_width as u32,
            v_stride: chroma_width as u32,
        };
        match source.push_frame(&owned) {
            Ok(()) => ResultCode::Success,
            Err(err) => ResultCode::from(&err),
        }
    })
}

/// Release an external video source handle
#[no_mangle]
pub extern "C" fn peerlink_external_video_source_release(source_handle: *mut c_void) -> ResultCode {
    handle::release(source_handle, Kind::VideoSource)
}

/// Add the connection's single local audio track
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_add_local_audio_track(
    peer_handle: *mut c_void,
) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    ffi_guard(|| match run_sync(async move { peer.add_local_audio_track().await }) {
        Ok(result) => ResultCode::of(&result),
        Err(code) => code,
    })
}

/// Remove the local audio track
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_remove_local_audio_track(
    peer_handle: *mut c_void,
) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    ffi_guard(
        || match run_sync(async move { peer.remove_local_audio_track().await }) {
            Ok(result) => ResultCode::of(&result),
            Err(code) => code,
        },
    )
}

/// Mute or unmute the local audio track
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_set_local_audio_track_enabled(
    peer_handle: *mut c_void,
    enabled: NativeBool,
) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    let enabled = bool::from(enabled);
    ffi_guard(
        || match run_sync(async move { peer.set_local_audio_track_enabled(enabled).await }) {
            Ok(result) => ResultCode::of(&result),
            Err(code) => code,
        },
    )
}

/// Whether the local audio track currently produces audio
///
/// Reports false on an invalid handle or when no audio track was added.
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_is_local_audio_track_enabled(
    peer_handle: *mut c_void,
) -> NativeBool {
    match handle::peer(peer_handle) {
        Ok(peer) => NativeBool::from(peer.is_local_audio_track_enabled()),
        Err(_) => NativeBool::False,
    }
}

/// Add an ICE candidate signaled by the remote peer
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_add_ice_candidate(
    peer_handle: *mut c_void,
    candidate: *const c_char,
    sdp_mline_index: i32,
    sdp_mid: *const c_char,
) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    if unsafe { c_str_is_null_or_empty(candidate) } {
        return ResultCode::InvalidParameter;
    }
    let candidate = IceCandidate {
        candidate: unsafe { c_str_to_string(candidate) }.unwrap_or_default(),
        sdp_mline_index,
        sdp_mid: unsafe { c_str_to_string(sdp_mid) }.unwrap_or_default(),
    };
    ffi_guard(
        || match run_sync(async move { peer.add_ice_candidate(&candidate).await }) {
            Ok(result) => ResultCode::of(&result),
            Err(code) => code,
        },
    )
}

/// Build an offer; the SDP arrives through the description-ready callback
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_create_offer(peer_handle: *mut c_void) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    ffi_guard(|| match run_sync(async move { peer.create_offer().await }) {
        Ok(result) => ResultCode::of(&result),
        Err(code) => code,
    })
}

/// Build an answer; the SDP arrives through the description-ready callback
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_create_answer(peer_handle: *mut c_void) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    ffi_guard(|| match run_sync(async move { peer.create_answer().await }) {
        Ok(result) => ResultCode::of(&result),
        Err(code) => code,
    })
}

/// Apply a session description signaled by the remote peer
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_set_remote_description(
    peer_handle: *mut c_void,
    sdp_type: *const c_char,
    sdp: *const c_char,
) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    let Some(kind) = (unsafe { parse_sdp_type(sdp_type) }) else {
        return ResultCode::InvalidParameter;
    };
    if unsafe { c_str_is_null_or_empty(sdp) } {
        return ResultCode::InvalidParameter;
    }
    let sdp = unsafe { c_str_to_string(sdp) }.unwrap_or_default();
    ffi_guard(
        || match run_sync(async move { peer.set_remote_description(kind, &sdp).await }) {
            Ok(result) => ResultCode::of(&result),
            Err(code) => code,
        },
    )
}

/// Apply connection-wide bitrate settings; negative values stay unset
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_set_bitrate(
    peer_handle: *mut c_void,
    min_bitrate_bps: i32,
    start_bitrate_bps: i32,
    max_bitrate_bps: i32,
) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    let settings = BitrateSettings::from_raw(min_bitrate_bps, start_bitrate_bps, max_bitrate_bps);
    ffi_guard(|| match run_sync(async move { peer.set_bitrate(&settings).await }) {
        Ok(result) => ResultCode::of(&result),
        Err(code) => code,
    })
}

/// Close the connection, clear its callback slots, and release its handle
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_close(peer_handle: *mut c_void) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    ffi_guard(|| {
        let result = run_sync(async move { peer.close().await });
        let release = handle::release(peer_handle, Kind::Peer);
        match result {
            Ok(result) => match ResultCode::of(&result) {
                ResultCode::Success => release,
                code => code,
            },
            Err(code) => code,
        }
    })
}
