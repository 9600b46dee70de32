//! Data channel entry points

use std::ffi::c_void;

use bytes::Bytes;
use peerlink_core::{BufferingChanged, DataChannelInit, StateChanged};

use crate::handle::{self, HandleEntry, Kind};
use crate::types::{
    c_str_to_string, DataChannelCallbacksC, DataChannelConfigC, DataChannelStateCode, ResultCode,
    UserData, DATA_CHANNEL_FLAG_ORDERED, DATA_CHANNEL_FLAG_RELIABLE,
};
use crate::{ffi_guard, run_sync};

/// Open a data channel on a connection
///
/// `binding` is an opaque consumer token carried by channel lifecycle
/// events. The supplied callbacks are bound before any message can be
/// delivered. On success `*channel_handle_out` receives the channel
/// handle; it is released by `peerlink_peer_connection_remove_data_channel`.
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_add_data_channel(
    peer_handle: *mut c_void,
    binding: *mut c_void,
    config: DataChannelConfigC,
    callbacks: DataChannelCallbacksC,
    channel_handle_out: *mut *mut c_void,
) -> ResultCode {
    if channel_handle_out.is_null() || binding.is_null() {
        return ResultCode::InvalidParameter;
    }
    unsafe { *channel_handle_out = std::ptr::null_mut() };

    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    let init = DataChannelInit {
        id: config.id,
        label: unsafe { c_str_to_string(config.label) }.unwrap_or_default(),
        ordered: config.flags & DATA_CHANNEL_FLAG_ORDERED != 0,
        reliable: config.flags & DATA_CHANNEL_FLAG_RELIABLE != 0,
    };
    let binding_token = binding as usize;

    ffi_guard(|| {
        let created = run_sync(async move { peer.add_data_channel(&init, binding_token).await });
        let channel = match created {
            Ok(Ok(channel)) => channel,
            Ok(Err(err)) => return ResultCode::from(&err),
            Err(code) => return code,
        };

        if let Some(message_callback) = callbacks.message_callback {
            let context = UserData(callbacks.message_user_data);
            channel
                .callbacks()
                .message
                .set(Some(Box::new(move |data: &[u8]| {
                    let context = context;
                    message_callback(context.0, data.as_ptr(), data.len() as u64);
                })));
        }
        if let Some(buffering_callback) = callbacks.buffering_callback {
            let context = UserData(callbacks.buffering_user_data);
            channel
                .callbacks()
                .buffering
                .set(Some(Box::new(move |change: &BufferingChanged| {
                    let context = context;
                    buffering_callback(context.0, change.previous, change.current, change.limit);
                })));
        }
        if let Some(state_callback) = callbacks.state_callback {
            let context = UserData(callbacks.state_user_data);
            channel
                .callbacks()
                .state
                .set(Some(Box::new(move |change: &StateChanged| {
                    let context = context;
                    state_callback(
                        context.0,
                        DataChannelStateCode::from(change.state),
                        change.id,
                    );
                })));
        }

        let handle = handle::alloc(HandleEntry::DataChannel(channel));
        unsafe { *channel_handle_out = handle };
        ResultCode::Success
    })
}

/// Tear down a data channel and release its handle
#[no_mangle]
pub extern "C" fn peerlink_peer_connection_remove_data_channel(
    peer_handle: *mut c_void,
    channel_handle: *mut c_void,
) -> ResultCode {
    let peer = match handle::peer(peer_handle) {
        Ok(peer) => peer,
        Err(code) => return code,
    };
    let channel = match handle::data_channel(channel_handle) {
        Ok(channel) => channel,
        Err(code) => return code,
    };
    ffi_guard(|| {
        let result = run_sync(async move { peer.remove_data_channel(&channel).await });
        match result {
            Ok(Ok(())) => handle::release(channel_handle, Kind::DataChannel),
            Ok(Err(err)) => ResultCode::from(&err),
            Err(code) => code,
        }
    })
}

/// Send one message over a data channel
#[no_mangle]
pub extern "C" fn peerlink_data_channel_send(
    channel_handle: *mut c_void,
    data: *const c_void,
    size: u64,
) -> ResultCode {
    let channel = match handle::data_channel(channel_handle) {
        Ok(channel) => channel,
        Err(code) => return code,
    };
    if data.is_null() && size > 0 {
        return ResultCode::InvalidParameter;
    }
    let payload = if size == 0 {
        Bytes::new()
    } else {
        let bytes = unsafe { std::slice::from_raw_parts(data as *const u8, size as usize) };
        Bytes::copy_from_slice(bytes)
    };
    ffi_guard(|| match run_sync(async move { channel.send(payload).await }) {
        Ok(result) => ResultCode::of(&result),
        Err(code) => code,
    })
}
