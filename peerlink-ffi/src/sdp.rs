//! SDP codec filtering entry point

use std::ffi::c_char;

use peerlink_core::{force_codecs, CodecFilter};

use crate::ffi_guard;
use crate::types::{c_str_to_string, ResultCode, SdpFilterC};

unsafe fn filter_from_c(filter: &SdpFilterC) -> CodecFilter {
    let codec_name = c_str_to_string(filter.codec_name).unwrap_or_default();
    let params = c_str_to_string(filter.params).unwrap_or_default();
    CodecFilter::from_params_str(&codec_name, &params)
}

/// Restrict a session description to one codec per media kind
///
/// `buffer_size` carries the buffer capacity in and the exact required
/// size (including the terminator) out. With insufficient capacity the
/// call fails with `InvalidParameter`, writes nothing, and leaves the
/// required size in `buffer_size` so the caller can retry.
#[no_mangle]
pub extern "C" fn peerlink_sdp_force_codecs(
    message: *const c_char,
    audio_filter: SdpFilterC,
    video_filter: SdpFilterC,
    buffer: *mut c_char,
    buffer_size: *mut u64,
) -> ResultCode {
    if message.is_null() || buffer.is_null() || buffer_size.is_null() {
        return ResultCode::InvalidParameter;
    }
    let Some(message) = (unsafe { c_str_to_string(message) }) else {
        return ResultCode::InvalidParameter;
    };
    let audio = unsafe { filter_from_c(&audio_filter) };
    let video = unsafe { filter_from_c(&video_filter) };

    ffi_guard(|| {
        let filtered = force_codecs(&message, &audio, &video);

        let capacity = unsafe { *buffer_size } as usize;
        let required = filtered.len() + 1;
        unsafe { *buffer_size = required as u64 };
        if capacity < required {
            return ResultCode::InvalidParameter;
        }
        unsafe {
            std::ptr::copy_nonoverlapping(
                filtered.as_ptr(),
                buffer as *mut u8,
                filtered.len(),
            );
            *buffer.add(filtered.len()) = 0;
        }
        ResultCode::Success
    })
}
