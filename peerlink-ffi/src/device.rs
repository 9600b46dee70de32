//! Capture device and format enumeration entry points
//!
//! Enumeration delivers results through repeated synchronous visitor
//! invocations followed by one terminal completion callback; zero items
//! still invokes completion. Each call re-queries the system device list.

use std::ffi::{c_char, c_void, CString};

use peerlink_core::{enumerate_capabilities, enumerate_devices};

use crate::types::{
    c_str_is_null_or_empty, c_str_to_string, DeviceEnumCallback, DeviceEnumCompletedCallback,
    FormatEnumCallback, FormatEnumCompletedCallback, ResultCode,
};
use crate::{factory, ffi_guard};

/// Enumerate the system's video capture devices
///
/// `enum_callback` runs once per device with its stable id and display
/// name; `completed_callback`, when supplied, runs once afterwards.
#[no_mangle]
pub extern "C" fn peerlink_enum_video_capture_devices(
    enum_callback: Option<DeviceEnumCallback>,
    enum_user_data: *mut c_void,
    completed_callback: Option<DeviceEnumCompletedCallback>,
    completed_user_data: *mut c_void,
) -> ResultCode {
    let Some(enum_callback) = enum_callback else {
        return ResultCode::InvalidParameter;
    };
    ffi_guard(|| {
        let driver = match factory() {
            Ok(factory) => factory.capture_driver(),
            Err(code) => return code,
        };
        let devices = match enumerate_devices(&*driver) {
            Ok(devices) => devices,
            Err(err) => {
                tracing::warn!(%err, "device enumeration failed");
                // The terminal callback still fires so the consumer's
                // iteration state unwinds
                if let Some(completed) = completed_callback {
                    completed(completed_user_data);
                }
                return ResultCode::from(&err);
            }
        };
        for device in devices {
            let (Ok(id), Ok(name)) = (CString::new(device.id), CString::new(device.name)) else {
                continue;
            };
            enum_callback(id.as_ptr(), name.as_ptr(), enum_user_data);
        }
        if let Some(completed) = completed_callback {
            completed(completed_user_data);
        }
        ResultCode::Success
    })
}

/// Enumerate the capture formats of one device
///
/// `enum_callback` runs once per supported mode with its dimensions,
/// frame rate, and four-character pixel-format code; formats with no
/// code mapping are filtered out. The terminal callback carries the
/// enumeration result.
#[no_mangle]
pub extern "C" fn peerlink_enum_video_capture_formats(
    device_id: *const c_char,
    enum_callback: Option<FormatEnumCallback>,
    enum_user_data: *mut c_void,
    completed_callback: Option<FormatEnumCompletedCallback>,
    completed_user_data: *mut c_void,
) -> ResultCode {
    if unsafe { c_str_is_null_or_empty(device_id) } {
        return ResultCode::InvalidParameter;
    }
    let Some(enum_callback) = enum_callback else {
        return ResultCode::InvalidParameter;
    };
    let Some(device_id) = (unsafe { c_str_to_string(device_id) }) else {
        return ResultCode::InvalidParameter;
    };
    ffi_guard(|| {
        let driver = match factory() {
            Ok(factory) => factory.capture_driver(),
            Err(code) => return code,
        };
        match enumerate_capabilities(&*driver, &device_id) {
            Ok(capabilities) => {
                for capability in capabilities {
                    enum_callback(
                        capability.width,
                        capability.height,
                        capability.max_framerate,
                        capability.pixel_format.to_fourcc(),
                        enum_user_data,
                    );
                }
                if let Some(completed) = completed_callback {
                    completed(ResultCode::Success, completed_user_data);
                }
                ResultCode::Success
            }
            Err(err) => {
                tracing::warn!(%err, device_id, "format enumeration failed");
                let code = ResultCode::from(&err);
                if let Some(completed) = completed_callback {
                    completed(code, completed_user_data);
                }
                code
            }
        }
    })
}
