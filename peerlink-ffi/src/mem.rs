//! Raw memory helpers used by frame-delivery callbacks

use std::ffi::c_void;

use crate::types::ResultCode;

/// Plain contiguous copy between caller-owned buffers
#[no_mangle]
pub extern "C" fn peerlink_memcpy(dst: *mut c_void, src: *const c_void, size: u64) -> ResultCode {
    if dst.is_null() || src.is_null() {
        return ResultCode::InvalidParameter;
    }
    if size == 0 {
        return ResultCode::Success;
    }
    unsafe {
        std::ptr::copy_nonoverlapping(src as *const u8, dst as *mut u8, size as usize);
    }
    ResultCode::Success
}

/// Stride-aware copy of `elem_count` rows of `elem_size` bytes
///
/// When both strides equal the element size the rows are tightly packed
/// and one contiguous copy is performed; otherwise rows are copied one at
/// a time, skipping each buffer's padding.
#[no_mangle]
pub extern "C" fn peerlink_memcpy_stride(
    dst: *mut c_void,
    dst_stride: i32,
    src: *const c_void,
    src_stride: i32,
    elem_size: i32,
    elem_count: i32,
) -> ResultCode {
    if dst.is_null() || src.is_null() {
        return ResultCode::InvalidParameter;
    }
    if elem_size < 0 || elem_count < 0 || dst_stride < elem_size || src_stride < elem_size {
        return ResultCode::InvalidParameter;
    }
    if elem_size == 0 || elem_count == 0 {
        return ResultCode::Success;
    }

    let elem_size = elem_size as usize;
    let elem_count = elem_count as usize;
    let dst_stride = dst_stride as usize;
    let src_stride = src_stride as usize;

    unsafe {
        if dst_stride == elem_size && src_stride == elem_size {
            // Tightly packed: a single copy covers every row
            std::ptr::copy_nonoverlapping(
                src as *const u8,
                dst as *mut u8,
                elem_size * elem_count,
            );
        } else {
            let mut src_row = src as *const u8;
            let mut dst_row = dst as *mut u8;
            for _ in 0..elem_count {
                std::ptr::copy_nonoverlapping(src_row, dst_row, elem_size);
                src_row = src_row.add(src_stride);
                dst_row = dst_row.add(dst_stride);
            }
        }
    }
    ResultCode::Success
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_copy_moves_all_bytes() {
        let src: Vec<u8> = (0..32).collect();
        let mut dst = vec![0u8; 32];
        let code = peerlink_memcpy(
            dst.as_mut_ptr() as *mut c_void,
            src.as_ptr() as *const c_void,
            32,
        );
        assert_eq!(code, ResultCode::Success);
        assert_eq!(dst, src);
    }

    #[test]
    fn null_pointers_are_rejected() {
        let mut dst = [0u8; 4];
        assert_eq!(
            peerlink_memcpy(std::ptr::null_mut(), dst.as_ptr() as *const c_void, 4),
            ResultCode::InvalidParameter
        );
        assert_eq!(
            peerlink_memcpy_stride(
                dst.as_mut_ptr() as *mut c_void,
                4,
                std::ptr::null(),
                4,
                4,
                1
            ),
            ResultCode::InvalidParameter
        );
    }

    #[test]
    fn strided_copy_skips_source_padding() {
        // 3 rows of 4 bytes, source stride 6
        let src: Vec<u8> = vec![
            0, 1, 2, 3, 0xAA, 0xAA, //
            4, 5, 6, 7, 0xAA, 0xAA, //
            8, 9, 10, 11, 0xAA, 0xAA,
        ];
        let mut dst = vec![0u8; 12];
        let code = peerlink_memcpy_stride(
            dst.as_mut_ptr() as *mut c_void,
            4,
            src.as_ptr() as *const c_void,
            6,
            4,
            3,
        );
        assert_eq!(code, ResultCode::Success);
        assert_eq!(dst, (0..12).collect::<Vec<u8>>());
    }

    #[test]
    fn stride_smaller_than_element_is_rejected() {
        let src = [0u8; 16];
        let mut dst = [0u8; 16];
        let code = peerlink_memcpy_stride(
            dst.as_mut_ptr() as *mut c_void,
            2,
            src.as_ptr() as *const c_void,
            4,
            4,
            2,
        );
        assert_eq!(code, ResultCode::InvalidParameter);
    }
}
