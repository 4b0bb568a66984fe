//! Stateless pixel-layout conversion between RGB and RGBA buffers.
//!
//! Single-pass, non-allocating transforms over `count = width x height`
//! pixels. Source and destination must not alias; both lengths are checked
//! against the format's byte-per-pixel table before anything is written.

use rgb::{Rgb, Rgba};

use crate::error::FilterError;
use crate::pixel::PixelFormat;

/// Convert `count` pixels from `src_format` layout into `dst_format` layout.
///
/// Only RGB<->RGBA pairs are implemented; every other pair fails with
/// [`FilterError::NotSupported`] and writes nothing.
pub fn convert(
    dst: &mut [u8],
    dst_format: PixelFormat,
    src: &[u8],
    src_format: PixelFormat,
    count: usize,
) -> Result<(), FilterError> {
    match (src_format, dst_format) {
        (PixelFormat::Rgb, PixelFormat::Rgba) => {
            check_len(src, 3, count)?;
            check_len(dst, 4, count)?;
            rgb_to_rgba(dst, src);
            Ok(())
        }
        (PixelFormat::Rgba, PixelFormat::Rgb) => {
            check_len(src, 4, count)?;
            check_len(dst, 3, count)?;
            rgba_to_rgb(dst, src);
            Ok(())
        }
        (from, to) => Err(FilterError::NotSupported { from, to }),
    }
}

fn check_len(buf: &[u8], bpp: usize, count: usize) -> Result<(), FilterError> {
    if buf.len() != bpp * count {
        return Err(FilterError::BadParameter);
    }
    Ok(())
}

/// Copy 3 channels unchanged, force the 4th byte to fully opaque.
fn rgb_to_rgba(dst: &mut [u8], src: &[u8]) {
    let src: &[Rgb<u8>] = bytemuck::cast_slice(src);
    let dst: &mut [Rgba<u8>] = bytemuck::cast_slice_mut(dst);
    for (d, s) in dst.iter_mut().zip(src) {
        *d = Rgba {
            r: s.r,
            g: s.g,
            b: s.b,
            a: 255,
        };
    }
}

/// Copy the first 3 channels, drop the 4th.
fn rgba_to_rgb(dst: &mut [u8], src: &[u8]) {
    let src: &[Rgba<u8>] = bytemuck::cast_slice(src);
    let dst: &mut [Rgb<u8>] = bytemuck::cast_slice_mut(dst);
    for (d, s) in dst.iter_mut().zip(src) {
        *d = Rgb {
            r: s.r,
            g: s.g,
            b: s.b,
        };
    }
}
