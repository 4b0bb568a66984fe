//! The opaque decode-primitive boundary.
//!
//! Decompression itself (inflate, CRC, filter reconstruction) lives behind
//! [`FrameDecoder`]. The calling convention is strictly two-phase: probe
//! for the required output size first, then fill an allocated buffer. The
//! two calls are never fused, since the caller must know the size before
//! it can allocate.

use crate::error::FilterError;
use crate::pixel::PixelFormat;

/// What a size probe learns about one compressed frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameInfo {
    pub width: u32,
    pub height: u32,
    /// Layout the decoder will natively produce.
    pub native_format: PixelFormat,
    /// Exact byte size [`FrameDecoder::fill`] requires for its buffer.
    pub required_size: usize,
}

/// Two-phase frame decoder.
pub trait FrameDecoder {
    /// Backend name, appended to the decoder stage name on configuration.
    fn name(&self) -> &'static str;

    /// Probe phase: parse enough of `data` to report dimensions, native
    /// pixel format and the required output buffer size. Must not decode
    /// pixel data.
    fn probe(&mut self, data: &[u8]) -> Result<FrameInfo, FilterError>;

    /// Fill phase: decode `data` into `out`.
    ///
    /// `out` must be exactly the `required_size` the probe reported for
    /// the same bytes; a mismatch is a hard decode error and nothing is
    /// written.
    fn fill(&mut self, data: &[u8], out: &mut [u8]) -> Result<(), FilterError>;
}

#[cfg(feature = "png")]
pub mod png;
