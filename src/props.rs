//! Stream and packet property bags.
//!
//! The host pipeline tags every port and packet with a property set; the
//! stages read, propagate and override individual fields rather than
//! re-deriving them. Fields left `None` are simply "not declared".

use bytes::Bytes;

use crate::format::CodecId;
use crate::pixel::PixelFormat;

/// Rational number, used for the reframer `fps` option.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fraction {
    pub num: u32,
    pub den: u32,
}

impl Fraction {
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }
}

/// Broad class of data carried by a port.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamType {
    /// Raw byte/file stream, not yet demuxed.
    File,
    /// Visual frames (compressed or raw).
    Visual,
}

/// How a source can honor playback requests.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackMode {
    None,
    SeekOnly,
    FastForward,
    Rewind,
}

/// Properties declared on a stream port.
#[derive(Clone, Debug, Default)]
pub struct PortProps {
    pub stream_type: Option<StreamType>,
    pub codec_id: Option<CodecId>,
    pub pixel_format: Option<PixelFormat>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Byte distance between consecutive pixel rows of a raw buffer.
    pub stride: Option<u32>,
    /// Ticks per second for packet timestamps on this port.
    pub timescale: Option<u32>,
    pub decoder_config: Option<Bytes>,
    pub frame_count: Option<u32>,
    pub playback_mode: Option<PlaybackMode>,
    /// File extension hint from the source (e.g. "png", "pngd", "pngds").
    pub file_ext: Option<String>,
    pub mime: Option<String>,
    /// Downstream may reference this port's packet bytes without copying.
    pub can_dataref: bool,
    /// Payload is a raw byte stream still in need of reframing.
    pub unframed: bool,
}

impl PortProps {
    /// Propagate generic stream properties from an upstream port.
    ///
    /// Stages call this right after output port creation, then override the
    /// fields they own.
    pub fn copy_from(&mut self, src: &PortProps) {
        *self = src.clone();
    }
}

/// Timing and framing properties attached to one packet.
#[derive(Clone, Debug, Default)]
pub struct PacketProps {
    /// Composition timestamp, in the port's timescale.
    pub cts: Option<u64>,
    /// Decode timestamp, in the port's timescale.
    pub dts: Option<u64>,
    pub duration: u32,
    /// Sync/random-access point.
    pub sap: bool,
    pub dependency_flags: u8,
}

impl PacketProps {
    /// Merge timing/framing properties from a source packet, then let the
    /// caller override the fields it owns.
    pub fn merge_from(&mut self, src: &PacketProps) {
        *self = src.clone();
    }
}
