//! Frame packets: immutable refcounted payloads plus properties.

use bytes::{Bytes, BytesMut};

use crate::props::PacketProps;

/// One unit of streamed data: a compressed frame or a raw pixel buffer.
///
/// The payload is reference-counted; cloning a packet never copies pixel
/// bytes. Ownership rule: the stage that pulls a packet from a port must
/// release it through the host exactly once, on every code path.
#[derive(Clone, Debug)]
pub struct FramePacket {
    pub data: Bytes,
    pub props: PacketProps,
}

impl FramePacket {
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            props: PacketProps::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// An output packet under construction.
///
/// Allocated through the host, filled by the stage, then either frozen and
/// sent or simply dropped to discard it without sending.
#[derive(Debug)]
pub struct PacketBuf {
    pub data: BytesMut,
    pub props: PacketProps,
}

impl PacketBuf {
    pub(crate) fn zeroed(size: usize) -> Self {
        Self {
            data: BytesMut::zeroed(size),
            props: PacketProps::default(),
        }
    }

    /// Seal the buffer into an immutable packet.
    pub fn freeze(self) -> FramePacket {
        FramePacket {
            data: self.data.freeze(),
            props: self.props,
        }
    }
}
