//! The host pipeline boundary, and an in-memory reference implementation.
//!
//! Port identity, packet buffers and scheduling belong to the hosting
//! runtime; the stages only reach it through [`PipelineHost`]. The trait is
//! deliberately narrow so a test host can stand in for a real scheduler.

use std::collections::VecDeque;

use bytes::Bytes;

use crate::error::FilterError;
use crate::filter::FilterEvent;
use crate::packet::{FramePacket, PacketBuf};
use crate::props::PortProps;

/// Opaque port handle, issued by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PortId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

/// Services the hosting pipeline provides to a stage.
///
/// Packet pull is peek-then-release: `next_packet` returns the head of the
/// port's FIFO without consuming it, `drop_packet` releases it. A stage
/// must release every packet it pulled exactly once, on every code path.
pub trait PipelineHost {
    /// Request a new port. Fails with a service error when the host cannot
    /// create one.
    fn new_port(&mut self, dir: PortDirection, name: &str) -> Result<PortId, FilterError>;

    /// Detach and destroy a port this stage owns.
    fn remove_port(&mut self, port: PortId);

    fn port_props(&self, port: PortId) -> &PortProps;

    fn port_props_mut(&mut self, port: PortId) -> &mut PortProps;

    /// Peek the next packet queued on an input port, in arrival order.
    fn next_packet(&self, port: PortId) -> Option<FramePacket>;

    /// Release the packet last returned by [`Self::next_packet`].
    fn drop_packet(&mut self, port: PortId);

    /// Whether the upstream end of this port has finished producing.
    fn is_eos(&self, port: PortId) -> bool;

    /// Signal end-of-stream to whoever consumes this port.
    fn set_eos(&mut self, port: PortId);

    /// Allocate a zero-initialized output packet of `size` bytes.
    fn new_packet(&mut self, port: PortId, size: usize) -> Result<PacketBuf, FilterError>;

    /// Build an output packet referencing `data` from `offset` to the end,
    /// without copying.
    fn new_packet_ref(
        &mut self,
        port: PortId,
        data: &Bytes,
        offset: usize,
    ) -> Result<FramePacket, FilterError>;

    /// Queue a finished packet on an output port.
    fn send_packet(&mut self, port: PortId, packet: FramePacket);

    /// Deliver a playback event to the producer feeding `port`.
    fn send_event_upstream(&mut self, port: PortId, event: FilterEvent);
}

struct PortState {
    dir: PortDirection,
    name: String,
    props: PortProps,
    queue: VecDeque<FramePacket>,
    eos: bool,
    upstream_events: Vec<FilterEvent>,
    removed: bool,
}

/// In-memory single-connection host: one FIFO per port, no scheduler.
///
/// Used by the test suite and for standalone embedding of the stages
/// outside a real pipeline runtime. A port created by a producing stage can
/// be handed directly to a consuming stage; `send_packet` feeds the same
/// FIFO `next_packet` reads.
#[derive(Default)]
pub struct MemoryHost {
    ports: Vec<PortState>,
    /// When set, packet allocations above this size fail with `Oom`.
    alloc_limit: Option<usize>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail `new_packet` calls larger than `bytes`, to exercise allocation
    /// failure paths.
    pub fn with_alloc_limit(mut self, bytes: usize) -> Self {
        self.alloc_limit = Some(bytes);
        self
    }

    /// Create a source-side port carrying the given properties.
    pub fn add_source_port(&mut self, name: &str, props: PortProps) -> PortId {
        let id = PortId(self.ports.len());
        self.ports.push(PortState {
            dir: PortDirection::Input,
            name: name.to_owned(),
            props,
            queue: VecDeque::new(),
            eos: false,
            upstream_events: Vec::new(),
            removed: false,
        });
        id
    }

    /// Queue raw bytes as one packet on a port.
    pub fn push_bytes(&mut self, port: PortId, data: impl Into<Bytes>) {
        self.push_packet(port, FramePacket::new(data.into()));
    }

    pub fn push_packet(&mut self, port: PortId, packet: FramePacket) {
        self.port_mut(port).queue.push_back(packet);
    }

    /// Mark a source port as finished.
    pub fn finish(&mut self, port: PortId) {
        self.port_mut(port).eos = true;
    }

    /// Drain every packet currently queued on a port.
    pub fn drain(&mut self, port: PortId) -> Vec<FramePacket> {
        self.port_mut(port).queue.drain(..).collect()
    }

    /// Number of packets currently queued on a port.
    pub fn queued(&self, port: PortId) -> usize {
        self.port(port).queue.len()
    }

    /// Events a stage sent upstream through this port.
    pub fn upstream_events(&self, port: PortId) -> &[FilterEvent] {
        &self.port(port).upstream_events
    }

    /// Number of ports ever created on this host.
    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    /// Handle of the `index`-th port, in creation order.
    pub fn port_id(&self, index: usize) -> PortId {
        assert!(index < self.ports.len(), "no such port");
        PortId(index)
    }

    pub fn port_dir(&self, port: PortId) -> PortDirection {
        self.port(port).dir
    }

    pub fn port_name(&self, port: PortId) -> &str {
        &self.port(port).name
    }

    pub fn port_removed(&self, port: PortId) -> bool {
        self.port(port).removed
    }

    fn port(&self, port: PortId) -> &PortState {
        &self.ports[port.0]
    }

    fn port_mut(&mut self, port: PortId) -> &mut PortState {
        &mut self.ports[port.0]
    }
}

impl PipelineHost for MemoryHost {
    fn new_port(&mut self, dir: PortDirection, name: &str) -> Result<PortId, FilterError> {
        let id = PortId(self.ports.len());
        self.ports.push(PortState {
            dir,
            name: name.to_owned(),
            props: PortProps::default(),
            queue: VecDeque::new(),
            eos: false,
            upstream_events: Vec::new(),
            removed: false,
        });
        log::trace!("new {:?} port {:?} ({})", dir, id, name);
        Ok(id)
    }

    fn remove_port(&mut self, port: PortId) {
        let state = self.port_mut(port);
        state.removed = true;
        state.queue.clear();
    }

    fn port_props(&self, port: PortId) -> &PortProps {
        &self.port(port).props
    }

    fn port_props_mut(&mut self, port: PortId) -> &mut PortProps {
        &mut self.port_mut(port).props
    }

    fn next_packet(&self, port: PortId) -> Option<FramePacket> {
        self.port(port).queue.front().cloned()
    }

    fn drop_packet(&mut self, port: PortId) {
        self.port_mut(port).queue.pop_front();
    }

    fn is_eos(&self, port: PortId) -> bool {
        let state = self.port(port);
        state.eos && state.queue.is_empty()
    }

    fn set_eos(&mut self, port: PortId) {
        self.port_mut(port).eos = true;
    }

    fn new_packet(&mut self, _port: PortId, size: usize) -> Result<PacketBuf, FilterError> {
        if let Some(limit) = self.alloc_limit {
            if size > limit {
                return Err(FilterError::Oom);
            }
        }
        Ok(PacketBuf::zeroed(size))
    }

    fn new_packet_ref(
        &mut self,
        _port: PortId,
        data: &Bytes,
        offset: usize,
    ) -> Result<FramePacket, FilterError> {
        if offset > data.len() {
            return Err(FilterError::BadParameter);
        }
        Ok(FramePacket::new(data.slice(offset..)))
    }

    fn send_packet(&mut self, port: PortId, packet: FramePacket) {
        self.port_mut(port).queue.push_back(packet);
    }

    fn send_event_upstream(&mut self, port: PortId, event: FilterEvent) {
        self.port_mut(port).upstream_events.push(event);
    }
}
