//! The stage protocol: what the hosting pipeline calls into.
//!
//! A filter never blocks. The host invokes [`Filter::process`] once per
//! scheduling turn; "no packet available yet" is the immediate
//! [`ProcessOutcome::Pending`] return, not a wait.

use crate::error::FilterError;
use crate::format::CodecId;
use crate::host::{PipelineHost, PortId};
use crate::pixel::PixelFormat;
use crate::props::StreamType;

/// Result of one non-erroring `process()` turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// A packet was consumed (and possibly one emitted).
    Progress,
    /// Nothing to do yet; the host should retry on a later turn.
    Pending,
    /// Input exhausted; end-of-stream has been propagated downstream.
    EndOfStream,
}

/// Playback control events traveling against the data flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterEvent {
    Play,
    Stop,
    /// Restart reading the source at the given byte offset.
    SourceSeek { start_offset: u64 },
}

/// What a stage accepts on one side of its connection.
#[derive(Clone, Copy, Debug)]
pub struct PortCaps {
    pub stream_type: Option<StreamType>,
    pub codec_id: Option<CodecId>,
    pub extensions: &'static [&'static str],
    pub mimes: &'static [&'static str],
    /// Reject ports still carrying an unreframed byte stream.
    pub exclude_unframed: bool,
}

impl PortCaps {
    /// Whether a port carrying `props` is compatible with this side.
    ///
    /// Undeclared properties don't disqualify a port; mismatches do.
    pub fn accepts(&self, props: &crate::props::PortProps) -> bool {
        if let (Some(want), Some(have)) = (self.stream_type, props.stream_type) {
            if want != have {
                return false;
            }
        }
        if let Some(want) = self.codec_id {
            if props.codec_id != Some(want) {
                return false;
            }
        }
        if self.exclude_unframed && props.unframed {
            return false;
        }
        if let Some(ext) = props.file_ext.as_deref() {
            if !ext.is_empty()
                && !self.extensions.is_empty()
                && !self.extensions.iter().any(|e| ext.eq_ignore_ascii_case(e))
            {
                return false;
            }
        }
        if let Some(mime) = props.mime.as_deref() {
            if !mime.is_empty()
                && !self.mimes.is_empty()
                && !self.mimes.iter().any(|m| mime.eq_ignore_ascii_case(m))
            {
                return false;
            }
        }
        true
    }
}

/// Advertised capabilities used by the host for automatic stage selection.
#[derive(Clone, Copy, Debug)]
pub struct Capabilities {
    pub input: PortCaps,
    pub output: PortCaps,
}

/// A single pipeline stage.
///
/// One instance per active pipeline connection; the instance owns its
/// context exclusively and shares no state with other instances.
pub trait Filter {
    /// Stage name, for logs and host UIs. May change when a backend is
    /// selected (e.g. `pngdec` -> `pngdec:libpng`).
    fn name(&self) -> &str;

    /// Static capability declaration.
    fn capabilities(&self) -> &'static Capabilities;

    /// Connect (or with `removed`, disconnect) an input port.
    fn configure(
        &mut self,
        host: &mut dyn PipelineHost,
        port: PortId,
        removed: bool,
    ) -> Result<(), FilterError>;

    /// Run one cooperative processing turn.
    fn process(&mut self, host: &mut dyn PipelineHost) -> Result<ProcessOutcome, FilterError>;

    /// Handle a playback event targeted at `port`.
    ///
    /// Returns `true` when the event is swallowed, `false` when the host
    /// should keep propagating it upstream.
    fn on_event(
        &mut self,
        _host: &mut dyn PipelineHost,
        _port: PortId,
        _event: &FilterEvent,
    ) -> bool {
        true
    }

    /// Downstream changed the desired pixel format on an output port.
    fn reconfigure_output(
        &mut self,
        _host: &mut dyn PipelineHost,
        _port: PortId,
        _format: PixelFormat,
    ) -> Result<(), FilterError> {
        Err(FilterError::BadParameter)
    }
}
