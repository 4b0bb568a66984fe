//! PNG reframer: turns a raw byte stream into discrete, timed frame packets.

use crate::error::FilterError;
use crate::filter::{Capabilities, Filter, FilterEvent, PortCaps, ProcessOutcome};
use crate::format::{self, CodecId};
use crate::host::{PipelineHost, PortDirection, PortId};
use crate::pixel::PixelFormat;
use crate::props::{Fraction, PlaybackMode, StreamType};

static CAPS: Capabilities = Capabilities {
    input: PortCaps {
        stream_type: Some(StreamType::File),
        codec_id: None,
        extensions: &["png", "pngd", "pngds"],
        mimes: &["image/png"],
        exclude_unframed: false,
    },
    output: PortCaps {
        stream_type: Some(StreamType::Visual),
        codec_id: Some(CodecId::Png),
        extensions: &[],
        mimes: &[],
        exclude_unframed: false,
    },
};

/// Reframer stage for PNG byte streams.
///
/// Consumes whole-file packets from a raw stream port, parses the PNG
/// header out of the first packet, and emits format-tagged frame packets
/// that reference the input bytes without copying. The output port only
/// comes into existence once a header has been parsed; until then the
/// downstream graph cannot link.
pub struct PngReframer {
    // options
    fps: Fraction,

    ipid: Option<PortId>,
    opid: Option<PortId>,
    codec_id: Option<CodecId>,
    owns_timescale: bool,

    initial_play_done: bool,
    is_playing: bool,
}

impl PngReframer {
    pub fn new() -> Self {
        Self {
            fps: Fraction::new(0, 1000),
            ipid: None,
            opid: None,
            codec_id: None,
            owns_timescale: false,
            initial_play_done: false,
            is_playing: false,
        }
    }

    /// Frame rate used to synthesize timing when the source stream carries
    /// no timescale. Defaults to 1 Hz.
    pub fn with_fps(mut self, fps: Fraction) -> Self {
        self.fps = fps;
        self
    }

    /// Parse the stream header out of the first packet and create the
    /// output port carrying the discovered stream properties.
    fn setup_output(
        &mut self,
        host: &mut dyn PipelineHost,
        ipid: PortId,
        data: &[u8],
    ) -> Result<PortId, FilterError> {
        let parsed = format::parse_header(data);

        let in_props = host.port_props(ipid);
        let ext = in_props.file_ext.clone().unwrap_or_default();
        let mime = in_props.mime.clone().unwrap_or_default();

        let mut codec_id = parsed.as_ref().map(|h| h.codec_id);
        let mut pixel_format = None;
        if codec_id.is_none() {
            // extension-derived pixel format variants
            if ext.eq_ignore_ascii_case("pngd") {
                codec_id = Some(CodecId::Png);
                pixel_format = Some(PixelFormat::Rgbd);
            } else if ext.eq_ignore_ascii_case("pngds") {
                codec_id = Some(CodecId::Png);
                pixel_format = Some(PixelFormat::Rgbds);
            }
        }
        let Some(codec_id) = codec_id else {
            log::warn!("{}: no codec id from content or extension, dropping", self.name());
            return Err(FilterError::UnsupportedFormat);
        };
        self.codec_id = Some(codec_id);

        let opid = host
            .new_port(PortDirection::Output, "video")
            .map_err(|_| FilterError::Service("output port creation failed"))?;

        if self.fps.num == 0 || self.fps.den == 0 {
            self.fps = Fraction::new(1000, 1000);
        }

        let in_props = host.port_props(ipid).clone();
        let out = host.port_props_mut(opid);
        out.copy_from(&in_props);
        out.stream_type = Some(StreamType::Visual);
        out.codec_id = Some(codec_id);
        out.unframed = false;
        if let Some(pf) = pixel_format {
            out.pixel_format = Some(pf);
        }
        if let Some(header) = &parsed {
            if header.width != 0 {
                out.width = Some(header.width);
            }
            if header.height != 0 {
                out.height = Some(header.height);
            }
            if let Some(dsi) = &header.decoder_config {
                out.decoder_config = Some(dsi.clone());
            }
        }
        if in_props.timescale.is_none() {
            out.timescale = Some(self.fps.num);
            self.owns_timescale = true;
        }
        out.frame_count = Some(1);
        out.playback_mode = Some(PlaybackMode::FastForward);
        if !ext.is_empty() || !mime.is_empty() {
            out.can_dataref = true;
        }

        log::debug!(
            "{}: output port ready, {}x{}",
            self.name(),
            out.width.unwrap_or(0),
            out.height.unwrap_or(0)
        );
        self.opid = Some(opid);
        Ok(opid)
    }
}

impl Default for PngReframer {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for PngReframer {
    fn name(&self) -> &str {
        "rfpng"
    }

    fn capabilities(&self) -> &'static Capabilities {
        &CAPS
    }

    fn configure(
        &mut self,
        host: &mut dyn PipelineHost,
        port: PortId,
        removed: bool,
    ) -> Result<(), FilterError> {
        if removed {
            self.ipid = None;
            return Ok(());
        }
        let props = host.port_props(port);
        if !CAPS.input.accepts(props) {
            return Err(FilterError::UnsupportedFormat);
        }
        self.ipid = Some(port);
        // force retest of the codec id
        self.codec_id = None;
        Ok(())
    }

    fn process(&mut self, host: &mut dyn PipelineHost) -> Result<ProcessOutcome, FilterError> {
        let Some(ipid) = self.ipid else {
            return Ok(ProcessOutcome::Pending);
        };

        let Some(pck) = host.next_packet(ipid) else {
            if host.is_eos(ipid) {
                if let Some(opid) = self.opid {
                    host.set_eos(opid);
                }
                self.is_playing = false;
                return Ok(ProcessOutcome::EndOfStream);
            }
            return Ok(ProcessOutcome::Pending);
        };

        let opid = match (self.opid, self.codec_id) {
            (Some(opid), Some(_)) => opid,
            _ => match self.setup_output(host, ipid, &pck.data) {
                Ok(opid) => opid,
                Err(e) => {
                    host.drop_packet(ipid);
                    return Err(e);
                }
            },
        };

        // zero-copy pass-through of the whole input payload
        let mut dst = host.new_packet_ref(opid, &pck.data, 0)?;
        dst.props.merge_from(&pck.props);
        if self.owns_timescale {
            dst.props.cts = Some(0);
            dst.props.sap = true;
            dst.props.duration = self.fps.den;
        }
        host.send_packet(opid, dst);
        host.drop_packet(ipid);
        Ok(ProcessOutcome::Progress)
    }

    fn on_event(
        &mut self,
        host: &mut dyn PipelineHost,
        port: PortId,
        event: &FilterEvent,
    ) -> bool {
        if self.opid != Some(port) {
            return true;
        }
        match event {
            FilterEvent::Play => {
                if self.is_playing {
                    return true;
                }
                self.is_playing = true;
                if !self.initial_play_done {
                    self.initial_play_done = true;
                    return true;
                }
                if let Some(ipid) = self.ipid {
                    host.send_event_upstream(ipid, FilterEvent::SourceSeek { start_offset: 0 });
                }
                true
            }
            FilterEvent::Stop => {
                self.is_playing = false;
                false
            }
            // cancel all other events
            _ => true,
        }
    }
}
