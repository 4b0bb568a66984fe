//! PNG decoder stage: two-phase decode plus on-the-fly pixel conversion.

use crate::codecs::FrameDecoder;
use crate::convert::convert;
use crate::error::FilterError;
use crate::filter::{Capabilities, Filter, PortCaps, ProcessOutcome};
use crate::format::CodecId;
use crate::host::{PipelineHost, PortDirection, PortId};
use crate::pixel::PixelFormat;
use crate::props::StreamType;

static CAPS: Capabilities = Capabilities {
    input: PortCaps {
        stream_type: Some(StreamType::Visual),
        codec_id: Some(CodecId::Png),
        extensions: &[],
        mimes: &[],
        exclude_unframed: true,
    },
    output: PortCaps {
        stream_type: Some(StreamType::Visual),
        codec_id: Some(CodecId::Raw),
        extensions: &[],
        mimes: &[],
        exclude_unframed: false,
    },
};

/// Decoder stage for PNG frame packets.
///
/// Pulls compressed frames, probes each one for its size and native pixel
/// format, then fills a raw output buffer — converting RGB<->RGBA when the
/// downstream-requested format differs from what the frame decodes to.
pub struct PngDec {
    name: String,
    backend: Box<dyn FrameDecoder>,

    ipid: Option<PortId>,
    opid: Option<PortId>,
    codec_id: Option<CodecId>,
    width: u32,
    height: u32,
    /// Native format of the last decoded frame.
    pixel_format: Option<PixelFormat>,
    /// Output format requested by the downstream consumer.
    ofmt: Option<PixelFormat>,
    in_bpp: u32,
    out_bpp: u32,
}

impl PngDec {
    /// Decoder over the built-in `png` crate backend.
    #[cfg(feature = "png")]
    pub fn new() -> Self {
        Self::with_backend(Box::new(crate::codecs::png::PngBackend::new()))
    }

    /// Decoder over a caller-provided decode primitive.
    pub fn with_backend(backend: Box<dyn FrameDecoder>) -> Self {
        Self {
            name: "pngdec".to_owned(),
            backend,
            ipid: None,
            opid: None,
            codec_id: None,
            width: 0,
            height: 0,
            pixel_format: None,
            ofmt: None,
            in_bpp: 0,
            out_bpp: 0,
        }
    }
}

#[cfg(feature = "png")]
impl Default for PngDec {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for PngDec {
    fn name(&self) -> &str {
        &self.name
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
        // disconnect of src port (not yet supported mid-stream)
        if removed {
            if let Some(opid) = self.opid.take() {
                host.remove_port(opid);
            }
            self.ipid = None;
            return Ok(());
        }
        let props = host.port_props(port);
        if !CAPS.input.accepts(props) {
            return Err(FilterError::UnsupportedFormat);
        }
        let Some(codec_id) = props.codec_id else {
            return Err(FilterError::UnsupportedFormat);
        };
        self.codec_id = Some(codec_id);
        self.ipid = Some(port);

        let opid = match self.opid {
            Some(opid) => opid,
            None => {
                let opid = host
                    .new_port(PortDirection::Output, "raw")
                    .map_err(|_| FilterError::Service("output port creation failed"))?;
                self.opid = Some(opid);
                opid
            }
        };

        // copy properties at init or reconfig
        let in_props = host.port_props(port).clone();
        let out = host.port_props_mut(opid);
        out.copy_from(&in_props);
        out.codec_id = Some(CodecId::Raw);

        if self.ofmt.is_none() {
            self.ofmt = Some(PixelFormat::Rgb);
        }
        out.pixel_format = self.ofmt;

        if self.codec_id == Some(CodecId::Png) {
            self.name = format!("pngdec:{}", self.backend.name());
        }
        Ok(())
    }

    fn reconfigure_output(
        &mut self,
        host: &mut dyn PipelineHost,
        port: PortId,
        format: PixelFormat,
    ) -> Result<(), FilterError> {
        if self.opid != Some(port) {
            return Err(FilterError::BadParameter);
        }
        self.ofmt = Some(format);
        let Some(ipid) = self.ipid else {
            return Err(FilterError::BadParameter);
        };
        self.configure(host, ipid, false)
    }

    fn process(&mut self, host: &mut dyn PipelineHost) -> Result<ProcessOutcome, FilterError> {
        let Some(ipid) = self.ipid else {
            return Ok(ProcessOutcome::Pending);
        };
        let Some(opid) = self.opid else {
            return Ok(ProcessOutcome::Pending);
        };

        let Some(pck) = host.next_packet(ipid) else {
            if host.is_eos(ipid) {
                host.set_eos(opid);
                return Ok(ProcessOutcome::EndOfStream);
            }
            return Ok(ProcessOutcome::Pending);
        };

        let prev_w = self.width;
        let prev_h = self.height;
        let requested = self.ofmt.unwrap_or(PixelFormat::Rgb);

        // probe phase: learn dimensions, native format and required size
        let info = match self.backend.probe(&pck.data) {
            Ok(info) => info,
            Err(e) => {
                host.drop_packet(ipid);
                return Err(e);
            }
        };
        self.width = info.width;
        self.height = info.height;
        self.pixel_format = Some(info.native_format);
        let native = info.native_format;

        if prev_w != self.width || prev_h != self.height {
            let out = host.port_props_mut(opid);
            out.width = Some(self.width);
            out.height = Some(self.height);
            log::debug!("{}: frame size now {}x{}", self.name, self.width, self.height);
        }

        let mut out_size = info.required_size;
        let need_conversion = self.pixel_format != Some(requested);
        if need_conversion {
            self.in_bpp = native.bytes_per_pixel();
            self.out_bpp = requested.bytes_per_pixel();

            out_size = self.out_bpp as usize * self.width as usize * self.height as usize;

            let out = host.port_props_mut(opid);
            out.stride = Some(self.out_bpp * self.width);
            log::debug!(
                "{}: converting {:?} -> {:?}",
                self.name,
                info.native_format,
                requested
            );
        }

        let mut dst = host.new_packet(opid, out_size)?;

        // fill phase
        let filled = if need_conversion {
            let in_size = self.in_bpp as usize * self.width as usize * self.height as usize;
            let mut scratch = vec![0u8; in_size];
            self.backend.fill(&pck.data, &mut scratch).and_then(|_| {
                convert(
                    &mut dst.data,
                    requested,
                    &scratch,
                    native,
                    self.width as usize * self.height as usize,
                )
            })
        } else {
            self.backend.fill(&pck.data, &mut dst.data)
        };

        match filled {
            Ok(()) => {
                dst.props.merge_from(&pck.props);
                dst.props.dependency_flags = 0;
                host.send_packet(opid, dst.freeze());
            }
            Err(e @ FilterError::NotSupported { .. }) => {
                // unsupported conversion pair: fail loudly, emit nothing
                host.drop_packet(ipid);
                return Err(e);
            }
            Err(e) => {
                // broken frame: discard the output packet, keep the stream going
                log::warn!("{}: decode failed: {}", self.name, e);
                drop(dst);
            }
        }
        host.drop_packet(ipid);
        Ok(ProcessOutcome::Progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::FrameInfo;
    use crate::filter::FilterEvent;
    use crate::host::MemoryHost;
    use crate::props::PortProps;

    use std::cell::Cell;
    use std::rc::Rc;

    /// Fake decode primitive driven by the packet bytes themselves:
    /// `[width, height, format_tag, fail_fill]`, where format_tag is
    /// 0 = greyscale, 1 = RGB, 2 = RGBA. Fills sequential bytes.
    struct FakeBackend {
        fill_calls: Rc<Cell<usize>>,
    }

    impl FakeBackend {
        fn new() -> Self {
            Self {
                fill_calls: Rc::new(Cell::new(0)),
            }
        }

        fn parse(data: &[u8]) -> Result<FrameInfo, FilterError> {
            if data.len() < 4 {
                return Err(FilterError::Decode("short frame".into()));
            }
            let native_format = match data[2] {
                0 => PixelFormat::Greyscale,
                1 => PixelFormat::Rgb,
                2 => PixelFormat::Rgba,
                _ => return Err(FilterError::Decode("bad format tag".into())),
            };
            let (width, height) = (data[0] as u32, data[1] as u32);
            Ok(FrameInfo {
                width,
                height,
                native_format,
                required_size: native_format.buffer_size(width, height),
            })
        }
    }

    impl FrameDecoder for FakeBackend {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn probe(&mut self, data: &[u8]) -> Result<FrameInfo, FilterError> {
            Self::parse(data)
        }

        fn fill(&mut self, data: &[u8], out: &mut [u8]) -> Result<(), FilterError> {
            self.fill_calls.set(self.fill_calls.get() + 1);
            let info = Self::parse(data)?;
            if data[3] != 0 {
                return Err(FilterError::Decode("corrupt frame".into()));
            }
            if out.len() != info.required_size {
                return Err(FilterError::Decode("output buffer size mismatch".into()));
            }
            for (i, byte) in out.iter_mut().enumerate() {
                *byte = i as u8;
            }
            Ok(())
        }
    }

    fn frame(width: u8, height: u8, format_tag: u8) -> Vec<u8> {
        vec![width, height, format_tag, 0]
    }

    fn visual_png_props() -> PortProps {
        let mut props = PortProps::default();
        props.stream_type = Some(StreamType::Visual);
        props.codec_id = Some(CodecId::Png);
        props
    }

    fn connected() -> (MemoryHost, PngDec, PortId, PortId) {
        let (host, dec, src, opid, _) = connected_counting();
        (host, dec, src, opid)
    }

    fn connected_counting() -> (MemoryHost, PngDec, PortId, PortId, Rc<Cell<usize>>) {
        let mut host = MemoryHost::new();
        let src = host.add_source_port("frames", visual_png_props());
        let backend = FakeBackend::new();
        let fill_calls = backend.fill_calls.clone();
        let mut dec = PngDec::with_backend(Box::new(backend));
        dec.configure(&mut host, src, false).unwrap();
        let opid = host.port_id(1);
        (host, dec, src, opid, fill_calls)
    }

    #[test]
    fn configure_publishes_raw_output() {
        let (host, dec, _src, opid) = connected();
        let props = host.port_props(opid);
        assert_eq!(props.codec_id, Some(CodecId::Raw));
        assert_eq!(props.pixel_format, Some(PixelFormat::Rgb));
        assert_eq!(dec.name(), "pngdec:fake");
    }

    #[test]
    fn configure_rejects_unframed_or_foreign_input() {
        let mut host = MemoryHost::new();
        let mut props = visual_png_props();
        props.unframed = true;
        let src = host.add_source_port("raw-bytes", props);
        let mut dec = PngDec::with_backend(Box::new(FakeBackend::new()));
        assert!(matches!(
            dec.configure(&mut host, src, false),
            Err(FilterError::UnsupportedFormat)
        ));

        let src = host.add_source_port("nocodec", {
            let mut p = PortProps::default();
            p.stream_type = Some(StreamType::Visual);
            p
        });
        assert!(matches!(
            dec.configure(&mut host, src, false),
            Err(FilterError::UnsupportedFormat)
        ));
    }

    #[test]
    fn native_equals_requested_skips_conversion() {
        let (mut host, mut dec, src, opid, fill_calls) = connected_counting();
        host.push_bytes(src, frame(4, 2, 1)); // native RGB, requested RGB

        assert_eq!(dec.process(&mut host).unwrap(), ProcessOutcome::Progress);
        let sent = host.drain(opid);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].data.len(), 24); // 3 * 4 * 2
        // decoded straight into the output packet, single fill, no stride
        assert_eq!(fill_calls.get(), 1);
        assert_eq!(host.port_props(opid).stride, None);
        assert_eq!(host.queued(src), 0);
    }

    #[test]
    fn conversion_mode_emits_requested_layout() {
        let (mut host, mut dec, src, opid) = connected();
        dec.reconfigure_output(&mut host, opid, PixelFormat::Rgba)
            .unwrap();
        host.push_bytes(src, frame(4, 2, 1)); // native RGB, requested RGBA

        dec.process(&mut host).unwrap();
        let props = host.port_props(opid);
        assert_eq!(props.width, Some(4));
        assert_eq!(props.height, Some(2));
        assert_eq!(props.stride, Some(16)); // 4 bpp * 4 px

        let sent = host.drain(opid);
        assert_eq!(sent[0].data.len(), 32); // 4 * 4 * 2
        for px in sent[0].data.chunks_exact(4) {
            assert_eq!(px[3], 255);
        }
        // first three bytes of pixel 0 are the fake's sequential pattern
        assert_eq!(&sent[0].data[..3], &[0, 1, 2]);
    }

    #[test]
    fn rgba_native_down_to_rgb() {
        let (mut host, mut dec, src, opid) = connected();
        host.push_bytes(src, frame(2, 2, 2)); // native RGBA, requested RGB

        dec.process(&mut host).unwrap();
        let sent = host.drain(opid);
        assert_eq!(sent[0].data.len(), 12);
        // alpha bytes (3, 7, 11, 15) dropped from the sequential pattern
        assert_eq!(&sent[0].data[..], &[0, 1, 2, 4, 5, 6, 8, 9, 10, 12, 13, 14]);
    }

    #[test]
    fn greyscale_conversion_fails_loudly() {
        let (mut host, mut dec, src, opid) = connected();
        host.push_bytes(src, frame(4, 4, 0)); // native greyscale, requested RGB

        let err = dec.process(&mut host).unwrap_err();
        assert!(matches!(err, FilterError::NotSupported { .. }));
        assert_eq!(host.queued(src), 0); // input still released
        assert_eq!(host.drain(opid).len(), 0); // nothing emitted
    }

    #[test]
    fn probe_failure_propagates_and_releases_input() {
        let (mut host, mut dec, src, opid) = connected();
        host.push_bytes(src, &b"x"[..]);

        let err = dec.process(&mut host).unwrap_err();
        assert!(matches!(err, FilterError::Decode(_)));
        assert_eq!(host.queued(src), 0);
        assert_eq!(host.drain(opid).len(), 0);
    }

    #[test]
    fn fill_failure_discards_output_but_continues() {
        let (mut host, mut dec, src, opid) = connected();
        host.push_bytes(src, vec![4, 2, 1, 0xFF]); // fill will fail

        assert_eq!(dec.process(&mut host).unwrap(), ProcessOutcome::Progress);
        assert_eq!(host.drain(opid).len(), 0);
        assert_eq!(host.queued(src), 0);

        // next frame decodes fine
        host.push_bytes(src, frame(4, 2, 1));
        dec.process(&mut host).unwrap();
        assert_eq!(host.drain(opid).len(), 1);
    }

    #[test]
    fn size_change_republishes_dimensions() {
        let (mut host, mut dec, src, opid) = connected();
        host.push_bytes(src, frame(4, 2, 1));
        dec.process(&mut host).unwrap();
        assert_eq!(host.port_props(opid).width, Some(4));

        host.push_bytes(src, frame(8, 5, 1));
        dec.process(&mut host).unwrap();
        let props = host.port_props(opid);
        assert_eq!(props.width, Some(8));
        assert_eq!(props.height, Some(5));

        let sent = host.drain(opid);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].data.len(), 24);
        assert_eq!(sent[1].data.len(), 120);
    }

    #[test]
    fn allocation_failure_leaves_input_queued() {
        let mut host = MemoryHost::new().with_alloc_limit(8);
        let src = host.add_source_port("frames", visual_png_props());
        let mut dec = PngDec::with_backend(Box::new(FakeBackend::new()));
        dec.configure(&mut host, src, false).unwrap();
        host.push_bytes(src, frame(4, 2, 1));

        let err = dec.process(&mut host).unwrap_err();
        assert!(matches!(err, FilterError::Oom));
        // the packet can be retried on a later turn
        assert_eq!(host.queued(src), 1);
    }

    #[test]
    fn reconfigure_on_foreign_port_is_rejected() {
        let (mut host, mut dec, src, _opid) = connected();
        let err = dec
            .reconfigure_output(&mut host, src, PixelFormat::Rgba)
            .unwrap_err();
        assert!(matches!(err, FilterError::BadParameter));
    }

    #[test]
    fn eos_propagates() {
        let (mut host, mut dec, src, opid) = connected();
        host.finish(src);
        assert_eq!(dec.process(&mut host).unwrap(), ProcessOutcome::EndOfStream);
        assert!(host.is_eos(opid));
    }

    #[test]
    fn removal_tears_down_output_port() {
        let (mut host, mut dec, src, opid) = connected();
        dec.configure(&mut host, src, true).unwrap();
        assert!(host.port_removed(opid));
        assert_eq!(dec.process(&mut host).unwrap(), ProcessOutcome::Pending);
    }

    #[test]
    fn packet_timing_is_merged_and_dependencies_cleared() {
        let (mut host, mut dec, src, opid) = connected();
        let mut pck = crate::packet::FramePacket::new(frame(2, 1, 1).into());
        pck.props.cts = Some(1234);
        pck.props.sap = true;
        pck.props.duration = 40;
        pck.props.dependency_flags = 0b10;
        host.push_packet(src, pck);

        dec.process(&mut host).unwrap();
        let sent = host.drain(opid);
        assert_eq!(sent[0].props.cts, Some(1234));
        assert!(sent[0].props.sap);
        assert_eq!(sent[0].props.duration, 40);
        assert_eq!(sent[0].props.dependency_flags, 0);
    }

    #[test]
    fn ignores_events_by_default() {
        let (mut host, mut dec, src, _opid) = connected();
        assert!(dec.on_event(&mut host, src, &FilterEvent::Play));
    }
}
