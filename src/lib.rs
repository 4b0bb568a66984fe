//! # pngfilters
//!
//! PNG-specific stages of a streaming image pipeline: a **reframer** that
//! turns a raw byte stream into discrete, timed, self-describing frame
//! packets, and a **decoder** that turns each compressed frame into a raw
//! pixel buffer in the pipeline-requested layout, converting RGB<->RGBA on
//! the fly when needed.
//!
//! The hosting pipeline (port lifecycle, packet buffers, scheduling) is an
//! injected collaborator behind [`PipelineHost`]; [`MemoryHost`] is a
//! complete in-memory implementation for tests and standalone use.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pngfilters::{Filter, MemoryHost, PngDec, PngReframer, PortProps, StreamType};
//!
//! let mut host = MemoryHost::new();
//! let mut props = PortProps::default();
//! props.stream_type = Some(StreamType::File);
//! props.file_ext = Some("png".into());
//! let file_port = host.add_source_port("file", props);
//!
//! let png_bytes: Vec<u8> = vec![]; // your PNG file
//! host.push_bytes(file_port, png_bytes);
//!
//! let mut reframer = PngReframer::new();
//! reframer.configure(&mut host, file_port, false)?;
//! reframer.process(&mut host)?;
//!
//! let frame_port = host.port_id(1);
//! let mut decoder = PngDec::new();
//! decoder.configure(&mut host, frame_port, false)?;
//! decoder.process(&mut host)?;
//! # Ok::<(), pngfilters::FilterError>(())
//! ```

#![forbid(unsafe_code)]

pub mod codecs;
pub mod convert;
mod decoder;
mod error;
pub mod format;
mod filter;
mod host;
mod packet;
mod pixel;
mod props;
mod reframer;

pub use codecs::{FrameDecoder, FrameInfo};
pub use decoder::PngDec;
pub use error::FilterError;
pub use filter::{Capabilities, Filter, FilterEvent, PortCaps, ProcessOutcome};
pub use format::{probe_data, CodecId, ParsedHeader, ProbeScore};
pub use host::{MemoryHost, PipelineHost, PortDirection, PortId};
pub use packet::{FramePacket, PacketBuf};
pub use pixel::PixelFormat;
pub use props::{Fraction, PacketProps, PlaybackMode, PortProps, StreamType};
pub use reframer::PngReframer;
