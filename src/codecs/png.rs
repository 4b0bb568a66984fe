//! PNG decode backend using the `png` crate.

use std::io::Cursor;

use crate::codecs::{FrameDecoder, FrameInfo};
use crate::error::FilterError;
use crate::pixel::PixelFormat;

/// Adapter exposing the `png` crate through the two-phase decode contract.
///
/// Interlaced, paletted and sub-8-bit images are expanded to 8-bit
/// grayscale/RGB/RGBA; grayscale+alpha decodes are widened to RGBA since
/// no 2-byte layout exists downstream.
#[derive(Debug, Default)]
pub struct PngBackend;

impl PngBackend {
    pub fn new() -> Self {
        Self
    }
}

type PngReader<'a> = png::Reader<Cursor<&'a [u8]>>;

fn reader_for(data: &[u8]) -> Result<PngReader<'_>, FilterError> {
    let mut decoder = png::Decoder::new(Cursor::new(data));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    decoder.read_info().map_err(FilterError::from_decode)
}

/// Native layout of the expanded output, as the pipeline will see it.
fn output_format(reader: &PngReader<'_>) -> Result<PixelFormat, FilterError> {
    let (color, _depth) = reader.output_color_type();
    match color {
        png::ColorType::Grayscale => Ok(PixelFormat::Greyscale),
        png::ColorType::Rgb => Ok(PixelFormat::Rgb),
        // GA is widened to RGBA during fill
        png::ColorType::GrayscaleAlpha | png::ColorType::Rgba => Ok(PixelFormat::Rgba),
        png::ColorType::Indexed => {
            // cannot happen with EXPAND set, but don't emit palette indices
            Err(FilterError::Decode("palette output not expanded".into()))
        }
    }
}

fn frame_info(reader: &PngReader<'_>) -> Result<FrameInfo, FilterError> {
    let info = reader.info();
    let (width, height) = (info.width, info.height);
    let native_format = output_format(reader)?;
    Ok(FrameInfo {
        width,
        height,
        native_format,
        required_size: native_format.buffer_size(width, height),
    })
}

impl FrameDecoder for PngBackend {
    fn name(&self) -> &'static str {
        "libpng"
    }

    fn probe(&mut self, data: &[u8]) -> Result<FrameInfo, FilterError> {
        let reader = reader_for(data)?;
        frame_info(&reader)
    }

    fn fill(&mut self, data: &[u8], out: &mut [u8]) -> Result<(), FilterError> {
        let mut reader = reader_for(data)?;
        let info = frame_info(&reader)?;
        if out.len() != info.required_size {
            return Err(FilterError::Decode("output buffer size mismatch".into()));
        }

        let buffer_size = reader
            .output_buffer_size()
            .ok_or_else(|| FilterError::Decode("cannot determine output buffer size".into()))?;

        let (color, _depth) = reader.output_color_type();
        if color == png::ColorType::GrayscaleAlpha {
            let mut ga = vec![0u8; buffer_size];
            reader.next_frame(&mut ga).map_err(FilterError::from_decode)?;
            for (src, dst) in ga.chunks_exact(2).zip(out.chunks_exact_mut(4)) {
                dst[0] = src[0];
                dst[1] = src[0];
                dst[2] = src[0];
                dst[3] = src[1];
            }
        } else {
            if buffer_size != out.len() {
                return Err(FilterError::Decode("output buffer size mismatch".into()));
            }
            reader.next_frame(out).map_err(FilterError::from_decode)?;
        }
        Ok(())
    }
}
