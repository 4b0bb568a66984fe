//! Raw pixel format identifiers and byte-layout facts.

/// Byte layout of a decoded image buffer.
///
/// The depth variants are selected through the `pngd`/`pngds` file
/// extensions on the reframer input and describe RGB images whose alpha
/// channel carries auxiliary data instead of opacity.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Single luminance byte per pixel.
    Greyscale,
    /// 3 bytes per pixel, R G B.
    Rgb,
    /// 4 bytes per pixel, R G B A.
    Rgba,
    /// RGB + depth map in the 4th byte.
    Rgbd,
    /// RGB + 7-bit depth + shape bit (MSB of the 4th byte).
    Rgbds,
}

impl PixelFormat {
    /// Bytes per pixel for this layout.
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Greyscale => 1,
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba | PixelFormat::Rgbd | PixelFormat::Rgbds => 4,
        }
    }

    /// Total buffer size in bytes for `width x height` pixels.
    pub fn buffer_size(self, width: u32, height: u32) -> usize {
        self.bytes_per_pixel() as usize * width as usize * height as usize
    }
}
