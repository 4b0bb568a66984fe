//! Codec identification: content probing and header parsing.

use bytes::Bytes;

/// PNG file signature.
const PNG_SIG: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Codec carried by a stream port.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CodecId {
    Png,
    /// Raw (decoded) pixels.
    Raw,
}

impl CodecId {
    /// MIME type string, if the codec maps to one.
    pub fn mime_type(self) -> Option<&'static str> {
        match self {
            CodecId::Png => Some("image/png"),
            CodecId::Raw => None,
        }
    }

    /// File extensions recognized for this codec.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            CodecId::Png => &["png", "pngd", "pngds"],
            CodecId::Raw => &[],
        }
    }
}

/// Confidence of a content probe match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProbeScore {
    /// Matched on file extension only.
    ExtMatch,
    /// Content might be this format.
    MaybeSupported,
    /// Content signature matched.
    Supported,
}

/// Sniff the first bytes of an unknown stream.
///
/// Returns a positive match with MIME `image/png` iff the first three
/// bytes equal the fixed PNG signature prefix (0x89 0x50 0x4E). Cheap and
/// non-destructive; used by the host to pick a reframer.
pub fn probe_data(data: &[u8]) -> Option<(ProbeScore, &'static str)> {
    if data.len() >= 3 && data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E {
        return Some((ProbeScore::Supported, "image/png"));
    }
    None
}

/// Header fields extracted from the first packet of a stream.
#[derive(Clone, Debug)]
pub struct ParsedHeader {
    pub codec_id: CodecId,
    pub width: u32,
    pub height: u32,
    /// Opaque decoder configuration bytes, when the format carries any.
    /// PNG carries none; everything a decoder needs is in-band.
    pub decoder_config: Option<Bytes>,
}

/// Parse a PNG signature + IHDR from the start of `data`.
///
/// Returns `None` when the bytes are not a PNG header; the caller falls
/// back to file-extension hints.
pub fn parse_header(data: &[u8]) -> Option<ParsedHeader> {
    // signature (8) + IHDR length/type (8) + width/height (8)
    if data.len() < 24 {
        return None;
    }
    if data[..8] != PNG_SIG {
        return None;
    }
    if &data[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
    let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
    Some(ParsedHeader {
        codec_id: CodecId::Png,
        width,
        height,
        decoder_config: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut data = PNG_SIG.to_vec();
        data.extend_from_slice(&13u32.to_be_bytes());
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data
    }

    #[test]
    fn probe_png() {
        let data = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(probe_data(&data), Some((ProbeScore::Supported, "image/png")));
    }

    #[test]
    fn probe_prefix_only_is_enough() {
        // only the first three bytes are consulted
        assert!(probe_data(&[0x89, 0x50, 0x4E]).is_some());
    }

    #[test]
    fn probe_rejects_other_content() {
        assert_eq!(probe_data(b"GIF89a"), None);
        assert_eq!(probe_data(&[0x89, 0x50]), None);
        assert_eq!(probe_data(&[]), None);
    }

    #[test]
    fn parse_valid_header() {
        let data = header_bytes(640, 480);
        let header = parse_header(&data).unwrap();
        assert_eq!(header.codec_id, CodecId::Png);
        assert_eq!(header.width, 640);
        assert_eq!(header.height, 480);
        assert!(header.decoder_config.is_none());
    }

    #[test]
    fn parse_rejects_truncated() {
        let data = header_bytes(640, 480);
        assert!(parse_header(&data[..20]).is_none());
    }

    #[test]
    fn parse_rejects_bad_signature() {
        let mut data = header_bytes(640, 480);
        data[0] = 0x88;
        assert!(parse_header(&data).is_none());
    }

    #[test]
    fn parse_rejects_missing_ihdr() {
        let mut data = header_bytes(640, 480);
        data[12..16].copy_from_slice(b"IDAT");
        assert!(parse_header(&data).is_none());
    }

    #[test]
    fn png_extensions() {
        assert!(CodecId::Png.extensions().contains(&"pngd"));
        assert_eq!(CodecId::Png.mime_type(), Some("image/png"));
    }
}
