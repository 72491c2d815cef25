//! Best-effort image MIME detection from leading bytes.
//!
//! This only looks at file signatures. It does not validate that the rest of
//! the data is a well-formed image, and anything unrecognized is reported as
//! JPEG.

/// MIME type for JPEG images.
pub const JPEG: &str = "image/jpeg";
/// MIME type for PNG images.
pub const PNG: &str = "image/png";
/// MIME type for WebP images.
pub const WEBP: &str = "image/webp";

const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Classifies image bytes into a MIME type.
pub trait MimeSniffer: Send + Sync {
    /// Return the MIME type for `data`. Must always produce an answer.
    fn sniff(&self, data: &[u8]) -> &'static str;
}

/// Magic-number sniffer for JPEG, PNG and WebP, defaulting to JPEG.
#[derive(Debug, Default, Clone, Copy)]
pub struct SignatureSniffer;

impl MimeSniffer for SignatureSniffer {
    fn sniff(&self, data: &[u8]) -> &'static str {
        recognize(data).unwrap_or(JPEG)
    }
}

/// Match `data` against the known signatures.
fn recognize(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(PNG_SIGNATURE) {
        Some(PNG)
    } else if data.starts_with(JPEG_SIGNATURE) {
        Some(JPEG)
    } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some(WEBP)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpeg_signature() {
        assert_eq!(SignatureSniffer.sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]), JPEG);
    }

    #[test]
    fn png_signature() {
        let data = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00];
        assert_eq!(SignatureSniffer.sniff(&data), PNG);
    }

    #[test]
    fn webp_signature() {
        let mut data = b"RIFF".to_vec();
        data.extend_from_slice(&[0x24, 0x00, 0x00, 0x00]);
        data.extend_from_slice(b"WEBPVP8 ");
        assert_eq!(SignatureSniffer.sniff(&data), WEBP);
    }

    #[test]
    fn riff_without_webp_tag_is_not_webp() {
        let data = b"RIFF\0\0\0\0WAVEfmt ";
        assert_eq!(SignatureSniffer.sniff(data), JPEG);
    }

    #[test]
    fn unknown_defaults_to_jpeg() {
        assert!(recognize(b"GIF89a").is_none());
        assert_eq!(SignatureSniffer.sniff(b"GIF89a"), JPEG);
        assert_eq!(SignatureSniffer.sniff(&[]), JPEG);
    }

    #[test]
    fn truncated_png_signature_is_not_png() {
        assert_eq!(SignatureSniffer.sniff(&[0x89, 0x50, 0x4E]), JPEG);
    }
}
