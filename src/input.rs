//! Reading user-selected image files into payloads.

use std::io::Cursor;
use std::path::Path;

use tracing::debug;

use crate::error::TryOnError;
use crate::mime::{self, MimeSniffer};
use crate::ports::ImagePayload;

/// Read an image file, labelling it with the sniffed MIME type.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read, or
/// [`TryOnError::InputPrecondition`] if it is empty.
pub fn load_image(path: &Path, sniffer: &dyn MimeSniffer) -> Result<ImagePayload, TryOnError> {
    let data = std::fs::read(path).map_err(|e| {
        std::io::Error::new(e.kind(), format!("Failed to read {}: {e}", path.display()))
    })?;
    if data.is_empty() {
        return Err(TryOnError::InputPrecondition(format!("{} is empty", path.display())));
    }
    let mime_type = sniffer.sniff(&data);
    debug!(path = %path.display(), bytes = data.len(), mime_type, "loaded image");
    Ok(ImagePayload::new(data, mime_type))
}

/// Read an image to refine, re-encoding it as PNG if it is not one already.
///
/// Refinement requests always label the source as PNG.
///
/// # Errors
///
/// Same as [`load_image`], plus [`TryOnError::ImageConversion`] if a
/// non-PNG file cannot be decoded.
pub fn load_refinement_source(
    path: &Path,
    sniffer: &dyn MimeSniffer,
) -> Result<ImagePayload, TryOnError> {
    let image = load_image(path, sniffer)?;
    if image.mime_type == mime::PNG {
        return Ok(image);
    }
    debug!(from = %image.mime_type, "re-encoding refinement source as PNG");
    ensure_png(&image)
}

fn ensure_png(image: &ImagePayload) -> Result<ImagePayload, TryOnError> {
    let decoded = image::load_from_memory(&image.data)
        .map_err(|e| TryOnError::ImageConversion(format!("Failed to decode image: {e}")))?;
    let mut buf = Cursor::new(Vec::new());
    decoded
        .write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| TryOnError::ImageConversion(format!("Failed to encode PNG: {e}")))?;
    Ok(ImagePayload::new(buf.into_inner(), mime::PNG))
}
