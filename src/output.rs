//! File naming, image saving, and format conversion.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};

use crate::error::TryOnError;
use crate::params::OutputFormat;
use crate::ports::ImagePayload;

/// Generate an output filename from a label and format.
///
/// Sanitizes the first 50 characters of the label to kebab-case,
/// appends a unix timestamp, and adds the appropriate file extension.
#[must_use]
pub fn auto_filename(label: &str, format: OutputFormat) -> String {
    let sanitized = sanitize_for_filename(label, 50);
    let timestamp = chrono::Utc::now().timestamp();
    format!("{sanitized}-{timestamp}.{}", format.extension())
}

/// Sanitize a string for use in a filename.
///
/// Lowercases, turns runs of non-alphanumeric characters into a single
/// hyphen, and trims to `max_len`. Falls back to `"try-on"`.
#[must_use]
pub fn sanitize_for_filename(input: &str, max_len: usize) -> String {
    let mut result = String::with_capacity(max_len);
    let mut pending_hyphen = false;

    for ch in input.chars() {
        if result.len() >= max_len {
            break;
        }
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !result.is_empty() {
                if result.len() + 2 > max_len {
                    break;
                }
                result.push('-');
            }
            pending_hyphen = false;
            result.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if result.is_empty() {
        "try-on".to_string()
    } else {
        result
    }
}

/// Resolve the output path: use explicit path or auto-generate.
#[must_use]
pub fn resolve_output_path(explicit: Option<&str>, label: &str, format: OutputFormat) -> PathBuf {
    match explicit {
        Some(p) => PathBuf::from(p),
        None => PathBuf::from(auto_filename(label, format)),
    }
}

/// Save an image, converting it to `format` if its MIME type differs.
///
/// # Errors
///
/// Returns an error if the file cannot be written or conversion fails.
pub fn save_image(
    image: &ImagePayload,
    format: OutputFormat,
    output_path: &Path,
) -> Result<(), TryOnError> {
    if image.mime_type == format.mime_type() {
        std::fs::write(output_path, &image.data).map_err(TryOnError::Io)
    } else {
        let mut decoded = image::load_from_memory(&image.data)
            .map_err(|e| TryOnError::ImageConversion(format!("Failed to decode image: {e}")))?;
        // JPEG has no alpha channel.
        if format == OutputFormat::Jpeg {
            decoded = DynamicImage::ImageRgb8(decoded.to_rgb8());
        }
        decoded
            .save_with_format(output_path, format.image_format())
            .map_err(|e| TryOnError::ImageConversion(format!("Failed to save as {format}: {e}")))
    }
}

/// Path for the before/after image that accompanies `output`:
/// `look.png` becomes `look-compare.png`.
#[must_use]
pub fn compare_path(output: &Path, format: OutputFormat) -> PathBuf {
    let stem = output.file_stem().map_or_else(|| "try-on".into(), |s| s.to_string_lossy());
    output.with_file_name(format!("{stem}-compare.{}", format.extension()))
}

/// Place `before` and `after` side by side on one canvas.
///
/// `before` is scaled to the height of `after`, keeping its aspect ratio.
///
/// # Errors
///
/// Returns [`TryOnError::ImageConversion`] if either image cannot be decoded.
pub fn side_by_side(
    before: &ImagePayload,
    after: &ImagePayload,
) -> Result<DynamicImage, TryOnError> {
    let decode = |payload: &ImagePayload, what: &str| {
        image::load_from_memory(&payload.data)
            .map_err(|e| TryOnError::ImageConversion(format!("Failed to decode {what} image: {e}")))
    };
    let before = decode(before, "before")?;
    let after = decode(after, "after")?;

    let height = after.height();
    let scaled_width = u64::from(before.width()) * u64::from(height) / u64::from(before.height().max(1));
    let scaled_width = u32::try_from(scaled_width.max(1))
        .map_err(|_| TryOnError::ImageConversion("Comparison image is too wide".into()))?;
    let before = before.resize_exact(scaled_width, height, FilterType::Triangle);

    let mut canvas =
        RgbaImage::from_pixel(scaled_width + after.width(), height, Rgba([255, 255, 255, 255]));
    imageops::overlay(&mut canvas, &before.to_rgba8(), 0, 0);
    imageops::overlay(&mut canvas, &after.to_rgba8(), i64::from(scaled_width), 0);
    Ok(DynamicImage::ImageRgba8(canvas))
}

/// Save a before/after comparison in `format`.
///
/// # Errors
///
/// Returns an error if either image cannot be decoded or the file cannot be
/// written.
pub fn save_comparison(
    before: &ImagePayload,
    after: &ImagePayload,
    format: OutputFormat,
    output_path: &Path,
) -> Result<(), TryOnError> {
    let mut canvas = side_by_side(before, after)?;
    if format == OutputFormat::Jpeg {
        canvas = DynamicImage::ImageRgb8(canvas.to_rgb8());
    }
    canvas
        .save_with_format(output_path, format.image_format())
        .map_err(|e| TryOnError::ImageConversion(format!("Failed to save comparison: {e}")))
}
