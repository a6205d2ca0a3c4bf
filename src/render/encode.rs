use std::io::Cursor;

use crate::foundation::error::{EaselError, EaselResult};
use crate::foundation::math::unpremultiply_in_place;

/// Encoding used when exporting surface or viewport pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Lossless PNG with alpha.
    #[default]
    Png,
    /// Lossy JPEG; transparent areas flatten onto black.
    Jpeg {
        /// Encoder quality, 1..=100.
        quality: u8,
    },
}

impl ExportFormat {
    /// JPEG with `quality` clamped to 1..=100.
    pub fn jpeg(quality: u8) -> Self {
        Self::Jpeg {
            quality: quality.clamp(1, 100),
        }
    }

    /// MIME type of the encoded bytes.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg { .. } => "image/jpeg",
        }
    }
}

/// Encode a premultiplied RGBA8 buffer of `width * height` pixels.
pub fn encode_premul_rgba8(
    data: &[u8],
    width: u32,
    height: u32,
    format: ExportFormat,
) -> EaselResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| EaselError::encode("export buffer size overflow"))?;
    if data.len() != expected_len {
        return Err(EaselError::malformed_buffer(format!(
            "export expects {expected_len} bytes for {width}x{height}, got {}",
            data.len()
        )));
    }
    if expected_len == 0 {
        return Err(EaselError::encode("cannot encode an empty image"));
    }

    let mut out = Vec::new();
    match format {
        ExportFormat::Png => {
            let mut straight = data.to_vec();
            unpremultiply_in_place(&mut straight);
            let img = image::RgbaImage::from_raw(width, height, straight)
                .ok_or_else(|| EaselError::encode("png buffer does not match dimensions"))?;
            image::DynamicImage::ImageRgba8(img)
                .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
                .map_err(|e| EaselError::encode(format!("png: {e}")))?;
        }
        ExportFormat::Jpeg { quality } => {
            // premultiplied color is already composited over black
            let rgb: Vec<u8> = data
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            let img = image::RgbImage::from_raw(width, height, rgb)
                .ok_or_else(|| EaselError::encode("jpeg buffer does not match dimensions"))?;
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
            image::DynamicImage::ImageRgb8(img)
                .write_with_encoder(encoder)
                .map_err(|e| EaselError::encode(format!("jpeg: {e}")))?;
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/render/encode.rs"]
mod tests;
