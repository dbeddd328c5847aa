use crate::Transform;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use tracing::instrument;

const DEFAULT_QUALITY: u8 = 95;

/// Resizes with the `image` crate and always outputs JPEG.
#[derive(Clone, Copy, Debug)]
pub struct ImageResizer {
    quality: u8,
}

impl Default for ImageResizer {
    fn default() -> Self {
        Self { quality: DEFAULT_QUALITY }
    }
}

impl ImageResizer {
    /// JPEG quality, clamped to `1..=100`.
    pub fn with_quality(quality: u8) -> Self {
        Self { quality: quality.clamp(1, 100) }
    }
}

impl Transform for ImageResizer {
    #[instrument(skip(self, data), fields(input_size = data.len(), output_size))]
    fn resize(&self, data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        if width == 0 || height == 0 {
            exn::bail!(ErrorKind::InvalidDimensions { width, height });
        }
        let source = image::load_from_memory(data).or_raise(|| ErrorKind::Decode)?;
        let resized = source.resize_to_fill(width, height, FilterType::CatmullRom).to_rgb8();

        let mut output = Vec::new();
        JpegEncoder::new_with_quality(&mut output, self.quality)
            .encode_image(&resized)
            .or_raise(|| ErrorKind::Encode)?;
        tracing::Span::current().record("output_size", output.len());
        Ok(output)
    }
}
