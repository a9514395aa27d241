use anyhow::{anyhow, Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView};

/// Parameters for one encode call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeOptions {
    /// `None` lets the encoder pick whatever quality fits the budget.
    pub quality: Option<f64>,
    /// Cap on the longer side; `None` keeps the source resolution.
    pub max_dimension: Option<u32>,
    pub size_budget_mb: f64,
}

/// Re-encodes an image at a given quality and dimension cap.
///
/// Implementations must be callable from several searches at once.
pub trait ImageEncoder: Send + Sync {
    fn encode(&self, asset: &[u8], options: &EncodeOptions) -> Result<Vec<u8>>;
}

impl<E: ImageEncoder + ?Sized> ImageEncoder for &E {
    fn encode(&self, asset: &[u8], options: &EncodeOptions) -> Result<Vec<u8>> {
        (**self).encode(asset, options)
    }
}

/// JPEG output through the `image` crate.
#[derive(Debug, Clone, Default)]
pub struct JpegEncoderAdapter;

const UNCONSTRAINED_START: f64 = 0.9;
const UNCONSTRAINED_STEP: f64 = 0.1;
const UNCONSTRAINED_FLOOR: f64 = 0.1;

impl JpegEncoderAdapter {
    fn encode_at(&self, img: &DynamicImage, quality: f64) -> Result<Vec<u8>> {
        let (w, h) = img.dimensions();
        let rgb = img.to_rgb8();
        let mut buffer = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality(quality));
        encoder
            .encode(&rgb, w, h, ColorType::Rgb8.into())
            .with_context(|| format!("JPEG encode failed at {}x{}", w, h))?;
        Ok(buffer)
    }
}

impl ImageEncoder for JpegEncoderAdapter {
    fn encode(&self, asset: &[u8], options: &EncodeOptions) -> Result<Vec<u8>> {
        let img = image::load_from_memory(asset).context("Failed to load image from memory")?;

        let img = match options.max_dimension {
            Some(0) => return Err(anyhow!("max dimension must be positive")),
            Some(max_dim) if img.width() > max_dim || img.height() > max_dim => {
                img.resize(max_dim, max_dim, FilterType::Lanczos3)
            }
            _ => img,
        };

        if let Some(quality) = options.quality {
            return self.encode_at(&img, quality);
        }

        // Unconstrained: walk quality down until the budget is met.
        let budget = (options.size_budget_mb * 1024.0 * 1024.0) as usize;
        let mut quality = UNCONSTRAINED_START;
        loop {
            let buffer = self.encode_at(&img, quality)?;
            if buffer.len() <= budget || quality - UNCONSTRAINED_STEP < UNCONSTRAINED_FLOOR - 1e-9 {
                return Ok(buffer);
            }
            quality -= UNCONSTRAINED_STEP;
        }
    }
}

/// Maps a [0, 1] quality onto the 1..=100 JPEG scale.
pub fn jpeg_quality(quality: f64) -> u8 {
    (quality.clamp(0.0, 1.0) * 100.0).round().clamp(1.0, 100.0) as u8
}
