use std::io::Cursor;
use std::sync::Arc;

use image::ImageReader;

use crate::error::{CompressError, Result};

pub const BYTES_PER_KB: u64 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Longer side, used as the encoder's dimension cap.
    pub fn longest_side(&self) -> u32 {
        self.width.max(self.height)
    }

    /// Scales both sides by `factor`, rounding to the nearest pixel and never
    /// going below one pixel.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            width: scale_side(self.width, factor),
            height: scale_side(self.height, factor),
        }
    }
}

fn scale_side(side: u32, factor: f64) -> u32 {
    ((side as f64 * factor).round() as u32).max(1)
}

/// One asset and the size it should be squeezed into.
#[derive(Debug, Clone)]
pub struct CompressionRequest {
    pub source: Arc<[u8]>,
    pub target_size_bytes: u64,
    pub original_size_bytes: u64,
    /// Only known for images.
    pub original_dimensions: Option<Dimensions>,
}

impl CompressionRequest {
    /// Builds an image request, reading the pixel size from the header.
    pub fn image(bytes: impl Into<Arc<[u8]>>, target_kb: u64) -> Result<Self> {
        let source: Arc<[u8]> = bytes.into();
        let (width, height) = ImageReader::new(Cursor::new(&source[..]))
            .with_guessed_format()
            .map_err(|e| CompressError::AssetLoadFailed(e.to_string()))?
            .into_dimensions()
            .map_err(|e| CompressError::AssetLoadFailed(e.to_string()))?;

        Self::new(source, target_kb, Some(Dimensions::new(width, height)))
    }

    pub fn pdf(bytes: impl Into<Arc<[u8]>>, target_kb: u64) -> Result<Self> {
        Self::new(bytes.into(), target_kb, None)
    }

    pub fn new(
        source: Arc<[u8]>,
        target_kb: u64,
        original_dimensions: Option<Dimensions>,
    ) -> Result<Self> {
        let request = Self {
            original_size_bytes: source.len() as u64,
            source,
            target_size_bytes: target_kb_to_bytes(target_kb),
            original_dimensions,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_size_bytes == 0 {
            return Err(CompressError::InvalidRequest(
                "target size must be positive".into(),
            ));
        }
        if self.original_size_bytes == 0 {
            return Err(CompressError::InvalidRequest("source asset is empty".into()));
        }
        if let Some(dims) = self.original_dimensions {
            if dims.width == 0 || dims.height == 0 {
                return Err(CompressError::InvalidRequest(format!(
                    "image dimensions must be positive, got {}x{}",
                    dims.width, dims.height
                )));
            }
        }
        Ok(())
    }

    pub fn target_kb(&self) -> f64 {
        self.target_size_bytes as f64 / BYTES_PER_KB as f64
    }

    /// Target expressed the way the encoder budget wants it.
    pub fn target_mb(&self) -> f64 {
        self.target_kb() / 1024.0
    }
}

/// Kilobytes from the caller, clamped to at least 1 KB.
pub fn target_kb_to_bytes(target_kb: u64) -> u64 {
    target_kb.max(1).saturating_mul(BYTES_PER_KB)
}

/// Outcome of one probe, or of a whole search once it returns.
#[derive(Debug, Clone)]
pub struct TrialResult {
    pub quality_used: f64,
    /// Dimension cap that produced this output (images only).
    pub dimensions_used: Option<Dimensions>,
    pub output_bytes: Arc<[u8]>,
    pub output_size_bytes: u64,
    /// Bisection probes the search spent before returning.
    pub attempts_used: u32,
}

impl TrialResult {
    pub fn new(quality_used: f64, dimensions_used: Option<Dimensions>, bytes: Vec<u8>) -> Self {
        Self::from_shared(quality_used, dimensions_used, bytes.into())
    }

    pub fn from_shared(
        quality_used: f64,
        dimensions_used: Option<Dimensions>,
        output_bytes: Arc<[u8]>,
    ) -> Self {
        Self {
            quality_used,
            dimensions_used,
            output_size_bytes: output_bytes.len() as u64,
            output_bytes,
            attempts_used: 0,
        }
    }
}
