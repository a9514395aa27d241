//! Drives an image encoder or a PDF serializer toward a target output size.

pub mod batch;
pub mod encoder;
pub mod error;
pub mod image_search;
pub mod pdf_search;
pub mod policy;
pub mod report;
pub mod request;
pub mod search;
pub mod serializer;
pub mod wasm;

pub use batch::{BatchError, BatchItem, BatchResult, CompressionOutcome};
pub use encoder::{EncodeOptions, ImageEncoder, JpegEncoderAdapter};
pub use error::{CompressError, Result};
pub use image_search::{compress_image_auto, search_image_quality, search_image_quality_with};
pub use pdf_search::{compress_pdf_with_level, search_pdf_quality, search_pdf_quality_with};
pub use policy::{ImageSearchPolicy, PdfSearchPolicy, RefinementPolicy};
pub use request::{CompressionRequest, Dimensions, TrialResult};
pub use search::{absolute_error, relative_error, SearchState};
pub use serializer::{CompressionLevel, LopdfSerializer, PdfSerializer, SaveOptions};
