use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use lopdf::Document;

/// Save options handed to the PDF serializer on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    pub use_object_streams: bool,
    pub add_default_page: bool,
    pub objects_per_tick: u32,
    pub update_field_appearances: bool,
}

impl SaveOptions {
    pub fn new(use_object_streams: bool) -> Self {
        Self {
            use_object_streams,
            add_default_page: false,
            objects_per_tick: 50,
            update_field_appearances: false,
        }
    }

    /// Options for a probe at `quality`: object streams below `threshold`.
    pub fn for_quality(quality: f64, threshold: f64) -> Self {
        Self::new(quality < threshold)
    }
}

/// Fixed presets for the level mode, no search involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    High,
    #[default]
    Medium,
    Low,
}

impl CompressionLevel {
    pub fn save_options(self) -> SaveOptions {
        match self {
            CompressionLevel::High => SaveOptions::new(true),
            CompressionLevel::Medium => SaveOptions::new(true),
            CompressionLevel::Low => SaveOptions::new(false),
        }
    }
}

impl FromStr for CompressionLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(CompressionLevel::High),
            "medium" => Ok(CompressionLevel::Medium),
            "low" => Ok(CompressionLevel::Low),
            other => Err(anyhow!("unknown compression level '{}'", other)),
        }
    }
}

/// Loads a PDF once and re-serializes it with different options.
pub trait PdfSerializer: Send + Sync {
    type Document: Send;

    fn load(&self, bytes: &[u8]) -> Result<Self::Document>;

    fn serialize(&self, document: &Self::Document, options: &SaveOptions) -> Result<Vec<u8>>;
}

/// `lopdf` backed serializer.
///
/// lopdf writes synchronously, so `objects_per_tick` has no effect here, and
/// it never synthesizes pages or form appearances: `add_default_page` and
/// `update_field_appearances` only matter to serializers that do.
#[derive(Debug, Clone, Default)]
pub struct LopdfSerializer;

impl PdfSerializer for LopdfSerializer {
    type Document = Document;

    fn load(&self, bytes: &[u8]) -> Result<Document> {
        let mut doc =
            Document::load_from(std::io::Cursor::new(bytes)).context("Failed to load PDF")?;

        if doc.is_encrypted() {
            log::debug!("PDF is encrypted, attempting empty password");
            if let Err(e) = doc.decrypt(b"") {
                log::warn!("Failed to decrypt with empty password: {:?}", e);
            }
        }

        Ok(doc)
    }

    fn serialize(&self, document: &Document, options: &SaveOptions) -> Result<Vec<u8>> {
        let mut doc = document.clone();
        log::debug!(
            "lopdf ignores add_default_page={} objects_per_tick={} update_field_appearances={}",
            options.add_default_page,
            options.objects_per_tick,
            options.update_field_appearances
        );

        if options.use_object_streams {
            let pruned = doc.prune_objects();
            let emptied = doc.delete_zero_length_streams();
            doc.compress();
            log::trace!(
                "high compression: pruned {} objects, dropped {} empty streams",
                pruned.len(),
                emptied.len()
            );
        }

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).context("Failed to save PDF")?;
        Ok(buffer)
    }
}
