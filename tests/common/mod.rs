#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use asset_compressor_rust::{EncodeOptions, ImageEncoder, PdfSerializer, SaveOptions};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lopdf::dictionary;
use lopdf::{Document, Object, Stream};

pub const KB: usize = 1024;

/// Encoder whose output size follows `full_size * quality * (cap / side)^2`.
pub struct ModelEncoder {
    pub longest_side: u32,
    pub full_size: f64,
    /// Assets starting with this byte fail every encode.
    pub poison: Option<u8>,
    pub calls: Mutex<Vec<EncodeOptions>>,
}

impl ModelEncoder {
    pub fn new(longest_side: u32, full_size: usize) -> Self {
        Self {
            longest_side,
            full_size: full_size as f64,
            poison: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<EncodeOptions> {
        self.calls.lock().unwrap().clone()
    }
}

impl ImageEncoder for ModelEncoder {
    fn encode(&self, asset: &[u8], options: &EncodeOptions) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(*options);
        if self.poison.is_some() && asset.first().copied() == self.poison {
            return Err(anyhow!("poisoned asset"));
        }
        let size = match options.quality {
            Some(quality) => {
                let cap = options
                    .max_dimension
                    .unwrap_or(self.longest_side)
                    .min(self.longest_side) as f64;
                let area = (cap / self.longest_side as f64).powi(2);
                self.full_size * quality * area
            }
            None => options.size_budget_mb * 1024.0 * 1024.0 * 0.9,
        };
        // Output carries the asset's first byte so callers can trace it.
        Ok(vec![asset.first().copied().unwrap_or(0); size.round() as usize])
    }
}

/// Encoder replaying a fixed script of sizes (`None` = failure).
pub struct ScriptedEncoder {
    pub script: Mutex<VecDeque<Option<usize>>>,
    pub calls: Mutex<Vec<EncodeOptions>>,
}

impl ScriptedEncoder {
    pub fn new(script: impl IntoIterator<Item = Option<usize>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<EncodeOptions> {
        self.calls.lock().unwrap().clone()
    }
}

impl ImageEncoder for ScriptedEncoder {
    fn encode(&self, _asset: &[u8], options: &EncodeOptions) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(*options);
        match self.script.lock().unwrap().pop_front() {
            Some(Some(size)) => Ok(vec![0u8; size]),
            Some(None) => Err(anyhow!("scripted failure")),
            None => Err(anyhow!("script exhausted")),
        }
    }
}

/// Serializer with one size per object-stream setting, or a script.
pub struct FakeSerializer {
    pub with_object_streams: usize,
    pub without_object_streams: usize,
    pub script: Mutex<VecDeque<Option<usize>>>,
    pub fail_load: bool,
    pub loads: Mutex<usize>,
    pub calls: Mutex<Vec<SaveOptions>>,
}

impl FakeSerializer {
    pub fn new(with_object_streams: usize, without_object_streams: usize) -> Self {
        Self {
            with_object_streams,
            without_object_streams,
            script: Mutex::new(VecDeque::new()),
            fail_load: false,
            loads: Mutex::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn scripted(script: impl IntoIterator<Item = Option<usize>>) -> Self {
        let fake = Self::new(0, 0);
        *fake.script.lock().unwrap() = script.into_iter().collect();
        fake
    }

    pub fn calls(&self) -> Vec<SaveOptions> {
        self.calls.lock().unwrap().clone()
    }

    pub fn loads(&self) -> usize {
        *self.loads.lock().unwrap()
    }
}

impl PdfSerializer for FakeSerializer {
    type Document = ();

    fn load(&self, _bytes: &[u8]) -> Result<()> {
        *self.loads.lock().unwrap() += 1;
        if self.fail_load {
            return Err(anyhow!("broken xref"));
        }
        Ok(())
    }

    fn serialize(&self, _document: &(), options: &SaveOptions) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(*options);
        if let Some(step) = self.script.lock().unwrap().pop_front() {
            return step
                .map(|size| vec![0u8; size])
                .ok_or_else(|| anyhow!("scripted failure"));
        }
        let size = if options.use_object_streams {
            self.with_object_streams
        } else {
            self.without_object_streams
        };
        Ok(vec![0u8; size])
    }
}

/// A PNG with enough texture that JPEG quality matters.
pub fn noisy_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let v = (x.wrapping_mul(31) ^ y.wrapping_mul(17)).wrapping_mul(2654435761) >> 24;
        Rgb([v as u8, (v as u8).wrapping_mul(3), (x ^ y) as u8])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// A text-only PDF with uncompressed, repetitive content streams.
pub fn sample_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for i in 0..pages {
        let text = format!(
            "BT /F1 12 Tf 72 720 Td (Page {} {}) Tj ET",
            i,
            "lorem ipsum dolor sit amet ".repeat(40)
        );
        let content_id = doc.add_object(Stream::new(dictionary! {}, text.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => pages as i64,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}
