use rayon::prelude::*;
use thiserror::Error;

use crate::encoder::ImageEncoder;
use crate::error::{CompressError, Result};
use crate::image_search::search_image_quality_with;
use crate::pdf_search::search_pdf_quality_with;
use crate::policy::{ImageSearchPolicy, PdfSearchPolicy};
use crate::request::{CompressionRequest, TrialResult};
use crate::serializer::PdfSerializer;

/// Per-item outcome: the produced asset, or why it could not be produced.
pub type CompressionOutcome = Result<TrialResult>;

/// Outcomes in input order, one per submitted item.
#[derive(Debug)]
pub struct BatchResult {
    pub items: Vec<CompressionOutcome>,
}

/// All-or-nothing view of a batch: the first failing item aborts the lot.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("item {index} failed: {source}")]
pub struct BatchError {
    pub index: usize,
    pub source: CompressError,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| item.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// Collapses to a single result, failing if any item failed.
    pub fn into_all(self) -> std::result::Result<Vec<TrialResult>, BatchError> {
        self.items
            .into_iter()
            .enumerate()
            .map(|(index, item)| item.map_err(|source| BatchError { index, source }))
            .collect()
    }
}

/// Input slot of a batch; a slot may already carry a load failure so it
/// keeps its position in the output.
pub type BatchItem = Result<CompressionRequest>;

pub fn compress_images<E: ImageEncoder>(
    encoder: &E,
    items: Vec<BatchItem>,
    policy: &ImageSearchPolicy,
) -> BatchResult {
    run(items, |request| {
        search_image_quality_with(encoder, request, policy)
    })
}

pub fn compress_pdfs<S: PdfSerializer>(
    serializer: &S,
    items: Vec<BatchItem>,
    policy: &PdfSearchPolicy,
) -> BatchResult {
    run(items, |request| {
        search_pdf_quality_with(serializer, request, policy)
    })
}

/// Runs `search` on every item in parallel, keeping input order.
pub fn run<F>(items: Vec<BatchItem>, search: F) -> BatchResult
where
    F: Fn(&CompressionRequest) -> Result<TrialResult> + Sync,
{
    let items: Vec<CompressionOutcome> = items
        .into_par_iter()
        .enumerate()
        .map(|(index, item)| {
            let outcome = item.and_then(|request| search(&request));
            if let Err(e) = &outcome {
                log::error!("Failed to process item {}: {}", index, e);
            }
            outcome
        })
        .collect();

    log::info!(
        "batch done: {} ok, {} failed",
        items.iter().filter(|item| item.is_ok()).count(),
        items.iter().filter(|item| item.is_err()).count()
    );
    BatchResult { items }
}
