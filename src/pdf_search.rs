use log::{debug, error, info, warn};

use crate::error::{describe, CompressError, Result};
use crate::policy::PdfSearchPolicy;
use crate::request::{CompressionRequest, TrialResult};
use crate::search::{relative_error, SearchState};
use crate::serializer::{CompressionLevel, PdfSerializer, SaveOptions};

/// Runs the search with the default policy.
pub fn search_pdf_quality<S: PdfSerializer>(
    serializer: &S,
    request: &CompressionRequest,
) -> Result<TrialResult> {
    search_pdf_quality_with(serializer, request, &PdfSearchPolicy::default())
}

pub fn search_pdf_quality_with<S: PdfSerializer>(
    serializer: &S,
    request: &CompressionRequest,
    policy: &PdfSearchPolicy,
) -> Result<TrialResult> {
    request.validate()?;
    policy.validate()?;
    let target = request.target_size_bytes;

    if request.original_size_bytes <= target {
        info!(
            "PDF already fits ({} <= {} bytes), passing through",
            request.original_size_bytes, target
        );
        return Ok(TrialResult::from_shared(1.0, None, request.source.clone()));
    }

    let document = serializer
        .load(&request.source)
        .map_err(|e| CompressError::AssetLoadFailed(describe(&e)))?;

    let mut state = SearchState::new(policy.min_quality, policy.max_quality);

    while state.has_budget(policy.max_attempts) {
        let quality = state.midpoint();
        let options = SaveOptions::for_quality(quality, policy.object_stream_threshold);
        state.attempts_used += 1;

        let bytes = match serializer.serialize(&document, &options) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("PDF serialization attempt failed: {:#}", e);
                break;
            }
        };
        let trial = TrialResult::new(quality, None, bytes);
        let size = trial.output_size_bytes;
        let err = relative_error(size, target);
        debug!(
            "probe {} q={:.3} object_streams={} -> {} bytes (error {:.3})",
            state.attempts_used, quality, options.use_object_streams, size, err
        );

        state.record(trial, target);
        state.narrow(quality, size, target);

        if err < policy.convergence_tolerance {
            break;
        }
    }

    if let Some(best) = state.finish() {
        info!(
            "PDF search done: q={:.3} -> {} bytes (target {})",
            best.quality_used, best.output_size_bytes, target
        );
        return Ok(best);
    }

    // No probe produced output: one safe attempt with object streams.
    match serializer.serialize(&document, &SaveOptions::new(true)) {
        Ok(bytes) => Ok(TrialResult::new(policy.min_quality, None, bytes)),
        Err(e) => {
            error!("Fallback PDF serialization failed: {:#}", e);
            Err(CompressError::SerializationFailed(describe(&e)))
        }
    }
}

/// Single serialization with the preset of `level`.
pub fn compress_pdf_with_level<S: PdfSerializer>(
    serializer: &S,
    source: &[u8],
    level: CompressionLevel,
) -> Result<TrialResult> {
    let document = serializer
        .load(source)
        .map_err(|e| CompressError::AssetLoadFailed(describe(&e)))?;
    let bytes = serializer
        .serialize(&document, &level.save_options())
        .map_err(|e| CompressError::SerializationFailed(describe(&e)))?;
    debug!("level {:?}: {} -> {} bytes", level, source.len(), bytes.len());
    Ok(TrialResult::new(level_quality(level), None, bytes))
}

/// Nominal quality reported for a level preset.
fn level_quality(level: CompressionLevel) -> f64 {
    match level {
        CompressionLevel::High => 0.25,
        CompressionLevel::Medium => 0.5,
        CompressionLevel::Low => 0.75,
    }
}
