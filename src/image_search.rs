//! Target-size search over JPEG quality, with dimension pre-reduction and a
//! final dimension refinement when quality alone cannot reach the target.

use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::encoder::{EncodeOptions, ImageEncoder};
use crate::error::{describe, CompressError, Result};
use crate::policy::{ImageSearchPolicy, RefinementPolicy};
use crate::request::{CompressionRequest, Dimensions, TrialResult};
use crate::search::{absolute_error, relative_error, SearchState};

/// Budget and dimension cap of the one-shot "auto" mode.
pub const AUTO_SIZE_BUDGET_MB: f64 = 1.0;
pub const AUTO_MAX_DIMENSION: u32 = 1920;

/// Runs the search with the default policy.
pub fn search_image_quality<E: ImageEncoder>(
    encoder: &E,
    request: &CompressionRequest,
) -> Result<TrialResult> {
    search_image_quality_with(encoder, request, &ImageSearchPolicy::default())
}

pub fn search_image_quality_with<E: ImageEncoder>(
    encoder: &E,
    request: &CompressionRequest,
    policy: &ImageSearchPolicy,
) -> Result<TrialResult> {
    request.validate()?;
    policy.validate()?;
    let original = request.original_dimensions.ok_or_else(|| {
        CompressError::InvalidRequest("image request without dimensions".into())
    })?;

    let dims = initial_dimensions(request, original, policy);
    let target = request.target_size_bytes;

    let initial = match probe(encoder, request, policy.initial_quality, dims) {
        Ok(trial) => trial,
        Err(e) => {
            warn!("Initial compression attempt failed: {:#}", e);
            return fallback(encoder, request);
        }
    };
    debug!(
        "initial trial q={:.2} cap={} -> {} bytes",
        initial.quality_used,
        dims.longest_side(),
        initial.output_size_bytes
    );

    if relative_error(initial.output_size_bytes, target) < policy.fast_path_tolerance {
        info!(
            "initial trial within {:.0}% of target ({} bytes)",
            policy.fast_path_tolerance * 100.0,
            initial.output_size_bytes
        );
        return Ok(initial);
    }

    let mut state = SearchState::seeded(policy.min_quality, policy.max_quality, initial);

    while state.has_budget(policy.max_attempts) {
        let quality = state.midpoint();
        state.attempts_used += 1;

        let trial = match probe(encoder, request, quality, dims) {
            Ok(trial) => trial,
            Err(e) => {
                warn!("Compression attempt failed: {:#}", e);
                break;
            }
        };
        let size = trial.output_size_bytes;
        let err = relative_error(size, target);
        debug!(
            "probe {} q={:.3} -> {} bytes (error {:.3})",
            state.attempts_used, quality, size, err
        );

        state.record(trial, target);
        state.narrow(quality, size, target);

        if err < policy.convergence_tolerance {
            break;
        }
    }

    let attempts = state.attempts_used;
    let Some(mut best) = state.finish() else {
        // Seeded with the initial trial, so a best always exists.
        return fallback(encoder, request);
    };

    if best.output_size_bytes as f64 > target as f64 * policy.refinement_trigger {
        best = refine(encoder, request, policy, best);
        best.attempts_used = attempts;
    }

    info!(
        "image search done: q={:.3} cap={:?} -> {} bytes (target {})",
        best.quality_used,
        best.dimensions_used.map(|d| d.longest_side()),
        best.output_size_bytes,
        target
    );
    Ok(best)
}

/// Dimensions after the optional pre-stage.
pub fn initial_dimensions(
    request: &CompressionRequest,
    original: Dimensions,
    policy: &ImageSearchPolicy,
) -> Dimensions {
    let target = request.target_size_bytes as f64;
    let size = request.original_size_bytes as f64;

    let should_reduce = size > target * policy.prestage_size_ratio
        || original.width > policy.prestage_dimension_threshold
        || original.height > policy.prestage_dimension_threshold;
    if !should_reduce {
        return original;
    }

    let scale = ((target / size).sqrt() * policy.prestage_boost).min(1.0);
    let reduced = original.scaled(scale);

    let floor = policy.min_dimension;
    if reduced.width < floor && reduced.height < floor {
        let up = floor as f64 / reduced.width.min(reduced.height) as f64;
        return reduced.scaled(up);
    }
    reduced
}

fn refine<E: ImageEncoder>(
    encoder: &E,
    request: &CompressionRequest,
    policy: &ImageSearchPolicy,
    best: TrialResult,
) -> TrialResult {
    let target = request.target_size_bytes;
    let scale =
        (target as f64 / best.output_size_bytes as f64).sqrt() * policy.refinement_damping;
    let dims = best
        .dimensions_used
        .or(request.original_dimensions)
        .map(|d| d.scaled(scale));
    let Some(dims) = dims else {
        return best;
    };

    let refined = match probe(encoder, request, best.quality_used, dims) {
        Ok(trial) => trial,
        Err(e) => {
            warn!("Final compression attempt failed: {:#}", e);
            return best;
        }
    };
    debug!(
        "refinement cap={} -> {} bytes",
        dims.longest_side(),
        refined.output_size_bytes
    );

    match policy.refinement {
        RefinementPolicy::Unconditional => refined,
        RefinementPolicy::KeepIfBetter => {
            if absolute_error(refined.output_size_bytes, target)
                < absolute_error(best.output_size_bytes, target)
            {
                refined
            } else {
                best
            }
        }
    }
}

fn probe<E: ImageEncoder>(
    encoder: &E,
    request: &CompressionRequest,
    quality: f64,
    dims: Dimensions,
) -> anyhow::Result<TrialResult> {
    let options = EncodeOptions {
        quality: Some(quality),
        max_dimension: Some(dims.longest_side()),
        size_budget_mb: request.target_mb(),
    };
    let bytes = encoder.encode(&request.source, &options)?;
    Ok(TrialResult::new(quality, Some(dims), bytes))
}

/// Single unconstrained encode at the target budget, no dimension cap.
fn fallback<E: ImageEncoder>(encoder: &E, request: &CompressionRequest) -> Result<TrialResult> {
    let options = EncodeOptions {
        quality: None,
        max_dimension: None,
        size_budget_mb: request.target_mb(),
    };
    match encoder.encode(&request.source, &options) {
        Ok(bytes) => {
            info!("fallback encode produced {} bytes", bytes.len());
            Ok(TrialResult::new(1.0, None, bytes))
        }
        Err(e) => {
            error!("Fallback compression failed: {:#}", e);
            Err(CompressError::EncodingFailed(describe(&e)))
        }
    }
}

/// One-shot compression with a fixed budget and cap, no search.
pub fn compress_image_auto<E: ImageEncoder>(
    encoder: &E,
    source: impl Into<Arc<[u8]>>,
) -> Result<TrialResult> {
    let source: Arc<[u8]> = source.into();
    let options = EncodeOptions {
        quality: None,
        max_dimension: Some(AUTO_MAX_DIMENSION),
        size_budget_mb: AUTO_SIZE_BUDGET_MB,
    };
    encoder
        .encode(&source, &options)
        .map(|bytes| TrialResult::new(1.0, None, bytes))
        .map_err(|e| CompressError::EncodingFailed(describe(&e)))
}
