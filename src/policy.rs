use crate::error::{CompressError, Result};

/// What the dimension refinement step does with its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefinementPolicy {
    /// Replace the best result with the refined encode, even when it lands
    /// further from the target.
    #[default]
    Unconditional,
    /// Keep the refined encode only when its absolute error is smaller.
    KeepIfBetter,
}

/// Knobs of the image target-size search.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSearchPolicy {
    pub initial_quality: f64,
    pub min_quality: f64,
    pub max_quality: f64,
    pub max_attempts: u32,
    /// Relative error under which the initial trial is returned as is.
    pub fast_path_tolerance: f64,
    /// Relative error under which the bisection stops.
    pub convergence_tolerance: f64,
    /// Pre-stage triggers when original > target * this ratio...
    pub prestage_size_ratio: f64,
    /// ...or when either side exceeds this many pixels.
    pub prestage_dimension_threshold: u32,
    pub prestage_boost: f64,
    pub min_dimension: u32,
    /// Refinement triggers when best > target * this factor.
    pub refinement_trigger: f64,
    pub refinement_damping: f64,
    pub refinement: RefinementPolicy,
}

impl Default for ImageSearchPolicy {
    fn default() -> Self {
        Self {
            initial_quality: 0.8,
            min_quality: 0.3,
            max_quality: 0.9,
            max_attempts: 5,
            fast_path_tolerance: 0.1,
            convergence_tolerance: 0.05,
            prestage_size_ratio: 3.0,
            prestage_dimension_threshold: 1200,
            prestage_boost: 1.5,
            min_dimension: 300,
            refinement_trigger: 1.1,
            refinement_damping: 0.95,
            refinement: RefinementPolicy::Unconditional,
        }
    }
}

impl ImageSearchPolicy {
    pub fn validate(&self) -> Result<()> {
        check_quality("initial_quality", self.initial_quality)?;
        check_bounds(self.min_quality, self.max_quality)?;
        check_budget(self.max_attempts)?;
        check_non_negative("fast_path_tolerance", self.fast_path_tolerance)?;
        check_non_negative("convergence_tolerance", self.convergence_tolerance)?;
        check_positive("prestage_boost", self.prestage_boost)?;
        check_positive("refinement_damping", self.refinement_damping)?;
        if !(1.0..).contains(&self.refinement_trigger) {
            return Err(CompressError::InvalidRequest(format!(
                "refinement_trigger must be at least 1, got {}",
                self.refinement_trigger
            )));
        }
        Ok(())
    }
}

/// Knobs of the PDF target-size search.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfSearchPolicy {
    pub min_quality: f64,
    pub max_quality: f64,
    pub max_attempts: u32,
    pub convergence_tolerance: f64,
    /// Probes below this quality serialize with object streams.
    pub object_stream_threshold: f64,
}

impl Default for PdfSearchPolicy {
    fn default() -> Self {
        Self {
            min_quality: 0.1,
            max_quality: 1.0,
            max_attempts: 8,
            convergence_tolerance: 0.05,
            object_stream_threshold: 0.5,
        }
    }
}

impl PdfSearchPolicy {
    pub fn validate(&self) -> Result<()> {
        check_bounds(self.min_quality, self.max_quality)?;
        check_budget(self.max_attempts)?;
        check_non_negative("convergence_tolerance", self.convergence_tolerance)
    }
}

fn check_quality(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(CompressError::InvalidRequest(format!(
            "{} must lie in [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

fn check_bounds(min: f64, max: f64) -> Result<()> {
    check_quality("min_quality", min)?;
    check_quality("max_quality", max)?;
    if min > max {
        return Err(CompressError::InvalidRequest(format!(
            "quality bounds inverted: {} > {}",
            min, max
        )));
    }
    Ok(())
}

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if !(0.0..).contains(&value) {
        return Err(CompressError::InvalidRequest(format!(
            "{} must not be negative, got {}",
            name, value
        )));
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value.is_nan() || value <= 0.0 {
        return Err(CompressError::InvalidRequest(format!(
            "{} must be positive, got {}",
            name, value
        )));
    }
    Ok(())
}

fn check_budget(attempts: u32) -> Result<()> {
    if attempts == 0 {
        return Err(CompressError::InvalidRequest(
            "attempt budget must be at least 1".into(),
        ));
    }
    Ok(())
}
