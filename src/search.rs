use crate::request::TrialResult;

/// |measured - target| in bytes.
pub fn absolute_error(size: u64, target: u64) -> u64 {
    size.abs_diff(target)
}

/// |measured - target| / target.
pub fn relative_error(size: u64, target: u64) -> f64 {
    absolute_error(size, target) as f64 / target as f64
}

/// Bisection state owned by one in-flight search.
#[derive(Debug, Clone)]
pub struct SearchState {
    pub min_quality: f64,
    pub max_quality: f64,
    pub attempts_used: u32,
    pub best: Option<TrialResult>,
}

impl SearchState {
    pub fn new(min_quality: f64, max_quality: f64) -> Self {
        Self {
            min_quality,
            max_quality,
            attempts_used: 0,
            best: None,
        }
    }

    /// Starts from an already measured trial (the image fast-path probe).
    pub fn seeded(min_quality: f64, max_quality: f64, initial: TrialResult) -> Self {
        Self {
            best: Some(initial),
            ..Self::new(min_quality, max_quality)
        }
    }

    pub fn midpoint(&self) -> f64 {
        (self.min_quality + self.max_quality) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.max_quality - self.min_quality
    }

    pub fn has_budget(&self, max_attempts: u32) -> bool {
        self.attempts_used < max_attempts
    }

    /// Keeps `trial` if it is strictly closer to the target than the current
    /// best. Returns whether it was kept.
    pub fn record(&mut self, trial: TrialResult, target: u64) -> bool {
        let improves = match &self.best {
            None => true,
            Some(best) => {
                absolute_error(trial.output_size_bytes, target)
                    < absolute_error(best.output_size_bytes, target)
            }
        };
        if improves {
            self.best = Some(trial);
        }
        improves
    }

    /// Moves one bound onto the probed quality. Too big means more
    /// compression is needed, so the upper bound comes down.
    pub fn narrow(&mut self, probed: f64, size: u64, target: u64) {
        let probed = probed.clamp(self.min_quality, self.max_quality);
        if size > target {
            self.max_quality = probed;
        } else {
            self.min_quality = probed;
        }
    }

    pub fn best_error(&self, target: u64) -> Option<u64> {
        self.best
            .as_ref()
            .map(|best| absolute_error(best.output_size_bytes, target))
    }

    /// Hands back the best trial stamped with the attempts spent.
    pub fn finish(self) -> Option<TrialResult> {
        let attempts = self.attempts_used;
        self.best.map(|mut best| {
            best.attempts_used = attempts;
            best
        })
    }
}
