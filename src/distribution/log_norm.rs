use rand::distr::Distribution;
use rand_distr::{LogNormal, NormalError};

use super::SamplingError;

const MAX_DRAWS: usize = 1000;

/// Lognormal distribution truncated to `[min, max]` by rejection.
#[derive(Debug, Clone, Copy)]
pub struct TruncLogNormal {
    min: f64,
    max: f64,
    log_normal: LogNormal<f64>,
}

impl TruncLogNormal {
    pub fn new(min: f64, max: f64, mu: f64, sigma: f64) -> Result<Self, NormalError> {
        let log_normal = LogNormal::new(mu, sigma)?;
        Ok(Self {
            min,
            max,
            log_normal,
        })
    }

    /// Draw from the untruncated distribution, clamped to `[min, max]`.
    pub fn sample_relaxed<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        rng.sample(self.log_normal).clamp(self.min, self.max)
    }
}

impl Distribution<Result<f64, SamplingError>> for TruncLogNormal {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Result<f64, SamplingError> {
        for _ in 0..MAX_DRAWS {
            let value = rng.sample(self.log_normal);

            if self.min <= value && value <= self.max {
                return Ok(value);
            }
        }

        Err(SamplingError::BadParameters {
            min: self.min,
            max: self.max,
            draws: MAX_DRAWS,
        })
    }
}
