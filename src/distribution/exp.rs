use rand::distr::{uniform, Distribution, Uniform};

/// The exponential distribution truncated to `[min, max]`.
///
/// Values are drawn by inverting the CDF over the probability interval
/// `[F(min), F(max)]`, so no draw is ever wasted.
#[derive(Debug, Clone, Copy)]
pub struct TruncExp {
    lambda_inverse: f64,
    uniform: Uniform<f64>,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("exponential distribution lambda must be positive, got {0}")]
    LambdaTooSmall(f64),
    #[error("exponential distribution bounds [{min}, {max}] are invalid")]
    InvalidBounds { min: f64, max: f64 },
    #[error(
        "exponential distribution minimum {min} cannot be produced with lambda {lambda}, the largest value possible is {largest}"
    )]
    MinimumUnreachable { min: f64, lambda: f64, largest: f64 },
    #[error(transparent)]
    Uniform(#[from] uniform::Error),
}

/// Largest double less than 1.0.
fn max_below_one() -> f64 {
    1. - f64::EPSILON / 2.
}

/// Exponential CDF, `1 - e^(-lambda * x)`.
fn cdf(x: f64, lambda: f64) -> f64 {
    1. - (-lambda * x).exp()
}

impl TruncExp {
    pub fn new(min: f64, max: f64, lambda: f64) -> Result<TruncExp, Error> {
        if !(lambda > 0.) {
            return Err(Error::LambdaTooSmall(lambda));
        }
        if !(min >= 0. && min < max) {
            return Err(Error::InvalidBounds { min, max });
        }

        let norm_min = cdf(min, lambda);
        if norm_min >= 1. {
            return Err(Error::MinimumUnreachable {
                min,
                lambda,
                largest: Self::largest_value(lambda),
            });
        }
        // A maximum too far in the tail is capped at the largest producible value
        let norm_max = cdf(max, lambda).min(max_below_one());

        Ok(TruncExp {
            lambda_inverse: 1. / lambda,
            uniform: Uniform::new_inclusive(norm_min, norm_max)?,
        })
    }

    /// Largest value the distribution can produce with floating point inputs.
    pub fn largest_value(lambda: f64) -> f64 {
        -(1. - max_below_one()).ln() / lambda
    }
}

impl Distribution<f64> for TruncExp {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let rand_val = rng.sample(self.uniform).min(max_below_one());
        -(1. - rand_val).ln() * self.lambda_inverse
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand_mt::Mt64;

    use super::*;

    #[test]
    fn samples_within_bounds() {
        let mut rng = Mt64::new(3);
        let distr = TruncExp::new(1., 5., 0.5).unwrap();

        for _ in 0..1000 {
            let v = distr.sample(&mut rng);
            assert!(v >= 1. - 1e-12 && v <= 5. + 1e-12);
        }
    }

    #[test]
    fn mean_of_wide_bounds() {
        let mut rng = Mt64::new(3);
        let distr = TruncExp::new(0., 1e6, 2.).unwrap();
        let n = 20000;
        let mean = (0..n).map(|_| distr.sample(&mut rng)).sum::<f64>() / n as f64;
        assert_relative_eq!(mean, 0.5, max_relative = 0.05);
    }

    #[test]
    fn invalid_parameters() {
        assert!(matches!(
            TruncExp::new(1., 2., 0.),
            Err(Error::LambdaTooSmall(_))
        ));
        assert!(matches!(
            TruncExp::new(2., 1., 1.),
            Err(Error::InvalidBounds { .. })
        ));
        assert!(matches!(
            TruncExp::new(1e3, 2e3, 10.),
            Err(Error::MinimumUnreachable { .. })
        ));
    }
}
