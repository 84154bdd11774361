use rand::distr::{uniform, Distribution, Uniform};

/// The truncated power-law distribution
#[derive(Debug, Clone, Copy)]
pub struct TruncPowerLaw {
    min: f64,
    max: f64,
    alpha: f64,
    uniform: Uniform<f64>,
}

impl TruncPowerLaw {
    pub fn new(min: f64, max: f64, alpha: f64) -> Result<Self, uniform::Error> {
        if !(min > 0. && min < max && alpha > 0.) {
            return Err(uniform::Error::EmptyRange);
        }

        Ok(Self {
            min,
            max,
            alpha,
            uniform: Uniform::new(0., 1.)?,
        })
    }
}

impl Distribution<f64> for TruncPowerLaw {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let rand_val = rng.sample(self.uniform);
        let tmp = 1. - rand_val + (rand_val * (self.min / self.max).powf(self.alpha));
        self.min * tmp.powf(-1. / self.alpha)
    }
}

#[cfg(test)]
mod tests {
    use rand_mt::Mt64;

    use super::*;

    #[test]
    fn samples_within_bounds() {
        let mut rng = Mt64::new(42);
        let distr = TruncPowerLaw::new(1., 10., 2.6).unwrap();

        for _ in 0..1000 {
            let v = distr.sample(&mut rng);
            assert!((1. ..=10.).contains(&v));
        }
    }

    #[test]
    fn reject_bad_bounds() {
        assert!(TruncPowerLaw::new(5., 1., 2.).is_err());
        assert!(TruncPowerLaw::new(0., 1., 2.).is_err());
    }
}
