use parry3d_f64::na::Vector3;
use rand::distr::{Distribution, Uniform};
use rand::Rng;

mod bingham;
pub mod exp;
mod fisher;
pub mod generating_points;
mod log_norm;
mod power_law;

pub use bingham::Bingham;
pub use exp::TruncExp;
pub use fisher::Fisher;
pub use log_norm::TruncLogNormal;
pub use power_law::TruncPowerLaw;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SamplingError {
    #[error("unable to draw a value in [{min}, {max}] after {draws} draws")]
    BadParameters { min: f64, max: f64, draws: usize },
}

/// Orientation distribution of a fracture family's normal vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Orientation {
    Fisher(Fisher),
    Bingham(Bingham),
}

impl Orientation {
    /// Mean (Fisher) or mode (Bingham) normal of the distribution.
    pub fn mean_direction(&self) -> Vector3<f64> {
        match self {
            Orientation::Fisher(f) => f.orientation(),
            Orientation::Bingham(b) => b.orientation(),
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Fisher(fisher) => write!(f, "{}", fisher),
            Orientation::Bingham(bingham) => write!(f, "{}", bingham),
        }
    }
}

impl Distribution<Vector3<f64>> for Orientation {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vector3<f64> {
        match self {
            Orientation::Fisher(f) => f.sample(rng),
            Orientation::Bingham(b) => b.sample(rng),
        }
    }
}

/// Uniformly random translation inside the box `[min, max]`.
///
/// A degenerate axis (min == max) returns min for that axis.
pub fn random_translation<R: Rng + ?Sized>(
    rng: &mut R,
    min: &Vector3<f64>,
    max: &Vector3<f64>,
) -> Result<Vector3<f64>, rand::distr::uniform::Error> {
    let mut translation = Vector3::zeros();

    for i in 0..3 {
        translation[i] = if max[i] > min[i] {
            rng.sample(Uniform::new(min[i], max[i])?)
        } else {
            min[i]
        };
    }

    Ok(translation)
}

#[cfg(test)]
mod tests {
    use rand_mt::Mt64;

    use super::*;

    #[test]
    fn translation_stays_in_box() {
        let mut rng = Mt64::new(7);
        let min = Vector3::new(-1., -2., 0.5);
        let max = Vector3::new(1., 2., 0.5);

        for _ in 0..100 {
            let t = random_translation(&mut rng, &min, &max).unwrap();
            assert!((-1. ..1.).contains(&t.x));
            assert!((-2. ..2.).contains(&t.y));
            assert_eq!(t.z, 0.5);
        }
    }
}
