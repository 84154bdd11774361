use std::f64::consts::PI;

use parry3d_f64::na::Vector3;
use rand::distr::Distribution;
use tracing::warn;

use crate::computational_geometry::rotation_matrix;

const MAX_DRAWS: usize = 1_000_000;

/// Bingham distribution of polygon normal vectors.
///
/// Directions are drawn uniformly on the sphere in the frame where the mode
/// is the z axis, and accepted with probability proportional to
/// `exp(kappa1 * x^2 + kappa2 * y^2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bingham {
    orientation: Vector3<f64>,
    kappa1: f64,
    kappa2: f64,
    eps: f64,
}

impl Bingham {
    pub fn new(orientation: Vector3<f64>, kappa1: f64, kappa2: f64, eps: f64) -> Self {
        Self {
            orientation: orientation.normalize(),
            kappa1,
            kappa2,
            eps,
        }
    }

    pub fn orientation(&self) -> Vector3<f64> {
        self.orientation
    }
}

impl std::fmt::Display for Bingham {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let o = self.orientation;
        writeln!(f, "Distribution: Bingham")?;
        writeln!(f, "Mode Normal Vector: {{{}, {}, {}}}", o.x, o.y, o.z)?;
        writeln!(f, "Kappa 1: {}", self.kappa1)?;
        writeln!(f, "Kappa 2: {}", self.kappa2)
    }
}

impl Distribution<Vector3<f64>> for Bingham {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Vector3<f64> {
        let r = rotation_matrix(&Vector3::z(), &self.orientation, self.eps);
        let log_m = self.kappa1.max(self.kappa2).max(0.);

        for _ in 0..MAX_DRAWS {
            let z = rng.random::<f64>() * 2. - 1.;
            let phi = rng.random::<f64>() * 2. * PI;
            let radius = (1. - z * z).sqrt();
            let local = Vector3::new(radius * phi.cos(), radius * phi.sin(), z);

            let w = self.kappa1 * local.x * local.x + self.kappa2 * local.y * local.y;

            if rng.random::<f64>() <= (w - log_m).exp() {
                return r * local;
            }
        }

        warn!(
            "Bingham sampling with kappa1 = {}, kappa2 = {} accepted no direction after {} draws, using the mode",
            self.kappa1, self.kappa2, MAX_DRAWS
        );
        self.orientation
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rand_mt::Mt64;

    use super::*;

    #[test]
    fn unit_normals() {
        let mut rng = Mt64::new(5);
        let bingham = Bingham::new(Vector3::new(0., 1., 1.), -5., 2., 1e-10);

        for _ in 0..100 {
            assert_abs_diff_eq!(bingham.sample(&mut rng).norm(), 1., epsilon = 1e-12);
        }
    }

    #[test]
    fn negative_kappas_concentrate_on_mode_axis() {
        let mut rng = Mt64::new(5);
        let mode = Vector3::x();
        let bingham = Bingham::new(mode, -50., -50., 1e-10);
        let n = 500;
        let mean_abs_cos = (0..n)
            .map(|_| bingham.sample(&mut rng).dot(&mode).abs())
            .sum::<f64>()
            / n as f64;

        assert!(mean_abs_cos > 0.9);
    }
}
