use std::f64::consts::PI;

use parry3d_f64::na::Vector3;
use rand::distr::Distribution;

use crate::computational_geometry::rotation_matrix;

/// The fisher distribution of polygon normal vector generation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fisher {
    orientation: Vector3<f64>,
    kappa: f64,
    eps: f64,
}

impl Fisher {
    /// # Arguments
    ///
    /// * `orientation` - Mean normal vector
    /// * `kappa` - Concentration parameter, 0 gives uniformly random normals
    /// * `eps` - Epsilon value for floating point comparisons
    pub fn new(orientation: Vector3<f64>, kappa: f64, eps: f64) -> Self {
        Self {
            orientation: orientation.normalize(),
            kappa,
            eps,
        }
    }

    pub fn orientation(&self) -> Vector3<f64> {
        self.orientation
    }

    pub fn kappa(&self) -> f64 {
        self.kappa
    }
}

impl std::fmt::Display for Fisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let o = self.orientation;
        writeln!(f, "Distribution: Fisher")?;
        writeln!(f, "Mean Normal Vector: {{{}, {}, {}}}", o.x, o.y, o.z)?;
        writeln!(f, "Kappa: {}", self.kappa)
    }
}

impl Distribution<Vector3<f64>> for Fisher {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Vector3<f64> {
        let theta_random = rng.random::<f64>() * 2. * PI;
        let y = rng.random::<f64>();

        // Cosine of the angle to the mean direction. Written as
        // 1 + ln(y + (1 - y)e^(-2k)) / k, which stays finite for large kappa.
        let w = if self.kappa.abs() < 1e-12 {
            2. * y - 1.
        } else {
            1. + (y + (1. - y) * (-2. * self.kappa).exp()).ln() / self.kappa
        }
        .clamp(-1., 1.);

        let temp = (1. - w * w).sqrt();
        let v = Vector3::new(temp * theta_random.cos(), temp * theta_random.sin(), w);

        rotation_matrix(&Vector3::z(), &self.orientation, self.eps) * v
    }
}
