use std::f64::consts::PI;

use parry3d_f64::na::{Point3, Vector3};

/// How a pair of orientation angles maps to a normal vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrientationOption {
    /// Spherical coordinates, theta from the z axis and phi from the x axis.
    #[default]
    ThetaPhi,
    TrendPlunge,
    DipStrike,
}

impl TryFrom<u8> for OrientationOption {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::ThetaPhi),
            1 => Ok(Self::TrendPlunge),
            2 => Ok(Self::DipStrike),
            v => Err(v),
        }
    }
}

impl OrientationOption {
    /// Input file names of the two angles, without the shape prefix.
    pub fn angle_names(&self) -> (&'static str, &'static str) {
        match self {
            Self::ThetaPhi => ("theta", "phi"),
            Self::TrendPlunge => ("trend", "plunge"),
            Self::DipStrike => ("dip", "strike"),
        }
    }
}

/// Converts orientation angles (radians) into a unit normal vector.
///
/// * theta/phi: `(sin t cos p, sin t sin p, cos t)`
/// * trend/plunge: `(cos t cos p, sin t cos p, sin p)`
/// * dip/strike: `(sin d cos s, -sin d sin s, cos d)`
pub fn angles_to_normal(option: OrientationOption, angle_one: f64, angle_two: f64) -> Vector3<f64> {
    match option {
        OrientationOption::ThetaPhi => Vector3::new(
            angle_one.sin() * angle_two.cos(),
            angle_one.sin() * angle_two.sin(),
            angle_one.cos(),
        ),
        OrientationOption::TrendPlunge => Vector3::new(
            angle_one.cos() * angle_two.cos(),
            angle_one.sin() * angle_two.cos(),
            angle_two.sin(),
        ),
        OrientationOption::DipStrike => Vector3::new(
            angle_one.sin() * angle_two.cos(),
            -angle_one.sin() * angle_two.sin(),
            angle_one.cos(),
        ),
    }
}

// **********  Generates Theta Array for Generating Ellipses  ***************
// Integrate diff eq for theta as function of arc length using RK2, so the
// ellipse vertices are spaced evenly along the perimeter (Ramanujan's
// approximation of the circumference).
// Used once for each ell family.
pub fn generate_theta(aspect_ratio: f64, n_points: usize) -> Vec<f64> {
    let a = 1.;
    let b = aspect_ratio;
    let mut temp1 = (a - b) / (a + b);
    temp1 *= temp1;
    let c = PI * (a + b) * (1. + (3. * temp1) / (10. + (4. - 3. * temp1).sqrt()));
    let del = c / (n_points as f64);

    let speed = |theta: f64| ((b * theta.cos()).powi(2) + (a * theta.sin()).powi(2)).sqrt();

    let mut theta_array = Vec::with_capacity(n_points);
    theta_array.push(0.);

    for i in 1..n_points {
        let prev = theta_array[i - 1];
        let f_tmp = del / speed(prev);
        let tmp = prev + f_tmp;
        theta_array.push(prev + 0.5 * del / speed(tmp) + 0.5 * f_tmp);
    }

    theta_array
}

/// Discretize Intersection
///
/// Evenly spaced points from `pt1` to `pt2`, end points included, about `h / 2` apart.
/// `dist` is the segment length used for the spacing, so both fractures sharing an
/// intersection get the same number of points.
pub fn discretize_line_of_intersection(
    h: f64,
    pt1: &Point3<f64>,
    pt2: &Point3<f64>,
    dist: f64,
) -> Vec<Point3<f64>> {
    let v = pt2 - pt1;
    let n = ((2. * dist / h).ceil() as usize).max(1);

    (0..=n)
        .map(|i| {
            if i == n {
                *pt2
            } else {
                pt1 + v * (i as f64 / n as f64)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn circle_theta_is_evenly_spaced() {
        let theta = generate_theta(1., 8);
        assert_eq!(theta.len(), 8);

        for (i, t) in theta.iter().enumerate() {
            assert_abs_diff_eq!(*t, i as f64 * PI / 4., epsilon = 1e-12);
        }
    }

    #[test]
    fn theta_is_increasing() {
        let theta = generate_theta(0.3, 12);
        assert!(theta.windows(2).all(|w| w[1] > w[0]));
        assert!(*theta.last().unwrap() < 2. * PI);
    }

    #[test]
    fn discretized_line_keeps_end_points() {
        let p1 = Point3::new(0., 0., 0.);
        let p2 = Point3::new(1., 0., 0.);

        let points = discretize_line_of_intersection(0.1, &p1, &p2, 1.);
        assert_eq!(points.len(), 21);
        assert_eq!(points[0], p1);
        assert_eq!(points[20], p2);
        assert_abs_diff_eq!(points[10], Point3::new(0.5, 0., 0.), epsilon = 1e-12);

        // Shorter than h/2 still gives both end points
        assert_eq!(discretize_line_of_intersection(0.1, &p1, &p1, 0.).len(), 2);
    }

    #[test]
    fn normals_from_angles() {
        let n = angles_to_normal(OrientationOption::ThetaPhi, 0., 1.3);
        assert_abs_diff_eq!(n, Vector3::z(), epsilon = 1e-12);

        let n = angles_to_normal(OrientationOption::TrendPlunge, 0., PI / 2.);
        assert_abs_diff_eq!(n, Vector3::z(), epsilon = 1e-12);

        let n = angles_to_normal(OrientationOption::TrendPlunge, PI / 2., 0.);
        assert_abs_diff_eq!(n, Vector3::y(), epsilon = 1e-12);

        let n = angles_to_normal(OrientationOption::DipStrike, PI / 2., 0.);
        assert_abs_diff_eq!(n, Vector3::x(), epsilon = 1e-12);

        for option in [
            OrientationOption::ThetaPhi,
            OrientationOption::TrendPlunge,
            OrientationOption::DipStrike,
        ] {
            assert_abs_diff_eq!(angles_to_normal(option, 0.7, 2.1).norm(), 1., epsilon = 1e-12);
        }
    }
}
