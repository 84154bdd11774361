use parry3d_f64::na::{Point3, Vector3};

use crate::fracture::poly::Poly;

/// Outcome of clipping a polygon against the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truncation {
    /// Every vertex was already inside the domain.
    Unchanged,
    /// The polygon was clipped against at least one domain side.
    Truncated,
    /// The polygon is outside the domain, or was truncated to less than 3 vertices.
    /// Its vertices have been cleared.
    Rejected,
}

impl Truncation {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Truncation::Rejected)
    }
}

/// Keeps the part of `vertices` on the inner side of one domain side.
/// The side is given by its outward normal and a point on it.
fn clip_against_side(
    vertices: &[Point3<f64>],
    normal: &Vector3<f64>,
    side_pt: &Point3<f64>,
) -> Vec<Point3<f64>> {
    let mut points = Vec::with_capacity(vertices.len() + 2);

    let Some(last) = vertices.last() else {
        return points;
    };

    let mut prev = *last;
    let mut prevdist = (prev - side_pt).dot(normal);

    for curr in vertices.iter() {
        let currdist = (curr - side_pt).dot(normal);

        if currdist * prevdist < 0. {
            // Edge crosses the domain side, store the point on the boundary
            let c = prevdist.abs() / (currdist.abs() + prevdist.abs());
            points.push(prev + (curr - prev) * c);
        }

        if currdist <= 0. {
            // Vertex is towards the domain relative to the domain side
            points.push(*curr);
        }

        prev = *curr;
        prevdist = currdist;
    }

    points
}

impl Poly {
    /// Domain Truncation
    ///
    /// Truncates polygons along the domain ('domainSize' in input file), centered at
    /// the origin. After clipping, vertices closer than 2h to their neighbour are
    /// collapsed and the boundary faces the polygon touches are flagged.
    ///
    /// # Arguments
    ///
    /// * `h` - Minimum feature size
    /// * `eps` - Epsilon value for floating point comparisons
    /// * `domain_size` - Domain size {x, y, z}
    pub fn domain_truncation(
        &mut self,
        h: f64,
        eps: f64,
        domain_size: &Vector3<f64>,
    ) -> Truncation {
        let half = domain_size * 0.5;

        let inside = |v: &Point3<f64>| (0..3).all(|i| v[i].abs() <= half[i] + eps);

        if self.vertices.iter().all(inside) {
            return Truncation::Unchanged;
        }

        self.truncated = true;

        // Check against the all the walls of the domain
        for axis in [2, 1, 0] {
            for sign in [1., -1.] {
                let mut normal = Vector3::zeros();
                normal[axis] = sign;
                let mut side_pt = Point3::origin();
                side_pt[axis] = sign * half[axis];

                self.vertices = clip_against_side(&self.vertices, &normal, &side_pt);

                if self.vertices.is_empty() {
                    return Truncation::Rejected;
                }
            }
        }

        let on_boundary =
            |v: &Point3<f64>| (0..3).any(|i| (v[i].abs() - half[i]).abs() <= eps);

        let mut i = 0;

        while i < self.vertices.len() && self.vertices.len() > 2 {
            let next = (i + 1) % self.vertices.len();

            if (self.vertices[i] - self.vertices[next]).magnitude() < 2. * h {
                // If point is NOT on a boundary, delete current point, ELSE delete next point
                if !on_boundary(&self.vertices[i]) {
                    self.vertices.remove(i);
                } else {
                    self.vertices.remove(next);
                    if next < i {
                        i -= 1;
                    }
                }
            } else {
                i += 1;
            }
        }

        if self.vertices.len() < 3 {
            self.vertices.clear();
            return Truncation::Rejected;
        }

        // Update which boundaries the polygon touches
        for v in self.vertices.iter() {
            for axis in 0..3 {
                if v[axis] >= half[axis] - eps {
                    self.faces[2 * axis] = true;
                } else if v[axis] <= -half[axis] + eps {
                    self.faces[2 * axis + 1] = true;
                }
            }
        }

        Truncation::Truncated
    }
}
