use parry3d_f64::na::Point3;

use crate::{
    fracture::poly::Poly,
    math_functions::{max_elmt_idx, sum_dev_ary3},
};

/// Chord cut from `poly` by the plane of `plane`.
///
/// Walks the vertices of `poly` computing signed distances to the plane defined
/// by the first vertex and normal of `plane`. A vertex on the plane or an edge
/// crossing the plane gives a chord end point. At most two points are collected;
/// a single point (a vertex touching the plane) is duplicated.
fn plane_chord(plane: &Poly, poly: &Poly, eps: f64) -> Option<[Point3<f64>; 2]> {
    let origin = plane.vertices[0];
    let normal = plane.normal;
    let n_vertices = poly.vertices.len();
    let mut pts = Vec::with_capacity(2);

    let mut prev = poly.vertices[n_vertices - 1];
    let mut prevdist = (prev - origin).dot(&normal);

    for curr in poly.vertices.iter() {
        // vector of vertex1 to a vertex of poly dot normal of plane,
        // its absolute value is the distance
        let currdist = (curr - origin).dot(&normal);

        if prevdist.abs() < eps {
            // Previous point is intersection point
            pts.push(prev);
        } else {
            let mut curr_times_prev = currdist * prevdist;

            if curr_times_prev.abs() < eps {
                curr_times_prev = 0.;
            }

            if curr_times_prev < 0. {
                // Consecutive vertices are at opposite sides of the plane
                let c = prevdist.abs() / (currdist.abs() + prevdist.abs());
                pts.push(prev + (curr - prev) * c);
            }
        }

        prev = *curr;
        prevdist = currdist;

        if pts.len() == 2 {
            break;
        }
    }

    let mut chord = match pts[..] {
        [] => return None,
        [p] => [p, p],
        [p1, p2, ..] => [p1, p2],
    };

    for coord in chord.iter_mut().flat_map(|p| p.coords.iter_mut()) {
        if coord.abs() < eps {
            *coord = 0.;
        }
    }

    Some(chord)
}

/// Chosen end of the overlap: the bound from one chord, or the average of both
/// chords' bounds when they coincide.
fn overlap_end(
    a: (f64, Point3<f64>),
    b: (f64, Point3<f64>),
    lower: bool,
    eps: f64,
) -> (f64, Point3<f64>) {
    if (a.0 - b.0).abs() <= eps {
        ((a.0 + b.0) * 0.5, Point3::from((a.1.coords + b.1.coords) * 0.5))
    } else if (a.0 > b.0) == lower {
        // Lower end of the overlap is the larger of the lower bounds,
        // upper end the smaller of the upper bounds
        a
    } else {
        b
    }
}

/// Find Intersections
///
/// Finds intersection end points of two intersecting polygons (Poly 1 and Poly 2).
/// Assumes the bounding boxes of the polygons overlap.
///
/// Each polygon cuts a chord from the other along the line where their planes
/// meet. The chords are projected on the coordinate axis of largest spread,
/// and the intersection is the overlap of the two chords.
///
/// The result does not depend on the order of the arguments: the first end
/// point is always the lower end along the projection axis.
///
/// # Arguments
///
/// * `poly1` - Poly 1
/// * `poly2` - Poly 2
/// * `eps` - Epsilon value for floating point comparisons
///
/// # Returns
///
/// Intersection end points, or `None` if the polygons do not intersect
pub fn find_intersections(poly1: &Poly, poly2: &Poly, eps: f64) -> Option<[Point3<f64>; 2]> {
    let chord1 = plane_chord(poly1, poly2, eps)?;
    let chord2 = plane_chord(poly2, poly1, eps)?;

    let pts = [chord1[0], chord1[1], chord2[0], chord2[1]];
    let axis = max_elmt_idx(&sum_dev_ary3(&pts));

    let bounds = |chord: &[Point3<f64>; 2]| {
        let (a, b) = (chord[0][axis], chord[1][axis]);

        if a <= b {
            ((a, chord[0]), (b, chord[1]))
        } else {
            ((b, chord[1]), (a, chord[0]))
        }
    };

    let (lo1, hi1) = bounds(&chord1);
    let (lo2, hi2) = bounds(&chord2);

    let lo = overlap_end(lo1, lo2, true, eps);
    let hi = overlap_end(hi1, hi2, false, eps);

    if hi.0 - lo.0 <= eps {
        // Chords do not overlap, the polygons touch at most
        return None;
    }

    Some([lo.1, hi.1])
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use parry3d_f64::na::Vector3;

    use super::*;

    const EPS: f64 = 1e-10;

    fn square(normal: Vector3<f64>, center: Vector3<f64>) -> Poly {
        let mut poly = Poly::new_rect(0.5, 1.);
        poly.rotation_3d(&normal.normalize(), EPS);
        poly.translate(center);
        poly.assign_bounding_box();
        poly
    }

    #[test]
    fn perpendicular_squares() {
        let p1 = square(Vector3::z(), Vector3::zeros());
        let p2 = square(Vector3::x(), Vector3::zeros());

        let [a, b] = find_intersections(&p1, &p2, EPS).unwrap();
        assert_abs_diff_eq!((b - a).magnitude(), 1., epsilon = 1e-9);
        assert_abs_diff_eq!(a.x, 0., epsilon = 1e-9);
        assert_abs_diff_eq!(a.z, 0., epsilon = 1e-9);
    }

    #[test]
    fn symmetric_in_arguments() {
        let p1 = square(Vector3::new(0.3, 0.1, 1.), Vector3::new(0.1, 0., 0.));
        let p2 = square(Vector3::new(1., 0.2, 0.1), Vector3::new(0., 0.2, 0.05));

        let forward = find_intersections(&p1, &p2, EPS).unwrap();
        let backward = find_intersections(&p2, &p1, EPS).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn planes_cross_outside_polygons() {
        let p1 = square(Vector3::z(), Vector3::zeros());
        let p2 = square(Vector3::x(), Vector3::new(0., 1.2, 0.));

        assert!(find_intersections(&p1, &p2, EPS).is_none());
    }

    #[test]
    fn polygons_touching_at_edge() {
        let p1 = square(Vector3::z(), Vector3::zeros());
        // Second square stands on the edge x = 0.5 of the first one
        let p2 = square(Vector3::x(), Vector3::new(0.5, 0., 0.5));

        let [a, b] = find_intersections(&p1, &p2, EPS).unwrap();
        assert_abs_diff_eq!(a.x, 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(b.x, 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!((b - a).magnitude(), 1., epsilon = 1e-9);
    }
}
