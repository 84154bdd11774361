use parry3d_f64::{
    bounding_volume::{Aabb, BoundingVolume},
    na::{Matrix3, Point3, Vector3},
};

mod fram;
mod intersection;
mod intersection_checking;
mod polygon_boundary;

pub use fram::{
    RejectCode, COS_MIN_TRIPLE_ANGLE, FIRST_NODE_FACTOR, SHRINK_LIMIT_FACTOR,
    TRIPLE_POINT_MIN_DIST_FACTOR,
};
pub use intersection::find_intersections;
pub use polygon_boundary::{boundary_extent, clip_to_boundary, in_polygon_boundary};
pub use intersection_checking::intersection_checking;

/// Check if two unit vectors are parallel, in either direction.
///
/// # Arguments
///
/// * `v1` - Unit vector 1
/// * `v2` - Unit vector 2
/// * `eps` - Epsilon value for floating point comparisons
pub fn is_parallel(v1: &Vector3<f64>, v2: &Vector3<f64>, eps: f64) -> bool {
    let dot_prod = v1.dot(v2).abs();
    1. - eps < dot_prod && dot_prod < 1. + eps
}

/// Rotation matrix taking unit vector `normal_a` onto unit vector `normal_b`.
///
/// RotMatrix = I + V + V^2((1-cos)/sin^2)), where V is the cross product matrix
/// of A x B. Since vectors are normalized, sin = magnitude(AxB) and cos = A dot B.
///
/// Parallel normals give the identity. Opposite normals give a half turn about
/// an axis perpendicular to `normal_a`.
///
/// # Arguments
///
/// * `normal_a` - Current normal
/// * `normal_b` - Target normal
/// * `eps` - Epsilon value for floating point comparisons
pub fn rotation_matrix(normal_a: &Vector3<f64>, normal_b: &Vector3<f64>, eps: f64) -> Matrix3<f64> {
    let cos = normal_a.dot(normal_b);

    if cos > 1. - eps {
        return Matrix3::identity();
    }

    if cos < -1. + eps {
        // Any axis perpendicular to A works, pick the one least aligned with A
        let helper = if normal_a.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        let k = normal_a.cross(&helper).normalize();
        return k * k.transpose() * 2. - Matrix3::identity();
    }

    let x_prod = normal_a.cross(normal_b);
    let sin = x_prod.magnitude();
    let v = x_prod.cross_matrix();

    Matrix3::identity() + v + v * v * ((1. - cos) / (sin * sin))
}

/// Axis-aligned bounding box of a set of points.
pub fn bounding_box(points: &[Point3<f64>]) -> Aabb {
    let mut aabb = Aabb::new_invalid();

    for pt in points {
        aabb.take_point(*pt);
    }

    aabb
}

/// Check Bounding Box
///
/// Compares two bounding boxes, touching boxes count as overlapping.
pub fn check_bounding_box(aabb1: &Aabb, aabb2: &Aabb) -> bool {
    aabb1.intersects(aabb2)
}

/// Shortest Disatance, point to line seg
///
/// # Arguments
///
/// * `point` - Point in 3d space
/// * `line` - Line defined by two end points
/// * `eps` - Epsilon value for floating point comparisons
///
/// # Returns
///
/// * `f64` - Shortest distance between point and line segment
pub fn point_to_line_seg(point: &Point3<f64>, line: &[Point3<f64>; 2], eps: f64) -> f64 {
    let l1l2 = line[1] - line[0];
    let sqr_line_len = l1l2.magnitude_squared();

    if sqr_line_len < eps {
        // Line endpoints are equal to each other
        return (point - line[0]).magnitude();
    }

    // Find parameterization for line projection on [0, 1]
    let t = ((point - line[0]).dot(&l1l2) / sqr_line_len).clamp(0., 1.);
    let projection = line[0] + l1l2 * t;

    (projection - point).magnitude()
}

/// Is Point On Line Segment
///
/// If mag(A to pt) + mag(pt to B) = mag(A to B), pt is on the segment.
pub fn point_on_line_seg(pt: &Point3<f64>, line: &[Point3<f64>; 2], eps: f64) -> bool {
    let end_pt_to_end_pt_dist = (line[1] - line[0]).magnitude();
    let end_pt_to_pt_dist = (pt - line[0]).magnitude();
    let pt_to_end_pt_dist = (line[1] - pt).magnitude();
    let result = end_pt_to_pt_dist + pt_to_end_pt_dist - end_pt_to_end_pt_dist;

    -eps < result && result < eps
}

/// Closest Distance from Line Seg to Line Seg
///
/// Calculates the distance between two line segments, and the crossing
/// point when the segments cross at a single point.
///
/// # Arguments
///
/// * `line1` - Line 1 defined by two end points
/// * `line2` - Line 2 defined by two end points
/// * `eps` - Epsilon value for floating point comparisons
///
/// # Returns
///
/// Minimum distance between line 1 and line 2, and the point of intersection.
/// The point is `None` unless the lines cross on both segments; overlapping
/// collinear segments have distance 0 and no single crossing point.
pub fn line_seg_to_line_seg(
    line1: &[Point3<f64>; 2],
    line2: &[Point3<f64>; 2],
    eps: f64,
) -> (f64, Option<Point3<f64>>) {
    let d1 = line1[1] - line1[0];
    let d2 = line2[1] - line2[0];

    if d1.magnitude() < eps || d2.magnitude() < eps {
        return (line_seg_to_line_seg_sep(line1, line2, eps), None);
    }

    let p1 = &line1[0];
    let p2 = &line2[0];
    let v1 = d1.normalize();
    let v2 = d2.normalize();

    if is_parallel(&v1, &v2, eps) {
        let p1p2 = p1 - p2;
        let collinear = p1p2.magnitude() < eps || is_parallel(&p1p2.normalize(), &v1, eps);

        if collinear
            && (point_on_line_seg(&line1[0], line2, eps)
                || point_on_line_seg(&line1[1], line2, eps)
                || point_on_line_seg(&line2[0], line1, eps))
        {
            // Line segs overlap
            return (0., None);
        }

        // Parallel or colinear, but not overlapping
        return (line_seg_to_line_seg_sep(line1, line2, eps), None);
    }

    // Point of intersection if lines intersect
    let v1xv2 = v1.cross(&v2);
    let denom = v1xv2.dot(&v1xv2);
    let t = (p2 - p1).cross(&v2).dot(&v1xv2) / denom;
    let pt = p1 + v1 * t;

    if point_on_line_seg(&pt, line1, eps) && point_on_line_seg(&pt, line2, eps) {
        (0., Some(pt))
    } else {
        // Intersection does not occur on both lines, find min distance from 4 endpoints to other line seg
        (line_seg_to_line_seg_sep(line1, line2, eps), None)
    }
}

/// Dist. from line seg to line seg (seperated lines)
///
/// Minimum distance from the 4 endpoints to the other segment.
pub fn line_seg_to_line_seg_sep(
    line1: &[Point3<f64>; 2],
    line2: &[Point3<f64>; 2],
    eps: f64,
) -> f64 {
    let dist = f64::min(
        point_to_line_seg(&line1[0], line2, eps),
        point_to_line_seg(&line1[1], line2, eps),
    );
    let temp = f64::min(
        point_to_line_seg(&line2[0], line1, eps),
        point_to_line_seg(&line2[1], line1, eps),
    );

    f64::min(dist, temp)
}
