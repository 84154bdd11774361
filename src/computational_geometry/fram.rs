use std::fmt::{Display, Formatter};

use parry3d_f64::na::{distance, Point3};

use super::{line_seg_to_line_seg, point_to_line_seg};
use crate::{
    fracture::poly::Poly,
    structures::{IntersectionId, IntersectionPoints, PolyOptions, TriplePtTempData},
};

/// Intersections may shrink to this fraction of their original length.
pub const SHRINK_LIMIT_FACTOR: f64 = 0.9;
/// Tolerance, in units of h, for the first discretized node of an
/// intersection starting on a polygon edge.
pub const FIRST_NODE_FACTOR: f64 = 0.4;
/// Minimum distance between triple intersection points, in units of h.
pub const TRIPLE_POINT_MIN_DIST_FACTOR: f64 = 1.5;
/// cos(47 deg), smallest angle allowed between intersections meeting at a triple point.
pub const COS_MIN_TRIPLE_ANGLE: f64 = 0.68199836;

/// Reasons FRAM rejects a fracture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectCode {
    CloseToNode,
    ShortIntersection,
    InterCloseToInter,
    CloseToEdge,
    SamePlane,
    TripleDisabled,
    TripleCloseToIntersection,
    TripleSmallAngle,
    TripleCloseToEndPoint,
    TripleCloseToTriplePoint,
}

impl RejectCode {
    pub fn code(&self) -> i32 {
        match self {
            RejectCode::CloseToNode => -1,
            RejectCode::ShortIntersection => -2,
            RejectCode::InterCloseToInter => -5,
            RejectCode::CloseToEdge => -6,
            RejectCode::SamePlane => -7,
            RejectCode::TripleDisabled => -10,
            RejectCode::TripleCloseToIntersection => -11,
            RejectCode::TripleSmallAngle => -12,
            RejectCode::TripleCloseToEndPoint => -13,
            RejectCode::TripleCloseToTriplePoint => -14,
        }
    }
}

impl Display for RejectCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            RejectCode::CloseToNode => "Fracture too close to a node.",
            RejectCode::ShortIntersection => "Intersection of length < h.",
            RejectCode::InterCloseToInter => {
                "Intersection too close to another intersection."
            }
            RejectCode::CloseToEdge => "Fracture too close to another fracture's edge.",
            RejectCode::SamePlane => "Fractures intersecting on same plane.",
            RejectCode::TripleDisabled => {
                "Rejected triple intersection due to triple intersections being turned off in input file."
            }
            RejectCode::TripleCloseToIntersection => {
                "Fracture's intersection landed too close to a previous intersection."
            }
            RejectCode::TripleSmallAngle => {
                "Fracture created a triple intersection with an angle too small."
            }
            RejectCode::TripleCloseToEndPoint => {
                "Fracture created a triple intersection with the triple intersection point too close to an intersection's endpoint."
            }
            RejectCode::TripleCloseToTriplePoint => {
                "Fracture created a triple intersection with the triple intersection point too close to another triple intersection point."
            }
        };

        write!(f, "rejectCode = {}: {}", self.code(), reason)
    }
}

/// FRAM - Feature Rejection Algorithm for Meshing
///
/// Checks new poly and new intersection against other intersecting polygons
/// for violation of minimum feature size 'h'.
/// In some cases, the intersection may be shortened in order to accept the fracture.
///
/// # Arguments
///
/// * `opts` - Minimum feature size, tolerances and FRAM switches
/// * `int_pts` - Newest intersection found on new poly
/// * `count` - Number of intersections already accepted on new poly
/// * `int_pts_list` - Intersection endpoints list for entire DFN
/// * `new_poly` - New poly, poly being checked with FRAM
/// * `poly2` - Poly which new poly intersects with
/// * `temp_data` - Temp triple point data. Must keep intersections and triple points as temp data untill newPoly has been accepted
/// * `triple_points` - Triple points for entire DFN
/// * `temp_int_pts` - Intersections already accepted on new poly
///
/// # Returns
///
/// `Ok(())` if the intersection is accepted, the reason otherwise
#[allow(clippy::too_many_arguments)]
pub fn fram(
    opts: &PolyOptions,
    int_pts: &mut IntersectionPoints,
    count: usize,
    int_pts_list: &[IntersectionPoints],
    new_poly: &Poly,
    poly2: &Poly,
    temp_data: &mut Vec<TriplePtTempData>,
    triple_points: &[Point3<f64>],
    temp_int_pts: &[IntersectionPoints],
) -> Result<(), RejectCode> {
    if opts.disable_fram {
        return Ok(());
    }

    let (h, eps) = (opts.h, opts.eps);

    // Check for intersection of length less than h
    let length = int_pts.length();
    if length < h {
        return Err(RejectCode::ShortIntersection);
    }

    if !opts.r_fram {
        // Distance to edges, the intersection may shrink to 'shrink_limit'
        let shrink_limit = SHRINK_LIMIT_FACTOR * length;
        check_close_edge(new_poly, int_pts, shrink_limit, h, eps)?;
        check_close_edge(poly2, int_pts, shrink_limit, h, eps)?;

        // Shrinking must not leave an intersection shorter than h
        if int_pts.length() < h {
            return Err(RejectCode::ShortIntersection);
        }
    }

    let triple = check_for_triple_intersections(
        opts,
        int_pts,
        count,
        int_pts_list,
        poly2,
        temp_data,
        triple_points,
    );

    if !opts.r_fram {
        triple?;

        // Intersection to intersection distance checks
        check_dist_to_old_intersections(int_pts_list, int_pts, poly2, h, eps)?;
        check_dist_to_new_intersections(temp_int_pts, int_pts, temp_data, h, eps)?;
    }

    // The intersection has already been found, so if the normals are
    // the same the polygons lie on the same plane. Opposite normals pass.
    if (new_poly.normal - poly2.normal).iter().all(|d| d.abs() < eps) {
        return Err(RejectCode::SamePlane);
    }

    Ok(())
}

fn same_point(p1: &Point3<f64>, p2: &Point3<f64>, eps: f64) -> bool {
    (p1 - p2).iter().all(|d| d.abs() < eps)
}

/// New intersction to Old Intersections Check
///
/// Rejects if the new intersection is closer than `min_distance` to any
/// intersection already on poly2, without touching it.
fn check_dist_to_old_intersections(
    int_pts_list: &[IntersectionPoints],
    int_pts: &IntersectionPoints,
    poly2: &Poly,
    min_distance: f64,
    eps: f64,
) -> Result<(), RejectCode> {
    let intersection = int_pts.end_points();

    for idx in poly2.intersection_index.iter() {
        let int2 = int_pts_list[idx.index()].end_points();
        let (dist, _) = line_seg_to_line_seg(&intersection, &int2, eps);

        if dist < (min_distance - eps) && dist > eps {
            return Err(RejectCode::InterCloseToInter);
        }
    }

    Ok(())
}

/// New intersction to New Intersections Check
///
/// Checks distance of new intersection to other intersections on newPoly.
///
/// If the distance between two intersections is 0, the crossing point must be
/// a triple intersection point recorded in `temp_tri_pts`. Due to the shrink
/// algorithm, a triple intersection point may exist on only one fracture;
/// such fractures are rejected.
fn check_dist_to_new_intersections(
    temp_int_pts: &[IntersectionPoints],
    int_pts: &IntersectionPoints,
    temp_tri_pts: &[TriplePtTempData],
    min_distance: f64,
    eps: f64,
) -> Result<(), RejectCode> {
    let intersection = int_pts.end_points();

    for tmp_int in temp_int_pts {
        let (dist, pt) = line_seg_to_line_seg(&intersection, &tmp_int.end_points(), eps);

        if dist < min_distance && dist > eps {
            return Err(RejectCode::InterCloseToInter);
        }

        if dist <= eps {
            let recorded = pt.is_some_and(|pt| {
                temp_tri_pts
                    .iter()
                    .any(|tmp_tri| same_point(&pt, &tmp_tri.triple_point, eps))
            });

            if !recorded {
                return Err(RejectCode::InterCloseToInter);
            }
        }
    }

    Ok(())
}

/// Shrink Intersection
///
/// Shrinks intersection untill the intersection is further than 'global_min_dist'
/// from 'edge', or rejects when the intersection shrinks to less than 'shrink_limit'.
///
/// The intersection is discretized into n = ceil(2 * length / h) nodes and walked
/// inward from each end. 'first_node_min_dist' allows a shorter first node distance,
/// so intersections starting on an edge at a slight angle are not shortened.
fn shrink_intersection(
    int_pts: &mut IntersectionPoints,
    edge: &[Point3<f64>; 2],
    shrink_limit: f64,
    first_node_min_dist: f64,
    global_min_dist: f64,
    eps: f64,
) -> Result<(), RejectCode> {
    let pt = int_pts.p1;
    let vect = int_pts.p2 - int_pts.p1;
    // n is number of discrete points on intersection
    let n = ((2. * vect.magnitude() / global_min_dist).ceil() as usize).max(1);
    let step_size = 1. / n as f64;

    for from_p2 in [false, true] {
        let (mut step, direction) = if from_p2 { (1., -1.) } else { (0., 1.) };
        let first_pt_dist_to_edge = point_to_line_seg(&(pt + vect * step), edge, eps);
        let mut node_count = 0;

        loop {
            node_count += 1;
            step += direction * step_size;

            let pt_on_intersection = pt + vect * step;
            let dist = point_to_line_seg(&pt_on_intersection, edge, eps);

            if node_count == 1
                && dist > first_node_min_dist
                && (first_pt_dist_to_edge < eps || first_pt_dist_to_edge >= global_min_dist)
            {
                // Leave intersection end point un-modified
                break;
            }

            if dist > global_min_dist {
                if from_p2 {
                    int_pts.p2 = pt_on_intersection;
                } else {
                    int_pts.p1 = pt_on_intersection;
                }

                int_pts.intersection_shortened = true;
                break;
            }

            if node_count >= n {
                // All nodes are bad
                return Err(RejectCode::CloseToEdge);
            }
        }
    }

    if int_pts.length() < shrink_limit {
        return Err(RejectCode::CloseToEdge);
    }

    Ok(())
}

/// Distance from intersection line to Nodes/Vertices
///
/// Rejects if any vertex of `poly` is closer than `min_dist` to the
/// intersection without lying on it.
fn check_distance_from_nodes(
    poly: &Poly,
    int_pts: &IntersectionPoints,
    min_dist: f64,
    eps: f64,
) -> Result<(), RejectCode> {
    let line = int_pts.end_points();

    for vertex in poly.vertices.iter() {
        let dist = point_to_line_seg(vertex, &line, eps);

        if dist < min_dist && dist > eps {
            return Err(RejectCode::CloseToNode);
        }
    }

    Ok(())
}

/// Check if nodes are too close to edge
///
/// Checks distances from intersection to poly edges. If the distance is less than
/// h, the intersection is allowed to shrink by 10% of its original length. If
/// the intersection is still closer than h to a poly edge, the polygon is rejected.
///
/// # Arguments
///
/// * `poly` - Poly to be tested
/// * `int_pts` - Intersection to be tested, may be shortened
/// * `shrink_limit` - Minimum length the intersection is allowed to shrink to
/// * `min_dist` - Minimum distance allowed from an end point to the edge of a polygon
///     if the intersection does not land accross a poly's edge
/// * `eps` - Epsilon value for floating point comparisons
fn check_close_edge(
    poly: &Poly,
    int_pts: &mut IntersectionPoints,
    shrink_limit: f64,
    min_dist: f64,
    eps: f64,
) -> Result<(), RejectCode> {
    // If both end points of intersection are on polys edge,
    // we must check the distance from end points to vertices
    let mut on_edge_count = 0;
    let n_nodes = poly.vertices.len();

    for i in 0..n_nodes {
        let edge = [poly.vertices[i], poly.vertices[(i + 1) % n_nodes]];
        let line = int_pts.end_points();
        let mut end_pts_to_edge = [
            point_to_line_seg(&line[0], &edge, eps),
            point_to_line_seg(&line[1], &edge, eps),
            point_to_line_seg(&edge[0], &line, eps),
            point_to_line_seg(&edge[1], &line, eps),
        ];
        end_pts_to_edge.sort_by(f64::total_cmp);

        // If two smallest distances are < h,
        // the line is almost parallel and closer to edge than h
        if end_pts_to_edge[0] < min_dist && end_pts_to_edge[1] < min_dist && end_pts_to_edge[0] > eps
        {
            return Err(RejectCode::CloseToEdge);
        }

        let (dist, _) = line_seg_to_line_seg(&edge, &line, eps);

        if dist < min_dist && dist > eps {
            // Try to shrink the intersection slightly in order to not reject the polygon
            shrink_intersection(int_pts, &edge, shrink_limit, min_dist, min_dist, eps)?;
        } else if dist <= eps {
            // Endpoint is almost exactly on poly's edge, the discretized nodes
            // must not be closer than the minimum allowed distance
            let first_node_min_dist = FIRST_NODE_FACTOR * min_dist;
            shrink_intersection(int_pts, &edge, shrink_limit, first_node_min_dist, min_dist, eps)?;

            on_edge_count += 1;

            if on_edge_count >= 2 {
                check_distance_from_nodes(poly, int_pts, min_dist, eps)?;
            }
        }
    }

    #[cfg(feature = "disable_shortening_int")]
    if int_pts.intersection_shortened {
        return Err(RejectCode::CloseToEdge);
    }

    Ok(())
}

/// Check for Triple Intersection, get int. point
///
/// Checks the new intersection against the intersections already on poly2 for
/// triple intersection features of less than h. Accepted triple points are
/// recorded in `temp_data` with the ids of the intersections they lie on.
fn check_for_triple_intersections(
    opts: &PolyOptions,
    int_pts: &IntersectionPoints,
    count: usize,
    int_pts_list: &[IntersectionPoints],
    poly2: &Poly,
    temp_data: &mut Vec<TriplePtTempData>,
    triple_points: &[Point3<f64>],
) -> Result<(), RejectCode> {
    let (h, eps) = (opts.h, opts.eps);
    let min_dist = TRIPLE_POINT_MIN_DIST_FACTOR * h;
    let int_end_pts = int_pts.end_points();
    // Id of the current intersection once accepted
    let new_id = IntersectionId(int_pts_list.len() + count);

    for &old_id in poly2.intersection_index.iter() {
        let old = &int_pts_list[old_id.index()];
        let line = old.end_points();
        let (dist, pt) = line_seg_to_line_seg(&int_end_pts, &line, eps);

        if dist >= h {
            continue;
        }

        if !opts.triple_intersections {
            return Err(RejectCode::TripleDisabled);
        }

        if dist > eps {
            return Err(RejectCode::TripleCloseToIntersection);
        }

        // Angle check, A dot B = Mag(A)*Mag(B) * Cos(angle)
        let u = (line[1] - line[0]).normalize();
        let v = (int_end_pts[1] - int_end_pts[0]).normalize();

        if u.dot(&v).abs() > COS_MIN_TRIPLE_ANGLE {
            return Err(RejectCode::TripleSmallAngle);
        }

        // Segments only touch within tolerance at an end point
        let Some(pt) = pt else {
            return Err(RejectCode::TripleCloseToEndPoint);
        };

        if int_end_pts
            .iter()
            .chain(line.iter())
            .any(|end_pt| distance(&pt, end_pt) < h)
        {
            return Err(RejectCode::TripleCloseToEndPoint);
        }

        if old
            .triple_points_idx
            .iter()
            .any(|idx| distance(&pt, &triple_points[idx.index()]) < min_dist)
        {
            return Err(RejectCode::TripleCloseToTriplePoint);
        }

        // A triple point is found once per pair of its three intersections,
        // keep a single copy and collect the intersections referencing it
        match temp_data
            .iter_mut()
            .find(|tmp| same_point(&pt, &tmp.triple_point, eps))
        {
            Some(duplicate) => {
                for id in [old_id, new_id] {
                    if !duplicate.int_index.contains(&id) {
                        duplicate.int_index.push(id);
                    }
                }
            }
            None => temp_data.push(TriplePtTempData {
                triple_point: pt,
                int_index: vec![old_id, new_id],
            }),
        }
    }

    // Triple points on the new fracture must be far enough from each other
    for (k, tmp) in temp_data.iter().enumerate() {
        for other in temp_data.iter().skip(k + 1) {
            let dist = distance(&tmp.triple_point, &other.triple_point);

            if dist < min_dist && dist > eps {
                return Err(RejectCode::TripleCloseToTriplePoint);
            }
        }
    }

    Ok(())
}
