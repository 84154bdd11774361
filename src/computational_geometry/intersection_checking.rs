use parry3d_f64::na::Point3;

use super::{check_bounding_box, fram::fram, find_intersections, RejectCode};
use crate::{
    fracture::{cluster_groups::ClusterGroups, poly::Poly},
    structures::{
        GroupId, IntersectionId, IntersectionPoints, PolyId, PolyOptions, Stats, TriplePointId,
    },
};

/// INTERSECTION CHECKING
///
/// Checks for intersections with all polys whos bounding boxes intersect, and runs FRAM
/// on the intersections one at a time. At the first FRAM rejection, further intersection
/// checking is aborted and nothing is saved.
///
/// When every intersection passes, the intersections and triple points are saved, the
/// intersected polygons get references to them, and the cluster groups are updated.
/// The caller needs to push 'new_poly' into the accepted poly array when this function
/// returns `Ok`.
///
/// # Arguments
///
/// * `opts` - Minimum feature size, tolerances and FRAM switches
/// * `new_poly` - Polygon being tested (newest poly to come into the DFN)
/// * `accepted_poly` - Array of all accepted polygons
/// * `int_pts_list` - Array of all accepted intersections
/// * `triple_points` - Array of all accepted triple intersection points
/// * `groups` - Fracture cluster bookkeeping
/// * `pstats` - Program statistics structure
///
/// # Returns
///
/// `Ok(())` if the fracture had no intersections or features violating the minimum
/// feature size h, the FRAM rejection reason otherwise
#[allow(clippy::too_many_arguments)]
pub fn intersection_checking(
    opts: &PolyOptions,
    new_poly: &mut Poly,
    accepted_poly: &mut [Poly],
    int_pts_list: &mut Vec<IntersectionPoints>,
    triple_points: &mut Vec<Point3<f64>>,
    groups: &mut ClusterGroups,
    pstats: &mut Stats,
) -> Result<(), RejectCode> {
    // Fractures the new fracture intersected, aligned with temp_int_pts
    let mut temp_intersect_list = Vec::new();
    let mut temp_int_pts: Vec<IntersectionPoints> = Vec::new();
    let mut temp_original_length = Vec::new();
    let mut temp_data = Vec::new();
    let mut encountered_groups: Vec<GroupId> = Vec::new();
    let mut new_group = None;

    // Index to newPoly's position if accepted
    let new_poly_index = PolyId(accepted_poly.len());
    let int_pts_index = int_pts_list.len();

    for (ii, poly) in accepted_poly.iter().enumerate() {
        if !check_bounding_box(&new_poly.bounding_box, &poly.bounding_box) {
            continue;
        }

        pstats.intersection_tests += 1;

        let Some([p1, p2]) = find_intersections(new_poly, poly, opts.eps) else {
            continue;
        };

        let mut intersection = IntersectionPoints::new(p1, p2);
        let original_length = intersection.length();

        fram(
            opts,
            &mut intersection,
            temp_int_pts.len(),
            int_pts_list,
            new_poly,
            poly,
            &mut temp_data,
            triple_points,
            &temp_int_pts,
        )?;

        intersection.fract1 = PolyId(ii);
        intersection.fract2 = new_poly_index;
        temp_intersect_list.push(PolyId(ii));
        temp_original_length.push(original_length);
        temp_int_pts.push(intersection);

        // The new fracture joins the group of the first fracture it intersects,
        // any other group it touches gets merged
        if let Some(group) = poly.group {
            match new_group {
                None => new_group = Some(group),
                Some(g) if g != group && !encountered_groups.contains(&group) => {
                    encountered_groups.push(group)
                }
                _ => {}
            }
        }
    }

    // All FRAM tests have passed. Polygon is accepted.

    // Keep track of how much intersection length is lost to shrinking
    for (intersection, original_length) in temp_int_pts.iter().zip(temp_original_length) {
        pstats.original_length += original_length;

        if intersection.intersection_shortened {
            pstats.intersections_shortened += 1;
            pstats.discarded_length += original_length - intersection.length();
        }
    }

    for (i, other) in temp_intersect_list.iter().enumerate() {
        let id = IntersectionId(int_pts_index + i);
        accepted_poly[other.index()].intersection_index.push(id);
        new_poly.intersection_index.push(id);
    }

    int_pts_list.extend(temp_int_pts);

    // A triple point is saved once, every intersection through it gets a reference
    if opts.triple_intersections {
        for tmp in temp_data {
            let trip_index = TriplePointId(triple_points.len());
            triple_points.push(tmp.triple_point);

            for id in tmp.int_index {
                int_pts_list[id.index()].triple_points_idx.push(trip_index);
            }
        }
    }

    match new_group {
        None => groups.assign_group(new_poly, new_poly_index),
        Some(group) => groups.update_groups(
            new_poly,
            accepted_poly,
            &encountered_groups,
            group,
            new_poly_index,
        ),
    }

    Ok(())
}
