use approx::assert_abs_diff_eq;
use parry3d_f64::na::Vector3;

use dfn_fram::computational_geometry::find_intersections;
use dfn_fram::fracture::poly::{Poly, Truncation};
use dfn_fram::structures::{GroupId, PolyId, PolyOptions, TriplePointId};
use dfn_fram::FractureNetwork;

fn opts() -> PolyOptions {
    PolyOptions::new(0.1, Vector3::new(10., 10., 10.))
}

/// Square of side `2 * radius` with the given normal, centered at `center`.
fn square(radius: f64, normal: Vector3<f64>, center: Vector3<f64>, eps: f64) -> Poly {
    let mut poly = Poly::new_rect(radius, 1.);
    poly.rotation_3d(&normal.normalize(), eps);
    poly.translate(center);
    poly.assign_bounding_box();
    poly
}

#[test]
fn perpendicular_unit_squares_intersect_once() {
    let opts = opts();
    let mut network = FractureNetwork::new(0);

    let mut first = square(0.5, Vector3::z(), Vector3::zeros(), opts.eps);
    let mut second = square(0.5, Vector3::x(), Vector3::zeros(), opts.eps);

    assert_eq!(network.try_insert(&opts, &mut first), Ok(PolyId(0)));
    assert_eq!(network.try_insert(&opts, &mut second), Ok(PolyId(1)));

    assert_eq!(network.intersections.len(), 1);
    let intersection = &network.intersections[0];
    assert_abs_diff_eq!(intersection.length(), 1., epsilon = 1e-9);
    assert_eq!(intersection.fract1, PolyId(0));
    assert_eq!(intersection.fract2, PolyId(1));
    assert!(!intersection.intersection_shortened);
}

#[test]
fn separated_squares_are_culled_by_bounding_box() {
    let opts = opts();
    let mut network = FractureNetwork::new(0);

    let mut first = square(0.5, Vector3::z(), Vector3::zeros(), opts.eps);
    let mut second = square(0.5, Vector3::x(), Vector3::new(3., 0., 0.), opts.eps);

    network.try_insert(&opts, &mut first).unwrap();
    network.try_insert(&opts, &mut second).unwrap();

    assert_eq!(network.stats.intersection_tests, 0);
    assert!(network.intersections.is_empty());
    assert_eq!(network.accepted_poly[0].group, Some(GroupId(1)));
    assert_eq!(network.accepted_poly[1].group, Some(GroupId(2)));
    assert_eq!(network.groups.valid_groups(), 2);
}

#[test]
fn three_orthogonal_squares_share_one_triple_point() {
    let opts = opts();
    let mut network = FractureNetwork::new(0);

    for normal in [Vector3::z(), Vector3::x(), Vector3::y()] {
        let mut poly = square(0.5, normal, Vector3::zeros(), opts.eps);
        network.try_insert(&opts, &mut poly).unwrap();
    }

    assert_eq!(network.intersections.len(), 3);
    assert_eq!(network.triple_points.len(), 1);
    assert_abs_diff_eq!(network.triple_points[0].coords, Vector3::zeros(), epsilon = 1e-9);

    for intersection in network.intersections.iter() {
        assert_eq!(intersection.triple_points_idx, vec![TriplePointId(0)]);
    }

    assert_eq!(network.groups.valid_groups(), 1);
}

#[test]
fn triple_point_rejected_when_disabled() {
    let mut opts = opts();
    opts.triple_intersections = false;
    let mut network = FractureNetwork::new(0);

    let mut z = square(0.5, Vector3::z(), Vector3::zeros(), opts.eps);
    let mut x = square(0.5, Vector3::x(), Vector3::zeros(), opts.eps);
    let mut y = square(0.5, Vector3::y(), Vector3::zeros(), opts.eps);

    network.try_insert(&opts, &mut z).unwrap();
    network.try_insert(&opts, &mut x).unwrap();
    assert!(network.try_insert(&opts, &mut y).is_err());

    assert_eq!(network.len(), 2);
    assert_eq!(network.intersections.len(), 1);
    assert!(network.triple_points.is_empty());
}

#[test]
fn find_intersections_is_symmetric() {
    let eps = opts().eps;
    let normals = [
        Vector3::new(0.3, -0.2, 1.),
        Vector3::new(1., 0.4, 0.1),
        Vector3::new(-0.5, 1., 0.7),
        Vector3::new(0.1, 0.1, -1.),
    ];
    let polys: Vec<Poly> = normals
        .iter()
        .enumerate()
        .map(|(i, n)| square(1. + 0.1 * i as f64, *n, Vector3::new(0.1 * i as f64, 0., 0.), eps))
        .collect();

    for a in polys.iter() {
        for b in polys.iter() {
            let ab = find_intersections(a, b, eps);
            let ba = find_intersections(b, a, eps);

            match (ab, ba) {
                (None, None) => {}
                (Some([p1, p2]), Some([q1, q2])) => {
                    assert_abs_diff_eq!(p1.coords, q1.coords, epsilon = 1e-9);
                    assert_abs_diff_eq!(p2.coords, q2.coords, epsilon = 1e-9);
                }
                other => panic!("asymmetric result: {:?}", other),
            }
        }
    }
}

#[test]
fn truncating_an_inside_polygon_is_a_no_op() {
    let opts = opts();
    let mut poly = square(1., Vector3::new(1., 1., 1.), Vector3::new(1., -2., 0.5), opts.eps);
    let before = poly.vertices.clone();

    for _ in 0..2 {
        assert_eq!(
            poly.domain_truncation(opts.h, opts.eps, &opts.domain_size),
            Truncation::Unchanged
        );
        assert!(!poly.truncated);
        assert_eq!(poly.vertices, before);
    }
}

#[test]
fn outside_polygon_loses_its_vertices() {
    let opts = opts();
    let mut poly = square(1., Vector3::z(), Vector3::new(20., 0., 0.), opts.eps);

    assert_eq!(
        poly.domain_truncation(opts.h, opts.eps, &opts.domain_size),
        Truncation::Rejected
    );
    assert!(poly.vertices.is_empty());
}

#[test]
fn committed_intersections_respect_minimum_feature_size() {
    let opts = opts();
    let mut network = FractureNetwork::new(0);

    // Fan of tilted squares through a common area, many get rejected
    for i in 0..40 {
        let angle = i as f64 * 0.37;
        let normal = Vector3::new(angle.cos(), angle.sin(), 0.3 * (i % 3) as f64);
        let center = Vector3::new(0.05 * (i % 5) as f64, -0.07 * (i % 4) as f64, 0.02 * i as f64);
        let mut poly = square(0.6 + 0.02 * i as f64, normal, center, opts.eps);
        let _ = network.try_insert(&opts, &mut poly);
    }

    assert!(!network.intersections.is_empty());

    for intersection in network.intersections.iter() {
        assert!(
            intersection.length() >= opts.h || !intersection.triple_points_idx.is_empty(),
            "intersection of length {} below h",
            intersection.length()
        );
    }
}

#[test]
fn intersecting_fractures_share_a_valid_group() {
    let opts = opts();
    let mut network = FractureNetwork::new(0);

    for i in 0..30 {
        let angle = i as f64 * 0.9;
        let normal = Vector3::new(angle.cos(), angle.sin(), 0.5);
        let center = Vector3::new((i % 6) as f64 - 2.5, (i % 5) as f64 - 2., (i % 4) as f64 - 1.5);
        let mut poly = square(0.9, normal, center, opts.eps);
        let _ = network.try_insert(&opts, &mut poly);
    }

    for intersection in network.intersections.iter() {
        let g1 = network.accepted_poly[intersection.fract1.index()].group;
        let g2 = network.accepted_poly[intersection.fract2.index()].group;

        assert_eq!(g1, g2);
        let group = g1.expect("accepted fractures have a group");
        assert!(network.groups.data(group).valid);
    }
}
