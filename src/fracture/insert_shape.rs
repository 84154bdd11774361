use parry3d_f64::na::Vector3;
use rand::Rng;
use tracing::{debug, info};

use super::fracture_family::FractureFamily;
use super::poly::Poly;
use crate::computational_geometry::{clip_to_boundary, in_polygon_boundary, RejectCode};
use crate::distribution::random_translation;
use crate::error::DfngenError;
use crate::structures::{FamilyId, PolyOptions};

/// Box a family's fracture centers are drawn from.
///
/// The whole domain (grown by `domain_size_increase`) for families without layer or
/// region. Layers only restrict the z coordinates; regions give the full box.
/// With a polygon boundary, x and y are further limited to the boundary's extent.
///
/// # Returns
///
/// Lower and upper corners of the box
pub fn translation_bounds(
    family: &FractureFamily,
    opts: &PolyOptions,
) -> (Vector3<f64>, Vector3<f64>) {
    let half = (opts.domain_size + opts.domain_size_increase) / 2.;

    let (mut min, mut max) = if family.layer > 0 {
        // Layers start at 1, layer 0 is the entire domain
        let layer_idx = (family.layer - 1) * 2;
        (
            Vector3::new(-half.x, -half.y, opts.layers[layer_idx]),
            Vector3::new(half.x, half.y, opts.layers[layer_idx + 1]),
        )
    } else if family.region > 0 {
        let r = &opts.regions[(family.region - 1) * 6..family.region * 6];
        (Vector3::new(r[0], r[2], r[4]), Vector3::new(r[1], r[3], r[5]))
    } else {
        (-half, half)
    };

    if let Some(boundary) = &opts.polygon_boundary {
        clip_to_boundary(boundary, &mut min, &mut max);
    }

    (min, max)
}

/// Checks a placed polygon against the domain.
///
/// The center must lie inside the polygon boundary when one is set, then the polygon
/// is truncated against the domain faces. Returns true if the polygon is rejected.
pub fn outside_domain(poly: &mut Poly, opts: &PolyOptions) -> bool {
    if let Some(boundary) = &opts.polygon_boundary {
        if !in_polygon_boundary(boundary, poly.translation.x, poly.translation.y) {
            return true;
        }
    }

    poly.domain_truncation(opts.h, opts.eps, &opts.domain_size)
        .is_rejected()
}

/// Re-translates Polygon
///
/// Gives a rejected polygon a new position while keeping its normal, size and shape.
///
/// An untruncated polygon is moved back to the origin and translated again. A truncated
/// polygon lost vertices, so it is rebuilt from its x-radius before being rotated to its
/// previous normal (with a new beta when the family draws beta uniformly) and translated.
///
/// Cluster group, intersections, boundary faces and truncation state are cleared, and the
/// bounding box re-assigned.
///
/// # Arguments
///
/// * `new_poly` - Polygon to re-translate
/// * `family` - Family `new_poly` belongs to
/// * `opts` - Domain, layers, regions and tolerances
/// * `rng` - Random generator
pub fn re_translate_poly<R: Rng + ?Sized>(
    new_poly: &mut Poly,
    family: &FractureFamily,
    opts: &PolyOptions,
    rng: &mut R,
) -> Result<(), DfngenError> {
    if !new_poly.truncated {
        // Move poly back to origin
        let translation = new_poly.translation;

        for v in new_poly.vertices.iter_mut() {
            *v -= translation;
        }
    } else {
        // Poly was truncated, rebuild the polygon at the origin using the previous size
        let normal_b = new_poly.normal;
        let rebuilt = family.shape_on_xy_plane(new_poly.xradius);
        new_poly.vertices = rebuilt.vertices;
        new_poly.normal = rebuilt.normal;

        new_poly.rotation_2d(family.sample_beta(rng)?);
        new_poly.rotation_3d(&normal_b, opts.eps);
    }

    new_poly.clear_insertion_state();

    let (min, max) = translation_bounds(family, opts);
    new_poly.translate(random_translation(rng, &min, &max)?);
    new_poly.assign_bounding_box();

    Ok(())
}

/// Label of a fracture's family for messages.
pub fn family_label(family: FamilyId, families: &[FractureFamily]) -> String {
    match family {
        FamilyId::Stochastic(i) => families
            .get(i)
            .map(ToString::to_string)
            .unwrap_or_else(|| format!("family {}", i + 1)),
        FamilyId::UserEllipse => "User ellipse".to_string(),
        FamilyId::UserRectangle => "User rectangle".to_string(),
        FamilyId::UserPolygon => "User polygon".to_string(),
    }
}

/// Logs why a fracture was rejected, at info level when the user asked for reject
/// reasons and at debug level otherwise.
pub fn print_reject_reason(reject_code: RejectCode, label: &str, print_reject_reasons: bool) {
    if print_reject_reasons {
        info!("Attempted fracture from {} was rejected: {}", label, reject_code);
    } else {
        debug!("Attempted fracture from {} was rejected: {}", label, reject_code);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use parry3d_f64::na::Point2;
    use rand_mt::Mt64;

    use super::*;
    use crate::distribution::{Fisher, Orientation};
    use crate::fracture::fracture_family::{FractureFamilyBuilder, RadiusOption};
    use crate::fracture::poly::Truncation;
    use crate::structures::RadiusDistribution;

    fn rect_family(opts: &PolyOptions, region: usize) -> FractureFamily {
        FractureFamilyBuilder::new()
            .radius(RadiusDistribution::new_constant(1.))
            .aspect_ratio(1.)
            .beta(0.)
            .orientation(Orientation::Fisher(Fisher::new(Vector3::z(), 1e3, opts.eps)))
            .region(region)
            .build(opts)
            .unwrap()
    }

    #[test]
    fn region_bounds() {
        let mut opts = PolyOptions::new(0.1, Vector3::new(10., 10., 10.));
        opts.regions = vec![-1., 1., -2., 2., 0., 3.];
        let fam = rect_family(&opts, 1);

        let (min, max) = translation_bounds(&fam, &opts);
        assert_eq!(min, Vector3::new(-1., -2., 0.));
        assert_eq!(max, Vector3::new(1., 2., 3.));

        opts.domain_size_increase = Vector3::new(2., 2., 2.);
        let fam = rect_family(&opts, 0);
        let (min, max) = translation_bounds(&fam, &opts);
        assert_eq!(min, Vector3::new(-6., -6., -6.));
        assert_eq!(max, Vector3::new(6., 6., 6.));
    }

    fn triangle_boundary() -> Vec<Point2<f64>> {
        vec![Point2::new(0., 0.), Point2::new(4., 0.), Point2::new(0., 4.)]
    }

    #[test]
    fn bounds_clipped_to_polygon_boundary() {
        let mut opts = PolyOptions::new(0.1, Vector3::new(10., 10., 10.));
        opts.polygon_boundary = Some(triangle_boundary());
        let fam = rect_family(&opts, 0);

        let (min, max) = translation_bounds(&fam, &opts);
        assert_eq!(min, Vector3::new(0., 0., -5.));
        assert_eq!(max, Vector3::new(4., 4., 5.));
    }

    #[test]
    fn centers_outside_polygon_boundary_are_rejected() {
        let mut opts = PolyOptions::new(0.1, Vector3::new(10., 10., 10.));
        opts.polygon_boundary = Some(triangle_boundary());

        let mut inside = Poly::new_rect(0.5, 1.);
        inside.translate(Vector3::new(1., 1., 0.));
        assert!(!outside_domain(&mut inside, &opts));

        // Inside the domain and the boundary's extent, beyond the hypotenuse
        let mut outside = Poly::new_rect(0.5, 1.);
        outside.translate(Vector3::new(3., 3., 0.));
        assert!(outside_domain(&mut outside, &opts));

        opts.polygon_boundary = None;
        assert!(!outside_domain(&mut outside, &opts));
    }

    #[test]
    fn retranslation_stays_in_polygon_boundary_extent() {
        let mut opts = PolyOptions::new(0.01, Vector3::new(10., 10., 10.));
        opts.polygon_boundary = Some(triangle_boundary());
        let mut fam = rect_family(&opts, 0);
        let mut rng = Mt64::new(17);

        let mut poly = fam
            .create_poly(&opts, 0, &mut rng, RadiusOption::FromRng)
            .unwrap();

        for _ in 0..50 {
            re_translate_poly(&mut poly, &fam, &opts, &mut rng).unwrap();
            assert!((0. ..=4.).contains(&poly.translation.x));
            assert!((0. ..=4.).contains(&poly.translation.y));
        }
    }

    #[test]
    fn truncated_poly_is_rebuilt() {
        let opts = PolyOptions::new(0.01, Vector3::new(4., 4., 4.));
        let mut fam = rect_family(&opts, 0);
        let mut rng = Mt64::new(21);

        let mut poly = fam
            .create_poly(&opts, 0, &mut rng, RadiusOption::FromCacheOrRng)
            .unwrap();
        // Push the polygon over the +x face
        let shift = Vector3::new(1.5, 0., 0.) - poly.translation;
        for v in poly.vertices.iter_mut() {
            *v += shift;
        }
        poly.translation += shift;

        assert_eq!(
            poly.domain_truncation(opts.h, opts.eps, &opts.domain_size),
            Truncation::Truncated
        );
        assert!(poly.faces[0]);

        let normal = poly.normal;
        re_translate_poly(&mut poly, &fam, &opts, &mut rng).unwrap();

        assert!(!poly.truncated);
        assert_eq!(poly.faces, [false; 6]);
        assert_eq!(poly.number_of_nodes(), 4);
        assert_abs_diff_eq!(poly.normal, normal, epsilon = 1e-12);

        poly.assign_area();
        assert_abs_diff_eq!(poly.area, 4., epsilon = 1e-9);
    }

    #[test]
    fn untruncated_poly_keeps_shape() {
        let opts = PolyOptions::new(0.01, Vector3::new(10., 10., 10.));
        let mut fam = rect_family(&opts, 0);
        let mut rng = Mt64::new(8);

        let mut poly = fam
            .create_poly(&opts, 0, &mut rng, RadiusOption::FromRng)
            .unwrap();
        let centered: Vec<_> = poly
            .vertices
            .iter()
            .map(|v| v.coords - poly.translation)
            .collect();

        re_translate_poly(&mut poly, &fam, &opts, &mut rng).unwrap();

        for (v, c) in poly.vertices.iter().zip(centered) {
            assert_abs_diff_eq!(v.coords - poly.translation, c, epsilon = 1e-12);
        }
    }
}
