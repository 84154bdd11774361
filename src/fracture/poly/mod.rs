mod domain_truncation;

use parry3d_f64::{
    bounding_volume::Aabb,
    na::{distance, Matrix3, Point3, Vector3},
};

pub use domain_truncation::Truncation;

use crate::{
    computational_geometry::{bounding_box, rotation_matrix},
    structures::{FamilyId, GroupId, IntersectionId},
};

/// The Poly structre is used to create and store fracrures/polygons.
#[derive(Debug, Clone)]
pub struct Poly {
    /// Family the fracture was created from.
    pub family: FamilyId,

    /// Fracture cluster which the fracture belongs to. When a fracture first intersects
    /// another fracture, it inherits its cluster group. If a fracture does not intersect
    /// any other fractures, it is given a new and unique cluster group. When a fracture
    /// bridges two different clusters, all clusters are merged into the group of the first
    /// intersecting fracture. `None` until the fracture is accepted.
    pub group: Option<GroupId>,

    /// Polygon area, after truncation.
    pub area: f64,

    /// X-radius before fracture-domain truncation. In the case of rectangles, radius is
    /// 1/2 the width of the polygon.
    pub xradius: f64,

    /// Y-radius before fracture-domain truncation, `xradius * aspect_ratio`.
    pub yradius: f64,

    /// Aspect ratio of polygon before fracture-domain truncation. Must be value greater than zero.
    pub aspect_ratio: f64,

    /// Translation of polygon. This variable is set while building the polygon.
    pub translation: Vector3<f64>,

    /// Polygon normal. This variable is set while building the polygon.
    pub normal: Vector3<f64>,

    /// The bounding box of the polygon. Set with assign_bounding_box().
    pub bounding_box: Aabb,

    /// Polygon vertices, ordered counter-clockwise around `normal`.
    pub vertices: Vec<Point3<f64>>,

    /// Domain boundaries the polygon touches, indexed
    /// `[+x, -x, +y, -y, +z, -z]`.
    pub faces: [bool; 6],

    /// True if the polygon has been truncated. A truncated polygon must be re-built
    /// before re-translation, otherwise it can simply be given a new translation.
    pub truncated: bool,

    /// True once the vertices have been rotated into the x-y plane for the mesh files.
    /// `normal` keeps the fracture's orientation in the domain, so it cannot tell.
    pub xy_plane: bool,

    /// Intersections which belong to this polygon.
    pub intersection_index: Vec<IntersectionId>,
}

impl Default for Poly {
    /// Polygon without vertices.
    fn default() -> Self {
        Self::on_xy_plane(Vec::new(), 0., 1.)
    }
}

impl Poly {
    fn on_xy_plane(vertices: Vec<Point3<f64>>, radius: f64, aspect_ratio: f64) -> Self {
        let bounding_box = bounding_box(&vertices);

        Self {
            family: FamilyId::default(),
            group: None,
            area: 0.,
            xradius: radius,
            yradius: radius * aspect_ratio,
            aspect_ratio,
            translation: Vector3::zeros(),
            normal: Vector3::z(),
            bounding_box,
            vertices,
            faces: [false; 6],
            truncated: false,
            xy_plane: false,
            intersection_index: Vec::new(),
        }
    }

    /// Polygon from user coordinates, vertices in order around the polygon.
    ///
    /// The normal is taken from the first edge and the chord to the vertex half way
    /// around. The x-radius is half that chord, the y-radius half the chord from the
    /// vertex a quarter of the way around to its opposite. The translation is the
    /// vertex centroid.
    ///
    /// Returns `None` for fewer than three vertices, or if those two directions are
    /// parallel.
    pub fn from_vertices(vertices: Vec<Point3<f64>>, family: FamilyId) -> Option<Self> {
        let n = vertices.len();

        if n < 3 {
            return None;
        }

        let mid = (n / 2).max(2);
        let quarter = n / 4;
        let opposite = (quarter + n / 2) % n;

        let normal = (vertices[1] - vertices[0])
            .cross(&(vertices[mid] - vertices[0]))
            .try_normalize(f64::EPSILON)?;

        let xradius = 0.5 * distance(&vertices[0], &vertices[mid]);
        let yradius = 0.5 * distance(&vertices[quarter], &vertices[opposite]);
        let translation = vertices
            .iter()
            .fold(Vector3::zeros(), |acc, v| acc + v.coords)
            / n as f64;

        let mut poly = Self::on_xy_plane(vertices, xradius, 1.);
        poly.family = family;
        poly.normal = normal;
        poly.yradius = yradius;
        poly.aspect_ratio = yradius / xradius;
        poly.translation = translation;

        Some(poly)
    }

    /// Create a Rectangular
    ///
    /// # Arguments
    ///
    /// * `radius` - Radius (1/2 x dimension length)
    /// * `aspect_ratio` - Aspect ratio
    pub fn new_rect(radius: f64, aspect_ratio: f64) -> Self {
        let x = radius;
        let y = radius * aspect_ratio;

        let vertices = vec![
            Point3::new(x, y, 0.),
            Point3::new(-x, y, 0.),
            Point3::new(-x, -y, 0.),
            Point3::new(x, -y, 0.),
        ];

        Self::on_xy_plane(vertices, radius, aspect_ratio)
    }

    /// Create a Ellipse
    ///
    /// # Arguments
    ///
    /// * `radius` - Radius (xradius = radius. yradius = radius * aspectRatio)
    /// * `aspect_ratio` - Aspect ratio
    /// * `theta_list` - Vertex angles, see `generate_theta`
    pub fn new_ell(radius: f64, aspect_ratio: f64, theta_list: &[f64]) -> Self {
        let vertices = theta_list
            .iter()
            .map(|theta| {
                Point3::new(
                    radius * theta.cos(),
                    radius * aspect_ratio * theta.sin(),
                    0.,
                )
            })
            .collect();

        Self::on_xy_plane(vertices, radius, aspect_ratio)
    }

    pub fn number_of_nodes(&self) -> usize {
        self.vertices.len()
    }

    /// Assign Poly's Area
    ///
    /// Breaks the polygon into triangles fanning out of the vertex centroid, and
    /// sums half the magnitude of each triangle's cross product. Polygons are
    /// convex, so the centroid is inside.
    pub fn assign_area(&mut self) {
        let n = self.vertices.len();

        if n < 3 {
            self.area = 0.;
            return;
        }

        let center = Point3::from(
            self.vertices
                .iter()
                .fold(Vector3::zeros(), |acc, v| acc + v.coords)
                / n as f64,
        );

        self.area = (0..n)
            .map(|i| {
                let v1 = self.vertices[i] - center;
                let v2 = self.vertices[(i + 1) % n] - center;
                0.5 * v1.cross(&v2).magnitude()
            })
            .sum();
    }

    pub fn assign_bounding_box(&mut self) {
        self.bounding_box = bounding_box(&self.vertices);
    }

    /// 2D rotation matrix
    ///
    /// Rotates poly around its normal vecotor on x-y plane.
    /// Assumes poly is on x-y plane. Angle must be in radians.
    pub fn rotation_2d(&mut self, angle: f64) {
        let sin_calc = angle.sin();
        let cos_calc = angle.cos();

        for v in self.vertices.iter_mut() {
            let (x, y) = (v.x, v.y);
            v.x = (x * cos_calc) + (y * sin_calc);
            v.y = (x * -sin_calc) + (y * cos_calc);
            v.z = 0.;
        }
    }

    /// Applies a Rotation Matrix to poly vertices
    ///
    /// Rotates the polygon around the origin so its normal becomes `normal_b`.
    /// Both normals must be normalized.
    ///
    /// # Arguments
    ///
    /// * `normal_b` - Normal vector to rotate to
    /// * `eps` - Epsilon value for floating point comparisons
    pub fn rotation_3d(&mut self, normal_b: &Vector3<f64>, eps: f64) {
        let r = rotation_matrix(&self.normal, normal_b, eps);

        for v in self.vertices.iter_mut() {
            *v = Point3::from(r * v.coords);
        }

        self.normal = *normal_b;
    }

    /// Rotates the vertices into a plane parallel to x-y, around the origin.
    ///
    /// `normal` is left unchanged and `xy_plane` is set, so a second call does not
    /// rotate again. Returns the rotation, to bring points lying on the polygon into the
    /// same plane.
    pub fn rotate_to_xy_plane(&mut self, eps: f64) -> Matrix3<f64> {
        let r = rotation_matrix(&self.normal, &Vector3::z(), eps);

        if !self.xy_plane {
            for v in self.vertices.iter_mut() {
                *v = Point3::from(r * v.coords);
            }

            self.xy_plane = true;
        }

        r
    }

    /// Translate the poly by vector, and record it as the poly's translation
    pub fn translate(&mut self, translation: Vector3<f64>) {
        self.translation = translation;

        for v in self.vertices.iter_mut() {
            *v += translation;
        }
    }

    /// Clears everything the poly picked up while being inserted: truncation,
    /// boundary faces, cluster group and intersections.
    pub fn clear_insertion_state(&mut self) {
        self.truncated = false;
        self.faces = [false; 6];
        self.group = None;
        self.intersection_index.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::distribution::generating_points::generate_theta;

    #[test]
    fn rectangle_area() {
        let mut poly = Poly::new_rect(2., 0.5);
        poly.assign_area();
        assert_abs_diff_eq!(poly.area, 4., epsilon = 1e-12);
        assert_eq!(poly.yradius, 1.);
    }

    #[test]
    fn ellipse_area_approaches_pi_ab() {
        let theta = generate_theta(0.5, 64);
        let mut poly = Poly::new_ell(2., 0.5, &theta);
        poly.assign_area();
        assert_eq!(poly.number_of_nodes(), 64);
        assert_abs_diff_eq!(poly.area, PI * 2. * 1., epsilon = 0.05);
    }

    #[test]
    fn rotation_keeps_shape() {
        let mut poly = Poly::new_rect(1., 1.);
        poly.rotation_2d(0.3);
        let normal = Vector3::new(1., -2., 0.5).normalize();
        poly.rotation_3d(&normal, 1e-10);
        poly.translate(Vector3::new(1., 2., 3.));

        assert_eq!(poly.normal, normal);
        for v in poly.vertices.iter() {
            let d = v - Point3::new(1., 2., 3.);
            assert_abs_diff_eq!(d.dot(&normal), 0., epsilon = 1e-12);
            assert_abs_diff_eq!(d.magnitude(), 2f64.sqrt(), epsilon = 1e-12);
        }

        poly.assign_area();
        assert_abs_diff_eq!(poly.area, 4., epsilon = 1e-12);
    }

    #[test]
    fn rotation_to_xy_plane_happens_once() {
        let mut poly = Poly::new_rect(1., 0.5);
        let normal = Vector3::new(0.3, -1., 0.8).normalize();
        poly.rotation_3d(&normal, 1e-10);
        poly.translate(Vector3::new(2., -1., 4.));
        assert!(!poly.xy_plane);

        let r = poly.rotate_to_xy_plane(1e-10);
        assert!(poly.xy_plane);
        assert_eq!(poly.normal, normal);
        assert_abs_diff_eq!(r * normal, Vector3::z(), epsilon = 1e-12);

        let z = poly.vertices[0].z;
        for v in poly.vertices.iter() {
            assert_abs_diff_eq!(v.z, z, epsilon = 1e-12);
        }

        let rotated = poly.vertices.clone();
        poly.rotate_to_xy_plane(1e-10);
        assert_eq!(poly.vertices, rotated);

        poly.assign_area();
        assert_abs_diff_eq!(poly.area, 2., epsilon = 1e-12);
    }

    #[test]
    fn polygon_from_vertices() {
        // Regular hexagon of radius 2 on the plane x = 1
        let vertices: Vec<Point3<f64>> = (0..6)
            .map(|i| {
                let t = i as f64 * PI / 3.;
                Point3::new(1., 2. * t.cos(), 2. * t.sin())
            })
            .collect();

        let poly = Poly::from_vertices(vertices, FamilyId::UserPolygon).unwrap();
        assert_eq!(poly.family, FamilyId::UserPolygon);
        assert_abs_diff_eq!(poly.normal, Vector3::x(), epsilon = 1e-12);
        assert_abs_diff_eq!(poly.translation, Vector3::new(1., 0., 0.), epsilon = 1e-12);
        assert_abs_diff_eq!(poly.xradius, 2., epsilon = 1e-12);
        assert_abs_diff_eq!(poly.yradius, 2., epsilon = 1e-12);
        assert!(!poly.xy_plane);

        let triangle = vec![
            Point3::new(0., 0., 0.),
            Point3::new(1., 0., 0.),
            Point3::new(0., 1., 0.),
        ];
        let poly = Poly::from_vertices(triangle, FamilyId::UserPolygon).unwrap();
        assert_abs_diff_eq!(poly.normal, Vector3::z(), epsilon = 1e-12);

        let line = vec![
            Point3::new(0., 0., 0.),
            Point3::new(1., 0., 0.),
            Point3::new(2., 0., 0.),
        ];
        assert!(Poly::from_vertices(line, FamilyId::UserPolygon).is_none());
        assert!(Poly::from_vertices(Vec::new(), FamilyId::UserPolygon).is_none());
    }

    #[test]
    fn bounding_box_follows_translation() {
        let mut poly = Poly::new_rect(1., 2.);
        poly.translate(Vector3::new(5., 0., 0.));
        poly.assign_bounding_box();
        assert_eq!(poly.bounding_box.mins, Point3::new(4., -2., 0.));
        assert_eq!(poly.bounding_box.maxs, Point3::new(6., 2., 0.));
    }
}
