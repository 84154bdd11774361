use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use parry3d_f64::na::{distance, Point3, Vector3};
use tracing::{info, warn};

use super::insert_shape::outside_domain;
use super::network::FractureNetwork;
use super::poly::Poly;
use crate::distribution::generating_points::{angles_to_normal, generate_theta, OrientationOption};
use crate::error::DfngenError;
use crate::io::input::ExternalFractureFiles;
use crate::io::read_input_functions::InputReader;
use crate::structures::{FamilyId, PolyOptions, RejectedUserFracture};

/// Deterministic fractures from a user ellipse or rectangle file.
#[derive(Debug, Clone)]
pub struct UserDefinedFractures {
    /// `FamilyId::UserEllipse` or `FamilyId::UserRectangle`.
    pub family: FamilyId,
    pub radii: Vec<f64>,
    pub aspect: Vec<f64>,
    /// Rotation about the normal, in radians.
    pub beta: Vec<f64>,
    pub translation: Vec<Vector3<f64>>,
    pub normal: Vec<Vector3<f64>>,
    /// Vertices per ellipse, empty for rectangles.
    pub num_points: Vec<usize>,
}

impl UserDefinedFractures {
    pub fn from_file<P: AsRef<Path>>(path: P, family: FamilyId) -> Result<Self, DfngenError> {
        let mut reader = InputReader::open(path)?;
        Self::from_reader(&mut reader, family)
    }

    /// Reads a user ellipse (`nUserEll`) or user rectangle (`nUserRect`) definition.
    ///
    /// `AngleOption` 1 means beta is given in degrees. Trend/plunge and dip/strike are
    /// always in degrees.
    pub fn from_reader<R: Read + Seek>(
        reader: &mut InputReader<R>,
        family: FamilyId,
    ) -> Result<Self, DfngenError> {
        let is_ell = family == FamilyId::UserEllipse;

        let mut n_frac: usize = 0;
        reader.read_value(if is_ell { "nUserEll:" } else { "nUserRect:" }, &mut n_frac)?;

        let radii: Vec<f64> = reader.read_elements("Radii:", n_frac)?;
        let aspect: Vec<f64> = reader.read_elements("Aspect_Ratio:", n_frac)?;

        let mut angle_option: u8 = 0;
        reader.read_value("AngleOption:", &mut angle_option)?;
        let angle_conversion_factor = match angle_option {
            0 => 1.,
            1 => std::f64::consts::PI / 180.,
            other => {
                return Err(DfngenError::InvalidOption {
                    name: "AngleOption".to_string(),
                    value: other.to_string(),
                })
            }
        };

        let beta = reader
            .read_elements::<f64>("Beta:", n_frac)?
            .into_iter()
            .map(|b| b * angle_conversion_factor)
            .collect();

        let translation = reader
            .read_rows::<3>("Translation:", n_frac)?
            .into_iter()
            .map(Vector3::from)
            .collect();

        let mut orientation_option: u8 = 0;
        reader.read_value("userOrientationOption:", &mut orientation_option)?;

        let to_rad = std::f64::consts::PI / 180.;

        let normal = match orientation_option {
            0 => reader
                .read_rows::<3>("Normal:", n_frac)?
                .into_iter()
                .map(|n| Vector3::from(n).normalize())
                .collect(),
            1 => reader
                .read_rows::<2>("Trend_Plunge:", n_frac)?
                .into_iter()
                .map(|[trend, plunge]| {
                    angles_to_normal(OrientationOption::TrendPlunge, trend * to_rad, plunge * to_rad)
                })
                .collect(),
            2 => reader
                .read_rows::<2>("Dip_Strike:", n_frac)?
                .into_iter()
                .map(|[dip, strike]| {
                    let (dip, strike) = (dip * to_rad, strike * to_rad);
                    Vector3::new(
                        dip.sin() * strike.sin(),
                        -dip.sin() * strike.cos(),
                        dip.cos(),
                    )
                })
                .collect(),
            other => {
                return Err(DfngenError::InvalidOption {
                    name: "userOrientationOption".to_string(),
                    value: other.to_string(),
                })
            }
        };

        let num_points = if is_ell {
            reader.read_elements("Number_of_Vertices:", n_frac)?
        } else {
            Vec::new()
        };

        Ok(Self {
            family,
            radii,
            aspect,
            beta,
            translation,
            normal,
            num_points,
        })
    }

    pub fn len(&self) -> usize {
        self.radii.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radii.is_empty()
    }

    /// Polygon of the `idx`-th user fracture: built on the x-y plane, twisted by beta,
    /// rotated to its normal and translated.
    pub fn create_poly(&self, idx: usize, eps: f64) -> Poly {
        let mut new_poly = if self.num_points.is_empty() {
            Poly::new_rect(self.radii[idx], self.aspect[idx])
        } else {
            let theta_ary = generate_theta(self.aspect[idx], self.num_points[idx]);
            Poly::new_ell(self.radii[idx], self.aspect[idx], &theta_ary)
        };

        new_poly.family = self.family;
        new_poly.rotation_2d(self.beta[idx]);
        new_poly.rotation_3d(&self.normal[idx], eps);
        new_poly.translate(self.translation[idx]);

        new_poly
    }

    /// Insert User Fractures
    ///
    /// Every fracture goes through the domain checks and FRAM once, there is no
    /// re-translation. Fractures which cannot be inserted are recorded in
    /// `Stats::rejected_user_fracture`.
    pub fn insert(
        &self,
        network: &mut FractureNetwork,
        opts: &PolyOptions,
        print_reject_reasons: bool,
    ) {
        let label = match self.family {
            FamilyId::UserRectangle => "User Rectangle",
            _ => "User Ellipse",
        };

        for idx in 0..self.len() {
            let new_poly = self.create_poly(idx, opts.eps);
            insert_user_poly(network, opts, new_poly, idx + 1, label, print_reject_reasons);
        }
    }
}

/// User fractures given by the coordinates of their vertices.
#[derive(Debug, Clone)]
pub struct UserFracturesByCoord {
    /// `UserEllipse`, `UserRectangle` or `UserPolygon`.
    pub family: FamilyId,
    /// Vertices of each fracture, in order around the fracture.
    pub vertices: Vec<Vec<Point3<f64>>>,
}

impl UserFracturesByCoord {
    pub fn from_file<P: AsRef<Path>>(path: P, family: FamilyId) -> Result<Self, DfngenError> {
        info!("Reading user fractures by coordinates from {}", path.as_ref().display());
        let mut reader = InputReader::open(path)?;
        Self::from_reader(&mut reader, family)
    }

    /// Reads one of the three coordinate formats:
    ///
    /// * polygons: `nPolygons: n`, then per polygon its vertex count and vertices
    /// * ellipses: `nEllipses: n nNodes: k Coordinates:` followed by `n * k` vertices
    /// * rectangles: `nRectangles: n Coordinates:` followed by `4 * n` vertices
    ///
    /// Vertices are written `{x,y,z}`.
    pub fn from_reader<R: Read + Seek>(
        reader: &mut InputReader<R>,
        family: FamilyId,
    ) -> Result<Self, DfngenError> {
        let vertices = match family {
            FamilyId::UserPolygon => {
                let mut n_poly: usize = 0;
                reader.read_value("nPolygons:", &mut n_poly)?;

                (0..n_poly)
                    .map(|_| {
                        let n_nodes: usize = reader.read_next("nPolygons")?;
                        if n_nodes < 3 {
                            return Err(DfngenError::InvalidOption {
                                name: "nPolygons vertex count".to_string(),
                                value: n_nodes.to_string(),
                            });
                        }
                        reader.read_points("nPolygons", n_nodes)
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
            FamilyId::UserEllipse => {
                let mut n_ell: usize = 0;
                let mut n_nodes: usize = 0;
                reader.read_value("nEllipses:", &mut n_ell)?;
                reader.read_value("nNodes:", &mut n_nodes)?;

                if n_nodes < 3 {
                    return Err(DfngenError::InvalidOption {
                        name: "nNodes".to_string(),
                        value: n_nodes.to_string(),
                    });
                }

                read_coordinates(reader, n_ell, n_nodes)?
            }
            FamilyId::UserRectangle => {
                let mut n_rect: usize = 0;
                reader.read_value("nRectangles:", &mut n_rect)?;
                read_coordinates(reader, n_rect, 4)?
            }
            FamilyId::Stochastic(_) => {
                return Err(DfngenError::InvalidOption {
                    name: "user fracture family".to_string(),
                    value: family.code().to_string(),
                })
            }
        };

        info!("There are {} user fractures by coordinates", vertices.len());

        Ok(Self { family, vertices })
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Polygon of the `idx`-th fracture, `None` if its vertices do not span a plane.
    ///
    /// Rectangle radii are half the first and the last edge. x and y radius may be
    /// swapped depending on the order of the coordinates.
    pub fn create_poly(&self, idx: usize) -> Option<Poly> {
        let mut poly = Poly::from_vertices(self.vertices[idx].clone(), self.family)?;

        if self.family == FamilyId::UserRectangle {
            let v = &poly.vertices;
            poly.xradius = 0.5 * distance(&v[0], &v[1]);
            poly.yradius = 0.5 * distance(&v[0], &v[3]);
            poly.aspect_ratio = poly.yradius / poly.xradius;
        }

        Some(poly)
    }

    /// Inserts every fracture once, like [`UserDefinedFractures::insert`].
    pub fn insert(
        &self,
        network: &mut FractureNetwork,
        opts: &PolyOptions,
        print_reject_reasons: bool,
    ) {
        let label = match self.family {
            FamilyId::UserPolygon => "User Polygon (defined by coordinates)",
            FamilyId::UserRectangle => "User Rectangle (defined by coordinates)",
            _ => "User Ellipse (defined by coordinates)",
        };

        for idx in 0..self.len() {
            let id = idx + 1;

            match self.create_poly(idx) {
                Some(new_poly) => {
                    insert_user_poly(network, opts, new_poly, id, label, print_reject_reasons)
                }
                None => {
                    let pstats = &mut network.stats;
                    pstats.rejected_poly_count += 1;
                    pstats
                        .rejected_user_fracture
                        .push(RejectedUserFracture::new(id, self.family));
                    warn!("{} #{} was rejected, its vertices do not span a plane", label, id);
                }
            }
        }
    }
}

/// `{x,y,z}` vertices following `Coordinates:`, `n_nodes` per fracture.
fn read_coordinates<R: Read + Seek>(
    reader: &mut InputReader<R>,
    n_frac: usize,
    n_nodes: usize,
) -> Result<Vec<Vec<Point3<f64>>>, DfngenError> {
    if !reader.search_var("Coordinates:")? {
        return Err(DfngenError::MissingVariable("Coordinates".to_string()));
    }

    (0..n_frac)
        .map(|_| reader.read_points("Coordinates", n_nodes))
        .collect()
}

/// Domain checks and FRAM for one user fracture, with the statistics that go with it.
fn insert_user_poly(
    network: &mut FractureNetwork,
    opts: &PolyOptions,
    mut new_poly: Poly,
    id: usize,
    label: &str,
    print_reject_reasons: bool,
) {
    let family = new_poly.family;

    if outside_domain(&mut new_poly, opts) {
        let pstats = &mut network.stats;
        pstats.rejection_reasons.outside += 1;
        pstats.rejected_poly_count += 1;
        pstats
            .rejected_user_fracture
            .push(RejectedUserFracture::new(id, family));
        warn!("{} #{} was rejected for being outside the defined domain", label, id);
        return;
    }

    match network.try_insert(opts, &mut new_poly) {
        Ok(poly_id) => {
            let truncated = network.accepted_poly[poly_id.index()].truncated;
            let pstats = &mut network.stats;
            if truncated {
                pstats.truncated += 1;
            }
            pstats.accepted_poly_count += 1;
            pstats.rejects_per_attempt.push(0);
            info!("{} #{} inserted", label, id);
        }
        Err(code) => {
            let pstats = &mut network.stats;
            pstats.add_reject_for_attempt();
            pstats.rejected_poly_count += 1;
            pstats.rejection_reasons.record(code);
            pstats
                .rejected_user_fracture
                .push(RejectedUserFracture::new(id, family));

            if print_reject_reasons {
                info!("{} #{} was rejected: {}", label, id, code);
            } else {
                warn!("{} #{} was rejected", label, id);
            }
        }
    }
}

/// Every user fracture file of a run.
#[derive(Debug, Clone, Default)]
pub struct UserFractures {
    pub ellipses: Option<UserDefinedFractures>,
    pub rectangles: Option<UserDefinedFractures>,
    pub polygons_by_coord: Option<UserFracturesByCoord>,
    pub ellipses_by_coord: Option<UserFracturesByCoord>,
    pub rectangles_by_coord: Option<UserFracturesByCoord>,
}

impl UserFractures {
    /// Reads the files named in `files`.
    pub fn from_files(files: &ExternalFractureFiles) -> Result<Self, DfngenError> {
        fn by_coord(
            path: Option<&PathBuf>,
            family: FamilyId,
        ) -> Result<Option<UserFracturesByCoord>, DfngenError> {
            path.map(|path| UserFracturesByCoord::from_file(path, family))
                .transpose()
        }

        Ok(Self {
            ellipses: files
                .user_ell_file
                .as_ref()
                .map(|path| UserDefinedFractures::from_file(path, FamilyId::UserEllipse))
                .transpose()?,
            rectangles: files
                .user_rect_file
                .as_ref()
                .map(|path| UserDefinedFractures::from_file(path, FamilyId::UserRectangle))
                .transpose()?,
            polygons_by_coord: by_coord(
                files.user_poly_by_coord_file.as_ref(),
                FamilyId::UserPolygon,
            )?,
            ellipses_by_coord: by_coord(
                files.user_ell_by_coord_file.as_ref(),
                FamilyId::UserEllipse,
            )?,
            rectangles_by_coord: by_coord(
                files.user_rect_by_coord_file.as_ref(),
                FamilyId::UserRectangle,
            )?,
        })
    }

    /// User families with a definition file, ellipses, rectangles then polygons.
    pub fn families(&self) -> Vec<FamilyId> {
        let mut families = Vec::new();

        if self.ellipses.is_some() || self.ellipses_by_coord.is_some() {
            families.push(FamilyId::UserEllipse);
        }

        if self.rectangles.is_some() || self.rectangles_by_coord.is_some() {
            families.push(FamilyId::UserRectangle);
        }

        if self.polygons_by_coord.is_some() {
            families.push(FamilyId::UserPolygon);
        }

        families
    }

    /// Number of fractures defined for `family`.
    pub fn count(&self, family: FamilyId) -> usize {
        let (by_params, by_coord) = match family {
            FamilyId::UserEllipse => (self.ellipses.as_ref(), self.ellipses_by_coord.as_ref()),
            FamilyId::UserRectangle => {
                (self.rectangles.as_ref(), self.rectangles_by_coord.as_ref())
            }
            FamilyId::UserPolygon => (None, self.polygons_by_coord.as_ref()),
            FamilyId::Stochastic(_) => (None, None),
        };

        by_params.map_or(0, UserDefinedFractures::len) + by_coord.map_or(0, UserFracturesByCoord::len)
    }

    /// Inserts the user fractures.
    ///
    /// Polygons by coordinates always go first. Then ellipses and ellipses by
    /// coordinates, and rectangles and rectangles by coordinates, in the order given by
    /// `rect_first`.
    pub fn insert(
        &self,
        rect_first: bool,
        network: &mut FractureNetwork,
        opts: &PolyOptions,
        print_reject_reasons: bool,
    ) {
        if let Some(polygons) = &self.polygons_by_coord {
            polygons.insert(network, opts, print_reject_reasons);
        }

        let ellipses = (self.ellipses.as_ref(), self.ellipses_by_coord.as_ref());
        let rectangles = (self.rectangles.as_ref(), self.rectangles_by_coord.as_ref());
        let order = if rect_first {
            [rectangles, ellipses]
        } else {
            [ellipses, rectangles]
        };

        for (by_params, by_coord) in order {
            if let Some(fractures) = by_params {
                fractures.insert(network, opts, print_reject_reasons);
            }

            if let Some(fractures) = by_coord {
                fractures.insert(network, opts, print_reject_reasons);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use approx::assert_abs_diff_eq;
    use parry3d_f64::na::Point2;

    use super::*;

    const USER_RECT: &str = "nUserRect: 3
Radii: 1 1 1
AngleOption: 1
Beta: 0 90 0
Aspect_Ratio: 1 1 1
Translation: {0,0,0} {0,0,0} {20,0,0}
userOrientationOption: 2
Dip_Strike: {0,0} {90,0} {0,0}
";

    fn user_rects() -> UserDefinedFractures {
        let mut reader = InputReader::new(Cursor::new(USER_RECT.as_bytes().to_vec()));
        UserDefinedFractures::from_reader(&mut reader, FamilyId::UserRectangle).unwrap()
    }

    #[test]
    fn read_user_rectangles() {
        let rects = user_rects();

        assert_eq!(rects.len(), 3);
        assert!(rects.num_points.is_empty());
        assert_abs_diff_eq!(rects.beta[1], std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(rects.normal[0], Vector3::z(), epsilon = 1e-12);
        assert_abs_diff_eq!(rects.normal[1], Vector3::new(0., -1., 0.), epsilon = 1e-12);
        assert_eq!(rects.translation[2], Vector3::new(20., 0., 0.));
    }

    #[test]
    fn read_user_ellipses() {
        let text = "nUserEll: 1 Radii: 2 Aspect_Ratio: 0.5 AngleOption: 0 Beta: 0.3
Translation: {1,2,3} userOrientationOption: 0 Normal: {0,0,2} Number_of_Vertices: 12";
        let mut reader = InputReader::new(Cursor::new(text.as_bytes().to_vec()));
        let ells = UserDefinedFractures::from_reader(&mut reader, FamilyId::UserEllipse).unwrap();

        assert_eq!(ells.num_points, vec![12]);
        assert_eq!(ells.normal[0], Vector3::z());

        let poly = ells.create_poly(0, 1e-10);
        assert_eq!(poly.number_of_nodes(), 12);
        assert_eq!(poly.family, FamilyId::UserEllipse);
        assert_eq!(poly.translation, Vector3::new(1., 2., 3.));
    }

    #[test]
    fn insertion_records_rejections() {
        let opts = PolyOptions::new(0.1, Vector3::new(10., 10., 10.));
        let mut network = FractureNetwork::new(0);

        let user_fractures = UserFractures {
            rectangles: Some(user_rects()),
            ..Default::default()
        };
        user_fractures.insert(false, &mut network, &opts, false);

        // The first two cross each other, the third is outside the domain
        assert_eq!(network.len(), 2);
        assert_eq!(network.intersections.len(), 1);
        assert_eq!(network.stats.accepted_poly_count, 2);
        assert_eq!(network.stats.rejection_reasons.outside, 1);
        assert_eq!(network.stats.rejected_user_fracture.len(), 1);
        assert_eq!(network.stats.rejected_user_fracture[0].id, 3);
        assert_eq!(network.stats.rejects_per_attempt, vec![0, 0, 0]);
    }

    fn by_coord(text: &str, family: FamilyId) -> Result<UserFracturesByCoord, DfngenError> {
        let mut reader = InputReader::new(Cursor::new(text.as_bytes().to_vec()));
        UserFracturesByCoord::from_reader(&mut reader, family)
    }

    #[test]
    fn read_fractures_by_coordinates() {
        let polygons = by_coord(
            "nPolygons: 2
4
{0,-1,-1} {0,1,-1} {0,1,1} {0,-1,1}
3
{0,0,1} {1,0,1} {0,1,1}",
            FamilyId::UserPolygon,
        )
        .unwrap();
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons.vertices[1][2], Point3::new(0., 1., 1.));

        let poly = polygons.create_poly(0).unwrap();
        assert_eq!(poly.family, FamilyId::UserPolygon);
        assert_abs_diff_eq!(poly.normal, Vector3::x(), epsilon = 1e-12);
        assert_abs_diff_eq!(poly.translation, Vector3::zeros(), epsilon = 1e-12);

        let ellipses = by_coord(
            "nEllipses: 1 nNodes: 4
Coordinates:
{1,0,0} {0,1,0} {-1,0,0} {0,-1,0}",
            FamilyId::UserEllipse,
        )
        .unwrap();
        assert_eq!(ellipses.vertices, vec![vec![
            Point3::new(1., 0., 0.),
            Point3::new(0., 1., 0.),
            Point3::new(-1., 0., 0.),
            Point3::new(0., -1., 0.),
        ]]);

        let rects = by_coord(
            "nRectangles: 1
Coordinates:
{-1,-0.5,2} {1,-0.5,2} {1,0.5,2} {-1,0.5,2}",
            FamilyId::UserRectangle,
        )
        .unwrap();
        let rect = rects.create_poly(0).unwrap();
        assert_abs_diff_eq!(rect.xradius, 1., epsilon = 1e-12);
        assert_abs_diff_eq!(rect.yradius, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(rect.aspect_ratio, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(rect.translation, Vector3::new(0., 0., 2.), epsilon = 1e-12);

        // Two vertices cannot make a polygon
        assert!(by_coord("nPolygons: 1 2 {0,0,0} {1,0,0}", FamilyId::UserPolygon).is_err());
        assert!(by_coord("nNodes: 4", FamilyId::Stochastic(0)).is_err());
    }

    #[test]
    fn polygons_by_coordinates_respect_polygon_boundary() {
        let mut opts = PolyOptions::new(0.1, Vector3::new(10., 10., 10.));
        opts.polygon_boundary = Some(vec![
            Point2::new(-2., -2.),
            Point2::new(2., -2.),
            Point2::new(2., 2.),
            Point2::new(-2., 2.),
        ]);
        let mut network = FractureNetwork::new(0);

        let polygons = by_coord(
            "nPolygons: 3
4 {0,-1,-1} {0,1,-1} {0,1,1} {0,-1,1}
4 {3.5,3.5,0} {4.5,3.5,0} {4.5,4.5,0} {3.5,4.5,0}
3 {0,0,0} {1,0,0} {2,0,0}",
            FamilyId::UserPolygon,
        )
        .unwrap();

        let user_fractures = UserFractures {
            polygons_by_coord: Some(polygons),
            ..Default::default()
        };
        assert_eq!(user_fractures.families(), vec![FamilyId::UserPolygon]);
        assert_eq!(user_fractures.count(FamilyId::UserPolygon), 3);

        user_fractures.insert(false, &mut network, &opts, false);

        // Second is inside the domain but not the boundary, third is a line
        assert_eq!(network.len(), 1);
        assert_eq!(network.accepted_poly[0].family, FamilyId::UserPolygon);
        assert_eq!(network.stats.rejection_reasons.outside, 1);
        assert_eq!(network.stats.rejected_poly_count, 2);
        let rejected: Vec<usize> = network
            .stats
            .rejected_user_fracture
            .iter()
            .map(|rejected| rejected.id)
            .collect();
        assert_eq!(rejected, vec![2, 3]);
    }
}
