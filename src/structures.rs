use std::fmt::{Display, Formatter};

use parry3d_f64::na::{Point2, Point3, Vector3};
use rand::distr::Distribution;
use rand::Rng;
use tracing::warn;

use crate::computational_geometry::RejectCode;
use crate::distribution::{TruncExp, TruncLogNormal, TruncPowerLaw};
use crate::error::DfngenError;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

arena_id!(
    /// Index into the accepted polygon list.
    PolyId
);
arena_id!(
    /// Index into the intersection list.
    IntersectionId
);
arena_id!(
    /// Index into the triple intersection point list.
    TriplePointId
);
arena_id!(
    /// Fracture cluster number. Cluster numbers start at 1.
    GroupId
);

impl GroupId {
    /// Index of the cluster's `GroupData` record.
    pub fn data_index(self) -> usize {
        self.0 - 1
    }
}

/// Origin of a fracture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FamilyId {
    /// Index of the stochastic family, ellipse families first, then rectangles.
    Stochastic(usize),
    /// User-defined ellipse.
    #[default]
    UserEllipse,
    /// User-defined rectangle.
    UserRectangle,
    /// User-defined polygon, given by its vertices.
    UserPolygon,
}

impl FamilyId {
    /// Integer code used in output files: stochastic families are 1-based,
    /// user ellipses are -1, user rectangles -2 and user polygons -3.
    pub fn code(&self) -> isize {
        match self {
            FamilyId::Stochastic(i) => *i as isize + 1,
            FamilyId::UserEllipse => -1,
            FamilyId::UserRectangle => -2,
            FamilyId::UserPolygon => -3,
        }
    }

    pub fn stochastic(&self) -> Option<usize> {
        match self {
            FamilyId::Stochastic(i) => Some(*i),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RejectedUserFracture {
    pub id: usize,
    pub family: FamilyId,
}

impl RejectedUserFracture {
    pub fn new(id: usize, family: FamilyId) -> Self {
        Self { id, family }
    }
}

/// Intersections structure.
/// This structure contains all data pertaining to
/// one intersection. This includes the IDs for both
/// intersecting fractures, the intersection end points,
/// a list of references to any triple intersection points existing
/// on the intersection, and a flag denotting whether or not
/// the intersection has been shortened by shrink_intersection()
/// during FRAM.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionPoints {
    /// Accepted fracture the new fracture intersected with.
    pub fract1: PolyId,

    /// Fracture that produced the intersection when it was inserted.
    pub fract2: PolyId,

    /// Intersection endpoint 1
    pub p1: Point3<f64>,
    /// Intersection endpoint 2
    pub p2: Point3<f64>,

    /// Triple intersection points/nodes on intersection.
    pub triple_points_idx: Vec<TriplePointId>,

    /// Used to update book keeping for keeping track of overal intersection length
    /// that has been shortened from shrink_intersection().
    pub intersection_shortened: bool,
}

impl IntersectionPoints {
    pub fn new(p1: Point3<f64>, p2: Point3<f64>) -> Self {
        Self {
            fract1: PolyId(0),
            fract2: PolyId(0),
            p1,
            p2,
            triple_points_idx: Vec::new(),
            intersection_shortened: false,
        }
    }

    pub fn length(&self) -> f64 {
        (self.p2 - self.p1).magnitude()
    }

    pub fn end_points(&self) -> [Point3<f64>; 2] {
        [self.p1, self.p2]
    }
}

/// Holds temporary triple point data while FRAM is checking
/// all intersections for a new polygon/fracture.
///
/// Once a fracture is accepted, the temporary triple point
/// is moved to its permanent location and every intersection
/// listed in `int_index` gets a reference to it.
///
/// If the fracture is rejected, this data is discarded.
#[derive(Debug, Clone)]
pub struct TriplePtTempData {
    /// Triple intersection point.
    pub triple_point: Point3<f64>,
    /// Intersections the point lies on, using the ids they will have once committed.
    pub int_index: Vec<IntersectionId>,
}

/// FractureGroups is a structure used to keep track of which fractures are in
/// each cluster. FractureGroups works in conjunction with GroupData.
///
/// Unlike GroupData, FractureGroups does not stay aligned to cluster group numbers.
/// When clusters merge, the absorbed entries are relabelled with the surviving group
/// number and keep their polygon lists, so several entries may share a number.
#[derive(Debug, Clone)]
pub struct FractureGroups {
    /// Fracture cluster group number.
    pub group: GroupId,
    /// Polygons which belong to this group.
    pub poly_list: Vec<PolyId>,
}

impl FractureGroups {
    pub fn new(group: GroupId) -> Self {
        Self {
            group,
            poly_list: Vec::new(),
        }
    }
}

/// GroupData keeps track of which domain boundaries a cluster connects to.
/// When a fracture bridges two clusters, the absorbed cluster's record is
/// marked invalid instead of being removed.
#[derive(Debug, Clone, Default)]
pub struct GroupData {
    /// Number of polygons in group.
    pub size: usize,
    /// False once the cluster has been merged into another one.
    pub valid: bool,
    /// Domain boundary faces this cluster touches, same order as `Poly::faces`.
    pub faces: [bool; 6],
}

impl GroupData {
    pub fn new() -> Self {
        Self {
            valid: true,
            ..Default::default()
        }
    }
}

/// Rejection reason counters.
#[derive(Debug, Clone, Default)]
pub struct RejectionReasons {
    /// Rejections due to intersection of length less than h.
    pub short_intersection: usize,
    /// Rejections due to intersections being too close to polygon vertices.
    pub close_to_node: usize,
    /// Rejections due to intersections being too close to polygon edges.
    pub close_to_edge: usize,
    /// Rejections due to fractures landing outside of the domain.
    pub outside: usize,
    /// Rejections due to triple intersection problems.
    pub triple: usize,
    /// Rejections due to an intersection landing too close to another
    /// intersection.
    pub inter_close_to_inter: usize,
    /// Rejections due to fractures intersecting on the same plane.
    pub same_plane: usize,
}

impl RejectionReasons {
    pub fn record(&mut self, code: RejectCode) {
        match code {
            RejectCode::CloseToNode => self.close_to_node += 1,
            RejectCode::ShortIntersection => self.short_intersection += 1,
            RejectCode::InterCloseToInter => self.inter_close_to_inter += 1,
            RejectCode::CloseToEdge => self.close_to_edge += 1,
            RejectCode::SamePlane => self.same_plane += 1,
            RejectCode::TripleDisabled
            | RejectCode::TripleCloseToIntersection
            | RejectCode::TripleSmallAngle
            | RejectCode::TripleCloseToEndPoint
            | RejectCode::TripleCloseToTriplePoint => self.triple += 1,
        }
    }
}

/// Program and DFN statisistics structure.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    /// Counters for the number of polygons accepted by each stochastic
    /// family, in family order.
    pub accepted_from_fam: Vec<usize>,

    /// Counters for the number of polygons rejected by each stochastic
    /// family, in family order.
    pub rejected_from_fam: Vec<usize>,

    /// Size of each family's pre-generated radii list.
    pub expected_from_fam: Vec<usize>,

    /// Total number of accepted polygons/fractures.
    pub accepted_poly_count: usize,

    /// Total number of rejected (discarded) polygons/fractures.
    pub rejected_poly_count: usize,

    /// Total number of polygon/fracture re-translations.
    pub retranslated_poly_count: usize,

    /// Total number of fractures that have been truncated against the domain.
    pub truncated: usize,

    /// Number of candidate pairs whose bounding boxes overlapped and were
    /// tested for an intersection.
    pub intersection_tests: usize,

    /// Total area of fractures before isolated fracture removal.
    pub area_before_removal: f64,

    /// Total area of fractures after isolated fracture removal.
    pub area_after_removal: f64,

    pub rejection_reasons: RejectionReasons,

    /// Number of accepted intersections shortened by shrink_intersection().
    pub intersections_shortened: usize,

    /// Total length of accepted intersections before shortening.
    pub original_length: f64,

    /// Total length cut away from accepted intersections by shrink_intersection().
    /// Final intersection length = original_length - discarded_length
    pub discarded_length: f64,

    /// Rejects per insertion attempt counter. Element i is the number of
    /// rejections before the (i+1)-th fracture was accepted, counting
    /// re-translations as well as newly generated fractures.
    pub rejects_per_attempt: Vec<usize>,

    /// User fractures which could not be inserted.
    pub rejected_user_fracture: Vec<RejectedUserFracture>,
}

impl Stats {
    pub fn new(n_families: usize) -> Self {
        Self {
            accepted_from_fam: vec![0; n_families],
            rejected_from_fam: vec![0; n_families],
            expected_from_fam: vec![0; n_families],
            rejects_per_attempt: vec![0],
            ..Default::default()
        }
    }

    /// Count one more rejection for the fracture currently being placed.
    pub fn add_reject_for_attempt(&mut self) {
        match self.rejects_per_attempt.last_mut() {
            Some(last) => *last += 1,
            None => self.rejects_per_attempt.push(1),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Ellipse(u8),
    Rectangle,
}

impl Default for Shape {
    fn default() -> Self {
        Shape::Ellipse(6)
    }
}

impl Display for Shape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Shape::Ellipse(_) => write!(f, "Ellipse"),
            Shape::Rectangle => write!(f, "Rectangular"),
        }
    }
}

impl Shape {
    pub fn number_of_nodes(&self) -> u8 {
        match self {
            Shape::Ellipse(n) => *n,
            Shape::Rectangle => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RadiusFunction {
    LogNormal { mu: f64, sigma: f64 },
    TruncatedPowerLaw { alpha: f64 },
    Exponential { lambda: f64 },
    Constant(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusDistribution {
    pub min: f64,
    pub max: f64,
    pub function: RadiusFunction,
}

impl RadiusDistribution {
    pub fn new_truncated_power_law(alpha: f64, min: f64, max: f64) -> Self {
        Self {
            function: RadiusFunction::TruncatedPowerLaw { alpha },
            min,
            max,
        }
    }

    pub fn new_log_normal(mu: f64, sigma: f64, min: f64, max: f64) -> Self {
        Self {
            function: RadiusFunction::LogNormal { mu, sigma },
            min,
            max,
        }
    }

    pub fn new_exponential(lambda: f64, min: f64, max: f64) -> Self {
        Self {
            function: RadiusFunction::Exponential { lambda },
            min,
            max,
        }
    }

    pub fn new_constant(value: f64) -> Self {
        Self {
            function: RadiusFunction::Constant(value),
            min: value,
            max: value,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.function, RadiusFunction::Constant(_))
    }

    /// Checks the distribution parameters without drawing from it.
    pub fn validate(&self) -> Result<(), DfngenError> {
        match self.function {
            RadiusFunction::LogNormal { mu, sigma } => {
                TruncLogNormal::new(self.min, self.max, mu, sigma)?;
            }
            RadiusFunction::TruncatedPowerLaw { alpha } => {
                TruncPowerLaw::new(self.min, self.max, alpha)?;
            }
            RadiusFunction::Exponential { lambda } => {
                TruncExp::new(self.min, self.max, lambda)?;
            }
            RadiusFunction::Constant(_) => {}
        }

        Ok(())
    }

    /// Sampling from distribution function.
    ///
    /// A truncated lognormal that keeps missing its bounds falls back to a
    /// clamped draw from the untruncated distribution.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64, DfngenError> {
        let radius = match self.function {
            RadiusFunction::LogNormal { mu, sigma } => {
                let distr = TruncLogNormal::new(self.min, self.max, mu, sigma)?;
                match distr.sample(rng) {
                    Ok(radius) => radius,
                    Err(e) => {
                        warn!("{}, sampling continues with relaxed bounds", e);
                        distr.sample_relaxed(rng)
                    }
                }
            }
            RadiusFunction::TruncatedPowerLaw { alpha } => {
                let distr = TruncPowerLaw::new(self.min, self.max, alpha)?;
                distr.sample(rng)
            }
            RadiusFunction::Exponential { lambda } => {
                let distr = TruncExp::new(self.min, self.max, lambda)?;
                distr.sample(rng)
            }
            RadiusFunction::Constant(c) => c,
        };

        Ok(radius)
    }
}

impl Display for RadiusDistribution {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.function {
            RadiusFunction::LogNormal { mu, sigma } => {
                writeln!(f, "Distribution: Lognormal")?;
                writeln!(f, "Mean: {}", mu)?;
                writeln!(f, "Standard Deviation: {}", sigma)?;
                writeln!(f, "Minimum Radius (m): {}", self.min)?;
                writeln!(f, "Maximum Radius (m): {}", self.max)
            }
            RadiusFunction::TruncatedPowerLaw { alpha } => {
                writeln!(f, "Distribution: Truncated Power-Law")?;
                writeln!(f, "Alpha: {}", alpha)?;
                writeln!(f, "Minimum Radius (m): {}", self.min)?;
                writeln!(f, "Maximum Radius (m): {}", self.max)
            }
            RadiusFunction::Exponential { lambda } => {
                writeln!(f, "Distribution: Exponential")?;
                writeln!(f, "Mean: {}", 1. / lambda)?;
                writeln!(f, "Lambda: {}", lambda)?;
                writeln!(f, "Minimum Radius (m): {}", self.min)?;
                writeln!(f, "Maximum Radius (m): {}", self.max)
            }
            RadiusFunction::Constant(value) => {
                writeln!(f, "Distribution: Constant")?;
                writeln!(f, "Radius (m): {}", value)
            }
        }
    }
}

/// Run-wide geometric options shared by the polygon factory, the domain
/// truncation and FRAM.
#[derive(Debug, Clone)]
pub struct PolyOptions {
    /// Minimum feature size.
    pub h: f64,
    /// Floating point tolerance, `h * 1e-8`.
    pub eps: f64,
    pub domain_size: Vector3<f64>,
    pub domain_size_increase: Vector3<f64>,
    /// Layers as {-z1, +z1, -z2, +z2, ...}.
    pub layers: Vec<f64>,
    /// Regions as {-x1, +x1, -y1, +y1, -z1, +z1, ...}.
    pub regions: Vec<f64>,
    pub r_fram: bool,
    pub disable_fram: bool,
    pub triple_intersections: bool,
    /// Vertices of the x-y polygon fracture centers must fall in, if any.
    pub polygon_boundary: Option<Vec<Point2<f64>>>,
}

impl PolyOptions {
    /// Options for a cube domain centered at the origin, all FRAM checks on.
    pub fn new(h: f64, domain_size: Vector3<f64>) -> Self {
        Self {
            h,
            eps: h * 1e-8,
            domain_size,
            domain_size_increase: Vector3::zeros(),
            layers: Vec::new(),
            regions: Vec::new(),
            r_fram: false,
            disable_fram: false,
            triple_intersections: true,
            polygon_boundary: None,
        }
    }

    pub fn domain_volume(&self) -> f64 {
        self.domain_size.x * self.domain_size.y * self.domain_size.z
    }

    /// Volume of the space a family lives in, used for P32.
    /// Layers and regions are numbered from 1; 0 is the whole domain.
    pub fn family_volume(&self, layer: usize, region: usize) -> f64 {
        if layer > 0 {
            let idx = (layer - 1) * 2;
            self.domain_size.x * self.domain_size.y * (self.layers[idx + 1] - self.layers[idx]).abs()
        } else if region > 0 {
            let idx = (region - 1) * 6;
            (self.regions[idx + 1] - self.regions[idx]).abs()
                * (self.regions[idx + 3] - self.regions[idx + 2]).abs()
                * (self.regions[idx + 5] - self.regions[idx + 4]).abs()
        } else {
            self.domain_volume()
        }
    }
}
