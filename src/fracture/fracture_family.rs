use std::fmt::{Display, Formatter};

use rand::distr::{Distribution, Uniform};
use rand::Rng;
use tracing::warn;

use super::insert_shape::translation_bounds;
use super::poly::Poly;
use crate::distribution::generating_points::generate_theta;
use crate::distribution::{random_translation, Orientation};
use crate::error::DfngenError;
use crate::math_functions::{cumsum, index_from_prob};
use crate::structures::{FamilyId, PolyOptions, RadiusDistribution, Shape};

/// Draws allowed when sampling a radius of at least h directly from a family's distribution.
const MAX_DIRECT_DRAWS: usize = 1000;

/// FractureFamily holds the variables of a stochastic shape family, rectangles and
/// ellipses alike, together with its run-time counters.
#[derive(Debug, Clone)]
pub struct FractureFamily {
    pub shape: Shape,

    /// Family number within its shape, starting at 1. Used in messages only.
    pub number: usize,

    pub radius: RadiusDistribution,

    /// Array of thetas to build poly from, initialized while building the family
    pub theta_list: Vec<f64>,

    /// Current index to the radii list 'radii_list'.
    pub radii_idx: usize,

    /// Initial list of fracture/polygon radii, sorted largest to smallest.
    pub radii_list: Vec<f64>,

    /// Layer the family belongs to. 0 is entire domain, greater than 0 is a layer.
    /// e.g. 2 would be the second layer listed in the input file under "layers:".
    pub layer: usize,

    /// Region the family belongs to. 0 is entire domain, greater than 0 is a region.
    /// e.g. 2 would be the second region listed in the input file under "regions:".
    pub region: usize,

    /// Aspect ratio for family.
    pub aspect_ratio: f64,

    /// Target p32 (fracture intensity) for the family when using p32 program-stopping option.
    pub p32_target: f64,

    /// Current P32 value for this family.
    pub current_p32: f64,

    /// Rotation about the polygon's normal vector, in radians. `None` draws it
    /// uniformly on [0, 2PI) for every polygon.
    pub beta: Option<f64>,

    pub orientation: Orientation,
}

/// Where a new polygon's radius comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadiusOption {
    /// Next radius of the pre-generated list, or a random one once the list is used up.
    FromCacheOrRng,
    FromRng,
    MaxRadius,
}

impl Display for FractureFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} family {}", self.shape, self.number)
    }
}

impl FractureFamily {
    /// Radius for the next polygon of this family.
    ///
    /// Constant families always return their constant. Otherwise the radius is taken from
    /// the pre-generated list when `use_list` is set and the list is not exhausted, or drawn
    /// from the distribution until it is no smaller than h.
    pub fn generate_radius<R: Rng + ?Sized>(
        &mut self,
        h: f64,
        rng: &mut R,
        use_list: bool,
    ) -> Result<f64, DfngenError> {
        if self.radius.is_constant() {
            return Ok(self.radius.min);
        }

        if use_list && self.radii_idx < self.radii_list.len() {
            // Insert radius from list
            let radius = self.radii_list[self.radii_idx];
            self.radii_idx += 1;
            return Ok(radius);
        }

        let mut radius = self.radius.sample(rng)?;
        let mut count = 1;

        while radius < h {
            if count >= MAX_DIRECT_DRAWS {
                warn!(
                    "{} has been unable to generate a fracture with radius larger than h after {} consecutive tries",
                    self, count
                );
                warn!("Consider adjusting the distribution parameters for this family in the input file");
                break;
            }

            radius = self.radius.sample(rng)?;
            count += 1;
        }

        Ok(radius)
    }

    /// Rotation about the normal for a new polygon.
    pub fn sample_beta<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64, DfngenError> {
        match self.beta {
            Some(beta) => Ok(beta),
            None => Ok(rng.sample(Uniform::new(0., 2. * std::f64::consts::PI)?)),
        }
    }

    /// Polygon of this family on the x-y plane, centered at the origin.
    pub fn shape_on_xy_plane(&self, radius: f64) -> Poly {
        match self.shape {
            Shape::Ellipse(_) => Poly::new_ell(radius, self.aspect_ratio, &self.theta_list),
            Shape::Rectangle => Poly::new_rect(radius, self.aspect_ratio),
        }
    }

    /// Generate Polygon/Fracture
    ///
    /// Builds a polygon from the family: the radius is chosen by `radius_option`, the
    /// polygon is twisted by beta, rotated to a normal drawn from the orientation
    /// distribution and translated uniformly inside the family's layer, region or domain.
    ///
    /// NOTE: The bounding box is assigned here, but has to be re-assigned after
    ///       fracture truncation
    ///
    /// # Arguments
    ///
    /// * `opts` - Domain, layers, regions and tolerances
    /// * `family_index` - Index of the family in `FractureFamilyOption::families`
    /// * `rng` - Random generator
    /// * `radius_option` - Source of the radius
    pub fn create_poly<R: Rng + ?Sized>(
        &mut self,
        opts: &PolyOptions,
        family_index: usize,
        rng: &mut R,
        radius_option: RadiusOption,
    ) -> Result<Poly, DfngenError> {
        let radius = match radius_option {
            RadiusOption::FromCacheOrRng => self.generate_radius(opts.h, rng, true)?,
            RadiusOption::FromRng => self.generate_radius(opts.h, rng, false)?,
            RadiusOption::MaxRadius => self.radius.max,
        };

        let mut new_poly = self.shape_on_xy_plane(radius);
        new_poly.family = FamilyId::Stochastic(family_index);

        // Twist around origin, assumes polygon on x-y plane
        new_poly.rotation_2d(self.sample_beta(rng)?);

        let normal = self.orientation.sample(rng).normalize();
        new_poly.rotation_3d(&normal, opts.eps);

        let (min, max) = translation_bounds(self, opts);
        new_poly.translate(random_translation(rng, &min, &max)?);
        new_poly.assign_bounding_box();

        Ok(new_poly)
    }

    /// True once the family reached its fracture intensity target.
    pub fn p32_complete(&self) -> bool {
        self.current_p32 >= self.p32_target
    }
}

#[derive(Debug, Default)]
pub struct FractureFamilyBuilder {
    number_of_nodes: Option<u8>,
    number: Option<usize>,
    radius: Option<RadiusDistribution>,
    orientation: Option<Orientation>,
    aspect_ratio: Option<f64>,
    beta: Option<f64>,
    p32_target: Option<f64>,
    layer: Option<usize>,
    region: Option<usize>,
}

impl FractureFamilyBuilder {
    pub fn new() -> Self {
        Self {
            ..Default::default()
        }
    }

    /// Ellipse family with `number_of_nodes` vertices. Families without it are rectangles.
    pub fn number_of_nodes(&mut self, number_of_nodes: u8) -> &mut Self {
        self.number_of_nodes = Some(number_of_nodes);
        self
    }

    pub fn number(&mut self, number: usize) -> &mut Self {
        self.number = Some(number);
        self
    }

    pub fn radius(&mut self, radius: RadiusDistribution) -> &mut Self {
        self.radius = Some(radius);
        self
    }

    pub fn aspect_ratio(&mut self, aspect_ratio: f64) -> &mut Self {
        self.aspect_ratio = Some(aspect_ratio);
        self
    }

    pub fn orientation(&mut self, orientation: Orientation) -> &mut Self {
        self.orientation = Some(orientation);
        self
    }

    /// Constant beta in radians
    pub fn beta(&mut self, beta: f64) -> &mut Self {
        self.beta = Some(beta);
        self
    }

    pub fn p32_target(&mut self, p32_target: f64) -> &mut Self {
        self.p32_target = Some(p32_target);
        self
    }

    pub fn layer(&mut self, layer: usize) -> &mut Self {
        self.layer = Some(layer);
        self
    }

    pub fn region(&mut self, region: usize) -> &mut Self {
        self.region = Some(region);
        self
    }

    /// Validates the family against the layers and regions defined in `opts`.
    pub fn build(&mut self, opts: &PolyOptions) -> Result<FractureFamily, DfngenError> {
        let shape = self
            .number_of_nodes
            .map(Shape::Ellipse)
            .unwrap_or(Shape::Rectangle);
        let number = self.number.unwrap_or(1);
        let family = format!("{} family {}", shape, number);

        let invalid = |reason: &str| DfngenError::InvalidFamily {
            family: family.clone(),
            reason: reason.to_string(),
        };

        let radius = self.radius.take().ok_or_else(|| invalid("radius is required"))?;
        let orientation = self
            .orientation
            .take()
            .ok_or_else(|| invalid("orientation is required"))?;
        let aspect_ratio = self
            .aspect_ratio
            .ok_or_else(|| invalid("aspect ratio is required"))?;

        if aspect_ratio <= 0. {
            return Err(invalid("aspect ratio must be greater than 0"));
        }

        if let Shape::Ellipse(n) = shape {
            if n < 3 {
                return Err(invalid("ellipses need at least 3 vertices"));
            }
        }

        let layer = self.layer.unwrap_or(0);
        let region = self.region.unwrap_or(0);

        if layer > 0 && region > 0 {
            return Err(DfngenError::LayerAndRegion { family });
        }

        if layer > opts.layers.len() / 2 {
            return Err(DfngenError::UndefinedLayerOrRegion {
                family,
                what: "layer",
                index: layer,
            });
        }

        if region > opts.regions.len() / 6 {
            return Err(DfngenError::UndefinedLayerOrRegion {
                family,
                what: "region",
                index: region,
            });
        }

        if !radius.is_constant() && radius.min >= radius.max {
            return Err(invalid("minimum radius must be smaller than maximum radius"));
        }

        radius.validate()?;

        let theta_list = match shape {
            Shape::Ellipse(n) => generate_theta(aspect_ratio, n as usize),
            Shape::Rectangle => Vec::new(),
        };

        Ok(FractureFamily {
            shape,
            number,
            radius,
            theta_list,
            radii_idx: 0,
            radii_list: Vec::new(),
            layer,
            region,
            aspect_ratio,
            p32_target: self.p32_target.unwrap_or(0.),
            current_p32: 0.,
            beta: self.beta,
            orientation,
        })
    }
}

#[derive(Debug, Default)]
pub struct FractureFamilyOption {
    /// Ellipse families first, then rectangle families.
    pub families: Vec<FractureFamily>,

    // Each element is the probability of chosing a fracture from
    // the element's corresponding family to be inserted into the DFN.
    // The elements should add up to 1.0 (for %100).
    pub probabilities: Vec<f64>,
}

impl FractureFamilyOption {
    /// Sort each family's radii list from largest to smallest.
    /// This will allow the DFN gereration to start from largest to smallest
    /// fractures.
    pub fn sort_radii(&mut self) {
        for ff in self.families.iter_mut() {
            ff.radii_list.sort_by(|a, b| b.total_cmp(a))
        }
    }

    /// True once every family reached its P32 target.
    pub fn p32_complete(&self) -> bool {
        self.families.iter().all(FractureFamily::p32_complete)
    }
}

/// Chooses the family of the next fracture.
///
/// Families are drawn from the CDF of their probabilities. When a family is removed,
/// its probability is spread evenly over the remaining families and the CDF rebuilt.
#[derive(Debug, Clone)]
pub struct FamilySelector {
    /// Family indices still being inserted.
    active: Vec<usize>,
    /// Probabilities aligned with `active`.
    probabilities: Vec<f64>,
    cdf: Vec<f64>,
}

impl FamilySelector {
    pub fn new(probabilities: &[f64]) -> Self {
        Self {
            active: (0..probabilities.len()).collect(),
            probabilities: probabilities.to_vec(),
            cdf: cumsum(probabilities),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn contains(&self, family_index: usize) -> bool {
        self.active.contains(&family_index)
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Index of the family the next fracture comes from, `None` once every family was removed.
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        if self.active.is_empty() {
            return None;
        }

        let roll = rng.random::<f64>();
        Some(self.active[index_from_prob(&self.cdf, roll)])
    }

    /// Stop choosing `family_index`.
    pub fn remove(&mut self, family_index: usize) {
        let Some(pos) = self.active.iter().position(|&i| i == family_index) else {
            return;
        };

        self.active.remove(pos);
        let removed = self.probabilities.remove(pos);

        if self.active.is_empty() {
            self.cdf.clear();
            return;
        }

        let share = removed / self.active.len() as f64;

        for p in self.probabilities.iter_mut() {
            *p += share;
        }

        self.cdf = cumsum(&self.probabilities);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use parry3d_f64::na::Vector3;
    use rand_mt::Mt64;

    use super::*;
    use crate::distribution::Fisher;

    fn opts() -> PolyOptions {
        let mut opts = PolyOptions::new(0.1, Vector3::new(10., 10., 10.));
        opts.layers = vec![-5., 0.];
        opts
    }

    fn family(layer: usize) -> FractureFamily {
        FractureFamilyBuilder::new()
            .number_of_nodes(8)
            .radius(RadiusDistribution::new_truncated_power_law(2.5, 1., 3.))
            .aspect_ratio(0.5)
            .orientation(Orientation::Fisher(Fisher::new(Vector3::x(), 50., 1e-9)))
            .layer(layer)
            .build(&opts())
            .unwrap()
    }

    #[test]
    fn layer_and_region_are_exclusive() {
        let mut opts = opts();
        opts.regions = vec![-1., 1., -1., 1., -1., 1.];

        let err = FractureFamilyBuilder::new()
            .radius(RadiusDistribution::new_constant(1.))
            .aspect_ratio(1.)
            .orientation(Orientation::Fisher(Fisher::new(Vector3::z(), 10., 1e-9)))
            .layer(1)
            .region(1)
            .build(&opts)
            .unwrap_err();
        assert!(matches!(err, DfngenError::LayerAndRegion { .. }));

        let err = FractureFamilyBuilder::new()
            .radius(RadiusDistribution::new_constant(1.))
            .aspect_ratio(1.)
            .orientation(Orientation::Fisher(Fisher::new(Vector3::z(), 10., 1e-9)))
            .layer(2)
            .build(&opts)
            .unwrap_err();
        assert!(matches!(
            err,
            DfngenError::UndefinedLayerOrRegion { index: 2, .. }
        ));
    }

    #[test]
    fn radius_from_list_then_distribution() {
        let mut fam = family(0);
        fam.radii_list = vec![2.5, 1.5];
        let mut rng = Mt64::new(11);

        assert_eq!(fam.generate_radius(0.1, &mut rng, true).unwrap(), 2.5);
        assert_eq!(fam.generate_radius(0.1, &mut rng, true).unwrap(), 1.5);

        let r = fam.generate_radius(0.1, &mut rng, true).unwrap();
        assert!((1. ..=3.).contains(&r));
        assert_eq!(fam.radii_idx, 2);
    }

    #[test]
    fn small_direct_radius_is_kept_after_max_draws() {
        let mut fam = family(0);
        let mut rng = Mt64::new(17);

        // Every draw is below h, the last one is returned
        let r = fam.generate_radius(5., &mut rng, false).unwrap();
        assert!((1. ..=3.).contains(&r));
    }

    #[test]
    fn created_poly_lives_in_its_layer() {
        let opts = opts();
        let mut fam = family(1);
        let mut rng = Mt64::new(3);

        for _ in 0..20 {
            let poly = fam
                .create_poly(&opts, 0, &mut rng, RadiusOption::FromRng)
                .unwrap();
            assert_eq!(poly.family, FamilyId::Stochastic(0));
            assert_eq!(poly.number_of_nodes(), 8);
            assert!((-5. ..0.).contains(&poly.translation.z));
            assert_abs_diff_eq!(poly.normal.magnitude(), 1., epsilon = 1e-12);

            for v in poly.vertices.iter() {
                assert_abs_diff_eq!(
                    (v.coords - poly.translation).dot(&poly.normal),
                    0.,
                    epsilon = 1e-9
                );
            }
        }
    }

    #[test]
    fn max_radius_option() {
        let mut fam = family(0);
        let mut rng = Mt64::new(5);
        let poly = fam
            .create_poly(&opts(), 0, &mut rng, RadiusOption::MaxRadius)
            .unwrap();
        assert_eq!(poly.xradius, 3.);
        assert_eq!(poly.yradius, 1.5);
    }

    #[test]
    fn removed_family_probability_is_spread() {
        let mut selector = FamilySelector::new(&[0.5, 0.3, 0.2]);
        selector.remove(0);

        assert!(!selector.contains(0));
        assert_abs_diff_eq!(selector.probabilities()[0], 0.55, epsilon = 1e-12);
        assert_abs_diff_eq!(selector.probabilities()[1], 0.45, epsilon = 1e-12);

        let mut rng = Mt64::new(1);
        for _ in 0..100 {
            assert_ne!(selector.select(&mut rng), Some(0));
        }

        selector.remove(2);
        selector.remove(1);
        assert!(selector.is_empty());
        assert_eq!(selector.select(&mut rng), None);
    }
}
