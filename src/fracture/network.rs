use parry3d_f64::na::Point3;

use super::cluster_groups::ClusterGroups;
use super::poly::Poly;
use crate::computational_geometry::{intersection_checking, RejectCode};
use crate::structures::{IntersectionPoints, PolyId, PolyOptions, Stats};

/// The accepted part of a DFN: polygons, their intersections and triple points,
/// the fracture clusters and the generation statistics.
#[derive(Debug, Clone, Default)]
pub struct FractureNetwork {
    pub accepted_poly: Vec<Poly>,
    pub intersections: Vec<IntersectionPoints>,
    pub triple_points: Vec<Point3<f64>>,
    pub groups: ClusterGroups,
    pub stats: Stats,
}

impl FractureNetwork {
    pub fn new(n_families: usize) -> Self {
        Self {
            stats: Stats::new(n_families),
            ..Default::default()
        }
    }

    /// Runs intersection checking and FRAM on `new_poly` and, when it passes, saves it
    /// into the network with its area computed.
    ///
    /// `new_poly` must already be truncated against the domain. An accepted polygon is
    /// moved into the network, leaving an empty polygon behind; read it back through the
    /// returned id. On rejection nothing is saved and `new_poly` can be re-translated and
    /// tried again.
    pub fn try_insert(&mut self, opts: &PolyOptions, new_poly: &mut Poly) -> Result<PolyId, RejectCode> {
        new_poly.assign_bounding_box();

        intersection_checking(
            opts,
            new_poly,
            &mut self.accepted_poly,
            &mut self.intersections,
            &mut self.triple_points,
            &mut self.groups,
            &mut self.stats,
        )?;

        new_poly.assign_area();

        let id = PolyId(self.accepted_poly.len());
        self.accepted_poly.push(std::mem::take(new_poly));

        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.accepted_poly.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted_poly.is_empty()
    }

    /// Total area of the given fractures, one side only.
    pub fn area_of(&self, fractures: &[PolyId]) -> f64 {
        fractures
            .iter()
            .map(|id| self.accepted_poly[id.index()].area)
            .sum()
    }
}
