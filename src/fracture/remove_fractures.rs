use tracing::{info, warn};

use super::cluster_groups::ClusterGroups;
use super::network::FractureNetwork;
use crate::computational_geometry::intersection_checking;
use crate::structures::PolyOptions;

impl FractureNetwork {
    /// Remove Fractures Smaller Than Minimum Size
    ///
    /// Designed to be used AFTER DFN generation, to compare removing small fractures
    /// after the fact with limiting their insertion during generation.
    ///
    /// Fractures with an x-radius less than `min_size` are dropped and the DFN is rebuilt:
    /// intersections, triple points and clusters are found again by running intersection
    /// checking over the survivors in acceptance order. Intersection length statistics are
    /// recomputed for the rebuilt network.
    ///
    /// NOTE: Must be executed before the final cluster selection.
    ///
    /// # Returns
    ///
    /// Number of fractures removed
    pub fn remove_small_fractures(&mut self, opts: &PolyOptions, min_size: f64) -> usize {
        let before = self.accepted_poly.len();
        let old_polys = std::mem::take(&mut self.accepted_poly);

        self.intersections.clear();
        self.triple_points.clear();
        self.groups = ClusterGroups::new();
        self.stats.intersections_shortened = 0;
        self.stats.original_length = 0.;
        self.stats.discarded_length = 0.;

        for mut new_poly in old_polys
            .into_iter()
            .filter(|poly| poly.xradius >= min_size)
        {
            new_poly.group = None;
            new_poly.intersection_index.clear();

            match intersection_checking(
                opts,
                &mut new_poly,
                &mut self.accepted_poly,
                &mut self.intersections,
                &mut self.triple_points,
                &mut self.groups,
                &mut self.stats,
            ) {
                Ok(()) => self.accepted_poly.push(new_poly),
                Err(code) => warn!(
                    "Error rebuilding dfn, previously accepted fracture was rejected during DFN rebuild: {}",
                    code
                ),
            }
        }

        info!("Rebuilding DFN complete.");

        before - self.accepted_poly.len()
    }
}

#[cfg(test)]
mod tests {
    use parry3d_f64::na::Vector3;

    use super::*;
    use crate::fracture::poly::Poly;
    use crate::structures::{GroupId, PolyId};

    fn square(radius: f64, normal: Vector3<f64>, center: Vector3<f64>, eps: f64) -> Poly {
        let mut poly = Poly::new_rect(radius, 1.);
        poly.rotation_3d(&normal.normalize(), eps);
        poly.translate(center);
        poly
    }

    #[test]
    fn removing_bridge_splits_cluster() {
        let opts = PolyOptions::new(0.05, Vector3::new(20., 20., 20.));
        let mut network = FractureNetwork::new(0);

        // Two large parallel fractures joined by a small one
        let mut a = square(2., Vector3::z(), Vector3::new(0., 0., 1.), opts.eps);
        let mut b = square(2., Vector3::z(), Vector3::new(0., 0., -1.), opts.eps);
        let mut bridge = square(1.5, Vector3::x(), Vector3::zeros(), opts.eps);

        network.try_insert(&opts, &mut a).unwrap();
        network.try_insert(&opts, &mut b).unwrap();
        network.try_insert(&opts, &mut bridge).unwrap();

        assert_eq!(network.intersections.len(), 2);
        assert_eq!(network.groups.valid_groups(), 1);

        let removed = network.remove_small_fractures(&opts, 1.8);

        assert_eq!(removed, 1);
        assert_eq!(network.len(), 2);
        assert!(network.intersections.is_empty());
        assert!(network.accepted_poly.iter().all(|p| p.intersection_index.is_empty()));
        assert_eq!(network.groups.valid_groups(), 2);
        assert_eq!(network.accepted_poly[1].group, Some(GroupId(2)));
        assert_eq!(
            network.groups.get_cluster(2, false, false, true, &[false; 6]),
            Vec::<PolyId>::new()
        );
    }
}
