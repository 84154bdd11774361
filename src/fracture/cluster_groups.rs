use tracing::{debug, info};

use crate::{
    fracture::poly::Poly,
    math_functions::or,
    structures::{FractureGroups, GroupData, GroupId, PolyId},
};

// group_data:
//     Keeps how many polygons are in each cluster and the boundary faces the cluster
//     touches. It is aligned with the group numbers: group g lives at group_data[g - 1].
//     When a polygon connects two different clusters, the absorbed one is marked invalid.
//
// fract_group:
//     Holds the polygon ids together with their group number. It does not stay aligned
//     to group numbers: when groups merge, the absorbed entries only get relabelled, so
//     a group may appear several times with different polygons listed.

/// Fracture cluster bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct ClusterGroups {
    pub fract_group: Vec<FractureGroups>,
    pub group_data: Vec<GroupData>,
}

impl ClusterGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group number the next isolated fracture will get.
    pub fn next_group_num(&self) -> GroupId {
        GroupId(self.group_data.len() + 1)
    }

    pub fn data(&self, group: GroupId) -> &GroupData {
        &self.group_data[group.data_index()]
    }

    fn data_mut(&mut self, group: GroupId) -> &mut GroupData {
        &mut self.group_data[group.data_index()]
    }

    /// Number of clusters which have not been merged away.
    pub fn valid_groups(&self) -> usize {
        self.group_data.iter().filter(|g| g.valid).count()
    }

    /// All polygons of a cluster, gathered over every matching entry.
    pub fn members(&self, group: GroupId) -> impl Iterator<Item = PolyId> + '_ {
        self.fract_group
            .iter()
            .filter(move |fg| fg.group == group)
            .flat_map(|fg| fg.poly_list.iter().copied())
    }

    /// Assign New Polygon to a Cluster
    ///
    /// Assigns a new polygon/fracture to a new cluster group number.
    /// Assumes 'new_poly' does not intersect with any other fractures.
    ///
    /// # Arguments
    ///
    /// * `new_poly` - New polygon
    /// * `new_poly_index` - Id of 'new_poly' once placed into the accepted polygons
    pub fn assign_group(&mut self, new_poly: &mut Poly, new_poly_index: PolyId) {
        let group = self.next_group_num();
        new_poly.group = Some(group);

        let mut new_group_data = GroupData::new();
        or(&mut new_group_data.faces, &new_poly.faces);
        new_group_data.size += 1;
        self.group_data.push(new_group_data);

        let mut new_group = FractureGroups::new(group);
        new_group.poly_list.push(new_poly_index);
        self.fract_group.push(new_group);
    }

    /// Update Cluster Groups
    ///
    /// Adds 'new_poly' to `group`, the cluster of the first polygon it intersected with.
    /// The cluster's boundary faces are updated and its fracture count incremented.
    ///
    /// If 'new_poly' bridged two or more clusters, the remaining clusters are merged into
    /// `group`: their sizes and boundary faces are added, their FractureGroups entries and
    /// member polygons are relabelled, and their GroupData is marked invalid.
    ///
    /// # Arguments
    ///
    /// * `new_poly` - New polygon
    /// * `accepted_poly` - Array of all accepted polygons
    /// * `encountered_groups` - Group numbers of any other bridged fracture cluster groups
    /// * `group` - Group the new polygon joins
    /// * `new_poly_index` - Id of 'new_poly' once placed into the accepted polygons
    pub fn update_groups(
        &mut self,
        new_poly: &mut Poly,
        accepted_poly: &mut [Poly],
        encountered_groups: &[GroupId],
        group: GroupId,
        new_poly_index: PolyId,
    ) {
        new_poly.group = Some(group);

        match self.fract_group.iter_mut().find(|fg| fg.group == group) {
            Some(fg) => fg.poly_list.push(new_poly_index),
            None => {
                let mut fg = FractureGroups::new(group);
                fg.poly_list.push(new_poly_index);
                self.fract_group.push(fg);
            }
        }

        let data = self.data_mut(group);
        data.size += 1;
        or(&mut data.faces, &new_poly.faces);

        for &gid in encountered_groups {
            if gid == group {
                continue;
            }

            let merged = self.data(gid).clone();

            if merged.valid {
                let data = self.data_mut(group);
                data.size += merged.size;
                or(&mut data.faces, &merged.faces);
                self.data_mut(gid).valid = false;
                debug!("Cluster {} merged into cluster {}", gid, group);
            }

            for fg in self.fract_group.iter_mut().filter(|fg| fg.group == gid) {
                fg.group = group;

                for poly_id in fg.poly_list.iter() {
                    accepted_poly[poly_id.index()].group = Some(group);
                }
            }
        }
    }

    /// Get Matching Fracture Clusters
    ///
    /// Returns the ids of the fractures which remain after isolated and non-matching
    /// boundary faces fracture removal, sorted.
    ///
    /// # Arguments
    ///
    /// * `n_accepted` - Number of accepted fractures
    /// * `keep_isolated_fractures` - Keep every fracture
    /// * `keep_only_largest_cluster` - Keep only the largest matching cluster
    /// * `ignore_boundary_faces` - Accept clusters whatever boundaries they touch
    /// * `boundary_faces` - Boundary faces a cluster must connect, same order as `Poly::faces`
    pub fn get_cluster(
        &self,
        n_accepted: usize,
        keep_isolated_fractures: bool,
        keep_only_largest_cluster: bool,
        ignore_boundary_faces: bool,
        boundary_faces: &[bool; 6],
    ) -> Vec<PolyId> {
        info!("Number of fractures: {}", n_accepted);
        info!("Number of groups: {}", self.valid_groups());

        if keep_isolated_fractures {
            return (0..n_accepted).map(PolyId).collect();
        }

        let mut matching_groups: Vec<GroupId> = self
            .group_data
            .iter()
            .enumerate()
            .filter(|(_, data)| {
                data.valid
                    && data.size > 1
                    && (ignore_boundary_faces || faces_match(boundary_faces, &data.faces))
            })
            .map(|(i, _)| GroupId(i + 1))
            .collect();

        if keep_only_largest_cluster && matching_groups.len() > 1 {
            let mut largest_group = matching_groups[0];

            for &gid in matching_groups.iter() {
                if self.data(gid).size > self.data(largest_group).size {
                    largest_group = gid;
                }
            }

            matching_groups = vec![largest_group];
        }

        let mut final_poly_list: Vec<PolyId> = matching_groups
            .into_iter()
            .flat_map(|gid| self.members(gid))
            .collect();
        final_poly_list.sort();

        final_poly_list
    }

    /// Final fracture selection.
    ///
    /// Same as [`ClusterGroups::get_cluster`], but when no cluster connects the requested
    /// boundary faces the selection is retried with boundary faces ignored.
    ///
    /// # Returns
    ///
    /// Selected fractures and whether the boundary faces requirement was met
    pub fn select_fractures(
        &self,
        n_accepted: usize,
        keep_isolated_fractures: bool,
        keep_only_largest_cluster: bool,
        ignore_boundary_faces: bool,
        boundary_faces: &[bool; 6],
    ) -> (Vec<PolyId>, bool) {
        let selected = self.get_cluster(
            n_accepted,
            keep_isolated_fractures,
            keep_only_largest_cluster,
            ignore_boundary_faces,
            boundary_faces,
        );

        if !selected.is_empty() || ignore_boundary_faces || keep_isolated_fractures {
            return (selected, true);
        }

        let fallback = self.get_cluster(
            n_accepted,
            keep_isolated_fractures,
            keep_only_largest_cluster,
            true,
            boundary_faces,
        );

        (fallback, false)
    }
}

/// Test if Boundary Faces Option Match User's Desired Boundary Faces
///
/// # Arguments
///
/// * `faces_option` - Boundary faces user input option array ('boundaryFaces' in input file)
/// * `faces` - Faces a fracture cluster connects to
///
/// # Returns
///
/// True if every face requested by the user is touched by the cluster
fn faces_match(faces_option: &[bool; 6], faces: &[bool; 6]) -> bool {
    faces_option
        .iter()
        .zip(faces.iter())
        .all(|(&wanted, &touched)| !wanted || touched)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poly_with_faces(faces: [bool; 6]) -> Poly {
        let mut poly = Poly::new_rect(1., 1.);
        poly.faces = faces;
        poly
    }

    #[test]
    fn faces_must_cover_option() {
        let option = [true, true, false, false, false, false];
        assert!(faces_match(&option, &[true, true, false, false, true, false]));
        assert!(!faces_match(&option, &[true, false, false, false, false, false]));
    }

    #[test]
    fn merge_bridged_clusters() {
        let mut groups = ClusterGroups::new();
        let mut accepted = Vec::new();

        // Two isolated fractures, touching the +x and -x faces
        for faces in [
            [true, false, false, false, false, false],
            [false, true, false, false, false, false],
        ] {
            let mut poly = poly_with_faces(faces);
            groups.assign_group(&mut poly, PolyId(accepted.len()));
            accepted.push(poly);
        }

        assert_eq!(accepted[0].group, Some(GroupId(1)));
        assert_eq!(accepted[1].group, Some(GroupId(2)));

        // Third fracture bridges both
        let mut bridge = poly_with_faces([false; 6]);
        groups.update_groups(&mut bridge, &mut accepted, &[GroupId(2)], GroupId(1), PolyId(2));
        accepted.push(bridge);

        assert!(accepted.iter().all(|p| p.group == Some(GroupId(1))));
        assert_eq!(groups.data(GroupId(1)).size, 3);
        assert!(!groups.data(GroupId(2)).valid);
        assert_eq!(
            groups.data(GroupId(1)).faces,
            [true, true, false, false, false, false]
        );
        assert_eq!(groups.valid_groups(), 1);

        let boundary = [true, true, false, false, false, false];
        assert_eq!(
            groups.get_cluster(3, false, true, false, &boundary),
            vec![PolyId(0), PolyId(1), PolyId(2)]
        );
    }

    #[test]
    fn largest_cluster_by_size() {
        let mut groups = ClusterGroups::new();
        let mut accepted = Vec::new();

        let mut poly = poly_with_faces([false; 6]);
        groups.assign_group(&mut poly, PolyId(0));
        accepted.push(poly);
        let mut poly = poly_with_faces([false; 6]);
        groups.update_groups(&mut poly, &mut accepted, &[], GroupId(1), PolyId(1));
        accepted.push(poly);

        // Second cluster of 3 fractures
        let mut poly = poly_with_faces([false; 6]);
        groups.assign_group(&mut poly, PolyId(2));
        accepted.push(poly);
        for id in 3..5 {
            let mut poly = poly_with_faces([false; 6]);
            groups.update_groups(&mut poly, &mut accepted, &[], GroupId(2), PolyId(id));
            accepted.push(poly);
        }

        // Isolated fracture
        let mut poly = poly_with_faces([false; 6]);
        groups.assign_group(&mut poly, PolyId(5));
        accepted.push(poly);

        let all = groups.get_cluster(6, false, false, true, &[false; 6]);
        assert_eq!(all.len(), 5);

        let largest = groups.get_cluster(6, false, true, true, &[false; 6]);
        assert_eq!(largest, vec![PolyId(2), PolyId(3), PolyId(4)]);

        let everything = groups.get_cluster(6, true, false, false, &[true; 6]);
        assert_eq!(everything.len(), 6);
    }

    #[test]
    fn fallback_without_boundary_connection() {
        let mut groups = ClusterGroups::new();
        let mut accepted = Vec::new();

        let mut poly = poly_with_faces([false; 6]);
        groups.assign_group(&mut poly, PolyId(0));
        accepted.push(poly);
        let mut poly = poly_with_faces([false; 6]);
        groups.update_groups(&mut poly, &mut accepted, &[], GroupId(1), PolyId(1));
        accepted.push(poly);

        let (selected, connected) =
            groups.select_fractures(2, false, true, false, &[true, true, false, false, false, false]);
        assert!(!connected);
        assert_eq!(selected, vec![PolyId(0), PolyId(1)]);
    }
}
