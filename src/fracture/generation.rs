use std::sync::atomic::{AtomicBool, Ordering};

use itertools::zip_eq;
use rand_mt::Mt64;
use tracing::{debug, info};

use super::fracture_family::{FamilySelector, FractureFamilyOption, RadiusOption};
use super::insert_shape::{outside_domain, print_reject_reason, re_translate_poly};
use super::network::FractureNetwork;
use super::poly::Poly;
use super::user_defined_fractures::UserFractures;
use crate::error::DfngenError;
use crate::io::input::Input;
use crate::io::read_input_functions::get_time_based_seed;
use crate::structures::{FamilyId, PolyId, PolyOptions};

/// Radii of a generated fracture, accepted or not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratedRadius {
    pub xradius: f64,
    pub yradius: f64,
    pub family: FamilyId,
}

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationSummary {
    /// Fractures kept after isolated fracture removal, sorted by acceptance.
    pub final_fractures: Vec<PolyId>,
    /// False when no cluster connects the requested boundary faces and the selection
    /// fell back to ignoring them.
    pub boundary_connected: bool,
    pub seed: u64,
}

/// Owns everything a DFN generation run mutates: the families and their P32 state,
/// the random generator and the fracture network.
pub struct DfnGenerator {
    pub input: Input,
    pub fam_opt: FractureFamilyOption,
    pub opts: PolyOptions,
    pub network: FractureNetwork,
    pub user_fractures: UserFractures,
    /// Every generated radius, filled when `outputAllRadii` is set.
    pub all_radii: Vec<GeneratedRadius>,
    seed: u64,
    rng: Mt64,
}

impl DfnGenerator {
    /// Seeds the generator (a seed of 0 is taken from the clock) and reads the user
    /// fracture files named in `input`.
    pub fn new(input: Input, fam_opt: FractureFamilyOption) -> Result<Self, DfngenError> {
        let seed = match input.seed {
            0 => get_time_based_seed()?,
            seed => seed,
        };

        let user_fractures = UserFractures::from_files(&input.ext_fracture_files)?;

        Ok(Self {
            opts: input.poly_options(),
            network: FractureNetwork::new(fam_opt.families.len()),
            input,
            fam_opt,
            user_fractures,
            all_radii: Vec::new(),
            seed,
            rng: Mt64::new(seed),
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generates the DFN.
    ///
    /// Radii lists are prepared, user fractures inserted, then stochastic fractures are
    /// inserted until the stop condition is met or `stop` is raised. Small fractures are
    /// removed afterwards when requested, and the final fractures are selected from the
    /// clusters.
    ///
    /// # Errors
    ///
    /// `NoFractures` when the final selection is empty, any error of radii generation.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<GenerationSummary, DfngenError> {
        if !self.fam_opt.families.is_empty() {
            self.prepare_radii_lists()?;
        }

        // ********************* User Defined Shapes Insertion ************************
        self.user_fractures.insert(
            self.input.insertUserRectanglesFirst,
            &mut self.network,
            &self.opts,
            self.input.printRejectReasons,
        );

        if !self.fam_opt.families.is_empty() {
            self.insert_stochastic_fractures(stop)?;
        }

        // Remove last element off the rejects per attempt counter.
        // It will have one extra item due to how each element is initialized.
        self.network.stats.rejects_per_attempt.pop();

        info!("Network Generation Complete");
        info!("Version of dfn-fram: {}", env!("CARGO_PKG_VERSION"));

        if self.input.stopCondition == 1 {
            info!("Final p32 values per family:");

            for family in self.fam_opt.families.iter() {
                info!(
                    "{} target P32 = {}, Final P32 = {}",
                    family, family.p32_target, family.current_p32
                );
            }
        }

        self.log_statistics_before_removal();

        if self.input.removeFracturesLessThan > 0. {
            info!(
                "Removing fractures with radius less than {} and rebuilding DFN",
                self.input.removeFracturesLessThan
            );
            let removed = self
                .network
                .remove_small_fractures(&self.opts, self.input.removeFracturesLessThan);
            info!(
                "Removed {} fractures with radius less than {}",
                removed, self.input.removeFracturesLessThan
            );
        }

        // Remove any isolated fractures and return a list of polygon indices matching
        // the users boundaryFaces option
        let (final_fractures, boundary_connected) = self.network.groups.select_fractures(
            self.network.len(),
            self.input.keepIsolatedFractures,
            self.input.keepOnlyLargestCluster,
            self.input.ignoreBoundaryFaces,
            &self.input.boundaryFaces,
        );

        if final_fractures.is_empty() {
            return Err(DfngenError::NoFractures);
        }

        self.log_statistics_after_removal(&final_fractures);
        self.log_intersection_statistics();
        self.log_estimation_statistics();
        info!("Seed: {}", self.seed);

        Ok(GenerationSummary {
            final_fractures,
            boundary_connected,
            seed: self.seed,
        })
    }

    /// Pre-generates radii: from nPoly and famProb, or from a dry run for the P32
    /// option. Lists get `radiiListIncrease` more radii and are sorted largest first.
    fn prepare_radii_lists(&mut self) -> Result<(), DfngenError> {
        let h = self.input.h;

        if self.input.stopCondition == 0 {
            self.fam_opt.generate_radii_lists_n_poly(
                self.input.forceLargeFractures,
                self.input.nPoly,
                h,
                &mut self.rng,
            )?;
        } else if !self.input.disableFram {
            self.fam_opt.dry_run(
                &self.opts,
                self.input.rejectsPerFracture,
                self.input.forceLargeFractures,
                &mut self.rng,
            )?;
        }

        if !self.input.disableFram {
            self.fam_opt
                .add_radii_to_lists(self.input.radiiListIncrease, h, &mut self.rng)?;
            self.fam_opt.log_estimates();
        }

        self.fam_opt.sort_radii();

        for (expected, family) in self
            .network
            .stats
            .expected_from_fam
            .iter_mut()
            .zip(self.fam_opt.families.iter())
        {
            *expected = family.radii_list.len();
        }

        Ok(())
    }

    /// Stochastic Fracture Insertion
    ///
    /// Each new fracture is truncated against the domain and checked by FRAM. A
    /// rejected fracture is re-translated until it has been rejected
    /// `rejectsPerFracture` times, then discarded.
    fn insert_stochastic_fractures(&mut self, stop: &AtomicBool) -> Result<(), DfngenError> {
        let p32_option = self.input.stopCondition == 1;
        let mut selector = FamilySelector::new(&self.fam_opt.probabilities);

        if p32_option {
            for (i, family) in self.fam_opt.families.iter().enumerate() {
                if family.p32_complete() {
                    selector.remove(i);
                }
            }
        }

        while !stop.load(Ordering::Relaxed) {
            if !p32_option && self.network.stats.accepted_poly_count >= self.input.nPoly {
                break;
            }

            let Some(family_index) = selector.select(&mut self.rng) else {
                break;
            };

            let family = &mut self.fam_opt.families[family_index];
            let mut new_poly = family.create_poly(
                &self.opts,
                family_index,
                &mut self.rng,
                RadiusOption::FromCacheOrRng,
            )?;

            if self.input.outputAllRadii {
                self.all_radii.push(GeneratedRadius {
                    xradius: new_poly.xradius,
                    yradius: new_poly.yradius,
                    family: new_poly.family,
                });
            }

            let label = family.to_string();
            let mut reject_counter = 0;
            let mut accepted = None;

            loop {
                let rejected = if outside_domain(&mut new_poly, &self.opts) {
                    // Poly was completely outside domain, or was truncated to less than
                    // 3 vertices due to vertices being too close together, or its center
                    // missed the polygon boundary
                    self.network.stats.rejection_reasons.outside += 1;
                    self.network.stats.add_reject_for_attempt();
                    debug!("Attempted fracture from {} landed outside of the domain", label);
                    true
                } else {
                    match self.network.try_insert(&self.opts, &mut new_poly) {
                        Ok(id) => {
                            accepted = Some(id);
                            false
                        }
                        Err(code) => {
                            self.network.stats.rejection_reasons.record(code);
                            self.network.stats.add_reject_for_attempt();
                            print_reject_reason(code, &label, self.input.printRejectReasons);
                            true
                        }
                    }
                };

                if !rejected {
                    break;
                }

                reject_counter += 1;

                if reject_counter >= self.input.rejectsPerFracture {
                    // Stop retranslating polygon if its reached its reject limit
                    self.network.stats.rejected_poly_count += 1;
                    self.network.stats.rejected_from_fam[family_index] += 1;
                    break;
                }

                if self.input.printRejectReasons {
                    info!("Translating rejected fracture to new position");
                }

                self.network.stats.retranslated_poly_count += 1;
                re_translate_poly(&mut new_poly, family, &self.opts, &mut self.rng)?;
            }

            let Some(id) = accepted else {
                continue;
            };

            let poly = &self.network.accepted_poly[id.index()];
            let stats = &mut self.network.stats;
            stats.accepted_poly_count += 1;
            stats.accepted_from_fam[family_index] += 1;
            // Make new rejection counter for next fracture attempt
            stats.rejects_per_attempt.push(0);

            if poly.truncated {
                stats.truncated += 1;
            }

            family.current_p32 +=
                poly.area * 2. / self.opts.family_volume(family.layer, family.region);

            // Stop inserting from a family once its p32 requirement is met
            if p32_option && family.p32_complete() && selector.contains(family_index) {
                selector.remove(family_index);
                info!("P32 For Family {} Completed", family_index + 1);
            }

            if self.network.stats.accepted_poly_count % 200 == 0 {
                self.log_progress();
            }
        }

        if stop.load(Ordering::Relaxed) {
            info!("DFN generation stopped by user");
        }

        Ok(())
    }

    fn log_progress(&self) {
        let stats = &self.network.stats;
        info!("Accepted {} fractures", stats.accepted_poly_count);
        info!("Rejected {} fractures", stats.rejected_poly_count);
        info!("Re-translated {} fractures", stats.retranslated_poly_count);
        info!("Current p32 values per family:");

        for family in self.fam_opt.families.iter() {
            if self.input.stopCondition == 0 {
                info!("{} Current P32 = {:.8}", family, family.current_p32);
            } else {
                info!(
                    "{} target P32 = {:.8}, Current P32 = {:.8}",
                    family, family.p32_target, family.current_p32
                );

                if family.p32_complete() {
                    info!("...Done");
                }
            }
        }
    }

    /// Area per stochastic family and area of user fractures, one side only.
    fn areas<'a>(&self, polys: impl Iterator<Item = &'a Poly>) -> (Vec<f64>, f64) {
        let mut family_area = vec![0.; self.fam_opt.families.len()];
        let mut user_defined_area = 0.;

        for poly in polys {
            match poly.family.stochastic() {
                Some(i) => family_area[i] += poly.area,
                None => user_defined_area += poly.area,
            }
        }

        (family_area, user_defined_area)
    }

    fn log_family_location(&self, family_index: usize) {
        let family = &self.fam_opt.families[family_index];

        if family.layer > 0 {
            let idx = (family.layer - 1) * 2;
            info!("Layer: {}", family.layer);
            info!(
                "Layer {{-z, +z}}: {{{}, {}}}",
                self.opts.layers[idx],
                self.opts.layers[idx + 1]
            );
        } else {
            info!("Layer: Whole Domain");
        }

        if family.region > 0 {
            let idx = (family.region - 1) * 6;
            info!("Region: {}", family.region);
            info!("{{-x,+x,-y,+y,-z,+z}}: {:?}", &self.opts.regions[idx..idx + 6]);
        } else {
            info!("Region: Whole Domain");
        }
    }

    fn log_statistics_before_removal(&mut self) {
        let dom_vol = self.opts.domain_volume();
        let (family_area, user_defined_area) = self.areas(self.network.accepted_poly.iter());
        self.network.stats.area_before_removal =
            family_area.iter().sum::<f64>() + user_defined_area;

        let stats = &self.network.stats;
        info!("Statistics Before Isolated Fractures Removed:");
        info!("Fractures: {}", self.network.len());
        info!("Truncated: {}", stats.truncated);
        info!("Total Surface Area: {} m^2", stats.area_before_removal * 2.);
        info!(
            "Total Fracture Density (P30): {}",
            self.network.len() as f64 / dom_vol
        );
        info!(
            "Total Fracture Intensity (P32): {}",
            stats.area_before_removal * 2. / dom_vol
        );

        for (i, family) in self.fam_opt.families.iter().enumerate() {
            info!("{}", family);
            info!("Accepted: {}", stats.accepted_from_fam[i]);
            info!("Rejected: {}", stats.rejected_from_fam[i]);
            self.log_family_location(i);
            info!("Surface Area: {} m^2", family_area[i] * 2.);
            info!("Fracture Intensity (P32): {}", family.current_p32);
        }

        if user_defined_area > 0. {
            info!("User Defined:");
            info!("Surface Area: {} m^2", user_defined_area * 2.);
            info!(
                "Fracture Intensity (P32): {}",
                user_defined_area * 2. / dom_vol
            );
        }
    }

    fn log_statistics_after_removal(&mut self, final_fractures: &[PolyId]) {
        let dom_vol = self.opts.domain_volume();
        let n_families = self.fam_opt.families.len();
        let (family_area, user_defined_area) = self.areas(
            final_fractures
                .iter()
                .map(|id| &self.network.accepted_poly[id.index()]),
        );
        self.network.stats.area_after_removal = self.network.area_of(final_fractures);

        // Re-count number of accepted fracture per family after isloated fractures were removed
        let mut final_from_fam = vec![0; n_families];
        for id in final_fractures {
            if let Some(i) = self.network.accepted_poly[id.index()].family.stochastic() {
                final_from_fam[i] += 1;
            }
        }

        let stats = &self.network.stats;
        info!("Statistics After Isolated Fractures Removed:");
        info!("Final Number of Fractures: {}", final_fractures.len());
        info!(
            "Isolated Fractures Removed: {}",
            self.network.len() - final_fractures.len()
        );
        info!("Total Surface Area: {} m^2", stats.area_after_removal * 2.);
        info!(
            "Total Fracture Density (P30): {}",
            final_fractures.len() as f64 / dom_vol
        );
        info!(
            "Total Fracture Intensity (P32): {}",
            stats.area_after_removal * 2. / dom_vol
        );

        for (i, (family, fam_area)) in zip_eq(&self.fam_opt.families, &family_area).enumerate() {
            info!("{}", family);
            info!(
                "Fractures After Isolated Fracture Removal: {}",
                final_from_fam[i]
            );
            info!(
                "Isolated Fractures Removed: {}",
                stats.accepted_from_fam[i].saturating_sub(final_from_fam[i])
            );
            info!("Accepted: {}", stats.accepted_from_fam[i]);
            info!("Rejected: {}", stats.rejected_from_fam[i]);
            self.log_family_location(i);
            info!("Surface Area: {} m^2", fam_area * 2.);
            info!("Fracture Intensity (P32): {}", fam_area * 2. / dom_vol);
        }

        if user_defined_area > 0. {
            info!("User Defined Shapes:");
            info!("Surface Area: {} m^2", user_defined_area * 2.);
            info!(
                "Fracture Intensity (P32): {}",
                user_defined_area * 2. / dom_vol
            );
        }

        info!(
            "{} Fractures Accepted (Before Isolated Fracture Removal)",
            self.network.len()
        );
        info!(
            "{} Final Fractures (After Isolated Fracture Removal)",
            final_fractures.len()
        );
        info!("Total Fractures Rejected: {}", stats.rejected_poly_count);
        info!(
            "Total Fractures Re-translated: {}",
            stats.retranslated_poly_count
        );
    }

    fn log_intersection_statistics(&self) {
        let stats = &self.network.stats;
        let reasons = &stats.rejection_reasons;

        info!(
            "Number of Triple Intersection Points (Before Isolated Fracture Removal): {}",
            self.network.triple_points.len()
        );
        info!("Intersection Statistics:");
        info!("Number of Intersections: {}", self.network.intersections.len());
        info!("Intersections Shortened: {}", stats.intersections_shortened);
        info!(
            "Original Intersection (Before Intersection Shrinking) Length: {} m",
            stats.original_length
        );
        info!("Intersection Length Discarded: {} m", stats.discarded_length);
        info!(
            "Final Intersection Length: {} m",
            stats.original_length - stats.discarded_length
        );

        info!("Rejection Statistics:");
        info!("{} Short Intersections", reasons.short_intersection);
        info!("{} Close to Node", reasons.close_to_node);
        info!("{} Close to Edge", reasons.close_to_edge);
        info!("{} Outside of Domain", reasons.outside);
        info!("{} Triple intersection Rejections", reasons.triple);
        info!(
            "{} Intersections Close to Other Intersections",
            reasons.inter_close_to_inter
        );
        info!("{} Fractures on the Same Plane", reasons.same_plane);
    }

    fn log_estimation_statistics(&self) {
        if self.fam_opt.families.is_empty() {
            return;
        }

        let stats = &self.network.stats;
        info!("Fracture Estimation statistics:");
        info!("NOTE: If estimation and actual are very different, expected family distributions might not be accurate.");
        info!("If this is the case, try increasing or decreasing the 'radiiListIncrease' option in the input file.");

        for (i, family) in self.fam_opt.families.iter().enumerate() {
            if family.radius.is_constant() {
                info!("{} Using constant size", family);
            } else {
                info!("{} Estimated: {}", family, stats.expected_from_fam[i]);
                info!(
                    "Actual: {}",
                    stats.accepted_from_fam[i] + stats.rejected_from_fam[i]
                );
            }
        }
    }
}
