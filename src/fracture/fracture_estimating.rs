use rand::Rng;
use tracing::{info, warn};

use super::fracture_family::{
    FamilySelector, FractureFamily, FractureFamilyOption, RadiusOption,
};
use super::insert_shape::{outside_domain, re_translate_poly};
use crate::error::DfngenError;
use crate::structures::PolyOptions;

/// Pre-generated radii must be at least this many times h.
pub const MIN_RADIUS_FACTOR: f64 = 3.0;

/// Draws of a radius smaller than the minimum radius after which a warning is logged.
const WARN_SMALL_RADIUS_DRAWS: usize = 1000;

/// Draws of a radius smaller than the minimum radius after which radii list generation fails.
const MAX_SMALL_RADIUS_DRAWS: usize = 100_000;

/// Add Radii To Family's Radii List
///
/// Adds `amount_to_add` radii drawn from the family's distribution. Radii smaller than
/// 3*h are redrawn. Constant families have no list.
///
/// # Arguments
///
/// * `family` - The family the radii are being added to
/// * `amount_to_add` - Number of radii to add to the list
/// * `h` - Minimum feature size
/// * `rng` - Random number generator
fn add_radii<R: Rng + ?Sized>(
    family: &mut FractureFamily,
    amount_to_add: usize,
    h: f64,
    rng: &mut R,
) -> Result<(), DfngenError> {
    if family.radius.is_constant() {
        return Ok(());
    }

    let min_radius = MIN_RADIUS_FACTOR * h;
    family.radii_list.reserve(amount_to_add);

    for _ in 0..amount_to_add {
        let mut count = 0;

        let radius = loop {
            let radius = family.radius.sample(rng)?;
            count += 1;

            if radius >= min_radius {
                break radius;
            }

            if count >= MAX_SMALL_RADIUS_DRAWS {
                return Err(DfngenError::TooManySmallFractures {
                    family: family.to_string(),
                });
            }

            if count % WARN_SMALL_RADIUS_DRAWS == 0 {
                warn!(
                    "{} is attepting to populate fracture radii lists, however many fractures are being generated with radii less than 3*h (Minimum radius). Consider adjusting distribution parameters.",
                    family
                );
            }
        };

        family.radii_list.push(radius);
    }

    Ok(())
}

impl FractureFamilyOption {
    /// Create Radii Lists for Fracture Families When Using NPoly Option
    ///
    /// Each family gets `ceil(probability * n_poly)` radii. With `force_large_fractures`
    /// every family first gets its maximum radius, which is taken off `n_poly`.
    pub fn generate_radii_lists_n_poly<R: Rng + ?Sized>(
        &mut self,
        force_large_fractures: bool,
        n_poly: usize,
        h: f64,
        rng: &mut R,
    ) -> Result<(), DfngenError> {
        info!("Building radii lists for nPoly option...");
        let mut n_poly = n_poly;

        if force_large_fractures {
            for family in self.families.iter_mut() {
                let radius = family.radius.max;
                family.radii_list.push(radius);
            }

            n_poly = n_poly.saturating_sub(self.families.len());
        }

        for (family, prob) in self.families.iter_mut().zip(self.probabilities.iter()) {
            let amount = (prob * n_poly as f64).ceil() as usize;
            add_radii(family, amount, h, rng)?;
        }

        info!("Building radii lists for nPoly option Complete");

        Ok(())
    }

    /// Add Percentage More Radii To Radii Lists
    ///
    /// Adds `ceil(len * percent)` radii to every family's list, to account for rejections.
    /// eg .10 will add %10 more radii.
    pub fn add_radii_to_lists<R: Rng + ?Sized>(
        &mut self,
        percent: f64,
        h: f64,
        rng: &mut R,
    ) -> Result<(), DfngenError> {
        for family in self.families.iter_mut() {
            let amount_to_add = (family.radii_list.len() as f64 * percent).ceil() as usize;
            add_radii(family, amount_to_add, h, rng)?;
        }

        Ok(())
    }

    /// Estimate Number of Fractures When P32 Option is Used
    ///
    /// Inserts fractures into the domain with FRAM disabled, only truncating them, until
    /// every family's P32 target is met. The radii of the inserted fractures become the
    /// families' radii lists. P32 counters are reset afterwards.
    ///
    /// # Arguments
    ///
    /// * `opts` - Domain, layers, regions and tolerances
    /// * `rejects_per_fracture` - Re-translation attempts before a fracture is discarded
    /// * `force_large_fractures` - Insert one fracture of maximum radius per family first
    /// * `rng` - Random number generator
    pub fn dry_run<R: Rng + ?Sized>(
        &mut self,
        opts: &PolyOptions,
        rejects_per_fracture: usize,
        force_large_fractures: bool,
        rng: &mut R,
    ) -> Result<(), DfngenError> {
        info!(
            "Estimating number of fractures per family for defined fracture intensities (P32)..."
        );

        let mut selector = FamilySelector::new(&self.probabilities);
        let mut force_large_fract_count = 0;

        // Families which start complete are never drawn
        for (i, family) in self.families.iter().enumerate() {
            if family.p32_complete() {
                selector.remove(i);
            }
        }

        while !selector.is_empty() {
            let (family_index, radius_option) =
                if force_large_fractures && force_large_fract_count < self.families.len() {
                    force_large_fract_count += 1;
                    (force_large_fract_count - 1, RadiusOption::MaxRadius)
                } else {
                    match selector.select(rng) {
                        Some(i) => (i, RadiusOption::FromRng),
                        None => break,
                    }
                };

            let family = &mut self.families[family_index];
            let mut new_poly = family.create_poly(opts, family_index, rng, radius_option)?;
            let mut reject_counter = 0;
            let mut rejected = false;

            while outside_domain(&mut new_poly, opts) {
                reject_counter += 1;

                if reject_counter >= rejects_per_fracture {
                    rejected = true;
                    break;
                }

                re_translate_poly(&mut new_poly, family, opts, rng)?;
            }

            if rejected {
                continue;
            }

            new_poly.assign_area();
            family.current_p32 +=
                new_poly.area * 2. / opts.family_volume(family.layer, family.region);

            // Save radius for real DFN generation
            family.radii_list.push(new_poly.xradius);

            if family.p32_complete() {
                selector.remove(family_index);
            }
        }

        for family in self.families.iter_mut() {
            family.current_p32 = 0.;
        }

        Ok(())
    }

    /// Logs the size of every family's radii list.
    pub fn log_estimates(&self) {
        for family in self.families.iter() {
            info!(
                "Estimated {} fractures for {}",
                family.radii_list.len(),
                family
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use parry3d_f64::na::Vector3;
    use rand_mt::Mt64;

    use super::*;
    use crate::distribution::{Fisher, Orientation};
    use crate::fracture::fracture_family::FractureFamilyBuilder;
    use crate::structures::RadiusDistribution;

    fn options(opts: &PolyOptions, radius: RadiusDistribution) -> FractureFamilyOption {
        let mut families = Vec::new();

        for number in 1..=2 {
            families.push(
                FractureFamilyBuilder::new()
                    .number(number)
                    .radius(radius)
                    .aspect_ratio(1.)
                    .p32_target(0.2)
                    .orientation(Orientation::Fisher(Fisher::new(Vector3::z(), 5., opts.eps)))
                    .build(opts)
                    .unwrap(),
            );
        }

        FractureFamilyOption {
            families,
            probabilities: vec![0.6, 0.4],
        }
    }

    #[test]
    fn n_poly_lists_with_large_fractures() {
        let opts = PolyOptions::new(0.1, Vector3::new(20., 20., 20.));
        let mut fam_opt = options(
            &opts,
            RadiusDistribution::new_truncated_power_law(1.5, 1., 5.),
        );
        let mut rng = Mt64::new(17);

        fam_opt
            .generate_radii_lists_n_poly(true, 12, opts.h, &mut rng)
            .unwrap();

        // ceil(0.6 * 10) + 1 and ceil(0.4 * 10) + 1
        assert_eq!(fam_opt.families[0].radii_list.len(), 7);
        assert_eq!(fam_opt.families[1].radii_list.len(), 5);
        assert_eq!(fam_opt.families[0].radii_list[0], 5.);

        fam_opt.add_radii_to_lists(0.5, opts.h, &mut rng).unwrap();
        assert_eq!(fam_opt.families[0].radii_list.len(), 11);
        assert_eq!(fam_opt.families[1].radii_list.len(), 8);

        fam_opt.sort_radii();
        for family in fam_opt.families.iter() {
            assert!(family.radii_list.windows(2).all(|w| w[0] >= w[1]));
            assert!(family.radii_list.iter().all(|&r| r >= 3. * opts.h));
        }
    }

    #[test]
    fn radii_below_minimum_fail() {
        let opts = PolyOptions::new(1., Vector3::new(20., 20., 20.));
        // Every radius is below 3*h
        let mut fam_opt = options(
            &opts,
            RadiusDistribution::new_truncated_power_law(1.5, 1., 2.),
        );
        let mut rng = Mt64::new(2);

        let err = fam_opt
            .generate_radii_lists_n_poly(false, 4, opts.h, &mut rng)
            .unwrap_err();
        assert!(matches!(err, DfngenError::TooManySmallFractures { .. }));
    }

    #[test]
    fn dry_run_reaches_targets() {
        let opts = PolyOptions::new(0.05, Vector3::new(10., 10., 10.));
        let mut fam_opt = options(&opts, RadiusDistribution::new_constant(1.));
        let mut rng = Mt64::new(99);

        fam_opt.dry_run(&opts, 10, false, &mut rng).unwrap();

        for family in fam_opt.families.iter() {
            // Each fracture adds at most 8 / 1000 to P32
            assert!(family.radii_list.len() >= 25);
            assert_eq!(family.current_p32, 0.);
        }
    }
}
