use std::collections::BTreeSet;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use itertools::Itertools;
use parry3d_f64::na::{distance, Point3};
use tracing::info;

use crate::distribution::generating_points::discretize_line_of_intersection;
use crate::error::DfngenError;
use crate::fracture::generation::{DfnGenerator, GeneratedRadius};
use crate::fracture::network::FractureNetwork;
use crate::fracture::user_defined_fractures::UserFractures;
use crate::structures::{FamilyId, PolyId, Shape, Stats};

fn create<P: AsRef<Path>>(path: P) -> Result<BufWriter<File>, DfngenError> {
    Ok(BufWriter::new(File::create(path)?))
}

/// Output file numbering: fracture `final_fractures[i]` is written as `i + 1`, removed
/// fractures have no number.
fn final_numbering(n_accepted: usize, final_fractures: &[PolyId]) -> Vec<Option<usize>> {
    let mut numbers = vec![None; n_accepted];

    for (i, id) in final_fractures.iter().enumerate() {
        numbers[id.index()] = Some(i + 1);
    }

    numbers
}

/// Writes the DFN generation output files into `{output_folder}/dfnGen_output/`.
///
/// Fractures are renumbered 1..N in the order of `final_fractures`. The mesh files
/// are written last, as they leave the final fractures rotated into the x-y plane.
pub fn write_output(
    output_folder: &Path,
    generator: &mut DfnGenerator,
    final_fractures: &[PolyId],
) -> Result<(), DfngenError> {
    let input = &generator.input;
    let network = &generator.network;
    let output = output_folder.join("dfnGen_output");
    let radii_folder = output.join("radii");
    create_dir_all(&output)?;

    info!("Writing output files to {}", output.display());

    write_polys(&output, network, final_fractures)?;
    write_intersection_list(&output, network, final_fractures)?;

    if input.tripleIntersections {
        write_triple_points(&output, network, final_fractures)?;
    }

    write_final_poly_radii(&output, network, final_fractures)?;
    write_normal_vectors(&output, network, final_fractures)?;
    write_fracture_translations(&output, network, final_fractures)?;
    write_final_poly_area(&output, network, final_fractures)?;
    write_rejection_stats(&output, &network.stats)?;
    write_rejects_per_attempt(&output, &network.stats)?;
    write_frac_fams(&output, generator)?;

    if !network.stats.rejected_user_fracture.is_empty() {
        write_user_rejected_fracture_information(&output, &network.stats)?;
    }

    if input.outputAllRadii || input.outputAcceptedRadiiPerFamily || input.outputFinalRadiiPerFamily {
        create_dir_all(&radii_folder)?;
    }

    if input.outputAllRadii {
        write_all_radii(&radii_folder, &generator.all_radii)?;
    }

    let families = output_families(generator);

    if input.outputAcceptedRadiiPerFamily {
        info!("Writing accepted radii files (per family)");
        let accepted: Vec<PolyId> = (0..network.len()).map(PolyId).collect();

        for family in families.iter() {
            write_radii_of_family(&radii_folder, "AllAccepted", network, &accepted, *family)?;
        }
    }

    if input.outputFinalRadiiPerFamily {
        info!("Writing final radii files (per family)");

        for family in families.iter() {
            write_radii_of_family(&radii_folder, "Final", network, final_fractures, *family)?;
        }
    }

    let h = generator.opts.h;
    let eps = generator.opts.eps;
    write_intersection_files(&output, &mut generator.network, final_fractures, h, eps)?;
    write_polys_inp(&output, &generator.network, final_fractures)?;

    info!("Output files written");

    Ok(())
}

/// Every family a fracture may come from in this run.
fn output_families(generator: &DfnGenerator) -> Vec<FamilyId> {
    let mut families: Vec<FamilyId> = (0..generator.fam_opt.families.len())
        .map(FamilyId::Stochastic)
        .collect();

    families.extend(generator.user_fractures.families());
    families
}

/// Writes polygons.dat: the number of polygons, then one line per polygon with its
/// number of vertices followed by the vertices.
pub fn write_polys(
    output: &Path,
    network: &FractureNetwork,
    final_fractures: &[PolyId],
) -> Result<(), DfngenError> {
    let mut file = create(output.join("polygons.dat"))?;
    info!("Writing polygon file");

    writeln!(file, "nPolygons: {}", final_fractures.len())?;

    for id in final_fractures {
        let poly = &network.accepted_poly[id.index()];
        write!(file, "{}", poly.number_of_nodes())?;

        for v in poly.vertices.iter() {
            write!(file, " {{{:.12}, {:.12}, {:.12}}}", v.x, v.y, v.z)?;
        }

        writeln!(file)?;
    }

    Ok(())
}

/// Writes intersection_list.dat, one line per intersection between two final
/// fractures: the two fracture numbers, the intersection mid point and its length.
pub fn write_intersection_list(
    output: &Path,
    network: &FractureNetwork,
    final_fractures: &[PolyId],
) -> Result<(), DfngenError> {
    let numbers = final_numbering(network.len(), final_fractures);
    let mut file = create(output.join("intersection_list.dat"))?;
    info!("Writing intersection list");

    writeln!(file, "f1 f2 x y z length")?;

    for intersection in network.intersections.iter() {
        let (Some(f1), Some(f2)) = (
            numbers[intersection.fract1.index()],
            numbers[intersection.fract2.index()],
        ) else {
            continue;
        };

        let mid = parry3d_f64::na::center(&intersection.p1, &intersection.p2);
        writeln!(
            file,
            "{} {} {:.12} {:.12} {:.12} {:.12}",
            f1.min(f2),
            f1.max(f2),
            mid.x,
            mid.y,
            mid.z,
            intersection.length()
        )?;
    }

    Ok(())
}

/// Writes triple_points.dat, the triple intersection points lying on intersections
/// of final fractures.
pub fn write_triple_points(
    output: &Path,
    network: &FractureNetwork,
    final_fractures: &[PolyId],
) -> Result<(), DfngenError> {
    let numbers = final_numbering(network.len(), final_fractures);
    let mut file = create(output.join("triple_points.dat"))?;
    info!("Writing triple intersection points");

    let points: BTreeSet<usize> = network
        .intersections
        .iter()
        .filter(|i| numbers[i.fract1.index()].is_some() && numbers[i.fract2.index()].is_some())
        .flat_map(|i| i.triple_points_idx.iter().map(|t| t.index()))
        .collect();

    for idx in points {
        let pt = &network.triple_points[idx];
        writeln!(file, "{:.17} {:.17} {:.17}", pt.x, pt.y, pt.z)?;
    }

    Ok(())
}

/// Writes radii_Final.dat: x and y radius and family number of every final fracture.
pub fn write_final_poly_radii(
    output: &Path,
    network: &FractureNetwork,
    final_fractures: &[PolyId],
) -> Result<(), DfngenError> {
    let mut file = create(output.join("radii_Final.dat"))?;
    info!("Writing final radii file");

    writeln!(file, "Fracture Radii List After Isolated Fracture and Cluster Removal")?;
    writeln!(file, "Format: xRadius yRadius Family#")?;
    writeln!(file, "Family -1 = user ellipses, -2 = user rectangles, -3 = user polygons")?;

    for id in final_fractures {
        let poly = &network.accepted_poly[id.index()];
        writeln!(
            file,
            "{:.8} {:.8} {}",
            poly.xradius,
            poly.yradius,
            poly.family.code()
        )?;
    }

    Ok(())
}

/// Writes normal_vectors.dat, the unit normal of every final fracture.
pub fn write_normal_vectors(
    output: &Path,
    network: &FractureNetwork,
    final_fractures: &[PolyId],
) -> Result<(), DfngenError> {
    let mut file = create(output.join("normal_vectors.dat"))?;
    info!("Writing normal vectors");

    for id in final_fractures {
        let n = &network.accepted_poly[id.index()].normal;
        writeln!(file, "{:.15} {:.15} {:.15}", n.x, n.y, n.z)?;
    }

    Ok(())
}

/// Writes translations.dat, the translation of every accepted fracture. Fractures
/// removed by the cluster selection are marked with `R`.
pub fn write_fracture_translations(
    output: &Path,
    network: &FractureNetwork,
    final_fractures: &[PolyId],
) -> Result<(), DfngenError> {
    let numbers = final_numbering(network.len(), final_fractures);
    let mut file = create(output.join("translations.dat"))?;
    info!("Writing fracture translations");

    writeln!(file, "Fracture Translations")?;
    writeln!(file, "Format: x y z  (R = removed from domain due to fracture isolation)")?;

    for (poly, number) in network.accepted_poly.iter().zip(numbers) {
        let t = &poly.translation;
        write!(file, "{:.10} {:.10} {:.10}", t.x, t.y, t.z)?;

        if number.is_none() {
            write!(file, " R")?;
        }

        writeln!(file)?;
    }

    Ok(())
}

/// Writes surface_area_Final.dat, one side of every final fracture.
pub fn write_final_poly_area(
    output: &Path,
    network: &FractureNetwork,
    final_fractures: &[PolyId],
) -> Result<(), DfngenError> {
    let mut file = create(output.join("surface_area_Final.dat"))?;
    info!("Writing final surface areas");

    writeln!(file, "Fracture Surface Area After Isolated Fracture and Cluster Removal")?;

    for id in final_fractures {
        writeln!(file, "{:.10}", network.accepted_poly[id.index()].area)?;
    }

    Ok(())
}

/// Writes rejections.dat, the totals of every rejection reason.
pub fn write_rejection_stats(output: &Path, stats: &Stats) -> Result<(), DfngenError> {
    let mut file = create(output.join("rejections.dat"))?;
    let reasons = &stats.rejection_reasons;

    writeln!(file, "Short Intersection: {}", reasons.short_intersection)?;
    writeln!(file, "Close to Node: {}", reasons.close_to_node)?;
    writeln!(file, "Close to Edge: {}", reasons.close_to_edge)?;
    writeln!(file, "Outside of Domain: {}", reasons.outside)?;
    writeln!(file, "Triple Intersection: {}", reasons.triple)?;
    writeln!(file, "Intersections Too Close: {}", reasons.inter_close_to_inter)?;
    writeln!(file, "Same Plane: {}", reasons.same_plane)?;

    Ok(())
}

/// Writes rejectsPerAttempt.dat, the number of rejections before each accepted fracture.
pub fn write_rejects_per_attempt(output: &Path, stats: &Stats) -> Result<(), DfngenError> {
    let mut file = create(output.join("rejectsPerAttempt.dat"))?;

    for rejects in stats.rejects_per_attempt.iter() {
        writeln!(file, "{}", rejects)?;
    }

    Ok(())
}

/// Writes userFractureRejections.dat, the user fractures which could not be inserted.
pub fn write_user_rejected_fracture_information(
    output: &Path,
    stats: &Stats,
) -> Result<(), DfngenError> {
    let mut file = create(output.join("userFractureRejections.dat"))?;
    info!("Writing user fracture rejections");

    writeln!(file, "Fracture id,User Fracture Type")?;

    for rejected in stats.rejected_user_fracture.iter() {
        writeln!(file, "{},{}", rejected.id, rejected.family.code())?;
    }

    Ok(())
}

/// Writes radii_All.dat, the radii of every generated fracture, accepted or rejected.
pub fn write_all_radii(radii_folder: &Path, all_radii: &[GeneratedRadius]) -> Result<(), DfngenError> {
    let mut file = create(radii_folder.join("radii_All.dat"))?;
    info!("Writing all generated radii");

    writeln!(file, "Fracture Radii List, All Generated Fractures")?;
    writeln!(file, "Format: xRadius yRadius Family#")?;

    for radius in all_radii {
        writeln!(
            file,
            "{:.8} {:.8} {}",
            radius.xradius,
            radius.yradius,
            radius.family.code()
        )?;
    }

    Ok(())
}

/// Writes `radii_{label}_Fam_{code}.dat` with the radii of the listed fractures which
/// belong to `family`.
pub fn write_radii_of_family(
    radii_folder: &Path,
    label: &str,
    network: &FractureNetwork,
    fractures: &[PolyId],
    family: FamilyId,
) -> Result<(), DfngenError> {
    let code = family.code();
    let mut file = create(radii_folder.join(format!("radii_{}_Fam_{}.dat", label, code)))?;

    writeln!(file, "Fracture Radii List, {} Fractures Of Family {}", label, code)?;
    writeln!(file, "Format: xRadius yRadius")?;

    for poly in fractures
        .iter()
        .map(|id| &network.accepted_poly[id.index()])
        .filter(|poly| poly.family == family)
    {
        writeln!(file, "{:.8} {:.8}", poly.xradius, poly.yradius)?;
    }

    Ok(())
}

/// Writes `intersections/intersections_{n}.inp` for every final fracture.
///
/// Each fracture is rotated into the x-y plane together with its intersections and
/// their triple points. Intersections are discretized at `h / 2` spacing, through
/// the triple points ordered by distance from the first end point. The files hold
/// the points, the line segments joining them, and for every point the two
/// fractures it lies on.
pub fn write_intersection_files(
    output: &Path,
    network: &mut FractureNetwork,
    final_fractures: &[PolyId],
    h: f64,
    eps: f64,
) -> Result<(), DfngenError> {
    let folder = output.join("intersections");
    create_dir_all(&folder)?;
    info!("Writing intersection files");

    let numbers = final_numbering(network.len(), final_fractures);

    for (i, id) in final_fractures.iter().enumerate() {
        let fract1 = i + 1;
        let poly = &mut network.accepted_poly[id.index()];
        let r = poly.rotate_to_xy_plane(eps);

        let mut points: Vec<Point3<f64>> = Vec::new();
        let mut lines: Vec<(usize, usize)> = Vec::new();
        let mut owners: Vec<usize> = Vec::new();

        for int_id in poly.intersection_index.iter() {
            let intersection = &network.intersections[int_id.index()];
            let other = if intersection.fract1 == *id {
                intersection.fract2
            } else {
                intersection.fract1
            };
            let Some(fract2) = numbers[other.index()] else {
                continue;
            };

            // Path from p1 to p2 through the triple points, in the domain's coordinates
            let path: Vec<Point3<f64>> = std::iter::once(intersection.p1)
                .chain(
                    intersection
                        .triple_points_idx
                        .iter()
                        .map(|t| network.triple_points[t.index()])
                        .sorted_by(|a, b| {
                            distance(&intersection.p1, a).total_cmp(&distance(&intersection.p1, b))
                        }),
                )
                .chain(std::iter::once(intersection.p2))
                .collect();

            let first = points.len() + 1;

            for (start, end) in path.iter().tuple_windows() {
                let length = distance(start, end);
                let segment = discretize_line_of_intersection(
                    h,
                    &Point3::from(r * start.coords),
                    &Point3::from(r * end.coords),
                    length,
                );
                // Consecutive segments share their end point
                let skip = usize::from(points.len() + 1 > first);
                points.extend(segment.into_iter().skip(skip));
            }

            let last = points.len();
            lines.extend((first..last).map(|n| (n, n + 1)));
            owners.resize(last, fract2);
        }

        let mut file = create(folder.join(format!("intersections_{}.inp", fract1)))?;
        writeln!(file, "{} {} 2 0 0", points.len(), lines.len())?;

        for (n, p) in points.iter().enumerate() {
            writeln!(file, "{} {:.12} {:.12} {:.12}", n + 1, p.x, p.y, p.z)?;
        }

        for (k, (a, b)) in lines.iter().enumerate() {
            writeln!(file, "{} {} line {} {}", k + 1, fract1, a, b)?;
        }

        writeln!(file, "2 1 1")?;
        writeln!(file, "a_b, integer")?;
        writeln!(file, "b_a, integer")?;

        for (n, fract2) in owners.iter().enumerate() {
            writeln!(file, "{} {} {}", n + 1, fract1, fract2)?;
        }
    }

    Ok(())
}

/// Writes `polys/poly_{n}.inp`, the vertices of every final fracture as written,
/// joined by lines. Called after [`write_intersection_files`] the vertices lie on
/// the x-y plane.
pub fn write_polys_inp(
    output: &Path,
    network: &FractureNetwork,
    final_fractures: &[PolyId],
) -> Result<(), DfngenError> {
    let folder = output.join("polys");
    create_dir_all(&folder)?;
    info!("Writing poly inp files");

    for (j, id) in final_fractures.iter().enumerate() {
        let poly = &network.accepted_poly[id.index()];
        let n = poly.number_of_nodes();
        let mut file = create(folder.join(format!("poly_{}.inp", j + 1)))?;

        writeln!(file, "{} {} 0 0 0", n, n.saturating_sub(1))?;

        for (i, v) in poly.vertices.iter().enumerate() {
            writeln!(file, "{} {:.12} {:.12} {:.12}", i + 1, v.x, v.y, v.z)?;
        }

        for i in 1..n {
            writeln!(file, "{} {} line {} {}", i, j + 1, i, i + 1)?;
        }
    }

    Ok(())
}

fn write_user_families(
    file: &mut impl Write,
    user_fractures: &UserFractures,
) -> Result<(), DfngenError> {
    for family in user_fractures.families() {
        let label = match family {
            FamilyId::UserRectangle => "Rectangle",
            FamilyId::UserPolygon => "Polygon",
            _ => "Ellipse",
        };

        writeln!(file, "UserDefined {} Family", label)?;
        writeln!(file, "Global Family: {}", family.code())?;
        writeln!(file, "Number of Fractures: {}", user_fractures.count(family))?;
        writeln!(file)?;
    }

    Ok(())
}

/// Writes families.dat, a description of every fracture family.
pub fn write_frac_fams(output: &Path, generator: &DfnGenerator) -> Result<(), DfngenError> {
    let input = &generator.input;
    let mut file = create(output.join("families.dat"))?;
    info!("Writing family information");

    write_user_families(&mut file, &generator.user_fractures)?;

    let families = &generator.fam_opt.families;
    let probabilities = &generator.fam_opt.probabilities;

    for (i, family) in families.iter().enumerate() {
        writeln!(file, "{} Family: {}", family.shape, family.number)?;
        writeln!(file, "Global Family: {}", i + 1)?;

        if let Shape::Ellipse(n) = family.shape {
            writeln!(file, "Number of Vertices: {}", n)?;
        }

        writeln!(file, "Aspect Ratio: {}", family.aspect_ratio)?;

        if input.stopCondition == 1 {
            writeln!(file, "P32 (Fracture Intensity) Target: {}", family.p32_target)?;
            writeln!(file, "P32 (Fracture Intensity) Final: {}", family.current_p32)?;
        }

        match family.beta {
            None => writeln!(file, "Beta Distribution (Rotation Around Normal Vector): Uniform")?,
            Some(beta) => {
                writeln!(file, "Beta Distribution (Rotation Around Normal Vector): Constant")?;
                writeln!(file, "Beta: {} rad, {} deg", beta, beta.to_degrees())?;
            }
        }

        write!(file, "{}", family.orientation)?;

        if family.layer == 0 {
            writeln!(file, "Layer: Entire domain")?;
        } else {
            let idx = (family.layer - 1) * 2;
            writeln!(
                file,
                "Layer Number: {}, Layer: {{{}, {}}}",
                family.layer,
                input.layers[idx],
                input.layers[idx + 1]
            )?;
        }

        if family.region == 0 {
            writeln!(file, "Region: Entire domain")?;
        } else {
            let idx = (family.region - 1) * 6;
            writeln!(
                file,
                "Region Number: {}, Region: {{{}, {}, {}, {}, {}, {}}}",
                family.region,
                input.regions[idx],
                input.regions[idx + 1],
                input.regions[idx + 2],
                input.regions[idx + 3],
                input.regions[idx + 4],
                input.regions[idx + 5]
            )?;
        }

        write!(file, "{}", family.radius)?;

        if let Some(prob) = probabilities.get(i) {
            writeln!(file, "Family Insertion Probability: {}", prob)?;
        }

        writeln!(file)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs::read_to_string;

    use parry3d_f64::na::Vector3;

    use super::*;
    use crate::fracture::poly::Poly;
    use crate::structures::PolyOptions;

    fn square(normal: Vector3<f64>, center: Vector3<f64>, eps: f64) -> Poly {
        let mut poly = Poly::new_rect(0.5, 1.);
        poly.family = FamilyId::Stochastic(0);
        poly.rotation_3d(&normal.normalize(), eps);
        poly.translate(center);
        poly
    }

    fn network() -> FractureNetwork {
        let opts = PolyOptions::new(0.1, Vector3::new(10., 10., 10.));
        let mut network = FractureNetwork::new(1);

        for (normal, center) in [
            (Vector3::z(), Vector3::new(3., 3., 3.)),
            (Vector3::z(), Vector3::zeros()),
            (Vector3::x(), Vector3::zeros()),
        ] {
            let mut poly = square(normal, center, opts.eps);
            network.try_insert(&opts, &mut poly).unwrap();
        }

        network
    }

    #[test]
    fn writes_final_fractures_renumbered() {
        let network = network();
        let final_fractures = [PolyId(1), PolyId(2)];
        let output = std::env::temp_dir().join(format!("dfn_fram_output_{}", std::process::id()));
        create_dir_all(&output).unwrap();

        write_polys(&output, &network, &final_fractures).unwrap();
        write_intersection_list(&output, &network, &final_fractures).unwrap();
        write_fracture_translations(&output, &network, &final_fractures).unwrap();
        write_rejection_stats(&output, &network.stats).unwrap();

        let polys = read_to_string(output.join("polygons.dat")).unwrap();
        let mut lines = polys.lines();
        assert_eq!(lines.next(), Some("nPolygons: 2"));
        assert!(lines.all(|l| l.starts_with("4 {")));

        let intersections = read_to_string(output.join("intersection_list.dat")).unwrap();
        let rows: Vec<&str> = intersections.lines().skip(1).collect();
        assert_eq!(rows.len(), 1);
        let fields: Vec<&str> = rows[0].split_whitespace().collect();
        assert_eq!(&fields[..2], &["1", "2"]);
        let length: f64 = fields[5].parse().unwrap();
        assert!((length - 1.).abs() < 1e-9);

        let translations = read_to_string(output.join("translations.dat")).unwrap();
        let rows: Vec<&str> = translations.lines().skip(2).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].ends_with(" R"));
        assert!(!rows[1].ends_with(" R"));

        let rejections = read_to_string(output.join("rejections.dat")).unwrap();
        assert!(rejections.contains("Same Plane: 0"));

        std::fs::remove_dir_all(&output).unwrap();
    }

    #[test]
    fn mesh_files_rotate_final_fractures() {
        let mut network = network();
        let final_fractures = [PolyId(1), PolyId(2)];
        let output = std::env::temp_dir().join(format!("dfn_fram_mesh_{}", std::process::id()));
        create_dir_all(&output).unwrap();

        write_intersection_files(&output, &mut network, &final_fractures, 0.3, 1e-9).unwrap();
        write_polys_inp(&output, &network, &final_fractures).unwrap();

        assert!(!network.accepted_poly[0].xy_plane);
        for id in final_fractures {
            let poly = &network.accepted_poly[id.index()];
            assert!(poly.xy_plane);
            let z = poly.vertices[0].z;
            assert!(poly.vertices.iter().all(|v| (v.z - z).abs() < 1e-9));
        }

        // Unit long intersection at h = 0.3: 8 points joined by 7 lines
        let inp = read_to_string(output.join("intersections/intersections_2.inp")).unwrap();
        let mut lines = inp.lines();
        assert_eq!(lines.next(), Some("8 7 2 0 0"));
        assert!(inp.contains("\n1 2 line 1 2\n"));
        assert!(inp.contains("2 1 1\na_b, integer\nb_a, integer\n"));
        assert!(inp.ends_with("8 2 1\n"));

        // Every point lies on the rotated fracture's plane
        let z = network.accepted_poly[2].vertices[0].z;
        for line in inp.lines().skip(1).take(8) {
            let fields: Vec<f64> = line.split_whitespace().map(|f| f.parse().unwrap()).collect();
            assert!((fields[3] - z).abs() < 1e-9);
        }

        let poly = read_to_string(output.join("polys/poly_1.inp")).unwrap();
        let rows: Vec<&str> = poly.lines().collect();
        assert_eq!(rows[0], "4 3 0 0 0");
        assert_eq!(rows.len(), 1 + 4 + 3);
        assert_eq!(rows[7], "3 1 line 3 4");

        // Fractures already on the x-y plane are not rotated twice
        let before = network.accepted_poly[2].vertices.clone();
        write_intersection_files(&output, &mut network, &final_fractures, 0.3, 1e-9).unwrap();
        assert_eq!(network.accepted_poly[2].vertices, before);

        std::fs::remove_dir_all(&output).unwrap();
    }

    #[test]
    fn numbering_skips_removed_fractures() {
        assert_eq!(
            final_numbering(4, &[PolyId(1), PolyId(3)]),
            vec![None, Some(1), None, Some(2)]
        );
    }
}
