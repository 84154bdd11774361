use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use parry3d_f64::na::{Point2, Vector3};
use tracing::info;

use crate::distribution::generating_points::{angles_to_normal, OrientationOption};
use crate::distribution::{Bingham, Fisher, Orientation};
use crate::error::DfngenError;
use crate::fracture::fracture_family::{
    FractureFamily, FractureFamilyBuilder, FractureFamilyOption,
};
use crate::io::read_input_functions::{read_domain_vertices, InputReader, ReadFromText};
use crate::structures::{PolyOptions, RadiusDistribution};

#[derive(Default, Debug, Clone)]
pub struct ExternalFractureFiles {
    /// File name of user ellipses
    pub user_ell_file: Option<PathBuf>,

    /// File name of user rectangles
    pub user_rect_file: Option<PathBuf>,

    /// File name of user polygons defined by coordinates
    pub user_poly_by_coord_file: Option<PathBuf>,

    /// File name of user ellipses defined by coordinates
    pub user_ell_by_coord_file: Option<PathBuf>,

    /// File name of user rectangles defined by coordinates
    pub user_rect_by_coord_file: Option<PathBuf>,
}

#[allow(non_snake_case)]
#[derive(Default, Debug, Clone)]
pub struct Input {
    /// DFN generation stop condition. 0 - nPoly option, 1 - P32 option.
    pub stopCondition: u8,

    /// Number of polygons to place in the DFN when uisng nPoly stopCondition option.
    pub nPoly: usize,

    /// Domain size with dimension x*y*z for DFN, centered at the origin.
    pub domainSize: Vector3<f64>,

    /// Minimum feature size, FRAM parameter.
    pub h: f64,

    /// epsilon, h * 1e-8
    pub eps: f64,

    /// Percent to increase the size of the pre-generated radii lists, per family.
    /// Example: 0.2 will increase the size of the list by %20.
    pub radiiListIncrease: f64,

    /// This option disables the FRAM algorithm. There will be no
    /// fracture rejections.
    pub disableFram: bool,

    /// This option uses a relaxed version of the FRAM algorithm. The mesh may not
    /// be perfectly conforming
    pub rFram: bool,

    /// Accept or reject triple intersections
    ///     False - Off (Reject)
    ///     True  - On  (Accept)
    pub tripleIntersections: bool,

    /// DFN will only keep clusters with connections to
    /// domain boundaries which are set to 1:
    ///
    /// boundaryFaces[0] = +X domain boundary
    /// boundaryFaces[1] = -X domain boundary
    /// boundaryFaces[2] = +Y domain boundary
    /// boundaryFaces[3] = -Y domain boundary
    /// boundaryFaces[4] = +Z domain boundary
    /// boundaryFaces[5] = -Z domain boundary
    pub boundaryFaces: [bool; 6],

    /// 0 - Keep any clusters which connects the specified
    ///     boundary faces in boundaryFaces option below
    /// 1 - Keep only the largest cluster which connects
    ///     the specified boundary faces in boundaryFaces option below.
    pub keepOnlyLargestCluster: bool,

    /// 0 - remove isolated fractures and clusters
    /// 1 - Keep isolated fractures and clusters
    pub keepIsolatedFractures: bool,

    /// Useful for debugging,
    /// This option will log all fracture rejection reasons as they occur.
    pub printRejectReasons: bool,

    /// Outputs radii files after isolated fracture removal.
    /// One file per family.
    pub outputFinalRadiiPerFamily: bool,

    /// Outputs radii files before isolated fracture removal.
    /// One file per family.
    pub outputAcceptedRadiiPerFamily: bool,

    /// False - User ellipses will be inserted first
    /// True  - User rectangles will be inserted first
    pub insertUserRectanglesFirst: bool,

    /// Inserts the largest possible fracture for each defined fracture family,
    /// defined by the user-defined maxium radius
    pub forceLargeFractures: bool,

    /// Seed for random generator. 0 seeds from the system clock.
    pub seed: u64,

    /// Size increase for inserting fracture centers outside the domain.
    /// Fracture will be truncated based on domainSize above.
    /// Increases the entire width by this ammount. So, {1,1,1} will increase
    /// the domain by adding .5 to the +x, and subbtracting .5 to the -x, etc
    pub domainSizeIncrease: Vector3<f64>,

    /// Selection of orientation angles for stochastic families:
    ///     0 - theta/phi, 1 - trend/plunge, 2 - dip/strike
    pub orientationOption: u8,

    /// Number of stochastic ellipse families
    pub nFamEll: usize,

    /// Number of stochastic rectangle families
    pub nFamRect: usize,

    /// Fractures with a radius smaller than this are removed AFTER DFN generation.
    /// 0 disables the option.
    pub removeFracturesLessThan: f64,

    /// Caution: Can create very large files.
    /// Outputs all fractures which were generated during
    /// DFN generation (Accepted + Rejected) to radii_All.dat
    pub outputAllRadii: bool,

    /// If a fracture is rejected, it will be re-translated
    /// to a new position this number of times.
    pub rejectsPerFracture: usize,

    /// Array of layers:
    /// e.g. {-z1, +z1, -z2, +z2, ... , -zn, +zn}
    pub layers: Vec<f64>,

    /// Array of regions:
    /// e.g. {-x1, +x1, -y1, +y1, -z1, +z1, ...}
    pub regions: Vec<f64>,

    /// False - Use boundaryFaces option.
    /// True  - Ignore boundaryFaces option, keep all clusters
    ///         and remove fractures with no intersections
    pub ignoreBoundaryFaces: bool,

    /// True - Fracture centers must lie inside the x-y polygon `domainVertices`.
    pub polygonBoundaryFlag: bool,

    /// Vertices of the polygon boundary, in order.
    pub domainVertices: Vec<Point2<f64>>,

    pub ext_fracture_files: ExternalFractureFiles,
}

impl Input {
    /// Options used by polygon building, truncation and FRAM.
    pub fn poly_options(&self) -> PolyOptions {
        PolyOptions {
            h: self.h,
            eps: self.eps,
            domain_size: self.domainSize,
            domain_size_increase: self.domainSizeIncrease,
            layers: self.layers.clone(),
            regions: self.regions.clone(),
            r_fram: self.rFram,
            disable_fram: self.disableFram,
            triple_intersections: self.tripleIntersections,
            polygon_boundary: self
                .polygonBoundaryFlag
                .then(|| self.domainVertices.clone()),
        }
    }
}

/// Path of a by-coordinates user fracture file, `None` unless `flag` is set.
/// A missing flag counts as off.
fn read_by_coord_path<R: Read + Seek>(
    input_reader: &mut InputReader<R>,
    flag: &str,
    path_var: &str,
) -> Result<Option<PathBuf>, DfngenError> {
    if !input_reader.read_optional::<bool>(flag)?.unwrap_or(false) {
        return Ok(None);
    }

    let mut path = String::new();
    input_reader.read_value(path_var, &mut path)?;
    info!("User defined fractures by coordinates file: {}", path);

    Ok(Some(PathBuf::from(path)))
}

/// Reads in all input variables.
/// Creates the fracture families from user input if
/// using stochastic fracture families.
///
/// # Arguments
///
/// * `input_file` - Path to input file
pub fn read_input<P: AsRef<Path>>(
    input_file: P,
) -> Result<(Input, FractureFamilyOption), DfngenError> {
    info!("DFN Generator Input File: {}", input_file.as_ref().display());
    let mut input_reader = InputReader::open(input_file)?;
    read_input_from(&mut input_reader)
}

/// Same as [`read_input`], from any seekable source.
pub fn read_input_from<R: Read + Seek>(
    input_reader: &mut InputReader<R>,
) -> Result<(Input, FractureFamilyOption), DfngenError> {
    let mut input_var = Input::default();

    macro_rules! input_var {
        ($var_name:ident) => {
            input_reader.read_value(
                &format!("{}:", stringify!($var_name)),
                &mut input_var.$var_name,
            )?;
        };
    }

    input_var!(stopCondition);

    if input_var.stopCondition > 1 {
        return Err(DfngenError::InvalidOption {
            name: "stopCondition".to_string(),
            value: input_var.stopCondition.to_string(),
        });
    }

    input_var!(printRejectReasons);
    input_var!(domainSize);

    let mut n_layers: usize = 0;
    input_reader.read_value("numOfLayers:", &mut n_layers)?;
    if n_layers > 0 {
        input_var!(layers);
        check_len("layers", &input_var.layers, n_layers * 2)?;

        info!("Number of Layers: {}", n_layers);
        for (i, layer) in input_var.layers.chunks_exact(2).enumerate() {
            let vol = input_var.domainSize.x * input_var.domainSize.y * (layer[1] - layer[0]).abs();
            info!("    Layer {}{{-z,+z}}: {:?}, Volume: {} m^3", i + 1, layer, vol);
        }
    }

    let mut n_regions: usize = 0;
    input_reader.read_value("numOfRegions:", &mut n_regions)?;
    if n_regions > 0 {
        input_var!(regions);
        check_len("regions", &input_var.regions, n_regions * 6)?;

        info!("Number of Regions: {}", n_regions);
        for (i, region) in input_var.regions.chunks_exact(6).enumerate() {
            let vol = (region[1] - region[0]).abs()
                * (region[3] - region[2]).abs()
                * (region[5] - region[4]).abs();
            info!(
                "    Region {}: {{-x,+x,-y,+y,-z,+z}}: {:?}, Volume: {} m^3",
                i + 1,
                region,
                vol
            );
        }
    }

    input_var!(h);
    input_var.eps = input_var.h * 1e-8;

    input_var!(disableFram);
    input_var!(rFram);
    input_var!(tripleIntersections);
    input_var!(forceLargeFractures);
    input_var!(outputAllRadii);
    input_var!(outputFinalRadiiPerFamily);
    input_var!(outputAcceptedRadiiPerFamily);
    input_var!(seed);
    input_var!(domainSizeIncrease);
    input_var!(keepOnlyLargestCluster);
    input_var!(keepIsolatedFractures);
    input_var!(ignoreBoundaryFaces);
    input_var!(boundaryFaces);
    input_var!(rejectsPerFracture);
    input_var!(nFamEll);
    input_var!(nFamRect);
    input_var!(removeFracturesLessThan);
    input_var!(orientationOption);

    let orientation_option = OrientationOption::try_from(input_var.orientationOption)
        .map_err(|value| DfngenError::InvalidOption {
            name: "orientationOption".to_string(),
            value: value.to_string(),
        })?;

    match orientation_option {
        OrientationOption::ThetaPhi => info!("Expecting Theta and phi for orientations"),
        OrientationOption::TrendPlunge => info!("Expecting Trend and Plunge for orientations"),
        OrientationOption::DipStrike => info!("Expecting Dip and Strike (RHR) for orientations"),
    }

    input_var.polygonBoundaryFlag = input_reader
        .read_optional("polygonBoundaryFlag:")?
        .unwrap_or(false);

    if input_var.polygonBoundaryFlag {
        info!("Expecting Polygon Boundary for domain edges");
        let mut path = String::new();
        input_reader.read_value("polygonBoundaryFile:", &mut path)?;
        info!("Polygon Boundary File: {}", path);

        input_var.domainVertices = read_domain_vertices(&mut InputReader::open(&path)?)?;
        info!(
            "There are {} Vertices on the boundary",
            input_var.domainVertices.len()
        );

        if input_var.domainVertices.len() < 3 {
            return Err(DfngenError::InvalidOption {
                name: "polygonBoundaryFile".to_string(),
                value: format!("{} vertices", input_var.domainVertices.len()),
            });
        }

        for (i, v) in input_var.domainVertices.iter().enumerate() {
            info!("Vertex {}: {{{}, {}}}", i + 1, v.x, v.y);
        }
    }

    let opts = input_var.poly_options();

    let mut families = FamilyReader {
        input_reader: &mut *input_reader,
        prefix: "e",
        n_fam: input_var.nFamEll,
        stop_condition: input_var.stopCondition,
        orientation_option,
    }
    .read(&opts)?;

    families.extend(
        FamilyReader {
            input_reader: &mut *input_reader,
            prefix: "r",
            n_fam: input_var.nFamRect,
            stop_condition: input_var.stopCondition,
            orientation_option,
        }
        .read(&opts)?,
    );

    let probabilities = if !families.is_empty() {
        input_var!(radiiListIncrease);

        if input_var.stopCondition == 0 {
            // npoly option
            input_var!(nPoly);
        }

        let mut fam_prob: Vec<f64> = Vec::with_capacity(families.len());
        input_reader.read_value("famProb:", &mut fam_prob)?;
        check_len("famProb", &fam_prob, families.len())?;
        fam_prob
    } else {
        Vec::new()
    };

    //
    // Get external fracture definition files
    //

    let mut user_ell = false;
    input_reader.read_value("userEllipsesOnOff:", &mut user_ell)?;
    if user_ell {
        let mut path = String::new();
        input_reader.read_value("UserEll_Input_File_Path:", &mut path)?;
        input_var.ext_fracture_files.user_ell_file = Some(PathBuf::from(path));
    }

    let mut user_rect = false;
    input_reader.read_value("userRectanglesOnOff:", &mut user_rect)?;
    if user_rect {
        let mut path = String::new();
        input_reader.read_value("UserRect_Input_File_Path:", &mut path)?;
        input_var.ext_fracture_files.user_rect_file = Some(PathBuf::from(path));
    }

    let files = &mut input_var.ext_fracture_files;
    files.user_poly_by_coord_file = read_by_coord_path(
        input_reader,
        "userPolygonByCoord:",
        "PolygonByCoord_Input_File_Path:",
    )?;
    files.user_ell_by_coord_file =
        read_by_coord_path(input_reader, "userEllByCoord:", "EllByCoord_Input_File_Path:")?;
    files.user_rect_by_coord_file =
        read_by_coord_path(input_reader, "userRecByCoord:", "RectByCoord_Input_File_Path:")?;

    let user_ell = user_ell || files.user_ell_by_coord_file.is_some();
    let user_rect = user_rect || files.user_rect_by_coord_file.is_some();

    if user_rect && user_ell {
        input_var!(insertUserRectanglesFirst);
    } else {
        input_var.insertUserRectanglesFirst = false;
    }

    Ok((
        input_var,
        FractureFamilyOption {
            families,
            probabilities,
        },
    ))
}

fn check_len<T>(name: &str, values: &[T], expected: usize) -> Result<(), DfngenError> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(DfngenError::ArrayLength {
            name: name.to_string(),
            expected,
            found: values.len(),
        })
    }
}

/// `idx`-th value of an array indexed by a per-distribution counter.
fn nth(name: &str, values: &[f64], idx: usize) -> Result<f64, DfngenError> {
    values
        .get(idx)
        .copied()
        .ok_or_else(|| DfngenError::ArrayLength {
            name: name.to_string(),
            expected: idx + 1,
            found: values.len(),
        })
}

/// Reads the stochastic families of one shape, every key starting with `prefix`.
struct FamilyReader<'a, R> {
    input_reader: &'a mut InputReader<R>,
    prefix: &'static str,
    n_fam: usize,
    stop_condition: u8,
    orientation_option: OrientationOption,
}

impl<R: Read + Seek> FamilyReader<'_, R> {
    fn key(&self, name: &str) -> String {
        format!("{}{}:", self.prefix, name)
    }

    /// Array with one value per family.
    fn per_family<T>(&mut self, name: &str) -> Result<Vec<T>, DfngenError>
    where
        Vec<T>: ReadFromText,
    {
        let key = self.key(name);
        let mut values: Vec<T> = Vec::new();
        self.input_reader.read_value(&key, &mut values)?;
        check_len(&format!("{}{}", self.prefix, name), &values, self.n_fam)?;
        Ok(values)
    }

    /// Array indexed by a distribution counter, only read when some family uses it.
    fn indexed(&mut self, name: &str, used: bool) -> Result<Vec<f64>, DfngenError> {
        let key = self.key(name);
        let mut values: Vec<f64> = Vec::new();
        if used {
            self.input_reader.read_value(&key, &mut values)?;
        }
        Ok(values)
    }

    fn read(mut self, opts: &PolyOptions) -> Result<Vec<FractureFamily>, DfngenError> {
        if self.n_fam == 0 {
            return Ok(Vec::new());
        }

        let p = self.prefix;
        let is_ell = p == "e";

        let beta_distribution: Vec<bool> = self.per_family("betaDistribution")?;
        let layer: Vec<usize> = self.per_family("Layer")?;
        let region: Vec<usize> = self.per_family("Region")?;
        let distr: Vec<u8> = self.per_family("distr")?;
        let aspect: Vec<f64> = self.per_family("aspect")?;
        let num_points: Vec<u8> = if is_ell {
            self.per_family("numPoints")?
        } else {
            Vec::new()
        };

        let key = self.key("AngleOption");
        let mut angle_option: u8 = 0;
        self.input_reader.read_value(&key, &mut angle_option)?;
        let angle_conversion_factor = match angle_option {
            0 => 1.,
            1 => std::f64::consts::PI / 180.,
            other => {
                return Err(DfngenError::InvalidOption {
                    name: format!("{}AngleOption", p),
                    value: other.to_string(),
                })
            }
        };

        let (angle_one_name, angle_two_name) = self.orientation_option.angle_names();
        let angle_one: Vec<f64> = self.per_family(angle_one_name)?;
        let angle_two: Vec<f64> = self.per_family(angle_two_name)?;

        let beta = self.indexed("beta", beta_distribution.iter().any(|&b| b))?;
        let kappa: Vec<f64> = self.per_family("kappa")?;

        let key = self.key("OrientationDistr");
        let orientation_distr: Vec<u8> = self
            .input_reader
            .read_optional(&key)?
            .unwrap_or_else(|| vec![0; self.n_fam]);
        check_len(&format!("{}OrientationDistr", p), &orientation_distr, self.n_fam)?;
        let kappa2 = self.indexed("kappa2", orientation_distr.contains(&1))?;

        let uses = |d: u8| distr.contains(&d);
        let log_mean = self.indexed("LogMean", uses(1))?;
        let sd = self.indexed("sd", uses(1))?;
        let log_min = self.indexed("LogMin", uses(1))?;
        let log_max = self.indexed("LogMax", uses(1))?;
        let alpha = self.indexed("alpha", uses(2))?;
        let min = self.indexed("min", uses(2))?;
        let max = self.indexed("max", uses(2))?;
        let exp_mean = self.indexed("ExpMean", uses(3))?;
        let exp_min = self.indexed("ExpMin", uses(3))?;
        let exp_max = self.indexed("ExpMax", uses(3))?;
        let constant = self.indexed("const", uses(4))?;

        let p32_targets: Vec<f64> = if self.stop_condition == 1 {
            self.per_family("_p32Targets")?
        } else {
            vec![0.; self.n_fam]
        };

        // Distribution counters
        let mut log_normal_count = 0;
        let mut power_law_count = 0;
        let mut exp_count = 0;
        let mut const_count = 0;
        let mut beta_count = 0;

        let mut families = Vec::with_capacity(self.n_fam);

        for i in 0..self.n_fam {
            let name = |key: &str| format!("{}{}", p, key);

            // dist options:1 = lognormal, 2= truncated power-law, 3= exponential, 4=constant
            let radius = match distr[i] {
                1 => {
                    let j = log_normal_count;
                    log_normal_count += 1;
                    RadiusDistribution::new_log_normal(
                        nth(&name("LogMean"), &log_mean, j)?,
                        nth(&name("sd"), &sd, j)?,
                        nth(&name("LogMin"), &log_min, j)?,
                        nth(&name("LogMax"), &log_max, j)?,
                    )
                }
                2 => {
                    let j = power_law_count;
                    power_law_count += 1;
                    RadiusDistribution::new_truncated_power_law(
                        nth(&name("alpha"), &alpha, j)?,
                        nth(&name("min"), &min, j)?,
                        nth(&name("max"), &max, j)?,
                    )
                }
                3 => {
                    let j = exp_count;
                    exp_count += 1;
                    RadiusDistribution::new_exponential(
                        1. / nth(&name("ExpMean"), &exp_mean, j)?,
                        nth(&name("ExpMin"), &exp_min, j)?,
                        nth(&name("ExpMax"), &exp_max, j)?,
                    )
                }
                4 => {
                    let j = const_count;
                    const_count += 1;
                    RadiusDistribution::new_constant(nth(&name("const"), &constant, j)?)
                }
                other => {
                    return Err(DfngenError::InvalidOption {
                        name: name("distr"),
                        value: other.to_string(),
                    })
                }
            };

            let normal = angles_to_normal(
                self.orientation_option,
                angle_one[i] * angle_conversion_factor,
                angle_two[i] * angle_conversion_factor,
            );

            let orientation = match orientation_distr[i] {
                0 => Orientation::Fisher(Fisher::new(normal, kappa[i], opts.eps)),
                1 => Orientation::Bingham(Bingham::new(
                    normal,
                    kappa[i],
                    nth(&name("kappa2"), &kappa2, i)?,
                    opts.eps,
                )),
                other => {
                    return Err(DfngenError::InvalidOption {
                        name: name("OrientationDistr"),
                        value: other.to_string(),
                    })
                }
            };

            let mut builder = FractureFamilyBuilder::new();
            builder
                .number(i + 1)
                .radius(radius)
                .aspect_ratio(aspect[i])
                .orientation(orientation)
                .p32_target(p32_targets[i])
                .layer(layer[i])
                .region(region[i]);

            if is_ell {
                builder.number_of_nodes(num_points[i]);
            }

            // Constant user defined beta
            if beta_distribution[i] {
                builder.beta(nth(&name("beta"), &beta, beta_count)? * angle_conversion_factor);
                beta_count += 1;
            }

            let family = builder.build(opts)?;
            info!("{}:", family);
            info!("{}", family.radius);
            families.push(family);
        }

        Ok(families)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::structures::{RadiusFunction, Shape};

    const INPUT: &str = "stopCondition: 0
printRejectReasons: 0
domainSize: {10,10,10}
numOfLayers: 1
layers: {-2,2}
numOfRegions: 0
h: 0.1
disableFram: 0
rFram: 0
tripleIntersections: 1
forceLargeFractures: 1
outputAllRadii: 0
outputFinalRadiiPerFamily: 1
outputAcceptedRadiiPerFamily: 0
seed: 42
domainSizeIncrease: {1,1,1}
keepOnlyLargestCluster: 0
keepIsolatedFractures: 0
ignoreBoundaryFaces: 1
boundaryFaces: {1,1,0,0,0,0}
rejectsPerFracture: 10
nFamEll: 1
nFamRect: 1
removeFracturesLessThan: 0
orientationOption: 1
radiiListIncrease: 0.1
nPoly: 50
famProb: {0.4, 0.6}
userEllipsesOnOff: 0
userRectanglesOnOff: 0

ebetaDistribution: {1}
eLayer: {1}
eRegion: {0}
edistr: {2}
easpect: {0.5}
enumPoints: {8}
eAngleOption: 1
etrend: {0}
eplunge: {90}
ebeta: {45}
ekappa: {20}
ealpha: {2.6}
emin: {1}
emax: {5}

rbetaDistribution: {0}
rLayer: {0}
rRegion: {0}
rdistr: {3}
raspect: {1}
rAngleOption: 0
rtrend: {0}
rplunge: {0}
rbeta: {}
rkappa: {10}
rOrientationDistr: {1}
rkappa2: {5}
rExpMean: {2}
rExpMin: {1}
rExpMax: {4}
";

    fn read(text: &str) -> Result<(Input, FractureFamilyOption), DfngenError> {
        let mut reader = InputReader::new(Cursor::new(text.as_bytes().to_vec()));
        read_input_from(&mut reader)
    }

    #[test]
    fn read_global_options() {
        let (input, fam_opt) = read(INPUT).unwrap();

        assert_eq!(input.nPoly, 50);
        assert_eq!(input.seed, 42);
        assert_eq!(input.eps, 0.1 * 1e-8);
        assert_eq!(input.layers, vec![-2., 2.]);
        assert_eq!(input.boundaryFaces, [true, true, false, false, false, false]);
        assert_eq!(input.domainSizeIncrease, Vector3::new(1., 1., 1.));
        assert!(input.ignoreBoundaryFaces);
        assert!(input.ext_fracture_files.user_ell_file.is_none());
        assert_eq!(fam_opt.probabilities, vec![0.4, 0.6]);

        let opts = input.poly_options();
        assert_abs_diff_eq!(opts.family_volume(1, 0), 400., epsilon = 1e-12);
    }

    #[test]
    fn read_families() {
        let (_, fam_opt) = read(INPUT).unwrap();
        assert_eq!(fam_opt.families.len(), 2);

        let ell = &fam_opt.families[0];
        assert_eq!(ell.shape, Shape::Ellipse(8));
        assert_eq!(ell.theta_list.len(), 8);
        assert_eq!(ell.layer, 1);
        assert_abs_diff_eq!(ell.beta.unwrap(), std::f64::consts::FRAC_PI_4, epsilon = 1e-12);
        assert_abs_diff_eq!(ell.orientation.mean_direction(), Vector3::z(), epsilon = 1e-12);
        assert_eq!(
            ell.radius.function,
            RadiusFunction::TruncatedPowerLaw { alpha: 2.6 }
        );

        let rect = &fam_opt.families[1];
        assert_eq!(rect.shape, Shape::Rectangle);
        assert_eq!(rect.beta, None);
        assert!(matches!(rect.orientation, Orientation::Bingham(_)));
        assert_eq!(rect.radius.function, RadiusFunction::Exponential { lambda: 0.5 });
        assert_eq!((rect.radius.min, rect.radius.max), (1., 4.));
    }

    #[test]
    fn read_polygon_boundary_and_coordinate_files() {
        let dir = std::env::temp_dir().join(format!("dfn_fram_input_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let boundary = dir.join("boundary.dat");
        std::fs::write(&boundary, "4\n-4 -4\n4 -4\n4 4\n-4 4\n").unwrap();

        let text = format!(
            "{}polygonBoundaryFlag: 1\npolygonBoundaryFile: {}\n\
             userRecByCoord: 1\nRectByCoord_Input_File_Path: rects.dat\n\
             userEllByCoord: 0\nuserPolygonByCoord: 1\n\
             PolygonByCoord_Input_File_Path: polygons.dat\n",
            INPUT,
            boundary.display()
        );
        let (input, _) = read(&text).unwrap();

        assert!(input.polygonBoundaryFlag);
        assert_eq!(input.domainVertices.len(), 4);
        assert_eq!(input.domainVertices[2], Point2::new(4., 4.));
        assert_eq!(
            input.poly_options().polygon_boundary.as_deref(),
            Some(&input.domainVertices[..])
        );

        let files = &input.ext_fracture_files;
        assert_eq!(files.user_rect_by_coord_file, Some(PathBuf::from("rects.dat")));
        assert_eq!(files.user_poly_by_coord_file, Some(PathBuf::from("polygons.dat")));
        assert!(files.user_ell_by_coord_file.is_none());
        // Only rectangles are given, no ordering to read
        assert!(!input.insertUserRectanglesFirst);

        // Without the flags the options are off
        let (input, _) = read(INPUT).unwrap();
        assert!(!input.polygonBoundaryFlag);
        assert!(input.poly_options().polygon_boundary.is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn invalid_configurations() {
        let err = read(&INPUT.replace("stopCondition: 0", "stopCondition: 3")).unwrap_err();
        assert!(matches!(err, DfngenError::InvalidOption { .. }));

        let err = read(&INPUT.replace("eRegion: {0}", "eRegion: {1}")).unwrap_err();
        assert!(matches!(err, DfngenError::LayerAndRegion { .. }));

        let err = read(&INPUT.replace("eLayer: {1}", "eLayer: {2}")).unwrap_err();
        assert!(matches!(err, DfngenError::UndefinedLayerOrRegion { .. }));

        let err = read(&INPUT.replace("famProb: {0.4, 0.6}", "famProb: {1}")).unwrap_err();
        assert!(matches!(err, DfngenError::ArrayLength { expected: 2, found: 1, .. }));

        let err = read(&INPUT.replace("h: 0.1", "")).unwrap_err();
        assert!(matches!(err, DfngenError::MissingVariable(name) if name == "h"));
    }
}
