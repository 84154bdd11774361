use parry3d_f64::na::Point3;
use tracing::warn;

/// Used for ORing arrays of bool for boundary face codes.
/// ORs dest with src, then saves to dest.
///
/// # Arguments
///
/// * `dest` - Destination array
/// * `src` - Source array
pub fn or(dest: &mut [bool; 6], src: &[bool; 6]) {
    for (d, s) in dest.iter_mut().zip(src.iter()) {
        *d |= *s
    }
}

/// Standard deviation without the square root and division by N elements.
/// Return: The sum-deviation of array 'vec'
pub fn sum_deviation(vec: &[f64]) -> f64 {
    let mean = vec.iter().sum::<f64>() / (vec.len() as f64);
    vec.iter().map(|v| v - mean).map(|v| v * v).sum()
}

/// Sum deviaiton array X 3
///
/// The sum deviation is computed on the x, y and z coordinates
/// of the four points separately.
///
/// # Arguments
///
/// * `pts` - Four points, the endpoints of two segments
///
/// # Returns
///
/// Array of 3 elements x,y,z with each sum deviation, respectively
pub fn sum_dev_ary3(pts: &[Point3<f64>; 4]) -> [f64; 3] {
    let axis = |i: usize| sum_deviation(&pts.map(|p| p[i]));
    [axis(0), axis(1), axis(2)]
}

/// Get Max Element's Index
///
/// # Arguments
///
/// * `vec` - Array of f64
///
/// # Returns
///
/// Max element's array index. If elements happen to be equal, returns the first one
pub fn max_elmt_idx(vec: &[f64]) -> usize {
    vec.iter()
        .enumerate()
        .fold(None, |max: Option<(usize, f64)>, (i, &v)| match max {
            Some((_, m)) if v <= m => max,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Index from Probability
///
/// Chooses an index based on a random roll (random number between 0 and 1)
/// and a CDF aligned with the candidates.
///
/// # Arguments
///
/// * `cdf` - CDF of the candidates
/// * `roll` - Random number between 0 and 1
///
/// # Returns
///
/// Index of the first CDF element not smaller than `roll`
pub fn index_from_prob(cdf: &[f64], roll: f64) -> usize {
    cdf.iter()
        .position(|v| roll <= *v)
        .unwrap_or(cdf.len().saturating_sub(1))
}

/// Cumulative sum of the elements along a given axis
pub fn cumsum(fam_prob: &[f64]) -> Vec<f64> {
    let cdf: Vec<f64> = fam_prob
        .iter()
        .scan(0., |acc, &x| {
            *acc += x;
            Some(*acc)
        })
        .collect();

    if let Some(last) = cdf.last() {
        if !(0.999..=1.001).contains(last) {
            warn!("Familiy probabilities (famProb in input file) do not sum to 1");
            warn!("sum = {:.17}", last);
            warn!("Please check input file.");
        }
    };

    cdf
}
