use parry3d_f64::na::{Point2, Vector3};

/// Checks if a point is within a 2D polygon using ray casting.
///
/// A ray leaves `(x, y)` along +x and the polygon edges it crosses are counted.
/// An odd count means the point is inside, zero or an even count means outside.
///
/// Ray casting adapted from W. Randolph Franklin's pnpoly:
/// <https://wrf.ecse.rpi.edu/Research/Short_Notes/pnpoly.html>
///
/// # Arguments
///
/// * `vertices` - Polygon vertices, in order
/// * `x` - X coordinate of the point
/// * `y` - Y coordinate of the point
pub fn in_polygon_boundary(vertices: &[Point2<f64>], x: f64, y: f64) -> bool {
    let mut inside = false;
    let mut j = match vertices.len() {
        0 => return false,
        n => n - 1,
    };

    for (i, vi) in vertices.iter().enumerate() {
        let vj = &vertices[j];

        if (vi.y > y) != (vj.y > y) && x < (vj.x - vi.x) * (y - vi.y) / (vj.y - vi.y) + vi.x {
            inside = !inside;
        }

        j = i;
    }

    inside
}

/// Corners of the x-y bounding rectangle of a polygon boundary.
pub fn boundary_extent(vertices: &[Point2<f64>]) -> Option<(Point2<f64>, Point2<f64>)> {
    let first = vertices.first()?;

    Some(vertices.iter().fold((*first, *first), |(min, max), v| {
        (min.inf(v), max.sup(v))
    }))
}

/// Narrows the x and y range of a translation box to the boundary's extent.
/// A box which does not overlap the boundary is left as it is.
pub fn clip_to_boundary(
    vertices: &[Point2<f64>],
    min: &mut Vector3<f64>,
    max: &mut Vector3<f64>,
) {
    let Some((bmin, bmax)) = boundary_extent(vertices) else {
        return;
    };

    let lo = Vector3::new(min.x.max(bmin.x), min.y.max(bmin.y), min.z);
    let hi = Vector3::new(max.x.min(bmax.x), max.y.min(bmax.y), max.z);

    if lo.x <= hi.x && lo.y <= hi.y {
        *min = lo;
        *max = hi;
    }
}
