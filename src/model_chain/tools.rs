use ordered_float::OrderedFloat;

/// Piecewise-linear interpolation of `x` over the points `(xp, fp)`.
///
/// `xp` must be increasing. Outside `[xp[0], xp[last]]` the result is 0, and a `NaN` input
/// stays `NaN`.
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    let (Some(&first), Some(&last)) = (xp.first(), xp.last()) else {
        return 0.0;
    };
    if x < first || x > last {
        return 0.0;
    }
    // First index with xp[i] >= x; x lies in (xp[i-1], xp[i]].
    let i = xp.partition_point(|&p| p < x);
    if i == 0 {
        return fp[0];
    }
    let (x0, x1) = (xp[i - 1], xp[i]);
    let (y0, y1) = (fp[i - 1], fp[i]);
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

/// Like [`interp`] but holding the end values outside the range.
pub fn interp_clamped(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    match (xp.first(), xp.last(), fp.first(), fp.last()) {
        (Some(&x0), _, Some(&y0), _) if x <= x0 => y0,
        (_, Some(&xn), _, Some(&yn)) if x >= xn => yn,
        _ => interp(x, xp, fp),
    }
}

/// The height from `heights` nearest to `target`; ties go to the earlier entry.
pub fn closest_height(heights: &[u32], target: f64) -> Option<u32> {
    heights
        .iter()
        .copied()
        .min_by_key(|&h| OrderedFloat((f64::from(h) - target).abs()))
}

/// The two heights nearest to `target`, nearest first.
pub fn two_closest_heights(heights: &[u32], target: f64) -> Option<(u32, u32)> {
    let mut sorted = heights.to_vec();
    sorted.sort_by_key(|&h| OrderedFloat((f64::from(h) - target).abs()));
    match sorted.as_slice() {
        [a, b, ..] => Some((*a, *b)),
        _ => None,
    }
}

/// Linear inter- or extrapolation to `target` from values at heights `h1` and `h2`.
pub fn linear_interpolation_extrapolation(
    v1: f64,
    h1: f64,
    v2: f64,
    h2: f64,
    target: f64,
) -> f64 {
    (v2 - v1) / (h2 - h1) * (target - h1) + v1
}
