use itertools::izip;

/// Negative log of the weighted mean of `exp(-nllf_i)`.
///
/// The smallest NLLF is factored out before exponentiating, so components
/// that are far apart neither overflow nor underflow. NaN entries count as
/// infeasible components.
pub(crate) fn mixture_nllf(nllfs: &[f64], weights: &[f64], total_weight: f64) -> f64 {
    assert!(nllfs.len() == weights.len());

    let min = nllfs
        .iter()
        .copied()
        .filter(|val| !val.is_nan())
        .fold(f64::INFINITY, f64::min);
    if !min.is_finite() {
        return min;
    }

    let sum: f64 = izip!(nllfs, weights)
        .filter(|(nllf, weight)| !nllf.is_nan() && **weight != 0.)
        .map(|(&nllf, &weight)| weight * (min - nllf).exp())
        .sum();

    if !(sum > 0.) {
        log::trace!("mixture probability mass {} is not positive", sum);
        return f64::INFINITY;
    }
    min - (sum / total_weight).ln()
}

/// `ln(a * |z|^pow)` given `ln(a)`, with `0^pow = 0`.
#[inline]
pub(crate) fn ln_scaled_pow(ln_scale: f64, z: f64, pow: f64) -> f64 {
    ln_scale + pow * z.abs().ln()
}
