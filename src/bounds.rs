//! Bounds handling for populations of parameter vectors.
//!
//! Samplers propose points outside the feasible region. A [`Bounds`] object
//! moves them back in place before the points are evaluated.

use std::{fmt::Debug, str::FromStr};

use itertools::izip;
use rand::{Rng, RngCore};

use crate::error::{ModelError, Result};

/// Maps out-of-domain parameter vectors back into the feasible region.
pub trait Bounds: Debug + Send + Sync {
    fn apply_bounds(&self, population: &mut [Vec<f64>], rng: &mut dyn RngCore);
}

/// How [`BoxBounds`] treats a coordinate outside `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundsStyle {
    /// Mirror at the violated bound. Points still outside are randomized.
    #[default]
    Reflect,
    /// Clamp to the violated bound.
    Clip,
    /// Wrap around the range as if it were periodic.
    Fold,
    /// Replace with a uniform draw from the range.
    Randomize,
    /// Leave the point untouched.
    None,
}

impl FromStr for BoundsStyle {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "reflect" => Ok(Self::Reflect),
            "clip" => Ok(Self::Clip),
            "fold" => Ok(Self::Fold),
            "randomize" => Ok(Self::Randomize),
            "none" => Ok(Self::None),
            _ => Err(ModelError::UnknownOption {
                what: "bounds style",
                value: s.to_string(),
            }),
        }
    }
}

/// Independent `[lower, upper]` limits on every parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxBounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
    style: BoundsStyle,
}

impl BoxBounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>, style: BoundsStyle) -> Result<Self> {
        if lower.len() != upper.len() {
            return Err(ModelError::DimensionMismatch {
                what: "upper bounds",
                expected: lower.len(),
                actual: upper.len(),
            });
        }
        for (index, (&lo, &hi)) in lower.iter().zip(upper.iter()).enumerate() {
            if lo.is_nan() || hi.is_nan() || lo > hi {
                return Err(ModelError::InvalidBounds {
                    index,
                    lower: lo,
                    upper: hi,
                });
            }
        }
        Ok(Self {
            lower,
            upper,
            style,
        })
    }

    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    pub fn style(&self) -> BoundsStyle {
        self.style
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    pub fn contains(&self, point: &[f64]) -> bool {
        point.len() == self.dim()
            && izip!(point, &self.lower, &self.upper).all(|(x, lo, hi)| lo <= x && x <= hi)
    }

    fn apply_point(&self, point: &mut [f64], rng: &mut dyn RngCore) {
        for (x, &lo, &hi) in izip!(point.iter_mut(), &self.lower, &self.upper) {
            if lo <= *x && *x <= hi {
                continue;
            }
            *x = match self.style {
                BoundsStyle::None => *x,
                BoundsStyle::Clip => x.clamp(lo, hi),
                BoundsStyle::Reflect => {
                    let y = if *x < lo { 2. * lo - *x } else { 2. * hi - *x };
                    if lo <= y && y <= hi {
                        y
                    } else {
                        randomize(lo, hi, y, rng)
                    }
                }
                BoundsStyle::Fold => fold(lo, hi, *x),
                BoundsStyle::Randomize => randomize(lo, hi, *x, rng),
            };
        }
    }
}

impl Bounds for BoxBounds {
    fn apply_bounds(&self, population: &mut [Vec<f64>], rng: &mut dyn RngCore) {
        for point in population.iter_mut() {
            self.apply_point(point, rng);
        }
    }
}

fn fold(lo: f64, hi: f64, x: f64) -> f64 {
    let width = hi - lo;
    if !width.is_finite() || width == 0. {
        return x.clamp(lo, hi);
    }
    lo + (x - lo).rem_euclid(width)
}

fn randomize(lo: f64, hi: f64, x: f64, rng: &mut dyn RngCore) -> f64 {
    if !(hi - lo).is_finite() {
        return x.clamp(lo, hi);
    }
    let val = lo + rng.random::<f64>() * (hi - lo);
    log::trace!("randomized out of bounds value {} to {}", x, val);
    val
}
