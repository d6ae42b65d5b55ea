//! Exponential power density used as the measurement noise model.
//!
//! A residual `v` with scale `S` and kurtosis parameter `G` has density
//!
//! ```text
//! p(v | S, G) = w(G) / S * exp(-c(G) * |v / S|^(2 / (1 + G)))
//! ```
//!
//! `G = 0` is the normal distribution, `G = 1` the double exponential and
//! `G -> -1` approaches a uniform density on `[-sqrt(3) S, sqrt(3) S]`.
//! In every case the distribution has standard deviation `S`.

use statrs::function::gamma::ln_gamma;

use crate::error::{ModelError, Result};
use crate::math::ln_scaled_pow;

/// Normalizing constants of the exponential power density for one `gamma`.
///
/// Both constants are kept as logarithms. Near `gamma = -1` the constant
/// `c` underflows while `|v/S|^pow` overflows, but their product stays finite
/// inside the support.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpPow {
    gamma: f64,
    ln_c: f64,
    ln_w: f64,
    pow: f64,
}

impl ExpPow {
    pub fn new(gamma: f64) -> Result<Self> {
        if !(gamma > -1. && gamma <= 1.) {
            return Err(ModelError::InvalidGamma(gamma));
        }
        let b = 1. + gamma;
        let ln_a1 = ln_gamma(1.5 * b);
        let ln_a2 = ln_gamma(0.5 * b);
        Ok(Self {
            gamma,
            ln_c: (ln_a1 - ln_a2) / b,
            ln_w: 0.5 * ln_a1 - b.ln() - 1.5 * ln_a2,
            pow: 2. / b,
        })
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// The constant `c(G)` in the exponent.
    pub fn c(&self) -> f64 {
        self.ln_c.exp()
    }

    /// The constant `w(G)` in front of the density.
    pub fn w(&self) -> f64 {
        self.ln_w.exp()
    }

    pub fn ln_w(&self) -> f64 {
        self.ln_w
    }

    /// The exponent `2 / (1 + G)`.
    pub fn pow(&self) -> f64 {
        self.pow
    }

    /// `c * |v/S|^pow`, the part of the negative log density that depends on
    /// the residual.
    #[inline]
    pub fn kernel(&self, residual: f64, sigma: f64) -> f64 {
        ln_scaled_pow(self.ln_c, residual / sigma, self.pow).exp()
    }

    /// Log density of one residual with uncertainty `sigma`.
    pub fn log_density(&self, residual: f64, sigma: f64) -> f64 {
        self.ln_w - sigma.ln() - self.kernel(residual, sigma)
    }
}
