use std::str::FromStr;

use faer::{linalg::triangular_inverse::invert_lower_triangular, Col, Mat, MatRef, Par, Side};
use rand::RngCore;

use crate::{
    error::{ModelError, Result},
    model::Model,
};

/// The constant added to half the squared Mahalanobis distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    /// `0.5 dim ln(2 pi) + sum(diag(L))`, the constant DREAM has always used.
    /// It differs from the normalized density by a constant offset, which
    /// does not change the posterior, but it does change mixture weights
    /// between components with different covariances.
    #[default]
    DiagonalSum,
    /// `0.5 dim ln(2 pi) + sum(ln(diag(L)))`, so that `exp(-nllf)` integrates
    /// to one.
    LogDeterminant,
}

impl FromStr for Normalization {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "diagonal_sum" => Ok(Self::DiagonalSum),
            "log_determinant" => Ok(Self::LogDeterminant),
            _ => Err(ModelError::UnknownOption {
                what: "normalization",
                value: s.to_string(),
            }),
        }
    }
}

/// Multivariate normal negative log likelihood.
///
/// `nllf(x) = C + 0.5 |L^-1 (x - mu)|^2`, where `L` is the lower Cholesky
/// factor of the covariance and `C` is chosen by [`Normalization`]. The
/// inverse factor and `C` are computed once at construction.
#[derive(Debug, Clone)]
pub struct MvNormal {
    mu: Vec<f64>,
    sigma: Mat<f64>,
    rinv: Mat<f64>,
    normalization: Normalization,
    log_norm: f64,
}

impl MvNormal {
    /// Multivariate normal with the default [`Normalization::DiagonalSum`].
    pub fn new(mu: Vec<f64>, sigma: Mat<f64>) -> Result<Self> {
        Self::with_normalization(mu, sigma, Normalization::default())
    }

    pub fn with_normalization(
        mu: Vec<f64>,
        sigma: Mat<f64>,
        normalization: Normalization,
    ) -> Result<Self> {
        let dim = mu.len();
        if sigma.nrows() != dim || sigma.ncols() != dim {
            return Err(ModelError::DimensionMismatch {
                what: "covariance",
                expected: dim,
                actual: if sigma.nrows() != dim {
                    sigma.nrows()
                } else {
                    sigma.ncols()
                },
            });
        }
        if !(mat_all_finite(&sigma.as_ref()) && mat_is_symmetric(&sigma.as_ref())) {
            return Err(ModelError::NotPositiveDefinite);
        }

        let llt = sigma
            .llt(Side::Lower)
            .map_err(|_| ModelError::NotPositiveDefinite)?;
        let r = llt.L();

        let diag: Vec<f64> = (0..dim).map(|i| r[(i, i)]).collect();
        if !diag.iter().all(|&val| val > 0.) {
            return Err(ModelError::NotPositiveDefinite);
        }
        let diag_term: f64 = match normalization {
            Normalization::DiagonalSum => diag.iter().sum(),
            Normalization::LogDeterminant => diag.iter().map(|val| val.ln()).sum(),
        };

        let mut rinv = Mat::<f64>::zeros(dim, dim);
        invert_lower_triangular(rinv.as_mut(), r, Par::Seq);

        let log_norm = 0.5 * dim as f64 * (2. * std::f64::consts::PI).ln() + diag_term;
        log::debug!(
            "multivariate normal in {} dimensions: {:?} normalization {}",
            dim,
            normalization,
            log_norm
        );

        Ok(Self {
            mu,
            sigma,
            rinv,
            normalization,
            log_norm,
        })
    }

    pub fn dim(&self) -> usize {
        self.mu.len()
    }

    pub fn mu(&self) -> &[f64] {
        &self.mu
    }

    pub fn sigma(&self) -> &Mat<f64> {
        &self.sigma
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// The constant `C`, which is the value of `nllf` at the mean.
    pub fn log_normalization(&self) -> f64 {
        self.log_norm
    }

    /// Squared Mahalanobis distance of `x` from the mean.
    pub fn mahalanobis_sq(&self, x: &[f64]) -> f64 {
        let diff = Col::from_fn(self.dim(), |i| x[i] - self.mu[i]);
        (&self.rinv * &diff).squared_norm_l2()
    }
}

impl Model for MvNormal {
    fn nllf(&self, x: &[f64], _rng: &mut dyn RngCore) -> f64 {
        if x.len() != self.dim() {
            return f64::INFINITY;
        }
        let nllf = self.log_norm + 0.5 * self.mahalanobis_sq(x);
        if nllf.is_nan() {
            f64::INFINITY
        } else {
            nllf
        }
    }
}

fn mat_all_finite(mat: &MatRef<f64>) -> bool {
    let mut ok = true;
    faer::zip!(mat).for_each(|faer::unzip!(val)| ok &= val.is_finite());
    ok
}

fn mat_is_symmetric(mat: &MatRef<f64>) -> bool {
    let mut ok = true;
    faer::zip!(mat, mat.transpose()).for_each(|faer::unzip!(a, b)| {
        ok &= (a - b).abs() <= 1e-10 * (a.abs() + b.abs()).max(f64::MIN_POSITIVE)
    });
    ok
}
