use std::{fmt::Debug, sync::Arc};

use itertools::izip;
use rand::RngCore;

use crate::{
    bounds::Bounds,
    error::{ModelError, Result},
    exppow::ExpPow,
    model::Model,
};

/// A user simulation returning values comparable to the measured data.
pub type SimulationFn = Arc<dyn Fn(&[f64], &mut dyn RngCore) -> Vec<f64> + Send + Sync>;

/// One-sigma uncertainty of the measurements.
#[derive(Debug, Clone, PartialEq)]
pub enum Sigma {
    /// The same uncertainty for every measurement.
    Scalar(f64),
    /// One uncertainty per measurement.
    PerPoint(Vec<f64>),
}

impl Default for Sigma {
    fn default() -> Self {
        Sigma::Scalar(1.)
    }
}

impl From<f64> for Sigma {
    fn from(value: f64) -> Self {
        Sigma::Scalar(value)
    }
}

impl From<Vec<f64>> for Sigma {
    fn from(value: Vec<f64>) -> Self {
        Sigma::PerPoint(value)
    }
}

/// Model defined by a simulation and the data it should reproduce.
///
/// Residuals follow an exponential power distribution with scale `sigma` and
/// kurtosis parameter `gamma` (see [`ExpPow`]). Everything that depends only
/// on `sigma` and `gamma` is computed once in [`SimulationBuilder::build`].
#[derive(Clone)]
pub struct Simulation {
    f: SimulationFn,
    data: Vec<f64>,
    sigma: Vec<f64>,
    exppow: ExpPow,
    offset: f64,
    bounds: Option<Arc<dyn Bounds>>,
    labels: Option<Vec<String>>,
}

impl Simulation {
    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::default()
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Uncertainty of every measurement, with a scalar sigma broadcast.
    pub fn sigma(&self) -> &[f64] {
        &self.sigma
    }

    pub fn gamma(&self) -> f64 {
        self.exppow.gamma()
    }

    /// `sum(ln(w / sigma))` over all measurements.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Run the simulation at `x`.
    pub fn simulate(&self, x: &[f64], rng: &mut dyn RngCore) -> Vec<f64> {
        (self.f)(x, rng)
    }
}

impl Model for Simulation {
    fn nllf(&self, x: &[f64], rng: &mut dyn RngCore) -> f64 {
        let simulated = self.simulate(x, rng);
        if simulated.len() != self.data.len() {
            return f64::INFINITY;
        }
        let penalty: f64 = izip!(&simulated, &self.data, &self.sigma)
            .map(|(sim, data, sigma)| self.exppow.kernel(sim - data, *sigma))
            .sum();
        let nllf = penalty - self.offset;
        if nllf.is_nan() {
            f64::INFINITY
        } else {
            nllf
        }
    }

    fn bounds(&self) -> Option<&dyn Bounds> {
        self.bounds.as_deref()
    }

    fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }
}

impl Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("n_data", &self.data.len())
            .field("exppow", &self.exppow)
            .field("offset", &self.offset)
            .field("bounds", &self.bounds)
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct SimulationBuilder {
    f: Option<SimulationFn>,
    data: Option<Vec<f64>>,
    sigma: Sigma,
    gamma: f64,
    bounds: Option<Arc<dyn Bounds>>,
    labels: Option<Vec<String>>,
}

impl SimulationBuilder {
    pub fn function(
        mut self,
        f: impl Fn(&[f64], &mut dyn RngCore) -> Vec<f64> + Send + Sync + 'static,
    ) -> Self {
        self.f = Some(Arc::new(f));
        self
    }

    pub fn data(mut self, data: Vec<f64>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn sigma(mut self, sigma: impl Into<Sigma>) -> Self {
        self.sigma = sigma.into();
        self
    }

    /// Kurtosis of the measurement noise, in `(-1, 1]`. Defaults to `0`.
    pub fn gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn bounds(mut self, bounds: impl Bounds + 'static) -> Self {
        self.bounds = Some(Arc::new(bounds));
        self
    }

    pub fn labels(mut self, labels: Vec<String>) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn build(self) -> Result<Simulation> {
        let data = self.data.ok_or(ModelError::MissingData)?;
        let f = self.f.ok_or(ModelError::MissingFunction)?;

        let sigma = match self.sigma {
            Sigma::Scalar(sigma) => vec![sigma; data.len()],
            Sigma::PerPoint(sigma) => {
                if sigma.len() != data.len() {
                    return Err(ModelError::DimensionMismatch {
                        what: "sigma",
                        expected: data.len(),
                        actual: sigma.len(),
                    });
                }
                sigma
            }
        };
        if let Some(&bad) = sigma.iter().find(|&&s| !(s.is_finite() && s > 0.)) {
            return Err(ModelError::InvalidSigma(bad));
        }

        let exppow = ExpPow::new(self.gamma)?;
        // Log likelihood of a perfect fit.
        let offset: f64 = sigma.iter().map(|&s| exppow.log_density(0., s)).sum();

        log::debug!(
            "simulation with {} points: gamma={}, c={}, w={}, pow={}, offset={}",
            data.len(),
            exppow.gamma(),
            exppow.c(),
            exppow.w(),
            exppow.pow(),
            offset,
        );

        Ok(Simulation {
            f,
            data,
            sigma,
            exppow,
            offset,
            bounds: self.bounds,
            labels: self.labels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rand::RngCore;
    use rand::SeedableRng;
    use std::f64::consts::{PI, SQRT_2};

    fn line(x: &[f64], _rng: &mut dyn RngCore) -> Vec<f64> {
        (0..5).map(|i| x[0] + x[1] * i as f64).collect()
    }

    fn data() -> Vec<f64> {
        vec![0.1, 1.2, 1.9, 3.05, 4.0]
    }

    fn sigma() -> Vec<f64> {
        vec![0.1, 0.2, 0.1, 0.3, 0.25]
    }

    fn simulation(gamma: f64) -> Simulation {
        Simulation::builder()
            .function(line)
            .data(data())
            .sigma(sigma())
            .gamma(gamma)
            .build()
            .unwrap()
    }

    #[test]
    fn perfect_fit_is_offset() {
        let model = simulation(0.4);
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        assert_eq!(model.simulate(&[0.5, 2.], &mut rng), vec![0.5, 2.5, 4.5, 6.5, 8.5]);

        let exppow = ExpPow::new(0.4).unwrap();
        let expected: f64 = sigma().iter().map(|s| exppow.w().ln() - s.ln()).sum();
        assert_abs_diff_eq!(model.offset(), expected, epsilon = 1e-12);

        let exact = Simulation::builder()
            .function(|_: &[f64], _: &mut dyn RngCore| data())
            .data(data())
            .sigma(sigma())
            .gamma(0.4)
            .build()
            .unwrap();
        assert_eq!(exact.nllf(&[0., 0.], &mut rng), -exact.offset());
    }

    #[test]
    fn missing_data() {
        let err = Simulation::builder().function(line).build().unwrap_err();
        assert_eq!(err, ModelError::MissingData);
    }

    #[test]
    fn invalid_configuration() {
        let err = Simulation::builder()
            .function(line)
            .data(data())
            .sigma(vec![1., 2.])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::DimensionMismatch {
                what: "sigma",
                expected: 5,
                actual: 2
            }
        );
        let err = Simulation::builder()
            .function(line)
            .data(data())
            .sigma(0.)
            .build()
            .unwrap_err();
        assert_eq!(err, ModelError::InvalidSigma(0.));
        let err = Simulation::builder()
            .function(line)
            .data(data())
            .gamma(-1.)
            .build()
            .unwrap_err();
        assert_eq!(err, ModelError::InvalidGamma(-1.));
        let err = Simulation::builder().data(data()).build().unwrap_err();
        assert_eq!(err, ModelError::MissingFunction);
    }

    #[test]
    fn gaussian_normalization() {
        let model = simulation(0.);
        let expected: f64 = sigma()
            .iter()
            .map(|s| -(s * (2. * PI).sqrt()).ln())
            .sum();
        assert_abs_diff_eq!(model.offset(), expected, epsilon = 1e-10);
    }

    proptest! {
        #[test]
        fn gaussian_limit(a in -2f64..2f64, b in -2f64..2f64) {
            let model = simulation(0.);
            let mut rng = rand::rngs::StdRng::seed_from_u64(0);
            let x = [a, b];
            let err = line(&x, &mut rng);
            let (d, sg) = (data(), sigma());
            let chisq: f64 = izip!(&err, &d, &sg)
                .map(|(sim, d, s)| 0.5 * ((sim - d) / s).powi(2))
                .sum();
            let nllf = model.nllf(&x, &mut rng);
            prop_assert!((nllf - chisq + model.offset()).abs() < 1e-8 * (1. + chisq));
        }

        #[test]
        fn laplace_limit(a in -2f64..2f64, b in -2f64..2f64) {
            let model = simulation(1.);
            let mut rng = rand::rngs::StdRng::seed_from_u64(0);
            let x = [a, b];
            let err = line(&x, &mut rng);
            let (d, sg) = (data(), sigma());
            let abs_dev: f64 = izip!(&err, &d, &sg)
                .map(|(sim, d, s)| ((sim - d) / s).abs())
                .sum();
            let nllf = model.nllf(&x, &mut rng);
            prop_assert!((nllf - SQRT_2 * abs_dev + model.offset()).abs() < 1e-8 * (1. + abs_dev));
        }
    }

    #[test]
    fn scalar_sigma_broadcasts() {
        let model = Simulation::builder()
            .function(line)
            .data(data())
            .sigma(0.5)
            .build()
            .unwrap();
        assert_eq!(model.sigma(), &[0.5; 5]);
    }

    #[test]
    fn wrong_length_is_infeasible() {
        let model = Simulation::builder()
            .function(|x: &[f64], _: &mut dyn RngCore| x.to_vec())
            .data(data())
            .build()
            .unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        assert_eq!(model.nllf(&[1., 2.], &mut rng), f64::INFINITY);
    }

    #[test]
    fn uniform_limit() {
        let model = Simulation::builder()
            .function(|x: &[f64], _: &mut dyn RngCore| x.to_vec())
            .data(vec![0., 0.])
            .gamma(-1. + 1e-9)
            .build()
            .unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        let inside = model.nllf(&[0.5, -1.5], &mut rng);
        assert_abs_diff_eq!(inside, 2. * (2. * 3f64.sqrt()).ln(), epsilon = 1e-6);
        assert_eq!(model.nllf(&[0.5, 2.], &mut rng), f64::INFINITY);
    }

    #[test]
    fn simulation_uses_rng() {
        use rand::Rng;

        let model = Simulation::builder()
            .function(|x: &[f64], rng: &mut dyn RngCore| {
                x.iter().map(|v| v + 0.01 * rng.random::<f64>()).collect()
            })
            .data(vec![0.])
            .build()
            .unwrap();
        let a = model.nllf(&[0.3], &mut rand::rngs::StdRng::seed_from_u64(5));
        let b = model.nllf(&[0.3], &mut rand::rngs::StdRng::seed_from_u64(5));
        assert_eq!(a, b);
    }
}
