use std::{fmt::Debug, sync::Arc};

use rand::RngCore;

use crate::{bounds::Bounds, model::Model};

/// A user function from a parameter vector to a scalar.
pub type ScalarFn = Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// Model defined by a probability density function.
///
/// `nllf(x) = -ln(f(x))`. A density that is not positive gives an infinite
/// negative log likelihood.
#[derive(Clone)]
pub struct Density {
    f: ScalarFn,
    bounds: Option<Arc<dyn Bounds>>,
    labels: Option<Vec<String>>,
}

impl Density {
    pub fn new(f: impl Fn(&[f64]) -> f64 + Send + Sync + 'static) -> Self {
        Self {
            f: Arc::new(f),
            bounds: None,
            labels: None,
        }
    }

    pub fn with_bounds(mut self, bounds: impl Bounds + 'static) -> Self {
        self.bounds = Some(Arc::new(bounds));
        self
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = Some(labels);
        self
    }
}

impl Model for Density {
    fn nllf(&self, x: &[f64], _rng: &mut dyn RngCore) -> f64 {
        let p = (self.f)(x);
        if p > 0. {
            -p.ln()
        } else {
            f64::INFINITY
        }
    }

    fn bounds(&self) -> Option<&dyn Bounds> {
        self.bounds.as_deref()
    }

    fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }
}

impl Debug for Density {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Density")
            .field("bounds", &self.bounds)
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

/// Model defined by a log probability density function.
///
/// `nllf(x) = -f(x)`.
#[derive(Clone)]
pub struct LogDensity {
    f: ScalarFn,
    bounds: Option<Arc<dyn Bounds>>,
    labels: Option<Vec<String>>,
}

impl LogDensity {
    pub fn new(f: impl Fn(&[f64]) -> f64 + Send + Sync + 'static) -> Self {
        Self {
            f: Arc::new(f),
            bounds: None,
            labels: None,
        }
    }

    pub fn with_bounds(mut self, bounds: impl Bounds + 'static) -> Self {
        self.bounds = Some(Arc::new(bounds));
        self
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = Some(labels);
        self
    }
}

impl Model for LogDensity {
    fn nllf(&self, x: &[f64], _rng: &mut dyn RngCore) -> f64 {
        let logp = (self.f)(x);
        if logp.is_nan() {
            f64::INFINITY
        } else {
            -logp
        }
    }

    fn bounds(&self) -> Option<&dyn Bounds> {
        self.bounds.as_deref()
    }

    fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }
}

impl Debug for LogDensity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogDensity")
            .field("bounds", &self.bounds)
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}
