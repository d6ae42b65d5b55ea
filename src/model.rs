//! Core abstractions for likelihood models.
//!
//! Provides the [`Model`] trait, which a sampler uses to turn parameter
//! vectors into negative log likelihoods, and [`Target`], the narrower
//! interface a DREAM-style sampler calls on a population.

use std::sync::Arc;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};

use crate::{
    bounds::Bounds,
    density::{Density, LogDensity},
    error::{ModelError, Result},
    mixture::Mixture,
    mvnormal::MvNormal,
    simulation::Simulation,
};

/// Trait for models with a negative log likelihood function.
///
/// `nllf` must not panic for points outside the domain of the model. It
/// returns `f64::INFINITY` instead, so samplers can reject those points
/// without special handling.
///
/// The random number generator is passed to every call and must not be
/// stored by the model. Simulations that draw random numbers stay
/// reproducible for a fixed seed, independent of how the evaluations of a
/// population are scheduled.
///
/// The trait is thread-safe to allow parallel evaluation of populations.
pub trait Model: Send + Sync {
    /// Return the negative log likelihood of seeing `x`.
    fn nllf(&self, x: &[f64], rng: &mut dyn RngCore) -> f64;

    /// The bounds on the parameters, if the model has any.
    fn bounds(&self) -> Option<&dyn Bounds> {
        None
    }

    /// Names of the parameters, if the model has any.
    fn labels(&self) -> Option<&[String]> {
        None
    }

    /// Log density of every point in `population`, using `execution` to
    /// schedule the evaluations.
    fn log_density_with(
        &self,
        population: &[Vec<f64>],
        rng: &mut dyn RngCore,
        execution: &Execution,
    ) -> Vec<f64> {
        population_log_density(self, population, rng, execution)
    }
}

/// The interface a population sampler uses.
///
/// Every [`Model`] is a `Target`. Types that already know how to evaluate a
/// whole population can implement it directly instead.
pub trait Target: Send + Sync {
    /// Move points outside the feasible region back inside.
    fn apply_bounds(&self, population: &mut [Vec<f64>], rng: &mut dyn RngCore);

    /// Return `-nllf(x)` for every `x` in `population`, in order.
    fn log_density(&self, population: &[Vec<f64>], rng: &mut dyn RngCore) -> Vec<f64>;
}

impl<M: Model + ?Sized> Target for M {
    fn apply_bounds(&self, population: &mut [Vec<f64>], rng: &mut dyn RngCore) {
        if let Some(bounds) = self.bounds() {
            bounds.apply_bounds(population, rng);
        }
    }

    fn log_density(&self, population: &[Vec<f64>], rng: &mut dyn RngCore) -> Vec<f64> {
        self.log_density_with(population, rng, &Execution::Sequential)
    }
}

/// How the points of a population are scheduled for evaluation.
#[derive(Debug, Clone, Default)]
pub enum Execution {
    /// Evaluate on the calling thread.
    #[default]
    Sequential,
    /// Evaluate on the global rayon pool.
    Parallel,
    /// Evaluate on a dedicated pool.
    Pool(Arc<ThreadPool>),
}

impl Execution {
    /// Start a dedicated pool with `num_threads` workers.
    pub fn with_threads(num_threads: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("dream-worker-{}", i))
            .build()
            .map_err(|err| ModelError::ThreadPool(err.to_string()))?;
        Ok(Execution::Pool(Arc::new(pool)))
    }
}

/// Random number generator for the point at `index` of a population.
///
/// Every point gets its own stream of the same seed, so the values a point
/// sees do not depend on which thread evaluates it or in which order.
pub fn point_rng(seed: u64, index: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(index as u64);
    rng
}

pub(crate) fn population_log_density<M: Model + ?Sized>(
    model: &M,
    population: &[Vec<f64>],
    rng: &mut dyn RngCore,
    execution: &Execution,
) -> Vec<f64> {
    let seed = rng.next_u64();
    let eval = |(index, point): (usize, &Vec<f64>)| {
        let mut rng = point_rng(seed, index);
        -model.nllf(point, &mut rng)
    };

    match execution {
        Execution::Sequential => population.iter().enumerate().map(&eval).collect(),
        Execution::Parallel => population.par_iter().enumerate().map(&eval).collect(),
        Execution::Pool(pool) => {
            pool.install(|| population.par_iter().enumerate().map(&eval).collect())
        }
    }
}

/// Any of the likelihood models in this crate.
pub enum LikelihoodModel {
    Density(Density),
    LogDensity(LogDensity),
    Simulation(Simulation),
    MvNormal(MvNormal),
    Mixture(Mixture),
}

impl LikelihoodModel {
    fn inner(&self) -> &dyn Model {
        match self {
            LikelihoodModel::Density(model) => model,
            LikelihoodModel::LogDensity(model) => model,
            LikelihoodModel::Simulation(model) => model,
            LikelihoodModel::MvNormal(model) => model,
            LikelihoodModel::Mixture(model) => model,
        }
    }
}

impl std::fmt::Debug for LikelihoodModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LikelihoodModel::Density(model) => std::fmt::Debug::fmt(model, f),
            LikelihoodModel::LogDensity(model) => std::fmt::Debug::fmt(model, f),
            LikelihoodModel::Simulation(model) => std::fmt::Debug::fmt(model, f),
            LikelihoodModel::MvNormal(model) => std::fmt::Debug::fmt(model, f),
            LikelihoodModel::Mixture(model) => std::fmt::Debug::fmt(model, f),
        }
    }
}

impl Model for LikelihoodModel {
    fn nllf(&self, x: &[f64], rng: &mut dyn RngCore) -> f64 {
        self.inner().nllf(x, rng)
    }

    fn bounds(&self) -> Option<&dyn Bounds> {
        self.inner().bounds()
    }

    fn labels(&self) -> Option<&[String]> {
        self.inner().labels()
    }
}

macro_rules! impl_from_model {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for LikelihoodModel {
                fn from(model: $variant) -> Self {
                    LikelihoodModel::$variant(model)
                }
            }
        )*
    };
}

impl_from_model!(Density, LogDensity, Simulation, MvNormal, Mixture);
