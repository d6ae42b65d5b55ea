//! Likelihood models for population MCMC samplers, and Chebyshev polynomial
//! profiles for freeform reflectometry layers.
//!
//! A sampler only needs the [`Model`] trait (or the narrower [`Target`]):
//!
//! ```
//! use dream_models::{LogDensity, Target};
//! use rand::SeedableRng;
//!
//! let model = LogDensity::new(|x: &[f64]| -0.5 * x[0] * x[0]);
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//! let logp = model.log_density(&[vec![0.], vec![1.]], &mut rng);
//! assert_eq!(logp, vec![0., -0.5]);
//! ```

pub(crate) mod bounds;
pub(crate) mod cheby;
pub(crate) mod density;
pub(crate) mod error;
pub(crate) mod exppow;
pub(crate) mod layer;
pub(crate) mod math;
pub(crate) mod mixture;
pub(crate) mod model;
pub(crate) mod mvnormal;
pub(crate) mod simulation;

pub use bounds::{Bounds, BoundsStyle, BoxBounds};
pub use cheby::{cheby_coefficients, cheby_profile, clenshaw, control_points, ChebyshevMethod};
pub use density::{Density, LogDensity, ScalarFn};
pub use error::{ModelError, Result};
pub use exppow::ExpPow;
pub use layer::{
    ChebyVolumeFraction, FreeformCheby, MicroslabSettings, MicroslabStack, Sld, Slabs,
};
pub use mixture::{Mixture, MixtureArg, MixtureComponent};
pub use model::{point_rng, Execution, LikelihoodModel, Model, Target};
pub use mvnormal::{MvNormal, Normalization};
pub use simulation::{Sigma, Simulation, SimulationBuilder, SimulationFn};
