use rand::RngCore;

use crate::{
    error::{ModelError, Result},
    math::mixture_nllf,
    model::{LikelihoodModel, Model},
};

/// One weighted component of a [`Mixture`].
#[derive(Debug)]
pub struct MixtureComponent {
    pub model: LikelihoodModel,
    pub weight: f64,
}

/// One entry of the alternating argument list `M1, w1, M2, w2, ...`.
#[derive(Debug)]
pub enum MixtureArg {
    Model(LikelihoodModel),
    Weight(f64),
}

impl From<LikelihoodModel> for MixtureArg {
    fn from(model: LikelihoodModel) -> Self {
        MixtureArg::Model(model)
    }
}

impl From<f64> for MixtureArg {
    fn from(weight: f64) -> Self {
        MixtureArg::Weight(weight)
    }
}

/// Weighted mixture of likelihood models.
///
/// `nllf(x) = -ln(sum_i w_i exp(-nllf_i(x)) / sum_i w_i)`, reduced in log
/// space. The components are stored once and may be evaluated any number of
/// times.
#[derive(Debug)]
pub struct Mixture {
    components: Vec<MixtureComponent>,
    total_weight: f64,
}

impl Mixture {
    /// Build a mixture from `(model, weight)` pairs.
    pub fn new(pairs: impl IntoIterator<Item = (LikelihoodModel, f64)>) -> Result<Self> {
        let components: Vec<MixtureComponent> = pairs
            .into_iter()
            .map(|(model, weight)| MixtureComponent { model, weight })
            .collect();

        if components.is_empty() {
            return Err(ModelError::InvalidMixture(
                "at least one component is required".to_string(),
            ));
        }
        for (i, component) in components.iter().enumerate() {
            if !component.weight.is_finite() {
                return Err(ModelError::InvalidMixture(format!(
                    "weight {} is not a finite scalar: {}",
                    i + 1,
                    component.weight
                )));
            }
        }

        let total_weight: f64 = components.iter().map(|c| c.weight).sum();
        if !(total_weight > 0.) {
            return Err(ModelError::InvalidMixture(format!(
                "the sum of the weights must be positive, got {}",
                total_weight
            )));
        }

        log::debug!(
            "mixture of {} components with total weight {}",
            components.len(),
            total_weight
        );

        Ok(Self {
            components,
            total_weight,
        })
    }

    /// Build a mixture from the alternating list `M1, w1, M2, w2, ...`.
    pub fn from_args(args: impl IntoIterator<Item = MixtureArg>) -> Result<Self> {
        let args: Vec<MixtureArg> = args.into_iter().collect();
        if args.len() % 2 != 0 {
            return Err(ModelError::InvalidMixture(format!(
                "got an odd number of arguments ({})",
                args.len()
            )));
        }

        let mut pairs = Vec::with_capacity(args.len() / 2);
        let mut args = args.into_iter().enumerate();
        while let (Some((i, model)), Some((j, weight))) = (args.next(), args.next()) {
            let model = match model {
                MixtureArg::Model(model) => model,
                MixtureArg::Weight(_) => {
                    return Err(ModelError::InvalidMixture(format!(
                        "argument {} must be a model",
                        i + 1
                    )))
                }
            };
            let weight = match weight {
                MixtureArg::Weight(weight) => weight,
                MixtureArg::Model(_) => {
                    return Err(ModelError::InvalidMixture(format!(
                        "argument {} must be a scalar weight",
                        j + 1
                    )))
                }
            };
            pairs.push((model, weight));
        }
        Self::new(pairs)
    }

    pub fn components(&self) -> &[MixtureComponent] {
        &self.components
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }
}

impl Model for Mixture {
    fn nllf(&self, x: &[f64], rng: &mut dyn RngCore) -> f64 {
        let (nllfs, weights): (Vec<f64>, Vec<f64>) = self
            .components
            .iter()
            .map(|component| (component.model.nllf(x, rng), component.weight))
            .unzip();
        mixture_nllf(&nllfs, &weights, self.total_weight)
    }
}
