//! Freeform layers whose profile is a Chebyshev polynomial.
//!
//! A layer is rendered into a stack of thin slabs. The stack decides how
//! finely a layer is sampled ([`Slabs::microslabs`]) and the layer appends
//! one scattering length density per slab ([`Slabs::extend`]).

use crate::{
    cheby::{cheby_profile, ChebyshevMethod},
    error::{ModelError, Result},
};

/// A stack of microslabs that layers render into.
pub trait Slabs {
    /// Split a layer of the given thickness into microslabs.
    ///
    /// Returns the width of every microslab and the depth of its center,
    /// measured from the top of the layer.
    fn microslabs(&self, thickness: f64) -> (Vec<f64>, Vec<f64>);

    /// Append microslabs with real sld `rho`, imaginary sld `irho` and
    /// widths `w`.
    ///
    /// # Panics
    ///
    /// Implementations may panic if the three slices differ in length.
    fn extend(&mut self, rho: &[f64], irho: &[f64], w: &[f64]);
}

/// Real and imaginary scattering length density of a material.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sld {
    pub rho: f64,
    pub irho: f64,
}

impl Sld {
    pub fn new(rho: f64, irho: f64) -> Self {
        Self { rho, irho }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MicroslabSettings {
    /// Largest allowed microslab width.
    pub step: f64,
}

impl Default for MicroslabSettings {
    fn default() -> Self {
        Self { step: 1. }
    }
}

/// Slab stack that samples layers with equal-width microslabs.
#[derive(Debug, Clone, Default)]
pub struct MicroslabStack {
    settings: MicroslabSettings,
    rho: Vec<f64>,
    irho: Vec<f64>,
    w: Vec<f64>,
}

impl MicroslabStack {
    pub fn new(settings: MicroslabSettings) -> Result<Self> {
        if !(settings.step.is_finite() && settings.step > 0.) {
            return Err(ModelError::InvalidStep(settings.step));
        }
        Ok(Self {
            settings,
            ..Default::default()
        })
    }

    pub fn rho(&self) -> &[f64] {
        &self.rho
    }

    pub fn irho(&self) -> &[f64] {
        &self.irho
    }

    pub fn w(&self) -> &[f64] {
        &self.w
    }

    pub fn len(&self) -> usize {
        self.w.len()
    }

    pub fn is_empty(&self) -> bool {
        self.w.is_empty()
    }

    pub fn total_thickness(&self) -> f64 {
        self.w.iter().sum()
    }
}

impl Slabs for MicroslabStack {
    fn microslabs(&self, thickness: f64) -> (Vec<f64>, Vec<f64>) {
        if !(thickness > 0.) {
            return (Vec::new(), Vec::new());
        }
        let n = (thickness / self.settings.step).ceil();
        if !n.is_finite() {
            log::warn!("cannot split a layer of thickness {} into microslabs", thickness);
            return (Vec::new(), Vec::new());
        }
        let n = n.max(1.) as usize;
        let width = thickness / n as f64;
        let w = vec![width; n];
        let z = (0..n).map(|i| (i as f64 + 0.5) * width).collect();
        (w, z)
    }

    /// # Panics
    ///
    /// Panics if `rho`, `irho` and `w` differ in length.
    fn extend(&mut self, rho: &[f64], irho: &[f64], w: &[f64]) {
        assert!(rho.len() == w.len());
        assert!(irho.len() == w.len());
        self.rho.extend_from_slice(rho);
        self.irho.extend_from_slice(irho);
        self.w.extend_from_slice(w);
    }
}

fn normalized_depths(depths: &[f64], thickness: f64) -> Vec<f64> {
    depths.iter().map(|z| z / thickness).collect()
}

/// A freeform section with separate Chebyshev profiles for the real and
/// imaginary sld.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeformCheby {
    pub name: String,
    pub thickness: f64,
    pub rho: Vec<f64>,
    pub irho: Vec<f64>,
    pub method: ChebyshevMethod,
}

impl FreeformCheby {
    pub fn new(thickness: f64, rho: Vec<f64>, irho: Vec<f64>, method: ChebyshevMethod) -> Self {
        Self {
            name: "Cheby".to_string(),
            thickness,
            rho,
            irho,
            method,
        }
    }

    /// Parameter names, in the order `thickness, rho[..], irho[..]`.
    pub fn parameter_names(&self) -> Vec<String> {
        let mut names = vec![format!("{} thickness", self.name)];
        names.extend((0..self.rho.len()).map(|i| format!("{}[{}] rho", self.name, i)));
        names.extend((0..self.irho.len()).map(|i| format!("{}[{}] irho", self.name, i)));
        names
    }

    pub fn render(&self, slabs: &mut dyn Slabs) {
        let (w, z) = slabs.microslabs(self.thickness);
        if w.is_empty() {
            return;
        }
        let t = normalized_depths(&z, self.thickness);
        let rho = cheby_profile(&self.rho, &t, self.method);
        let irho = cheby_profile(&self.irho, &t, self.method);
        slabs.extend(&rho, &irho, &w);
    }
}

/// A material in a solvent, with the volume fraction of the material given
/// by a Chebyshev profile.
///
/// `sld(z) = material * vf(z) + solvent * (1 - vf(z))`, where the volume
/// fraction is clipped to `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChebyVolumeFraction {
    pub thickness: f64,
    pub material: Sld,
    pub solvent: Sld,
    pub vf: Vec<f64>,
    pub method: ChebyshevMethod,
}

impl ChebyVolumeFraction {
    pub fn new(
        thickness: f64,
        material: Sld,
        solvent: Sld,
        vf: Vec<f64>,
        method: ChebyshevMethod,
    ) -> Self {
        Self {
            thickness,
            material,
            solvent,
            vf,
            method,
        }
    }

    /// Volume fraction of the material at the normalized depths `t`.
    pub fn volume_fraction(&self, t: &[f64]) -> Vec<f64> {
        cheby_profile(&self.vf, t, self.method)
            .into_iter()
            .map(|vf| vf.clamp(0., 1.))
            .collect()
    }

    pub fn render(&self, slabs: &mut dyn Slabs) {
        let (w, z) = slabs.microslabs(self.thickness);
        if w.is_empty() {
            return;
        }
        let t = normalized_depths(&z, self.thickness);
        let vf = self.volume_fraction(&t);

        let mut rho = Vec::with_capacity(vf.len());
        let mut irho = Vec::with_capacity(vf.len());
        for &vf in vf.iter() {
            rho.push(self.material.rho * vf + self.solvent.rho * (1. - vf));
            irho.push(self.material.irho * vf + self.solvent.irho * (1. - vf));
        }
        slabs.extend(&rho, &irho, &w);
    }
}
