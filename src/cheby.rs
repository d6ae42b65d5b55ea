//! Chebyshev polynomial profiles.
//!
//! A profile over a layer of thickness `L` is described by `N` control
//! values, in one of two ways:
//!
//! - [`ChebyshevMethod::Direct`]: the values are Chebyshev coefficients.
//! - [`ChebyshevMethod::Interp`]: the values are samples of the profile at
//!   the control points `z_k = L (cos(pi (k - 0.5) / N) + 1) / 2` for
//!   `k = 1..N`, and the coefficients are derived with a discrete cosine
//!   transform.
//!
//! Deriving the coefficients costs `O(N log N)`, on top of the `O(N S)` cost
//! of evaluating the polynomial on `S` microslabs.

use std::{f64::consts::PI, str::FromStr};

use rustfft::{num_complex::Complex, FftPlanner};

use crate::error::{ModelError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChebyshevMethod {
    /// Control values are the polynomial coefficients.
    Direct,
    /// Control values are samples at the control points.
    #[default]
    Interp,
}

impl FromStr for ChebyshevMethod {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "direct" => Ok(Self::Direct),
            "interp" => Ok(Self::Interp),
            _ => Err(ModelError::UnknownOption {
                what: "chebyshev method",
                value: s.to_string(),
            }),
        }
    }
}

/// Depths of the `n` control points in a layer of the given thickness.
pub fn control_points(n: usize, thickness: f64) -> Vec<f64> {
    (1..=n)
        .map(|k| thickness * ((PI * (k as f64 - 0.5) / n as f64).cos() + 1.) / 2.)
        .collect()
}

/// Chebyshev coefficients described by `control`.
pub fn cheby_coefficients(control: &[f64], method: ChebyshevMethod) -> Vec<f64> {
    match method {
        ChebyshevMethod::Direct => control.to_vec(),
        ChebyshevMethod::Interp => interp_coefficients(control),
    }
}

/// `c_j = 2/N sum_k f_k cos(pi j (2k - 1) / 2N)`, computed with one FFT.
fn interp_coefficients(control: &[f64]) -> Vec<f64> {
    let n = control.len();
    if n == 0 {
        return Vec::new();
    }

    let mut buffer: Vec<Complex<f64>> = control
        .iter()
        .step_by(2)
        .chain(control.iter().skip(1).step_by(2).rev())
        .map(|&val| Complex::new(val, 0.))
        .collect();

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let scale = 2. / n as f64;
    buffer
        .iter()
        .enumerate()
        .map(|(j, val)| {
            let phase = Complex::from_polar(1., -0.5 * PI * j as f64 / n as f64);
            scale * (val * phase).re
        })
        .collect()
}

/// Evaluate a Chebyshev series at the normalized depths `t`.
///
/// `t` is depth over thickness, so the layer covers `[0, 1]`. The result is
/// `sum_j c_j T_j(2t - 1) - c_0 / 2`, evaluated with the Clenshaw
/// recurrence. Values of `t` outside `[0, 1]` are extrapolated.
pub fn clenshaw(coefficients: &[f64], t: &[f64]) -> Vec<f64> {
    let Some((&c0, rest)) = coefficients.split_first() else {
        return vec![0.; t.len()];
    };
    t.iter()
        .map(|&t| {
            let y = 4. * t - 2.;
            let (mut d, mut dd) = (0f64, 0f64);
            for &c in rest.iter().rev() {
                (d, dd) = (y * d + (c - dd), d);
            }
            y * (0.5 * d) + (0.5 * c0 - dd)
        })
        .collect()
}

/// Profile defined by `control` at the normalized depths `t`.
///
/// An empty `control` gives a profile that is zero everywhere.
pub fn cheby_profile(control: &[f64], t: &[f64], method: ChebyshevMethod) -> Vec<f64> {
    if control.is_empty() {
        return vec![0.; t.len()];
    }
    clenshaw(&cheby_coefficients(control, method), t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn naive_coefficients(control: &[f64]) -> Vec<f64> {
        let n = control.len() as f64;
        (0..control.len())
            .map(|j| {
                let sum: f64 = control
                    .iter()
                    .enumerate()
                    .map(|(k, f)| {
                        let k = (k + 1) as f64;
                        f * (PI * j as f64 * (2. * k - 1.) / (2. * n)).cos()
                    })
                    .sum();
                2. / n * sum
            })
            .collect()
    }

    #[test]
    fn clenshaw_hand_computed() {
        // T0 + T2 at t = 0, where 2t - 1 = -1 and y = 4t - 2 = -2.
        let out = clenshaw(&[1., 0., 1.], &[0.]);
        assert_abs_diff_eq!(out[0], 1.5, epsilon = 1e-14);
        // Adding back c0 / 2 gives the full series T0(-1) + T2(-1) = 2.
        assert_abs_diff_eq!(out[0] + 0.5, 2., epsilon = 1e-14);

        let t = [0., 0.25, 0.5, 0.8, 1.];
        let out = clenshaw(&[2., 0., 1.], &t);
        for (&t, &val) in t.iter().zip(out.iter()) {
            let x: f64 = 2. * t - 1.;
            assert_abs_diff_eq!(val, 1. + (2. * x * x - 1.), epsilon = 1e-14);
        }
    }

    #[test]
    fn clenshaw_matches_cosine_form() {
        let coefficients = [0.3, -1.2, 0.7, 0.05, -0.4];
        let t: Vec<f64> = (0..=20).map(|i| i as f64 / 20.).collect();
        let out = clenshaw(&coefficients, &t);
        for (&t, &val) in t.iter().zip(out.iter()) {
            let theta = (2. * t - 1.).acos();
            let expected: f64 = coefficients
                .iter()
                .enumerate()
                .map(|(j, c)| c * (j as f64 * theta).cos())
                .sum::<f64>()
                - 0.5 * coefficients[0];
            assert_abs_diff_eq!(val, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn empty_control_is_zero() {
        let t = [-0.5, 0., 0.3, 1., 2.];
        for method in [ChebyshevMethod::Direct, ChebyshevMethod::Interp] {
            assert_eq!(cheby_profile(&[], &t, method), vec![0.; 5]);
        }
        assert_eq!(cheby_profile(&[], &[], ChebyshevMethod::Interp), Vec::<f64>::new());
    }

    #[test]
    fn constant_profile() {
        let t = [0., 0.1, 0.9, 1.];
        let out = cheby_profile(&[0.4; 6], &t, ChebyshevMethod::Interp);
        for val in out {
            assert_abs_diff_eq!(val, 0.4, epsilon = 1e-12);
        }
        let out = cheby_profile(&[0.8], &t, ChebyshevMethod::Direct);
        for val in out {
            assert_abs_diff_eq!(val, 0.4, epsilon = 1e-15);
        }
    }

    #[test]
    fn method_names() {
        assert_eq!("direct".parse::<ChebyshevMethod>(), Ok(ChebyshevMethod::Direct));
        assert_eq!("interp".parse::<ChebyshevMethod>(), Ok(ChebyshevMethod::Interp));
        assert_eq!(
            "spline".parse::<ChebyshevMethod>(),
            Err(ModelError::UnknownOption {
                what: "chebyshev method",
                value: "spline".to_string()
            })
        );
    }

    #[test]
    fn control_point_positions() {
        let z = control_points(2, 10.);
        assert_abs_diff_eq!(z[0], 5. * (0.25 * PI).cos() + 5., epsilon = 1e-12);
        assert_abs_diff_eq!(z[1], 5. - 5. * (0.25 * PI).cos(), epsilon = 1e-12);
        assert!(control_points(0, 1.).is_empty());
    }

    proptest! {
        #[test]
        fn fft_matches_naive_dct(control in prop::collection::vec(-5f64..5f64, 1..24)) {
            let fast = cheby_coefficients(&control, ChebyshevMethod::Interp);
            let slow = naive_coefficients(&control);
            prop_assert_eq!(fast.len(), slow.len());
            for (a, b) in fast.iter().zip(slow.iter()) {
                prop_assert!((a - b).abs() < 1e-10);
            }
        }

        #[test]
        fn clenshaw_is_series_minus_half_c0(
            coefficients in prop::collection::vec(-5f64..5f64, 1..12),
            t in 0f64..1f64,
        ) {
            let x = 2. * t - 1.;
            let mut series = 0.;
            let (mut t_prev, mut t_cur) = (1., x);
            for (j, c) in coefficients.iter().enumerate() {
                let tj = match j {
                    0 => 1.,
                    1 => x,
                    _ => {
                        (t_prev, t_cur) = (t_cur, 2. * x * t_cur - t_prev);
                        t_cur
                    }
                };
                series += c * tj;
            }
            let out = clenshaw(&coefficients, &[t])[0] + 0.5 * coefficients[0];
            prop_assert!((out - series).abs() < 1e-10 * (1. + series.abs()));
        }

        #[test]
        fn interp_reproduces_controls(control in prop::collection::vec(-5f64..5f64, 1..24)) {
            let thickness = 37.5;
            let t: Vec<f64> = control_points(control.len(), thickness)
                .iter()
                .map(|z| z / thickness)
                .collect();
            let out = cheby_profile(&control, &t, ChebyshevMethod::Interp);
            for (a, b) in out.iter().zip(control.iter()) {
                prop_assert!((a - b).abs() < 1e-9);
            }
        }
    }
}
