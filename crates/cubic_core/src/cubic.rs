//! Closed-form roots of u³ + k·u² + u + b = 0.
//!
//! The branch is picked from the sign of the discriminant: the trigonometric form for three
//! distinct real roots, Cardano's formula for one real root plus a conjugate pair, and the
//! explicit repeated-root expressions when the discriminant vanishes.

use crate::error::CubicError;
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// |k² − 3| below this is treated as a zero denominator by [`solve_checked`].
const DEGENERATE_EPS: f64 = 1e-12;

/// Controls how the branch selection compares against zero and the triple-root points.
///
/// Both tolerances default to `0.0`, i.e. exact floating-point equality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// |Δ| at or below this value selects the repeated-root branch.
    pub discriminant_tolerance: f64,
    /// Per-coordinate distance at which (k, b) counts as ±(√3, √3/9).
    pub special_point_tolerance: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            discriminant_tolerance: 0.0,
            special_point_tolerance: 0.0,
        }
    }
}

/// Root structure implied by the sign of the discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootStructure {
    /// Δ = 0: a double or triple root, all roots real.
    Repeated,
    /// Δ > 0: three distinct real roots.
    ThreeReal,
    /// Δ < 0: one real root and a complex-conjugate pair.
    OneRealPair,
}

/// The three roots of one cubic, in the order the closed form produces them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootTriple(pub [Complex<f64>; 3]);

impl RootTriple {
    pub fn roots(&self) -> &[Complex<f64>; 3] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Complex<f64>> {
        self.0.iter()
    }

    pub fn sum(&self) -> Complex<f64> {
        self.0[0] + self.0[1] + self.0[2]
    }

    pub fn product(&self) -> Complex<f64> {
        self.0[0] * self.0[1] * self.0[2]
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|u| u.re.is_finite() && u.im.is_finite())
    }
}

impl IntoIterator for RootTriple {
    type Item = Complex<f64>;
    type IntoIter = std::array::IntoIter<Complex<f64>, 3>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a RootTriple {
    type Item = &'a Complex<f64>;
    type IntoIter = std::slice::Iter<'a, Complex<f64>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Δ(k, b) = 18kb + k² − 4 − 4k³b − 27b².
pub fn discriminant(k: f64, b: f64) -> f64 {
    18.0 * k * b + k * k - 4.0 - 4.0 * k * k * k * b - 27.0 * b * b
}

pub fn classify(k: f64, b: f64, settings: &SolverSettings) -> RootStructure {
    let delta = discriminant(k, b);
    if delta.abs() <= settings.discriminant_tolerance {
        RootStructure::Repeated
    } else if delta > 0.0 {
        RootStructure::ThreeReal
    } else {
        // NaN discriminants fall through to Cardano and propagate.
        RootStructure::OneRealPair
    }
}

/// Roots with exact branch selection. Never fails: non-finite input and the k² = 3
/// degeneracy propagate as NaN/Inf components.
pub fn solve(k: f64, b: f64) -> RootTriple {
    solve_with(k, b, &SolverSettings::default())
}

pub fn solve_with(k: f64, b: f64, settings: &SolverSettings) -> RootTriple {
    match classify(k, b, settings) {
        RootStructure::Repeated => repeated_roots(k, b, settings),
        RootStructure::ThreeReal => {
            trigonometric_roots(k, b, settings.discriminant_tolerance > 0.0)
        }
        RootStructure::OneRealPair => cardano_roots(k, b),
    }
}

/// Like [`solve_with`], but rejects inputs where the closed form is undefined, including
/// points next to Δ = 0 where rounding pushes the arccos argument past ±1.
pub fn solve_checked(k: f64, b: f64, settings: &SolverSettings) -> Result<RootTriple, CubicError> {
    if !k.is_finite() || !b.is_finite() {
        return Err(CubicError::NonFiniteCoefficient { k, b });
    }
    if classify(k, b, settings) == RootStructure::Repeated
        && !is_triple_point(k, b, settings.special_point_tolerance)
        && (k * k - 3.0).abs() <= DEGENERATE_EPS
    {
        return Err(CubicError::Degenerate { k, b });
    }
    let roots = solve_with(k, b, settings);
    if !roots.is_finite() {
        return Err(CubicError::NonFiniteRoots { k, b });
    }
    Ok(roots)
}

/// Evaluates u³ + k·u² + u + b.
pub fn cubic_residual(k: f64, b: f64, u: Complex<f64>) -> Complex<f64> {
    u * u * u + u * u * k + u + b
}

/// Evaluates t^(3/2) + k·t + t^(1/2) + b, which vanishes at t = u² for every root u > 0.
pub fn theta_residual(k: f64, b: f64, t: Complex<f64>) -> Complex<f64> {
    t.powf(1.5) + t * k + t.sqrt() + b
}

fn is_triple_point(k: f64, b: f64, tolerance: f64) -> bool {
    let near = |x: f64, target: f64| (x - target).abs() <= tolerance;
    let b_star = SQRT_3 / 9.0;
    (near(k, SQRT_3) && near(b, b_star)) || (near(k, -SQRT_3) && near(b, -b_star))
}

fn repeated_roots(k: f64, b: f64, settings: &SolverSettings) -> RootTriple {
    let shift = -k / 3.0;
    if is_triple_point(k, b, settings.special_point_tolerance) {
        let u = Complex::new(shift, 0.0);
        return RootTriple([u, u, u]);
    }

    let a = 2.0 * k * k * k - 9.0 * k + 27.0 * b;
    let simple = a / (9.0 - 3.0 * k * k) + shift;
    let double = a / (6.0 * k * k - 18.0) + shift;
    RootTriple([
        Complex::new(simple, 0.0),
        Complex::new(double, 0.0),
        Complex::new(double, 0.0),
    ])
}

/// With `clamp_ratio` the arccos argument is clamped to [−1, 1]; otherwise a ratio pushed
/// past ±1 by rounding yields NaN roots.
fn trigonometric_roots(k: f64, b: f64, clamp_ratio: bool) -> RootTriple {
    let shift = -k / 3.0;
    let amplitude = (2.0 / 3.0) * (k * k - 3.0).sqrt();
    let mut ratio = (2.0 * k * k * k - 9.0 * k + 27.0 * b) / (18.0 - 6.0 * k * k)
        * (9.0 / (k * k - 3.0)).sqrt();
    if clamp_ratio {
        ratio = ratio.clamp(-1.0, 1.0);
    }
    let angle = ratio.acos() / 3.0;

    let root = |phase: f64| Complex::new(amplitude * (angle + phase).cos() + shift, 0.0);
    RootTriple([root(0.0), root(2.0 * PI / 3.0), root(4.0 * PI / 3.0)])
}

fn cardano_roots(k: f64, b: f64) -> RootTriple {
    let shift = -k / 3.0;
    let a1 = -(54.0 * k * k * k - 243.0 * k + 729.0 * b);
    let a2 = (-19683.0 * discriminant(k, b)).sqrt();
    let plus = (a1 + a2).cbrt();
    let minus = (a1 - a2).cbrt();
    let cbrt_4 = 4.0_f64.cbrt();

    let real = shift + cbrt_4 / 18.0 * (plus + minus);
    let pair_re = shift - cbrt_4 / 36.0 * (plus + minus);
    let pair_im = SQRT_3 * cbrt_4 / 36.0 * (plus - minus);
    RootTriple([
        Complex::new(real, 0.0),
        Complex::new(pair_re, pair_im),
        Complex::new(pair_re, -pair_im),
    ])
}
