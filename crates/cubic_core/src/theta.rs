//! Theta values derived from the roots with positive real part.

use crate::cubic::{solve_with, SolverSettings};
use num_complex::Complex;

/// Squares of the real parts of the roots with `re > 0`, in solver order.
pub fn theta_values(k: f64, b: f64) -> Vec<f64> {
    theta_values_with(k, b, &SolverSettings::default())
}

pub fn theta_values_with(k: f64, b: f64, settings: &SolverSettings) -> Vec<f64> {
    solve_with(k, b, settings)
        .into_iter()
        .filter(|u| u.re > 0.0)
        .map(|u| u.re * u.re)
        .collect()
}

/// Same filter as [`theta_values`], but squares the complex root itself so a conjugate
/// pair keeps its imaginary part.
pub fn theta_values_complex(k: f64, b: f64) -> Vec<Complex<f64>> {
    theta_values_complex_with(k, b, &SolverSettings::default())
}

pub fn theta_values_complex_with(k: f64, b: f64, settings: &SolverSettings) -> Vec<Complex<f64>> {
    solve_with(k, b, settings)
        .into_iter()
        .filter(|u| u.re > 0.0)
        .map(|u| u * u)
        .collect()
}
