//! Error conditions reported by the checked solver and the samplers.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CubicError {
    /// A sweep axis that cannot produce sample points.
    #[error("Invalid {axis} range: {reason}")]
    InvalidRange { axis: &'static str, reason: String },

    #[error("Coefficients must be finite (k = {k}, b = {b}).")]
    NonFiniteCoefficient { k: f64, b: f64 },

    /// Repeated-root case with k² = 3 away from the triple-root points, where the
    /// closed form divides by zero.
    #[error("Degenerate repeated-root case at k = {k}, b = {b}: k^2 = 3 off the triple-root points.")]
    Degenerate { k: f64, b: f64 },

    /// The closed form evaluated to NaN/Inf for finite coefficients.
    #[error("Closed form produced non-finite roots at k = {k}, b = {b}.")]
    NonFiniteRoots { k: f64, b: f64 },
}
