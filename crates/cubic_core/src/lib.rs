//! Closed-form roots of the cubic family u³ + k·u² + u + b = 0 and the parameter sweeps
//! used to build its bifurcation tables.
//!
//! Key components:
//! - **Cubic**: discriminant-driven solver (`solve`, `solve_with`, `solve_checked`).
//! - **Theta**: squared positive roots derived from the solver.
//! - **Sampling**: fixed-k, fixed-b and grid sweeps that flatten every returned value into a
//!   `SampleTable`, plus a stepped `SweepRunner` for progress reporting.
pub mod cubic;
pub mod error;
pub mod sampling;
pub mod theta;

pub use cubic::{
    classify, cubic_residual, discriminant, solve, solve_checked, solve_with, theta_residual,
    RootStructure, RootTriple, SolverSettings,
};
pub use error::CubicError;
pub use sampling::{
    run_plan, sweep_fixed_b, sweep_fixed_k, sweep_grid, Evaluator, SampleRow, SampleTable,
    SweepAxis, SweepKind, SweepPlan, SweepProgress, SweepRunner,
};
pub use theta::{theta_values, theta_values_complex};
