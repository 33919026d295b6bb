//! wasm-bindgen bridge over `cubic_core`.
//!
//! Root evaluation returns flat `Float64Array`s; sweeps return serde-serialized
//! `SampleTable`s whose rows carry `k`, `b`, `u_real` and `u_complex`.

mod roots;
mod sweep;

pub use roots::{classify_roots, discriminant, solve_cubic, theta_values, theta_values_complex};
pub use sweep::{sample_fixed_b, sample_fixed_k, sample_grid, WasmSweepRunner};
