//! Sweep bindings and the stepped sweep runner.

use crate::roots::parse_settings;
use cubic_core::sampling::{run_plan, Evaluator, SweepAxis, SweepPlan, SweepRunner};
use cubic_core::SolverSettings;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

fn parse_axis(axis_val: JsValue, axis: &str) -> Result<SweepAxis, JsValue> {
    from_value(axis_val).map_err(|e| JsValue::from_str(&format!("Invalid {} axis: {}", axis, e)))
}

fn parse_evaluator(name: &str) -> Result<Evaluator, JsValue> {
    Evaluator::from_name(name).map_err(|e| JsValue::from_str(&format!("{}", e)))
}

fn run(plan: SweepPlan, evaluator: &str, settings: SolverSettings) -> Result<JsValue, JsValue> {
    let evaluator = parse_evaluator(evaluator)?;
    let table = run_plan(&plan, evaluator, &settings)
        .map_err(|e| JsValue::from_str(&format!("Sweep failed: {}", e)))?;
    to_value(&table).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Holds `k` fixed and sweeps `b` over `b_axis` (`{ min, max, samples }`).
#[wasm_bindgen]
pub fn sample_fixed_k(
    k: f64,
    b_axis_val: JsValue,
    evaluator: &str,
    settings_val: JsValue,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let b_axis = parse_axis(b_axis_val, "b")?;
    let settings = parse_settings(settings_val)?;
    run(SweepPlan::FixedK { k, b_axis }, evaluator, settings)
}

#[wasm_bindgen]
pub fn sample_fixed_b(
    b: f64,
    k_axis_val: JsValue,
    evaluator: &str,
    settings_val: JsValue,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let k_axis = parse_axis(k_axis_val, "k")?;
    let settings = parse_settings(settings_val)?;
    run(SweepPlan::FixedB { b, k_axis }, evaluator, settings)
}

#[wasm_bindgen]
pub fn sample_grid(
    k_axis_val: JsValue,
    b_axis_val: JsValue,
    evaluator: &str,
    settings_val: JsValue,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let k_axis = parse_axis(k_axis_val, "k")?;
    let b_axis = parse_axis(b_axis_val, "b")?;
    let settings = parse_settings(settings_val)?;
    run(SweepPlan::Grid { k_axis, b_axis }, evaluator, settings)
}

/// WASM-exported runner for stepped sweeps.
/// Evaluates large grids in batches so the caller can report progress.
#[wasm_bindgen]
pub struct WasmSweepRunner {
    runner: Option<SweepRunner>,
}

#[wasm_bindgen]
impl WasmSweepRunner {
    /// `plan_val` is a tagged plan, e.g. `{ mode: "grid", k_axis: {...}, b_axis: {...} }`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        plan_val: JsValue,
        evaluator: &str,
        settings_val: JsValue,
    ) -> Result<WasmSweepRunner, JsValue> {
        console_error_panic_hook::set_once();

        let plan: SweepPlan = from_value(plan_val)
            .map_err(|e| JsValue::from_str(&format!("Invalid sweep plan: {}", e)))?;
        let evaluator = parse_evaluator(evaluator)?;
        let settings = parse_settings(settings_val)?;

        let runner = SweepRunner::new(plan, evaluator, settings)
            .map_err(|e| JsValue::from_str(&format!("Sweep init failed: {}", e)))?;

        Ok(WasmSweepRunner {
            runner: Some(runner),
        })
    }

    pub fn is_done(&self) -> bool {
        self.runner.as_ref().map_or(true, |runner| runner.is_done())
    }

    /// Evaluate a batch of sample points and return progress.
    pub fn run_steps(&mut self, batch_size: u32) -> Result<JsValue, JsValue> {
        let runner = self
            .runner
            .as_mut()
            .ok_or_else(|| JsValue::from_str("Runner not initialized"))?;

        let progress = runner
            .run_steps(batch_size as usize)
            .map_err(|e| JsValue::from_str(&format!("Sweep step failed: {}", e)))?;

        to_value(&progress).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn get_progress(&self) -> Result<JsValue, JsValue> {
        let runner = self
            .runner
            .as_ref()
            .ok_or_else(|| JsValue::from_str("Runner not initialized"))?;

        to_value(&runner.progress())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Take the sampled table. The runner cannot be used afterwards.
    pub fn get_result(&mut self) -> Result<JsValue, JsValue> {
        let runner = self
            .runner
            .take()
            .ok_or_else(|| JsValue::from_str("Runner not initialized"))?;

        let table = runner.take_result();

        to_value(&table).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}
