//! Pointwise root and theta evaluation.

use cubic_core::cubic::{classify, solve_with};
use cubic_core::theta::{theta_values_complex_with, theta_values_with};
use cubic_core::SolverSettings;
use js_sys::Float64Array;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

pub(crate) fn parse_settings(settings_val: JsValue) -> Result<SolverSettings, JsValue> {
    if settings_val.is_undefined() || settings_val.is_null() {
        return Ok(SolverSettings::default());
    }
    from_value(settings_val)
        .map_err(|e| JsValue::from_str(&format!("Invalid solver settings: {}", e)))
}

/// Roots of u³ + k·u² + u + b as `[re0, im0, re1, im1, re2, im2]`.
#[wasm_bindgen]
pub fn solve_cubic(k: f64, b: f64, settings_val: JsValue) -> Result<Float64Array, JsValue> {
    let settings = parse_settings(settings_val)?;
    let mut flat = Vec::with_capacity(6);
    for u in solve_with(k, b, &settings) {
        flat.push(u.re);
        flat.push(u.im);
    }
    Ok(Float64Array::from(flat.as_slice()))
}

#[wasm_bindgen]
pub fn discriminant(k: f64, b: f64) -> f64 {
    cubic_core::discriminant(k, b)
}

/// `"repeated"`, `"three_real"` or `"one_real_pair"`.
#[wasm_bindgen]
pub fn classify_roots(k: f64, b: f64, settings_val: JsValue) -> Result<JsValue, JsValue> {
    let settings = parse_settings(settings_val)?;
    to_value(&classify(k, b, &settings))
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

#[wasm_bindgen]
pub fn theta_values(k: f64, b: f64, settings_val: JsValue) -> Result<Float64Array, JsValue> {
    let settings = parse_settings(settings_val)?;
    let values = theta_values_with(k, b, &settings);
    Ok(Float64Array::from(values.as_slice()))
}

/// Complex theta values, interleaved like [`solve_cubic`].
#[wasm_bindgen]
pub fn theta_values_complex(k: f64, b: f64, settings_val: JsValue) -> Result<Float64Array, JsValue> {
    let settings = parse_settings(settings_val)?;
    let flat: Vec<f64> = theta_values_complex_with(k, b, &settings)
        .into_iter()
        .flat_map(|t| [t.re, t.im])
        .collect();
    Ok(Float64Array::from(flat.as_slice()))
}
