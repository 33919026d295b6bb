//! Parameter sweeps over (k, b).
//!
//! Every sampler evaluates a `(k, b) -> values` function at each sample point and expands
//! each returned value into one [`SampleRow`]. The function can return roots
//! (`Complex<f64>`) or plain reals; reals land in the table with a zero imaginary part.

use crate::cubic::{solve_with, SolverSettings};
use crate::error::CubicError;
use crate::theta::{theta_values_complex_with, theta_values_with};
use anyhow::{bail, Result};
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Grids below this many points are evaluated serially even with `rayon` enabled.
#[cfg(feature = "rayon")]
const PARALLEL_THRESHOLD: usize = 4096;

/// Evenly spaced samples over `[min, max]`, both ends included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepAxis {
    pub min: f64,
    pub max: f64,
    pub samples: usize,
}

impl Default for SweepAxis {
    fn default() -> Self {
        Self {
            min: -1.0,
            max: 1.0,
            samples: 100,
        }
    }
}

impl SweepAxis {
    pub fn new(min: f64, max: f64, samples: usize) -> Self {
        Self { min, max, samples }
    }

    pub fn validate(&self, axis: &'static str) -> Result<(), CubicError> {
        if self.samples == 0 {
            return Err(CubicError::InvalidRange {
                axis,
                reason: "at least one sample is required".to_string(),
            });
        }
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(CubicError::InvalidRange {
                axis,
                reason: format!("bounds must be finite (min = {}, max = {})", self.min, self.max),
            });
        }
        Ok(())
    }

    /// Sample values; a single sample sits at `min`, and the last of several equals `max`.
    pub fn values(&self) -> Vec<f64> {
        match self.samples {
            0 => Vec::new(),
            1 => vec![self.min],
            n => {
                let step = (self.max - self.min) / (n - 1) as f64;
                let mut values: Vec<f64> = (0..n).map(|i| self.min + step * i as f64).collect();
                values[n - 1] = self.max;
                values
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepKind {
    FixedK,
    FixedB,
    Grid,
}

/// One value returned at one sample point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRow {
    pub k: f64,
    pub b: f64,
    pub u_real: f64,
    pub u_complex: f64,
}

impl SampleRow {
    /// A row is a real solution when its imaginary part is exactly zero.
    pub fn is_real(&self) -> bool {
        self.u_complex == 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleTable {
    pub kind: SweepKind,
    pub rows: Vec<SampleRow>,
}

impl SampleTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SampleRow> {
        self.rows.iter()
    }

    pub fn real_rows(&self) -> impl Iterator<Item = &SampleRow> + '_ {
        self.rows.iter().filter(|row| row.is_real())
    }

    pub fn complex_rows(&self) -> impl Iterator<Item = &SampleRow> + '_ {
        self.rows.iter().filter(|row| !row.is_real())
    }

    /// Rows whose `k` equals `k` exactly, as a fixed-k slice.
    pub fn at_k(&self, k: f64) -> Result<SampleTable> {
        let rows: Vec<SampleRow> = self.rows.iter().filter(|row| row.k == k).copied().collect();
        if rows.is_empty() {
            bail!("The value of k = {} is not in the table.", k);
        }
        Ok(SampleTable {
            kind: SweepKind::FixedK,
            rows,
        })
    }

    /// Rows whose `b` equals `b` exactly, as a fixed-b slice.
    pub fn at_b(&self, b: f64) -> Result<SampleTable> {
        let rows: Vec<SampleRow> = self.rows.iter().filter(|row| row.b == b).copied().collect();
        if rows.is_empty() {
            bail!("The value of b = {} is not in the table.", b);
        }
        Ok(SampleTable {
            kind: SweepKind::FixedB,
            rows,
        })
    }
}

/// Built-in functions a host can select by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Evaluator {
    /// All three roots.
    #[default]
    Roots,
    /// Squared real parts of the roots with positive real part.
    Theta,
    /// Squared roots with positive real part, conjugate pairs included.
    ThetaComplex,
}

impl Evaluator {
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "roots" | "u" => Ok(Evaluator::Roots),
            "theta" => Ok(Evaluator::Theta),
            "theta_complex" => Ok(Evaluator::ThetaComplex),
            _ => bail!("Unknown evaluator: {}", name),
        }
    }

    pub fn evaluate(self, k: f64, b: f64, settings: &SolverSettings) -> Vec<Complex<f64>> {
        match self {
            Evaluator::Roots => solve_with(k, b, settings).into_iter().collect(),
            Evaluator::Theta => theta_values_with(k, b, settings)
                .into_iter()
                .map(Complex::from)
                .collect(),
            Evaluator::ThetaComplex => theta_values_complex_with(k, b, settings),
        }
    }
}

/// Which points to sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SweepPlan {
    FixedK { k: f64, b_axis: SweepAxis },
    FixedB { b: f64, k_axis: SweepAxis },
    Grid { k_axis: SweepAxis, b_axis: SweepAxis },
}

impl SweepPlan {
    pub fn kind(&self) -> SweepKind {
        match self {
            SweepPlan::FixedK { .. } => SweepKind::FixedK,
            SweepPlan::FixedB { .. } => SweepKind::FixedB,
            SweepPlan::Grid { .. } => SweepKind::Grid,
        }
    }

    /// Validated (k, b) sample points. Grids iterate `b` in the outer loop.
    pub fn points(&self) -> Result<Vec<(f64, f64)>> {
        let points = match *self {
            SweepPlan::FixedK { k, b_axis } => {
                b_axis.validate("b")?;
                b_axis.values().into_iter().map(|b| (k, b)).collect()
            }
            SweepPlan::FixedB { b, k_axis } => {
                k_axis.validate("k")?;
                k_axis.values().into_iter().map(|k| (k, b)).collect()
            }
            SweepPlan::Grid { k_axis, b_axis } => {
                k_axis.validate("k")?;
                b_axis.validate("b")?;
                let ks = k_axis.values();
                let bs = b_axis.values();
                let mut points = Vec::with_capacity(ks.len() * bs.len());
                for &b in &bs {
                    for &k in &ks {
                        points.push((k, b));
                    }
                }
                points
            }
        };
        Ok(points)
    }
}

/// Holds `k` fixed and sweeps `b`.
pub fn sweep_fixed_k<F, I>(k: f64, b_axis: &SweepAxis, f: F) -> Result<SampleTable>
where
    F: Fn(f64, f64) -> I,
    I: IntoIterator,
    I::Item: Into<Complex<f64>>,
{
    let plan = SweepPlan::FixedK { k, b_axis: *b_axis };
    sample_plan(&plan, f)
}

/// Holds `b` fixed and sweeps `k` over its own range.
pub fn sweep_fixed_b<F, I>(b: f64, k_axis: &SweepAxis, f: F) -> Result<SampleTable>
where
    F: Fn(f64, f64) -> I,
    I: IntoIterator,
    I::Item: Into<Complex<f64>>,
{
    let plan = SweepPlan::FixedB { b, k_axis: *k_axis };
    sample_plan(&plan, f)
}

/// Samples the full `k_axis × b_axis` product.
pub fn sweep_grid<F, I>(k_axis: &SweepAxis, b_axis: &SweepAxis, f: F) -> Result<SampleTable>
where
    F: Fn(f64, f64) -> I,
    I: IntoIterator,
    I::Item: Into<Complex<f64>>,
{
    let plan = SweepPlan::Grid {
        k_axis: *k_axis,
        b_axis: *b_axis,
    };
    sample_plan(&plan, f)
}

/// Parallel variant of [`sweep_grid`]; rows come out in the same order.
#[cfg(feature = "rayon")]
pub fn sweep_grid_par<F, I>(k_axis: &SweepAxis, b_axis: &SweepAxis, f: F) -> Result<SampleTable>
where
    F: Fn(f64, f64) -> I + Sync,
    I: IntoIterator,
    I::Item: Into<Complex<f64>>,
{
    let plan = SweepPlan::Grid {
        k_axis: *k_axis,
        b_axis: *b_axis,
    };
    let points = plan.points()?;
    if points.len() < PARALLEL_THRESHOLD {
        return Ok(sample_points(plan.kind(), &points, f));
    }

    let chunks: Vec<Vec<SampleRow>> = points
        .par_iter()
        .map(|&(k, b)| {
            let mut rows = Vec::with_capacity(3);
            expand_point(k, b, f(k, b), &mut rows);
            rows
        })
        .collect();
    let rows: Vec<SampleRow> = chunks.into_iter().flatten().collect();
    debug!(
        kind = ?SweepKind::Grid,
        points = points.len(),
        rows = rows.len(),
        "sampled sweep in parallel"
    );
    Ok(SampleTable {
        kind: SweepKind::Grid,
        rows,
    })
}

/// Runs a plan with one of the built-in evaluators.
pub fn run_plan(
    plan: &SweepPlan,
    evaluator: Evaluator,
    settings: &SolverSettings,
) -> Result<SampleTable> {
    sample_plan(plan, |k, b| evaluator.evaluate(k, b, settings))
}

fn sample_plan<F, I>(plan: &SweepPlan, f: F) -> Result<SampleTable>
where
    F: Fn(f64, f64) -> I,
    I: IntoIterator,
    I::Item: Into<Complex<f64>>,
{
    let points = plan.points()?;
    Ok(sample_points(plan.kind(), &points, f))
}

fn sample_points<F, I>(kind: SweepKind, points: &[(f64, f64)], f: F) -> SampleTable
where
    F: Fn(f64, f64) -> I,
    I: IntoIterator,
    I::Item: Into<Complex<f64>>,
{
    let mut rows = Vec::with_capacity(points.len() * 3);
    for &(k, b) in points {
        expand_point(k, b, f(k, b), &mut rows);
    }
    debug!(kind = ?kind, points = points.len(), rows = rows.len(), "sampled sweep");
    SampleTable { kind, rows }
}

fn expand_point<I>(k: f64, b: f64, values: I, rows: &mut Vec<SampleRow>)
where
    I: IntoIterator,
    I::Item: Into<Complex<f64>>,
{
    for value in values {
        let u: Complex<f64> = value.into();
        rows.push(SampleRow {
            k,
            b,
            u_real: u.re,
            u_complex: u.im,
        });
    }
}

/// Progress report for a stepped sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepProgress {
    pub done: bool,
    pub evaluated: usize,
    pub total: usize,
    pub rows: usize,
}

/// Evaluates a plan a batch of points at a time so hosts can report progress.
#[derive(Debug, Clone)]
pub struct SweepRunner {
    kind: SweepKind,
    points: Vec<(f64, f64)>,
    evaluator: Evaluator,
    settings: SolverSettings,
    next: usize,
    rows: Vec<SampleRow>,
}

impl SweepRunner {
    pub fn new(plan: SweepPlan, evaluator: Evaluator, settings: SolverSettings) -> Result<Self> {
        let points = plan.points()?;
        debug!(kind = ?plan.kind(), points = points.len(), ?evaluator, "sweep runner created");
        Ok(Self {
            kind: plan.kind(),
            rows: Vec::with_capacity(points.len() * 3),
            points,
            evaluator,
            settings,
            next: 0,
        })
    }

    pub fn is_done(&self) -> bool {
        self.next >= self.points.len()
    }

    pub fn progress(&self) -> SweepProgress {
        SweepProgress {
            done: self.is_done(),
            evaluated: self.next,
            total: self.points.len(),
            rows: self.rows.len(),
        }
    }

    /// Evaluates up to `batch_size` more points.
    pub fn run_steps(&mut self, batch_size: usize) -> Result<SweepProgress> {
        if batch_size == 0 {
            bail!("batch_size must be at least 1.");
        }
        let end = (self.next + batch_size).min(self.points.len());
        for &(k, b) in &self.points[self.next..end] {
            let values = self.evaluator.evaluate(k, b, &self.settings);
            expand_point(k, b, values, &mut self.rows);
        }
        self.next = end;
        trace!(evaluated = self.next, total = self.points.len(), "sweep batch finished");
        Ok(self.progress())
    }

    /// Returns the rows gathered so far.
    pub fn take_result(self) -> SampleTable {
        SampleTable {
            kind: self.kind,
            rows: self.rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        run_plan, sweep_fixed_b, sweep_fixed_k, sweep_grid, Evaluator, SampleRow, SweepAxis,
        SweepKind, SweepPlan, SweepRunner,
    };
    use crate::cubic::{solve, SolverSettings};
    use crate::error::CubicError;
    use crate::theta::theta_values;
    use num_complex::Complex;

    fn assert_err_contains<T: std::fmt::Debug>(result: anyhow::Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    fn distinct(values: impl Iterator<Item = f64>) -> Vec<f64> {
        let mut out: Vec<f64> = Vec::new();
        for value in values {
            if out.last() != Some(&value) {
                out.push(value);
            }
        }
        out
    }

    #[test]
    fn axis_values_include_both_endpoints() {
        let axis = SweepAxis::new(-1.0, 1.0, 3);
        assert_eq!(axis.values(), vec![-1.0, 0.0, 1.0]);

        let axis = SweepAxis::new(-0.3, 2.7, 17);
        let values = axis.values();
        assert_eq!(values.len(), 17);
        assert_eq!(values[0], -0.3);
        assert_eq!(values[16], 2.7);
    }

    #[test]
    fn single_sample_sits_at_min() {
        assert_eq!(SweepAxis::new(0.25, 4.0, 1).values(), vec![0.25]);
    }

    #[test]
    fn descending_axis_is_allowed() {
        assert_eq!(SweepAxis::new(1.0, -1.0, 3).values(), vec![1.0, 0.0, -1.0]);
    }

    #[test]
    fn fixed_k_sweep_has_three_rows_per_point() {
        let table = sweep_fixed_k(1.0, &SweepAxis::new(-1.0, 1.0, 3), solve).expect("sweep");
        assert_eq!(table.kind, SweepKind::FixedK);
        assert_eq!(table.len(), 9);
        assert_eq!(distinct(table.iter().map(|row| row.b)), vec![-1.0, 0.0, 1.0]);
        assert!(table.iter().all(|row| row.k == 1.0));
    }

    #[test]
    fn fixed_k_rows_follow_solver_output() {
        let table = sweep_fixed_k(4.0, &SweepAxis::new(-0.7, 1.0, 2), solve).expect("sweep");
        let expected: Vec<SampleRow> = [(4.0, -0.7), (4.0, 1.0)]
            .iter()
            .flat_map(|&(k, b)| {
                solve(k, b).into_iter().map(move |u| SampleRow {
                    k,
                    b,
                    u_real: u.re,
                    u_complex: u.im,
                })
            })
            .collect();
        assert_eq!(table.rows, expected);
    }

    #[test]
    fn fixed_b_sweep_uses_its_own_k_range() {
        let table = sweep_fixed_b(0.5, &SweepAxis::new(-4.0, 4.0, 5), solve).expect("sweep");
        assert_eq!(table.kind, SweepKind::FixedB);
        assert_eq!(table.len(), 15);
        assert_eq!(
            distinct(table.iter().map(|row| row.k)),
            vec![-4.0, -2.0, 0.0, 2.0, 4.0]
        );
        assert!(table.iter().all(|row| row.b == 0.5));
    }

    #[test]
    fn grid_sweep_covers_the_cartesian_product() {
        let n = 6;
        let k_axis = SweepAxis::new(-3.0, 3.0, n);
        let b_axis = SweepAxis::new(-1.0, 1.0, n);
        let table = sweep_grid(&k_axis, &b_axis, solve).expect("grid");
        assert_eq!(table.kind, SweepKind::Grid);
        assert_eq!(table.len(), 3 * n * n);

        // b is the outer loop, k the inner one.
        assert_eq!(table.rows[0].k, -3.0);
        assert_eq!(table.rows[0].b, -1.0);
        assert_eq!(table.rows[3].k, k_axis.values()[1]);
        assert_eq!(table.rows[3].b, -1.0);
        let last = table.rows.last().expect("rows");
        assert_eq!((last.k, last.b), (3.0, 1.0));
    }

    #[test]
    fn grid_sweep_allows_distinct_sample_counts() {
        let table = sweep_grid(
            &SweepAxis::new(-2.0, 2.0, 4),
            &SweepAxis::new(-1.0, 1.0, 7),
            solve,
        )
        .expect("grid");
        assert_eq!(table.len(), 3 * 4 * 7);
    }

    #[test]
    fn theta_sweep_expands_variable_length_output() {
        let axis = SweepAxis::new(-1.0, 1.0, 11);
        let table = sweep_fixed_k(-3.0, &axis, theta_values).expect("sweep");
        let expected: usize = axis.values().iter().map(|&b| theta_values(-3.0, b).len()).sum();
        assert_eq!(table.len(), expected);
        assert!(table.iter().all(|row| row.u_complex == 0.0 && row.u_real >= 0.0));
    }

    #[test]
    fn origin_theta_contributes_no_rows() {
        let table = sweep_fixed_k(0.0, &SweepAxis::new(0.0, 0.0, 1), theta_values).expect("sweep");
        assert!(table.is_empty());
    }

    #[test]
    fn closures_can_be_sampled() {
        let table = sweep_fixed_k(2.0, &SweepAxis::new(0.0, 1.0, 4), |k, b| {
            vec![Complex::new(k, b)]
        })
        .expect("sweep");
        assert_eq!(table.len(), 4);
        assert_eq!(table.rows[3].u_real, 2.0);
        assert_eq!(table.rows[3].u_complex, 1.0);
    }

    #[test]
    fn non_finite_values_are_kept() {
        let table = sweep_fixed_k(0.0, &SweepAxis::new(0.0, 1.0, 2), |_, _| vec![f64::NAN])
            .expect("sweep");
        assert_eq!(table.len(), 2);
        assert!(table.iter().all(|row| row.u_real.is_nan()));
    }

    #[test]
    fn invalid_axes_fail_fast() {
        assert_err_contains(
            sweep_fixed_k(1.0, &SweepAxis::new(-1.0, 1.0, 0), solve),
            "Invalid b range",
        );
        assert_err_contains(
            sweep_fixed_b(1.0, &SweepAxis::new(f64::NAN, 1.0, 4), solve),
            "Invalid k range",
        );
        let err = sweep_grid(
            &SweepAxis::new(-1.0, 1.0, 3),
            &SweepAxis::new(-1.0, f64::INFINITY, 3),
            solve,
        )
        .expect_err("expected error");
        let typed = err.downcast_ref::<CubicError>().expect("typed error");
        assert!(matches!(typed, CubicError::InvalidRange { axis: "b", .. }));
    }

    #[test]
    fn real_and_complex_rows_partition_the_table() {
        let table = sweep_fixed_k(1.0, &SweepAxis::new(-1.0, 1.0, 3), solve).expect("sweep");
        let real = table.real_rows().count();
        let complex = table.complex_rows().count();
        assert_eq!(real + complex, table.len());
        // k = 1 gives Δ < 0 for every b here: one real root per point.
        assert_eq!(real, 3);
        assert!(table.complex_rows().all(|row| row.u_complex != 0.0));
    }

    #[test]
    fn fixed_slices_select_exact_values() {
        let k_axis = SweepAxis::new(-2.0, 2.0, 5);
        let b_axis = SweepAxis::new(-1.0, 1.0, 3);
        let table = sweep_grid(&k_axis, &b_axis, solve).expect("grid");

        let slice = table.at_k(0.0).expect("k = 0 present");
        assert_eq!(slice.kind, SweepKind::FixedK);
        assert_eq!(slice.len(), 9);

        let slice = table.at_b(1.0).expect("b = 1 present");
        assert_eq!(slice.kind, SweepKind::FixedB);
        assert_eq!(slice.len(), 15);

        assert_err_contains(table.at_k(0.5), "k = 0.5 is not in the table");
        assert_err_contains(table.at_b(0.5), "b = 0.5 is not in the table");
    }

    #[test]
    fn evaluator_names_resolve() {
        assert_eq!(Evaluator::from_name("roots").expect("roots"), Evaluator::Roots);
        assert_eq!(Evaluator::from_name("theta").expect("theta"), Evaluator::Theta);
        assert_eq!(
            Evaluator::from_name("theta_complex").expect("theta_complex"),
            Evaluator::ThetaComplex
        );
        assert_err_contains(Evaluator::from_name("phi"), "Unknown evaluator");
    }

    #[test]
    fn run_plan_matches_direct_sweep() {
        let axis = SweepAxis::new(-1.0, 1.0, 9);
        let plan = SweepPlan::FixedK { k: -3.0, b_axis: axis };
        let settings = SolverSettings::default();

        let via_plan = run_plan(&plan, Evaluator::Theta, &settings).expect("plan");
        let direct = sweep_fixed_k(-3.0, &axis, theta_values).expect("sweep");
        assert_eq!(via_plan, direct);

        let via_plan = run_plan(&plan, Evaluator::Roots, &settings).expect("plan");
        assert_eq!(via_plan.len(), 27);
    }

    #[test]
    fn runner_matches_one_shot_sweep() {
        let plan = SweepPlan::Grid {
            k_axis: SweepAxis::new(-3.0, 3.0, 5),
            b_axis: SweepAxis::new(-1.0, 1.0, 4),
        };
        let settings = SolverSettings::default();
        let mut runner = SweepRunner::new(plan, Evaluator::Roots, settings).expect("runner");
        assert!(!runner.is_done());

        let progress = runner.run_steps(7).expect("batch");
        assert_eq!(progress.evaluated, 7);
        assert_eq!(progress.total, 20);
        assert_eq!(progress.rows, 21);
        assert!(!progress.done);

        while !runner.is_done() {
            runner.run_steps(7).expect("batch");
        }
        let progress = runner.progress();
        assert!(progress.done);
        assert_eq!(progress.evaluated, 20);

        let table = runner.take_result();
        assert_eq!(table, run_plan(&plan, Evaluator::Roots, &settings).expect("plan"));
    }

    #[test]
    fn runner_rejects_empty_batches_and_bad_plans() {
        let plan = SweepPlan::FixedB {
            b: 0.0,
            k_axis: SweepAxis::new(-1.0, 1.0, 2),
        };
        let mut runner =
            SweepRunner::new(plan, Evaluator::Roots, SolverSettings::default()).expect("runner");
        assert_err_contains(runner.run_steps(0), "batch_size");

        let plan = SweepPlan::FixedB {
            b: 0.0,
            k_axis: SweepAxis::new(-1.0, 1.0, 0),
        };
        assert_err_contains(
            SweepRunner::new(plan, Evaluator::Roots, SolverSettings::default()),
            "at least one sample",
        );
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn parallel_grid_matches_serial_order() {
        use super::sweep_grid_par;

        let k_axis = SweepAxis::new(-4.0, 4.0, 80);
        let b_axis = SweepAxis::new(-1.5, 1.5, 80);
        let serial = sweep_grid(&k_axis, &b_axis, solve).expect("serial");
        let parallel = sweep_grid_par(&k_axis, &b_axis, solve).expect("parallel");
        assert_eq!(serial.len(), parallel.len());
        for (a, b) in serial.iter().zip(parallel.iter()) {
            assert_eq!(a.k, b.k);
            assert_eq!(a.b, b.b);
            assert!(a.u_real == b.u_real || (a.u_real.is_nan() && b.u_real.is_nan()));
        }
    }
}
