//! Dormand–Prince 5(4) 適応刻み法
//!
//! 5次解で前進し、埋め込み4次解との差で誤差を評価します。FSAL（最終段を次ステップの
//! 初段に流用）と4次の連続拡張による連続出力を持ちます。

use tracing::{debug, trace};

use crate::error::{ensure_len, PursuitError};
use crate::solver::event::{brent_root, EventFunction, EventRecord};
use crate::solver::solution::{DenseOutput, DenseSegment, SolveStatus, Solution, SolverStats};
use crate::solver::{Integrator, OdeSystem, SolverOptions};

const STAGES: usize = 6;

const C: [f64; STAGES] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0];

const A: [[f64; 5]; STAGES] = [
    [0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0],
    [19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0, 0.0],
    [9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0],
];

const B: [f64; STAGES] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
];

// 5次解と4次解の差（7段目は FSAL の導関数）
const E: [f64; STAGES + 1] = [
    71.0 / 57600.0,
    0.0,
    -71.0 / 16695.0,
    71.0 / 1920.0,
    -17253.0 / 339200.0,
    22.0 / 525.0,
    -1.0 / 40.0,
];

// 連続拡張の係数（x, x², x³, x⁴ の係数、段ごと）
const P: [[f64; 4]; STAGES + 1] = [
    [
        1.0,
        -8048581381.0 / 2820520608.0,
        8663915743.0 / 2820520608.0,
        -12715105075.0 / 11282082432.0,
    ],
    [0.0, 0.0, 0.0, 0.0],
    [
        0.0,
        131558114200.0 / 32700410799.0,
        -68118460800.0 / 10900136933.0,
        87487479700.0 / 32700410799.0,
    ],
    [
        0.0,
        -1754552775.0 / 470086768.0,
        14199869525.0 / 1410260304.0,
        -10690763975.0 / 1880347072.0,
    ],
    [
        0.0,
        127303824393.0 / 49829197408.0,
        -318862633887.0 / 49829197408.0,
        701980252875.0 / 199316789632.0,
    ],
    [
        0.0,
        -282668133.0 / 205662961.0,
        2019193451.0 / 616988883.0,
        -1453857185.0 / 822651844.0,
    ],
    [
        0.0,
        40617522.0 / 29380423.0,
        -110615467.0 / 29380423.0,
        69997945.0 / 29380423.0,
    ],
];

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;
// 誤差推定の次数 4 に対する指数 -1/(4+1)
const ERROR_EXPONENT: f64 = -0.2;

/// Dormand–Prince 5(4) ソルバー
#[derive(Debug, Clone, Copy, Default)]
pub struct DormandPrince;

impl DormandPrince {
    pub fn new() -> Self {
        Self
    }
}

/// 1回の積分で使い回す作業領域
struct Workspace {
    k: Vec<Vec<f64>>,
    stage: Vec<f64>,
    y_new: Vec<f64>,
    nfev: usize,
}

impl Workspace {
    fn new(dim: usize) -> Self {
        Self {
            k: vec![vec![0.0; dim]; STAGES + 1],
            stage: vec![0.0; dim],
            y_new: vec![0.0; dim],
            nfev: 0,
        }
    }

    fn eval(&mut self, system: &dyn OdeSystem, t: f64, y: &[f64], slot: usize) {
        system.rhs(t, y, &mut self.k[slot]);
        self.nfev += 1;
    }

    /// k[0] = f(t, y) を前提に1ステップを計算し、y_new と k[6] = f(t+h, y_new) を得る
    fn step(&mut self, system: &dyn OdeSystem, t: f64, y: &[f64], h: f64) {
        let dim = y.len();
        for s in 1..STAGES {
            for i in 0..dim {
                let increment: f64 = (0..s).map(|j| A[s][j] * self.k[j][i]).sum();
                self.stage[i] = y[i] + h * increment;
            }
            system.rhs(t + C[s] * h, &self.stage, &mut self.k[s]);
            self.nfev += 1;
        }
        for i in 0..dim {
            let increment: f64 = (0..STAGES).map(|j| B[j] * self.k[j][i]).sum();
            self.y_new[i] = y[i] + h * increment;
        }
        system.rhs(t + h, &self.y_new, &mut self.k[STAGES]);
        self.nfev += 1;
    }

    fn error_norm(&self, y: &[f64], h: f64, rtol: f64, atol: f64) -> f64 {
        let dim = y.len();
        if dim == 0 {
            return 0.0;
        }
        let sum: f64 = (0..dim)
            .map(|i| {
                let err: f64 = h * (0..=STAGES).map(|j| E[j] * self.k[j][i]).sum::<f64>();
                let scale = atol + y[i].abs().max(self.y_new[i].abs()) * rtol;
                (err / scale).powi(2)
            })
            .sum();
        (sum / dim as f64).sqrt()
    }

    fn dense_segment(&self, t: f64, y: &[f64], h: f64) -> DenseSegment {
        let q = (0..y.len())
            .map(|i| {
                let mut coeffs = [0.0; 4];
                for (order, coeff) in coeffs.iter_mut().enumerate() {
                    *coeff = (0..=STAGES).map(|j| self.k[j][i] * P[j][order]).sum();
                }
                coeffs
            })
            .collect();
        DenseSegment {
            t_old: t,
            h,
            y_old: y.to_vec(),
            q,
        }
    }
}

fn rms(values: impl Iterator<Item = f64>, dim: usize) -> f64 {
    (values.map(|v| v * v).sum::<f64>() / dim as f64).sqrt()
}

/// Hairer らの手法による初期刻み幅の推定
fn select_initial_step(
    system: &dyn OdeSystem,
    work: &mut Workspace,
    t0: f64,
    y0: &[f64],
    interval: f64,
    options: &SolverOptions,
) -> f64 {
    let dim = y0.len();
    if dim == 0 || interval <= 0.0 {
        return interval.min(options.max_step);
    }
    let scale: Vec<f64> = y0
        .iter()
        .map(|y| options.atol + y.abs() * options.rtol)
        .collect();
    let d0 = rms(y0.iter().zip(&scale).map(|(y, s)| y / s), dim);
    let d1 = rms(work.k[0].iter().zip(&scale).map(|(f, s)| f / s), dim);

    let h0 = if d0 < 1e-5 || d1 < 1e-5 {
        1e-6
    } else {
        0.01 * d0 / d1
    }
    .min(interval);

    for i in 0..dim {
        work.stage[i] = y0[i] + h0 * work.k[0][i];
    }
    let mut f1 = vec![0.0; dim];
    system.rhs(t0 + h0, &work.stage, &mut f1);
    work.nfev += 1;

    let d2 = rms(
        f1.iter()
            .zip(&work.k[0])
            .zip(&scale)
            .map(|((a, b), s)| (a - b) / s),
        dim,
    ) / h0;

    let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
        (h0 * 1e-3).max(1e-6)
    } else {
        (0.01 / d1.max(d2)).powf(1.0 / 5.0)
    };

    (100.0 * h0).min(h1).min(interval).min(options.max_step)
}

impl Integrator for DormandPrince {
    fn solve(
        &self,
        system: &mut dyn OdeSystem,
        t_span: (f64, f64),
        y0: &[f64],
        event: Option<&dyn EventFunction>,
        options: &SolverOptions,
    ) -> Result<Solution, PursuitError> {
        options.validate()?;
        ensure_len("初期状態", system.dimension(), y0.len())?;
        let (t0, t_bound) = t_span;
        if !(t0.is_finite() && t_bound.is_finite() && t_bound >= t0) {
            return Err(PursuitError::Integration(format!(
                "時間区間が不正です: ({}, {})",
                t0, t_bound
            )));
        }
        if y0.iter().any(|v| !v.is_finite()) {
            return Err(PursuitError::Integration("初期状態に非有限値が含まれます".to_string()));
        }

        debug!(
            dimension = y0.len(),
            t_start = t0,
            t_end = t_bound,
            max_step = options.max_step,
            has_event = event.is_some(),
            "SOLVER_START: 積分を開始します"
        );

        let dim = y0.len();
        let mut work = Workspace::new(dim);
        let mut t = t0;
        let mut y = y0.to_vec();
        work.eval(system, t, &y, 0);

        let mut ts = vec![t];
        let mut ys = vec![y.clone()];
        let mut events = Vec::new();
        let mut stats = SolverStats::default();
        let mut status = SolveStatus::Completed;
        let mut dense = options.dense_output.then(|| DenseOutput::new(y.clone(), t0));
        let mut g_old = event.map(|e| e.evaluate(t, &y));

        let mut h_abs = match options.first_step {
            Some(h) => h.min(t_bound - t0),
            None => select_initial_step(system, &mut work, t0, &y, t_bound - t0, options),
        };
        let mut attempts = 0usize;

        while t < t_bound {
            let min_step = 10.0 * (next_up(t) - t);
            h_abs = h_abs.min(options.max_step).max(min_step);

            let mut step_rejected = false;
            let (t_new, h) = loop {
                attempts += 1;
                if attempts > options.max_steps {
                    return Err(PursuitError::Integration(format!(
                        "ステップ数の上限 {} を超えました (t = {})",
                        options.max_steps, t
                    )));
                }
                if h_abs < min_step {
                    return Err(PursuitError::Integration(format!(
                        "刻み幅が小さくなりすぎました (t = {}, h = {:e})",
                        t, h_abs
                    )));
                }

                let mut t_new = t + h_abs;
                if t_new > t_bound {
                    t_new = t_bound;
                }
                let h = t_new - t;
                h_abs = h;

                work.step(system, t, &y, h);
                if work.y_new.iter().any(|v| !v.is_finite()) {
                    return Err(PursuitError::Integration(format!(
                        "状態が非有限値になりました (t = {})",
                        t_new
                    )));
                }

                let error_norm = work.error_norm(&y, h, options.rtol, options.atol);
                if error_norm < 1.0 {
                    let mut factor = if error_norm == 0.0 {
                        MAX_FACTOR
                    } else {
                        MAX_FACTOR.min(SAFETY * error_norm.powf(ERROR_EXPONENT))
                    };
                    if step_rejected {
                        factor = factor.min(1.0);
                    }
                    h_abs *= factor;
                    break (t_new, h);
                }

                h_abs *= MIN_FACTOR.max(SAFETY * error_norm.powf(ERROR_EXPONENT));
                step_rejected = true;
                stats.rejected_steps += 1;
            };
            stats.accepted_steps += 1;

            let segment = work.dense_segment(t, &y, h);
            trace!(t = t_new, h = h, "SOLVER_STEP: ステップを受理しました");

            if let (Some(event_fn), Some(before)) = (event, g_old) {
                let after = event_fn.evaluate(t_new, &work.y_new);
                if event_fn.direction().is_crossing(before, after) {
                    let t_event = brent_root(
                        |s| event_fn.evaluate(s, &segment.evaluate(s)),
                        t,
                        t_new,
                        before,
                        after,
                        4.0 * f64::EPSILON,
                    );
                    let y_event = segment.evaluate(t_event);
                    debug!(
                        t_event = t_event,
                        terminal = event_fn.is_terminal(),
                        "SOLVER_EVENT: イベントを検出しました"
                    );
                    events.push(EventRecord {
                        t: t_event,
                        y: y_event.clone(),
                    });

                    if event_fn.is_terminal() {
                        ts.push(t_event);
                        ys.push(y_event);
                        if let Some(dense) = dense.as_mut() {
                            dense.push(segment, t_event);
                        }
                        status = SolveStatus::TerminalEvent;
                        break;
                    }
                }
                g_old = Some(after);
            }

            if let Some(dense) = dense.as_mut() {
                dense.push(segment, t_new);
            }

            t = t_new;
            y.copy_from_slice(&work.y_new);
            ts.push(t);
            ys.push(y.clone());

            // FSAL: 最終段の導関数を次ステップの初段に流用する
            work.k.swap(0, STAGES);
            if system.step_accepted(t, &y) {
                work.eval(system, t, &y, 0);
            }
        }

        stats.nfev = work.nfev;
        debug!(
            t_final = ts.last().copied().unwrap_or(t0),
            points = ts.len(),
            accepted = stats.accepted_steps,
            rejected = stats.rejected_steps,
            nfev = stats.nfev,
            terminal_event = (status == SolveStatus::TerminalEvent),
            "SOLVER_FINISHED: 積分が終了しました"
        );

        Ok(Solution {
            t: ts,
            y: ys,
            status,
            events,
            stats,
            dense,
        })
    }
}

/// `t` の次に大きい浮動小数点数
fn next_up(t: f64) -> f64 {
    if t.is_nan() || t == f64::INFINITY {
        return t;
    }
    if t == 0.0 {
        return f64::from_bits(1);
    }
    let bits = t.to_bits();
    if t > 0.0 {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::CrossingDirection;

    struct Decay;

    impl OdeSystem for Decay {
        fn dimension(&self) -> usize {
            1
        }

        fn rhs(&self, _t: f64, y: &[f64], dydt: &mut [f64]) {
            dydt[0] = -y[0];
        }
    }

    struct Oscillator;

    impl OdeSystem for Oscillator {
        fn dimension(&self) -> usize {
            2
        }

        fn rhs(&self, _t: f64, y: &[f64], dydt: &mut [f64]) {
            dydt[0] = y[1];
            dydt[1] = -y[0];
        }
    }

    /// y[0] が閾値を下回ったら止める
    struct Below(f64);

    impl EventFunction for Below {
        fn evaluate(&self, _t: f64, y: &[f64]) -> f64 {
            y[0] - self.0
        }

        fn is_terminal(&self) -> bool {
            true
        }

        fn direction(&self) -> CrossingDirection {
            CrossingDirection::Decreasing
        }
    }

    /// x = 0 の交差を数える（非終端）
    struct ZeroCrossing;

    impl EventFunction for ZeroCrossing {
        fn evaluate(&self, _t: f64, y: &[f64]) -> f64 {
            y[0]
        }

        fn is_terminal(&self) -> bool {
            false
        }

        fn direction(&self) -> CrossingDirection {
            CrossingDirection::Either
        }
    }

    fn tight() -> SolverOptions {
        SolverOptions {
            rtol: 1e-8,
            atol: 1e-10,
            ..SolverOptions::default()
        }
    }

    #[test]
    fn test_exponential_decay_accuracy() {
        let solution = DormandPrince::new()
            .solve(&mut Decay, (0.0, 2.0), &[1.0], None, &tight())
            .unwrap();
        assert_eq!(solution.status, SolveStatus::Completed);
        assert!((solution.final_time() - 2.0).abs() < 1e-12);
        assert!((solution.final_state()[0] - (-2.0f64).exp()).abs() < 1e-7);
    }

    #[test]
    fn test_dense_output_matches_exact_solution() {
        let solution = DormandPrince::new()
            .solve(&mut Oscillator, (0.0, 6.0), &[1.0, 0.0], None, &tight())
            .unwrap();
        for i in 0..=60 {
            let t = i as f64 * 0.1;
            let y = solution.sol(t).unwrap();
            assert!((y[0] - t.cos()).abs() < 1e-6, "t = {}", t);
            assert!((y[1] + t.sin()).abs() < 1e-6, "t = {}", t);
        }
        // 節点では連続解と離散解が一致する
        for (t, y) in solution.t.iter().zip(&solution.y) {
            let z = solution.sol(*t).unwrap();
            assert!((z[0] - y[0]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_max_step_is_honoured() {
        let options = SolverOptions::default().with_max_step(0.1);
        let solution = DormandPrince::new()
            .solve(&mut Decay, (0.0, 3.0), &[1.0], None, &options)
            .unwrap();
        for pair in solution.t.windows(2) {
            assert!(pair[1] - pair[0] <= 0.1 + 1e-12);
        }
        assert!(solution.step_count() >= 31);
    }

    #[test]
    fn test_terminal_event_stops_integration() {
        let solution = DormandPrince::new()
            .solve(&mut Decay, (0.0, 10.0), &[1.0], Some(&Below(0.5)), &tight())
            .unwrap();
        assert!(solution.terminated_by_event());
        let expected = 2.0f64.ln();
        assert!((solution.final_time() - expected).abs() < 1e-6);
        assert_eq!(solution.events.len(), 1);
        assert!((solution.final_state()[0] - 0.5).abs() < 1e-6);
        assert!(solution.sol(1.0).is_err());
    }

    #[test]
    fn test_event_not_triggered_in_wrong_direction() {
        // 初期値が既に閾値以下なので減少方向の交差は起こらない
        let solution = DormandPrince::new()
            .solve(&mut Decay, (0.0, 1.0), &[0.4], Some(&Below(0.5)), &tight())
            .unwrap();
        assert_eq!(solution.status, SolveStatus::Completed);
        assert!(solution.events.is_empty());
    }

    #[test]
    fn test_non_terminal_events_are_recorded() {
        let solution = DormandPrince::new()
            .solve(&mut Oscillator, (0.0, 10.0), &[1.0, 0.0], Some(&ZeroCrossing), &tight())
            .unwrap();
        assert_eq!(solution.status, SolveStatus::Completed);
        // cos t の零点 π/2, 3π/2, 5π/2 が区間 [0, 10] にある
        assert_eq!(solution.events.len(), 3);
        let first = solution.events[0].t;
        assert!((first - std::f64::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_wrong_initial_dimension() {
        let result = DormandPrince::new().solve(
            &mut Decay,
            (0.0, 1.0),
            &[1.0, 2.0],
            None,
            &SolverOptions::default(),
        );
        assert!(matches!(result, Err(PursuitError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_rejects_reversed_span() {
        let result = DormandPrince::new().solve(
            &mut Decay,
            (1.0, 0.0),
            &[1.0],
            None,
            &SolverOptions::default(),
        );
        assert!(matches!(result, Err(PursuitError::Integration(_))));
    }

    #[test]
    fn test_empty_span_returns_initial_state() {
        let solution = DormandPrince::new()
            .solve(&mut Decay, (1.0, 1.0), &[3.0], None, &SolverOptions::default())
            .unwrap();
        assert_eq!(solution.t, vec![1.0]);
        assert_eq!(solution.sol(1.0).unwrap(), vec![3.0]);
    }
}
