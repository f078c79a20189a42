//! # Solver モジュール
//!
//! 連続モードのドライバーが利用する常微分方程式ソルバーのインターフェースと、
//! その実装（Dormand–Prince 5(4) 適応刻み法）を提供します。
//!
//! ドライバー側から見たソルバーはブラックボックスです:
//! 導関数・初期状態・時間区間・終了イベントを渡すと、時刻列と状態列、
//! そして区間内の任意時刻で評価できる連続解 ([`Solution::sol`]) が返ります。
//!
//! ## 使用例
//!
//! ```rust
//! use pursuit_sim::solver::{DormandPrince, Integrator, OdeSystem, SolverOptions};
//!
//! struct Decay;
//!
//! impl OdeSystem for Decay {
//!     fn dimension(&self) -> usize { 1 }
//!     fn rhs(&self, _t: f64, y: &[f64], dydt: &mut [f64]) { dydt[0] = -y[0]; }
//! }
//!
//! let solution = DormandPrince::new()
//!     .solve(&mut Decay, (0.0, 1.0), &[1.0], None, &SolverOptions::default())
//!     .unwrap();
//! let y = solution.sol(0.5).unwrap();
//! assert!((y[0] - (-0.5f64).exp()).abs() < 1e-3);
//! ```

pub mod dopri;
pub mod event;
pub mod solution;

pub use dopri::DormandPrince;
pub use event::{CrossingDirection, EventFunction, EventRecord};
pub use solution::{DenseOutput, SolveStatus, Solution, SolverStats};

use crate::error::PursuitError;

/// ソルバーに渡す常微分方程式系
pub trait OdeSystem {
    /// 状態ベクトルの次元
    fn dimension(&self) -> usize;

    /// 導関数 `dy/dt = f(t, y)` を `dydt` に書き込む
    ///
    /// ソルバーは試行ステップ（棄却されうる段）でも呼び出すため、
    /// この関数は内部状態を変更してはいけません。
    fn rhs(&self, t: f64, y: &[f64], dydt: &mut [f64]);

    /// ステップが受理された時点で呼ばれるフック
    ///
    /// 受理時に内部状態を進める系はここで更新し、導関数が変わる場合 `true` を返します。
    fn step_accepted(&mut self, _t: f64, _y: &[f64]) -> bool {
        false
    }
}

/// ソルバー設定
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions {
    /// 最大刻み幅
    pub max_step: f64,
    /// 相対許容誤差
    pub rtol: f64,
    /// 絶対許容誤差
    pub atol: f64,
    /// 初期刻み幅（None の場合は自動選択）
    pub first_step: Option<f64>,
    /// 連続出力を保持するか
    pub dense_output: bool,
    /// 受理・棄却を合わせたステップ試行回数の上限
    pub max_steps: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_step: f64::INFINITY,
            rtol: 1e-3,
            atol: 1e-6,
            first_step: None,
            dense_output: true,
            max_steps: 1_000_000,
        }
    }
}

impl SolverOptions {
    pub fn with_max_step(mut self, max_step: f64) -> Self {
        self.max_step = max_step;
        self
    }

    pub fn validate(&self) -> Result<(), PursuitError> {
        if !(self.max_step > 0.0) {
            return Err(PursuitError::invalid(format!(
                "max_step は正である必要があります: {}",
                self.max_step
            )));
        }
        if !(self.rtol > 0.0 && self.atol >= 0.0) {
            return Err(PursuitError::invalid("許容誤差が不正です (rtol > 0, atol >= 0)"));
        }
        if let Some(h) = self.first_step {
            if !(h > 0.0) {
                return Err(PursuitError::invalid("first_step は正である必要があります"));
            }
        }
        Ok(())
    }
}

/// 初期値問題を解く積分器
pub trait Integrator {
    /// `t_span = (t0, tf)` で `y0` から積分する
    ///
    /// `event` を与えると、その符号変化（方向の指定つき）を検出して記録し、
    /// 終端イベントであればその時刻で積分を打ち切ります。
    fn solve(
        &self,
        system: &mut dyn OdeSystem,
        t_span: (f64, f64),
        y0: &[f64],
        event: Option<&dyn EventFunction>,
        options: &SolverOptions,
    ) -> Result<Solution, PursuitError>;
}
