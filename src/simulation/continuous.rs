use tracing::{debug, info, warn};

use crate::error::{ensure_len, PursuitError};
use crate::models::traits::IPursuitStrategy;
use crate::solver::{
    DormandPrince, EventFunction, Integrator, OdeSystem, SolveStatus, Solution, SolverOptions,
    SolverStats,
};

/// 時間区間の既定値
pub const DEFAULT_T_SPAN: (f64, f64) = (0.0, 50.0);
/// 最大刻み幅の既定値
pub const DEFAULT_MAX_STEP: f64 = 0.1;

/// 連続シミュレーションの設定
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousConfig {
    pub t_span: (f64, f64),
    pub options: SolverOptions,
}

impl Default for ContinuousConfig {
    fn default() -> Self {
        Self {
            t_span: DEFAULT_T_SPAN,
            options: SolverOptions::default().with_max_step(DEFAULT_MAX_STEP),
        }
    }
}

impl ContinuousConfig {
    pub fn with_t_span(mut self, t_span: (f64, f64)) -> Self {
        self.t_span = t_span;
        self
    }

    pub fn with_max_step(mut self, max_step: f64) -> Self {
        self.options.max_step = max_step;
        self
    }
}

/// 連続シミュレーションの結果
#[derive(Debug, Clone)]
pub struct ContinuousOutcome {
    /// 積分器の解（連続解 `sol(t)` を含む）
    pub solution: Solution,
    /// 最終時刻（捕捉時は捕捉時刻）
    pub final_time: f64,
    /// 保存された時刻点の数
    pub steps: usize,
    /// 捕捉イベントで終了したか
    pub captured: bool,
}

impl ContinuousOutcome {
    pub fn stats(&self) -> SolverStats {
        self.solution.stats
    }
}

/// 追跡戦略を積分器の常微分方程式系として見せるアダプター
struct StrategySystem<'a> {
    strategy: &'a mut dyn IPursuitStrategy,
}

impl OdeSystem for StrategySystem<'_> {
    fn dimension(&self) -> usize {
        self.strategy.state_len()
    }

    fn rhs(&self, t: f64, y: &[f64], dydt: &mut [f64]) {
        self.strategy.dynamics(t, y, dydt);
    }

    fn step_accepted(&mut self, t: f64, y: &[f64]) -> bool {
        self.strategy.step_accepted(t, y)
    }
}

/// 連続追跡シミュレーション
///
/// 戦略の結合系を積分し、戦略が捕捉イベントを持てばそこで打ち切ります。
#[derive(Debug, Clone)]
pub struct ContinuousSimulation<I: Integrator = DormandPrince> {
    integrator: I,
    config: ContinuousConfig,
}

impl ContinuousSimulation<DormandPrince> {
    pub fn new(config: ContinuousConfig) -> Self {
        Self::with_integrator(DormandPrince::new(), config)
    }
}

impl<I: Integrator> ContinuousSimulation<I> {
    pub fn with_integrator(integrator: I, config: ContinuousConfig) -> Self {
        Self { integrator, config }
    }

    pub fn config(&self) -> &ContinuousConfig {
        &self.config
    }

    /// シミュレーションを実行
    ///
    /// # 引数
    ///
    /// * `strategy` - 追跡戦略（この実行だけが使うインスタンス）
    /// * `initial_state` - 長さ `strategy.state_len()` の初期状態
    ///
    /// # 戻り値
    ///
    /// 捕捉・未捕捉にかかわらず `Ok`。設定ミスや積分の破綻は `Err`
    pub fn run(
        &self,
        strategy: &mut dyn IPursuitStrategy,
        initial_state: &[f64],
    ) -> Result<ContinuousOutcome, PursuitError> {
        ensure_len("初期状態", strategy.state_len(), initial_state.len())?;

        let name = strategy.name();
        let stop = strategy.stop_event();
        let (t0, t_end) = self.config.t_span;

        if let Some(event) = stop.as_ref() {
            let initial_value = event.evaluate(t0, initial_state);
            if initial_value <= 0.0 {
                warn!(
                    strategy = name,
                    stop_value = initial_value,
                    "INITIAL_CAPTURE: 初期状態で既に捕捉範囲内です（イベントは正から負への交差のみ検出）"
                );
            }
        }

        debug!(
            strategy = name,
            state_len = initial_state.len(),
            t_start = t0,
            t_end = t_end,
            max_step = self.config.options.max_step,
            "SIMULATION_START: 連続シミュレーションを開始します"
        );

        let mut system = StrategySystem { strategy };
        let solution = self.integrator.solve(
            &mut system,
            self.config.t_span,
            initial_state,
            stop.as_ref().map(|e| e as &dyn EventFunction),
            &self.config.options,
        )?;

        let captured = solution.status == SolveStatus::TerminalEvent;
        let final_time = solution.final_time();
        let steps = solution.step_count();

        if captured {
            info!(
                strategy = name,
                t_capture = final_time,
                steps = steps,
                "CAPTURE: t = {:.3} で目標を捕捉しました",
                final_time
            );
        }
        info!(
            strategy = name,
            final_time = final_time,
            steps = steps,
            captured = captured,
            accepted = solution.stats.accepted_steps,
            rejected = solution.stats.rejected_steps,
            nfev = solution.stats.nfev,
            "SIMULATION_FINISHED: 最終時刻 {:.3}, ステップ数 {}",
            final_time,
            steps
        );

        Ok(ContinuousOutcome {
            solution,
            final_time,
            steps,
            captured,
        })
    }
}
