use tracing::{debug, info, trace};

use crate::models::capture::DISCRETE_CAPTURE_DISTANCE;
use crate::models::common::Point2D;
use crate::models::traits::{IDiscreteStrategy, IDiscreteTargetMotion};

/// 離散シミュレーションの結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiscreteOutcome {
    /// `steps` ステップ目で捕捉した
    Captured { steps: usize, distance: f64 },
    /// `max_iters` ステップ以内に捕捉できなかった
    Exhausted { steps: usize },
}

impl DiscreteOutcome {
    pub fn is_captured(&self) -> bool {
        matches!(self, DiscreteOutcome::Captured { .. })
    }

    /// 実行したステップ数
    pub fn steps(&self) -> usize {
        match *self {
            DiscreteOutcome::Captured { steps, .. } | DiscreteOutcome::Exhausted { steps } => steps,
        }
    }
}

/// 離散追跡シミュレーション
///
/// 各ステップで目標を運動則に従って移動させてから、移動後の目標に向けて追跡者を動かします。
/// 軌跡は `pursuer_positions` と `target_positions` に同じ添字で記録されます。
#[derive(Debug)]
pub struct DiscreteSimulation {
    pub pursuer_positions: Vec<Point2D>,
    pub target_positions: Vec<Point2D>,
    pursuer_velocity: Point2D,
    strategy: Box<dyn IDiscreteStrategy>,
    target_motion: Box<dyn IDiscreteTargetMotion>,
    max_iters: usize,
    capture_distance: f64,
}

impl DiscreteSimulation {
    /// 新しい離散シミュレーションを作成
    ///
    /// # 引数
    ///
    /// * `pursuer_start` - 追跡者の初期位置
    /// * `target_start` - 目標の初期位置
    /// * `pursuer_velocity` - 追跡者の軸ごとの1ステップあたりの速さ
    /// * `strategy` - 追跡戦略
    /// * `target_motion` - 目標の運動則
    /// * `max_iters` - 最大ステップ数
    pub fn new(
        pursuer_start: Point2D,
        target_start: Point2D,
        pursuer_velocity: Point2D,
        strategy: Box<dyn IDiscreteStrategy>,
        target_motion: Box<dyn IDiscreteTargetMotion>,
        max_iters: usize,
    ) -> Self {
        Self {
            pursuer_positions: vec![pursuer_start],
            target_positions: vec![target_start],
            pursuer_velocity,
            strategy,
            target_motion,
            max_iters,
            capture_distance: DISCRETE_CAPTURE_DISTANCE,
        }
    }

    pub fn with_capture_distance(mut self, distance: f64) -> Self {
        self.capture_distance = distance;
        self
    }

    /// 1ステップ進め、新しい (追跡者, 目標) の位置を返す
    pub fn step(&mut self) -> (Point2D, Point2D) {
        let target = self
            .target_motion
            .next_position(self.current_target());
        self.target_positions.push(target);

        let pursuer = self.current_pursuer();
        let movement = self
            .strategy
            .calculate_movement(pursuer, target, self.pursuer_velocity);
        let pursuer = pursuer + movement;
        self.pursuer_positions.push(pursuer);

        (pursuer, target)
    }

    /// 捕捉するか `max_iters` に達するまで実行
    pub fn run(&mut self) -> DiscreteOutcome {
        debug!(
            strategy = self.strategy.name(),
            max_iters = self.max_iters,
            capture_distance = self.capture_distance,
            "SIMULATION_START: 離散シミュレーションを開始します"
        );

        for i in 0..self.max_iters {
            let (pursuer, target) = self.step();
            let distance = pursuer.distance(&target);
            trace!(step = i + 1, distance = distance, "SIMULATION_STEP");

            if distance < self.capture_distance {
                info!(
                    strategy = self.strategy.name(),
                    steps = i + 1,
                    distance = distance,
                    "CAPTURE: {}ステップで目標を捕捉しました",
                    i + 1
                );
                return DiscreteOutcome::Captured {
                    steps: i + 1,
                    distance,
                };
            }
        }

        info!(
            strategy = self.strategy.name(),
            steps = self.max_iters,
            "SIMULATION_FINISHED: {}ステップ以内に捕捉できませんでした",
            self.max_iters
        );
        DiscreteOutcome::Exhausted {
            steps: self.max_iters,
        }
    }

    fn current_pursuer(&self) -> Point2D {
        self.pursuer_positions.last().copied().unwrap_or_else(Point2D::zero)
    }

    fn current_target(&self) -> Point2D {
        self.target_positions.last().copied().unwrap_or_else(Point2D::zero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::discrete::{DiscreteDirectPursuit, DiscreteProportionalNavigation};
    use crate::models::target::{ConstantStepTarget, RotatingTarget};

    #[test]
    fn test_proportional_navigation_captures_linear_target() {
        let mut simulation = DiscreteSimulation::new(
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 3.0),
            Point2D::new(2.2, 1.8),
            Box::new(DiscreteProportionalNavigation::new(3.0).unwrap()),
            Box::new(ConstantStepTarget::new(Point2D::new(1.5, -0.5))),
            100,
        );
        let outcome = simulation.run();

        match outcome {
            DiscreteOutcome::Captured { steps, distance } => {
                assert!(steps <= 100);
                assert!(distance < 0.45);
                assert_eq!(steps, 15);
                let p = simulation.pursuer_positions[steps];
                let t = simulation.target_positions[steps];
                assert!((p.distance(&t) - distance).abs() < 1e-12);
            }
            DiscreteOutcome::Exhausted { .. } => panic!("目標を捕捉できませんでした"),
        }
        assert_eq!(
            simulation.pursuer_positions.len(),
            simulation.target_positions.len()
        );
    }

    #[test]
    fn test_target_moves_before_pursuer() {
        let mut simulation = DiscreteSimulation::new(
            Point2D::new(0.0, 0.0),
            Point2D::new(0.0, 1.0),
            Point2D::new(1.5, 1.5),
            Box::new(DiscreteDirectPursuit::new()),
            Box::new(ConstantStepTarget::new(Point2D::new(3.0, -1.0))),
            1,
        );
        let (pursuer, target) = simulation.step();
        assert_eq!(target, Point2D::new(3.0, 0.0));
        // 移動後の目標 (3, 0) に向かう
        assert!((pursuer.x - 1.5).abs() < 1e-12);
        assert!(pursuer.y.abs() < 1e-12);
    }

    #[test]
    fn test_exhausted_is_not_an_error() {
        let mut simulation = DiscreteSimulation::new(
            Point2D::new(0.0, 0.0),
            Point2D::new(100.0, 0.0),
            Point2D::new(1.0, 1.0),
            Box::new(DiscreteDirectPursuit::new()),
            Box::new(ConstantStepTarget::new(Point2D::new(1.0, 0.0))),
            20,
        );
        let outcome = simulation.run();
        assert_eq!(outcome, DiscreteOutcome::Exhausted { steps: 20 });
        assert!(!outcome.is_captured());
        assert_eq!(simulation.pursuer_positions.len(), 21);
    }

    #[test]
    fn test_rotating_target_history_stays_on_circle() {
        let mut simulation = DiscreteSimulation::new(
            Point2D::new(0.0, 0.0),
            Point2D::new(0.0, 1.0),
            Point2D::new(0.05, 0.05),
            Box::new(DiscreteDirectPursuit::new()),
            Box::new(RotatingTarget::new(0.1, 1.0)),
            10,
        );
        simulation.run();
        for p in &simulation.target_positions {
            assert!((p.magnitude() - 1.0).abs() < 1e-12);
        }
    }
}
