//! # Simulation モジュール
//!
//! 追跡シミュレーションのドライバーを提供します。
//!
//! - [`DiscreteSimulation`]: 1ステップごとに目標 → 追跡者の順で移動させる離散ドライバー
//! - [`ContinuousSimulation`]: 結合系の導関数を積分器に渡し、捕捉イベントで打ち切る連続ドライバー
//!
//! 捕捉と未捕捉はどちらも正常な結果で、エラーになるのは設定ミスと積分の破綻のみです。
//!
//! ## 使用例
//!
//! ```rust
//! use pursuit_sim::models::{DirectPursuit, LinearTarget, Point2D};
//! use pursuit_sim::simulation::{ContinuousConfig, ContinuousSimulation};
//!
//! let target = Box::new(LinearTarget::planar(Point2D::new(1.5, -0.5)));
//! let mut strategy = DirectPursuit::planar(Point2D::new(2.5, 2.5), target).unwrap();
//!
//! let simulation = ContinuousSimulation::new(ContinuousConfig::default());
//! let outcome = simulation.run(&mut strategy, &[0.0, 0.0, 10.0, 3.0]).unwrap();
//! assert!(outcome.captured);
//! ```

pub mod continuous;
pub mod discrete;

pub use continuous::{ContinuousConfig, ContinuousOutcome, ContinuousSimulation};
pub use discrete::{DiscreteOutcome, DiscreteSimulation};
