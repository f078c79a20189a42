// 基本的なデータ型と数学ユーティリティ
pub mod common;

// 曲面（球面・トーラス）の座標変換と距離
pub mod geometry;

// 戦略・目標運動則のインターフェース（trait）定義
pub mod traits;

// 捕捉判定の終了イベント
pub mod capture;

// 比例航法の記憶と誘導計算
pub mod guidance;

// 目標の運動則
pub mod target;

// 各追跡戦略の実装
pub mod flat;
pub mod discrete;
pub mod cyclic;
pub mod spherical;
pub mod toroidal;

// 便利な re-export
pub use common::*;
pub use traits::*;
pub use capture::{CaptureMetric, StopEvent};
pub use geometry::torus::TorusShape;
pub use guidance::NavigationMemory;
pub use target::{
    CircularTarget, ConstantStepTarget, HelixTarget, LinearTarget, LissajousTarget,
    RotatingTarget, SphereTarget, TorusTarget,
};
pub use flat::{ConstantBearing, DirectPursuit, ProportionalNavigation};
pub use discrete::{DiscreteConstantBearing, DiscreteDirectPursuit, DiscreteProportionalNavigation};
pub use cyclic::{circle_formation, pairwise_distance_sum, CyclicPursuit};
pub use spherical::SphericalPursuit;
pub use toroidal::ToroidalPursuit;
