//! # pursuit-sim
//!
//! 追跡曲線（pursuit curve）の運動学シミュレーター。
//!
//! 追跡者が移動する目標を追う軌跡を、平面・空間・N次元空間・球面・トーラス上で計算します。
//! 追跡戦略（直接追跡、一定方位角、比例航法、巡回追跡）と目標の運動則を組み合わせて
//! 結合系の導関数を作り、離散ドライバーまたは捕捉イベントで打ち切る連続ドライバーで
//! 軌跡を求めます。
//!
//! - [`models`]: 幾何プリミティブ、目標の運動則、追跡戦略
//! - [`solver`]: 常微分方程式ソルバー（Dormand–Prince 5(4)、イベント検出、連続出力）
//! - [`simulation`]: 離散・連続ドライバー
//! - [`scenario`]: YAML シナリオの読み込みと組み立て
//! - [`logging`]: tracing によるログ出力の初期化

pub mod error;
pub mod logging;
pub mod models;
pub mod scenario;
pub mod simulation;
pub mod solver;

pub use error::PursuitError;
