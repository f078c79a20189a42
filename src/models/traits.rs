use std::fmt::Debug;

use crate::error::{ensure_len, PursuitError};
use crate::models::capture::StopEvent;
use crate::models::common::Point2D;

/// 目標の運動則（連続モード）
///
/// 時刻 `t` のみに依存する純粋関数で、多様体固有の座標系での導関数を返します。
pub trait ITargetMotion: Debug {
    /// 返す導関数ベクトルの次元
    fn dimension(&self) -> usize;

    /// 時刻 `t` における目標の速度（導関数）
    fn calculate_movement(&self, t: f64) -> Vec<f64>;
}

/// 追跡戦略（連続モード）
///
/// 状態ベクトルは `[追跡者の座標…, 目標の座標…]` です（巡回追跡は全点の連結）。
/// 1つの戦略インスタンスは1回のシミュレーション実行だけが所有します。
/// 比例航法のように内部メモリを持つ戦略を複数の実行で共有するのは誤用です。
pub trait IPursuitStrategy: Debug {
    /// 戦略名（ログ用）
    fn name(&self) -> &'static str;

    /// 状態ベクトルの長さ
    fn state_len(&self) -> usize;

    /// 結合系の導関数を `dydt` に書き込む（`y`, `dydt` の長さは `state_len()`）
    fn dynamics(&self, t: f64, y: &[f64], dydt: &mut [f64]);

    /// 捕捉判定の終了イベント（定義されない戦略は None）
    fn stop_event(&self) -> Option<StopEvent>;

    /// 終了条件の値。正から負への交差が捕捉
    ///
    /// # 戻り値
    ///
    /// 終了イベントを持たない戦略は `Ok(None)`。状態ベクトルの長さが
    /// `state_len()` と異なる場合は `DimensionMismatch`
    fn stop_condition(&self, t: f64, y: &[f64]) -> Result<Option<f64>, PursuitError> {
        ensure_len("状態ベクトル", self.state_len(), y.len())?;
        self.stop_event().map(|event| event.value(t, y)).transpose()
    }

    /// 積分器がステップを受理したときに呼ばれる。内部メモリを進めた場合 true
    fn step_accepted(&mut self, _t: f64, _y: &[f64]) -> bool {
        false
    }

    /// 長さを検証した上で導関数を計算
    fn derivative(&self, t: f64, y: &[f64]) -> Result<Vec<f64>, PursuitError> {
        ensure_len("状態ベクトル", self.state_len(), y.len())?;
        let mut dydt = vec![0.0; y.len()];
        self.dynamics(t, y, &mut dydt);
        Ok(dydt)
    }
}

/// 追跡戦略（離散モード）
pub trait IDiscreteStrategy: Debug {
    fn name(&self) -> &'static str;

    /// 1ステップ分の追跡者の移動量
    ///
    /// `target` はこのステップで既に移動した後の目標位置です。
    fn calculate_movement(
        &mut self,
        pursuer: Point2D,
        target: Point2D,
        pursuer_velocity: Point2D,
    ) -> Point2D;
}

/// 目標の運動則（離散モード）
pub trait IDiscreteTargetMotion: Debug {
    /// 1ステップ後の目標位置
    fn next_position(&self, current: Point2D) -> Point2D;
}
