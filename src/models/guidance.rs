//! 比例航法の誘導計算
//!
//! 視線（LOS）角の変化率に比例して進行方向を曲げる誘導則です。
//! 前回の LOS 角と前回の追跡者速度を [`NavigationMemory`] に保持します。

use crate::models::common::{math_utils, Point2D};

/// 追跡者から目標への視線角（ラジアン）
pub fn los_angle(pursuer: Point2D, target: Point2D) -> f64 {
    (target - pursuer).angle()
}

/// 前回から今回への LOS 角の変化量を (-π, π] に正規化
pub fn delta_los(previous: f64, current: f64) -> f64 {
    math_utils::shortest_angular_distance(previous, current)
}

/// 進行方向と軸ごとの速さから速度ベクトルを作成
///
/// `(s_x·cos h, s_y·sin h)` で、速さが軸ごとに異なる場合は楕円状の速度になります。
pub fn heading_velocity(heading: f64, speed: Point2D) -> Point2D {
    let (sin, cos) = heading.sin_cos();
    Point2D::new(speed.x * cos, speed.y * sin)
}

/// 比例航法の記憶（前回の LOS 角と前回の速度）
///
/// 1つの追跡戦略インスタンスだけが所有します。どちらも最初の評価までは `None` です。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NavigationMemory {
    previous_los: Option<f64>,
    previous_velocity: Option<Point2D>,
}

impl NavigationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// まだ一度も記録していない
    pub fn is_empty(&self) -> bool {
        self.previous_los.is_none()
    }

    pub fn previous_los(&self) -> Option<f64> {
        self.previous_los
    }

    pub fn previous_velocity(&self) -> Option<Point2D> {
        self.previous_velocity
    }

    /// 今回の LOS 角から新しい進行方向を計算（記憶は変更しない）
    ///
    /// # 引数
    ///
    /// * `los` - 今回の視線角
    /// * `navigation_constant` - 比例航法定数 N
    ///
    /// # 戻り値
    ///
    /// 記憶が空なら `los` そのもの、そうでなければ
    /// `atan2(前回速度) + N·wrap(los − 前回 LOS)`
    pub fn heading(&self, los: f64, navigation_constant: f64) -> f64 {
        match self.previous_los {
            None => los,
            Some(previous_los) => {
                let base = self
                    .previous_velocity
                    .map(|v| v.angle())
                    .unwrap_or(los);
                base + navigation_constant * delta_los(previous_los, los)
            }
        }
    }

    /// 今回の LOS 角と採用した速度を記録
    pub fn commit(&mut self, los: f64, velocity: Point2D) {
        self.previous_los = Some(los);
        self.previous_velocity = Some(velocity);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// 1ステップ分の誘導を行い、結果を記憶に反映する（離散モード用）
    pub fn steer(
        &mut self,
        pursuer: Point2D,
        target: Point2D,
        speed: Point2D,
        navigation_constant: f64,
    ) -> Point2D {
        let los = los_angle(pursuer, target);
        let velocity = heading_velocity(self.heading(los, navigation_constant), speed);
        self.commit(los, velocity);
        velocity
    }
}
