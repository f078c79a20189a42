//! 平面・空間（任意次元のユークリッド空間）での追跡戦略
//!
//! 状態ベクトルは `[追跡者(n), 目標(n)]` の直交座標です。

use crate::error::PursuitError;
use crate::models::capture::{CaptureMetric, StopEvent, FLAT_CAPTURE_RADIUS};
use crate::models::common::{math_utils, Point2D, Point3D, PointND};
use crate::models::guidance::{heading_velocity, los_angle, NavigationMemory};
use crate::models::target::ensure_target_dimension;
use crate::models::traits::{IPursuitStrategy, ITargetMotion};

/// 追跡者と目標が一致したとみなす距離
pub const COINCIDENCE_EPSILON: f64 = 1e-6;

/// 直接追跡の速度を `out` に書き込む
///
/// 軸ごとの速さ ⊙ 目標方向の単位ベクトル。距離が [`COINCIDENCE_EPSILON`] 未満ならゼロ。
pub(crate) fn direct_velocity(speed: &[f64], pursuer: &[f64], target: &[f64], out: &mut [f64]) {
    let distance = math_utils::distance(pursuer, target);
    if distance < COINCIDENCE_EPSILON {
        out.iter_mut().for_each(|v| *v = 0.0);
        return;
    }
    for (i, v) in out.iter_mut().enumerate() {
        *v = speed[i] * (target[i] - pursuer[i]) / distance;
    }
}

/// 軸ごとの速さがすべて有限値であることを確認
pub(crate) fn ensure_finite_speed(speed: &[f64]) -> Result<(), PursuitError> {
    if speed.iter().all(|s| s.is_finite()) {
        Ok(())
    } else {
        Err(PursuitError::invalid(format!(
            "速さが有限値ではありません: {:?}",
            speed
        )))
    }
}

fn write_target_velocity(target: &dyn ITargetMotion, t: f64, out: &mut [f64]) {
    let velocity = target.calculate_movement(t);
    out.copy_from_slice(&velocity);
}

fn planar_positions(y: &[f64]) -> (Point2D, Point2D) {
    (Point2D::new(y[0], y[1]), Point2D::new(y[2], y[3]))
}

/// 直接追跡（純追跡）
///
/// 常に目標の現在位置へ向かいます。2次元・3次元・N次元で同じ実装を使います。
#[derive(Debug)]
pub struct DirectPursuit {
    speed: PointND,
    target: Box<dyn ITargetMotion>,
    stop: StopEvent,
}

impl DirectPursuit {
    /// 新しい直接追跡戦略を作成
    ///
    /// # 引数
    ///
    /// * `speed` - 軸ごとの追跡者の速さ（次元が空間の次元）
    /// * `target` - 同じ次元の目標の運動則
    ///
    /// # 戻り値
    ///
    /// 速さに非有限値があれば `InvalidConfiguration`、目標の次元が一致しなければ `DimensionMismatch`
    pub fn new(speed: PointND, target: Box<dyn ITargetMotion>) -> Result<Self, PursuitError> {
        let dimension = speed.dim();
        ensure_finite_speed(speed.as_slice())?;
        ensure_target_dimension(target.as_ref(), dimension)?;
        Ok(Self {
            speed,
            target,
            stop: StopEvent::capture(CaptureMetric::Euclidean { dimension }, FLAT_CAPTURE_RADIUS),
        })
    }

    pub fn planar(speed: Point2D, target: Box<dyn ITargetMotion>) -> Result<Self, PursuitError> {
        Self::new(speed.into(), target)
    }

    pub fn spatial(speed: Point3D, target: Box<dyn ITargetMotion>) -> Result<Self, PursuitError> {
        Self::new(speed.into(), target)
    }

    pub fn with_capture_radius(mut self, radius: f64) -> Result<Self, PursuitError> {
        self.stop = self.stop.with_threshold(radius)?;
        Ok(self)
    }

    pub fn dimension(&self) -> usize {
        self.speed.dim()
    }
}

impl IPursuitStrategy for DirectPursuit {
    fn name(&self) -> &'static str {
        "direct_pursuit"
    }

    fn state_len(&self) -> usize {
        2 * self.dimension()
    }

    fn dynamics(&self, t: f64, y: &[f64], dydt: &mut [f64]) {
        let n = self.dimension();
        let (pursuer_rate, target_rate) = dydt.split_at_mut(n);
        direct_velocity(self.speed.as_slice(), &y[..n], &y[n..2 * n], pursuer_rate);
        write_target_velocity(self.target.as_ref(), t, target_rate);
    }

    fn stop_event(&self) -> Option<StopEvent> {
        Some(self.stop)
    }
}

/// 一定方位角追跡（平面）
///
/// 視線角に一定の方位角オフセットを加えた方向へ進みます。
#[derive(Debug)]
pub struct ConstantBearing {
    speed: Point2D,
    target: Box<dyn ITargetMotion>,
    bearing: f64,
    stop: StopEvent,
}

impl ConstantBearing {
    /// 方位角は度で指定します
    pub fn new(
        speed: Point2D,
        target: Box<dyn ITargetMotion>,
        bearing_deg: f64,
    ) -> Result<Self, PursuitError> {
        ensure_finite_speed(&speed.to_array())?;
        ensure_target_dimension(target.as_ref(), 2)?;
        if !bearing_deg.is_finite() {
            return Err(PursuitError::invalid(format!(
                "方位角が有限値ではありません: {}",
                bearing_deg
            )));
        }
        Ok(Self {
            speed,
            target,
            bearing: math_utils::deg_to_rad(bearing_deg),
            stop: StopEvent::capture(CaptureMetric::Euclidean { dimension: 2 }, FLAT_CAPTURE_RADIUS),
        })
    }

    pub fn with_capture_radius(mut self, radius: f64) -> Result<Self, PursuitError> {
        self.stop = self.stop.with_threshold(radius)?;
        Ok(self)
    }

    /// 方位角（ラジアン）
    pub fn bearing(&self) -> f64 {
        self.bearing
    }
}

impl IPursuitStrategy for ConstantBearing {
    fn name(&self) -> &'static str {
        "constant_bearing"
    }

    fn state_len(&self) -> usize {
        4
    }

    fn dynamics(&self, t: f64, y: &[f64], dydt: &mut [f64]) {
        let (pursuer, target) = planar_positions(y);
        let velocity = heading_velocity(los_angle(pursuer, target) + self.bearing, self.speed);
        dydt[0] = velocity.x;
        dydt[1] = velocity.y;
        write_target_velocity(self.target.as_ref(), t, &mut dydt[2..4]);
    }

    fn stop_event(&self) -> Option<StopEvent> {
        Some(self.stop)
    }
}

/// 比例航法（平面）
///
/// 導関数の評価中は記憶を読むだけで、積分器がステップを受理したときにだけ
/// その時点の LOS 角と速度を記録します。棄却されたステップや試行段の評価は
/// 記憶に影響しません。
#[derive(Debug)]
pub struct ProportionalNavigation {
    speed: Point2D,
    target: Box<dyn ITargetMotion>,
    navigation_constant: f64,
    memory: NavigationMemory,
    stop: StopEvent,
}

impl ProportionalNavigation {
    /// 比例航法定数の既定値
    pub const DEFAULT_NAVIGATION_CONSTANT: f64 = 3.0;

    pub fn new(
        speed: Point2D,
        target: Box<dyn ITargetMotion>,
        navigation_constant: f64,
    ) -> Result<Self, PursuitError> {
        ensure_finite_speed(&speed.to_array())?;
        ensure_target_dimension(target.as_ref(), 2)?;
        if !navigation_constant.is_finite() {
            return Err(PursuitError::invalid(format!(
                "比例航法定数が有限値ではありません: {}",
                navigation_constant
            )));
        }
        Ok(Self {
            speed,
            target,
            navigation_constant,
            memory: NavigationMemory::new(),
            stop: StopEvent::capture(CaptureMetric::Euclidean { dimension: 2 }, FLAT_CAPTURE_RADIUS),
        })
    }

    pub fn with_capture_radius(mut self, radius: f64) -> Result<Self, PursuitError> {
        self.stop = self.stop.with_threshold(radius)?;
        Ok(self)
    }

    pub fn memory(&self) -> &NavigationMemory {
        &self.memory
    }

    fn steer(&self, y: &[f64]) -> (f64, Point2D) {
        let (pursuer, target) = planar_positions(y);
        let los = los_angle(pursuer, target);
        let heading = self.memory.heading(los, self.navigation_constant);
        (los, heading_velocity(heading, self.speed))
    }
}

impl IPursuitStrategy for ProportionalNavigation {
    fn name(&self) -> &'static str {
        "proportional_navigation"
    }

    fn state_len(&self) -> usize {
        4
    }

    fn dynamics(&self, t: f64, y: &[f64], dydt: &mut [f64]) {
        let (_, velocity) = self.steer(y);
        dydt[0] = velocity.x;
        dydt[1] = velocity.y;
        write_target_velocity(self.target.as_ref(), t, &mut dydt[2..4]);
    }

    fn stop_event(&self) -> Option<StopEvent> {
        Some(self.stop)
    }

    fn step_accepted(&mut self, _t: f64, y: &[f64]) -> bool {
        let (los, velocity) = self.steer(y);
        self.memory.commit(los, velocity);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::target::{CircularTarget, LinearTarget};

    fn linear() -> Box<dyn ITargetMotion> {
        Box::new(LinearTarget::planar(Point2D::new(1.5, -0.5)))
    }

    #[test]
    fn test_direct_pursuit_coincident_is_exact_zero() {
        let strategy = DirectPursuit::planar(Point2D::new(2.5, 2.5), linear()).unwrap();
        let dydt = strategy.derivative(0.0, &[1.0, 1.0, 1.0, 1.0]).unwrap();
        assert_eq!(&dydt[..2], &[0.0, 0.0]);
        assert_eq!(&dydt[2..], &[1.5, -0.5]);
    }

    #[test]
    fn test_direct_pursuit_points_at_target() {
        let strategy = DirectPursuit::planar(Point2D::new(2.0, 1.0), linear()).unwrap();
        let dydt = strategy.derivative(0.0, &[0.0, 0.0, 3.0, 4.0]).unwrap();
        assert!((dydt[0] - 2.0 * 0.6).abs() < 1e-12);
        assert!((dydt[1] - 1.0 * 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_direct_pursuit_rejects_mismatched_target() {
        let speed = PointND::new(vec![1.0; 5]).unwrap();
        let result = DirectPursuit::new(speed, linear());
        assert!(matches!(
            result,
            Err(PursuitError::DimensionMismatch { expected: 5, actual: 2, .. })
        ));
    }

    #[test]
    fn test_derivative_rejects_wrong_state_length() {
        let strategy = DirectPursuit::planar(Point2D::new(1.0, 1.0), linear()).unwrap();
        assert!(strategy.derivative(0.0, &[0.0, 0.0, 1.0]).is_err());
    }

    #[test]
    fn test_constant_bearing_zero_matches_formula_and_direct() {
        let speed = Point2D::new(2.5, 2.5);
        let bearing = ConstantBearing::new(speed, linear(), 0.0).unwrap();
        let direct = DirectPursuit::planar(speed, linear()).unwrap();
        let y = [1.0, -2.0, 7.0, 3.5];

        let b = bearing.derivative(0.3, &y).unwrap();
        let los = (3.5f64 + 2.0).atan2(7.0 - 1.0);
        assert!((b[0] - 2.5 * los.cos()).abs() < 1e-14);
        assert!((b[1] - 2.5 * los.sin()).abs() < 1e-14);

        let d = direct.derivative(0.3, &y).unwrap();
        assert!((b[0] - d[0]).abs() < 1e-12);
        assert!((b[1] - d[1]).abs() < 1e-12);
    }

    #[test]
    fn test_constant_bearing_scales_axes_independently() {
        // 軸ごとの速さが異なると、方向は LOS からずれ、速さは s_x と s_y の間になる
        let speed = Point2D::new(3.0, 1.0);
        let bearing = ConstantBearing::new(speed, linear(), 0.0).unwrap();
        let y = [0.0, 0.0, 3.0, 4.0];

        let b = bearing.derivative(0.0, &y).unwrap();
        let los = 4.0f64.atan2(3.0);
        assert!((b[0] - 3.0 * los.cos()).abs() < 1e-14);
        assert!((b[1] - 1.0 * los.sin()).abs() < 1e-14);

        let magnitude = (b[0] * b[0] + b[1] * b[1]).sqrt();
        assert!((magnitude - (1.8f64.powi(2) + 0.8f64.powi(2)).sqrt()).abs() < 1e-12);
        assert!(magnitude > 1.0 && magnitude < 3.0);
        assert!((b[1].atan2(b[0]) - los).abs() > 0.1);

        // 直接追跡も軸ごとの速さ ⊙ 単位 LOS ベクトルなので 0° では一致する
        let direct = DirectPursuit::planar(speed, linear()).unwrap();
        let d = direct.derivative(0.0, &y).unwrap();
        assert!((b[0] - d[0]).abs() < 1e-12);
        assert!((b[1] - d[1]).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_speed_is_rejected() {
        let invalid = |r: Result<(), PursuitError>| {
            assert!(matches!(r, Err(PursuitError::InvalidConfiguration(_))));
        };
        invalid(DirectPursuit::planar(Point2D::new(f64::NAN, 1.0), linear()).map(|_| ()));
        invalid(
            DirectPursuit::new(PointND::new(vec![1.0, f64::INFINITY, 1.0]).unwrap(), linear())
                .map(|_| ()),
        );
        invalid(ConstantBearing::new(Point2D::new(1.0, f64::INFINITY), linear(), 0.0).map(|_| ()));
        invalid(
            ProportionalNavigation::new(Point2D::new(f64::NEG_INFINITY, 1.0), linear(), 3.0)
                .map(|_| ()),
        );
    }

    #[test]
    fn test_stop_condition_rejects_short_state() {
        let strategy = DirectPursuit::planar(Point2D::new(1.0, 1.0), linear()).unwrap();
        assert!(matches!(
            strategy.stop_condition(0.0, &[0.0, 0.0, 1.0]),
            Err(PursuitError::DimensionMismatch { expected: 4, actual: 3, .. })
        ));
    }

    #[test]
    fn test_constant_bearing_offset_rotates_heading() {
        let strategy = ConstantBearing::new(Point2D::new(1.0, 1.0), linear(), 90.0).unwrap();
        let dydt = strategy.derivative(0.0, &[0.0, 0.0, 5.0, 0.0]).unwrap();
        assert!(dydt[0].abs() < 1e-12);
        assert!((dydt[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_proportional_navigation_derivative_does_not_touch_memory() {
        let target = Box::new(CircularTarget::new(3.0, 0.5));
        let mut strategy = ProportionalNavigation::new(Point2D::new(2.0, 2.0), target, 3.0).unwrap();
        let y = [0.0, 0.0, 10.0, 3.0];

        let first = strategy.derivative(0.0, &y).unwrap();
        let again = strategy.derivative(0.0, &y).unwrap();
        assert_eq!(first, again);
        assert!(strategy.memory().is_empty());

        assert!(strategy.step_accepted(0.0, &y));
        assert_eq!(strategy.memory().previous_los(), Some(3.0f64.atan2(10.0)));

        // 同じ状態では LOS 変化が 0 なので前回の進行方向を保つ
        let after = strategy.derivative(0.0, &y).unwrap();
        assert!((after[0] - first[0]).abs() < 1e-12);
        assert!((after[1] - first[1]).abs() < 1e-12);
    }

    #[test]
    fn test_flat_stop_event_uses_capture_radius() {
        let strategy = DirectPursuit::planar(Point2D::new(1.0, 1.0), linear())
            .unwrap()
            .with_capture_radius(1.0)
            .unwrap();
        let value = strategy.stop_condition(0.0, &[0.0, 0.0, 3.0, 4.0]).unwrap().unwrap();
        assert!((value - 4.0).abs() < 1e-12);
    }
}
