use crate::error::PursuitError;
use crate::models::common::{Point2D, Point3D, PointND};
use crate::models::traits::{IDiscreteTargetMotion, ITargetMotion};

/// 等速直線運動する目標（任意次元）
#[derive(Debug, Clone, PartialEq)]
pub struct LinearTarget {
    velocity: PointND,
}

impl LinearTarget {
    pub fn new(velocity: PointND) -> Self {
        Self { velocity }
    }

    pub fn planar(velocity: Point2D) -> Self {
        Self::new(velocity.into())
    }

    pub fn spatial(velocity: Point3D) -> Self {
        Self::new(velocity.into())
    }
}

impl ITargetMotion for LinearTarget {
    fn dimension(&self) -> usize {
        self.velocity.dim()
    }

    fn calculate_movement(&self, _t: f64) -> Vec<f64> {
        self.velocity.to_vec()
    }
}

/// 円運動する目標（平面）
///
/// 位置 `(r·cos ωt, r·sin ωt)` の導関数を返します。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularTarget {
    pub radius: f64,
    pub angular_velocity: f64,
}

impl CircularTarget {
    pub fn new(radius: f64, angular_velocity: f64) -> Self {
        Self {
            radius,
            angular_velocity,
        }
    }
}

impl ITargetMotion for CircularTarget {
    fn dimension(&self) -> usize {
        2
    }

    fn calculate_movement(&self, t: f64) -> Vec<f64> {
        let (sin, cos) = (self.angular_velocity * t).sin_cos();
        let tangential = self.radius * self.angular_velocity;
        vec![-tangential * sin, tangential * cos]
    }
}

/// 螺旋運動する目標（空間）
///
/// xy 平面内の円運動と z 方向の等速運動の合成です。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HelixTarget {
    pub radius: f64,
    pub angular_velocity: f64,
    pub vertical_velocity: f64,
}

impl HelixTarget {
    pub fn new(radius: f64, angular_velocity: f64, vertical_velocity: f64) -> Self {
        Self {
            radius,
            angular_velocity,
            vertical_velocity,
        }
    }
}

impl ITargetMotion for HelixTarget {
    fn dimension(&self) -> usize {
        3
    }

    fn calculate_movement(&self, t: f64) -> Vec<f64> {
        let (sin, cos) = (self.angular_velocity * t).sin_cos();
        let tangential = self.radius * self.angular_velocity;
        vec![-tangential * sin, tangential * cos, self.vertical_velocity]
    }
}

/// リサージュ曲線を描く目標（空間）
///
/// 軸ごとに独立した正弦波の速度 `A_i·sin(ω_i t)` を持ち、
/// 位置は振幅 `A_i/ω_i` の有界なリサージュ図形になります。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LissajousTarget {
    pub amplitude: Point3D,
    pub angular_velocity: Point3D,
}

impl LissajousTarget {
    pub fn new(amplitude: Point3D, angular_velocity: Point3D) -> Self {
        Self {
            amplitude,
            angular_velocity,
        }
    }
}

impl ITargetMotion for LissajousTarget {
    fn dimension(&self) -> usize {
        3
    }

    fn calculate_movement(&self, t: f64) -> Vec<f64> {
        let a = self.amplitude;
        let w = self.angular_velocity;
        vec![
            a.x * (w.x * t).sin(),
            a.y * (w.y * t).sin(),
            a.z * (w.z * t).sin(),
        ]
    }
}

/// 球面座標で一定の変化率 `(dr, dθ, dφ)` を持つ目標
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereTarget {
    pub dr: f64,
    pub dtheta: f64,
    pub dphi: f64,
}

impl SphereTarget {
    pub fn new(dr: f64, dtheta: f64, dphi: f64) -> Self {
        Self { dr, dtheta, dphi }
    }
}

impl ITargetMotion for SphereTarget {
    fn dimension(&self) -> usize {
        3
    }

    fn calculate_movement(&self, _t: f64) -> Vec<f64> {
        vec![self.dr, self.dtheta, self.dphi]
    }
}

/// トーラス上を一定の角速度で回る目標
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorusTarget {
    /// 中心軸まわりの角速度 [rad/s]
    pub omega_u: f64,
    /// チューブまわりの角速度 [rad/s]
    pub omega_v: f64,
}

impl TorusTarget {
    pub fn new(omega_u: f64, omega_v: f64) -> Self {
        Self { omega_u, omega_v }
    }
}

impl ITargetMotion for TorusTarget {
    fn dimension(&self) -> usize {
        2
    }

    fn calculate_movement(&self, _t: f64) -> Vec<f64> {
        vec![self.omega_u, self.omega_v]
    }
}

/// 目標の運動則と追跡者の次元が一致するかを検証
pub(crate) fn ensure_target_dimension(
    target: &dyn ITargetMotion,
    expected: usize,
) -> Result<(), PursuitError> {
    crate::error::ensure_len("目標の運動則", expected, target.dimension())
}

/// 1ステップごとに一定量移動する目標（離散モード）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantStepTarget {
    pub velocity: Point2D,
}

impl ConstantStepTarget {
    pub fn new(velocity: Point2D) -> Self {
        Self { velocity }
    }
}

impl IDiscreteTargetMotion for ConstantStepTarget {
    fn next_position(&self, current: Point2D) -> Point2D {
        current + self.velocity
    }
}

/// 原点まわりに1ステップあたり `ω·dt` だけ回転する目標（離散モード）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatingTarget {
    pub angular_velocity: f64,
    pub dt: f64,
}

impl RotatingTarget {
    pub fn new(angular_velocity: f64, dt: f64) -> Self {
        Self {
            angular_velocity,
            dt,
        }
    }
}

impl IDiscreteTargetMotion for RotatingTarget {
    fn next_position(&self, current: Point2D) -> Point2D {
        let (sin, cos) = (self.angular_velocity * self.dt).sin_cos();
        Point2D::new(
            current.x * cos - current.y * sin,
            current.x * sin + current.y * cos,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn laws() -> Vec<Box<dyn ITargetMotion>> {
        vec![
            Box::new(LinearTarget::planar(Point2D::new(1.5, -0.5))),
            Box::new(CircularTarget::new(3.0, 0.5)),
            Box::new(HelixTarget::new(2.0, 0.5, 0.3)),
            Box::new(LissajousTarget::new(
                Point3D::new(5.0, 5.0, 5.0),
                Point3D::new(2.0, 3.0, 5.0),
            )),
            Box::new(SphereTarget::new(0.0, 0.1, PI / 4.0)),
            Box::new(TorusTarget::new(0.5, 1.0)),
        ]
    }

    #[test]
    fn test_movement_is_deterministic_in_time() {
        for law in laws() {
            for t in [0.0, 0.37, 12.5, -4.0, 1e4] {
                let first = law.calculate_movement(t);
                let second = law.calculate_movement(t);
                assert_eq!(first, second);
                assert_eq!(first.len(), law.dimension());
            }
        }
    }

    #[test]
    fn test_circular_target_is_derivative_of_circle() {
        let law = CircularTarget::new(3.0, 0.5);
        let t = 1.2;
        let h = 1e-6;
        let pos = |s: f64| [3.0 * (0.5 * s).cos(), 3.0 * (0.5 * s).sin()];
        let (a, b) = (pos(t + h), pos(t - h));
        let v = law.calculate_movement(t);
        assert!((v[0] - (a[0] - b[0]) / (2.0 * h)).abs() < 1e-6);
        assert!((v[1] - (a[1] - b[1]) / (2.0 * h)).abs() < 1e-6);
    }

    #[test]
    fn test_helix_vertical_rate_is_constant() {
        let law = HelixTarget::new(2.0, 0.5, 0.3);
        assert_eq!(law.calculate_movement(0.0)[2], 0.3);
        assert_eq!(law.calculate_movement(100.0)[2], 0.3);
        // t = 0 では純粋に +y 方向
        let v = law.calculate_movement(0.0);
        assert!(v[0].abs() < 1e-12 && (v[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_lissajous_axes_are_independent() {
        let law = LissajousTarget::new(Point3D::new(1.0, 2.0, 3.0), Point3D::new(2.0, 3.0, 5.0));
        let t = PI / 4.0;
        let v = law.calculate_movement(t);
        assert!((v[0] - 1.0).abs() < 1e-12);
        assert!((v[1] - 2.0 * (3.0 * t).sin()).abs() < 1e-12);
        assert!((v[2] - 3.0 * (5.0 * t).sin()).abs() < 1e-12);
    }

    #[test]
    fn test_rotating_target_preserves_radius() {
        let law = RotatingTarget::new(0.1, 1.0);
        let mut p = Point2D::new(0.0, 1.0);
        for _ in 0..50 {
            p = law.next_position(p);
        }
        assert!((p.magnitude() - 1.0).abs() < 1e-12);
        assert!((p.angle() - (PI / 2.0 + 5.0)).abs() < 1e-9
            || (p.angle() - (PI / 2.0 + 5.0 - 2.0 * PI)).abs() < 1e-9);
    }

    #[test]
    fn test_constant_step_target() {
        let law = ConstantStepTarget::new(Point2D::new(1.5, -0.5));
        assert_eq!(law.next_position(Point2D::new(10.0, 3.0)), Point2D::new(11.5, 2.5));
    }
}
