//! 離散モード（1ステップ = 1回の移動）の追跡戦略
//!
//! どの戦略も `pursuer_velocity` を軸ごとの「1ステップあたりの移動量の上限」として扱います。

use crate::error::PursuitError;
use crate::models::common::{math_utils, Point2D};
use crate::models::flat::COINCIDENCE_EPSILON;
use crate::models::guidance::{heading_velocity, los_angle, NavigationMemory};
use crate::models::traits::IDiscreteStrategy;

/// 離散直接追跡
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscreteDirectPursuit;

impl DiscreteDirectPursuit {
    pub fn new() -> Self {
        Self
    }
}

impl IDiscreteStrategy for DiscreteDirectPursuit {
    fn name(&self) -> &'static str {
        "direct_pursuit"
    }

    fn calculate_movement(
        &mut self,
        pursuer: Point2D,
        target: Point2D,
        pursuer_velocity: Point2D,
    ) -> Point2D {
        let w = target - pursuer;
        let distance = w.magnitude();
        if distance < COINCIDENCE_EPSILON {
            return Point2D::zero();
        }
        Point2D::new(
            pursuer_velocity.x * w.x / distance,
            pursuer_velocity.y * w.y / distance,
        )
    }
}

/// 離散一定方位角追跡
#[derive(Debug, Clone, Copy)]
pub struct DiscreteConstantBearing {
    bearing: f64,
}

impl DiscreteConstantBearing {
    pub fn new(bearing_deg: f64) -> Result<Self, PursuitError> {
        if !bearing_deg.is_finite() {
            return Err(PursuitError::invalid(format!(
                "方位角が有限値ではありません: {}",
                bearing_deg
            )));
        }
        Ok(Self {
            bearing: math_utils::deg_to_rad(bearing_deg),
        })
    }
}

impl IDiscreteStrategy for DiscreteConstantBearing {
    fn name(&self) -> &'static str {
        "constant_bearing"
    }

    fn calculate_movement(
        &mut self,
        pursuer: Point2D,
        target: Point2D,
        pursuer_velocity: Point2D,
    ) -> Point2D {
        heading_velocity(los_angle(pursuer, target) + self.bearing, pursuer_velocity)
    }
}

/// 離散比例航法
///
/// 離散モードでは1回の呼び出しが1ステップなので、毎回記憶を更新します。
#[derive(Debug, Clone)]
pub struct DiscreteProportionalNavigation {
    navigation_constant: f64,
    memory: NavigationMemory,
}

impl DiscreteProportionalNavigation {
    pub fn new(navigation_constant: f64) -> Result<Self, PursuitError> {
        if !navigation_constant.is_finite() {
            return Err(PursuitError::invalid(format!(
                "比例航法定数が有限値ではありません: {}",
                navigation_constant
            )));
        }
        Ok(Self {
            navigation_constant,
            memory: NavigationMemory::new(),
        })
    }

    pub fn memory(&self) -> &NavigationMemory {
        &self.memory
    }
}

impl IDiscreteStrategy for DiscreteProportionalNavigation {
    fn name(&self) -> &'static str {
        "proportional_navigation"
    }

    fn calculate_movement(
        &mut self,
        pursuer: Point2D,
        target: Point2D,
        pursuer_velocity: Point2D,
    ) -> Point2D {
        self.memory
            .steer(pursuer, target, pursuer_velocity, self.navigation_constant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discrete_direct_pursuit_guards_coincidence() {
        let mut strategy = DiscreteDirectPursuit::new();
        let p = Point2D::new(2.0, 2.0);
        assert_eq!(strategy.calculate_movement(p, p, Point2D::new(1.5, 1.5)), Point2D::zero());

        let m = strategy.calculate_movement(Point2D::zero(), Point2D::new(0.0, 4.0), Point2D::new(1.5, 1.5));
        assert!(m.x.abs() < 1e-12);
        assert!((m.y - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_discrete_constant_bearing() {
        let mut strategy = DiscreteConstantBearing::new(-90.0).unwrap();
        let m = strategy.calculate_movement(Point2D::zero(), Point2D::new(1.0, 0.0), Point2D::new(1.0, 2.0));
        assert!(m.x.abs() < 1e-12);
        assert!((m.y + 2.0).abs() < 1e-12);
        assert!(DiscreteConstantBearing::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_discrete_proportional_navigation_updates_every_call() {
        let mut strategy = DiscreteProportionalNavigation::new(3.0).unwrap();
        let speed = Point2D::new(2.2, 1.8);
        let first = strategy.calculate_movement(Point2D::zero(), Point2D::new(11.5, 2.5), speed);
        let los = 2.5f64.atan2(11.5);
        assert!((first.x - 2.2 * los.cos()).abs() < 1e-12);
        assert!((first.y - 1.8 * los.sin()).abs() < 1e-12);
        assert_eq!(strategy.memory().previous_velocity(), Some(first));

        let second = strategy.calculate_movement(first, Point2D::new(13.0, 2.0), speed);
        assert_eq!(strategy.memory().previous_velocity(), Some(second));
        assert_ne!(first, second);
    }
}
