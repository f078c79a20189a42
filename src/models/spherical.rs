//! 球面上の直接追跡
//!
//! 状態ベクトルは `[(r, θ, φ)_追跡者, (r, θ, φ)_目標]` です。

use crate::error::PursuitError;
use crate::models::capture::{CaptureMetric, StopEvent, CURVED_CAPTURE_THRESHOLD};
use crate::models::geometry::sphere;
use crate::models::target::ensure_target_dimension;
use crate::models::traits::{IPursuitStrategy, ITargetMotion};

/// 球面上の直接追跡戦略
///
/// 目標への弦ベクトルを追跡者の接平面に射影した方向へ、一定の速さで進みます。
#[derive(Debug)]
pub struct SphericalPursuit {
    speed: f64,
    target: Box<dyn ITargetMotion>,
    stop: StopEvent,
}

impl SphericalPursuit {
    pub fn new(speed: f64, target: Box<dyn ITargetMotion>) -> Result<Self, PursuitError> {
        ensure_target_dimension(target.as_ref(), 3)?;
        if !speed.is_finite() {
            return Err(PursuitError::invalid(format!("速さが有限値ではありません: {}", speed)));
        }
        Ok(Self {
            speed,
            target,
            stop: StopEvent::capture(CaptureMetric::GreatCircle, CURVED_CAPTURE_THRESHOLD),
        })
    }

    pub fn with_capture_threshold(mut self, threshold: f64) -> Result<Self, PursuitError> {
        self.stop = self.stop.with_threshold(threshold)?;
        Ok(self)
    }
}

impl IPursuitStrategy for SphericalPursuit {
    fn name(&self) -> &'static str {
        "spherical_pursuit"
    }

    fn state_len(&self) -> usize {
        6
    }

    fn dynamics(&self, t: f64, y: &[f64], dydt: &mut [f64]) {
        let pursuer = [y[0], y[1], y[2]];
        let target = [y[3], y[4], y[5]];

        let velocity = sphere::tangent_direction(pursuer, target) * self.speed;
        let rates = sphere::cartesian_velocity_to_spherical(y[0], y[1], y[2], velocity);
        dydt[..3].copy_from_slice(&rates);
        dydt[3..6].copy_from_slice(&self.target.calculate_movement(t));
    }

    fn stop_event(&self) -> Option<StopEvent> {
        Some(self.stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::target::{LinearTarget, SphereTarget};
    use crate::models::common::Point2D;
    use std::f64::consts::PI;

    fn strategy(speed: f64) -> SphericalPursuit {
        SphericalPursuit::new(speed, Box::new(SphereTarget::new(0.0, 0.1, PI / 4.0))).unwrap()
    }

    #[test]
    fn test_spherical_pursuit_stays_on_sphere() {
        let s = strategy(1.5);
        let dydt = s.derivative(0.0, &[5.0, PI / 4.0, 2.0, 5.0, 0.0, 0.0]).unwrap();
        // 接平面内の速度なので半径方向の変化はない
        assert!(dydt[0].abs() < 1e-12);
        assert_eq!(&dydt[3..], &[0.0, 0.1, PI / 4.0]);

        // 球面上の速さは指定どおり
        let r = 5.0;
        let theta = PI / 4.0;
        let speed = ((r * dydt[1]).powi(2) + (r * theta.cos() * dydt[2]).powi(2)).sqrt();
        assert!((speed - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_spherical_pursuit_coincident_is_zero() {
        let s = strategy(1.5);
        let dydt = s.derivative(0.0, &[5.0, 0.3, 1.0, 5.0, 0.3, 1.0]).unwrap();
        assert_eq!(&dydt[..3], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_spherical_pursuit_pole_guard() {
        let s = strategy(1.0);
        let dydt = s.derivative(0.0, &[5.0, PI / 2.0, 0.0, 5.0, 0.0, 0.0]).unwrap();
        assert_eq!(dydt[2], 0.0);
        assert!(dydt.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_spherical_pursuit_requires_spherical_target() {
        let target = Box::new(LinearTarget::planar(Point2D::new(1.0, 0.0)));
        assert!(SphericalPursuit::new(1.0, target).is_err());
    }
}
