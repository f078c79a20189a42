//! トーラス上の直接追跡
//!
//! 状態ベクトルは `[(u, v)_追跡者, (u, v)_目標]` です。

use crate::error::PursuitError;
use crate::models::capture::{CaptureMetric, StopEvent, CURVED_CAPTURE_THRESHOLD};
use crate::models::geometry::torus::TorusShape;
use crate::models::target::ensure_target_dimension;
use crate::models::traits::{IPursuitStrategy, ITargetMotion};

/// トーラス上の直接追跡戦略
///
/// 計量で重み付けした最短の角度差の方向へ、一定の速さで進みます。
#[derive(Debug)]
pub struct ToroidalPursuit {
    speed: f64,
    shape: TorusShape,
    target: Box<dyn ITargetMotion>,
    stop: StopEvent,
}

impl ToroidalPursuit {
    pub fn new(
        speed: f64,
        shape: TorusShape,
        target: Box<dyn ITargetMotion>,
    ) -> Result<Self, PursuitError> {
        ensure_target_dimension(target.as_ref(), 2)?;
        if !speed.is_finite() {
            return Err(PursuitError::invalid(format!("速さが有限値ではありません: {}", speed)));
        }
        Ok(Self {
            speed,
            shape,
            target,
            stop: StopEvent::capture(CaptureMetric::Torus { shape }, CURVED_CAPTURE_THRESHOLD),
        })
    }

    pub fn with_capture_threshold(mut self, threshold: f64) -> Result<Self, PursuitError> {
        self.stop = self.stop.with_threshold(threshold)?;
        Ok(self)
    }

    pub fn shape(&self) -> TorusShape {
        self.shape
    }
}

impl IPursuitStrategy for ToroidalPursuit {
    fn name(&self) -> &'static str {
        "toroidal_pursuit"
    }

    fn state_len(&self) -> usize {
        4
    }

    fn dynamics(&self, t: f64, y: &[f64], dydt: &mut [f64]) {
        let pursuer = [y[0], y[1]];
        let target = [y[2], y[3]];

        let tangent = self.shape.tangent_direction(pursuer, target);
        let rates = self.shape.tangent_to_angular_rates(pursuer[1], tangent, self.speed);
        dydt[..2].copy_from_slice(&rates);
        dydt[2..4].copy_from_slice(&self.target.calculate_movement(t));
    }

    fn stop_event(&self) -> Option<StopEvent> {
        Some(self.stop)
    }
}
