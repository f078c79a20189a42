//! 巡回追跡
//!
//! N 個の点が円環状に並び、点 i が点 (i+1 mod N) を直接追跡します。
//! 状態ベクトルは `[x0, y0, x1, y1, …]` です。

use std::f64::consts::TAU;

use crate::error::PursuitError;
use crate::models::capture::StopEvent;
use crate::models::common::{math_utils, Point2D};
use crate::models::flat::{direct_velocity, ensure_finite_speed};
use crate::models::traits::IPursuitStrategy;

/// 巡回追跡戦略
///
/// 捕捉イベントは持たず、指定した時間区間の終端まで積分します。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CyclicPursuit {
    count: usize,
    speed: Point2D,
}

impl CyclicPursuit {
    /// # 引数
    ///
    /// * `count` - 点の数（2以上）
    /// * `speed` - 全点で共通の軸ごとの速さ
    pub fn new(count: usize, speed: Point2D) -> Result<Self, PursuitError> {
        if count < 2 {
            return Err(PursuitError::invalid(format!(
                "巡回追跡には少なくとも2点が必要です: {}",
                count
            )));
        }
        ensure_finite_speed(&speed.to_array())?;
        Ok(Self { count, speed })
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl IPursuitStrategy for CyclicPursuit {
    fn name(&self) -> &'static str {
        "cyclic_pursuit"
    }

    fn state_len(&self) -> usize {
        2 * self.count
    }

    fn dynamics(&self, _t: f64, y: &[f64], dydt: &mut [f64]) {
        let speed = self.speed.to_array();
        for i in 0..self.count {
            let j = (i + 1) % self.count;
            direct_velocity(
                &speed,
                &y[2 * i..2 * i + 2],
                &y[2 * j..2 * j + 2],
                &mut dydt[2 * i..2 * i + 2],
            );
        }
    }

    fn stop_event(&self) -> Option<StopEvent> {
        None
    }
}

/// 半径 `radius` の円周上に等間隔（`θ_i = 2πi/N`）に並べた初期状態
pub fn circle_formation(count: usize, radius: f64) -> Vec<f64> {
    (0..count)
        .flat_map(|i| {
            let (sin, cos) = (TAU * i as f64 / count as f64).sin_cos();
            [radius * cos, radius * sin]
        })
        .collect()
}

/// 全点対の距離の総和（系の「エネルギー」）
pub fn pairwise_distance_sum(y: &[f64]) -> f64 {
    let points: Vec<&[f64]> = y.chunks_exact(2).collect();
    let mut total = 0.0;
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            total += math_utils::distance(a, b);
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_formation_layout() {
        let y = circle_formation(4, 2.0);
        assert_eq!(y.len(), 8);
        assert!((y[0] - 2.0).abs() < 1e-12 && y[1].abs() < 1e-12);
        assert!(y[2].abs() < 1e-12 && (y[3] - 2.0).abs() < 1e-12);
        assert!((y[4] + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_cyclic_derivative_is_finite_at_start() {
        let strategy = CyclicPursuit::new(18, Point2D::new(1.0, 1.0)).unwrap();
        let y0 = circle_formation(18, 150.0);
        let dydt = strategy.derivative(0.0, &y0).unwrap();
        assert_eq!(dydt.len(), 36);
        assert!(dydt.iter().all(|v| v.is_finite()));
        for pair in dydt.chunks_exact(2) {
            let speed = (pair[0].powi(2) + pair[1].powi(2)).sqrt();
            assert!((speed - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_cyclic_rejects_invalid_configuration() {
        assert!(CyclicPursuit::new(1, Point2D::new(1.0, 1.0)).is_err());
        assert!(matches!(
            CyclicPursuit::new(3, Point2D::new(f64::INFINITY, 1.0)),
            Err(PursuitError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            CyclicPursuit::new(3, Point2D::new(1.0, f64::NAN)),
            Err(PursuitError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            CyclicPursuit::new(3, Point2D::new(1.0, 1.0)).unwrap().stop_condition(0.0, &[0.0; 6]),
            Ok(None)
        ));
        assert!(CyclicPursuit::new(2, Point2D::new(1.0, 1.0)).unwrap().stop_event().is_none());
    }

    #[test]
    fn test_pairwise_distance_sum() {
        // 一辺1の正方形: 辺4本 + 対角線2本
        let y = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
        let expected = 4.0 + 2.0 * 2f64.sqrt();
        assert!((pairwise_distance_sum(&y) - expected).abs() < 1e-12);
    }
}
