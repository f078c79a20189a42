use crate::error::{ensure_len, PursuitError};
use crate::models::common::math_utils;
use crate::models::geometry::{sphere, torus::TorusShape};
use crate::solver::{CrossingDirection, EventFunction};

/// 平面・空間での捕捉半径
pub const FLAT_CAPTURE_RADIUS: f64 = 0.5;
/// 曲面（球面の角距離、トーラスの計量距離）での捕捉閾値
pub const CURVED_CAPTURE_THRESHOLD: f64 = 0.1;
/// 離散ドライバーの捕捉距離
pub const DISCRETE_CAPTURE_DISTANCE: f64 = 0.45;

/// 多様体ごとの追跡者・目標間距離の測り方
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureMetric {
    /// `[p(n), t(n)]` のユークリッド距離
    Euclidean { dimension: usize },
    /// `[(r, θ, φ)_p, (r, θ, φ)_t]` の大円角距離
    GreatCircle,
    /// `[(u, v)_p, (u, v)_t]` のトーラス計量距離
    Torus { shape: TorusShape },
}

impl CaptureMetric {
    /// この距離が読む状態ベクトルの長さ
    pub fn state_len(&self) -> usize {
        match *self {
            CaptureMetric::Euclidean { dimension } => 2 * dimension,
            CaptureMetric::GreatCircle => 6,
            CaptureMetric::Torus { .. } => 4,
        }
    }

    /// 状態ベクトルから追跡者・目標間の距離を計算
    ///
    /// # 戻り値
    ///
    /// 状態ベクトルの長さが `state_len()` と異なる場合は `DimensionMismatch`
    pub fn distance(&self, y: &[f64]) -> Result<f64, PursuitError> {
        ensure_len("捕捉判定の状態ベクトル", self.state_len(), y.len())?;
        Ok(self.measure(y))
    }

    // 長さは呼び出し側で検証済み
    fn measure(&self, y: &[f64]) -> f64 {
        match *self {
            CaptureMetric::Euclidean { dimension } => {
                math_utils::distance(&y[..dimension], &y[dimension..2 * dimension])
            }
            CaptureMetric::GreatCircle => sphere::great_circle_distance(y[1], y[2], y[4], y[5]),
            CaptureMetric::Torus { shape } => shape.riemannian_distance([y[0], y[1]], [y[2], y[3]]),
        }
    }
}

/// 捕捉の終了イベント
///
/// 値は「距離 − 閾値」で、正から負への交差（減少方向）で終端します。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopEvent {
    pub metric: CaptureMetric,
    pub threshold: f64,
    pub terminal: bool,
    pub direction: CrossingDirection,
}

impl StopEvent {
    /// 終端・減少方向の捕捉イベント
    pub fn capture(metric: CaptureMetric, threshold: f64) -> Self {
        Self {
            metric,
            threshold,
            terminal: true,
            direction: CrossingDirection::Decreasing,
        }
    }

    /// 閾値を差し替える（正の値のみ）
    pub fn with_threshold(self, threshold: f64) -> Result<Self, PursuitError> {
        if !(threshold > 0.0 && threshold.is_finite()) {
            return Err(PursuitError::invalid(format!(
                "捕捉閾値は正の有限値である必要があります: {}",
                threshold
            )));
        }
        Ok(Self { threshold, ..self })
    }

    /// 終了条件の値「距離 − 閾値」（状態ベクトルの長さを検証）
    pub fn value(&self, _t: f64, y: &[f64]) -> Result<f64, PursuitError> {
        Ok(self.metric.distance(y)? - self.threshold)
    }
}

impl EventFunction for StopEvent {
    // 積分器は初期状態の長さを検証してから呼び出す
    fn evaluate(&self, _t: f64, y: &[f64]) -> f64 {
        self.metric.measure(y) - self.threshold
    }

    fn is_terminal(&self) -> bool {
        self.terminal
    }

    fn direction(&self) -> CrossingDirection {
        self.direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean_stop_value() {
        let event = StopEvent::capture(CaptureMetric::Euclidean { dimension: 2 }, FLAT_CAPTURE_RADIUS);
        let value = event.evaluate(0.0, &[0.0, 0.0, 3.0, 4.0]);
        assert!((value - 4.5).abs() < 1e-12);
        assert!(event.is_terminal());
        assert_eq!(event.direction(), CrossingDirection::Decreasing);
    }

    #[test]
    fn test_great_circle_stop_value_at_coincidence() {
        let event = StopEvent::capture(CaptureMetric::GreatCircle, CURVED_CAPTURE_THRESHOLD);
        let value = event.evaluate(0.0, &[5.0, 0.3, 1.0, 5.0, 0.3, 1.0]);
        assert!((value + CURVED_CAPTURE_THRESHOLD).abs() < 1e-6);
    }

    #[test]
    fn test_short_state_is_rejected() {
        let event = StopEvent::capture(CaptureMetric::Euclidean { dimension: 2 }, FLAT_CAPTURE_RADIUS);
        assert!(matches!(
            event.value(0.0, &[0.0, 0.0, 1.0]),
            Err(PursuitError::DimensionMismatch { expected: 4, actual: 3, .. })
        ));
        assert!((event.value(0.0, &[0.0, 0.0, 3.0, 4.0]).unwrap() - 4.5).abs() < 1e-12);

        let sphere = StopEvent::capture(CaptureMetric::GreatCircle, CURVED_CAPTURE_THRESHOLD);
        assert!(sphere.value(0.0, &[5.0, 0.3, 1.0, 5.0]).is_err());
        let shape = TorusShape::new(2.0, 1.0).unwrap();
        let torus = CaptureMetric::Torus { shape };
        assert_eq!(torus.state_len(), 4);
        assert!(torus.distance(&[0.0, 0.0]).is_err());
    }

    #[test]
    fn test_with_threshold_validation() {
        let event = StopEvent::capture(CaptureMetric::Euclidean { dimension: 3 }, 0.5);
        assert_eq!(event.with_threshold(1.0).unwrap().threshold, 1.0);
        assert!(event.with_threshold(0.0).is_err());
        assert!(event.with_threshold(f64::NAN).is_err());
    }
}
