use crate::error::PursuitError;
use crate::solver::event::EventRecord;

/// 積分の終了理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// 時間区間の終端まで到達した
    Completed,
    /// 終端イベントで打ち切られた
    TerminalEvent,
}

/// ソルバーの統計情報
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    /// 導関数の評価回数
    pub nfev: usize,
    /// 受理されたステップ数
    pub accepted_steps: usize,
    /// 棄却されたステップ数
    pub rejected_steps: usize,
}

/// 1ステップ分の連続補間多項式
///
/// `y(t_old + x·h) = y_old + h · Σ_k q[k]·x^(k+1)` （x ∈ [0, 1]）
#[derive(Debug, Clone)]
pub(crate) struct DenseSegment {
    pub t_old: f64,
    pub h: f64,
    pub y_old: Vec<f64>,
    pub q: Vec<[f64; 4]>,
}

impl DenseSegment {
    pub fn evaluate(&self, t: f64) -> Vec<f64> {
        let x = (t - self.t_old) / self.h;
        self.y_old
            .iter()
            .zip(&self.q)
            .map(|(y0, q)| {
                // Horner: x·(q0 + x·(q1 + x·(q2 + x·q3)))
                let poly = x * (q[0] + x * (q[1] + x * (q[2] + x * q[3])));
                y0 + self.h * poly
            })
            .collect()
    }
}

/// 解いた区間全体の連続解
///
/// 状態を持たない評価器なので、何度でも任意の順序で評価できます。
#[derive(Debug, Clone)]
pub struct DenseOutput {
    segments: Vec<DenseSegment>,
    initial: Vec<f64>,
    t_start: f64,
    t_end: f64,
}

impl DenseOutput {
    pub(crate) fn new(initial: Vec<f64>, t_start: f64) -> Self {
        Self {
            segments: Vec::new(),
            initial,
            t_start,
            t_end: t_start,
        }
    }

    pub(crate) fn push(&mut self, segment: DenseSegment, t_end: f64) {
        self.segments.push(segment);
        self.t_end = t_end;
    }

    /// 評価可能な区間 `(t_start, t_end)`
    pub fn span(&self) -> (f64, f64) {
        (self.t_start, self.t_end)
    }

    /// 時刻 `t` の状態を評価
    pub fn evaluate(&self, t: f64) -> Result<Vec<f64>, PursuitError> {
        let slack = 1e-12 * self.t_start.abs().max(self.t_end.abs()).max(1.0);
        if !(t >= self.t_start - slack && t <= self.t_end + slack) {
            return Err(PursuitError::OutOfSolvedSpan {
                t,
                start: self.t_start,
                end: self.t_end,
            });
        }
        if self.segments.is_empty() {
            return Ok(self.initial.clone());
        }

        let index = self
            .segments
            .partition_point(|segment| segment.t_old <= t)
            .saturating_sub(1);
        Ok(self.segments[index].evaluate(t))
    }
}

/// 初期値問題の解
#[derive(Debug, Clone)]
pub struct Solution {
    /// ソルバーが選んだ時刻列（先頭は初期時刻、終端イベント時は末尾がイベント時刻）
    pub t: Vec<f64>,
    /// 各時刻の状態
    pub y: Vec<Vec<f64>>,
    pub status: SolveStatus,
    /// 検出されたイベント（非終端イベントは複数ありうる）
    pub events: Vec<EventRecord>,
    pub stats: SolverStats,
    pub(crate) dense: Option<DenseOutput>,
}

impl Solution {
    /// 連続解を時刻 `t` で評価
    pub fn sol(&self, t: f64) -> Result<Vec<f64>, PursuitError> {
        self.dense
            .as_ref()
            .ok_or(PursuitError::DenseOutputUnavailable)?
            .evaluate(t)
    }

    pub fn dense_output(&self) -> Option<&DenseOutput> {
        self.dense.as_ref()
    }

    /// 最終時刻
    pub fn final_time(&self) -> f64 {
        self.t.last().copied().unwrap_or(f64::NAN)
    }

    /// 最終状態
    pub fn final_state(&self) -> &[f64] {
        self.y.last().map(Vec::as_slice).unwrap_or(&[])
    }

    /// 保存された時刻点の数
    pub fn step_count(&self) -> usize {
        self.t.len()
    }

    pub fn terminated_by_event(&self) -> bool {
        self.status == SolveStatus::TerminalEvent
    }

    /// 解いた区間を `frames` 個の等間隔時刻で遅延評価するイテレーター
    pub fn samples(
        &self,
        frames: usize,
    ) -> impl Iterator<Item = Result<(f64, Vec<f64>), PursuitError>> + '_ {
        let start = self.t.first().copied().unwrap_or(0.0);
        let end = self.final_time();
        let step = if frames > 1 {
            (end - start) / (frames - 1) as f64
        } else {
            0.0
        };
        (0..frames).map(move |i| {
            // 末尾は丸め誤差で区間外に出ないよう終端時刻そのものを使う
            let t = if i + 1 == frames && frames > 1 {
                end
            } else {
                start + step * i as f64
            };
            self.sol(t).map(|y| (t, y))
        })
    }

    /// 描画用に `frames` 個の等間隔時刻で再サンプリング
    pub fn resample(&self, frames: usize) -> Result<Vec<(f64, Vec<f64>)>, PursuitError> {
        self.samples(frames).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_segment(t_old: f64, h: f64, y_old: f64, slope: f64) -> DenseSegment {
        DenseSegment {
            t_old,
            h,
            y_old: vec![y_old],
            q: vec![[slope, 0.0, 0.0, 0.0]],
        }
    }

    fn linear_dense() -> DenseOutput {
        let mut dense = DenseOutput::new(vec![0.0], 0.0);
        dense.push(linear_segment(0.0, 1.0, 0.0, 2.0), 1.0);
        dense.push(linear_segment(1.0, 0.5, 2.0, -1.0), 1.5);
        dense
    }

    #[test]
    fn test_dense_output_picks_segment() {
        let dense = linear_dense();
        assert!((dense.evaluate(0.5).unwrap()[0] - 1.0).abs() < 1e-12);
        assert!((dense.evaluate(1.0).unwrap()[0] - 2.0).abs() < 1e-12);
        assert!((dense.evaluate(1.5).unwrap()[0] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_dense_output_rejects_outside_span() {
        let dense = linear_dense();
        assert!(matches!(
            dense.evaluate(2.0),
            Err(PursuitError::OutOfSolvedSpan { .. })
        ));
        assert!(dense.evaluate(-0.1).is_err());
    }

    #[test]
    fn test_resample_hits_both_ends() {
        let solution = Solution {
            t: vec![0.0, 1.0, 1.5],
            y: vec![vec![0.0], vec![2.0], vec![1.5]],
            status: SolveStatus::Completed,
            events: Vec::new(),
            stats: SolverStats::default(),
            dense: Some(linear_dense()),
        };
        let frames = solution.resample(4).unwrap();
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0].0, 0.0);
        assert_eq!(frames[3].0, 1.5);
        assert!((frames[1].1[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sol_without_dense_output() {
        let solution = Solution {
            t: vec![0.0],
            y: vec![vec![1.0]],
            status: SolveStatus::Completed,
            events: Vec::new(),
            stats: SolverStats::default(),
            dense: None,
        };
        assert_eq!(solution.sol(0.0), Err(PursuitError::DenseOutputUnavailable));
        assert_eq!(solution.final_state(), &[1.0]);
    }
}
