//! # Error モジュール
//!
//! 追跡シミュレーションのコア（戦略・ソルバー・ドライバー）が返すエラー型です。
//! 正常な追跡計算は全域関数なので、ここに現れるのは設定ミスと数値積分の破綻のみです。

use thiserror::Error;

/// コア処理のエラー
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PursuitError {
    /// 構築時に検出された不正な設定
    #[error("不正な設定: {0}")]
    InvalidConfiguration(String),

    /// 状態ベクトルや速度設定の次元不一致
    #[error("次元不一致 ({context}): 期待値 {expected}, 実際 {actual}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// 積分器の失敗（非有限値、刻み幅の下限割れなど）
    #[error("積分エラー: {0}")]
    Integration(String),

    /// 解いた区間の外で連続解を評価しようとした
    #[error("時刻 {t} は解の区間 [{start}, {end}] の外です")]
    OutOfSolvedSpan { t: f64, start: f64, end: f64 },

    /// dense_output を要求せずに解いた
    #[error("連続出力が要求されていません (dense_output = false)")]
    DenseOutputUnavailable,
}

impl PursuitError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        PursuitError::InvalidConfiguration(msg.into())
    }
}

/// 長さの検証ヘルパー
pub(crate) fn ensure_len(
    context: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), PursuitError> {
    if expected == actual {
        Ok(())
    } else {
        Err(PursuitError::DimensionMismatch {
            context,
            expected,
            actual,
        })
    }
}
