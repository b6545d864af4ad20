//! # 通知サービスのエラー定義
//!
//! パイプライン内部のエラーはすべて抑止理由（`SkipReason`）に変換されるため、
//! ここで扱うのは最外周の境界でしか観測されないエラーだけ。

use thiserror::Error;

/// 最外周の境界で観測されるエラー
#[derive(Debug, Error)]
pub enum PipelineError {
    /// パイプラインのタスクが panic した、または中断された
    #[error("通知タスクが異常終了しました: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

impl PipelineError {
    /// panic による終了か
    pub fn is_panic(&self) -> bool {
        match self {
            Self::TaskFailed(e) => e.is_panic(),
        }
    }
}
