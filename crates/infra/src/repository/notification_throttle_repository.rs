//! # NotificationThrottleRepository
//!
//! 報告書ごとの送信間隔を原子的に判定する。
//!
//! `try_acquire_notification_slot` 関数は単一の
//! `INSERT ... ON CONFLICT ... DO UPDATE ... WHERE ... RETURNING` 文で、
//! ウィンドウ内に送信済みかどうかの確認と送信時刻の記録を同時に行う。
//! 同じ報告書に対する同時リクエストは、先にコミットした 1 件だけが `true` を得る。

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use worklog_notify_domain::report::ReportId;

use crate::error::InfraError;

/// 送信スロットルリポジトリトレイト
#[async_trait]
pub trait NotificationThrottleRepository: Send + Sync {
    /// 送信枠を取得する
    ///
    /// - `Ok(true)`: ウィンドウ内で最初の送信（送信時刻を記録済み）
    /// - `Ok(false)`: ウィンドウ内に送信済み
    async fn try_acquire(&self, report_id: ReportId, window: Duration)
    -> Result<bool, InfraError>;
}

/// PostgreSQL 実装の NotificationThrottleRepository
#[derive(Debug, Clone)]
pub struct PostgresNotificationThrottleRepository {
    pool: PgPool,
}

impl PostgresNotificationThrottleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationThrottleRepository for PostgresNotificationThrottleRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%report_id))]
    async fn try_acquire(
        &self,
        report_id: ReportId,
        window: Duration,
    ) -> Result<bool, InfraError> {
        let window_seconds = i32::try_from(window.as_secs()).unwrap_or(i32::MAX);

        let acquired = sqlx::query_scalar::<_, bool>(
            "SELECT try_acquire_notification_slot($1, $2)",
        )
        .bind(report_id.as_i64())
        .bind(window_seconds)
        .fetch_one(&self.pool)
        .await?;

        Ok(acquired)
    }
}
