//! # Webhook ハンドラ
//!
//! トリガー層から変更イベントを受け取り、通知パイプラインを実行する。
//!
//! ## エンドポイント
//!
//! ```text
//! POST /
//! POST /send-notification-email
//! ```
//!
//! ## レスポンス
//!
//! 常に `200 OK`、`text/plain` で `ok`（送信済み）または `skip`（抑止）を返す。
//! 本文が [`MAX_WEBHOOK_BODY_BYTES`] を超える場合や読み取れない場合も `skip`。

use std::sync::Arc;

use axum::{
    extract::{State, rejection::BytesRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};
use bytes::Bytes;
use worklog_notify_domain::notification::SkipReason;
use worklog_notify_shared::event_log::error as log_error;

use crate::{
    error::PipelineError,
    usecase::{DeliveryOutcome, NotificationService},
};

/// 受け付ける本文の上限
pub const MAX_WEBHOOK_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Webhook ハンドラの State
pub struct WebhookState {
    pub service: Arc<NotificationService>,
}

/// 変更イベントを受け取る
///
/// パイプラインは別タスクで実行し、panic もここで `skip` に変換する。
pub async fn receive_webhook(
    State(state): State<Arc<WebhookState>>,
    body: Result<Bytes, BytesRejection>,
) -> impl IntoResponse {
    let outcome = match body {
        Ok(body) => run_pipeline(state.service.clone(), body).await,
        Err(rejection) => {
            tracing::warn!(
                notification.reason = %SkipReason::InvalidPayload,
                http.status = rejection.status().as_u16(),
                "リクエスト本文を読み取れないため通知を抑止: {}",
                rejection.body_text()
            );
            DeliveryOutcome::Suppressed(SkipReason::InvalidPayload)
        }
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        outcome.as_str(),
    )
}

async fn run_pipeline(service: Arc<NotificationService>, body: Bytes) -> DeliveryOutcome {
    tokio::spawn(async move { service.handle(&body).await })
        .await
        .map_err(PipelineError::from)
        .unwrap_or_else(|e| {
            tracing::error!(
                error.category = log_error::category::INFRASTRUCTURE,
                error.kind = log_error::kind::INTERNAL,
                panic = e.is_panic(),
                "通知パイプラインが異常終了: {}",
                e
            );
            DeliveryOutcome::Suppressed(SkipReason::UnexpectedError)
        })
}
