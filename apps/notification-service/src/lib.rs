//! # 通知サービス ライブラリ
//!
//! 報告書・予定・休暇申請などの変更イベントを受け取り、メール通知に変換する。
//! ルーター構築を公開し、統合テストから HTTP 経由で検証できるようにする。

pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use handler::{MAX_WEBHOOK_BODY_BYTES, WebhookState, health_check, receive_webhook};
use tower_http::trace::TraceLayer;

/// ルーターを構築する
///
/// 本文の上限超過はハンドラ側で `skip` に変換する。
pub fn router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/", post(receive_webhook))
        .route("/send-notification-email", post(receive_webhook))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_WEBHOOK_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
}
