//! # ヘルスチェックハンドラ
//!
//! ```text
//! GET /health
//! ```

use axum::Json;
use worklog_notify_shared::HealthResponse;

/// ヘルスチェックエンドポイント
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status:  "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
