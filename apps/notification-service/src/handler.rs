//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! - ハンドラは薄く保ち、判定と送信はユースケース層に委譲する

pub mod health;
pub mod webhook;

pub use health::health_check;
pub use webhook::{MAX_WEBHOOK_BODY_BYTES, WebhookState, receive_webhook};
