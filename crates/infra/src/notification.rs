//! # 通知送信
//!
//! メール通知の送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `NotificationSender` trait でメール送信を抽象化
//! - **2 つの実装**: Resend 互換 HTTPS API（本番用）、Noop（ローカル開発用）
//! - **環境変数切替**: `NOTIFICATION_BACKEND` でランタイム選択

mod noop;
mod resend;

use async_trait::async_trait;
pub use noop::NoopNotificationSender;
pub use resend::ResendNotificationSender;
use worklog_notify_domain::notification::{EmailMessage, NotificationError};

/// メール送信トレイト
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// メールを送信する
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError>;

    /// 送信に必要な資格情報が揃っているか
    ///
    /// `false` の場合、パイプラインは外部呼び出しの前に通知を抑止する。
    fn is_configured(&self) -> bool {
        true
    }
}
