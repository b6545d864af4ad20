//! Resend 通知送信実装
//!
//! Resend 互換の HTTPS API（`POST /emails`）でメールを送信する。
//! 2xx 以外の応答は本文ごと [`NotificationError::ProviderRejected`] として返す。

use async_trait::async_trait;
use serde::Serialize;
use worklog_notify_domain::notification::{EmailMessage, NotificationError};

use super::NotificationSender;

/// 送信 API のリクエストボディ
#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from:    &'a str,
    to:      &'a [String],
    subject: &'a str,
    text:    &'a str,
    html:    &'a str,
}

/// Resend 通知送信
///
/// API キーが未設定の場合は [`is_configured`](NotificationSender::is_configured) が
/// `false` を返し、送信は行われない。
pub struct ResendNotificationSender {
    client:       reqwest::Client,
    api_url:      String,
    api_key:      Option<String>,
    from_address: String,
}

impl ResendNotificationSender {
    /// 新しい送信インスタンスを作成
    ///
    /// - `api_url`: 送信エンドポイント（例: `https://api.resend.com/emails`）
    /// - `api_key`: Bearer 認証に使う API キー（空文字列は未設定として扱う）
    /// - `from_address`: 送信元（表示名付きでも可）
    pub fn new(
        client: reqwest::Client,
        api_url: impl Into<String>,
        api_key: Option<String>,
        from_address: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            from_address: from_address.into(),
        }
    }
}

#[async_trait]
impl NotificationSender for ResendNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        let Some(api_key) = &self.api_key else {
            return Err(NotificationError::SendFailed(
                "API キーが設定されていません".to_string(),
            ));
        };

        let request = SendEmailRequest {
            from:    &self.from_address,
            to:      &email.to,
            subject: &email.subject,
            text:    &email.text_body,
            html:    &email.html_body,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotificationError::Timeout(e.to_string())
                } else {
                    NotificationError::SendFailed(format!("送信リクエスト失敗: {e}"))
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotificationError::ProviderRejected {
            status: status.as_u16(),
            body,
        })
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
