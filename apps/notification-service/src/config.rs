//! # 通知サービス設定
//!
//! 環境変数から通知サービスの設定を読み込む。起動時に一度だけ読み込み、
//! 宛先アドレスは [`RecipientPolicy`] として宛先リゾルバに注入する。

use thiserror::Error;

use crate::usecase::{NotificationSettings, notification::RecipientPolicy};

const DEFAULT_API_URL: &str = "https://api.resend.com/emails";
const DEFAULT_FROM_ADDRESS: &str = "출장보고 알림 <noreply@worklog.example.com>";
const DEFAULT_BASE_URL: &str = "http://localhost:5173";
const DEFAULT_RECIPIENTS: &str = "team@worklog.example.com";
const DEFAULT_VACATION_APPROVER: &str = "approver@worklog.example.com";

/// 設定の読み込みエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    #[error("{name} の値が不正です: {value}")]
    Invalid { name: &'static str, value: String },
}

/// 送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum NotificationBackend {
    /// Resend 互換 HTTPS API
    #[default]
    Resend,
    /// 送信しない（ログ出力のみ）
    Noop,
}

/// 通知サービスの設定
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// バインドアドレス
    pub host:         String,
    /// ポート番号
    pub port:         u16,
    /// データベース接続 URL
    pub database_url: String,
    /// 通知設定
    pub notification: NotificationConfig,
}

/// 通知機能の設定
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub backend:            NotificationBackend,
    /// 送信プロバイダの API キー（未設定ならすべての通知を抑止）
    pub api_key:            Option<String>,
    pub api_url:            String,
    /// 送信元メールアドレス
    pub from_address:       String,
    /// フロントエンド URL（メール内リンク用）
    pub base_url:           String,
    /// ヘッダー画像の URL（未設定ならテキストバナー）
    pub banner_url:         Option<String>,
    /// 既定の配信リスト
    pub default_recipients: Vec<String>,
    /// 休暇申請の承認者
    pub vacation_approver:  String,
}

impl ServiceConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// 空白のみの値は未設定として扱う。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match var("NOTIFY_PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "NOTIFY_PORT",
                value,
            })?,
            None => 8080,
        };
        let backend = match var("NOTIFICATION_BACKEND") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "NOTIFICATION_BACKEND",
                value,
            })?,
            None => NotificationBackend::default(),
        };

        Ok(Self {
            host: var("NOTIFY_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            database_url: var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            notification: NotificationConfig {
                backend,
                api_key: var("RESEND_API_KEY"),
                api_url: var("RESEND_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
                from_address: var("NOTIFICATION_FROM_ADDRESS")
                    .unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
                base_url: var("NOTIFICATION_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                banner_url: var("NOTIFICATION_BANNER_URL"),
                default_recipients: split_addresses(
                    &var("NOTIFICATION_DEFAULT_RECIPIENTS")
                        .unwrap_or_else(|| DEFAULT_RECIPIENTS.to_string()),
                ),
                vacation_approver: var("NOTIFICATION_VACATION_APPROVER")
                    .unwrap_or_else(|| DEFAULT_VACATION_APPROVER.to_string()),
            },
        })
    }
}

impl NotificationConfig {
    /// 通知サービスに渡す設定
    pub fn settings(&self) -> NotificationSettings {
        NotificationSettings {
            base_url: self.base_url.clone(),
            policy:   RecipientPolicy {
                default_recipients: self.default_recipients.clone(),
                vacation_approver:  self.vacation_approver.clone(),
            },
        }
    }
}

/// カンマ区切りのアドレス一覧
fn split_addresses(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_string)
        .collect()
}
