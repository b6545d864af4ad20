//! # 通知
//!
//! メール通知に関するドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 |
//! |---|------------|
//! | [`ContentResult`] | 本文生成の結果（送信するメール、またはスキップ） |
//! | [`SkipReason`] | 通知を抑止した理由（ログの機械可読タグ） |
//! | [`NotificationKind`] | 汎用通知の種別（`meta.kind`） |
//!
//! ## 設計方針
//!
//! - **fire-and-forget**: 通知の失敗は元の書き込みに影響しない。失敗はスキップ理由として記録する
//! - **閉じた列挙**: `meta.kind` の判定は文字列比較を散らさず [`NotificationKind`] に集約する

use serde_json::{Map, Value};
use strum::IntoStaticStr;
use thiserror::Error;

use crate::record::normalize;

/// 通知送信エラー
#[derive(Debug, Error)]
pub enum NotificationError {
    /// メール送信に失敗（ネットワークエラー等）
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),

    /// 送信プロバイダが 2xx 以外を返した
    #[error("送信プロバイダがエラーを返した: status={status}, body={body}")]
    ProviderRejected { status: u16, body: String },

    /// 送信がタイムアウトした
    #[error("メール送信がタイムアウト: {0}")]
    Timeout(String),

    /// テンプレートレンダリングに失敗
    #[error("テンプレートレンダリングに失敗: {0}")]
    TemplateFailed(String),
}

/// メールメッセージ
///
/// 本文生成と宛先解決の出力。NotificationSender に渡される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// 送信先メールアドレス（重複除去済み）
    pub to:        Vec<String>,
    /// 件名
    pub subject:   String,
    /// HTML 本文
    pub html_body: String,
    /// プレーンテキスト本文
    pub text_body: String,
}

/// 通知を抑止した理由
///
/// ログの `reason` フィールドに snake_case で出力される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// リクエストボディが JSON として不正
    InvalidPayload,
    /// 報告書が下書き状態
    Draft,
    /// 報告書ヘッダーの削除
    ReportDeleted,
    /// 送信プロバイダの API キーが未設定
    MissingCredentials,
    /// スロットル期間内に送信済み
    Throttled,
    /// 表示可能な変更が無い
    NoVisibleChanges,
    /// 未知の汎用通知種別
    UnsupportedKind,
    /// 本文生成の対象外テーブル
    UnsupportedTable,
    /// 通知対象外の操作（休暇申請の削除など）
    NotNotifiable,
    /// 送信に失敗
    DeliveryFailed,
    /// 想定外のエラー
    UnexpectedError,
}

/// 本文生成の結果
///
/// スキップ時は件名・本文を持たないため、下流で送信されることはない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentResult {
    Ready {
        subject: String,
        text:    String,
        html:    String,
    },
    Skip(SkipReason),
}

/// 汎用通知の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, strum::EnumString, strum::Display)]
pub enum NotificationKind {
    /// 旅券の有効期限が 1 年以内
    #[strum(serialize = "passport_expiry_within_1y")]
    PassportExpiryWithinOneYear,
    /// 車両検査の期限まで 2 か月
    #[strum(serialize = "vehicle_inspection_due_2m")]
    VehicleInspectionDueInTwoMonths,
    /// 車両検査の期限まで 1 か月
    #[strum(serialize = "vehicle_inspection_due_1m")]
    VehicleInspectionDueInOneMonth,
}

impl NotificationKind {
    pub fn is_passport(self) -> bool {
        matches!(self, Self::PassportExpiryWithinOneYear)
    }

    pub fn is_vehicle_inspection(self) -> bool {
        matches!(
            self,
            Self::VehicleInspectionDueInTwoMonths | Self::VehicleInspectionDueInOneMonth
        )
    }
}

/// 汎用通知の `meta` フィールド
///
/// 上流の書き手によって JSON 文字列またはオブジェクトのどちらでも届く。
/// パースに失敗した場合は種別なし（空のメタ）として扱う。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationMeta {
    kind:   Option<NotificationKind>,
    fields: Map<String, Value>,
}

impl NotificationMeta {
    pub fn parse(value: Option<&Value>) -> Self {
        let fields = match value {
            Some(Value::Object(map)) => map.clone(),
            Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => map,
                _ => Map::new(),
            },
            _ => Map::new(),
        };
        let kind = normalize(fields.get("kind")).parse().ok();
        Self { kind, fields }
    }

    pub fn kind(&self) -> Option<NotificationKind> {
        self.kind
    }

    /// メタ内の文字列フィールド
    pub fn text(&self, key: &str) -> String {
        normalize(self.fields.get(key))
    }
}
