//! # 通知ユースケース
//!
//! 変更イベントの分類・本文生成・宛先解決・送信を統合する。
//!
//! ## モジュール構成
//!
//! - [`format`] - 日付・金額・変更行などの表示用フォーマット
//! - [`context`] - 報告書の補強情報とユーザー表示名の取得
//! - [`recipient`] - 送信先の解決
//! - [`builder`] - エンティティごとの本文生成
//! - [`digest`] - 一括イベントのダイジェスト
//! - [`template_renderer`] - tera テンプレートエンジンによるメール生成
//! - [`service`] - 配信ゲート（抑止判定 + 送信）

pub mod builder;
pub mod child_row;
pub mod context;
pub mod digest;
pub mod format;
pub mod recipient;
pub mod service;
pub mod template_renderer;

pub use recipient::RecipientPolicy;
pub use service::{DeliveryOutcome, NotificationService, NotificationSettings};
pub use template_renderer::TemplateRenderer;
