//! # WorkLog 通知ドメイン層
//!
//! データベースのトリガー層から届く変更イベントと、そこから導かれる
//! 通知メールのドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **ゆるい入力、厳密な内部表現**: トリガー層のペイロードは欠損・型揺れが
//!   ありうるため、境界で安全な既定値へ寄せてから型付きの値に変換する
//! - **I/O を持たない**: リポジトリやメール送信はインフラ層の責務
//!
//! ## 依存関係の方向
//!
//! ```text
//! notification-service → infra → domain
//!                  ↘       ↓
//!                    shared
//! ```
//!
//! ## モジュール構成
//!
//! - [`record`] - 型の緩いフィールドマップと値の正規化
//! - [`change_event`] - 変更イベント、一括エンベロープ、Webhook ペイロード
//! - [`report`] - 出張報告書のヘッダー、参加者、責任者推定、作業期間
//! - [`user`] - ユーザープロフィール
//! - [`notification`] - メールメッセージ、通知種別、スキップ理由

#[macro_use]
mod macros;

pub mod change_event;
pub mod notification;
pub mod record;
pub mod report;
pub mod user;
