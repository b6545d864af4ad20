//! # リポジトリ実装
//!
//! 通知パイプラインが参照する外部ストアへのアクセスを提供する。
//!
//! - プロフィール: 表示名と宛先メールアドレスの解決
//! - 報告書: 本文を補強するヘッダー・参加者・作業期間の読み取り
//! - 送信スロットル: 報告書ごとの送信間隔の原子的な判定

pub mod notification_throttle_repository;
pub mod report_repository;
pub mod user_profile_repository;

pub use notification_throttle_repository::{
    NotificationThrottleRepository,
    PostgresNotificationThrottleRepository,
};
pub use report_repository::{PostgresReportRepository, ReportRepository};
pub use user_profile_repository::{PostgresUserProfileRepository, UserProfileRepository};
