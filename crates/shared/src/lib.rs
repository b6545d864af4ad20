//! # WorkLog 通知 共有ユーティリティ
//!
//! 通知サービスとインフラ層で共通に使うユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - 外部クレートへの依存は最小限に抑える（トレーシング関連は feature で有効化）

pub mod event_log;
pub mod health;
pub mod observability;

pub use health::HealthResponse;
