//! # ユースケース層
//!
//! Webhook で受け取った変更イベントをメール通知に変換するユースケースを提供する。

pub mod notification;

pub use notification::{DeliveryOutcome, NotificationService, NotificationSettings};
