//! # ユーザー
//!
//! プロフィールストアが管理するユーザー情報。通知では表示名と宛先の解決にのみ使う。

define_uuid_id! {
    /// ユーザー ID
    ///
    /// プロフィールストアの主キー。
    pub struct UserId;
}

/// ユーザープロフィール
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id:           UserId,
    pub name:         String,
    pub email:        String,
    /// 職位（例: "과장"）
    pub position:     String,
    pub is_team_lead: bool,
}
