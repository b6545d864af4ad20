//! # 宛先解決
//!
//! 変更イベントから送信先メールアドレスの一覧を決める。
//!
//! | テーブル | 条件 | 宛先 |
//! |---------|------|------|
//! | 일정 | 任意 | 既定の配信リスト |
//! | 報告書・子行 | 任意 | 既定の配信リスト |
//! | 휴가 | INSERT | 承認者 |
//! | 휴가 | UPDATE で status が approved に変化 | 申請者本人（引けなければ空） |
//! | 휴가 | その他 | 空 |
//! | 汎用通知 | 旅券期限 | 既定の配信リスト + 対象ユーザー |
//! | 汎用通知 | 車両検査 | 既定の配信リスト |
//! | 汎用通知 | その他 | 空 |
//! | 未知のテーブル | - | 既定の配信リスト |
//!
//! 空の一覧はパイプライン側で既定の配信リストに置き換えられる。

use itertools::Itertools;
use worklog_notify_domain::{
    change_event::{ChangeEvent, Operation, SourceTable},
    notification::NotificationMeta,
};

use super::context::{ProfileDirectory, user_id_of};

/// 固定の宛先設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientPolicy {
    /// 既定の配信リスト
    pub default_recipients: Vec<String>,
    /// 休暇申請の承認者
    pub vacation_approver:  String,
}

/// 宛先リゾルバ
#[derive(Clone)]
pub struct RecipientResolver {
    policy:   RecipientPolicy,
    profiles: ProfileDirectory,
}

impl RecipientResolver {
    pub fn new(policy: RecipientPolicy, profiles: ProfileDirectory) -> Self {
        Self { policy, profiles }
    }

    /// 既定の配信リスト
    pub fn default_recipients(&self) -> Vec<String> {
        dedup(self.policy.default_recipients.clone())
    }

    /// イベントの宛先一覧を返す（重複除去済み、空もあり得る）
    pub async fn resolve(&self, event: &ChangeEvent) -> Vec<String> {
        match &event.table {
            SourceTable::Vacations => self.resolve_vacation(event).await,
            SourceTable::Notifications => self.resolve_generic(event).await,
            _ => self.default_recipients(),
        }
    }

    async fn resolve_vacation(&self, event: &ChangeEvent) -> Vec<String> {
        let approved = event
            .changes
            .as_ref()
            .is_some_and(|changes| changes.changed_to("status", "approved"));

        match event.operation {
            Operation::Insert => dedup(vec![self.policy.vacation_approver.clone()]),
            Operation::Update if approved => {
                let requester = user_id_of(&event.record, "user_id");
                let email = self.profiles.user_email(requester.as_ref()).await;
                dedup(vec![email])
            }
            _ => Vec::new(),
        }
    }

    async fn resolve_generic(&self, event: &ChangeEvent) -> Vec<String> {
        let meta = NotificationMeta::parse(event.record.get("meta"));
        match meta.kind() {
            Some(kind) if kind.is_passport() => {
                let subject_user = user_id_of(&event.record, "user_id");
                let email = self.profiles.user_email(subject_user.as_ref()).await;
                let mut recipients = self.policy.default_recipients.clone();
                recipients.push(email);
                dedup(recipients)
            }
            Some(kind) if kind.is_vehicle_inspection() => self.default_recipients(),
            _ => Vec::new(),
        }
    }
}

/// 空のアドレスを除き、最初の出現を残して重複を除去する
pub fn dedup(addresses: Vec<String>) -> Vec<String> {
    addresses
        .into_iter()
        .map(|address| address.trim().to_string())
        .filter(|address| !address.is_empty())
        .unique()
        .collect()
}
