//! # 本文の補強情報
//!
//! 報告書の参加者・責任者・作業期間と、ユーザーの表示名・メールアドレスを読み込む。
//!
//! すべての問い合わせは [`ENRICHMENT_TIMEOUT`] で打ち切り、失敗やタイムアウトは
//! 警告ログを出して空の既定値に置き換える。補強情報の欠落で通知そのものは止めない。

use std::{future::Future, sync::Arc, time::Duration};

use chrono::NaiveDate;
use worklog_notify_domain::{
    record::Record,
    report::{ReportHeader, ReportId, infer_lead, work_period},
    user::{UserId, UserProfile},
};
use worklog_notify_infra::{
    InfraError,
    repository::{ReportRepository, UserProfileRepository},
};
use worklog_notify_shared::event_log::error as log_error;

use super::format::format_date_range;

/// 補強問い合わせ 1 件あたりの制限時間
pub const ENRICHMENT_TIMEOUT: Duration = Duration::from_millis(1200);

/// 問い合わせを制限時間付きで実行し、失敗時は既定値を返す
pub async fn bounded<T, F>(lookup: &'static str, limit: Duration, future: F) -> T
where
    T: Default,
    F: Future<Output = Result<T, InfraError>>,
{
    let error = match tokio::time::timeout(limit, future).await {
        Ok(Ok(value)) => return value,
        Ok(Err(e)) => e,
        Err(_) => InfraError::timeout(format!("{lookup}: {}ms", limit.as_millis())),
    };

    tracing::warn!(
        error.category = log_error::category::INFRASTRUCTURE,
        error.kind = log_error::kind::ENRICHMENT,
        lookup,
        timed_out = error.is_timeout(),
        "補強情報の取得に失敗したため既定値で続行: {}",
        error
    );
    T::default()
}

/// 報告書の補強情報
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportContext {
    pub author:       String,
    pub subject:      String,
    pub purpose:      String,
    pub location:     String,
    /// 推定した責任者の名前
    pub lead:         String,
    pub participants: Vec<String>,
    /// 作業期間（`1월 1일 ~ 1월 3일`）
    pub period:       String,
}

impl ReportContext {
    /// 基本情報の箇条書き（値のある項目のみ）
    pub fn base_details(&self) -> Vec<String> {
        let participants = self.participants.join(", ");
        [
            ("작성자", self.author.as_str()),
            ("제목", self.subject.as_str()),
            ("출장목적", self.purpose.as_str()),
            ("출장지", self.location.as_str()),
            ("책임자", self.lead.as_str()),
            ("참여자", participants.as_str()),
            ("기간", self.period.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(label, value)| format!("{label}: {value}"))
        .collect()
    }
}

/// 報告書の補強情報ローダー
#[derive(Clone)]
pub struct ReportContextLoader {
    reports: Arc<dyn ReportRepository>,
    limit:   Duration,
}

impl ReportContextLoader {
    pub fn new(reports: Arc<dyn ReportRepository>) -> Self {
        Self {
            reports,
            limit: ENRICHMENT_TIMEOUT,
        }
    }

    pub fn with_limit(mut self, limit: Duration) -> Self {
        self.limit = limit;
        self
    }

    /// 報告書ヘッダーを取得する（失敗時は `None`）
    pub async fn header(&self, id: ReportId) -> Option<ReportHeader> {
        bounded("report_header", self.limit, self.reports.find_header(id)).await
    }

    /// ヘッダーと関連行から補強情報を組み立てる
    ///
    /// 参加者と作業期間は並行して取得する。
    pub async fn load(&self, id: ReportId, header: Option<&ReportHeader>) -> ReportContext {
        let (participants, periods) = tokio::join!(
            bounded("participants", self.limit, self.reports.list_participants(id)),
            bounded("entry_periods", self.limit, self.reports.list_entry_periods(id)),
        );

        let lead = infer_lead(&participants)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        let period = work_period(&periods)
            .map(|(start, end)| format_date_range(&iso(start), &iso(end)))
            .unwrap_or_default();

        let header = header.cloned().unwrap_or_else(|| ReportHeader::empty(id));
        ReportContext {
            author: header.author,
            subject: header.subject,
            purpose: header.purpose,
            location: header.location,
            lead,
            participants: participants.into_iter().map(|p| p.name).collect(),
            period,
        }
    }
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// ユーザーの表示名・メールアドレスの参照
#[derive(Clone)]
pub struct ProfileDirectory {
    profiles: Arc<dyn UserProfileRepository>,
    limit:    Duration,
}

impl ProfileDirectory {
    pub fn new(profiles: Arc<dyn UserProfileRepository>) -> Self {
        Self {
            profiles,
            limit: ENRICHMENT_TIMEOUT,
        }
    }

    pub fn with_limit(mut self, limit: Duration) -> Self {
        self.limit = limit;
        self
    }

    async fn find(&self, id: &UserId) -> Option<UserProfile> {
        bounded("profile", self.limit, self.profiles.find_by_id(id)).await
    }

    /// 表示名（見つからなければ空文字列）
    pub async fn user_name(&self, id: Option<&UserId>) -> String {
        match id {
            Some(id) => self.find(id).await.map(|p| p.name).unwrap_or_default(),
            None => String::new(),
        }
    }

    /// メールアドレス（見つからなければ空文字列）
    pub async fn user_email(&self, id: Option<&UserId>) -> String {
        match id {
            Some(id) => self.find(id).await.map(|p| p.email.trim().to_string()).unwrap_or_default(),
            None => String::new(),
        }
    }
}

/// レコードのフィールドからユーザー ID を読む
pub fn user_id_of(record: &Record, field: &str) -> Option<UserId> {
    UserId::parse_str(&record.text(field))
}
