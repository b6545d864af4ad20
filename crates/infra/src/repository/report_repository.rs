//! # ReportRepository
//!
//! 出張報告書（`work_logs`）と関連行の読み取りを担当する。
//!
//! 通知本文の補強と下書き判定にのみ使う。書き込みは行わない。
//!
//! ## 参照するテーブル
//!
//! | テーブル | 用途 |
//! |---------|------|
//! | `work_logs` | ヘッダー（作成者、件名、下書きフラグ） |
//! | `work_log_persons` + `profiles` | 参加者と職位 |
//! | `work_log_entries` | 作業期間 |

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;
use worklog_notify_domain::{
    report::{EntryPeriod, Participant, ReportHeader, ReportId},
    user::UserId,
};

use crate::error::InfraError;

/// 報告書リポジトリトレイト
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// 報告書ヘッダーを取得する
    async fn find_header(&self, id: ReportId) -> Result<Option<ReportHeader>, InfraError>;

    /// 参加者一覧を名前順で取得する
    ///
    /// プロフィールに一致しない参加者は職位なしで返す。
    async fn list_participants(&self, id: ReportId) -> Result<Vec<Participant>, InfraError>;

    /// 作業行の開始日・終了日を取得する
    async fn list_entry_periods(&self, id: ReportId) -> Result<Vec<EntryPeriod>, InfraError>;
}

#[derive(sqlx::FromRow)]
struct HeaderRow {
    id:         i64,
    author:     String,
    subject:    String,
    purpose:    String,
    location:   String,
    is_draft:   bool,
    created_by: Option<Uuid>,
}

impl From<HeaderRow> for ReportHeader {
    fn from(row: HeaderRow) -> Self {
        Self {
            id:         ReportId::new(row.id),
            author:     row.author,
            subject:    row.subject,
            purpose:    row.purpose,
            location:   row.location,
            is_draft:   row.is_draft,
            created_by: row.created_by.map(UserId::from_uuid),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ParticipantRow {
    name:         String,
    position:     String,
    is_team_lead: bool,
}

#[derive(sqlx::FromRow)]
struct PeriodRow {
    date_from: String,
    date_to:   String,
}

/// PostgreSQL 実装の ReportRepository
#[derive(Debug, Clone)]
pub struct PostgresReportRepository {
    pool: PgPool,
}

impl PostgresReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportRepository for PostgresReportRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_header(&self, id: ReportId) -> Result<Option<ReportHeader>, InfraError> {
        let row = sqlx::query_as::<_, HeaderRow>(
            r#"
            SELECT
                id,
                COALESCE(author, '')      AS author,
                COALESCE(subject, '')     AS subject,
                COALESCE(purpose, '')     AS purpose,
                COALESCE(location, '')    AS location,
                COALESCE(is_draft, false) AS is_draft,
                created_by
            FROM work_logs
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ReportHeader::from))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn list_participants(&self, id: ReportId) -> Result<Vec<Participant>, InfraError> {
        // 同名プロフィールが複数ある場合はチームリーダーを優先する
        let rows = sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT DISTINCT ON (p.person_name)
                p.person_name                          AS name,
                COALESCE(pr.position, '')              AS position,
                COALESCE(pr.is_team_lead, false)       AS is_team_lead
            FROM work_log_persons p
            LEFT JOIN profiles pr ON pr.name = p.person_name
            WHERE p.work_log_id = $1
              AND COALESCE(TRIM(p.person_name), '') <> ''
            ORDER BY p.person_name, pr.is_team_lead DESC NULLS LAST
            "#,
        )
        .bind(id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Participant::new(row.name, row.position, row.is_team_lead))
            .collect())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn list_entry_periods(&self, id: ReportId) -> Result<Vec<EntryPeriod>, InfraError> {
        let rows = sqlx::query_as::<_, PeriodRow>(
            r#"
            SELECT
                COALESCE(date_from::text, '') AS date_from,
                COALESCE(date_to::text, '')   AS date_to
            FROM work_log_entries
            WHERE work_log_id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| EntryPeriod::new(row.date_from, row.date_to))
            .collect())
    }
}
