//! # UserProfileRepository
//!
//! プロフィールストア（`profiles` テーブル）からユーザー情報を読み取る。
//! 通知では表示名と宛先の解決にのみ使うため、読み取り専用。

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;
use worklog_notify_domain::user::{UserId, UserProfile};

use crate::error::InfraError;

/// プロフィールリポジトリトレイト
#[async_trait]
pub trait UserProfileRepository: Send + Sync {
    /// ID でプロフィールを検索
    ///
    /// - `Ok(Some(profile))`: 見つかった場合
    /// - `Ok(None)`: 見つからない場合
    /// - `Err(_)`: データベースエラー
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, InfraError>;
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id:           Uuid,
    name:         String,
    email:        String,
    position:     String,
    is_team_lead: bool,
}

impl From<ProfileRow> for UserProfile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id:           UserId::from_uuid(row.id),
            name:         row.name,
            email:        row.email,
            position:     row.position,
            is_team_lead: row.is_team_lead,
        }
    }
}

/// PostgreSQL 実装の UserProfileRepository
#[derive(Debug, Clone)]
pub struct PostgresUserProfileRepository {
    pool: PgPool,
}

impl PostgresUserProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserProfileRepository for PostgresUserProfileRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, InfraError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT
                id,
                COALESCE(name, '')           AS name,
                COALESCE(email, '')          AS email,
                COALESCE(position, '')       AS position,
                COALESCE(is_team_lead, false) AS is_team_lead
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserProfile::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_リポジトリはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PostgresUserProfileRepository>();
        assert_send_sync::<Box<dyn UserProfileRepository>>();
    }

    #[test]
    fn test_行からプロフィールに変換する() {
        let id = Uuid::nil();
        let profile = UserProfile::from(ProfileRow {
            id,
            name: "김철수".to_string(),
            email: "kim@example.com".to_string(),
            position: "과장".to_string(),
            is_team_lead: true,
        });

        assert_eq!(profile.id, UserId::from_uuid(id));
        assert_eq!(profile.name, "김철수");
        assert!(profile.is_team_lead);
    }
}
