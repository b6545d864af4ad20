//! # テスト用モック
//!
//! ユースケーステストと HTTP 統合テストで使用するインメモリ実装。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! worklog-notify-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use worklog_notify_domain::{
    notification::{EmailMessage, NotificationError},
    report::{EntryPeriod, Participant, ReportHeader, ReportId},
    user::{UserId, UserProfile},
};

use crate::{
    error::InfraError,
    notification::NotificationSender,
    repository::{NotificationThrottleRepository, ReportRepository, UserProfileRepository},
};

// ===== MockNotificationSender =====

/// 送信したメールを記録するモック
///
/// `Clone` で記録を共有するため、サービスに渡した後もテスト側から参照できる。
#[derive(Clone)]
pub struct MockNotificationSender {
    sent:       Arc<Mutex<Vec<EmailMessage>>>,
    attempts:   Arc<Mutex<usize>>,
    configured: bool,
    failing:    bool,
    delay:      Option<Duration>,
}

impl Default for MockNotificationSender {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNotificationSender {
    pub fn new() -> Self {
        Self {
            sent:       Arc::new(Mutex::new(Vec::new())),
            attempts:   Arc::new(Mutex::new(0)),
            configured: true,
            failing:    false,
            delay:      None,
        }
    }

    /// API キー未設定の送信者
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    /// 常にプロバイダエラーを返す送信者
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    /// 応答までに `delay` かかる送信者
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    /// 送信に成功したメール
    pub fn sent_emails(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// 送信が試行された回数（失敗を含む）
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl NotificationSender for MockNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        *self.attempts.lock().unwrap() += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(NotificationError::ProviderRejected {
                status: 500,
                body:   "mock provider failure".to_string(),
            });
        }

        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

// ===== MockUserProfileRepository =====

#[derive(Clone, Default)]
pub struct MockUserProfileRepository {
    profiles: Arc<Mutex<Vec<UserProfile>>>,
    failing:  bool,
}

impl MockUserProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 常にデータベースエラーを返すリポジトリ
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn add_profile(&self, profile: UserProfile) {
        self.profiles.lock().unwrap().push(profile);
    }
}

#[async_trait]
impl UserProfileRepository for MockUserProfileRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, InfraError> {
        if self.failing {
            return Err(InfraError::unexpected("mock profile store failure"));
        }
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .find(|p| &p.id == id)
            .cloned())
    }
}

// ===== MockReportRepository =====

#[derive(Clone, Default)]
pub struct MockReportRepository {
    headers:      Arc<Mutex<HashMap<ReportId, ReportHeader>>>,
    participants: Arc<Mutex<HashMap<ReportId, Vec<Participant>>>>,
    periods:      Arc<Mutex<HashMap<ReportId, Vec<EntryPeriod>>>>,
    failing:      bool,
    delay:        Option<Duration>,
}

impl MockReportRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 常にデータベースエラーを返すリポジトリ
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// 参加者・作業期間の取得に `delay` かかるリポジトリ
    ///
    /// ヘッダー取得（下書き判定）は遅延しない。
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn add_header(&self, header: ReportHeader) {
        self.headers.lock().unwrap().insert(header.id, header);
    }

    pub fn add_participants(&self, id: ReportId, participants: Vec<Participant>) {
        self.participants.lock().unwrap().insert(id, participants);
    }

    pub fn add_entry_periods(&self, id: ReportId, periods: Vec<EntryPeriod>) {
        self.periods.lock().unwrap().insert(id, periods);
    }

    async fn simulate(&self) -> Result<(), InfraError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(InfraError::unexpected("mock report store failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl ReportRepository for MockReportRepository {
    async fn find_header(&self, id: ReportId) -> Result<Option<ReportHeader>, InfraError> {
        if self.failing {
            return Err(InfraError::unexpected("mock report store failure"));
        }
        Ok(self.headers.lock().unwrap().get(&id).cloned())
    }

    async fn list_participants(&self, id: ReportId) -> Result<Vec<Participant>, InfraError> {
        self.simulate().await?;
        Ok(self
            .participants
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_entry_periods(&self, id: ReportId) -> Result<Vec<EntryPeriod>, InfraError> {
        self.simulate().await?;
        Ok(self
            .periods
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }
}

// ===== MockNotificationThrottleRepository =====

/// 報告書ごとの最終送信時刻をメモリに保持するスロットル
#[derive(Clone, Default)]
pub struct MockNotificationThrottleRepository {
    last_sent: Arc<Mutex<HashMap<ReportId, Instant>>>,
    calls:     Arc<Mutex<usize>>,
    failing:   bool,
}

impl MockNotificationThrottleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 常にエラーを返すスロットル
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// `try_acquire` が呼ばれた回数
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl NotificationThrottleRepository for MockNotificationThrottleRepository {
    async fn try_acquire(
        &self,
        report_id: ReportId,
        window: Duration,
    ) -> Result<bool, InfraError> {
        *self.calls.lock().unwrap() += 1;
        if self.failing {
            return Err(InfraError::unexpected("mock throttle failure"));
        }

        let now = Instant::now();
        let mut last_sent = self.last_sent.lock().unwrap();
        match last_sent.get(&report_id) {
            Some(previous) if now.duration_since(*previous) < window => Ok(false),
            _ => {
                last_sent.insert(report_id, now);
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_スロットルはウィンドウ内の二回目を拒否する() {
        let throttle = MockNotificationThrottleRepository::new();
        let window = Duration::from_secs(3);

        assert!(throttle.try_acquire(ReportId::new(9), window).await.unwrap());
        assert!(!throttle.try_acquire(ReportId::new(9), window).await.unwrap());
        assert!(throttle.try_acquire(ReportId::new(10), window).await.unwrap());
        assert_eq!(throttle.calls(), 3);
    }

    #[tokio::test]
    async fn test_スロットルはウィンドウ経過後に再び許可する() {
        let throttle = MockNotificationThrottleRepository::new();
        let window = Duration::from_millis(20);

        assert!(throttle.try_acquire(ReportId::new(9), window).await.unwrap());
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(throttle.try_acquire(ReportId::new(9), window).await.unwrap());
    }

    #[tokio::test]
    async fn test_失敗する送信者は記録せず試行回数だけ数える() {
        let sender = MockNotificationSender::failing();
        let email = EmailMessage {
            to:        vec!["team@example.com".to_string()],
            subject:   "제목".to_string(),
            html_body: String::new(),
            text_body: String::new(),
        };

        assert!(sender.send_email(&email).await.is_err());
        assert_eq!(sender.attempts(), 1);
        assert!(sender.sent_emails().is_empty());
    }
}
