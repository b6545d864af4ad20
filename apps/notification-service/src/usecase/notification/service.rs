//! # 通知サービス
//!
//! Webhook のリクエストボディから送信までを統合する配信ゲート。
//!
//! ## 判定の順序
//!
//! 1. ボディのパース（不正な JSON → `invalid_payload`）
//! 2. レコード自身の判定（報告書の削除 → `report_deleted`、下書き → `draft`）
//! 3. 送信プロバイダの資格情報（未設定 → `missing_credentials`）
//! 4. 子行・一括イベントの親報告書（下書き → `draft`）
//! 5. 報告書単位のスロットル（送信済み → `throttled`、判定エラーは通過させる）
//! 6. 本文生成（スキップ → 各理由）
//! 7. 宛先解決（空 → 既定の配信リスト）
//! 8. 送信（失敗・タイムアウト → `delivery_failed`）
//!
//! ## 設計方針
//!
//! - **fire-and-forget**: `handle()` はエラーを返さず、結果は [`DeliveryOutcome`] だけ
//! - **再送なし**: 失敗した通知はログに残して破棄する

use std::{sync::Arc, time::Duration};

use worklog_notify_domain::{
    change_event::{BatchedEnvelope, ChangeEvent, Operation, SourceTable, WebhookPayload},
    notification::{ContentResult, EmailMessage, NotificationError, SkipReason},
    report::{ReportHeader, ReportId},
};
use worklog_notify_infra::{
    notification::NotificationSender,
    repository::{NotificationThrottleRepository, ReportRepository, UserProfileRepository},
};
use worklog_notify_shared::{
    event_log::{error as log_error, event},
    log_business_event,
};

use super::{
    builder::ContentBuilder,
    context::{ENRICHMENT_TIMEOUT, ProfileDirectory, ReportContextLoader},
    recipient::{RecipientPolicy, RecipientResolver, dedup},
    template_renderer::TemplateRenderer,
};

/// 送信プロバイダ呼び出しの制限時間
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(8);

/// 同一報告書に対する送信間隔
pub const THROTTLE_WINDOW: Duration = Duration::from_secs(3);

/// 1 リクエストの処理結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    Suppressed(SkipReason),
}

impl DeliveryOutcome {
    /// レスポンスボディ（`ok` / `skip`）
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "ok",
            Self::Suppressed(_) => "skip",
        }
    }
}

/// 本文と宛先に関する設定
#[derive(Debug, Clone)]
pub struct NotificationSettings {
    /// 報告書などへのリンクの基点 URL
    pub base_url: String,
    pub policy:   RecipientPolicy,
}

/// 通知サービス
pub struct NotificationService {
    sender:           Arc<dyn NotificationSender>,
    throttle:         Arc<dyn NotificationThrottleRepository>,
    content:          ContentBuilder,
    recipients:       RecipientResolver,
    delivery_timeout: Duration,
}

/// ログ出力用のイベント識別情報
struct EventScope {
    entity_type: String,
    entity_id:   Option<ReportId>,
}

impl NotificationService {
    pub fn new(
        sender: Arc<dyn NotificationSender>,
        reports: Arc<dyn ReportRepository>,
        profiles: Arc<dyn UserProfileRepository>,
        throttle: Arc<dyn NotificationThrottleRepository>,
        template_renderer: TemplateRenderer,
        settings: NotificationSettings,
    ) -> Self {
        let profiles = ProfileDirectory::new(profiles);
        let content = ContentBuilder::new(
            template_renderer,
            ReportContextLoader::new(reports),
            profiles.clone(),
            settings.base_url,
        );
        Self {
            sender,
            throttle,
            content,
            recipients: RecipientResolver::new(settings.policy, profiles),
            delivery_timeout: DELIVERY_TIMEOUT,
        }
    }

    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Webhook のリクエストボディを処理する（fire-and-forget）
    pub async fn handle(&self, body: &[u8]) -> DeliveryOutcome {
        let payload = match WebhookPayload::parse(body) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "リクエストボディを JSON として解釈できない");
                let scope = EventScope {
                    entity_type: String::new(),
                    entity_id:   None,
                };
                return self.finish(&scope, Err(SkipReason::InvalidPayload));
            }
        };

        match &payload {
            WebhookPayload::Single(event) => {
                let scope = EventScope {
                    entity_type: event.table.as_str().to_string(),
                    entity_id:   event.report_id(),
                };
                let result = self.process_event(event).await;
                self.finish(&scope, result)
            }
            WebhookPayload::Batched(envelope) => {
                let scope = EventScope {
                    entity_type: SourceTable::WorkLogs.as_str().to_string(),
                    entity_id:   Some(envelope.report_id),
                };
                let result = self.process_batch(envelope).await;
                self.finish(&scope, result)
            }
        }
    }

    async fn process_event(&self, event: &ChangeEvent) -> Result<usize, SkipReason> {
        if event.table == SourceTable::WorkLogs && event.operation == Operation::Delete {
            return Err(SkipReason::ReportDeleted);
        }
        if event.table.is_report_scoped() && event.record.flag("is_draft") {
            return Err(SkipReason::Draft);
        }
        self.ensure_configured()?;

        let report_id = event.report_id();
        let parent = match report_id {
            Some(id) if event.table.is_report_child() => self.content.reports().header(id).await,
            _ => None,
        };
        ensure_not_draft(parent.as_ref())?;
        if let Some(id) = report_id {
            self.acquire_slot(id).await?;
        }

        let content = self.content.build(event, parent.as_ref()).await;
        let content = ready(content)?;
        let recipients = self.recipients.resolve(event).await;
        self.deliver(content, recipients).await
    }

    async fn process_batch(&self, envelope: &BatchedEnvelope) -> Result<usize, SkipReason> {
        let headers = envelope
            .events
            .iter()
            .filter(|event| event.table == SourceTable::WorkLogs);
        for header in headers {
            if header.operation == Operation::Delete {
                return Err(SkipReason::ReportDeleted);
            }
            if header.record.flag("is_draft") {
                return Err(SkipReason::Draft);
            }
        }
        self.ensure_configured()?;

        let parent = self.content.reports().header(envelope.report_id).await;
        ensure_not_draft(parent.as_ref())?;
        self.acquire_slot(envelope.report_id).await?;

        let content = self.content.build_digest(envelope, parent.as_ref()).await;
        let content = ready(content)?;
        self.deliver(content, self.recipients.default_recipients()).await
    }

    fn ensure_configured(&self) -> Result<(), SkipReason> {
        if self.sender.is_configured() {
            Ok(())
        } else {
            Err(SkipReason::MissingCredentials)
        }
    }

    /// スロットルの送信枠を取る
    ///
    /// 判定自体の失敗・タイムアウトは「送信可」として扱う。
    async fn acquire_slot(&self, report_id: ReportId) -> Result<(), SkipReason> {
        let acquired = tokio::time::timeout(
            ENRICHMENT_TIMEOUT,
            self.throttle.try_acquire(report_id, THROTTLE_WINDOW),
        )
        .await;

        match acquired {
            Ok(Ok(true)) => Ok(()),
            Ok(Ok(false)) => Err(SkipReason::Throttled),
            Ok(Err(e)) => {
                tracing::warn!(
                    error.category = log_error::category::INFRASTRUCTURE,
                    error.kind = log_error::kind::THROTTLE,
                    %report_id,
                    "スロットルの判定に失敗したため送信を続行: {}",
                    e
                );
                Ok(())
            }
            Err(_) => {
                tracing::warn!(
                    error.category = log_error::category::INFRASTRUCTURE,
                    error.kind = log_error::kind::TIMEOUT,
                    %report_id,
                    "スロットルの判定がタイムアウトしたため送信を続行"
                );
                Ok(())
            }
        }
    }

    /// 送信する（成功時は宛先数を返す）
    async fn deliver(
        &self,
        content: ReadyContent,
        recipients: Vec<String>,
    ) -> Result<usize, SkipReason> {
        let recipients = if recipients.is_empty() {
            self.recipients.default_recipients()
        } else {
            dedup(recipients)
        };
        if recipients.is_empty() {
            tracing::warn!("既定の配信リストが空のため送信しない");
            return Err(SkipReason::NotNotifiable);
        }

        let email = EmailMessage {
            to:        recipients,
            subject:   content.subject,
            html_body: content.html,
            text_body: content.text,
        };

        let sent = tokio::time::timeout(self.delivery_timeout, self.sender.send_email(&email))
            .await
            .unwrap_or_else(|_| {
                Err(NotificationError::Timeout(format!(
                    "{}ms",
                    self.delivery_timeout.as_millis()
                )))
            });

        match sent {
            Ok(()) => Ok(email.to.len()),
            Err(e) => {
                tracing::error!(
                    error.category = log_error::category::EXTERNAL_SERVICE,
                    error.kind = log_error::kind::DELIVERY,
                    recipients = email.to.len(),
                    subject = %email.subject,
                    "通知メールの送信に失敗: {}",
                    e
                );
                Err(SkipReason::DeliveryFailed)
            }
        }
    }

    fn finish(&self, scope: &EventScope, result: Result<usize, SkipReason>) -> DeliveryOutcome {
        match result {
            Ok(recipients) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_SENT,
                    event.entity_type = %scope.entity_type,
                    event.entity_id = ?scope.entity_id,
                    event.result = event::result::SUCCESS,
                    notification.recipients = recipients,
                    "通知メール送信成功"
                );
                DeliveryOutcome::Sent
            }
            Err(SkipReason::DeliveryFailed) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_FAILED,
                    event.entity_type = %scope.entity_type,
                    event.entity_id = ?scope.entity_id,
                    event.result = event::result::FAILURE,
                    notification.reason = %SkipReason::DeliveryFailed,
                    "通知メール送信失敗"
                );
                DeliveryOutcome::Suppressed(SkipReason::DeliveryFailed)
            }
            Err(reason) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_SUPPRESSED,
                    event.entity_type = %scope.entity_type,
                    event.entity_id = ?scope.entity_id,
                    event.result = event::result::SKIPPED,
                    notification.reason = %reason,
                    "通知を抑止"
                );
                DeliveryOutcome::Suppressed(reason)
            }
        }
    }
}

/// 送信可能な本文
struct ReadyContent {
    subject: String,
    text:    String,
    html:    String,
}

fn ready(content: Result<ContentResult, NotificationError>) -> Result<ReadyContent, SkipReason> {
    match content {
        Ok(ContentResult::Ready {
            subject,
            text,
            html,
        }) => Ok(ReadyContent {
            subject,
            text,
            html,
        }),
        Ok(ContentResult::Skip(reason)) => Err(reason),
        Err(e) => {
            tracing::error!(
                error.category = log_error::category::INFRASTRUCTURE,
                error.kind = log_error::kind::INTERNAL,
                "通知本文の生成に失敗: {}",
                e
            );
            Err(SkipReason::UnexpectedError)
        }
    }
}

fn ensure_not_draft(parent: Option<&ReportHeader>) -> Result<(), SkipReason> {
    if parent.is_some_and(|header| header.is_draft) {
        Err(SkipReason::Draft)
    } else {
        Ok(())
    }
}
