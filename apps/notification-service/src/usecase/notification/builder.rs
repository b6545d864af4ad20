//! # 本文生成
//!
//! 変更イベントを件名・要約・基本情報・変更行に組み立てる。
//!
//! エンティティごとの組み立ては純粋関数（サブモジュール）で、
//! ここでは補強情報と行為者名の取得、テンプレート描画を受け持つ。
//!
//! ## 行為者名の解決順
//!
//! 1. レコードの `author`
//! 2. 子行の場合は親報告書の作成者
//! 3. `user_id` / `created_by` のプロフィール名
//! 4. `사용자`

mod calendar_event;
mod generic;
mod vacation;
mod work_log;
mod work_log_child;

use worklog_notify_domain::{
    change_event::{BatchedEnvelope, ChangeEvent, SourceTable},
    notification::{ContentResult, NotificationError, SkipReason},
    record::Record,
    report::{ReportHeader, ReportId},
};

use super::{
    child_row::ChildKind,
    digest,
    context::{ProfileDirectory, ReportContextLoader, user_id_of},
    template_renderer::{EmailAction, EmailDraft, TemplateRenderer},
};

/// 行為者名が解決できないときの表示
pub const FALLBACK_ACTOR: &str = "사용자";

/// 本文生成器
pub struct ContentBuilder {
    renderer: TemplateRenderer,
    reports:  ReportContextLoader,
    profiles: ProfileDirectory,
    links:    Links,
}

impl ContentBuilder {
    pub fn new(
        renderer: TemplateRenderer,
        reports: ReportContextLoader,
        profiles: ProfileDirectory,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            renderer,
            reports,
            profiles,
            links: Links::new(base_url),
        }
    }

    /// 単一イベントの本文を生成する
    ///
    /// `parent` は子行イベントの親報告書ヘッダー（呼び出し側で取得済みのもの）。
    pub async fn build(
        &self,
        event: &ChangeEvent,
        parent: Option<&ReportHeader>,
    ) -> Result<ContentResult, NotificationError> {
        let composed = match &event.table {
            SourceTable::WorkLogs => self.build_work_log(event).await,
            table if table.is_report_child() => self.build_child(event, parent).await,
            SourceTable::CalendarEvents => {
                let actor = self.resolve_actor(&event.record, None).await;
                calendar_event::compose(event, &actor, self.links.calendar())
            }
            SourceTable::Vacations => {
                let actor = self.resolve_actor(&event.record, None).await;
                vacation::compose(event, &actor, self.links.vacations())
            }
            SourceTable::Notifications => {
                let target = user_id_of(&event.record, "user_id");
                let target_name = self.profiles.user_name(target.as_ref()).await;
                generic::compose(event, &target_name)
            }
            _ => Err(SkipReason::UnsupportedTable),
        };

        self.render(composed)
    }

    /// 一括イベントのダイジェスト本文を生成する
    pub async fn build_digest(
        &self,
        envelope: &BatchedEnvelope,
        parent: Option<&ReportHeader>,
    ) -> Result<ContentResult, NotificationError> {
        let context = self.reports.load(envelope.report_id, parent).await;
        let fallback = Record::default();
        let record = envelope
            .events
            .first()
            .map(|event| &event.record)
            .unwrap_or(&fallback);
        let actor = self
            .resolve_actor(record, Some(context.author.as_str()))
            .await;
        let parent_is_draft = parent.is_some_and(|p| p.is_draft);

        self.render(digest::compose(
            envelope,
            &actor,
            &context,
            parent_is_draft,
            self.links.report(envelope.report_id),
        ))
    }

    fn render(
        &self,
        composed: Result<EmailDraft, SkipReason>,
    ) -> Result<ContentResult, NotificationError> {
        match composed {
            Ok(draft) => self.renderer.render(draft),
            Err(reason) => Ok(ContentResult::Skip(reason)),
        }
    }

    async fn build_work_log(&self, event: &ChangeEvent) -> Result<EmailDraft, SkipReason> {
        let header = ReportHeader::from_record(&event.record);
        let context = match &header {
            Some(header) => self.reports.load(header.id, Some(header)).await,
            None => Default::default(),
        };
        let actor = self.resolve_actor(&event.record, None).await;
        let link = header.as_ref().map(|h| self.links.report(h.id));
        work_log::compose(event, &actor, &context, link)
    }

    async fn build_child(
        &self,
        event: &ChangeEvent,
        parent: Option<&ReportHeader>,
    ) -> Result<EmailDraft, SkipReason> {
        let Some(kind) = ChildKind::from_table(&event.table) else {
            return Err(SkipReason::UnsupportedTable);
        };
        let report_id = event.report_id();
        let context = match report_id {
            Some(id) => self.reports.load(id, parent).await,
            None => Default::default(),
        };
        let actor = self
            .resolve_actor(&event.record, Some(context.author.as_str()))
            .await;
        let parent_is_draft = parent.is_some_and(|p| p.is_draft);
        let link = report_id.map(|id| self.links.report(id));
        work_log_child::compose(kind, event, &actor, &context, parent_is_draft, link)
    }

    /// 報告書の補強情報ローダー
    pub fn reports(&self) -> &ReportContextLoader {
        &self.reports
    }

    /// 行為者名を解決する
    pub async fn resolve_actor(&self, record: &Record, report_author: Option<&str>) -> String {
        let author = record.text("author");
        if !author.is_empty() {
            return author;
        }
        if let Some(report_author) = report_author.map(str::trim).filter(|a| !a.is_empty()) {
            return report_author.to_string();
        }
        for field in ["user_id", "created_by"] {
            let name = self
                .profiles
                .user_name(user_id_of(record, field).as_ref())
                .await;
            if !name.is_empty() {
                return name;
            }
        }
        FALLBACK_ACTOR.to_string()
    }
}

/// メール内リンクの組み立て
#[derive(Debug, Clone)]
pub struct Links {
    base_url: String,
}

impl Links {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn report(&self, id: ReportId) -> EmailAction {
        EmailAction::new("보고서 확인하기", format!("{}/work-logs/{id}", self.base_url))
    }

    pub fn calendar(&self) -> EmailAction {
        EmailAction::new("일정 확인하기", format!("{}/calendar", self.base_url))
    }

    pub fn vacations(&self) -> EmailAction {
        EmailAction::new("휴가 확인하기", format!("{}/vacations", self.base_url))
    }
}
