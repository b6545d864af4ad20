//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンで通知メールを HTML/plaintext 両形式で生成する。
//!
//! ## 設計方針
//!
//! - **`include_str!` によるコンパイル時埋め込み**: テンプレートはバイナリに埋め込まれる
//! - **単一レイアウト**: すべてのエンティティが同じ本文構造（要約、基本情報、変更項目、リンク）を共有する
//! - **HTML エスケープ**: `.html` テンプレートは tera の autoescape で動的テキストをエスケープする

use serde::Serialize;
use tera::{Context, Tera};
use worklog_notify_domain::notification::{ContentResult, NotificationError};

const TEXT_TEMPLATE: &str = "notification.txt";
const HTML_TEMPLATE: &str = "notification.html";

/// メール内の行動リンク
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailAction {
    pub label: String,
    pub url:   String,
}

impl EmailAction {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url:   url.into(),
        }
    }
}

/// メール本文の構成要素
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailBody {
    /// 冒頭の要約文
    pub summary:             String,
    /// 基本情報の箇条書き
    pub base_details:        Vec<String>,
    /// 「변경된 항목」の箇条書き
    pub change_lines:        Vec<String>,
    /// 変更行が空でも「변경된 항목」見出しとプレースホルダーを出す
    pub always_show_changes: bool,
    pub action:              Option<EmailAction>,
}

/// 件名と本文の組
///
/// エンティティごとの本文生成の出力。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailDraft {
    pub subject: String,
    pub body:    EmailBody,
}

impl EmailDraft {
    pub fn new(subject: impl Into<String>, body: EmailBody) -> Self {
        Self {
            subject: subject.into(),
            body,
        }
    }
}

/// テンプレートレンダラー
pub struct TemplateRenderer {
    engine:     Tera,
    banner_url: Option<String>,
}

impl TemplateRenderer {
    /// 新しいレンダラーインスタンスを作成
    ///
    /// `banner_url` が無い場合、HTML のヘッダーはテキストバナーで描画する。
    pub fn new(banner_url: Option<String>) -> Result<Self, NotificationError> {
        let mut engine = Tera::default();

        engine
            .add_raw_templates(vec![
                (
                    HTML_TEMPLATE,
                    include_str!("../../../templates/notifications/notification.html"),
                ),
                (
                    TEXT_TEMPLATE,
                    include_str!("../../../templates/notifications/notification.txt"),
                ),
            ])
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok(Self {
            engine,
            banner_url: banner_url.filter(|url| !url.trim().is_empty()),
        })
    }

    /// 件名と本文から送信可能な本文生成結果を作る
    pub fn render(&self, draft: EmailDraft) -> Result<ContentResult, NotificationError> {
        let context = self.build_context(&draft);

        let text = self
            .engine
            .render(TEXT_TEMPLATE, &context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;
        let html = self
            .engine
            .render(HTML_TEMPLATE, &context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok(ContentResult::Ready {
            subject: draft.subject,
            text,
            html,
        })
    }

    fn build_context(&self, draft: &EmailDraft) -> Context {
        let body = &draft.body;
        let (action_label, action_url) = body
            .action
            .as_ref()
            .map(|a| (a.label.as_str(), a.url.as_str()))
            .unwrap_or_default();

        let mut context = Context::new();
        context.insert("subject", &draft.subject);
        context.insert("summary", &body.summary);
        context.insert("base_details", &body.base_details);
        context.insert("change_lines", &body.change_lines);
        context.insert(
            "show_changes",
            &(body.always_show_changes || !body.change_lines.is_empty()),
        );
        context.insert("action_label", action_label);
        context.insert("action_url", action_url);
        context.insert("banner_url", self.banner_url.as_deref().unwrap_or_default());
        context
    }
}
