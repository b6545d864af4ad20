//! # 一括ダイジェスト
//!
//! 1 回の保存操作で発生した複数の変更イベントを、報告書ごとに 1 通のメールへまとめる。
//!
//! ## 処理の流れ
//!
//! 1. イベントごとに変更行（[`DetailLine`]）を作る
//! 2. セクション（報告書・作業行・経費・資材）ごとに分ける
//! 3. 子行のセクションでは、削除行と追加行を内容の並び順キーで整列して先頭から対にし、
//!    1 本の「変更」行（`変更前 → 変更後`）にまとめる
//! 4. セクション順、その中で 削除 → 追加 → 変更 の順に並べる
//!
//! 子行の一部は「削除して再挿入」で更新されるため、3. の対応付けで 1 件の編集として見せる。
//! 並び順キーが偶然近い無関係な行同士を対にすることがある（近似であり正確な差分ではない）。

use itertools::Itertools;
use worklog_notify_domain::{
    change_event::{BatchedEnvelope, ChangeEvent, Operation, SourceTable},
    notification::SkipReason,
};

use super::{
    child_row::ChildKind,
    context::ReportContext,
    format::{SKIP_KEYS, WORK_LOG_LABELS, build_change_lines},
    template_renderer::{EmailAction, EmailBody, EmailDraft},
};

const ADDED_SUFFIX: &str = " 추가됨";
const DELETED_SUFFIX: &str = " 삭제됨";

/// 変更行の種類（宣言順が表示順）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LineKind {
    Delete,
    Add,
    Update,
}

/// ダイジェストのセクション（宣言順が表示順）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    Report,
    WorkLog,
    Expense,
    Material,
}

impl Section {
    pub fn label(self) -> &'static str {
        match self {
            Self::Report => "보고서",
            Self::WorkLog => "작업일지",
            Self::Expense => "경비",
            Self::Material => "자재",
        }
    }

    fn of_child(kind: ChildKind) -> Self {
        match kind {
            ChildKind::Entry => Self::WorkLog,
            ChildKind::Expense => Self::Expense,
            ChildKind::Material => Self::Material,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailLine {
    pub text:     String,
    pub kind:     LineKind,
    pub section:  Section,
    /// 削除行と追加行の対応付けに使う
    pub sort_key: String,
}

/// 1 件のイベントから変更行を作る
///
/// 報告書ヘッダーの追加・削除と、対象外のテーブルは行を作らない。
pub fn detail_lines(event: &ChangeEvent) -> Vec<DetailLine> {
    if event.table == SourceTable::WorkLogs {
        if event.effective_operation() != Operation::Update {
            return Vec::new();
        }
        return event
            .changes
            .as_ref()
            .map(|changes| build_change_lines(changes, WORK_LOG_LABELS, SKIP_KEYS))
            .unwrap_or_default()
            .into_iter()
            .map(|text| DetailLine {
                text,
                kind: LineKind::Update,
                section: Section::Report,
                sort_key: String::new(),
            })
            .collect();
    }

    let Some(kind) = ChildKind::from_table(&event.table) else {
        return Vec::new();
    };
    let section = Section::of_child(kind);
    let description = kind.describe(&event.record);
    let sort_key = kind.sort_key(&event.record);
    let line = |text: String, line_kind: LineKind| DetailLine {
        text,
        kind: line_kind,
        section,
        sort_key: sort_key.clone(),
    };

    match event.effective_operation() {
        Operation::Insert => vec![line(format!("{description}{ADDED_SUFFIX}"), LineKind::Add)],
        Operation::Delete => vec![line(format!("{description}{DELETED_SUFFIX}"), LineKind::Delete)],
        Operation::Update => {
            let changes = event
                .changes
                .as_ref()
                .map(|changes| build_change_lines(changes, kind.labels(), SKIP_KEYS))
                .unwrap_or_default();
            if changes.is_empty() {
                vec![line(format!("{description} 수정됨"), LineKind::Update)]
            } else {
                changes
                    .into_iter()
                    .map(|change| line(format!("{description} - {change}"), LineKind::Update))
                    .collect()
            }
        }
    }
}

/// 子行のセクションで削除行と追加行を対にしてまとめる
pub fn merge_pairs(lines: Vec<DetailLine>) -> Vec<DetailLine> {
    let groups = lines.into_iter().into_group_map_by(|line| line.section);

    groups
        .into_iter()
        .sorted_by_key(|(section, _)| *section)
        .flat_map(|(section, group)| {
            if section == Section::Report {
                group
            } else {
                merge_section(section, group)
            }
        })
        .collect()
}

fn merge_section(section: Section, group: Vec<DetailLine>) -> Vec<DetailLine> {
    let (mut deletes, mut adds, updates): (Vec<_>, Vec<_>, Vec<_>) = group.into_iter().fold(
        (Vec::new(), Vec::new(), Vec::new()),
        |(mut deletes, mut adds, mut updates), line| {
            match line.kind {
                LineKind::Delete => deletes.push(line),
                LineKind::Add => adds.push(line),
                LineKind::Update => updates.push(line),
            }
            (deletes, adds, updates)
        },
    );

    if deletes.is_empty() || adds.is_empty() {
        return deletes.into_iter().chain(adds).chain(updates).collect();
    }

    deletes.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
    adds.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));

    let paired = deletes.len().min(adds.len());
    let leftover_deletes = deletes.split_off(paired);
    let leftover_adds = adds.split_off(paired);

    let merged = deletes.into_iter().zip(adds).map(|(before, after)| DetailLine {
        text: format!(
            "{} → {}",
            strip_suffix(&before.text, DELETED_SUFFIX),
            strip_suffix(&after.text, ADDED_SUFFIX)
        ),
        kind: LineKind::Update,
        section,
        sort_key: after.sort_key,
    });

    leftover_deletes
        .into_iter()
        .chain(leftover_adds)
        .chain(merged)
        .chain(updates)
        .collect()
}

fn strip_suffix<'a>(text: &'a str, suffix: &str) -> &'a str {
    text.strip_suffix(suffix).unwrap_or(text)
}

/// セクション順・種類順に並べて `[セクション] 内容` の行にする
pub fn render_lines(lines: Vec<DetailLine>) -> Vec<String> {
    lines
        .into_iter()
        .sorted_by_key(|line| (line.section, line.kind))
        .map(|line| format!("[{}] {}", line.section.label(), line.text))
        .collect()
}

/// 一括イベントのダイジェスト本文を組み立てる
pub fn compose(
    envelope: &BatchedEnvelope,
    actor: &str,
    context: &ReportContext,
    parent_is_draft: bool,
    action: EmailAction,
) -> Result<EmailDraft, SkipReason> {
    if parent_is_draft {
        return Err(SkipReason::Draft);
    }

    let lines = envelope.events.iter().flat_map(detail_lines).collect();
    let change_lines = render_lines(merge_pairs(lines));

    let subject = format!("{actor}님이 출장보고서를 수정했습니다.");
    Ok(EmailDraft::new(
        subject.clone(),
        EmailBody {
            summary: subject,
            base_details: context.base_details(),
            change_lines,
            always_show_changes: true,
            action: Some(action),
        },
    ))
}
