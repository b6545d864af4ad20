//! # 報告書の子行
//!
//! 作業行・経費・資材の 3 種類を同じ操作で扱うための分類。
//! 単一イベントの本文生成と一括ダイジェストの両方で使う。

use worklog_notify_domain::{change_event::SourceTable, record::Record};

use super::format::{
    ENTRY_LABELS,
    EXPENSE_LABELS,
    FieldLabels,
    MATERIAL_LABELS,
    entry_type_label,
    format_amount,
    format_date_range,
    format_korean_date,
    format_time_range,
    normalize_time,
};

/// 子行の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChildKind {
    Entry,
    Expense,
    Material,
}

impl ChildKind {
    pub fn from_table(table: &SourceTable) -> Option<Self> {
        match table {
            SourceTable::WorkLogEntries => Some(Self::Entry),
            SourceTable::WorkLogExpenses => Some(Self::Expense),
            SourceTable::WorkLogMaterials => Some(Self::Material),
            _ => None,
        }
    }

    /// 名詞（件名・セクション見出しに使う）
    pub fn noun(self) -> &'static str {
        match self {
            Self::Entry => "작업일지",
            Self::Expense => "경비",
            Self::Material => "자재",
        }
    }

    pub fn labels(self) -> FieldLabels {
        match self {
            Self::Entry => ENTRY_LABELS,
            Self::Expense => EXPENSE_LABELS,
            Self::Material => MATERIAL_LABELS,
        }
    }

    /// 行を 1 行の説明にする（例: `1월 1일 작업 배관 교체`）
    pub fn describe(self, record: &Record) -> String {
        let parts = match self {
            Self::Entry => vec![
                format_date_range(&record.text("date_from"), &record.text("date_to")),
                entry_type_label(&record.text("entry_type")),
                format_time_range(
                    &normalize_time(&record.text("time_from")),
                    &normalize_time(&record.text("time_to")),
                    false,
                ),
                record.text("details"),
            ],
            Self::Expense => vec![
                format_korean_date(&record.text("date")),
                record.text("category"),
                record.text("detail"),
                if record.has("amount") {
                    format_amount(record.get("amount"))
                } else {
                    String::new()
                },
            ],
            Self::Material => vec![
                record.text("name"),
                format!("{}{}", record.text("quantity"), record.text("unit")),
                record.text("note"),
            ],
        };

        let description = parts
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if description.is_empty() {
            format!("{} 항목", self.noun())
        } else {
            description
        }
    }

    /// 削除行と追加行の対応付けに使う並び順キー
    ///
    /// サロゲート ID ではなく行の内容から作る。
    pub fn sort_key(self, record: &Record) -> String {
        let fields: &[&str] = match self {
            Self::Entry => &["date_from", "date_to", "time_from", "entry_type", "details"],
            Self::Expense => &["date", "category", "detail", "amount"],
            Self::Material => &["name", "unit", "quantity", "note"],
        };
        fields
            .iter()
            .map(|field| record.text(field))
            .collect::<Vec<_>>()
            .join("\u{1f}")
    }
}
