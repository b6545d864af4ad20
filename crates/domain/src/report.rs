//! # 出張報告書
//!
//! 報告書ヘッダーと、通知本文の補足情報（参加者・責任者・作業期間）を導く
//! ドメインロジックを定義する。
//!
//! ## 責任者の推定
//!
//! 参加者のうちチームリーダーフラグを持つ人を優先し、同順位は職位の序列で決める。
//! 序列表に該当する人がいなければ、名前順で先頭の参加者とする。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    record::{Record, as_integer},
    user::UserId,
};

/// 職位の序列（上位から）
pub const POSITION_RANKING: &[&str] = &[
    "대표", "부사장", "전무", "상무", "이사", "부장", "차장", "과장", "대리", "주임", "사원",
];

/// 報告書 ID
///
/// `work_logs` テーブルの主キー（連番）。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[display("{_0}")]
pub struct ReportId(i64);

impl ReportId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// JSON 値（数値または数値文字列）から変換する
    pub fn from_value(value: Option<&Value>) -> Option<Self> {
        as_integer(value).map(Self)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// 報告書ヘッダー
#[derive(Debug, Clone, PartialEq)]
pub struct ReportHeader {
    pub id:         ReportId,
    pub author:     String,
    pub subject:    String,
    pub purpose:    String,
    pub location:   String,
    pub is_draft:   bool,
    pub created_by: Option<UserId>,
}

impl ReportHeader {
    /// ID 以外が空のヘッダー
    pub fn empty(id: ReportId) -> Self {
        Self {
            id,
            author: String::new(),
            subject: String::new(),
            purpose: String::new(),
            location: String::new(),
            is_draft: false,
            created_by: None,
        }
    }

    /// `work_logs` のレコードから変換する（`id` が無ければ `None`）
    pub fn from_record(record: &Record) -> Option<Self> {
        let id = ReportId::new(record.integer("id")?);
        Some(Self {
            id,
            author: record.text("author"),
            subject: record.text("subject"),
            purpose: record.text("purpose"),
            location: record.text("location"),
            is_draft: record.flag("is_draft"),
            created_by: UserId::parse_str(&record.text("created_by")),
        })
    }
}

/// 報告書の参加者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub name:         String,
    /// プロフィール上の職位（プロフィールが無ければ空）
    pub position:     String,
    pub is_team_lead: bool,
}

impl Participant {
    pub fn new(name: impl Into<String>, position: impl Into<String>, is_team_lead: bool) -> Self {
        Self {
            name: name.into(),
            position: position.into(),
            is_team_lead,
        }
    }
}

/// 職位の序列（0 が最上位、序列表に無ければ `None`）
pub fn position_rank(position: &str) -> Option<usize> {
    let position = position.trim();
    POSITION_RANKING.iter().position(|p| *p == position)
}

/// 参加者から責任者を推定する
pub fn infer_lead(participants: &[Participant]) -> Option<&Participant> {
    let leads: Vec<&Participant> = participants.iter().filter(|p| p.is_team_lead).collect();
    let pool: Vec<&Participant> = if leads.is_empty() {
        participants.iter().collect()
    } else {
        leads
    };

    // 序列表に無い職位は最下位扱い
    pool.into_iter()
        .min_by_key(|p| (position_rank(&p.position).unwrap_or(usize::MAX), p.name.clone()))
}

/// 作業明細の日付範囲
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPeriod {
    pub date_from: String,
    /// 空の場合は `date_from` と同日
    pub date_to:   String,
}

impl EntryPeriod {
    pub fn new(date_from: impl Into<String>, date_to: impl Into<String>) -> Self {
        Self {
            date_from: date_from.into(),
            date_to:   date_to.into(),
        }
    }
}

/// 全作業明細から作業期間（最も早い開始日, 最も遅い終了日）を求める
///
/// 日付として解釈できない値は無視する。有効な日付が 1 件も無ければ `None`。
pub fn work_period(entries: &[EntryPeriod]) -> Option<(NaiveDate, NaiveDate)> {
    let parse = |value: &str| {
        let value = value.trim();
        let date_part = value.get(..10).unwrap_or(value);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
    };

    let starts = entries.iter().filter_map(|e| parse(&e.date_from));
    let ends = entries
        .iter()
        .filter_map(|e| parse(&e.date_to).or_else(|| parse(&e.date_from)));

    Some((starts.min()?, ends.max()?))
}
