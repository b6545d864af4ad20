//! # 変更イベント
//!
//! データベースのトリガー層が行の変更ごとに生成するイベントと、
//! 1 回の保存操作でまとめて届く一括エンベロープを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 |
//! |---|------------|
//! | [`ChangeEvent`] | 変更イベント（INSERT / UPDATE / DELETE の 1 行分） |
//! | [`BatchedEnvelope`] | 一括イベント（同一報告書への複数の変更） |
//! | [`WebhookPayload`] | Webhook の受信ペイロード |
//!
//! ## 設計方針
//!
//! - **欠損に強いパース**: どのフィールドが欠けていても例外にせず既定値へ寄せる
//! - **受信順の保持**: 一括イベント内の順序は時系列順として扱う

use serde_json::Value;
use strum::IntoStaticStr;

use crate::{
    record::{Record, is_blank, is_truthy, normalize},
    report::ReportId,
};

/// 変更元テーブル
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceTable {
    /// 出張報告書ヘッダー
    WorkLogs,
    /// 報告書の作業明細
    WorkLogEntries,
    /// 報告書の経費明細
    WorkLogExpenses,
    /// 報告書の資材明細
    WorkLogMaterials,
    /// カレンダー予定
    CalendarEvents,
    /// 休暇申請
    Vacations,
    /// 汎用通知
    Notifications,
    /// 未知のテーブル
    Other(String),
}

impl SourceTable {
    /// テーブル名から変換する（未知の名前は [`SourceTable::Other`]）
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "work_logs" => Self::WorkLogs,
            "work_log_entries" => Self::WorkLogEntries,
            "work_log_expenses" => Self::WorkLogExpenses,
            "work_log_materials" => Self::WorkLogMaterials,
            "calendar_events" => Self::CalendarEvents,
            "vacations" => Self::Vacations,
            "notifications" => Self::Notifications,
            other => Self::Other(other.to_string()),
        }
    }

    /// テーブル名を返す
    pub fn as_str(&self) -> &str {
        match self {
            Self::WorkLogs => "work_logs",
            Self::WorkLogEntries => "work_log_entries",
            Self::WorkLogExpenses => "work_log_expenses",
            Self::WorkLogMaterials => "work_log_materials",
            Self::CalendarEvents => "calendar_events",
            Self::Vacations => "vacations",
            Self::Notifications => "notifications",
            Self::Other(name) => name,
        }
    }

    /// 報告書の子テーブル（作業・経費・資材）か
    pub fn is_report_child(&self) -> bool {
        matches!(
            self,
            Self::WorkLogEntries | Self::WorkLogExpenses | Self::WorkLogMaterials
        )
    }

    /// 報告書に紐づくテーブル（ヘッダーまたは子テーブル）か
    pub fn is_report_scoped(&self) -> bool {
        matches!(self, Self::WorkLogs) || self.is_report_child()
    }
}

/// 変更操作
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Operation {
    #[default]
    Insert,
    Update,
    Delete,
}

impl Operation {
    /// 大文字小文字を区別せずに変換する
    ///
    /// 欠損や未知の値は [`Operation::Insert`] として扱う。
    pub fn parse_lenient(value: &str) -> Self {
        value.trim().to_ascii_uppercase().parse().unwrap_or_default()
    }

    /// タイムスタンプを考慮した実効的な操作を返す
    ///
    /// `created_at` と `updated_at` が異なる INSERT は、実際には既存行の更新として扱う。
    /// 無関係な処理が `updated_at` だけを更新した場合も「更新」と判定される既知の制限がある。
    pub fn effective(self, record: &Record) -> Self {
        if self != Self::Insert {
            return self;
        }
        let created_at = record.text("created_at");
        let updated_at = record.text("updated_at");
        if !created_at.is_empty() && !updated_at.is_empty() && created_at != updated_at {
            Self::Update
        } else {
            self
        }
    }
}

/// 1 フィールドの変更前後の値
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldChange {
    pub before: Value,
    pub after:  Value,
}

impl FieldChange {
    pub fn new(before: Value, after: Value) -> Self {
        Self { before, after }
    }

    pub fn before_is_truthy(&self) -> bool {
        is_truthy(Some(&self.before))
    }

    pub fn after_is_truthy(&self) -> bool {
        is_truthy(Some(&self.after))
    }

    /// 前後の値が表示上同じか
    pub fn is_noop(&self) -> bool {
        let both_blank = is_blank(Some(&self.before)) && is_blank(Some(&self.after));
        both_blank || self.before == self.after
    }
}

/// UPDATE 時の変更フィールド一覧（受信順）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes(Vec<(String, FieldChange)>);

impl Changes {
    /// JSON オブジェクトから変換する
    ///
    /// オブジェクト以外は `None`。値がオブジェクトでないエントリは無視する。
    pub fn from_value(value: Option<&Value>) -> Option<Self> {
        let Some(Value::Object(map)) = value else {
            return None;
        };
        let entries = map
            .iter()
            .filter_map(|(field, change)| {
                let change = change.as_object()?;
                Some((
                    field.clone(),
                    FieldChange::new(
                        change.get("before").cloned().unwrap_or(Value::Null),
                        change.get("after").cloned().unwrap_or(Value::Null),
                    ),
                ))
            })
            .collect();
        Some(Self(entries))
    }

    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.0
            .iter()
            .find_map(|(name, change)| (name == field).then_some(change))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldChange)> {
        self.0.iter().map(|(name, change)| (name.as_str(), change))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// フィールドが指定の値へ変わったか（変更前が同じ値のものは除く）
    pub fn changed_to(&self, field: &str, value: &str) -> bool {
        self.get(field).is_some_and(|change| {
            normalize(Some(&change.after)) == value && normalize(Some(&change.before)) != value
        })
    }
}

impl FromIterator<(String, FieldChange)> for Changes {
    fn from_iter<I: IntoIterator<Item = (String, FieldChange)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// 変更イベント
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub table:     SourceTable,
    pub operation: Operation,
    pub record:    Record,
    /// UPDATE の場合のみ存在する
    pub changes:   Option<Changes>,
}

impl ChangeEvent {
    /// JSON 値から変換する（欠損フィールドは既定値）
    pub fn from_value(value: &Value) -> Self {
        let field = |key: &str| value.get(key);
        Self {
            table:     SourceTable::parse(&normalize(field("table"))),
            operation: Operation::parse_lenient(&normalize(field("operation"))),
            record:    Record::from_value(field("record")),
            changes:   Changes::from_value(field("changes")),
        }
    }

    /// イベントが属する報告書の ID
    ///
    /// ヘッダーは `id`、子テーブルは `work_log_id` を参照する。
    pub fn report_id(&self) -> Option<ReportId> {
        match self.table {
            SourceTable::WorkLogs => self.record.integer("id").map(ReportId::new),
            _ if self.table.is_report_child() => {
                self.record.integer("work_log_id").map(ReportId::new)
            }
            _ => None,
        }
    }

    /// 実効的な操作（[`Operation::effective`]）
    pub fn effective_operation(&self) -> Operation {
        self.operation.effective(&self.record)
    }

    /// 報告書ヘッダーの下書き → 確定への遷移か
    pub fn is_submission(&self) -> bool {
        self.table == SourceTable::WorkLogs
            && self
                .changes
                .as_ref()
                .and_then(|changes| changes.get("is_draft"))
                .is_some_and(|change| change.before_is_truthy() && !change.after_is_truthy())
    }
}

/// 一括イベント
///
/// 1 回の保存操作で発生した、同一報告書に対する変更イベントの列。
#[derive(Debug, Clone, PartialEq)]
pub struct BatchedEnvelope {
    pub report_id: ReportId,
    /// 受信順（時系列順）
    pub events:    Vec<ChangeEvent>,
}

/// Webhook の受信ペイロード
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookPayload {
    Single(ChangeEvent),
    Batched(BatchedEnvelope),
}

impl WebhookPayload {
    /// リクエストボディをパースする
    ///
    /// JSON として不正な場合のみエラーを返す。フィールドの欠損・型違いはエラーにしない。
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(body)?;
        Ok(Self::from_value(&value))
    }

    /// JSON 値から分類する
    ///
    /// `batched == true` かつ `events` が空でない配列かつ `work_log_id` がある場合のみ一括扱い。
    pub fn from_value(value: &Value) -> Self {
        let batched = value.get("batched").and_then(Value::as_bool) == Some(true);
        let events = value.get("events").and_then(Value::as_array);
        let report_id = ReportId::from_value(value.get("work_log_id"));

        match (batched, events, report_id) {
            (true, Some(events), Some(report_id)) if !events.is_empty() => {
                Self::Batched(BatchedEnvelope {
                    report_id,
                    events: events.iter().map(ChangeEvent::from_value).collect(),
                })
            }
            _ => Self::Single(ChangeEvent::from_value(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case("work_logs", SourceTable::WorkLogs)]
    #[case("work_log_entries", SourceTable::WorkLogEntries)]
    #[case("work_log_expenses", SourceTable::WorkLogExpenses)]
    #[case("work_log_materials", SourceTable::WorkLogMaterials)]
    #[case("calendar_events", SourceTable::CalendarEvents)]
    #[case("vacations", SourceTable::Vacations)]
    #[case("notifications", SourceTable::Notifications)]
    fn test_テーブル名を変換できる(#[case] name: &str, #[case] expected: SourceTable) {
        assert_eq!(SourceTable::parse(name), expected);
        assert_eq!(expected.as_str(), name);
    }

    #[test]
    fn test_未知のテーブル名はotherになる() {
        assert_eq!(
            SourceTable::parse("profiles"),
            SourceTable::Other("profiles".to_string())
        );
    }

    #[rstest]
    #[case("UPDATE", Operation::Update)]
    #[case("delete", Operation::Delete)]
    #[case("INSERT", Operation::Insert)]
    #[case("", Operation::Insert)]
    #[case("TRUNCATE", Operation::Insert)]
    fn test_操作を寛容に変換する(#[case] value: &str, #[case] expected: Operation) {
        assert_eq!(Operation::parse_lenient(value), expected);
    }

    #[test]
    fn test_タイムスタンプが異なるinsertは更新として扱う() {
        let record = Record::from(json!({
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z",
        }));
        assert_eq!(Operation::Insert.effective(&record), Operation::Update);
    }

    #[test]
    fn test_タイムスタンプが同じinsertはそのまま() {
        let record = Record::from(json!({
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
        }));
        assert_eq!(Operation::Insert.effective(&record), Operation::Insert);
        assert_eq!(Operation::Delete.effective(&record), Operation::Delete);
    }

    #[test]
    fn test_changesは受信順を保持する() {
        let changes = Changes::from_value(Some(&json!({
            "subject": {"before": "A", "after": "B"},
            "location": {"before": "부산", "after": "울산"},
            "broken": "not-an-object",
        })))
        .unwrap();

        let keys: Vec<_> = changes.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["subject", "location"]);
        assert_eq!(changes.get("subject").unwrap().after, json!("B"));
    }

    #[test]
    fn test_changesのbeforeが欠けていてもnullとして扱う() {
        let changes = Changes::from_value(Some(&json!({"status": {"after": "approved"}}))).unwrap();
        assert_eq!(changes.get("status").unwrap().before, Value::Null);
        assert!(changes.changed_to("status", "approved"));
    }

    #[test]
    fn test_changed_toは元から同じ値なら偽() {
        let changes = Changes::from_value(Some(&json!({
            "status": {"before": "approved", "after": "approved"}
        })))
        .unwrap();
        assert!(!changes.changed_to("status", "approved"));
    }

    #[test]
    fn test_下書きから確定への遷移を検出する() {
        let event = ChangeEvent::from_value(&json!({
            "table": "work_logs",
            "operation": "UPDATE",
            "record": {"id": 7, "is_draft": false},
            "changes": {"is_draft": {"before": true, "after": false}},
        }));
        assert!(event.is_submission());
    }

    #[test]
    fn test_確定から下書きへの遷移は提出ではない() {
        let event = ChangeEvent::from_value(&json!({
            "table": "work_logs",
            "operation": "UPDATE",
            "record": {"id": 7},
            "changes": {"is_draft": {"before": false, "after": true}},
        }));
        assert!(!event.is_submission());
    }

    #[test]
    fn test_報告書idはテーブルに応じて参照先が変わる() {
        let header = ChangeEvent::from_value(&json!({
            "table": "work_logs", "record": {"id": 7}
        }));
        let entry = ChangeEvent::from_value(&json!({
            "table": "work_log_entries", "record": {"id": 1, "work_log_id": "9"}
        }));
        let vacation = ChangeEvent::from_value(&json!({
            "table": "vacations", "record": {"id": 3}
        }));

        assert_eq!(header.report_id(), Some(ReportId::new(7)));
        assert_eq!(entry.report_id(), Some(ReportId::new(9)));
        assert_eq!(vacation.report_id(), None);
    }

    #[test]
    fn test_一括ペイロードを分類する() {
        let payload = WebhookPayload::parse(
            br#"{"batched":true,"work_log_id":9,"events":[
                {"table":"work_log_entries","operation":"DELETE","record":{"id":1}},
                {"table":"work_log_entries","operation":"INSERT","record":{"id":2}}
            ]}"#,
        )
        .unwrap();

        let WebhookPayload::Batched(envelope) = payload else {
            panic!("一括イベントとして分類されること");
        };
        assert_eq!(envelope.report_id, ReportId::new(9));
        assert_eq!(envelope.events.len(), 2);
        assert_eq!(envelope.events[0].operation, Operation::Delete);
        assert_eq!(envelope.events[1].operation, Operation::Insert);
    }

    #[rstest]
    #[case(r#"{"batched":true,"work_log_id":9,"events":[]}"#)]
    #[case(r#"{"batched":true,"events":[{"table":"work_logs"}]}"#)]
    #[case(r#"{"batched":"true","work_log_id":9,"events":[{"table":"work_logs"}]}"#)]
    fn test_条件を満たさない一括ペイロードは単一イベントになる(#[case] body: &str) {
        let payload = WebhookPayload::parse(body.as_bytes()).unwrap();
        assert!(matches!(payload, WebhookPayload::Single(_)));
    }

    #[test]
    fn test_空のオブジェクトも単一イベントとしてパースできる() {
        let WebhookPayload::Single(event) = WebhookPayload::parse(b"{}").unwrap() else {
            panic!("単一イベントとして分類されること");
        };
        assert_eq!(event.table, SourceTable::Other(String::new()));
        assert_eq!(event.operation, Operation::Insert);
        assert!(event.record.is_empty());
        assert!(event.changes.is_none());
    }

    #[test]
    fn test_不正なjsonはエラーになる() {
        assert!(WebhookPayload::parse(b"{not json").is_err());
    }
}
