//! # 表示用フォーマット
//!
//! 変更イベントの値をメール本文向けの韓国語表記に変換する純粋関数群。
//!
//! | 関数 | 出力例 |
//! |------|--------|
//! | [`format_korean_date`] | `3월 5일` |
//! | [`format_date_range`] | `3월 5일 ~ 3월 7일` |
//! | [`format_time_range`] | `09:00 ~ 18:00` / `종일` |
//! | [`change_value_for_detail`] | フィールド名に応じた値の表記 |
//! | [`build_change_lines`] | `제목: A → B` |

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use serde_json::Value;
pub use worklog_notify_domain::record::normalize;
use worklog_notify_domain::{
    change_event::Changes,
    record::{Record, is_blank, is_truthy},
};

/// 値が空のときのプレースホルダー
pub const EMPTY_PLACEHOLDER: &str = "-";

const KST_OFFSET_SECONDS: i32 = 9 * 3600;

const DATE_KEYS: &[&str] = &[
    "date",
    "date_from",
    "date_to",
    "start_date",
    "end_date",
    "expiry_date",
    "due_date",
];

const TIME_KEYS: &[&str] = &["time_from", "time_to", "start_time", "end_time"];

/// 変更行に出さないフィールド
pub const SKIP_KEYS: &[&str] = &[
    "id",
    "work_log_id",
    "created_at",
    "updated_at",
    "created_by",
    "user_id",
    "is_draft",
    "author",
];

/// フィールド名と表示ラベルの対応表
///
/// 宣言順がスナップショット表示の順序になる。
#[derive(Debug, Clone, Copy)]
pub struct FieldLabels(&'static [(&'static str, &'static str)]);

impl FieldLabels {
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self(entries)
    }

    pub fn label(&self, key: &str) -> Option<&'static str> {
        self.0
            .iter()
            .find_map(|(name, label)| (*name == key).then_some(*label))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> {
        self.0.iter().copied()
    }
}

pub const WORK_LOG_LABELS: FieldLabels = FieldLabels::new(&[
    ("subject", "제목"),
    ("purpose", "출장목적"),
    ("location", "출장지"),
    ("vehicle", "차량"),
    ("order_number", "수주번호"),
    ("memo", "비고"),
]);

pub const ENTRY_LABELS: FieldLabels = FieldLabels::new(&[
    ("entry_type", "구분"),
    ("date_from", "시작일"),
    ("date_to", "종료일"),
    ("time_from", "시작시간"),
    ("time_to", "종료시간"),
    ("details", "내용"),
    ("persons", "인원"),
    ("lunch_worked", "점심"),
]);

pub const EXPENSE_LABELS: FieldLabels = FieldLabels::new(&[
    ("date", "일자"),
    ("category", "항목"),
    ("detail", "내용"),
    ("amount", "금액"),
    ("payment_method", "결제수단"),
]);

pub const MATERIAL_LABELS: FieldLabels = FieldLabels::new(&[
    ("name", "자재명"),
    ("quantity", "수량"),
    ("unit", "단위"),
    ("note", "비고"),
]);

/// 日付または日時を `M월 D일` にする
///
/// オフセット付きの日時は KST に変換してから日付を取る。
/// 空は空文字列、解釈できない値は日付部分をそのまま返す。
pub fn format_korean_date(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return String::new();
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        let date = match FixedOffset::east_opt(KST_OFFSET_SECONDS) {
            Some(kst) => datetime.with_timezone(&kst).date_naive(),
            None => datetime.date_naive(),
        };
        return month_day(date);
    }

    let date_part = value.split(['T', ' ']).next().unwrap_or(value);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => month_day(date),
        Err(_) => date_part.to_string(),
    }
}

fn month_day(date: NaiveDate) -> String {
    format!("{}월 {}일", date.month(), date.day())
}

/// 開始日と終了日を 1 つの表記にまとめる
///
/// 同日または終了日なしは開始日のみ。
pub fn format_date_range(start: &str, end: &str) -> String {
    let start = format_korean_date(start);
    let end = format_korean_date(end);
    join_range(start, end)
}

/// 開始時刻と終了時刻を 1 つの表記にまとめる
///
/// 終日なら `종일`。時刻値自体は整形しない。
pub fn format_time_range(start: &str, end: &str, all_day: bool) -> String {
    if all_day {
        return "종일".to_string();
    }
    join_range(start.trim().to_string(), end.trim().to_string())
}

fn join_range(start: String, end: String) -> String {
    match (start.is_empty(), end.is_empty()) {
        (true, true) => String::new(),
        (false, true) => start,
        (true, false) => end,
        _ if start == end => start,
        _ => format!("{start} ~ {end}"),
    }
}

/// `HH:MM` に揃える（`9:5` → `09:05`、`09:30:00` → `09:30`）
pub fn normalize_time(value: &str) -> String {
    let value = value.trim();
    let mut parts = value.split(':');
    let hour = parts.next().and_then(|h| h.trim().parse::<u32>().ok());
    let minute = parts
        .next()
        .and_then(|m| m.get(..2).unwrap_or(m).parse::<u32>().ok());

    match (hour, minute) {
        (Some(h), Some(m)) if h < 24 && m < 60 => format!("{h:02}:{m:02}"),
        _ => value.to_string(),
    }
}

/// 金額を 3 桁区切り + `원` にする
///
/// 数値として読めない値と `i64` に収まらない値はそのまま返す。
pub fn format_amount(value: Option<&Value>) -> String {
    let raw = normalize(value);
    let digits = raw.replace(',', "");

    let amount = digits.parse::<i64>().ok().or_else(|| {
        digits
            .parse::<f64>()
            .ok()
            .map(f64::round)
            .filter(|n| (i64::MIN as f64..i64::MAX as f64).contains(n))
            .map(|n| n as i64)
    });

    match amount {
        Some(amount) => format!("{}원", group_thousands(amount)),
        None => raw,
    }
}

fn group_thousands(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

/// 作業区分の表示名
pub fn entry_type_label(value: &str) -> String {
    match value.trim() {
        "work" => "작업".to_string(),
        "move" => "이동".to_string(),
        "wait" => "대기".to_string(),
        other => other.to_string(),
    }
}

/// フィールド名に応じて値を表示用に変換する
///
/// 空・null は [`EMPTY_PLACEHOLDER`]。
pub fn change_value_for_detail(key: &str, value: Option<&Value>) -> String {
    if is_blank(value) {
        return EMPTY_PLACEHOLDER.to_string();
    }

    let rendered = match key {
        "lunch_worked" => {
            if is_truthy(value) {
                "점심시간 근무".to_string()
            } else {
                "점심시간 휴식".to_string()
            }
        }
        "amount" => format_amount(value),
        "entry_type" => entry_type_label(&normalize(value)),
        _ if DATE_KEYS.contains(&key) => format_korean_date(&normalize(value)),
        _ if TIME_KEYS.contains(&key) => normalize_time(&normalize(value)),
        _ => normalize(value),
    };

    if rendered.is_empty() {
        EMPTY_PLACEHOLDER.to_string()
    } else {
        rendered
    }
}

/// 変更フィールドごとに `ラベル: 変更前 → 変更後` の行を作る
///
/// `skip_keys` と値が変わっていないフィールドは除く。
/// ラベルが無いフィールドは生のフィールド名で表示する。
pub fn build_change_lines(
    changes: &Changes,
    labels: FieldLabels,
    skip_keys: &[&str],
) -> Vec<String> {
    changes
        .iter()
        .filter(|(key, change)| !skip_keys.contains(key) && !change.is_noop())
        .map(|(key, change)| {
            format!(
                "{}: {} → {}",
                labels.label(key).unwrap_or(key),
                change_value_for_detail(key, Some(&change.before)),
                change_value_for_detail(key, Some(&change.after)),
            )
        })
        .collect()
}

/// ラベル付きのフィールドに実際の変更があるか
pub fn has_labeled_changes(changes: &Changes, labels: FieldLabels, skip_keys: &[&str]) -> bool {
    changes.iter().any(|(key, change)| {
        !skip_keys.contains(&key) && labels.label(key).is_some() && !change.is_noop()
    })
}

/// 行の現在の内容を `ラベル: 値` で列挙する
pub fn snapshot_lines(record: &Record, labels: FieldLabels) -> Vec<String> {
    labels
        .iter()
        .filter(|(key, _)| record.has(key))
        .map(|(key, label)| format!("{label}: {}", change_value_for_detail(key, record.get(key))))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case("2024-03-05", "3월 5일")]
    #[case("2024-03-05T10:00:00", "3월 5일")]
    #[case("2024-03-05 10:00:00+09", "3월 5일")]
    #[case("2024-03-04T20:00:00Z", "3월 5일")]
    #[case("", "")]
    #[case("   ", "")]
    #[case("2024-13-45", "2024-13-45")]
    #[case("내일", "내일")]
    fn test_韓国語の日付表記にする(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(format_korean_date(input), expected);
    }

    #[rstest]
    #[case("2024-03-05", "2024-03-07", "3월 5일 ~ 3월 7일")]
    #[case("2024-03-05", "", "3월 5일")]
    #[case("", "2024-03-07", "3월 7일")]
    #[case("", "", "")]
    fn test_日付範囲をまとめる(#[case] start: &str, #[case] end: &str, #[case] expected: &str) {
        assert_eq!(format_date_range(start, end), expected);
    }

    #[rstest]
    #[case("2024-03-05")]
    #[case("2024-12-31T09:00:00")]
    #[case("2025-01-01")]
    fn test_同日の範囲は単一の日付と一致する(#[case] date: &str) {
        assert_eq!(format_date_range(date, date), format_korean_date(date));
    }

    #[rstest]
    #[case("09:00", "18:00", false, "09:00 ~ 18:00")]
    #[case("09:00", "09:00", false, "09:00")]
    #[case("09:00", "", false, "09:00")]
    #[case("09:00", "18:00", true, "종일")]
    #[case("", "", false, "")]
    fn test_時刻範囲をまとめる(
        #[case] start: &str,
        #[case] end: &str,
        #[case] all_day: bool,
        #[case] expected: &str,
    ) {
        assert_eq!(format_time_range(start, end, all_day), expected);
    }

    #[rstest]
    #[case("09:30:00", "09:30")]
    #[case("9:5", "09:05")]
    #[case("18:00", "18:00")]
    #[case("오전", "오전")]
    fn test_時刻をhh_mmに揃える(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_time(input), expected);
    }

    #[rstest]
    #[case(json!(12345), "12,345원")]
    #[case(json!("1234567"), "1,234,567원")]
    #[case(json!("12,000"), "12,000원")]
    #[case(json!(999), "999원")]
    #[case(json!(1500.4), "1,500원")]
    #[case(json!(-4000), "-4,000원")]
    #[case(json!("미정"), "미정")]
    fn test_金額を3桁区切りにする(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(format_amount(Some(&value)), expected);
    }

    #[rstest]
    #[case("1e30")]
    #[case("-1e30")]
    #[case("99999999999999999999")]
    fn test_i64に収まらない金額はそのまま返す(#[case] raw: &str) {
        assert_eq!(format_amount(Some(&json!(raw))), raw);
    }

    #[test]
    fn test_金額は通貨記号で終わる() {
        let rendered = change_value_for_detail("amount", Some(&json!(12345)));
        assert!(rendered.ends_with('원'));
        assert!(rendered.contains("12,345"));
    }

    #[rstest]
    #[case("subject")]
    #[case("amount")]
    #[case("date_from")]
    #[case("time_to")]
    #[case("lunch_worked")]
    #[case("persons")]
    fn test_nullはどのフィールドでもプレースホルダーになる(#[case] key: &str) {
        assert_eq!(change_value_for_detail(key, Some(&Value::Null)), "-");
        assert_eq!(change_value_for_detail(key, None), "-");
    }

    #[rstest]
    #[case("date_from", json!("2024-01-02"), "1월 2일")]
    #[case("time_from", json!("08:30:00"), "08:30")]
    #[case("lunch_worked", json!(true), "점심시간 근무")]
    #[case("lunch_worked", json!(false), "점심시간 휴식")]
    #[case("entry_type", json!("move"), "이동")]
    #[case("persons", json!(["김철수", "이영희"]), "김철수, 이영희")]
    #[case("memo", json!(" 메모 "), "메모")]
    fn test_フィールドごとに値を表示用に変換する(
        #[case] key: &str,
        #[case] value: Value,
        #[case] expected: &str,
    ) {
        assert_eq!(change_value_for_detail(key, Some(&value)), expected);
    }

    #[test]
    fn test_変更行はラベルと前後の値を並べる() {
        let changes = Changes::from_value(Some(&json!({
            "subject": {"before": "A", "after": "B"},
            "updated_at": {"before": "t1", "after": "t2"},
            "vehicle_id": {"before": 1, "after": 2},
            "memo": {"before": null, "after": "추가 메모"},
            "location": {"before": "부산", "after": "부산"},
        })))
        .unwrap();

        let lines = build_change_lines(&changes, WORK_LOG_LABELS, SKIP_KEYS);

        assert_eq!(
            lines,
            vec![
                "제목: A → B".to_string(),
                "vehicle_id: 1 → 2".to_string(),
                "비고: - → 추가 메모".to_string(),
            ]
        );
    }

    #[test]
    fn test_ラベル付きの変更が無ければ偽() {
        let changes = Changes::from_value(Some(&json!({
            "updated_at": {"before": "t1", "after": "t2"},
            "vehicle_id": {"before": 1, "after": 2},
        })))
        .unwrap();

        assert!(!has_labeled_changes(&changes, WORK_LOG_LABELS, SKIP_KEYS));
    }

    #[test]
    fn test_スナップショットはラベル順に値のある項目だけ出す() {
        let record = Record::from(json!({
            "id": 3,
            "details": "배관 교체",
            "entry_type": "work",
            "date_from": "2024-01-01",
            "time_to": null,
        }));

        assert_eq!(
            snapshot_lines(&record, ENTRY_LABELS),
            vec![
                "구분: 작업".to_string(),
                "시작일: 1월 1일".to_string(),
                "내용: 배관 교체".to_string(),
            ]
        );
    }
}
