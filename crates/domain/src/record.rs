//! # レコード
//!
//! トリガー層から届く行データ（型の緩いフィールドマップ）を表現する。
//!
//! ## 設計方針
//!
//! - **失敗しないアクセサ**: 欠損・`null`・型違いはすべて空文字列 / `None` /
//!   `false` に寄せる。呼び出し側でのエラー処理を不要にする
//! - **受信順の保持**: `serde_json` の `preserve_order` によりフィールド順を維持する

use serde_json::{Map, Value};

/// 値を表示用の文字列に正規化する
///
/// - `null` / 欠損 / 空白のみ → 空文字列
/// - 文字列 → 前後の空白を除去
/// - 配列 → 空でない要素を `", "` で連結
/// - その他 → JSON 表現
pub fn normalize(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| normalize(Some(item)))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}

/// 値が「真」として扱えるかを判定する
///
/// PostgreSQL の text 表現（`"t"`）も真とみなす。
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => matches!(s.trim(), "true" | "t" | "1"),
        _ => false,
    }
}

/// 値が空（`null`、空白のみの文字列、空配列）かを判定する
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        _ => false,
    }
}

/// 整数として解釈する（数値または数値文字列）
pub fn as_integer(value: Option<&Value>) -> Option<i64> {
    match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 行データ
///
/// INSERT / UPDATE では変更後の状態、DELETE では削除直前の状態を保持する。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// 任意の JSON 値からレコードを作る
    ///
    /// オブジェクト以外は空レコードになる。
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Object(map)) => Self(map.clone()),
            _ => Self::default(),
        }
    }

    /// 生の値を取得する（`null` は `None`）
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// 正規化済みの文字列を取得する
    pub fn text(&self, key: &str) -> String {
        normalize(self.get(key))
    }

    /// 整数値を取得する
    pub fn integer(&self, key: &str) -> Option<i64> {
        as_integer(self.get(key))
    }

    /// 真偽値を取得する（欠損は `false`）
    pub fn flag(&self, key: &str) -> bool {
        is_truthy(self.get(key))
    }

    /// フィールドが空でない値を持つか
    pub fn has(&self, key: &str) -> bool {
        !is_blank(self.get(key))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Self::from_value(Some(&value))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(json!(null), "")]
    #[case(json!("   "), "")]
    #[case(json!("  부산  "), "부산")]
    #[case(json!(42), "42")]
    #[case(json!(true), "true")]
    #[case(json!(["김철수", "", "이영희"]), "김철수, 이영희")]
    fn test_normalizeが値を表示用文字列に寄せる(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(normalize(Some(&value)), expected);
    }

    #[test]
    fn test_normalizeは欠損を空文字列にする() {
        assert_eq!(normalize(None), "");
    }

    #[rstest]
    #[case(json!(true), true)]
    #[case(json!(false), false)]
    #[case(json!("t"), true)]
    #[case(json!("false"), false)]
    #[case(json!(1), true)]
    #[case(json!(0), false)]
    #[case(json!(null), false)]
    fn test_is_truthyの判定(#[case] value: Value, #[case] expected: bool) {
        assert_eq!(is_truthy(Some(&value)), expected);
    }

    #[test]
    fn test_recordのアクセサは型違いを安全な既定値にする() {
        let record = Record::from(json!({
            "id": "7",
            "subject": null,
            "is_draft": "t",
            "persons": [],
        }));

        assert_eq!(record.integer("id"), Some(7));
        assert_eq!(record.text("subject"), "");
        assert!(record.flag("is_draft"));
        assert!(!record.has("persons"));
        assert!(!record.has("missing"));
    }

    #[test]
    fn test_オブジェクト以外からは空レコードを作る() {
        assert!(Record::from(json!([1, 2])).is_empty());
        assert!(Record::from_value(None).is_empty());
    }
}
