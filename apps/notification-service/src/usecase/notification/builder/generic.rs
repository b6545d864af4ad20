//! 汎用通知（`notifications`）の本文
//!
//! `meta.kind` で文言を切り替える。未知の種別や解釈できないメタはスキップ。

use worklog_notify_domain::{
    change_event::ChangeEvent,
    notification::{NotificationKind, NotificationMeta, SkipReason},
};

use super::FALLBACK_ACTOR;
use crate::usecase::notification::{
    format::format_korean_date,
    template_renderer::{EmailBody, EmailDraft},
};

/// `target_name` は通知対象ユーザーの表示名（引けなければ空）
pub(super) fn compose(event: &ChangeEvent, target_name: &str) -> Result<EmailDraft, SkipReason> {
    let meta = NotificationMeta::parse(event.record.get("meta"));
    let Some(kind) = meta.kind() else {
        return Err(SkipReason::UnsupportedKind);
    };

    let name = if target_name.trim().is_empty() {
        FALLBACK_ACTOR
    } else {
        target_name.trim()
    };
    let vehicle = vehicle_label(&meta);

    let subject = match kind {
        NotificationKind::PassportExpiryWithinOneYear => {
            format!("[알림] {name}님의 여권 만료일이 1년 이내입니다")
        }
        NotificationKind::VehicleInspectionDueInTwoMonths => {
            format!("[알림] {}차량 검사 기한이 2개월 남았습니다", prefixed(&vehicle))
        }
        NotificationKind::VehicleInspectionDueInOneMonth => {
            format!("[알림] {}차량 검사 기한이 1개월 남았습니다", prefixed(&vehicle))
        }
    };

    let mut details = vec![
        ("제목", event.record.text("title")),
        ("내용", event.record.text("message")),
    ];
    if kind.is_passport() {
        details.push(("대상자", name.to_string()));
        details.push(("여권 만료일", format_korean_date(&meta.text("expiry_date"))));
    } else {
        details.push(("차량", vehicle));
        details.push(("검사 기한", format_korean_date(&meta.text("due_date"))));
    }

    let base_details = details
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(label, value)| format!("{label}: {value}"))
        .collect();

    Ok(EmailDraft::new(
        subject.clone(),
        EmailBody {
            summary: subject,
            base_details,
            ..Default::default()
        },
    ))
}

/// 車両名と登録番号（どちらか片方でも可）
fn vehicle_label(meta: &NotificationMeta) -> String {
    [meta.text("vehicle_name"), meta.text("vehicle_number")]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn prefixed(vehicle: &str) -> String {
    if vehicle.is_empty() {
        String::new()
    } else {
        format!("{vehicle} ")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn notification(meta: serde_json::Value) -> ChangeEvent {
        ChangeEvent::from_value(&json!({
            "table": "notifications",
            "operation": "INSERT",
            "record": {"title": "만료 안내", "meta": meta},
        }))
    }

    #[test]
    fn test_旅券期限の通知は対象者と期限を表示する() {
        let event = notification(json!({"kind": "passport_expiry_within_1y", "expiry_date": "2025-03-01"}));

        let draft = compose(&event, "김철수").unwrap();

        assert_eq!(draft.subject, "[알림] 김철수님의 여권 만료일이 1년 이내입니다");
        assert_eq!(
            draft.body.base_details,
            vec!["제목: 만료 안내", "대상자: 김철수", "여권 만료일: 3월 1일"]
        );
        assert_eq!(draft.body.action, None);
    }

    #[rstest]
    #[case("vehicle_inspection_due_2m", "[알림] 포터 12가3456 차량 검사 기한이 2개월 남았습니다")]
    #[case("vehicle_inspection_due_1m", "[알림] 포터 12가3456 차량 검사 기한이 1개월 남았습니다")]
    fn test_車両検査の通知は車両名を件名に入れる(#[case] kind: &str, #[case] expected: &str) {
        let meta = json!({"kind": kind, "vehicle_name": "포터", "vehicle_number": "12가3456"});
        let event = notification(serde_json::Value::String(meta.to_string()));

        let draft = compose(&event, "").unwrap();

        assert_eq!(draft.subject, expected);
    }

    #[test]
    fn test_車両名が無ければ件名から省く() {
        let event = notification(json!({"kind": "vehicle_inspection_due_1m"}));

        let draft = compose(&event, "").unwrap();

        assert_eq!(draft.subject, "[알림] 차량 검사 기한이 1개월 남았습니다");
    }

    #[rstest]
    #[case(json!({"kind": "birthday"}))]
    #[case(json!("{not json"))]
    #[case(serde_json::Value::Null)]
    fn test_未知の種別や壊れたメタはスキップする(#[case] meta: serde_json::Value) {
        let event = notification(meta);
        assert_eq!(compose(&event, "김철수"), Err(SkipReason::UnsupportedKind));
    }
}
