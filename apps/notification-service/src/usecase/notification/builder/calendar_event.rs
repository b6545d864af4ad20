//! 予定（`calendar_events`）の本文
//!
//! 操作に関係なく「追加」の文言で通知する。

use worklog_notify_domain::{change_event::ChangeEvent, notification::SkipReason};

use crate::usecase::notification::{
    format::{format_date_range, format_time_range, normalize, normalize_time},
    template_renderer::{EmailAction, EmailBody, EmailDraft},
};

pub(super) fn compose(
    event: &ChangeEvent,
    actor: &str,
    action: EmailAction,
) -> Result<EmailDraft, SkipReason> {
    let record = &event.record;
    let title = record.text("title");

    let subject = if title.is_empty() {
        format!("{actor}님이 새 일정을 추가했습니다.")
    } else {
        format!("{actor}님이 새 일정을 추가했습니다: {title}")
    };

    let date = format_date_range(&record.text("start_date"), &record.text("end_date"));
    let time = format_time_range(
        &normalize_time(&record.text("start_time")),
        &normalize_time(&record.text("end_time")),
        record.flag("all_day"),
    );
    let attendees = normalize(record.get("attendees"));
    let description = record.text("description");

    let base_details = [
        ("제목", title),
        ("날짜", date),
        ("시간", time),
        ("참석자", attendees),
        ("내용", description),
    ]
    .into_iter()
    .filter(|(_, value)| !value.is_empty())
    .map(|(label, value)| format!("{label}: {value}"))
    .collect();

    Ok(EmailDraft::new(
        subject,
        EmailBody {
            summary: format!("{actor}님이 새 일정을 추가했습니다."),
            base_details,
            action: Some(action),
            ..Default::default()
        },
    ))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn action() -> EmailAction {
        EmailAction::new("일정 확인하기", "http://localhost:5173/calendar")
    }

    #[test]
    fn test_日付と時刻と参加者を基本情報に並べる() {
        let event = ChangeEvent::from_value(&json!({
            "table": "calendar_events",
            "operation": "INSERT",
            "record": {
                "title": "정기 점검",
                "start_date": "2024-05-01",
                "end_date": "2024-05-02",
                "start_time": "09:00:00",
                "end_time": "18:00:00",
                "attendees": ["김철수", "이영희"],
                "description": "설비 점검",
            },
        }));

        let draft = compose(&event, "김철수", action()).unwrap();

        assert_eq!(draft.subject, "김철수님이 새 일정을 추가했습니다: 정기 점검");
        assert_eq!(
            draft.body.base_details,
            vec![
                "제목: 정기 점검",
                "날짜: 5월 1일 ~ 5월 2일",
                "시간: 09:00 ~ 18:00",
                "참석자: 김철수, 이영희",
                "내용: 설비 점검",
            ]
        );
        assert_eq!(draft.body.action, Some(action()));
    }

    #[test]
    fn test_終日の予定は時刻の代わりに終日と表示する() {
        let event = ChangeEvent::from_value(&json!({
            "table": "calendar_events",
            "record": {"start_date": "2024-05-01", "start_time": "09:00", "all_day": true},
        }));

        let draft = compose(&event, "이영희", action()).unwrap();

        assert_eq!(draft.subject, "이영희님이 새 일정을 추가했습니다.");
        assert_eq!(draft.body.base_details, vec!["날짜: 5월 1일", "시간: 종일"]);
    }
}
