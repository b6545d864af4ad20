//! 休暇申請（`vacations`）の本文
//!
//! status が approved に変わった更新だけを「承認」として扱い、それ以外は「登録」の文言にする。

use worklog_notify_domain::{
    change_event::{ChangeEvent, Operation},
    notification::SkipReason,
};

use crate::usecase::notification::{
    format::format_date_range,
    template_renderer::{EmailAction, EmailBody, EmailDraft},
};

/// 休暇種別の表示名
fn vacation_type_label(value: &str) -> String {
    match value {
        "annual" => "연차".to_string(),
        "half_am" => "오전 반차".to_string(),
        "half_pm" => "오후 반차".to_string(),
        "sick" => "병가".to_string(),
        "special" => "경조사".to_string(),
        other => other.to_string(),
    }
}

/// 申請状態の表示名
fn status_label(value: &str) -> String {
    match value {
        "pending" => "승인 대기".to_string(),
        "approved" => "승인".to_string(),
        "rejected" => "반려".to_string(),
        "cancelled" => "취소".to_string(),
        other => other.to_string(),
    }
}

fn is_approval(event: &ChangeEvent) -> bool {
    event.operation == Operation::Update
        && event
            .changes
            .as_ref()
            .is_some_and(|changes| changes.changed_to("status", "approved"))
}

/// `requester` は申請者の表示名
pub(super) fn compose(
    event: &ChangeEvent,
    requester: &str,
    action: EmailAction,
) -> Result<EmailDraft, SkipReason> {
    if event.operation == Operation::Delete {
        return Err(SkipReason::NotNotifiable);
    }

    let record = &event.record;
    let (subject, summary) = if is_approval(event) {
        (
            format!("{requester}님의 휴가가 승인되었습니다."),
            format!("{requester}님이 신청한 휴가가 승인되었습니다."),
        )
    } else {
        (
            format!("{requester}님이 휴가를 등록했습니다."),
            format!("{requester}님이 휴가를 등록했습니다. 내용을 확인해 주세요."),
        )
    };

    let base_details = [
        ("신청자", requester.to_string()),
        ("종류", vacation_type_label(&record.text("vacation_type"))),
        (
            "기간",
            format_date_range(&record.text("start_date"), &record.text("end_date")),
        ),
        ("사유", record.text("reason")),
        ("상태", status_label(&record.text("status"))),
    ]
    .into_iter()
    .filter(|(_, value)| !value.is_empty())
    .map(|(label, value)| format!("{label}: {value}"))
    .collect();

    Ok(EmailDraft::new(
        subject,
        EmailBody {
            summary,
            base_details,
            action: Some(action),
            ..Default::default()
        },
    ))
}
