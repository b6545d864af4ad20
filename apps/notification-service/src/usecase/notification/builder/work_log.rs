//! 報告書ヘッダー（`work_logs`）の本文

use worklog_notify_domain::{
    change_event::{ChangeEvent, Operation},
    notification::SkipReason,
};

use crate::usecase::notification::{
    context::ReportContext,
    format::{SKIP_KEYS, WORK_LOG_LABELS, build_change_lines, has_labeled_changes},
    template_renderer::{EmailAction, EmailBody, EmailDraft},
};

pub(super) fn compose(
    event: &ChangeEvent,
    actor: &str,
    context: &ReportContext,
    action: Option<EmailAction>,
) -> Result<EmailDraft, SkipReason> {
    let operation = event.effective_operation();
    if operation == Operation::Delete {
        return Err(SkipReason::ReportDeleted);
    }
    if event.record.flag("is_draft") {
        return Err(SkipReason::Draft);
    }

    let base_details = context.base_details();

    if event.is_submission() {
        let subject = format!("{actor}님이 출장보고서를 제출했습니다.");
        return Ok(EmailDraft::new(
            subject.clone(),
            EmailBody {
                summary: subject,
                base_details,
                action,
                ..Default::default()
            },
        ));
    }

    match operation {
        Operation::Insert => {
            let subject = format!("{actor}님이 출장보고서를 작성했습니다.");
            Ok(EmailDraft::new(
                subject.clone(),
                EmailBody {
                    summary: subject,
                    base_details,
                    action,
                    ..Default::default()
                },
            ))
        }
        _ => {
            let change_lines = match &event.changes {
                Some(changes) => {
                    if !has_labeled_changes(changes, WORK_LOG_LABELS, SKIP_KEYS) {
                        return Err(SkipReason::NoVisibleChanges);
                    }
                    build_change_lines(changes, WORK_LOG_LABELS, SKIP_KEYS)
                }
                None => Vec::new(),
            };
            let subject = format!("{actor}님이 출장보고서를 수정했습니다.");
            Ok(EmailDraft::new(
                subject.clone(),
                EmailBody {
                    summary: subject,
                    base_details,
                    change_lines,
                    always_show_changes: true,
                    action,
                },
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn context() -> ReportContext {
        ReportContext {
            author: "김철수".to_string(),
            location: "부산".to_string(),
            ..Default::default()
        }
    }

    fn compose_json(payload: serde_json::Value) -> Result<EmailDraft, SkipReason> {
        compose(&ChangeEvent::from_value(&payload), "김철수", &context(), None)
    }

    #[rstest]
    #[case("INSERT")]
    #[case("UPDATE")]
    #[case("DELETE")]
    fn test_下書きの報告書は操作に関係なくスキップする(#[case] operation: &str) {
        let result = compose_json(json!({
            "table": "work_logs",
            "operation": operation,
            "record": {"id": 7, "is_draft": true},
            "changes": {"subject": {"before": "A", "after": "B"}},
        }));

        let expected = if operation == "DELETE" {
            SkipReason::ReportDeleted
        } else {
            SkipReason::Draft
        };
        assert_eq!(result, Err(expected));
    }

    #[test]
    fn test_削除は常にスキップする() {
        let result = compose_json(json!({
            "table": "work_logs", "operation": "DELETE", "record": {"id": 7, "is_draft": false}
        }));
        assert_eq!(result, Err(SkipReason::ReportDeleted));
    }

    #[test]
    fn test_更新は変更行を1項目1行で並べる() {
        let draft = compose_json(json!({
            "table": "work_logs",
            "operation": "UPDATE",
            "record": {"id": 7, "is_draft": false},
            "changes": {
                "subject": {"before": "A", "after": "B"},
                "location": {"before": "부산", "after": "울산"},
            },
        }))
        .unwrap();

        assert_eq!(draft.subject, "김철수님이 출장보고서를 수정했습니다.");
        assert_eq!(draft.body.change_lines, vec!["제목: A → B", "출장지: 부산 → 울산"]);
        assert_eq!(draft.body.base_details, vec!["작성자: 김철수", "출장지: 부산"]);
        assert!(draft.body.always_show_changes);
    }

    #[test]
    fn test_ラベルの無い変更だけならスキップする() {
        let result = compose_json(json!({
            "table": "work_logs",
            "operation": "UPDATE",
            "record": {"id": 7},
            "changes": {
                "updated_at": {"before": "t1", "after": "t2"},
                "vehicle_id": {"before": 1, "after": 2},
            },
        }));
        assert_eq!(result, Err(SkipReason::NoVisibleChanges));
    }

    #[test]
    fn test_下書きから確定への遷移は提出として扱う() {
        let draft = compose_json(json!({
            "table": "work_logs",
            "operation": "UPDATE",
            "record": {"id": 7, "is_draft": false},
            "changes": {"is_draft": {"before": true, "after": false}},
        }))
        .unwrap();

        assert!(draft.subject.contains("제출"));
        assert!(!draft.subject.contains("수정"));
        assert!(draft.body.change_lines.is_empty());
        assert!(!draft.body.always_show_changes);
    }

    #[test]
    fn test_提出時は他の変更行を出さない() {
        let draft = compose_json(json!({
            "table": "work_logs",
            "operation": "UPDATE",
            "record": {"id": 7, "is_draft": false},
            "changes": {
                "is_draft": {"before": true, "after": false},
                "subject": {"before": "A", "after": "B"},
            },
        }))
        .unwrap();

        assert_eq!(draft.subject, "김철수님이 출장보고서를 제출했습니다.");
        assert!(draft.body.change_lines.is_empty());
    }

    #[test]
    fn test_新規作成は作成の文言にする() {
        let draft = compose_json(json!({
            "table": "work_logs", "operation": "INSERT", "record": {"id": 7, "is_draft": false}
        }))
        .unwrap();

        assert_eq!(draft.subject, "김철수님이 출장보고서를 작성했습니다.");
    }
}
