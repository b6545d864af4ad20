//! 報告書の子行（作業行・経費・資材）の本文

use worklog_notify_domain::{
    change_event::{ChangeEvent, Operation},
    notification::SkipReason,
};

use crate::usecase::notification::{
    child_row::ChildKind,
    context::ReportContext,
    format::{SKIP_KEYS, build_change_lines, snapshot_lines},
    template_renderer::{EmailAction, EmailBody, EmailDraft},
};

pub(super) fn compose(
    kind: ChildKind,
    event: &ChangeEvent,
    actor: &str,
    context: &ReportContext,
    parent_is_draft: bool,
    action: Option<EmailAction>,
) -> Result<EmailDraft, SkipReason> {
    if parent_is_draft {
        return Err(SkipReason::Draft);
    }

    let operation = event.effective_operation();
    let verb = match operation {
        Operation::Insert => "추가",
        Operation::Update => "수정",
        Operation::Delete => "삭제",
    };
    let noun = kind.noun();
    let subject = format!("{actor}님이 출장보고서에 {noun}를 {verb}했습니다.");

    let mut base_details = context.base_details();
    let snapshot = snapshot_lines(&event.record, kind.labels());

    let change_lines = match operation {
        Operation::Update => {
            let lines = event
                .changes
                .as_ref()
                .map(|changes| build_change_lines(changes, kind.labels(), SKIP_KEYS))
                .unwrap_or_default();
            if lines.is_empty() {
                // 差分が無いときは現在の内容を見せる
                base_details.push(format!("{noun} 현재 내용"));
                base_details.extend(snapshot);
            } else {
                base_details.push(format!("{noun}: {}", kind.describe(&event.record)));
            }
            lines
        }
        Operation::Insert | Operation::Delete => {
            base_details.extend(snapshot);
            Vec::new()
        }
    };

    Ok(EmailDraft::new(
        subject.clone(),
        EmailBody {
            summary: subject,
            base_details,
            change_lines,
            always_show_changes: false,
            action,
        },
    ))
}
