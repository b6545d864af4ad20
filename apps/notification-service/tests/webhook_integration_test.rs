//! Webhook 統合テスト
//!
//! ルーターを HTTP 経由で呼び出し、受信から送信までの一連の判定を検証する。
//! 送信プロバイダとデータベースはインメモリのモックを使用する。
//!
//! ## 実行方法
//!
//! ```bash
//! cargo test -p worklog-notify-service --test webhook_integration_test
//! ```
//!
//! ## テストケース
//!
//! - 報告書の更新は `ok` を返し、変更行を含むメールを送る
//! - 報告書の削除は送信を試みずに `skip` を返す
//! - 一括イベントの削除と追加は 1 本の変更行にまとまる
//! - スロットル期間内の 2 回目のリクエストは `skip` を返す
//! - API キーが無ければ外部呼び出しの前に `skip` を返す
//! - 不正な JSON でも 200 で `skip` を返す
//! - 既定の 2 MB を超える本文も処理し、上限を超える本文は 200 で `skip` を返す
//! - 下書きの報告書は `skip` を返す
//! - ヘルスチェック

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tower::ServiceExt;
use worklog_notify_infra::mock::{
    MockNotificationSender,
    MockNotificationThrottleRepository,
    MockReportRepository,
    MockUserProfileRepository,
};
use worklog_notify_service::{
    handler::{MAX_WEBHOOK_BODY_BYTES, WebhookState},
    router,
    usecase::{
        NotificationService,
        NotificationSettings,
        notification::{RecipientPolicy, TemplateRenderer},
    },
};

fn create_app(sender: MockNotificationSender, throttle: MockNotificationThrottleRepository) -> Router {
    let service = NotificationService::new(
        Arc::new(sender),
        Arc::new(MockReportRepository::new()),
        Arc::new(MockUserProfileRepository::new()),
        Arc::new(throttle),
        TemplateRenderer::new(None).unwrap(),
        NotificationSettings {
            base_url: "http://localhost:5173".to_string(),
            policy:   RecipientPolicy {
                default_recipients: vec!["team@example.com".to_string()],
                vacation_approver:  "approver@example.com".to_string(),
            },
        },
    );
    router(Arc::new(WebhookState {
        service: Arc::new(service),
    }))
}

fn webhook_request(path: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

/// リクエストを送り、ステータスとボディを返す
async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn report_update() -> String {
    json!({
        "table": "work_logs",
        "operation": "UPDATE",
        "record": {"id": 7, "is_draft": false},
        "changes": {"subject": {"before": "A", "after": "B"}},
    })
    .to_string()
}

#[tokio::test]
async fn test_報告書の更新は変更行を含むメールを送る() {
    let sender = MockNotificationSender::new();
    let app = create_app(sender.clone(), MockNotificationThrottleRepository::new());

    let (status, body) = send(&app, webhook_request("/", report_update())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
    let sent = sender.sent_emails();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.contains("수정"));
    assert!(sent[0].text_body.contains("제목: A → B"));
    assert!(sent[0].html_body.contains("제목: A → B"));
}

#[tokio::test]
async fn test_報告書の削除は送信を試みない() {
    let sender = MockNotificationSender::new();
    let app = create_app(sender.clone(), MockNotificationThrottleRepository::new());
    let payload = json!({"table": "work_logs", "operation": "DELETE", "record": {"id": 7}});

    let (status, body) = send(&app, webhook_request("/", payload.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "skip");
    assert_eq!(sender.attempts(), 0);
}

#[tokio::test]
async fn test_一括イベントの削除と追加は1本の変更行にまとまる() {
    let sender = MockNotificationSender::new();
    let app = create_app(sender.clone(), MockNotificationThrottleRepository::new());
    let payload = json!({
        "batched": true,
        "work_log_id": 9,
        "events": [
            {"table": "work_log_entries", "operation": "DELETE",
             "record": {"id": 1, "date_from": "2024-01-01", "details": "X"}},
            {"table": "work_log_entries", "operation": "INSERT",
             "record": {"id": 2, "date_from": "2024-01-01", "details": "Y"}},
        ],
    });

    let (_, body) =
        send(&app, webhook_request("/send-notification-email", payload.to_string())).await;

    assert_eq!(body, "ok");
    let sent = sender.sent_emails();
    assert_eq!(sent.len(), 1);
    let merged: Vec<_> = sent[0]
        .text_body
        .lines()
        .filter(|line| line.contains('X') && line.contains('Y'))
        .collect();
    assert_eq!(merged.len(), 1);
    assert!(merged[0].contains("X → "));
    assert!(
        sent[0]
            .text_body
            .lines()
            .all(|line| !line.ends_with("추가됨") && !line.ends_with("삭제됨"))
    );
    assert!(sent[0].html_body.contains("http://localhost:5173/work-logs/9"));
}

#[tokio::test]
async fn test_スロットル期間内の2回目はスキップする() {
    let sender = MockNotificationSender::new();
    let throttle = MockNotificationThrottleRepository::new();
    let app = create_app(sender.clone(), throttle.clone());

    let (_, first) = send(&app, webhook_request("/", report_update())).await;
    let (status, second) = send(&app, webhook_request("/", report_update())).await;

    assert_eq!(first, "ok");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second, "skip");
    assert_eq!(sender.attempts(), 1);
    assert_eq!(throttle.calls(), 2);
}

#[tokio::test]
async fn test_apiキーが無ければ外部呼び出しの前にスキップする() {
    let sender = MockNotificationSender::unconfigured();
    let throttle = MockNotificationThrottleRepository::new();
    let app = create_app(sender.clone(), throttle.clone());
    let calendar = json!({
        "table": "calendar_events",
        "operation": "INSERT",
        "record": {"title": "정기 점검", "start_date": "2024-05-01"},
    });

    let (_, report) = send(&app, webhook_request("/", report_update())).await;
    let (_, event) = send(&app, webhook_request("/", calendar.to_string())).await;

    assert_eq!(report, "skip");
    assert_eq!(event, "skip");
    assert_eq!(sender.attempts(), 0);
    assert_eq!(throttle.calls(), 0);
}

#[tokio::test]
async fn test_不正なjsonでも200でスキップを返す() {
    let sender = MockNotificationSender::new();
    let app = create_app(sender.clone(), MockNotificationThrottleRepository::new());

    let (status, body) = send(&app, webhook_request("/", "{not json")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "skip");
    assert_eq!(sender.attempts(), 0);
}

/// `memo` に指定サイズの文字列を持つ報告書の更新イベント
fn report_update_with_memo(memo_len: usize) -> String {
    json!({
        "table": "work_logs",
        "operation": "UPDATE",
        "record": {"id": 7, "is_draft": false, "memo": "a".repeat(memo_len)},
        "changes": {"subject": {"before": "A", "after": "B"}},
    })
    .to_string()
}

#[tokio::test]
async fn test_数mbの本文でも受け付けて送信する() {
    let sender = MockNotificationSender::new();
    let app = create_app(sender.clone(), MockNotificationThrottleRepository::new());

    let (status, body) =
        send(&app, webhook_request("/", report_update_with_memo(3 * 1024 * 1024))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
    assert_eq!(sender.attempts(), 1);
}

#[tokio::test]
async fn test_上限を超える本文は200でスキップを返す() {
    let sender = MockNotificationSender::new();
    let throttle = MockNotificationThrottleRepository::new();
    let app = create_app(sender.clone(), throttle.clone());

    let (status, body) = send(
        &app,
        webhook_request("/", report_update_with_memo(MAX_WEBHOOK_BODY_BYTES + 1)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "skip");
    assert_eq!(sender.attempts(), 0);
    assert_eq!(throttle.calls(), 0);
}

#[tokio::test]
async fn test_下書きの報告書はスキップする() {
    let sender = MockNotificationSender::new();
    let app = create_app(sender.clone(), MockNotificationThrottleRepository::new());
    let payload = json!({
        "table": "work_logs",
        "operation": "UPDATE",
        "record": {"id": 7, "is_draft": true},
        "changes": {"subject": {"before": "A", "after": "B"}},
    });

    let (_, body) = send(&app, webhook_request("/", payload.to_string())).await;

    assert_eq!(body, "skip");
    assert_eq!(sender.attempts(), 0);
}

#[tokio::test]
async fn test_レスポンスはtext_plainで返す() {
    let app = create_app(MockNotificationSender::new(), MockNotificationThrottleRepository::new());

    let response = app
        .oneshot(webhook_request("/", "{}"))
        .await
        .unwrap();

    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_ヘルスチェックはhealthyを返す() {
    let app = create_app(MockNotificationSender::new(), MockNotificationThrottleRepository::new());
    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "healthy");
}
