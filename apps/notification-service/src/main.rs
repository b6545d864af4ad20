//! # 通知サービス サーバー
//!
//! データベースのトリガー層から変更イベントの Webhook を受け取り、
//! 関係者にメールで通知する。
//!
//! ```text
//! ┌──────────────┐  Webhook  ┌──────────────────────┐  HTTPS  ┌──────────────┐
//! │ DB トリガー  │──────────→│ Notification Service │────────→│    Resend    │
//! └──────────────┘           └──────────────────────┘         └──────────────┘
//!                                       │
//!                                       ↓ 補強情報・スロットル
//!                                ┌──────────────┐
//!                                │  PostgreSQL  │
//!                                └──────────────┘
//! ```
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `NOTIFY_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `NOTIFY_PORT` | No | ポート番号（デフォルト: `8080`） |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `NOTIFICATION_BACKEND` | No | `resend`（デフォルト）または `noop` |
//! | `RESEND_API_KEY` | No | 未設定の場合はすべての通知を抑止 |
//! | `NOTIFICATION_BASE_URL` | No | メール内リンクの基点 URL |
//! | `NOTIFICATION_BANNER_URL` | No | ヘッダー画像の URL |
//! | `NOTIFICATION_DEFAULT_RECIPIENTS` | No | 既定の配信リスト（カンマ区切り） |
//! | `NOTIFICATION_VACATION_APPROVER` | No | 休暇申請の承認者 |
//!
//! ## 起動方法
//!
//! ```bash
//! DATABASE_URL=postgres://... RESEND_API_KEY=re_... cargo run -p worklog-notify-service
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use tokio::net::TcpListener;
use worklog_notify_infra::{
    db,
    notification::{NoopNotificationSender, NotificationSender, ResendNotificationSender},
    repository::{
        PostgresNotificationThrottleRepository,
        PostgresReportRepository,
        PostgresUserProfileRepository,
    },
};
use worklog_notify_service::{
    config::{NotificationBackend, ServiceConfig},
    handler::WebhookState,
    router,
    usecase::{NotificationService, notification::TemplateRenderer},
};
use worklog_notify_shared::observability::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    init_tracing(TracingConfig::from_env("notification-service", "worklog_notify_service"));

    let config = ServiceConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        "通知サービスを起動します: {}:{}",
        config.host,
        config.port
    );

    let pool = db::create_pool(&config.database_url)
        .await
        .context("データベース接続に失敗しました")?;
    db::run_migrations(&pool)
        .await
        .context("マイグレーションの適用に失敗しました")?;
    tracing::info!("データベースに接続しました");

    let notification = &config.notification;
    let sender: Arc<dyn NotificationSender> = match notification.backend {
        NotificationBackend::Resend => Arc::new(ResendNotificationSender::new(
            reqwest::Client::new(),
            notification.api_url.clone(),
            notification.api_key.clone(),
            notification.from_address.clone(),
        )),
        NotificationBackend::Noop => Arc::new(NoopNotificationSender),
    };
    if !sender.is_configured() {
        tracing::warn!("RESEND_API_KEY が未設定のため、すべての通知を抑止します");
    }
    tracing::info!(backend = %notification.backend, "通知バックエンドを初期化しました");

    let template_renderer = TemplateRenderer::new(notification.banner_url.clone())
        .context("テンプレートの読み込みに失敗しました")?;

    let service = NotificationService::new(
        sender,
        Arc::new(PostgresReportRepository::new(pool.clone())),
        Arc::new(PostgresUserProfileRepository::new(pool.clone())),
        Arc::new(PostgresNotificationThrottleRepository::new(pool)),
        template_renderer,
        notification.settings(),
    );
    let state = Arc::new(WebhookState {
        service: Arc::new(service),
    });

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("バインドアドレスが不正です")?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("通知サービスが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
