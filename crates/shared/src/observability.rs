//! # ログ出力の初期化
//!
//! サービスごとの [`TracingConfig`] を環境変数から組み立て、tracing subscriber を登録する。
//!
//! | 環境変数 | 内容 | 既定値 |
//! |---|---|---|
//! | `LOG_FORMAT` | `json` / `pretty`（大文字小文字は区別しない） | `pretty` |
//! | `RUST_LOG` | フィルタ | `info,<サービスのクレート>=debug` |

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 1 行 1 JSON（本番環境向け）
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    /// 値を解釈する。未知の値は `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// トレーシング初期化設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    pub service_name:    String,
    pub log_format:      LogFormat,
    /// `RUST_LOG` が未設定のときのフィルタ
    pub default_filter:  String,
    /// 解釈できなかった `LOG_FORMAT` の値（初期化後に警告する）
    pub rejected_format: Option<String>,
}

impl TracingConfig {
    /// `debug_target` は debug レベルまで出すクレート名（`worklog_notify_service` など）
    pub fn new(service_name: impl Into<String>, debug_target: &str) -> Self {
        Self {
            service_name:    service_name.into(),
            log_format:      LogFormat::default(),
            default_filter:  format!("info,{debug_target}=debug"),
            rejected_format: None,
        }
    }

    /// 環境変数から読み込む
    pub fn from_env(service_name: impl Into<String>, debug_target: &str) -> Self {
        Self::new(service_name, debug_target).with_format(std::env::var("LOG_FORMAT").ok())
    }

    /// `LOG_FORMAT` の値を反映する
    ///
    /// 空または未設定なら既定の形式のまま。
    pub fn with_format(mut self, value: Option<String>) -> Self {
        let Some(value) = value.filter(|value| !value.trim().is_empty()) else {
            return self;
        };
        match LogFormat::parse(&value) {
            Some(format) => self.log_format = format,
            None => self.rejected_format = Some(value),
        }
        self
    }
}

/// トレーシングを初期化する
#[cfg(feature = "observability")]
pub fn init_tracing(config: TracingConfig) {
    use tracing_subscriber::{Layer as _, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.default_filter));

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_target(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::debug!(
        service = %config.service_name,
        format = ?config.log_format,
        "トレーシングを初期化しました"
    );
    if let Some(value) = &config.rejected_format {
        tracing::warn!(
            service = %config.service_name,
            "LOG_FORMAT={:?} を解釈できないため pretty で出力します",
            value
        );
    }
}
