/// ログ基盤モジュール
///
/// Lambda環境向けの構造化ログ設定を提供する。
/// tracingクレートを使用し、JSON形式での出力をサポートする。
use std::sync::Once;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// ログサブスクライバー初期化用の同期プリミティブ
static INIT: Once = Once::new();

/// デプロイテンプレートが設定するログレベルの環境変数
pub const LOGGING_LEVEL: &str = "LOGGING_LEVEL";

/// フィルター指定を決定する
///
/// 優先順位: `RUST_LOG` → `LOGGING_LEVEL` → `info`
///
/// `LOGGING_LEVEL`は`ERROR`/`WARN`/`INFO`/`DEBUG`/`VERBOSE`を受け付け、
/// `VERBOSE`はSDKリクエストの詳細まで出す`trace`に対応させる。
pub fn resolve_filter_directive(rust_log: Option<&str>, logging_level: Option<&str>) -> String {
    if let Some(directive) = rust_log.filter(|d| !d.trim().is_empty()) {
        return directive.to_string();
    }

    let level = match logging_level.map(|l| l.trim().to_ascii_uppercase()).as_deref() {
        Some("VERBOSE") => "trace",
        Some("DEBUG") => "debug",
        Some("WARN") => "warn",
        Some("ERROR") => "error",
        _ => "info",
    };
    level.to_string()
}

/// Lambda環境向けのログサブスクライバーを初期化する
///
/// この関数は複数回呼び出しても安全で、最初の呼び出しのみ初期化を実行する。
///
/// # 使用例
/// ```ignore
/// use andon::infrastructure::init_logging;
///
/// init_logging();
/// tracing::info!("Lambda function started");
/// ```
pub fn init_logging() {
    INIT.call_once(|| {
        let rust_log = std::env::var("RUST_LOG").ok();
        let logging_level = std::env::var(LOGGING_LEVEL).ok();
        let directive = resolve_filter_directive(rust_log.as_deref(), logging_level.as_deref());
        let env_filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

        // JSON形式のログレイヤー（Lambda/CloudWatch向け）
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .flatten_event(true)
            .with_current_span(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .init();
    });
}

/// テスト用のログサブスクライバーを初期化する（人間が読みやすい形式）
#[cfg(test)]
pub fn init_test_logging() {
    static TEST_INIT: Once = Once::new();

    TEST_INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_test_writer()
            .with_target(true)
            .compact();

        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_takes_precedence() {
        assert_eq!(
            resolve_filter_directive(Some("andon=debug"), Some("ERROR")),
            "andon=debug"
        );
    }

    #[test]
    fn test_blank_rust_log_is_ignored() {
        assert_eq!(resolve_filter_directive(Some(" "), Some("WARN")), "warn");
    }

    #[test]
    fn test_logging_level_mapping() {
        assert_eq!(resolve_filter_directive(None, Some("VERBOSE")), "trace");
        assert_eq!(resolve_filter_directive(None, Some("DEBUG")), "debug");
        assert_eq!(resolve_filter_directive(None, Some("INFO")), "info");
        assert_eq!(resolve_filter_directive(None, Some("WARN")), "warn");
        assert_eq!(resolve_filter_directive(None, Some("ERROR")), "error");
    }

    #[test]
    fn test_logging_level_is_case_insensitive() {
        assert_eq!(resolve_filter_directive(None, Some("verbose")), "trace");
    }

    #[test]
    fn test_default_level() {
        assert_eq!(resolve_filter_directive(None, None), "info");
        assert_eq!(resolve_filter_directive(None, Some("LOUD")), "info");
    }

    #[test]
    fn test_init_logging_idempotent() {
        init_test_logging();
        init_test_logging();
    }

    #[test]
    fn test_log_with_context() {
        init_test_logging();

        tracing::info!(
            event_id = "event-1",
            endpoint = "a@x.com",
            "サブスクリプション処理開始"
        );
    }
}
