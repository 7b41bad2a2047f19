/// Issue発生通知Lambda
///
/// 新規発生したIssueを通知トピックに`eventId`属性付きで発行する。
use andon::application::IssueNotificationHandler;
use andon::infrastructure::{AwsSnsOps, ConfigError, NotifierConfig, init_logging};
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{error, info};

static HANDLER: OnceCell<IssueNotificationHandler<AwsSnsOps>> = OnceCell::const_new();

async fn get_handler() -> Result<&'static IssueNotificationHandler<AwsSnsOps>, ConfigError> {
    HANDLER
        .get_or_try_init(|| async {
            let config = NotifierConfig::from_env().await?;
            Ok(IssueNotificationHandler::new(AwsSnsOps::new(
                config.sns_client().clone(),
                config.topic_arn().to_string(),
            )))
        })
        .await
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    let func = service_fn(handler);
    lambda_runtime::run(func).await?;
    Ok(())
}

async fn handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
    info!(payload = %event.payload, "Received event");

    let notifier = get_handler().await.inspect_err(|err| {
        error!(error = %err, "設定の読み込みに失敗");
    })?;

    let outcome = notifier.handle(event.payload).await.inspect_err(|err| {
        error!(error = %err, "Issue通知エラー");
    })?;

    Ok(serde_json::to_value(outcome)?)
}
