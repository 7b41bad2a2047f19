/// AppSync Lambdaリゾルバー
///
/// イベントの作成・更新・削除後の通知サブスクリプション整合と、
/// 過去24時間のIssue集計クエリを処理する。
use andon::application::ResolverHandler;
use andon::infrastructure::{
    AwsSnsOps, ConfigError, DynamoIssueRepository, DynamoSubscriptionStore, ResolverConfig,
    init_logging,
};
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::error;

type Handler = ResolverHandler<DynamoSubscriptionStore, AwsSnsOps, DynamoIssueRepository>;

/// ハンドラーの静的インスタンス
///
/// warm start時にSDKクライアントを再利用する。
static HANDLER: OnceCell<Handler> = OnceCell::const_new();

/// ハンドラーを取得（初期化されていなければ初期化）
async fn get_handler() -> Result<&'static Handler, ConfigError> {
    HANDLER
        .get_or_try_init(|| async {
            let config = ResolverConfig::from_env().await?;
            let settings = config.settings();

            Ok(ResolverHandler::new(
                DynamoSubscriptionStore::new(
                    config.dynamodb_client().clone(),
                    settings.data_hierarchy_table().to_string(),
                ),
                AwsSnsOps::new(config.sns_client().clone(), settings.topic_arn().to_string()),
                DynamoIssueRepository::new(
                    config.dynamodb_client().clone(),
                    settings.issues_table().to_string(),
                ),
            ))
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

/// Lambda関数のメインハンドラー
///
/// 失敗時はエラーを返し、AppSyncにリゾルバーエラーとして伝える。
async fn handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
    let resolver = get_handler().await.inspect_err(|err| {
        error!(error = %err, "設定の読み込みに失敗");
    })?;

    match resolver.handle(event.payload).await {
        Ok(response) => Ok(response),
        Err(err) => {
            error!(error = %err, "リゾルバー処理エラー");
            Err(err.into())
        }
    }
}
