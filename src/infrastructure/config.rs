/// Lambda関数の設定
///
/// 環境変数からテーブル名・トピックARNを読み込み、AWS SDKクライアントを構築する。
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_sns::Client as SnsClient;
use thiserror::Error;

/// サブスクリプション記録を保持するテーブル
pub const DATA_HIERARCHY_TABLE_NAME: &str = "DATA_HIERARCHY_TABLE_NAME";
/// Issueを保持するテーブル
pub const ISSUES_TABLE_NAME: &str = "ISSUES_TABLE_NAME";
/// Issue通知用SNSトピック
pub const ISSUE_NOTIFICATION_TOPIC_ARN: &str = "ISSUE_NOTIFICATION_TOPIC_ARN";

/// 設定読み込みのエラー型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// 必須の環境変数を読み込む（空文字列は未設定扱い）
fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

/// 環境からAWS SDK設定を読み込む（認証情報、リージョンなど）
async fn load_aws_config() -> aws_config::SdkConfig {
    aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await
}

/// AppSyncリゾルバーの設定値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    data_hierarchy_table: String,
    issues_table: String,
    topic_arn: String,
}

impl ResolverSettings {
    /// 環境変数から読み込む
    ///
    /// - DATA_HIERARCHY_TABLE_NAME
    /// - ISSUES_TABLE_NAME
    /// - ISSUE_NOTIFICATION_TOPIC_ARN
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            data_hierarchy_table: required_env(DATA_HIERARCHY_TABLE_NAME)?,
            issues_table: required_env(ISSUES_TABLE_NAME)?,
            topic_arn: required_env(ISSUE_NOTIFICATION_TOPIC_ARN)?,
        })
    }

    /// 明示的な値で作成（テスト用）
    pub fn new(data_hierarchy_table: String, issues_table: String, topic_arn: String) -> Self {
        Self {
            data_hierarchy_table,
            issues_table,
            topic_arn,
        }
    }

    pub fn data_hierarchy_table(&self) -> &str {
        &self.data_hierarchy_table
    }

    pub fn issues_table(&self) -> &str {
        &self.issues_table
    }

    pub fn topic_arn(&self) -> &str {
        &self.topic_arn
    }
}

/// AppSyncリゾルバーの設定（クライアント込み）
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    dynamodb_client: DynamoDbClient,
    sns_client: SnsClient,
    settings: ResolverSettings,
}

impl ResolverConfig {
    /// 環境変数とAWS設定から作成
    pub async fn from_env() -> Result<Self, ConfigError> {
        let settings = ResolverSettings::from_env()?;
        let aws_config = load_aws_config().await;

        Ok(Self {
            dynamodb_client: DynamoDbClient::new(&aws_config),
            sns_client: SnsClient::new(&aws_config),
            settings,
        })
    }

    pub fn dynamodb_client(&self) -> &DynamoDbClient {
        &self.dynamodb_client
    }

    pub fn sns_client(&self) -> &SnsClient {
        &self.sns_client
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }
}

/// Issue通知Lambdaの設定
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    sns_client: SnsClient,
    topic_arn: String,
}

impl NotifierConfig {
    /// 環境変数（ISSUE_NOTIFICATION_TOPIC_ARN）とAWS設定から作成
    pub async fn from_env() -> Result<Self, ConfigError> {
        let topic_arn = required_env(ISSUE_NOTIFICATION_TOPIC_ARN)?;
        let aws_config = load_aws_config().await;

        Ok(Self {
            sns_client: SnsClient::new(&aws_config),
            topic_arn,
        })
    }

    pub fn sns_client(&self) -> &SnsClient {
        &self.sns_client
    }

    pub fn topic_arn(&self) -> &str {
        &self.topic_arn
    }
}
