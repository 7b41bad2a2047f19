//! SNS操作モジュール
//!
//! Issue通知トピックに対する操作を提供する。
//! - エンドポイントのサブスクライブとフィルターポリシー更新
//! - `eventId`メッセージ属性付きのIssue通知発行

use async_trait::async_trait;
use aws_sdk_sns::Client as SnsClient;
use aws_sdk_sns::types::MessageAttributeValue;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::domain::{FilterPolicy, TopicSubscription};

/// サブスクリプション属性名
const FILTER_POLICY_ATTRIBUTE: &str = "FilterPolicy";
/// 通知のフィルタリングに使うメッセージ属性名
const EVENT_ID_ATTRIBUTE: &str = "eventId";

/// SNS操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SnsOpsError {
    /// 更新対象のサブスクリプションが存在しない（外部で削除された）
    #[error("SNSサブスクリプションが見つかりません: {0}")]
    NotFound(String),
    /// 更新対象のサブスクリプションARNが無い
    #[error("サブスクリプションARNがありません")]
    MissingSubscriptionArn,
    /// AWS SDK エラー
    #[error("AWS SNS APIエラー: {0}")]
    AwsSdkError(String),
    /// JSON シリアライズエラー
    #[error("JSONシリアライズエラー: {0}")]
    SerializeError(String),
}

/// SNSメッセージ発行結果
#[derive(Debug, Clone, PartialEq)]
pub struct PublishResult {
    /// メッセージID
    pub message_id: String,
    /// 発行先トピックARN
    pub topic_arn: String,
}

impl PublishResult {
    pub fn new(topic_arn: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            topic_arn: topic_arn.into(),
        }
    }
}

/// トピックサブスクリプション操作トレイト（テスト用の抽象化）
#[async_trait]
pub trait TopicSubscriptionOps: Send + Sync {
    /// フィルターポリシー付きでエンドポイントをトピックにサブスクライブする
    ///
    /// サブスクリプションARNは同期的に返すよう要求する。
    ///
    /// # 戻り値
    /// * `Ok(Some(arn))` - 作成されたサブスクリプションARN
    /// * `Ok(None)` - SNSがARNを返さなかった
    /// * `Err(SnsOpsError)` - エラー
    async fn subscribe(&self, subscription: &TopicSubscription)
    -> Result<Option<String>, SnsOpsError>;

    /// サブスクリプションのフィルターポリシー属性を上書きする
    ///
    /// サブスクリプションが存在しない場合は`SnsOpsError::NotFound`を返す。
    async fn set_filter_policy(
        &self,
        subscription_arn: &str,
        filter_policy: &FilterPolicy,
    ) -> Result<(), SnsOpsError>;

    /// サブスクリプションのフィルターポリシーを更新する
    ///
    /// サブスクリプションが存在しない（またはARNが無い）場合は作り直し、
    /// `subscription.subscription_arn`を新しいARNで上書きする。
    /// それ以外のエラーはそのまま返す。
    async fn update_filter_policy(
        &self,
        subscription: &mut TopicSubscription,
    ) -> Result<(), SnsOpsError> {
        let filter_policy = subscription.filter_policy.clone().unwrap_or_default();

        let result = match subscription
            .subscription_arn
            .as_deref()
            .filter(|arn| !arn.trim().is_empty())
        {
            Some(arn) => self.set_filter_policy(arn, &filter_policy).await,
            None => Err(SnsOpsError::MissingSubscriptionArn),
        };

        match result {
            Ok(()) => Ok(()),
            Err(err @ (SnsOpsError::NotFound(_) | SnsOpsError::MissingSubscriptionArn)) => {
                info!(
                    endpoint = %subscription.endpoint,
                    reason = %err,
                    "フィルターポリシーを更新できないため、サブスクリプションを作り直す"
                );
                subscription.subscription_arn = self.subscribe(subscription).await?;
                Ok(())
            }
            Err(err) => {
                warn!(
                    endpoint = %subscription.endpoint,
                    error = %err,
                    "フィルターポリシー更新エラー"
                );
                Err(err)
            }
        }
    }
}

/// Issue通知発行トレイト
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// `eventId`メッセージ属性付きでメッセージを発行する
    async fn publish_for_event(
        &self,
        message: &str,
        event_id: &str,
    ) -> Result<PublishResult, SnsOpsError>;
}

/// 実際のAWS SNS SDKを使用したSNS操作実装
#[derive(Debug, Clone)]
pub struct AwsSnsOps {
    client: SnsClient,
    /// Issue通知トピックARN
    topic_arn: String,
}

impl AwsSnsOps {
    pub fn new(client: SnsClient, topic_arn: String) -> Self {
        Self { client, topic_arn }
    }

    fn filter_policy_json(filter_policy: &FilterPolicy) -> Result<String, SnsOpsError> {
        filter_policy
            .to_json()
            .map_err(|e| SnsOpsError::SerializeError(e.to_string()))
    }
}

#[async_trait]
impl TopicSubscriptionOps for AwsSnsOps {
    async fn subscribe(
        &self,
        subscription: &TopicSubscription,
    ) -> Result<Option<String>, SnsOpsError> {
        let filter_policy =
            Self::filter_policy_json(&subscription.filter_policy.clone().unwrap_or_default())?;

        debug!(
            topic_arn = %self.topic_arn,
            protocol = %subscription.protocol,
            endpoint = %subscription.endpoint,
            filter_policy = %filter_policy,
            "サブスクリプション作成"
        );

        let response = self
            .client
            .subscribe()
            .topic_arn(&self.topic_arn)
            .protocol(subscription.protocol.as_str())
            .endpoint(&subscription.endpoint)
            .attributes(FILTER_POLICY_ATTRIBUTE, filter_policy)
            .return_subscription_arn(true)
            .send()
            .await
            .map_err(|err| {
                let service_error = err.into_service_error();
                warn!(
                    endpoint = %subscription.endpoint,
                    error = %service_error,
                    "SNS Subscribeエラー"
                );
                SnsOpsError::AwsSdkError(service_error.to_string())
            })?;

        trace!(response = ?response, "サブスクリプション作成結果");

        Ok(response.subscription_arn().map(|arn| arn.to_string()))
    }

    async fn set_filter_policy(
        &self,
        subscription_arn: &str,
        filter_policy: &FilterPolicy,
    ) -> Result<(), SnsOpsError> {
        let filter_policy = Self::filter_policy_json(filter_policy)?;

        debug!(
            subscription_arn = subscription_arn,
            filter_policy = %filter_policy,
            "サブスクリプション属性更新"
        );

        let result = self
            .client
            .set_subscription_attributes()
            .subscription_arn(subscription_arn)
            .attribute_name(FILTER_POLICY_ATTRIBUTE)
            .attribute_value(filter_policy)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                let service_error = err.into_service_error();

                // 404（サブスクリプションが削除済み）は呼び出し側で作り直す
                if service_error.is_not_found_exception() {
                    return Err(SnsOpsError::NotFound(subscription_arn.to_string()));
                }

                Err(SnsOpsError::AwsSdkError(service_error.to_string()))
            }
        }
    }
}

#[async_trait]
impl NotificationPublisher for AwsSnsOps {
    async fn publish_for_event(
        &self,
        message: &str,
        event_id: &str,
    ) -> Result<PublishResult, SnsOpsError> {
        info!(
            topic_arn = %self.topic_arn,
            event_id = event_id,
            message_length = message.len(),
            "SNSメッセージ発行開始"
        );

        let event_id_attribute = MessageAttributeValue::builder()
            .data_type("String")
            .string_value(event_id)
            .build()
            .map_err(|e| SnsOpsError::AwsSdkError(e.to_string()))?;

        let result = self
            .client
            .publish()
            .topic_arn(&self.topic_arn)
            .message(message)
            .message_attributes(EVENT_ID_ATTRIBUTE, event_id_attribute)
            .send()
            .await;

        match result {
            Ok(response) => {
                let message_id = response.message_id().unwrap_or("unknown").to_string();

                info!(
                    topic_arn = %self.topic_arn,
                    message_id = %message_id,
                    "SNS Publish成功"
                );

                Ok(PublishResult::new(&self.topic_arn, message_id))
            }
            Err(err) => {
                let service_error = err.into_service_error();
                warn!(
                    topic_arn = %self.topic_arn,
                    error = %service_error,
                    "SNS Publishエラー"
                );
                Err(SnsOpsError::AwsSdkError(service_error.to_string()))
            }
        }
    }
}
