/// DynamoDBでトピックサブスクリプションを管理するストア
///
/// データ階層テーブルに`{id: エンドポイント, type: "ISSUE_TOPIC_SUBSCRIPTION"}`を
/// キーとして1エンドポイント1レコードで保存する。
/// レコードは削除しない（フィルターポリシーからイベントIDを外すだけ）。
use async_trait::async_trait;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_dynamodb::types::AttributeValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, trace};

use crate::domain::{FilterPolicy, SubscriptionProtocol, TopicSubscription};

/// サブスクリプションレコードの種別（ソートキー）
pub const SUBSCRIPTION_RECORD_TYPE: &str = "ISSUE_TOPIC_SUBSCRIPTION";

/// ストア操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SubscriptionStoreError {
    /// DynamoDBからの読み取りに失敗
    #[error("Read error: {0}")]
    ReadError(String),

    /// DynamoDBへの書き込みに失敗
    #[error("Write error: {0}")]
    WriteError(String),

    /// レコードの変換に失敗
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// サブスクリプション永続化用トレイト
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// エンドポイントでサブスクリプションを取得
    ///
    /// # 戻り値
    /// * 見つかった場合は`Ok(Some(TopicSubscription))`
    /// * 見つからなかった場合は`Ok(None)`
    /// * 失敗時は`Err(SubscriptionStoreError)`
    async fn get(&self, endpoint: &str)
    -> Result<Option<TopicSubscription>, SubscriptionStoreError>;

    /// サブスクリプションを保存（同じエンドポイントのレコードは上書き）
    async fn put(&self, subscription: &TopicSubscription) -> Result<(), SubscriptionStoreError>;
}

/// テーブル上のレコード表現
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionRecord {
    id: String,
    #[serde(rename = "type")]
    record_type: String,
    endpoint: String,
    protocol: SubscriptionProtocol,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subscription_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filter_policy: Option<FilterPolicy>,
}

impl From<&TopicSubscription> for SubscriptionRecord {
    fn from(subscription: &TopicSubscription) -> Self {
        Self {
            id: subscription.endpoint.clone(),
            record_type: SUBSCRIPTION_RECORD_TYPE.to_string(),
            endpoint: subscription.endpoint.clone(),
            protocol: subscription.protocol,
            subscription_arn: subscription.subscription_arn.clone(),
            filter_policy: subscription.filter_policy.clone(),
        }
    }
}

impl From<SubscriptionRecord> for TopicSubscription {
    fn from(record: SubscriptionRecord) -> Self {
        Self {
            endpoint: record.endpoint,
            protocol: record.protocol,
            subscription_arn: record.subscription_arn,
            filter_policy: record.filter_policy,
        }
    }
}

/// SubscriptionStoreのDynamoDB実装
#[derive(Debug, Clone)]
pub struct DynamoSubscriptionStore {
    /// DynamoDBクライアント
    client: DynamoDbClient,
    /// データ階層テーブル名
    table_name: String,
}

impl DynamoSubscriptionStore {
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        Self { client, table_name }
    }

    /// TopicSubscriptionをDynamoDBアイテムに変換
    fn to_item(
        subscription: &TopicSubscription,
    ) -> Result<HashMap<String, AttributeValue>, SubscriptionStoreError> {
        serde_dynamo::to_item(SubscriptionRecord::from(subscription))
            .map_err(|e| SubscriptionStoreError::SerializationError(e.to_string()))
    }

    /// DynamoDBアイテムをTopicSubscriptionに変換
    fn from_item(
        item: HashMap<String, AttributeValue>,
    ) -> Result<TopicSubscription, SubscriptionStoreError> {
        let record: SubscriptionRecord = serde_dynamo::from_item(item)
            .map_err(|e| SubscriptionStoreError::SerializationError(e.to_string()))?;
        Ok(record.into())
    }
}

#[async_trait]
impl SubscriptionStore for DynamoSubscriptionStore {
    async fn get(
        &self,
        endpoint: &str,
    ) -> Result<Option<TopicSubscription>, SubscriptionStoreError> {
        debug!(
            table_name = %self.table_name,
            endpoint = endpoint,
            "サブスクリプション取得"
        );

        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(endpoint.to_string()))
            .key("type", AttributeValue::S(SUBSCRIPTION_RECORD_TYPE.to_string()))
            .send()
            .await
            .map_err(|e| SubscriptionStoreError::ReadError(e.into_service_error().to_string()))?;

        trace!(found = result.item.is_some(), "サブスクリプション取得結果");

        result.item.map(Self::from_item).transpose()
    }

    async fn put(&self, subscription: &TopicSubscription) -> Result<(), SubscriptionStoreError> {
        let item = Self::to_item(subscription)?;

        debug!(
            table_name = %self.table_name,
            endpoint = %subscription.endpoint,
            subscription_arn = ?subscription.subscription_arn,
            "サブスクリプション保存"
        );

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| SubscriptionStoreError::WriteError(e.into_service_error().to_string()))?;

        Ok(())
    }
}
