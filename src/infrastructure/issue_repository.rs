/// Issueテーブルの読み取りリポジトリ
///
/// `ByCreatedDate-index`（パーティション: `createdDateUtc`、ソート: `createdAt`）を
/// ページ単位でクエリする。
use async_trait::async_trait;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::IssueRecord;

/// 作成日インデックス名
pub const CREATED_DATE_INDEX: &str = "ByCreatedDate-index";

/// ページング用の継続キー（DynamoDBのLastEvaluatedKey）
pub type PageKey = HashMap<String, AttributeValue>;

/// リポジトリ操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IssueRepositoryError {
    /// DynamoDBからの読み取りに失敗
    #[error("Read error: {0}")]
    ReadError(String),
}

/// クエリ結果の1ページ
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssuePage {
    pub issues: Vec<IssueRecord>,
    /// 次ページの開始キー（最終ページではNone）
    pub next_key: Option<PageKey>,
}

/// Issue読み取り用トレイト
#[async_trait]
pub trait IssueRepository: Send + Sync {
    /// 日付パーティション内で`created_since`以降に作成されたIssueを1ページ取得
    ///
    /// # 引数
    /// * `date_partition` - `YYYY-MM-DD`形式のUTC日付
    /// * `created_since` - ISO 8601形式の作成日時下限（含む）
    /// * `start_key` - 前ページの`next_key`（先頭ページはNone）
    async fn query_created_since(
        &self,
        date_partition: &str,
        created_since: &str,
        start_key: Option<PageKey>,
    ) -> Result<IssuePage, IssueRepositoryError>;
}

/// IssueRepositoryのDynamoDB実装
#[derive(Debug, Clone)]
pub struct DynamoIssueRepository {
    client: DynamoDbClient,
    table_name: String,
}

impl DynamoIssueRepository {
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        Self { client, table_name }
    }
}

#[async_trait]
impl IssueRepository for DynamoIssueRepository {
    async fn query_created_since(
        &self,
        date_partition: &str,
        created_since: &str,
        start_key: Option<PageKey>,
    ) -> Result<IssuePage, IssueRepositoryError> {
        debug!(
            table_name = %self.table_name,
            date_partition = date_partition,
            created_since = created_since,
            has_start_key = start_key.is_some(),
            "Issueテーブルをクエリ"
        );

        let response = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(CREATED_DATE_INDEX)
            .key_condition_expression("#ds = :ds and #ca >= :ca")
            .expression_attribute_names("#ds", "createdDateUtc")
            .expression_attribute_names("#ca", "createdAt")
            .expression_attribute_values(":ds", AttributeValue::S(date_partition.to_string()))
            .expression_attribute_values(":ca", AttributeValue::S(created_since.to_string()))
            .set_exclusive_start_key(start_key)
            .send()
            .await
            .map_err(|e| IssueRepositoryError::ReadError(e.into_service_error().to_string()))?;

        let mut issues = Vec::new();
        for item in response.items.unwrap_or_default() {
            let issue: Result<IssueRecord, _> = serde_dynamo::from_item(item);
            match issue {
                Ok(issue) => issues.push(issue),
                Err(e) => {
                    // 型の合わないアイテムは集計対象外
                    warn!(error = %e, "Issueアイテムの変換に失敗、スキップ");
                }
            }
        }

        Ok(IssuePage {
            issues,
            next_key: response.last_evaluated_key,
        })
    }
}
