/// AppSync Lambdaリゾルバーハンドラー
///
/// リクエストを検証し、イベントのミューテーション後処理（サブスクリプション整合）
/// または集計クエリに振り分ける。
///
/// # ルーティング
/// - `Mutation.createEvent` / `Mutation.updateEvent`: Step A → Step B
///   （片付け対象は`arguments.previousEmail` / `previousSms`）
/// - `Mutation.deleteEvent`: Step Bのみ（片付け対象は前段結果の`email` / `sms`）
/// - `Query.getPrevDayIssuesStats`: 過去24時間のIssue集計
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

use super::issue_stats_handler::{IssueStatsError, IssueStatsHandler};
use super::subscription_reconciler::{ReconcileError, SubscriptionReconciler};
use crate::domain::{
    AppSyncResolverRequest, EndpointParser, EventMutation, RequestValidationError,
    ResolverOperation, StatsWindow,
};
use crate::infrastructure::{IssueRepository, SubscriptionStore, TopicSubscriptionOps};

/// リゾルバーのエラー型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolverError {
    /// リクエスト検証エラー
    #[error(transparent)]
    Validation(#[from] RequestValidationError),

    /// サブスクリプション整合エラー
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// 集計エラー
    #[error(transparent)]
    Stats(#[from] IssueStatsError),

    /// レスポンスのシリアライズエラー
    #[error("Response serialization error: {0}")]
    Serialize(String),
}

/// AppSyncリゾルバーハンドラー
pub struct ResolverHandler<S, T, R>
where
    S: SubscriptionStore,
    T: TopicSubscriptionOps,
    R: IssueRepository,
{
    reconciler: SubscriptionReconciler<S, T>,
    stats_handler: IssueStatsHandler<R>,
}

impl<S, T, R> ResolverHandler<S, T, R>
where
    S: SubscriptionStore,
    T: TopicSubscriptionOps,
    R: IssueRepository,
{
    pub fn new(store: S, topic: T, issue_repo: R) -> Self {
        Self {
            reconciler: SubscriptionReconciler::new(store, topic),
            stats_handler: IssueStatsHandler::new(issue_repo),
        }
    }

    /// Lambdaペイロードを処理する（集計は現在時刻基準）
    pub async fn handle(&self, payload: Value) -> Result<Value, ResolverError> {
        self.handle_with_window(payload, StatsWindow::now()).await
    }

    /// Lambdaペイロードを処理する
    ///
    /// # 戻り値
    /// * ミューテーション: 前段の結果をそのまま返す
    /// * 集計クエリ: `{open, acknowledged, closed, lastThreeHours}`
    pub async fn handle_with_window(
        &self,
        payload: Value,
        window: StatsWindow,
    ) -> Result<Value, ResolverError> {
        info!(payload = %payload, "Received event");

        let operation = AppSyncResolverRequest::from_value(payload)
            .and_then(AppSyncResolverRequest::into_operation)
            .inspect_err(|e| error!(error = %e, "リクエスト検証エラー"))?;

        match operation {
            ResolverOperation::EventMutation {
                mutation,
                event_id,
                email,
                sms,
                previous_email,
                previous_sms,
                result,
            } => {
                info!(
                    field_name = mutation.field_name(),
                    event_id = %event_id,
                    "イベントのサブスクリプションを整合"
                );

                match mutation {
                    EventMutation::Create | EventMutation::Update => {
                        let current = EndpointParser::parse_all(email.as_deref(), sms.as_deref());
                        self.reconciler
                            .reconcile(
                                &current,
                                previous_email.as_deref(),
                                previous_sms.as_deref(),
                                &event_id,
                            )
                            .await?;
                    }
                    EventMutation::Delete => {
                        self.reconciler
                            .release_event(email.as_deref(), sms.as_deref(), &event_id)
                            .await?;
                    }
                }

                Ok(result)
            }
            ResolverOperation::GetPrevDayIssuesStats => {
                let stats = self.stats_handler.get_prev_day_issues_stats(window).await?;
                serde_json::to_value(stats).map_err(|e| ResolverError::Serialize(e.to_string()))
            }
        }
    }
}
