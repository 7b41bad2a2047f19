/// サブスクリプション整合処理
///
/// イベントの作成・更新・削除後に、通知エンドポイントのSNSサブスクリプションと
/// ストアのレコードを、イベントの現在のエンドポイントリストに合わせる。
///
/// # 処理フロー
/// 1. (Step A) 現在のエンドポイントごとにサブスクリプションを作成、
///    またはフィルターポリシーにイベントIDを追加する
/// 2. (Step B) 以前は紐付いていたが現在は紐付かないエンドポイントの
///    フィルターポリシーからイベントIDを外す
///
/// エンドポイントは1件ずつ順番に処理する（並列化しない）。
/// 途中で失敗した場合、それまでの変更は巻き戻さない。各操作は冪等なので
/// 再実行で収束する。
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{EndpointParser, EndpointRequest, FilterPolicy, TopicSubscription};
use crate::infrastructure::{
    SnsOpsError, SubscriptionStore, SubscriptionStoreError, TopicSubscriptionOps,
};

/// 整合処理のエラー型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconcileError {
    /// ストア操作エラー
    #[error("subscription store error: {0}")]
    Store(String),

    /// SNS操作エラー
    #[error("topic subscription error: {0}")]
    Topic(String),
}

impl From<SubscriptionStoreError> for ReconcileError {
    fn from(err: SubscriptionStoreError) -> Self {
        ReconcileError::Store(err.to_string())
    }
}

impl From<SnsOpsError> for ReconcileError {
    fn from(err: SnsOpsError) -> Self {
        ReconcileError::Topic(err.to_string())
    }
}

/// 整合処理の結果集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// 新規作成したサブスクリプション数
    pub created: usize,
    /// フィルターポリシーにイベントIDを追加した数
    pub updated: usize,
    /// 既にイベントIDを含んでいた数
    pub unchanged: usize,
    /// フィルターポリシーからイベントIDを外した数
    pub cleaned: usize,
    /// レコードが無い、またはフィルターポリシーが無いため片付けをスキップした数
    pub skipped_missing: usize,
    /// フィルターポリシーにイベントIDが無いため片付けをスキップした数
    pub skipped_not_subscribed: usize,
}

impl ReconcileReport {
    /// 見逃された可能性のある不整合の件数
    pub fn warnings(&self) -> usize {
        self.skipped_missing + self.skipped_not_subscribed
    }
}

/// Step Aで1エンドポイントに対して行った処理
enum EnsureOutcome {
    Created,
    Updated,
    Unchanged,
}

/// サブスクリプション整合処理
pub struct SubscriptionReconciler<S, T>
where
    S: SubscriptionStore,
    T: TopicSubscriptionOps,
{
    /// サブスクリプションストア
    store: S,
    /// SNS操作
    topic: T,
}

impl<S, T> SubscriptionReconciler<S, T>
where
    S: SubscriptionStore,
    T: TopicSubscriptionOps,
{
    pub fn new(store: S, topic: T) -> Self {
        Self { store, topic }
    }

    /// イベント作成・更新後の整合（Step A → Step B）
    ///
    /// # 引数
    /// * `current` - イベントの現在のエンドポイント
    /// * `previous_email` - 更新前のメールアドレス（カンマ区切り）
    /// * `previous_sms` - 更新前の電話番号（カンマ区切り）
    /// * `event_id` - イベントID
    pub async fn reconcile(
        &self,
        current: &[EndpointRequest],
        previous_email: Option<&str>,
        previous_sms: Option<&str>,
        event_id: &str,
    ) -> Result<ReconcileReport, ReconcileError> {
        let mut report = ReconcileReport::default();

        self.ensure_subscriptions(current, event_id, &mut report)
            .await?;
        self.cleanup_previous(current, previous_email, previous_sms, event_id, &mut report)
            .await?;

        Self::log_report(event_id, &report);
        Ok(report)
    }

    /// イベント削除後の整合（Step Bのみ、現在のエンドポイントは空）
    ///
    /// 削除されたイベントに紐付いていた全エンドポイントが片付け対象になる。
    pub async fn release_event(
        &self,
        email: Option<&str>,
        sms: Option<&str>,
        event_id: &str,
    ) -> Result<ReconcileReport, ReconcileError> {
        let mut report = ReconcileReport::default();

        self.cleanup_previous(&[], email, sms, event_id, &mut report)
            .await?;

        Self::log_report(event_id, &report);
        Ok(report)
    }

    /// 片付け対象のエンドポイントを求める
    ///
    /// 以前のエンドポイントのうち、プロトコルとエンドポイントの組が
    /// 現在のリストに無いものを出現順に返す。
    pub fn cleanup_candidates(
        current: &[EndpointRequest],
        previous_email: Option<&str>,
        previous_sms: Option<&str>,
    ) -> Vec<EndpointRequest> {
        EndpointParser::parse_all(previous_email, previous_sms)
            .into_iter()
            .filter(|previous| !current.contains(previous))
            .collect()
    }

    /// Step A: 現在のエンドポイントのサブスクリプションを保証する
    async fn ensure_subscriptions(
        &self,
        current: &[EndpointRequest],
        event_id: &str,
        report: &mut ReconcileReport,
    ) -> Result<(), ReconcileError> {
        info!(
            event_id = event_id,
            total = current.len(),
            "イベントのサブスクリプション数"
        );

        for (index, request) in current.iter().enumerate() {
            info!(
                event_id = event_id,
                index = index + 1,
                total = current.len(),
                protocol = %request.protocol,
                "サブスクリプション処理"
            );

            match self.ensure_subscription(request, event_id).await? {
                EnsureOutcome::Created => report.created += 1,
                EnsureOutcome::Updated => report.updated += 1,
                EnsureOutcome::Unchanged => report.unchanged += 1,
            }
        }

        Ok(())
    }

    /// 1エンドポイント分のStep A
    async fn ensure_subscription(
        &self,
        request: &EndpointRequest,
        event_id: &str,
    ) -> Result<EnsureOutcome, ReconcileError> {
        let (subscription, outcome) = match self.store.get(&request.endpoint).await? {
            None => {
                info!(endpoint = %request.endpoint, "サブスクリプションが存在しないため作成する");

                let mut subscription = TopicSubscription::for_new_event(request, event_id);
                subscription.subscription_arn = self.topic.subscribe(&subscription).await?;
                (subscription, EnsureOutcome::Created)
            }
            Some(subscription) if subscription.is_subscribed_to(event_id) => {
                info!(
                    endpoint = %request.endpoint,
                    event_id = event_id,
                    "フィルターポリシーに既にイベントIDが含まれるため更新不要"
                );
                return Ok(EnsureOutcome::Unchanged);
            }
            Some(mut subscription) => {
                info!(
                    endpoint = %request.endpoint,
                    event_id = event_id,
                    "フィルターポリシーにイベントIDを追加する"
                );

                subscription
                    .filter_policy
                    .get_or_insert_with(FilterPolicy::default)
                    .insert(event_id);
                self.topic.update_filter_policy(&mut subscription).await?;
                (subscription, EnsureOutcome::Updated)
            }
        };

        // ARNが取れなかったサブスクリプションは保存しない
        if subscription.has_subscription_arn() {
            debug!(endpoint = %subscription.endpoint, "サブスクリプションをストアに保存");
            self.store.put(&subscription).await?;
        } else {
            warn!(
                endpoint = %subscription.endpoint,
                "サブスクリプションARNが取得できなかったため保存しない"
            );
        }

        Ok(outcome)
    }

    /// Step B: 紐付かなくなったエンドポイントからイベントIDを外す
    async fn cleanup_previous(
        &self,
        current: &[EndpointRequest],
        previous_email: Option<&str>,
        previous_sms: Option<&str>,
        event_id: &str,
        report: &mut ReconcileReport,
    ) -> Result<(), ReconcileError> {
        info!(event_id = event_id, "以前のサブスクリプションの片付けを確認");

        let candidates = Self::cleanup_candidates(current, previous_email, previous_sms);
        info!(
            event_id = event_id,
            total = candidates.len(),
            "片付け対象のサブスクリプション数"
        );

        for (index, candidate) in candidates.iter().enumerate() {
            info!(
                event_id = event_id,
                index = index + 1,
                total = candidates.len(),
                protocol = %candidate.protocol,
                "片付け処理"
            );

            let stored = self.store.get(&candidate.endpoint).await?;
            let Some(mut subscription) = stored.filter(|s| s.filter_policy.is_some()) else {
                warn!(
                    endpoint = %candidate.endpoint,
                    event_id = event_id,
                    "以前のサブスクリプションが存在しないかフィルターポリシーが無い"
                );
                report.skipped_missing += 1;
                continue;
            };

            let removed = subscription
                .filter_policy
                .as_mut()
                .is_some_and(|policy| policy.remove(event_id));

            if !removed {
                warn!(
                    endpoint = %candidate.endpoint,
                    event_id = event_id,
                    "以前のサブスクリプションのフィルターポリシーにイベントIDが含まれない"
                );
                debug!(subscription = ?subscription, "以前のサブスクリプション");
                report.skipped_not_subscribed += 1;
                continue;
            }

            self.topic.update_filter_policy(&mut subscription).await?;
            report.cleaned += 1;

            // 作り直しでARNが取れなかった場合、保存済みのARNを消さない
            if subscription.has_subscription_arn() {
                self.store.put(&subscription).await?;
            } else {
                warn!(
                    endpoint = %subscription.endpoint,
                    "サブスクリプションARNが取得できなかったため保存しない"
                );
            }
        }

        Ok(())
    }

    fn log_report(event_id: &str, report: &ReconcileReport) {
        info!(
            event_id = event_id,
            created = report.created,
            updated = report.updated,
            unchanged = report.unchanged,
            cleaned = report.cleaned,
            skipped_missing = report.skipped_missing,
            skipped_not_subscribed = report.skipped_not_subscribed,
            "サブスクリプション整合完了"
        );

        if report.warnings() > 0 {
            warn!(
                event_id = event_id,
                warnings = report.warnings(),
                "片付けをスキップしたエンドポイントがある"
            );
        }
    }
}
