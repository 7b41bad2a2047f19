/// Issue発生通知ハンドラー
///
/// 新規発生（open）のIssueを通知トピックに発行する。
/// メッセージには`eventId`属性を付け、サブスクリプションのフィルターポリシーで
/// 対象イベントを購読しているエンドポイントにだけ配信させる。
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::IssueNotification;
use crate::infrastructure::{NotificationPublisher, SnsOpsError};

/// 通知処理のエラー型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IssueNotificationError {
    /// 入力がIssueとして解釈できない
    #[error("Invalid issue payload: {0}")]
    InvalidPayload(String),

    /// 発行エラー
    #[error("Publish error: {0}")]
    Publish(String),
}

impl From<SnsOpsError> for IssueNotificationError {
    fn from(err: SnsOpsError) -> Self {
        IssueNotificationError::Publish(err.to_string())
    }
}

/// 通知処理の結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOutcome {
    pub published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// Issue通知ハンドラー
pub struct IssueNotificationHandler<P>
where
    P: NotificationPublisher,
{
    publisher: P,
}

impl<P> IssueNotificationHandler<P>
where
    P: NotificationPublisher,
{
    pub fn new(publisher: P) -> Self {
        Self { publisher }
    }

    /// Issueペイロードを処理する
    ///
    /// ステータスが`open`以外のIssueは発行しない。
    pub async fn handle(
        &self,
        payload: Value,
    ) -> Result<NotificationOutcome, IssueNotificationError> {
        let issue: IssueNotification = serde_json::from_value(payload).map_err(|e| {
            warn!(error = %e, "Issueペイロードの解析に失敗");
            IssueNotificationError::InvalidPayload(e.to_string())
        })?;

        if !issue.is_open() {
            info!(
                issue_id = %issue.id,
                status = %issue.status,
                "openではないIssueのため通知しない"
            );
            return Ok(NotificationOutcome::default());
        }

        let result = self
            .publisher
            .publish_for_event(&issue.message(), &issue.event_id)
            .await?;

        info!(
            issue_id = %issue.id,
            event_id = %issue.event_id,
            message_id = %result.message_id,
            "Issue通知を発行"
        );

        Ok(NotificationOutcome {
            published: true,
            message_id: Some(result.message_id),
        })
    }
}
