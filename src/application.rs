// アプリケーション層モジュール
pub mod issue_notification_handler;
pub mod issue_stats_handler;
pub mod resolver_handler;
pub mod subscription_reconciler;

// 再エクスポート
pub use issue_notification_handler::{
    IssueNotificationError, IssueNotificationHandler, NotificationOutcome,
};
pub use issue_stats_handler::{IssueStatsError, IssueStatsHandler};
pub use resolver_handler::{ResolverError, ResolverHandler};
pub use subscription_reconciler::{ReconcileError, ReconcileReport, SubscriptionReconciler};
