// Domain layer modules
pub mod endpoint_parser;
pub mod issue_notification;
pub mod issue_stats;
pub mod resolver_request;
pub mod subscription_protocol;
pub mod topic_subscription;

// Re-exports
pub use endpoint_parser::{EndpointParser, EndpointRequest};
pub use issue_notification::IssueNotification;
pub use issue_stats::{IssueRecord, IssueStats, IssueStatus, StatsWindow};
pub use resolver_request::{
    AppSyncResolverRequest, EventMutation, RequestValidationError, ResolverOperation,
};
pub use subscription_protocol::SubscriptionProtocol;
pub use topic_subscription::{FilterPolicy, PLACEHOLDER_EVENT_ID, TopicSubscription};
