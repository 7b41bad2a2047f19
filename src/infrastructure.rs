// Infrastructure layer modules
pub mod config;
pub mod issue_repository;
pub mod logging;
pub mod sns_ops;
pub mod subscription_store;

// Re-exports
pub use config::{ConfigError, NotifierConfig, ResolverConfig, ResolverSettings};
pub use issue_repository::{
    DynamoIssueRepository, IssuePage, IssueRepository, IssueRepositoryError, PageKey,
};
pub use logging::init_logging;
pub use sns_ops::{
    AwsSnsOps, NotificationPublisher, PublishResult, SnsOpsError, TopicSubscriptionOps,
};
pub use subscription_store::{DynamoSubscriptionStore, SubscriptionStore, SubscriptionStoreError};
