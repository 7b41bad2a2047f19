/// 過去24時間のIssue集計ハンドラー
///
/// `getPrevDayIssuesStats`クエリの処理。前日と当日の日付パーティションを
/// 作成日インデックスでクエリし、全ページを集計する。
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{IssueStats, StatsWindow};
use crate::infrastructure::{IssueRepository, IssueRepositoryError};

/// 集計処理のエラー型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IssueStatsError {
    /// リポジトリ操作エラー
    #[error("Repository error: {0}")]
    Repository(String),
}

impl From<IssueRepositoryError> for IssueStatsError {
    fn from(err: IssueRepositoryError) -> Self {
        IssueStatsError::Repository(err.to_string())
    }
}

/// Issue集計ハンドラー
pub struct IssueStatsHandler<R>
where
    R: IssueRepository,
{
    issue_repo: R,
}

impl<R> IssueStatsHandler<R>
where
    R: IssueRepository,
{
    pub fn new(issue_repo: R) -> Self {
        Self { issue_repo }
    }

    /// 過去24時間のIssueをステータス別に集計する
    ///
    /// パーティションは前日、当日の順にクエリし、各パーティションは
    /// 継続キーが無くなるまでページを辿る。
    pub async fn get_prev_day_issues_stats(
        &self,
        window: StatsWindow,
    ) -> Result<IssueStats, IssueStatsError> {
        let created_since = window.created_since();
        let recent_threshold = window.recent_threshold();
        let mut stats = IssueStats::default();

        for partition in window.date_partitions() {
            let mut start_key = None;
            let mut page_count = 0;

            loop {
                let page = self
                    .issue_repo
                    .query_created_since(&partition, &created_since, start_key)
                    .await?;
                page_count += 1;

                debug!(
                    date_partition = %partition,
                    page = page_count,
                    issues = page.issues.len(),
                    "Issueページ取得"
                );

                for issue in &page.issues {
                    stats.record(issue, &recent_threshold);
                }

                match page.next_key {
                    Some(key) => start_key = Some(key),
                    None => break,
                }
            }
        }

        info!(
            open = stats.open,
            acknowledged = stats.acknowledged,
            closed = stats.closed,
            last_three_hours = stats.last_three_hours,
            "過去24時間のIssue集計完了"
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IssueRecord;
    use crate::infrastructure::issue_repository::tests::MockIssueRepository;
    use crate::infrastructure::logging::init_test_logging;
    use chrono::{TimeZone, Utc};

    fn window() -> StatsWindow {
        StatsWindow::new(Utc.with_ymd_and_hms(2024, 3, 10, 1, 30, 0).unwrap())
    }

    fn issue(status: &str, created_at: &str) -> IssueRecord {
        IssueRecord {
            status: Some(status.to_string()),
            created_at: Some(created_at.to_string()),
        }
    }

    fn create_handler() -> (IssueStatsHandler<MockIssueRepository>, MockIssueRepository) {
        init_test_logging();
        let repo = MockIssueRepository::new();
        (IssueStatsHandler::new(repo.clone()), repo)
    }

    #[tokio::test]
    async fn test_counts_by_status() {
        let (handler, repo) = create_handler();
        repo.push_page(
            "2024-03-10",
            vec![
                issue("open", "2024-03-10T00:00:00.000Z"),
                issue("open", "2024-03-10T01:00:00.000Z"),
                issue("closed", "2024-03-10T01:10:00.000Z"),
            ],
            false,
        );

        let stats = handler.get_prev_day_issues_stats(window()).await.unwrap();

        assert_eq!(
            stats,
            IssueStats {
                open: 2,
                acknowledged: 0,
                closed: 1,
                last_three_hours: 3,
            }
        );
    }

    #[tokio::test]
    async fn test_queries_both_partitions_in_order() {
        let (handler, repo) = create_handler();

        handler.get_prev_day_issues_stats(window()).await.unwrap();

        let calls = repo.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].date_partition, "2024-03-09");
        assert_eq!(calls[1].date_partition, "2024-03-10");
        for call in &calls {
            assert_eq!(call.created_since, "2024-03-09T01:30:00.000Z");
            assert!(call.start_key.is_none());
        }
    }

    #[tokio::test]
    async fn test_follows_pagination() {
        let (handler, repo) = create_handler();
        repo.push_page(
            "2024-03-09",
            vec![issue("acknowledged", "2024-03-09T02:00:00.000Z")],
            true,
        );
        repo.push_page(
            "2024-03-09",
            vec![issue("closed", "2024-03-09T23:00:00.000Z")],
            false,
        );
        repo.push_page(
            "2024-03-10",
            vec![issue("open", "2024-03-09T23:59:59.999Z")],
            true,
        );
        repo.push_page(
            "2024-03-10",
            vec![issue("open", "2024-03-10T01:00:00.000Z")],
            false,
        );

        let stats = handler.get_prev_day_issues_stats(window()).await.unwrap();

        assert_eq!(stats.open, 2);
        assert_eq!(stats.acknowledged, 1);
        assert_eq!(stats.closed, 1);
        // 直近3時間の下限は 2024-03-09T22:30:00.000Z
        assert_eq!(stats.last_three_hours, 3);

        let calls = repo.calls();
        assert_eq!(calls.len(), 4);
        assert!(calls[1].start_key.is_some());
        assert!(calls[2].start_key.is_none());
        assert!(calls[3].start_key.is_some());
    }

    #[tokio::test]
    async fn test_unknown_status_counts_only_recent() {
        let (handler, repo) = create_handler();
        repo.push_page(
            "2024-03-10",
            vec![issue("resolved", "2024-03-10T01:00:00.000Z")],
            false,
        );

        let stats = handler.get_prev_day_issues_stats(window()).await.unwrap();

        assert_eq!(stats.open + stats.acknowledged + stats.closed, 0);
        assert_eq!(stats.last_three_hours, 1);
    }

    #[tokio::test]
    async fn test_empty_window() {
        let (handler, _) = create_handler();

        let stats = handler.get_prev_day_issues_stats(window()).await.unwrap();

        assert_eq!(stats, IssueStats::default());
    }

    #[tokio::test]
    async fn test_repository_error_propagates() {
        let (handler, repo) = create_handler();
        repo.set_next_error(IssueRepositoryError::ReadError("throttled".to_string()));

        let result = handler.get_prev_day_issues_stats(window()).await;

        assert_eq!(
            result,
            Err(IssueStatsError::Repository("Read error: throttled".to_string()))
        );
        assert_eq!(repo.calls().len(), 1);
    }
}
