/// 過去24時間のIssue集計
///
/// Overviewページに表示するステータス別件数と直近3時間の件数を計算する。
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// 日付パーティションの書式（`createdDateUtc`属性）
const DATE_PARTITION_FORMAT: &str = "%Y-%m-%d";

/// Issueのステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueStatus {
    Open,
    Acknowledged,
    Closed,
}

impl IssueStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(IssueStatus::Open),
            "acknowledged" => Some(IssueStatus::Acknowledged),
            "closed" => Some(IssueStatus::Closed),
            _ => None,
        }
    }
}

/// 集計に必要なIssueの属性
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRecord {
    #[serde(default)]
    pub status: Option<String>,
    /// ISO 8601形式の作成日時
    #[serde(default)]
    pub created_at: Option<String>,
}

/// `getPrevDayIssuesStats`クエリの結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueStats {
    pub open: u64,
    pub acknowledged: u64,
    pub closed: u64,
    pub last_three_hours: u64,
}

impl IssueStats {
    /// Issueを1件集計に加える
    ///
    /// `last_three_hours`はステータスに関係なく作成日時だけで判定する。
    /// 作成日時はISO 8601文字列のまま辞書順で比較する。
    pub fn record(&mut self, issue: &IssueRecord, recent_threshold: &str) {
        match issue.status.as_deref().and_then(IssueStatus::parse) {
            Some(IssueStatus::Open) => self.open += 1,
            Some(IssueStatus::Acknowledged) => self.acknowledged += 1,
            Some(IssueStatus::Closed) => self.closed += 1,
            None => {}
        }

        if issue
            .created_at
            .as_deref()
            .is_some_and(|created_at| created_at >= recent_threshold)
        {
            self.last_three_hours += 1;
        }
    }
}

/// 集計対象の時間ウィンドウ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsWindow {
    now: DateTime<Utc>,
}

impl StatsWindow {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    /// クエリ対象の日付パーティション（前日、当日の順）
    pub fn date_partitions(&self) -> [String; 2] {
        [
            self.since().format(DATE_PARTITION_FORMAT).to_string(),
            self.now.format(DATE_PARTITION_FORMAT).to_string(),
        ]
    }

    /// `createdAt`の下限（24時間前）
    pub fn created_since(&self) -> String {
        to_iso_string(self.since())
    }

    /// 直近3時間の判定に使う下限
    pub fn recent_threshold(&self) -> String {
        to_iso_string(self.now - Duration::hours(3))
    }

    fn since(&self) -> DateTime<Utc> {
        self.now - Duration::hours(24)
    }
}

/// `2024-01-02T03:04:05.678Z`形式に変換する
fn to_iso_string(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
