/// 通知トピックのサブスクリプションとフィルターポリシー
///
/// 1つの通知エンドポイントとSNSトピックの関係を表す。
/// フィルターポリシーには常にセンチネル`placeholder-event-id`が含まれる。
/// SNSは空配列のフィルターポリシーを受け付けないため、どのイベントにも
/// 紐付かなくなったエンドポイントでもポリシーを維持できるようにする。
use serde::{Deserialize, Serialize};

use super::{EndpointRequest, SubscriptionProtocol};

/// フィルターポリシーに常に含まれるセンチネルのイベントID
pub const PLACEHOLDER_EVENT_ID: &str = "placeholder-event-id";

/// SNSサブスクリプションのフィルターポリシー
///
/// SNSに渡すJSONは`{"eventId":["placeholder-event-id", ...]}`の形になる。
/// 要素の順序は挿入順を保持する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPolicy {
    #[serde(rename = "eventId", default)]
    event_ids: Vec<String>,
}

impl FilterPolicy {
    /// 新規サブスクリプション用のポリシーを作成（センチネル + イベントID）
    pub fn for_event(event_id: &str) -> Self {
        let mut policy = Self::default();
        policy.insert(event_id);
        policy
    }

    /// 保存済みのイベントID配列からポリシーを復元する（内容はそのまま）
    pub fn from_event_ids(event_ids: Vec<String>) -> Self {
        Self { event_ids }
    }

    pub fn event_ids(&self) -> &[String] {
        &self.event_ids
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.event_ids.iter().any(|id| id == event_id)
    }

    /// イベントIDを末尾に追加する
    ///
    /// センチネルが欠けていれば先頭に補う。既に含まれている場合は何もしない。
    ///
    /// # 戻り値
    /// ポリシーが変更された場合は`true`
    pub fn insert(&mut self, event_id: &str) -> bool {
        let mut changed = self.ensure_placeholder();
        if !self.contains(event_id) {
            self.event_ids.push(event_id.to_string());
            changed = true;
        }
        changed
    }

    /// イベントIDの最初の出現を取り除く
    ///
    /// センチネルは取り除かない。センチネルが欠けていれば先頭に補う。
    ///
    /// # 戻り値
    /// イベントIDを取り除いた場合は`true`
    pub fn remove(&mut self, event_id: &str) -> bool {
        self.ensure_placeholder();
        if event_id == PLACEHOLDER_EVENT_ID {
            return false;
        }

        match self.event_ids.iter().position(|id| id == event_id) {
            Some(index) => {
                self.event_ids.remove(index);
                true
            }
            None => false,
        }
    }

    /// SNSの`FilterPolicy`属性値としてシリアライズする
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    fn ensure_placeholder(&mut self) -> bool {
        if self.contains(PLACEHOLDER_EVENT_ID) {
            return false;
        }
        self.event_ids.insert(0, PLACEHOLDER_EVENT_ID.to_string());
        true
    }
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            event_ids: vec![PLACEHOLDER_EVENT_ID.to_string()],
        }
    }
}

/// 通知エンドポイントのトピックサブスクリプション
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSubscription {
    /// メールアドレスまたは電話番号（ストアの主キー）
    pub endpoint: String,
    /// サブスクリプションプロトコル
    pub protocol: SubscriptionProtocol,
    /// SNSサブスクリプションARN（作成前はNone）
    pub subscription_arn: Option<String>,
    /// フィルターポリシー（古いレコードでは欠落していることがある）
    pub filter_policy: Option<FilterPolicy>,
}

impl TopicSubscription {
    /// まだSNSに作成されていない新規サブスクリプションを組み立てる
    pub fn for_new_event(request: &EndpointRequest, event_id: &str) -> Self {
        Self {
            endpoint: request.endpoint.clone(),
            protocol: request.protocol,
            subscription_arn: None,
            filter_policy: Some(FilterPolicy::for_event(event_id)),
        }
    }

    /// 空白でないサブスクリプションARNを持っているか
    pub fn has_subscription_arn(&self) -> bool {
        self.subscription_arn
            .as_deref()
            .is_some_and(|arn| !arn.trim().is_empty())
    }

    /// フィルターポリシーがイベントIDを含むか
    pub fn is_subscribed_to(&self, event_id: &str) -> bool {
        self.filter_policy
            .as_ref()
            .is_some_and(|policy| policy.contains(event_id))
    }
}
