/// 通知エンドポイントのパーサー
///
/// イベントの`email`/`sms`フィールド（カンマ区切り文字列）を
/// プロトコル付きのエンドポイント要求リストに変換する。
use super::SubscriptionProtocol;

/// プロトコル付きの通知エンドポイント
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRequest {
    /// サブスクリプションプロトコル
    pub protocol: SubscriptionProtocol,
    /// メールアドレスまたは電話番号
    pub endpoint: String,
}

impl EndpointRequest {
    pub fn new(protocol: SubscriptionProtocol, endpoint: impl Into<String>) -> Self {
        Self {
            protocol,
            endpoint: endpoint.into(),
        }
    }

    pub fn email(endpoint: impl Into<String>) -> Self {
        Self::new(SubscriptionProtocol::Email, endpoint)
    }

    pub fn sms(endpoint: impl Into<String>) -> Self {
        Self::new(SubscriptionProtocol::Sms, endpoint)
    }
}

/// カンマ区切りのエンドポイント文字列パーサー
pub struct EndpointParser;

impl EndpointParser {
    /// カンマ区切り文字列をエンドポイント要求リストに変換する
    ///
    /// 各要素は前後の空白を除去し、空要素は捨てる。
    /// 重複は除去しない（出現順をそのまま保持する）。
    pub fn parse(csv: Option<&str>, protocol: SubscriptionProtocol) -> Vec<EndpointRequest> {
        let Some(csv) = csv else {
            return Vec::new();
        };

        csv.split(',')
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
            .map(|endpoint| EndpointRequest::new(protocol, endpoint))
            .collect()
    }

    /// メール、SMSの順でイベントの全エンドポイントを取得する
    pub fn parse_all(email_csv: Option<&str>, sms_csv: Option<&str>) -> Vec<EndpointRequest> {
        let mut endpoints = Self::parse(email_csv, SubscriptionProtocol::Email);
        endpoints.extend(Self::parse(sms_csv, SubscriptionProtocol::Sms));
        endpoints
    }
}
