/// AppSync Lambdaリゾルバーのリクエスト検証とルーティング
///
/// パイプラインリゾルバーから渡されるリクエストを検証し、
/// 実行すべき操作（イベントのミューテーション後処理、または集計クエリ）に変換する。
/// 検証はI/Oの前にすべて完了させる。
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// リクエスト検証のエラー型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestValidationError {
    /// イベントがnull
    #[error("Invalid handler input")]
    NullEvent,

    /// リクエストの形式が不正
    #[error("Invalid handler input: {0}")]
    InvalidPayload(String),

    /// infoフィールドが欠落
    #[error("Missing resolver info in request")]
    MissingInfo,

    /// サポート外の親型名
    #[error("Unsupported parent type name: {0}")]
    UnsupportedParentType(String),

    /// 前段のパイプライン関数の結果が欠落
    #[error("Unable to retrieve new Event details")]
    MissingPreviousResult,

    /// 前段の結果にイベントIDが無い
    #[error("Event ID from previous AppSync function was not present")]
    MissingEventId,

    /// サポート外のフィールド名
    #[error("Unsupported {parent_type} field name: {field_name}")]
    UnsupportedFieldName {
        parent_type: String,
        field_name: String,
    },
}

/// AppSyncから渡されるリゾルバーリクエスト
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSyncResolverRequest {
    #[serde(default)]
    pub arguments: Option<ResolverArguments>,
    #[serde(default)]
    pub prev: Option<PreviousResult>,
    #[serde(default)]
    pub info: Option<ResolverInfo>,
}

/// ミューテーション引数（更新前のエンドポイント）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverArguments {
    #[serde(default)]
    pub previous_email: Option<String>,
    #[serde(default)]
    pub previous_sms: Option<String>,
}

/// 前段のパイプライン関数の結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviousResult {
    #[serde(default)]
    pub result: Option<Value>,
}

/// ルーティング情報
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverInfo {
    #[serde(default)]
    pub parent_type_name: String,
    #[serde(default)]
    pub field_name: String,
}

/// イベントに対するミューテーションの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventMutation {
    Create,
    Update,
    Delete,
}

impl EventMutation {
    pub fn parse(field_name: &str) -> Option<Self> {
        match field_name {
            "createEvent" => Some(EventMutation::Create),
            "updateEvent" => Some(EventMutation::Update),
            "deleteEvent" => Some(EventMutation::Delete),
            _ => None,
        }
    }

    pub fn field_name(&self) -> &'static str {
        match self {
            EventMutation::Create => "createEvent",
            EventMutation::Update => "updateEvent",
            EventMutation::Delete => "deleteEvent",
        }
    }
}

/// 検証済みのリゾルバー操作
#[derive(Debug, Clone, PartialEq)]
pub enum ResolverOperation {
    /// イベントのミューテーション後にサブスクリプションを整合させる
    EventMutation {
        mutation: EventMutation,
        event_id: String,
        email: Option<String>,
        sms: Option<String>,
        previous_email: Option<String>,
        previous_sms: Option<String>,
        /// 前段の結果（そのまま呼び出し元に返す）
        result: Value,
    },
    /// 過去24時間のIssue集計
    GetPrevDayIssuesStats,
}

const MUTATION: &str = "Mutation";
const QUERY: &str = "Query";
const GET_PREV_DAY_ISSUES_STATS: &str = "getPrevDayIssuesStats";

impl AppSyncResolverRequest {
    /// Lambdaペイロードからリクエストを読み込む
    pub fn from_value(payload: Value) -> Result<Self, RequestValidationError> {
        if payload.is_null() {
            return Err(RequestValidationError::NullEvent);
        }

        serde_json::from_value(payload)
            .map_err(|e| RequestValidationError::InvalidPayload(e.to_string()))
    }

    /// リクエストを検証して実行する操作に変換する
    ///
    /// 検証順: 親型名 → (Mutation) 前段結果 → イベントID → フィールド名
    pub fn into_operation(self) -> Result<ResolverOperation, RequestValidationError> {
        let info = self.info.ok_or(RequestValidationError::MissingInfo)?;

        match info.parent_type_name.as_str() {
            MUTATION => {
                let result = self
                    .prev
                    .and_then(|prev| prev.result)
                    .filter(|result| !result.is_null())
                    .ok_or(RequestValidationError::MissingPreviousResult)?;

                let event_id = string_field(&result, "id")
                    .filter(|id| !id.is_empty())
                    .ok_or(RequestValidationError::MissingEventId)?;

                let mutation = EventMutation::parse(&info.field_name).ok_or_else(|| {
                    RequestValidationError::UnsupportedFieldName {
                        parent_type: info.parent_type_name.clone(),
                        field_name: info.field_name.clone(),
                    }
                })?;

                let arguments = self.arguments.unwrap_or_default();

                Ok(ResolverOperation::EventMutation {
                    mutation,
                    event_id,
                    email: string_field(&result, "email"),
                    sms: string_field(&result, "sms"),
                    previous_email: arguments.previous_email,
                    previous_sms: arguments.previous_sms,
                    result,
                })
            }
            QUERY => match info.field_name.as_str() {
                GET_PREV_DAY_ISSUES_STATS => Ok(ResolverOperation::GetPrevDayIssuesStats),
                other => Err(RequestValidationError::UnsupportedFieldName {
                    parent_type: info.parent_type_name.clone(),
                    field_name: other.to_string(),
                }),
            },
            other => Err(RequestValidationError::UnsupportedParentType(
                other.to_string(),
            )),
        }
    }
}

/// JSONオブジェクトから文字列フィールドを取り出す（文字列以外はNone）
fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mutation_payload(field_name: &str) -> Value {
        json!({
            "arguments": { "previousEmail": "b@x.com", "previousSms": "" },
            "identity": {},
            "request": {},
            "info": { "parentTypeName": "Mutation", "fieldName": field_name },
            "prev": {
                "result": {
                    "id": "event-id",
                    "email": "email+1@example.com, email+2@example.com",
                    "sms": "+1, +2",
                    "name": "Event"
                }
            }
        })
    }

    fn parse(payload: Value) -> Result<ResolverOperation, RequestValidationError> {
        AppSyncResolverRequest::from_value(payload)?.into_operation()
    }

    // ==================== 正常系 ====================

    #[test]
    fn test_create_event_operation() {
        let operation = parse(mutation_payload("createEvent")).unwrap();

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
                assert_eq!(mutation, EventMutation::Create);
                assert_eq!(event_id, "event-id");
                assert_eq!(email.as_deref(), Some("email+1@example.com, email+2@example.com"));
                assert_eq!(sms.as_deref(), Some("+1, +2"));
                assert_eq!(previous_email.as_deref(), Some("b@x.com"));
                assert_eq!(previous_sms.as_deref(), Some(""));
                assert_eq!(result["name"], "Event");
            }
            other => panic!("unexpected operation: {:?}", other),
        }
    }

    #[test]
    fn test_update_and_delete_event_operations() {
        for (field, expected) in [
            ("updateEvent", EventMutation::Update),
            ("deleteEvent", EventMutation::Delete),
        ] {
            match parse(mutation_payload(field)).unwrap() {
                ResolverOperation::EventMutation { mutation, .. } => {
                    assert_eq!(mutation, expected)
                }
                other => panic!("unexpected operation: {:?}", other),
            }
        }
    }

    #[test]
    fn test_mutation_without_arguments() {
        let mut payload = mutation_payload("deleteEvent");
        payload.as_object_mut().unwrap().remove("arguments");

        match parse(payload).unwrap() {
            ResolverOperation::EventMutation {
                previous_email,
                previous_sms,
                ..
            } => {
                assert!(previous_email.is_none());
                assert!(previous_sms.is_none());
            }
            other => panic!("unexpected operation: {:?}", other),
        }
    }

    #[test]
    fn test_non_string_endpoints_are_ignored() {
        let mut payload = mutation_payload("createEvent");
        payload["prev"]["result"]["email"] = Value::Null;
        payload["prev"]["result"]["sms"] = json!(12);

        match parse(payload).unwrap() {
            ResolverOperation::EventMutation { email, sms, .. } => {
                assert!(email.is_none());
                assert!(sms.is_none());
            }
            other => panic!("unexpected operation: {:?}", other),
        }
    }

    #[test]
    fn test_query_operation() {
        let payload = json!({
            "info": { "parentTypeName": "Query", "fieldName": "getPrevDayIssuesStats" }
        });
        assert_eq!(parse(payload).unwrap(), ResolverOperation::GetPrevDayIssuesStats);
    }

    // ==================== 検証エラー ====================

    #[test]
    fn test_null_event() {
        assert_eq!(parse(Value::Null), Err(RequestValidationError::NullEvent));
    }

    #[test]
    fn test_invalid_payload() {
        let result = parse(json!("not an object"));
        assert!(matches!(result, Err(RequestValidationError::InvalidPayload(_))));
    }

    #[test]
    fn test_missing_info() {
        assert_eq!(
            parse(json!({ "arguments": {} })),
            Err(RequestValidationError::MissingInfo)
        );
    }

    #[test]
    fn test_unsupported_parent_type() {
        let payload = json!({
            "info": { "parentTypeName": "Subscription", "fieldName": "onCreateEvent" }
        });
        let error = parse(payload).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Unsupported parent type name: Subscription"
        );
    }

    #[test]
    fn test_missing_previous_result() {
        let mut payload = mutation_payload("createEvent");
        payload.as_object_mut().unwrap().remove("prev");
        assert_eq!(parse(payload), Err(RequestValidationError::MissingPreviousResult));

        let mut payload = mutation_payload("createEvent");
        payload["prev"]["result"] = Value::Null;
        assert_eq!(parse(payload), Err(RequestValidationError::MissingPreviousResult));
    }

    #[test]
    fn test_missing_event_id() {
        let mut payload = mutation_payload("createEvent");
        payload["prev"]["result"].as_object_mut().unwrap().remove("id");
        assert_eq!(parse(payload), Err(RequestValidationError::MissingEventId));

        let mut payload = mutation_payload("createEvent");
        payload["prev"]["result"]["id"] = json!("");
        assert_eq!(parse(payload), Err(RequestValidationError::MissingEventId));
    }

    #[test]
    fn test_previous_result_checked_before_field_name() {
        let mut payload = mutation_payload("createSite");
        payload.as_object_mut().unwrap().remove("prev");
        assert_eq!(parse(payload), Err(RequestValidationError::MissingPreviousResult));
    }

    #[test]
    fn test_unsupported_mutation_field_name() {
        let error = parse(mutation_payload("createSite")).unwrap_err();
        assert_eq!(error.to_string(), "Unsupported Mutation field name: createSite");
    }

    #[test]
    fn test_unsupported_query_field_name() {
        let payload = json!({
            "info": { "parentTypeName": "Query", "fieldName": "listEvents" }
        });
        let error = parse(payload).unwrap_err();
        assert_eq!(error.to_string(), "Unsupported Query field name: listEvents");
    }

    #[test]
    fn test_event_mutation_field_names() {
        for mutation in [EventMutation::Create, EventMutation::Update, EventMutation::Delete] {
            assert_eq!(EventMutation::parse(mutation.field_name()), Some(mutation));
        }
    }
}
