/// Issue発生通知
///
/// デバイスで発生したIssueを通知トピックに流すためのメッセージを組み立てる。
/// 通知は`eventId`メッセージ属性でフィルタリングされ、
/// そのイベントを購読しているエンドポイントにだけ届く。
use serde::{Deserialize, Serialize};

/// Issue通知ハンドラーの入力
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueNotification {
    #[serde(default)]
    pub id: String,
    pub event_id: String,
    #[serde(default)]
    pub event_description: String,
    #[serde(default)]
    pub full_event_description: Option<String>,
    #[serde(default)]
    pub device_name: String,
    #[serde(default)]
    pub site_name: String,
    #[serde(default)]
    pub area_name: String,
    #[serde(default)]
    pub process_name: String,
    #[serde(default)]
    pub station_name: String,
    #[serde(default)]
    pub status: String,
}

impl IssueNotification {
    /// 新規発生（open）のIssueか
    pub fn is_open(&self) -> bool {
        self.status == "open"
    }

    /// SNSメッセージ本文
    pub fn message(&self) -> String {
        let description = self
            .full_event_description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(&self.event_description);

        [
            "The following Issue has been raised:".to_string(),
            format!("Event: {}", description),
            format!("Device: {}", self.device_name),
            String::new(),
            "Additional Details".to_string(),
            "-----".to_string(),
            format!("Site: {}", self.site_name),
            format!("Area: {}", self.area_name),
            format!("Process: {}", self.process_name),
            format!("Station: {}", self.station_name),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> IssueNotification {
        serde_json::from_value(json!({
            "id": "issue-1",
            "eventId": "event-1",
            "eventDescription": "Material shortage",
            "deviceName": "press-01",
            "siteName": "Site A",
            "areaName": "Area 1",
            "processName": "Stamping",
            "stationName": "Station 3",
            "status": "open",
            "priority": "high",
            "createdBy": "operator"
        }))
        .unwrap()
    }

    #[test]
    fn test_deserialize_ignores_unknown_fields() {
        let notification = sample();
        assert_eq!(notification.event_id, "event-1");
        assert!(notification.full_event_description.is_none());
    }

    #[test]
    fn test_is_open() {
        let mut notification = sample();
        assert!(notification.is_open());

        notification.status = "acknowledged".to_string();
        assert!(!notification.is_open());
    }

    #[test]
    fn test_message_format() {
        let expected = "The following Issue has been raised:\n\
                        Event: Material shortage\n\
                        Device: press-01\n\
                        \n\
                        Additional Details\n\
                        -----\n\
                        Site: Site A\n\
                        Area: Area 1\n\
                        Process: Stamping\n\
                        Station: Station 3";
        assert_eq!(sample().message(), expected);
    }

    #[test]
    fn test_message_prefers_full_description() {
        let mut notification = sample();
        notification.full_event_description = Some("Material shortage > Steel".to_string());

        assert!(notification
            .message()
            .contains("Event: Material shortage > Steel"));
    }

    #[test]
    fn test_message_ignores_empty_full_description() {
        let mut notification = sample();
        notification.full_event_description = Some(String::new());

        assert!(notification.message().contains("Event: Material shortage\n"));
    }
}
