/// SNS subscription protocol for issue notifications
///
/// Only the two protocols the console lets operators configure are supported.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionProtocol {
    /// Email address endpoint
    Email,

    /// Phone number endpoint (SMS)
    Sms,
}

impl SubscriptionProtocol {
    /// Protocol name as accepted by the SNS Subscribe API
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionProtocol::Email => "email",
            SubscriptionProtocol::Sms => "sms",
        }
    }
}

impl std::fmt::Display for SubscriptionProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
