//! Messages exchanged with processes and the analytics command table

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::error::CommandError;
use crate::models::Month;

pub const INCREMENT_VISITOR: &str = "Analytics.IncrementVisitor";
pub const GET_ALL_COUNTS: &str = "Analytics.GetAllCounts";
pub const VISITOR_INCREMENTED: &str = "Analytics.VisitorIncremented";
pub const ALL_COUNTS: &str = "Analytics.AllCounts";
pub const ANALYTICS_ERROR: &str = "Analytics.Error";

pub const MONTH_TAG: &str = "Month";
pub const PAGE_TAG: &str = "Page";

/// Opaque process identifier: 32 random bytes, URL-safe base64 without padding
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(String);

impl ProcessId {
    pub fn generate() -> Self {
        let bytes: [u8; 32] = rand::random();
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<String> for ProcessId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ProcessId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Message delivered to a process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Message {
    #[serde(default)]
    pub from: String,
    pub action: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl Message {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    pub fn from_sender(mut self, from: impl Into<String>) -> Self {
        self.from = from.into();
        self
    }

    /// Record `sender` as the sender unless one is already set
    pub fn or_sender(mut self, sender: Option<&str>) -> Self {
        if self.from.is_empty() {
            if let Some(sender) = sender {
                self.from = sender.to_string();
            }
        }
        self
    }

    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(name.into(), value.into());
        self
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Tag value, treating empty strings as absent
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Visit report for `month` on `page`
    pub fn increment_visitor(month: Month, page: &str) -> Self {
        Self::new(INCREMENT_VISITOR)
            .with_tag(MONTH_TAG, month.as_str())
            .with_tag(PAGE_TAG, page)
    }

    /// Read-only aggregate query
    pub fn get_all_counts() -> Self {
        Self::new(GET_ALL_COUNTS).with_data(GET_ALL_COUNTS)
    }
}

/// Message a process sends back while handling a delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OutboundMessage {
    pub target: String,
    pub action: String,
    pub data: String,
}

/// Everything a process produced for one delivered message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeliveryResult {
    #[serde(default)]
    pub messages: Vec<OutboundMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl DeliveryResult {
    pub fn reply(target: &str, action: &str, data: impl Into<String>) -> Self {
        Self {
            messages: vec![OutboundMessage {
                target: target.to_string(),
                action: action.to_string(),
                data: data.into(),
            }],
            output: None,
        }
    }
}

/// Commands understood by the analytics handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    IncrementVisitor { month: Month, page: String },
    GetAllCounts,
}

impl Command {
    /// Look up the handler for the message's action.
    ///
    /// `None` means no handler matches; `Some(Err(_))` is a matched action
    /// with invalid fields.
    pub fn parse(message: &Message) -> Option<Result<Self, CommandError>> {
        match message.action.as_str() {
            INCREMENT_VISITOR => Some(Self::parse_increment(message)),
            GET_ALL_COUNTS => Some(Ok(Command::GetAllCounts)),
            _ => None,
        }
    }

    fn parse_increment(message: &Message) -> Result<Self, CommandError> {
        let (Some(month), Some(page)) = (message.tag(MONTH_TAG), message.tag(PAGE_TAG)) else {
            return Err(CommandError::MissingFields);
        };

        let month = month
            .parse::<Month>()
            .map_err(|_| CommandError::UnknownMonth(month.to_string()))?;

        Ok(Command::IncrementVisitor {
            month,
            page: page.to_string(),
        })
    }

    /// Whether handling the command leaves stored state unchanged
    pub fn is_read_only(&self) -> bool {
        matches!(self, Command::GetAllCounts)
    }

    pub fn action(&self) -> &'static str {
        match self {
            Command::IncrementVisitor { .. } => INCREMENT_VISITOR,
            Command::GetAllCounts => GET_ALL_COUNTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_id_shape() {
        let id = ProcessId::generate();
        assert_eq!(id.as_str().len(), 43);
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(id, ProcessId::generate());
    }

    #[test]
    fn test_or_sender_keeps_explicit_sender() {
        let unsigned = Message::get_all_counts().or_sender(Some("client-42"));
        assert_eq!(unsigned.from, "client-42");

        let signed = Message::get_all_counts()
            .from_sender("site")
            .or_sender(Some("client-42"));
        assert_eq!(signed.from, "site");

        assert_eq!(Message::get_all_counts().or_sender(None).from, "");
    }

    #[test]
    fn test_parse_increment() {
        let message = Message::new(INCREMENT_VISITOR)
            .with_tag("Month", "july")
            .with_tag("Page", "/docs");

        assert_eq!(
            Command::parse(&message),
            Some(Ok(Command::IncrementVisitor {
                month: Month::July,
                page: "/docs".to_string()
            }))
        );
    }

    #[test]
    fn test_parse_increment_missing_fields() {
        let no_page = Message::new(INCREMENT_VISITOR).with_tag("Month", "July");
        let empty_month = Message::new(INCREMENT_VISITOR)
            .with_tag("Month", "")
            .with_tag("Page", "/");

        assert_eq!(
            Command::parse(&no_page),
            Some(Err(CommandError::MissingFields))
        );
        assert_eq!(
            Command::parse(&empty_month),
            Some(Err(CommandError::MissingFields))
        );
        assert_eq!(
            CommandError::MissingFields.to_string(),
            "Month and Page are required"
        );
    }

    #[test]
    fn test_parse_unknown_month() {
        let message = Message::new(INCREMENT_VISITOR)
            .with_tag("Month", "Brumaire")
            .with_tag("Page", "/");

        assert_eq!(
            Command::parse(&message),
            Some(Err(CommandError::UnknownMonth("Brumaire".to_string())))
        );
    }

    #[test]
    fn test_unmatched_action() {
        assert_eq!(Command::parse(&Message::new("Balance")), None);
        assert!(Command::GetAllCounts.is_read_only());
    }

    #[test]
    fn test_message_wire_format() {
        let message = Message::increment_visitor(Month::May, "/").from_sender("site-owner");
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["Action"], INCREMENT_VISITOR);
        assert_eq!(json["From"], "site-owner");
        assert_eq!(json["Tags"]["Month"], "May");
        assert!(json.get("Data").is_none());
    }
}
