use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::calendar::NormalizedEvent;
use crate::models::ResourceState;

// ============================================================================
// Common Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

// ============================================================================
// Calendar Notification Types
// ============================================================================

/// Metadata of a calendar push notification, taken from its headers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarNotification {
    pub channel_id: String,
    pub resource_id: String,
    pub resource_state: String,
    pub message_number: i64,
    pub changed_fields: Vec<String>,
}

impl CalendarNotification {
    pub fn new(
        channel_id: &str,
        resource_id: &str,
        state: &ResourceState,
        message_number: &str,
        changed: &str,
    ) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            resource_id: resource_id.to_string(),
            resource_state: state.as_str().to_string(),
            message_number: message_number.trim().parse().unwrap_or(0),
            changed_fields: changed
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

/// Body POSTed to the downstream processing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub resource: CalendarNotification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<NormalizedEvent>>,
    pub timestamp: DateTime<Utc>,
}

impl ForwardPayload {
    pub fn calendar(resource: CalendarNotification, events: Option<Vec<NormalizedEvent>>) -> Self {
        Self {
            kind: "calendar_notification".to_string(),
            resource,
            events,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ForwardResponse {
    pub message: String,
    pub result: serde_json::Value,
}

// ============================================================================
// Event Fetcher Types
// ============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchEventsRequest {
    pub resource_id: Option<String>,
    pub calendar_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchEventsResponse {
    pub resource_id: String,
    pub calendar_id: String,
    pub events: Vec<NormalizedEvent>,
}

// ============================================================================
// Contact View Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactsQuery {
    pub contact: Option<String>,
    pub action: Option<String>,
    pub source: Option<String>,
    pub record_id: Option<String>,
    pub records: Option<String>,
    pub format: Option<String>,
    pub meetings: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmSearchQuery {
    pub record_id: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncResponse {
    pub message: String,
    pub updated: usize,
}

// ============================================================================
// Ingestion Types
// ============================================================================

/// Email event as delivered by the Zapier Gmail trigger
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct GmailEvent {
    #[validate(email)]
    pub from_email: String,

    #[validate(length(min = 1))]
    pub date: String,

    pub direction: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GmailIngestResponse {
    pub success: bool,
    pub action: String,
}

/// TimelinesAI webhook, either single-message or aggregated
#[derive(Debug, Serialize, Deserialize)]
pub struct WhatsAppEvent {
    pub chat: WhatsAppChat,
    pub message: Option<WhatsAppMessage>,
    pub messages: Option<Vec<WhatsAppMessage>>,
}

impl WhatsAppEvent {
    /// Messages carried by the webhook, or `None` when it has neither shape.
    pub fn into_messages(self) -> Option<Vec<WhatsAppMessage>> {
        match (self.messages, self.message) {
            (Some(messages), _) => Some(messages),
            (None, Some(message)) => Some(vec![message]),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WhatsAppChat {
    pub phone: Option<String>,
    #[serde(default)]
    pub is_group: bool,
}

/// Message time as sent by the aggregator: a date string or a Unix epoch.
/// Anything else is kept so one odd message cannot reject the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageTimestamp {
    Epoch(i64),
    Text(String),
    Other(serde_json::Value),
}

impl MessageTimestamp {
    /// Textual form for date parsing; `None` for unrecognized shapes.
    pub fn as_text(&self) -> Option<String> {
        match self {
            MessageTimestamp::Epoch(n) => Some(n.to_string()),
            MessageTimestamp::Text(s) => Some(s.clone()),
            MessageTimestamp::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WhatsAppMessage {
    pub timestamp: Option<MessageTimestamp>,
    pub direction: Option<String>,
    pub text: Option<String>,
    pub message_id: Option<String>,
    /// Sender number when it differs from the chat's number
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WhatsAppIngestResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub processed: usize,
    pub skipped: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LastContactEvent {
    pub from: String,
    #[serde(default)]
    pub to: Vec<String>,
}

// ============================================================================
// Watch Renewal Types
// ============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarWatchRequest {
    pub previous_channel_id: Option<String>,
    pub previous_resource_id: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmailWatchRequest {
    #[serde(default)]
    pub cancel_existing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarWatchResponse {
    pub message: String,
    pub watch_id: Option<String>,
    pub resource_id: Option<String>,
    pub expiration: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmailWatchResponse {
    pub message: String,
    pub history_id: Option<String>,
    pub expiration: String,
}
