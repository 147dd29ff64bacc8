use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Which external system holds a contact record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactSource {
    Airtable,
    HubSpot,
}

impl ContactSource {
    /// Parse the `source` query parameter used by the delete action.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "airtable" => Some(Self::Airtable),
            "hubspot" => Some(Self::HubSpot),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Airtable => "Airtable",
            Self::HubSpot => "HubSpot",
        }
    }
}

impl fmt::Display for ContactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A person as held by one of the two record stores.
///
/// Both stores key records by their own opaque ids; there is no canonical
/// identity linking an Airtable row to a HubSpot contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub id: String,
    pub source: ContactSource,
    pub fields: Map<String, Value>,
}

impl ContactRecord {
    pub fn new(id: impl Into<String>, source: ContactSource, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            source,
            fields,
        }
    }

    /// Render a field as display text. Arrays are joined with `", "`;
    /// nulls and empty strings count as absent.
    pub fn field_text(&self, name: &str) -> Option<String> {
        value_text(self.fields.get(name)?)
    }

    /// Every email address found on the record, lowercased.
    pub fn emails(&self) -> Vec<String> {
        let mut emails = Vec::new();
        for key in ["Primary email", "Email", "email"] {
            if let Some(address) = self.field_text(key) {
                emails.push(address.trim().to_lowercase());
            }
        }
        if let Some(additional) = self.field_text("hs_additional_emails") {
            emails.extend(
                additional
                    .split(';')
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty()),
            );
        }
        emails.dedup();
        emails
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_text).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        other => Some(other.to_string()),
    }
}

/// Change classification carried by the `X-Goog-Resource-State` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    Sync,
    Exists,
    Update,
    Delete,
    Other(String),
}

impl ResourceState {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "sync" => Self::Sync,
            "exists" => Self::Exists,
            "update" => Self::Update,
            "delete" => Self::Delete,
            other => Self::Other(other.to_string()),
        }
    }

    /// States that require re-fetching events and forwarding them.
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Exists | Self::Update | Self::Delete)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Sync => "sync",
            Self::Exists => "exists",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Other(value) => value,
        }
    }
}

/// Whether a message was sent by the owner or received from the contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    #[default]
    Received,
}

impl Direction {
    /// Aggregators disagree on vocabulary; anything not recognisably
    /// outgoing is treated as received.
    pub fn parse_lossy(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("sent" | "outgoing" | "outbound") => Self::Sent,
            _ => Self::Received,
        }
    }
}

/// Start or end of a calendar event. All-day events only carry `date`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub response_status: Option<String>,
}

/// Calendar event as read from the provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalendarEvent {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub status: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub color_id: Option<String>,
    pub attendees: Vec<Attendee>,
}

/// Events listed from one calendar, with the calendar's display name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalendarEventList {
    pub calendar_name: Option<String>,
    pub items: Vec<CalendarEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(fields: Value) -> ContactRecord {
        let Value::Object(map) = fields else {
            panic!("fields must be an object");
        };
        ContactRecord::new("rec1", ContactSource::Airtable, map)
    }

    #[test]
    fn test_resource_state_parse() {
        assert_eq!(ResourceState::parse("sync"), ResourceState::Sync);
        assert_eq!(ResourceState::parse("exists"), ResourceState::Exists);
        assert!(ResourceState::parse("update").is_change());
        assert!(ResourceState::parse("delete").is_change());
        assert!(!ResourceState::parse("sync").is_change());
        assert_eq!(
            ResourceState::parse("not_exists"),
            ResourceState::Other("not_exists".to_string())
        );
        assert!(!ResourceState::parse("").is_change());
    }

    #[test]
    fn test_direction_parse_lossy() {
        assert_eq!(Direction::parse_lossy(Some("sent")), Direction::Sent);
        assert_eq!(Direction::parse_lossy(Some("Outgoing")), Direction::Sent);
        assert_eq!(Direction::parse_lossy(Some("incoming")), Direction::Received);
        assert_eq!(Direction::parse_lossy(None), Direction::Received);
    }

    #[test]
    fn test_contact_source_parse() {
        assert_eq!(ContactSource::parse("HubSpot"), Some(ContactSource::HubSpot));
        assert_eq!(ContactSource::parse("airtable"), Some(ContactSource::Airtable));
        assert_eq!(ContactSource::parse("salesforce"), None);
    }

    #[test]
    fn test_field_text_handles_arrays_and_blanks() {
        let rec = record(json!({
            "Tags": ["founder", "investor"],
            "Empty": "  ",
            "Score": 4,
            "Nothing": null
        }));
        assert_eq!(rec.field_text("Tags"), Some("founder, investor".to_string()));
        assert_eq!(rec.field_text("Empty"), None);
        assert_eq!(rec.field_text("Score"), Some("4".to_string()));
        assert_eq!(rec.field_text("Nothing"), None);
        assert_eq!(rec.field_text("Missing"), None);
    }

    #[test]
    fn test_emails_collects_additional_addresses() {
        let rec = record(json!({
            "email": "Ada@Example.com",
            "hs_additional_emails": "ada@work.io; ;ada@home.net"
        }));
        assert_eq!(
            rec.emails(),
            vec!["ada@example.com", "ada@work.io", "ada@home.net"]
        );
    }
}
