//! Last-interaction bookkeeping fed by the email and chat webhooks.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use shared::api::{
    GmailEvent, LastContactEvent, MessageTimestamp, WhatsAppEvent, WhatsAppIngestResponse,
};
use shared::phone::normalize_phone;
use shared::Direction;
use validator::Validate;

use crate::clients::{ClientError, RecordStore};
use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::fields;

/// Outcome of ingesting one interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestAction {
    Updated,
    Created,
    Skipped,
}

impl IngestAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestAction::Updated => "updated",
            IngestAction::Created => "created",
            IngestAction::Skipped => "skipped",
        }
    }
}

/// Parse an interaction timestamp: RFC 3339, RFC 2822,
/// `YYYY-MM-DD HH:MM:SS +ZZZZ`, `YYYY-MM-DD`, or Unix seconds/milliseconds.
pub fn parse_contact_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if raw.bytes().all(|b| b.is_ascii_digit()) {
        let n: i64 = raw.parse().ok()?;
        // Anything past year 5138 in seconds is taken as milliseconds
        let dt = if n > 100_000_000_000 {
            DateTime::from_timestamp_millis(n)
        } else {
            DateTime::from_timestamp(n, 0)
        };
        return dt.map(|dt| dt.date_naive());
    }
    None
}

/// Date as stored in the record store's date fields.
pub fn format_contact_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn email_field(direction: Direction) -> &'static str {
    match direction {
        Direction::Sent => fields::LAST_EMAIL_SENT,
        Direction::Received => fields::LAST_EMAIL_RECEIVED,
    }
}

fn whatsapp_field(direction: Direction) -> &'static str {
    match direction {
        Direction::Sent => fields::LAST_WHATSAPP_SENT,
        Direction::Received => fields::LAST_WHATSAPP_RECEIVED,
    }
}

/// Stamp `date_field` on the first record whose `key_field` equals `key`,
/// creating the record when none exists.
pub async fn record_interaction(
    records: &dyn RecordStore,
    key_field: &str,
    key: &str,
    date_field: &str,
    date: &str,
) -> Result<IngestAction, ClientError> {
    let existing = records
        .find(&fields::equals_formula(key_field, key))
        .await?;

    let mut update = Map::new();
    update.insert(date_field.to_string(), Value::String(date.to_string()));

    match existing.first() {
        Some(record) => {
            tracing::info!("Updating {} on contact {}", date_field, record.id);
            records.update(&record.id, update).await?;
            Ok(IngestAction::Updated)
        }
        None => {
            tracing::info!("Creating contact for {}", key);
            update.insert(key_field.to_string(), Value::String(key.to_string()));
            records.create(update).await?;
            Ok(IngestAction::Created)
        }
    }
}

pub async fn ingest_email(
    records: &dyn RecordStore,
    config: &AppConfig,
    event: &GmailEvent,
) -> ApiResult<IngestAction> {
    event
        .validate()
        .map_err(|e| ApiError::bad_request(format!("Invalid email event: {}", e)))?;

    let email = event.from_email.trim();
    if config.is_owner(email) {
        tracing::debug!("Skipping message from mailbox owner");
        return Ok(IngestAction::Skipped);
    }

    let date = parse_contact_date(&event.date)
        .ok_or_else(|| ApiError::bad_request(format!("Unrecognized date: {}", event.date)))?;
    let direction = Direction::parse_lossy(event.direction.as_deref());

    let action = record_interaction(
        records,
        fields::PRIMARY_EMAIL,
        email,
        email_field(direction),
        &format_contact_date(date),
    )
    .await?;
    Ok(action)
}

/// Process every message of a chat webhook. Messages without a usable phone
/// number are counted as skipped; the first store failure aborts the batch.
pub async fn ingest_whatsapp(
    records: &dyn RecordStore,
    event: WhatsAppEvent,
    today: NaiveDate,
) -> ApiResult<WhatsAppIngestResponse> {
    let is_group = event.chat.is_group;
    let chat_phone = event.chat.phone.clone();
    let messages = event
        .into_messages()
        .ok_or_else(|| ApiError::bad_request("Invalid webhook format received"))?;

    if is_group {
        tracing::info!("Ignoring group chat webhook with {} messages", messages.len());
        return Ok(WhatsAppIngestResponse {
            success: true,
            message: Some("No messages to process".to_string()),
            processed: 0,
            skipped: 0,
        });
    }

    let mut processed = 0;
    let mut skipped = 0;
    for message in &messages {
        let raw_phone = message.phone.as_deref().or(chat_phone.as_deref());
        let Some(phone) = raw_phone.and_then(normalize_phone) else {
            tracing::warn!("Skipping message with unusable phone number {:?}", raw_phone);
            skipped += 1;
            continue;
        };

        let date = message
            .timestamp
            .as_ref()
            .and_then(MessageTimestamp::as_text)
            .and_then(|raw| parse_contact_date(&raw))
            .unwrap_or(today);
        let direction = Direction::parse_lossy(message.direction.as_deref());

        record_interaction(
            records,
            fields::MOBILE_PHONE,
            &phone,
            whatsapp_field(direction),
            &format_contact_date(date),
        )
        .await?;
        processed += 1;
    }

    tracing::info!("Processed {} messages, skipped {}", processed, skipped);
    Ok(WhatsAppIngestResponse {
        success: true,
        message: None,
        processed,
        skipped,
    })
}

/// Set `Last Contact` to `today` on every record matching a participant's
/// address. Returns the number of records updated.
pub async fn ingest_last_contact(
    records: &dyn RecordStore,
    config: &AppConfig,
    event: &LastContactEvent,
    today: NaiveDate,
) -> ApiResult<usize> {
    let mut addresses: Vec<String> = std::iter::once(&event.from)
        .chain(event.to.iter())
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty() && !config.is_owner(a))
        .collect();
    addresses.sort();
    addresses.dedup();

    let date = format_contact_date(today);
    let mut updated = 0;
    for address in &addresses {
        let matches = records
            .find(&fields::equals_formula(fields::PRIMARY_EMAIL, address))
            .await?;
        for record in matches {
            let mut update = Map::new();
            update.insert(fields::LAST_CONTACT.to_string(), Value::String(date.clone()));
            records.update(&record.id, update).await?;
            tracing::info!("Updated record {} for {}", record.id, address);
            updated += 1;
        }
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_contact_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1);
        assert_eq!(parse_contact_date("2024-05-01"), expected);
        assert_eq!(parse_contact_date("2024-05-01T09:30:00Z"), expected);
        assert_eq!(parse_contact_date("Wed, 01 May 2024 09:30:00 +0000"), expected);
        assert_eq!(parse_contact_date("1714555800"), expected);
        assert_eq!(parse_contact_date("1714555800000"), expected);
        assert_eq!(parse_contact_date("2024-05-01 09:30:00 +0000"), expected);
        assert_eq!(parse_contact_date("2024-04-30 22:30:00 -0300"), expected);
        assert_eq!(parse_contact_date("yesterday"), None);
        assert_eq!(parse_contact_date("  "), None);
    }

    #[test]
    fn test_rfc3339_offset_converted_to_utc_date() {
        assert_eq!(
            parse_contact_date("2024-05-01T23:30:00-02:00"),
            NaiveDate::from_ymd_opt(2024, 5, 2)
        );
    }

    #[test]
    fn test_direction_fields() {
        assert_eq!(email_field(Direction::Sent), "Last Email Sent");
        assert_eq!(email_field(Direction::Received), "Last Email Received");
        assert_eq!(whatsapp_field(Direction::Sent), "Last Whatsapp Sent");
    }
}
