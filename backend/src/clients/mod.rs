//! Outbound collaborators: the record store, the CRM, the calendar and mail
//! provider, and the downstream notification endpoint.
//!
//! Handlers only see the traits below so tests can swap in fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use shared::calendar::EventWindow;
use shared::{CalendarEventList, ContactRecord};
use thiserror::Error;

pub mod airtable;
pub mod forwarder;
pub mod google;
pub mod hubspot;

pub use airtable::AirtableClient;
pub use forwarder::Forwarder;
pub use hubspot::{Filter, FilterGroup, FilterOperator, HubSpotClient};

/// Failure of an outbound call. Never retried.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{service} request failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned status {status}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} returned an unreadable response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    #[error("{service} call failed: {message}")]
    Provider {
        service: &'static str,
        message: String,
    },
}

impl ClientError {
    pub fn http(service: &'static str, source: reqwest::Error) -> Self {
        ClientError::Http { service, source }
    }

    pub fn provider(service: &'static str, err: impl std::fmt::Display) -> Self {
        ClientError::Provider {
            service,
            message: err.to_string(),
        }
    }
}

/// Read a response body, turning non-success statuses into
/// [`ClientError::Upstream`] with the raw body attached.
pub(crate) async fn read_body(
    service: &'static str,
    response: reqwest::Response,
) -> Result<String, ClientError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ClientError::http(service, e))?;

    if !status.is_success() {
        return Err(ClientError::Upstream {
            service,
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

pub(crate) async fn read_json<T: DeserializeOwned>(
    service: &'static str,
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let body = read_body(service, response).await?;
    serde_json::from_str(&body).map_err(|e| ClientError::Decode {
        service,
        message: e.to_string(),
    })
}

/// Spreadsheet-style store holding the primary contact table
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// First page of records matching a filter formula.
    async fn find(&self, formula: &str) -> Result<Vec<ContactRecord>, ClientError>;

    async fn create(&self, fields: Map<String, Value>) -> Result<ContactRecord, ClientError>;

    async fn update(
        &self,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<ContactRecord, ClientError>;

    async fn delete(&self, id: &str) -> Result<(), ClientError>;
}

/// CRM holding a second, independently keyed copy of each contact
#[async_trait]
pub trait Crm: Send + Sync {
    async fn search(
        &self,
        filter_groups: &[FilterGroup],
        properties: &[&str],
    ) -> Result<Vec<ContactRecord>, ClientError>;

    async fn get(&self, id: &str, properties: &[&str]) -> Result<ContactRecord, ClientError>;

    async fn update(
        &self,
        id: &str,
        properties: Map<String, Value>,
    ) -> Result<ContactRecord, ClientError>;

    /// Merge `merged_id` into `primary_id`; the merged record stops existing.
    async fn merge(&self, primary_id: &str, merged_id: &str) -> Result<ContactRecord, ClientError>;

    async fn delete(&self, id: &str) -> Result<(), ClientError>;
}

/// Push channel to register on a calendar
#[derive(Debug, Clone)]
pub struct WatchChannel {
    pub id: String,
    pub address: String,
    pub ttl_secs: u64,
}

/// Channel as acknowledged by the provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchRegistration {
    pub id: Option<String>,
    pub resource_id: Option<String>,
    pub expiration: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MailboxWatch {
    pub history_id: Option<u64>,
    pub expiration: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn list_events(
        &self,
        calendar_id: &str,
        window: EventWindow,
    ) -> Result<CalendarEventList, ClientError>;

    async fn watch(
        &self,
        calendar_id: &str,
        channel: &WatchChannel,
    ) -> Result<WatchRegistration, ClientError>;

    async fn stop(&self, channel_id: &str, resource_id: &str) -> Result<(), ClientError>;
}

#[async_trait]
pub trait MailboxProvider: Send + Sync {
    async fn watch(&self, topic: &str, label_ids: &[&str]) -> Result<MailboxWatch, ClientError>;

    /// Cancel every push subscription on the mailbox.
    async fn stop(&self) -> Result<(), ClientError>;
}
