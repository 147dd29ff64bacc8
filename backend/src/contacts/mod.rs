//! Contact reconciliation across the record store and the CRM.
//!
//! Both stores hold their own copy of a person with no shared key. A lookup
//! matches each store independently, and the side-actions copy ids across
//! so the two copies can be linked by hand.

pub mod display;
pub mod matcher;
pub mod render;

pub use display::{crm_properties, DisplayRecord};
pub use matcher::{AutoMatcher, ContactMatcher, EmailMatcher, NameTokenMatcher};

use serde::Serialize;
use serde_json::{Map, Value};
use shared::api::{MessageResponse, SyncResponse};
use shared::calendar::NormalizedEvent;
use shared::{ContactRecord, ContactSource};

use crate::clients::{Crm, RecordStore};
use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::fields::{self, crm};

/// Records matched in each store for one key
#[derive(Debug, Clone, Default)]
pub struct ContactMatches {
    pub airtable: Vec<ContactRecord>,
    pub hubspot: Vec<ContactRecord>,
}

impl ContactMatches {
    /// Every address found on the matched records, lowercased and deduplicated.
    pub fn emails(&self) -> Vec<String> {
        let mut emails: Vec<String> = self
            .airtable
            .iter()
            .chain(self.hubspot.iter())
            .flat_map(|r| r.emails())
            .collect();
        emails.sort();
        emails.dedup();
        emails
    }
}

/// What the reconciliation page shows, also served as JSON
#[derive(Debug, Clone, Serialize)]
pub struct ContactView {
    pub contact: String,
    pub airtable: Vec<DisplayRecord>,
    pub hubspot: Vec<DisplayRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meetings: Option<Vec<NormalizedEvent>>,
}

impl ContactView {
    pub fn new(contact: &str, matches: &ContactMatches) -> Self {
        Self {
            contact: contact.to_string(),
            airtable: matches.airtable.iter().map(DisplayRecord::from_record).collect(),
            hubspot: matches.hubspot.iter().map(DisplayRecord::from_record).collect(),
            meetings: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.airtable.is_empty() && self.hubspot.is_empty()
    }
}

/// Side-action requested through the `action` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactAction {
    Delete,
    Merge,
    SyncHubspotId,
    SyncAirtableId,
}

impl ContactAction {
    pub fn parse(value: &str) -> ApiResult<Self> {
        match value {
            "delete" => Ok(Self::Delete),
            "merge" => Ok(Self::Merge),
            "syncHubspotId" => Ok(Self::SyncHubspotId),
            "syncAirtableId" => Ok(Self::SyncAirtableId),
            other => Err(ApiError::bad_request(format!("Unknown action: {}", other))),
        }
    }
}

/// Look the key up in both stores.
pub async fn find_matches(
    records: &dyn RecordStore,
    crm_client: &dyn Crm,
    matcher: &dyn ContactMatcher,
    key: &str,
) -> ApiResult<ContactMatches> {
    let airtable = records.find(&matcher.record_formula(key)).await?;

    let filters = matcher.crm_filters(key);
    let hubspot = if filters.is_empty() {
        Vec::new()
    } else {
        crm_client.search(&filters, &crm_properties()).await?
    };

    tracing::info!(
        "Contact {:?}: {} Airtable and {} HubSpot matches",
        key,
        airtable.len(),
        hubspot.len()
    );
    Ok(ContactMatches { airtable, hubspot })
}

/// Split the comma-separated `records` parameter.
pub fn parse_record_ids(records: &str) -> Vec<String> {
    records
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}

/// Primary and merged id of a merge request. Only the first pair is used.
pub fn merge_pair(ids: &[String]) -> ApiResult<(&str, &str)> {
    let [primary, merged, rest @ ..] = ids else {
        return Err(ApiError::bad_request(
            "At least 2 records are required for merging",
        ));
    };
    if !rest.is_empty() {
        // TODO: merge the remaining ids into the primary one by one
        tracing::warn!(
            "Merge supports one pair per request; ignoring {} extra ids: {:?}",
            rest.len(),
            rest
        );
    }
    Ok((primary.as_str(), merged.as_str()))
}

/// Merge `merged` into `primary`; the merged CRM record stops existing.
pub async fn merge_records(
    crm_client: &dyn Crm,
    primary: &str,
    merged: &str,
) -> ApiResult<MessageResponse> {
    crm_client.merge(primary, merged).await?;
    Ok(MessageResponse::new("Records merged successfully"))
}

pub async fn delete_record(
    records: &dyn RecordStore,
    crm_client: &dyn Crm,
    source: ContactSource,
    record_id: &str,
) -> ApiResult<MessageResponse> {
    match source {
        ContactSource::Airtable => records.delete(record_id).await?,
        ContactSource::HubSpot => crm_client.delete(record_id).await?,
    }
    tracing::info!("Deleted {} record {}", source, record_id);
    Ok(MessageResponse::new("Record deleted successfully"))
}

/// Write the first CRM match's id (and profile URL) onto every record-store match.
pub async fn sync_hubspot_id(
    records: &dyn RecordStore,
    config: &AppConfig,
    matches: &ContactMatches,
) -> ApiResult<SyncResponse> {
    let hubspot = matches
        .hubspot
        .first()
        .ok_or_else(|| ApiError::not_found("No matching HubSpot contact found"))?;
    if matches.airtable.is_empty() {
        return Err(ApiError::not_found("No matching Airtable record found"));
    }

    let mut update = Map::new();
    update.insert(fields::HUBSPOT_ID.to_string(), Value::String(hubspot.id.clone()));
    if let Some(url) = config.hubspot_contact_url(&hubspot.id) {
        update.insert(fields::HUBSPOT_URL.to_string(), Value::String(url));
    }

    for record in &matches.airtable {
        records.update(&record.id, update.clone()).await?;
    }

    Ok(SyncResponse {
        message: format!("HubSpot ID {} copied to Airtable", hubspot.id),
        updated: matches.airtable.len(),
    })
}

/// Write the first record-store match's id onto every CRM match.
pub async fn sync_airtable_id(
    crm_client: &dyn Crm,
    matches: &ContactMatches,
) -> ApiResult<SyncResponse> {
    let airtable = matches
        .airtable
        .first()
        .ok_or_else(|| ApiError::not_found("No matching Airtable record found"))?;
    if matches.hubspot.is_empty() {
        return Err(ApiError::not_found("No matching HubSpot contact found"));
    }

    let mut update = Map::new();
    update.insert(crm::AIRTABLE_ID.to_string(), Value::String(airtable.id.clone()));

    for contact in &matches.hubspot {
        crm_client.update(&contact.id, update.clone()).await?;
    }

    Ok(SyncResponse {
        message: format!("Airtable ID {} copied to HubSpot", airtable.id),
        updated: matches.hubspot.len(),
    })
}
