//! HubSpot CRM v3 contacts client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use shared::{ContactRecord, ContactSource};

use super::{read_body, read_json, ClientError, Crm};

const SERVICE: &str = "HubSpot";

/// Page size for contact searches.
const SEARCH_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterOperator {
    Eq,
    ContainsToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub property_name: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl Filter {
    pub fn new(property: &str, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            property_name: property.to_string(),
            operator,
            value: value.into(),
        }
    }
}

/// Filters within a group are ANDed; groups are ORed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterGroup {
    pub filters: Vec<Filter>,
}

impl FilterGroup {
    pub fn all(filters: Vec<Filter>) -> Self {
        Self { filters }
    }

    pub fn single(filter: Filter) -> Self {
        Self {
            filters: vec![filter],
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<HubSpotObject>,
}

#[derive(Debug, Deserialize)]
struct HubSpotObject {
    id: String,
    #[serde(default)]
    properties: Map<String, Value>,
}

impl From<HubSpotObject> for ContactRecord {
    fn from(object: HubSpotObject) -> Self {
        ContactRecord::new(object.id, ContactSource::HubSpot, object.properties)
    }
}

#[derive(Debug, Clone)]
pub struct HubSpotClient {
    http: reqwest::Client,
    access_token: String,
    contacts_url: Url,
}

impl HubSpotClient {
    pub fn new(
        http: reqwest::Client,
        api_url: &str,
        access_token: impl Into<String>,
    ) -> Result<Self> {
        let mut contacts_url =
            Url::parse(api_url).with_context(|| format!("Invalid HubSpot API URL: {}", api_url))?;
        contacts_url
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("HubSpot API URL cannot be a base: {}", api_url))?
            .pop_if_empty()
            .extend(["crm", "v3", "objects", "contacts"]);

        Ok(Self {
            http,
            access_token: access_token.into(),
            contacts_url,
        })
    }

    /// Collection URL with one more segment; `/`, `?` and `#` in it are encoded.
    fn contact_url(&self, segment: &str) -> Url {
        let mut url = self.contacts_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(segment);
        }
        url
    }
}

#[async_trait]
impl Crm for HubSpotClient {
    async fn search(
        &self,
        filter_groups: &[FilterGroup],
        properties: &[&str],
    ) -> Result<Vec<ContactRecord>, ClientError> {
        let response = self
            .http
            .post(self.contact_url("search"))
            .bearer_auth(&self.access_token)
            .json(&json!({
                "filterGroups": filter_groups,
                "properties": properties,
                "limit": SEARCH_LIMIT,
            }))
            .send()
            .await
            .map_err(|e| ClientError::http(SERVICE, e))?;

        let found: SearchResponse = read_json(SERVICE, response).await?;
        tracing::debug!("HubSpot search returned {} contacts", found.results.len());
        Ok(found.results.into_iter().map(Into::into).collect())
    }

    async fn get(&self, id: &str, properties: &[&str]) -> Result<ContactRecord, ClientError> {
        let response = self
            .http
            .get(self.contact_url(id))
            .bearer_auth(&self.access_token)
            .query(&[("properties", properties.join(","))])
            .send()
            .await
            .map_err(|e| ClientError::http(SERVICE, e))?;

        let object: HubSpotObject = read_json(SERVICE, response).await?;
        Ok(object.into())
    }

    async fn update(
        &self,
        id: &str,
        properties: Map<String, Value>,
    ) -> Result<ContactRecord, ClientError> {
        let response = self
            .http
            .patch(self.contact_url(id))
            .bearer_auth(&self.access_token)
            .json(&json!({ "properties": properties }))
            .send()
            .await
            .map_err(|e| ClientError::http(SERVICE, e))?;

        let object: HubSpotObject = read_json(SERVICE, response).await?;
        tracing::info!("Updated HubSpot contact {}", object.id);
        Ok(object.into())
    }

    async fn merge(&self, primary_id: &str, merged_id: &str) -> Result<ContactRecord, ClientError> {
        let response = self
            .http
            .post(self.contact_url("merge"))
            .bearer_auth(&self.access_token)
            .json(&json!({
                "primaryObjectId": primary_id,
                "objectIdToMerge": merged_id,
            }))
            .send()
            .await
            .map_err(|e| ClientError::http(SERVICE, e))?;

        let object: HubSpotObject = read_json(SERVICE, response).await?;
        tracing::info!("Merged HubSpot contact {} into {}", merged_id, object.id);
        Ok(object.into())
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.contact_url(id))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| ClientError::http(SERVICE, e))?;

        read_body(SERVICE, response).await?;
        tracing::info!("Deleted HubSpot contact {}", id);
        Ok(())
    }
}
