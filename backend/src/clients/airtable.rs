//! Airtable REST client for a single table.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use shared::{ContactRecord, ContactSource};

use super::{read_body, read_json, ClientError, RecordStore};

const SERVICE: &str = "Airtable";

#[derive(Debug, Deserialize)]
struct RecordList {
    #[serde(default)]
    records: Vec<AirtableRecord>,
}

#[derive(Debug, Deserialize)]
struct AirtableRecord {
    id: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl From<AirtableRecord> for ContactRecord {
    fn from(record: AirtableRecord) -> Self {
        ContactRecord::new(record.id, ContactSource::Airtable, record.fields)
    }
}

#[derive(Debug, Clone)]
pub struct AirtableClient {
    http: reqwest::Client,
    api_key: String,
    table_url: Url,
}

impl AirtableClient {
    pub fn new(
        http: reqwest::Client,
        api_url: &str,
        api_key: impl Into<String>,
        base_id: &str,
        table: &str,
    ) -> Result<Self> {
        let mut table_url =
            Url::parse(api_url).with_context(|| format!("Invalid Airtable API URL: {}", api_url))?;
        table_url
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Airtable API URL cannot be a base: {}", api_url))?
            .pop_if_empty()
            .push(base_id)
            .push(table);

        Ok(Self {
            http,
            api_key: api_key.into(),
            table_url,
        })
    }

    fn record_url(&self, id: &str) -> Url {
        let mut url = self.table_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(id);
        }
        url
    }
}

#[async_trait]
impl RecordStore for AirtableClient {
    async fn find(&self, formula: &str) -> Result<Vec<ContactRecord>, ClientError> {
        tracing::debug!("Airtable select: {}", formula);

        let response = self
            .http
            .get(self.table_url.clone())
            .bearer_auth(&self.api_key)
            .query(&[("filterByFormula", formula)])
            .send()
            .await
            .map_err(|e| ClientError::http(SERVICE, e))?;

        let list: RecordList = read_json(SERVICE, response).await?;
        tracing::debug!("Found {} matching records", list.records.len());
        Ok(list.records.into_iter().map(Into::into).collect())
    }

    async fn create(&self, fields: Map<String, Value>) -> Result<ContactRecord, ClientError> {
        let response = self
            .http
            .post(self.table_url.clone())
            .bearer_auth(&self.api_key)
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(|e| ClientError::http(SERVICE, e))?;

        let record: AirtableRecord = read_json(SERVICE, response).await?;
        tracing::info!("Created Airtable record {}", record.id);
        Ok(record.into())
    }

    async fn update(
        &self,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<ContactRecord, ClientError> {
        let response = self
            .http
            .patch(self.record_url(id))
            .bearer_auth(&self.api_key)
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(|e| ClientError::http(SERVICE, e))?;

        let record: AirtableRecord = read_json(SERVICE, response).await?;
        tracing::info!("Updated Airtable record {}", record.id);
        Ok(record.into())
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.record_url(id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ClientError::http(SERVICE, e))?;

        read_body(SERVICE, response).await?;
        tracing::info!("Deleted Airtable record {}", id);
        Ok(())
    }
}
