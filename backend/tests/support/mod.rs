#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{Map, Value};
use shared::calendar::EventWindow;
use shared::{CalendarEvent, CalendarEventList, ContactRecord, ContactSource};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use backend::clients::{
    CalendarProvider, ClientError, Crm, FilterGroup, MailboxProvider, MailboxWatch, RecordStore,
    WatchChannel, WatchRegistration,
};
use backend::config::AppConfig;
use backend::state::AppState;

pub fn fields(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

pub fn upstream(service: &'static str, status: u16, body: &str) -> ClientError {
    ClientError::Upstream {
        service,
        status,
        body: body.to_string(),
    }
}

/// In-memory record store. `find` returns records having a field whose
/// quoted value appears in the formula.
#[derive(Default)]
pub struct FakeRecordStore {
    pub records: Mutex<Vec<ContactRecord>>,
    pub formulas: Mutex<Vec<String>>,
    pub created: Mutex<Vec<Map<String, Value>>>,
    pub updated: Mutex<Vec<(String, Map<String, Value>)>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_with: Mutex<Option<(u16, String)>>,
}

impl FakeRecordStore {
    pub fn with_records(records: Vec<ContactRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn record(id: &str, value: Value) -> ContactRecord {
        ContactRecord::new(id, ContactSource::Airtable, fields(value))
    }

    pub fn lookups(&self) -> usize {
        self.formulas.lock().unwrap().len()
    }

    pub fn writes(&self) -> usize {
        self.created.lock().unwrap().len() + self.updated.lock().unwrap().len()
    }

    fn failure(&self) -> Result<(), ClientError> {
        match self.fail_with.lock().unwrap().clone() {
            Some((status, body)) => Err(upstream("Airtable", status, &body)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordStore for FakeRecordStore {
    async fn find(&self, formula: &str) -> Result<Vec<ContactRecord>, ClientError> {
        self.formulas.lock().unwrap().push(formula.to_string());
        self.failure()?;
        let found = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.fields.values().any(|v| {
                    v.as_str()
                        .map(|s| formula.contains(&format!("'{}'", s)))
                        .unwrap_or(false)
                })
            })
            .cloned()
            .collect();
        Ok(found)
    }

    async fn create(&self, fields: Map<String, Value>) -> Result<ContactRecord, ClientError> {
        self.failure()?;
        self.created.lock().unwrap().push(fields.clone());
        let id = format!("recNew{}", self.created.lock().unwrap().len());
        Ok(ContactRecord::new(id, ContactSource::Airtable, fields))
    }

    async fn update(
        &self,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<ContactRecord, ClientError> {
        self.failure()?;
        self.updated
            .lock()
            .unwrap()
            .push((id.to_string(), fields.clone()));
        Ok(ContactRecord::new(id, ContactSource::Airtable, fields))
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.failure()?;
        self.deleted.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

/// In-memory CRM. `search` returns every contact it holds.
#[derive(Default)]
pub struct FakeCrm {
    pub contacts: Mutex<Vec<ContactRecord>>,
    pub searches: Mutex<Vec<Vec<FilterGroup>>>,
    pub updated: Mutex<Vec<(String, Map<String, Value>)>>,
    pub merged: Mutex<Vec<(String, String)>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_with: Mutex<Option<(u16, String)>>,
}

impl FakeCrm {
    pub fn with_contacts(contacts: Vec<ContactRecord>) -> Self {
        Self {
            contacts: Mutex::new(contacts),
            ..Self::default()
        }
    }

    pub fn contact(id: &str, value: Value) -> ContactRecord {
        ContactRecord::new(id, ContactSource::HubSpot, fields(value))
    }

    /// Every call made against the CRM.
    pub fn calls(&self) -> usize {
        self.searches.lock().unwrap().len()
            + self.updated.lock().unwrap().len()
            + self.merged.lock().unwrap().len()
            + self.deleted.lock().unwrap().len()
    }

    fn failure(&self) -> Result<(), ClientError> {
        match self.fail_with.lock().unwrap().clone() {
            Some((status, body)) => Err(upstream("HubSpot", status, &body)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Crm for FakeCrm {
    async fn search(
        &self,
        filter_groups: &[FilterGroup],
        _properties: &[&str],
    ) -> Result<Vec<ContactRecord>, ClientError> {
        self.searches.lock().unwrap().push(filter_groups.to_vec());
        self.failure()?;
        Ok(self.contacts.lock().unwrap().clone())
    }

    async fn get(&self, id: &str, _properties: &[&str]) -> Result<ContactRecord, ClientError> {
        self.failure()?;
        self.contacts
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| upstream("HubSpot", 404, "not found"))
    }

    async fn update(
        &self,
        id: &str,
        properties: Map<String, Value>,
    ) -> Result<ContactRecord, ClientError> {
        self.failure()?;
        self.updated
            .lock()
            .unwrap()
            .push((id.to_string(), properties.clone()));
        Ok(ContactRecord::new(id, ContactSource::HubSpot, properties))
    }

    async fn merge(&self, primary_id: &str, merged_id: &str) -> Result<ContactRecord, ClientError> {
        self.failure()?;
        self.merged
            .lock()
            .unwrap()
            .push((primary_id.to_string(), merged_id.to_string()));
        Ok(ContactRecord::new(primary_id, ContactSource::HubSpot, Map::new()))
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.failure()?;
        self.deleted.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeCalendar {
    pub name: Option<String>,
    pub events: Vec<CalendarEvent>,
    pub listed: Mutex<Vec<(String, EventWindow)>>,
    pub watched: Mutex<Vec<(String, WatchChannel)>>,
    pub stopped: Mutex<Vec<(String, String)>>,
    pub fail_stop: bool,
    pub fail_list: bool,
}

#[async_trait]
impl CalendarProvider for FakeCalendar {
    async fn list_events(
        &self,
        calendar_id: &str,
        window: EventWindow,
    ) -> Result<CalendarEventList, ClientError> {
        self.listed
            .lock()
            .unwrap()
            .push((calendar_id.to_string(), window));
        if self.fail_list {
            return Err(upstream("Google Calendar", 500, "backend error"));
        }
        Ok(CalendarEventList {
            calendar_name: self.name.clone(),
            items: self.events.clone(),
        })
    }

    async fn watch(
        &self,
        calendar_id: &str,
        channel: &WatchChannel,
    ) -> Result<WatchRegistration, ClientError> {
        self.watched
            .lock()
            .unwrap()
            .push((calendar_id.to_string(), channel.clone()));
        Ok(WatchRegistration {
            id: Some(channel.id.clone()),
            resource_id: Some("resource-1".to_string()),
            expiration: chrono::DateTime::from_timestamp_millis(1_715_169_600_000),
        })
    }

    async fn stop(&self, channel_id: &str, resource_id: &str) -> Result<(), ClientError> {
        self.stopped
            .lock()
            .unwrap()
            .push((channel_id.to_string(), resource_id.to_string()));
        if self.fail_stop {
            return Err(upstream("Google Calendar", 404, "Channel not found"));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeMailbox {
    pub watched: Mutex<Vec<(String, Vec<String>)>>,
    pub stops: Mutex<usize>,
}

#[async_trait]
impl MailboxProvider for FakeMailbox {
    async fn watch(&self, topic: &str, label_ids: &[&str]) -> Result<MailboxWatch, ClientError> {
        self.watched.lock().unwrap().push((
            topic.to_string(),
            label_ids.iter().map(|l| l.to_string()).collect(),
        ));
        Ok(MailboxWatch {
            history_id: Some(4242),
            expiration: None,
        })
    }

    async fn stop(&self) -> Result<(), ClientError> {
        *self.stops.lock().unwrap() += 1;
        Ok(())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        owner_email: Some("owner@example.com".to_string()),
        hubspot_portal_id: Some("144".to_string()),
        calendar_watch_address: Some("https://relay.example.com/webhooks/calendar".to_string()),
        gcp_project_id: Some("relay-123".to_string()),
        ..AppConfig::default()
    }
}

/// Handles to the fakes behind a test app
pub struct TestApp {
    pub router: Router,
    pub records: Arc<FakeRecordStore>,
    pub crm: Arc<FakeCrm>,
    pub calendar: Arc<FakeCalendar>,
    pub mailbox: Arc<FakeMailbox>,
}

impl TestApp {
    pub fn new(
        config: AppConfig,
        records: FakeRecordStore,
        crm: FakeCrm,
        calendar: FakeCalendar,
    ) -> Self {
        let records = Arc::new(records);
        let crm = Arc::new(crm);
        let calendar = Arc::new(calendar);
        let mailbox = Arc::new(FakeMailbox::default());

        let state = AppState::new(config)
            .with_record_store(records.clone())
            .with_crm(crm.clone())
            .with_calendar(calendar.clone())
            .with_mailbox(mailbox.clone());

        Self {
            router: backend::create_app(state),
            records,
            crm,
            calendar,
            mailbox,
        }
    }

    pub fn with_stores(records: FakeRecordStore, crm: FakeCrm) -> Self {
        Self::new(test_config(), records, crm, FakeCalendar::default())
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = self.send(request).await;
        let value = serde_json::from_str(&body).unwrap_or(Value::String(body));
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        self.send_json(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send_json(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}
