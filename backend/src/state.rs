use anyhow::{Context, Result};
use std::sync::Arc;

use crate::clients::google::{GmailClient, GoogleCalendarClient, GoogleCredentials};
use crate::clients::{
    AirtableClient, CalendarProvider, Crm, Forwarder, HubSpotClient, MailboxProvider, RecordStore,
};
use crate::config::AppConfig;
use crate::contacts::{AutoMatcher, ContactMatcher};
use crate::error::{ApiError, ApiResult};

/// Shared handler state: configuration plus the collaborators it enabled.
///
/// A collaborator is `None` when its credentials are not configured; the
/// accessors turn that into a configuration error naming the variable.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub forwarder: Forwarder,
    pub matcher: Arc<dyn ContactMatcher>,
    records: Option<Arc<dyn RecordStore>>,
    crm: Option<Arc<dyn Crm>>,
    calendar: Option<Arc<dyn CalendarProvider>>,
    mailbox: Option<Arc<dyn MailboxProvider>>,
}

impl AppState {
    /// State with no collaborators; use the `with_*` builders to attach them.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            forwarder: Forwarder::default(),
            matcher: Arc::new(AutoMatcher),
            records: None,
            crm: None,
            calendar: None,
            mailbox: None,
        }
    }

    /// Construct every collaborator whose credentials are present.
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("contact-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let mut state = Self::new(config.clone());
        state.forwarder = Forwarder::new(http.clone());

        match (&config.airtable_api_key, &config.airtable_base_id) {
            (Some(key), Some(base)) => {
                let client = AirtableClient::new(
                    http.clone(),
                    &config.airtable_api_url,
                    key,
                    base,
                    &config.airtable_contacts_table,
                )?;
                state = state.with_record_store(Arc::new(client));
                tracing::info!("Airtable client ready for table {}", config.airtable_contacts_table);
            }
            _ => tracing::warn!("Airtable credentials not set, record store disabled"),
        }

        match &config.hubspot_access_token {
            Some(token) => {
                let client = HubSpotClient::new(http.clone(), &config.hubspot_api_url, token)?;
                state = state.with_crm(Arc::new(client));
                tracing::info!("HubSpot client ready");
            }
            None => tracing::warn!("HUBSPOT_ACCESS_TOKEN not set, CRM disabled"),
        }

        match GoogleCredentials::for_calendar(&config) {
            Some(credentials) => {
                let client = GoogleCalendarClient::from_credentials(&credentials).await?;
                state = state.with_calendar(Arc::new(client));
                tracing::info!("Google Calendar client ready for {}", config.calendar_id);
            }
            None => tracing::warn!("Google calendar credentials not set, calendar disabled"),
        }

        match GoogleCredentials::for_gmail(&config) {
            Some(credentials) => {
                let client = GmailClient::from_credentials(&credentials).await?;
                state = state.with_mailbox(Arc::new(client));
                tracing::info!("Gmail client ready");
            }
            None => tracing::warn!("Google mail credentials not set, Gmail watch disabled"),
        }

        Ok(state)
    }

    pub fn with_record_store(mut self, records: Arc<dyn RecordStore>) -> Self {
        self.records = Some(records);
        self
    }

    pub fn with_crm(mut self, crm: Arc<dyn Crm>) -> Self {
        self.crm = Some(crm);
        self
    }

    pub fn with_calendar(mut self, calendar: Arc<dyn CalendarProvider>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    pub fn with_mailbox(mut self, mailbox: Arc<dyn MailboxProvider>) -> Self {
        self.mailbox = Some(mailbox);
        self
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn ContactMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn records(&self) -> ApiResult<Arc<dyn RecordStore>> {
        self.records
            .clone()
            .ok_or_else(|| ApiError::missing_env("AIRTABLE_API_KEY"))
    }

    pub fn crm(&self) -> ApiResult<Arc<dyn Crm>> {
        self.crm
            .clone()
            .ok_or_else(|| ApiError::missing_env("HUBSPOT_ACCESS_TOKEN"))
    }

    pub fn calendar(&self) -> ApiResult<Arc<dyn CalendarProvider>> {
        self.calendar
            .clone()
            .ok_or_else(|| ApiError::missing_env("GOOGLE_REFRESH_TOKEN"))
    }

    /// Calendar provider when configured; callers treat it as optional.
    pub fn calendar_if_configured(&self) -> Option<Arc<dyn CalendarProvider>> {
        self.calendar.clone()
    }

    pub fn mailbox(&self) -> ApiResult<Arc<dyn MailboxProvider>> {
        self.mailbox
            .clone()
            .ok_or_else(|| ApiError::missing_env("GOOGLE_REFRESH_TOKEN"))
    }

    pub fn forward_url(&self) -> ApiResult<&str> {
        self.config
            .calendar_forward_url
            .as_deref()
            .ok_or_else(|| ApiError::missing_env("CALENDAR_FORWARD_URL"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_missing_collaborators_are_config_errors() {
        let state = AppState::new(AppConfig::default());

        let err = state.records().err().map(|e| e.to_body().details);
        assert_eq!(
            err,
            Some(Some(
                "AIRTABLE_API_KEY environment variable must be set".to_string()
            ))
        );
        assert_eq!(
            state.crm().err().map(|e| e.status()),
            Some(StatusCode::INTERNAL_SERVER_ERROR)
        );
        assert!(state.forward_url().is_err());
        assert!(state.calendar_if_configured().is_none());
    }

    #[tokio::test]
    async fn test_from_config_without_credentials() {
        let state = AppState::from_config(AppConfig::default())
            .await
            .expect("should build state");
        assert!(state.records().is_err());
        assert!(state.crm().is_err());
        assert!(state.calendar().is_err());
        assert!(state.mailbox().is_err());
    }
}
