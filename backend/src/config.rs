use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

/// Process-wide settings, read once at startup and injected via `AppState`.
///
/// Credentials are optional: a collaborator whose credentials are missing is
/// simply not constructed, and only the handlers that need it fail.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    pub cors_allowed_origins: Option<String>,
    /// Address of the mailbox owner; their own messages are never ingested
    pub owner_email: Option<String>,

    pub airtable_api_key: Option<String>,
    pub airtable_base_id: Option<String>,
    #[serde(default = "default_contacts_table")]
    pub airtable_contacts_table: String,
    #[serde(default = "default_airtable_api_url")]
    pub airtable_api_url: String,

    pub hubspot_access_token: Option<String>,
    pub hubspot_portal_id: Option<String>,
    #[serde(default = "default_hubspot_api_url")]
    pub hubspot_api_url: String,
    #[serde(default = "default_hubspot_app_url")]
    pub hubspot_app_url: String,

    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_refresh_token: Option<String>,
    /// Separate refresh token for the calendar account, if it differs
    pub calendar_refresh_token: Option<String>,
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    pub calendar_forward_url: Option<String>,
    pub calendar_watch_address: Option<String>,
    #[serde(default = "default_watch_ttl")]
    pub calendar_watch_ttl_secs: u64,
    pub gcp_project_id: Option<String>,
    #[serde(default = "default_gmail_topic")]
    pub gmail_topic_name: String,
}

fn default_port() -> u16 {
    8080
}

fn default_contacts_table() -> String {
    "Contacts".to_string()
}

fn default_airtable_api_url() -> String {
    "https://api.airtable.com/v0".to_string()
}

fn default_hubspot_api_url() -> String {
    "https://api.hubapi.com".to_string()
}

fn default_hubspot_app_url() -> String {
    "https://app-eu1.hubspot.com".to_string()
}

fn default_calendar_id() -> String {
    "primary".to_string()
}

fn default_watch_ttl() -> u64 {
    604_800 // 7 days, the provider maximum
}

fn default_gmail_topic() -> String {
    "gmail-email-notifications".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            cors_allowed_origins: None,
            owner_email: None,
            airtable_api_key: None,
            airtable_base_id: None,
            airtable_contacts_table: default_contacts_table(),
            airtable_api_url: default_airtable_api_url(),
            hubspot_access_token: None,
            hubspot_portal_id: None,
            hubspot_api_url: default_hubspot_api_url(),
            hubspot_app_url: default_hubspot_app_url(),
            google_client_id: None,
            google_client_secret: None,
            google_refresh_token: None,
            calendar_refresh_token: None,
            calendar_id: default_calendar_id(),
            calendar_forward_url: None,
            calendar_watch_address: None,
            calendar_watch_ttl_secs: default_watch_ttl(),
            gcp_project_id: None,
            gmail_topic_name: default_gmail_topic(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables (case-insensitive).
    pub fn from_env() -> Result<Self> {
        Config::builder()
            .add_source(Environment::default())
            .build()
            .context("Failed to read configuration from environment")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Full Pub/Sub topic name used for mailbox watches.
    pub fn gmail_topic(&self) -> Option<String> {
        self.gcp_project_id
            .as_ref()
            .map(|project| format!("projects/{}/topics/{}", project, self.gmail_topic_name))
    }

    /// Public CRM profile URL for a contact, when the portal is known.
    pub fn hubspot_contact_url(&self, contact_id: &str) -> Option<String> {
        self.hubspot_portal_id.as_ref().map(|portal| {
            format!(
                "{}/contacts/{}/contact/{}",
                self.hubspot_app_url.trim_end_matches('/'),
                portal,
                contact_id
            )
        })
    }

    pub fn is_owner(&self, email: &str) -> bool {
        self.owner_email
            .as_deref()
            .map(|owner| owner.eq_ignore_ascii_case(email.trim()))
            .unwrap_or(false)
    }
}
