//! Google Calendar and Gmail clients authenticated from a stored refresh token.

mod calendar;
mod gmail;

pub use calendar::GoogleCalendarClient;
pub use gmail::GmailClient;

use crate::config::AppConfig;

/// OAuth client plus the refresh token of the account being accessed
#[derive(Debug, Clone)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl GoogleCredentials {
    fn from_parts(config: &AppConfig, refresh_token: Option<&String>) -> Option<Self> {
        Some(Self {
            client_id: config.google_client_id.clone()?,
            client_secret: config.google_client_secret.clone()?,
            refresh_token: refresh_token?.clone(),
        })
    }

    /// Calendar account credentials; falls back to the shared refresh token.
    pub fn for_calendar(config: &AppConfig) -> Option<Self> {
        let token = config
            .calendar_refresh_token
            .as_ref()
            .or(config.google_refresh_token.as_ref());
        Self::from_parts(config, token)
    }

    pub fn for_gmail(config: &AppConfig) -> Option<Self> {
        Self::from_parts(config, config.google_refresh_token.as_ref())
    }
}
