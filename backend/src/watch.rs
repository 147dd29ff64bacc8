//! Renewal of the provider push subscriptions that feed the webhooks.
//!
//! Calendar channels and mailbox watches expire after about a week and must
//! be re-registered before then, either on demand over HTTP or by the
//! `watch-renewal` runner.

use chrono::{DateTime, SecondsFormat, Utc};
use shared::api::{CalendarWatchResponse, GmailWatchResponse};
use uuid::Uuid;

use crate::clients::{CalendarProvider, MailboxProvider, WatchChannel};
use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};

pub const GMAIL_WATCH_LABELS: &[&str] = &["INBOX"];

/// A registered calendar channel, as needed to stop it later
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHandle {
    pub channel_id: String,
    pub resource_id: String,
}

impl ChannelHandle {
    /// Handle for a channel reported in a renewal response, if complete.
    pub fn from_response(response: &CalendarWatchResponse) -> Option<Self> {
        Some(Self {
            channel_id: response.watch_id.clone()?,
            resource_id: response.resource_id.clone()?,
        })
    }
}

pub fn new_channel_id() -> String {
    format!("calendar-watch-{}", Uuid::new_v4())
}

fn format_expiration(expiration: Option<DateTime<Utc>>) -> String {
    expiration
        .map(|e| e.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| "Not provided".to_string())
}

/// Register a fresh channel on the configured calendar, stopping `previous`
/// first. A failed stop is logged and does not prevent the new registration.
pub async fn renew_calendar_watch(
    calendar: &dyn CalendarProvider,
    config: &AppConfig,
    previous: Option<&ChannelHandle>,
) -> ApiResult<CalendarWatchResponse> {
    let address = config
        .calendar_watch_address
        .clone()
        .ok_or_else(|| ApiError::missing_env("CALENDAR_WATCH_ADDRESS"))?;

    if let Some(previous) = previous {
        match calendar
            .stop(&previous.channel_id, &previous.resource_id)
            .await
        {
            Ok(()) => tracing::info!("Stopped previous channel {}", previous.channel_id),
            Err(e) => tracing::warn!(
                "Could not stop previous channel {}: {}",
                previous.channel_id,
                e
            ),
        }
    }

    let channel = WatchChannel {
        id: new_channel_id(),
        address,
        ttl_secs: config.calendar_watch_ttl_secs,
    };
    let registration = calendar.watch(&config.calendar_id, &channel).await?;

    let expiration = format_expiration(registration.expiration);
    tracing::info!(
        "Calendar watch renewal successful: channel {} expires {}",
        channel.id,
        expiration
    );

    Ok(CalendarWatchResponse {
        message: "Calendar watch renewal successful".to_string(),
        watch_id: registration.id.or(Some(channel.id)),
        resource_id: registration.resource_id,
        expiration,
    })
}

/// Point the mailbox's push notifications at the configured topic.
pub async fn renew_gmail_watch(
    mailbox: &dyn MailboxProvider,
    config: &AppConfig,
    cancel_existing: bool,
) -> ApiResult<GmailWatchResponse> {
    let topic = config
        .gmail_topic()
        .ok_or_else(|| ApiError::missing_env("GCP_PROJECT_ID"))?;

    if cancel_existing {
        if let Err(e) = mailbox.stop().await {
            tracing::warn!("Could not stop existing Gmail watch: {}", e);
        }
    }

    let watch = mailbox.watch(&topic, GMAIL_WATCH_LABELS).await?;
    let expiration = format_expiration(watch.expiration);
    tracing::info!(
        "Gmail watch renewal successful on {}: history {:?} expires {}",
        topic,
        watch.history_id,
        expiration
    );

    Ok(GmailWatchResponse {
        message: "Gmail watch renewal successful".to_string(),
        history_id: watch.history_id.map(|id| id.to_string()),
        expiration,
    })
}
