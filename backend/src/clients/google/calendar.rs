use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use google_calendar3::api::{Channel, Event, EventDateTime};
use google_calendar3::hyper_rustls::HttpsConnector;
use google_calendar3::CalendarHub;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use shared::calendar::{EventWindow, MAX_WINDOW_EVENTS};
use shared::{Attendee, CalendarEvent, CalendarEventList, EventTime};
use std::collections::HashMap;

use super::GoogleCredentials;
use crate::clients::{CalendarProvider, ClientError, WatchChannel, WatchRegistration};

const SERVICE: &str = "Google Calendar";

/// Client for interacting with Google Calendar API
pub struct GoogleCalendarClient {
    hub: CalendarHub<HttpsConnector<HttpConnector>>,
}

impl GoogleCalendarClient {
    /// Build a hub whose access tokens are minted from the stored refresh token
    pub async fn from_credentials(credentials: &GoogleCredentials) -> Result<Self> {
        // Use the yup_oauth2 re-exported by google_calendar3 to avoid version mismatch
        let secret = google_calendar3::yup_oauth2::authorized_user::AuthorizedUserSecret {
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            refresh_token: credentials.refresh_token.clone(),
            key_type: "authorized_user".to_string(),
        };

        let auth = google_calendar3::yup_oauth2::AuthorizedUserAuthenticator::builder(secret)
            .build()
            .await
            .context("Failed to build calendar authenticator from refresh token")?;

        let connector = google_calendar3::hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .context("Failed to load native TLS roots")?
            .https_or_http()
            .enable_http1()
            .build();

        let client = Client::builder(TokioExecutor::new()).build(connector);
        let hub = CalendarHub::new(client, auth);

        Ok(Self { hub })
    }

    fn convert_time(time: EventDateTime) -> EventTime {
        EventTime {
            date_time: time.date_time,
            date: time.date,
            time_zone: time.time_zone,
        }
    }

    fn convert_event(event: Event) -> CalendarEvent {
        CalendarEvent {
            id: event.id,
            summary: event.summary,
            description: event.description,
            start: event.start.map(Self::convert_time),
            end: event.end.map(Self::convert_time),
            status: event.status,
            created: event.created,
            updated: event.updated,
            color_id: event.color_id,
            attendees: event
                .attendees
                .unwrap_or_default()
                .into_iter()
                .map(|a| Attendee {
                    email: a.email,
                    display_name: a.display_name,
                    response_status: a.response_status,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendarClient {
    async fn list_events(
        &self,
        calendar_id: &str,
        window: EventWindow,
    ) -> Result<CalendarEventList, ClientError> {
        let (_, events) = self
            .hub
            .events()
            .list(calendar_id)
            .time_min(window.time_min)
            .time_max(window.time_max)
            .max_results(MAX_WINDOW_EVENTS)
            .single_events(true)
            .order_by("startTime")
            .doit()
            .await
            .map_err(|e| ClientError::provider(SERVICE, e))?;

        let items: Vec<CalendarEvent> = events
            .items
            .unwrap_or_default()
            .into_iter()
            .map(Self::convert_event)
            .collect();
        tracing::info!("Found {} events on calendar {}", items.len(), calendar_id);

        Ok(CalendarEventList {
            calendar_name: events.summary,
            items,
        })
    }

    async fn watch(
        &self,
        calendar_id: &str,
        channel: &WatchChannel,
    ) -> Result<WatchRegistration, ClientError> {
        let mut params = HashMap::new();
        params.insert("ttl".to_string(), channel.ttl_secs.to_string());

        let request = Channel {
            id: Some(channel.id.clone()),
            type_: Some("web_hook".to_string()),
            address: Some(channel.address.clone()),
            params: Some(params),
            ..Default::default()
        };

        let (_, created) = self
            .hub
            .events()
            .watch(request, calendar_id)
            .doit()
            .await
            .map_err(|e| ClientError::provider(SERVICE, e))?;

        Ok(WatchRegistration {
            id: created.id,
            resource_id: created.resource_id,
            expiration: created.expiration.and_then(DateTime::from_timestamp_millis),
        })
    }

    async fn stop(&self, channel_id: &str, resource_id: &str) -> Result<(), ClientError> {
        let request = Channel {
            id: Some(channel_id.to_string()),
            resource_id: Some(resource_id.to_string()),
            ..Default::default()
        };

        self.hub
            .channels()
            .stop(request)
            .doit()
            .await
            .map_err(|e| ClientError::provider(SERVICE, e))?;

        tracing::info!("Stopped calendar channel {}", channel_id);
        Ok(())
    }
}
