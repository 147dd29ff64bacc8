use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{calendar, contacts, events, health_check, ingest, watch};
use crate::state::AppState;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Calendar routes
        .route("/webhooks/calendar", post(calendar::calendar_webhook))
        .route("/calendar/events", post(events::fetch_events))

        // Contact routes
        .route("/contacts", get(contacts::contact_records))
        .route("/hubspot/search", get(contacts::hubspot_search))

        // Ingestion routes
        .route("/webhooks/gmail", post(ingest::gmail_webhook))
        .route("/webhooks/whatsapp", post(ingest::whatsapp_webhook))
        .route("/webhooks/last-contact", post(ingest::last_contact_webhook))

        // Watch renewal routes
        .route("/watch/calendar/renew", post(watch::renew_calendar_watch))
        .route("/watch/gmail/renew", post(watch::renew_gmail_watch))
}
