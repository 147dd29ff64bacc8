use axum::{body::Bytes, extract::State, Json};
use chrono::Utc;
use shared::api::{
    GmailEvent, GmailIngestResponse, LastContactEvent, MessageResponse, WhatsAppEvent,
    WhatsAppIngestResponse,
};

use crate::error::ApiResult;
use crate::ingest;
use crate::state::AppState;

/// Email seen by the Zapier Gmail trigger.
pub async fn gmail_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<GmailIngestResponse>> {
    let event: GmailEvent = serde_json::from_slice(&body)?;
    tracing::debug!("Gmail webhook for {}", event.from_email);

    let records = state.records()?;
    let action = ingest::ingest_email(records.as_ref(), &state.config, &event).await?;

    Ok(Json(GmailIngestResponse {
        success: true,
        action: action.as_str().to_string(),
    }))
}

/// TimelinesAI chat webhook, single or aggregated.
pub async fn whatsapp_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<WhatsAppIngestResponse>> {
    let event: WhatsAppEvent = serde_json::from_slice(&body)?;

    let records = state.records()?;
    let response =
        ingest::ingest_whatsapp(records.as_ref(), event, Utc::now().date_naive()).await?;
    Ok(Json(response))
}

pub async fn last_contact_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<MessageResponse>> {
    let event: LastContactEvent = serde_json::from_slice(&body)?;

    let records = state.records()?;
    let updated = ingest::ingest_last_contact(
        records.as_ref(),
        &state.config,
        &event,
        Utc::now().date_naive(),
    )
    .await?;
    tracing::info!("Last contact updated on {} records", updated);

    Ok(Json(MessageResponse::new("Success")))
}
