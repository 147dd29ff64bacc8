use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use shared::api::{
    CalendarNotification, ErrorResponse, ForwardPayload, ForwardResponse, MessageResponse,
};
use shared::ResourceState;

use crate::clients::ClientError;
use crate::error::ApiResult;
use crate::events::fetch_window_events;
use crate::state::AppState;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Push notification from the calendar provider. The change details live in
/// the `X-Goog-*` headers; the body is empty.
pub async fn calendar_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let resource_state = ResourceState::parse(header(&headers, "x-goog-resource-state"));
    let notification = CalendarNotification::new(
        header(&headers, "x-goog-channel-id"),
        header(&headers, "x-goog-resource-id"),
        &resource_state,
        header(&headers, "x-goog-message-number"),
        header(&headers, "x-goog-changed"),
    );
    tracing::info!(
        "Calendar notification: channel={} resource={} state={} message={}",
        notification.channel_id,
        notification.resource_id,
        notification.resource_state,
        notification.message_number
    );

    if resource_state == ResourceState::Sync {
        return Ok(Json(MessageResponse::new(
            "Sync notification received and acknowledged",
        ))
        .into_response());
    }

    if !resource_state.is_change() {
        return Ok(Json(MessageResponse::new(
            "Notification received but no action needed",
        ))
        .into_response());
    }

    let url = state.forward_url()?;

    let events = match state.calendar_if_configured() {
        Some(calendar) => {
            match fetch_window_events(calendar.as_ref(), &state.config.calendar_id, Utc::now())
                .await
            {
                Ok(events) => Some(events),
                Err(e) => {
                    tracing::error!("Could not list events for notification: {}", e);
                    None
                }
            }
        }
        None => None,
    };

    let payload = ForwardPayload::calendar(notification, events);
    match state.forwarder.forward(url, &payload).await {
        Ok(result) => {
            tracing::info!("Forwarded calendar notification");
            Ok(Json(ForwardResponse {
                message: "Calendar notification processed and forwarded".to_string(),
                result,
            })
            .into_response())
        }
        Err(e) => {
            tracing::error!("Error forwarding calendar notification: {}", e);
            let details = match e {
                ClientError::Upstream { body, .. } => body,
                other => other.to_string(),
            };
            Ok((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: "Failed to forward calendar notification".to_string(),
                    details: Some(details),
                }),
            )
                .into_response())
        }
    }
}
