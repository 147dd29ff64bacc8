use axum::{extract::State, Json};
use chrono::Utc;
use shared::api::{FetchEventsRequest, FetchEventsResponse};

use crate::error::{ApiError, ApiResult};
use crate::events::fetch_window_events;
use crate::state::AppState;

/// List and normalize the events around now on the requested calendar.
pub async fn fetch_events(
    State(state): State<AppState>,
    payload: Option<Json<FetchEventsRequest>>,
) -> ApiResult<Json<FetchEventsResponse>> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();

    let resource_id = request
        .resource_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing resourceId in request"))?;
    let calendar_id = request
        .calendar_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| state.config.calendar_id.clone());

    let calendar = state.calendar()?;
    let events = fetch_window_events(calendar.as_ref(), &calendar_id, Utc::now()).await?;
    tracing::info!(
        "Fetched {} events for resource {} on {}",
        events.len(),
        resource_id,
        calendar_id
    );

    Ok(Json(FetchEventsResponse {
        resource_id,
        calendar_id,
        events,
    }))
}
