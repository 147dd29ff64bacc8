use axum::{extract::State, Json};
use shared::api::{
    CalendarWatchRequest, CalendarWatchResponse, GmailWatchRequest, GmailWatchResponse,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::watch::{self, ChannelHandle};

pub async fn renew_calendar_watch(
    State(state): State<AppState>,
    payload: Option<Json<CalendarWatchRequest>>,
) -> ApiResult<Json<CalendarWatchResponse>> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let previous = match (request.previous_channel_id, request.previous_resource_id) {
        (Some(channel_id), Some(resource_id)) => Some(ChannelHandle {
            channel_id,
            resource_id,
        }),
        (None, None) => None,
        _ => {
            return Err(ApiError::bad_request(
                "previousChannelId and previousResourceId must be given together",
            ))
        }
    };

    let calendar = state.calendar()?;
    let response =
        watch::renew_calendar_watch(calendar.as_ref(), &state.config, previous.as_ref()).await?;
    Ok(Json(response))
}

pub async fn renew_gmail_watch(
    State(state): State<AppState>,
    payload: Option<Json<GmailWatchRequest>>,
) -> ApiResult<Json<GmailWatchResponse>> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();

    let mailbox = state.mailbox()?;
    let response =
        watch::renew_gmail_watch(mailbox.as_ref(), &state.config, request.cancel_existing).await?;
    Ok(Json(response))
}
