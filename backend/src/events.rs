use chrono::{DateTime, Utc};
use shared::calendar::{normalize_events, EventWindow, NormalizedEvent};

use crate::clients::{CalendarProvider, ClientError};

/// Events on `calendar_id` within ±24h of `now`, normalized.
pub async fn fetch_window_events(
    calendar: &dyn CalendarProvider,
    calendar_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<NormalizedEvent>, ClientError> {
    let window = EventWindow::around(now);
    tracing::debug!(
        "Listing events on {} between {} and {}",
        calendar_id,
        window.time_min,
        window.time_max
    );

    let list = calendar.list_events(calendar_id, window).await?;
    Ok(normalize_events(calendar_id, list))
}
