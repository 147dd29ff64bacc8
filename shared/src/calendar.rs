//! Normalization of provider calendar events into the flat shape consumed
//! downstream.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Attendee, CalendarEvent, CalendarEventList, EventTime};

/// Half-width of the window re-queried after a change notification.
pub const EVENT_WINDOW_HOURS: i64 = 24;

/// Upper bound on events returned per window.
pub const MAX_WINDOW_EVENTS: i32 = 50;

/// Time range listed when a notification does not name the changed event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventWindow {
    pub time_min: DateTime<Utc>,
    pub time_max: DateTime<Utc>,
}

impl EventWindow {
    /// Window of ±[`EVENT_WINDOW_HOURS`] around `now`.
    pub fn around(now: DateTime<Utc>) -> Self {
        let span = Duration::hours(EVENT_WINDOW_HOURS);
        Self {
            time_min: now - span,
            time_max: now + span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarRef {
    pub id: String,
    pub name: String,
}

/// Event with flattened fields for downstream consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub id: Option<String>,
    pub google_meeting_id: Option<String>,
    pub summary: String,
    pub description: Option<String>,
    pub start: Option<EventTime>,
    pub meeting_date: Option<String>,
    pub end: Option<EventTime>,
    pub status: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    #[serde(rename = "colorId")]
    pub color_id: Option<String>,
    pub calendar_colour: Option<String>,
    pub calendar: CalendarRef,
    pub attendees: Vec<Attendee>,
}

impl NormalizedEvent {
    /// True when any attendee address matches one of `emails` (lowercased).
    pub fn has_attendee(&self, emails: &[String]) -> bool {
        self.attendees.iter().any(|a| {
            a.email
                .as_deref()
                .map(|e| emails.iter().any(|candidate| candidate == &e.to_lowercase()))
                .unwrap_or(false)
        })
    }
}

/// `dateTime` for timed events, `date` for all-day ones.
///
/// Timed events come back from google-calendar3 as `DateTime<Utc>`, so the
/// organizer's offset is already lost and the value is rendered in UTC
/// (`+00:00`). The instant is unchanged.
pub fn meeting_date(start: Option<&EventTime>) -> Option<String> {
    let start = start?;
    if let Some(date_time) = start.date_time {
        return Some(date_time.to_rfc3339());
    }
    start.date.map(|d| d.format("%Y-%m-%d").to_string())
}

pub fn normalize_event(
    calendar_id: &str,
    calendar_name: Option<&str>,
    event: CalendarEvent,
) -> NormalizedEvent {
    let calendar_colour = event
        .color_id
        .as_ref()
        .map(|color| format!("{} {}", color, calendar_name.unwrap_or("Calendar")));

    NormalizedEvent {
        google_meeting_id: event.id.clone(),
        id: event.id,
        summary: event
            .summary
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Untitled Event".to_string()),
        description: event.description,
        meeting_date: meeting_date(event.start.as_ref()),
        start: event.start,
        end: event.end,
        status: event.status,
        created: event.created,
        updated: event.updated,
        color_id: event.color_id,
        calendar_colour,
        calendar: CalendarRef {
            id: calendar_id.to_string(),
            name: calendar_name.unwrap_or("Google Calendar").to_string(),
        },
        attendees: event.attendees,
    }
}

pub fn normalize_events(calendar_id: &str, list: CalendarEventList) -> Vec<NormalizedEvent> {
    let name = list.calendar_name;
    list.items
        .into_iter()
        .map(|event| normalize_event(calendar_id, name.as_deref(), event))
        .collect()
}
