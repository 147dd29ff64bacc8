//! Types shared between the webhook backend and the watch renewal runner.

pub mod api;
pub mod calendar;
pub mod models;
pub mod phone;

pub use models::{
    Attendee, CalendarEvent, CalendarEventList, ContactRecord, ContactSource, Direction,
    EventTime, ResourceState,
};
