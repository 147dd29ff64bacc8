mod support;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{NaiveDate, Utc};
use serde_json::json;
use shared::{CalendarEvent, EventTime};
use support::{test_config, FakeCalendar, FakeCrm, FakeRecordStore, TestApp};

fn app_with_calendar(calendar: FakeCalendar) -> TestApp {
    TestApp::new(
        test_config(),
        FakeRecordStore::default(),
        FakeCrm::default(),
        calendar,
    )
}

#[tokio::test]
async fn test_calendar_renewal_registers_web_hook_channel() {
    let app = app_with_calendar(FakeCalendar::default());
    let (status, body) = app.post_json("/watch/calendar/renew", json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Calendar watch renewal successful");
    assert_eq!(body["resourceId"], "resource-1");
    assert_eq!(body["expiration"], "2024-05-08T12:00:00.000Z");
    assert!(body["watchId"]
        .as_str()
        .unwrap_or_default()
        .starts_with("calendar-watch-"));

    let watched = app.calendar.watched.lock().unwrap();
    assert_eq!(watched.len(), 1);
    let (calendar_id, channel) = &watched[0];
    assert_eq!(calendar_id, "primary");
    assert_eq!(channel.address, "https://relay.example.com/webhooks/calendar");
    assert_eq!(channel.ttl_secs, 604_800);
    assert!(app.calendar.stopped.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_calendar_renewal_without_body() {
    let app = app_with_calendar(FakeCalendar::default());
    let (status, _) = app
        .send_json(Request::post("/watch/calendar/renew").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.calendar.watched.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_calendar_renewal_stops_previous_channel() {
    let app = app_with_calendar(FakeCalendar::default());
    let (status, _) = app
        .post_json(
            "/watch/calendar/renew",
            json!({"previousChannelId": "calendar-watch-old", "previousResourceId": "res-old"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        app.calendar.stopped.lock().unwrap().as_slice(),
        [("calendar-watch-old".to_string(), "res-old".to_string())]
    );
    assert_eq!(app.calendar.watched.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_stop_does_not_block_renewal() {
    let app = app_with_calendar(FakeCalendar {
        fail_stop: true,
        ..FakeCalendar::default()
    });
    let (status, _) = app
        .post_json(
            "/watch/calendar/renew",
            json!({"previousChannelId": "gone", "previousResourceId": "gone"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.calendar.watched.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_half_previous_channel_is_rejected() {
    let app = app_with_calendar(FakeCalendar::default());
    let (status, _) = app
        .post_json("/watch/calendar/renew", json!({"previousChannelId": "only"}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.calendar.watched.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_gmail_renewal_watches_inbox_topic() {
    let app = app_with_calendar(FakeCalendar::default());
    let (status, body) = app
        .post_json("/watch/gmail/renew", json!({"cancelExisting": true}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Gmail watch renewal successful");
    assert_eq!(body["historyId"], "4242");
    assert_eq!(body["expiration"], "Not provided");

    assert_eq!(*app.mailbox.stops.lock().unwrap(), 1);
    let watched = app.mailbox.watched.lock().unwrap();
    assert_eq!(
        watched[0],
        (
            "projects/relay-123/topics/gmail-email-notifications".to_string(),
            vec!["INBOX".to_string()]
        )
    );
}

#[tokio::test]
async fn test_fetch_events_requires_resource_id() {
    let app = app_with_calendar(FakeCalendar::default());
    let (status, body) = app.post_json("/calendar/events", json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing resourceId in request");
    assert!(app.calendar.listed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_events_normalizes_window() {
    let all_day = CalendarEvent {
        id: Some("offsite".to_string()),
        start: Some(EventTime {
            date: NaiveDate::from_ymd_opt(2024, 5, 1),
            ..EventTime::default()
        }),
        ..CalendarEvent::default()
    };
    let app = app_with_calendar(FakeCalendar {
        events: vec![all_day],
        ..FakeCalendar::default()
    });

    let (status, body) = app
        .post_json(
            "/calendar/events",
            json!({"resourceId": "res-9", "calendarId": "team@example.com"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resourceId"], "res-9");
    assert_eq!(body["calendarId"], "team@example.com");
    let event = &body["events"][0];
    assert_eq!(event["summary"], "Untitled Event");
    assert_eq!(event["google_meeting_id"], "offsite");
    assert_eq!(event["meeting_date"], "2024-05-01");
    assert_eq!(event["calendar"]["name"], "Google Calendar");

    let listed = app.calendar.listed.lock().unwrap();
    let (calendar_id, window) = &listed[0];
    assert_eq!(calendar_id, "team@example.com");
    assert!(window.time_min < Utc::now() && Utc::now() < window.time_max);
    assert_eq!((window.time_max - window.time_min).num_hours(), 48);
}
