pub mod calendar;
pub mod contacts;
pub mod events;
pub mod ingest;
pub mod watch;

use axum::http::StatusCode;

pub async fn health_check() -> StatusCode {
    StatusCode::OK
}
