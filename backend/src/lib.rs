//! Webhook adapters relaying between calendar, mail and chat providers and
//! the two contact stores (Airtable and HubSpot).

pub mod clients;
pub mod config;
pub mod contacts;
pub mod error;
pub mod events;
pub mod fields;
pub mod handlers;
pub mod ingest;
pub mod routes;
pub mod state;
pub mod watch;

use axum::{
    http::{header, Method},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes::api_routes;
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = build_cors_layer(state.config.cors_allowed_origins.as_deref());

    Router::new()
        .merge(api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Build CORS layer from the configured origin list.
///
/// Without a list (or with an empty one) any origin is allowed.
fn build_cors_layer(allowed_origins: Option<&str>) -> CorsLayer {
    match allowed_origins {
        Some(origins) => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                tracing::warn!("CORS_ALLOWED_ORIGINS is set but empty, using permissive CORS");
                CorsLayer::permissive()
            } else {
                tracing::info!("CORS configured for origins: {:?}", origins);
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::debug!("CORS_ALLOWED_ORIGINS not set, using permissive CORS");
            CorsLayer::permissive()
        }
    }
}
