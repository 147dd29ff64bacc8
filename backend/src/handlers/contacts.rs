use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Map, Value};
use shared::api::{ContactsQuery, CrmSearchQuery};
use shared::ContactSource;

use crate::contacts::{
    self, render, ContactAction, ContactMatcher, ContactMatches, ContactView, EmailMatcher,
};
use crate::error::{ApiError, ApiResult};
use crate::events::fetch_window_events;
use crate::fields::{self, crm};
use crate::state::AppState;

fn required<'a>(value: &'a Option<String>, message: &str) -> ApiResult<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(message))
}

fn contact_key(query: &ContactsQuery) -> ApiResult<&str> {
    required(&query.contact, "Missing contact parameter")
}

async fn lookup(state: &AppState, key: &str) -> ApiResult<ContactMatches> {
    let records = state.records()?;
    let crm_client = state.crm()?;
    contacts::find_matches(
        records.as_ref(),
        crm_client.as_ref(),
        state.matcher.as_ref(),
        key,
    )
    .await
}

async fn build_view(state: &AppState, query: &ContactsQuery) -> ApiResult<ContactView> {
    let key = contact_key(query)?;
    let matches = lookup(state, key).await?;
    let mut view = ContactView::new(key, &matches);

    if query.meetings.unwrap_or(false) {
        let calendar = state.calendar()?;
        let emails = matches.emails();
        let events =
            fetch_window_events(calendar.as_ref(), &state.config.calendar_id, Utc::now()).await?;
        view.meetings = Some(
            events
                .into_iter()
                .filter(|event| event.has_attendee(&emails))
                .collect(),
        );
    }

    Ok(view)
}

async fn run_action(
    state: &AppState,
    query: &ContactsQuery,
    action: ContactAction,
) -> ApiResult<Response> {
    tracing::info!("Contact action {:?}", action);
    let response = match action {
        ContactAction::Delete => {
            let source = query
                .source
                .as_deref()
                .and_then(ContactSource::parse)
                .ok_or_else(|| ApiError::bad_request("Missing or unknown source parameter"))?;
            let record_id = required(&query.record_id, "Missing recordId parameter")?;
            let records = state.records()?;
            let crm_client = state.crm()?;
            Json(
                contacts::delete_record(records.as_ref(), crm_client.as_ref(), source, record_id)
                    .await?,
            )
            .into_response()
        }
        ContactAction::Merge => {
            let ids = contacts::parse_record_ids(query.records.as_deref().unwrap_or(""));
            let (primary, merged) = contacts::merge_pair(&ids)?;
            let crm_client = state.crm()?;
            Json(contacts::merge_records(crm_client.as_ref(), primary, merged).await?)
                .into_response()
        }
        ContactAction::SyncHubspotId => {
            let matches = lookup(state, contact_key(query)?).await?;
            let records = state.records()?;
            Json(contacts::sync_hubspot_id(records.as_ref(), &state.config, &matches).await?)
                .into_response()
        }
        ContactAction::SyncAirtableId => {
            let matches = lookup(state, contact_key(query)?).await?;
            let crm_client = state.crm()?;
            Json(contacts::sync_airtable_id(crm_client.as_ref(), &matches).await?)
                .into_response()
        }
    };
    Ok(response)
}

/// Reconciliation view for one contact, or one of its side-actions.
///
/// The view renders HTML unless `format=json`; actions always answer JSON.
pub async fn contact_records(
    State(state): State<AppState>,
    Query(query): Query<ContactsQuery>,
) -> Response {
    if let Some(action) = query.action.as_deref().filter(|a| !a.is_empty()) {
        let result = match ContactAction::parse(action) {
            Ok(action) => run_action(&state, &query, action).await,
            Err(e) => Err(e),
        };
        return result.into_response();
    }

    let as_json = query.format.as_deref() == Some("json");
    match build_view(&state, &query).await {
        Ok(view) if as_json => Json(view).into_response(),
        Ok(view) => Html(render::render_view(&view)).into_response(),
        Err(e) if as_json => e.into_response(),
        Err(e) => {
            e.log();
            (e.status(), Html(render::render_error(&e.to_body()))).into_response()
        }
    }
}

/// Find the CRM contact for an email and report its id, profile URL and
/// every address it holds.
pub async fn hubspot_search(
    State(state): State<AppState>,
    Query(query): Query<CrmSearchQuery>,
) -> ApiResult<Json<Value>> {
    let (Some(record_id), Some(email)) = (
        query.record_id.as_deref().filter(|v| !v.trim().is_empty()),
        query.email.as_deref().filter(|v| !v.trim().is_empty()),
    ) else {
        return Err(ApiError::bad_request(
            "Email and recordId parameters are required",
        ));
    };
    tracing::info!("Looking up CRM contact for record {}", record_id);

    let crm_client = state.crm()?;
    let found = crm_client
        .search(&EmailMatcher.crm_filters(email), &[crm::EMAIL])
        .await?;
    let first = found
        .first()
        .ok_or_else(|| ApiError::not_found("No matching HubSpot contact found"))?;

    let contact = crm_client
        .get(&first.id, &[crm::EMAIL, crm::ADDITIONAL_EMAILS])
        .await?;
    let mut all_emails: Vec<String> = contact.field_text(crm::EMAIL).into_iter().collect();
    if let Some(additional) = contact.field_text(crm::ADDITIONAL_EMAILS) {
        all_emails.extend(
            additional
                .split(';')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(String::from),
        );
    }

    let mut linked = Map::new();
    linked.insert(fields::HUBSPOT_ID.to_string(), json!(first.id));
    if let Some(url) = state.config.hubspot_contact_url(&first.id) {
        linked.insert(fields::HUBSPOT_URL.to_string(), json!(url));
    }
    linked.insert("allEmails".to_string(), json!(all_emails.join(", ")));

    Ok(Json(json!({ "fields": linked })))
}
