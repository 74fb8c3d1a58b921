//! HTTP handlers.

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use pubsub_core::{AccountId, Event};

use crate::app::AppState;
use crate::store::StoreError;

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub data: Option<String>,
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

pub fn json_data(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "data": message.into() }))).into_response()
}

/// `POST /{account_id}?data=...`
///
/// Active accounts have their event forwarded to the publisher in the
/// background; the response does not wait for the send.
pub async fn track_account(
    Extension(state): Extension<AppState>,
    Path(account_id): Path<String>,
    Query(query): Query<TrackQuery>,
) -> Response {
    let Some(data) = query.data.filter(|d| !d.is_empty()) else {
        return json_error(StatusCode::BAD_REQUEST, "Data not present");
    };

    let account = match state.store.get_account(&account_id) {
        Ok(account) => account,
        Err(err @ StoreError::NotFound) => return json_error(StatusCode::NOT_FOUND, err.to_string()),
        Err(err) => return json_error(StatusCode::BAD_REQUEST, err.to_string()),
    };

    if !account.is_active {
        debug!(account_id = %account_id, "ignoring inactive account");
        return json_data(StatusCode::OK, "Account not active");
    }

    let account_id = match AccountId::new(account_id) {
        Ok(id) => id,
        Err(err) => return json_error(StatusCode::BAD_REQUEST, err.to_string()),
    };
    let event = Event::now(account_id, data);
    let notifier = state.notifier.clone();
    tokio::spawn(async move {
        if let Err(err) = notifier.send_event(&event).await {
            warn!(account_id = %event.account_id(), error = %err, "failed to forward event");
        }
    });

    json_data(StatusCode::ACCEPTED, "Account accepted")
}
