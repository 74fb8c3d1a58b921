use std::sync::Arc;

use axum::{Extension, Router, routing::post};
use tower::ServiceBuilder;

use pubsub_transport::Notifier;

use crate::routes;
use crate::store::AccountStore;

/// Services shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AccountStore>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(store: Arc<dyn AccountStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/:account_id", post(routes::track_account))
        .layer(ServiceBuilder::new().layer(Extension(state)))
}
