//! movie-api library - movie CRUD HTTP service

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    Router,
};
use movie_common::api::{AccessTokenConverter, Authorizer};
use movie_common::moviestore::Datastore;
use movie_common::random::StringGenerator;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;

/// Default maximum request body, bytes
pub const DEFAULT_REQUEST_BODY_LIMIT: usize = 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub datastore: Arc<dyn Datastore>,
    /// Source of external IDs
    pub string_generator: Arc<dyn StringGenerator>,
    pub token_converter: Arc<dyn AccessTokenConverter>,
    pub authorizer: Arc<dyn Authorizer>,
    /// Cancelled on shutdown; request tokens are its children
    pub shutdown: CancellationToken,
    pub request_body_limit: usize,
}

impl AppState {
    /// Create new application state
    pub fn new(
        datastore: Arc<dyn Datastore>,
        string_generator: Arc<dyn StringGenerator>,
        token_converter: Arc<dyn AccessTokenConverter>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        Self {
            datastore,
            string_generator,
            token_converter,
            authorizer,
            shutdown: CancellationToken::new(),
            request_body_limit: DEFAULT_REQUEST_BODY_LIMIT,
        }
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn with_request_body_limit(mut self, limit: usize) -> Self {
        self.request_body_limit = limit;
        self
    }
}

/// Build application router
///
/// `/api/v1` routes require a bearer token; `/health` does not.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    // Protected routes (require authentication)
    let protected = Router::new()
        .route(
            "/api/v1/movies",
            post(api::create_movie).get(api::find_all_movies),
        )
        .route(
            "/api/v1/movies/:extl_id",
            get(api::find_movie_by_id)
                .put(api::update_movie)
                .delete(api::delete_movie),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::access_token_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new().merge(api::health_routes());

    // Outermost first: assign the request ID before the trace span reads it
    let http_layers = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http().make_span_with(api::make_request_span))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(DefaultBodyLimit::max(state.request_body_limit))
        .layer(http_layers)
        .with_state(state)
}
