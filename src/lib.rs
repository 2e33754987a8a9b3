use axum::{Router, extract::FromRef, http::HeaderName};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Domain: entities, authorization, filtering and wire mapping.
pub mod auth;
pub mod filters;
pub mod models;
pub mod pagination;
pub mod password;
pub mod permissions;
pub mod search;
pub mod serializers;

// Infrastructure: persistence, configuration and errors.
pub mod config;
pub mod error;
pub mod extract;
pub mod memory;
pub mod repository;

// HTTP surface.
pub mod handlers;
pub mod routes;
use routes::{resources, tokens};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::ApiError;
pub use memory::MemoryStore;
pub use repository::{PostgresRepository, RepositoryState};
pub use search::{PostgresSearch, SearchState};

/// ApiDoc
///
/// OpenAPI document for every route, served at `/api-docs/openapi.json` and
/// browsable through the Swagger UI.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::api_root,
        handlers::blogposts::list_blogposts, handlers::blogposts::get_blogpost,
        handlers::blogposts::create_blogpost, handlers::blogposts::update_blogpost,
        handlers::blogposts::partial_update_blogpost, handlers::blogposts::delete_blogpost,
        handlers::comments::list_comments, handlers::comments::get_comment,
        handlers::comments::create_comment, handlers::comments::update_comment,
        handlers::comments::partial_update_comment, handlers::comments::delete_comment,
        handlers::users::list_users, handlers::users::get_user,
        handlers::tokens::obtain_token, handlers::tokens::refresh, handlers::tokens::verify,
    ),
    components(
        schemas(
            models::BlogpostInput, models::BlogpostResponse, models::CommentInput,
            models::CommentResponse, models::UserResponse, models::ApiRoot,
            models::ObtainTokenRequest, models::TokenRequest, models::TokenResponse,
        )
    ),
    tags(
        (name = "blogpost-api", description = "Blogposts, comments and JWT authentication")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// Shared, cheaply clonable container for the services every request needs.
#[derive(Clone)]
pub struct AppState {
    /// Persistence for users, blogposts and comments.
    pub repo: RepositoryState,
    /// Full-text search behind the `q` filter.
    pub search: SearchState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for SearchState {
    fn from_ref(app_state: &AppState) -> SearchState {
        app_state.search.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routes, the documentation and the observability layers, and
/// registers the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(tokens::token_routes())
        .merge(resources::resource_routes(&state.config.api_prefix))
        .with_state(state);

    // Request id is generated first so the trace span can record it.
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one request, correlated by its `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
