//! API routes
//!
//! Everything except `/` lives under the configured prefix (`/api/v1`).
//! Register/login are rate limited; subscription, stats, integration and
//! scan routes require a bearer JWT.

pub mod analytics;
pub mod auth;
pub mod google;
pub mod health;
pub mod integrations;
pub mod subscriptions;

use axum::routing::{get, patch, post, put};
use axum::{Router, middleware};
use http::{HeaderName, HeaderValue, Method};
use shared::error::AppError;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::rate_limit::{login_rate_limit, register_rate_limit};
use crate::auth::user_auth::user_auth_middleware;
use crate::config::Config;
use crate::state::AppState;

pub type ApiResult<T> = Result<axum::Json<T>, AppError>;

const REQUEST_ID: &str = "x-request-id";

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Versioned API routes (no prefix, no layers)
fn api_routes(state: &AppState) -> Router<AppState> {
    let register = Router::new()
        .route("/auth/register", post(auth::register))
        .layer(middleware::from_fn_with_state(state.clone(), register_rate_limit));

    let login = Router::new()
        .route("/auth/login", post(auth::login))
        .layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));

    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/auth/google/login", get(google::login))
        .route("/auth/google/callback", get(google::callback));

    let protected = Router::new()
        .route("/auth/me", put(auth::update_me))
        .route("/auth/google/scan", get(google::scan))
        .route("/auth/connections", get(google::connections))
        .route(
            "/subscriptions",
            get(subscriptions::list).post(subscriptions::create),
        )
        .route("/subscriptions/{id}", patch(subscriptions::update))
        .route("/stats", get(analytics::get_stats))
        .route("/integrations/connect", post(integrations::connect))
        .route("/integrations/analyze", post(integrations::analyze))
        .layer(middleware::from_fn_with_state(state.clone(), user_auth_middleware));

    Router::new()
        .merge(public)
        .merge(register)
        .merge(login)
        .merge(protected)
}

/// `*` in the origin list allows any origin, without credentials
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE]);

    if origins.iter().any(|o| o.trim() == "*") {
        return layer.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}

/// Build the application router with middleware and state
pub fn create_router(state: AppState, config: &Config) -> Router {
    let prefix = config.api_prefix.trim_end_matches('/');
    let api = api_routes(&state);

    let router = Router::new().route("/", get(health::root));
    let router = if prefix.is_empty() {
        router.merge(api)
    } else {
        router.nest(prefix, api)
    };

    // Outermost first: request id, trace, CORS
    router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    HeaderName::from_static(REQUEST_ID),
                    XRequestId,
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(REQUEST_ID)))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.cors_origins)),
        )
        .with_state(state)
}
