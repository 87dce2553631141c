//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::Config;
use crate::kernel::ServerDeps;
use crate::server::routes::{
    health_handler, me_handler, request_passcode_handler, verify_passcode_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub server_deps: Arc<ServerDeps>,
}

/// Router options that live outside the auth core
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// CORS origins; empty allows any origin.
    pub allowed_origins: Vec<String>,
    /// Per-IP limit on `/auth`. Requires serving with
    /// `into_make_service_with_connect_info::<SocketAddr>()`.
    pub rate_limit_enabled: bool,
}

impl From<&Config> for AppOptions {
    fn from(config: &Config) -> Self {
        Self {
            allowed_origins: config.allowed_origins.clone(),
            rate_limit_enabled: config.rate_limit_enabled,
        }
    }
}

/// Build the Axum application router
pub fn build_app(server_deps: Arc<ServerDeps>, options: AppOptions) -> Router {
    let app_state = AxumAppState { server_deps };

    let mut auth_routes = Router::new()
        .route("/request-passcode", post(request_passcode_handler))
        .route("/verify-passcode", post(verify_passcode_handler))
        .route("/me", get(me_handler));

    if options.rate_limit_enabled {
        // 10 requests per second per IP with bursts of 20; slows down passcode guessing
        match GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .use_headers()
            .finish()
        {
            Some(config) => {
                auth_routes = auth_routes.layer(GovernorLayer {
                    config: Arc::new(config),
                });
            }
            None => warn!("Invalid rate limiter settings; /auth is not rate limited"),
        }
    }

    Router::new()
        .nest("/auth", auth_routes)
        // Health check (no rate limit)
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(Extension(app_state))
        .layer(cors_layer(&options.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
}
