use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_user_auth,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{auth, games, group_requests, groups, health, participations, password_reset};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    /// Keys parsed once at startup.
    pub jwt: Arc<JwtConfig>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Result<Self, JwtError> {
        let jwt = JwtConfig::from_rsa_pem(
            &config.jwt.private_key,
            &config.jwt.public_key,
            config.jwt.access_token_expiry_secs,
            config.jwt.refresh_token_expiry_secs,
            config.jwt.leeway_secs,
        )?;

        // None when rate_limit_per_minute is 0
        let rate_limiter = RateLimiterState::new(config.security.rate_limit_per_minute).map(Arc::new);

        Ok(Self {
            pool,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            rate_limiter,
        })
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

pub fn create_app(config: Config, pool: PgPool) -> Result<Router, JwtError> {
    let state = AppState::new(config, pool)?;
    let config = state.config.clone();

    // Bearer-token routes under /api/v1.
    // Middleware order: auth runs first, then rate limiting (keyed by user).
    let protected_routes = Router::new()
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me))
        // Groups
        .route(
            "/api/v1/groups",
            get(groups::list_groups).post(groups::create_group),
        )
        .route(
            "/api/v1/groups/:slug",
            get(groups::get_group)
                .put(groups::update_group)
                .delete(groups::delete_group),
        )
        .route("/api/v1/groups/:slug/join_request", post(groups::join_request))
        .route("/api/v1/groups/:slug/promote/:user_id", post(groups::promote))
        .route("/api/v1/groups/:slug/demote/:user_id", post(groups::demote))
        .route(
            "/api/v1/groups/:slug/remove/:user_id",
            post(groups::remove_member),
        )
        .route("/api/v1/groups/:slug/leave", post(groups::leave))
        // Join requests
        .route(
            "/api/v1/group-requests",
            get(group_requests::list_requests).post(group_requests::create_request),
        )
        .route(
            "/api/v1/group-requests/:id",
            get(group_requests::get_request).delete(group_requests::reject_request),
        )
        .route(
            "/api/v1/group-requests/:id/accept",
            post(group_requests::accept_request),
        )
        // Games
        .route(
            "/api/v1/games",
            get(games::list_games).post(games::create_game),
        )
        .route(
            "/api/v1/games/:id",
            get(games::get_game)
                .put(games::update_game)
                .delete(games::delete_game),
        )
        .route(
            "/api/v1/games/:id/add_participation",
            post(games::add_participation),
        )
        .route(
            "/api/v1/games/:id/remove_participation",
            post(games::remove_participation),
        )
        // Participations
        .route(
            "/api/v1/participations",
            get(participations::list_participations).post(participations::create_participation),
        )
        .route(
            "/api/v1/participations/:id",
            get(participations::get_participation)
                .put(participations::update_participation)
                .delete(participations::delete_participation),
        )
        // Rate limiting runs after auth (needs the user id)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        // Auth runs first (outermost layer = runs first)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/v1/auth/signup", post(auth::signup))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/password-reset", post(password_reset::request_reset))
        .route(
            "/api/v1/password-reset/confirm",
            post(password_reset::confirm_reset),
        )
        .route("/api/v1/health", get(health::health_check))
        .route("/api/v1/health/ready", get(health::ready))
        .route("/api/v1/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Ok(Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config))
        .with_state(state))
}
