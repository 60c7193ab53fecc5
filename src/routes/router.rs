use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::{
    Router,
    extract::{MatchedPath, Request},
    http::{Method, header},
    middleware,
    routing::{get, post, put},
};
use tower::{Layer, ServiceBuilder};
use tower_http::{
    cors::{self, CorsLayer},
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::TraceLayer,
};
use tracing::info_span;

use crate::core::error;
use crate::core::state::AppState;
use crate::routes::{admin, auth, user};
use crate::types::Role;
use crate::utils::auth::{Gate, RolePolicy, authorize};

/// The router with trailing slashes trimmed before routing, so `/api/user` and
/// `/api/user/` reach the same handler.
pub(crate) type App = NormalizePath<Router>;

pub(crate) fn routes(state: AppState, rate_limit_per_second: u64) -> App {
    // /auth/...
    let refresh_router = Router::new()
        .route("/refresh", post(auth::refresh))
        .route_layer(middleware::from_fn_with_state(
            Gate::refresh(state.codec.clone()),
            authorize,
        ));

    let auth_router = Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .merge(refresh_router);

    // /api/admin/...
    let admin_router = Router::new()
        .route("/", get(admin::list).post(admin::create))
        .route("/search", get(admin::search))
        .route(
            "/{id}",
            get(admin::get).put(admin::update).delete(admin::delete),
        )
        .route_layer(middleware::from_fn_with_state(
            Gate::access(state.codec.clone(), RolePolicy::new([Role::SuperAdmin])),
            authorize,
        ));

    // /api/user/...
    let user_router = Router::new()
        .route("/", get(user::list).post(user::create))
        .route("/search", get(user::search))
        .route(
            "/{id}",
            get(user::get).put(user::update).delete(user::delete),
        )
        .route("/{id}/block", post(user::block))
        .route("/{id}/unblock", post(user::unblock))
        .route_layer(middleware::from_fn_with_state(
            Gate::access(state.codec.clone(), RolePolicy::new([Role::Admin])),
            authorize,
        ));

    let router = Router::new()
        .route("/", get(|| async { "Back office is running" }))
        .nest("/auth", auth_router)
        .nest("/api/admin", admin_router)
        .nest("/api/user", user_router)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                        let matched_path = request
                            .extensions()
                            .get::<MatchedPath>()
                            .map(MatchedPath::as_str);

                        info_span!(
                            "request",
                            method = ?request.method(),
                            matched_path,
                        )
                    }),
                )
                .layer(HandleErrorLayer::new(error::handle_middleware_errors))
                .buffer(128)
                .rate_limit(rate_limit_per_second, Duration::from_secs(1))
                .layer(
                    CorsLayer::new()
                        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
                        .allow_origin(cors::Any),
                ),
        );

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
