//! Header Hub API Server
//!
//! REST API for managing the configuration hierarchy (systems, modules,
//! policies, headers) and evaluating response headers for a user.

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let protected = Router::new()
        // Systems
        .route(
            "/systems",
            post(handlers::create_system).get(handlers::search_systems),
        )
        .route(
            "/systems/:id",
            get(handlers::get_system)
                .put(handlers::update_system)
                .delete(handlers::delete_system),
        )
        // Modules
        .route(
            "/modules",
            post(handlers::create_module).get(handlers::search_modules),
        )
        .route(
            "/modules/:id",
            get(handlers::get_module)
                .put(handlers::update_module)
                .delete(handlers::delete_module),
        )
        // Policies
        .route(
            "/policies",
            post(handlers::create_policy)
                .get(handlers::search_policies)
                .delete(handlers::delete_policies),
        )
        .route(
            "/policies/:id",
            get(handlers::get_policy)
                .put(handlers::update_policy)
                .delete(handlers::delete_policy),
        )
        // Headers + evaluation
        .route(
            "/headers",
            post(handlers::create_header).get(handlers::search_headers),
        )
        .route(
            "/headers/evaluate/:username",
            get(handlers::evaluate_headers),
        )
        .route(
            "/headers/:id",
            get(handlers::get_header)
                .put(handlers::update_header)
                .delete(handlers::delete_header),
        )
        // Users
        .route(
            "/users",
            post(handlers::create_user).get(handlers::search_users),
        )
        .route(
            "/users/:id",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        // LDAP configurations
        .route(
            "/ldap-configurations",
            post(handlers::create_ldap_configuration)
                .get(handlers::search_ldap_configurations),
        )
        .route(
            "/ldap-configurations/:id",
            get(handlers::get_ldap_configuration)
                .put(handlers::update_ldap_configuration)
                .delete(handlers::delete_ldap_configuration),
        )
        // LDAP attributes
        .route("/ldap-attributes", get(handlers::list_ldap_attributes))
        // Activity logs (append-only: search is the only operation)
        .route("/activity-logs", get(handlers::search_activity_logs))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/login", post(auth::login))
        .merge(protected)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
