//! HTTP routes.
//!
//! Request pipeline, outermost first:
//!
//! ```text
//! MethodOverride ─► TraceLayer ─► session_middleware ─► router
//!                                                        ├─ public pages, sign-in, logout
//!                                                        └─ require_identity ─► /contacts/**
//! ```

mod contacts;
mod pages;

use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, post};
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::method_override::MethodOverride;
use crate::session::session_middleware;
use crate::state::AppState;

/// Builds the router with all routes and middleware except method override.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/contacts", get(contacts::list))
        .route("/contacts/add", get(contacts::add_form).post(contacts::create))
        .route("/contacts/edit", post(contacts::update))
        .route("/contacts/edit/*resource_name", get(contacts::edit_form))
        .route("/contacts/people/:id", delete(contacts::delete))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_identity,
        ));

    Router::new()
        .route("/", get(pages::index))
        .route("/healthz", get(pages::healthz))
        .route("/contacts/login", get(pages::login))
        .route("/contacts/error", get(pages::error))
        .route("/oauth2/authorization/google", get(auth::authorize))
        .route("/login/oauth2/code/google", get(auth::callback))
        .route("/logout", post(auth::logout))
        .merge(protected)
        .layer(middleware::from_fn_with_state(
            state.sessions.clone(),
            session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The complete application service.
pub fn app(state: AppState) -> MethodOverride<Router> {
    MethodOverride::new(router(state))
}
