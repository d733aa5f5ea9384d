//! Google sign-in and the authentication guard.
//!
//! Sign-in uses the authorization code flow with PKCE:
//!
//! ```text
//! GET /oauth2/authorization/google   state + verifier stored in session, redirect to Google
//! GET /login/oauth2/code/google      state checked, code exchanged, userinfo fetched
//! ```
//!
//! [`require_identity`] guards the contact routes and exposes the signed-in
//! user to handlers as [`CurrentIdentity`].

use axum::extract::{FromRequestParts, Query, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{Redirect, Response};
use contactmgr_providers::google::{PkceFlow, UserInfo, verify_state};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::AppError;
use crate::session::{Identity, PendingLogin, Session};
use crate::state::AppState;

/// The signed-in user, available to guarded handlers.
#[derive(Debug, Clone)]
pub struct CurrentIdentity {
    pub user: UserInfo,
    pub access_token: String,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentIdentity>()
            .cloned()
            .ok_or_else(|| AppError::unauthenticated("not signed in"))
    }
}

/// Rejects requests without a signed-in user.
///
/// An expired access token is refreshed first; if that fails the identity
/// is dropped and the user has to sign in again.
pub async fn require_identity(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(mut identity) = session.identity() else {
        warn!(path = %request.uri().path(), "Unauthenticated access to contacts");
        return Err(AppError::unauthenticated("sign-in required"));
    };

    if identity.tokens.is_expired() {
        if let Err(e) = state.oauth.refresh(&mut identity.tokens).await {
            warn!(subject = %identity.user.sub, "Access token refresh failed: {}", e);
            session.clear_identity();
            return Err(AppError::unauthenticated("session expired"));
        }
        session.update_tokens(identity.tokens.clone());
    }

    request.extensions_mut().insert(CurrentIdentity {
        user: identity.user,
        access_token: identity.tokens.access_token,
    });
    Ok(next.run(request).await)
}

/// Starts sign-in: stores the PKCE verifier and state, then redirects to
/// Google's consent page.
pub async fn authorize(State(state): State<AppState>, session: Session) -> Redirect {
    let flow = PkceFlow::new();
    session.begin_login(PendingLogin {
        state: flow.state.clone(),
        verifier: flow.verifier.clone(),
    });
    Redirect::to(&state.oauth.authorization_url(&flow))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Completes sign-in.
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect, AppError> {
    if let Some(error) = params.error {
        warn!("Google returned an authorization error: {}", error);
        return Err(AppError::SignIn(error));
    }

    let pending = session
        .take_pending_login()
        .ok_or_else(|| AppError::SignIn("no sign-in in progress".to_string()))?;

    verify_state(&pending.state, params.state.as_deref()).map_err(sign_in_failed)?;

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::SignIn("missing authorization code".to_string()))?;

    let tokens = state
        .oauth
        .exchange_code(&code, &pending.verifier)
        .await
        .map_err(sign_in_failed)?;
    let user = state
        .oauth
        .fetch_user_info(&tokens.access_token)
        .await
        .map_err(sign_in_failed)?;

    info!(subject = %user.sub, "User signed in");
    session.sign_in(Identity { user, tokens });
    Ok(Redirect::to("/contacts"))
}

/// Ends the session.
pub async fn logout(session: Session) -> Redirect {
    if let Some(identity) = session.identity() {
        info!(subject = %identity.user.sub, "User signed out");
    }
    session.destroy();
    Redirect::to("/")
}

fn sign_in_failed(err: contactmgr_providers::ProviderError) -> AppError {
    warn!("Sign-in failed: {}", err);
    AppError::SignIn(err.message().to_string())
}
