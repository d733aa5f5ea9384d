//! Contact pages and form handlers.
//!
//! Form handlers always answer with a redirect to `/contacts` and leave
//! the outcome in a flash message. An expired or revoked token signs the
//! user out instead.

use std::collections::HashMap;

use axum::Form;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use contactmgr_core::{ContactEditRequest, ContactError, ContactErrorKind, NewContactRequest};

use crate::auth::CurrentIdentity;
use crate::contacts::UpdateOutcome;
use crate::error::AppError;
use crate::session::{Flash, Session};
use crate::state::AppState;
use crate::views;

const CONTACTS_PATH: &str = "/contacts";

/// Drops the identity when the provider rejected the access token.
fn sign_out_if_rejected(session: &Session, err: &ContactError) -> bool {
    if err.is_unauthenticated() {
        session.clear_identity();
        true
    } else {
        false
    }
}

/// Redirects to the list with `flash`, or to login if the token was rejected.
fn back_to_list(session: &Session, outcome: Result<Flash, ContactError>) -> Response {
    let flash = match outcome {
        Ok(flash) => flash,
        Err(err) if sign_out_if_rejected(session, &err) => {
            return AppError::from(err).into_response();
        }
        Err(err) => Flash::error(err.message().to_string()),
    };
    session.flash(flash);
    Redirect::to(CONTACTS_PATH).into_response()
}

pub async fn list(
    State(state): State<AppState>,
    session: Session,
    identity: CurrentIdentity,
) -> Result<Response, AppError> {
    match state.contacts.list(&identity.access_token).await {
        Ok(contacts) => {
            let flash = session.take_flash();
            let page = views::contacts_page(&identity.user, &contacts, flash.as_ref());
            Ok(Html(page).into_response())
        }
        Err(err) if sign_out_if_rejected(&session, &err) => Err(err.into()),
        Err(err) => {
            let (status, message) = match err.kind() {
                ContactErrorKind::Transport => {
                    (StatusCode::SERVICE_UNAVAILABLE, views::UNAVAILABLE)
                }
                _ => (StatusCode::BAD_GATEWAY, views::LIST_FAILED),
            };
            Ok((status, Html(views::error_page(message))).into_response())
        }
    }
}

pub async fn add_form() -> Html<String> {
    Html(views::add_page())
}

pub async fn create(
    State(state): State<AppState>,
    session: Session,
    identity: CurrentIdentity,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let request = NewContactRequest::from_form(&form);
    let outcome = state
        .contacts
        .create(&identity.access_token, &request)
        .await
        .map(|_| Flash::success("Contact created successfully"))
        .map_err(|e| prefixed("Failed to create contact", e));
    back_to_list(&session, outcome)
}

pub async fn edit_form(
    State(state): State<AppState>,
    session: Session,
    identity: CurrentIdentity,
    Path(resource_name): Path<String>,
) -> Response {
    let resource_name = resource_name.trim_start_matches('/');
    match state
        .contacts
        .fetch_for_edit(&identity.access_token, resource_name)
        .await
    {
        Ok(contact) => Html(views::edit_page(&contact)).into_response(),
        Err(err) => {
            let message = match err.kind() {
                ContactErrorKind::NotFound => "Contact not found",
                _ => "Failed to load contact details",
            };
            let err = ContactError::new(err.kind(), message);
            back_to_list(&session, Err(err))
        }
    }
}

pub async fn update(
    State(state): State<AppState>,
    session: Session,
    identity: CurrentIdentity,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let outcome = match ContactEditRequest::from_form(&form) {
        Ok(edits) => state
            .contacts
            .update(&identity.access_token, &edits)
            .await
            // An unchanged contact is reported like a saved one.
            .map(|_: UpdateOutcome| Flash::success("Contact updated successfully")),
        Err(err) => Err(err),
    };
    let outcome = outcome.map_err(|e| prefixed("Failed to update contact", e));
    back_to_list(&session, outcome)
}

pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    identity: CurrentIdentity,
    Path(person_id): Path<String>,
) -> Response {
    let outcome = state
        .contacts
        .delete(&identity.access_token, &person_id)
        .await
        .map(|()| Flash::success("Contact deleted successfully"))
        .map_err(|e| ContactError::new(e.kind(), "Failed to delete contact"));
    back_to_list(&session, outcome)
}

fn prefixed(prefix: &str, err: ContactError) -> ContactError {
    ContactError::new(err.kind(), format!("{}: {}", prefix, err.message()))
}
