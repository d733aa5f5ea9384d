//! HTTP method override.
//!
//! HTML forms can only submit GET and POST. A POST carrying a `_method`
//! form field (or an `X-HTTP-Method-Override` header) naming DELETE, PUT
//! or PATCH is dispatched to the router with that method instead.
//!
//! Routing happens before any router-level middleware runs, so this
//! service must wrap the whole [`Router`](axum::Router) rather than be
//! added with `Router::layer`.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, to_bytes};
use axum::extract::Request;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::{Layer, Service};
use tracing::{debug, warn};

/// Form field naming the method to dispatch as.
pub const METHOD_PARAM: &str = "_method";

/// Header naming the method to dispatch as.
pub const METHOD_HEADER: &str = "x-http-method-override";

/// Largest form body buffered while looking for the override field.
const MAX_FORM_BYTES: usize = 64 * 1024;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Wraps a service with [`MethodOverride`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodOverrideLayer;

impl<S> Layer<S> for MethodOverrideLayer {
    type Service = MethodOverride<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MethodOverride { inner }
    }
}

/// Rewrites overridden POST requests before handing them to `inner`.
#[derive(Debug, Clone)]
pub struct MethodOverride<S> {
    inner: S,
}

impl<S> MethodOverride<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S> Service<Request> for MethodOverride<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        // The readied service is moved into the future; a fresh clone stays.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            if request.method() != Method::POST {
                return inner.call(request).await;
            }

            let (mut parts, body) = request.into_parts();
            let mut target = parts
                .headers
                .get(METHOD_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(overridable);

            let body = if target.is_none() && is_form(&parts.headers) {
                let bytes = match to_bytes(body, MAX_FORM_BYTES).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!("Rejecting unreadable form body: {}", e);
                        return Ok(
                            (StatusCode::BAD_REQUEST, "unreadable form body").into_response()
                        );
                    }
                };
                target = form_method(&bytes);
                Body::from(bytes)
            } else {
                body
            };

            if let Some(method) = target {
                debug!(uri = %parts.uri, method = %method, "Method override");
                parts.method = method;
            }

            inner
                .call(axum::http::Request::from_parts(parts, body))
                .await
        })
    }
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with(FORM_CONTENT_TYPE))
}

fn form_method(body: &[u8]) -> Option<Method> {
    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == METHOD_PARAM)
        .and_then(|(_, value)| overridable(&value))
}

/// Only methods a form cannot express are accepted.
fn overridable(value: &str) -> Option<Method> {
    match value.trim().to_ascii_uppercase().as_str() {
        "DELETE" => Some(Method::DELETE),
        "PUT" => Some(Method::PUT),
        "PATCH" => Some(Method::PATCH),
        _ => None,
    }
}
