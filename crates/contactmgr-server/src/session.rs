//! Server-side sessions.
//!
//! A session is identified by a random id carried in the
//! `CONTACTMGR_SESSION` cookie; its data never leaves the process.
//!
//! [`session_middleware`] loads the session before the handler runs and
//! hands it a [`Session`] handle through the request extensions. After the
//! handler returns, changed data is written back and the cookie is set,
//! rotated or expired as needed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use contactmgr_providers::google::{TokenInfo, UserInfo, random_token};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::AppError;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "CONTACTMGR_SESSION";

/// Bytes of entropy in a session id.
const SESSION_ID_BYTES: usize = 32;

/// The signed-in user and their OAuth tokens.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user: UserInfo,
    pub tokens: TokenInfo,
}

/// Sign-in started but not yet completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLogin {
    pub state: String,
    pub verifier: String,
}

/// A one-shot message shown on the next page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flash {
    Success(String),
    Error(String),
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self::Success(message.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success(m) | Self::Error(m) => m,
        }
    }
}

/// Everything stored for one session.
#[derive(Debug, Clone, Default)]
pub struct SessionData {
    pub identity: Option<Identity>,
    pub pending_login: Option<PendingLogin>,
    pub flash: Option<Flash>,
}

impl SessionData {
    fn is_empty(&self) -> bool {
        self.identity.is_none() && self.pending_login.is_none() && self.flash.is_none()
    }
}

#[derive(Debug)]
struct Entry {
    data: SessionData,
    expires_at: Instant,
}

/// In-memory session store with idle expiry.
#[derive(Debug, Clone)]
pub struct SessionStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    ttl: Duration,
    secure_cookies: bool,
}

impl SessionStore {
    /// Creates a store whose sessions expire after `ttl` without use.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::default(),
            ttl,
            secure_cookies: false,
        }
    }

    /// Adds the `Secure` attribute to issued cookies.
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Loads a live session and extends its expiry.
    ///
    /// Expired sessions found along the way are dropped.
    pub async fn load(&self, id: &str) -> Option<SessionData> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        let entry = entries.get_mut(id)?;
        entry.expires_at = now + self.ttl;
        Some(entry.data.clone())
    }

    /// Stores `data` under a fresh id and returns the id.
    pub async fn insert(&self, data: SessionData) -> String {
        let id = random_token(SESSION_ID_BYTES);
        self.save(&id, data).await;
        id
    }

    /// Stores `data` under `id`.
    pub async fn save(&self, id: &str, data: SessionData) {
        let entry = Entry {
            data,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.write().await.insert(id.to_string(), entry);
    }

    /// Replaces the data of a live session.
    ///
    /// Returns false, storing nothing, if `id` was removed in the meantime.
    pub async fn update_existing(&self, id: &str, data: SessionData) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(id) {
            Some(entry) => {
                entry.data = data;
                entry.expires_at = Instant::now() + self.ttl;
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, id: &str) {
        self.entries.write().await.remove(id);
    }

    /// Number of stored sessions, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// `Set-Cookie` value carrying `id`.
    pub fn cookie(&self, id: &str) -> String {
        let mut cookie = format!(
            "{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.ttl.as_secs()
        );
        if self.secure_cookies {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value that deletes the cookie.
    pub fn expired_cookie(&self) -> String {
        let mut cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
        if self.secure_cookies {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Returns the value of cookie `name` from the request headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Default)]
struct SessionState {
    id: Option<String>,
    data: SessionData,
    dirty: bool,
    rotate: bool,
    destroyed: bool,
}

/// Per-request handle on the current session.
///
/// Cloning shares the same state; the middleware persists it after the
/// handler returns.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    fn new(id: Option<String>, data: SessionData) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                id,
                data,
                ..Default::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn modify(&self, f: impl FnOnce(&mut SessionData)) {
        let mut state = self.lock();
        f(&mut state.data);
        state.dirty = true;
    }

    pub fn identity(&self) -> Option<Identity> {
        self.lock().data.identity.clone()
    }

    /// Stores the signed-in identity and issues a new session id.
    pub fn sign_in(&self, identity: Identity) {
        let mut state = self.lock();
        state.data.identity = Some(identity);
        state.data.pending_login = None;
        state.dirty = true;
        state.rotate = true;
    }

    /// Replaces the stored tokens after a refresh.
    pub fn update_tokens(&self, tokens: TokenInfo) {
        self.modify(|data| {
            if let Some(identity) = data.identity.as_mut() {
                identity.tokens = tokens;
            }
        });
    }

    pub fn clear_identity(&self) {
        self.modify(|data| data.identity = None);
    }

    pub fn begin_login(&self, pending: PendingLogin) {
        self.modify(|data| data.pending_login = Some(pending));
    }

    pub fn take_pending_login(&self) -> Option<PendingLogin> {
        let mut state = self.lock();
        let pending = state.data.pending_login.take();
        if pending.is_some() {
            state.dirty = true;
        }
        pending
    }

    /// Queues a message for the next rendered page.
    pub fn flash(&self, flash: Flash) {
        self.modify(|data| data.flash = Some(flash));
    }

    pub fn take_flash(&self) -> Option<Flash> {
        let mut state = self.lock();
        let flash = state.data.flash.take();
        if flash.is_some() {
            state.dirty = true;
        }
        flash
    }

    /// Drops the session and expires the cookie.
    pub fn destroy(&self) {
        let mut state = self.lock();
        state.data = SessionData::default();
        state.destroyed = true;
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::unauthenticated("session middleware is not installed"))
    }
}

/// Loads the session for the request and persists it afterwards.
pub async fn session_middleware(
    State(store): State<SessionStore>,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie_id = cookie_value(request.headers(), SESSION_COOKIE);
    let (id, data) = match cookie_id {
        Some(id) => match store.load(&id).await {
            Some(data) => (Some(id), data),
            None => {
                debug!("session cookie refers to an unknown or expired session");
                (None, SessionData::default())
            }
        },
        None => (None, SessionData::default()),
    };
    let had_stale_cookie = request.headers().contains_key(COOKIE) && id.is_none();

    let session = Session::new(id, data);
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    let state = std::mem::take(&mut *session.lock());
    let set_cookie = persist(&store, state, had_stale_cookie).await;

    if let Some(cookie) = set_cookie {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => warn!("invalid session cookie header: {}", e),
        }
    }

    response
}

/// Writes the session back and returns the cookie to set, if any.
async fn persist(store: &SessionStore, state: SessionState, stale_cookie: bool) -> Option<String> {
    if state.destroyed {
        if let Some(id) = state.id {
            store.remove(&id).await;
        }
        return Some(store.expired_cookie());
    }

    if !state.dirty {
        return None;
    }

    match state.id {
        Some(id) if state.data.is_empty() => {
            store.remove(&id).await;
            Some(store.expired_cookie())
        }
        Some(id) if state.rotate => {
            store.remove(&id).await;
            let new_id = store.insert(state.data).await;
            Some(store.cookie(&new_id))
        }
        Some(id) => {
            if !store.update_existing(&id, state.data).await {
                debug!("session ended while the request was running, not saving");
            }
            None
        }
        None if state.data.is_empty() => stale_cookie.then(|| store.expired_cookie()),
        None => {
            let new_id = store.insert(state.data).await;
            Some(store.cookie(&new_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use axum::routing::get;
    use axum::{Router, middleware};
    use tower::ServiceExt;

    fn store() -> SessionStore {
        SessionStore::new(Duration::from_secs(60))
    }

    fn app(store: SessionStore) -> Router {
        Router::new()
            .route(
                "/flash",
                get(|session: Session| async move {
                    session.flash(Flash::success("saved"));
                    "ok"
                }),
            )
            .route(
                "/read",
                get(|session: Session| async move {
                    session
                        .take_flash()
                        .map(|f| f.message().to_string())
                        .unwrap_or_default()
                }),
            )
            .route(
                "/logout",
                get(|session: Session| async move {
                    session.destroy();
                    "bye"
                }),
            )
            .route("/noop", get(|| async { "noop" }))
            .layer(middleware::from_fn_with_state(store, session_middleware))
    }

    fn session_id(response: &Response) -> Option<String> {
        let header = response.headers().get(SET_COOKIE)?.to_str().ok()?;
        let value = header.split(';').next()?.split_once('=')?.1;
        Some(value.to_string())
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get_with_cookie(uri: &str, id: &str) -> Request {
        HttpRequest::builder()
            .uri(uri)
            .header(COOKIE, format!("theme=dark; {SESSION_COOKIE}={id}"))
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("a=1; CONTACTMGR_SESSION=abc ; b=2"));
        assert_eq!(cookie_value(&headers, SESSION_COOKIE).as_deref(), Some("abc"));
        assert_eq!(cookie_value(&headers, "b").as_deref(), Some("2"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn cookie_attributes() {
        let store = store().with_secure_cookies(true);
        let cookie = store.cookie("abc");
        assert!(cookie.starts_with("CONTACTMGR_SESSION=abc; Path=/; HttpOnly; SameSite=Lax"));
        assert!(cookie.contains("Max-Age=60"));
        assert!(cookie.ends_with("; Secure"));
        assert!(store.expired_cookie().contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn store_expires_sessions() {
        let store = SessionStore::new(Duration::from_millis(20));
        let id = store.insert(SessionData {
            flash: Some(Flash::error("x")),
            ..Default::default()
        })
        .await;
        assert!(store.load(&id).await.is_some());
        assert_eq!(id.len(), 43);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(store.load(&id).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn untouched_session_sets_no_cookie() {
        let store = store();
        let response = app(store.clone())
            .oneshot(HttpRequest::builder().uri("/noop").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().get(SET_COOKIE).is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn flash_survives_one_redirect() {
        let store = store();

        let response = app(store.clone())
            .oneshot(HttpRequest::builder().uri("/flash").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let id = session_id(&response).unwrap();

        let response = app(store.clone())
            .oneshot(get_with_cookie("/read", &id))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        // The emptied session is dropped.
        assert!(session_id(&response).is_some_and(|v| v.is_empty()));
        assert_eq!(body_text(response).await, "saved");

        let response = app(store.clone())
            .oneshot(get_with_cookie("/read", &id))
            .await
            .unwrap();
        assert_eq!(body_text(response).await, "");
    }

    #[tokio::test]
    async fn destroy_expires_cookie() {
        let store = store();
        let id = store
            .insert(SessionData {
                flash: Some(Flash::success("x")),
                ..Default::default()
            })
            .await;

        let response = app(store.clone())
            .oneshot(get_with_cookie("/logout", &id))
            .await
            .unwrap();
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cookie.contains("Max-Age=0"));
        assert!(store.load(&id).await.is_none());
    }

    #[tokio::test]
    async fn logout_is_not_undone_by_a_running_request() {
        let store = store();
        let id = store
            .insert(SessionData {
                flash: Some(Flash::success("x")),
                ..Default::default()
            })
            .await;

        let started = Arc::new(tokio::sync::Notify::new());
        let release = Arc::new(tokio::sync::Notify::new());
        let slow = {
            let started = started.clone();
            let release = release.clone();
            move |session: Session| {
                let started = started.clone();
                let release = release.clone();
                async move {
                    session.flash(Flash::success("late"));
                    started.notify_one();
                    release.notified().await;
                    "done"
                }
            }
        };
        let router = Router::new()
            .route("/slow", get(slow))
            .route(
                "/logout",
                get(|session: Session| async move {
                    session.destroy();
                    "bye"
                }),
            )
            .layer(middleware::from_fn_with_state(store.clone(), session_middleware));

        let pending = tokio::spawn(router.clone().oneshot(get_with_cookie("/slow", &id)));
        started.notified().await;

        router
            .clone()
            .oneshot(get_with_cookie("/logout", &id))
            .await
            .unwrap();
        assert!(store.load(&id).await.is_none());

        release.notify_one();
        let response = pending.await.unwrap().unwrap();
        assert_eq!(body_text(response).await, "done");
        assert!(store.load(&id).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn sign_in_rotates_session_id() {
        let store = store();
        let old_id = store
            .insert(SessionData {
                pending_login: Some(PendingLogin {
                    state: "s".to_string(),
                    verifier: "v".to_string(),
                }),
                ..Default::default()
            })
            .await;

        let session = Session::new(Some(old_id.clone()), store.load(&old_id).await.unwrap());
        session.sign_in(Identity {
            user: UserInfo {
                sub: "1".to_string(),
                name: None,
                email: None,
                picture: None,
            },
            tokens: TokenInfo::new("tok", None, None, vec![]),
        });
        let state = std::mem::take(&mut *session.lock());

        let cookie = persist(&store, state, false).await.unwrap();
        assert!(!cookie.contains(&old_id));
        assert!(store.load(&old_id).await.is_none());
        assert_eq!(store.len().await, 1);
    }
}
