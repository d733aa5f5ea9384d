//! Google People API client.
//!
//! Low-level HTTP client for the People API v1: request building, error
//! classification and response parsing. Bodies are (de)serialized with
//! `serde_json` directly into [`ContactRecord`].

use contactmgr_core::{ContactRecord, ContactUpdatePayload};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{ListOptions, validate_resource_name};

use super::config::GoogleConfig;

/// Google People API client.
#[derive(Debug, Clone)]
pub struct GooglePeopleClient {
    http_client: reqwest::Client,
    base_url: String,
}

/// One page of `people.connections.list`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionsPage {
    #[serde(default)]
    connections: Vec<ContactRecord>,
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    total_items: Option<u64>,
}

/// Google's JSON error envelope.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GooglePeopleClient {
    /// Creates a client using the configured timeout, user agent and base URL.
    pub fn new(config: &GoogleConfig) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            base_url: config
                .endpoints
                .people_base_url
                .trim_end_matches('/')
                .to_string(),
        })
    }

    /// Lists the user's connections, following `nextPageToken`.
    pub async fn list_connections(
        &self,
        access_token: &str,
        options: &ListOptions,
    ) -> ProviderResult<Vec<ContactRecord>> {
        let mut all = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .list_connections_page(access_token, options, page_token.as_deref())
                .await?;

            if all.is_empty()
                && let Some(total) = page.total_items
            {
                debug!("connections reports {} total items", total);
            }

            all.extend(page.connections);

            if let Some(max) = options.max_results
                && all.len() >= max
            {
                all.truncate(max);
                break;
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("fetched {} connections", all.len());
        Ok(all)
    }

    async fn list_connections_page(
        &self,
        access_token: &str,
        options: &ListOptions,
        page_token: Option<&str>,
    ) -> ProviderResult<ConnectionsPage> {
        let url = format!("{}/people/me/connections", self.base_url);

        let mut request = self
            .http_client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("personFields", options.person_fields.clone()),
                ("pageSize", options.page_size.to_string()),
            ]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let body = send(request).await?;
        parse(&body)
    }

    /// Fetches a single person.
    pub async fn get_person(
        &self,
        access_token: &str,
        resource_name: &str,
        person_fields: &str,
    ) -> ProviderResult<ContactRecord> {
        validate_resource_name(resource_name)?;
        let url = format!("{}/{}", self.base_url, resource_name);

        let request = self
            .http_client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("personFields", person_fields)]);

        let body = send(request).await?;
        parse(&body)
    }

    /// Creates a person.
    pub async fn create_contact(
        &self,
        access_token: &str,
        contact: &ContactRecord,
    ) -> ProviderResult<ContactRecord> {
        let url = format!("{}/people:createContact", self.base_url);
        let json = to_json(contact)?;

        let request = self
            .http_client
            .post(&url)
            .bearer_auth(access_token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(json);

        let body = send(request).await?;
        parse(&body)
    }

    /// Sends a partial update with the payload's etag and field mask.
    pub async fn update_contact(
        &self,
        access_token: &str,
        payload: &ContactUpdatePayload,
    ) -> ProviderResult<ContactRecord> {
        validate_resource_name(payload.resource_name())?;

        let mask = payload.field_mask();
        if mask.is_empty() {
            return Err(ProviderError::bad_request("update has an empty field mask"));
        }

        let url = format!("{}/{}:updateContact", self.base_url, payload.resource_name());
        let json = to_json(&payload.to_body())?;

        let request = self
            .http_client
            .patch(&url)
            .bearer_auth(access_token)
            .query(&[("updatePersonFields", mask.to_string())])
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(json);

        let body = send(request).await?;
        parse(&body)
    }

    /// Deletes a person.
    pub async fn delete_contact(&self, access_token: &str, resource_name: &str) -> ProviderResult<()> {
        validate_resource_name(resource_name)?;
        let url = format!("{}/{}:deleteContact", self.base_url, resource_name);

        let request = self.http_client.delete(&url).bearer_auth(access_token);
        send(request).await?;
        Ok(())
    }
}

async fn send(request: reqwest::RequestBuilder) -> ProviderResult<String> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            ProviderError::network("request timeout").with_source(e)
        } else if e.is_connect() {
            ProviderError::network(format!("connection failed: {}", e)).with_source(e)
        } else {
            ProviderError::network(format!("request failed: {}", e)).with_source(e)
        }
    })?;

    let status = response.status();
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok());

    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

    if status.is_success() {
        return Ok(body);
    }

    let err = classify(status, &body, retry_after);
    warn!(status = status.as_u16(), code = %err.code(), "People API error");
    Err(err)
}

/// Maps a non-success response onto a provider error.
fn classify(status: StatusCode, body: &str, retry_after: Option<u64>) -> ProviderError {
    let api_error = serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error);
    let message = api_error
        .as_ref()
        .map(|e| e.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("API error ({})", status));
    let api_status = api_error.and_then(|e| e.status);

    if api_status.as_deref() == Some("FAILED_PRECONDITION") {
        return ProviderError::precondition_failed(message);
    }

    match status {
        StatusCode::UNAUTHORIZED => ProviderError::authentication(message),
        StatusCode::FORBIDDEN => ProviderError::authorization(message),
        StatusCode::NOT_FOUND => ProviderError::not_found(message),
        StatusCode::BAD_REQUEST => ProviderError::bad_request(message),
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => {
            ProviderError::precondition_failed(message)
        }
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(format!(
            "{}{}",
            message,
            retry_after
                .map(|s| format!(", retry after {} seconds", s))
                .unwrap_or_default()
        )),
        s if s.is_server_error() => ProviderError::server(message),
        _ => ProviderError::server(format!("unexpected status {}: {}", status, message)),
    }
}

fn parse<T: for<'de> Deserialize<'de> + Default>(body: &str) -> ProviderResult<T> {
    if body.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(body)
        .map_err(|e| ProviderError::invalid_response(format!("failed to parse response: {}", e)))
}

fn to_json(contact: &ContactRecord) -> ProviderResult<String> {
    serde_json::to_string(contact)
        .map_err(|e| ProviderError::internal(format!("failed to encode contact: {}", e)))
}
