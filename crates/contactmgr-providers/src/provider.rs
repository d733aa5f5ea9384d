//! ContactProvider trait definition.
//!
//! A provider performs the five remote operations on a user's address book.
//! Every call carries the caller's access token: providers hold no
//! per-user state, so one instance serves every session.

use std::future::Future;
use std::pin::Pin;
use std::sync::LazyLock;

use contactmgr_core::{ContactRecord, ContactUpdatePayload};
use regex::Regex;

use crate::error::{ProviderError, ProviderResult};

/// Person fields requested when no explicit list is configured.
pub const DEFAULT_PERSON_FIELDS: &str = "names,emailAddresses,phoneNumbers,organizations,metadata";

/// Page size used when listing connections.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

static RESOURCE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^people/[A-Za-z0-9_-]+$").expect("Invalid resource name regex")
});

/// Checks that `resource_name` has the `people/<id>` shape.
///
/// Resource names end up in request URLs, so anything else is rejected
/// before a request is built.
pub fn validate_resource_name(resource_name: &str) -> ProviderResult<()> {
    if RESOURCE_NAME_RE.is_match(resource_name) {
        Ok(())
    } else {
        Err(ProviderError::bad_request(format!(
            "invalid resource name: {resource_name:?}"
        )))
    }
}

/// Options for listing connections.
#[derive(Debug, Clone)]
pub struct ListOptions {
    /// Comma-separated person fields to return.
    pub person_fields: String,
    /// Page size per request.
    pub page_size: u32,
    /// Stop after this many contacts.
    pub max_results: Option<usize>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            person_fields: DEFAULT_PERSON_FIELDS.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            max_results: None,
        }
    }
}

impl ListOptions {
    /// Creates list options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set person fields.
    pub fn with_person_fields(mut self, fields: impl Into<String>) -> Self {
        self.person_fields = fields.into();
        self
    }

    /// Builder method to set the page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Builder method to cap the number of contacts.
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }
}

/// A boxed future for async trait methods.
///
/// Boxed futures keep the trait object-safe so the server can hold an
/// `Arc<dyn ContactProvider>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The abstraction over a remote contact store.
///
/// # Implementation Notes
///
/// - Implementations must be `Send + Sync`
/// - `list_connections` handles pagination internally
/// - `update` sends the payload's etag and field mask unchanged
pub trait ContactProvider: Send + Sync {
    /// Returns the name of this provider (e.g. "google").
    fn name(&self) -> &str;

    /// Lists the authenticated user's connections.
    fn list_connections<'a>(
        &'a self,
        access_token: &'a str,
        options: ListOptions,
    ) -> BoxFuture<'a, ProviderResult<Vec<ContactRecord>>>;

    /// Fetches a single contact with the given person fields.
    fn get<'a>(
        &'a self,
        access_token: &'a str,
        resource_name: &'a str,
        person_fields: &'a str,
    ) -> BoxFuture<'a, ProviderResult<ContactRecord>>;

    /// Creates a contact and returns it as stored.
    fn create<'a>(
        &'a self,
        access_token: &'a str,
        contact: &'a ContactRecord,
    ) -> BoxFuture<'a, ProviderResult<ContactRecord>>;

    /// Applies a merged update and returns the stored contact.
    fn update<'a>(
        &'a self,
        access_token: &'a str,
        payload: &'a ContactUpdatePayload,
    ) -> BoxFuture<'a, ProviderResult<ContactRecord>>;

    /// Deletes a contact.
    fn delete<'a>(
        &'a self,
        access_token: &'a str,
        resource_name: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;

    #[test]
    fn list_options_builder() {
        let options = ListOptions::new()
            .with_person_fields("names")
            .with_page_size(10)
            .with_max_results(25);

        assert_eq!(options.person_fields, "names");
        assert_eq!(options.page_size, 10);
        assert_eq!(options.max_results, Some(25));
    }

    #[test]
    fn list_options_defaults() {
        let options = ListOptions::default();
        assert_eq!(options.person_fields, DEFAULT_PERSON_FIELDS);
        assert_eq!(options.page_size, 100);
        assert!(options.max_results.is_none());
    }

    #[test]
    fn resource_name_validation() {
        assert!(validate_resource_name("people/c123456789").is_ok());
        assert!(validate_resource_name("people/abc_DEF-9").is_ok());

        for bad in ["", "people/", "c123", "people/../me", "people/c1?x=1", "people/c1/x"] {
            let err = validate_resource_name(bad).unwrap_err();
            assert_eq!(err.code(), ProviderErrorCode::BadRequest, "{bad}");
        }
    }
}
