//! Google People provider implementation.
//!
//! This module implements the [`ContactProvider`] trait on top of
//! [`GooglePeopleClient`], and bundles the [`OAuthClient`] used to sign
//! users in and refresh their tokens.

use contactmgr_core::{ContactRecord, ContactUpdatePayload};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, ContactProvider, ListOptions};

use super::client::GooglePeopleClient;
use super::config::GoogleConfig;
use super::oauth::OAuthClient;

/// Name reported by [`GoogleProvider`] and attached to its errors.
pub const PROVIDER_NAME: &str = "google";

/// Google People provider.
#[derive(Debug, Clone)]
pub struct GoogleProvider {
    config: GoogleConfig,
    client: GooglePeopleClient,
    oauth_client: OAuthClient,
}

impl GoogleProvider {
    /// Creates a new Google provider with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the config does not validate or the
    /// HTTP clients cannot be built.
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config.validate().map_err(ProviderError::configuration)?;

        let client = GooglePeopleClient::new(&config)?;
        let oauth_client = OAuthClient::new(&config)?;

        debug!(redirect_uri = %config.redirect_uri, "google provider ready");
        Ok(Self {
            config,
            client,
            oauth_client,
        })
    }

    /// The OAuth client for the sign-in flow.
    pub fn oauth(&self) -> &OAuthClient {
        &self.oauth_client
    }

    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    /// Default list options derived from the configuration.
    pub fn list_options(&self) -> ListOptions {
        ListOptions::new()
            .with_person_fields(self.config.person_fields.clone())
            .with_page_size(self.config.page_size)
    }
}

fn tag<T>(result: ProviderResult<T>) -> ProviderResult<T> {
    result.map_err(|e| e.with_provider(PROVIDER_NAME))
}

impl ContactProvider for GoogleProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn list_connections<'a>(
        &'a self,
        access_token: &'a str,
        options: ListOptions,
    ) -> BoxFuture<'a, ProviderResult<Vec<ContactRecord>>> {
        Box::pin(async move { tag(self.client.list_connections(access_token, &options).await) })
    }

    fn get<'a>(
        &'a self,
        access_token: &'a str,
        resource_name: &'a str,
        person_fields: &'a str,
    ) -> BoxFuture<'a, ProviderResult<ContactRecord>> {
        Box::pin(async move {
            tag(self
                .client
                .get_person(access_token, resource_name, person_fields)
                .await)
        })
    }

    fn create<'a>(
        &'a self,
        access_token: &'a str,
        contact: &'a ContactRecord,
    ) -> BoxFuture<'a, ProviderResult<ContactRecord>> {
        Box::pin(async move {
            let created = tag(self.client.create_contact(access_token, contact).await)?;
            info!(resource_name = %created.resource_name, "created contact");
            Ok(created)
        })
    }

    fn update<'a>(
        &'a self,
        access_token: &'a str,
        payload: &'a ContactUpdatePayload,
    ) -> BoxFuture<'a, ProviderResult<ContactRecord>> {
        Box::pin(async move {
            let updated = tag(self.client.update_contact(access_token, payload).await)?;
            info!(
                resource_name = %payload.resource_name(),
                mask = %payload.field_mask(),
                "updated contact"
            );
            Ok(updated)
        })
    }

    fn delete<'a>(
        &'a self,
        access_token: &'a str,
        resource_name: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            tag(self.client.delete_contact(access_token, resource_name).await)?;
            info!(resource_name = %resource_name, "deleted contact");
            Ok(())
        })
    }
}
