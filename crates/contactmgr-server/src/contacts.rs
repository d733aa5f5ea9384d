//! Contact operations.
//!
//! [`ContactService`] is the boundary between the web handlers and the
//! remote provider: every provider failure is logged here and converted
//! into a [`ContactError`].

use std::sync::Arc;

use contactmgr_core::{
    ContactEditRequest, ContactError, ContactRecord, ContactResult, NewContactRequest,
    compose_new, merge,
};
use contactmgr_providers::{
    ContactProvider, DEFAULT_PERSON_FIELDS, ListOptions, ProviderError, validate_resource_name,
};
use tracing::{debug, error, info};

/// Outcome of an update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The remote record was changed.
    Updated(ContactRecord),
    /// The submission matched the stored record; nothing was sent.
    Unchanged(ContactRecord),
}

/// Runs contact operations against a provider.
#[derive(Clone)]
pub struct ContactService {
    provider: Arc<dyn ContactProvider>,
    list_options: ListOptions,
}

impl std::fmt::Debug for ContactService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactService")
            .field("provider", &self.provider.name())
            .field("list_options", &self.list_options)
            .finish()
    }
}

impl ContactService {
    pub fn new(provider: Arc<dyn ContactProvider>, list_options: ListOptions) -> Self {
        Self {
            provider,
            list_options,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Lists the signed-in user's connections.
    pub async fn list(&self, access_token: &str) -> ContactResult<Vec<ContactRecord>> {
        let contacts = self
            .provider
            .list_connections(access_token, self.list_options.clone())
            .await
            .map_err(|e| failed("list contacts", e))?;

        info!(count = contacts.len(), "Listed contacts");
        Ok(contacts)
    }

    /// Creates a contact from the add form.
    pub async fn create(
        &self,
        access_token: &str,
        request: &NewContactRequest,
    ) -> ContactResult<ContactRecord> {
        let contact = compose_new(request);
        let created = self
            .provider
            .create(access_token, &contact)
            .await
            .map_err(|e| failed("create contact", e))?;

        info!(resource_name = %created.resource_name, "Created contact");
        Ok(created)
    }

    /// Fetches a contact to fill the edit form.
    pub async fn fetch_for_edit(
        &self,
        access_token: &str,
        resource_name: &str,
    ) -> ContactResult<ContactRecord> {
        checked(resource_name)?;
        let contact = self
            .provider
            .get(access_token, resource_name, &self.list_options.person_fields)
            .await
            .map_err(|e| failed("fetch contact", e))?;

        debug!(resource_name, "Fetched contact for edit");
        Ok(contact)
    }

    /// Applies an edit form submission.
    ///
    /// The record is re-read first so the update carries the current etag
    /// and metadata; a submission that changes nothing is not sent.
    pub async fn update(
        &self,
        access_token: &str,
        edits: &ContactEditRequest,
    ) -> ContactResult<UpdateOutcome> {
        checked(&edits.resource_name)?;
        let existing = self
            .provider
            .get(access_token, &edits.resource_name, DEFAULT_PERSON_FIELDS)
            .await
            .map_err(|e| failed("fetch contact", e))?;

        let payload = merge(&existing, edits)?;
        if payload.is_noop(&existing) {
            info!(resource_name = %existing.resource_name, "Contact unchanged, skipping update");
            return Ok(UpdateOutcome::Unchanged(existing));
        }

        let updated = self
            .provider
            .update(access_token, &payload)
            .await
            .map_err(|e| failed("update contact", e))?;

        info!(
            resource_name = %updated.resource_name,
            fields = %payload.field_mask(),
            "Updated contact"
        );
        Ok(UpdateOutcome::Updated(updated))
    }

    /// Deletes `people/{person_id}`.
    pub async fn delete(&self, access_token: &str, person_id: &str) -> ContactResult<()> {
        let resource_name = format!("people/{person_id}");
        checked(&resource_name)?;
        self.provider
            .delete(access_token, &resource_name)
            .await
            .map_err(|e| failed("delete contact", e))?;

        info!(resource_name, "Deleted contact");
        Ok(())
    }
}

/// Rejects identifiers that are not `people/<id>` before any remote call.
fn checked(resource_name: &str) -> ContactResult<()> {
    validate_resource_name(resource_name).map_err(|e| {
        debug!("Rejecting contact identifier: {}", e);
        ContactError::invalid_request(e.message())
    })
}

fn failed(operation: &str, err: ProviderError) -> ContactError {
    error!(code = err.code().as_str(), "Failed to {}: {}", operation, err);
    err.into()
}

/// An in-memory provider for tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use contactmgr_core::{ContactUpdatePayload, FieldGroup};
    use contactmgr_providers::{BoxFuture, ProviderResult};

    use super::*;

    /// The only access token the fake accepts.
    pub const TOKEN: &str = "test-token";

    #[derive(Debug, Default)]
    pub struct FakeProvider {
        contacts: Mutex<BTreeMap<String, ContactRecord>>,
        next_id: Mutex<u32>,
        updates: Mutex<Vec<ContactUpdatePayload>>,
        failure: Mutex<Option<ProviderError>>,
    }

    impl FakeProvider {
        pub fn with_contacts(contacts: impl IntoIterator<Item = ContactRecord>) -> Self {
            let fake = Self::default();
            {
                let mut stored = fake.contacts.lock().unwrap();
                for contact in contacts {
                    stored.insert(contact.resource_name.clone(), contact);
                }
            }
            fake
        }

        /// Makes every following call fail with `err`.
        pub fn fail_with(&self, err: ProviderError) {
            *self.failure.lock().unwrap() = Some(err);
        }

        pub fn contact(&self, resource_name: &str) -> Option<ContactRecord> {
            self.contacts.lock().unwrap().get(resource_name).cloned()
        }

        pub fn updates(&self) -> Vec<ContactUpdatePayload> {
            self.updates.lock().unwrap().clone()
        }

        fn check(&self, access_token: &str) -> ProviderResult<()> {
            if let Some(err) = self.failure.lock().unwrap().as_ref() {
                return Err(ProviderError::new(err.code(), err.message()));
            }
            if access_token != TOKEN {
                return Err(ProviderError::authentication("invalid access token"));
            }
            Ok(())
        }

        fn lookup(&self, resource_name: &str) -> ProviderResult<ContactRecord> {
            validate_resource_name(resource_name)?;
            self.contact(resource_name)
                .ok_or_else(|| ProviderError::not_found(format!("{resource_name} not found")))
        }

        fn apply(&self, payload: &ContactUpdatePayload) -> ProviderResult<ContactRecord> {
            let mut current = self.lookup(payload.resource_name())?;
            if current.etag.as_deref() != Some(payload.etag()) {
                return Err(ProviderError::precondition_failed("etag mismatch"));
            }
            let body = payload.to_body();
            for group in payload.field_mask().groups() {
                match group {
                    FieldGroup::Names => current.names = body.names.clone(),
                    FieldGroup::EmailAddresses => {
                        current.email_addresses = body.email_addresses.clone()
                    }
                    FieldGroup::PhoneNumbers => current.phone_numbers = body.phone_numbers.clone(),
                    FieldGroup::Organizations => {
                        current.organizations = body.organizations.clone()
                    }
                }
            }
            current.etag = Some(format!("{}+", payload.etag()));
            self.updates.lock().unwrap().push(payload.clone());
            self.contacts
                .lock()
                .unwrap()
                .insert(current.resource_name.clone(), current.clone());
            Ok(current)
        }
    }

    impl ContactProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        fn list_connections<'a>(
            &'a self,
            access_token: &'a str,
            _options: ListOptions,
        ) -> BoxFuture<'a, ProviderResult<Vec<ContactRecord>>> {
            Box::pin(async move {
                self.check(access_token)?;
                Ok(self.contacts.lock().unwrap().values().cloned().collect())
            })
        }

        fn get<'a>(
            &'a self,
            access_token: &'a str,
            resource_name: &'a str,
            _person_fields: &'a str,
        ) -> BoxFuture<'a, ProviderResult<ContactRecord>> {
            Box::pin(async move {
                self.check(access_token)?;
                self.lookup(resource_name)
            })
        }

        fn create<'a>(
            &'a self,
            access_token: &'a str,
            contact: &'a ContactRecord,
        ) -> BoxFuture<'a, ProviderResult<ContactRecord>> {
            Box::pin(async move {
                self.check(access_token)?;
                let id = {
                    let mut next = self.next_id.lock().unwrap();
                    *next += 1;
                    *next
                };
                let mut created = contact.clone();
                created.resource_name = format!("people/new{id}");
                created.etag = Some(format!("etag-new{id}"));
                self.contacts
                    .lock()
                    .unwrap()
                    .insert(created.resource_name.clone(), created.clone());
                Ok(created)
            })
        }

        fn update<'a>(
            &'a self,
            access_token: &'a str,
            payload: &'a ContactUpdatePayload,
        ) -> BoxFuture<'a, ProviderResult<ContactRecord>> {
            Box::pin(async move {
                self.check(access_token)?;
                self.apply(payload)
            })
        }

        fn delete<'a>(
            &'a self,
            access_token: &'a str,
            resource_name: &'a str,
        ) -> BoxFuture<'a, ProviderResult<()>> {
            Box::pin(async move {
                self.check(access_token)?;
                self.lookup(resource_name)?;
                self.contacts.lock().unwrap().remove(resource_name);
                Ok(())
            })
        }
    }
}
