//! Contact merge engine.
//!
//! Turns a freshly fetched [`ContactRecord`] and a [`ContactEditRequest`]
//! into the partial update to send upstream. The policy per field group:
//!
//! | Group          | Absent    | Blank           | Value                     |
//! |----------------|-----------|-----------------|---------------------------|
//! | names          | untouched | replace (`""`)  | replace                   |
//! | emailAddresses | untouched | replace (`""`)  | replace                   |
//! | phoneNumbers   | untouched | remove          | replace (trimmed)         |
//! | organizations  | untouched | remove          | replace (trimmed)         |
//!
//! Replaced entries inherit the metadata of the record's first entry in that
//! group. The etag and record-level metadata always come from the fetched
//! record, never from the form.

use std::fmt;

use tracing::debug;

use crate::contact::{
    ContactRecord, EmailAddress, FieldGroup, Metadata, Name, Organization, PhoneNumber,
};
use crate::edit::{ContactEditRequest, FieldEdit, NewContactRequest};
use crate::error::{ContactError, ContactResult};

/// What an update does to one field group.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum GroupChange<T> {
    /// Not part of the update; the remote service keeps its value.
    #[default]
    Untouched,
    /// Replace the group with a single entry.
    Replace(T),
    /// Delete the group: masked, but absent from the body.
    Remove,
}

impl<T> GroupChange<T> {
    /// Returns true if the group appears in the field mask.
    pub fn is_masked(&self) -> bool {
        !matches!(self, Self::Untouched)
    }

    /// Returns the replacement entry, if any.
    pub fn replacement(&self) -> Option<&T> {
        match self {
            Self::Replace(value) => Some(value),
            _ => None,
        }
    }

    fn into_entries(self) -> Vec<T> {
        match self {
            Self::Replace(value) => vec![value],
            _ => Vec::new(),
        }
    }

    /// True if applying this change to `current` would leave it as is.
    fn is_noop_for(&self, current: &[T], same: impl Fn(&T, &T) -> bool) -> bool {
        match self {
            Self::Untouched => true,
            Self::Remove => current.is_empty(),
            Self::Replace(value) => current.first().is_some_and(|c| same(c, value)),
        }
    }
}

/// The list of field groups an update intends to modify.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMask(Vec<FieldGroup>);

impl FieldMask {
    /// Builds a mask from groups, normalized to canonical order.
    pub fn from_groups(groups: impl IntoIterator<Item = FieldGroup>) -> Self {
        let mut groups: Vec<FieldGroup> = groups.into_iter().collect();
        groups.sort();
        groups.dedup();
        Self(groups)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, group: FieldGroup) -> bool {
        self.0.contains(&group)
    }

    pub fn groups(&self) -> &[FieldGroup] {
        &self.0
    }
}

impl fmt::Display for FieldMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(FieldGroup::as_str).collect();
        f.write_str(&names.join(","))
    }
}

/// A partial update ready to be sent to the remote service.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactUpdatePayload {
    resource_name: String,
    etag: String,
    metadata: Option<Metadata>,
    pub names: GroupChange<Name>,
    pub email_addresses: GroupChange<EmailAddress>,
    pub phone_numbers: GroupChange<PhoneNumber>,
    pub organizations: GroupChange<Organization>,
}

impl ContactUpdatePayload {
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    /// The concurrency token of the record the payload was merged against.
    pub fn etag(&self) -> &str {
        &self.etag
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// Returns the groups this payload replaces or removes.
    pub fn field_mask(&self) -> FieldMask {
        let masked = [
            (FieldGroup::Names, self.names.is_masked()),
            (FieldGroup::EmailAddresses, self.email_addresses.is_masked()),
            (FieldGroup::PhoneNumbers, self.phone_numbers.is_masked()),
            (FieldGroup::Organizations, self.organizations.is_masked()),
        ];
        FieldMask::from_groups(
            masked
                .into_iter()
                .filter(|(_, is_masked)| *is_masked)
                .map(|(group, _)| group),
        )
    }

    /// Builds the request body. Removed and untouched groups are absent.
    pub fn to_body(&self) -> ContactRecord {
        ContactRecord {
            resource_name: self.resource_name.clone(),
            etag: Some(self.etag.clone()),
            metadata: self.metadata.clone(),
            names: self.names.clone().into_entries(),
            email_addresses: self.email_addresses.clone().into_entries(),
            phone_numbers: self.phone_numbers.clone().into_entries(),
            organizations: self.organizations.clone().into_entries(),
        }
    }

    /// Returns true if sending this payload would not change `current`.
    ///
    /// Metadata is not compared; only the values the form can edit.
    pub fn is_noop(&self, current: &ContactRecord) -> bool {
        self.names
            .is_noop_for(&current.names, |a, b| a.same_value(b))
            && self
                .email_addresses
                .is_noop_for(&current.email_addresses, |a, b| text(&a.value) == text(&b.value))
            && self
                .phone_numbers
                .is_noop_for(&current.phone_numbers, |a, b| text(&a.value) == text(&b.value))
            && self
                .organizations
                .is_noop_for(&current.organizations, |a, b| text(&a.name) == text(&b.name))
    }
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

/// Merges submitted edits into an update for `existing`.
///
/// `existing` must have been fetched as part of the same operation so its
/// etag is current.
///
/// # Errors
///
/// Returns `InvalidRequest` if the edit has no identifier, targets a
/// different record than `existing`, or `existing` carries no etag.
pub fn merge(
    existing: &ContactRecord,
    edits: &ContactEditRequest,
) -> ContactResult<ContactUpdatePayload> {
    let resource_name = edits.resource_name.trim();
    if resource_name.is_empty() {
        return Err(ContactError::invalid_request("missing contact identifier"));
    }
    if resource_name != existing.resource_name {
        return Err(ContactError::invalid_request(format!(
            "edit targets {} but fetched record is {}",
            resource_name, existing.resource_name
        )));
    }
    let etag = existing
        .etag
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| {
            ContactError::invalid_request(format!("{} has no concurrency token", resource_name))
        })?;

    if let Some(submitted) = edits.submitted_etag.as_deref()
        && submitted != etag
    {
        debug!(
            "form for {} was rendered with an older etag, using the fetched one",
            resource_name
        );
    }

    Ok(ContactUpdatePayload {
        resource_name: existing.resource_name.clone(),
        etag: etag.to_string(),
        metadata: existing.metadata.clone(),
        names: merge_name(existing, &edits.given_name, &edits.family_name),
        email_addresses: merge_email(existing, &edits.email),
        phone_numbers: merge_clearable(&edits.phone, existing.phone(), |value, metadata| {
            PhoneNumber {
                metadata,
                value: Some(value.to_string()),
            }
        }),
        organizations: merge_clearable(
            &edits.organization,
            existing.organization(),
            |value, metadata| Organization {
                metadata,
                name: Some(value.to_string()),
            },
        ),
    })
}

fn merge_name(existing: &ContactRecord, given: &FieldEdit, family: &FieldEdit) -> GroupChange<Name> {
    if !given.is_submitted() && !family.is_submitted() {
        return GroupChange::Untouched;
    }
    GroupChange::Replace(Name {
        metadata: existing.name().and_then(|n| n.metadata.clone()),
        display_name: None,
        given_name: Some(given.submitted_text().unwrap_or_default().to_string()),
        family_name: Some(family.submitted_text().unwrap_or_default().to_string()),
    })
}

fn merge_email(existing: &ContactRecord, email: &FieldEdit) -> GroupChange<EmailAddress> {
    match email.submitted_text() {
        None => GroupChange::Untouched,
        Some(value) => GroupChange::Replace(EmailAddress {
            metadata: existing.email().and_then(|e| e.metadata.clone()),
            value: Some(value.to_string()),
        }),
    }
}

/// Shared policy for phone and organization: blank clears the group.
fn merge_clearable<E, T>(
    edit: &FieldEdit,
    current: Option<&E>,
    build: impl FnOnce(&str, Option<Metadata>) -> T,
) -> GroupChange<T>
where
    E: HasMetadata,
{
    match edit {
        FieldEdit::Absent => GroupChange::Untouched,
        FieldEdit::Blank(_) => GroupChange::Remove,
        FieldEdit::Value(_) => match edit.non_blank() {
            Some(value) => GroupChange::Replace(build(value, current.and_then(|c| c.metadata()))),
            None => GroupChange::Remove,
        },
    }
}

trait HasMetadata {
    fn metadata(&self) -> Option<Metadata>;
}

impl HasMetadata for PhoneNumber {
    fn metadata(&self) -> Option<Metadata> {
        self.metadata.clone()
    }
}

impl HasMetadata for Organization {
    fn metadata(&self) -> Option<Metadata> {
        self.metadata.clone()
    }
}

/// Builds the body of a create call from the add form.
///
/// Name and email are included whenever submitted; phone and organization
/// only when non-blank.
pub fn compose_new(request: &NewContactRequest) -> ContactRecord {
    let mut record = ContactRecord::default();

    if request.given_name.is_submitted() || request.family_name.is_submitted() {
        record = record.with_name(Name::new(
            request.given_name.submitted_text().unwrap_or_default(),
            request.family_name.submitted_text().unwrap_or_default(),
        ));
    }
    if let Some(email) = request.email.submitted_text() {
        record = record.with_email(EmailAddress::new(email));
    }
    if let Some(phone) = request.phone.non_blank() {
        record = record.with_phone(PhoneNumber::new(phone));
    }
    if let Some(organization) = request.organization.non_blank() {
        record = record.with_organization(Organization::new(organization));
    }

    record
}
