//! Contact record model.
//!
//! Mirrors the subset of the Google People API `Person` resource that the
//! application manages. Provider-assigned metadata is carried as opaque JSON
//! so it round-trips unchanged through an update.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque metadata attached by the provider to a record or a field entry.
///
/// The content (primary/verified flags, sources, ...) is never inspected,
/// only echoed back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(Value);

impl Metadata {
    /// Wraps a raw JSON value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns the raw JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// One of the four field groups managed by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldGroup {
    Names,
    EmailAddresses,
    PhoneNumbers,
    Organizations,
}

impl FieldGroup {
    /// All groups, in the order they appear in a field mask.
    pub const ALL: [FieldGroup; 4] = [
        FieldGroup::Names,
        FieldGroup::EmailAddresses,
        FieldGroup::PhoneNumbers,
        FieldGroup::Organizations,
    ];

    /// Returns the People API field name of this group.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Names => "names",
            Self::EmailAddresses => "emailAddresses",
            Self::PhoneNumbers => "phoneNumbers",
            Self::Organizations => "organizations",
        }
    }
}

impl fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A person's name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Name {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    /// Server-computed display name; output only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
}

impl Name {
    /// Creates a name with the given parts and no metadata.
    pub fn new(given_name: impl Into<String>, family_name: impl Into<String>) -> Self {
        Self {
            given_name: Some(given_name.into()),
            family_name: Some(family_name.into()),
            ..Default::default()
        }
    }

    /// Returns the given name, or an empty string.
    pub fn given(&self) -> &str {
        self.given_name.as_deref().unwrap_or_default()
    }

    /// Returns the family name, or an empty string.
    pub fn family(&self) -> &str {
        self.family_name.as_deref().unwrap_or_default()
    }

    /// Returns true if both entries hold the same name parts.
    pub fn same_value(&self, other: &Name) -> bool {
        self.given() == other.given() && self.family() == other.family()
    }
}

/// An email address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl EmailAddress {
    /// Creates an email address with no metadata.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            metadata: None,
            value: Some(value.into()),
        }
    }
}

/// A phone number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumber {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl PhoneNumber {
    /// Creates a phone number with no metadata.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            metadata: None,
            value: Some(value.into()),
        }
    }
}

/// An organization the person belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Organization {
    /// Creates an organization with no metadata.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: None,
            name: Some(name.into()),
        }
    }
}

/// A contact as returned by (or sent to) the remote service.
///
/// The provider returns lists for every field group; the application only
/// manages the first entry of each.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    /// Provider identifier, e.g. `people/c123`. Empty for a record that has
    /// not been created yet.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_name: String,
    /// Concurrency token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Record-level metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<Name>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phone_numbers: Vec<PhoneNumber>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub organizations: Vec<Organization>,
}

impl ContactRecord {
    /// Creates an empty record with the given identifier and token.
    pub fn new(resource_name: impl Into<String>, etag: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            etag: Some(etag.into()),
            ..Default::default()
        }
    }

    /// Builder: set the record-level metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Builder: set the name.
    pub fn with_name(mut self, name: Name) -> Self {
        self.names = vec![name];
        self
    }

    /// Builder: set the email address.
    pub fn with_email(mut self, email: EmailAddress) -> Self {
        self.email_addresses = vec![email];
        self
    }

    /// Builder: set the phone number.
    pub fn with_phone(mut self, phone: PhoneNumber) -> Self {
        self.phone_numbers = vec![phone];
        self
    }

    /// Builder: set the organization.
    pub fn with_organization(mut self, organization: Organization) -> Self {
        self.organizations = vec![organization];
        self
    }

    /// The primary name, if any.
    pub fn name(&self) -> Option<&Name> {
        self.names.first()
    }

    /// The primary email address, if any.
    pub fn email(&self) -> Option<&EmailAddress> {
        self.email_addresses.first()
    }

    /// The primary phone number, if any.
    pub fn phone(&self) -> Option<&PhoneNumber> {
        self.phone_numbers.first()
    }

    /// The primary organization, if any.
    pub fn organization(&self) -> Option<&Organization> {
        self.organizations.first()
    }

    /// Returns the part of the resource name after `people/`.
    pub fn person_id(&self) -> &str {
        self.resource_name
            .strip_prefix("people/")
            .unwrap_or(&self.resource_name)
    }

    /// Returns a human-readable label for lists.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name() {
            if let Some(display) = name.display_name.as_deref().filter(|d| !d.is_empty()) {
                return display.to_string();
            }
            let joined = format!("{} {}", name.given(), name.family());
            let joined = joined.trim();
            if !joined.is_empty() {
                return joined.to_string();
            }
        }
        self.email()
            .and_then(|e| e.value.clone())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "(no name)".to_string())
    }
}
