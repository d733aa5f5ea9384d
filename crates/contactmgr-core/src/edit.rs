//! User-submitted contact edits.
//!
//! HTML forms distinguish three states per field: the field is not part of
//! the form at all, the field was submitted empty, or the field carries a
//! value. [`FieldEdit`] keeps that distinction so the merge engine can tell
//! "leave alone" from "clear".

use std::collections::HashMap;

use crate::error::{ContactError, ContactResult};

/// Form field names of the edit form.
pub mod fields {
    pub const RESOURCE_NAME: &str = "resourceName";
    pub const ETAG: &str = "etag";
    pub const GIVEN_NAME: &str = "names[0].givenName";
    pub const FAMILY_NAME: &str = "names[0].familyName";
    pub const EMAIL: &str = "emailAddresses[0].value";
    pub const PHONE: &str = "phoneNumbers[0].value";
    pub const ORGANIZATION: &str = "organizations[0].name";
}

/// Form field names of the add form.
pub mod new_fields {
    pub const GIVEN_NAME: &str = "givenName";
    pub const FAMILY_NAME: &str = "familyName";
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "phone";
    pub const ORGANIZATION: &str = "organization";
}

/// The submitted state of a single form field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldEdit {
    /// The field was not part of the submission.
    #[default]
    Absent,
    /// The field was submitted empty or whitespace-only (raw text kept).
    Blank(String),
    /// The field was submitted with a value (kept verbatim).
    Value(String),
}

impl FieldEdit {
    /// Classifies a raw submitted value.
    pub fn from_submitted(value: Option<&str>) -> Self {
        match value {
            None => Self::Absent,
            Some(v) if v.trim().is_empty() => Self::Blank(v.to_string()),
            Some(v) => Self::Value(v.to_string()),
        }
    }

    /// Shorthand for a submitted value.
    pub fn value(value: impl Into<String>) -> Self {
        let value: String = value.into();
        Self::from_submitted(Some(value.as_str()))
    }

    /// Shorthand for a field submitted empty.
    pub fn blank() -> Self {
        Self::Blank(String::new())
    }

    /// Returns true if the field was part of the submission.
    pub fn is_submitted(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    /// Returns the submitted text exactly as received.
    pub fn submitted_text(&self) -> Option<&str> {
        match self {
            Self::Absent => None,
            Self::Blank(v) | Self::Value(v) => Some(v),
        }
    }

    /// Returns the trimmed value if it is non-blank.
    pub fn non_blank(&self) -> Option<&str> {
        match self {
            Self::Value(v) => Some(v.trim()),
            _ => None,
        }
    }
}

/// Edits submitted for an existing contact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactEditRequest {
    /// The contact being edited.
    pub resource_name: String,
    /// The token the form was rendered with. Only used to detect a stale
    /// form; never sent upstream.
    pub submitted_etag: Option<String>,
    pub given_name: FieldEdit,
    pub family_name: FieldEdit,
    pub email: FieldEdit,
    pub phone: FieldEdit,
    pub organization: FieldEdit,
}

impl ContactEditRequest {
    /// Creates a request that touches no field.
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            ..Default::default()
        }
    }

    /// Parses an edit form submission.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if `resourceName` is missing or blank.
    pub fn from_form(form: &HashMap<String, String>) -> ContactResult<Self> {
        let resource_name = form
            .get(fields::RESOURCE_NAME)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ContactError::invalid_request("missing resourceName"))?;

        let field = |name: &str| FieldEdit::from_submitted(form.get(name).map(String::as_str));

        Ok(Self {
            resource_name: resource_name.to_string(),
            submitted_etag: form
                .get(fields::ETAG)
                .filter(|s| !s.is_empty())
                .cloned(),
            given_name: field(fields::GIVEN_NAME),
            family_name: field(fields::FAMILY_NAME),
            email: field(fields::EMAIL),
            phone: field(fields::PHONE),
            organization: field(fields::ORGANIZATION),
        })
    }

    /// Builder: set the client-side token.
    pub fn with_submitted_etag(mut self, etag: impl Into<String>) -> Self {
        self.submitted_etag = Some(etag.into());
        self
    }

    /// Builder: set the given name edit.
    pub fn with_given_name(mut self, edit: FieldEdit) -> Self {
        self.given_name = edit;
        self
    }

    /// Builder: set the family name edit.
    pub fn with_family_name(mut self, edit: FieldEdit) -> Self {
        self.family_name = edit;
        self
    }

    /// Builder: set the email edit.
    pub fn with_email(mut self, edit: FieldEdit) -> Self {
        self.email = edit;
        self
    }

    /// Builder: set the phone edit.
    pub fn with_phone(mut self, edit: FieldEdit) -> Self {
        self.phone = edit;
        self
    }

    /// Builder: set the organization edit.
    pub fn with_organization(mut self, edit: FieldEdit) -> Self {
        self.organization = edit;
        self
    }
}

/// Fields submitted through the add-contact form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewContactRequest {
    pub given_name: FieldEdit,
    pub family_name: FieldEdit,
    pub email: FieldEdit,
    pub phone: FieldEdit,
    pub organization: FieldEdit,
}

impl NewContactRequest {
    /// Parses an add form submission.
    pub fn from_form(form: &HashMap<String, String>) -> Self {
        let field = |name: &str| FieldEdit::from_submitted(form.get(name).map(String::as_str));
        Self {
            given_name: field(new_fields::GIVEN_NAME),
            family_name: field(new_fields::FAMILY_NAME),
            email: field(new_fields::EMAIL),
            phone: field(new_fields::PHONE),
            organization: field(new_fields::ORGANIZATION),
        }
    }
}
