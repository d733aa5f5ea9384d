//! Core types: contact records, edit requests, merge engine, tracing.
//!
//! The [`merge`](merge::merge) function is the heart of the edit flow:
//!
//! ```text
//! get(resourceName) ──► ContactRecord ─┐
//!                                      ├─► merge() ──► ContactUpdatePayload ──► update(mask)
//! form fields ──► ContactEditRequest ──┘
//! ```

pub mod contact;
pub mod edit;
pub mod error;
pub mod merge;
pub mod tracing;

pub use contact::{
    ContactRecord, EmailAddress, FieldGroup, Metadata, Name, Organization, PhoneNumber,
};
pub use edit::{ContactEditRequest, FieldEdit, NewContactRequest};
pub use error::{ContactError, ContactErrorKind, ContactResult};
pub use merge::{ContactUpdatePayload, FieldMask, GroupChange, compose_new, merge};
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
