//! Conflicts, i.e. violations of the catalog's identity and consistency rules.
//!
//! A conflict aborts the whole reconciliation. Its `Display` text is the
//! single human-readable reason handed back to the caller.

use thiserror::Error;

use crate::catalog::PropertyType;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Conflict {
  /// An event name matches several types and the submission named none.
  #[error("Event \"{name}\" exists with multiple types; type must be specified.")]
  AmbiguousEventType { name: String },

  #[error("Event \"{name}\" already exists with a different description.")]
  EventDescription { name: String },

  #[error(
    "Property \"{name}\" of type \"{property_type}\" already exists with a different description."
  )]
  PropertyDescription {
    name:          String,
    property_type: PropertyType,
  },

  /// A reused property would be linked with a `required` value that differs
  /// from one of its existing links.
  #[error("Property \"{name}\" has conflicting \"required\" values across events.")]
  RequiredFlag { name: String },

  /// The event is already part of the plan with the opposite
  /// `additionalProperties` setting.
  #[error(
    "Event \"{event}\" is already in tracking plan \"{plan}\" with a different \"additionalProperties\" value."
  )]
  AdditionalProperties { plan: String, event: String },

  /// A uniqueness constraint fired in the store: another writer got there
  /// first.
  #[error("Conflicting concurrent write: {0}")]
  Concurrent(String),
}

/// Why a reconciliation did not commit.
#[derive(Debug, Error)]
pub enum ReconcileError<E> {
  #[error(transparent)]
  Conflict(#[from] Conflict),

  /// The store failed for reasons unrelated to the submitted data. Never
  /// retried here.
  #[error("store error: {0}")]
  Store(#[source] E),
}

impl<E> ReconcileError<E> {
  pub fn conflict(&self) -> Option<&Conflict> {
    match self {
      Self::Conflict(c) => Some(c),
      Self::Store(_) => None,
    }
  }
}
