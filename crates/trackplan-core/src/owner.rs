//! Owner: the account under whose namespace every uniqueness rule applies.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Opaque identifier of the owning user. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
  pub fn new(id: impl Into<String>) -> Result<Self> {
    let id = id.into();
    if id.trim().is_empty() {
      return Err(Error::EmptyOwner);
    }
    Ok(Self(id))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for OwnerId {
  type Error = Error;

  fn try_from(id: String) -> Result<Self> { Self::new(id) }
}

impl From<OwnerId> for String {
  fn from(owner: OwnerId) -> Self { owner.0 }
}

impl fmt::Display for OwnerId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}
