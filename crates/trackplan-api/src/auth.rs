//! API-key authentication.
//!
//! Clients send their key in the `x-api-key` header. Only SHA-256 digests of
//! keys are held in memory; each digest maps to the owner whose catalog the
//! request may touch.

use std::collections::HashMap;

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use sha2::{Digest, Sha256};
use trackplan_core::{OwnerId, store::CatalogStore};

use crate::{AppState, error::ApiError};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Lowercase hex SHA-256 of a raw API key.
pub fn digest_key(key: &str) -> String { hex::encode(Sha256::digest(key.as_bytes())) }

/// Key digests accepted by this server instance.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
  by_digest: HashMap<String, OwnerId>,
}

impl ApiKeys {
  pub fn new() -> Self { Self::default() }

  /// Register an already-hashed key.
  pub fn insert_digest(&mut self, digest: &str, owner: OwnerId) {
    self.by_digest.insert(digest.trim().to_ascii_lowercase(), owner);
  }

  /// Register a raw key, hashing it first.
  pub fn insert_key(&mut self, key: &str, owner: OwnerId) {
    self.by_digest.insert(digest_key(key), owner);
  }

  /// Owner of `key`, if it is known.
  pub fn resolve(&self, key: &str) -> Option<&OwnerId> {
    self.by_digest.get(&digest_key(key))
  }

  pub fn len(&self) -> usize { self.by_digest.len() }

  pub fn is_empty(&self) -> bool { self.by_digest.is_empty() }
}

/// The authenticated owner of the current request.
#[derive(Debug, Clone)]
pub struct Owner(pub OwnerId);

/// Resolve the request's owner from its headers.
pub fn verify_key(headers: &HeaderMap, keys: &ApiKeys) -> Result<OwnerId, ApiError> {
  let key = headers
    .get(API_KEY_HEADER)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|k| !k.is_empty())
    .ok_or(ApiError::Unauthorized)?;

  keys.resolve(key).cloned().ok_or(ApiError::Forbidden)
}

impl<S> FromRequestParts<AppState<S>> for Owner
where
  S: CatalogStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    verify_key(&parts.headers, &state.keys).map(Owner)
  }
}
