//! # Customer Service - Domain Model
//!
//! Core domain entities and value objects for customer records. These types
//! are shared by every layer: persistence, cache and the REST shell.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Store-assigned customer identifier.
///
/// Assigned once on first persistence and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh, time-ordered identifier (UUID v7).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CustomerId {
    type Err = DomainError;

    /// Ids are opaque, so the input is taken verbatim or rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(DomainError::InvalidId("customer id must not be empty".to_string()));
        }
        if s.trim() != s {
            return Err(DomainError::InvalidId(format!(
                "customer id {s:?} has surrounding whitespace"
            )));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for CustomerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CustomerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// =============================================================================
// VALUE OBJECTS
// =============================================================================

/// Client-supplied customer fields, without an identity.
///
/// Used both to create a record and as the change set of an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub email: String,
    pub address: String,
}

impl CustomerDetails {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            address: address.into(),
        }
    }
}

// =============================================================================
// ENTITIES
// =============================================================================

/// A customer record as held by the Store.
///
/// `id` is `None` until the Store persists the record for the first time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CustomerId>,
    pub name: String,
    pub email: String,
    pub address: String,
}

impl Customer {
    /// Build an unsaved record from client details.
    #[must_use]
    pub fn new(details: CustomerDetails) -> Self {
        Self {
            id: None,
            name: details.name,
            email: details.email,
            address: details.address,
        }
    }

    /// Build a record that already carries a Store identity.
    #[must_use]
    pub fn with_id(id: CustomerId, details: CustomerDetails) -> Self {
        Self {
            id: Some(id),
            ..Self::new(details)
        }
    }

    /// Overwrite the mutable fields. The id is left untouched.
    pub fn apply(&mut self, details: &CustomerDetails) {
        self.name.clone_from(&details.name);
        self.email.clone_from(&details.email);
        self.address.clone_from(&details.address);
    }

    #[must_use]
    pub fn details(&self) -> CustomerDetails {
        CustomerDetails::new(&self.name, &self.email, &self.address)
    }

    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("Invalid customer id: {0}")]
    InvalidId(String),
}
