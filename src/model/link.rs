use crate::model::PrincipalId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Type-safe identifier for Links.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(pub String);

impl From<&str> for LinkId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A shortened-link record owned by a principal.
///
/// Links are created by the backend and read-only from the dashboard's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub title: String,
    pub short_url: String,
    pub original_url: String,
    pub owner_id: PrincipalId,
    pub created_at: DateTime<Utc>,
}

impl Link {
    /// Creates a new Link instance.
    ///
    /// # Arguments
    /// * `id` - Identifier assigned by the backend
    /// * `title` - Display title, matched by the dashboard filter
    /// * `owner_id` - Principal that owns the link
    ///
    /// # Notes
    /// `short_url` and `original_url` start empty and `created_at` is set to now.
    pub fn new(id: impl Into<String>, title: impl Into<String>, owner_id: PrincipalId) -> Self {
        Self {
            id: LinkId(id.into()),
            title: title.into(),
            short_url: String::new(),
            original_url: String::new(),
            owner_id,
            created_at: Utc::now(),
        }
    }
}

/// Payload for creating a new link.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub title: String,
    pub original_url: String,
}
