use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Role the backend assigns to signed-in principals.
pub const AUTHENTICATED_ROLE: &str = "authenticated";

/// Type-safe identifier for Principals.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(pub String);

impl From<&str> for PrincipalId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Display for PrincipalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The authenticated identity associated with a session.
///
/// `role` is assigned by the backend; only principals whose role equals the
/// configured authenticated role pass the route gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub email: String,
    pub role: String,
    pub username: Option<String>,
    /// Public URL of the uploaded profile picture.
    pub profile_pic: Option<String>,
}

impl Principal {
    /// Creates a new Principal instance.
    ///
    /// # Arguments
    /// * `id` - Identifier assigned by the backend
    /// * `email` - Login email address
    /// * `role` - Backend role, e.g. `"authenticated"`
    pub fn new(id: impl Into<String>, email: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: PrincipalId(id.into()),
            email: email.into(),
            role: role.into(),
            username: None,
            profile_pic: None,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}
