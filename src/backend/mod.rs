//! # Remote Backend
//!
//! The application never talks to storage directly. Everything it needs from the remote
//! backend is expressed by the [`Backend`] trait: session lookup, link and click queries,
//! and the three calls that mutate the remote session (login, logout, sign-up).
//!
//! ## Implementations
//!
//! - [`BackendClient`] speaks a request/response message protocol ([`BackendRequest`])
//!   over a Tokio channel. On the other end sits either:
//!   - [`BackendActor`], an in-process store that owns accounts, the active session,
//!     links and clicks, or
//!   - the [`mock`] module, where a test answers each request itself.
//!
//! ## Error Contract
//!
//! "No active session" is **not** an error: [`Backend::fetch_session`] returns `Ok(None)`.
//! Calls only fail when the lookup or query itself fails ([`BackendError`]).

pub mod client;
pub mod error;
pub mod message;
pub mod mock;
pub mod store;

pub use client::BackendClient;
pub use error::BackendError;
pub use message::{BackendRequest, Response};
pub use store::BackendActor;

use crate::model::{Click, Credentials, Link, LinkId, Principal, PrincipalId, SignUpFields};
use async_trait::async_trait;

/// Collaborator contract consumed by the session store, the dashboard and the auth flows.
#[async_trait]
pub trait Backend: Send + Sync {
    /// The principal of the active session, or `None` when nobody is signed in.
    async fn fetch_session(&self) -> Result<Option<Principal>, BackendError>;

    /// All links owned by `owner_id`.
    async fn fetch_links_by_owner(&self, owner_id: PrincipalId) -> Result<Vec<Link>, BackendError>;

    /// All clicks whose link id is in `link_ids`, in one call.
    async fn fetch_clicks_for_links(&self, link_ids: Vec<LinkId>)
        -> Result<Vec<Click>, BackendError>;

    async fn login(&self, credentials: Credentials) -> Result<Principal, BackendError>;

    async fn logout(&self) -> Result<(), BackendError>;

    async fn sign_up(&self, fields: SignUpFields) -> Result<Principal, BackendError>;
}
