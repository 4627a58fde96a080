//! # Backend Messages
//!
//! This module defines the request type sent from a [`BackendClient`](crate::backend::BackendClient)
//! to whatever answers it. Each variant carries a oneshot sender the answer goes back on.

use crate::backend::BackendError;
use crate::model::{
    Click, Credentials, Link, LinkId, NewLink, Principal, PrincipalId, SignUpFields,
};
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel.
pub type Response<T> = oneshot::Sender<Result<T, BackendError>>;

/// A request to the remote backend.
///
/// The first six variants mirror the [`Backend`](crate::backend::Backend) trait. `CreateLink`
/// and `RecordClick` are used to seed data; the dashboard itself never writes.
#[derive(Debug)]
pub enum BackendRequest {
    FetchSession {
        respond_to: Response<Option<Principal>>,
    },
    FetchLinksByOwner {
        owner_id: PrincipalId,
        respond_to: Response<Vec<Link>>,
    },
    FetchClicksForLinks {
        link_ids: Vec<LinkId>,
        respond_to: Response<Vec<Click>>,
    },
    Login {
        credentials: Credentials,
        respond_to: Response<Principal>,
    },
    Logout {
        respond_to: Response<()>,
    },
    SignUp {
        fields: SignUpFields,
        respond_to: Response<Principal>,
    },
    CreateLink {
        owner_id: PrincipalId,
        link: NewLink,
        respond_to: Response<Link>,
    },
    RecordClick {
        link_id: LinkId,
        respond_to: Response<Click>,
    },
}
