//! # Backend Client
//!
//! The cheap-to-clone handle the rest of the application uses to reach the backend.

use crate::backend::{Backend, BackendError, BackendRequest, Response};
use crate::model::{
    Click, Credentials, Link, LinkId, NewLink, Principal, PrincipalId, SignUpFields,
};
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

/// A type-safe client that forwards [`BackendRequest`]s over a Tokio mpsc channel and
/// waits for the answer on a oneshot channel.
///
/// * **Cloneable** – holds only a sender, so cloning is inexpensive.
/// * **Transport-agnostic** – the receiving end may be a [`BackendActor`](crate::backend::BackendActor)
///   or a test driving [`mock`](crate::backend::mock).
#[derive(Clone)]
pub struct BackendClient {
    sender: mpsc::Sender<BackendRequest>,
}

impl BackendClient {
    pub fn new(sender: mpsc::Sender<BackendRequest>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Response<T>) -> BackendRequest,
    ) -> Result<T, BackendError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| BackendError::Unavailable)?;
        response.await.map_err(|_| BackendError::Dropped)?
    }

    /// Stores a new link for `owner_id`.
    #[instrument(skip(self))]
    pub async fn create_link(
        &self,
        owner_id: PrincipalId,
        link: NewLink,
    ) -> Result<Link, BackendError> {
        debug!("Sending request");
        self.request(|respond_to| BackendRequest::CreateLink {
            owner_id,
            link,
            respond_to,
        })
        .await
    }

    /// Records one click against `link_id`.
    #[instrument(skip(self))]
    pub async fn record_click(&self, link_id: LinkId) -> Result<Click, BackendError> {
        debug!("Sending request");
        self.request(|respond_to| BackendRequest::RecordClick {
            link_id,
            respond_to,
        })
        .await
    }
}

#[async_trait]
impl Backend for BackendClient {
    #[instrument(skip(self))]
    async fn fetch_session(&self) -> Result<Option<Principal>, BackendError> {
        debug!("Sending request");
        self.request(|respond_to| BackendRequest::FetchSession { respond_to })
            .await
    }

    #[instrument(skip(self))]
    async fn fetch_links_by_owner(&self, owner_id: PrincipalId) -> Result<Vec<Link>, BackendError> {
        debug!("Sending request");
        self.request(|respond_to| BackendRequest::FetchLinksByOwner {
            owner_id,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    async fn fetch_clicks_for_links(
        &self,
        link_ids: Vec<LinkId>,
    ) -> Result<Vec<Click>, BackendError> {
        debug!("Sending request");
        self.request(|respond_to| BackendRequest::FetchClicksForLinks {
            link_ids,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    async fn login(&self, credentials: Credentials) -> Result<Principal, BackendError> {
        debug!("Sending request");
        self.request(|respond_to| BackendRequest::Login {
            credentials,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    async fn logout(&self) -> Result<(), BackendError> {
        debug!("Sending request");
        self.request(|respond_to| BackendRequest::Logout { respond_to })
            .await
    }

    #[instrument(skip(self))]
    async fn sign_up(&self, fields: SignUpFields) -> Result<Principal, BackendError> {
        debug!("Sending request");
        self.request(|respond_to| BackendRequest::SignUp { fields, respond_to })
            .await
    }
}
