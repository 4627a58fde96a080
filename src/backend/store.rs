//! # In-Process Backend
//!
//! This module defines [`BackendActor`], the server half of the backend protocol. It owns
//! every piece of remote state the application reads: registered accounts, the active
//! session, links, clicks and uploaded profile pictures.
//!
//! **Concurrency Model**: the actor processes one [`BackendRequest`] at a time inside its
//! own task, so the state needs no locking.

use crate::backend::{BackendClient, BackendError, BackendRequest};
use crate::model::{
    Click, Credentials, Link, LinkId, NewLink, Principal, PrincipalId, SignUpFields,
    AUTHENTICATED_ROLE,
};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const INVALID_CREDENTIALS: &str = "Invalid login credentials";
const ALREADY_REGISTERED: &str = "User already registered";

struct Account {
    principal: Principal,
    password: String,
}

/// Owns the backend state and answers requests sent through a [`BackendClient`].
///
/// # Usage Pattern
///
/// ```rust
/// use url_trimmer::backend::{Backend, BackendActor};
///
/// #[tokio::main]
/// async fn main() {
///     let (actor, client) = BackendActor::new(10, "https://trim.example");
///     tokio::spawn(actor.run());
///
///     // Nobody is signed in yet
///     assert_eq!(client.fetch_session().await.unwrap(), None);
/// }
/// ```
pub struct BackendActor {
    receiver: mpsc::Receiver<BackendRequest>,
    public_base_url: String,
    /// Keyed by email.
    accounts: HashMap<String, Account>,
    session: Option<String>,
    links: Vec<Link>,
    clicks: Vec<Click>,
    /// Uploaded objects keyed by file name.
    objects: HashMap<String, Vec<u8>>,
    next_id: u32,
}

impl BackendActor {
    /// Creates a new `BackendActor` and its associated [`BackendClient`].
    ///
    /// # Arguments
    ///
    /// * `buffer_size` - Capacity of the request channel
    /// * `public_base_url` - Prefix for short links and public object URLs
    pub fn new(buffer_size: usize, public_base_url: impl Into<String>) -> (Self, BackendClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            accounts: HashMap::new(),
            session: None,
            links: Vec::new(),
            clicks: Vec::new(),
            objects: HashMap::new(),
            next_id: 1,
        };
        (actor, BackendClient::new(sender))
    }

    /// Runs the event loop until every client has been dropped.
    pub async fn run(mut self) {
        info!("Backend started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                BackendRequest::FetchSession { respond_to } => {
                    let principal = self.current_principal();
                    debug!(signed_in = principal.is_some(), "FetchSession");
                    let _ = respond_to.send(Ok(principal));
                }
                BackendRequest::FetchLinksByOwner {
                    owner_id,
                    respond_to,
                } => {
                    let links: Vec<Link> = self
                        .links
                        .iter()
                        .filter(|link| link.owner_id == owner_id)
                        .cloned()
                        .collect();
                    debug!(%owner_id, count = links.len(), "FetchLinksByOwner");
                    let _ = respond_to.send(Ok(links));
                }
                BackendRequest::FetchClicksForLinks {
                    link_ids,
                    respond_to,
                } => {
                    let clicks: Vec<Click> = self
                        .clicks
                        .iter()
                        .filter(|click| link_ids.contains(&click.link_id))
                        .cloned()
                        .collect();
                    debug!(links = link_ids.len(), count = clicks.len(), "FetchClicksForLinks");
                    let _ = respond_to.send(Ok(clicks));
                }
                BackendRequest::Login {
                    credentials,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.login(credentials));
                }
                BackendRequest::Logout { respond_to } => {
                    if let Some(email) = self.session.take() {
                        info!(%email, "Signed out");
                    }
                    let _ = respond_to.send(Ok(()));
                }
                BackendRequest::SignUp { fields, respond_to } => {
                    let _ = respond_to.send(self.sign_up(fields));
                }
                BackendRequest::CreateLink {
                    owner_id,
                    link,
                    respond_to,
                } => {
                    let _ = respond_to.send(Ok(self.create_link(owner_id, link)));
                }
                BackendRequest::RecordClick {
                    link_id,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.record_click(link_id));
                }
            }
        }

        info!(
            accounts = self.accounts.len(),
            links = self.links.len(),
            clicks = self.clicks.len(),
            objects = self.objects.len(),
            "Shutdown"
        );
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn current_principal(&self) -> Option<Principal> {
        self.session
            .as_ref()
            .and_then(|email| self.accounts.get(email))
            .map(|account| account.principal.clone())
    }

    fn login(&mut self, credentials: Credentials) -> Result<Principal, BackendError> {
        match self.accounts.get(&credentials.email) {
            Some(account) if account.password == credentials.password => {
                info!(email = %credentials.email, "Signed in");
                self.session = Some(credentials.email);
                Ok(account.principal.clone())
            }
            _ => {
                warn!(email = %credentials.email, "Login rejected");
                Err(BackendError::Rejected(INVALID_CREDENTIALS.to_string()))
            }
        }
    }

    fn sign_up(&mut self, fields: SignUpFields) -> Result<Principal, BackendError> {
        if self.accounts.contains_key(&fields.email) {
            warn!(email = %fields.email, "Sign-up rejected");
            return Err(BackendError::Rejected(ALREADY_REGISTERED.to_string()));
        }

        let profile_pic = match fields.profile_pic {
            Some(picture) => {
                let file_name = format!(
                    "dp-{}-{}",
                    fields.username.split(' ').collect::<Vec<_>>().join("-"),
                    self.next_id()
                );
                debug!(%file_name, bytes = picture.bytes.len(), "Stored profile picture");
                self.objects.insert(file_name.clone(), picture.bytes);
                Some(format!(
                    "{}/storage/v1/object/public/profile-pic/{file_name}",
                    self.public_base_url
                ))
            }
            None => None,
        };

        let mut principal = Principal::new(
            format!("user_{}", self.next_id()),
            fields.email.clone(),
            AUTHENTICATED_ROLE,
        );
        principal.username = Some(fields.username);
        principal.profile_pic = profile_pic;

        info!(id = %principal.id, email = %fields.email, "Signed up");
        self.accounts.insert(
            fields.email.clone(),
            Account {
                principal: principal.clone(),
                password: fields.password,
            },
        );
        self.session = Some(fields.email);
        Ok(principal)
    }

    fn create_link(&mut self, owner_id: PrincipalId, new_link: NewLink) -> Link {
        let n = self.next_id();
        let mut link = Link::new(n.to_string(), new_link.title, owner_id);
        link.original_url = new_link.original_url;
        link.short_url = format!("{}/{:04x}", self.public_base_url, n);
        info!(id = %link.id, owner_id = %link.owner_id, "Created link");
        self.links.push(link.clone());
        link
    }

    fn record_click(&mut self, link_id: LinkId) -> Result<Click, BackendError> {
        if !self.links.iter().any(|link| link.id == link_id) {
            warn!(%link_id, "Click on unknown link");
            return Err(BackendError::Rejected(format!("Unknown link {link_id}")));
        }
        let click = Click::new(format!("c{}", self.next_id()), link_id.0);
        debug!(id = %click.id, link_id = %click.link_id, "Recorded click");
        self.clicks.push(click.clone());
        Ok(click)
    }
}
