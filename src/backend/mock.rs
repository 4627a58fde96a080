//! # Mock Backend & Testing Guide
//!
//! [`MockBackend`] hands out a real [`BackendClient`] whose requests are answered from a
//! queue of expectations instead of the in-process store. It lets tests inject backend
//! failures and control exactly what each call returns.
//!
//! ## Testing Strategies
//!
//! | Pattern | Use | Tooling |
//! |---------|-----|---------|
//! | **Scripted** | Fixed answers, order checked | [`MockBackend`] + `verify()` |
//! | **Manual** | Control *when* each answer arrives | [`create_mock_backend`] + `expect_*` helpers |
//! | **Full system** | End-to-end flows | [`BackendActor`](crate::backend::BackendActor) |
//!
//! <details>
//! <summary><b>Scripted answers</b></summary>
//!
//! ```rust
//! use url_trimmer::backend::mock::MockBackend;
//! use url_trimmer::backend::{Backend, BackendError};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockBackend::new();
//!     mock.expect_fetch_session()
//!         .return_err(BackendError::Query("session lookup failed".into()));
//!
//!     let client = mock.client();
//!     let result = client.fetch_session().await;
//!     assert!(matches!(result, Err(BackendError::Query(_))));
//!     mock.verify();
//! }
//! ```
//! </details>
//!
//! <details>
//! <summary><b>Manual answers</b></summary>
//!
//! Out-of-order settlement can only be reproduced if the test decides when a response is
//! delivered. The raw helpers return the request payload together with its responder:
//!
//! ```rust
//! use url_trimmer::backend::mock::{create_mock_backend, expect_fetch_session};
//! use url_trimmer::backend::Backend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (client, mut requests) = create_mock_backend(10);
//!     let pending = tokio::spawn(async move { client.fetch_session().await });
//!
//!     let respond_to = expect_fetch_session(&mut requests).await.unwrap();
//!     respond_to.send(Ok(None)).unwrap();
//!     assert_eq!(pending.await.unwrap(), Ok(None));
//! }
//! ```
//! </details>

use crate::backend::{BackendClient, BackendError, BackendRequest, Response};
use crate::model::{Click, Credentials, Link, LinkId, Principal, PrincipalId, SignUpFields};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

#[derive(Debug)]
enum Expectation {
    FetchSession(Result<Option<Principal>, BackendError>),
    FetchLinks {
        owner_id: PrincipalId,
        response: Result<Vec<Link>, BackendError>,
    },
    FetchClicks(Result<Vec<Click>, BackendError>),
    Login(Result<Principal, BackendError>),
    Logout(Result<(), BackendError>),
    SignUp(Result<Principal, BackendError>),
}

type Queue = Arc<Mutex<VecDeque<Expectation>>>;

/// A mock backend with expectation tracking for fluent testing.
///
/// Requests must arrive in the order expectations were registered; anything else panics
/// the answering task, which the caller observes as [`BackendError::Dropped`].
pub struct MockBackend {
    client: BackendClient,
    expectations: Queue,
    _handle: tokio::task::JoinHandle<()>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Creates a mock backend with no expectations.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<BackendRequest>(100);
        let expectations: Queue = Arc::new(Mutex::new(VecDeque::new()));
        let queue = expectations.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = queue.lock().unwrap().pop_front();

                match (request, expectation) {
                    (
                        BackendRequest::FetchSession { respond_to },
                        Some(Expectation::FetchSession(response)),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        BackendRequest::FetchLinksByOwner {
                            owner_id,
                            respond_to,
                        },
                        Some(Expectation::FetchLinks {
                            owner_id: expected,
                            response,
                        }),
                    ) => {
                        assert_eq!(owner_id, expected, "links fetched for unexpected owner");
                        let _ = respond_to.send(response);
                    }
                    (
                        BackendRequest::FetchClicksForLinks { respond_to, .. },
                        Some(Expectation::FetchClicks(response)),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (BackendRequest::Login { respond_to, .. }, Some(Expectation::Login(response))) => {
                        let _ = respond_to.send(response);
                    }
                    (BackendRequest::Logout { respond_to }, Some(Expectation::Logout(response))) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        BackendRequest::SignUp { respond_to, .. },
                        Some(Expectation::SignUp(response)),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (request, expectation) => {
                        panic!(
                            "Unexpected request or expectation mismatch: {request:?} vs {expectation:?}"
                        );
                    }
                }
            }
        });

        Self {
            client: BackendClient::new(sender),
            expectations,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> BackendClient {
        self.client.clone()
    }

    pub fn expect_fetch_session(&mut self) -> ExpectationBuilder<Option<Principal>> {
        ExpectationBuilder::new(self.expectations.clone(), Expectation::FetchSession)
    }

    /// Expects the links of `owner_id` to be fetched.
    pub fn expect_fetch_links(&mut self, owner_id: PrincipalId) -> ExpectationBuilder<Vec<Link>> {
        ExpectationBuilder::new(self.expectations.clone(), move |response| {
            Expectation::FetchLinks { owner_id, response }
        })
    }

    pub fn expect_fetch_clicks(&mut self) -> ExpectationBuilder<Vec<Click>> {
        ExpectationBuilder::new(self.expectations.clone(), Expectation::FetchClicks)
    }

    pub fn expect_login(&mut self) -> ExpectationBuilder<Principal> {
        ExpectationBuilder::new(self.expectations.clone(), Expectation::Login)
    }

    pub fn expect_logout(&mut self) -> ExpectationBuilder<()> {
        ExpectationBuilder::new(self.expectations.clone(), Expectation::Logout)
    }

    pub fn expect_sign_up(&mut self) -> ExpectationBuilder<Principal> {
        ExpectationBuilder::new(self.expectations.clone(), Expectation::SignUp)
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            panic!("Not all expectations were met. {} remaining", exps.len());
        }
    }
}

/// Builder that queues one expectation once it is given a response.
pub struct ExpectationBuilder<T> {
    expectations: Queue,
    wrap: Box<dyn FnOnce(Result<T, BackendError>) -> Expectation + Send>,
}

impl<T> ExpectationBuilder<T> {
    fn new(
        expectations: Queue,
        wrap: impl FnOnce(Result<T, BackendError>) -> Expectation + Send + 'static,
    ) -> Self {
        Self {
            expectations,
            wrap: Box::new(wrap),
        }
    }

    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: T) {
        self.push(Ok(value));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: BackendError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<T, BackendError>) {
        let expectation = (self.wrap)(response);
        self.expectations.lock().unwrap().push_back(expectation);
    }
}

// =============================================================================
// MANUAL HELPERS
// =============================================================================

/// Creates a client and the receiver its requests arrive on.
///
/// Use this when a test needs to hold a response back, e.g. to settle two invocations
/// in reverse order.
pub fn create_mock_backend(buffer_size: usize) -> (BackendClient, mpsc::Receiver<BackendRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (BackendClient::new(sender), receiver)
}

/// Helper to verify that the next message is a FetchSession request
pub async fn expect_fetch_session(
    receiver: &mut mpsc::Receiver<BackendRequest>,
) -> Option<Response<Option<Principal>>> {
    match receiver.recv().await {
        Some(BackendRequest::FetchSession { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Helper to verify that the next message is a FetchLinksByOwner request
pub async fn expect_fetch_links(
    receiver: &mut mpsc::Receiver<BackendRequest>,
) -> Option<(PrincipalId, Response<Vec<Link>>)> {
    match receiver.recv().await {
        Some(BackendRequest::FetchLinksByOwner {
            owner_id,
            respond_to,
        }) => Some((owner_id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a FetchClicksForLinks request
pub async fn expect_fetch_clicks(
    receiver: &mut mpsc::Receiver<BackendRequest>,
) -> Option<(Vec<LinkId>, Response<Vec<Click>>)> {
    match receiver.recv().await {
        Some(BackendRequest::FetchClicksForLinks {
            link_ids,
            respond_to,
        }) => Some((link_ids, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Login request
pub async fn expect_login(
    receiver: &mut mpsc::Receiver<BackendRequest>,
) -> Option<(Credentials, Response<Principal>)> {
    match receiver.recv().await {
        Some(BackendRequest::Login {
            credentials,
            respond_to,
        }) => Some((credentials, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Logout request
pub async fn expect_logout(
    receiver: &mut mpsc::Receiver<BackendRequest>,
) -> Option<Response<()>> {
    match receiver.recv().await {
        Some(BackendRequest::Logout { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Helper to verify that the next message is a SignUp request
pub async fn expect_sign_up(
    receiver: &mut mpsc::Receiver<BackendRequest>,
) -> Option<(SignUpFields, Response<Principal>)> {
    match receiver.recv().await {
        Some(BackendRequest::SignUp { fields, respond_to }) => Some((fields, respond_to)),
        _ => None,
    }
}
