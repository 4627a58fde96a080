//! # Session Store
//!
//! Holds the principal of the current session for the whole application.
//!
//! [`SessionStore`] is explicitly constructed and shared by cloning; every clone reads
//! and refreshes the same state. It is built on a single [`AsyncOperation`] whose work
//! is "fetch the current session", so it inherits the operation's ordering guarantees:
//! overlapping refreshes settle in trigger order, and only the store's own operation
//! ever writes principal state.
//!
//! ## Phases
//!
//! ```text
//! Uninitialized ──start──▶ Loading ──Ok(Some(p))──▶ Ready(Some(p))
//!                            ▲   ├───Ok(None)─────▶ Ready(None)
//!                            │   └───Err(e)───────▶ Error(e)
//!                            └──────── refresh ◀─────────┘
//! ```
//!
//! A failed lookup is *not* treated as "signed out" by the backend, but it is
//! unauthenticated for every gating purpose.

use crate::backend::{Backend, BackendError};
use crate::framework::{
    AsyncOperation, ErrorInfo, FrameworkError, OperationState, Status, UnitOfWork,
};
use crate::model::{Principal, PrincipalId, AUTHENTICATED_ROLE};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Asks the backend who is signed in.
pub struct FetchSession {
    backend: Arc<dyn Backend>,
}

impl FetchSession {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl UnitOfWork for FetchSession {
    type Args = ();
    type Output = Option<Principal>;
    type Error = BackendError;

    async fn run(&self, _args: ()) -> Result<Option<Principal>, BackendError> {
        self.backend.fetch_session().await
    }
}

/// Where the session store is in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
    Uninitialized,
    Loading,
    Ready(Option<Principal>),
    Error(ErrorInfo),
}

impl SessionPhase {
    fn from_state(state: &OperationState<Option<Principal>>) -> Self {
        match state.status {
            Status::Idle => Self::Uninitialized,
            Status::Pending => Self::Loading,
            Status::Succeeded => Self::Ready(state.data.clone().flatten()),
            Status::Failed => Self::Error(
                state
                    .error
                    .clone()
                    .unwrap_or_else(|| ErrorInfo::new("Session lookup failed")),
            ),
        }
    }
}

/// What collaborators see of the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub principal: Option<Principal>,
    pub is_authenticated: bool,
    /// True until the first lookup settles and during every refresh.
    pub loading: bool,
    pub error: Option<ErrorInfo>,
}

impl Session {
    fn from_state(state: &OperationState<Option<Principal>>, authenticated_role: &str) -> Self {
        let principal = state.data.clone().flatten();
        let is_authenticated = principal
            .as_ref()
            .is_some_and(|p| p.has_role(authenticated_role));
        Self {
            principal,
            is_authenticated,
            loading: matches!(state.status, Status::Idle | Status::Pending),
            error: state.error.clone(),
        }
    }

    pub fn principal_id(&self) -> Option<&PrincipalId> {
        self.principal.as_ref().map(|p| &p.id)
    }
}

/// Shared holder of the current principal.
///
/// ```rust
/// use std::sync::Arc;
/// use url_trimmer::backend::BackendActor;
/// use url_trimmer::session::SessionStore;
///
/// #[tokio::main]
/// async fn main() {
///     let (actor, client) = BackendActor::new(10, "https://trim.example");
///     tokio::spawn(actor.run());
///
///     let store = SessionStore::new(Arc::new(client));
///     let session = store.refresh_and_wait().await.unwrap();
///     assert!(!session.loading);
///     assert!(!session.is_authenticated);
/// }
/// ```
#[derive(Clone)]
pub struct SessionStore {
    operation: AsyncOperation<FetchSession>,
    authenticated_role: Arc<str>,
}

impl SessionStore {
    /// Creates a store that treats [`AUTHENTICATED_ROLE`] as signed in.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_role(backend, AUTHENTICATED_ROLE)
    }

    pub fn with_role(backend: Arc<dyn Backend>, authenticated_role: impl Into<Arc<str>>) -> Self {
        Self {
            operation: AsyncOperation::new(FetchSession::new(backend)),
            authenticated_role: authenticated_role.into(),
        }
    }

    /// Issues the initial session lookup. Does nothing once the store has left
    /// `Uninitialized`.
    pub fn start(&self) {
        if self.operation.snapshot().status == Status::Idle {
            info!("Loading session");
            self.operation.trigger(());
        }
    }

    /// Re-fetches the session in the background. Observe the result with
    /// [`subscribe`](Self::subscribe).
    pub fn refresh(&self) -> u64 {
        self.operation.trigger(())
    }

    /// Re-fetches the session and resolves with the settled value.
    pub async fn refresh_and_wait(&self) -> Result<Session, FrameworkError> {
        let state = self.operation.run(()).await?;
        Ok(Session::from_state(&state, &self.authenticated_role))
    }

    pub fn phase(&self) -> SessionPhase {
        SessionPhase::from_state(&self.operation.snapshot())
    }

    pub fn session(&self) -> Session {
        Session::from_state(&self.operation.snapshot(), &self.authenticated_role)
    }

    pub fn subscribe(&self) -> SessionWatch {
        SessionWatch {
            receiver: self.operation.subscribe(),
            authenticated_role: Arc::clone(&self.authenticated_role),
        }
    }
}

/// Change notification for a [`SessionStore`].
pub struct SessionWatch {
    receiver: watch::Receiver<OperationState<Option<Principal>>>,
    authenticated_role: Arc<str>,
}

impl SessionWatch {
    /// The latest session, marking it as seen.
    pub fn current(&mut self) -> Session {
        Session::from_state(&self.receiver.borrow_and_update(), &self.authenticated_role)
    }

    pub fn phase(&self) -> SessionPhase {
        SessionPhase::from_state(&self.receiver.borrow())
    }

    pub fn principal_id(&self) -> Option<PrincipalId> {
        self.receiver
            .borrow()
            .data
            .as_ref()
            .and_then(|principal| principal.as_ref())
            .map(|principal| principal.id.clone())
    }

    /// Waits for the next change and returns the new session.
    pub async fn changed(&mut self) -> Result<Session, FrameworkError> {
        self.receiver
            .changed()
            .await
            .map_err(|_| FrameworkError::OperationDropped)?;
        Ok(self.current())
    }

    /// Waits until a lookup has settled (successfully or not).
    pub async fn settled(&mut self) -> Result<Session, FrameworkError> {
        let state = self
            .receiver
            .wait_for(|state| state.is_settled())
            .await
            .map_err(|_| FrameworkError::OperationDropped)?;
        Ok(Session::from_state(&state, &self.authenticated_role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;

    fn principal(role: &str) -> Principal {
        Principal::new("user_1", "alice@example.com", role)
    }

    #[tokio::test]
    async fn test_ready_with_authenticated_principal() {
        let mut mock = MockBackend::new();
        mock.expect_fetch_session()
            .return_ok(Some(principal(AUTHENTICATED_ROLE)));
        let store = SessionStore::new(Arc::new(mock.client()));

        let initial = store.session();
        assert!(initial.loading);
        assert!(initial.principal.is_none());
        assert_eq!(store.phase(), SessionPhase::Uninitialized);

        let session = store.refresh_and_wait().await.unwrap();
        assert!(session.is_authenticated);
        assert!(!session.loading);
        assert_eq!(
            store.phase(),
            SessionPhase::Ready(Some(principal(AUTHENTICATED_ROLE)))
        );
        mock.verify();
    }

    #[tokio::test]
    async fn test_other_role_is_not_authenticated() {
        let mut mock = MockBackend::new();
        mock.expect_fetch_session().return_ok(Some(principal("anon")));
        let store = SessionStore::new(Arc::new(mock.client()));

        let session = store.refresh_and_wait().await.unwrap();
        assert!(session.principal.is_some());
        assert!(!session.is_authenticated);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_unauthenticated() {
        let mut mock = MockBackend::new();
        mock.expect_fetch_session()
            .return_err(BackendError::Query("lookup failed".into()));
        let store = SessionStore::new(Arc::new(mock.client()));

        let session = store.refresh_and_wait().await.unwrap();
        assert!(!session.is_authenticated);
        assert!(session.principal.is_none());
        assert_eq!(session.error.unwrap().message, "lookup failed");
        assert_eq!(
            store.phase(),
            SessionPhase::Error(ErrorInfo::new("lookup failed"))
        );
    }

    #[tokio::test]
    async fn test_start_is_issued_once() {
        let mut mock = MockBackend::new();
        mock.expect_fetch_session().return_ok(None);
        let store = SessionStore::new(Arc::new(mock.client()));
        let mut watch = store.subscribe();

        store.start();
        store.start();
        let session = watch.settled().await.unwrap();
        assert_eq!(session.principal, None);
        store.start();
        assert_eq!(watch.phase(), SessionPhase::Ready(None));
        mock.verify();
    }
}
