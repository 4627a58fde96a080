//! # Auth Flows
//!
//! Login, sign-up and logout, each written as a short sequence of awaited steps:
//!
//! | Flow | Steps |
//! |------|-------|
//! | login | validate → `Backend::login` → refresh session → navigate to the dashboard |
//! | sign-up | validate → `Backend::sign_up` → refresh session → navigate to the dashboard |
//! | logout | `Backend::logout` → refresh session and wait → navigate to the landing page |
//!
//! Login and sign-up start the session refresh without waiting for it; the dashboard
//! gate shows its placeholder until the refresh settles. Logout waits so the landing
//! page never sees the old principal.
//!
//! Each remote call runs through its own [`AsyncOperation`], so forms can render
//! `loading` and the stored error from [`AuthFlows::login_state`] and friends.

pub mod error;
pub mod validation;

pub use error::AuthError;
pub use validation::{validate_credentials, validate_sign_up, Field, FieldErrors};

use crate::backend::{Backend, BackendError};
use crate::framework::{AsyncOperation, FrameworkError, OperationState, Status, UnitOfWork};
use crate::gate::{Navigator, Route};
use crate::model::{Credentials, Principal, SignUpFields};
use crate::session::{Session, SessionStore};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct Login {
    backend: Arc<dyn Backend>,
}

#[async_trait]
impl UnitOfWork for Login {
    type Args = Credentials;
    type Output = Principal;
    type Error = BackendError;

    async fn run(&self, credentials: Credentials) -> Result<Principal, BackendError> {
        self.backend.login(credentials).await
    }
}

pub struct Logout {
    backend: Arc<dyn Backend>,
}

#[async_trait]
impl UnitOfWork for Logout {
    type Args = ();
    type Output = ();
    type Error = BackendError;

    async fn run(&self, _args: ()) -> Result<(), BackendError> {
        self.backend.logout().await
    }
}

pub struct SignUp {
    backend: Arc<dyn Backend>,
}

#[async_trait]
impl UnitOfWork for SignUp {
    type Args = SignUpFields;
    type Output = Principal;
    type Error = BackendError;

    async fn run(&self, fields: SignUpFields) -> Result<Principal, BackendError> {
        self.backend.sign_up(fields).await
    }
}

/// Session-mutating flows sharing one [`SessionStore`] and [`Navigator`].
#[derive(Clone)]
pub struct AuthFlows {
    login: AsyncOperation<Login>,
    logout: AsyncOperation<Logout>,
    sign_up: AsyncOperation<SignUp>,
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
}

impl AuthFlows {
    pub fn new(
        backend: Arc<dyn Backend>,
        session: SessionStore,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            login: AsyncOperation::new(Login {
                backend: Arc::clone(&backend),
            }),
            logout: AsyncOperation::new(Logout {
                backend: Arc::clone(&backend),
            }),
            sign_up: AsyncOperation::new(SignUp { backend }),
            session,
            navigator,
        }
    }

    /// Signs in and sends the principal to the dashboard, carrying `create_new` along.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(
        &self,
        credentials: Credentials,
        create_new: Option<String>,
    ) -> Result<Principal, AuthError> {
        validate_credentials(&credentials).map_err(AuthError::Validation)?;
        let principal = outcome(self.login.run(credentials).await?)?;

        info!(id = %principal.id, "Logged in");
        self.session.refresh();
        self.navigator.navigate(&Route::Dashboard { create_new });
        Ok(principal)
    }

    /// Creates an account (which also signs it in) and sends it to the dashboard.
    #[instrument(skip(self, fields), fields(email = %fields.email))]
    pub async fn sign_up(
        &self,
        fields: SignUpFields,
        create_new: Option<String>,
    ) -> Result<Principal, AuthError> {
        validate_sign_up(&fields).map_err(AuthError::Validation)?;
        let principal = outcome(self.sign_up.run(fields).await?)?;

        info!(id = %principal.id, "Signed up");
        self.session.refresh();
        self.navigator.navigate(&Route::Dashboard { create_new });
        Ok(principal)
    }

    /// Revokes the remote session, waits for the local session to follow, then
    /// navigates to the landing page. Stops at the first failing step.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<Session, AuthError> {
        outcome(self.logout.run(()).await?)?;
        let session = self.session.refresh_and_wait().await?;
        if let Some(error) = &session.error {
            warn!(%error, "Session refresh after logout failed");
        }

        info!("Logged out");
        self.navigator.navigate(&Route::Landing);
        Ok(session)
    }

    pub fn login_state(&self) -> OperationState<Principal> {
        self.login.snapshot()
    }

    pub fn sign_up_state(&self) -> OperationState<Principal> {
        self.sign_up.snapshot()
    }

    pub fn logout_state(&self) -> OperationState<()> {
        self.logout.snapshot()
    }
}

fn outcome<T>(state: OperationState<T>) -> Result<T, AuthError> {
    match (state.status, state.data, state.error) {
        (Status::Succeeded, Some(data), _) => Ok(data),
        (_, _, Some(error)) => Err(AuthError::Backend(error)),
        _ => Err(FrameworkError::OperationDropped.into()),
    }
}
