//! # Application Lifecycle
//!
//! [`TrimmerApp`] wires the backend, the session store, the auth flows and the route gate
//! together, and tears them down again.

pub mod tracing;

use crate::auth::AuthFlows;
use crate::backend::{Backend, BackendActor, BackendClient};
use crate::config::AppConfig;
use crate::dashboard::DashboardPipeline;
use crate::gate::{GuestGate, HistoryNavigator, Navigator, RouteGate};
use crate::session::SessionStore;
use ::tracing::{error, info};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// The running application.
///
/// # Example
///
/// ```rust
/// use url_trimmer::config::AppConfig;
/// use url_trimmer::lifecycle::TrimmerApp;
///
/// #[tokio::main]
/// async fn main() -> Result<(), String> {
///     let app = TrimmerApp::new(AppConfig::default());
///     let session = app.session.refresh_and_wait().await.map_err(|e| e.to_string())?;
///     assert!(!session.is_authenticated);
///     app.shutdown().await
/// }
/// ```
pub struct TrimmerApp {
    /// Direct handle on the backend, used to seed links and clicks
    pub backend: BackendClient,

    pub session: SessionStore,

    pub auth: AuthFlows,

    /// Records every navigation the core issues
    pub navigator: Arc<HistoryNavigator>,

    /// Gate in front of the dashboard
    pub gate: RouteGate,

    /// Gate in front of the login surface
    pub guest_gate: GuestGate,

    config: AppConfig,

    /// Task handles of spawned services (used for graceful shutdown)
    handles: Vec<JoinHandle<()>>,
}

impl TrimmerApp {
    /// Starts an in-process backend and wires the application against it.
    pub fn new(config: AppConfig) -> Self {
        let (actor, client) =
            BackendActor::new(config.backend_buffer_size, config.public_base_url.clone());
        let handle = tokio::spawn(actor.run());

        let mut app = Self::with_client(config, client);
        app.handles.push(handle);
        app
    }

    /// Wires the application against an already running backend.
    ///
    /// The initial session lookup is issued immediately.
    pub fn with_client(config: AppConfig, client: BackendClient) -> Self {
        let backend: Arc<dyn Backend> = Arc::new(client.clone());
        let navigator = Arc::new(HistoryNavigator::new());
        let session = SessionStore::with_role(
            Arc::clone(&backend),
            config.authenticated_role.as_str(),
        );
        let auth = AuthFlows::new(
            backend,
            session.clone(),
            navigator.clone() as Arc<dyn Navigator>,
        );
        let gate = RouteGate::new(navigator.clone());
        let guest_gate = GuestGate::new(navigator.clone());

        session.start();

        Self {
            backend: client,
            session,
            auth,
            navigator,
            gate,
            guest_gate,
            config,
            handles: Vec::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Creates a dashboard pipeline following this application's session.
    pub fn dashboard(&self) -> DashboardPipeline {
        DashboardPipeline::new(Arc::new(self.backend.clone()), self.session.clone())
    }

    /// Shuts the application down and waits for the backend to stop.
    ///
    /// Every [`DashboardPipeline`] created through [`dashboard`](Self::dashboard) must be
    /// dropped first; each holds a backend client that keeps the backend alive.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down application...");

        // Dropping every client closes the backend's request channel
        drop(self.auth);
        drop(self.session);
        drop(self.backend);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Service task failed: {:?}", e);
                return Err(format!("Service task failed: {:?}", e));
            }
        }

        info!("Application shutdown complete.");
        Ok(())
    }
}
