//! # Dashboard Pipeline
//!
//! Two chained operations feeding one derived view:
//!
//! ```text
//! session ──owner id──▶ Stage A: FetchLinks ──ids (non-empty)──▶ Stage B: FetchClicks
//!                                   │                                   │
//!                                   └───────── DashboardView ◀──────────┘ ◀── filter text
//! ```
//!
//! A background driver task follows the session and Stage A. Stage B is reset every time
//! Stage A settles and only re-triggered for a successful, non-empty result, so clicks
//! from an older link list are never mixed into a newer one. Changing the filter text is
//! a pure re-derivation and never fetches.

use crate::backend::{Backend, BackendError};
use crate::dashboard::DashboardView;
use crate::framework::{
    AsyncOperation, ErrorInfo, FrameworkError, OperationState, Status, UnitOfWork,
};
use crate::model::{Click, Link, LinkId, PrincipalId};
use crate::session::{SessionStore, SessionWatch};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Stage A: the links owned by a principal.
pub struct FetchLinks {
    backend: Arc<dyn Backend>,
}

#[async_trait]
impl UnitOfWork for FetchLinks {
    type Args = PrincipalId;
    type Output = Vec<Link>;
    type Error = BackendError;

    async fn run(&self, owner_id: PrincipalId) -> Result<Vec<Link>, BackendError> {
        self.backend.fetch_links_by_owner(owner_id).await
    }
}

/// Stage B: every click recorded against a batch of links.
pub struct FetchClicks {
    backend: Arc<dyn Backend>,
}

#[async_trait]
impl UnitOfWork for FetchClicks {
    type Args = Vec<LinkId>;
    type Output = Vec<Click>;
    type Error = BackendError;

    async fn run(&self, link_ids: Vec<LinkId>) -> Result<Vec<Click>, BackendError> {
        self.backend.fetch_clicks_for_links(link_ids).await
    }
}

/// The dashboard as observers see it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub view: DashboardView,
    pub loading: bool,
    pub error: Option<ErrorInfo>,
}

impl DashboardSnapshot {
    /// `source` is the Stage A sequence number Stage B was last reset for. When Stage A
    /// has settled past it, nothing in Stage B belongs to the visible links yet.
    fn compose(
        links: &OperationState<Vec<Link>>,
        clicks: &OperationState<Vec<Click>>,
        source: u64,
        filter_text: &str,
    ) -> Self {
        let link_list = links.data.as_deref().unwrap_or_default();
        let current = source == links.settled_seq;
        let awaiting_clicks = links.status == Status::Succeeded
            && !link_list.is_empty()
            && (!current || clicks.status == Status::Idle);

        let (click_list, clicks_loading, clicks_error): (&[Click], bool, Option<ErrorInfo>) =
            if current {
                (
                    clicks.data.as_deref().unwrap_or_default(),
                    clicks.loading(),
                    clicks.error.clone(),
                )
            } else {
                (&[], false, None)
            };

        Self {
            view: DashboardView::derive(link_list, click_list, filter_text),
            loading: links.loading() || clicks_loading || awaiting_clicks,
            error: links.error.clone().or(clicks_error),
        }
    }
}

/// Drives Stage A from the session and Stage B from Stage A.
///
/// Only the driver task composes snapshots, so every published snapshot pairs a link
/// list with the clicks fetched for it. Dropping the pipeline stops the driver and
/// abandons both stages.
pub struct DashboardPipeline {
    links: AsyncOperation<FetchLinks>,
    clicks: AsyncOperation<FetchClicks>,
    filter: watch::Sender<String>,
    published: Arc<watch::Sender<DashboardSnapshot>>,
    session: SessionStore,
    driver: JoinHandle<()>,
}

impl DashboardPipeline {
    /// Creates the pipeline and starts following `session`. Must be called inside a
    /// Tokio runtime.
    pub fn new(backend: Arc<dyn Backend>, session: SessionStore) -> Self {
        let links = AsyncOperation::new(FetchLinks {
            backend: Arc::clone(&backend),
        });
        let clicks = AsyncOperation::new(FetchClicks { backend });
        let (filter, filter_rx) = watch::channel(String::new());
        let (published, _) = watch::channel(DashboardSnapshot::default());
        let published = Arc::new(published);

        let driver = tokio::spawn(drive(
            session.subscribe(),
            filter_rx,
            links.clone(),
            clicks.clone(),
            Arc::clone(&published),
        ));

        Self {
            links,
            clicks,
            filter,
            published,
            session,
            driver,
        }
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.published.borrow().clone()
    }

    pub fn subscribe(&self) -> DashboardWatch {
        DashboardWatch {
            published: self.published.subscribe(),
        }
    }

    /// Replaces the filter text. Re-derives the view without fetching.
    pub fn set_filter_text(&self, filter_text: impl Into<String>) {
        let filter_text = filter_text.into();
        debug!(%filter_text, "Filter changed");
        self.filter.send_replace(filter_text);
    }

    pub fn filter_text(&self) -> String {
        self.filter.borrow().clone()
    }

    /// Re-fetches the links of the current principal. Returns `None` when nobody is
    /// signed in.
    pub fn refresh(&self) -> Option<u64> {
        let owner_id = self.session.session().principal_id()?.clone();
        info!(%owner_id, "Refreshing dashboard");
        Some(self.links.trigger(owner_id))
    }

    pub fn links_state(&self) -> OperationState<Vec<Link>> {
        self.links.snapshot()
    }

    pub fn clicks_state(&self) -> OperationState<Vec<Click>> {
        self.clicks.snapshot()
    }
}

impl Drop for DashboardPipeline {
    fn drop(&mut self) {
        self.driver.abort();
        self.links.abandon();
        self.clicks.abandon();
        self.published.send_if_modified(|snapshot| {
            let was_loading = snapshot.loading;
            snapshot.loading = false;
            was_loading
        });
    }
}

async fn drive(
    mut session: SessionWatch,
    mut filter: watch::Receiver<String>,
    links: AsyncOperation<FetchLinks>,
    clicks: AsyncOperation<FetchClicks>,
    published: Arc<watch::Sender<DashboardSnapshot>>,
) {
    let mut links_rx = links.subscribe();
    let mut clicks_rx = clicks.subscribe();
    let mut owner: Option<PrincipalId> = None;
    let mut source = 0;

    loop {
        let current_owner = session.principal_id();
        if current_owner != owner {
            owner = current_owner;
            source = 0;
            clicks.reset();
            links.reset();
            match &owner {
                Some(owner_id) => {
                    info!(%owner_id, "Loading dashboard");
                    links.trigger(owner_id.clone());
                }
                None => debug!("No principal, dashboard idle"),
            }
        }

        let links_state = links_rx.borrow_and_update().clone();
        if links_state.is_settled() && links_state.settled_seq != source {
            source = links_state.settled_seq;
            clicks.reset();

            match &links_state.data {
                Some(list) if !list.is_empty() => {
                    let link_ids: Vec<LinkId> = list.iter().map(|link| link.id.clone()).collect();
                    debug!(link_count = link_ids.len(), seq = source, "Loading clicks");
                    clicks.trigger(link_ids);
                }
                Some(_) => debug!(seq = source, "No links, skipping clicks"),
                None => debug!(seq = source, "Links failed, skipping clicks"),
            }
        }

        // Stage B only changes here or by settling the trigger above, so whatever it
        // holds now belongs to `source`.
        let clicks_state = clicks_rx.borrow_and_update().clone();
        let next = {
            let filter_text = filter.borrow_and_update();
            DashboardSnapshot::compose(&links_state, &clicks_state, source, &filter_text)
        };
        published.send_if_modified(|snapshot| {
            if *snapshot == next {
                return false;
            }
            *snapshot = next;
            true
        });

        let changed = tokio::select! {
            changed = session.changed() => changed.map(|_| ()),
            changed = links_rx.changed() => changed.map_err(|_| FrameworkError::OperationDropped),
            changed = clicks_rx.changed() => changed.map_err(|_| FrameworkError::OperationDropped),
            changed = filter.changed() => changed.map_err(|_| FrameworkError::OperationDropped),
        };
        if changed.is_err() {
            break;
        }
    }
}

/// Change notification for a [`DashboardPipeline`].
pub struct DashboardWatch {
    published: watch::Receiver<DashboardSnapshot>,
}

impl DashboardWatch {
    /// The latest snapshot, marking it as seen.
    pub fn current(&mut self) -> DashboardSnapshot {
        self.published.borrow_and_update().clone()
    }

    /// Waits until a new snapshot is published and returns it.
    pub async fn changed(&mut self) -> Result<DashboardSnapshot, FrameworkError> {
        self.published
            .changed()
            .await
            .map_err(|_| FrameworkError::OperationDropped)?;
        Ok(self.current())
    }

    /// Waits for the first snapshot satisfying `predicate`.
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&DashboardSnapshot) -> bool,
    ) -> Result<DashboardSnapshot, FrameworkError> {
        let mut snapshot = self.current();
        while !predicate(&snapshot) {
            snapshot = self.changed().await?;
        }
        Ok(snapshot)
    }
}
