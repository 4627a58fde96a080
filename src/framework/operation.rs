//! # Async Operation
//!
//! This module defines [`AsyncOperation`], the generic state machine that wraps one
//! asynchronous unit of work and publishes its progress as consistent snapshots.
//!
//! ## State Machine
//!
//! ```text
//!            trigger                 Ok(data)
//!   Idle ───────────────▶ Pending ───────────────▶ Succeeded
//!     ▲                     │  ▲                        │
//!     │ reset               │  └──────── trigger ───────┤
//!     │                     │ Err(e)                    │
//!     └──────────────────── ▼ ◀──────── trigger ────────┘
//!                         Failed
//! ```
//!
//! - **Pending** clears the error and keeps the previously settled data visible.
//! - **Succeeded** stores the data and clears the error.
//! - **Failed** stores a normalized [`ErrorInfo`] and clears the data, so `data`
//!   and `error` are never both present.
//!
//! ## Ordering
//!
//! Every invocation is tagged with a monotonically increasing sequence number when it
//! is triggered. A settlement is applied only if its number is still the latest issued;
//! anything older is discarded. The most recently *triggered* call is authoritative,
//! regardless of the order in which the backend answers.
//!
//! ## Observing
//!
//! State lives in a `tokio::sync::watch` channel. [`AsyncOperation::snapshot`] clones the
//! current value, [`AsyncOperation::subscribe`] hands out a receiver for change
//! notification. Writers hold the channel lock for the whole transition, so readers
//! never see a half-applied update.

use crate::framework::error::{ErrorInfo, FrameworkError};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// One asynchronous unit of work, e.g. "fetch the links owned by a principal".
///
/// Associated types keep every operation strongly typed: an operation built around
/// `FetchLinks` only accepts a principal id and only ever publishes `Vec<Link>`.
#[async_trait]
pub trait UnitOfWork: Send + Sync + 'static {
    /// Input passed to each invocation.
    type Args: Send + Debug + 'static;

    /// Value published on success.
    type Output: Clone + Send + Sync + Debug + 'static;

    /// Failure type; normalized into an [`ErrorInfo`] when stored.
    type Error: std::error::Error + Send + Sync + 'static;

    async fn run(&self, args: Self::Args) -> Result<Self::Output, Self::Error>;
}

/// Lifecycle of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Status {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
}

/// A consistent snapshot of an operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationState<T> {
    pub data: Option<T>,
    pub error: Option<ErrorInfo>,
    pub status: Status,
    /// Sequence number of the invocation that produced the current settled values.
    /// `0` until the first settlement.
    pub settled_seq: u64,
}

impl<T> OperationState<T> {
    pub fn idle() -> Self {
        Self {
            data: None,
            error: None,
            status: Status::Idle,
            settled_seq: 0,
        }
    }

    /// True exactly while the operation is pending.
    pub fn loading(&self) -> bool {
        self.status == Status::Pending
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.status, Status::Succeeded | Status::Failed)
    }
}

impl<T> Default for OperationState<T> {
    fn default() -> Self {
        Self::idle()
    }
}

/// Wraps a [`UnitOfWork`] and tracks result, error and busy flag.
///
/// Cloning is cheap and every clone drives the same state. When the last clone is
/// dropped, in-flight invocations are aborted and can no longer touch the state.
pub struct AsyncOperation<W: UnitOfWork> {
    shared: Arc<Shared<W>>,
}

impl<W: UnitOfWork> Clone for AsyncOperation<W> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

struct Shared<W: UnitOfWork> {
    work: Arc<W>,
    name: &'static str,
    latest: AtomicU64,
    state: watch::Sender<OperationState<W::Output>>,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl<W: UnitOfWork> AsyncOperation<W> {
    pub fn new(work: W) -> Self {
        // Just the type name, e.g. "FetchLinks"
        let name = std::any::type_name::<W>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        let (state, _) = watch::channel(OperationState::idle());
        Self {
            shared: Arc::new(Shared {
                work: Arc::new(work),
                name,
                latest: AtomicU64::new(0),
                state,
                in_flight: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.shared.name
    }

    /// Starts an invocation on a background task and returns its sequence number.
    ///
    /// The caller must not assume synchronous completion; observe the outcome through
    /// [`snapshot`](Self::snapshot) or [`subscribe`](Self::subscribe).
    pub fn trigger(&self, args: W::Args) -> u64 {
        let seq = self.shared.begin(&args);
        let work = Arc::clone(&self.shared.work);
        let shared = Arc::downgrade(&self.shared);

        let handle = tokio::spawn(async move {
            let result = work.run(args).await;
            if let Some(shared) = shared.upgrade() {
                shared.settle(seq, result);
            }
        });
        self.shared.track(handle);
        seq
    }

    /// Runs an invocation inline and returns the state it settled into.
    ///
    /// Goes through the same transitions as [`trigger`](Self::trigger). Returns
    /// [`FrameworkError::Superseded`] if a newer invocation was triggered meanwhile.
    pub async fn run(&self, args: W::Args) -> Result<OperationState<W::Output>, FrameworkError> {
        let seq = self.shared.begin(&args);
        let result = self.shared.work.run(args).await;
        self.shared
            .settle(seq, result)
            .ok_or(FrameworkError::Superseded(seq))
    }

    /// Abandons in-flight work and returns to `Idle` with no data and no error.
    pub fn reset(&self) {
        let name = self.shared.name;
        self.shared.state.send_modify(|state| {
            let seq = self.shared.latest.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(operation = name, seq, "Reset");
            *state = OperationState::idle();
        });
        self.shared.abort_in_flight();
    }

    /// Abandons interest in in-flight work while keeping the last settled values.
    pub fn abandon(&self) {
        let name = self.shared.name;
        self.shared.state.send_if_modified(|state| {
            let seq = self.shared.latest.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(operation = name, seq, "Abandon");
            if state.status != Status::Pending {
                return false;
            }
            state.status = if state.data.is_some() {
                Status::Succeeded
            } else {
                Status::Idle
            };
            true
        });
        self.shared.abort_in_flight();
    }

    pub fn snapshot(&self) -> OperationState<W::Output> {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<OperationState<W::Output>> {
        self.shared.state.subscribe()
    }

    pub fn loading(&self) -> bool {
        self.shared.state.borrow().loading()
    }

    /// Waits until the operation is no longer pending.
    pub async fn settled(&self) -> Result<OperationState<W::Output>, FrameworkError> {
        let mut receiver = self.subscribe();
        let state = receiver
            .wait_for(|state| !state.loading())
            .await
            .map_err(|_| FrameworkError::OperationDropped)?;
        Ok(state.clone())
    }
}

impl<W: UnitOfWork> Shared<W> {
    /// Issues the next sequence number and enters `Pending` under the channel lock.
    fn begin(&self, args: &W::Args) -> u64 {
        let mut seq = 0;
        self.state.send_modify(|state| {
            seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            state.status = Status::Pending;
            state.error = None;
        });
        debug!(operation = self.name, seq, ?args, "Trigger");
        seq
    }

    /// Applies a settlement if `seq` is still the latest invocation.
    fn settle(
        &self,
        seq: u64,
        result: Result<W::Output, W::Error>,
    ) -> Option<OperationState<W::Output>> {
        let mut applied = None;
        self.state.send_if_modified(|state| {
            if self.latest.load(Ordering::SeqCst) != seq {
                debug!(operation = self.name, seq, "Discarding stale settlement");
                return false;
            }
            match result {
                Ok(data) => {
                    debug!(operation = self.name, seq, "Succeeded");
                    state.data = Some(data);
                    state.error = None;
                    state.status = Status::Succeeded;
                }
                Err(e) => {
                    warn!(operation = self.name, seq, error = %e, "Failed");
                    state.data = None;
                    state.error = Some(ErrorInfo::from_error(&e));
                    state.status = Status::Failed;
                }
            }
            state.settled_seq = seq;
            applied = Some(state.clone());
            true
        });
        applied
    }

    fn track(&self, handle: JoinHandle<()>) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.retain(|h| !h.is_finished());
            in_flight.push(handle);
        }
    }

    fn abort_in_flight(&self) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            for handle in in_flight.drain(..) {
                handle.abort();
            }
        }
    }
}

impl<W: UnitOfWork> Drop for Shared<W> {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}
