//! Generic asynchronous operation framework.
//!
//! This module provides the state machine every data fetch in the application is built on.
//!
//! # Main Components
//!
//! - [`UnitOfWork`] - Trait that each fetch (session, links, clicks, login, ...) implements
//! - [`AsyncOperation`] - Wraps a unit of work and publishes `{data, error, status}` snapshots
//! - [`OperationState`] / [`Status`] - The snapshot observers read
//! - [`ErrorInfo`] / [`FrameworkError`] - Stored error description and plumbing errors

pub mod error;
pub mod operation;

// Re-export core types for convenience
pub use error::{ErrorInfo, FrameworkError};
pub use operation::{AsyncOperation, OperationState, Status, UnitOfWork};
