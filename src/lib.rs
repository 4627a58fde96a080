//! # URL Trimmer
//!
//! > **The asynchronous core of a URL-shortening dashboard.**
//!
//! The crate models everything a signed-in user sees as data flowing out of
//! asynchronous operations: who is signed in, whether a protected page may render, and
//! which links (with how many clicks) the dashboard shows.
//!
//! ## Core Concepts
//!
//! ### One state machine for every fetch
//! Every remote call runs through an [`AsyncOperation`](framework::AsyncOperation) which
//! publishes `{data, error, status}` snapshots over a `tokio::sync::watch` channel.
//! Invocations are sequence-numbered; the most recently triggered one always wins.
//!
//! ### Session and gate
//! The [`SessionStore`](session::SessionStore) holds the current principal. The
//! [`RouteGate`](gate::RouteGate) turns a session into a placeholder, a redirect to
//! `/auth`, or the protected content. [`GuestGate`](gate::GuestGate) sends a visitor
//! who is already signed in from `/auth` on to the dashboard.
//!
//! ### Dependent fetches
//! The [`DashboardPipeline`](dashboard::DashboardPipeline) loads a principal's links,
//! then their clicks in one batched query, and derives totals, per-link counts and a
//! filtered list.
//!
//! ## Module Tour
//!
//! - [`framework`]: [`AsyncOperation`](framework::AsyncOperation) and its state.
//! - [`model`]: principals, links, clicks and form payloads.
//! - [`backend`]: the [`Backend`](backend::Backend) trait, an in-process backend actor
//!   and a [`mock`](backend::mock) for tests.
//! - [`session`], [`gate`], [`dashboard`], [`auth`]: the application core.
//! - [`lifecycle`]: [`TrimmerApp`](lifecycle::TrimmerApp) wiring and
//!   [`tracing`](lifecycle::tracing) setup.
//! - [`config`]: [`AppConfig`](config::AppConfig).
//!
//! ## Quick Start
//!
//! ```bash
//! # Run the demo with info logs
//! RUST_LOG=info cargo run -- --filter docs
//!
//! cargo test
//! ```

pub mod auth;
pub mod backend;
pub mod config;
pub mod dashboard;
pub mod framework;
pub mod gate;
pub mod lifecycle;
pub mod model;
pub mod session;
