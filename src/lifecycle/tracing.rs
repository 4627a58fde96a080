//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered by
//! `RUST_LOG`. Module paths are hidden (`with_target(false)`); structured fields such as
//! `operation`, `seq` and `owner_id` carry the context instead.
//!
//! ```bash
//! # Flow milestones: sessions, logins, link loads
//! RUST_LOG=info cargo run
//!
//! # Every trigger, settlement and discarded stale result
//! RUST_LOG=debug cargo run
//! ```
//!
//! With `RUST_LOG=debug` a dashboard load reads roughly like:
//!
//! ```text
//! INFO Loading dashboard owner_id=user_2
//! DEBUG Trigger operation="FetchLinks" seq=1 args=PrincipalId("user_2")
//! DEBUG FetchLinksByOwner owner_id=user_2 count=2
//! DEBUG Succeeded operation="FetchLinks" seq=1
//! DEBUG Loading clicks link_count=2 seq=1
//! DEBUG Succeeded operation="FetchClicks" seq=1
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
