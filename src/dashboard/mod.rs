//! The dashboard: links owned by the signed-in principal, their click counts and a
//! title filter.

pub mod pipeline;
pub mod view;

pub use pipeline::{DashboardPipeline, DashboardSnapshot, DashboardWatch, FetchClicks, FetchLinks};
pub use view::{group_clicks, matches_filter, DashboardView, LinkSummary, Totals};
