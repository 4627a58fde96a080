//! Pure derivation of the dashboard from fetched links, clicks and the filter text.

use crate::model::{Click, Link, LinkId};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub link_count: usize,
    /// Click rows, not distinct links.
    pub click_count: usize,
}

/// One filtered link with its click counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkSummary {
    pub link: Link,
    pub click_count: usize,
}

/// Derived dashboard state. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub links: Vec<Link>,
    /// Links without clicks are absent; see [`click_count`](Self::click_count).
    pub clicks_by_link: BTreeMap<LinkId, usize>,
    pub totals: Totals,
    pub filter_text: String,
    pub filtered_links: Vec<LinkSummary>,
}

impl DashboardView {
    pub fn derive(links: &[Link], clicks: &[Click], filter_text: &str) -> Self {
        let clicks_by_link = group_clicks(clicks);
        let filtered_links = links
            .iter()
            .filter(|link| matches_filter(&link.title, filter_text))
            .map(|link| LinkSummary {
                link: link.clone(),
                click_count: clicks_by_link.get(&link.id).copied().unwrap_or(0),
            })
            .collect();

        Self {
            links: links.to_vec(),
            totals: Totals {
                link_count: links.len(),
                click_count: clicks.len(),
            },
            clicks_by_link,
            filter_text: filter_text.to_string(),
            filtered_links,
        }
    }

    pub fn click_count(&self, link_id: &LinkId) -> usize {
        self.clicks_by_link.get(link_id).copied().unwrap_or(0)
    }
}

pub fn group_clicks(clicks: &[Click]) -> BTreeMap<LinkId, usize> {
    let mut grouped = BTreeMap::new();
    for click in clicks {
        *grouped.entry(click.link_id.clone()).or_insert(0) += 1;
    }
    grouped
}

/// Case-insensitive substring match. An empty filter matches everything.
pub fn matches_filter(title: &str, filter_text: &str) -> bool {
    title.to_lowercase().contains(&filter_text.to_lowercase())
}
