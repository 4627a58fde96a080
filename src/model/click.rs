use crate::model::LinkId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single recorded click event against a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Click {
    pub id: String,
    pub link_id: LinkId,
    pub timestamp: DateTime<Utc>,
}

impl Click {
    pub fn new(id: impl Into<String>, link_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            link_id: LinkId(link_id.into()),
            timestamp: Utc::now(),
        }
    }
}
