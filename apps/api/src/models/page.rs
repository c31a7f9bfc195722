use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::field::FieldDescriptor;

/// Fields collected from one page, keyed by URL in the page store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageStats {
    pub pages: usize,
    pub fields: usize,
}
