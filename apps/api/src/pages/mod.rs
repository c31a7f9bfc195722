//! Collected page data: the fields scanned from each page, one record per URL.

pub mod handlers;
pub mod template;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::models::field::FieldDescriptor;
use crate::models::page::{PageRecord, PageStats};
use crate::pages::template::TemplateFill;

/// In-memory page records, in insertion order.
#[derive(Default)]
pub struct PageStore {
    pages: RwLock<Vec<PageRecord>>,
}

impl PageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces (or appends) the record for `url` with a fresh timestamp.
    pub async fn upsert(&self, url: &str, fields: Vec<FieldDescriptor>) -> PageRecord {
        let record = PageRecord {
            url: url.to_string(),
            timestamp: Utc::now(),
            fields,
        };

        let mut pages = self.pages.write().await;
        match pages.iter_mut().find(|p| p.url == url) {
            Some(existing) => *existing = record.clone(),
            None => pages.push(record.clone()),
        }
        record
    }

    /// Stores new field values for an existing record, keeping its timestamp.
    /// Appends a new record when `url` is unknown.
    pub async fn save_fields(&self, url: &str, fields: Vec<FieldDescriptor>) {
        let mut pages = self.pages.write().await;
        match pages.iter_mut().find(|p| p.url == url) {
            Some(existing) => existing.fields = fields,
            None => pages.push(PageRecord {
                url: url.to_string(),
                timestamp: Utc::now(),
                fields,
            }),
        }
    }

    pub async fn find(&self, url: &str) -> Option<PageRecord> {
        let pages = self.pages.read().await;
        pages.iter().find(|p| p.url == url).cloned()
    }

    pub async fn all(&self) -> Vec<PageRecord> {
        self.pages.read().await.clone()
    }

    pub async fn clear(&self) {
        self.pages.write().await.clear();
    }

    pub async fn stats(&self) -> PageStats {
        let pages = self.pages.read().await;
        PageStats {
            pages: pages.len(),
            fields: pages.iter().map(|p| p.fields.len()).sum(),
        }
    }

    /// Copies template values into the matching fields of `url`'s record and
    /// marks them `json_filled`. Unknown URLs are left alone. Returns how many
    /// stored fields changed.
    pub async fn sync_template_values(&self, url: &str, fills: &[TemplateFill]) -> usize {
        let mut pages = self.pages.write().await;
        let Some(page) = pages.iter_mut().find(|p| p.url == url) else {
            return 0;
        };

        let mut updated = 0;
        for field in page.fields.iter_mut().filter(|f| f.has_id()) {
            if let Some(fill) = fills.iter().find(|fill| fill.id == field.id) {
                field.value = Some(fill.value.clone());
                field.json_filled = true;
                updated += 1;
            }
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(id: &str) -> FieldDescriptor {
        FieldDescriptor {
            id: id.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_url() {
        let store = PageStore::new();
        store.upsert("https://a", vec![field("x")]).await;
        store.upsert("https://b", vec![field("y")]).await;
        store.upsert("https://a", vec![field("x"), field("z")]).await;

        let all = store.all().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].url, "https://a");
        assert_eq!(all[0].fields.len(), 2);
        assert_eq!(store.stats().await, PageStats { pages: 2, fields: 3 });
    }

    #[tokio::test]
    async fn test_clear() {
        let store = PageStore::new();
        store.upsert("https://a", vec![field("x")]).await;
        store.clear().await;
        assert_eq!(store.stats().await, PageStats::default());
        assert!(store.find("https://a").await.is_none());
    }

    #[tokio::test]
    async fn test_sync_template_values_marks_json_filled() {
        let store = PageStore::new();
        store.upsert("https://a", vec![field("x"), field("y")]).await;

        let fills = vec![TemplateFill {
            id: "y".to_string(),
            value: "why".to_string(),
        }];
        assert_eq!(store.sync_template_values("https://a", &fills).await, 1);
        assert_eq!(store.sync_template_values("https://other", &fills).await, 0);

        let page = store.find("https://a").await.unwrap();
        assert!(!page.fields[0].json_filled);
        assert!(page.fields[1].json_filled);
        assert_eq!(page.fields[1].value.as_deref(), Some("why"));
    }

    #[tokio::test]
    async fn test_save_fields_keeps_timestamp() {
        let store = PageStore::new();
        let original = store.upsert("https://a", vec![field("x")]).await;
        store.save_fields("https://a", vec![field("x"), field("y")]).await;

        let page = store.find("https://a").await.unwrap();
        assert_eq!(page.timestamp, original.timestamp);
        assert_eq!(page.fields.len(), 2);
    }
}
