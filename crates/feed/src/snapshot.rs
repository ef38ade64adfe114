//! Availability snapshot types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One product as reported by the availability feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    #[serde(default)]
    pub stock: f64,
    #[serde(default)]
    pub max_purchase: f64,
    #[serde(default)]
    pub status: String,
}

/// The whole availability snapshot for one run.
///
/// `products` doubles as the reconciler's working list: matched items
/// are popped out via [`FeedSnapshot::take`], and whatever is left at
/// the end of a pass is untracked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSnapshot {
    /// Snapshot timestamp, epoch seconds on the wire.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub products: Vec<FeedItem>,
}

impl FeedSnapshot {
    pub fn empty(time: DateTime<Utc>) -> Self {
        Self {
            time,
            products: Vec::new(),
        }
    }

    /// Pop the first item whose title equals `name` exactly.
    ///
    /// Exact string match, no case folding. A popped item is gone from
    /// the working list, so it can never match a later row.
    pub fn take(&mut self, name: &str) -> Option<FeedItem> {
        let idx = self.products.iter().position(|p| p.title == name)?;
        Some(self.products.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, stock: f64) -> FeedItem {
        FeedItem {
            title: title.to_string(),
            stock,
            max_purchase: 10.0,
            status: "active".to_string(),
        }
    }

    #[test]
    fn take_consumes_first_match_only() {
        let mut snapshot = FeedSnapshot {
            time: Utc::now(),
            products: vec![item("Loft 17b", 8.0), item("Loft 17b", 3.0)],
        };
        let first = snapshot.take("Loft 17b").unwrap();
        assert_eq!(first.stock, 8.0);
        assert_eq!(snapshot.len(), 1);
        let second = snapshot.take("Loft 17b").unwrap();
        assert_eq!(second.stock, 3.0);
        assert!(snapshot.take("Loft 17b").is_none());
    }

    #[test]
    fn take_matches_exactly_no_case_folding() {
        let mut snapshot = FeedSnapshot {
            time: Utc::now(),
            products: vec![item("Loft 17b", 8.0)],
        };
        assert!(snapshot.take("loft 17b").is_none());
        assert!(snapshot.take("Loft 17b ").is_none());
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn deserializes_epoch_seconds_and_defaults() {
        let snapshot: FeedSnapshot = serde_json::from_str(
            r#"{"time": 1754042739, "products": [{"title": "Loft 17b"}]}"#,
        )
        .unwrap();
        assert_eq!(snapshot.time.timestamp(), 1_754_042_739);
        assert_eq!(snapshot.products.len(), 1);
        assert_eq!(snapshot.products[0].stock, 0.0);
        assert_eq!(snapshot.products[0].max_purchase, 0.0);
        assert_eq!(snapshot.products[0].status, "");
    }

    #[test]
    fn deserializes_missing_product_list_as_empty() {
        let snapshot: FeedSnapshot =
            serde_json::from_str(r#"{"time": 1754042739}"#).unwrap();
        assert!(snapshot.is_empty());
    }
}
