//! Status classification for matched rows.

use std::fmt;

use stockwatch_feed::FeedItem;

/// Stock within this factor of the purchase cap counts as low.
pub const LOW_STOCK_FACTOR: f64 = 1.1;

/// Status labels the reconciler writes into the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    NotFound,
    LowStock,
    Selling,
    /// The feed's own label, uppercased.
    Feed(String),
}

impl Status {
    pub fn label(&self) -> &str {
        match self {
            Status::NotFound => "NOT FOUND",
            Status::LowStock => "LOW STOCK",
            Status::Selling => "SELLING",
            Status::Feed(label) => label,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify one matched row.
///
/// Fixed priority: low stock beats selling beats the feed's own label.
/// The selling decision compares the fresh stock against the stock
/// recorded before this run.
pub fn classify(item: &FeedItem, prev_stock: f64) -> Status {
    if item.stock < LOW_STOCK_FACTOR * item.max_purchase {
        Status::LowStock
    } else if item.stock < prev_stock {
        Status::Selling
    } else {
        Status::Feed(item.status.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(stock: f64, max_purchase: f64, status: &str) -> FeedItem {
        FeedItem {
            title: "Loft 17b".to_string(),
            stock,
            max_purchase,
            status: status.to_string(),
        }
    }

    #[test]
    fn low_stock_when_under_threshold() {
        // 8 < 1.1 * 10
        assert_eq!(classify(&item(8.0, 10.0, "active"), 8.0), Status::LowStock);
    }

    #[test]
    fn low_stock_beats_selling() {
        // Both a drop from 20 and under the threshold: low stock wins.
        assert_eq!(classify(&item(8.0, 10.0, "active"), 20.0), Status::LowStock);
    }

    #[test]
    fn selling_when_stock_dropped() {
        assert_eq!(classify(&item(12.0, 10.0, "active"), 20.0), Status::Selling);
    }

    #[test]
    fn feed_label_uppercased_when_nothing_changed() {
        assert_eq!(
            classify(&item(20.0, 10.0, "active"), 20.0),
            Status::Feed("ACTIVE".to_string())
        );
        // Stock rising is not selling.
        assert_eq!(
            classify(&item(25.0, 10.0, "active"), 20.0),
            Status::Feed("ACTIVE".to_string())
        );
    }

    #[test]
    fn zero_cap_never_reads_as_low_stock() {
        assert_eq!(
            classify(&item(0.0, 0.0, "sold out"), 0.0),
            Status::Feed("SOLD OUT".to_string())
        );
    }

    #[test]
    fn labels() {
        assert_eq!(Status::NotFound.label(), "NOT FOUND");
        assert_eq!(Status::LowStock.to_string(), "LOW STOCK");
        assert_eq!(Status::Feed("ACTIVE".into()).label(), "ACTIVE");
    }
}
