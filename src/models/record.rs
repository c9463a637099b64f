//! Scan record types and identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a scan record.
///
/// The value is the creation time in Unix milliseconds, bumped forward when
/// two records would otherwise share a millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    /// Creates a record ID from a millisecond timestamp.
    #[must_use]
    pub const fn new(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the raw millisecond value.
    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Returns the ID that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(millis: i64) -> Self {
        Self(millis)
    }
}

/// Product details from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfo {
    /// Display name.
    pub name: String,
    /// Price as shown to the user, currency included (`$4.99`).
    pub price: String,
    /// Brand name.
    pub brand: String,
    /// Free-text description.
    pub description: String,
}

impl ProductInfo {
    /// Creates a product entry.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        price: impl Into<String>,
        brand: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
            brand: brand.into(),
            description: description.into(),
        }
    }
}

/// One accepted scan.
///
/// `product` is resolved once when the record is created and is never
/// refreshed from the catalog afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    /// Unique identifier.
    pub id: RecordId,
    /// The scanned code.
    pub code: String,
    /// Symbology, uppercase.
    pub format: String,
    /// When the scan was accepted (ISO-8601 on disk).
    pub timestamp: DateTime<Utc>,
    /// Catalog entry at the time of the scan.
    #[serde(default)]
    pub product: Option<ProductInfo>,
}

impl ScanRecord {
    /// Returns true if the catalog knew this code when it was scanned.
    #[must_use]
    pub const fn has_product(&self) -> bool {
        self.product.is_some()
    }

    /// Returns the product name or `Unknown Product`.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.product
            .as_ref()
            .map_or("Unknown Product", |p| p.name.as_str())
    }
}
