//! Static product catalog.
//!
//! The catalog is read-only reference data keyed by barcode. The pipeline
//! looks a code up exactly once, when a record is created.

use crate::models::ProductInfo;
use std::collections::HashMap;

/// Trait for product lookups.
///
/// Implementations must be deterministic and side-effect free: the same code
/// always yields the same answer for the lifetime of the catalog.
pub trait Catalog: Send + Sync {
    /// Looks up a product by exact code match.
    ///
    /// A miss is a normal outcome, not an error.
    fn lookup(&self, code: &str) -> Option<ProductInfo>;

    /// Returns the number of known products.
    fn len(&self) -> usize;

    /// Returns true if the catalog has no products.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory catalog built once and never modified.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    products: HashMap<String, ProductInfo>,
}

impl StaticCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a catalog from `(code, product)` pairs.
    ///
    /// Later entries win when a code appears twice.
    #[must_use]
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, ProductInfo)>,
        S: Into<String>,
    {
        Self {
            products: entries
                .into_iter()
                .map(|(code, product)| (code.into(), product))
                .collect(),
        }
    }

    /// Returns the demo catalog shipped with the binary.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_entries([
            (
                "0123456789012",
                ProductInfo::new(
                    "Organic Apple Juice",
                    "$4.99",
                    "Nature's Best",
                    "100% organic apple juice, 1L bottle, no added sugars",
                ),
            ),
            (
                "0123456789013",
                ProductInfo::new(
                    "Whole Wheat Bread",
                    "$3.49",
                    "Baker's Choice",
                    "Fresh baked whole wheat bread, 20 slices, high fiber",
                ),
            ),
            (
                "0987654321098",
                ProductInfo::new(
                    "Premium Coffee Beans",
                    "$12.99",
                    "Mountain Roast",
                    "Single origin arabica beans, medium roast, 250g",
                ),
            ),
            (
                "1234567890123",
                ProductInfo::new(
                    "Organic Pasta",
                    "$2.79",
                    "Italian Delights",
                    "Organic durum wheat penne pasta, 500g package",
                ),
            ),
            (
                "5901234123457",
                ProductInfo::new(
                    "Greek Yogurt",
                    "$6.49",
                    "Pure Greek",
                    "0% fat Greek style yogurt, 500g container",
                ),
            ),
        ])
    }

    /// Returns all known codes, sorted.
    #[must_use]
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.products.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}

impl Catalog for StaticCatalog {
    fn lookup(&self, code: &str) -> Option<ProductInfo> {
        self.products.get(code).cloned()
    }

    fn len(&self) -> usize {
        self.products.len()
    }
}
