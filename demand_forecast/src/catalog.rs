//! Fixed product catalog
//!
//! Each product's demand is read from the sales of the stores mapped to it.
//! The catalog is not user-extensible.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Store identifier as it appears in the `Store` column
pub type StoreId = u32;

/// Products that can be forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Product {
    Milk,
    Bread,
    Fruits,
    Snacks,
    Detergent,
}

impl Product {
    /// Every product, in catalog order
    pub const ALL: [Product; 5] = [
        Product::Milk,
        Product::Bread,
        Product::Fruits,
        Product::Snacks,
        Product::Detergent,
    ];

    /// Lowercase catalog name
    pub fn name(&self) -> &'static str {
        match self {
            Product::Milk => "milk",
            Product::Bread => "bread",
            Product::Fruits => "fruits",
            Product::Snacks => "snacks",
            Product::Detergent => "detergent",
        }
    }

    /// Name with the first letter capitalised, for chart titles
    pub fn display_name(&self) -> &'static str {
        match self {
            Product::Milk => "Milk",
            Product::Bread => "Bread",
            Product::Fruits => "Fruits",
            Product::Snacks => "Snacks",
            Product::Detergent => "Detergent",
        }
    }

    /// Stores whose sales make up this product's demand
    pub fn store_ids(&self) -> &'static [StoreId] {
        match self {
            Product::Milk => &[1],
            Product::Bread => &[2],
            Product::Fruits => &[3],
            Product::Snacks => &[4],
            Product::Detergent => &[5],
        }
    }

    /// Case-insensitive lookup by name
    pub fn lookup(name: &str) -> Result<Self> {
        let wanted = name.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| ForecastError::UnknownProduct {
                name: wanted,
                valid: product_names(),
            })
    }
}

impl FromStr for Product {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        Product::lookup(s)
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Catalog names for populating product pickers
pub fn product_names() -> Vec<&'static str> {
    Product::ALL.iter().map(Product::name).collect()
}
