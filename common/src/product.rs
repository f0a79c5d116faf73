use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique product identifier (timestamp-based, monotonically increasing).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Certification status of a product. `Certified` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Uncertified,
    Certified,
}

impl ProductStatus {
    /// Ordinal for determining merge winner. Higher always wins.
    pub fn ordinal(&self) -> u8 {
        match self {
            ProductStatus::Uncertified => 0,
            ProductStatus::Certified => 1,
        }
    }

    /// Returns true if transitioning from self to `next` is valid.
    pub fn can_transition_to(&self, next: &ProductStatus) -> bool {
        matches!(
            (self, next),
            (ProductStatus::Uncertified, ProductStatus::Certified)
        )
    }
}

/// A traceable item registered by a farmer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "productId")]
    pub id: ProductId,
    pub name: String,
    /// Producer-supplied lot identifier, opaque to the workflow.
    pub batch_id: String,
    /// Username of the farmer who registered the product.
    pub owner: String,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
}
