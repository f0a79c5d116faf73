use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::product::ProductId;

/// A one-time approval record issued by a certifier for a product.
///
/// At most one exists per product, and it exists iff the product's status is
/// `Certified`; creating it is the single side effect of the certify
/// transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    pub product_id: ProductId,
    /// Username of the certifier who approved the product.
    pub certifier_name: String,
    /// Stamped by the workflow manager at the moment of certification.
    pub timestamp: DateTime<Utc>,
}
