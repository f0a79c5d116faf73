use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::certification::Certification;
use crate::product::{Product, ProductId, ProductStatus};

/// Replicated registry state for the certification contract: every product
/// plus at most one certification per product.
///
/// This is the contract-call encoding of the workflow; the REST node and
/// this state are behaviorally equivalent boundaries over the same records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryState {
    pub products: BTreeMap<ProductId, Product>,
    pub certifications: BTreeMap<ProductId, Certification>,
}

impl RegistryState {
    /// Merge another registry state into this one.
    ///
    /// - Products: set-union; per product the higher status ordinal wins and
    ///   all other fields keep the first writer.
    /// - Certifications: set-union; when two replicas certified the same
    ///   product concurrently, the earlier timestamp wins and the certifier
    ///   name breaks ties. Certifications for unknown products are dropped.
    /// - Product status is re-derived from the certification set afterwards,
    ///   keeping the two maps coherent.
    ///
    /// Merge is commutative, associative and idempotent, so every replica
    /// converges on the same single certification per product.
    pub fn merge(&mut self, other: RegistryState) {
        for (id, product) in other.products {
            match self.products.get_mut(&id) {
                Some(existing) => {
                    if product.status.ordinal() > existing.status.ordinal() {
                        existing.status = product.status;
                    }
                }
                None => {
                    self.products.insert(id, product);
                }
            }
        }

        for (id, certification) in other.certifications {
            if !self.products.contains_key(&id) {
                continue;
            }
            match self.certifications.get(&id) {
                Some(existing) if keeps_existing(existing, &certification) => {}
                _ => {
                    self.certifications.insert(id, certification);
                }
            }
        }

        for (id, product) in self.products.iter_mut() {
            product.status = if self.certifications.contains_key(id) {
                ProductStatus::Certified
            } else {
                ProductStatus::Uncertified
            };
        }
    }

    /// Structural invariants: products are well-formed, every certification
    /// references a known product under its own key, and a certification is
    /// present iff the product's status is `Certified`.
    pub fn validate(&self) -> bool {
        for (id, product) in &self.products {
            if product.id != *id {
                return false;
            }
            if product.name.trim().is_empty() || product.owner.trim().is_empty() {
                return false;
            }
            let certified = product.status == ProductStatus::Certified;
            if certified != self.certifications.contains_key(id) {
                return false;
            }
        }
        for (id, certification) in &self.certifications {
            if certification.product_id != *id {
                return false;
            }
            if !self.products.contains_key(id) {
                return false;
            }
            if certification.certifier_name.trim().is_empty() {
                return false;
            }
        }
        true
    }
}

/// Existing certification survives the merge when it sorts before the
/// incoming one: earlier timestamp first, certifier name as tie-break.
fn keeps_existing(existing: &Certification, incoming: &Certification) -> bool {
    (existing.timestamp, &existing.certifier_name)
        <= (incoming.timestamp, &incoming.certifier_name)
}

/// Summary of registry state: product id -> status ordinal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrySummary {
    pub product_status: BTreeMap<ProductId, u8>,
}

impl RegistryState {
    pub fn summarize(&self) -> RegistrySummary {
        RegistrySummary {
            product_status: self
                .products
                .iter()
                .map(|(id, product)| (id.clone(), product.status.ordinal()))
                .collect(),
        }
    }

    /// Compute a delta: products the summary has not seen or has at a lower
    /// status ordinal, plus their certifications.
    pub fn delta(&self, summary: &RegistrySummary) -> RegistryState {
        let products: BTreeMap<ProductId, Product> = self
            .products
            .iter()
            .filter(|(id, product)| {
                summary
                    .product_status
                    .get(*id)
                    .is_none_or(|ordinal| product.status.ordinal() > *ordinal)
            })
            .map(|(id, product)| (id.clone(), product.clone()))
            .collect();

        let certifications = self
            .certifications
            .iter()
            .filter(|(id, _)| products.contains_key(*id))
            .map(|(id, certification)| (id.clone(), certification.clone()))
            .collect();

        RegistryState {
            products,
            certifications,
        }
    }
}
