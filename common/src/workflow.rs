use std::sync::RwLock;

use chrono::Utc;

use crate::certification::Certification;
use crate::error::WorkflowError;
use crate::product::{Product, ProductId, ProductStatus};
use crate::store::{
    CertificationStore, MemoryCertificationStore, MemoryProductStore, ProductStore,
};

/// The only component permitted to mutate cross-entity state.
///
/// Enforces the single state-machine invariant: a product starts
/// `Uncertified` and transitions to `Certified` exactly once, recording who
/// certified it and when. `certify` runs under the write half of the
/// coherence lock; `get_product_with_history` reads under the read half, so
/// no caller ever observes a certified status without its certification
/// record or vice versa.
pub struct WorkflowManager<P: ProductStore, C: CertificationStore> {
    products: P,
    certifications: C,
    coherence: RwLock<()>,
}

impl WorkflowManager<MemoryProductStore, MemoryCertificationStore> {
    /// Manager backed by the in-memory stores.
    pub fn in_memory() -> Self {
        Self::new(MemoryProductStore::new(), MemoryCertificationStore::new())
    }
}

impl<P: ProductStore, C: CertificationStore> WorkflowManager<P, C> {
    pub fn new(products: P, certifications: C) -> Self {
        Self {
            products,
            certifications,
            coherence: RwLock::new(()),
        }
    }

    /// Register a new product owned by `owner`. Starts `Uncertified`.
    pub fn submit_product(
        &self,
        name: &str,
        batch_id: &str,
        owner: &str,
    ) -> Result<ProductId, WorkflowError> {
        self.products.create(name, batch_id, owner)
    }

    /// Products still awaiting certification, in insertion order.
    pub fn list_pending_certification(&self) -> Result<Vec<Product>, WorkflowError> {
        self.products.list_by_status(ProductStatus::Uncertified)
    }

    /// Certify a product exactly once.
    ///
    /// The check-then-act sequence is serialized through the coherence
    /// lock: of N concurrent calls for the same product exactly one
    /// succeeds, the rest fail with `AlreadyCertified` (or `Conflict` from
    /// the certification store) and leave no partial state behind.
    pub fn certify(
        &self,
        product_id: &ProductId,
        certifier_name: &str,
    ) -> Result<Certification, WorkflowError> {
        if certifier_name.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "certifier name must not be empty".into(),
            ));
        }

        let _guard = self
            .coherence
            .write()
            .map_err(|_| WorkflowError::StoreUnavailable("workflow lock poisoned".into()))?;

        let product = self.products.get(product_id)?;
        if product.status == ProductStatus::Certified {
            return Err(WorkflowError::AlreadyCertified(product_id.0.clone()));
        }

        let certification = self
            .certifications
            .create(product_id, certifier_name, Utc::now())?;
        self.products.set_status(product_id, ProductStatus::Certified)?;
        Ok(certification)
    }

    /// A product together with its certification, if any. A product may
    /// legitimately have no certification yet.
    pub fn get_product_with_history(
        &self,
        product_id: &ProductId,
    ) -> Result<(Product, Option<Certification>), WorkflowError> {
        let _guard = self
            .coherence
            .read()
            .map_err(|_| WorkflowError::StoreUnavailable("workflow lock poisoned".into()))?;

        let product = self.products.get(product_id)?;
        let certification = self.certifications.get_by_product(product_id)?;
        Ok((product, certification))
    }
}
