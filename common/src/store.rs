use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::certification::Certification;
use crate::error::WorkflowError;
use crate::product::{Product, ProductId, ProductStatus};

/// Durable mapping from product id to product.
///
/// Implementations perform no transition validation; the workflow manager
/// owns the state-machine invariant.
pub trait ProductStore: Send + Sync {
    /// Insert a new product with a fresh unique id and `Uncertified` status.
    /// Fails with `Validation` if `name` or `owner` is empty.
    fn create(&self, name: &str, batch_id: &str, owner: &str) -> Result<ProductId, WorkflowError>;

    /// Fails with `NotFound` if absent.
    fn get(&self, id: &ProductId) -> Result<Product, WorkflowError>;

    /// All products with the given status, in insertion order.
    fn list_by_status(&self, status: ProductStatus) -> Result<Vec<Product>, WorkflowError>;

    /// Fails with `NotFound` if absent.
    fn set_status(&self, id: &ProductId, status: ProductStatus) -> Result<(), WorkflowError>;
}

/// Durable mapping from product id to at most one certification.
pub trait CertificationStore: Send + Sync {
    /// Fails with `Conflict` if a certification already exists for the product.
    fn create(
        &self,
        product_id: &ProductId,
        certifier_name: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Certification, WorkflowError>;

    fn get_by_product(&self, product_id: &ProductId) -> Result<Option<Certification>, WorkflowError>;
}

/// In-memory product store.
///
/// Ids combine epoch millis with a process-wide sequence number, so they are
/// unique and monotonically increasing and map iteration order is insertion
/// order.
#[derive(Default)]
pub struct MemoryProductStore {
    products: RwLock<BTreeMap<ProductId, Product>>,
    next_seq: AtomicU64,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> ProductId {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        ProductId(format!("p-{}-{:06}", Utc::now().timestamp_millis(), seq))
    }
}

fn poisoned(store: &str) -> WorkflowError {
    WorkflowError::StoreUnavailable(format!("{store} store lock poisoned"))
}

impl ProductStore for MemoryProductStore {
    fn create(&self, name: &str, batch_id: &str, owner: &str) -> Result<ProductId, WorkflowError> {
        if name.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "product name must not be empty".into(),
            ));
        }
        if owner.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "product owner must not be empty".into(),
            ));
        }

        let id = self.next_id();
        let product = Product {
            id: id.clone(),
            name: name.to_string(),
            batch_id: batch_id.to_string(),
            owner: owner.to_string(),
            status: ProductStatus::Uncertified,
            created_at: Utc::now(),
        };

        let mut products = self.products.write().map_err(|_| poisoned("product"))?;
        products.insert(id.clone(), product);
        Ok(id)
    }

    fn get(&self, id: &ProductId) -> Result<Product, WorkflowError> {
        let products = self.products.read().map_err(|_| poisoned("product"))?;
        products
            .get(id)
            .cloned()
            .ok_or_else(|| WorkflowError::NotFound(id.0.clone()))
    }

    fn list_by_status(&self, status: ProductStatus) -> Result<Vec<Product>, WorkflowError> {
        let products = self.products.read().map_err(|_| poisoned("product"))?;
        Ok(products
            .values()
            .filter(|p| p.status == status)
            .cloned()
            .collect())
    }

    fn set_status(&self, id: &ProductId, status: ProductStatus) -> Result<(), WorkflowError> {
        let mut products = self.products.write().map_err(|_| poisoned("product"))?;
        match products.get_mut(id) {
            Some(product) => {
                product.status = status;
                Ok(())
            }
            None => Err(WorkflowError::NotFound(id.0.clone())),
        }
    }
}

/// In-memory certification store.
#[derive(Default)]
pub struct MemoryCertificationStore {
    certifications: RwLock<BTreeMap<ProductId, Certification>>,
}

impl MemoryCertificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CertificationStore for MemoryCertificationStore {
    fn create(
        &self,
        product_id: &ProductId,
        certifier_name: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Certification, WorkflowError> {
        let mut certifications = self
            .certifications
            .write()
            .map_err(|_| poisoned("certification"))?;
        if certifications.contains_key(product_id) {
            return Err(WorkflowError::Conflict(product_id.0.clone()));
        }

        let certification = Certification {
            product_id: product_id.clone(),
            certifier_name: certifier_name.to_string(),
            timestamp,
        };
        certifications.insert(product_id.clone(), certification.clone());
        Ok(certification)
    }

    fn get_by_product(&self, product_id: &ProductId) -> Result<Option<Certification>, WorkflowError> {
        let certifications = self
            .certifications
            .read()
            .map_err(|_| poisoned("certification"))?;
        Ok(certifications.get(product_id).cloned())
    }
}
