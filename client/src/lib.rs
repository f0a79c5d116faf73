//! Workflow client boundary.
//!
//! One capability interface over the certification workflow with two
//! behaviorally equivalent adapters, selected at configuration time:
//!
//! - [`RestClient`] calls the agritrace node's HTTP API,
//! - [`ContractClient`] talks to a Freenet node hosting the registry
//!   contract.
//!
//! Both surface the shared [`WorkflowError`] taxonomy; transport failures
//! arrive as `StoreUnavailable`.

mod contract;
mod rest;

use agritrace_common::certification::Certification;
use agritrace_common::error::WorkflowError;
use agritrace_common::product::{Product, ProductId};
use async_trait::async_trait;

pub use contract::ContractClient;
pub use rest::RestClient;

/// The four workflow operations every boundary exposes.
#[async_trait]
pub trait WorkflowClient: Send + Sync {
    /// Register a new product owned by `owner`; returns its fresh id.
    async fn submit_product(
        &self,
        name: &str,
        batch_id: &str,
        owner: &str,
    ) -> Result<ProductId, WorkflowError>;

    /// Products still awaiting certification, in insertion order.
    async fn list_pending_certification(&self) -> Result<Vec<Product>, WorkflowError>;

    /// Certify a product exactly once.
    async fn certify(
        &self,
        product_id: &ProductId,
        certifier_name: &str,
    ) -> Result<Certification, WorkflowError>;

    /// A product together with its certification, if any.
    async fn get_product_with_history(
        &self,
        product_id: &ProductId,
    ) -> Result<(Product, Option<Certification>), WorkflowError>;
}
