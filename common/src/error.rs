use thiserror::Error;

/// Typed failure taxonomy for the certification workflow.
///
/// Every operation surfaces one of these to the caller; the workflow
/// performs no silent recovery or retry. The HTTP layer maps them to
/// response codes, the contract client maps transport failures to
/// `StoreUnavailable`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Malformed input, e.g. an empty required field.
    #[error("validation failed: {0}")]
    Validation(String),
    /// No product with the given id.
    #[error("product not found: {0}")]
    NotFound(String),
    /// Certify was called on a product that is already certified.
    #[error("product already certified: {0}")]
    AlreadyCertified(String),
    /// A certification record already exists for the product.
    #[error("certification already exists for product: {0}")]
    Conflict(String),
    /// The underlying store or chain is unreachable. Not retried
    /// automatically; surfaced to the caller.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}
