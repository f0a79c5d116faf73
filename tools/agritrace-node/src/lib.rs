//! Agritrace certification node.
//!
//! REST backend for the certification workflow: farmers register products,
//! certifiers approve them exactly once, consumers read a product together
//! with its certification history. Authentication is handled by the user
//! directory; the workflow manager owns all product/certification state.

pub mod api;
pub mod auth;

use agritrace_common::store::{MemoryCertificationStore, MemoryProductStore};
use agritrace_common::workflow::WorkflowManager;

use crate::auth::UserDirectory;

pub use crate::api::build_router;

/// Shared application state.
pub struct AppState {
    pub workflow: WorkflowManager<MemoryProductStore, MemoryCertificationStore>,
    pub users: UserDirectory,
}

impl AppState {
    pub fn new(users: UserDirectory) -> Self {
        Self {
            workflow: WorkflowManager::in_memory(),
            users,
        }
    }
}
