use std::time::Duration;

use agritrace_common::certification::Certification;
use agritrace_common::error::WorkflowError;
use agritrace_common::product::{Product, ProductId, ProductStatus};
use agritrace_common::registry::RegistryState;
use async_trait::async_trait;
use chrono::Utc;
use freenet_stdlib::client_api::{
    ClientRequest, ContractRequest, ContractResponse, HostResponse, WebApi,
};
use freenet_stdlib::prelude::*;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::WorkflowClient;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Contract-call adapter for the workflow.
///
/// Talks to a Freenet node hosting the registry contract. The contract key
/// comes from configuration; deployment and key derivation are the binding
/// layer's concern. Certification timestamps are stamped client-side here
/// (contract execution has no clock), and the at-most-once guarantee is
/// provided by the registry's deterministic first-wins merge rather than a
/// lock.
pub struct ContractClient {
    api: Mutex<WebApi>,
    key: ContractKey,
}

impl ContractClient {
    /// Connect a native WebApi client to a Freenet node
    /// (e.g. `ws://localhost:3005/v1/contract/command?encodingProtocol=native`).
    pub async fn connect(node_url: &str, key: ContractKey) -> Result<Self, WorkflowError> {
        let (ws_conn, _) = tokio_tungstenite::connect_async(node_url)
            .await
            .map_err(|e| {
                WorkflowError::StoreUnavailable(format!("websocket connect failed: {e}"))
            })?;
        Ok(Self {
            api: Mutex::new(WebApi::start(ws_conn)),
            key,
        })
    }

    async fn fetch_state(&self, api: &mut WebApi) -> Result<RegistryState, WorkflowError> {
        api.send(ClientRequest::ContractOp(ContractRequest::Get {
            key: *self.key.id(),
            return_contract_code: false,
            subscribe: false,
            blocking_subscribe: false,
        }))
        .await
        .map_err(|e| WorkflowError::StoreUnavailable(format!("contract GET failed: {e}")))?;

        let response = recv_matching(api, is_get_response, REQUEST_TIMEOUT)
            .await
            .ok_or_else(|| {
                WorkflowError::StoreUnavailable("timed out waiting for GetResponse".into())
            })?;
        let bytes = extract_get_response_state(&response).ok_or_else(|| {
            WorkflowError::StoreUnavailable("GetResponse carried no state".into())
        })?;

        if bytes.is_empty() {
            return Ok(RegistryState::default());
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| WorkflowError::StoreUnavailable(format!("invalid registry state: {e}")))
    }

    async fn send_delta(
        &self,
        api: &mut WebApi,
        delta: &RegistryState,
    ) -> Result<(), WorkflowError> {
        let bytes = serde_json::to_vec(delta)
            .map_err(|e| WorkflowError::StoreUnavailable(e.to_string()))?;

        api.send(ClientRequest::ContractOp(ContractRequest::Update {
            key: self.key,
            data: UpdateData::Delta(StateDelta::from(bytes)),
        }))
        .await
        .map_err(|e| WorkflowError::StoreUnavailable(format!("contract update failed: {e}")))?;

        recv_matching(api, is_update_response, REQUEST_TIMEOUT)
            .await
            .ok_or_else(|| {
                WorkflowError::StoreUnavailable("timed out waiting for UpdateResponse".into())
            })?;
        Ok(())
    }
}

/// Millis plus a random suffix; concurrent clients cannot coordinate a
/// sequence counter the way the in-process store does.
fn fresh_product_id() -> ProductId {
    ProductId(format!(
        "p-{}-{:04x}",
        Utc::now().timestamp_millis(),
        rand::random::<u16>()
    ))
}

#[async_trait]
impl WorkflowClient for ContractClient {
    async fn submit_product(
        &self,
        name: &str,
        batch_id: &str,
        owner: &str,
    ) -> Result<ProductId, WorkflowError> {
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

        let product = Product {
            id: fresh_product_id(),
            name: name.to_string(),
            batch_id: batch_id.to_string(),
            owner: owner.to_string(),
            status: ProductStatus::Uncertified,
            created_at: Utc::now(),
        };
        let id = product.id.clone();

        let mut delta = RegistryState::default();
        delta.products.insert(id.clone(), product);

        let mut api = self.api.lock().await;
        self.send_delta(&mut api, &delta).await?;
        Ok(id)
    }

    async fn list_pending_certification(&self) -> Result<Vec<Product>, WorkflowError> {
        let mut api = self.api.lock().await;
        let state = self.fetch_state(&mut api).await?;
        Ok(state
            .products
            .into_values()
            .filter(|p| p.status == ProductStatus::Uncertified)
            .collect())
    }

    async fn certify(
        &self,
        product_id: &ProductId,
        certifier_name: &str,
    ) -> Result<Certification, WorkflowError> {
        if certifier_name.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "certifier name must not be empty".into(),
            ));
        }

        let mut api = self.api.lock().await;
        let state = self.fetch_state(&mut api).await?;

        let mut product = state
            .products
            .get(product_id)
            .cloned()
            .ok_or_else(|| WorkflowError::NotFound(product_id.0.clone()))?;
        if product.status == ProductStatus::Certified {
            return Err(WorkflowError::AlreadyCertified(product_id.0.clone()));
        }

        let certification = Certification {
            product_id: product_id.clone(),
            certifier_name: certifier_name.to_string(),
            timestamp: Utc::now(),
        };
        product.status = ProductStatus::Certified;

        let mut delta = RegistryState::default();
        delta.products.insert(product_id.clone(), product);
        delta
            .certifications
            .insert(product_id.clone(), certification.clone());

        self.send_delta(&mut api, &delta).await?;
        Ok(certification)
    }

    async fn get_product_with_history(
        &self,
        product_id: &ProductId,
    ) -> Result<(Product, Option<Certification>), WorkflowError> {
        let mut api = self.api.lock().await;
        let mut state = self.fetch_state(&mut api).await?;

        let product = state
            .products
            .remove(product_id)
            .ok_or_else(|| WorkflowError::NotFound(product_id.0.clone()))?;
        let certification = state.certifications.remove(product_id);
        Ok((product, certification))
    }
}

/// Wait for a HostResponse matching a predicate, with timeout.
/// Non-matching responses (e.g. stray notifications) are discarded.
async fn recv_matching<F>(api: &mut WebApi, predicate: F, timeout: Duration) -> Option<HostResponse>
where
    F: Fn(&HostResponse) -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return None;
        }
        match tokio::time::timeout(remaining, api.recv()).await {
            Ok(Ok(resp)) if predicate(&resp) => return Some(resp),
            Ok(Ok(_other)) => continue,
            Ok(Err(_)) => return None,
            Err(_) => return None, // timeout
        }
    }
}

fn is_get_response(resp: &HostResponse) -> bool {
    matches!(
        resp,
        HostResponse::ContractResponse(ContractResponse::GetResponse { .. })
    )
}

fn is_update_response(resp: &HostResponse) -> bool {
    matches!(
        resp,
        HostResponse::ContractResponse(ContractResponse::UpdateResponse { .. })
    )
}

fn extract_get_response_state(resp: &HostResponse) -> Option<Vec<u8>> {
    if let HostResponse::ContractResponse(ContractResponse::GetResponse { state, .. }) = resp {
        Some(state.as_ref().to_vec())
    } else {
        None
    }
}
