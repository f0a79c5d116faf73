use agritrace_common::certification::Certification;
use agritrace_common::error::WorkflowError;
use agritrace_common::identity::{Actor, Role};
use agritrace_common::product::{Product, ProductId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::WorkflowClient;

/// HTTP adapter for the workflow, targeting the agritrace node's REST API.
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitProductRequest<'a> {
    name: &'a str,
    batch_id: &'a str,
    owner: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitProductResponse {
    product_id: ProductId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CertifyRequest<'a> {
    product_id: &'a ProductId,
    certifier: &'a str,
}

#[derive(Deserialize)]
struct CertifyResponse {
    certification: Certification,
}

#[derive(Deserialize)]
struct ProductHistoryResponse {
    #[serde(flatten)]
    product: Product,
    certifications: Vec<Certification>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest<'a> {
    username: &'a str,
    password: &'a str,
    user_type: Role,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: String,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Register a new user. Conflicts if the username is taken.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<(), WorkflowError> {
        let response = self
            .http
            .post(self.url("/api/register"))
            .json(&RegisterRequest {
                username,
                password,
                user_type: role,
            })
            .send()
            .await
            .map_err(transport)?;
        if response.status().as_u16() == 409 {
            return Err(WorkflowError::Conflict(username.to_string()));
        }
        check_status(response).await?;
        Ok(())
    }

    /// Log in and return the authenticated actor identity.
    pub async fn login(&self, username: &str, password: &str) -> Result<Actor, WorkflowError> {
        let response = self
            .http
            .post(self.url("/api/login"))
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response).await?;
        response.json::<Actor>().await.map_err(transport)
    }
}

#[async_trait]
impl WorkflowClient for RestClient {
    async fn submit_product(
        &self,
        name: &str,
        batch_id: &str,
        owner: &str,
    ) -> Result<ProductId, WorkflowError> {
        let response = self
            .http
            .post(self.url("/api/products"))
            .json(&SubmitProductRequest {
                name,
                batch_id,
                owner,
            })
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response).await?;
        let body: SubmitProductResponse = response.json().await.map_err(transport)?;
        Ok(body.product_id)
    }

    async fn list_pending_certification(&self) -> Result<Vec<Product>, WorkflowError> {
        let response = self
            .http
            .get(self.url("/api/uncertified-products"))
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response).await?;
        response.json::<Vec<Product>>().await.map_err(transport)
    }

    async fn certify(
        &self,
        product_id: &ProductId,
        certifier_name: &str,
    ) -> Result<Certification, WorkflowError> {
        let response = self
            .http
            .post(self.url("/api/certify"))
            .json(&CertifyRequest {
                product_id,
                certifier: certifier_name,
            })
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response).await?;
        let body: CertifyResponse = response.json().await.map_err(transport)?;
        Ok(body.certification)
    }

    async fn get_product_with_history(
        &self,
        product_id: &ProductId,
    ) -> Result<(Product, Option<Certification>), WorkflowError> {
        let response = self
            .http
            .get(self.url(&format!("/api/products/{}", product_id)))
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response).await?;
        let body: ProductHistoryResponse = response.json().await.map_err(transport)?;
        Ok((body.product, body.certifications.into_iter().next()))
    }
}

fn transport(err: reqwest::Error) -> WorkflowError {
    WorkflowError::StoreUnavailable(err.to_string())
}

/// Map non-success responses back onto the typed taxonomy.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, WorkflowError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.message,
        Err(_) => status.to_string(),
    };

    Err(match status.as_u16() {
        400 => WorkflowError::Validation(message),
        401 => WorkflowError::Validation(message),
        404 => WorkflowError::NotFound(message),
        409 => WorkflowError::AlreadyCertified(message),
        503 => WorkflowError::StoreUnavailable(message),
        _ => WorkflowError::StoreUnavailable(format!("unexpected status {status}: {message}")),
    })
}
