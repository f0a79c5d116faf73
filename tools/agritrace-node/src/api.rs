//! HTTP surface of the certification node.
//!
//! Thin request/response mapping over the workflow manager and the user
//! directory; every error arrives as a typed `WorkflowError`/`AuthError`
//! and leaves as a status code plus `{message}` body.

use std::sync::Arc;

use agritrace_common::certification::Certification;
use agritrace_common::error::WorkflowError;
use agritrace_common::identity::Role;
use agritrace_common::product::{Product, ProductId};
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::auth::AuthError;
use crate::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

// ─── API types ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub user_type: Role,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub username: String,
    pub user_type: Role,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitProductRequest {
    pub name: String,
    #[serde(default)]
    pub batch_id: String,
    pub owner: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitProductResponse {
    pub product_id: ProductId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertifyRequest {
    pub product_id: ProductId,
    pub certifier: String,
}

#[derive(Serialize)]
pub struct CertifyResponse {
    pub message: String,
    pub certification: Certification,
}

#[derive(Serialize)]
pub struct ProductHistoryResponse {
    #[serde(flatten)]
    pub product: Product,
    /// Empty when the product has not been certified yet.
    pub certifications: Vec<Certification>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

// ─── Auth handlers ───────────────────────────────────────────────────────────

async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .users
        .register(&req.username, &req.password, req.user_type)
        .map_err(auth_error_response)?;

    tracing::info!(username = %req.username, role = req.user_type.as_str(), "new user registered");
    Ok(Json(MessageResponse {
        message: "User registered successfully.".to_string(),
    }))
}

async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let actor = state
        .users
        .login(&req.username, &req.password)
        .map_err(auth_error_response)?;

    tracing::info!(username = %actor.username, "user logged in");
    Ok(Json(LoginResponse {
        message: "Login successful.".to_string(),
        username: actor.username,
        user_type: actor.role,
    }))
}

// ─── Workflow handlers ───────────────────────────────────────────────────────

async fn submit_product_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitProductRequest>,
) -> Result<Json<SubmitProductResponse>, ApiError> {
    let product_id = state
        .workflow
        .submit_product(&req.name, &req.batch_id, &req.owner)
        .map_err(workflow_error_response)?;

    tracing::info!(%product_id, owner = %req.owner, "product registered");
    Ok(Json(SubmitProductResponse { product_id }))
}

async fn list_pending_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let pending = state
        .workflow
        .list_pending_certification()
        .map_err(workflow_error_response)?;
    Ok(Json(pending))
}

async fn certify_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CertifyRequest>,
) -> Result<Json<CertifyResponse>, ApiError> {
    let certification = state
        .workflow
        .certify(&req.product_id, &req.certifier)
        .map_err(workflow_error_response)?;

    tracing::info!(product_id = %req.product_id, certifier = %req.certifier, "product certified");
    Ok(Json(CertifyResponse {
        message: "Product certified successfully.".to_string(),
        certification,
    }))
}

async fn product_history_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProductHistoryResponse>, ApiError> {
    let (product, certification) = state
        .workflow
        .get_product_with_history(&ProductId(id))
        .map_err(workflow_error_response)?;

    Ok(Json(ProductHistoryResponse {
        product,
        certifications: certification.into_iter().collect(),
    }))
}

// ─── Health ─────────────────────────────────────────────────────────────────

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

// ─── Error mapping ───────────────────────────────────────────────────────────

fn workflow_error_response(err: WorkflowError) -> ApiError {
    let status = match &err {
        WorkflowError::Validation(_) => StatusCode::BAD_REQUEST,
        WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
        WorkflowError::AlreadyCertified(_) | WorkflowError::Conflict(_) => StatusCode::CONFLICT,
        WorkflowError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (
        status,
        Json(ErrorResponse {
            message: err.to_string(),
        }),
    )
}

fn auth_error_response(err: AuthError) -> ApiError {
    let status = match &err {
        AuthError::UserExists(_) => StatusCode::CONFLICT,
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::MissingFields => StatusCode::BAD_REQUEST,
        AuthError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (
        status,
        Json(ErrorResponse {
            message: err.to_string(),
        }),
    )
}

// ─── Router ─────────────────────────────────────────────────────────────────

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/api/register", post(register_handler))
        .route("/api/login", post(login_handler))
        .route("/api/products", post(submit_product_handler))
        .route("/api/uncertified-products", get(list_pending_handler))
        .route("/api/certify", post(certify_handler))
        .route("/api/products/{id}", get(product_history_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}
