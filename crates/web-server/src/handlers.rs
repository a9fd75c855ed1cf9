use crate::{error::AppError, AppState};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use core_types::{CreatedCustomer, CustomerRecord};
use onboarding::{CustomerPayload, CustomerStore};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct CreateCustomerResponse {
    pub message: &'static str,
    #[serde(flatten)]
    pub created: CreatedCustomer,
}

fn parse_customer_id(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::InvalidCustomerId(raw.to_string()))
}

/// # GET /
pub async fn home() -> &'static str {
    "Home"
}

/// # GET /health
/// Answers 200 only while the database accepts queries.
pub async fn health<S: CustomerStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<impl IntoResponse, AppError> {
    state.service.health().await?;
    Ok(Json(json!({ "status": "ok" })))
}

/// # GET /readCustomer/:id
pub async fn read_customer<S: CustomerStore>(
    Path(raw_id): Path<String>,
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<CustomerRecord>, AppError> {
    let cust_dbid = parse_customer_id(&raw_id)?;
    let record = state.service.read(cust_dbid).await?;
    Ok(Json(record))
}

/// # POST /createCustomer
/// Responds 201 with the generated keys and account number.
pub async fn create_customer<S: CustomerStore>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CustomerPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload.map_err(|rejection| AppError::MalformedBody(rejection.body_text()))?;

    let created = state.service.create(payload).await?;
    tracing::info!(customer_id = created.customer_id, "Customer created via API.");

    let body = CreateCustomerResponse {
        message: "Customer created successfully",
        created,
    };
    Ok((StatusCode::CREATED, Json(body)))
}

/// # DELETE /deleteCustomer/:id
pub async fn delete_customer<S: CustomerStore>(
    Path(raw_id): Path<String>,
    State(state): State<Arc<AppState<S>>>,
) -> Result<StatusCode, AppError> {
    let cust_dbid = parse_customer_id(&raw_id)?;
    state.service.delete(cust_dbid).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_ids_must_be_integers() {
        assert_eq!(parse_customer_id("42").unwrap(), 42);
        assert!(matches!(parse_customer_id("abc"), Err(AppError::InvalidCustomerId(raw)) if raw == "abc"));
        assert!(parse_customer_id("4.2").is_err());
    }
}
