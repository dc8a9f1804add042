//! # Customer REST API
//!
//! Thin HTTP shell over [`CachedCustomerService`](customer_persistence::CachedCustomerService).
//!
//! ## Routes
//!
//! | Method | Path | Service operation |
//! |---|---|---|
//! | `GET` | `/customers` | `get_all_customers` |
//! | `GET` | `/customers?email=..` | `get_customers_by_email` |
//! | `POST` | `/customers` | `create_customer` |
//! | `GET` | `/customers/{id}` | `get_customer_by_id` |
//! | `PUT` | `/customers/{id}` | `update_customer` |
//! | `DELETE` | `/customers/{id}` | `delete_customer` |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Axum HTTP Server                         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ApiContext                               │
//! │                (CachedCustomerService)                      │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                   │
//!                    ▼                   ▼
//! ┌─────────────────────────┐   ┌──────────────────────────────┐
//! │   Memory / Redis Cache  │   │   Memory / ScyllaDB Store    │
//! └─────────────────────────┘   └──────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod context;
pub mod error;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::get,
};
use customer_domain::{Customer, CustomerDetails, CustomerId};
use serde::Deserialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use context::ApiContext;
pub use error::{ApiError, ApiResult};

/// Optional filters on the collection route
#[derive(Debug, Default, Deserialize)]
pub struct CustomerQuery {
    pub email: Option<String>,
}

/// `GET /customers` and `GET /customers?email=..`
pub async fn list_customers(
    State(ctx): State<ApiContext>,
    Query(query): Query<CustomerQuery>,
) -> ApiResult<Json<Vec<Customer>>> {
    let customers = match query.email {
        Some(email) => ctx.customers.get_customers_by_email(&email).await?,
        None => ctx.customers.get_all_customers().await?,
    };
    Ok(Json(customers))
}

/// `POST /customers`
pub async fn create_customer(
    State(ctx): State<ApiContext>,
    Json(details): Json<CustomerDetails>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let created = ctx.customers.create_customer(details).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /customers/{id}`
pub async fn get_customer(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Customer>> {
    let customer_id = parse_id(&id)?;
    ctx.customers
        .get_customer_by_id(&customer_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::customer_not_found(id))
}

/// `PUT /customers/{id}`
pub async fn update_customer(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Json(changes): Json<CustomerDetails>,
) -> ApiResult<Json<Customer>> {
    let customer_id = parse_id(&id)?;
    ctx.customers
        .update_customer(&customer_id, changes)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::customer_not_found(id))
}

/// `DELETE /customers/{id}`
pub async fn delete_customer(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let customer_id = parse_id(&id)?;
    if ctx.customers.delete_customer(&customer_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::customer_not_found(id))
    }
}

fn parse_id(raw: &str) -> ApiResult<CustomerId> {
    raw.parse()
        .map_err(|e: customer_domain::DomainError| ApiError::InvalidInput(e.to_string()))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    "OK"
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %o, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(allowed))
}

/// Build the Axum router
pub fn build_router(ctx: ApiContext, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        // Health check
        .route("/health", get(health_check))
        .route("/", get(|| async { "Customer Service API" }))
        // State and middleware
        .with_state(ctx)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
