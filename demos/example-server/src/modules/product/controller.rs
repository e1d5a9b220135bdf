use super::error::ProductError;
use super::model::{CreateProductRequest, Product};
use super::service::ProductService;
use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use error_interceptor::prelude::*;
use std::sync::Arc;

pub fn router(service: Arc<ProductService>) -> Router {
    Router::new()
        .route("/", post(create).get(list))
        .route("/{id}", get(get_one))
        .route("/maintenance", get(maintenance))
        .route("/admin", get(admin))
        .with_state(service)
}

async fn create(
    State(service): State<Arc<ProductService>>,
    Checked(Json(req)): Checked<Json<CreateProductRequest>>,
) -> Result<(StatusCode, Json<Product>), Failure> {
    let product = service.create(req)?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_one(
    State(service): State<Arc<ProductService>>,
    Checked(Path(id)): Checked<Path<String>>,
) -> Result<Json<Product>, Failure> {
    Ok(Json(service.get(id)?))
}

async fn list(State(service): State<Arc<ProductService>>) -> Result<Json<Vec<Product>>, Failure> {
    Ok(Json(service.list()?))
}

/// Unclassified failure: detail only outside production
async fn maintenance() -> Result<Json<Product>, Failure> {
    Err(Debuggable::new(ProductError::StoreUnavailable).into())
}

async fn admin() -> Result<&'static str, Abort> {
    Err(Abort::unauthorized().with_header("www-authenticate", "Bearer"))
}
