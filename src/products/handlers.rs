use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{MessageResponse, ProductRequest},
    repo_types::Product,
    services,
};
use crate::{auth::AuthUser, routes::error::ApiError, state::AppState};

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[instrument(skip(state))]
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(services::list(state.products.as_ref()).await?))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(services::get(state.products.as_ref(), &id).await?))
}

// The guard runs before the body is read, so an unauthenticated request
// never reaches validation or the store.
#[instrument(skip(state, auth, payload), fields(user_id = %auth.user_id))]
pub async fn create_product(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(body) = payload?;
    let product = services::create(state.products.as_ref(), auth.user_id, body).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state, auth, payload), fields(user_id = %auth.user_id))]
pub async fn update_product(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let Json(body) = payload?;
    let product = services::update(state.products.as_ref(), auth.user_id, &id, body).await?;
    Ok(Json(product))
}

#[instrument(skip(state, auth), fields(user_id = %auth.user_id))]
pub async fn delete_product(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    services::delete(state.products.as_ref(), auth.user_id, &id).await?;
    Ok(Json(MessageResponse {
        message: "Product deleted successfully",
    }))
}
