use tracing::info;
use uuid::Uuid;

use super::{
    dto::ProductRequest,
    repo::ProductRepo,
    repo_types::{NewProduct, Product, ProductChanges},
};
use crate::{
    error::ServiceError,
    validation::{self, FieldErrors, DEFAULT_CATEGORY},
};

pub const NOT_FOUND: &str = "Product not found";

fn not_found() -> ServiceError {
    ServiceError::NotFound(NOT_FOUND.into())
}

/// Product ids are UUIDs; anything else can never resolve.
fn parse_id(raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw).map_err(|_| not_found())
}

pub async fn list(repo: &dyn ProductRepo) -> Result<Vec<Product>, ServiceError> {
    Ok(repo.list().await?)
}

pub async fn get(repo: &dyn ProductRepo, id: &str) -> Result<Product, ServiceError> {
    let id = parse_id(id)?;
    repo.get(id).await?.ok_or_else(not_found)
}

pub async fn create(
    repo: &dyn ProductRepo,
    actor: Uuid,
    req: ProductRequest,
) -> Result<Product, ServiceError> {
    let mut errors = FieldErrors::new();
    let name = validation::product_name(req.name.flatten().as_deref(), &mut errors);
    let price = validation::product_price(req.price.flatten(), &mut errors);
    errors.finish()?;

    let product = repo
        .create(NewProduct {
            name,
            description: validation::optional_text(req.description.as_deref()).unwrap_or_default(),
            price,
            category: validation::optional_text(req.category.as_deref())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        })
        .await?;

    info!(product_id = %product.id, %actor, "product created");
    Ok(product)
}

/// Partial update: only the fields present in `req` are validated and
/// written; the rest keep their stored values. An explicit `null` for a
/// required field is present and fails validation.
pub async fn update(
    repo: &dyn ProductRepo,
    actor: Uuid,
    id: &str,
    req: ProductRequest,
) -> Result<Product, ServiceError> {
    let id = parse_id(id)?;

    let mut errors = FieldErrors::new();
    let name = req
        .name
        .map(|n| validation::product_name(n.as_deref(), &mut errors));
    let price = req
        .price
        .map(|p| validation::product_price(p, &mut errors));
    errors.finish()?;

    let changes = ProductChanges {
        name,
        description: validation::optional_text(req.description.as_deref()),
        price,
        category: validation::optional_text(req.category.as_deref()),
    };

    let product = repo.update(id, changes).await?.ok_or_else(not_found)?;
    info!(product_id = %product.id, %actor, "product updated");
    Ok(product)
}

pub async fn delete(repo: &dyn ProductRepo, actor: Uuid, id: &str) -> Result<(), ServiceError> {
    let id = parse_id(id)?;
    if !repo.delete(id).await? {
        return Err(not_found());
    }
    info!(product_id = %id, %actor, "product deleted");
    Ok(())
}
