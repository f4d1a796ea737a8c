use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo_types::{NewProduct, Product, ProductChanges};
use crate::{db::classify, error::StoreError};

/// Product store. Each call is a single atomic write or read; no locks
/// are held across calls.
#[async_trait]
pub trait ProductRepo: Send + Sync {
    /// All products, most recently created first.
    async fn list(&self) -> Result<Vec<Product>, StoreError>;
    async fn get(&self, id: Uuid) -> Result<Option<Product>, StoreError>;
    async fn create(&self, product: NewProduct) -> Result<Product, StoreError>;
    /// Merges `changes` into the stored record. `None` when `id` is unknown.
    async fn update(&self, id: Uuid, changes: ProductChanges) -> Result<Option<Product>, StoreError>;
    /// `false` when nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

const COLUMNS: &str = "id, name, description, price, category, created_at, updated_at";

#[derive(Clone)]
pub struct PgProductRepo {
    db: PgPool,
}

impl PgProductRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductRepo for PgProductRepo {
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {COLUMNS} FROM products ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db)
        .await
        .map_err(|e| classify(e, "id"))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        sqlx::query_as::<_, Product>(&format!("SELECT {COLUMNS} FROM products WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| classify(e, "id"))
    }

    async fn create(&self, product: NewProduct) -> Result<Product, StoreError> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (id, name, description, price, category)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.category)
        .fetch_one(&self.db)
        .await
        .map_err(|e| classify(e, "id"))
    }

    async fn update(&self, id: Uuid, changes: ProductChanges) -> Result<Option<Product>, StoreError> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
               SET name        = COALESCE($2, name),
                   description = COALESCE($3, description),
                   price       = COALESCE($4, price),
                   category    = COALESCE($5, category),
                   updated_at  = clock_timestamp()
             WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.price)
        .bind(changes.category)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| classify(e, "id"))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let deleted = sqlx::query_scalar::<_, Uuid>("DELETE FROM products WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| classify(e, "id"))?;
        Ok(deleted.is_some())
    }
}

/// In-process product store; keeps insertion order.
#[derive(Default)]
pub struct MemoryProductRepo {
    products: RwLock<Vec<Product>>,
}

impl MemoryProductRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepo for MemoryProductRepo {
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let products = self.products.read().await;
        Ok(products.iter().rev().cloned().collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        let products = self.products.read().await;
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, product: NewProduct) -> Result<Product, StoreError> {
        let now = OffsetDateTime::now_utc();
        let product = Product {
            id: Uuid::new_v4(),
            name: product.name,
            description: product.description,
            price: product.price,
            category: product.category,
            created_at: now,
            updated_at: now,
        };
        self.products.write().await.push(product.clone());
        Ok(product)
    }

    async fn update(&self, id: Uuid, changes: ProductChanges) -> Result<Option<Product>, StoreError> {
        let mut products = self.products.write().await;
        let Some(p) = products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            p.name = name;
        }
        if let Some(description) = changes.description {
            p.description = description;
        }
        if let Some(price) = changes.price {
            p.price = price;
        }
        if let Some(category) = changes.category {
            p.category = category;
        }
        p.updated_at = OffsetDateTime::now_utc();
        Ok(Some(p.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() != before)
    }
}
