//! # Product Repository
//!
//! Direct product entry and the CSV upsert path.
//!
//! Stock movements caused by orders do not go through here; the order
//! engine adjusts `quantity` inside its own transactions.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use stockroom_core::validation::{validate_create_product, validate_sku, validate_update_product};
use stockroom_core::{CreateProductRequest, Product, UpdateProductRequest};

/// Whether an upsert created or overwrote the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Inserted,
    Updated,
}

#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Stored product with its assigned id
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn create(&self, request: CreateProductRequest) -> DbResult<Product> {
        let request = validate_create_product(&request)?;
        let now = Utc::now();

        debug!(sku = %request.sku, quantity = request.quantity, "Inserting product");

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                sku, name, cost_price_cents, quantity,
                preset_price_cents, actual_price_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            RETURNING *
            "#,
        )
        .bind(&request.sku)
        .bind(&request.name)
        .bind(request.cost_price_cents)
        .bind(request.quantity)
        .bind(request.preset_price_cents)
        .bind(request.actual_price_cents)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value("sku", &request.sku))?;

        info!(id = product.id, sku = %product.sku, "Product created");
        Ok(product)
    }

    /// Gets a product by SKU, `None` when absent.
    pub async fn find_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE sku = ?1")
            .bind(sku.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by SKU.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no product carries this SKU
    pub async fn get(&self, sku: &str) -> DbResult<Product> {
        self.find_by_sku(sku)
            .await?
            .ok_or_else(|| DbError::not_found("Product", sku))
    }

    /// All products, newest first.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Applies a partial edit. Absent fields keep their stored value.
    ///
    /// The merge happens inside the UPDATE itself, so a concurrent order
    /// deducting stock is not overwritten by a stale `quantity`.
    pub async fn update(&self, sku: &str, patch: UpdateProductRequest) -> DbResult<Product> {
        let patch = validate_update_product(&patch)?;
        let now = Utc::now();

        debug!(sku = %sku, "Updating product");

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = COALESCE(?2, name),
                cost_price_cents = COALESCE(?3, cost_price_cents),
                quantity = COALESCE(?4, quantity),
                preset_price_cents = COALESCE(?5, preset_price_cents),
                actual_price_cents = COALESCE(?6, actual_price_cents),
                updated_at = ?7
            WHERE sku = ?1
            RETURNING *
            "#,
        )
        .bind(sku.trim())
        .bind(&patch.name)
        .bind(patch.cost_price_cents)
        .bind(patch.quantity)
        .bind(patch.preset_price_cents)
        .bind(patch.actual_price_cents)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Product", sku))?;

        info!(sku = %product.sku, quantity = product.quantity, "Product updated");
        Ok(product)
    }

    /// Deletes a product.
    ///
    /// Orders that referenced it keep their snapshots and lose their
    /// `product_id` (ON DELETE SET NULL); deleting one of those orders
    /// later cannot restore stock.
    pub async fn delete(&self, sku: &str) -> DbResult<Product> {
        debug!(sku = %sku, "Deleting product");

        let mut tx = self.pool.begin().await?;

        let product = sqlx::query_as::<_, Product>("DELETE FROM products WHERE sku = ?1 RETURNING *")
            .bind(sku.trim())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Product", sku))?;

        let detached: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE product_id IS NULL AND product_sku = ?1",
        )
        .bind(&product.sku)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(sku = %product.sku, detached_orders = detached, "Product deleted");
        Ok(product)
    }

    /// Creates the product or overwrites an existing one with the same SKU.
    ///
    /// Required fields always overwrite. `preset_price_cents` and
    /// `actual_price_cents` only overwrite when present in the request.
    pub async fn upsert(&self, request: CreateProductRequest) -> DbResult<(Product, UpsertAction)> {
        let request = validate_create_product(&request)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO products (
                sku, name, cost_price_cents, quantity,
                preset_price_cents, actual_price_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            ON CONFLICT(sku) DO NOTHING
            "#,
        )
        .bind(&request.sku)
        .bind(&request.name)
        .bind(request.cost_price_cents)
        .bind(request.quantity)
        .bind(request.preset_price_cents)
        .bind(request.actual_price_cents)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        let (product, action) = if inserted {
            let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE sku = ?1")
                .bind(&request.sku)
                .fetch_one(&mut *tx)
                .await?;
            (product, UpsertAction::Inserted)
        } else {
            let product = sqlx::query_as::<_, Product>(
                r#"
                UPDATE products SET
                    name = ?2,
                    cost_price_cents = ?3,
                    quantity = ?4,
                    preset_price_cents = COALESCE(?5, preset_price_cents),
                    actual_price_cents = COALESCE(?6, actual_price_cents),
                    updated_at = ?7
                WHERE sku = ?1
                RETURNING *
                "#,
            )
            .bind(&request.sku)
            .bind(&request.name)
            .bind(request.cost_price_cents)
            .bind(request.quantity)
            .bind(request.preset_price_cents)
            .bind(request.actual_price_cents)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;
            (product, UpsertAction::Updated)
        };

        tx.commit().await?;

        debug!(sku = %product.sku, action = ?action, "Product upserted");
        Ok((product, action))
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Current on-hand quantity for a SKU.
    pub async fn quantity(&self, sku: &str) -> DbResult<i64> {
        let sku = validate_sku(sku)?;
        sqlx::query_scalar("SELECT quantity FROM products WHERE sku = ?1")
            .bind(&sku)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", sku))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
