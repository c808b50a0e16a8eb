use std::sync::Arc;

use crate::{
    common::{none_if_empty, parse_decimal_or, parse_i32_or},
    db::DbPool,
    entities::{
        category, lot, price_list_item,
        product::{self, Entity as Product, DEFAULT_UNIT},
        supplier,
    },
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, EntityTrait, FromQueryResult,
    JoinType, ModelTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
    TransactionTrait,
};
use tracing::{info, instrument, warn};

/// Form-level field set for creating or updating a product.
#[derive(Debug, Clone, Default)]
pub struct ProductData {
    pub sku: String,
    pub name: String,
    pub category_id: Option<i32>,
    pub supplier_id: Option<i32>,
    pub unit: String,
    pub vat: i32,
    pub cost: Decimal,
    pub price: Decimal,
    pub stock_qty: i32,
    pub min_stock: i32,
    pub notes: Option<String>,
}

/// One row of the products CSV export, joined to category/supplier names.
#[derive(Debug, Clone, FromQueryResult)]
pub struct ProductExportRow {
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub supplier: Option<String>,
    pub unit: String,
    pub vat: i32,
    pub cost: Decimal,
    pub price: Decimal,
    pub stock_qty: i32,
    pub min_stock: i32,
    pub notes: Option<String>,
}

/// One parsed row of a products CSV import. All columns are read as text;
/// numeric coercion happens field by field with a zero fallback.
#[derive(Debug, serde::Deserialize)]
struct ProductCsvRecord {
    #[serde(default)]
    sku: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    supplier: String,
    #[serde(default)]
    unit: String,
    #[serde(default)]
    vat: String,
    #[serde(default)]
    cost: String,
    #[serde(default)]
    price: String,
    #[serde(default)]
    stock_qty: String,
    #[serde(default)]
    min_stock: String,
    #[serde(default)]
    notes: String,
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Service for managing products
pub struct ProductService {
    db_pool: Arc<DbPool>,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn sku_taken(&self, sku: &str, exclude_id: Option<i32>) -> Result<bool, ServiceError> {
        let mut query = Product::find().filter(product::Column::Sku.eq(sku));
        if let Some(id) = exclude_id {
            query = query.filter(product::Column::Id.ne(id));
        }
        Ok(query
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .is_some())
    }

    fn validate(data: &ProductData) -> Result<(String, String), ServiceError> {
        let sku = data.sku.trim().to_string();
        let name = data.name.trim().to_string();
        if sku.is_empty() {
            return Err(ServiceError::ValidationError("SKU is required".to_string()));
        }
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Product name is required".to_string(),
            ));
        }
        Ok((sku, name))
    }

    #[instrument(skip(self, data))]
    pub async fn create(&self, data: ProductData) -> Result<product::Model, ServiceError> {
        let (sku, name) = Self::validate(&data)?;
        if self.sku_taken(&sku, None).await? {
            return Err(ServiceError::ValidationError(format!(
                "Product with SKU '{}' already exists",
                sku
            )));
        }

        let unit = if data.unit.trim().is_empty() {
            DEFAULT_UNIT.to_string()
        } else {
            data.unit.trim().to_string()
        };

        let product = product::ActiveModel {
            sku: Set(sku.clone()),
            name: Set(name),
            category_id: Set(data.category_id),
            supplier_id: Set(data.supplier_id),
            unit: Set(unit),
            vat: Set(data.vat),
            cost: Set(data.cost),
            price: Set(data.price),
            stock_qty: Set(data.stock_qty),
            min_stock: Set(data.min_stock),
            notes: Set(data.notes),
            ..Default::default()
        };

        let created = product
            .insert(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        info!(product_id = created.id, sku = %sku, "Product created");
        Ok(created)
    }

    #[instrument(skip(self, data))]
    pub async fn update(&self, id: i32, data: ProductData) -> Result<product::Model, ServiceError> {
        let existing = self.get(id).await?;
        let (sku, name) = Self::validate(&data)?;
        if self.sku_taken(&sku, Some(id)).await? {
            return Err(ServiceError::ValidationError(format!(
                "Product with SKU '{}' already exists",
                sku
            )));
        }

        let unit = if data.unit.trim().is_empty() {
            DEFAULT_UNIT.to_string()
        } else {
            data.unit.trim().to_string()
        };

        let mut product: product::ActiveModel = existing.into();
        product.sku = Set(sku);
        product.name = Set(name);
        product.category_id = Set(data.category_id);
        product.supplier_id = Set(data.supplier_id);
        product.unit = Set(unit);
        product.vat = Set(data.vat);
        product.cost = Set(data.cost);
        product.price = Set(data.price);
        product.stock_qty = Set(data.stock_qty);
        product.min_stock = Set(data.min_stock);
        product.notes = Set(data.notes);

        let updated = product
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        info!(product_id = id, "Product updated");
        Ok(updated)
    }

    /// Deletes a product together with its lots and price-list items.
    /// The cascade is explicit and runs in one transaction.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        self.db_pool
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    let product = Product::find_by_id(id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Product with ID {} not found", id))
                        })?;

                    lot::Entity::delete_many()
                        .filter(lot::Column::ProductId.eq(id))
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    price_list_item::Entity::delete_many()
                        .filter(price_list_item::Column::ProductId.eq(id))
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    product.delete(txn).await.map_err(ServiceError::db_error)?;
                    Ok(())
                })
            })
            .await
            .map_err(super::unwrap_txn_err)?;

        info!(product_id = id, "Product deleted with lots and price list items");
        Ok(())
    }

    pub async fn get(&self, id: i32) -> Result<product::Model, ServiceError> {
        Product::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product with ID {} not found", id)))
    }

    pub async fn get_by_sku(&self, sku: &str) -> Result<Option<product::Model>, ServiceError> {
        Product::find()
            .filter(product::Column::Sku.eq(sku))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Case-insensitive substring search on name or SKU, with an optional
    /// exact category-name filter, ordered by name ascending.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        q: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<product::Model>, ServiceError> {
        let mut query = Product::find();

        if let Some(q) = q.map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", q.to_lowercase());
            query = query.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            product::Entity,
                            product::Column::Name,
                        ))))
                        .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            product::Entity,
                            product::Column::Sku,
                        ))))
                        .like(pattern),
                    ),
            );
        }

        if let Some(cat) = category.map(str::trim).filter(|c| !c.is_empty()) {
            query = query
                .join(JoinType::LeftJoin, product::Relation::Category.def())
                .filter(category::Column::Name.eq(cat));
        }

        query
            .order_by_asc(product::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    pub async fn list_all(&self) -> Result<Vec<product::Model>, ServiceError> {
        Product::find()
            .order_by_asc(product::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Rows for the products CSV export: every product ordered by name,
    /// joined to its category and supplier names.
    #[instrument(skip(self))]
    pub async fn export_rows(&self) -> Result<Vec<ProductExportRow>, ServiceError> {
        Product::find()
            .select_only()
            .column(product::Column::Sku)
            .column(product::Column::Name)
            .column_as(category::Column::Name, "category")
            .column_as(supplier::Column::Name, "supplier")
            .column(product::Column::Unit)
            .column(product::Column::Vat)
            .column(product::Column::Cost)
            .column(product::Column::Price)
            .column(product::Column::StockQty)
            .column(product::Column::MinStock)
            .column(product::Column::Notes)
            .join(JoinType::LeftJoin, product::Relation::Category.def())
            .join(JoinType::LeftJoin, product::Relation::Supplier.def())
            .order_by_asc(product::Column::Name)
            .into_model::<ProductExportRow>()
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Imports a products CSV (same columns as the export). Rows with an
    /// empty `sku` are skipped; category/supplier are found or created by
    /// name when the column is non-empty, and an empty column leaves any
    /// existing association untouched. The whole import is one transaction.
    /// Returns the number of rows processed.
    #[instrument(skip(self, data))]
    pub async fn import_csv(&self, data: &[u8]) -> Result<usize, ServiceError> {
        let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(data);

        let mut records: Vec<ProductCsvRecord> = Vec::new();
        for result in reader.deserialize() {
            let record: ProductCsvRecord = result.map_err(|e| {
                ServiceError::ValidationError(format!("Malformed CSV: {}", e))
            })?;
            records.push(record);
        }

        let count = self
            .db_pool
            .transaction::<_, usize, ServiceError>(move |txn| {
                Box::pin(async move {
                    let mut count = 0usize;
                    for record in records {
                        let sku = record.sku.trim().to_string();
                        if sku.is_empty() {
                            continue;
                        }
                        import_row(txn, sku, &record).await?;
                        count += 1;
                    }
                    Ok(count)
                })
            })
            .await
            .map_err(super::unwrap_txn_err)?;

        info!(rows = count, "Products CSV import completed");
        Ok(count)
    }
}

/// Applies one import row: find-or-create the product by SKU, resolve
/// category/supplier by name, overwrite the remaining fields.
async fn import_row(
    txn: &DatabaseTransaction,
    sku: String,
    record: &ProductCsvRecord,
) -> Result<(), ServiceError> {
    let existing = Product::find()
        .filter(product::Column::Sku.eq(sku.as_str()))
        .one(txn)
        .await
        .map_err(ServiceError::db_error)?;

    let mut model: product::ActiveModel = match existing {
        Some(found) => found.into(),
        None => product::ActiveModel {
            sku: Set(sku.clone()),
            ..Default::default()
        },
    };

    model.name = Set(record.name.trim().to_string());

    // A non-empty category/supplier column re-points the association,
    // creating the target row by name when it does not exist yet. An empty
    // column leaves whatever association is already there.
    if let Some(cat_name) = none_if_empty(&record.category) {
        let category_id = find_or_create_category(txn, &cat_name).await?;
        model.category_id = Set(Some(category_id));
    }
    if let Some(sup_name) = none_if_empty(&record.supplier) {
        let supplier_id = find_or_create_supplier(txn, &sup_name).await?;
        model.supplier_id = Set(Some(supplier_id));
    }

    let unit = record.unit.trim();
    model.unit = Set(if unit.is_empty() {
        DEFAULT_UNIT.to_string()
    } else {
        unit.to_string()
    });
    model.vat = Set(parse_i32_or(&record.vat, 0));
    model.cost = Set(parse_decimal_or(&record.cost, Decimal::ZERO));
    model.price = Set(parse_decimal_or(&record.price, Decimal::ZERO));
    model.stock_qty = Set(parse_i32_or(&record.stock_qty, 0));
    model.min_stock = Set(parse_i32_or(&record.min_stock, 0));
    model.notes = Set(none_if_empty(&record.notes));

    model.save(txn).await.map_err(|e| {
        warn!(sku = %sku, error = %e, "Failed to upsert product from CSV row");
        ServiceError::db_error(e)
    })?;
    Ok(())
}

async fn find_or_create_category(
    txn: &DatabaseTransaction,
    name: &str,
) -> Result<i32, ServiceError> {
    if let Some(found) = category::Entity::find()
        .filter(category::Column::Name.eq(name))
        .one(txn)
        .await
        .map_err(ServiceError::db_error)?
    {
        return Ok(found.id);
    }
    let created = category::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(txn)
    .await
    .map_err(ServiceError::db_error)?;
    Ok(created.id)
}

async fn find_or_create_supplier(
    txn: &DatabaseTransaction,
    name: &str,
) -> Result<i32, ServiceError> {
    if let Some(found) = supplier::Entity::find()
        .filter(supplier::Column::Name.eq(name))
        .one(txn)
        .await
        .map_err(ServiceError::db_error)?
    {
        return Ok(found.id);
    }
    let created = supplier::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(txn)
    .await
    .map_err(ServiceError::db_error)?;
    Ok(created.id)
}
