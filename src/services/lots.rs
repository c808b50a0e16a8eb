use std::sync::Arc;

use crate::{
    db::DbPool,
    entities::{
        lot::{self, Entity as Lot},
        product::{self, Entity as Product},
    },
    errors::ServiceError,
};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{info, instrument};

/// Form-level field set for registering a stock lot.
#[derive(Debug, Clone, Default)]
pub struct LotData {
    pub lot_code: String,
    pub expiry_date: Option<NaiveDate>,
    pub qty: i32,
    pub notes: Option<String>,
}

/// Service for managing product lots and the denormalized stock counter
pub struct LotService {
    db_pool: Arc<DbPool>,
}

impl LotService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Lots of one product, soonest expiry first; lots without an expiry
    /// date sort last.
    pub async fn lots_for_product(&self, product_id: i32) -> Result<Vec<lot::Model>, ServiceError> {
        Lot::find()
            .filter(lot::Column::ProductId.eq(product_id))
            .order_by_asc(lot::Column::ExpiryDate)
            .order_by_asc(lot::Column::Id)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Registers a lot and adds its quantity to the product's stock counter
    /// in the same transaction.
    #[instrument(skip(self, data))]
    pub async fn add_lot(
        &self,
        product_id: i32,
        data: LotData,
    ) -> Result<lot::Model, ServiceError> {
        let lot_code = data.lot_code.trim().to_string();
        if lot_code.is_empty() {
            return Err(ServiceError::ValidationError(
                "Lot code is required".to_string(),
            ));
        }

        let created = self
            .db_pool
            .transaction::<_, lot::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let product = Product::find_by_id(product_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Product with ID {} not found",
                                product_id
                            ))
                        })?;

                    let lot = lot::ActiveModel {
                        product_id: Set(product_id),
                        lot_code: Set(lot_code),
                        expiry_date: Set(data.expiry_date),
                        qty: Set(data.qty),
                        notes: Set(data.notes),
                        ..Default::default()
                    };
                    let created = lot.insert(txn).await.map_err(ServiceError::db_error)?;

                    let new_stock = product.stock_qty + created.qty;
                    let mut product: product::ActiveModel = product.into();
                    product.stock_qty = Set(new_stock);
                    product.update(txn).await.map_err(ServiceError::db_error)?;

                    Ok(created)
                })
            })
            .await
            .map_err(super::unwrap_txn_err)?;

        info!(
            lot_id = created.id,
            product_id, qty = created.qty,
            "Lot added, stock increased"
        );
        Ok(created)
    }

    /// Deletes a lot and subtracts its quantity from the product's stock
    /// counter, clamping at zero. The lot must belong to the given product.
    #[instrument(skip(self))]
    pub async fn remove_lot(&self, product_id: i32, lot_id: i32) -> Result<(), ServiceError> {
        self.db_pool
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    let lot = Lot::find_by_id(lot_id)
                        .filter(lot::Column::ProductId.eq(product_id))
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Lot with ID {} not found for product {}",
                                lot_id, product_id
                            ))
                        })?;

                    let product = Product::find_by_id(product_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Product with ID {} not found",
                                product_id
                            ))
                        })?;

                    let qty = lot.qty;
                    lot.delete(txn).await.map_err(ServiceError::db_error)?;

                    let new_stock = (product.stock_qty - qty).max(0);
                    let mut product: product::ActiveModel = product.into();
                    product.stock_qty = Set(new_stock);
                    product.update(txn).await.map_err(ServiceError::db_error)?;

                    Ok(())
                })
            })
            .await
            .map_err(super::unwrap_txn_err)?;

        info!(lot_id, product_id, "Lot removed, stock decreased");
        Ok(())
    }
}
