use std::sync::Arc;

use crate::{
    db::DbPool,
    entities::{
        price_list::{self, Channel, Entity as PriceList, DEFAULT_CURRENCY},
        price_list_item::{self, Entity as PriceListItem},
        product,
    },
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use tracing::{info, instrument};

/// Name of the price list created at startup when none exist.
pub const DEFAULT_LIST_NAME: &str = "Listino Base";

/// Form-level field set for creating or updating a price list.
#[derive(Debug, Clone, Default)]
pub struct PriceListData {
    pub name: String,
    pub channel: String,
    pub currency: String,
    pub notes: Option<String>,
}

/// One row of a price-list CSV export, in item insertion order.
#[derive(Debug, Clone, FromQueryResult)]
pub struct PriceListExportRow {
    pub sku: String,
    pub product_name: String,
    pub price: Decimal,
}

/// Service for managing price lists and their per-product prices
pub struct PriceListService {
    db_pool: Arc<DbPool>,
}

impl PriceListService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn name_taken(&self, name: &str, exclude_id: Option<i32>) -> Result<bool, ServiceError> {
        let mut query = PriceList::find().filter(price_list::Column::Name.eq(name));
        if let Some(id) = exclude_id {
            query = query.filter(price_list::Column::Id.ne(id));
        }
        Ok(query
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .is_some())
    }

    fn normalize(data: &PriceListData) -> Result<(String, String, String), ServiceError> {
        let name = data.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Price list name is required".to_string(),
            ));
        }
        let channel = Channel::parse_or_default(data.channel.trim()).as_str().to_string();
        let currency = data.currency.trim();
        let currency = if currency.is_empty() {
            DEFAULT_CURRENCY.to_string()
        } else {
            currency.to_uppercase()
        };
        Ok((name, channel, currency))
    }

    #[instrument(skip(self, data))]
    pub async fn create(&self, data: PriceListData) -> Result<price_list::Model, ServiceError> {
        let (name, channel, currency) = Self::normalize(&data)?;
        if self.name_taken(&name, None).await? {
            return Err(ServiceError::ValidationError(format!(
                "Price list '{}' already exists",
                name
            )));
        }

        let list = price_list::ActiveModel {
            name: Set(name.clone()),
            channel: Set(channel),
            currency: Set(currency),
            notes: Set(data.notes),
            ..Default::default()
        };

        let created = list
            .insert(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        info!(price_list_id = created.id, name = %name, "Price list created");
        Ok(created)
    }

    #[instrument(skip(self, data))]
    pub async fn update(
        &self,
        id: i32,
        data: PriceListData,
    ) -> Result<price_list::Model, ServiceError> {
        let existing = self.get(id).await?;
        let (name, channel, currency) = Self::normalize(&data)?;
        if self.name_taken(&name, Some(id)).await? {
            return Err(ServiceError::ValidationError(format!(
                "Price list '{}' already exists",
                name
            )));
        }

        let mut list: price_list::ActiveModel = existing.into();
        list.name = Set(name);
        list.channel = Set(channel);
        list.currency = Set(currency);
        list.notes = Set(data.notes);

        let updated = list
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        info!(price_list_id = id, "Price list updated");
        Ok(updated)
    }

    /// Deletes a price list and all of its items in one transaction.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        self.db_pool
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    let list = PriceList::find_by_id(id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Price list with ID {} not found", id))
                        })?;

                    PriceListItem::delete_many()
                        .filter(price_list_item::Column::PriceListId.eq(id))
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    list.delete(txn).await.map_err(ServiceError::db_error)?;
                    Ok(())
                })
            })
            .await
            .map_err(super::unwrap_txn_err)?;

        info!(price_list_id = id, "Price list deleted with items");
        Ok(())
    }

    pub async fn get(&self, id: i32) -> Result<price_list::Model, ServiceError> {
        PriceList::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Price list with ID {} not found", id)))
    }

    /// Lists price lists ordered by name, optionally filtered by channel.
    #[instrument(skip(self))]
    pub async fn list(&self, channel: Option<&str>) -> Result<Vec<price_list::Model>, ServiceError> {
        let mut query = PriceList::find();
        if let Some(ch) = channel.map(str::trim).filter(|c| !c.is_empty()) {
            query = query.filter(price_list::Column::Channel.eq(ch));
        }
        query
            .order_by_asc(price_list::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Creates the default price list at startup when no list exists yet.
    #[instrument(skip(self))]
    pub async fn ensure_default(&self) -> Result<(), ServiceError> {
        let existing = PriceList::find()
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        if existing.is_some() {
            return Ok(());
        }

        let list = price_list::ActiveModel {
            name: Set(DEFAULT_LIST_NAME.to_string()),
            channel: Set(Channel::Generale.as_str().to_string()),
            currency: Set(DEFAULT_CURRENCY.to_string()),
            notes: Set(Some("Listino di default".to_string())),
            ..Default::default()
        };
        let created = list
            .insert(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        info!(price_list_id = created.id, "Default price list created");
        Ok(())
    }

    pub async fn items_for_list(
        &self,
        list_id: i32,
    ) -> Result<Vec<price_list_item::Model>, ServiceError> {
        PriceListItem::find()
            .filter(price_list_item::Column::PriceListId.eq(list_id))
            .order_by_asc(price_list_item::Column::Id)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Sets, updates or clears one product's price in a list. `Some(price)`
    /// updates the existing item or inserts a new one; `None` deletes the
    /// item when present.
    #[instrument(skip(self))]
    pub async fn upsert_item(
        &self,
        list_id: i32,
        product_id: i32,
        price: Option<Decimal>,
    ) -> Result<(), ServiceError> {
        // Validate both sides of the association up front.
        self.get(list_id).await?;
        product::Entity::find_by_id(product_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product with ID {} not found", product_id))
            })?;

        let existing = PriceListItem::find()
            .filter(price_list_item::Column::PriceListId.eq(list_id))
            .filter(price_list_item::Column::ProductId.eq(product_id))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        match (existing, price) {
            (Some(item), Some(price)) => {
                let mut item: price_list_item::ActiveModel = item.into();
                item.price = Set(price);
                item.update(&*self.db_pool)
                    .await
                    .map_err(ServiceError::db_error)?;
                info!(list_id, product_id, "Price list item updated");
            }
            (None, Some(price)) => {
                let item = price_list_item::ActiveModel {
                    price_list_id: Set(list_id),
                    product_id: Set(product_id),
                    price: Set(price),
                    ..Default::default()
                };
                item.insert(&*self.db_pool)
                    .await
                    .map_err(ServiceError::db_error)?;
                info!(list_id, product_id, "Price list item created");
            }
            (Some(item), None) => {
                item.delete(&*self.db_pool)
                    .await
                    .map_err(ServiceError::db_error)?;
                info!(list_id, product_id, "Price list item cleared");
            }
            (None, None) => {}
        }
        Ok(())
    }

    /// The list header plus its rows for CSV export, in item insertion order.
    #[instrument(skip(self))]
    pub async fn export_rows(
        &self,
        list_id: i32,
    ) -> Result<(price_list::Model, Vec<PriceListExportRow>), ServiceError> {
        let list = self.get(list_id).await?;

        let rows = PriceListItem::find()
            .select_only()
            .column(product::Column::Sku)
            .column_as(product::Column::Name, "product_name")
            .column(price_list_item::Column::Price)
            .join(JoinType::InnerJoin, price_list_item::Relation::Product.def())
            .filter(price_list_item::Column::PriceListId.eq(list_id))
            .order_by_asc(price_list_item::Column::Id)
            .into_model::<PriceListExportRow>()
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((list, rows))
    }
}
