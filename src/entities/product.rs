use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fallback unit of measure when a form or CSV row leaves it blank.
pub const DEFAULT_UNIT: &str = "pezzi";

/// Default VAT percentage for new products.
pub const DEFAULT_VAT: i32 = 10;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub sku: String,
    pub name: String,
    pub category_id: Option<i32>,
    pub supplier_id: Option<i32>,
    pub unit: String,
    /// IVA %
    pub vat: i32,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub cost: rust_decimal::Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub price: rust_decimal::Decimal,
    /// Denormalized running total of this product's lot quantities,
    /// maintained by the lot add/remove transactions.
    pub stock_qty: i32,
    pub min_stock: i32,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    #[sea_orm(has_many = "super::lot::Entity")]
    Lots,
    #[sea_orm(has_many = "super::price_list_item::Entity")]
    PriceListItems,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lots.def()
    }
}

impl Related<super::price_list_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PriceListItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
