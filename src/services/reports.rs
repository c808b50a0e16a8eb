use std::sync::Arc;

use crate::{
    db::DbPool,
    entities::{category, lot, price_list, product, supplier},
    errors::ServiceError,
};
use chrono::{Duration, Local, NaiveDate};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, JoinType, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait,
};
use tracing::instrument;

/// Default horizon for the expiring-lots report.
pub const DEFAULT_EXPIRY_DAYS: i64 = 30;

/// One lot in the expiring-lots report, joined to its product and the
/// product's category/supplier names.
#[derive(Debug, Clone, FromQueryResult)]
pub struct ExpiringLotRow {
    pub expiry_date: NaiveDate,
    pub sku: String,
    pub product_name: String,
    pub lot_code: String,
    pub qty: i32,
    pub category: Option<String>,
    pub supplier: Option<String>,
}

/// Counters shown on the dashboard.
#[derive(Debug, Clone, Default)]
pub struct DashboardSummary {
    pub product_count: u64,
    pub price_list_count: u64,
    pub low_stock: u64,
    pub expiring: u64,
}

/// Read-side queries for the dashboard and the expiring-lots report
pub struct ReportService {
    db_pool: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    fn expiring_query(cutoff: NaiveDate) -> sea_orm::Select<lot::Entity> {
        lot::Entity::find()
            .join(JoinType::InnerJoin, lot::Relation::Product.def())
            .filter(lot::Column::ExpiryDate.is_not_null())
            .filter(lot::Column::ExpiryDate.lte(cutoff))
    }

    /// Lots expiring within `days` from today, soonest first. Lots without
    /// an expiry date are excluded. Optional exact-name filters on the
    /// product's category and supplier.
    #[instrument(skip(self))]
    pub async fn expiring_lots(
        &self,
        days: i64,
        category: Option<&str>,
        supplier: Option<&str>,
    ) -> Result<Vec<ExpiringLotRow>, ServiceError> {
        let cutoff = Local::now().date_naive() + Duration::days(days);

        let mut query = Self::expiring_query(cutoff)
            .select_only()
            .column(lot::Column::ExpiryDate)
            .column(product::Column::Sku)
            .column_as(product::Column::Name, "product_name")
            .column(lot::Column::LotCode)
            .column(lot::Column::Qty)
            .column_as(category::Column::Name, "category")
            .column_as(supplier::Column::Name, "supplier")
            .join(JoinType::LeftJoin, product::Relation::Category.def())
            .join(JoinType::LeftJoin, product::Relation::Supplier.def());

        if let Some(cat) = category.map(str::trim).filter(|c| !c.is_empty()) {
            query = query.filter(category::Column::Name.eq(cat));
        }
        if let Some(sup) = supplier.map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(supplier::Column::Name.eq(sup));
        }

        query
            .order_by_asc(lot::Column::ExpiryDate)
            .order_by_asc(lot::Column::Id)
            .into_model::<ExpiringLotRow>()
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Dashboard counters: totals plus products at or below their minimum
    /// stock (only those with a minimum set) and lots expiring within the
    /// default horizon.
    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardSummary, ServiceError> {
        let product_count = product::Entity::find()
            .count(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        let price_list_count = price_list::Entity::find()
            .count(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        let low_stock = product::Entity::find()
            .filter(product::Column::MinStock.gt(0))
            .filter(
                Expr::col((product::Entity, product::Column::StockQty))
                    .lte(Expr::col((product::Entity, product::Column::MinStock))),
            )
            .count(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        let cutoff = Local::now().date_naive() + Duration::days(DEFAULT_EXPIRY_DAYS);
        let expiring = Self::expiring_query(cutoff)
            .count(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(DashboardSummary {
            product_count,
            price_list_count,
            low_stock,
            expiring,
        })
    }
}
