use std::sync::Arc;

use crate::{
    db::DbPool,
    entities::{
        product,
        supplier::{self, Entity as Supplier},
    },
    errors::ServiceError,
};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::{info, instrument};

/// Form-level field set for creating or updating a supplier.
#[derive(Debug, Clone, Default)]
pub struct SupplierData {
    pub name: String,
    pub vat_number: Option<String>,
    pub tax_code: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// Service for managing suppliers
pub struct SupplierService {
    db_pool: Arc<DbPool>,
}

impl SupplierService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn name_taken(&self, name: &str, exclude_id: Option<i32>) -> Result<bool, ServiceError> {
        let mut query = Supplier::find().filter(supplier::Column::Name.eq(name));
        if let Some(id) = exclude_id {
            query = query.filter(supplier::Column::Id.ne(id));
        }
        Ok(query
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .is_some())
    }

    #[instrument(skip(self, data))]
    pub async fn create(&self, data: SupplierData) -> Result<supplier::Model, ServiceError> {
        let name = data.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Supplier name is required".to_string(),
            ));
        }
        if self.name_taken(&name, None).await? {
            return Err(ServiceError::ValidationError(format!(
                "Supplier '{}' already exists",
                name
            )));
        }

        let supplier = supplier::ActiveModel {
            name: Set(name.clone()),
            vat_number: Set(data.vat_number),
            tax_code: Set(data.tax_code),
            email: Set(data.email),
            phone: Set(data.phone),
            address: Set(data.address),
            notes: Set(data.notes),
            ..Default::default()
        };

        let created = supplier
            .insert(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        info!(supplier_id = created.id, name = %name, "Supplier created");
        Ok(created)
    }

    #[instrument(skip(self, data))]
    pub async fn update(&self, id: i32, data: SupplierData) -> Result<supplier::Model, ServiceError> {
        let existing = self.get(id).await?;

        let name = data.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Supplier name is required".to_string(),
            ));
        }
        if self.name_taken(&name, Some(id)).await? {
            return Err(ServiceError::ValidationError(format!(
                "Supplier '{}' already exists",
                name
            )));
        }

        let mut supplier: supplier::ActiveModel = existing.into();
        supplier.name = Set(name);
        supplier.vat_number = Set(data.vat_number);
        supplier.tax_code = Set(data.tax_code);
        supplier.email = Set(data.email);
        supplier.phone = Set(data.phone);
        supplier.address = Set(data.address);
        supplier.notes = Set(data.notes);

        let updated = supplier
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        info!(supplier_id = id, "Supplier updated");
        Ok(updated)
    }

    /// Deletes a supplier. Blocked with Conflict while any product still
    /// references it; the check is explicit so behavior does not depend on
    /// database-level constraints.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let supplier = self.get(id).await?;

        let linked = product::Entity::find()
            .filter(product::Column::SupplierId.eq(id))
            .count(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        if linked > 0 {
            return Err(ServiceError::Conflict(format!(
                "Supplier '{}' has {} linked products",
                supplier.name, linked
            )));
        }

        supplier
            .delete(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        info!(supplier_id = id, "Supplier deleted");
        Ok(())
    }

    pub async fn get(&self, id: i32) -> Result<supplier::Model, ServiceError> {
        Supplier::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Supplier with ID {} not found", id)))
    }

    /// Lists suppliers ordered by name, optionally filtered by a
    /// case-insensitive substring on name, email or phone.
    #[instrument(skip(self))]
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<supplier::Model>, ServiceError> {
        let mut query = Supplier::find();

        if let Some(q) = search.map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", q.to_lowercase());
            query = query.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            supplier::Entity,
                            supplier::Column::Name,
                        ))))
                        .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            supplier::Entity,
                            supplier::Column::Email,
                        ))))
                        .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            supplier::Entity,
                            supplier::Column::Phone,
                        ))))
                        .like(pattern),
                    ),
            );
        }

        query
            .order_by_asc(supplier::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Supplier names ordered ascending, for report filter dropdowns.
    pub async fn names(&self) -> Result<Vec<String>, ServiceError> {
        Ok(self
            .list(None)
            .await?
            .into_iter()
            .map(|s| s.name)
            .collect())
    }
}
