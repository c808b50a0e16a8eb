use std::sync::Arc;

use crate::{
    db::DbPool,
    entities::{
        category::{self, Entity as Category},
        product,
    },
    errors::ServiceError,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::{info, instrument};

#[derive(Debug, Clone, Default)]
pub struct CategoryData {
    pub name: String,
    pub description: Option<String>,
}

/// Service for managing product categories
pub struct CategoryService {
    db_pool: Arc<DbPool>,
}

impl CategoryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn name_taken(&self, name: &str, exclude_id: Option<i32>) -> Result<bool, ServiceError> {
        let mut query = Category::find().filter(category::Column::Name.eq(name));
        if let Some(id) = exclude_id {
            query = query.filter(category::Column::Id.ne(id));
        }
        Ok(query
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .is_some())
    }

    #[instrument(skip(self, data))]
    pub async fn create(&self, data: CategoryData) -> Result<category::Model, ServiceError> {
        let name = data.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Category name is required".to_string(),
            ));
        }
        if self.name_taken(&name, None).await? {
            return Err(ServiceError::ValidationError(format!(
                "Category '{}' already exists",
                name
            )));
        }

        let category = category::ActiveModel {
            name: Set(name.clone()),
            description: Set(data.description),
            ..Default::default()
        };

        let created = category
            .insert(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        info!(category_id = created.id, name = %name, "Category created");
        Ok(created)
    }

    #[instrument(skip(self, data))]
    pub async fn update(&self, id: i32, data: CategoryData) -> Result<category::Model, ServiceError> {
        let existing = self.get(id).await?;

        let name = data.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Category name is required".to_string(),
            ));
        }
        if self.name_taken(&name, Some(id)).await? {
            return Err(ServiceError::ValidationError(format!(
                "Category '{}' already exists",
                name
            )));
        }

        let mut category: category::ActiveModel = existing.into();
        category.name = Set(name);
        category.description = Set(data.description);

        let updated = category
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        info!(category_id = id, "Category updated");
        Ok(updated)
    }

    /// Deletes a category, blocked with Conflict while products reference it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let category = self.get(id).await?;

        let linked = product::Entity::find()
            .filter(product::Column::CategoryId.eq(id))
            .count(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        if linked > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category '{}' has {} linked products",
                category.name, linked
            )));
        }

        category
            .delete(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        info!(category_id = id, "Category deleted");
        Ok(())
    }

    pub async fn get(&self, id: i32) -> Result<category::Model, ServiceError> {
        Category::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Category with ID {} not found", id)))
    }

    pub async fn list(&self) -> Result<Vec<category::Model>, ServiceError> {
        Category::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Category names ordered ascending, for filter dropdowns.
    pub async fn names(&self) -> Result<Vec<String>, ServiceError> {
        Ok(self.list().await?.into_iter().map(|c| c.name).collect())
    }
}
