use crate::{
    auth::AuthenticatedUser,
    common::none_if_empty,
    entities::category,
    errors::{ApiError, ServiceError},
    handlers::{redirect_with_msg, render},
    services::categories::CategoryData,
    AppState,
};
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
    Form,
};
use serde::Deserialize;

#[derive(Template)]
#[template(path = "categories.html")]
struct CategoriesTemplate {
    categories: Vec<category::Model>,
    msg: Option<String>,
}

#[derive(Template)]
#[template(path = "category_form.html")]
struct CategoryFormTemplate {
    category_id: Option<i32>,
    data: CategoryData,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryListQuery {
    pub msg: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl From<CategoryForm> for CategoryData {
    fn from(form: CategoryForm) -> Self {
        CategoryData {
            name: form.name,
            description: none_if_empty(&form.description),
        }
    }
}

pub async fn list(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(query): Query<CategoryListQuery>,
) -> Result<Html<String>, ApiError> {
    let categories = state.services.categories.list().await?;
    render(&CategoriesTemplate {
        categories,
        msg: query.msg,
    })
}

pub async fn new_form(_user: AuthenticatedUser) -> Result<Html<String>, ApiError> {
    render(&CategoryFormTemplate {
        category_id: None,
        data: CategoryData::default(),
        error: None,
    })
}

pub async fn create(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Form(form): Form<CategoryForm>,
) -> Result<Response, ApiError> {
    let data: CategoryData = form.into();
    match state.services.categories.create(data.clone()).await {
        Ok(_) => Ok(redirect_with_msg("/categories", "Categoria salvata").into_response()),
        Err(ServiceError::ValidationError(message)) => {
            let page = render(&CategoryFormTemplate {
                category_id: None,
                data,
                error: Some(message),
            })?;
            Ok(page.into_response())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn edit_form(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Html<String>, ApiError> {
    let category = state.services.categories.get(id).await?;
    render(&CategoryFormTemplate {
        category_id: Some(id),
        data: CategoryData {
            name: category.name,
            description: category.description,
        },
        error: None,
    })
}

pub async fn update(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<CategoryForm>,
) -> Result<Response, ApiError> {
    let data: CategoryData = form.into();
    match state.services.categories.update(id, data.clone()).await {
        Ok(_) => Ok(redirect_with_msg("/categories", "Categoria aggiornata").into_response()),
        Err(ServiceError::ValidationError(message)) => {
            let page = render(&CategoryFormTemplate {
                category_id: Some(id),
                data,
                error: Some(message),
            })?;
            Ok(page.into_response())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn delete(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    match state.services.categories.delete(id).await {
        Ok(()) => Ok(redirect_with_msg("/categories", "Categoria eliminata").into_response()),
        Err(ServiceError::Conflict(_)) => Ok(redirect_with_msg(
            "/categories",
            "Impossibile eliminare: ci sono prodotti collegati.",
        )
        .into_response()),
        Err(err) => Err(err.into()),
    }
}
