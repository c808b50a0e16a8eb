use crate::{
    auth::AuthenticatedUser,
    common::none_if_empty,
    entities::supplier,
    errors::{ApiError, ServiceError},
    handlers::{redirect_with_msg, render},
    services::suppliers::SupplierData,
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
#[template(path = "suppliers.html")]
struct SuppliersTemplate {
    suppliers: Vec<supplier::Model>,
    q: String,
    msg: Option<String>,
}

#[derive(Template)]
#[template(path = "supplier_form.html")]
struct SupplierFormTemplate {
    supplier_id: Option<i32>,
    data: SupplierData,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SupplierListQuery {
    pub q: Option<String>,
    pub msg: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SupplierForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub vat_number: String,
    #[serde(default)]
    pub tax_code: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub notes: String,
}

impl From<SupplierForm> for SupplierData {
    fn from(form: SupplierForm) -> Self {
        SupplierData {
            name: form.name,
            vat_number: none_if_empty(&form.vat_number),
            tax_code: none_if_empty(&form.tax_code),
            email: none_if_empty(&form.email),
            phone: none_if_empty(&form.phone),
            address: none_if_empty(&form.address),
            notes: none_if_empty(&form.notes),
        }
    }
}

pub async fn list(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(query): Query<SupplierListQuery>,
) -> Result<Html<String>, ApiError> {
    let suppliers = state
        .services
        .suppliers
        .list(query.q.as_deref())
        .await?;
    render(&SuppliersTemplate {
        suppliers,
        q: query.q.unwrap_or_default(),
        msg: query.msg,
    })
}

pub async fn new_form(_user: AuthenticatedUser) -> Result<Html<String>, ApiError> {
    render(&SupplierFormTemplate {
        supplier_id: None,
        data: SupplierData::default(),
        error: None,
    })
}

pub async fn create(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Form(form): Form<SupplierForm>,
) -> Result<Response, ApiError> {
    let data: SupplierData = form.into();
    match state.services.suppliers.create(data.clone()).await {
        Ok(_) => Ok(redirect_with_msg("/suppliers", "Fornitore salvato").into_response()),
        Err(ServiceError::ValidationError(message)) => {
            let page = render(&SupplierFormTemplate {
                supplier_id: None,
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
    let supplier = state.services.suppliers.get(id).await?;
    render(&SupplierFormTemplate {
        supplier_id: Some(id),
        data: SupplierData {
            name: supplier.name,
            vat_number: supplier.vat_number,
            tax_code: supplier.tax_code,
            email: supplier.email,
            phone: supplier.phone,
            address: supplier.address,
            notes: supplier.notes,
        },
        error: None,
    })
}

pub async fn update(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<SupplierForm>,
) -> Result<Response, ApiError> {
    let data: SupplierData = form.into();
    match state.services.suppliers.update(id, data.clone()).await {
        Ok(_) => Ok(redirect_with_msg("/suppliers", "Fornitore aggiornato").into_response()),
        Err(ServiceError::ValidationError(message)) => {
            let page = render(&SupplierFormTemplate {
                supplier_id: Some(id),
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
    match state.services.suppliers.delete(id).await {
        Ok(()) => Ok(redirect_with_msg("/suppliers", "Fornitore eliminato").into_response()),
        Err(ServiceError::Conflict(_)) => Ok(redirect_with_msg(
            "/suppliers",
            "Impossibile eliminare: ci sono prodotti collegati.",
        )
        .into_response()),
        Err(err) => Err(err.into()),
    }
}
