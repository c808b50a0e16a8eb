use crate::{
    auth::AuthenticatedUser,
    common::{none_if_empty, parse_decimal_or, parse_i32_or},
    entities::{category, product, supplier},
    errors::{ApiError, ServiceError},
    handlers::{csv_attachment, redirect_with_msg, render},
    reports::csv as csv_reports,
    services::products::ProductData,
    AppState,
};
use askama::Template;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::{Html, IntoResponse, Response},
    Form,
};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Template)]
#[template(path = "products.html")]
struct ProductsTemplate {
    products: Vec<product::Model>,
    categories: Vec<String>,
    q: String,
    category: String,
    msg: Option<String>,
}

#[derive(Template)]
#[template(path = "product_form.html")]
struct ProductFormTemplate {
    product_id: Option<i32>,
    data: ProductData,
    categories: Vec<category::Model>,
    suppliers: Vec<supplier::Model>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub msg: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub supplier_id: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub vat: String,
    #[serde(default)]
    pub cost: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub stock_qty: String,
    #[serde(default)]
    pub min_stock: String,
    #[serde(default)]
    pub notes: String,
}

impl From<ProductForm> for ProductData {
    fn from(form: ProductForm) -> Self {
        ProductData {
            sku: form.sku,
            name: form.name,
            category_id: form.category_id.trim().parse::<i32>().ok().filter(|id| *id > 0),
            supplier_id: form.supplier_id.trim().parse::<i32>().ok().filter(|id| *id > 0),
            unit: form.unit,
            vat: parse_i32_or(&form.vat, product::DEFAULT_VAT),
            cost: parse_decimal_or(&form.cost, Decimal::ZERO),
            price: parse_decimal_or(&form.price, Decimal::ZERO),
            stock_qty: parse_i32_or(&form.stock_qty, 0),
            min_stock: parse_i32_or(&form.min_stock, 0),
            notes: none_if_empty(&form.notes),
        }
    }
}

pub async fn list(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Html<String>, ApiError> {
    let products = state
        .services
        .products
        .search(query.q.as_deref(), query.category.as_deref())
        .await?;
    let categories = state.services.categories.names().await?;
    render(&ProductsTemplate {
        products,
        categories,
        q: query.q.unwrap_or_default(),
        category: query.category.unwrap_or_default(),
        msg: query.msg,
    })
}

async fn form_dropdowns(
    state: &AppState,
) -> Result<(Vec<category::Model>, Vec<supplier::Model>), ApiError> {
    let categories = state.services.categories.list().await?;
    let suppliers = state.services.suppliers.list(None).await?;
    Ok((categories, suppliers))
}

pub async fn new_form(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Html<String>, ApiError> {
    let (categories, suppliers) = form_dropdowns(&state).await?;
    render(&ProductFormTemplate {
        product_id: None,
        data: ProductData {
            unit: product::DEFAULT_UNIT.to_string(),
            vat: product::DEFAULT_VAT,
            ..ProductData::default()
        },
        categories,
        suppliers,
        error: None,
    })
}

pub async fn create(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Form(form): Form<ProductForm>,
) -> Result<Response, ApiError> {
    let data: ProductData = form.into();
    match state.services.products.create(data.clone()).await {
        Ok(_) => Ok(redirect_with_msg("/products", "Prodotto salvato").into_response()),
        Err(ServiceError::ValidationError(message)) => {
            let (categories, suppliers) = form_dropdowns(&state).await?;
            let page = render(&ProductFormTemplate {
                product_id: None,
                data,
                categories,
                suppliers,
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
    let product = state.services.products.get(id).await?;
    let (categories, suppliers) = form_dropdowns(&state).await?;
    render(&ProductFormTemplate {
        product_id: Some(id),
        data: ProductData {
            sku: product.sku,
            name: product.name,
            category_id: product.category_id,
            supplier_id: product.supplier_id,
            unit: product.unit,
            vat: product.vat,
            cost: product.cost,
            price: product.price,
            stock_qty: product.stock_qty,
            min_stock: product.min_stock,
            notes: product.notes,
        },
        categories,
        suppliers,
        error: None,
    })
}

pub async fn update(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<ProductForm>,
) -> Result<Response, ApiError> {
    let data: ProductData = form.into();
    match state.services.products.update(id, data.clone()).await {
        Ok(_) => Ok(redirect_with_msg("/products", "Prodotto aggiornato").into_response()),
        Err(ServiceError::ValidationError(message)) => {
            let (categories, suppliers) = form_dropdowns(&state).await?;
            let page = render(&ProductFormTemplate {
                product_id: Some(id),
                data,
                categories,
                suppliers,
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
    state.services.products.delete(id).await?;
    Ok(redirect_with_msg("/products", "Prodotto eliminato").into_response())
}

pub async fn export_csv(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let rows = state.services.products.export_rows().await?;
    let bytes = csv_reports::products_csv(&rows)?;
    Ok(csv_attachment("products_export.csv", bytes))
}

pub async fn import_csv(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut payload: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed upload: {}", e)))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Malformed upload: {}", e)))?;
            payload = Some(bytes.to_vec());
            break;
        }
    }

    let payload = match payload.filter(|p| !p.is_empty()) {
        Some(payload) => payload,
        None => {
            return Ok(redirect_with_msg("/products", "Nessun file selezionato").into_response())
        }
    };

    match state.services.products.import_csv(&payload).await {
        Ok(count) => Ok(redirect_with_msg(
            "/products",
            &format!("Import completato: {} righe", count),
        )
        .into_response()),
        Err(ServiceError::ValidationError(_)) => Ok(redirect_with_msg(
            "/products",
            "File CSV non valido",
        )
        .into_response()),
        Err(err) => Err(err.into()),
    }
}
