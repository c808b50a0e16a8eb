use std::collections::HashMap;

use crate::{
    auth::AuthenticatedUser,
    common::none_if_empty,
    entities::price_list::{self, Channel},
    errors::{ApiError, ServiceError},
    handlers::{csv_attachment, pdf_attachment, redirect_with_msg, render},
    reports::{csv as csv_reports, pdf as pdf_reports},
    services::price_lists::PriceListData,
    AppState,
};
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
    Form,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

#[derive(Template)]
#[template(path = "pricelists.html")]
struct PriceListsTemplate {
    lists: Vec<price_list::Model>,
    channels: Vec<&'static str>,
    channel: String,
    msg: Option<String>,
}

#[derive(Template)]
#[template(path = "pricelist_form.html")]
struct PriceListFormTemplate {
    list_id: Option<i32>,
    data: PriceListData,
    channels: Vec<&'static str>,
    error: Option<String>,
}

/// One product row on the detail page, with its price in this list if set.
struct DetailRow {
    product_id: i32,
    sku: String,
    name: String,
    price: Option<Decimal>,
}

#[derive(Template)]
#[template(path = "pricelist_detail.html")]
struct PriceListDetailTemplate {
    list: price_list::Model,
    rows: Vec<DetailRow>,
    msg: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PriceListListQuery {
    pub channel: Option<String>,
    pub msg: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    pub msg: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PriceListForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct ItemForm {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub price: String,
}

impl From<PriceListForm> for PriceListData {
    fn from(form: PriceListForm) -> Self {
        PriceListData {
            name: form.name,
            channel: form.channel,
            currency: form.currency,
            notes: none_if_empty(&form.notes),
        }
    }
}

pub async fn list(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(query): Query<PriceListListQuery>,
) -> Result<Html<String>, ApiError> {
    let lists = state
        .services
        .price_lists
        .list(query.channel.as_deref())
        .await?;
    render(&PriceListsTemplate {
        lists,
        channels: Channel::labels(),
        channel: query.channel.unwrap_or_default(),
        msg: query.msg,
    })
}

pub async fn new_form(_user: AuthenticatedUser) -> Result<Html<String>, ApiError> {
    render(&PriceListFormTemplate {
        list_id: None,
        data: PriceListData::default(),
        channels: Channel::labels(),
        error: None,
    })
}

pub async fn create(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Form(form): Form<PriceListForm>,
) -> Result<Response, ApiError> {
    let data: PriceListData = form.into();
    match state.services.price_lists.create(data.clone()).await {
        Ok(created) => Ok(redirect_with_msg(
            &format!("/pricelists/{}", created.id),
            "Listino creato",
        )
        .into_response()),
        Err(ServiceError::ValidationError(message)) => {
            let page = render(&PriceListFormTemplate {
                list_id: None,
                data,
                channels: Channel::labels(),
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
    let list = state.services.price_lists.get(id).await?;
    render(&PriceListFormTemplate {
        list_id: Some(id),
        data: PriceListData {
            name: list.name,
            channel: list.channel,
            currency: list.currency,
            notes: list.notes,
        },
        channels: Channel::labels(),
        error: None,
    })
}

pub async fn update(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<PriceListForm>,
) -> Result<Response, ApiError> {
    let data: PriceListData = form.into();
    match state.services.price_lists.update(id, data.clone()).await {
        Ok(_) => Ok(redirect_with_msg("/pricelists", "Listino aggiornato").into_response()),
        Err(ServiceError::ValidationError(message)) => {
            let page = render(&PriceListFormTemplate {
                list_id: Some(id),
                data,
                channels: Channel::labels(),
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
    state.services.price_lists.delete(id).await?;
    Ok(redirect_with_msg("/pricelists", "Listino eliminato").into_response())
}

pub async fn detail(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<DetailQuery>,
) -> Result<Html<String>, ApiError> {
    let list = state.services.price_lists.get(id).await?;
    let products = state.services.products.list_all().await?;
    let items = state.services.price_lists.items_for_list(id).await?;

    let prices: HashMap<i32, Decimal> = items
        .into_iter()
        .map(|item| (item.product_id, item.price))
        .collect();

    let rows = products
        .into_iter()
        .map(|p| DetailRow {
            product_id: p.id,
            sku: p.sku,
            name: p.name,
            price: prices.get(&p.id).copied(),
        })
        .collect();

    render(&PriceListDetailTemplate {
        list,
        rows,
        msg: query.msg,
    })
}

pub async fn upsert_item(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<ItemForm>,
) -> Result<Response, ApiError> {
    let back = format!("/pricelists/{}", id);

    let product_id = form
        .product_id
        .trim()
        .parse::<i32>()
        .map_err(|_| ApiError::BadRequest("Invalid product id".to_string()))?;

    // An empty price field clears the item; a malformed one is rejected.
    let price = form.price.trim();
    let price = if price.is_empty() {
        None
    } else {
        let normalized = price.replace(',', ".");
        Some(Decimal::from_str(&normalized).map_err(|_| {
            ApiError::BadRequest("Invalid price".to_string())
        })?)
    };

    let cleared = price.is_none();
    state
        .services
        .price_lists
        .upsert_item(id, product_id, price)
        .await?;

    let msg = if cleared {
        "Prezzo rimosso"
    } else {
        "Prezzo aggiornato"
    };
    Ok(redirect_with_msg(&back, msg).into_response())
}

pub async fn export_csv(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    let (list, rows) = state.services.price_lists.export_rows(id).await?;
    let bytes = csv_reports::price_list_csv(&list, &rows)?;
    Ok(csv_attachment(
        &format!("{}_export.csv", list.name),
        bytes,
    ))
}

pub async fn export_pdf(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    let (list, rows) = state.services.price_lists.export_rows(id).await?;
    let bytes = pdf_reports::price_list_pdf(&list, &rows)?;
    Ok(pdf_attachment(&format!("{}.pdf", list.name), bytes))
}
