use crate::{
    auth::AuthenticatedUser,
    common::{none_if_empty, parse_date_opt},
    entities::{lot, product},
    errors::{ApiError, ServiceError},
    handlers::{redirect_with_msg, render},
    services::lots::LotData,
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
#[template(path = "product_lots.html")]
struct ProductLotsTemplate {
    product: product::Model,
    lots: Vec<lot::Model>,
    msg: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LotsQuery {
    pub msg: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LotForm {
    #[serde(default)]
    pub lot_code: String,
    #[serde(default)]
    pub expiry_date: String,
    #[serde(default)]
    pub qty: String,
    #[serde(default)]
    pub notes: String,
}

pub async fn list(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    Query(query): Query<LotsQuery>,
) -> Result<Html<String>, ApiError> {
    let product = state.services.products.get(product_id).await?;
    let lots = state.services.lots.lots_for_product(product_id).await?;
    render(&ProductLotsTemplate {
        product,
        lots,
        msg: query.msg,
    })
}

pub async fn add(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    Form(form): Form<LotForm>,
) -> Result<Response, ApiError> {
    let back = format!("/products/{}/lots", product_id);

    // Missing quantity means 0: lots tracked for expiry only are valid.
    // Only non-empty input that fails to parse is rejected.
    let qty = match form.qty.trim() {
        "" => 0,
        raw => match raw.parse::<i32>() {
            Ok(qty) if qty >= 0 => qty,
            _ => {
                return Ok(
                    redirect_with_msg(&back, "Compila correttamente i dati lotto").into_response(),
                )
            }
        },
    };

    let data = LotData {
        lot_code: form.lot_code,
        expiry_date: parse_date_opt(&form.expiry_date),
        qty,
        notes: none_if_empty(&form.notes),
    };

    match state.services.lots.add_lot(product_id, data).await {
        Ok(_) => Ok(redirect_with_msg(&back, "Lotto registrato").into_response()),
        Err(ServiceError::ValidationError(_)) => Ok(redirect_with_msg(
            &back,
            "Compila correttamente i dati lotto",
        )
        .into_response()),
        Err(err) => Err(err.into()),
    }
}

pub async fn delete(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path((product_id, lot_id)): Path<(i32, i32)>,
) -> Result<Response, ApiError> {
    let back = format!("/products/{}/lots", product_id);
    state.services.lots.remove_lot(product_id, lot_id).await?;
    Ok(redirect_with_msg(&back, "Lotto eliminato").into_response())
}
