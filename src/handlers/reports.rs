use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    handlers::{csv_attachment, pdf_attachment, render},
    reports::{csv as csv_reports, pdf as pdf_reports},
    services::reports::{ExpiringLotRow, DEFAULT_EXPIRY_DAYS},
    AppState,
};
use askama::Template;
use axum::{
    extract::{Query, State},
    response::{Html, Response},
};
use serde::Deserialize;

#[derive(Template)]
#[template(path = "report_expiring.html")]
struct ExpiringTemplate {
    rows: Vec<ExpiringLotRow>,
    days: i64,
    category: String,
    supplier: String,
    categories: Vec<String>,
    suppliers: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    pub days: Option<i64>,
    pub category: Option<String>,
    pub supplier: Option<String>,
}

impl ExpiringQuery {
    /// Clamps the horizon to a sane range; bad input falls back to the
    /// default 30 days.
    fn days(&self) -> i64 {
        match self.days {
            Some(days) if (1..=3650).contains(&days) => days,
            _ => DEFAULT_EXPIRY_DAYS,
        }
    }
}

pub async fn expiring(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(query): Query<ExpiringQuery>,
) -> Result<Html<String>, ApiError> {
    let days = query.days();
    let rows = state
        .services
        .reports
        .expiring_lots(days, query.category.as_deref(), query.supplier.as_deref())
        .await?;
    let categories = state.services.categories.names().await?;
    let suppliers = state.services.suppliers.names().await?;
    render(&ExpiringTemplate {
        rows,
        days,
        category: query.category.unwrap_or_default(),
        supplier: query.supplier.unwrap_or_default(),
        categories,
        suppliers,
    })
}

pub async fn expiring_csv(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(query): Query<ExpiringQuery>,
) -> Result<Response, ApiError> {
    let days = query.days();
    let rows = state
        .services
        .reports
        .expiring_lots(days, query.category.as_deref(), query.supplier.as_deref())
        .await?;
    let bytes = csv_reports::expiring_csv(&rows)?;
    Ok(csv_attachment(&format!("expiring_{}d.csv", days), bytes))
}

pub async fn expiring_pdf(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(query): Query<ExpiringQuery>,
) -> Result<Response, ApiError> {
    let days = query.days();
    let rows = state
        .services
        .reports
        .expiring_lots(days, query.category.as_deref(), query.supplier.as_deref())
        .await?;
    let bytes = pdf_reports::expiring_pdf(
        days,
        query.category.as_deref(),
        query.supplier.as_deref(),
        &rows,
    )?;
    Ok(pdf_attachment(
        &format!("report_scadenze_{}d.pdf", days),
        bytes,
    ))
}
