pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod health;
pub mod lots;
pub mod price_lists;
pub mod products;
pub mod reports;
pub mod suppliers;

use std::sync::Arc;

use crate::{
    auth::AuthService,
    config::AppConfig,
    db::DbPool,
    errors::ApiError,
    services::{
        CategoryService, LotService, PriceListService, ProductService, ReportService,
        SupplierService,
    },
};
use askama::Template;
use axum::{
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
};

/// All services, constructed once at startup and shared via `AppState`.
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<AuthService>,
    pub suppliers: Arc<SupplierService>,
    pub categories: Arc<CategoryService>,
    pub products: Arc<ProductService>,
    pub lots: Arc<LotService>,
    pub price_lists: Arc<PriceListService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig) -> Self {
        Self {
            auth: Arc::new(AuthService::new(db_pool.clone(), config)),
            suppliers: Arc::new(SupplierService::new(db_pool.clone())),
            categories: Arc::new(CategoryService::new(db_pool.clone())),
            products: Arc::new(ProductService::new(db_pool.clone())),
            lots: Arc::new(LotService::new(db_pool.clone())),
            price_lists: Arc::new(PriceListService::new(db_pool.clone())),
            reports: Arc::new(ReportService::new(db_pool)),
        }
    }
}

pub(crate) fn render<T: Template>(template: &T) -> Result<Html<String>, ApiError> {
    Ok(Html(template.render()?))
}

/// Redirect carrying a flash message in the `msg` query parameter.
pub(crate) fn redirect_with_msg(path: &str, msg: &str) -> Redirect {
    Redirect::to(&format!("{}?msg={}", path, urlencoding::encode(msg)))
}

pub(crate) fn csv_attachment(filename: &str, bytes: Vec<u8>) -> Response {
    attachment("text/csv; charset=utf-8", filename, bytes)
}

pub(crate) fn pdf_attachment(filename: &str, bytes: Vec<u8>) -> Response {
    attachment("application/pdf", filename, bytes)
}

fn attachment(content_type: &str, filename: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", safe_filename(filename)),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// Keeps download names header-safe: alphanumerics, dot, dash and
/// underscore pass through, everything else becomes an underscore.
pub(crate) fn safe_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(safe_filename("Listino Base.pdf"), "Listino_Base.pdf");
        assert_eq!(safe_filename("a/b\"c.csv"), "a_b_c.csv");
    }
}
