pub mod auth;
pub mod common;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod reports;
pub mod services;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{config::AppConfig, db::DbPool, handlers::AppServices};

/// Shared application state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: AppConfig) -> Self {
        let services = AppServices::new(db.clone(), &config);
        Self {
            db,
            config,
            services,
        }
    }
}

fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::suppliers::list))
        .route(
            "/new",
            get(handlers::suppliers::new_form).post(handlers::suppliers::create),
        )
        .route(
            "/:id/edit",
            get(handlers::suppliers::edit_form).post(handlers::suppliers::update),
        )
        .route("/:id/delete", post(handlers::suppliers::delete))
}

fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::categories::list))
        .route(
            "/new",
            get(handlers::categories::new_form).post(handlers::categories::create),
        )
        .route(
            "/:id/edit",
            get(handlers::categories::edit_form).post(handlers::categories::update),
        )
        .route("/:id/delete", post(handlers::categories::delete))
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::products::list))
        .route(
            "/new",
            get(handlers::products::new_form).post(handlers::products::create),
        )
        .route(
            "/:id/edit",
            get(handlers::products::edit_form).post(handlers::products::update),
        )
        .route("/:id/delete", post(handlers::products::delete))
        .route("/export.csv", get(handlers::products::export_csv))
        .route("/import", post(handlers::products::import_csv))
        .route("/:id/lots", get(handlers::lots::list))
        .route("/:id/lots/add", post(handlers::lots::add))
        .route("/:id/lots/:lot_id/delete", post(handlers::lots::delete))
}

fn price_list_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::price_lists::list))
        .route(
            "/new",
            get(handlers::price_lists::new_form).post(handlers::price_lists::create),
        )
        .route("/:id", get(handlers::price_lists::detail))
        .route(
            "/:id/edit",
            get(handlers::price_lists::edit_form).post(handlers::price_lists::update),
        )
        .route("/:id/delete", post(handlers::price_lists::delete))
        .route("/:id/items", post(handlers::price_lists::upsert_item))
        .route("/:id/export.csv", get(handlers::price_lists::export_csv))
        .route("/:id/export.pdf", get(handlers::price_lists::export_pdf))
}

fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/expiring", get(handlers::reports::expiring))
        .route("/expiring.csv", get(handlers::reports::expiring_csv))
        .route("/expiring.pdf", get(handlers::reports::expiring_pdf))
}

/// Builds the application router with all routes and middleware.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard::dashboard))
        .route("/health", get(handlers::health::health_check))
        .route(
            "/login",
            get(handlers::auth::login_form).post(handlers::auth::login_submit),
        )
        .route("/logout", post(handlers::auth::logout))
        .nest("/suppliers", supplier_routes())
        .nest("/categories", category_routes())
        .nest("/products", product_routes())
        .nest("/pricelists", price_list_routes())
        .nest("/reports", report_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
