use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    handlers::render,
    services::reports::DashboardSummary,
    AppState,
};
use askama::Template;
use axum::{
    extract::{Query, State},
    response::Html,
};
use serde::Deserialize;

#[derive(Template)]
#[template(path = "index.html")]
struct DashboardTemplate {
    summary: DashboardSummary,
    msg: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub msg: Option<String>,
}

pub async fn dashboard(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Html<String>, ApiError> {
    let summary = state.services.reports.dashboard().await?;
    render(&DashboardTemplate {
        summary,
        msg: query.msg,
    })
}
