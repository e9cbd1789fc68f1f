//! Financial Data API Routes
//!
//! `GET /` greets, `GET /financial-data` returns the provider's income statements
//! projected, filtered and sorted according to the query string.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use statement_core::{FinancialStatement, QueryParams, StatementQuery};

use crate::request_id::RequestId;
use crate::{AppError, AppState};

pub const WELCOME_MESSAGE: &str = "Welcome to the Financial Data API";

#[derive(Serialize)]
pub struct Welcome {
    pub message: &'static str,
}

pub fn financial_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .route("/financial-data", get(get_financial_data))
}

async fn welcome() -> Json<Welcome> {
    Json(Welcome {
        message: WELCOME_MESSAGE,
    })
}

async fn get_financial_data(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<Vec<FinancialStatement>>, AppError> {
    let Query(params) = params?;

    // Validate before fetching so a bad request never reaches the provider.
    let query = StatementQuery::from_params(&params)?;

    let statements = state.source.fetch_statements().await?;
    let total = statements.len();
    let statements = query.apply(statements)?;

    tracing::info!(
        "Request {}: returning {} of {} statements",
        request_id,
        statements.len(),
        total
    );
    Ok(Json(statements))
}
