//! REST API endpoint handlers

use crate::db::sqlite::{SqliteDb, WatchlistEntry};
use crate::error::{AppError, ErrorKind, Result};
use crate::server::types::*;
use crate::services::{run_blocking, MoveOutcome, OrderingService, WatchlistService};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, info};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::BadInput => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => {
                error!(code = self.code(), "Request failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(ApiResponse::<Empty>::error(&self))).into_response()
    }
}

// ============================================================================
// Health Check
// ============================================================================

pub async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::<Empty>::success_with_message("Stock watchlist API is running"))
}

// ============================================================================
// Watchlist
// ============================================================================

/// GET /api/stocks
pub async fn list_stocks(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<WatchlistEntry>>>> {
    let db = state.sqlite.clone();
    let stocks = run_blocking(move || WatchlistService::list(&db)).await?;

    Ok(Json(ApiResponse::success_with_data(stocks)))
}

/// POST /api/stocks
pub async fn add_stock(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AddStockRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<WatchlistEntry>>)> {
    let Json(request) = payload.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    info!(code = %request.code, "Add stock requested");

    let entry = WatchlistService::add(&state, &request.code).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_data_and_message(entry, "Stock added")),
    ))
}

/// DELETE /api/stocks/:id
pub async fn delete_stock(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<Empty>>> {
    let id = parse_id(&raw_id)?;
    let db = state.sqlite.clone();
    run_blocking(move || WatchlistService::delete(&db, id)).await?;

    Ok(Json(ApiResponse::success_with_message("Stock deleted")))
}

/// PUT /api/stocks/:id/move-up
pub async fn move_up(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<MoveOutcome>>> {
    reorder(state, &raw_id, OrderingService::move_up).await
}

/// PUT /api/stocks/:id/move-down
pub async fn move_down(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<MoveOutcome>>> {
    reorder(state, &raw_id, OrderingService::move_down).await
}

/// PUT /api/stocks/:id/move-top
pub async fn move_to_top(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<MoveOutcome>>> {
    reorder(state, &raw_id, OrderingService::move_to_top).await
}

async fn reorder(
    state: AppState,
    raw_id: &str,
    op: fn(&SqliteDb, i64) -> Result<MoveOutcome>,
) -> Result<Json<ApiResponse<MoveOutcome>>> {
    let id = parse_id(raw_id)?;
    let db = state.sqlite.clone();
    let outcome = run_blocking(move || op(&db, id)).await?;

    let message = match outcome {
        MoveOutcome::Moved => "Order updated",
        MoveOutcome::AlreadyAtBoundary => "cannot move further",
    };

    Ok(Json(ApiResponse::success_with_data_and_message(outcome, message)))
}

fn parse_id(raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::InvalidInput(format!("Invalid stock id: {}", raw)))
}
