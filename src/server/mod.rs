//! REST API server module
//!
//! Routes:
//! - `GET /health`
//! - `GET /api/stocks`, `POST /api/stocks`
//! - `DELETE /api/stocks/:id`
//! - `PUT /api/stocks/:id/move-up`, `/move-down`, `/move-top`

pub mod handlers;
mod api_server;
mod types;

pub use api_server::{build_router, ApiServer};
pub use types::{AddStockRequest, ApiResponse, Empty};
