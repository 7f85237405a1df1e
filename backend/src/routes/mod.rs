//! Route definitions for the ERP stock API

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        .merge(protected_routes(state))
}

/// Everything behind bearer authentication
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/number-sequences", number_sequence_routes())
        .nest("/stock-ledger", stock_ledger_routes())
        .nest("/stock-adjustments", stock_adjustment_routes())
        .nest("/stock-transfers", stock_transfer_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Number sequence routes
fn number_sequence_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_sequences).post(handlers::create_sequence),
        )
        .route("/active", get(handlers::list_active_sequences))
        .route("/preview-format", post(handlers::preview_sequence_format))
        .route("/by-code/:code/peek", get(handlers::peek_code))
        .route("/by-code/:code/generate", post(handlers::generate_code))
        .route(
            "/:id",
            get(handlers::get_sequence)
                .put(handlers::update_sequence)
                .delete(handlers::delete_sequence),
        )
}

/// Stock ledger query routes
fn stock_ledger_routes() -> Router<AppState> {
    Router::new()
        .route("/batches", get(handlers::list_available_batches))
        .route("/available", get(handlers::get_available_qty))
        .route("/entries", get(handlers::list_entries_by_ref))
        .route("/lane", get(handlers::get_lane_history))
}

/// Stock adjustment routes
fn stock_adjustment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_adjustments).post(handlers::create_adjustment),
        )
        .route(
            "/:id",
            get(handlers::get_adjustment)
                .put(handlers::update_adjustment)
                .delete(handlers::delete_adjustment),
        )
}

/// Stock transfer routes
fn stock_transfer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_transfers).post(handlers::create_transfer))
        .route(
            "/:id",
            get(handlers::get_transfer)
                .put(handlers::update_transfer)
                .delete(handlers::delete_transfer),
        )
        .route("/:id/approve", post(handlers::approve_transfer))
        .route("/:id/disapprove", post(handlers::disapprove_transfer))
        .route("/:id/activity", get(handlers::get_transfer_activity))
}
