//! REST API routes configuration

use crate::api::handlers::{self, ApiState};
use crate::api::websocket::ws_handler;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

/// Create the API router with all routes
pub fn create_router(state: ApiState) -> Router {
    // Configure CORS for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // WebSocket for real-time notifications
        .route("/ws", get(ws_handler))
        // Token
        .route("/api/token", get(handlers::get_token_info))
        .route("/api/token/balance/{holder}", get(handlers::get_balance))
        .route("/api/token/allowance", get(handlers::get_allowance))
        .route("/api/token/holders", get(handlers::get_holders))
        .route("/api/token/transfer", post(handlers::transfer))
        .route("/api/token/approve", post(handlers::approve))
        .route("/api/token/transfer-from", post(handlers::transfer_from))
        .route("/api/token/burn", post(handlers::burn))
        .route("/api/token/mint", post(handlers::mint))
        .route("/api/token/ownership", post(handlers::transfer_ownership))
        // Multisig
        .route("/api/multisig", get(handlers::get_multisig))
        .route("/api/multisig/signers", post(handlers::add_signer))
        .route("/api/multisig/signers/remove", post(handlers::remove_signer))
        .route(
            "/api/multisig/required",
            post(handlers::set_required_signatures),
        )
        .route(
            "/api/multisig/transactions",
            get(handlers::list_transactions),
        )
        .route(
            "/api/multisig/transactions/mint",
            post(handlers::propose_mint),
        )
        .route(
            "/api/multisig/transactions/ownership",
            post(handlers::propose_transfer_ownership),
        )
        .route(
            "/api/multisig/transactions/{id}",
            get(handlers::get_transaction),
        )
        .route(
            "/api/multisig/transactions/{id}/confirm",
            post(handlers::confirm_transaction),
        )
        .route(
            "/api/multisig/transactions/{id}/revoke",
            post(handlers::revoke_confirmation),
        )
        .route(
            "/api/multisig/transactions/{id}/execute",
            post(handlers::execute_transaction),
        )
        // Log & validation
        .route("/api/events", get(handlers::get_events))
        .route("/api/validate", get(handlers::validate))
        // Add state and middleware
        .with_state(state)
        .layer(cors)
}
