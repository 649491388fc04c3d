//! REST API module
//!
//! HTTP access to a deployed token. Mutating requests carry the acting
//! `caller` address; amounts are decimal strings.
//!
//! # Endpoints
//!
//! ## Token
//! - `GET /api/token` - Metadata, supply, owner
//! - `GET /api/token/balance/{holder}` - Balance
//! - `GET /api/token/allowance?owner=&spender=` - Allowance
//! - `GET /api/token/holders` - Holders by balance
//! - `POST /api/token/transfer` | `approve` | `transfer-from` | `burn` | `mint` | `ownership`
//!
//! ## Multisig
//! - `GET /api/multisig` - Signers and threshold
//! - `POST /api/multisig/signers` - Add signer
//! - `POST /api/multisig/signers/remove` - Remove signer
//! - `POST /api/multisig/required` - Change threshold
//! - `GET /api/multisig/transactions` - List proposals
//! - `POST /api/multisig/transactions/mint` | `ownership` - Propose
//! - `GET /api/multisig/transactions/{id}` - Get proposal
//! - `POST /api/multisig/transactions/{id}/confirm` | `revoke` | `execute`
//!
//! ## Log
//! - `GET /api/events?from=N` - Notification log
//! - `GET /api/validate` - Invariant check
//!
//! ## WebSocket
//! - `GET /ws` - Committed notifications as they happen

pub mod handlers;
pub mod routes;
pub mod websocket;

pub use handlers::ApiState;
pub use routes::create_router;
pub use websocket::{WsBroadcaster, WsEvent};
