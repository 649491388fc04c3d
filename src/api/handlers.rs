//! REST API handlers for token and multisig operations
//!
//! Every mutating request names its `caller`. Handlers take the contract's
//! write lock for the whole operation, persist the new state and push the
//! committed notifications to WebSocket subscribers.

use crate::api::websocket::{WsBroadcaster, WsEvent};
use crate::contract::TokenContract;
use crate::core::{Address, ErrorKind, Event, EventRecord, TokenError, TokenResult};
use crate::multisig::{Proposal, ProposalAction};
use crate::storage::Storage;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for API handlers
///
/// Requests carry the acting `caller` in the body and nothing here checks it.
/// The server must sit behind a front end that authenticates clients and
/// fills in `caller`.
#[derive(Clone)]
pub struct ApiState {
    pub contract: Arc<RwLock<TokenContract>>,
    pub storage: Arc<Storage>,
    pub ws_broadcaster: Arc<WsBroadcaster>,
}

impl ApiState {
    pub fn new(contract: TokenContract, storage: Storage) -> Self {
        Self {
            contract: Arc::new(RwLock::new(contract)),
            storage: Arc::new(storage),
            ws_broadcaster: Arc::new(WsBroadcaster::new()),
        }
    }
}

type ApiFailure = (StatusCode, Json<ApiError>);
type ApiResult<T> = Result<Json<T>, ApiFailure>;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    /// Error category, absent for malformed requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

#[derive(Debug, Serialize)]
pub struct TokenInfo {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: String,
    pub owner: String,
    pub holder_count: usize,
    pub owner_mint_enabled: bool,
    pub deployed_at: String,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub holder: String,
    pub balance: String,
}

#[derive(Debug, Serialize)]
pub struct AllowanceResponse {
    pub owner: String,
    pub spender: String,
    pub allowance: String,
}

#[derive(Debug, Serialize)]
pub struct HolderInfo {
    pub address: String,
    pub balance: String,
}

#[derive(Debug, Serialize)]
pub struct MultisigInfo {
    pub signers: Vec<String>,
    pub required_signatures: usize,
    pub transaction_count: usize,
    pub pending_count: usize,
}

#[derive(Debug, Serialize)]
pub struct TransactionInfo {
    pub id: u64,
    pub kind: String,
    pub target: String,
    pub amount: String,
    pub executed: bool,
    pub confirmations: usize,
    pub confirmed_by: Vec<String>,
    pub status: String,
}

impl TransactionInfo {
    fn from_proposal(proposal: &Proposal, threshold: usize) -> Self {
        Self {
            id: proposal.id,
            kind: proposal.action.kind().to_string(),
            target: proposal.action.target().to_string(),
            amount: proposal.action.amount().to_string(),
            executed: proposal.executed,
            confirmations: proposal.confirmations(),
            confirmed_by: proposal.confirmers().iter().map(|a| a.to_string()).collect(),
            status: format!("{:?}", proposal.status(threshold)),
        }
    }
}

/// A committed notification, with amounts as decimal strings
#[derive(Clone, Debug, Serialize)]
pub struct EventInfo {
    pub seq: u64,
    pub timestamp: String,
    #[serde(flatten)]
    pub body: EventBody,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event")]
pub enum EventBody {
    Transfer {
        from: String,
        to: String,
        amount: String,
    },
    Approval {
        owner: String,
        spender: String,
        amount: String,
    },
    OwnershipTransferred {
        previous_owner: String,
        new_owner: String,
    },
    TransactionProposed {
        id: u64,
        kind: u8,
        target: String,
        amount: String,
        proposer: String,
    },
    TransactionConfirmed {
        id: u64,
        signer: String,
    },
    TransactionRevoked {
        id: u64,
        signer: String,
    },
    TransactionExecuted {
        id: u64,
    },
    SignerAdded {
        signer: String,
    },
    SignerRemoved {
        signer: String,
    },
    RequiredSignaturesChanged {
        old: usize,
        new: usize,
    },
}

impl From<&Event> for EventBody {
    fn from(event: &Event) -> Self {
        match event {
            Event::Transfer { from, to, amount } => EventBody::Transfer {
                from: from.to_string(),
                to: to.to_string(),
                amount: amount.to_string(),
            },
            Event::Approval {
                owner,
                spender,
                amount,
            } => EventBody::Approval {
                owner: owner.to_string(),
                spender: spender.to_string(),
                amount: amount.to_string(),
            },
            Event::OwnershipTransferred {
                previous_owner,
                new_owner,
            } => EventBody::OwnershipTransferred {
                previous_owner: previous_owner.to_string(),
                new_owner: new_owner.to_string(),
            },
            Event::TransactionProposed {
                id,
                kind,
                target,
                amount,
                proposer,
            } => EventBody::TransactionProposed {
                id: *id,
                kind: kind.tag(),
                target: target.to_string(),
                amount: amount.to_string(),
                proposer: proposer.to_string(),
            },
            Event::TransactionConfirmed { id, signer } => EventBody::TransactionConfirmed {
                id: *id,
                signer: signer.to_string(),
            },
            Event::TransactionRevoked { id, signer } => EventBody::TransactionRevoked {
                id: *id,
                signer: signer.to_string(),
            },
            Event::TransactionExecuted { id } => EventBody::TransactionExecuted { id: *id },
            Event::SignerAdded { signer } => EventBody::SignerAdded {
                signer: signer.to_string(),
            },
            Event::SignerRemoved { signer } => EventBody::SignerRemoved {
                signer: signer.to_string(),
            },
            Event::RequiredSignaturesChanged { old, new } => {
                EventBody::RequiredSignaturesChanged {
                    old: *old,
                    new: *new,
                }
            }
        }
    }
}

impl From<&EventRecord> for EventInfo {
    fn from(record: &EventRecord) -> Self {
        Self {
            seq: record.seq,
            timestamp: record.timestamp.to_rfc3339(),
            body: EventBody::from(&record.event),
        }
    }
}

/// Result of a mutating request
#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    pub success: bool,
    /// Id of the created proposal, for propose requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<u64>,
    pub events: Vec<EventInfo>,
}

#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    pub valid: bool,
    pub violations: Vec<String>,
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct TransferRequest {
    pub caller: String,
    pub to: String,
    pub amount: String,
}

#[derive(Deserialize)]
pub struct ApproveRequest {
    pub caller: String,
    pub spender: String,
    pub amount: String,
}

#[derive(Deserialize)]
pub struct TransferFromRequest {
    pub caller: String,
    pub from: String,
    pub to: String,
    pub amount: String,
}

#[derive(Deserialize)]
pub struct BurnRequest {
    pub caller: String,
    pub amount: String,
}

#[derive(Deserialize)]
pub struct MintRequest {
    pub caller: String,
    pub to: String,
    pub amount: String,
}

#[derive(Deserialize)]
pub struct OwnershipRequest {
    pub caller: String,
    pub new_owner: String,
}

#[derive(Deserialize)]
pub struct ProposeMintRequest {
    pub caller: String,
    pub target: String,
    pub amount: String,
}

#[derive(Deserialize)]
pub struct ProposeOwnershipRequest {
    pub caller: String,
    pub target: String,
}

#[derive(Deserialize)]
pub struct CallerRequest {
    pub caller: String,
}

#[derive(Deserialize)]
pub struct SignerRequest {
    pub caller: String,
    pub signer: String,
}

#[derive(Deserialize)]
pub struct RequiredRequest {
    pub caller: String,
    pub required: usize,
}

#[derive(Deserialize)]
pub struct AllowanceQuery {
    pub owner: String,
    pub spender: String,
}

#[derive(Deserialize)]
pub struct EventsQuery {
    pub from: Option<u64>,
}

// ============================================================================
// Helpers
// ============================================================================

fn bad_request(error: String) -> ApiFailure {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError { error, kind: None }),
    )
}

fn parse_address(field: &str, value: &str) -> Result<Address, ApiFailure> {
    value
        .parse()
        .map_err(|e| bad_request(format!("Invalid {}: {}", field, e)))
}

fn parse_amount(value: &str) -> Result<u128, ApiFailure> {
    value
        .parse()
        .map_err(|_| bad_request("Invalid amount: must be a non-negative integer".to_string()))
}

/// Map a contract error to its HTTP status
pub fn status_for(error: &TokenError) -> StatusCode {
    if let TokenError::UnknownTransaction(_) = error {
        return StatusCode::NOT_FOUND;
    }
    match error.kind() {
        ErrorKind::Authorization => StatusCode::FORBIDDEN,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::State | ErrorKind::Invariant => StatusCode::CONFLICT,
    }
}

fn token_error(error: TokenError) -> ApiFailure {
    (
        status_for(&error),
        Json(ApiError {
            error: error.to_string(),
            kind: Some(error.kind()),
        }),
    )
}

/// Run a mutation under the write lock, then persist and broadcast.
///
/// Broadcasting happens before the lock is released so subscribers see
/// notifications in `seq` order.
async fn mutate<T, F>(state: &ApiState, op: F) -> Result<(T, Vec<EventInfo>), ApiFailure>
where
    F: FnOnce(&mut TokenContract) -> TokenResult<T>,
{
    let mut contract = state.contract.write().await;
    let before = contract.events().len() as u64;

    let value = op(&mut *contract).map_err(token_error)?;

    if let Err(e) = state.storage.save(&contract) {
        log::error!("Failed to save token state: {}", e);
    }

    let events: Vec<EventInfo> = contract
        .events_since(before)
        .iter()
        .map(EventInfo::from)
        .collect();

    for event in &events {
        state.ws_broadcaster.broadcast(WsEvent::TokenEvent {
            event: event.clone(),
        });
    }
    drop(contract);

    Ok((value, events))
}

fn receipt(events: Vec<EventInfo>) -> Json<ReceiptResponse> {
    Json(ReceiptResponse {
        success: true,
        transaction_id: None,
        events,
    })
}

// ============================================================================
// Token Handlers
// ============================================================================

/// GET /health - Health check
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /api/token - Token metadata and supply
pub async fn get_token_info(State(state): State<ApiState>) -> Json<TokenInfo> {
    let contract = state.contract.read().await;

    Json(TokenInfo {
        address: contract.address.to_string(),
        name: contract.name().to_string(),
        symbol: contract.symbol().to_string(),
        decimals: contract.decimals(),
        total_supply: contract.total_supply().to_string(),
        owner: contract.owner().to_string(),
        holder_count: contract.holders().len(),
        owner_mint_enabled: contract.owner_mint_enabled(),
        deployed_at: contract.deployed_at.to_rfc3339(),
    })
}

/// GET /api/token/balance/{holder} - Balance of a holder
pub async fn get_balance(
    State(state): State<ApiState>,
    Path(holder): Path<String>,
) -> ApiResult<BalanceResponse> {
    let address = parse_address("holder", &holder)?;
    let contract = state.contract.read().await;

    Ok(Json(BalanceResponse {
        holder: address.to_string(),
        balance: contract.balance_of(&address).to_string(),
    }))
}

/// GET /api/token/allowance?owner=..&spender=.. - Remaining allowance
pub async fn get_allowance(
    State(state): State<ApiState>,
    Query(query): Query<AllowanceQuery>,
) -> ApiResult<AllowanceResponse> {
    let owner = parse_address("owner", &query.owner)?;
    let spender = parse_address("spender", &query.spender)?;
    let contract = state.contract.read().await;

    Ok(Json(AllowanceResponse {
        owner: owner.to_string(),
        spender: spender.to_string(),
        allowance: contract.allowance(&owner, &spender).to_string(),
    }))
}

/// GET /api/token/holders - Holders by balance, largest first
pub async fn get_holders(State(state): State<ApiState>) -> Json<Vec<HolderInfo>> {
    let contract = state.contract.read().await;

    Json(
        contract
            .holders()
            .into_iter()
            .map(|(address, balance)| HolderInfo {
                address: address.to_string(),
                balance: balance.to_string(),
            })
            .collect(),
    )
}

/// POST /api/token/transfer - Transfer from the caller
pub async fn transfer(
    State(state): State<ApiState>,
    Json(req): Json<TransferRequest>,
) -> ApiResult<ReceiptResponse> {
    let caller = parse_address("caller", &req.caller)?;
    let to = parse_address("to", &req.to)?;
    let amount = parse_amount(&req.amount)?;

    let (_, events) = mutate(&state, |c| c.transfer(&caller, &to, amount)).await?;
    Ok(receipt(events))
}

/// POST /api/token/approve - Set the caller's allowance for a spender
pub async fn approve(
    State(state): State<ApiState>,
    Json(req): Json<ApproveRequest>,
) -> ApiResult<ReceiptResponse> {
    let caller = parse_address("caller", &req.caller)?;
    let spender = parse_address("spender", &req.spender)?;
    let amount = parse_amount(&req.amount)?;

    let (_, events) = mutate(&state, |c| c.approve(&caller, &spender, amount)).await?;
    Ok(receipt(events))
}

/// POST /api/token/transfer-from - Spend an allowance
pub async fn transfer_from(
    State(state): State<ApiState>,
    Json(req): Json<TransferFromRequest>,
) -> ApiResult<ReceiptResponse> {
    let caller = parse_address("caller", &req.caller)?;
    let from = parse_address("from", &req.from)?;
    let to = parse_address("to", &req.to)?;
    let amount = parse_amount(&req.amount)?;

    let (_, events) = mutate(&state, |c| c.transfer_from(&caller, &from, &to, amount)).await?;
    Ok(receipt(events))
}

/// POST /api/token/burn - Burn from the caller's balance
pub async fn burn(
    State(state): State<ApiState>,
    Json(req): Json<BurnRequest>,
) -> ApiResult<ReceiptResponse> {
    let caller = parse_address("caller", &req.caller)?;
    let amount = parse_amount(&req.amount)?;

    let (_, events) = mutate(&state, |c| c.burn(&caller, amount)).await?;
    Ok(receipt(events))
}

/// POST /api/token/mint - Direct owner mint (when enabled)
pub async fn mint(
    State(state): State<ApiState>,
    Json(req): Json<MintRequest>,
) -> ApiResult<ReceiptResponse> {
    let caller = parse_address("caller", &req.caller)?;
    let to = parse_address("to", &req.to)?;
    let amount = parse_amount(&req.amount)?;

    let (_, events) = mutate(&state, |c| c.mint(&caller, &to, amount)).await?;
    Ok(receipt(events))
}

/// POST /api/token/ownership - Direct ownership transfer by the owner
pub async fn transfer_ownership(
    State(state): State<ApiState>,
    Json(req): Json<OwnershipRequest>,
) -> ApiResult<ReceiptResponse> {
    let caller = parse_address("caller", &req.caller)?;
    let new_owner = parse_address("new_owner", &req.new_owner)?;

    let (_, events) = mutate(&state, |c| c.transfer_ownership(&caller, &new_owner)).await?;
    Ok(receipt(events))
}

// ============================================================================
// Multisig Handlers
// ============================================================================

/// GET /api/multisig - Signer set and threshold
pub async fn get_multisig(State(state): State<ApiState>) -> Json<MultisigInfo> {
    let contract = state.contract.read().await;

    Json(MultisigInfo {
        signers: contract.signers().iter().map(|s| s.to_string()).collect(),
        required_signatures: contract.required_signatures(),
        transaction_count: contract.transaction_count(),
        pending_count: contract.pending_transactions().len(),
    })
}

/// POST /api/multisig/signers - Add a signer
pub async fn add_signer(
    State(state): State<ApiState>,
    Json(req): Json<SignerRequest>,
) -> ApiResult<ReceiptResponse> {
    let caller = parse_address("caller", &req.caller)?;
    let signer = parse_address("signer", &req.signer)?;

    let (_, events) = mutate(&state, |c| c.add_signer(&caller, &signer)).await?;
    Ok(receipt(events))
}

/// POST /api/multisig/signers/remove - Remove a signer
pub async fn remove_signer(
    State(state): State<ApiState>,
    Json(req): Json<SignerRequest>,
) -> ApiResult<ReceiptResponse> {
    let caller = parse_address("caller", &req.caller)?;
    let signer = parse_address("signer", &req.signer)?;

    let (_, events) = mutate(&state, |c| c.remove_signer(&caller, &signer)).await?;
    Ok(receipt(events))
}

/// POST /api/multisig/required - Change the threshold
pub async fn set_required_signatures(
    State(state): State<ApiState>,
    Json(req): Json<RequiredRequest>,
) -> ApiResult<ReceiptResponse> {
    let caller = parse_address("caller", &req.caller)?;

    let (_, events) = mutate(&state, |c| c.set_required_signatures(&caller, req.required)).await?;
    Ok(receipt(events))
}

/// GET /api/multisig/transactions - Every proposal with its status
pub async fn list_transactions(State(state): State<ApiState>) -> Json<Vec<TransactionInfo>> {
    let contract = state.contract.read().await;
    let threshold = contract.required_signatures();

    Json(
        contract
            .transactions()
            .map(|p| TransactionInfo::from_proposal(p, threshold))
            .collect(),
    )
}

/// GET /api/multisig/transactions/{id} - One proposal
pub async fn get_transaction(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
) -> ApiResult<TransactionInfo> {
    let contract = state.contract.read().await;
    let proposal = contract.get_transaction(id).map_err(token_error)?;

    Ok(Json(TransactionInfo::from_proposal(
        proposal,
        contract.required_signatures(),
    )))
}

async fn propose(state: &ApiState, caller: Address, action: ProposalAction) -> ApiResult<ReceiptResponse> {
    let ((id, _), events) = mutate(state, |c| match action {
        ProposalAction::Mint { target, amount } => c.propose_mint(&caller, &target, amount),
        ProposalAction::TransferOwnership { target } => {
            c.propose_transfer_ownership(&caller, &target)
        }
    })
    .await?;

    Ok(Json(ReceiptResponse {
        success: true,
        transaction_id: Some(id),
        events,
    }))
}

/// POST /api/multisig/transactions/mint - Propose a mint
pub async fn propose_mint(
    State(state): State<ApiState>,
    Json(req): Json<ProposeMintRequest>,
) -> ApiResult<ReceiptResponse> {
    let caller = parse_address("caller", &req.caller)?;
    let target = parse_address("target", &req.target)?;
    let amount = parse_amount(&req.amount)?;

    propose(&state, caller, ProposalAction::Mint { target, amount }).await
}

/// POST /api/multisig/transactions/ownership - Propose an ownership transfer
pub async fn propose_transfer_ownership(
    State(state): State<ApiState>,
    Json(req): Json<ProposeOwnershipRequest>,
) -> ApiResult<ReceiptResponse> {
    let caller = parse_address("caller", &req.caller)?;
    let target = parse_address("target", &req.target)?;

    propose(&state, caller, ProposalAction::TransferOwnership { target }).await
}

/// POST /api/multisig/transactions/{id}/confirm
pub async fn confirm_transaction(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
    Json(req): Json<CallerRequest>,
) -> ApiResult<ReceiptResponse> {
    let caller = parse_address("caller", &req.caller)?;

    let (_, events) = mutate(&state, |c| c.confirm_transaction(&caller, id)).await?;
    Ok(receipt(events))
}

/// POST /api/multisig/transactions/{id}/revoke
pub async fn revoke_confirmation(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
    Json(req): Json<CallerRequest>,
) -> ApiResult<ReceiptResponse> {
    let caller = parse_address("caller", &req.caller)?;

    let (_, events) = mutate(&state, |c| c.revoke_confirmation(&caller, id)).await?;
    Ok(receipt(events))
}

/// POST /api/multisig/transactions/{id}/execute
pub async fn execute_transaction(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
    Json(req): Json<CallerRequest>,
) -> ApiResult<ReceiptResponse> {
    let caller = parse_address("caller", &req.caller)?;

    let (_, events) = mutate(&state, |c| c.execute_transaction(&caller, id)).await?;
    Ok(receipt(events))
}

// ============================================================================
// Log & Validation
// ============================================================================

/// GET /api/events?from=N - Notification log
pub async fn get_events(
    State(state): State<ApiState>,
    Query(query): Query<EventsQuery>,
) -> Json<Vec<EventInfo>> {
    let contract = state.contract.read().await;

    Json(
        contract
            .events_since(query.from.unwrap_or(0))
            .iter()
            .map(EventInfo::from)
            .collect(),
    )
}

/// GET /api/validate - Check supply and multisig invariants
pub async fn validate(State(state): State<ApiState>) -> Json<ValidationResponse> {
    let contract = state.contract.read().await;
    let violations = contract.check_invariants();

    Json(ValidationResponse {
        valid: violations.is_empty(),
        violations,
    })
}
