use axum::extract::{Path, Query, State};
use axum::response::Json;
use jrnl_ledger::wire::{
    CommitmentQuery, EntryRecord, ProgramInfo, SubmitRequest, SubmitResponse,
};
use jrnl_ledger::HealthResponse;
use jrnl_types::{Address, Identity};
use tracing::debug;

use crate::error::{ServerError, ServerResult};
use crate::state::NodeState;

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

pub async fn program_handler(
    State(node): State<NodeState>,
    Path(program): Path<Identity>,
) -> ServerResult<Json<ProgramInfo>> {
    Ok(Json(node.program(&program)?))
}

pub async fn submit_handler(
    State(node): State<NodeState>,
    Path(program): Path<Identity>,
    Json(request): Json<SubmitRequest>,
) -> ServerResult<Json<SubmitResponse>> {
    let token = node.submit(&program, &request)?;
    Ok(Json(SubmitResponse { token }))
}

pub async fn entries_handler(
    State(node): State<NodeState>,
    Path(program): Path<Identity>,
    Query(query): Query<CommitmentQuery>,
) -> ServerResult<Json<Vec<EntryRecord>>> {
    debug!(program = %program.short_id(), commitment = %query.commitment, "list entries");
    let records = node
        .entries(&program)?
        .into_iter()
        .map(|(address, entry)| EntryRecord { address, entry })
        .collect();
    Ok(Json(records))
}

pub async fn entry_handler(
    State(node): State<NodeState>,
    Path((program, address)): Path<(Identity, Address)>,
    Query(query): Query<CommitmentQuery>,
) -> ServerResult<Json<EntryRecord>> {
    debug!(address = %address.short_hex(), commitment = %query.commitment, "fetch entry");
    let entry = node
        .entry(&program, &address)?
        .ok_or(ServerError::EntryNotFound(address))?;
    Ok(Json(EntryRecord { address, entry }))
}
