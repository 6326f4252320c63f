//! Protocol-wide views: totals and the event journal.

use alloy::primitives::Address;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pegvault_common::error::AppError;
use pegvault_common::types::{EventType, LedgerEvent};
use pegvault_engine::PegToken;

use super::parse_address;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/protocol/totals", get(totals))
        .route("/api/events", get(list_events))
}

#[derive(Debug, Serialize)]
pub struct TotalsResponse {
    pub total_debt: String,
    pub total_collateral_value_usd: String,
    pub open_positions: usize,
    pub solvent: bool,
    pub peg_supply: String,
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Only events where this account is the owner or counterparty
    pub user: Option<String>,
    /// Only events after this sequence number
    pub since: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: Uuid,
    pub sequence: u64,
    pub recorded_at: DateTime<Utc>,
    pub event_type: EventType,
    pub user: Address,
    pub counterparty: Option<Address>,
    pub asset: Option<Address>,
    pub amount: String,
}

impl From<&LedgerEvent> for EventResponse {
    fn from(e: &LedgerEvent) -> Self {
        Self {
            id: e.id,
            sequence: e.sequence,
            recorded_at: e.recorded_at,
            event_type: e.event_type,
            user: e.user,
            counterparty: e.counterparty,
            asset: e.asset,
            amount: e.amount.to_string(),
        }
    }
}

/// GET /api/protocol/totals
async fn totals(State(state): State<AppState>) -> Result<Json<TotalsResponse>, AppError> {
    let totals = state.engine.lock().await.protocol_totals()?;

    Ok(Json(TotalsResponse {
        total_debt: totals.total_debt.to_string(),
        total_collateral_value_usd: totals.total_collateral_value_usd.to_string(),
        open_positions: totals.open_positions,
        solvent: totals.is_solvent(),
        peg_supply: state.peg.total_supply().to_string(),
    }))
}

/// GET /api/events?user=&since=
async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<EventResponse>>, AppError> {
    let user = query.user.as_deref().map(|u| parse_address("user", u)).transpose()?;
    let since = query.since.unwrap_or(0);

    let engine = state.engine.lock().await;
    let events = engine
        .events_since(since)
        .iter()
        .filter(|e| user.is_none_or(|u| e.user == u || e.counterparty == Some(u)))
        .map(EventResponse::from)
        .collect();

    Ok(Json(events))
}
