//! Append-only record of committed ledger changes.

use alloy::primitives::Address;
use chrono::Utc;
use pegvault_common::types::LedgerEvent;
use uuid::Uuid;

use crate::ledger::PendingEvent;

#[derive(Debug, Default)]
pub struct EventJournal {
    events: Vec<LedgerEvent>,
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, pending: PendingEvent) -> &LedgerEvent {
        let event = LedgerEvent {
            id: Uuid::new_v4(),
            sequence: self.events.len() as u64 + 1,
            recorded_at: Utc::now(),
            event_type: pending.event_type,
            user: pending.user,
            counterparty: pending.counterparty,
            asset: pending.asset,
            amount: pending.amount,
        };

        tracing::info!(
            sequence = event.sequence,
            event_type = %event.event_type,
            user = %event.user,
            counterparty = ?event.counterparty,
            asset = ?event.asset,
            amount = %event.amount,
            "Ledger event recorded"
        );

        self.events.push(event);
        &self.events[self.events.len() - 1]
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Events where `account` is the position owner or the counterparty.
    pub fn events_for(&self, account: Address) -> impl Iterator<Item = &LedgerEvent> {
        self.events
            .iter()
            .filter(move |e| e.user == account || e.counterparty == Some(account))
    }

    /// Events with a sequence number greater than `sequence`.
    pub fn since(&self, sequence: u64) -> &[LedgerEvent] {
        let len = self.events.len();
        let start = usize::try_from(sequence).map_or(len, |s| s.min(len));
        &self.events[start..]
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
