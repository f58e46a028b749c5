//! # Escrow
//!
//! Funds of a sale are held until delivery is confirmed, then released to
//! the shop and finally withdrawn.
//!
//! ## State Machine
//! ```text
//! ┌───────────────────┐ confirm_delivery ┌─────────────────┐ release ┌──────────┐ withdraw ┌───────────┐
//! │ AwaitingDelivery  │ ───────────────► │ PendingRelease  │ ──────► │ Released │ ───────► │ Withdrawn │
//! └───────────────────┘                  └─────────────────┘         └──────────┘          └───────────┘
//!        ACTIVE                                ACTIVE                  COMPLETED              COMPLETED
//! ```
//! Any other transition fails with [`CoreError::InvalidEscrowTransition`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Escrow;

// =============================================================================
// Escrow State
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EscrowState {
    #[default]
    AwaitingDelivery,
    PendingRelease,
    Released,
    Withdrawn,
}

impl EscrowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscrowState::AwaitingDelivery => "awaiting_delivery",
            EscrowState::PendingRelease => "pending_release",
            EscrowState::Released => "released",
            EscrowState::Withdrawn => "withdrawn",
        }
    }

    /// Funds still held (shown under the "Active" tab).
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            EscrowState::AwaitingDelivery | EscrowState::PendingRelease
        )
    }

    /// Funds handed to the shop (shown under the "Completed" tab).
    pub fn is_completed(&self) -> bool {
        !self.is_active()
    }

    /// The single state reachable from this one, if any.
    pub fn next(&self) -> Option<EscrowState> {
        match self {
            EscrowState::AwaitingDelivery => Some(EscrowState::PendingRelease),
            EscrowState::PendingRelease => Some(EscrowState::Released),
            EscrowState::Released => Some(EscrowState::Withdrawn),
            EscrowState::Withdrawn => None,
        }
    }
}

impl std::fmt::Display for EscrowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formats the per-shop escrow reference: `ESC001`, `ESC002`, ...
pub fn escrow_reference(sequence: i64) -> String {
    format!("ESC{:03}", sequence)
}

// =============================================================================
// Transitions
// =============================================================================

impl Escrow {
    fn transition(&mut self, to: EscrowState, at: DateTime<Utc>) -> CoreResult<()> {
        if self.state.next() != Some(to) {
            return Err(CoreError::InvalidEscrowTransition {
                reference: self.reference.clone(),
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        self.state = to;
        self.updated_at = at;
        Ok(())
    }

    /// Buyer confirmed delivery; the funds wait for release.
    pub fn confirm_delivery(&mut self, at: DateTime<Utc>) -> CoreResult<()> {
        self.transition(EscrowState::PendingRelease, at)
    }

    /// Funds become available to withdraw.
    pub fn release(&mut self, at: DateTime<Utc>) -> CoreResult<()> {
        self.transition(EscrowState::Released, at)?;
        self.released_at = Some(at);
        Ok(())
    }

    /// Funds leave escrow for the shop's account.
    pub fn withdraw(&mut self, at: DateTime<Utc>) -> CoreResult<()> {
        self.transition(EscrowState::Withdrawn, at)?;
        self.completed_at = Some(at);
        Ok(())
    }

    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Figures on top of the escrow dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EscrowSummary {
    /// Awaiting delivery + pending release.
    pub total_in_escrow_cents: i64,
    /// Number of escrows counted in `total_in_escrow_cents`.
    pub active_count: usize,
    pub pending_release_cents: i64,
    /// Released but not yet withdrawn.
    pub available_to_withdraw_cents: i64,
    pub withdrawn_cents: i64,
}

impl EscrowSummary {
    pub fn from_escrows<'a, I>(escrows: I) -> Self
    where
        I: IntoIterator<Item = &'a Escrow>,
    {
        let mut summary = EscrowSummary::default();
        for escrow in escrows {
            match escrow.state {
                EscrowState::AwaitingDelivery => {
                    summary.total_in_escrow_cents += escrow.amount_cents;
                    summary.active_count += 1;
                }
                EscrowState::PendingRelease => {
                    summary.total_in_escrow_cents += escrow.amount_cents;
                    summary.pending_release_cents += escrow.amount_cents;
                    summary.active_count += 1;
                }
                EscrowState::Released => {
                    summary.available_to_withdraw_cents += escrow.amount_cents;
                }
                EscrowState::Withdrawn => {
                    summary.withdrawn_cents += escrow.amount_cents;
                }
            }
        }
        summary
    }
}

/// Splits escrows into the dashboard's (active, completed) tabs.
pub fn split_active_completed(escrows: Vec<Escrow>) -> (Vec<Escrow>, Vec<Escrow>) {
    escrows.into_iter().partition(|e| e.state.is_active())
}

// =============================================================================
// Unit Tests
// =============================================================================
