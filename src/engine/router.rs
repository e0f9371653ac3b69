//! Single dispatch point from a decoded event to its handler.

use super::accountant::{Accountant, HandlerOutcome};
use super::context::TxContext;
use super::store::EntityStore;
use super::{EngineError, ZeroSupplyPolicy};
use crate::domain::{EventKind, PoolEvent, TransactionKind};
use tracing::trace;

/// Audit the event, then apply it to the aggregates. Parameter-change and approval events
/// stop after the audit entry.
///
/// # Errors
/// Propagates handler errors; the store may then hold partial changes and must be discarded.
pub fn route<S: EntityStore>(
    accountant: &mut Accountant<'_, S>,
    event: &PoolEvent,
) -> Result<(), EngineError> {
    let meta = &event.meta;
    accountant.ctx.enter(meta);
    accountant.record_audit(event)?;

    match &event.kind {
        EventKind::Transfer(t) => accountant.handle_transfer(meta, t)?,
        EventKind::TokenExchange(x) | EventKind::TokenExchangeUnderlying(x) => {
            accountant.handle_exchange(meta, x)?
        }
        EventKind::AddLiquidity(c) => accountant.handle_add_liquidity(meta, c)?,
        EventKind::RemoveLiquidity(c) => {
            accountant.handle_remove_liquidity(meta, c, TransactionKind::RemoveLiquidity)?
        }
        EventKind::RemoveLiquidityImbalance(c) => accountant.handle_remove_liquidity(
            meta,
            c,
            TransactionKind::RemoveLiquidityImbalance,
        )?,
        EventKind::RemoveLiquidityOne(r) => accountant.handle_remove_liquidity_one(meta, r)?,
        EventKind::RampA(_)
        | EventKind::StopRampA(_)
        | EventKind::ApplyNewFee(_)
        | EventKind::SetNewMaTime(_)
        | EventKind::Approval(_) => {
            trace!(event = event.kind.name(), position = %meta.position(), "audit-only event");
        }
    }

    accountant.ctx.observe(meta, event.kind.name());
    Ok(())
}

/// Run one event against `store` and return what it produced.
///
/// # Errors
/// See [`route`].
pub fn process_event<S: EntityStore>(
    store: &mut S,
    ctx: &mut TxContext,
    policy: ZeroSupplyPolicy,
    event: &PoolEvent,
) -> Result<HandlerOutcome, EngineError> {
    let mut accountant = Accountant::new(store, ctx, policy);
    route(&mut accountant, event)?;
    Ok(accountant.finish())
}
