//! The turn loop

use anyhow::Result;
use psai_battle::BattleState;
use psai_protocol::{EventKind, EventTag};
use tracing::{info, trace};

use super::{init, residual};
use crate::context::BattleContext;
use crate::error::EngineError;
use crate::parser::{dispatch, expect};

/// How a parsed battle ended
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BattleOutcome {
    pub winner: Option<String>,
    pub tie: bool,
    pub turns: u32,
}

impl From<&BattleState> for BattleOutcome {
    fn from(state: &BattleState) -> Self {
        Self {
            winner: state.winner.clone(),
            tie: state.tie,
            turns: state.turn,
        }
    }
}

/// Parse a whole battle from its first event to `|win|` or `|tie|`
pub async fn battle_parser(ctx: &mut BattleContext) -> Result<BattleOutcome> {
    init::init(ctx).await?;

    let mut residuals_pending = false;
    while !ctx.state.ended {
        let (tag, starts_residuals) = match ctx.events.peek().await? {
            Some(event) => (
                event.tag(),
                event.tag() == EventTag::Upkeep || residual::is_residual(event),
            ),
            None => return Err(EngineError::UnexpectedEnd(vec![EventTag::Win, EventTag::Tie]).into()),
        };

        if residuals_pending && starts_residuals {
            residuals_pending = false;
            residual::residuals(ctx).await?;
            continue;
        }

        match dispatch(ctx).await? {
            Some(EventTag::Turn) => residuals_pending = true,
            Some(_) => {}
            None => {
                trace!(%tag, "skipping unhandled event");
                ctx.events.next().await?;
            }
        }
    }

    let outcome = BattleOutcome::from(&ctx.state);
    info!(winner = ?outcome.winner, tie = outcome.tie, turns = outcome.turns, "battle over");
    Ok(outcome)
}

pub async fn turn(ctx: &mut BattleContext) -> Result<()> {
    let event = expect(ctx, &[EventTag::Turn]).await?;
    if let EventKind::Turn(turn) = event.kind {
        ctx.state.set_turn(turn);
        info!(turn, "new turn");
    }
    Ok(())
}

/// `|win|` or `|tie|`
pub async fn game_over(ctx: &mut BattleContext) -> Result<()> {
    let event = expect(ctx, &[EventTag::Win, EventTag::Tie]).await?;
    match event.kind {
        EventKind::Win(winner) => ctx.state.finish(Some(winner)),
        _ => ctx.state.finish(None),
    }
    Ok(())
}
