//! Everything up to and including `|start|`

use anyhow::Result;
use psai_protocol::{EventKind, EventTag};
use tracing::{debug, info, trace};

use crate::context::BattleContext;
use crate::error::EngineError;
use crate::parser::{expect, peek_tag};

const INIT_TAGS: [EventTag; 9] = [
    EventTag::Player,
    EventTag::TeamSize,
    EventTag::GameType,
    EventTag::Gen,
    EventTag::Tier,
    EventTag::Rule,
    EventTag::ClearPoke,
    EventTag::Poke,
    EventTag::TeamPreview,
];

fn expected() -> Vec<EventTag> {
    let mut tags = INIT_TAGS.to_vec();
    tags.push(EventTag::Start);
    tags
}

/// Parse the battle's preamble, stopping after `|start|`
pub async fn init(ctx: &mut BattleContext) -> Result<()> {
    loop {
        match peek_tag(ctx).await? {
            Some(EventTag::Start) => return start(ctx).await,
            Some(tag) if INIT_TAGS.contains(&tag) => apply(ctx).await?,
            Some(got) => {
                return Err(EngineError::UnexpectedEvent {
                    expected: expected(),
                    got,
                }
                .into());
            }
            None => return Err(EngineError::UnexpectedEnd(expected()).into()),
        }
    }
}

/// One preamble event
pub async fn apply(ctx: &mut BattleContext) -> Result<()> {
    let event = expect(ctx, &INIT_TAGS).await?;
    match event.kind {
        EventKind::Player { player, username } => ctx.state.set_player(player, &username),
        EventKind::GameType(game_type) => ctx.state.set_game_type(game_type),
        EventKind::Gen(generation) => ctx.state.generation = generation,
        EventKind::Tier(tier) => ctx.state.tier = tier,
        EventKind::Rule(rule) => debug!(%rule, "battle rule"),
        EventKind::TeamSize { player, size } => trace!(%player, size, "team size"),
        kind => trace!(tag = %kind.tag(), "preamble event"),
    }
    Ok(())
}

pub async fn start(ctx: &mut BattleContext) -> Result<()> {
    expect(ctx, &[EventTag::Start]).await?;
    info!(
        tier = %ctx.state.tier,
        generation = ctx.state.generation,
        "battle started"
    );
    Ok(())
}
