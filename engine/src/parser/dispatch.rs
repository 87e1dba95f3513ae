//! Tag-keyed lookup of event handlers

use anyhow::Result;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use psai_protocol::{Event, EventTag};

use crate::context::BattleContext;
use crate::error::EngineError;
use crate::rules::{decide, events, init, residual, switch_in, turn};

/// Consumes the event at the head of the stream (and possibly more)
pub type EventHandler = for<'a> fn(&'a mut BattleContext) -> BoxFuture<'a, Result<()>>;

macro_rules! boxed_handlers {
    ($($name:ident => $handler:path),* $(,)?) => {
        $(
            fn $name(ctx: &mut BattleContext) -> BoxFuture<'_, Result<()>> {
                $handler(ctx).boxed()
            }
        )*
    };
}

boxed_handlers! {
    on_init => init::apply,
    on_start => init::start,
    on_turn => turn::turn,
    on_game_over => turn::game_over,
    on_request => decide::request,
    on_switch => switch_in::switch_in,
    on_upkeep => residual::upkeep,
    on_event => events::apply,
}

/// The handler registered for a tag
pub fn lookup(tag: EventTag) -> Option<EventHandler> {
    let handler: EventHandler = match tag {
        EventTag::Player
        | EventTag::TeamSize
        | EventTag::GameType
        | EventTag::Gen
        | EventTag::Tier
        | EventTag::Rule
        | EventTag::ClearPoke
        | EventTag::Poke
        | EventTag::TeamPreview => on_init,
        EventTag::Start => on_start,
        EventTag::Turn => on_turn,
        EventTag::Win | EventTag::Tie => on_game_over,
        EventTag::Request => on_request,
        EventTag::Switch | EventTag::Drag => on_switch,
        EventTag::Upkeep => on_upkeep,
        EventTag::Move
        | EventTag::DetailsChange
        | EventTag::Cant
        | EventTag::Faint
        | EventTag::Fail
        | EventTag::Miss
        | EventTag::Damage
        | EventTag::Heal
        | EventTag::Status
        | EventTag::CureStatus
        | EventTag::Boost
        | EventTag::Unboost
        | EventTag::ClearAllBoost
        | EventTag::ClearBoost
        | EventTag::Weather
        | EventTag::VolatileStart
        | EventTag::VolatileEnd
        | EventTag::Crit
        | EventTag::SuperEffective
        | EventTag::Resisted
        | EventTag::Immune
        | EventTag::Item
        | EventTag::EndItem
        | EventTag::Ability
        | EventTag::EndAbility
        | EventTag::Activate
        | EventTag::Prepare
        | EventTag::MustRecharge => on_event,
        EventTag::Error | EventTag::Other => return None,
    };
    Some(handler)
}

/// Tag of the event at the head of the stream
pub async fn peek_tag(ctx: &mut BattleContext) -> Result<Option<EventTag>> {
    Ok(ctx.events.peek().await?.map(Event::tag))
}

/// Run the handler for the head event.
///
/// Returns the tag it handled, or `None` if the stream is exhausted or
/// nothing is registered for the tag.
pub async fn dispatch(ctx: &mut BattleContext) -> Result<Option<EventTag>> {
    let Some(tag) = peek_tag(ctx).await? else {
        return Ok(None);
    };
    let Some(handler) = lookup(tag) else {
        return Ok(None);
    };
    handler(ctx).await?;
    Ok(Some(tag))
}

/// Consume the head event, which must carry one of `tags`
pub async fn expect(ctx: &mut BattleContext, tags: &[EventTag]) -> Result<Event> {
    match ctx.events.peek().await? {
        None => Err(EngineError::UnexpectedEnd(tags.to_vec()).into()),
        Some(event) if !tags.contains(&event.tag()) => Err(EngineError::UnexpectedEvent {
            expected: tags.to_vec(),
            got: event.tag(),
        }
        .into()),
        Some(_) => Ok(ctx
            .events
            .next()
            .await?
            .ok_or_else(|| EngineError::UnexpectedEnd(tags.to_vec()))?),
    }
}
