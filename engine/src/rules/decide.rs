//! Answering requests: ask the agent, then negotiate with the server

use anyhow::{Result, bail};
use psai_protocol::{BattleRequest, Choice, EventKind, EventTag, Player};
use tracing::{debug, info, warn};

use super::facts::HasAbility;
use crate::context::BattleContext;
use crate::error::EngineError;
use crate::parser::expect;
use crate::sender::ChoiceResult;

/// Abilities that keep the opponent from switching out
const TRAPPING_ABILITIES: [&str; 3] = ["shadowtag", "arenatrap", "magnetpull"];

/// `|request|`
pub async fn request(ctx: &mut BattleContext) -> Result<()> {
    let event = expect(ctx, &[EventTag::Request]).await?;
    match event.kind {
        EventKind::Request(Some(request)) => decide(ctx, &request).await,
        _ => Ok(()),
    }
}

/// Make a choice for `request`, falling back through the agent's
/// preferences until the server takes one
pub async fn decide(ctx: &mut BattleContext, request: &BattleRequest) -> Result<()> {
    ctx.state.update_from_request(request);

    let mut choices = request.legal_choices();
    if choices.is_empty() {
        debug!(wait = request.wait, "nothing to choose");
        return Ok(());
    }

    ctx.agent
        .decide(&ctx.state, &mut choices, &ctx.span)
        .await?;
    if choices.is_empty() {
        bail!("agent left no choices to make");
    }

    let mut last = choices[0];
    while let Some(&choice) = choices.first() {
        last = choice;
        match ctx.sender.send(choice).await? {
            ChoiceResult::Accepted => {
                info!(%choice, turn = ctx.state.turn, "choice accepted");
                return Ok(());
            }
            ChoiceResult::Rejected => {
                debug!(%choice, "choice rejected");
                choices.remove(0);
            }
            ChoiceResult::Disabled => {
                debug!(%choice, "move is disabled");
                choices.remove(0);
                disable(ctx, request, choice)?;
            }
            ChoiceResult::Trapped => {
                debug!(%choice, "trapped, dropping switches");
                choices.retain(|c| !c.is_switch());
                trapped(ctx)?;
            }
        }
    }

    Err(EngineError::ChoicesExhausted { last }.into())
}

fn our_side(ctx: &BattleContext) -> Result<Player> {
    match ctx.state.perspective() {
        Some(player) => Ok(player),
        None => bail!("no request has told us which side we are"),
    }
}

fn disable(ctx: &mut BattleContext, request: &BattleRequest, choice: Choice) -> Result<()> {
    let Choice::Move(slot) = choice else {
        return Ok(());
    };
    let Some(move_slot) = request
        .first_active()
        .and_then(|active| active.moves.get(usize::from(slot).saturating_sub(1)))
    else {
        return Ok(());
    };
    let player = our_side(ctx)?;
    let Some(active) = ctx.state.active_ident(player) else {
        return Ok(());
    };
    ctx.state.disable_move(&active, &move_slot.id)?;
    Ok(())
}

/// We can't switch, so the opponent's Pokemon must have a trapping ability
fn trapped(ctx: &mut BattleContext) -> Result<()> {
    let foe = our_side(ctx)?.foe();
    let Some(trapper) = ctx.state.active_ident(foe) else {
        warn!(%foe, "trapped with no known opponent on the field");
        return Ok(());
    };

    let reasons = TRAPPING_ABILITIES
        .iter()
        .map(|ability| {
            ctx.reasons.fact(HasAbility {
                pokemon: trapper.clone(),
                ability: ability.to_string(),
            })
        })
        .collect();
    let any = ctx.reasons.or(reasons);
    ctx.assert(any)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use psai_battle::BattleState;
    use psai_protocol::{ClientMessage, Event, HpStatus, PokemonDetails, PokemonIdent};
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;
    use crate::agent::{BattleAgent, FirstChoiceAgent, FnAgent};
    use crate::sender::ChoiceResolver;
    use crate::testing::TestBattle;

    fn dugtrio_request(trapped: bool) -> BattleRequest {
        let json = format!(
            r#"{{"rqid":4,"active":[{{"moves":[
                {{"move":"Earthquake","id":"earthquake","pp":16,"maxpp":16,"target":"normal","disabled":false}},
                {{"move":"Rock Slide","id":"rockslide","pp":16,"maxpp":16,"target":"normal","disabled":false}}
            ],"trapped":{trapped}}}],
            "side":{{"name":"bot","id":"p1","pokemon":[
                {{"ident":"p1: Dugtrio","details":"Dugtrio, L50","condition":"100/100","active":true,"moves":["earthquake","rockslide"],"baseAbility":"arenatrap","item":"choiceband"}},
                {{"ident":"p1: Skarmory","details":"Skarmory, L50","condition":"100/100","active":false,"moves":["spikes"],"baseAbility":"keeneye","item":"leftovers"}}
            ]}}}}"#
        );
        serde_json::from_str(&json).unwrap()
    }

    fn wobbuffet() -> PokemonIdent {
        PokemonIdent::new(Player::P2, Some('a'), "Wobbuffet")
    }

    /// Start `request` on a parser task with a foe on the field
    fn start(
        agent: impl BattleAgent + 'static,
        request: BattleRequest,
    ) -> (
        tokio::task::JoinHandle<(BattleContext, Result<()>)>,
        ChoiceResolver,
        UnboundedReceiver<ClientMessage>,
    ) {
        let mut battle = TestBattle::with_agent(Arc::new(agent));
        battle.ctx.state.switch_in(
            &wobbuffet(),
            &PokemonDetails::parse("Wobbuffet, L50"),
            HpStatus::parse("100/100").as_ref(),
        );
        battle.supply(vec![Event::new(EventKind::Request(Some(Box::new(
            request,
        ))))]);

        let (mut ctx, resolver, outgoing) = battle.split();
        let parser = tokio::spawn(async move {
            let result = super::request(&mut ctx).await;
            (ctx, result)
        });
        (parser, resolver, outgoing)
    }

    async fn answer(
        outgoing: &mut UnboundedReceiver<ClientMessage>,
        resolver: &ChoiceResolver,
        result: ChoiceResult,
    ) -> String {
        let message = outgoing.recv().await.unwrap();
        assert!(resolver.resolve(result));
        message.to_wire_format()
    }

    #[tokio::test]
    async fn test_agent_order_is_tried_first() {
        let agent = FnAgent::new(|_: &BattleState, choices: &mut Vec<Choice>| {
            choices.reverse();
            Ok(())
        });
        let (parser, resolver, mut outgoing) = start(agent, dugtrio_request(false));

        assert_eq!(
            answer(&mut outgoing, &resolver, ChoiceResult::Accepted).await,
            "battle-test-1|/choose switch 2"
        );
        let (_, result) = parser.await.unwrap();
        result.unwrap();
    }

    #[tokio::test]
    async fn test_disabled_move_is_recorded() {
        let (parser, resolver, mut outgoing) = start(FirstChoiceAgent, dugtrio_request(false));

        let first = answer(&mut outgoing, &resolver, ChoiceResult::Disabled).await;
        let second = answer(&mut outgoing, &resolver, ChoiceResult::Accepted).await;
        assert_eq!(first, "battle-test-1|/choose move 1");
        assert_eq!(second, "battle-test-1|/choose move 2");

        let (ctx, result) = parser.await.unwrap();
        result.unwrap();
        let dugtrio = ctx
            .state
            .pokemon(&PokemonIdent::new(Player::P1, Some('a'), "Dugtrio"))
            .unwrap();
        assert!(dugtrio.disabled_moves.contains("earthquake"));
    }

    #[tokio::test]
    async fn test_trapped_drops_switches_and_blames_foe() {
        let agent = FnAgent::new(|_: &BattleState, choices: &mut Vec<Choice>| {
            choices.sort_by_key(|c| !c.is_switch());
            Ok(())
        });
        let (parser, resolver, mut outgoing) = start(agent, dugtrio_request(false));

        let first = answer(&mut outgoing, &resolver, ChoiceResult::Trapped).await;
        let second = answer(&mut outgoing, &resolver, ChoiceResult::Accepted).await;
        assert_eq!(first, "battle-test-1|/choose switch 2");
        assert_eq!(second, "battle-test-1|/choose move 1");

        let (mut ctx, result) = parser.await.unwrap();
        result.unwrap();

        // Two of three trapping abilities ruled out leaves the third
        ctx.state.rule_out_ability(&wobbuffet(), "Shadow Tag").unwrap();
        ctx.state.rule_out_ability(&wobbuffet(), "Arena Trap").unwrap();
        ctx.settle().unwrap();
        assert_eq!(
            ctx.state.pokemon(&wobbuffet()).unwrap().ability.definite(),
            Some("magnetpull")
        );
    }

    #[tokio::test]
    async fn test_exhausted_choices_name_the_last_one() {
        let (parser, resolver, mut outgoing) = start(FirstChoiceAgent, dugtrio_request(true));

        // Trapped: only the two moves are on offer
        answer(&mut outgoing, &resolver, ChoiceResult::Rejected).await;
        answer(&mut outgoing, &resolver, ChoiceResult::Rejected).await;

        let (_, result) = parser.await.unwrap();
        let err = result.unwrap_err();
        assert_eq!(
            err.downcast_ref::<EngineError>(),
            Some(&EngineError::ChoicesExhausted {
                last: Choice::Move(2)
            })
        );
    }
}
