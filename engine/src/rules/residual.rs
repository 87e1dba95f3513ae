//! End of turn residual effects.
//!
//! Each active Pokemon's residuals come in a fixed order (held item heal,
//! then status damage) but Pokemon take turns by speed, which the parser
//! doesn't know. The phase is therefore parsed with [`staged`], one key per
//! Pokemon. A Pokemon that was hurt but never healed can't be holding
//! Leftovers.

use anyhow::Result;
use async_trait::async_trait;
use psai_battle::{BattleState, Status};
use psai_protocol::{EffectKind, Event, EventKind, EventTag, PokemonIdent};
use tracing::{debug, trace};

use super::events;
use super::facts::{FullHp, HasItem};
use super::same_pokemon;
use crate::context::BattleContext;
use crate::parser::{
    Acceptor, BoxParser, EventInference, InferenceParser, InferenceRoutine, ParserFactory,
    SubInference, UnorderedParser, dispatch, expect, staged,
};

/// Items that heal every turn unless the holder is at full HP
const HEALING_ITEMS: &[&str] = &["leftovers"];

/// Events that end the residual phase
const PHASE_END: [EventTag; 6] = [
    EventTag::Upkeep,
    EventTag::Turn,
    EventTag::Win,
    EventTag::Tie,
    EventTag::Request,
    EventTag::Error,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Residual {
    Item(String),
    Status(String),
}

/// Whether the event can only be an end of turn residual
pub fn is_residual(event: &Event) -> bool {
    let Some(effect) = event.flags.from_effect() else {
        return false;
    };
    match (&event.kind, effect.kind) {
        (EventKind::Heal { .. } | EventKind::Damage { .. }, EffectKind::Item) => {
            matches!(effect.id().as_str(), "leftovers" | "blacksludge")
        }
        (EventKind::Damage { .. }, EffectKind::Status) => {
            Status::from_protocol(&effect.name).is_some_and(|s| s.deals_residual_damage())
        }
        _ => false,
    }
}

/// Parse the residual phase of one turn
pub async fn residuals(ctx: &mut BattleContext) -> Result<Vec<(PokemonIdent, Vec<Residual>)>> {
    let mut items: Vec<(PokemonIdent, ParserFactory<Residual>)> = Vec::new();
    let mut statuses: Vec<(PokemonIdent, ParserFactory<Residual>)> = Vec::new();

    for pokemon in active_pokemon(&ctx.state) {
        // HP as it was before any residual hit
        let full_hp = FullHp::now(&ctx.state, pokemon.clone());
        // Built once: speculative parsers share the same reasons
        let inference = item_inference(ctx, &pokemon, &full_hp);
        let ident = pokemon.clone();
        items.push((
            pokemon.clone(),
            Box::new(move |_: &mut BattleContext| {
                let parser = InferenceParser::new(
                    format!("item residual {ident}"),
                    inference.clone(),
                    ItemResidual {
                        pokemon: ident.clone(),
                    },
                );
                Ok(vec![Box::new(parser) as BoxParser<Residual>])
            }),
        ));

        let ident = pokemon.clone();
        statuses.push((
            pokemon,
            Box::new(move |_: &mut BattleContext| {
                Ok(vec![Box::new(StatusResidual {
                    pokemon: ident.clone(),
                }) as BoxParser<Residual>])
            }),
        ));
    }

    let results = staged(ctx, vec![items, statuses], Some(Box::new(Interlude))).await?;
    for (pokemon, effects) in &results {
        debug!(%pokemon, ?effects, "residual effects");
    }
    Ok(results)
}

/// `|upkeep|`: the residual phase is over
pub async fn upkeep(ctx: &mut BattleContext) -> Result<()> {
    expect(ctx, &[EventTag::Upkeep]).await?;
    trace!(turn = ctx.state.turn, "upkeep");
    Ok(())
}

/// Active Pokemon whose items may still be hidden
fn active_pokemon(state: &BattleState) -> Vec<PokemonIdent> {
    let ours = state.perspective();
    state
        .sides()
        .filter(|side| Some(side.player) != ours)
        .flat_map(|side| {
            side.get_active()
                .filter(|(_, poke)| poke.is_alive())
                .map(|(slot, poke)| {
                    let position = char::from(b'a' + slot as u8);
                    PokemonIdent::new(side.player, Some(position), poke.name())
                })
        })
        .collect()
}

/// One case per healing item: it is held and there was HP to heal
fn item_inference(
    ctx: &mut BattleContext,
    pokemon: &PokemonIdent,
    full_hp: &FullHp,
) -> EventInference {
    let mut cases = Vec::new();
    for item in HEALING_ITEMS {
        let holds = ctx.reasons.fact(HasItem {
            pokemon: pokemon.clone(),
            item: item.to_string(),
        });
        let full = ctx.reasons.fact(full_hp.clone());
        let hurt = ctx.reasons.not(full);
        cases.push(SubInference::new(&mut ctx.reasons, vec![holds, hurt]));
    }
    EventInference::new(cases)
}

struct ItemResidual {
    pokemon: PokemonIdent,
}

#[async_trait]
impl InferenceRoutine for ItemResidual {
    type Output = Residual;

    async fn run(
        &mut self,
        ctx: &mut BattleContext,
        accept: &mut Acceptor,
    ) -> Result<Option<Residual>> {
        let item = match ctx.events.peek().await? {
            Some(Event {
                kind: EventKind::Heal { pokemon, .. },
                flags,
            }) if same_pokemon(pokemon, &self.pokemon) => flags
                .from_effect()
                .filter(|effect| effect.kind == EffectKind::Item)
                .map(|effect| effect.id()),
            _ => None,
        };
        let Some((index, item)) =
            item.and_then(|item| Some((HEALING_ITEMS.iter().position(|i| *i == item)?, item)))
        else {
            return Ok(None);
        };

        accept.accept(ctx, index)?;
        events::apply(ctx).await?;
        Ok(Some(Residual::Item(item)))
    }
}

struct StatusResidual {
    pokemon: PokemonIdent,
}

#[async_trait]
impl UnorderedParser for StatusResidual {
    type Output = Residual;

    fn name(&self) -> &str {
        "status residual"
    }

    async fn parse(&mut self, ctx: &mut BattleContext) -> Result<Option<Residual>> {
        let status = match ctx.events.peek().await? {
            Some(Event {
                kind: EventKind::Damage { pokemon, .. },
                flags,
            }) if same_pokemon(pokemon, &self.pokemon) => flags
                .from_effect()
                .filter(|effect| effect.kind == EffectKind::Status)
                .map(|effect| effect.id()),
            _ => None,
        };
        let Some(status) = status else {
            return Ok(None);
        };

        events::apply(ctx).await?;
        Ok(Some(Residual::Status(status)))
    }
}

/// Other effects that share the phase, like weather or Leech Seed
struct Interlude;

#[async_trait]
impl UnorderedParser for Interlude {
    type Output = ();

    fn name(&self) -> &str {
        "residual interlude"
    }

    async fn parse(&mut self, ctx: &mut BattleContext) -> Result<Option<()>> {
        match ctx.events.peek().await? {
            Some(event) if !PHASE_END.contains(&event.tag()) => {}
            _ => return Ok(None),
        }
        if dispatch(ctx).await?.is_none() {
            ctx.events.next().await?;
        }
        Ok(Some(()))
    }
}

#[cfg(test)]
mod tests {
    use psai_protocol::{HpStatus, Player, PokemonDetails};

    use super::*;
    use crate::testing::TestBattle;

    fn ident(player: Player, name: &str) -> PokemonIdent {
        PokemonIdent::new(player, Some('a'), name)
    }

    fn battle_with(hp: [&str; 2]) -> TestBattle {
        let mut battle = TestBattle::new();
        for (player, name, hp) in [(Player::P1, "Skarmory", hp[0]), (Player::P2, "Snorlax", hp[1])] {
            battle.ctx.state.switch_in(
                &ident(player, name),
                &PokemonDetails::parse(name),
                HpStatus::parse(hp).as_ref(),
            );
        }
        battle
    }

    fn heal(pokemon: PokemonIdent, hp: &str) -> Event {
        Event::new(EventKind::Heal {
            pokemon,
            hp_status: HpStatus::parse(hp),
        })
        .with_flag("from", Some("item: Leftovers"))
    }

    fn poison(pokemon: PokemonIdent, hp: &str) -> Event {
        Event::new(EventKind::Damage {
            pokemon,
            hp_status: HpStatus::parse(hp),
        })
        .with_flag("from", Some("psn"))
    }

    fn can_hold_leftovers(battle: &TestBattle, pokemon: &PokemonIdent) -> Option<bool> {
        battle
            .ctx
            .state
            .pokemon(pokemon)
            .unwrap()
            .item
            .can_hold("leftovers")
    }

    #[test]
    fn test_is_residual() {
        let foe = ident(Player::P2, "Snorlax");
        assert!(is_residual(&heal(foe.clone(), "90/100")));
        assert!(is_residual(&poison(foe.clone(), "90/100")));
        assert!(!is_residual(&Event::new(EventKind::Damage {
            pokemon: foe.clone(),
            hp_status: HpStatus::parse("50/100"),
        })));
        assert!(!is_residual(
            &Event::new(EventKind::Damage {
                pokemon: foe,
                hp_status: HpStatus::parse("50/100"),
            })
            .with_flag("from", Some("item: Life Orb"))
        ));
    }

    #[tokio::test]
    async fn test_order_is_decided_by_events() {
        let mut battle = battle_with(["70/100", "50/100"]);
        let me = ident(Player::P1, "Skarmory");
        let foe = ident(Player::P2, "Snorlax");
        // The slower side's effects come first here
        battle.supply(vec![
            heal(foe.clone(), "56/100"),
            poison(foe.clone(), "44/100"),
            heal(me.clone(), "76/100"),
            Event::new(EventKind::Upkeep),
        ]);

        let results = residuals(&mut battle.ctx).await.unwrap();
        assert_eq!(
            results,
            vec![
                (
                    foe.clone(),
                    vec![
                        Residual::Item("leftovers".to_string()),
                        Residual::Status("psn".to_string())
                    ]
                ),
                (me.clone(), vec![Residual::Item("leftovers".to_string())]),
            ]
        );
        assert_eq!(can_hold_leftovers(&battle, &me), Some(true));
        assert_eq!(can_hold_leftovers(&battle, &foe), Some(true));
        assert_eq!(battle.ctx.state.pokemon(&foe).unwrap().hp_current, 44);
    }

    #[tokio::test]
    async fn test_hurt_pokemon_without_heal_has_no_leftovers() {
        let mut battle = battle_with(["100/100", "50/100"]);
        let me = ident(Player::P1, "Skarmory");
        let foe = ident(Player::P2, "Snorlax");
        battle.supply(vec![poison(me.clone(), "88/100"), Event::new(EventKind::Upkeep)]);

        let results = residuals(&mut battle.ctx).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(can_hold_leftovers(&battle, &foe), Some(false));
        // It was at full HP when Leftovers would have kicked in
        assert_eq!(can_hold_leftovers(&battle, &me), None);
    }

    #[tokio::test]
    async fn test_our_side_is_not_inferred() {
        let mut battle = battle_with(["70/100", "100/100"]);
        battle.ctx.state.set_perspective(Player::P1);
        let me = ident(Player::P1, "Skarmory");
        battle.supply(vec![heal(me.clone(), "76/100"), Event::new(EventKind::Upkeep)]);

        let results = residuals(&mut battle.ctx).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(battle.ctx.state.pokemon(&me).unwrap().hp_current, 76);
    }

    #[tokio::test]
    async fn test_interlude_events_keep_the_phase_going() {
        let mut battle = battle_with(["70/100", "50/100"]);
        let me = ident(Player::P1, "Skarmory");
        let foe = ident(Player::P2, "Snorlax");
        battle.supply(vec![
            heal(me.clone(), "76/100"),
            Event::new(EventKind::Damage {
                pokemon: me.clone(),
                hp_status: HpStatus::parse("64/100"),
            })
            .with_flag("from", Some("Leech Seed"))
            .with_flag("of", Some("p2a: Snorlax")),
            heal(foe.clone(), "56/100"),
            Event::new(EventKind::Upkeep),
        ]);

        let reasons_before = battle.ctx.reasons.len();
        let results = residuals(&mut battle.ctx).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(can_hold_leftovers(&battle, &foe), Some(true));
        // One Leftovers case per Pokemon (fact, snapshot, not, and), however
        // many passes it took
        assert_eq!(battle.ctx.reasons.len() - reasons_before, 8);
        assert_eq!(
            battle.ctx.events.peek().await.unwrap().map(Event::tag),
            Some(EventTag::Upkeep)
        );
    }
}
