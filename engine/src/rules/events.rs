//! Events whose effect on the battle state needs no inference

use anyhow::Result;
use psai_battle::StateError;
use psai_protocol::{Effect, EffectKind, Event, EventKind, PokemonIdent};
use tracing::{trace, warn};

use crate::context::BattleContext;

/// Consume the head event, apply it to the battle state and settle any
/// reasons it decides
pub async fn apply(ctx: &mut BattleContext) -> Result<()> {
    let Some(Event { kind, flags }) = ctx.events.next().await? else {
        return Ok(());
    };
    let source = flags.from_effect();
    let state = &mut ctx.state;

    match kind {
        EventKind::Move {
            pokemon, move_name, ..
        } => {
            // Moves called through another effect aren't part of the moveset
            if source.is_none() {
                state.record_move(&pokemon, &move_name)?;
            }
            state.end_volatile(&pokemon, "mustrecharge")?;
        }
        EventKind::DetailsChange { pokemon, details } => {
            if let Some(poke) = state.pokemon_mut(&pokemon) {
                poke.identity.species = details.species;
            }
        }
        EventKind::Cant { pokemon, reason, .. } => {
            reveal(state, &pokemon, &Effect::parse(&reason));
        }
        EventKind::Faint(pokemon) => state.faint(&pokemon)?,
        EventKind::Damage { pokemon, hp_status } | EventKind::Heal { pokemon, hp_status } => {
            if let Some(hp) = &hp_status {
                state.apply_hp(&pokemon, hp)?;
            }
            if let Some(effect) = &source {
                reveal(state, flags.of().as_ref().unwrap_or(&pokemon), effect);
            }
        }
        EventKind::Status { pokemon, status } => state.set_status(&pokemon, &status)?,
        EventKind::CureStatus { pokemon, .. } => state.cure_status(&pokemon)?,
        EventKind::Boost {
            pokemon,
            stat,
            amount,
        } => {
            state.boost(&pokemon, stat, amount)?;
        }
        EventKind::Unboost {
            pokemon,
            stat,
            amount,
        } => {
            state.unboost(&pokemon, stat, amount)?;
        }
        EventKind::ClearAllBoost => state.clear_all_boosts(),
        EventKind::ClearBoost(pokemon) => state.clear_boosts(&pokemon)?,
        EventKind::Weather(weather) => {
            let from_ability = source.as_ref().is_some_and(|e| e.kind == EffectKind::Ability);
            state.set_weather(&weather, flags.has("upkeep"), from_ability);
            if let (Some(effect), Some(owner)) = (&source, flags.of()) {
                reveal(state, &owner, effect);
            }
        }
        EventKind::VolatileStart { pokemon, effect } => state.start_volatile(&pokemon, &effect)?,
        EventKind::VolatileEnd { pokemon, effect } => state.end_volatile(&pokemon, &effect)?,
        EventKind::Item { pokemon, item } => tolerate(state.reveal_item(&pokemon, &item)),
        EventKind::EndItem { pokemon, item } => tolerate(state.consume_item(&pokemon, &item)),
        EventKind::Ability { pokemon, ability } => match &source {
            // Trace and friends: the announced ability was copied
            Some(effect) if effect.kind == EffectKind::Ability => reveal(state, &pokemon, effect),
            _ => tolerate(state.reveal_ability(&pokemon, &ability)),
        },
        EventKind::Activate {
            pokemon: Some(pokemon),
            effect,
        } => reveal(state, &pokemon, &Effect::parse(&effect)),
        EventKind::Prepare { pokemon, move_name } => state.record_move(&pokemon, &move_name)?,
        EventKind::MustRecharge(pokemon) => state.start_volatile(&pokemon, "mustrecharge")?,
        EventKind::Fail { pokemon, .. }
        | EventKind::Crit(pokemon)
        | EventKind::SuperEffective(pokemon)
        | EventKind::Resisted(pokemon)
        | EventKind::Immune(pokemon) => {
            if let Some(effect) = &source {
                reveal(state, flags.of().as_ref().unwrap_or(&pokemon), effect);
            }
        }
        kind => trace!(tag = %kind.tag(), "event has no state effect"),
    }
    // Pending claims may hinge on what was just learned
    ctx.settle()
}

/// Record an ability or item shown as the source of an effect
fn reveal(state: &mut psai_battle::BattleState, owner: &PokemonIdent, effect: &Effect) {
    match effect.kind {
        EffectKind::Ability => tolerate(state.reveal_ability(owner, &effect.name)),
        EffectKind::Item => tolerate(state.reveal_item(owner, &effect.name)),
        _ => {}
    }
}

/// Shown information overrides a stale deduction
fn tolerate(result: Result<(), StateError>) {
    match result {
        Ok(()) => {}
        Err(err @ StateError::Conflict { .. }) => warn!(%err, "revealed information contradicts tracked state"),
        Err(err) => trace!(%err, "reveal for untracked pokemon"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use psai_battle::{BattleState, Possibilities, Status};
    use psai_protocol::{HpStatus, Player, PokemonDetails};

    use super::*;
    use crate::parser::{ReasonError, Verdict};
    use crate::rules::facts::HasAbility;
    use crate::testing::TestBattle;

    fn foe() -> PokemonIdent {
        PokemonIdent::new(Player::P2, Some('a'), "Snorlax")
    }

    async fn run(battle: &mut TestBattle, events: Vec<Event>) {
        battle.supply(events);
        while battle.ctx.events.peek().await.unwrap().is_some() {
            apply(&mut battle.ctx).await.unwrap();
        }
    }

    fn with_foe() -> TestBattle {
        let mut battle = TestBattle::new();
        battle.ctx.state.switch_in(
            &foe(),
            &PokemonDetails::parse("Snorlax, L50"),
            HpStatus::parse("100/100").as_ref(),
        );
        battle
    }

    #[tokio::test]
    async fn test_damage_from_item_reveals_attacker_item() {
        let mut battle = with_foe();
        let me = PokemonIdent::new(Player::P1, Some('a'), "Skarmory");
        battle.ctx.state.switch_in(
            &me,
            &PokemonDetails::parse("Skarmory, L50"),
            HpStatus::parse("100/100").as_ref(),
        );

        run(
            &mut battle,
            vec![
                Event::new(EventKind::Damage {
                    pokemon: me.clone(),
                    hp_status: HpStatus::parse("88/100"),
                })
                .with_flag("from", Some("item: Rocky Helmet"))
                .with_flag("of", Some("p2a: Snorlax")),
            ],
        )
        .await;

        let state = &battle.ctx.state;
        assert_eq!(state.pokemon(&me).unwrap().hp_current, 88);
        assert_eq!(
            state.pokemon(&foe()).unwrap().item,
            Possibilities::known("rockyhelmet")
        );
    }

    #[tokio::test]
    async fn test_status_and_move_tracking() {
        let mut battle = with_foe();
        run(
            &mut battle,
            vec![
                Event::new(EventKind::Move {
                    pokemon: foe(),
                    move_name: "Body Slam".to_string(),
                    target: None,
                }),
                Event::new(EventKind::Move {
                    pokemon: foe(),
                    move_name: "Tackle".to_string(),
                    target: None,
                })
                .with_flag("from", Some("move: Sleep Talk")),
                Event::new(EventKind::Status {
                    pokemon: foe(),
                    status: "tox".to_string(),
                }),
            ],
        )
        .await;

        let snorlax = battle.ctx.state.pokemon(&foe()).unwrap();
        assert_eq!(snorlax.known_moves, vec!["bodyslam".to_string()]);
        assert_eq!(snorlax.status, Some(Status::BadPoison));
    }

    #[tokio::test]
    async fn test_contradicting_reveal_is_not_fatal() {
        let mut battle = with_foe();
        battle
            .ctx
            .state
            .rule_out_item(&foe(), "Leftovers")
            .unwrap();

        run(
            &mut battle,
            vec![Event::new(EventKind::Item {
                pokemon: foe(),
                item: "Leftovers".to_string(),
            })],
        )
        .await;
        assert_eq!(battle.ctx.events.consumed(), 1);
    }

    #[tokio::test]
    async fn test_faint_clears_the_slot() {
        let mut battle = with_foe();
        run(&mut battle, vec![Event::new(EventKind::Faint(foe()))]).await;

        let state = &battle.ctx.state;
        assert!(state.pokemon(&foe()).unwrap().fainted);
        assert!(state.active(Player::P2).is_none());
    }

    /// `or` over the foe's possible abilities, claimed to hold
    fn claim_one_of(battle: &mut TestBattle, abilities: &[&str]) -> crate::parser::ReasonId {
        let facts = abilities
            .iter()
            .map(|ability| {
                battle.ctx.reasons.fact(HasAbility {
                    pokemon: foe(),
                    ability: ability.to_string(),
                })
            })
            .collect();
        let any = battle.ctx.reasons.or(facts);
        battle.ctx.assert(any).unwrap();
        any
    }

    #[tokio::test]
    async fn test_reveal_settles_pending_claim() {
        let mut battle = with_foe();
        let any = claim_one_of(&mut battle, &["thickfat", "immunity"]);
        let settled = Arc::new(Mutex::new(None));
        let callback_settled = settled.clone();
        let handle = battle
            .ctx
            .reasons
            .delay(
                any,
                &mut battle.ctx.state,
                Box::new(move |held: bool, _: &mut BattleState| {
                    *callback_settled.lock().unwrap() = Some(held);
                    Ok(())
                }),
            )
            .unwrap();
        assert!(handle.is_some());

        run(
            &mut battle,
            vec![Event::new(EventKind::Ability {
                pokemon: foe(),
                ability: "Thick Fat".to_string(),
            })],
        )
        .await;

        assert_eq!(*settled.lock().unwrap(), Some(true));
        assert_eq!(battle.ctx.verdict(any), Verdict::Held);
    }

    #[tokio::test]
    async fn test_reveal_contradicting_claim_fails_right_away() {
        let mut battle = with_foe();
        claim_one_of(&mut battle, &["thickfat", "immunity"]);
        battle.supply(vec![Event::new(EventKind::Ability {
            pokemon: foe(),
            ability: "Gluttony".to_string(),
        })]);

        let err = apply(&mut battle.ctx).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReasonError>(),
            Some(ReasonError::AssertRejected(_))
        ));
    }
}
