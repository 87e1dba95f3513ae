//! Switches and the abilities that announce themselves on entry

use anyhow::Result;
use async_trait::async_trait;
use psai_battle::Weather;
use psai_protocol::{EffectKind, Event, EventKind, EventTag, PokemonIdent, to_id};
use tracing::debug;

use super::events;
use super::facts::{HasAbility, WeatherLocked};
use super::same_pokemon;
use crate::context::BattleContext;
use crate::parser::{
    Acceptor, BoxParser, EventInference, InferenceParser, InferenceRoutine, SubInference, all,
    expect, peek_tag,
};

/// Abilities that always say something when their holder comes in, with the
/// weather they set. A weather ability stays quiet if its weather is locked
/// in (see [`psai_battle::FieldState::weather_locked`]).
const ANNOUNCED: [(&str, Option<Weather>); 7] = [
    ("intimidate", None),
    ("pressure", None),
    ("moldbreaker", None),
    ("drizzle", Some(Weather::Rain)),
    ("drought", Some(Weather::Sun)),
    ("sandstream", Some(Weather::Sand)),
    ("snowwarning", Some(Weather::Hail)),
];

/// What can follow an Intimidate announcement
const INTIMIDATE_AFTERMATH: [EventTag; 6] = [
    EventTag::Unboost,
    EventTag::Boost,
    EventTag::Fail,
    EventTag::Immune,
    EventTag::Activate,
    EventTag::EndItem,
];

/// A block of `|switch|`/`|drag|` events and the announcements they trigger
pub async fn switch_in(ctx: &mut BattleContext) -> Result<()> {
    let mut entered = Vec::new();
    while let Some(EventTag::Switch | EventTag::Drag) = peek_tag(ctx).await? {
        let event = expect(ctx, &[EventTag::Switch, EventTag::Drag]).await?;
        if let EventKind::Switch {
            pokemon,
            details,
            hp_status,
        }
        | EventKind::Drag {
            pokemon,
            details,
            hp_status,
        } = event.kind
        {
            debug!(%pokemon, species = %details.species, "switched in");
            ctx.state.switch_in(&pokemon, &details, hp_status.as_ref());
            entered.push(pokemon);
        }
    }

    let mut parsers: Vec<BoxParser<String>> = Vec::new();
    for pokemon in entered {
        if let Some(parser) = announcement_parser(ctx, pokemon) {
            parsers.push(Box::new(parser));
        }
    }
    if !parsers.is_empty() {
        let revealed = all(ctx, parsers, None).await?;
        debug!(?revealed, "switch-in announcements");
    }
    Ok(())
}

/// `None` if the Pokemon's ability is already settled
fn announcement_parser(
    ctx: &mut BattleContext,
    pokemon: PokemonIdent,
) -> Option<InferenceParser<AbilityAnnouncement>> {
    let poke = ctx.state.pokemon(&pokemon)?;
    if poke.ability.definite().is_some() || ctx.state.perspective() == Some(pokemon.player) {
        return None;
    }

    let candidates: Vec<_> = ANNOUNCED
        .iter()
        .filter(|(ability, _)| poke.ability.can_hold(ability) != Some(false))
        .copied()
        .collect();
    if candidates.is_empty() {
        return None;
    }

    let mut cases = Vec::new();
    for (ability, weather) in &candidates {
        let mut reasons = vec![ctx.reasons.fact(HasAbility {
            pokemon: pokemon.clone(),
            ability: ability.to_string(),
        })];
        if let Some(weather) = weather {
            let locked = ctx.reasons.fact(WeatherLocked(*weather));
            reasons.push(ctx.reasons.not(locked));
        }
        cases.push(SubInference::new(&mut ctx.reasons, reasons));
    }

    Some(InferenceParser::new(
        format!("ability announcement {pokemon}"),
        EventInference::new(cases),
        AbilityAnnouncement {
            pokemon,
            abilities: candidates.into_iter().map(|(a, _)| a).collect(),
        },
    ))
}

struct AbilityAnnouncement {
    pokemon: PokemonIdent,
    abilities: Vec<&'static str>,
}

impl AbilityAnnouncement {
    fn announced(&self, event: &Event) -> Option<String> {
        match &event.kind {
            EventKind::Ability { pokemon, ability }
                if same_pokemon(pokemon, &self.pokemon) && event.flags.from_effect().is_none() =>
            {
                Some(to_id(ability))
            }
            EventKind::Weather(_) if !event.flags.has("upkeep") => {
                let effect = event.flags.from_effect()?;
                let owner = event.flags.of()?;
                (effect.kind == EffectKind::Ability && same_pokemon(&owner, &self.pokemon))
                    .then(|| effect.id())
            }
            _ => None,
        }
    }
}

#[async_trait]
impl InferenceRoutine for AbilityAnnouncement {
    type Output = String;

    async fn run(
        &mut self,
        ctx: &mut BattleContext,
        accept: &mut Acceptor,
    ) -> Result<Option<String>> {
        let Some(ability) = ctx.events.peek().await?.and_then(|e| self.announced(e)) else {
            return Ok(None);
        };
        let Some(index) = self.abilities.iter().position(|a| *a == ability) else {
            return Ok(None);
        };

        accept.accept(ctx, index)?;
        events::apply(ctx).await?;
        if ability == "intimidate" {
            while let Some(tag) = peek_tag(ctx).await?
                && INTIMIDATE_AFTERMATH.contains(&tag)
            {
                events::apply(ctx).await?;
            }
        }
        Ok(Some(ability))
    }
}
