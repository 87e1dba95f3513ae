//! Minor battle action message parsers
//!
//! These are secondary effects in battle: damage, stat changes, status, etc.
//! In the official client, they're usually displayed in smaller font.

use super::EventKind;
use super::battle::{PokemonIdent, Stat, parse_hp_status, parse_pokemon, parse_string};
use crate::ParseError;
use anyhow::Result;

fn parse_stat_change(parts: &[&str]) -> Result<(PokemonIdent, Stat, i8)> {
    let pokemon = parse_pokemon(parts, 2)?;
    let stat = parts
        .get(3)
        .and_then(|s| Stat::parse(s))
        .ok_or_else(|| ParseError::MissingField("stat".to_string()))?;
    let amount = parts
        .get(4)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ParseError::MissingField("amount".to_string()))?;

    Ok((pokemon, stat, amount))
}

/// Parse |-fail|POKEMON|ACTION
pub fn parse_fail(parts: &[&str]) -> Result<EventKind> {
    let pokemon = parse_pokemon(parts, 2)?;
    let action = parts.get(3).map(|s| s.to_string());

    Ok(EventKind::Fail { pokemon, action })
}

/// Parse |-miss|SOURCE|TARGET
pub fn parse_miss(parts: &[&str]) -> Result<EventKind> {
    let source = parse_pokemon(parts, 2)?;
    let target = parts.get(3).and_then(|s| PokemonIdent::parse(s));

    Ok(EventKind::Miss { source, target })
}

/// Parse |-damage|POKEMON|HP STATUS
pub fn parse_damage(parts: &[&str]) -> Result<EventKind> {
    let pokemon = parse_pokemon(parts, 2)?;
    let hp_status = parse_hp_status(parts, 3);

    Ok(EventKind::Damage { pokemon, hp_status })
}

/// Parse |-heal|POKEMON|HP STATUS
pub fn parse_heal(parts: &[&str]) -> Result<EventKind> {
    let pokemon = parse_pokemon(parts, 2)?;
    let hp_status = parse_hp_status(parts, 3);

    Ok(EventKind::Heal { pokemon, hp_status })
}

/// Parse |-status|POKEMON|STATUS
pub fn parse_status(parts: &[&str]) -> Result<EventKind> {
    let pokemon = parse_pokemon(parts, 2)?;
    let status = parse_string(parts, 3);

    Ok(EventKind::Status { pokemon, status })
}

/// Parse |-curestatus|POKEMON|STATUS
pub fn parse_curestatus(parts: &[&str]) -> Result<EventKind> {
    let pokemon = parse_pokemon(parts, 2)?;
    let status = parse_string(parts, 3);

    Ok(EventKind::CureStatus { pokemon, status })
}

/// Parse |-boost|POKEMON|STAT|AMOUNT
pub fn parse_boost(parts: &[&str]) -> Result<EventKind> {
    let (pokemon, stat, amount) = parse_stat_change(parts)?;
    Ok(EventKind::Boost {
        pokemon,
        stat,
        amount,
    })
}

/// Parse |-unboost|POKEMON|STAT|AMOUNT
pub fn parse_unboost(parts: &[&str]) -> Result<EventKind> {
    let (pokemon, stat, amount) = parse_stat_change(parts)?;
    Ok(EventKind::Unboost {
        pokemon,
        stat,
        amount,
    })
}

/// Parse |-clearboost|POKEMON
pub fn parse_clearboost(parts: &[&str]) -> Result<EventKind> {
    let pokemon = parse_pokemon(parts, 2)?;
    Ok(EventKind::ClearBoost(pokemon))
}

/// Parse |-weather|WEATHER
pub fn parse_weather(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Weather(parse_string(parts, 2)))
}

/// Parse |-start|POKEMON|EFFECT
pub fn parse_volatile_start(parts: &[&str]) -> Result<EventKind> {
    let pokemon = parse_pokemon(parts, 2)?;
    let effect = parse_string(parts, 3);

    Ok(EventKind::VolatileStart { pokemon, effect })
}

/// Parse |-end|POKEMON|EFFECT
pub fn parse_volatile_end(parts: &[&str]) -> Result<EventKind> {
    let pokemon = parse_pokemon(parts, 2)?;
    let effect = parse_string(parts, 3);

    Ok(EventKind::VolatileEnd { pokemon, effect })
}

/// Parse |-crit|POKEMON
pub fn parse_crit(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Crit(parse_pokemon(parts, 2)?))
}

/// Parse |-supereffective|POKEMON
pub fn parse_supereffective(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::SuperEffective(parse_pokemon(parts, 2)?))
}

/// Parse |-resisted|POKEMON
pub fn parse_resisted(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Resisted(parse_pokemon(parts, 2)?))
}

/// Parse |-immune|POKEMON
pub fn parse_immune(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Immune(parse_pokemon(parts, 2)?))
}

/// Parse |-item|POKEMON|ITEM
pub fn parse_item(parts: &[&str]) -> Result<EventKind> {
    let pokemon = parse_pokemon(parts, 2)?;
    let item = parse_string(parts, 3);

    Ok(EventKind::Item { pokemon, item })
}

/// Parse |-enditem|POKEMON|ITEM
pub fn parse_enditem(parts: &[&str]) -> Result<EventKind> {
    let pokemon = parse_pokemon(parts, 2)?;
    let item = parse_string(parts, 3);

    Ok(EventKind::EndItem { pokemon, item })
}

/// Parse |-ability|POKEMON|ABILITY
pub fn parse_ability(parts: &[&str]) -> Result<EventKind> {
    let pokemon = parse_pokemon(parts, 2)?;
    let ability = parse_string(parts, 3);

    Ok(EventKind::Ability { pokemon, ability })
}

/// Parse |-endability|POKEMON
pub fn parse_endability(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::EndAbility(parse_pokemon(parts, 2)?))
}

/// Parse |-activate|POKEMON|EFFECT
///
/// The pokemon slot may be empty for field-wide activations.
pub fn parse_activate(parts: &[&str]) -> Result<EventKind> {
    let pokemon = parts.get(2).and_then(|s| PokemonIdent::parse(s));
    let effect = parse_string(parts, 3);

    Ok(EventKind::Activate { pokemon, effect })
}

/// Parse |-prepare|POKEMON|MOVE
pub fn parse_prepare(parts: &[&str]) -> Result<EventKind> {
    let pokemon = parse_pokemon(parts, 2)?;
    let move_name = parse_string(parts, 3);

    Ok(EventKind::Prepare { pokemon, move_name })
}

/// Parse |-mustrecharge|POKEMON
pub fn parse_mustrecharge(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::MustRecharge(parse_pokemon(parts, 2)?))
}
