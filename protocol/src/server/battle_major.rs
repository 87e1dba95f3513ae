//! Major battle action message parsers
//!
//! These are the primary actions in battle: moves, switches, faints, etc.

use super::EventKind;
use super::battle::{PokemonIdent, parse_details, parse_hp_status, parse_pokemon, parse_string};
use anyhow::Result;

/// Parse |move|POKEMON|MOVE|TARGET
pub fn parse_move(parts: &[&str]) -> Result<EventKind> {
    let pokemon = parse_pokemon(parts, 2)?;
    let move_name = parse_string(parts, 3);
    let target = parts.get(4).and_then(|s| PokemonIdent::parse(s));

    Ok(EventKind::Move {
        pokemon,
        move_name,
        target,
    })
}

/// Parse |switch|POKEMON|DETAILS|HP STATUS
pub fn parse_switch(parts: &[&str]) -> Result<EventKind> {
    let pokemon = parse_pokemon(parts, 2)?;
    let details = parse_details(parts, 3);
    let hp_status = parse_hp_status(parts, 4);

    Ok(EventKind::Switch {
        pokemon,
        details,
        hp_status,
    })
}

/// Parse |drag|POKEMON|DETAILS|HP STATUS
pub fn parse_drag(parts: &[&str]) -> Result<EventKind> {
    let pokemon = parse_pokemon(parts, 2)?;
    let details = parse_details(parts, 3);
    let hp_status = parse_hp_status(parts, 4);

    Ok(EventKind::Drag {
        pokemon,
        details,
        hp_status,
    })
}

/// Parse |detailschange|POKEMON|DETAILS|HP STATUS
pub fn parse_detailschange(parts: &[&str]) -> Result<EventKind> {
    let pokemon = parse_pokemon(parts, 2)?;
    let details = parse_details(parts, 3);

    Ok(EventKind::DetailsChange { pokemon, details })
}

/// Parse |cant|POKEMON|REASON or |cant|POKEMON|REASON|MOVE
pub fn parse_cant(parts: &[&str]) -> Result<EventKind> {
    let pokemon = parse_pokemon(parts, 2)?;
    let reason = parse_string(parts, 3);
    let move_name = parts.get(4).map(|s| s.to_string());

    Ok(EventKind::Cant {
        pokemon,
        reason,
        move_name,
    })
}

/// Parse |faint|POKEMON
pub fn parse_faint(parts: &[&str]) -> Result<EventKind> {
    let pokemon = parse_pokemon(parts, 2)?;
    Ok(EventKind::Faint(pokemon))
}
