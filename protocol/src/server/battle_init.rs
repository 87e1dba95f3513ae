//! Battle initialization message parsers
//!
//! These messages are sent at the start of a battle to set up the game state.

use super::EventKind;
use super::battle::{GameType, Player, parse_details, parse_string};
use crate::ParseError;
use anyhow::Result;

fn parse_player_field(parts: &[&str]) -> Result<Player> {
    parts
        .get(2)
        .and_then(|s| Player::parse(s))
        .ok_or_else(|| ParseError::MissingField("player".to_string()).into())
}

/// Parse |player|PLAYER|USERNAME|AVATAR|RATING
pub fn parse_player(parts: &[&str]) -> Result<EventKind> {
    let player = parse_player_field(parts)?;
    let username = parse_string(parts, 3);

    Ok(EventKind::Player { player, username })
}

/// Parse |teamsize|PLAYER|NUMBER
pub fn parse_teamsize(parts: &[&str]) -> Result<EventKind> {
    let player = parse_player_field(parts)?;
    let size = parts
        .get(3)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ParseError::MissingField("team size".to_string()))?;

    Ok(EventKind::TeamSize { player, size })
}

/// Parse |gametype|GAMETYPE
pub fn parse_gametype(parts: &[&str]) -> Result<EventKind> {
    let game_type = parts
        .get(2)
        .and_then(|s| GameType::parse(s))
        .ok_or_else(|| ParseError::MissingField("game type".to_string()))?;

    Ok(EventKind::GameType(game_type))
}

/// Parse |gen|GENNUM
pub fn parse_generation(parts: &[&str]) -> Result<EventKind> {
    let generation = parts
        .get(2)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ParseError::MissingField("generation".to_string()))?;

    Ok(EventKind::Gen(generation))
}

/// Parse |tier|FORMATNAME
pub fn parse_tier(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Tier(parse_string(parts, 2)))
}

/// Parse |rule|RULE: DESCRIPTION
pub fn parse_rule(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Rule(parse_string(parts, 2)))
}

/// Parse |poke|PLAYER|DETAILS|ITEM
pub fn parse_poke(parts: &[&str]) -> Result<EventKind> {
    let player = parse_player_field(parts)?;
    let details = parse_details(parts, 3);

    Ok(EventKind::Poke { player, details })
}
