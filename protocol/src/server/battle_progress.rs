//! Battle progress message parsers
//!
//! These messages track the flow and state of a battle.

use super::EventKind;
use super::battle::parse_string;
use super::request::BattleRequest;
use crate::ParseError;
use anyhow::{Context, Result};

/// Parse |request|REQUEST (JSON)
///
/// The JSON payload may itself contain `|`, so everything after the tag is
/// rejoined. An empty payload is kept as `Request(None)`.
pub fn parse_request(parts: &[&str]) -> Result<EventKind> {
    let json_str = parts.get(2..).map(|rest| rest.join("|")).unwrap_or_default();
    if json_str.trim().is_empty() {
        return Ok(EventKind::Request(None));
    }

    let request: BattleRequest =
        serde_json::from_str(&json_str).context("Failed to parse request JSON")?;
    Ok(EventKind::Request(Some(Box::new(request))))
}

/// Parse |error|MESSAGE
pub fn parse_error(parts: &[&str]) -> Result<EventKind> {
    let message = parts.get(2..).map(|rest| rest.join("|")).unwrap_or_default();
    Ok(EventKind::Error(message))
}

/// Parse |turn|NUMBER
pub fn parse_turn(parts: &[&str]) -> Result<EventKind> {
    let turn = parts
        .get(2)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ParseError::MissingField("turn number".to_string()))?;

    Ok(EventKind::Turn(turn))
}

/// Parse |win|USER
pub fn parse_win(parts: &[&str]) -> Result<EventKind> {
    Ok(EventKind::Win(parse_string(parts, 2)))
}
