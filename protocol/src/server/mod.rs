pub mod battle;
mod battle_init;
mod battle_major;
mod battle_minor;
mod battle_progress;
mod event;
pub mod request;
mod tests;

pub use event::{Event, EventKind, EventTag, Flags};

use anyhow::Result;

/// Parse a complete protocol chunk into events
///
/// A leading `>ROOMID` line is skipped; blank lines and lines that are not
/// `|tag|...` messages are dropped.
pub fn parse_block(block: &str) -> Result<Vec<Event>> {
    let mut lines = block.lines().peekable();

    if let Some(first_line) = lines.peek()
        && first_line.starts_with('>')
    {
        lines.next();
    }

    let mut events = Vec::new();
    for line in lines {
        if let Some(event) = parse_event(line)? {
            events.push(event);
        }
    }
    Ok(events)
}

/// Extract the `>ROOMID` header of a chunk, if present
pub fn block_room_id(block: &str) -> Option<&str> {
    block.lines().next()?.strip_prefix('>')
}

/// Parse a single protocol line into an Event
///
/// Returns `Ok(None)` for blank lines and raw text.
pub fn parse_event(line: &str) -> Result<Option<Event>> {
    let line = line.trim_end_matches(['\r', '\n']);

    if !line.starts_with('|') {
        return Ok(None);
    }

    let parts: Vec<&str> = line.split('|').collect();
    let Some(tag) = parts.get(1) else {
        return Ok(None);
    };
    if tag.is_empty() && parts.len() <= 2 {
        return Ok(None);
    }

    // Requests and errors carry free text, never trailing flags
    if matches!(*tag, "request" | "error") {
        let kind = match *tag {
            "request" => battle_progress::parse_request(&parts)?,
            _ => battle_progress::parse_error(&parts)?,
        };
        return Ok(Some(Event::new(kind)));
    }

    // Only battle actions carry `[flag]` suffixes; `|tier|[Gen 3] OU` doesn't
    let takes_flags = tag.starts_with('-')
        || matches!(*tag, "move" | "switch" | "drag" | "detailschange" | "cant" | "faint");

    let mut flags = Flags::default();
    let mut positional = Vec::with_capacity(parts.len());
    for (i, part) in parts.iter().enumerate() {
        if i >= 2
            && takes_flags
            && let Some((name, value)) = Flags::parse_flag(part)
        {
            flags.insert(&name, value.as_deref());
            continue;
        }
        positional.push(*part);
    }

    let kind = parse_kind(tag, &positional)?;
    Ok(Some(Event { kind, flags }))
}

fn parse_kind(tag: &str, parts: &[&str]) -> Result<EventKind> {
    match tag {
        "player" => battle_init::parse_player(parts),
        "teamsize" => battle_init::parse_teamsize(parts),
        "gametype" => battle_init::parse_gametype(parts),
        "gen" => battle_init::parse_generation(parts),
        "tier" => battle_init::parse_tier(parts),
        "rule" => battle_init::parse_rule(parts),
        "clearpoke" => Ok(EventKind::ClearPoke),
        "poke" => battle_init::parse_poke(parts),
        "teampreview" => Ok(EventKind::TeamPreview),
        "start" => Ok(EventKind::Start),

        "turn" => battle_progress::parse_turn(parts),
        "upkeep" => Ok(EventKind::Upkeep),
        "win" => battle_progress::parse_win(parts),
        "tie" => Ok(EventKind::Tie),

        "move" => battle_major::parse_move(parts),
        "switch" => battle_major::parse_switch(parts),
        "drag" => battle_major::parse_drag(parts),
        "detailschange" => battle_major::parse_detailschange(parts),
        "cant" => battle_major::parse_cant(parts),
        "faint" => battle_major::parse_faint(parts),

        "-fail" => battle_minor::parse_fail(parts),
        "-miss" => battle_minor::parse_miss(parts),
        "-damage" => battle_minor::parse_damage(parts),
        "-heal" => battle_minor::parse_heal(parts),
        "-status" => battle_minor::parse_status(parts),
        "-curestatus" => battle_minor::parse_curestatus(parts),
        "-boost" => battle_minor::parse_boost(parts),
        "-unboost" => battle_minor::parse_unboost(parts),
        "-clearallboost" => Ok(EventKind::ClearAllBoost),
        "-clearboost" => battle_minor::parse_clearboost(parts),
        "-weather" => battle_minor::parse_weather(parts),
        "-start" => battle_minor::parse_volatile_start(parts),
        "-end" => battle_minor::parse_volatile_end(parts),
        "-crit" => battle_minor::parse_crit(parts),
        "-supereffective" => battle_minor::parse_supereffective(parts),
        "-resisted" => battle_minor::parse_resisted(parts),
        "-immune" => battle_minor::parse_immune(parts),
        "-item" => battle_minor::parse_item(parts),
        "-enditem" => battle_minor::parse_enditem(parts),
        "-ability" => battle_minor::parse_ability(parts),
        "-endability" => battle_minor::parse_endability(parts),
        "-activate" => battle_minor::parse_activate(parts),
        "-prepare" => battle_minor::parse_prepare(parts),
        "-mustrecharge" => battle_minor::parse_mustrecharge(parts),

        _ => Ok(EventKind::Other {
            tag: tag.to_string(),
            args: parts.iter().skip(2).map(|s| s.to_string()).collect(),
        }),
    }
}
