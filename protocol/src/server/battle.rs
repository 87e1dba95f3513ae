//! Shared types for battle protocol messages

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Player in a battle (p1, p2, p3, p4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    P1,
    P2,
    P3,
    P4,
}

impl Player {
    pub fn parse(s: &str) -> Option<Self> {
        match s.get(..2)? {
            "p1" => Some(Player::P1),
            "p2" => Some(Player::P2),
            "p3" => Some(Player::P3),
            "p4" => Some(Player::P4),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Player::P1 => "p1",
            Player::P2 => "p2",
            Player::P3 => "p3",
            Player::P4 => "p4",
        }
    }

    /// The player across the field in a two-sided battle
    pub fn foe(&self) -> Self {
        match self {
            Player::P1 => Player::P2,
            Player::P2 => Player::P1,
            Player::P3 => Player::P4,
            Player::P4 => Player::P3,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pokemon identifier in the form "POSITION: NAME" (e.g., "p1a: Pikachu")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PokemonIdent {
    /// Player who owns this pokemon
    pub player: Player,
    /// Position letter (a, b, c for active slots, or None if inactive)
    pub position: Option<char>,
    /// Pokemon's name/nickname
    pub name: String,
}

impl PokemonIdent {
    pub fn new(player: Player, position: Option<char>, name: impl Into<String>) -> Self {
        Self {
            player,
            position,
            name: name.into(),
        }
    }

    /// Parse a pokemon ID string like "p1a: Pikachu" or "p1: Pikachu"
    pub fn parse(s: &str) -> Option<Self> {
        let (pos_part, name) = s.split_once(": ")?;
        let player = Player::parse(pos_part)?;
        let position = pos_part.chars().nth(2);

        Some(PokemonIdent {
            player,
            position,
            name: name.to_string(),
        })
    }

    /// Active slot index from the position letter ('a' => 0)
    pub fn slot(&self) -> usize {
        match self.position {
            Some('b') => 1,
            Some('c') => 2,
            _ => 0,
        }
    }
}

impl fmt::Display for PokemonIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "{}{}: {}", self.player, pos, self.name),
            None => write!(f, "{}: {}", self.player, self.name),
        }
    }
}

/// Pokemon details string (species, level, gender, shiny)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PokemonDetails {
    pub species: String,
    pub level: Option<u8>,
    pub gender: Option<char>,
    pub shiny: bool,
}

impl PokemonDetails {
    /// Parse a details string like "Pikachu, L50, M, shiny"
    pub fn parse(s: &str) -> Self {
        let mut details = PokemonDetails::default();
        let mut parts = s.split(", ");

        if let Some(species) = parts.next() {
            details.species = species.to_string();
        }

        for part in parts {
            if let Some(level_str) = part.strip_prefix('L') {
                details.level = level_str.parse().ok();
            } else if part == "M" {
                details.gender = Some('M');
            } else if part == "F" {
                details.gender = Some('F');
            } else if part == "shiny" {
                details.shiny = true;
            }
        }

        details
    }
}

/// HP and status condition (e.g., "100/100", "50/100 slp", "0 fnt")
#[derive(Debug, Clone, PartialEq)]
pub struct HpStatus {
    /// Current HP (as raw value or percentage depending on context)
    pub current: u32,
    /// Max HP (if known)
    pub max: Option<u32>,
    /// Status condition (slp, par, brn, psn, tox, frz, fnt)
    pub status: Option<String>,
}

impl HpStatus {
    /// Parse an HP status string like "100/100", "50/100 slp", or "0 fnt"
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split_whitespace();
        let hp_part = parts.next()?;
        let status = parts.next().map(|s| s.to_string());

        if let Some((current_str, max_str)) = hp_part.split_once('/') {
            Some(HpStatus {
                current: current_str.parse().ok()?,
                max: Some(max_str.parse().ok()?),
                status,
            })
        } else {
            Some(HpStatus {
                current: hp_part.parse().ok()?,
                max: None,
                status,
            })
        }
    }

    pub fn is_fainted(&self) -> bool {
        self.current == 0 || self.status.as_deref() == Some("fnt")
    }
}

/// Game type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Singles,
    Doubles,
    Triples,
    Multi,
    FreeForAll,
}

impl GameType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "singles" => Some(GameType::Singles),
            "doubles" => Some(GameType::Doubles),
            "triples" => Some(GameType::Triples),
            "multi" => Some(GameType::Multi),
            "freeforall" => Some(GameType::FreeForAll),
            _ => None,
        }
    }

    /// Number of active slots per side
    pub fn active_slots(&self) -> usize {
        match self {
            GameType::Singles | GameType::FreeForAll => 1,
            GameType::Doubles | GameType::Multi => 2,
            GameType::Triples => 3,
        }
    }
}

/// Stat abbreviation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    Atk,
    Def,
    Spa,
    Spd,
    Spe,
    Accuracy,
    Evasion,
}

impl Stat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "atk" => Some(Stat::Atk),
            "def" => Some(Stat::Def),
            "spa" => Some(Stat::Spa),
            "spd" => Some(Stat::Spd),
            "spe" => Some(Stat::Spe),
            "accuracy" => Some(Stat::Accuracy),
            "evasion" => Some(Stat::Evasion),
            _ => None,
        }
    }
}

/// The kind of effect named by a `[from]` flag or an effect argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Ability,
    Item,
    Move,
    Status,
    Other,
}

/// An effect string such as "item: Leftovers" or "ability: Intimidate"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effect {
    pub kind: EffectKind,
    pub name: String,
}

impl Effect {
    pub fn parse(s: &str) -> Self {
        let (kind, name) = match s.split_once(": ") {
            Some(("ability", name)) => (EffectKind::Ability, name),
            Some(("item", name)) => (EffectKind::Item, name),
            Some(("move", name)) => (EffectKind::Move, name),
            _ => match s {
                "brn" | "par" | "psn" | "tox" | "slp" | "frz" => (EffectKind::Status, s),
                _ => (EffectKind::Other, s),
            },
        };

        Effect {
            kind,
            name: name.to_string(),
        }
    }

    /// Lowercase alphanumeric form used for comparisons ("Black Sludge" => "blacksludge")
    pub fn id(&self) -> String {
        to_id(&self.name)
    }
}

/// Normalize a display name into a protocol id
pub fn to_id(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Helper to parse a PokemonIdent from message parts
pub fn parse_pokemon(parts: &[&str], index: usize) -> Result<PokemonIdent, anyhow::Error> {
    parts
        .get(index)
        .and_then(|s| PokemonIdent::parse(s))
        .ok_or_else(|| ParseError::MissingField("pokemon".to_string()).into())
}

/// Helper to parse PokemonDetails from message parts
pub fn parse_details(parts: &[&str], index: usize) -> PokemonDetails {
    parts
        .get(index)
        .map(|s| PokemonDetails::parse(s))
        .unwrap_or_default()
}

/// Helper to parse HpStatus from message parts
pub fn parse_hp_status(parts: &[&str], index: usize) -> Option<HpStatus> {
    parts.get(index).and_then(|s| HpStatus::parse(s))
}

/// Helper to read an owned string argument, empty if absent
pub fn parse_string(parts: &[&str], index: usize) -> String {
    parts.get(index).unwrap_or(&"").to_string()
}
