//! Pokemon state types

use std::collections::{BTreeSet, HashSet};

use psai_protocol::{HpStatus, PokemonDetails, to_id};

use super::possibility::Possibilities;
use super::stats::StatStages;
use super::status::{Status, Volatile};

/// Core Pokemon identity (doesn't change during battle)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PokemonIdentity {
    /// Species name (including forme, e.g., "Pikachu-Alola")
    pub species: String,

    /// Nickname (if different from species)
    pub nickname: Option<String>,

    /// Level (1-100)
    pub level: u8,

    /// Gender ('M', 'F', or None for genderless)
    pub gender: Option<char>,
}

impl PokemonIdentity {
    /// Create from protocol details and the name shown in identifiers
    pub fn from_details(details: &PokemonDetails, name: &str) -> Self {
        Self {
            species: details.species.clone(),
            nickname: (name != details.species).then(|| name.to_string()),
            level: details.level.unwrap_or(100),
            gender: details.gender,
        }
    }

    /// Get the display name (nickname if set, otherwise species)
    pub fn name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.species)
    }
}

/// Pokemon state during battle
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PokemonState {
    pub identity: PokemonIdentity,

    /// Current HP (percentage for opponent, exact value for our Pokemon)
    pub hp_current: u32,

    /// Maximum HP (100 for the opponent's percentage display)
    pub hp_max: u32,

    pub status: Option<Status>,
    pub fainted: bool,
    pub active: bool,

    // cleared on switch
    pub boosts: StatStages,
    pub volatiles: HashSet<Volatile>,

    /// Moves that have been revealed
    pub known_moves: Vec<String>,

    /// Moves the server refused because they turned out to be disabled
    pub disabled_moves: BTreeSet<String>,

    /// What the ability could still be
    pub ability: Possibilities,

    /// What the held item could still be
    pub item: Possibilities,

    /// Whether the item has been used up or knocked off
    pub item_consumed: bool,
}

impl PokemonState {
    /// A Pokemon whose ability and item are still hidden
    pub fn new(identity: PokemonIdentity) -> Self {
        Self {
            identity,
            hp_current: 100,
            hp_max: 100,
            status: None,
            fainted: false,
            active: false,
            boosts: StatStages::new(),
            volatiles: HashSet::new(),
            known_moves: Vec::new(),
            disabled_moves: BTreeSet::new(),
            ability: Possibilities::open(),
            item: Possibilities::open(),
            item_consumed: false,
        }
    }

    /// Get HP as percentage (0-100)
    pub fn hp_percent(&self) -> u32 {
        if self.hp_max == 0 {
            return 0;
        }
        (self.hp_current * 100) / self.hp_max
    }

    pub fn is_full_hp(&self) -> bool {
        self.hp_current >= self.hp_max
    }

    pub fn name(&self) -> &str {
        self.identity.name()
    }

    pub fn has_volatile(&self, v: &Volatile) -> bool {
        self.volatiles.contains(v)
    }

    /// Record a revealed move
    pub fn record_move(&mut self, move_name: &str) {
        let id = to_id(move_name);
        if !self.known_moves.contains(&id) {
            self.known_moves.push(id);
        }
    }

    /// Apply HP and status from protocol HpStatus
    pub fn apply_hp_status(&mut self, hp_status: &HpStatus) {
        self.hp_current = hp_status.current;
        if let Some(max) = hp_status.max {
            self.hp_max = max;
        }

        match hp_status.status.as_deref() {
            Some("fnt") => {
                self.fainted = true;
                self.status = None;
            }
            Some(status) => self.status = Status::from_protocol(status),
            // A bare HP value doesn't clear an existing status
            None => {}
        }
        if hp_status.is_fainted() {
            self.fainted = true;
        }
    }

    /// Called when this Pokemon switches out
    pub fn on_switch_out(&mut self) {
        self.active = false;
        self.boosts.clear();
        self.volatiles.clear();
    }

    /// Check if Pokemon is alive (not fainted)
    pub fn is_alive(&self) -> bool {
        !self.fainted && self.hp_current > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pikachu() -> PokemonState {
        PokemonState::new(PokemonIdentity::from_details(
            &PokemonDetails::parse("Pikachu, L50, M"),
            "Sparky",
        ))
    }

    #[test]
    fn test_identity_from_details() {
        let poke = pikachu();
        assert_eq!(poke.identity.species, "Pikachu");
        assert_eq!(poke.identity.level, 50);
        assert_eq!(poke.name(), "Sparky");

        let plain = PokemonIdentity::from_details(&PokemonDetails::parse("Onix"), "Onix");
        assert!(plain.nickname.is_none());
        assert_eq!(plain.level, 100);
    }

    #[test]
    fn test_hp_percent() {
        let mut poke = pikachu();
        assert!(poke.is_full_hp());

        poke.apply_hp_status(&HpStatus::parse("150/200").unwrap());
        assert_eq!(poke.hp_percent(), 75);
        assert!(!poke.is_full_hp());
    }

    #[test]
    fn test_apply_status() {
        let mut poke = pikachu();
        poke.apply_hp_status(&HpStatus::parse("40/100 brn").unwrap());
        assert_eq!(poke.status, Some(Status::Burn));

        // Status persists through plain HP updates
        poke.apply_hp_status(&HpStatus::parse("30/100").unwrap());
        assert_eq!(poke.status, Some(Status::Burn));

        poke.apply_hp_status(&HpStatus::parse("0 fnt").unwrap());
        assert!(poke.fainted);
        assert!(!poke.is_alive());
        assert_eq!(poke.status, None);
    }

    #[test]
    fn test_switch_out_clears_volatiles() {
        let mut poke = pikachu();
        poke.active = true;
        poke.boosts.boost(psai_protocol::Stat::Spe, 1);
        poke.volatiles.insert(Volatile::Confusion);

        poke.on_switch_out();
        assert!(!poke.active);
        assert!(poke.boosts.is_clear());
        assert!(!poke.has_volatile(&Volatile::Confusion));
    }

    #[test]
    fn test_record_move_dedups() {
        let mut poke = pikachu();
        poke.record_move("Thunderbolt");
        poke.record_move("thunderbolt");
        assert_eq!(poke.known_moves, vec!["thunderbolt"]);
    }
}
