//! Battle request types
//!
//! These types represent the JSON structure of |request| messages.

use serde::Deserialize;

use super::battle::{HpStatus, Player};
use crate::client::Choice;

/// A battle request asking the player to make a decision
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleRequest {
    /// Request ID for synchronization
    pub rqid: Option<u64>,

    /// Active pokemon and their available moves
    #[serde(default)]
    pub active: Option<Vec<ActivePokemon>>,

    /// Information about the player's side/team
    pub side: Option<SideInfo>,

    /// Which slots need to switch (for doubles/triples)
    #[serde(default)]
    pub force_switch: Option<Vec<bool>>,

    /// Whether this is team preview
    #[serde(default)]
    pub team_preview: bool,

    /// Whether we're waiting for opponent
    #[serde(default)]
    pub wait: bool,

    /// Whether the choice can no longer be cancelled
    #[serde(default)]
    pub no_cancel: bool,
}

impl BattleRequest {
    /// Check if this request requires a decision
    pub fn needs_decision(&self) -> bool {
        !self.wait && (self.team_preview || self.force_switch.is_some() || self.active.is_some())
    }

    /// Check if this is a force switch request
    pub fn is_force_switch(&self) -> bool {
        self.force_switch
            .as_ref()
            .map(|fs| fs.iter().any(|&b| b))
            .unwrap_or(false)
    }

    /// First active pokemon (singles)
    pub fn first_active(&self) -> Option<&ActivePokemon> {
        self.active.as_ref().and_then(|a| a.first())
    }

    /// Whether our active pokemon is known to be trapped
    pub fn is_trapped(&self) -> bool {
        self.first_active().map(|a| a.trapped).unwrap_or(false)
    }

    /// Get available pokemon to switch to, with their 1-based team slot
    pub fn available_switches(&self) -> Vec<(usize, &SidePokemon)> {
        self.side
            .as_ref()
            .map(|s| {
                s.pokemon
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| !p.active && !p.is_fainted())
                    .map(|(i, p)| (i + 1, p))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every choice the server would accept for this request, as far as the
    /// request itself reveals.
    ///
    /// `maybe_trapped` does not hide switches: whether a switch is legal is
    /// only revealed by the server rejecting it.
    pub fn legal_choices(&self) -> Vec<Choice> {
        if !self.needs_decision() || self.team_preview {
            return Vec::new();
        }

        let mut choices = Vec::new();
        let force_switch = self.is_force_switch();

        if !force_switch && let Some(active) = self.first_active() {
            for (i, _) in active.available_moves() {
                choices.push(Choice::Move(i as u8 + 1));
            }
            // Struggle is offered as the lone first slot
            if choices.is_empty() && !active.moves.is_empty() {
                choices.push(Choice::Move(1));
            }
        }

        if force_switch || !self.is_trapped() {
            for (slot, _) in self.available_switches() {
                choices.push(Choice::Switch(slot as u8));
            }
        }

        choices
    }
}

/// Information about an active pokemon in battle
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivePokemon {
    /// Available moves
    #[serde(default)]
    pub moves: Vec<MoveSlot>,

    /// Whether the pokemon is trapped
    #[serde(default)]
    pub trapped: bool,

    /// Whether the pokemon might be trapped
    #[serde(default)]
    pub maybe_trapped: bool,
}

impl ActivePokemon {
    /// Get available (non-disabled, with PP) moves
    pub fn available_moves(&self) -> Vec<(usize, &MoveSlot)> {
        self.moves
            .iter()
            .enumerate()
            .filter(|(_, m)| !m.disabled && m.pp.is_none_or(|pp| pp > 0))
            .collect()
    }
}

/// A move slot on an active pokemon
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveSlot {
    /// Display name of the move
    #[serde(rename = "move")]
    pub name: String,

    /// Move ID (lowercase, no spaces)
    pub id: String,

    /// Current PP (absent for Struggle and locked moves)
    #[serde(default)]
    pub pp: Option<u32>,

    /// Maximum PP
    #[serde(default, rename = "maxpp")]
    pub max_pp: Option<u32>,

    /// Target type (normal, self, allySide, etc.)
    #[serde(default)]
    pub target: String,

    /// Whether the move is disabled
    #[serde(default)]
    pub disabled: bool,
}

/// Information about the player's side
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideInfo {
    /// Player's display name
    pub name: String,

    /// Player ID (p1, p2, etc.)
    pub id: String,

    /// Pokemon on this side
    #[serde(default)]
    pub pokemon: Vec<SidePokemon>,
}

impl SideInfo {
    /// Get the player enum
    pub fn player(&self) -> Option<Player> {
        Player::parse(&self.id)
    }
}

/// A pokemon on the player's side
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidePokemon {
    /// Pokemon identifier (e.g., "p1: Pikachu")
    pub ident: String,

    /// Details string (species, level, gender, shiny)
    pub details: String,

    /// Current condition (HP/MaxHP status)
    pub condition: String,

    /// Whether this pokemon is currently active
    #[serde(default)]
    pub active: bool,

    /// Known moves
    #[serde(default)]
    pub moves: Vec<String>,

    /// Base ability
    #[serde(default)]
    pub base_ability: String,

    /// Current ability
    #[serde(default)]
    pub ability: String,

    /// Held item
    #[serde(default)]
    pub item: String,
}

impl SidePokemon {
    /// Check if the pokemon is fainted
    pub fn is_fainted(&self) -> bool {
        self.condition == "0 fnt" || self.condition.ends_with(" fnt")
    }

    /// Parsed condition string
    pub fn hp_status(&self) -> Option<HpStatus> {
        HpStatus::parse(&self.condition)
    }

    /// Nickname part of the ident
    pub fn name(&self) -> &str {
        self.ident
            .split_once(": ")
            .map(|(_, name)| name)
            .unwrap_or(&self.ident)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> BattleRequest {
        serde_json::from_str(json).unwrap()
    }

    const SIDE: &str = r#""side":{"name":"bot","id":"p1","pokemon":[
        {"ident":"p1: Pikachu","details":"Pikachu, L50","condition":"100/100","active":true,"moves":["thunderbolt","quickattack"],"ability":"static","item":"lightball"},
        {"ident":"p1: Onix","details":"Onix, L50","condition":"80/80","active":false,"moves":["rockslide"],"ability":"sturdy","item":""},
        {"ident":"p1: Abra","details":"Abra, L50","condition":"0 fnt","active":false,"moves":["teleport"],"ability":"synchronize","item":""}
    ]}"#;

    #[test]
    fn test_legal_choices_moves_and_switches() {
        let req = request(&format!(
            r#"{{"rqid":3,"active":[{{"moves":[
                {{"move":"Thunderbolt","id":"thunderbolt","pp":15,"maxpp":15}},
                {{"move":"Quick Attack","id":"quickattack","pp":0,"maxpp":30}}
            ]}}],{SIDE}}}"#
        ));

        assert_eq!(
            req.legal_choices(),
            vec![Choice::Move(1), Choice::Switch(2)]
        );
    }

    #[test]
    fn test_legal_choices_trapped() {
        let req = request(&format!(
            r#"{{"active":[{{"trapped":true,"moves":[
                {{"move":"Thunderbolt","id":"thunderbolt","pp":15,"maxpp":15}}
            ]}}],{SIDE}}}"#
        ));

        assert_eq!(req.legal_choices(), vec![Choice::Move(1)]);
    }

    #[test]
    fn test_legal_choices_force_switch() {
        let req = request(&format!(r#"{{"forceSwitch":[true],{SIDE}}}"#));
        assert_eq!(req.legal_choices(), vec![Choice::Switch(2)]);
    }

    #[test]
    fn test_legal_choices_wait() {
        let req = request(&format!(r#"{{"wait":true,{SIDE}}}"#));
        assert!(req.legal_choices().is_empty());
    }

    #[test]
    fn test_struggle_fallback() {
        let req = request(
            r#"{"active":[{"trapped":true,"moves":[{"move":"Struggle","id":"struggle","disabled":true}]}]}"#,
        );
        assert_eq!(req.legal_choices(), vec![Choice::Move(1)]);
    }

    #[test]
    fn test_side_pokemon_helpers() {
        let req = request(&format!(r#"{{"wait":true,{SIDE}}}"#));
        let side = req.side.unwrap();
        assert_eq!(side.player(), Some(Player::P1));
        assert_eq!(side.pokemon[0].name(), "Pikachu");
        assert!(side.pokemon[2].is_fainted());
        assert_eq!(side.pokemon[1].hp_status().unwrap().max, Some(80));
    }
}
