//! Facts about the tracked battle that inferences reason over

use anyhow::{Result, bail};
use psai_battle::{BattleState, Weather};
use psai_protocol::PokemonIdent;

use crate::parser::reason::Fact;

/// The Pokemon's ability is `ability`
#[derive(Debug, Clone)]
pub struct HasAbility {
    pub pokemon: PokemonIdent,
    pub ability: String,
}

impl Fact<BattleState> for HasAbility {
    fn check(&self, state: &BattleState) -> Option<bool> {
        match state.pokemon(&self.pokemon) {
            Some(poke) => poke.ability.can_hold(&self.ability),
            None => Some(false),
        }
    }

    fn assert(&self, state: &mut BattleState) -> Result<()> {
        Ok(state.reveal_ability(&self.pokemon, &self.ability)?)
    }

    fn reject(&self, state: &mut BattleState) -> Result<()> {
        Ok(state.rule_out_ability(&self.pokemon, &self.ability)?)
    }

    fn describe(&self) -> String {
        format!("{} has ability {}", self.pokemon, self.ability)
    }
}

/// The Pokemon holds `item`
#[derive(Debug, Clone)]
pub struct HasItem {
    pub pokemon: PokemonIdent,
    pub item: String,
}

impl Fact<BattleState> for HasItem {
    fn check(&self, state: &BattleState) -> Option<bool> {
        match state.pokemon(&self.pokemon) {
            Some(poke) => poke.item.can_hold(&self.item),
            None => Some(false),
        }
    }

    fn assert(&self, state: &mut BattleState) -> Result<()> {
        Ok(state.reveal_item(&self.pokemon, &self.item)?)
    }

    fn reject(&self, state: &mut BattleState) -> Result<()> {
        Ok(state.rule_out_item(&self.pokemon, &self.item)?)
    }

    fn describe(&self) -> String {
        format!("{} holds {}", self.pokemon, self.item)
    }
}

/// The Pokemon had no HP missing when the fact was made.
///
/// HP is only ever observed, so the fact can't be forced either way.
#[derive(Debug, Clone)]
pub struct FullHp {
    pub pokemon: PokemonIdent,
    full: Option<bool>,
}

impl FullHp {
    /// Snapshot the Pokemon's current HP
    pub fn now(state: &BattleState, pokemon: PokemonIdent) -> Self {
        let full = state.is_full_hp(&pokemon);
        Self { pokemon, full }
    }
}

impl Fact<BattleState> for FullHp {
    fn check(&self, _state: &BattleState) -> Option<bool> {
        self.full
    }

    fn assert(&self, _state: &mut BattleState) -> Result<()> {
        bail!("cannot deduce the HP of untracked {}", self.pokemon)
    }

    fn reject(&self, _state: &mut BattleState) -> Result<()> {
        bail!("cannot deduce the HP of untracked {}", self.pokemon)
    }

    fn describe(&self) -> String {
        format!("{} is at full HP", self.pokemon)
    }
}

/// The given weather is up for good, so an ability setting it stays quiet
#[derive(Debug, Clone)]
pub struct WeatherLocked(pub Weather);

impl Fact<BattleState> for WeatherLocked {
    fn check(&self, state: &BattleState) -> Option<bool> {
        Some(state.field.weather_locked(self.0, state.generation))
    }

    fn assert(&self, _state: &mut BattleState) -> Result<()> {
        Ok(())
    }

    fn reject(&self, _state: &mut BattleState) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        format!("weather {:?} is locked", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use psai_battle::Possibilities;
    use psai_protocol::{HpStatus, Player, PokemonDetails};

    fn state_with_foe() -> (BattleState, PokemonIdent) {
        let mut state = BattleState::new();
        let ident = PokemonIdent::new(Player::P2, Some('a'), "Tyranitar");
        state.switch_in(
            &ident,
            &PokemonDetails::parse("Tyranitar, L50"),
            HpStatus::parse("100/100").as_ref(),
        );
        (state, ident)
    }

    #[test]
    fn test_has_item_follows_possibilities() {
        let (mut state, ident) = state_with_foe();
        let fact = HasItem {
            pokemon: ident.clone(),
            item: "Leftovers".to_string(),
        };
        assert_eq!(fact.check(&state), None);

        fact.reject(&mut state).unwrap();
        assert_eq!(fact.check(&state), Some(false));
        assert_eq!(
            state.pokemon(&ident).unwrap().item.can_hold("leftovers"),
            Some(false)
        );
    }

    #[test]
    fn test_has_ability_assert_reveals() {
        let (mut state, ident) = state_with_foe();
        let fact = HasAbility {
            pokemon: ident.clone(),
            ability: "Sand Stream".to_string(),
        };
        fact.assert(&mut state).unwrap();
        assert_eq!(fact.check(&state), Some(true));
        assert_eq!(
            state.pokemon(&ident).unwrap().ability,
            Possibilities::known("sandstream")
        );
    }

    #[test]
    fn test_untracked_pokemon_has_nothing() {
        let state = BattleState::new();
        let ghost = PokemonIdent::new(Player::P2, Some('a'), "Ghost");
        let fact = HasItem {
            pokemon: ghost.clone(),
            item: "Leftovers".to_string(),
        };
        assert_eq!(fact.check(&state), Some(false));
        assert_eq!(FullHp::now(&state, ghost).check(&state), None);
    }

    #[test]
    fn test_full_hp_is_a_snapshot() {
        let (mut state, ident) = state_with_foe();
        let before = FullHp::now(&state, ident.clone());
        state
            .apply_hp(&ident, &HpStatus::parse("60/100").unwrap())
            .unwrap();

        assert_eq!(before.check(&state), Some(true));
        assert_eq!(FullHp::now(&state, ident).check(&state), Some(false));
    }
}
