//! Side (player) state

use psai_protocol::Player;

use super::pokemon::PokemonState;

/// One player's side of the battle
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SideState {
    pub player: Player,
    pub username: String,

    /// Pokemon on this side, in the order they were first seen
    pub pokemon: Vec<PokemonState>,

    /// Party index of the Pokemon in each active slot
    pub active_indices: Vec<Option<usize>>,
}

impl SideState {
    pub fn new(player: Player, username: impl Into<String>) -> Self {
        Self {
            player,
            username: username.into(),
            pokemon: Vec::new(),
            active_indices: vec![None],
        }
    }

    /// Set the number of active slots (1 for singles, 2 for doubles, etc.)
    pub fn set_active_slots(&mut self, count: usize) {
        self.active_indices.resize(count, None);
    }

    /// Get the active Pokemon at a slot (0-indexed)
    pub fn active(&self, slot: usize) -> Option<&PokemonState> {
        self.active_indices
            .get(slot)
            .copied()
            .flatten()
            .and_then(|idx| self.pokemon.get(idx))
    }

    pub fn active_mut(&mut self, slot: usize) -> Option<&mut PokemonState> {
        let idx = self.active_indices.get(slot).copied().flatten()?;
        self.pokemon.get_mut(idx)
    }

    /// Iterate over active Pokemon with their slot
    pub fn get_active(&self) -> impl Iterator<Item = (usize, &PokemonState)> {
        self.active_indices
            .iter()
            .enumerate()
            .filter_map(|(slot, idx)| Some((slot, self.pokemon.get((*idx)?)?)))
    }

    /// Put the Pokemon at `idx` into `slot`, switching out whoever was there
    pub fn set_active(&mut self, slot: usize, idx: usize) {
        if slot >= self.active_indices.len() {
            self.set_active_slots(slot + 1);
        }
        if let Some(prev) = self.active_indices[slot]
            && prev != idx
            && let Some(poke) = self.pokemon.get_mut(prev)
        {
            poke.on_switch_out();
        }

        self.active_indices[slot] = Some(idx);
        if let Some(poke) = self.pokemon.get_mut(idx) {
            poke.active = true;
        }
    }

    /// Empty a slot, e.g. after its Pokemon fainted
    pub fn clear_slot(&mut self, slot: usize) {
        if let Some(entry) = self.active_indices.get_mut(slot) {
            *entry = None;
        }
    }

    /// Count non-fainted Pokemon
    pub fn alive_count(&self) -> usize {
        self.pokemon.iter().filter(|p| p.is_alive()).count()
    }

    /// Find a Pokemon by name (nickname or species)
    pub fn find_pokemon(&self, name: &str) -> Option<usize> {
        self.pokemon
            .iter()
            .position(|p| p.name() == name || p.identity.species == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PokemonIdentity;
    use psai_protocol::PokemonDetails;

    fn side_with(names: &[&str]) -> SideState {
        let mut side = SideState::new(Player::P2, "foe");
        for name in names {
            side.pokemon.push(PokemonState::new(PokemonIdentity::from_details(
                &PokemonDetails::parse(name),
                name,
            )));
        }
        side
    }

    #[test]
    fn test_set_active_switches_out_previous() {
        let mut side = side_with(&["Gengar", "Snorlax"]);
        side.set_active(0, 0);
        assert_eq!(side.active(0).map(|p| p.name()), Some("Gengar"));

        side.set_active(0, 1);
        assert_eq!(side.active(0).map(|p| p.name()), Some("Snorlax"));
        assert!(!side.pokemon[0].active);
        assert!(side.pokemon[1].active);
    }

    #[test]
    fn test_find_and_clear() {
        let mut side = side_with(&["Gengar", "Snorlax"]);
        assert_eq!(side.find_pokemon("Snorlax"), Some(1));
        assert_eq!(side.find_pokemon("Mew"), None);

        side.set_active(0, 1);
        side.clear_slot(0);
        assert!(side.active(0).is_none());
        assert_eq!(side.get_active().count(), 0);
        assert_eq!(side.alive_count(), 2);
    }
}
