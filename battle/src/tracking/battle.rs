//! BattleState - the tracked state of one battle

use psai_protocol::{GameType, Player, PokemonIdent};
use thiserror::Error;

use crate::types::{FieldState, InferenceConflict, PokemonState, SideState};

/// A state update that doesn't fit what is already tracked
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("unknown pokemon '{0}'")]
    UnknownPokemon(String),

    #[error("no active pokemon for {0}")]
    NoActive(Player),

    #[error("{ident}: {source}")]
    Conflict {
        ident: String,
        #[source]
        source: InferenceConflict,
    },
}

/// A battle being tracked from the events of one player's stream.
///
/// Our own Pokemon are synced in full from requests; the opponent's are
/// created as they switch in and stay partially hidden, with abilities and
/// items narrowed by inference as the battle goes on.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleState {
    pub game_type: Option<GameType>,
    pub generation: u8,
    pub tier: String,

    /// Current turn number (0 = not started)
    pub turn: u32,

    pub field: FieldState,

    /// Player sides (indexed by Player enum)
    pub(crate) sides: [Option<SideState>; 4],

    /// Which player we are
    perspective: Option<Player>,

    pub ended: bool,
    pub winner: Option<String>,
    pub tie: bool,
}

impl BattleState {
    pub fn new() -> Self {
        Self {
            game_type: None,
            generation: 9,
            tier: String::new(),
            turn: 0,
            field: FieldState::new(),
            sides: [None, None, None, None],
            perspective: None,
            ended: false,
            winner: None,
            tie: false,
        }
    }

    pub fn set_perspective(&mut self, player: Player) {
        self.perspective = Some(player);
    }

    pub fn perspective(&self) -> Option<Player> {
        self.perspective
    }

    /// Get our side (based on perspective)
    pub fn me(&self) -> Option<&SideState> {
        self.perspective.and_then(|p| self.side(p))
    }

    /// Get opponent's side (assumes 1v1 battle)
    pub fn opponent(&self) -> Option<&SideState> {
        self.side(self.perspective?.foe())
    }

    pub fn side(&self, player: Player) -> Option<&SideState> {
        self.sides[player_to_index(player)].as_ref()
    }

    pub fn side_mut(&mut self, player: Player) -> Option<&mut SideState> {
        self.sides[player_to_index(player)].as_mut()
    }

    /// Get or create a side for a player
    pub fn get_or_create_side(&mut self, player: Player, username: &str) -> &mut SideState {
        let slots = self.game_type.map_or(1, |g| g.active_slots());
        let side = self.sides[player_to_index(player)].get_or_insert_with(|| {
            let mut side = SideState::new(player, username);
            side.set_active_slots(slots);
            side
        });
        if side.username.is_empty() && !username.is_empty() {
            side.username = username.to_string();
        }
        side
    }

    /// Iterate over all initialized sides
    pub fn sides(&self) -> impl Iterator<Item = &SideState> {
        self.sides.iter().filter_map(|s| s.as_ref())
    }

    /// Set game type and update active slots accordingly
    pub fn set_game_type(&mut self, game_type: GameType) {
        self.game_type = Some(game_type);
        for side in self.sides.iter_mut().flatten() {
            side.set_active_slots(game_type.active_slots());
        }
    }

    /// The Pokemon in `player`'s first active slot
    pub fn active(&self, player: Player) -> Option<&PokemonState> {
        self.side(player)?.active(0)
    }

    /// Identifier of `player`'s first active Pokemon, as the protocol writes it
    pub fn active_ident(&self, player: Player) -> Option<PokemonIdent> {
        let poke = self.active(player)?;
        Some(PokemonIdent::new(player, Some('a'), poke.name()))
    }

    /// Find a Pokemon by protocol identifier
    pub fn pokemon(&self, ident: &PokemonIdent) -> Option<&PokemonState> {
        let side = self.side(ident.player)?;
        side.pokemon.get(side.find_pokemon(&ident.name)?)
    }

    pub fn pokemon_mut(&mut self, ident: &PokemonIdent) -> Option<&mut PokemonState> {
        let side = self.side_mut(ident.player)?;
        let idx = side.find_pokemon(&ident.name)?;
        side.pokemon.get_mut(idx)
    }

    /// Like [`pokemon_mut`](Self::pokemon_mut), but an unknown Pokemon is an error
    pub(crate) fn expect_pokemon(
        &mut self,
        ident: &PokemonIdent,
    ) -> Result<&mut PokemonState, StateError> {
        self.pokemon_mut(ident)
            .ok_or_else(|| StateError::UnknownPokemon(ident.to_string()))
    }
}

impl Default for BattleState {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert Player enum to array index
pub fn player_to_index(player: Player) -> usize {
    match player {
        Player::P1 => 0,
        Player::P2 => 1,
        Player::P3 => 2,
        Player::P4 => 3,
    }
}
