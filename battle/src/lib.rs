//! Battle state tracking for Pokemon Showdown.
//!
//! `psai-battle` sits between `psai-protocol` (wire format) and the engine:
//!
//! ```text
//! psai-protocol (wire format)
//!        │
//!        ▼
//! psai-battle (domain types + tracking) ← THIS CRATE
//!        │
//!        ▼
//! psai-engine (event handlers, inference, choice negotiation)
//! ```
//!
//! # Main Types
//!
//! - [`BattleState`] - the tracked battle, mutated by the engine's event handlers
//! - [`SideState`], [`PokemonState`] - one player's side and its Pokemon
//! - [`Possibilities`] - what a hidden ability or item could still be
//! - [`Status`], [`Volatile`], [`StatStages`], [`Weather`]
//!
//! # Example Usage
//!
//! ```ignore
//! use psai_battle::BattleState;
//! use psai_protocol::{Player, PokemonIdent};
//!
//! let mut battle = BattleState::new();
//! battle.update_from_request(&request);
//!
//! let foe = PokemonIdent::new(Player::P2, Some('a'), "Gengar");
//! battle.rule_out_item(&foe, "Leftovers")?;
//! ```

pub mod tracking;
pub mod types;

pub use tracking::{BattleState, StateError, player_to_index};
pub use types::{
    FieldState, InferenceConflict, PokemonIdentity, PokemonState, Possibilities, SideState,
    StatStages, Status, Volatile, Weather,
};

// Re-export commonly used protocol types
pub use psai_protocol::{GameType, Player, PokemonIdent, Stat};
