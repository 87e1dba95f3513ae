use thiserror::Error;

pub mod client;
pub mod server;

pub use client::{Choice, ClientCommand, ClientMessage};
pub use server::battle::{
    Effect, EffectKind, GameType, HpStatus, Player, PokemonDetails, PokemonIdent, Stat, to_id,
};
pub use server::request::{ActivePokemon, BattleRequest, MoveSlot, SideInfo, SidePokemon};
pub use server::{Event, EventKind, EventTag, Flags, block_room_id, parse_block, parse_event};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid message format: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}
