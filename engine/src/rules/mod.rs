//! The battle parser: event handlers and the routines built from them

pub mod decide;
pub mod events;
pub mod facts;
pub mod init;
pub mod residual;
pub mod switch_in;
pub mod turn;

use anyhow::Result;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use psai_protocol::PokemonIdent;

use crate::context::BattleContext;

pub use turn::{BattleOutcome, battle_parser};

/// [`battle_parser`] in the shape a handler spawns
pub fn parse_battle(ctx: &mut BattleContext) -> BoxFuture<'_, Result<BattleOutcome>> {
    battle_parser(ctx).boxed()
}

/// Same Pokemon, whatever position letter the idents carry
pub(crate) fn same_pokemon(a: &PokemonIdent, b: &PokemonIdent) -> bool {
    a.player == b.player && a.name == b.name
}
