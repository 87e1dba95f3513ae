//! State mutations called by the event handlers

use psai_protocol::{
    BattleRequest, HpStatus, Player, PokemonDetails, PokemonIdent, Stat, to_id,
};

use super::battle::{BattleState, StateError};
use crate::types::{
    InferenceConflict, PokemonIdentity, PokemonState, Possibilities, Status, Volatile,
};

fn conflict(ident: &PokemonIdent) -> impl FnOnce(InferenceConflict) -> StateError + '_ {
    move |source| StateError::Conflict {
        ident: ident.to_string(),
        source,
    }
}

impl BattleState {
    /// Sync our side from a request, which carries full information
    pub fn update_from_request(&mut self, request: &BattleRequest) {
        let Some(side_info) = &request.side else {
            return;
        };
        let Some(player) = side_info.player() else {
            return;
        };
        self.set_perspective(player);

        let side = self.get_or_create_side(player, &side_info.name);
        let mut slot = 0;
        for req_poke in &side_info.pokemon {
            let name = req_poke.name();
            let idx = match side.find_pokemon(name) {
                Some(idx) => idx,
                None => {
                    let details = PokemonDetails::parse(&req_poke.details);
                    side.pokemon
                        .push(PokemonState::new(PokemonIdentity::from_details(&details, name)));
                    side.pokemon.len() - 1
                }
            };

            let poke = &mut side.pokemon[idx];
            poke.known_moves = req_poke.moves.iter().map(|m| to_id(m)).collect();
            poke.ability = if req_poke.ability.is_empty() {
                Possibilities::known(&req_poke.base_ability)
            } else {
                Possibilities::known(&req_poke.ability)
            };
            poke.item = Possibilities::known(&req_poke.item);
            poke.item_consumed = req_poke.item.is_empty();

            if let Some(hp) = req_poke.hp_status() {
                poke.apply_hp_status(&hp);
                if hp.status.is_none() {
                    poke.status = None;
                }
            }
            poke.fainted = req_poke.is_fainted();

            if req_poke.active {
                side.set_active(slot, idx);
                slot += 1;
            } else {
                side.pokemon[idx].active = false;
            }
        }

        // A new request means the last choice went through
        if let Some(active) = request.first_active()
            && let Some(poke) = side.active_mut(0)
        {
            poke.disabled_moves
                .retain(|id| active.moves.iter().any(|m| &m.id == id && m.disabled));
        }
    }

    /// Record a player's name (`|player|`)
    pub fn set_player(&mut self, player: Player, username: &str) {
        self.get_or_create_side(player, username);
    }

    /// A Pokemon entering the field through a switch, drag or replace
    pub fn switch_in(
        &mut self,
        ident: &PokemonIdent,
        details: &PokemonDetails,
        hp_status: Option<&HpStatus>,
    ) {
        let side = self.get_or_create_side(ident.player, "");
        let idx = side.find_pokemon(&ident.name).unwrap_or_else(|| {
            side.pokemon.push(PokemonState::new(PokemonIdentity::from_details(
                details,
                &ident.name,
            )));
            side.pokemon.len() - 1
        });

        // Forme may have changed
        side.pokemon[idx].identity.species = details.species.clone();
        if let Some(hp) = hp_status {
            side.pokemon[idx].apply_hp_status(hp);
        }
        side.set_active(ident.slot(), idx);
    }

    pub fn faint(&mut self, ident: &PokemonIdent) -> Result<(), StateError> {
        let poke = self.expect_pokemon(ident)?;
        poke.fainted = true;
        poke.hp_current = 0;
        poke.on_switch_out();

        if let Some(side) = self.side_mut(ident.player) {
            side.clear_slot(ident.slot());
        }
        Ok(())
    }

    /// Apply an HP update from `-damage`, `-heal` or `-sethp`
    pub fn apply_hp(&mut self, ident: &PokemonIdent, hp: &HpStatus) -> Result<(), StateError> {
        self.expect_pokemon(ident)?.apply_hp_status(hp);
        Ok(())
    }

    /// Whether the Pokemon is at full HP, `None` if it isn't tracked
    pub fn is_full_hp(&self, ident: &PokemonIdent) -> Option<bool> {
        self.pokemon(ident).map(PokemonState::is_full_hp)
    }

    pub fn set_status(&mut self, ident: &PokemonIdent, status: &str) -> Result<(), StateError> {
        self.expect_pokemon(ident)?.status = Status::from_protocol(status);
        Ok(())
    }

    pub fn cure_status(&mut self, ident: &PokemonIdent) -> Result<(), StateError> {
        self.expect_pokemon(ident)?.status = None;
        Ok(())
    }

    /// Returns the stage change actually applied
    pub fn boost(&mut self, ident: &PokemonIdent, stat: Stat, amount: i8) -> Result<i8, StateError> {
        Ok(self.expect_pokemon(ident)?.boosts.boost(stat, amount))
    }

    pub fn unboost(
        &mut self,
        ident: &PokemonIdent,
        stat: Stat,
        amount: i8,
    ) -> Result<i8, StateError> {
        Ok(self.expect_pokemon(ident)?.boosts.unboost(stat, amount))
    }

    pub fn clear_boosts(&mut self, ident: &PokemonIdent) -> Result<(), StateError> {
        self.expect_pokemon(ident)?.boosts.clear();
        Ok(())
    }

    /// `-clearallboost`: every active Pokemon
    pub fn clear_all_boosts(&mut self) {
        for side in self.sides.iter_mut().flatten() {
            for idx in side.active_indices.iter().flatten() {
                if let Some(poke) = side.pokemon.get_mut(*idx) {
                    poke.boosts.clear();
                }
            }
        }
    }

    pub fn record_move(&mut self, ident: &PokemonIdent, move_name: &str) -> Result<(), StateError> {
        self.expect_pokemon(ident)?.record_move(move_name);
        Ok(())
    }

    /// The server refused a move because it was disabled
    pub fn disable_move(&mut self, ident: &PokemonIdent, move_id: &str) -> Result<(), StateError> {
        self.expect_pokemon(ident)?
            .disabled_moves
            .insert(to_id(move_id));
        Ok(())
    }

    pub fn reveal_ability(&mut self, ident: &PokemonIdent, ability: &str) -> Result<(), StateError> {
        self.expect_pokemon(ident)?
            .ability
            .narrow(ability)
            .map_err(conflict(ident))
    }

    pub fn rule_out_ability(
        &mut self,
        ident: &PokemonIdent,
        ability: &str,
    ) -> Result<(), StateError> {
        self.expect_pokemon(ident)?
            .ability
            .remove(ability)
            .map_err(conflict(ident))
    }

    /// An item was shown, either held (`-item`) or as the source of an effect
    pub fn reveal_item(&mut self, ident: &PokemonIdent, item: &str) -> Result<(), StateError> {
        let poke = self.expect_pokemon(ident)?;
        // A new item after the old one was used up (Trick, Recycle)
        if poke.item_consumed {
            poke.item = Possibilities::open();
            poke.item_consumed = false;
        }
        poke.item.narrow(item).map_err(conflict(ident))
    }

    pub fn rule_out_item(&mut self, ident: &PokemonIdent, item: &str) -> Result<(), StateError> {
        self.expect_pokemon(ident)?
            .item
            .remove(item)
            .map_err(conflict(ident))
    }

    /// `-enditem`: the item is gone for good
    pub fn consume_item(&mut self, ident: &PokemonIdent, item: &str) -> Result<(), StateError> {
        let poke = self.expect_pokemon(ident)?;
        if !poke.item_consumed {
            poke.item.narrow(item).map_err(conflict(ident))?;
        }
        poke.item = Possibilities::known("");
        poke.item_consumed = true;
        Ok(())
    }

    pub fn set_weather(&mut self, weather: &str, upkeep: bool, from_ability: bool) {
        self.field.apply_weather(weather, upkeep, from_ability);
    }

    pub fn start_volatile(&mut self, ident: &PokemonIdent, effect: &str) -> Result<(), StateError> {
        self.expect_pokemon(ident)?
            .volatiles
            .insert(Volatile::from_protocol(effect));
        Ok(())
    }

    pub fn end_volatile(&mut self, ident: &PokemonIdent, effect: &str) -> Result<(), StateError> {
        self.expect_pokemon(ident)?
            .volatiles
            .remove(&Volatile::from_protocol(effect));
        Ok(())
    }

    pub fn set_turn(&mut self, turn: u32) {
        self.turn = turn;
    }

    /// End the battle; `None` is a tie
    pub fn finish(&mut self, winner: Option<String>) {
        self.ended = true;
        self.tie = winner.is_none();
        self.winner = winner;
    }
}
