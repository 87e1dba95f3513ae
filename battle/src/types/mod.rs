//! Domain types for battle state tracking

mod field;
mod pokemon;
mod possibility;
mod side;
mod stats;
mod status;

pub use field::{FieldState, Weather};
pub use pokemon::{PokemonIdentity, PokemonState};
pub use possibility::{InferenceConflict, Possibilities};
pub use side::SideState;
pub use stats::StatStages;
pub use status::{Status, Volatile};
