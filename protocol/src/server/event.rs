//! Battle event types
//!
//! One [`Event`] is one decoded `|tag|...` line. The positional arguments of
//! each tag live in a dedicated [`EventKind`] variant, while trailing
//! `[flag]` arguments are collected into [`Flags`].

use std::collections::BTreeMap;
use std::fmt;

use super::battle::{Effect, GameType, HpStatus, Player, PokemonDetails, PokemonIdent, Stat};
use super::request::BattleRequest;

/// A single battle event
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub flags: Flags,
}

impl Event {
    /// Create an event with no flags
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            flags: Flags::default(),
        }
    }

    /// Attach a flag, builder style
    pub fn with_flag(mut self, name: &str, value: Option<&str>) -> Self {
        self.flags.insert(name, value);
        self
    }

    pub fn tag(&self) -> EventTag {
        self.kind.tag()
    }
}

/// Keyword flags trailing an event, e.g. `[from] item: Leftovers` or `[still]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Flags(BTreeMap<String, Option<String>>);

impl Flags {
    /// Parse one trailing argument like "[from] ability: Intimidate"
    pub fn parse_flag(part: &str) -> Option<(String, Option<String>)> {
        let rest = part.strip_prefix('[')?;
        let (name, value) = rest.split_once(']')?;
        let value = value.trim();
        let value = (!value.is_empty()).then(|| value.to_string());
        Some((name.to_string(), value))
    }

    pub fn insert(&mut self, name: &str, value: Option<&str>) {
        self.0.insert(name.to_string(), value.map(str::to_string));
    }

    pub fn has(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Value of a flag, `None` if missing or valueless
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|v| v.as_deref())
    }

    /// The effect named by `[from]`
    pub fn from_effect(&self) -> Option<Effect> {
        self.get("from").map(Effect::parse)
    }

    /// The pokemon named by `[of]`
    pub fn of(&self) -> Option<PokemonIdent> {
        self.get("of").and_then(PokemonIdent::parse)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Positional payload of an event, one variant per supported tag
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    // === Initialization ===
    /// |player|PLAYER|USERNAME|AVATAR|RATING
    Player { player: Player, username: String },
    /// |teamsize|PLAYER|NUMBER
    TeamSize { player: Player, size: u8 },
    /// |gametype|GAMETYPE
    GameType(GameType),
    /// |gen|GENNUM
    Gen(u8),
    /// |tier|FORMATNAME
    Tier(String),
    /// |rule|RULE: DESCRIPTION
    Rule(String),
    /// |clearpoke
    ClearPoke,
    /// |poke|PLAYER|DETAILS|ITEM
    Poke {
        player: Player,
        details: PokemonDetails,
    },
    /// |teampreview
    TeamPreview,
    /// |start
    Start,

    // === Progress ===
    /// |request|JSON, `None` for an empty payload
    Request(Option<Box<BattleRequest>>),
    /// |error|MESSAGE
    Error(String),
    /// |turn|NUMBER
    Turn(u32),
    /// |upkeep
    Upkeep,
    /// |win|USER
    Win(String),
    /// |tie
    Tie,

    // === Major actions ===
    /// |move|POKEMON|MOVE|TARGET
    Move {
        pokemon: PokemonIdent,
        move_name: String,
        target: Option<PokemonIdent>,
    },
    /// |switch|POKEMON|DETAILS|HP STATUS
    Switch {
        pokemon: PokemonIdent,
        details: PokemonDetails,
        hp_status: Option<HpStatus>,
    },
    /// |drag|POKEMON|DETAILS|HP STATUS
    Drag {
        pokemon: PokemonIdent,
        details: PokemonDetails,
        hp_status: Option<HpStatus>,
    },
    /// |detailschange|POKEMON|DETAILS|HP STATUS
    DetailsChange {
        pokemon: PokemonIdent,
        details: PokemonDetails,
    },
    /// |cant|POKEMON|REASON|MOVE
    Cant {
        pokemon: PokemonIdent,
        reason: String,
        move_name: Option<String>,
    },
    /// |faint|POKEMON
    Faint(PokemonIdent),

    // === Minor actions ===
    /// |-fail|POKEMON|ACTION
    Fail {
        pokemon: PokemonIdent,
        action: Option<String>,
    },
    /// |-miss|SOURCE|TARGET
    Miss {
        source: PokemonIdent,
        target: Option<PokemonIdent>,
    },
    /// |-damage|POKEMON|HP STATUS
    Damage {
        pokemon: PokemonIdent,
        hp_status: Option<HpStatus>,
    },
    /// |-heal|POKEMON|HP STATUS
    Heal {
        pokemon: PokemonIdent,
        hp_status: Option<HpStatus>,
    },
    /// |-status|POKEMON|STATUS
    Status { pokemon: PokemonIdent, status: String },
    /// |-curestatus|POKEMON|STATUS
    CureStatus { pokemon: PokemonIdent, status: String },
    /// |-boost|POKEMON|STAT|AMOUNT
    Boost {
        pokemon: PokemonIdent,
        stat: Stat,
        amount: i8,
    },
    /// |-unboost|POKEMON|STAT|AMOUNT
    Unboost {
        pokemon: PokemonIdent,
        stat: Stat,
        amount: i8,
    },
    /// |-clearallboost
    ClearAllBoost,
    /// |-clearboost|POKEMON
    ClearBoost(PokemonIdent),
    /// |-weather|WEATHER
    Weather(String),
    /// |-start|POKEMON|EFFECT
    VolatileStart { pokemon: PokemonIdent, effect: String },
    /// |-end|POKEMON|EFFECT
    VolatileEnd { pokemon: PokemonIdent, effect: String },
    /// |-crit|POKEMON
    Crit(PokemonIdent),
    /// |-supereffective|POKEMON
    SuperEffective(PokemonIdent),
    /// |-resisted|POKEMON
    Resisted(PokemonIdent),
    /// |-immune|POKEMON
    Immune(PokemonIdent),
    /// |-item|POKEMON|ITEM
    Item { pokemon: PokemonIdent, item: String },
    /// |-enditem|POKEMON|ITEM
    EndItem { pokemon: PokemonIdent, item: String },
    /// |-ability|POKEMON|ABILITY
    Ability {
        pokemon: PokemonIdent,
        ability: String,
    },
    /// |-endability|POKEMON
    EndAbility(PokemonIdent),
    /// |-activate|POKEMON|EFFECT
    Activate {
        pokemon: Option<PokemonIdent>,
        effect: String,
    },
    /// |-prepare|POKEMON|MOVE
    Prepare {
        pokemon: PokemonIdent,
        move_name: String,
    },
    /// |-mustrecharge|POKEMON
    MustRecharge(PokemonIdent),

    /// Any tag this crate does not model
    Other { tag: String, args: Vec<String> },
}

/// Fieldless discriminant of [`EventKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventTag {
    Player,
    TeamSize,
    GameType,
    Gen,
    Tier,
    Rule,
    ClearPoke,
    Poke,
    TeamPreview,
    Start,
    Request,
    Error,
    Turn,
    Upkeep,
    Win,
    Tie,
    Move,
    Switch,
    Drag,
    DetailsChange,
    Cant,
    Faint,
    Fail,
    Miss,
    Damage,
    Heal,
    Status,
    CureStatus,
    Boost,
    Unboost,
    ClearAllBoost,
    ClearBoost,
    Weather,
    VolatileStart,
    VolatileEnd,
    Crit,
    SuperEffective,
    Resisted,
    Immune,
    Item,
    EndItem,
    Ability,
    EndAbility,
    Activate,
    Prepare,
    MustRecharge,
    Other,
}

impl EventTag {
    /// Protocol spelling of the tag
    pub fn as_str(&self) -> &'static str {
        match self {
            EventTag::Player => "player",
            EventTag::TeamSize => "teamsize",
            EventTag::GameType => "gametype",
            EventTag::Gen => "gen",
            EventTag::Tier => "tier",
            EventTag::Rule => "rule",
            EventTag::ClearPoke => "clearpoke",
            EventTag::Poke => "poke",
            EventTag::TeamPreview => "teampreview",
            EventTag::Start => "start",
            EventTag::Request => "request",
            EventTag::Error => "error",
            EventTag::Turn => "turn",
            EventTag::Upkeep => "upkeep",
            EventTag::Win => "win",
            EventTag::Tie => "tie",
            EventTag::Move => "move",
            EventTag::Switch => "switch",
            EventTag::Drag => "drag",
            EventTag::DetailsChange => "detailschange",
            EventTag::Cant => "cant",
            EventTag::Faint => "faint",
            EventTag::Fail => "-fail",
            EventTag::Miss => "-miss",
            EventTag::Damage => "-damage",
            EventTag::Heal => "-heal",
            EventTag::Status => "-status",
            EventTag::CureStatus => "-curestatus",
            EventTag::Boost => "-boost",
            EventTag::Unboost => "-unboost",
            EventTag::ClearAllBoost => "-clearallboost",
            EventTag::ClearBoost => "-clearboost",
            EventTag::Weather => "-weather",
            EventTag::VolatileStart => "-start",
            EventTag::VolatileEnd => "-end",
            EventTag::Crit => "-crit",
            EventTag::SuperEffective => "-supereffective",
            EventTag::Resisted => "-resisted",
            EventTag::Immune => "-immune",
            EventTag::Item => "-item",
            EventTag::EndItem => "-enditem",
            EventTag::Ability => "-ability",
            EventTag::EndAbility => "-endability",
            EventTag::Activate => "-activate",
            EventTag::Prepare => "-prepare",
            EventTag::MustRecharge => "-mustrecharge",
            EventTag::Other => "other",
        }
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EventKind {
    pub fn tag(&self) -> EventTag {
        match self {
            EventKind::Player { .. } => EventTag::Player,
            EventKind::TeamSize { .. } => EventTag::TeamSize,
            EventKind::GameType(_) => EventTag::GameType,
            EventKind::Gen(_) => EventTag::Gen,
            EventKind::Tier(_) => EventTag::Tier,
            EventKind::Rule(_) => EventTag::Rule,
            EventKind::ClearPoke => EventTag::ClearPoke,
            EventKind::Poke { .. } => EventTag::Poke,
            EventKind::TeamPreview => EventTag::TeamPreview,
            EventKind::Start => EventTag::Start,
            EventKind::Request(_) => EventTag::Request,
            EventKind::Error(_) => EventTag::Error,
            EventKind::Turn(_) => EventTag::Turn,
            EventKind::Upkeep => EventTag::Upkeep,
            EventKind::Win(_) => EventTag::Win,
            EventKind::Tie => EventTag::Tie,
            EventKind::Move { .. } => EventTag::Move,
            EventKind::Switch { .. } => EventTag::Switch,
            EventKind::Drag { .. } => EventTag::Drag,
            EventKind::DetailsChange { .. } => EventTag::DetailsChange,
            EventKind::Cant { .. } => EventTag::Cant,
            EventKind::Faint(_) => EventTag::Faint,
            EventKind::Fail { .. } => EventTag::Fail,
            EventKind::Miss { .. } => EventTag::Miss,
            EventKind::Damage { .. } => EventTag::Damage,
            EventKind::Heal { .. } => EventTag::Heal,
            EventKind::Status { .. } => EventTag::Status,
            EventKind::CureStatus { .. } => EventTag::CureStatus,
            EventKind::Boost { .. } => EventTag::Boost,
            EventKind::Unboost { .. } => EventTag::Unboost,
            EventKind::ClearAllBoost => EventTag::ClearAllBoost,
            EventKind::ClearBoost(_) => EventTag::ClearBoost,
            EventKind::Weather(_) => EventTag::Weather,
            EventKind::VolatileStart { .. } => EventTag::VolatileStart,
            EventKind::VolatileEnd { .. } => EventTag::VolatileEnd,
            EventKind::Crit(_) => EventTag::Crit,
            EventKind::SuperEffective(_) => EventTag::SuperEffective,
            EventKind::Resisted(_) => EventTag::Resisted,
            EventKind::Immune(_) => EventTag::Immune,
            EventKind::Item { .. } => EventTag::Item,
            EventKind::EndItem { .. } => EventTag::EndItem,
            EventKind::Ability { .. } => EventTag::Ability,
            EventKind::EndAbility(_) => EventTag::EndAbility,
            EventKind::Activate { .. } => EventTag::Activate,
            EventKind::Prepare { .. } => EventTag::Prepare,
            EventKind::MustRecharge(_) => EventTag::MustRecharge,
            EventKind::Other { .. } => EventTag::Other,
        }
    }
}
