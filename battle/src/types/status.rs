//! Status conditions (volatile and non-volatile)

/// Non-volatile status conditions (persist through switching)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    Burn,
    Freeze,
    Paralysis,
    Poison,
    BadPoison,
    Sleep,
}

impl Status {
    /// Parse from protocol string ("brn", "frz", "par", "psn", "tox", "slp")
    pub fn from_protocol(s: &str) -> Option<Self> {
        match s {
            "brn" => Some(Status::Burn),
            "frz" => Some(Status::Freeze),
            "par" => Some(Status::Paralysis),
            "psn" => Some(Status::Poison),
            "tox" => Some(Status::BadPoison),
            "slp" => Some(Status::Sleep),
            _ => None,
        }
    }

    /// Convert to protocol format
    pub fn to_protocol(&self) -> &'static str {
        match self {
            Status::Burn => "brn",
            Status::Freeze => "frz",
            Status::Paralysis => "par",
            Status::Poison => "psn",
            Status::BadPoison => "tox",
            Status::Sleep => "slp",
        }
    }

    /// Whether this status chips HP at the end of each turn
    pub fn deals_residual_damage(&self) -> bool {
        matches!(self, Status::Burn | Status::Poison | Status::BadPoison)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_protocol())
    }
}

/// Volatile status conditions (cleared on switching)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Volatile {
    Trapped,
    PartialTrap,
    Confusion,
    Taunt,
    Encore,
    Disable,
    LeechSeed,
    Substitute,
    Recharging,
    Charging,
    Other(String),
}

impl Volatile {
    /// Parse from protocol string
    pub fn from_protocol(s: &str) -> Self {
        let clean = s
            .strip_prefix("move: ")
            .or_else(|| s.strip_prefix("ability: "))
            .unwrap_or(s);

        match psai_protocol::to_id(clean).as_str() {
            "trapped" | "meanlook" | "spiderweb" | "block" => Volatile::Trapped,
            "partiallytrapped" | "bind" | "wrap" | "firespin" | "clamp" | "whirlpool"
            | "sandtomb" | "magmastorm" => Volatile::PartialTrap,
            "confusion" => Volatile::Confusion,
            "taunt" => Volatile::Taunt,
            "encore" => Volatile::Encore,
            "disable" => Volatile::Disable,
            "leechseed" => Volatile::LeechSeed,
            "substitute" => Volatile::Substitute,
            "mustrecharge" => Volatile::Recharging,
            "twoturnmove" | "solarbeam" | "razorwind" | "skullbash" | "skyattack" => {
                Volatile::Charging
            }
            _ => Volatile::Other(s.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for s in ["brn", "frz", "par", "psn", "tox", "slp"] {
            assert_eq!(Status::from_protocol(s).unwrap().to_protocol(), s);
        }
        assert_eq!(Status::from_protocol("fnt"), None);
    }

    #[test]
    fn test_volatile_from_protocol() {
        assert_eq!(Volatile::from_protocol("move: Leech Seed"), Volatile::LeechSeed);
        assert_eq!(Volatile::from_protocol("confusion"), Volatile::Confusion);
        assert_eq!(
            Volatile::from_protocol("Stockpile"),
            Volatile::Other("Stockpile".to_string())
        );
    }
}
