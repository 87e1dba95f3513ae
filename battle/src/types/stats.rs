//! Stat stages

use psai_protocol::Stat;

const STATS: [Stat; 7] = [
    Stat::Atk,
    Stat::Def,
    Stat::Spa,
    Stat::Spd,
    Stat::Spe,
    Stat::Accuracy,
    Stat::Evasion,
];

fn index(stat: Stat) -> usize {
    match stat {
        Stat::Atk => 0,
        Stat::Def => 1,
        Stat::Spa => 2,
        Stat::Spd => 3,
        Stat::Spe => 4,
        Stat::Accuracy => 5,
        Stat::Evasion => 6,
    }
}

/// Stat stages (-6 to +6)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatStages([i8; 7]);

impl StatStages {
    /// Create new stat stages (all at 0)
    pub fn new() -> Self {
        Self::default()
    }

    /// Get stage for a stat
    pub fn get(&self, stat: Stat) -> i8 {
        self.0[index(stat)]
    }

    /// Set stage for a stat (clamped to -6..+6)
    pub fn set(&mut self, stat: Stat, value: i8) {
        self.0[index(stat)] = value.clamp(-6, 6);
    }

    /// Apply a boost to a stat, returns actual change applied
    pub fn boost(&mut self, stat: Stat, amount: i8) -> i8 {
        let current = self.get(stat);
        self.set(stat, current.saturating_add(amount));
        self.get(stat) - current
    }

    /// Apply an unboost (negative boost) to a stat, returns actual change applied
    pub fn unboost(&mut self, stat: Stat, amount: i8) -> i8 {
        self.boost(stat, amount.saturating_neg())
    }

    /// Reset all stages to 0
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Check if all stats are at 0
    pub fn is_clear(&self) -> bool {
        self.0.iter().all(|&s| s == 0)
    }

    /// Non-zero stages
    pub fn iter(&self) -> impl Iterator<Item = (Stat, i8)> + '_ {
        STATS
            .iter()
            .map(|&stat| (stat, self.get(stat)))
            .filter(|(_, stage)| *stage != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stages_are_zero() {
        let stages = StatStages::new();
        assert!(stages.is_clear());
        assert_eq!(stages.iter().count(), 0);
    }

    #[test]
    fn test_boost_caps() {
        let mut stages = StatStages::new();
        assert_eq!(stages.boost(Stat::Atk, 2), 2);

        stages.set(Stat::Atk, 5);
        assert_eq!(stages.boost(Stat::Atk, 3), 1);
        assert_eq!(stages.get(Stat::Atk), 6);
        assert_eq!(stages.boost(Stat::Atk, 1), 0);
    }

    #[test]
    fn test_unboost_caps() {
        let mut stages = StatStages::new();
        stages.set(Stat::Def, -5);
        assert_eq!(stages.unboost(Stat::Def, 3), -1);
        assert_eq!(stages.get(Stat::Def), -6);
    }

    #[test]
    fn test_clear() {
        let mut stages = StatStages::new();
        stages.boost(Stat::Spe, 2);
        stages.unboost(Stat::Evasion, 1);
        assert_eq!(
            stages.iter().collect::<Vec<_>>(),
            vec![(Stat::Spe, 2), (Stat::Evasion, -1)]
        );

        stages.clear();
        assert!(stages.is_clear());
    }
}
