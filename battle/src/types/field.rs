//! Global field state

/// Weather conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Weather {
    Sun,
    Rain,
    Sand,
    Hail,
}

impl Weather {
    /// Parse from protocol string, `None` for "none" or unknown weather
    pub fn from_protocol(s: &str) -> Option<Self> {
        match psai_protocol::to_id(s).as_str() {
            "sunnyday" => Some(Weather::Sun),
            "raindance" => Some(Weather::Rain),
            "sandstorm" => Some(Weather::Sand),
            "hail" => Some(Weather::Hail),
            _ => None,
        }
    }
}

/// Global field state affecting all Pokemon
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldState {
    /// Current weather condition
    pub weather: Option<Weather>,
    /// The weather came from an ability and has no turn limit (gens 3-5)
    pub weather_from_ability: bool,
}

impl FieldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a |-weather| message; upkeep messages keep the weather as is
    pub fn apply_weather(&mut self, weather: &str, upkeep: bool, from_ability: bool) {
        if !upkeep {
            self.weather = Weather::from_protocol(weather);
            self.weather_from_ability = from_ability && self.weather.is_some();
        }
    }

    /// Whether a weather ability entering now would stay quiet. Before gen 6
    /// it only does so if the weather is already the permanent kind.
    pub fn weather_locked(&self, weather: Weather, generation: u8) -> bool {
        self.weather == Some(weather) && (generation >= 6 || self.weather_from_ability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_weather() {
        let mut field = FieldState::new();
        field.apply_weather("RainDance", false, false);
        assert_eq!(field.weather, Some(Weather::Rain));

        field.apply_weather("RainDance", true, false);
        assert_eq!(field.weather, Some(Weather::Rain));

        field.apply_weather("none", false, false);
        assert_eq!(field.weather, None);
    }

    #[test]
    fn test_weather_locked_by_generation() {
        let mut field = FieldState::new();
        field.apply_weather("RainDance", false, false);
        assert!(!field.weather_locked(Weather::Rain, 3));
        assert!(field.weather_locked(Weather::Rain, 6));
        assert!(!field.weather_locked(Weather::Sun, 6));

        field.apply_weather("RainDance", false, true);
        assert!(field.weather_locked(Weather::Rain, 3));

        // Upkeep keeps where the weather came from
        field.apply_weather("RainDance", true, false);
        assert!(field.weather_from_ability);

        field.apply_weather("none", false, true);
        assert!(!field.weather_from_ability);
    }
}
