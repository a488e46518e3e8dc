use serde::{Deserialize, Serialize};

/// Added to the intelligence modifier when no vial override is set.
pub const DEFAULT_VIALS_BONUS: i32 = 2;

/// Added to the intelligence modifier when no daily preparation override is set.
pub const DEFAULT_ITEMS_BONUS: i32 = 4;

/// Client-scoped overrides for the two capacity formulas.
///
/// A value of `0` means "unset": the capacity falls back to
/// `intelligence modifier + bonus`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlembicSettings {
    /// Maximum Versatile Vials (0 = derive from intelligence)
    pub versatile_vials: u32,
    /// Number of daily preparations (0 = derive from intelligence)
    pub daily_preparations: u32,
}

impl AlembicSettings {
    /// The vial override, if one is set.
    pub fn vials_override(&self) -> Option<u32> {
        (self.versatile_vials != 0).then_some(self.versatile_vials)
    }

    /// The daily preparation override, if one is set.
    pub fn items_override(&self) -> Option<u32> {
        (self.daily_preparations != 0).then_some(self.daily_preparations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_means_unset() {
        let settings = AlembicSettings::default();
        assert_eq!(settings.vials_override(), None);
        assert_eq!(settings.items_override(), None);

        let settings = AlembicSettings {
            versatile_vials: 6,
            daily_preparations: 0,
        };
        assert_eq!(settings.vials_override(), Some(6));
        assert_eq!(settings.items_override(), None);
    }

    #[test]
    fn missing_fields_default_to_unset() {
        let settings: AlembicSettings = toml::from_str("versatile_vials = 3").unwrap();
        assert_eq!(settings.versatile_vials, 3);
        assert_eq!(settings.daily_preparations, 0);

        let text = toml::to_string(&settings).unwrap();
        assert!(text.contains("daily_preparations = 0"));
    }
}
