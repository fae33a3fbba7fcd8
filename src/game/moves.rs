use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Move identifier assigned by the content pipeline.
pub type MoveId = u32;

/// Contest categories. The numeric index is what the content pipeline and
/// the contest setup use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Cool,
    Beauty,
    Smart,
    Tough,
    Cute,
    Scary,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Cool,
        Category::Beauty,
        Category::Smart,
        Category::Tough,
        Category::Cute,
        Category::Scary,
    ];

    pub fn index(self) -> u8 {
        match self {
            Category::Cool => 0,
            Category::Beauty => 1,
            Category::Smart => 2,
            Category::Tough => 3,
            Category::Cute => 4,
            Category::Scary => 5,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Cool => "Cool",
            Category::Beauty => "Beauty",
            Category::Smart => "Smart",
            Category::Tough => "Tough",
            Category::Cute => "Cute",
            Category::Scary => "Scary",
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Cool
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cool" | "0" => Ok(Category::Cool),
            "beauty" | "beautiful" | "1" => Ok(Category::Beauty),
            "smart" | "clever" | "2" => Ok(Category::Smart),
            "tough" | "3" => Ok(Category::Tough),
            "cute" | "4" => Ok(Category::Cute),
            "scary" | "5" => Ok(Category::Scary),
            _ => Err(()),
        }
    }
}

/// Reasons a move definition is rejected at load time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum MoveError {
    #[error("move {move_id} has negative appeal {value}")]
    NegativeAppeal { move_id: MoveId, value: i32 },
    #[error("move {move_id} has negative jam {value}")]
    NegativeJam { move_id: MoveId, value: i32 },
    #[error("move {move_id} protection {value} is outside 0..=2")]
    ProtectionOutOfRange { move_id: MoveId, value: i32 },
    #[error("move {move_id} nervous {value} is outside 0..=2")]
    NervousOutOfRange { move_id: MoveId, value: i32 },
    #[error("move {move_id} has negative exhaust turns {value}")]
    NegativeExhaust { move_id: MoveId, value: i32 },
    #[error("move {move_id} combines {count} appeal baseline effects")]
    ConflictingBaselines { move_id: MoveId, count: usize },
}

/// Static description of a contest move.
///
/// Moves are read-only once loaded and are shared between contestants
/// through `Arc<Move>`. Numeric fields stay signed so that malformed
/// pipeline output can be represented and rejected by [`Move::validate`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Move {
    pub id: MoveId,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub appeal: i32,
    #[serde(default)]
    pub jam: i32,
    #[serde(default)]
    pub protection: i32,
    #[serde(default)]
    pub nervous: i32,
    #[serde(default)]
    pub confidence: i32,
    #[serde(default)]
    pub priority: bool,
    #[serde(default)]
    pub deprioritize: bool,
    #[serde(default)]
    pub scrambles_order: bool,
    #[serde(default)]
    pub first_turn_bonus: bool,
    #[serde(default)]
    pub last_turn_bonus: bool,
    #[serde(default)]
    pub gender_based: bool,
    #[serde(default)]
    pub captivates_crowd: bool,
    #[serde(default)]
    pub same_type_bonus: bool,
    #[serde(default)]
    pub same_type_jam_bonus: bool,
    #[serde(default)]
    pub lowers_others_confidence: bool,
    #[serde(default)]
    pub repeatable: bool,
    #[serde(default)]
    pub works_in_any_category: bool,
    #[serde(default)]
    pub copies_previous_score: bool,
    #[serde(default)]
    pub better_if_later: bool,
    #[serde(default)]
    pub better_if_earlier: bool,
    #[serde(default)]
    pub copies_all_previous: bool,
    #[serde(default)]
    pub better_with_excitement: bool,
    #[serde(default)]
    pub better_if_confident: bool,
    #[serde(default)]
    pub excites_if_first: bool,
    #[serde(default)]
    pub exhaust_turns: i32,
}

impl Move {
    pub fn new(id: MoveId, name: impl Into<String>, category: Category, appeal: i32) -> Self {
        Self {
            id,
            name: name.into(),
            category,
            appeal,
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_jam(mut self, jam: i32) -> Self {
        self.jam = jam;
        self
    }

    pub fn with_nervous(mut self, nervous: i32) -> Self {
        self.nervous = nervous;
        self
    }

    pub fn with_protection(mut self, protection: i32) -> Self {
        self.protection = protection;
        self
    }

    pub fn with_confidence(mut self, confidence: i32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_exhaust(mut self, turns: i32) -> Self {
        self.exhaust_turns = turns;
        self
    }

    /// Number of flags that replace the plain `appeal` baseline.
    pub fn baseline_effects(&self) -> usize {
        [
            self.same_type_bonus,
            self.copies_previous_score,
            self.better_if_later,
            self.better_if_earlier,
            self.copies_all_previous,
            self.better_with_excitement,
        ]
        .iter()
        .filter(|flag| **flag)
        .count()
    }

    pub fn validate(&self) -> Result<(), MoveError> {
        let move_id = self.id;
        if self.appeal < 0 {
            return Err(MoveError::NegativeAppeal {
                move_id,
                value: self.appeal,
            });
        }
        if self.jam < 0 {
            return Err(MoveError::NegativeJam {
                move_id,
                value: self.jam,
            });
        }
        if !(0..=2).contains(&self.protection) {
            return Err(MoveError::ProtectionOutOfRange {
                move_id,
                value: self.protection,
            });
        }
        if !(0..=2).contains(&self.nervous) {
            return Err(MoveError::NervousOutOfRange {
                move_id,
                value: self.nervous,
            });
        }
        if self.exhaust_turns < 0 {
            return Err(MoveError::NegativeExhaust {
                move_id,
                value: self.exhaust_turns,
            });
        }
        let count = self.baseline_effects();
        if count > 1 {
            return Err(MoveError::ConflictingBaselines { move_id, count });
        }
        Ok(())
    }

    /// Whether the crowd reacts favourably to this move in a contest of
    /// the given category.
    pub fn suits(&self, category: Category) -> bool {
        self.works_in_any_category || self.category == category
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_index() {
        for category in Category::ALL {
            assert_eq!(Category::from_index(category.index()), Some(category));
        }
        assert_eq!(Category::from_index(6), None);
        assert_eq!("Beauty".parse::<Category>(), Ok(Category::Beauty));
        assert_eq!("5".parse::<Category>(), Ok(Category::Scary));
    }

    #[test]
    fn validation_rejects_malformed_moves() {
        let negative = Move::new(1, "Sulk", Category::Cute, -1);
        assert!(matches!(
            negative.validate(),
            Err(MoveError::NegativeAppeal { move_id: 1, value: -1 })
        ));

        let shielded = Move::new(2, "Wall", Category::Tough, 1).with_protection(3);
        assert!(matches!(
            shielded.validate(),
            Err(MoveError::ProtectionOutOfRange { value: 3, .. })
        ));

        let unnerving = Move::new(3, "Glare", Category::Scary, 1).with_nervous(-1);
        assert!(matches!(
            unnerving.validate(),
            Err(MoveError::NervousOutOfRange { value: -1, .. })
        ));

        let jammer = Move::new(4, "Screech", Category::Smart, 1).with_jam(-2);
        assert!(matches!(jammer.validate(), Err(MoveError::NegativeJam { .. })));
    }

    #[test]
    fn validation_rejects_stacked_baselines() {
        let mut mv = Move::new(5, "Mimic", Category::Smart, 0);
        mv.copies_previous_score = true;
        mv.better_if_later = true;
        assert!(matches!(
            mv.validate(),
            Err(MoveError::ConflictingBaselines { count: 2, .. })
        ));

        mv.better_if_later = false;
        assert!(mv.validate().is_ok());
    }

    #[test]
    fn move_deserializes_with_defaults() {
        let json = r#"{"id":7,"name":"Spark","category":"Cool","appeal":3,"priority":true}"#;
        let mv: Move = serde_json::from_str(json).expect("move json should parse");
        assert_eq!(mv.appeal, 3);
        assert!(mv.priority);
        assert_eq!(mv.jam, 0);
        assert!(!mv.repeatable);
        assert!(mv.validate().is_ok());
    }
}
