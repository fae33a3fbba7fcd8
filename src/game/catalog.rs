//! Contest-effect archetypes.
//!
//! The content pipeline describes each move with one of a fixed set of
//! contest-effect texts. Every text maps to the same numbers and flags, so
//! moves are built from an [`Archetype`] plus a name and a category.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::moves::{Category, Move, MoveId};
use super::state::Contestant;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Archetype {
    HighlyAppealing,
    SameTypeCombo,
    CopyAppeal,
    BetterIfLater,
    BetterIfEarlier,
    FinalAppeal,
    AnyContest,
    Repeatable,
    JamAndRest,
    StartleFront,
    StartleAll,
    StartleSameType,
    StartleFirst,
    StartleGoodAppeals,
    StartleAllBadly,
    StartleFavorite,
    FullProtection,
    OnceProtection,
    PumpUp,
    Reckless,
    Demoralize,
    Scramble,
    MoveEarlier,
    MoveLater,
    LastAppeal,
    FirstAppeal,
    Unnerve,
    Attract,
    Captivate,
    CopyAllAppeal,
    CrowdPleaser,
    PumpedUpAppeal,
    CrowdFirst,
}

impl Archetype {
    pub const ALL: [Archetype; 33] = [
        Archetype::HighlyAppealing,
        Archetype::SameTypeCombo,
        Archetype::CopyAppeal,
        Archetype::BetterIfLater,
        Archetype::BetterIfEarlier,
        Archetype::FinalAppeal,
        Archetype::AnyContest,
        Archetype::Repeatable,
        Archetype::JamAndRest,
        Archetype::StartleFront,
        Archetype::StartleAll,
        Archetype::StartleSameType,
        Archetype::StartleFirst,
        Archetype::StartleGoodAppeals,
        Archetype::StartleAllBadly,
        Archetype::StartleFavorite,
        Archetype::FullProtection,
        Archetype::OnceProtection,
        Archetype::PumpUp,
        Archetype::Reckless,
        Archetype::Demoralize,
        Archetype::Scramble,
        Archetype::MoveEarlier,
        Archetype::MoveLater,
        Archetype::LastAppeal,
        Archetype::FirstAppeal,
        Archetype::Unnerve,
        Archetype::Attract,
        Archetype::Captivate,
        Archetype::CopyAllAppeal,
        Archetype::CrowdPleaser,
        Archetype::PumpedUpAppeal,
        Archetype::CrowdFirst,
    ];

    pub fn description(self) -> &'static str {
        match self {
            Archetype::HighlyAppealing => "A highly appealing move.",
            Archetype::SameTypeCombo => "Works well if it's the same type as the one before.",
            Archetype::CopyAppeal => "Makes the appeal as good as the one before it.",
            Archetype::BetterIfLater => "The appeal works better the later it is performed.",
            Archetype::BetterIfEarlier => "The appeal works better the earlier it is performed.",
            Archetype::FinalAppeal => {
                "A fantastic appeal, but the user can no longer make future appeals."
            }
            Archetype::AnyContest => "An appeal that excites the audience in any contest.",
            Archetype::Repeatable => "Can be repeatedly used without boring the audience.",
            Archetype::JamAndRest => "Jams the others, and misses one turn of appeals.",
            Archetype::StartleFront => "Badly startles the contestant directly before the user.",
            Archetype::StartleAll => "Startles all contestants that have done their appeals.",
            Archetype::StartleSameType => "Startles contestants that made a same-type appeal.",
            Archetype::StartleFirst => "Badly startles the Pokémon that performed first.",
            Archetype::StartleGoodAppeals => "Badly startles all Pokémon that made good appeals.",
            Archetype::StartleAllBadly => "Badly startles those that have made appeals.",
            Archetype::StartleFavorite => "Startles the Pokémon that has the judge's attention.",
            Archetype::FullProtection => "Can avoid being startled by others.",
            Archetype::OnceProtection => "Can avoid being startled by others once.",
            Archetype::PumpUp => "Raises the user's confidence, making them harder to startle.",
            Archetype::Reckless => "Lowers the user's confidence, making them easier to startle.",
            Archetype::Demoralize => "Lowers the confidence of those who made appeals.",
            Archetype::Scramble => "Scrambles up the order of appeals on the next turn.",
            Archetype::MoveEarlier => "The next appeal can be made earlier next turn.",
            Archetype::MoveLater => "The next appeal can be made later next turn.",
            Archetype::LastAppeal => "The appeal works great if performed last.",
            Archetype::FirstAppeal => "The appeal works great if performed first.",
            Archetype::Unnerve => "Makes all contestants after the user nervous.",
            Archetype::Attract => "Makes contestants attracted to the user nervous.",
            Archetype::Captivate => {
                "Prevents the crowd from reacting to other contestants' appeals."
            }
            Archetype::CopyAllAppeal => {
                "Shows off the Pokémon's appeal about as well as all the moves before it this turn."
            }
            Archetype::CrowdPleaser => "Works better the more the crowd is excited.",
            Archetype::PumpedUpAppeal => "Works well if the user is pumped up.",
            Archetype::CrowdFirst => "Excites the audience a lot if used first.",
        }
    }

    /// Other wordings of the same effect found in scraped move data.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Archetype::HighlyAppealing => &["Quite an appealing move."],
            Archetype::SameTypeCombo => &[
                "Works well if it is the same type as the move used by the last Pokémon.",
            ],
            Archetype::CopyAppeal => &[
                "Makes the appeal as good as those before it.",
                "Shows off the Pokémon's appeal about as well as the move used just before it.",
            ],
            Archetype::BetterIfLater => &["Works better the later it is used in a turn."],
            Archetype::FinalAppeal => &[
                "Makes a great appeal, but allows no more to the end.",
                "A move of huge appeal, but using it prevents the user from taking further contest moves.",
            ],
            Archetype::AnyContest => &["Excites the audience in any kind of contest."],
            Archetype::Repeatable => &[
                "Can be repeatedly used without boring the judge.",
                "An appealing move that can be used repeatedly without boring the audience.",
            ],
            Archetype::StartleFront => &[
                "Badly startles the Pokémon in front.",
                "Badly startles the Pokémon directly before the user.",
                "Badly startles the last Pokémon to act before the user.",
            ],
            Archetype::StartleAll => &[
                "Startles all Pokémon that have done their appeals.",
                "Startles all of the Pokémon to act before the user.",
                "Startles the last Pokémon to act before the user.",
            ],
            Archetype::StartleSameType => &[
                "Startles Pokémon that made a same-type appeal.",
                "Badly startles Pokémon that used a move of the same type.",
            ],
            Archetype::StartleFirst => {
                &["Badly startles Pokémon that the audience has high expectations of."]
            }
            Archetype::StartleGoodAppeals => {
                &["Badly startles all Pokémon that successfully showed their appeal."]
            }
            Archetype::StartleAllBadly => {
                &["Badly startles all of the Pokémon to act before the user."]
            }
            Archetype::FullProtection => {
                &["Prevents the user from being startled until the turn ends."]
            }
            Archetype::OnceProtection => {
                &["Prevents the user from being startled one time this turn."]
            }
            Archetype::PumpUp => &[
                "Ups the user's condition. Helps prevent nervousness.",
                "Gets the Pokémon pumped up. Helps prevent nervousness, too.",
            ],
            Archetype::Reckless => &[
                "After this move, the user is more easily startled.",
                "A very appealing move, but after using this move, the user is more easily startled.",
            ],
            Archetype::Demoralize => &[
                "Worsens the condition of those that made appeals.",
                "Brings down the energy of any Pokémon that have already used a move this turn.",
            ],
            Archetype::Scramble => {
                &["Scrambles the order in which Pokémon will move on the next turn."]
            }
            Archetype::MoveEarlier => &["Causes the user to move earlier on the next turn."],
            Archetype::MoveLater => &["Causes the user to move later on the next turn."],
            Archetype::LastAppeal => &["Works great if the user goes last this turn."],
            Archetype::FirstAppeal => &["Works great if the user goes first this turn."],
            Archetype::Unnerve => &[
                "Makes all Pokémon after the user nervous.",
                "Makes the remaining Pokémon nervous.",
            ],
            Archetype::Captivate => &[
                "Temporarily stops the crowd from getting excited.",
                "Temporarily stops the crowd from growing excited.",
                "Shifts the judge's attention from others.",
                "Makes audience expect little of other contestants.",
                "Prevents the crowd from reacting to other Pokémon's appeals.",
            ],
            Archetype::BetterIfEarlier
            | Archetype::StartleFavorite
            | Archetype::CopyAllAppeal
            | Archetype::CrowdPleaser
            | Archetype::PumpedUpAppeal
            | Archetype::CrowdFirst
            | Archetype::JamAndRest
            | Archetype::Attract => &[],
        }
    }

    /// Looks an effect text up, tolerating curly or mis-decoded apostrophes,
    /// doubled spaces, letter case and a missing final period.
    pub fn from_description(description: &str) -> Option<Self> {
        let wanted = normalize_description(description);
        Self::ALL.iter().copied().find(|archetype| {
            std::iter::once(archetype.description())
                .chain(archetype.aliases().iter().copied())
                .any(|text| normalize_description(text) == wanted)
        })
    }

    pub fn build(self, id: MoveId, name: impl Into<String>, category: Category) -> Move {
        let base = |appeal: i32| {
            Move::new(id, String::new(), category, appeal).with_description(self.description())
        };
        let mut mv = match self {
            Archetype::HighlyAppealing => base(4),
            Archetype::SameTypeCombo => {
                let mut mv = base(2);
                mv.same_type_bonus = true;
                mv
            }
            Archetype::CopyAppeal => {
                let mut mv = base(0);
                mv.copies_previous_score = true;
                mv
            }
            Archetype::BetterIfLater => {
                let mut mv = base(0);
                mv.better_if_later = true;
                mv
            }
            Archetype::BetterIfEarlier => {
                let mut mv = base(0);
                mv.better_if_earlier = true;
                mv
            }
            Archetype::FinalAppeal => base(8).with_exhaust(2),
            Archetype::AnyContest => {
                let mut mv = base(2);
                mv.works_in_any_category = true;
                mv
            }
            Archetype::Repeatable => {
                let mut mv = base(3);
                mv.repeatable = true;
                mv
            }
            Archetype::JamAndRest => base(4).with_jam(4).with_exhaust(1),
            Archetype::StartleFront => base(1).with_jam(3),
            Archetype::StartleAll => base(2).with_jam(1),
            Archetype::StartleSameType => {
                let mut mv = base(2).with_jam(1);
                mv.same_type_jam_bonus = true;
                mv
            }
            Archetype::FullProtection => base(1).with_protection(2),
            Archetype::OnceProtection => base(2).with_protection(1),
            Archetype::PumpUp => base(1).with_confidence(1),
            Archetype::Reckless => base(6).with_confidence(-1),
            Archetype::Demoralize => {
                let mut mv = base(1);
                mv.lowers_others_confidence = true;
                mv
            }
            Archetype::Scramble => {
                let mut mv = base(3);
                mv.scrambles_order = true;
                mv
            }
            Archetype::MoveEarlier => {
                let mut mv = base(3);
                mv.priority = true;
                mv
            }
            Archetype::MoveLater => {
                let mut mv = base(3);
                mv.deprioritize = true;
                mv
            }
            Archetype::LastAppeal => {
                let mut mv = base(2);
                mv.last_turn_bonus = true;
                mv
            }
            Archetype::FirstAppeal => {
                let mut mv = base(2);
                mv.first_turn_bonus = true;
                mv
            }
            Archetype::Unnerve => base(2).with_nervous(1),
            Archetype::Attract => {
                let mut mv = base(2).with_nervous(2);
                mv.gender_based = true;
                mv
            }
            Archetype::Captivate => {
                let mut mv = base(3);
                mv.captivates_crowd = true;
                mv
            }
            Archetype::StartleFirst => base(2).with_jam(1),
            Archetype::StartleGoodAppeals
            | Archetype::StartleAllBadly
            | Archetype::StartleFavorite => base(1).with_jam(3),
            Archetype::CopyAllAppeal => {
                let mut mv = base(0);
                mv.copies_all_previous = true;
                mv
            }
            Archetype::CrowdPleaser => {
                let mut mv = base(1);
                mv.better_with_excitement = true;
                mv
            }
            Archetype::PumpedUpAppeal => {
                let mut mv = base(1);
                mv.better_if_confident = true;
                mv
            }
            Archetype::CrowdFirst => {
                let mut mv = base(2);
                mv.excites_if_first = true;
                mv
            }
        };
        mv.name = name.into();
        mv
    }
}

fn normalize_description(text: &str) -> String {
    let text = text.replace("â€™", "'").replace('\u{2019}', "'");
    let words: Vec<&str> = text.split_whitespace().collect();
    words.join(" ").trim_end_matches('.').to_lowercase()
}

fn shared(archetype: Archetype, id: MoveId, name: &str, category: Category) -> Arc<Move> {
    Arc::new(archetype.build(id, name, category))
}

/// Four contestants with four moves each, spanning most archetypes.
pub fn demo_roster() -> Vec<Contestant> {
    vec![
        Contestant::new(
            0,
            "Pikachu",
            "Pikachu",
            0,
            0,
            vec![
                shared(Archetype::FirstAppeal, 1, "Quick Attack", Category::Cool),
                shared(Archetype::HighlyAppealing, 2, "Thunderbolt", Category::Cool),
                shared(Archetype::MoveEarlier, 3, "Agility", Category::Cool),
                shared(Archetype::Captivate, 4, "Charm", Category::Cute),
            ],
        ),
        Contestant::new(
            1,
            "Gengar",
            "Gengar",
            0,
            0,
            vec![
                shared(Archetype::StartleAll, 5, "Shadow Ball", Category::Smart),
                shared(Archetype::Unnerve, 6, "Hypnosis", Category::Smart),
                shared(Archetype::CopyAppeal, 7, "Mimic", Category::Cute),
                shared(Archetype::Reckless, 8, "Curse", Category::Tough),
            ],
        ),
        Contestant::new(
            2,
            "Milotic",
            "Milotic",
            1,
            0,
            vec![
                shared(Archetype::OnceProtection, 9, "Protect", Category::Cute),
                shared(Archetype::AnyContest, 10, "Aqua Ring", Category::Beauty),
                shared(Archetype::Attract, 11, "Attract", Category::Cute),
                shared(Archetype::BetterIfLater, 12, "Water Pulse", Category::Beauty),
            ],
        ),
        Contestant::new(
            3,
            "Machamp",
            "Machamp",
            0,
            0,
            vec![
                shared(Archetype::PumpUp, 13, "Bulk Up", Category::Tough),
                shared(Archetype::StartleFront, 14, "Cross Chop", Category::Cool),
                shared(Archetype::Repeatable, 15, "Karate Chop", Category::Tough),
                shared(Archetype::LastAppeal, 16, "Revenge", Category::Tough),
            ],
        ),
    ]
}
