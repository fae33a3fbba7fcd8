use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use super::catalog;
use super::moves::{Category, Move};

/// Number of contestants in every match.
pub const CONTESTANTS: usize = 4;

/// Contestant identifier, equal to the contestant's index in the roster.
pub type ContestantId = u8;

/// Runtime state of one competing party.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contestant {
    pub id: ContestantId,
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub sex: u8,
    #[serde(default)]
    pub orientation: u8,
    #[serde(default)]
    pub current_score: i32,
    /// Target the heart animation is catching up to.
    #[serde(default)]
    pub future_score: i32,
    #[serde(default)]
    pub confidence: i32,
    #[serde(default)]
    pub nervous: bool,
    #[serde(default)]
    pub protection: u8,
    #[serde(default)]
    pub total_score: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_moves: Vec<Arc<Move>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_move: Option<Arc<Move>>,
    /// 0 = none, 1..=4 = forced slot next round, negative = random tail pool.
    #[serde(default)]
    pub turn_order_override: i8,
    /// Set by a move that spends the contestant for the rest of the match.
    #[serde(default)]
    pub exhausted: bool,
    /// Skips the next turn.
    #[serde(default)]
    pub resting: bool,
}

impl Contestant {
    pub fn new(
        id: ContestantId,
        name: impl Into<String>,
        display_name: impl Into<String>,
        sex: u8,
        orientation: u8,
        selected_moves: Vec<Arc<Move>>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            display_name: display_name.into(),
            sex,
            orientation,
            current_score: 0,
            future_score: 0,
            confidence: 0,
            nervous: false,
            protection: 0,
            total_score: 0,
            selected_moves,
            chosen_move: None,
            turn_order_override: 0,
            exhausted: false,
            resting: false,
        }
    }

    /// Stages a score change. `current_score` only moves through the heart
    /// animation.
    pub fn apply_score_delta(&mut self, delta: i32) {
        self.future_score = self.current_score + delta;
    }

    /// Clears per-round state. Confidence and the running total survive.
    pub fn reset_for_next_round(&mut self) {
        self.current_score = 0;
        self.future_score = 0;
        self.nervous = false;
        self.protection = 0;
    }

    /// Puts the contestant into the state every match starts from.
    pub fn prepare_for_match(&mut self) {
        self.reset_for_next_round();
        self.confidence = 0;
        self.total_score = 0;
        self.chosen_move = None;
        self.turn_order_override = 0;
        self.exhausted = false;
        self.resting = false;
    }

    pub fn is_settled(&self) -> bool {
        self.current_score == self.future_score
    }
}

/// Snapshot of one contestant for round and match summaries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Standing {
    pub contestant: ContestantId,
    pub name: String,
    pub display_name: String,
    pub current_score: i32,
    pub total_score: i32,
}

/// Presentation events produced by the engine. Each one must be
/// acknowledged by the host before the engine continues.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ContestEvent {
    Message {
        text: String,
    },
    ScoreStep {
        contestant: ContestantId,
        score: i32,
    },
    RoundEnd {
        round: u32,
        standings: Vec<Standing>,
    },
    MatchEnd {
        standings: Vec<Standing>,
    },
}

impl ContestEvent {
    pub fn message(text: impl Into<String>) -> Self {
        ContestEvent::Message { text: text.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum IntegrityError {
    #[error("expected {expected} contestants, found {found}")]
    ContestantCount { expected: usize, found: usize },
    #[error("contestant at index {index} carries id {id}")]
    MisplacedContestant { index: usize, id: ContestantId },
    #[error("turn order is not a permutation of the roster")]
    InvalidTurnOrder,
    #[error("contestant {contestant} has protection {value}")]
    ProtectionOutOfRange { contestant: ContestantId, value: u8 },
    #[error("human slot {contestant} is not in the roster")]
    UnknownHuman { contestant: ContestantId },
}

/// Whole-match state, owned by the engine and mutated only by the active
/// resolution path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchState {
    pub contestants: Vec<Contestant>,
    pub turn_order: Vec<ContestantId>,
    pub active_turn: usize,
    pub round: u32,
    pub category: Category,
    pub human: ContestantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crowd_capture: Option<ContestantId>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub previous_round_moves: BTreeMap<ContestantId, Arc<Move>>,
    /// Move performed at each turn index this round, `None` for skipped turns.
    #[serde(default)]
    pub round_moves: Vec<Option<Arc<Move>>>,
    #[serde(default)]
    pub cheer_level: i32,
    #[serde(default)]
    pub silent_streak: u32,
    #[serde(default)]
    pub waiting_for_player: bool,
    #[serde(default)]
    pub finished: bool,
}

impl MatchState {
    pub fn new(contestants: Vec<Contestant>, category: Category, human: ContestantId) -> Self {
        let turn_order = contestants.iter().map(|contestant| contestant.id).collect();
        let slots = contestants.len();
        Self {
            contestants,
            turn_order,
            active_turn: 0,
            round: 1,
            category,
            human,
            crowd_capture: None,
            previous_round_moves: BTreeMap::new(),
            round_moves: vec![None; slots],
            cheer_level: 0,
            silent_streak: 0,
            waiting_for_player: false,
            finished: false,
        }
    }

    pub fn contestant(&self, id: ContestantId) -> Option<&Contestant> {
        self.contestants.get(usize::from(id))
    }

    pub fn contestant_mut(&mut self, id: ContestantId) -> Option<&mut Contestant> {
        self.contestants.get_mut(usize::from(id))
    }

    pub fn display_name(&self, id: ContestantId) -> &str {
        self.contestant(id)
            .map(|contestant| contestant.display_name.as_str())
            .unwrap_or("???")
    }

    pub fn contestant_at(&self, turn_index: usize) -> Option<ContestantId> {
        self.turn_order.get(turn_index).copied()
    }

    pub fn turn_index_of(&self, id: ContestantId) -> Option<usize> {
        self.turn_order.iter().position(|entry| *entry == id)
    }

    pub fn last_turn_index(&self) -> usize {
        self.turn_order.len().saturating_sub(1)
    }

    pub fn active_contestant(&self) -> Option<ContestantId> {
        self.contestant_at(self.active_turn)
    }

    /// Move performed at `turn_index` this round, if that turn was played.
    pub fn performed_at(&self, turn_index: usize) -> Option<&Arc<Move>> {
        self.round_moves.get(turn_index).and_then(Option::as_ref)
    }

    pub fn begin_round(&mut self) {
        self.active_turn = 0;
        self.round_moves = vec![None; self.turn_order.len()];
    }

    /// Standings ordered by total score, highest first. Ties keep roster order.
    pub fn standings(&self) -> Vec<Standing> {
        let mut standings: Vec<Standing> = self
            .contestants
            .iter()
            .map(|contestant| Standing {
                contestant: contestant.id,
                name: contestant.name.clone(),
                display_name: contestant.display_name.clone(),
                current_score: contestant.current_score,
                total_score: contestant.total_score,
            })
            .collect();
        standings.sort_by(|a, b| b.total_score.cmp(&a.total_score));
        standings
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        if self.contestants.len() != CONTESTANTS {
            return Err(IntegrityError::ContestantCount {
                expected: CONTESTANTS,
                found: self.contestants.len(),
            });
        }

        for (index, contestant) in self.contestants.iter().enumerate() {
            if usize::from(contestant.id) != index {
                return Err(IntegrityError::MisplacedContestant {
                    index,
                    id: contestant.id,
                });
            }
            if contestant.protection > 2 {
                return Err(IntegrityError::ProtectionOutOfRange {
                    contestant: contestant.id,
                    value: contestant.protection,
                });
            }
        }

        let unique: HashSet<ContestantId> = self.turn_order.iter().copied().collect();
        if self.turn_order.len() != CONTESTANTS
            || unique.len() != CONTESTANTS
            || self.turn_order.iter().any(|id| self.contestant(*id).is_none())
        {
            return Err(IntegrityError::InvalidTurnOrder);
        }

        if self.contestant(self.human).is_none() {
            return Err(IntegrityError::UnknownHuman {
                contestant: self.human,
            });
        }

        Ok(())
    }

    /// A small ready-to-run match, handy for hosts and tests.
    pub fn sample() -> Self {
        MatchState::new(catalog::demo_roster(), Category::Cool, 0)
    }
}
