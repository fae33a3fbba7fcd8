use std::str::FromStr;
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::game::{
    resolve_stage, ContestantId, MatchState, Move, MoveId, Stage, StageContext, StageQueue,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AiStrategy {
    /// Chases its own appeal.
    Showy,
    /// Values knocking hearts off the others as much as its own appeal.
    Disruptive,
    Random,
    /// Plays showy while ahead and disruptive while behind.
    Adaptive,
}

impl FromStr for AiStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "showy" | "appeal" => Ok(AiStrategy::Showy),
            "disruptive" | "jam" => Ok(AiStrategy::Disruptive),
            "random" => Ok(AiStrategy::Random),
            "adaptive" | "balanced" => Ok(AiStrategy::Adaptive),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiDifficulty {
    Easy,
    #[default]
    Normal,
    Hard,
    Expert,
}

impl AiDifficulty {
    /// Numeric contest level as hosts pass it: 0 is easy, 3 and above expert.
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => AiDifficulty::Easy,
            1 => AiDifficulty::Normal,
            2 => AiDifficulty::Hard,
            _ => AiDifficulty::Expert,
        }
    }
}

impl FromStr for AiDifficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" | "normal rank" => Ok(AiDifficulty::Easy),
            "normal" | "medium" | "super" => Ok(AiDifficulty::Normal),
            "hard" | "hyper" => Ok(AiDifficulty::Hard),
            "expert" | "master" => Ok(AiDifficulty::Expert),
            other => other.parse::<u8>().map(AiDifficulty::from_level).map_err(|_| ()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub randomness: f64,
    pub strategy: AiStrategy,
}

impl AiConfig {
    pub fn from_difficulty(difficulty: AiDifficulty) -> Self {
        match difficulty {
            AiDifficulty::Easy => Self {
                randomness: 1.0,
                strategy: AiStrategy::Random,
            },
            AiDifficulty::Normal => Self {
                randomness: 1.5,
                strategy: AiStrategy::Showy,
            },
            AiDifficulty::Hard => Self {
                randomness: 0.5,
                strategy: AiStrategy::Disruptive,
            },
            AiDifficulty::Expert => Self {
                randomness: 0.0,
                strategy: AiStrategy::Adaptive,
            },
        }
    }

    pub fn with_strategy(mut self, strategy: AiStrategy) -> Self {
        self.strategy = strategy;
        if matches!(self.strategy, AiStrategy::Random) {
            self.randomness = self.randomness.max(1.0);
        }
        self
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig::from_difficulty(AiDifficulty::Normal)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiDecision {
    pub contestant: ContestantId,
    /// Index into the contestant's `selected_moves`.
    pub slot: usize,
    pub move_id: MoveId,
    pub evaluation: f64,
    pub candidates: usize,
    pub strategy: AiStrategy,
}

#[derive(Debug, Clone, Copy)]
struct StrategyWeights {
    own: f64,
    disruption: f64,
    status: f64,
}

pub struct AiAgent {
    config: AiConfig,
    rng: SmallRng,
}

impl AiAgent {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(config: AiConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Picks one of `contestant`'s moves for the round about to open.
    ///
    /// Every candidate is played out on a copy of the match at the
    /// contestant's slot in the upcoming order; stages that need the rest of
    /// the round (round end, later jams) are not simulated.
    pub fn choose_move(
        &mut self,
        state: &MatchState,
        contestant: ContestantId,
        cheer_threshold: u8,
    ) -> Option<AiDecision> {
        let moves = &state.contestant(contestant)?.selected_moves;
        if moves.is_empty() {
            return None;
        }

        let strategy = self.config.strategy;
        if strategy == AiStrategy::Random {
            let slot = self.rng.gen_range(0..moves.len());
            return Some(AiDecision {
                contestant,
                slot,
                move_id: moves[slot].id,
                evaluation: 0.0,
                candidates: moves.len(),
                strategy,
            });
        }

        let weights = self.weights(state, contestant);
        let mut best: Option<(usize, f64, f64)> = None;
        for (slot, mv) in moves.iter().enumerate() {
            let score = self.simulate(state, contestant, mv, cheer_threshold, weights);
            let comparison = score + self.random_noise();
            tracing::debug!(contestant, slot, move_id = mv.id, score, comparison, "ai candidate");
            if best.map_or(true, |(_, _, current)| comparison > current) {
                best = Some((slot, score, comparison));
            }
        }

        let (slot, evaluation, _) = best?;
        Some(AiDecision {
            contestant,
            slot,
            move_id: moves[slot].id,
            evaluation,
            candidates: moves.len(),
            strategy,
        })
    }

    fn weights(&self, state: &MatchState, contestant: ContestantId) -> StrategyWeights {
        match self.config.strategy {
            AiStrategy::Showy | AiStrategy::Random => StrategyWeights {
                own: 1.0,
                disruption: 0.2,
                status: 0.3,
            },
            AiStrategy::Disruptive => StrategyWeights {
                own: 0.7,
                disruption: 1.4,
                status: 1.0,
            },
            AiStrategy::Adaptive => {
                let leading = state
                    .standings()
                    .first()
                    .is_some_and(|standing| standing.contestant == contestant);
                if leading {
                    StrategyWeights {
                        own: 1.2,
                        disruption: 0.4,
                        status: 1.2,
                    }
                } else {
                    StrategyWeights {
                        own: 1.0,
                        disruption: 1.2,
                        status: 0.6,
                    }
                }
            }
        }
    }

    fn simulate(
        &mut self,
        state: &MatchState,
        contestant: ContestantId,
        mv: &Arc<Move>,
        cheer_threshold: u8,
        weights: StrategyWeights,
    ) -> f64 {
        let Some(turn_index) = state.turn_index_of(contestant) else {
            return f64::NEG_INFINITY;
        };
        let mut sandbox = state.clone();
        sandbox.begin_round();
        let Some(actor) = sandbox.contestant_mut(contestant) else {
            return f64::NEG_INFINITY;
        };
        actor.chosen_move = Some(Arc::clone(mv));

        let ctx = StageContext {
            actor: contestant,
            turn_index,
            last_index: sandbox.last_turn_index(),
            mv: Arc::clone(mv),
            cheer_threshold,
        };
        let mut queue = match sandbox.contestant(contestant) {
            Some(actor) => StageQueue::build(actor, &ctx),
            None => return f64::NEG_INFINITY,
        };

        let mut rolls = SmallRng::seed_from_u64(self.rng.gen());
        while let Some(stage) = queue.pop() {
            if stage != Stage::RoundEnd {
                resolve_stage(stage, &ctx, &mut sandbox, &mut rolls);
            }
        }

        let own = score_of(&sandbox, contestant) - score_of(state, contestant);
        let disruption: i32 = state
            .contestants
            .iter()
            .filter(|other| other.id != contestant)
            .map(|other| (other.current_score - score_of(&sandbox, other.id)).max(0))
            .sum();
        let later = sandbox.last_turn_index().saturating_sub(turn_index) as f64;
        let mut status = f64::from(mv.confidence) * 0.5 + f64::from(mv.nervous) * later * 0.4;
        // protection only pays off if someone can still jam us this round
        if later > 0.0 {
            let protection = sandbox.contestant(contestant).map_or(0, |actor| actor.protection);
            status += f64::from(protection) * 0.5;
        }
        if mv.priority {
            status += 0.5;
        }

        f64::from(own) * weights.own + f64::from(disruption) * weights.disruption
            + status * weights.status
    }

    fn random_noise(&mut self) -> f64 {
        if self.config.randomness <= 0.0 {
            0.0
        } else {
            (self.rng.gen::<f64>() - 0.5) * 2.0 * self.config.randomness
        }
    }
}

fn score_of(state: &MatchState, contestant: ContestantId) -> i32 {
    state
        .contestant(contestant)
        .map(|contestant| contestant.current_score)
        .unwrap_or_default()
}
