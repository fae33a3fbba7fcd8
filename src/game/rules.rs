use std::collections::VecDeque;
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::ai::{AiAgent, AiConfig, AiDifficulty};

use super::{
    config::ContestConfig,
    effects::{animate_hearts, resolve_stage, Stage, StageContext, StageQueue},
    moves::{Category, MoveError},
    order,
    state::{Contestant, ContestEvent, ContestantId, IntegrityError, MatchState, Standing},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitMoveAction {
    pub contestant: ContestantId,
    pub slot: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum RuleError {
    #[error("the match is already over")]
    MatchFinished,
    #[error("no move is being waited on")]
    NotWaitingForPlayer,
    #[error("contestant {contestant} is not controlled by the player")]
    NotHumanSlot { contestant: ContestantId },
    #[error("contestant {contestant} does not exist")]
    ContestantNotFound { contestant: ContestantId },
    #[error("contestant {contestant} has no move in slot {slot}")]
    EmptyMoveSlot { contestant: ContestantId, slot: usize },
    #[error("invalid roster: {error}")]
    InvalidRoster { error: IntegrityError },
    #[error("contestant {contestant} carries an invalid move: {error}")]
    InvalidMove {
        contestant: ContestantId,
        error: MoveError,
    },
    #[error("the previous event has not been acknowledged")]
    AckPending,
    #[error("there is no event to acknowledge")]
    NothingToAcknowledge,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Step {
    Event { event: ContestEvent },
    /// The round is blocked until `submit_move` is called for `contestant`.
    AwaitingMove { contestant: ContestantId },
    Finished,
}

/// Presentation callbacks used by [`ContestEngine::run`]. Returning from a
/// callback is the acknowledgement.
pub trait Presenter {
    fn on_message(&mut self, text: &str);
    fn on_score_step(&mut self, contestant: ContestantId, score: i32);
    fn on_round_end(&mut self, round: u32, standings: &[Standing]);
    fn on_match_end(&mut self, standings: &[Standing]);
}

/// Drives a match one presentation event at a time.
///
/// Stages are resolved lazily: the next stage only runs once every event of
/// the previous one has been handed out and acknowledged, so hosts can pace
/// text and heart animation however they like.
pub struct ContestEngine {
    state: MatchState,
    config: ContestConfig,
    difficulty: AiDifficulty,
    ai: AiAgent,
    rng: SmallRng,
    pending: VecDeque<ContestEvent>,
    awaiting_ack: bool,
    turn: Option<StageContext>,
    stages: StageQueue,
}

impl ContestEngine {
    pub fn start_match(
        mut contestants: Vec<Contestant>,
        category: Category,
        difficulty: AiDifficulty,
        config: ContestConfig,
    ) -> Result<Self, RuleError> {
        for contestant in &contestants {
            if contestant.selected_moves.is_empty() {
                return Err(RuleError::EmptyMoveSlot {
                    contestant: contestant.id,
                    slot: 0,
                });
            }
            for mv in &contestant.selected_moves {
                mv.validate().map_err(|error| RuleError::InvalidMove {
                    contestant: contestant.id,
                    error,
                })?;
            }
        }

        for contestant in &mut contestants {
            contestant.prepare_for_match();
        }
        let state = MatchState::new(contestants, category, config.human_slot);
        Self::ensure_integrity(&state)?;

        let (rng, ai) = match config.seed {
            Some(seed) => (
                SmallRng::seed_from_u64(seed),
                AiAgent::with_seed(AiConfig::from_difficulty(difficulty), seed.wrapping_add(1)),
            ),
            None => (
                SmallRng::from_entropy(),
                AiAgent::new(AiConfig::from_difficulty(difficulty)),
            ),
        };

        let mut engine = Self {
            state,
            config,
            difficulty,
            ai,
            rng,
            pending: VecDeque::new(),
            awaiting_ack: false,
            turn: None,
            stages: StageQueue::default(),
        };
        tracing::info!(
            category = %category,
            ?difficulty,
            rounds = engine.config.max_rounds,
            "match started"
        );
        engine.announce_match();
        engine.open_round();
        Ok(engine)
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn config(&self) -> &ContestConfig {
        &self.config
    }

    pub fn difficulty(&self) -> AiDifficulty {
        self.difficulty
    }

    pub fn is_awaiting_ack(&self) -> bool {
        self.awaiting_ack
    }

    fn ensure_integrity(state: &MatchState) -> Result<(), RuleError> {
        state
            .integrity_check()
            .map_err(|error| RuleError::InvalidRoster { error })
    }

    fn ensure_waiting(state: &MatchState) -> Result<(), RuleError> {
        if state.finished {
            return Err(RuleError::MatchFinished);
        }
        if !state.waiting_for_player {
            return Err(RuleError::NotWaitingForPlayer);
        }
        Ok(())
    }

    fn ensure_human(state: &MatchState, contestant: ContestantId) -> Result<(), RuleError> {
        if state.contestant(contestant).is_none() {
            return Err(RuleError::ContestantNotFound { contestant });
        }
        if contestant != state.human {
            return Err(RuleError::NotHumanSlot { contestant });
        }
        Ok(())
    }

    pub fn submit_move(&mut self, action: SubmitMoveAction) -> Result<(), RuleError> {
        match self.try_submit(&action) {
            Ok(()) => {
                tracing::debug!(
                    contestant = action.contestant,
                    slot = action.slot,
                    round = self.state.round,
                    "move submitted"
                );
                Ok(())
            }
            Err(error) => {
                tracing::warn!(
                    contestant = action.contestant,
                    slot = action.slot,
                    %error,
                    "move submission rejected"
                );
                Err(error)
            }
        }
    }

    fn try_submit(&mut self, action: &SubmitMoveAction) -> Result<(), RuleError> {
        Self::ensure_waiting(&self.state)?;
        Self::ensure_human(&self.state, action.contestant)?;

        let contestant = self
            .state
            .contestant_mut(action.contestant)
            .ok_or(RuleError::ContestantNotFound {
                contestant: action.contestant,
            })?;
        let mv = contestant
            .selected_moves
            .get(action.slot)
            .cloned()
            .ok_or(RuleError::EmptyMoveSlot {
                contestant: action.contestant,
                slot: action.slot,
            })?;
        contestant.chosen_move = Some(mv);

        self.state.waiting_for_player = false;
        self.state.begin_round();
        Ok(())
    }

    pub fn advance(&mut self) -> Result<Step, RuleError> {
        if self.awaiting_ack {
            return Err(RuleError::AckPending);
        }
        loop {
            if let Some(event) = self.pending.pop_front() {
                self.awaiting_ack = true;
                return Ok(Step::Event { event });
            }
            if self.state.finished {
                return Ok(Step::Finished);
            }
            if self.state.waiting_for_player {
                return Ok(Step::AwaitingMove {
                    contestant: self.state.human,
                });
            }
            self.resolve_next()?;
        }
    }

    pub fn ack(&mut self) -> Result<(), RuleError> {
        if !self.awaiting_ack {
            return Err(RuleError::NothingToAcknowledge);
        }
        self.awaiting_ack = false;
        Ok(())
    }

    pub fn run<P: Presenter + ?Sized>(&mut self, presenter: &mut P) -> Result<Step, RuleError> {
        loop {
            match self.advance()? {
                Step::Event { event } => {
                    match &event {
                        ContestEvent::Message { text } => presenter.on_message(text),
                        ContestEvent::ScoreStep { contestant, score } => {
                            presenter.on_score_step(*contestant, *score)
                        }
                        ContestEvent::RoundEnd { round, standings } => {
                            presenter.on_round_end(*round, standings)
                        }
                        ContestEvent::MatchEnd { standings } => presenter.on_match_end(standings),
                    }
                    self.ack()?;
                }
                other => return Ok(other),
            }
        }
    }

    fn resolve_next(&mut self) -> Result<(), RuleError> {
        match self.stages.pop() {
            Some(Stage::RoundEnd) => {
                self.finish_round();
                Ok(())
            }
            Some(stage) => {
                if let Some(ctx) = self.turn.as_ref() {
                    let outcome = resolve_stage(stage, ctx, &mut self.state, &mut self.rng);
                    self.pending.extend(outcome.events);
                }
                Ok(())
            }
            None => self.begin_turn(),
        }
    }

    fn begin_turn(&mut self) -> Result<(), RuleError> {
        let turn_index = self.turn.as_ref().map_or(0, |ctx| ctx.turn_index + 1);
        let last_index = self.state.last_turn_index();
        let actor = self
            .state
            .contestant_at(turn_index.min(last_index))
            .ok_or(RuleError::InvalidRoster {
                error: IntegrityError::InvalidTurnOrder,
            })?;
        let contestant = self
            .state
            .contestant(actor)
            .ok_or(RuleError::ContestantNotFound { contestant: actor })?;
        let mv = contestant
            .chosen_move
            .clone()
            .or_else(|| contestant.selected_moves.first().cloned())
            .ok_or(RuleError::EmptyMoveSlot {
                contestant: actor,
                slot: 0,
            })?;

        let ctx = StageContext {
            actor,
            turn_index,
            last_index,
            mv,
            cheer_threshold: self.config.cheer_threshold,
        };
        self.stages = StageQueue::build(contestant, &ctx);
        tracing::debug!(
            round = self.state.round,
            turn = turn_index,
            actor,
            move_id = ctx.mv.id,
            stages = self.stages.len(),
            "turn started"
        );
        self.state.active_turn = turn_index;
        self.turn = Some(ctx);
        Ok(())
    }

    fn announce_match(&mut self) {
        let category = self.state.category;
        self.pending.push_back(ContestEvent::message(format!(
            "Welcome to the {category} contest!"
        )));
        for (index, contestant) in self.state.contestants.iter().enumerate() {
            self.pending.push_back(ContestEvent::message(format!(
                "Entry number {}: {}!",
                index + 1,
                contestant.display_name
            )));
        }
        self.pending
            .push_back(ContestEvent::message("Let the appeals begin!"));
    }

    fn open_round(&mut self) {
        let human = self.state.human;
        let threshold = self.config.cheer_threshold;
        let ids: Vec<ContestantId> = self.state.contestants.iter().map(|c| c.id).collect();
        for id in ids {
            let skip = id == human
                || self
                    .state
                    .contestant(id)
                    .map_or(true, |contestant| contestant.exhausted);
            if skip {
                continue;
            }
            let Some(decision) = self.ai.choose_move(&self.state, id, threshold) else {
                continue;
            };
            tracing::debug!(
                contestant = id,
                move_id = decision.move_id,
                evaluation = decision.evaluation,
                "ai picked move"
            );
            if let Some(contestant) = self.state.contestant_mut(id) {
                contestant.chosen_move = contestant.selected_moves.get(decision.slot).cloned();
            }
        }

        let human_exhausted = self
            .state
            .contestant(human)
            .is_some_and(|contestant| contestant.exhausted);
        if human_exhausted {
            self.state.waiting_for_player = false;
            self.state.begin_round();
        } else {
            if let Some(contestant) = self.state.contestant_mut(human) {
                contestant.chosen_move = None;
            }
            self.state.waiting_for_player = true;
        }
    }

    fn finish_round(&mut self) {
        let human = self.state.human;
        if let Some(contestant) = self.state.contestant(human) {
            let text = round_summary(&contestant.display_name, contestant.current_score);
            self.pending.push_back(ContestEvent::message(text));
        }

        for contestant in &mut self.state.contestants {
            contestant.total_score += contestant.current_score;
        }
        let round = self.state.round;
        self.pending.push_back(ContestEvent::RoundEnd {
            round,
            standings: self.state.standings(),
        });
        tracing::info!(round, "round finished");

        let ids: Vec<ContestantId> = self.state.contestants.iter().map(|c| c.id).collect();
        for contestant in &mut self.state.contestants {
            contestant.future_score = 0;
        }
        self.pending.extend(animate_hearts(&mut self.state, &ids));

        let performed: Vec<_> = self
            .state
            .turn_order
            .iter()
            .copied()
            .zip(self.state.round_moves.iter().cloned())
            .collect();
        for (id, mv) in performed {
            match mv {
                Some(mv) => {
                    self.state.previous_round_moves.insert(id, mv);
                }
                None => {
                    self.state.previous_round_moves.remove(&id);
                }
            }
        }
        self.state.crowd_capture = None;
        self.state.silent_streak = 0;
        self.state.turn_order = order::next_round_order(&mut self.state, &mut self.rng);
        self.state.round += 1;
        for contestant in &mut self.state.contestants {
            contestant.reset_for_next_round();
        }
        self.turn = None;
        self.stages.clear();

        if self.state.round > self.config.max_rounds {
            self.finish_match();
        } else {
            self.open_round();
        }
    }

    fn finish_match(&mut self) {
        self.state.finished = true;
        self.state.waiting_for_player = false;
        let standings = self.state.standings();
        if let Some(winner) = standings.first() {
            let tied = standings
                .iter()
                .filter(|standing| standing.total_score == winner.total_score)
                .count();
            let text = if tied > 1 {
                format!(
                    "It's a tie! {} shares the win with {} others.",
                    winner.display_name,
                    tied - 1
                )
            } else {
                format!(
                    "{} won the {} contest with {} hearts!",
                    winner.display_name, self.state.category, winner.total_score
                )
            };
            self.pending.push_back(ContestEvent::message(text));
            tracing::info!(
                winner = winner.contestant,
                total = winner.total_score,
                "match finished"
            );
        }
        self.pending.push_back(ContestEvent::MatchEnd { standings });
    }
}

pub fn round_summary(name: &str, score: i32) -> String {
    match score {
        i32::MIN..=-1 => format!("{name}'s appeals left the judges cold..."),
        0 => format!("{name}'s appeals didn't get any reaction."),
        1..=3 => format!("{name}'s appeals went over okay."),
        4..=6 => format!("{name}'s appeals went over well!"),
        7..=10 => format!("{name}'s appeals went over very well!"),
        _ => format!("{name}'s appeals were a smash hit!"),
    }
}
