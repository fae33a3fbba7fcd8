use std::collections::VecDeque;
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::moves::Move;
use super::order;
use super::state::{Contestant, ContestEvent, ContestantId, MatchState};

const FIRST_TURN_BONUS: i32 = 3;
const LAST_TURN_BONUS: i32 = 3;
const SAME_TYPE_BONUS: i32 = 4;
const CONFIDENT_BONUS: i32 = 3;
const TURN_POSITION_STEP: i32 = 2;
const NERVOUS_BASE_RANGE: i32 = 8;
const REPEAT_PENALTY: i32 = 2;
const BOO_PENALTY: i32 = 2;
const CHEER_BONUS: i32 = 1;
const CLIMAX_BONUS: i32 = 6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Stage {
    TooNervous,
    Resting,
    Appeal,
    Jam,
    Nervous,
    Protection,
    Confidence,
    Crowd,
    RoundEnd,
}

impl Stage {
    pub fn applies(self, mv: &Move) -> bool {
        match self {
            Stage::Appeal | Stage::Crowd => true,
            Stage::Jam => mv.jam > 0,
            Stage::Nervous => mv.nervous > 0,
            Stage::Protection => mv.protection != 0,
            Stage::Confidence => mv.confidence != 0 || mv.lowers_others_confidence,
            Stage::TooNervous | Stage::Resting | Stage::RoundEnd => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StageContext {
    pub actor: ContestantId,
    pub turn_index: usize,
    pub last_index: usize,
    pub mv: Arc<Move>,
    pub cheer_threshold: u8,
}

impl StageContext {
    pub fn is_first(&self) -> bool {
        self.turn_index == 0
    }

    pub fn is_last(&self) -> bool {
        self.turn_index == self.last_index
    }
}

#[derive(Default, Debug, Clone)]
pub struct StageOutcome {
    pub events: Vec<ContestEvent>,
}

impl StageOutcome {
    pub fn extend(&mut self, mut other: StageOutcome) {
        self.events.append(&mut other.events);
    }

    fn say(&mut self, text: impl Into<String>) {
        self.events.push(ContestEvent::message(text));
    }

    fn animate(&mut self, state: &mut MatchState, ids: &[ContestantId]) {
        self.events.extend(animate_hearts(state, ids));
    }
}

type Resolver = fn(&StageContext, &mut MatchState, &mut SmallRng) -> StageOutcome;

/// Resolver table. `RoundEnd` has no resolver; the round controller owns it.
pub fn resolver_for(stage: Stage) -> Option<Resolver> {
    match stage {
        Stage::TooNervous => Some(resolve_too_nervous),
        Stage::Resting => Some(resolve_resting),
        Stage::Appeal => Some(resolve_appeal),
        Stage::Jam => Some(resolve_jam),
        Stage::Nervous => Some(resolve_nervous),
        Stage::Protection => Some(resolve_protection),
        Stage::Confidence => Some(resolve_confidence),
        Stage::Crowd => Some(resolve_crowd),
        Stage::RoundEnd => None,
    }
}

pub fn resolve_stage(
    stage: Stage,
    ctx: &StageContext,
    state: &mut MatchState,
    rng: &mut SmallRng,
) -> StageOutcome {
    match resolver_for(stage) {
        Some(resolver) => {
            tracing::debug!(?stage, actor = ctx.actor, turn = ctx.turn_index, "resolving stage");
            resolver(ctx, state, rng)
        }
        None => StageOutcome::default(),
    }
}

#[derive(Debug, Default, Clone)]
pub struct StageQueue {
    stages: VecDeque<Stage>,
}

impl StageQueue {
    pub fn build(actor: &Contestant, ctx: &StageContext) -> Self {
        let mut stages = VecDeque::new();
        if actor.nervous {
            stages.push_back(Stage::TooNervous);
        } else if actor.resting || actor.exhausted {
            stages.push_back(Stage::Resting);
        } else {
            for stage in [
                Stage::Appeal,
                Stage::Jam,
                Stage::Nervous,
                Stage::Protection,
                Stage::Confidence,
                Stage::Crowd,
            ] {
                if stage.applies(&ctx.mv) {
                    stages.push_back(stage);
                }
            }
        }
        if ctx.is_last() {
            stages.push_back(Stage::RoundEnd);
        }
        Self { stages }
    }

    pub fn pop(&mut self) -> Option<Stage> {
        self.stages.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn clear(&mut self) {
        self.stages.clear();
    }

    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter()
    }
}

pub fn animate_hearts(state: &mut MatchState, ids: &[ContestantId]) -> Vec<ContestEvent> {
    let mut events = Vec::new();
    loop {
        let mut moved = false;
        for &id in ids {
            let Some(contestant) = state.contestant_mut(id) else {
                continue;
            };
            let step = (contestant.future_score - contestant.current_score).signum();
            if step != 0 {
                contestant.current_score += step;
                events.push(ContestEvent::ScoreStep {
                    contestant: id,
                    score: contestant.current_score,
                });
                moved = true;
            }
        }
        if !moved {
            return events;
        }
    }
}

fn stage_delta(state: &mut MatchState, id: ContestantId, delta: i32) {
    if let Some(contestant) = state.contestant_mut(id) {
        contestant.apply_score_delta(delta);
    }
}

fn current_score(state: &MatchState, id: ContestantId) -> i32 {
    state
        .contestant(id)
        .map(|contestant| contestant.current_score)
        .unwrap_or_default()
}

fn average_earlier_score(state: &MatchState, turn_index: usize) -> Option<i32> {
    let scores: Vec<i32> = (0..turn_index)
        .filter_map(|index| state.contestant_at(index))
        .map(|id| current_score(state, id))
        .collect();
    let count = i32::try_from(scores.len()).ok().filter(|count| *count > 0)?;
    Some(scores.iter().sum::<i32>() / count)
}

fn resolve_too_nervous(
    ctx: &StageContext,
    state: &mut MatchState,
    _rng: &mut SmallRng,
) -> StageOutcome {
    let mut outcome = StageOutcome::default();
    outcome.say(format!(
        "{} is too nervous to move.",
        state.display_name(ctx.actor)
    ));
    outcome
}

fn resolve_resting(ctx: &StageContext, state: &mut MatchState, _rng: &mut SmallRng) -> StageOutcome {
    let mut outcome = StageOutcome::default();
    let Some(contestant) = state.contestant_mut(ctx.actor) else {
        return outcome;
    };
    let text = if contestant.exhausted {
        format!("{} can't make any more appeals.", contestant.display_name)
    } else {
        contestant.resting = false;
        format!("{} is resting and can't make an appeal.", contestant.display_name)
    };
    outcome.say(text);
    outcome
}

fn resolve_appeal(ctx: &StageContext, state: &mut MatchState, _rng: &mut SmallRng) -> StageOutcome {
    let mut outcome = StageOutcome::default();
    let mv = &ctx.mv;
    let name = state.display_name(ctx.actor).to_owned();
    let mut notes: Vec<String> = Vec::new();

    if let Some(slot) = state.round_moves.get_mut(ctx.turn_index) {
        *slot = Some(Arc::clone(mv));
    }
    outcome.say(format!("{name} used {}!", mv.name));

    let start = current_score(state, ctx.actor);
    let previous = ctx
        .turn_index
        .checked_sub(1)
        .and_then(|index| state.contestant_at(index));
    let position = i32::try_from(ctx.turn_index).unwrap_or(i32::MAX);
    let remaining = i32::try_from(ctx.last_index - ctx.turn_index.min(ctx.last_index))
        .unwrap_or(i32::MAX);

    let baseline = if mv.copies_previous_score {
        match previous {
            Some(id) => current_score(state, id),
            None => mv.appeal,
        }
    } else if mv.copies_all_previous {
        average_earlier_score(state, ctx.turn_index).unwrap_or(mv.appeal)
    } else if mv.better_with_excitement {
        mv.appeal + state.cheer_level.max(0)
    } else if mv.better_if_later {
        TURN_POSITION_STEP * position
    } else if mv.better_if_earlier {
        TURN_POSITION_STEP * remaining
    } else {
        mv.appeal
    };
    let mut future = start + baseline;

    if mv.first_turn_bonus && ctx.is_first() {
        future += FIRST_TURN_BONUS;
        notes.push("The first appeal was done very well.".into());
    }

    if mv.better_if_confident
        && state
            .contestant(ctx.actor)
            .is_some_and(|contestant| contestant.confidence > 0)
    {
        future += CONFIDENT_BONUS;
        notes.push(format!("{name} is pumped up and it shows!"));
    }

    if mv.last_turn_bonus && ctx.is_last() {
        future += LAST_TURN_BONUS;
        notes.push("The last appeal was done very well.".into());
    }

    if mv.same_type_bonus {
        let matched = ctx
            .turn_index
            .checked_sub(1)
            .and_then(|index| state.performed_at(index))
            .is_some_and(|before| before.category == mv.category);
        if matched {
            future += SAME_TYPE_BONUS;
            notes.push(format!("{name} followed up with a matching appeal!"));
        } else {
            future = start;
            notes.push(format!("{name}'s appeal didn't go over well..."));
        }
    }

    if mv.copies_previous_score && previous.is_some() {
        notes.push(format!("{name} matched the appeal before it."));
    }
    if mv.copies_all_previous && ctx.turn_index > 0 {
        notes.push(format!("{name} matched the appeals before it."));
    }

    if mv.exhaust_turns == 2 {
        if let Some(contestant) = state.contestant_mut(ctx.actor) {
            contestant.exhausted = true;
        }
        notes.push(format!("{name} can't make any more appeals."));
    } else if mv.exhaust_turns == 1 {
        if let Some(contestant) = state.contestant_mut(ctx.actor) {
            contestant.resting = true;
        }
        notes.push(format!("{name} will need to rest next turn."));
    }

    if mv.priority {
        order::claim_priority(state, ctx.actor);
        notes.push(format!("{name} will move earlier next turn."));
    }
    if mv.deprioritize {
        order::push_back(state, ctx.actor);
        notes.push(format!("{name} will move later next turn."));
    }
    if mv.scrambles_order {
        order::scramble(state);
        notes.push("The order of the next turn was scrambled!".into());
    }

    if mv.captivates_crowd && state.crowd_capture.is_none() {
        state.crowd_capture = Some(ctx.actor);
        notes.push(format!("{name} captivated the crowd!"));
    }

    stage_delta(state, ctx.actor, future - start);
    outcome.animate(state, &[ctx.actor]);
    for note in notes {
        outcome.say(note);
    }
    outcome
}

fn resolve_jam(ctx: &StageContext, state: &mut MatchState, _rng: &mut SmallRng) -> StageOutcome {
    let mut outcome = StageOutcome::default();
    let mv = &ctx.mv;
    outcome.say(format!(
        "{} tried to startle the others!",
        state.display_name(ctx.actor)
    ));

    if ctx.is_first() {
        outcome.say("But it failed!");
        return outcome;
    }

    let mut hit = Vec::new();
    for index in 0..ctx.turn_index {
        let Some(target) = state.contestant_at(index) else {
            continue;
        };
        if mv.same_type_jam_bonus {
            let same_type = state
                .performed_at(index)
                .is_some_and(|before| before.category == mv.category);
            if !same_type {
                continue;
            }
        }

        let Some(contestant) = state.contestant_mut(target) else {
            continue;
        };
        match contestant.protection {
            2 => {
                let text = format!("{} avoided being startled!", contestant.display_name);
                outcome.say(text);
            }
            1 => {
                contestant.protection = 0;
                let text = format!("{} avoided being startled once!", contestant.display_name);
                outcome.say(text);
            }
            _ => {
                let damage = (mv.jam - contestant.confidence).max(0);
                contestant.apply_score_delta(-damage);
                if damage > 0 {
                    hit.push(target);
                } else {
                    let text = format!("{} wasn't startled at all.", contestant.display_name);
                    outcome.say(text);
                }
            }
        }
    }

    outcome.animate(state, &hit);
    outcome
}

/// A contestant is only at risk from gender-based moves if their
/// orientation points at the actor's sex.
pub fn attracted_to(target: &Contestant, actor_sex: u8) -> bool {
    if target.orientation == 0 {
        target.sex != actor_sex
    } else {
        target.sex == actor_sex
    }
}

/// Range `n` of the `1 / n` nervous roll, or `None` when the roll can
/// never succeed.
pub fn nervous_range(target_confidence: i32, nervous: i32) -> Option<u32> {
    let range = NERVOUS_BASE_RANGE + target_confidence - nervous * 2;
    u32::try_from(range).ok().filter(|range| *range > 0)
}

fn resolve_nervous(ctx: &StageContext, state: &mut MatchState, rng: &mut SmallRng) -> StageOutcome {
    let mut outcome = StageOutcome::default();
    let mv = &ctx.mv;
    outcome.say(format!(
        "{} tried to make the others nervous!",
        state.display_name(ctx.actor)
    ));

    if ctx.is_last() {
        outcome.say("But it failed!");
        return outcome;
    }

    let actor_sex = state
        .contestant(ctx.actor)
        .map(|contestant| contestant.sex)
        .unwrap_or_default();

    let mut affected = 0;
    for index in (ctx.turn_index + 1)..=ctx.last_index {
        let Some(target) = state.contestant_at(index) else {
            continue;
        };
        let Some(contestant) = state.contestant_mut(target) else {
            continue;
        };
        if mv.gender_based && !attracted_to(contestant, actor_sex) {
            continue;
        }
        let Some(range) = nervous_range(contestant.confidence, mv.nervous) else {
            tracing::debug!(contestant = target, "nervous roll has an empty range, skipping");
            continue;
        };
        let roll = rng.gen_range(0..range);
        tracing::debug!(contestant = target, range, roll, "nervous roll");
        if roll == 0 {
            contestant.nervous = true;
            affected += 1;
            let text = format!("{} became nervous!", contestant.display_name);
            outcome.say(text);
        }
    }

    if affected == 0 {
        outcome.say("But no one was shaken.");
    }
    outcome
}

fn resolve_protection(
    ctx: &StageContext,
    state: &mut MatchState,
    _rng: &mut SmallRng,
) -> StageOutcome {
    let mut outcome = StageOutcome::default();
    let level = u8::try_from(ctx.mv.protection.clamp(0, 2)).unwrap_or_default();
    if let Some(contestant) = state.contestant_mut(ctx.actor) {
        contestant.protection = level;
    }
    let name = state.display_name(ctx.actor);
    match level {
        1 => outcome.say(format!("{name} became partially resistant!")),
        2 => outcome.say(format!("{name} became fully protected!")),
        _ => {}
    }
    outcome
}

fn resolve_confidence(
    ctx: &StageContext,
    state: &mut MatchState,
    _rng: &mut SmallRng,
) -> StageOutcome {
    let mut outcome = StageOutcome::default();
    let delta = ctx.mv.confidence;

    if delta != 0 {
        if let Some(contestant) = state.contestant_mut(ctx.actor) {
            contestant.confidence += delta;
        }
        let name = state.display_name(ctx.actor);
        let text = match delta {
            1 => format!("{name} became more confident!"),
            -1 => format!("{name} became less confident!"),
            d if d > 1 => format!("{name} became much more confident!"),
            _ => format!("{name} became much less confident!"),
        };
        outcome.say(text);
    }

    if ctx.mv.lowers_others_confidence {
        if ctx.is_first() {
            outcome.say("But no one had appealed yet.");
        }
        for index in 0..ctx.turn_index {
            let Some(target) = state.contestant_at(index) else {
                continue;
            };
            if let Some(contestant) = state.contestant_mut(target) {
                contestant.confidence -= 1;
                let text = format!("{} lost some confidence!", contestant.display_name);
                outcome.say(text);
            }
        }
    }
    outcome
}

fn resolve_crowd(ctx: &StageContext, state: &mut MatchState, _rng: &mut SmallRng) -> StageOutcome {
    let mut outcome = StageOutcome::default();
    let mv = &ctx.mv;
    let name = state.display_name(ctx.actor).to_owned();

    let repeated = state
        .previous_round_moves
        .get(&ctx.actor)
        .is_some_and(|previous| previous.id == mv.id);
    if repeated && !mv.repeatable {
        outcome.say(format!(
            "The crowd is disappointed to see {name} repeat an appeal..."
        ));
        stage_delta(state, ctx.actor, -REPEAT_PENALTY);
        outcome.animate(state, &[ctx.actor]);
        return outcome;
    }

    let watched = match state.crowd_capture {
        Some(holder) if holder != ctx.actor => {
            outcome.say(format!(
                "The crowd continues to watch {}...",
                state.display_name(holder)
            ));
            Some(holder)
        }
        _ if mv.suits(state.category) || (mv.excites_if_first && ctx.is_first()) => {
            outcome.say(format!("The crowd is cheering for {name}!"));
            Some(ctx.actor)
        }
        _ => None,
    };

    if let Some(cheered) = watched {
        state.cheer_level += 1;
        state.silent_streak = 0;
        let bonus = if state.cheer_level >= i32::from(ctx.cheer_threshold) + 1 {
            state.cheer_level = 0;
            outcome.say("The crowd went wild!");
            CLIMAX_BONUS
        } else {
            CHEER_BONUS
        };
        stage_delta(state, cheered, bonus);
        outcome.animate(state, &[cheered]);
    } else if state.silent_streak >= 1 {
        outcome.say(format!("The crowd is booing {name}!"));
        state.cheer_level -= 1;
        state.silent_streak += 1;
        if state.silent_streak >= 2 {
            stage_delta(state, ctx.actor, -BOO_PENALTY);
            outcome.animate(state, &[ctx.actor]);
        }
    } else {
        outcome.say("The crowd is silent...");
        state.silent_streak += 1;
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::Archetype;
    use crate::game::moves::Category;
    use rand::SeedableRng;

    fn context(state: &MatchState, turn_index: usize, mv: Move) -> StageContext {
        StageContext {
            actor: state.contestant_at(turn_index).expect("turn index in range"),
            turn_index,
            last_index: state.last_turn_index(),
            mv: Arc::new(mv),
            cheer_threshold: 4,
        }
    }

    fn steps_for(events: &[ContestEvent], id: ContestantId) -> Vec<i32> {
        events
            .iter()
            .filter_map(|event| match event {
                ContestEvent::ScoreStep { contestant, score } if *contestant == id => Some(*score),
                _ => None,
            })
            .collect()
    }

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    #[test]
    fn queue_collapses_for_nervous_actor() {
        let mut state = MatchState::sample();
        state.contestants[1].nervous = true;
        let ctx = context(&state, 1, Archetype::StartleAll.build(1, "Roar", Category::Cool));
        let queue = StageQueue::build(&state.contestants[1], &ctx);
        assert_eq!(queue.stages().copied().collect::<Vec<_>>(), vec![Stage::TooNervous]);
    }

    #[test]
    fn resting_turn_is_skipped_once() {
        let mut state = MatchState::sample();
        state.contestants[2].resting = true;
        let ctx = context(&state, 2, Archetype::JamAndRest.build(1, "Hyper Beam", Category::Cool));
        let mut queue = StageQueue::build(&state.contestants[2], &ctx);
        assert_eq!(queue.pop(), Some(Stage::Resting));
        assert!(queue.is_empty());

        resolve_stage(Stage::Resting, &ctx, &mut state, &mut rng());
        assert!(!state.contestants[2].resting);
        let queue = StageQueue::build(&state.contestants[2], &ctx);
        assert_eq!(queue.stages().next(), Some(&Stage::Appeal));
    }

    #[test]
    fn exhausted_contestant_never_appeals_again() {
        let mut state = MatchState::sample();
        state.contestants[3].exhausted = true;
        let ctx = context(&state, 3, Archetype::FinalAppeal.build(1, "Memento", Category::Cool));
        let queue = StageQueue::build(&state.contestants[3], &ctx);
        assert_eq!(
            queue.stages().copied().collect::<Vec<_>>(),
            vec![Stage::Resting, Stage::RoundEnd]
        );
        resolve_stage(Stage::Resting, &ctx, &mut state, &mut rng());
        assert!(state.contestants[3].exhausted);
    }

    #[test]
    fn queue_orders_applicable_stages_and_ends_round() {
        let state = MatchState::sample();
        let mut mv = Move::new(1, "Everything", Category::Cool, 1)
            .with_jam(1)
            .with_nervous(1)
            .with_protection(1)
            .with_confidence(1);
        mv.priority = true;
        let ctx = context(&state, 3, mv);
        let queue = StageQueue::build(&state.contestants[3], &ctx);
        assert_eq!(
            queue.stages().copied().collect::<Vec<_>>(),
            vec![
                Stage::Appeal,
                Stage::Jam,
                Stage::Nervous,
                Stage::Protection,
                Stage::Confidence,
                Stage::Crowd,
                Stage::RoundEnd,
            ]
        );
    }

    #[test]
    fn appeal_animates_one_heart_per_point() {
        let mut state = MatchState::sample();
        let ctx = context(&state, 0, Move::new(1, "Tackle", Category::Cool, 4));
        let outcome = resolve_stage(Stage::Appeal, &ctx, &mut state, &mut rng());
        assert_eq!(steps_for(&outcome.events, 0), vec![1, 2, 3, 4]);
        assert_eq!(state.contestants[0].current_score, 4);
        assert!(state.contestants[0].is_settled());
        assert!(state.performed_at(0).is_some());
    }

    #[test]
    fn first_and_last_bonuses_depend_on_position() {
        let mut state = MatchState::sample();
        let first = Archetype::FirstAppeal.build(1, "Quick Attack", Category::Cool);
        let ctx = context(&state, 0, first.clone());
        resolve_stage(Stage::Appeal, &ctx, &mut state, &mut rng());
        assert_eq!(state.contestants[0].current_score, 5);

        let ctx = context(&state, 1, first);
        resolve_stage(Stage::Appeal, &ctx, &mut state, &mut rng());
        assert_eq!(state.contestants[1].current_score, 2);

        let last = Archetype::LastAppeal.build(2, "Revenge", Category::Tough);
        let ctx = context(&state, 3, last);
        resolve_stage(Stage::Appeal, &ctx, &mut state, &mut rng());
        assert_eq!(state.contestants[3].current_score, 5);
    }

    #[test]
    fn same_type_bonus_needs_matching_predecessor() {
        let mut state = MatchState::sample();
        let opener = Move::new(1, "Ember", Category::Beauty, 1);
        let ctx = context(&state, 0, opener);
        resolve_stage(Stage::Appeal, &ctx, &mut state, &mut rng());

        let combo = Archetype::SameTypeCombo.build(2, "Fire Spin", Category::Beauty);
        let ctx = context(&state, 1, combo);
        resolve_stage(Stage::Appeal, &ctx, &mut state, &mut rng());
        assert_eq!(state.contestants[1].current_score, 6);

        let miss = Archetype::SameTypeCombo.build(3, "Growl", Category::Cute);
        let ctx = context(&state, 2, miss);
        let outcome = resolve_stage(Stage::Appeal, &ctx, &mut state, &mut rng());
        assert_eq!(state.contestants[2].current_score, 0);
        assert!(steps_for(&outcome.events, 2).is_empty());
    }

    #[test]
    fn copy_and_position_baselines_ignore_appeal() {
        let mut state = MatchState::sample();
        state.contestants[0].current_score = 5;
        state.contestants[0].future_score = 5;
        let mut copy = Archetype::CopyAppeal.build(1, "Mimic", Category::Smart);
        copy.appeal = 9;
        let ctx = context(&state, 1, copy.clone());
        resolve_stage(Stage::Appeal, &ctx, &mut state, &mut rng());
        assert_eq!(state.contestants[1].current_score, 5);

        let ctx = context(&state, 0, copy);
        resolve_stage(Stage::Appeal, &ctx, &mut state, &mut rng());
        assert_eq!(state.contestants[0].current_score, 14);

        let later = Archetype::BetterIfLater.build(2, "Assurance", Category::Tough);
        let ctx = context(&state, 2, later);
        resolve_stage(Stage::Appeal, &ctx, &mut state, &mut rng());
        assert_eq!(state.contestants[2].current_score, 4);

        let earlier = Archetype::BetterIfEarlier.build(3, "Fake Out", Category::Cute);
        let ctx = context(&state, 3, earlier);
        resolve_stage(Stage::Appeal, &ctx, &mut state, &mut rng());
        assert_eq!(state.contestants[3].current_score, 0);
    }

    #[test]
    fn scraped_baselines_follow_the_turn_so_far() {
        let mut state = MatchState::sample();
        for (index, score) in [(0, 6), (1, 2)] {
            state.contestants[index].current_score = score;
            state.contestants[index].future_score = score;
        }
        let ctx = context(
            &state,
            2,
            Archetype::CopyAllAppeal.build(1, "Camouflage", Category::Beauty),
        );
        resolve_stage(Stage::Appeal, &ctx, &mut state, &mut rng());
        assert_eq!(state.contestants[2].current_score, 4);

        state.cheer_level = 3;
        let ctx = context(
            &state,
            3,
            Archetype::CrowdPleaser.build(2, "Natural Gift", Category::Cool),
        );
        resolve_stage(Stage::Appeal, &ctx, &mut state, &mut rng());
        assert_eq!(state.contestants[3].current_score, 4);
    }

    #[test]
    fn pumped_up_bonus_needs_confidence() {
        let mut state = MatchState::sample();
        let beat_up = Archetype::PumpedUpAppeal.build(1, "Beat Up", Category::Smart);
        let ctx = context(&state, 1, beat_up.clone());
        resolve_stage(Stage::Appeal, &ctx, &mut state, &mut rng());
        assert_eq!(state.contestants[1].current_score, 1);

        state.contestants[2].confidence = 1;
        let ctx = context(&state, 2, beat_up);
        resolve_stage(Stage::Appeal, &ctx, &mut state, &mut rng());
        assert_eq!(state.contestants[2].current_score, 4);
    }

    #[test]
    fn opening_crowd_move_cheers_off_category() {
        let mut state = MatchState::sample();
        let opener = Archetype::CrowdFirst.build(1, "Sucker Punch", Category::Smart);
        let ctx = context(&state, 0, opener.clone());
        let outcome = resolve_stage(Stage::Crowd, &ctx, &mut state, &mut rng());
        assert_eq!(steps_for(&outcome.events, 0), vec![1]);
        assert_eq!(state.cheer_level, 1);

        let ctx = context(&state, 1, opener);
        let outcome = resolve_stage(Stage::Crowd, &ctx, &mut state, &mut rng());
        assert!(steps_for(&outcome.events, 1).is_empty());
        assert_eq!(state.silent_streak, 1);
    }

    #[test]
    fn appeal_flags_touch_status_and_crowd_capture() {
        let mut state = MatchState::sample();
        let ctx = context(
            &state,
            1,
            Archetype::FinalAppeal.build(1, "Memento", Category::Tough),
        );
        resolve_stage(Stage::Appeal, &ctx, &mut state, &mut rng());
        assert!(state.contestants[1].exhausted);

        let ctx = context(
            &state,
            2,
            Archetype::Captivate.build(2, "Attract", Category::Cute),
        );
        resolve_stage(Stage::Appeal, &ctx, &mut state, &mut rng());
        assert_eq!(state.crowd_capture, Some(2));

        let ctx = context(
            &state,
            3,
            Archetype::Captivate.build(3, "Sweet Kiss", Category::Cute),
        );
        resolve_stage(Stage::Appeal, &ctx, &mut state, &mut rng());
        assert_eq!(state.crowd_capture, Some(2));

        let ctx = context(&state, 0, Archetype::JamAndRest.build(4, "Hyper Beam", Category::Cool));
        resolve_stage(Stage::Appeal, &ctx, &mut state, &mut rng());
        assert!(state.contestants[0].resting);
    }

    #[test]
    fn jam_subtracts_confidence_adjusted_damage() {
        let mut state = MatchState::sample();
        state.contestants[0].current_score = 4;
        state.contestants[0].future_score = 4;
        state.contestants[0].confidence = 1;
        let ctx = context(&state, 1, Move::new(1, "Scary Face", Category::Scary, 0).with_jam(3));
        let outcome = resolve_stage(Stage::Jam, &ctx, &mut state, &mut rng());
        assert_eq!(state.contestants[0].future_score, 2);
        assert_eq!(steps_for(&outcome.events, 0), vec![3, 2]);
    }

    #[test]
    fn jam_fails_for_first_contestant() {
        let mut state = MatchState::sample();
        let ctx = context(&state, 0, Move::new(1, "Roar", Category::Tough, 1).with_jam(4));
        let outcome = resolve_stage(Stage::Jam, &ctx, &mut state, &mut rng());
        assert!(outcome
            .events
            .iter()
            .all(|event| matches!(event, ContestEvent::Message { .. })));
        assert_eq!(outcome.events.len(), 2);
    }

    #[test]
    fn jam_respects_protection_levels() {
        let mut state = MatchState::sample();
        state.contestants[0].protection = 2;
        state.contestants[1].protection = 1;
        let jam = Move::new(1, "Crunch", Category::Tough, 1).with_jam(2);

        let ctx = context(&state, 2, jam.clone());
        let outcome = resolve_stage(Stage::Jam, &ctx, &mut state, &mut rng());
        assert!(steps_for(&outcome.events, 0).is_empty());
        assert!(steps_for(&outcome.events, 1).is_empty());
        assert_eq!(state.contestants[0].protection, 2);
        assert_eq!(state.contestants[1].protection, 0);

        let ctx = context(&state, 3, jam);
        let outcome = resolve_stage(Stage::Jam, &ctx, &mut state, &mut rng());
        assert!(steps_for(&outcome.events, 0).is_empty());
        assert_eq!(steps_for(&outcome.events, 1), vec![-1, -2]);
        assert_eq!(steps_for(&outcome.events, 2), vec![-1, -2]);
    }

    #[test]
    fn same_type_jam_only_hits_matching_categories() {
        let mut state = MatchState::sample();
        state.round_moves[0] = Some(Arc::new(Move::new(1, "Ember", Category::Beauty, 1)));
        state.round_moves[1] = Some(Arc::new(Move::new(2, "Leer", Category::Cool, 1)));
        let jam = Archetype::StartleSameType.build(3, "Foresight", Category::Beauty);
        let ctx = context(&state, 2, jam);
        resolve_stage(Stage::Jam, &ctx, &mut state, &mut rng());
        assert_eq!(state.contestants[0].current_score, -1);
        assert_eq!(state.contestants[1].current_score, 0);
    }

    #[test]
    fn nervous_range_clamps_to_never() {
        assert_eq!(nervous_range(0, 1), Some(6));
        assert_eq!(nervous_range(-7, 0), Some(1));
        assert_eq!(nervous_range(-6, 1), None);
        assert_eq!(nervous_range(-10, 2), None);
    }

    #[test]
    fn nervous_certain_roll_hits_everyone_after_actor() {
        let mut state = MatchState::sample();
        for contestant in &mut state.contestants {
            contestant.confidence = -6;
        }
        let ctx = context(&state, 1, Move::new(1, "Glare", Category::Scary, 1).with_nervous(1));
        // range = 8 - 6 - 2 = 0 -> never triggers
        resolve_stage(Stage::Nervous, &ctx, &mut state, &mut rng());
        assert!(state.contestants.iter().all(|contestant| !contestant.nervous));

        for contestant in &mut state.contestants {
            contestant.confidence = -5;
        }
        // range = 1 -> always triggers
        resolve_stage(Stage::Nervous, &ctx, &mut state, &mut rng());
        assert!(!state.contestants[0].nervous);
        assert!(!state.contestants[1].nervous);
        assert!(state.contestants[2].nervous);
        assert!(state.contestants[3].nervous);
    }

    #[test]
    fn nervous_fails_for_last_contestant() {
        let mut state = MatchState::sample();
        let ctx = context(&state, 3, Move::new(1, "Glare", Category::Scary, 1).with_nervous(2));
        let outcome = resolve_stage(Stage::Nervous, &ctx, &mut state, &mut rng());
        assert_eq!(outcome.events.len(), 2);
        assert!(state.contestants.iter().all(|contestant| !contestant.nervous));
    }

    #[test]
    fn gender_based_nervous_skips_uninterested_targets() {
        let mut state = MatchState::sample();
        // actor 0 is sex 0; 1: straight male (skip), 2: straight female (roll),
        // 3: same-sex oriented male (roll)
        state.contestants[1].sex = 0;
        state.contestants[1].orientation = 0;
        state.contestants[2].sex = 1;
        state.contestants[2].orientation = 0;
        state.contestants[3].sex = 0;
        state.contestants[3].orientation = 1;
        let mut mv = Move::new(1, "Attract", Category::Cute, 2).with_nervous(2);
        mv.gender_based = true;
        // range = 8 - 3 - 4 = 1
        for contestant in &mut state.contestants {
            contestant.confidence = -3;
        }
        let ctx = context(&state, 0, mv);
        resolve_stage(Stage::Nervous, &ctx, &mut state, &mut rng());
        assert!(!state.contestants[1].nervous);
        assert!(state.contestants[2].nervous);
        assert!(state.contestants[3].nervous);
    }

    #[test]
    fn protection_and_confidence_update_actor() {
        let mut state = MatchState::sample();
        let ctx = context(&state, 2, Archetype::FullProtection.build(1, "Detect", Category::Cool));
        resolve_stage(Stage::Protection, &ctx, &mut state, &mut rng());
        assert_eq!(state.contestants[2].protection, 2);

        let ctx = context(&state, 2, Archetype::Reckless.build(2, "Outrage", Category::Cool));
        resolve_stage(Stage::Confidence, &ctx, &mut state, &mut rng());
        assert_eq!(state.contestants[2].confidence, -1);

        let ctx = context(&state, 2, Archetype::Demoralize.build(3, "Taunt", Category::Smart));
        resolve_stage(Stage::Confidence, &ctx, &mut state, &mut rng());
        assert_eq!(state.contestants[0].confidence, -1);
        assert_eq!(state.contestants[1].confidence, -1);
        assert_eq!(state.contestants[2].confidence, -1);
        assert_eq!(state.contestants[3].confidence, 0);
    }

    #[test]
    fn repeated_move_costs_two_and_skips_crowd() {
        let mut state = MatchState::sample();
        let mv = Move::new(1, "Tackle", Category::Cool, 2);
        state.previous_round_moves.insert(1, Arc::new(mv.clone()));
        state.cheer_level = 2;
        let ctx = context(&state, 1, mv);
        let outcome = resolve_stage(Stage::Crowd, &ctx, &mut state, &mut rng());
        assert_eq!(steps_for(&outcome.events, 1), vec![-1, -2]);
        assert_eq!(state.cheer_level, 2);
        assert_eq!(state.silent_streak, 0);
    }

    #[test]
    fn repeatable_moves_escape_the_penalty() {
        let mut state = MatchState::sample();
        let mv = Archetype::Repeatable.build(1, "Karate Chop", Category::Cool);
        state.previous_round_moves.insert(1, Arc::new(mv.clone()));
        let ctx = context(&state, 1, mv);
        resolve_stage(Stage::Crowd, &ctx, &mut state, &mut rng());
        assert_eq!(state.contestants[1].current_score, 1);
        assert_eq!(state.cheer_level, 1);
    }

    #[test]
    fn cheer_climax_pays_six_and_resets() {
        let mut state = MatchState::sample();
        state.cheer_level = 4;
        let ctx = context(&state, 0, Move::new(1, "Slash", Category::Cool, 1));
        let outcome = resolve_stage(Stage::Crowd, &ctx, &mut state, &mut rng());
        assert_eq!(steps_for(&outcome.events, 0), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(state.cheer_level, 0);
    }

    #[test]
    fn silence_then_boos() {
        let mut state = MatchState::sample();
        state.cheer_level = 3;
        let off_theme = Move::new(1, "Sing", Category::Cute, 1);

        let ctx = context(&state, 0, off_theme.clone());
        let outcome = resolve_stage(Stage::Crowd, &ctx, &mut state, &mut rng());
        assert!(steps_for(&outcome.events, 0).is_empty());
        assert_eq!(state.silent_streak, 1);
        assert_eq!(state.cheer_level, 3);

        let ctx = context(&state, 1, off_theme);
        let outcome = resolve_stage(Stage::Crowd, &ctx, &mut state, &mut rng());
        assert_eq!(steps_for(&outcome.events, 1), vec![-1, -2]);
        assert_eq!(state.silent_streak, 2);
        assert_eq!(state.cheer_level, 2);

        let ctx = context(&state, 2, Move::new(2, "Swift", Category::Cool, 1));
        resolve_stage(Stage::Crowd, &ctx, &mut state, &mut rng());
        assert_eq!(state.silent_streak, 0);
        assert_eq!(state.cheer_level, 3);
    }

    #[test]
    fn boo_from_a_quiet_crowd_goes_negative() {
        let mut state = MatchState::sample();
        state.cheer_level = 0;
        state.silent_streak = 1;
        let ctx = context(&state, 1, Move::new(1, "Sing", Category::Cute, 1));
        resolve_stage(Stage::Crowd, &ctx, &mut state, &mut rng());
        assert_eq!(state.cheer_level, -1);

        // one cheer only brings it back to zero
        let ctx = context(&state, 2, Move::new(2, "Swift", Category::Cool, 1));
        resolve_stage(Stage::Crowd, &ctx, &mut state, &mut rng());
        assert_eq!(state.cheer_level, 0);
    }

    #[test]
    fn captured_crowd_cheers_the_holder() {
        let mut state = MatchState::sample();
        state.crowd_capture = Some(0);
        let ctx = context(&state, 2, Move::new(1, "Sing", Category::Cute, 1));
        let outcome = resolve_stage(Stage::Crowd, &ctx, &mut state, &mut rng());
        assert_eq!(steps_for(&outcome.events, 0), vec![1]);
        assert!(steps_for(&outcome.events, 2).is_empty());
        assert_eq!(state.crowd_capture, Some(0));
        assert_eq!(state.cheer_level, 1);
    }

    #[test]
    fn round_robin_animation_interleaves_targets() {
        let mut state = MatchState::sample();
        state.contestants[0].future_score = -2;
        state.contestants[1].future_score = 1;
        let events = animate_hearts(&mut state, &[0, 1]);
        assert_eq!(
            events,
            vec![
                ContestEvent::ScoreStep { contestant: 0, score: -1 },
                ContestEvent::ScoreStep { contestant: 1, score: 1 },
                ContestEvent::ScoreStep { contestant: 0, score: -2 },
            ]
        );
    }
}
