//! Next-round turn order.
//!
//! Moves leave overrides on contestants during a round; once the round
//! ends the overrides are folded into the score-sorted order and cleared.

use rand::seq::SliceRandom;
use rand::Rng;

use super::state::{ContestantId, MatchState};

pub const MAX_SLOT: i8 = 4;

/// Gives `claimant` slot 1 for the next round.
///
/// Whoever already holds slot 1 moves to 2, the holder of 2 moves to 3 and
/// so on. The chain is shifted from its far end backwards so two
/// contestants never share a slot mid-update.
pub fn claim_priority(state: &mut MatchState, claimant: ContestantId) {
    if let Some(contestant) = state.contestant_mut(claimant) {
        contestant.turn_order_override = 0;
    }

    let mut chain: Vec<ContestantId> = Vec::new();
    let mut slot: i8 = 1;
    while let Some(holder) = holder_of(state, slot) {
        chain.push(holder);
        slot += 1;
    }

    for holder in chain.iter().rev() {
        if let Some(contestant) = state.contestant_mut(*holder) {
            contestant.turn_order_override = (contestant.turn_order_override + 1).min(MAX_SLOT);
        }
    }

    if let Some(contestant) = state.contestant_mut(claimant) {
        contestant.turn_order_override = 1;
    }
}

pub fn push_back(state: &mut MatchState, contestant: ContestantId) {
    if let Some(contestant) = state.contestant_mut(contestant) {
        contestant.turn_order_override = -1;
    }
}

pub fn scramble(state: &mut MatchState) {
    for contestant in &mut state.contestants {
        if contestant.turn_order_override == 0 {
            contestant.turn_order_override = -1;
        }
    }
}

fn holder_of(state: &MatchState, slot: i8) -> Option<ContestantId> {
    state
        .contestants
        .iter()
        .find(|contestant| contestant.turn_order_override == slot)
        .map(|contestant| contestant.id)
}

/// Computes the next round's order and clears every override.
pub fn next_round_order<R: Rng>(state: &mut MatchState, rng: &mut R) -> Vec<ContestantId> {
    let size = state.turn_order.len();
    let mut slots: Vec<Option<ContestantId>> = vec![None; size];
    let mut unforced: Vec<ContestantId> = Vec::new();
    let mut pool: Vec<ContestantId> = Vec::new();

    for &id in &state.turn_order {
        let Some(contestant) = state.contestant(id) else {
            continue;
        };
        let wanted = contestant.turn_order_override;
        if wanted > 0 {
            let index = usize::try_from(wanted - 1).unwrap_or(usize::MAX);
            match slots.get_mut(index) {
                Some(slot) if slot.is_none() => *slot = Some(id),
                _ => unforced.push(id),
            }
        } else if wanted < 0 {
            pool.push(id);
        } else {
            unforced.push(id);
        }
    }

    unforced.sort_by_key(|id| {
        std::cmp::Reverse(
            state
                .contestant(*id)
                .map(|contestant| contestant.total_score)
                .unwrap_or(i32::MIN),
        )
    });
    pool.shuffle(rng);

    let mut fill = unforced.into_iter().chain(pool);
    for slot in &mut slots {
        if slot.is_none() {
            *slot = fill.next();
        }
    }

    for contestant in &mut state.contestants {
        contestant.turn_order_override = 0;
    }

    slots.into_iter().flatten().collect()
}
