use serde::{Deserialize, Serialize};

use super::state::ContestantId;

const DEFAULT_MAX_ROUNDS: u32 = 5;
const DEFAULT_CHEER_THRESHOLD: u8 = 4;
const DEFAULT_MESSAGE_SETTLE_MS: u32 = 2000;
const DEFAULT_HEART_STEP_MS: u32 = 150;

/// Match-wide tuning. Every field has a default so partial JSON works.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ContestConfig {
    /// The match ends once the round number exceeds this.
    pub max_rounds: u32,
    /// The crowd climax fires when the cheer level reaches `cheer_threshold + 1`.
    pub cheer_threshold: u8,
    /// Contestant driven by `submit_move`; everyone else is picked by the AI.
    pub human_slot: ContestantId,
    /// Pause a host should hold after a message has finished printing.
    pub message_settle_ms: u32,
    /// Pause between heart animation steps.
    pub heart_step_ms: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl ContestConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds;
        self
    }
}

impl Default for ContestConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            cheer_threshold: DEFAULT_CHEER_THRESHOLD,
            human_slot: 0,
            message_settle_ms: DEFAULT_MESSAGE_SETTLE_MS,
            heart_step_ms: DEFAULT_HEART_STEP_MS,
            seed: None,
        }
    }
}
