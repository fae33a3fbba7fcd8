//! 比赛核心逻辑模块（招式、参赛者状态、回合阶段、出场顺序、比赛引擎）。

pub mod catalog;
pub mod config;
pub mod effects;
pub mod moves;
pub mod order;
pub mod rules;
pub mod state;

pub use catalog::{demo_roster, Archetype};
pub use config::ContestConfig;
pub use effects::{animate_hearts, resolve_stage, Stage, StageContext, StageOutcome, StageQueue};
pub use moves::{Category, Move, MoveError, MoveId};
pub use rules::{round_summary, ContestEngine, Presenter, RuleError, Step, SubmitMoveAction};
pub use state::{
    Contestant, ContestEvent, ContestantId, IntegrityError, MatchState, Standing, CONTESTANTS,
};
