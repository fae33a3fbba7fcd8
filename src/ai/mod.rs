//! AI 模块：为电脑参赛者挑选每回合的招式。

pub mod lookahead;

pub use lookahead::{AiAgent, AiConfig, AiDecision, AiDifficulty, AiStrategy};
