pub mod ai;
pub mod game;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{AiAgent, AiConfig, AiDecision, AiDifficulty, AiStrategy};
pub use game::{
    animate_hearts, demo_roster, round_summary, Archetype, Category, ContestConfig, ContestEngine,
    ContestEvent, Contestant, ContestantId, IntegrityError, MatchState, Move, MoveError, MoveId,
    Presenter, RuleError, Stage, StageContext, StageQueue, Standing, Step, SubmitMoveAction,
    CONTESTANTS,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

fn to_js_error<E: Serialize + std::fmt::Display>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn parse_category(category: &str) -> Result<Category, JsValue> {
    Category::from_str(category)
        .map_err(|_| JsValue::from_str(&format!("unknown contest category: {category}")))
}

fn parse_difficulty(level: Option<String>) -> AiDifficulty {
    level
        .as_deref()
        .and_then(|value| AiDifficulty::from_str(value).ok())
        .unwrap_or_default()
}

/// A running match, driven from JavaScript one event at a time.
#[wasm_bindgen]
pub struct ContestHandle {
    engine: ContestEngine,
}

#[wasm_bindgen]
impl ContestHandle {
    /// `roster_json` is an array of four contestants; the demo roster is used
    /// when it is omitted.
    #[wasm_bindgen(constructor)]
    pub fn new(
        roster_json: Option<String>,
        category: &str,
        level: Option<String>,
        config_json: Option<String>,
    ) -> Result<ContestHandle, JsValue> {
        let roster: Vec<Contestant> = match roster_json {
            Some(json) => serde_json::from_str(&json).map_err(serde_to_js_error)?,
            None => demo_roster(),
        };
        let config = match config_json {
            Some(json) => ContestConfig::from_json(&json).map_err(serde_to_js_error)?,
            None => ContestConfig::default(),
        };
        let engine = ContestEngine::start_match(
            roster,
            parse_category(category)?,
            parse_difficulty(level),
            config,
        )
        .map_err(to_js_error)?;
        Ok(ContestHandle { engine })
    }

    /// Next [`Step`] as JSON. An `Event` step must be `ack`ed before the
    /// next call.
    pub fn advance_json(&mut self) -> Result<String, JsValue> {
        let step = self.engine.advance().map_err(to_js_error)?;
        serde_json::to_string(&step).map_err(serde_to_js_error)
    }

    pub fn ack(&mut self) -> Result<(), JsValue> {
        self.engine.ack().map_err(to_js_error)
    }

    pub fn submit_move(&mut self, contestant: u8, slot: usize) -> Result<(), JsValue> {
        let action = SubmitMoveAction { contestant, slot };
        self.engine.submit_move(action).map_err(|error| {
            web_sys::console::warn_1(&format!("招式提交被拒绝: {error}").into());
            to_js_error(error)
        })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.engine.state()).map_err(serde_to_js_error)
    }

    pub fn standings_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.engine.state().standings()).map_err(serde_to_js_error)
    }

    /// Resolves after the configured pause: the heart step delay for score
    /// steps, the message settle delay otherwise.
    pub fn settle(&self, heart_step: bool) -> Promise {
        let config = self.engine.config();
        let delay = if heart_step {
            config.heart_step_ms
        } else {
            config.message_settle_ms
        };
        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            Ok(JsValue::UNDEFINED)
        })
    }
}

/// 返回一个示例比赛状态，方便前端调试或初始化。
#[wasm_bindgen(js_name = "createSampleMatch")]
pub fn create_sample_match() -> Result<JsValue, JsValue> {
    to_value(&MatchState::sample()).map_err(JsValue::from)
}

/// 校验单个招式定义，非法时抛出 `MoveError`。
#[wasm_bindgen(js_name = "validateMove")]
pub fn validate_move(mv: JsValue) -> Result<(), JsValue> {
    let mv: Move = from_value(mv).map_err(JsValue::from)?;
    mv.validate().map_err(to_js_error)
}

/// 根据招式描述文本构建对应的比赛招式。
#[wasm_bindgen(js_name = "buildMove")]
pub fn build_move(
    description: &str,
    id: MoveId,
    name: &str,
    category: &str,
) -> Result<JsValue, JsValue> {
    let archetype = Archetype::from_description(description)
        .ok_or_else(|| JsValue::from_str(&format!("unknown contest effect: {description}")))?;
    let mv = archetype.build(id, name, parse_category(category)?);
    to_value(&mv).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let state: MatchState = from_value(state).map_err(JsValue::from)?;
    state
        .integrity_check()
        .map_err(|error| to_js_error(RuleError::InvalidRoster { error }))
}

#[wasm_bindgen(js_name = "computeAiMove")]
pub fn compute_ai_move(
    state: JsValue,
    contestant: u8,
    difficulty: Option<String>,
    strategy: Option<String>,
) -> Result<JsValue, JsValue> {
    let state: MatchState = from_value(state).map_err(JsValue::from)?;
    let mut config = AiConfig::from_difficulty(parse_difficulty(difficulty));
    if let Some(strategy) = strategy
        .as_deref()
        .and_then(|value| AiStrategy::from_str(value).ok())
    {
        config = config.with_strategy(strategy);
    }
    let threshold = ContestConfig::default().cheer_threshold;
    let mut agent = AiAgent::new(config);
    let decision = agent.choose_move(&state, contestant, threshold);
    to_value(&decision).map_err(JsValue::from)
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
