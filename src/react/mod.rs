//! 认知层：决策 Oracle、回复解析、ReAct 主循环、中断监控与会话缓存

pub mod disruption;
pub mod events;
pub mod loop_;
pub mod memo;
pub mod oracle;
pub mod planner;

pub use disruption::DisruptionWatch;
pub use events::ReactEvent;
pub use loop_::{react_loop, ReactSession, SessionOutcome, UNPARSEABLE_REPLY};
pub use memo::ToolMemo;
pub use oracle::{Decision, DecisionContext, DecisionOracle, LlmOracle, DEFAULT_PREAMBLE};
pub use planner::parse_llm_output;
