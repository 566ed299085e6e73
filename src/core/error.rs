//! Agent 错误类型与恢复动作
//!
//! 与 RecoveryEngine 配合：根据 AgentError / ToolError 决定 RetryWithPrompt / Observe / Fail / Abort。

use thiserror::Error;

use crate::llm::LlmError;

/// Agent 运行过程中可能出现的错误（Oracle 输出解析、LLM、配置、取消、内部故障）
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("LLM error: {0}")]
    LlmError(#[from] LlmError),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("Internal fault: {0}")]
    InternalFault(String),
}

/// 恢复引擎根据错误类型给出的建议动作
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryAction {
    /// 将提示作为 Observation 注入下一轮，让 Oracle 自行修正
    RetryWithPrompt(String),
    /// 作为普通 Observation 回灌
    Observe,
    /// 会话失败（Oracle 不可用）
    Fail,
    /// 终止当前会话
    Abort,
}
