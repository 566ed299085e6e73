//! 错误恢复引擎与重试策略
//!
//! RecoveryEngine 把 AgentError / ToolError 映射为 RecoveryAction，供 ReAct 循环决定继续、失败还是终止；
//! RetryPolicy 给出 UpstreamUnavailable 的指数退避间隔。

use std::time::Duration;

use crate::core::{AgentError, RecoveryAction};
use crate::tools::{ToolError, ToolErrorKind};

/// 指数退避：base * 2^attempt，封顶 max_delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 首次调用之外的最大重试次数
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }

    /// 不重试（测试或一次性调用）
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// 第 attempt 次失败后的等待时间（attempt 从 0 计）
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

/// 语义化错误恢复：将错误映射为可执行动作
#[derive(Debug, Default)]
pub struct RecoveryEngine;

impl RecoveryEngine {
    pub fn new() -> Self {
        Self
    }

    /// Oracle 侧错误
    pub fn handle(&self, err: &AgentError) -> RecoveryAction {
        match err {
            AgentError::JsonParseError(raw) => RecoveryAction::RetryWithPrompt(format!(
                "Your previous reply could not be parsed ({raw}). Reply with exactly one JSON object: \
                 {{\"thought\": \"...\", \"action\": \"<tool name>\", \"action_input\": {{...}}}} \
                 or {{\"thought\": \"...\", \"final_answer\": \"...\"}}."
            )),
            AgentError::LlmError(_) => RecoveryAction::Fail,
            AgentError::ConfigError(_) => RecoveryAction::Fail,
            AgentError::Cancelled | AgentError::InternalFault(_) => RecoveryAction::Abort,
        }
    }

    /// 工具侧错误：仅 InternalFault 终止会话，其余回灌给 Oracle（重试已在 ToolExecutor 内完成）
    pub fn on_tool_error(&self, err: &ToolError) -> RecoveryAction {
        match err.kind {
            ToolErrorKind::InternalFault => RecoveryAction::Abort,
            _ => RecoveryAction::Observe,
        }
    }
}
