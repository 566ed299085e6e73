//! ReAct 过程事件：用于 CLI 展示思考、工具调用、观察与中断告警

use serde::Serialize;

use crate::core::SessionStatus;

/// 单步过程事件（可序列化为 JSON）
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReactEvent {
    /// ReAct 步数更新（当前第几步）
    StepUpdate { step: usize, max_steps: usize },
    /// 正在等待 Oracle 决策
    Thinking,
    /// Oracle 给出的推理内容
    ThinkingContent { text: String },
    ToolCall {
        tool: String,
        args: serde_json::Value,
    },
    /// 工具返回（预览，避免过长）；attempts 为 0 表示命中会话缓存
    Observation {
        tool: String,
        preview: String,
        attempts: u32,
    },
    ToolFailure {
        tool: String,
        kind: String,
        reason: String,
    },
    /// 错误恢复动作（RetryWithPrompt / Fail / Abort）
    Recovery { action: String, detail: String },
    /// 注入的中断告警
    Disruption { headlines: Vec<String> },
    Finished { status: SessionStatus },
}
