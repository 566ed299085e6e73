//! 会话状态：ConversationState、Step、Observation
//!
//! ConversationState 由 ReAct 循环独占，生命周期为一次用户请求；status 离开 Running 后随 SessionOutcome 交还调用方。

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::planning::DisruptionSignal;
use crate::tools::ToolError;

/// 会话状态机：Running -> {Running, Completed, Failed, Aborted}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Completed,
    Failed,
    Aborted,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Running)
    }
}

/// 步骤来源
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOrigin {
    /// Oracle 决策的工具调用
    Oracle,
    /// 循环注入的中断告警（非 Oracle 决策，不计入 iteration_count）
    DisruptionAlert,
}

/// 一次工具调用（或注入）的结果
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Observation {
    Success { output: Value },
    Error { error: ToolError },
    Disruption { signals: Vec<DisruptionSignal> },
}

impl Observation {
    pub fn is_success(&self) -> bool {
        matches!(self, Observation::Success { .. })
    }

    pub fn output(&self) -> Option<&Value> {
        match self {
            Observation::Success { output } => Some(output),
            _ => None,
        }
    }

    /// 供 Prompt 与日志使用的文本形式
    pub fn render(&self) -> String {
        match self {
            Observation::Success { output } => output.to_string(),
            Observation::Error { error } => format!("Error: {error}"),
            Observation::Disruption { signals } => {
                let mut s = String::from("New supply chain disruption signals detected:");
                for sig in signals {
                    for h in &sig.headlines {
                        s.push_str(&format!("\n- [{}] {}", sig.query_keywords, h));
                    }
                }
                s.push_str("\nConsider re-running planning tools with updated assumptions.");
                s
            }
        }
    }
}

/// (thought, action, action_input, observation)
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Step {
    pub origin: StepOrigin,
    pub thought: Option<String>,
    pub action: String,
    pub action_input: Value,
    pub observation: Observation,
}

#[derive(Clone, Debug, Serialize)]
pub struct ConversationState {
    pub session_id: Uuid,
    pub goal: String,
    pub steps: Vec<Step>,
    pub iteration_count: usize,
    pub status: SessionStatus,
}

impl ConversationState {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            goal: goal.into(),
            steps: Vec::new(),
            iteration_count: 0,
            status: SessionStatus::Running,
        }
    }

    /// Oracle 决策步：追加并计数
    pub fn record(&mut self, step: Step) {
        if step.origin == StepOrigin::Oracle {
            self.iteration_count += 1;
        }
        self.steps.push(step);
    }

    /// 每个工具最近一次成功输出（按最近优先）
    pub fn latest_successes(&self) -> Vec<(&str, &Value)> {
        let mut seen: Vec<&str> = Vec::new();
        let mut out = Vec::new();
        for step in self.steps.iter().rev() {
            if let Some(v) = step.observation.output() {
                if !seen.contains(&step.action.as_str()) {
                    seen.push(step.action.as_str());
                    out.push((step.action.as_str(), v));
                }
            }
        }
        out
    }

    /// 终止时的部分答案：最近的成功观察 + 终止原因
    pub fn partial_answer(&self, reason: &str) -> String {
        let mut s = format!("Session terminated: {reason}.");
        let results = self.latest_successes();
        if results.is_empty() {
            s.push_str(" No tool produced a result before termination.");
        } else {
            s.push_str(" Latest results:");
            for (tool, output) in results {
                s.push_str(&format!("\n- {tool}: {output}"));
            }
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(action: &str, observation: Observation) -> Step {
        Step {
            origin: StepOrigin::Oracle,
            thought: None,
            action: action.to_string(),
            action_input: json!({}),
            observation,
        }
    }

    #[test]
    fn test_record_counts_only_oracle_steps() {
        let mut s = ConversationState::new("plan product 151");
        s.record(step("Demand Forecaster", Observation::Success { output: json!({"total_units": 10}) }));
        s.record(Step {
            origin: StepOrigin::DisruptionAlert,
            ..step("Disruption Monitor", Observation::Disruption { signals: vec![] })
        });
        assert_eq!(s.iteration_count, 1);
        assert_eq!(s.steps.len(), 2);
        assert_eq!(s.status, SessionStatus::Running);
    }

    #[test]
    fn test_partial_answer_uses_latest_success_per_tool() {
        let mut s = ConversationState::new("goal");
        s.record(step("Demand Forecaster", Observation::Success { output: json!({"total_units": 1}) }));
        s.record(step("Demand Forecaster", Observation::Success { output: json!({"total_units": 2}) }));
        s.record(step(
            "Inventory Optimizer",
            Observation::Error { error: ToolError::invalid_input("bad") },
        ));
        let answer = s.partial_answer("iteration budget of 3 exhausted");
        assert!(answer.contains("iteration budget of 3 exhausted"));
        assert!(answer.contains("{\"total_units\":2}"));
        assert!(!answer.contains("{\"total_units\":1}"));
        assert!(!answer.contains("Inventory Optimizer"));
    }

    #[test]
    fn test_partial_answer_without_results() {
        let s = ConversationState::new("goal");
        assert!(s.partial_answer("cancelled").contains("No tool produced a result"));
    }
}
