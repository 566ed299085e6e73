//! 决策 Oracle：给定目标、工具描述与历史步骤，提出下一步动作或最终答复
//!
//! 循环只依赖 DecisionOracle trait；LlmOracle 是基于 LlmClient 的实现：
//! system prompt 列出工具名、描述与输入 Schema，历史按「assistant 决策 JSON + user Observation」回放。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::{AgentError, Step, StepOrigin};
use crate::llm::{LlmClient, Message};
use crate::react::parse_llm_output;
use crate::tools::{decision_schema_json, ToolSpec};

/// Oracle 的决策
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// 调用工具
    Action {
        thought: Option<String>,
        tool: String,
        input: Value,
    },
    /// 结束会话
    FinalAnswer { thought: Option<String>, text: String },
}

/// 一次决策所需的上下文（只读借用循环状态）
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    pub goal: &'a str,
    pub tools: &'a [ToolSpec],
    pub history: &'a [Step],
}

#[async_trait]
pub trait DecisionOracle: Send + Sync {
    async fn decide(&self, ctx: &DecisionContext<'_>) -> Result<Decision, AgentError>;
}

pub const DEFAULT_PREAMBLE: &str = "You are a supply chain planning assistant. \
Break the user's goal into tool calls, one per reply, and finish with a concise, actionable recommendation. \
Pass tool outputs to other tools as structured JSON exactly as you received them; \
in particular the Demand Forecaster output is the `demand` field of the Inventory Optimizer input.";

/// 基于 LLM 的 Oracle
pub struct LlmOracle {
    llm: Arc<dyn LlmClient>,
    preamble: String,
}

impl LlmOracle {
    pub fn new(llm: Arc<dyn LlmClient>, preamble: impl Into<String>) -> Self {
        Self {
            llm,
            preamble: preamble.into(),
        }
    }

    fn system_prompt(&self, tools: &[ToolSpec]) -> String {
        let mut s = self.preamble.trim().to_string();
        s.push_str("\n\n## Tools\n");
        for t in tools {
            let schema = serde_json::to_string(&t.input_schema).unwrap_or_default();
            s.push_str(&format!(
                "\n### {}\n{}\nInput schema: {}\n",
                t.name, t.description, schema
            ));
        }
        s.push_str("\n## Reply format\nReply with exactly one JSON object matching this schema, and nothing else:\n");
        s.push_str(&decision_schema_json());
        s.push_str(
            "\nUse either `action` with `action_input`, or `final_answer`; never both.",
        );
        s
    }

    /// system + goal + 历史回放
    pub fn build_messages(&self, ctx: &DecisionContext<'_>) -> Vec<Message> {
        let mut messages = vec![
            Message::system(self.system_prompt(ctx.tools)),
            Message::user(format!("Goal: {}", ctx.goal)),
        ];
        for step in ctx.history {
            match step.origin {
                StepOrigin::Oracle => {
                    let mut decision = json!({
                        "action": step.action,
                        "action_input": step.action_input,
                    });
                    if let Some(thought) = &step.thought {
                        decision["thought"] = Value::String(thought.clone());
                    }
                    messages.push(Message::assistant(decision.to_string()));
                    messages.push(Message::user(format!(
                        "Observation: {}",
                        step.observation.render()
                    )));
                }
                StepOrigin::DisruptionAlert => {
                    messages.push(Message::user(format!(
                        "Observation (disruption alert): {}",
                        step.observation.render()
                    )));
                }
            }
        }
        messages
    }
}

#[async_trait]
impl DecisionOracle for LlmOracle {
    async fn decide(&self, ctx: &DecisionContext<'_>) -> Result<Decision, AgentError> {
        let messages = self.build_messages(ctx);
        let reply = self.llm.complete(&messages).await?;
        tracing::debug!(reply = %reply, "Oracle reply");
        parse_llm_output(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Observation;
    use crate::llm::{MockLlmClient, Role};

    fn spec() -> ToolSpec {
        ToolSpec {
            name: "Demand Forecaster".to_string(),
            description: "Forecast demand".to_string(),
            input_schema: json!({"type": "object", "properties": {"product_id": {"type": "integer"}}}),
            output_schema: json!({}),
        }
    }

    #[test]
    fn test_system_prompt_lists_tools_and_format() {
        let oracle = LlmOracle::new(Arc::new(MockLlmClient::new()), DEFAULT_PREAMBLE);
        let prompt = oracle.system_prompt(&[spec()]);
        assert!(prompt.contains("### Demand Forecaster"));
        assert!(prompt.contains("product_id"));
        assert!(prompt.contains("final_answer"));
    }

    #[test]
    fn test_history_replayed_in_order() {
        let oracle = LlmOracle::new(Arc::new(MockLlmClient::new()), "preamble");
        let history = vec![
            Step {
                origin: StepOrigin::Oracle,
                thought: Some("need demand".into()),
                action: "Demand Forecaster".into(),
                action_input: json!({"product_id": 151, "forecast_days": 30}),
                observation: Observation::Success { output: json!({"total_units": 600}) },
            },
            Step {
                origin: StepOrigin::DisruptionAlert,
                thought: None,
                action: "Disruption Monitor".into(),
                action_input: json!({"keywords": "port strike"}),
                observation: Observation::Disruption { signals: vec![] },
            },
        ];
        let tools = [spec()];
        let ctx = DecisionContext { goal: "plan 151", tools: &tools, history: &history };
        let msgs = oracle.build_messages(&ctx);
        assert_eq!(msgs.len(), 5);
        assert_eq!(msgs[0].role, Role::System);
        assert_eq!(msgs[1].content, "Goal: plan 151");
        assert_eq!(msgs[2].role, Role::Assistant);
        assert!(msgs[2].content.contains("need demand"));
        assert!(msgs[3].content.starts_with("Observation: "));
        assert!(msgs[4].content.starts_with("Observation (disruption alert)"));
    }

    #[tokio::test]
    async fn test_decide_parses_reply() {
        let llm = Arc::new(MockLlmClient::with_replies([
            r#"{"action": "Demand Forecaster", "action_input": {"product_id": 7, "forecast_days": 3}}"#,
        ]));
        let oracle = LlmOracle::new(llm.clone(), "p");
        let tools = [spec()];
        let ctx = DecisionContext { goal: "g", tools: &tools, history: &[] };
        let d = oracle.decide(&ctx).await.unwrap();
        assert!(matches!(d, Decision::Action { ref tool, .. } if tool == "Demand Forecaster"));
        assert_eq!(llm.requests().len(), 1);
    }
}
