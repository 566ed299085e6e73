//! 决策解析：从 LLM 文本中提取 JSON 决策
//!
//! 回复可为 ```json 代码块、夹杂说明文字的 `{...}`，或不含任何 JSON 的纯文本（视为最终答复）。

use serde::Deserialize;
use serde_json::Value;

use crate::core::AgentError;
use crate::react::Decision;

/// Oracle 回复的原始 JSON 形态
#[derive(Debug, Deserialize)]
struct RawDecision {
    #[serde(default)]
    thought: Option<String>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    action_input: Option<Value>,
    #[serde(default)]
    final_answer: Option<String>,
}

/// 解析 LLM 输出：action 与 final_answer 必须恰好出现一个
pub fn parse_llm_output(output: &str) -> Result<Decision, AgentError> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Err(AgentError::JsonParseError("empty reply".to_string()));
    }

    // 尝试提取 JSON 块（```json ... ``` 或纯 JSON）
    let json_str = if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        rest.find("```")
            .map(|end| rest[..end].trim())
            .unwrap_or(rest.trim())
    } else if let Some(start) = trimmed.find('{') {
        match trimmed.rfind('}') {
            Some(end) if end > start => &trimmed[start..=end],
            _ => trimmed,
        }
    } else {
        return Ok(Decision::FinalAnswer {
            thought: None,
            text: trimmed.to_string(),
        });
    };

    let raw: RawDecision = serde_json::from_str(json_str)
        .map_err(|e| AgentError::JsonParseError(format!("{}: {}", e, json_str)))?;

    let action = raw.action.filter(|a| !a.trim().is_empty());
    match (action, raw.final_answer) {
        (Some(_), Some(_)) => Err(AgentError::JsonParseError(
            "reply contains both action and final_answer".to_string(),
        )),
        (Some(tool), None) => Ok(Decision::Action {
            thought: raw.thought,
            tool: tool.trim().to_string(),
            input: raw.action_input.unwrap_or_else(|| Value::Object(Default::default())),
        }),
        (None, Some(text)) => Ok(Decision::FinalAnswer {
            thought: raw.thought,
            text,
        }),
        (None, None) => Err(AgentError::JsonParseError(
            "reply contains neither action nor final_answer".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_action_in_code_block() {
        let out = "Let me check.\n```json\n{\"thought\": \"need demand\", \"action\": \"Demand Forecaster\", \"action_input\": {\"product_id\": 151, \"forecast_days\": 30}}\n```";
        match parse_llm_output(out).unwrap() {
            Decision::Action { thought, tool, input } => {
                assert_eq!(thought.as_deref(), Some("need demand"));
                assert_eq!(tool, "Demand Forecaster");
                assert_eq!(input, json!({"product_id": 151, "forecast_days": 30}));
            }
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_final_answer() {
        let out = r#"{"thought": "done", "final_answer": "Order 4200 units."}"#;
        match parse_llm_output(out).unwrap() {
            Decision::FinalAnswer { text, .. } => assert_eq!(text, "Order 4200 units."),
            other => panic!("expected final answer, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_text_is_final_answer() {
        match parse_llm_output("Hello there").unwrap() {
            Decision::FinalAnswer { text, thought } => {
                assert_eq!(text, "Hello there");
                assert!(thought.is_none());
            }
            other => panic!("expected final answer, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_action_input_defaults_to_empty_object() {
        match parse_llm_output(r#"{"action": "Disruption Monitor"}"#).unwrap() {
            Decision::Action { input, .. } => assert_eq!(input, json!({})),
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = parse_llm_output(r#"{"action": "Demand Forecaster", "#).unwrap_err();
        assert!(matches!(err, AgentError::JsonParseError(_)));
    }

    #[test]
    fn test_ambiguous_or_empty_decision_rejected() {
        assert!(matches!(
            parse_llm_output(r#"{"action": "x", "final_answer": "y"}"#),
            Err(AgentError::JsonParseError(_))
        ));
        assert!(matches!(
            parse_llm_output(r#"{"thought": "hmm"}"#),
            Err(AgentError::JsonParseError(_))
        ));
        assert!(matches!(parse_llm_output("   "), Err(AgentError::JsonParseError(_))));
    }
}
