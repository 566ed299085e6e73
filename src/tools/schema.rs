//! JSON Schema 生成（schemars）
//!
//! 工具输入输出 Schema 与 Oracle 回复格式 Schema，注入 system prompt 以减少 LLM 输出格式错误。

use schemars::gen::SchemaGenerator;
use schemars::JsonSchema;
use serde_json::Value;

/// 任意类型的 JSON Schema（serde_json::Value 形式）
pub fn schema_value<T: JsonSchema>() -> Value {
    let schema = SchemaGenerator::default().into_root_schema_for::<T>();
    serde_json::to_value(schema).unwrap_or(Value::Null)
}

/// Oracle 回复格式（仅用于 Schema 生成）
#[allow(dead_code)]
#[derive(JsonSchema)]
struct DecisionFormat {
    /// 当前推理
    pub thought: Option<String>,
    /// 要调用的工具名（与 final_answer 二选一）
    pub action: Option<String>,
    /// 工具入参，须符合该工具的输入 Schema
    pub action_input: Option<serde_json::Value>,
    /// 最终答复（与 action 二选一）
    pub final_answer: Option<String>,
}

/// Oracle 回复格式的 JSON Schema 字符串，可拼入 system prompt
pub fn decision_schema_json() -> String {
    serde_json::to_string_pretty(&schema_value::<DecisionFormat>()).unwrap_or_default()
}
