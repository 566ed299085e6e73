//! 会话内工具结果缓存：键为 (tool, 规范化后的 action_input)，只缓存成功结果

use std::collections::HashMap;

use serde_json::Value;

#[derive(Debug, Default)]
pub struct ToolMemo {
    entries: HashMap<(String, String), Value>,
}

impl ToolMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tool: &str, input: &Value) -> Option<&Value> {
        self.entries.get(&(tool.to_string(), canonical(input)))
    }

    pub fn insert(&mut self, tool: &str, input: &Value, output: Value) {
        self.entries.insert((tool.to_string(), canonical(input)), output);
    }
}

/// 对象键排序后的紧凑 JSON
fn canonical(v: &Value) -> String {
    fn sorted(v: &Value) -> Value {
        match v {
            Value::Object(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                let mut out = serde_json::Map::new();
                for k in keys {
                    out.insert(k.clone(), sorted(&map[k]));
                }
                Value::Object(out)
            }
            Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
            other => other.clone(),
        }
    }
    sorted(v).to_string()
}
