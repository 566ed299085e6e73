//! 工具注册表
//!
//! 所有工具实现带类型的 Tool trait（Input / Output 均有 JsonSchema），注册时擦除为 DynTool：
//! 入参 JSON 先按 Input 反序列化（即 Schema 校验），输出再序列化回 JSON，工具之间只传结构化载荷。
//! 注册表在启动时构建一次，之后以 Arc<ToolRegistry> 只读共享。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::tools::schema::schema_value;
use crate::tools::ToolError;

/// 工具 trait：名称、描述（供 Oracle 理解）、带类型的输入输出与异步调用
#[async_trait]
pub trait Tool: Send + Sync {
    type Input: DeserializeOwned + JsonSchema + Send + 'static;
    type Output: Serialize + JsonSchema + Send + 'static;

    /// 工具名称（Oracle 回复中的 "action" 字段）
    fn name(&self) -> &str;

    /// 工具描述（供 Oracle 选择工具）
    fn description(&self) -> &str;

    async fn invoke(&self, input: Self::Input) -> Result<Self::Output, ToolError>;
}

/// 工具描述数据：名称、描述、输入输出 Schema
#[derive(Clone, Debug, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub output_schema: Value,
}

/// 擦除类型后的工具
#[async_trait]
pub trait DynTool: Send + Sync {
    fn spec(&self) -> &ToolSpec;

    /// 仅校验入参是否符合 Input Schema
    fn validate(&self, input: &Value) -> Result<(), ToolError>;

    async fn call(&self, input: Value) -> Result<Value, ToolError>;
}

struct TypedTool<T> {
    inner: T,
    spec: ToolSpec,
}

impl<T: Tool> TypedTool<T> {
    fn new(inner: T) -> Self {
        let spec = ToolSpec {
            name: inner.name().to_string(),
            description: inner.description().to_string(),
            input_schema: schema_value::<T::Input>(),
            output_schema: schema_value::<T::Output>(),
        };
        Self { inner, spec }
    }

    fn decode(&self, input: Value) -> Result<T::Input, ToolError> {
        serde_json::from_value(input).map_err(|e| {
            ToolError::invalid_input(format!("{} input does not match schema: {e}", self.spec.name))
        })
    }
}

#[async_trait]
impl<T: Tool + 'static> DynTool for TypedTool<T> {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    fn validate(&self, input: &Value) -> Result<(), ToolError> {
        self.decode(input.clone()).map(|_| ())
    }

    async fn call(&self, input: Value) -> Result<Value, ToolError> {
        let typed = self.decode(input)?;
        let output = self.inner.invoke(typed).await?;
        serde_json::to_value(output).map_err(|e| {
            ToolError::internal(format!("{} output could not be serialized: {e}", self.spec.name))
        })
    }
}

/// 工具注册表：按注册顺序保存，按名查找
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn DynTool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册工具；同名工具后注册者覆盖先注册者（名称保持唯一）
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let typed: Arc<dyn DynTool> = Arc::new(TypedTool::new(tool));
        let name = typed.spec().name.clone();
        match self.index.get(&name) {
            Some(&i) => {
                tracing::warn!(tool = %name, "Tool registered twice, replacing");
                self.tools[i] = typed;
            }
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(typed);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DynTool>> {
        self.index.get(name).map(|&i| self.tools[i].clone())
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.spec().name.clone()).collect()
    }

    /// 所有工具描述（注册顺序），供 Oracle 使用
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
