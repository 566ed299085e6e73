//! supply-pilot - 供应链规划智能体
//!
//! 模块划分：
//! - **agent**: SupplyAgent 运行时（run / run_with）
//! - **collaborators**: 预测服务、地图服务、中断扫描的 trait 与实现（HTTP / CSV 基线 / 内存）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误与恢复、会话状态、会话监管、Agent 构建
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）
//! - **planning**: 需求汇总与库存优化模型、领域类型
//! - **react**: 决策 Oracle、ReAct 主循环、中断监控
//! - **tools**: 带类型的工具契约、注册表与执行器

pub mod agent;
pub mod collaborators;
pub mod config;
pub mod core;
pub mod llm;
pub mod observability;
pub mod planning;
pub mod react;
pub mod tools;

pub use agent::SupplyAgent;
pub use core::AgentBuilder;
