//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `SUPPLY__*` 覆盖（双下划线表示嵌套，如 `SUPPLY__ORCHESTRATOR__MAX_ITERATIONS=8`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::planning::TravelMode;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub tools: ToolsSection,
    pub orchestrator: OrchestratorSection,
    pub planning: PlanningSection,
    pub forecasting: ForecastingSection,
    pub mapping: MappingSection,
    pub disruption: DisruptionSection,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
    /// 覆盖内置 system prompt 的文件
    pub system_prompt_path: Option<PathBuf>,
}

/// [llm] 段：后端选择、超时与重试
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：deepseek / openai / mock
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "deepseek".to_string(),
            model: "deepseek-chat".to_string(),
            base_url: None,
            api_key: None,
            request_timeout_secs: 60,
            max_retries: 2,
            retry_base_delay_ms: 1000,
        }
    }
}

/// [tools] 段：单次工具调用超时与 UpstreamUnavailable 重试
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    pub tool_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            tool_timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_ms: 500,
        }
    }
}

/// [orchestrator] 段：迭代上限、会话内结果缓存、中断监控
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrchestratorSection {
    pub max_iterations: usize,
    /// 同一会话内相同 (tool, action_input) 复用成功结果
    pub memoize_tool_results: bool,
    /// 每轮 Oracle 调用前轮询中断扫描
    pub watch_disruptions: bool,
    /// 基础监控关键词，会与会话中出现的产品 / 地点合并
    pub disruption_keywords: Vec<String>,
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            memoize_tool_results: false,
            watch_disruptions: true,
            disruption_keywords: vec!["supply chain disruption".to_string()],
        }
    }
}

/// [planning] 段：Inventory Optimizer 的缺省参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlanningSection {
    pub current_stock: i64,
    pub holding_cost_rate: f64,
    pub order_cost: f64,
}

impl Default for PlanningSection {
    fn default() -> Self {
        Self {
            current_stock: 800,
            holding_cost_rate: 0.1,
            order_cost: 50.0,
        }
    }
}

/// [forecasting] 段：base_url 优先，否则读取 dataset_path 的历史销量做基线预测
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastingSection {
    pub base_url: Option<String>,
    pub dataset_path: PathBuf,
    pub window_days: usize,
}

impl Default for ForecastingSection {
    fn default() -> Self {
        Self {
            base_url: None,
            dataset_path: PathBuf::from("data/demand_forecasting_dataset.csv"),
            window_days: 28,
        }
    }
}

/// [mapping] 段：Directions API
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MappingSection {
    /// 未设置时读环境变量 GOOGLE_MAPS_API_KEY
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_mode: TravelMode,
}

impl Default for MappingSection {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: crate::collaborators::maps::GOOGLE_MAPS_BASE_URL.to_string(),
            default_mode: TravelMode::Driving,
        }
    }
}

/// [disruption] 段：新闻检索
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisruptionSection {
    /// 未设置时读环境变量 NEWS_API_KEY
    pub api_key: Option<String>,
    pub base_url: String,
    pub page_size: u32,
}

impl Default for DisruptionSection {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: crate::collaborators::news::NEWS_API_BASE_URL.to_string(),
            page_size: 5,
        }
    }
}

/// 从 config 目录加载配置，环境变量 SUPPLY__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 SUPPLY__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("SUPPLY")
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("orchestrator.disruption_keywords")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
