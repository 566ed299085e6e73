//! Agent 构建器：配置 -> 协作方 -> 工具 -> 注册表 -> Oracle -> SupplyAgent
//!
//! 测试与嵌入方可直接注入协作方 / Oracle；CLI 通过 with_collaborators_from_config 按配置选择实现。

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::agent::SupplyAgent;
use crate::collaborators::{
    CsvBaselineForecaster, DisruptionScanner, Forecaster, GoogleMapsRoutePlanner, HttpForecaster,
    NewsApiScanner, RoutePlanner,
};
use crate::config::AppConfig;
use crate::core::{AgentError, RecoveryEngine, RetryPolicy};
use crate::llm::create_llm_from_config;
use crate::react::{DecisionOracle, DisruptionWatch, LlmOracle, DEFAULT_PREAMBLE};
use crate::tools::{
    DemandForecasterTool, DisruptionMonitorTool, InventoryOptimizerTool, LogisticsPlannerTool,
    ToolExecutor, ToolRegistry,
};

pub struct AgentBuilder {
    config: AppConfig,
    oracle: Option<Arc<dyn DecisionOracle>>,
    forecaster: Option<Arc<dyn Forecaster>>,
    route_planner: Option<Arc<dyn RoutePlanner>>,
    scanner: Option<Arc<dyn DisruptionScanner>>,
    system_prompt: Option<String>,
}

impl AgentBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            oracle: None,
            forecaster: None,
            route_planner: None,
            scanner: None,
            system_prompt: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn DecisionOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn with_forecaster(mut self, forecaster: Arc<dyn Forecaster>) -> Self {
        self.forecaster = Some(forecaster);
        self
    }

    pub fn with_route_planner(mut self, planner: Arc<dyn RoutePlanner>) -> Self {
        self.route_planner = Some(planner);
        self
    }

    pub fn with_scanner(mut self, scanner: Arc<dyn DisruptionScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// 为尚未注入的协作方按配置选择实现；不可用的协作方跳过（对应工具不注册）
    pub fn with_collaborators_from_config(mut self) -> Self {
        let timeout_secs = self.config.tools.tool_timeout_secs.max(1);

        if self.forecaster.is_none() {
            self.forecaster = forecaster_from_config(&self.config, timeout_secs);
        }

        if self.route_planner.is_none() {
            let key = self
                .config
                .mapping
                .api_key
                .clone()
                .or_else(|| std::env::var("GOOGLE_MAPS_API_KEY").ok());
            match key {
                Some(key) => {
                    match GoogleMapsRoutePlanner::new(&self.config.mapping.base_url, &key, timeout_secs) {
                        Ok(p) => self.route_planner = Some(Arc::new(p)),
                        Err(e) => tracing::warn!(error = %e, "Logistics Planner disabled"),
                    }
                }
                None => tracing::warn!("GOOGLE_MAPS_API_KEY not set, Logistics Planner disabled"),
            }
        }

        if self.scanner.is_none() {
            let key = self
                .config
                .disruption
                .api_key
                .clone()
                .or_else(|| std::env::var("NEWS_API_KEY").ok());
            match key {
                Some(key) => match NewsApiScanner::new(
                    &self.config.disruption.base_url,
                    &key,
                    self.config.disruption.page_size,
                    timeout_secs,
                ) {
                    Ok(s) => self.scanner = Some(Arc::new(s)),
                    Err(e) => tracing::warn!(error = %e, "Disruption Monitor disabled"),
                },
                None => tracing::warn!("NEWS_API_KEY not set, Disruption Monitor disabled"),
            }
        }

        self
    }

    /// 工具注册表：Inventory Optimizer 总是可用，其余工具随协作方注册
    pub fn build_tool_registry(&self) -> ToolRegistry {
        let mut tools = ToolRegistry::new();
        if let Some(f) = &self.forecaster {
            tools.register(DemandForecasterTool::new(f.clone()));
        }
        tools.register(InventoryOptimizerTool::new(self.config.planning.clone()));
        if let Some(p) = &self.route_planner {
            tools.register(LogisticsPlannerTool::new(
                p.clone(),
                self.config.mapping.default_mode,
            ));
        }
        if let Some(s) = &self.scanner {
            tools.register(DisruptionMonitorTool::new(s.clone()));
        }
        tools
    }

    fn resolve_system_prompt(&self) -> Result<String, AgentError> {
        if let Some(p) = &self.system_prompt {
            return Ok(p.clone());
        }
        if let Some(path) = &self.config.app.system_prompt_path {
            return std::fs::read_to_string(path).map_err(|e| {
                AgentError::ConfigError(format!("cannot read system prompt {}: {e}", path.display()))
            });
        }
        Ok(["config/prompts/system.md", "../config/prompts/system.md"]
            .into_iter()
            .find_map(|p| std::fs::read_to_string(p).ok())
            .unwrap_or_else(|| DEFAULT_PREAMBLE.to_string()))
    }

    pub fn build(self) -> Result<SupplyAgent, AgentError> {
        let orchestrator = self.config.orchestrator.clone();
        if orchestrator.max_iterations == 0 {
            return Err(AgentError::ConfigError(
                "orchestrator.max_iterations must be at least 1".to_string(),
            ));
        }

        let registry = Arc::new(self.build_tool_registry());
        tracing::info!(tools = ?registry.tool_names(), "Tool registry built");

        let executor = ToolExecutor::new(
            registry,
            Duration::from_secs(self.config.tools.tool_timeout_secs.max(1)),
            RetryPolicy::new(
                self.config.tools.max_retries,
                Duration::from_millis(self.config.tools.retry_base_delay_ms),
            ),
        );

        let oracle: Arc<dyn DecisionOracle> = match &self.oracle {
            Some(o) => o.clone(),
            None => {
                let prompt = self.resolve_system_prompt()?;
                Arc::new(LlmOracle::new(create_llm_from_config(&self.config), prompt))
            }
        };

        let watch = match (&self.scanner, orchestrator.watch_disruptions) {
            (Some(s), true) => Some(DisruptionWatch::new(
                s.clone(),
                orchestrator.disruption_keywords.clone(),
                Duration::from_secs(self.config.tools.tool_timeout_secs.max(1)),
            )),
            _ => None,
        };

        Ok(SupplyAgent::new(
            oracle,
            executor,
            RecoveryEngine::new(),
            watch,
            orchestrator,
        ))
    }
}

fn forecaster_from_config(cfg: &AppConfig, timeout_secs: u64) -> Option<Arc<dyn Forecaster>> {
    if let Some(url) = &cfg.forecasting.base_url {
        match HttpForecaster::new(url, timeout_secs) {
            Ok(f) => return Some(Arc::new(f)),
            Err(e) => tracing::warn!(error = %e, "Forecasting service client unavailable"),
        }
    }
    let path: &Path = &cfg.forecasting.dataset_path;
    if !path.exists() {
        tracing::warn!(path = %path.display(), "Sales dataset not found, Demand Forecaster disabled");
        return None;
    }
    match CsvBaselineForecaster::from_path(path, cfg.forecasting.window_days) {
        Ok(f) => {
            tracing::info!(products = f.product_count(), path = %path.display(), "Loaded sales history");
            Some(Arc::new(f))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Sales dataset unreadable, Demand Forecaster disabled");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{InMemoryDisruptionScanner, InMemoryForecaster};
    use crate::llm::MockLlmClient;
    use crate::tools::{DEMAND_FORECASTER, DISRUPTION_MONITOR, INVENTORY_OPTIMIZER};

    #[test]
    fn test_registry_follows_collaborators() {
        let b = AgentBuilder::new(AppConfig::default());
        assert_eq!(b.build_tool_registry().tool_names(), vec![INVENTORY_OPTIMIZER.to_string()]);

        let b = b
            .with_forecaster(Arc::new(InMemoryForecaster::new()))
            .with_scanner(Arc::new(InMemoryDisruptionScanner::new()));
        assert_eq!(
            b.build_tool_registry().tool_names(),
            vec![
                DEMAND_FORECASTER.to_string(),
                INVENTORY_OPTIMIZER.to_string(),
                DISRUPTION_MONITOR.to_string()
            ]
        );
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let mut cfg = AppConfig::default();
        cfg.orchestrator.max_iterations = 0;
        let oracle = Arc::new(LlmOracle::new(Arc::new(MockLlmClient::new()), "p"));
        let err = AgentBuilder::new(cfg).with_oracle(oracle).build().err();
        assert!(matches!(err, Some(AgentError::ConfigError(_))));
    }

    #[test]
    fn test_missing_prompt_file_is_config_error() {
        let mut cfg = AppConfig::default();
        cfg.app.system_prompt_path = Some("/nonexistent/system.md".into());
        let err = AgentBuilder::new(cfg).build().err();
        assert!(matches!(err, Some(AgentError::ConfigError(_))));
    }

    #[test]
    fn test_missing_dataset_disables_forecaster() {
        let mut cfg = AppConfig::default();
        cfg.forecasting.dataset_path = "/nonexistent/sales.csv".into();
        assert!(forecaster_from_config(&cfg, 1).is_none());
    }
}
