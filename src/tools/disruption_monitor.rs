//! Disruption Monitor 工具：按关键词扫描供应链中断新闻

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::collaborators::DisruptionScanner;
use crate::planning::DisruptionSignal;
use crate::tools::{Tool, ToolError, DISRUPTION_MONITOR};

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DisruptionQuery {
    /// 如 "port congestion"、"trade dispute"
    pub keywords: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct DisruptionReport {
    pub signals: Vec<DisruptionSignal>,
}

pub struct DisruptionMonitorTool {
    scanner: Arc<dyn DisruptionScanner>,
}

impl DisruptionMonitorTool {
    pub fn new(scanner: Arc<dyn DisruptionScanner>) -> Self {
        Self { scanner }
    }
}

#[async_trait]
impl Tool for DisruptionMonitorTool {
    type Input = DisruptionQuery;
    type Output = DisruptionReport;

    fn name(&self) -> &str {
        DISRUPTION_MONITOR
    }

    fn description(&self) -> &str {
        "Scan for breaking news about global supply chain disruptions. Input: {\"keywords\": \
         <text>} such as 'port congestion' or 'trade dispute'. Returns matching headlines (may be empty)."
    }

    async fn invoke(&self, input: DisruptionQuery) -> Result<DisruptionReport, ToolError> {
        let keywords = input.keywords.trim();
        if keywords.is_empty() {
            return Err(ToolError::invalid_input("keywords must be non-empty"));
        }
        let signals = self.scanner.scan(keywords).await?;
        Ok(DisruptionReport { signals })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::InMemoryDisruptionScanner;

    #[tokio::test]
    async fn test_scan_passes_trimmed_keywords() {
        let scanner = Arc::new(InMemoryDisruptionScanner::new().with_batch(["Suez canal blocked"]));
        let tool = DisruptionMonitorTool::new(scanner.clone());
        let report = tool
            .invoke(DisruptionQuery {
                keywords: "  canal  ".into(),
            })
            .await
            .unwrap();
        assert_eq!(report.signals.len(), 1);
        assert_eq!(scanner.queries(), vec!["canal".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_keywords_invalid() {
        let tool = DisruptionMonitorTool::new(Arc::new(InMemoryDisruptionScanner::new()));
        assert!(tool.invoke(DisruptionQuery { keywords: " ".into() }).await.is_err());
    }
}
