//! 会话内中断监控
//!
//! 每轮 Oracle 调用前，用「配置关键词 + 历史中出现的产品 / 起止地」查询中断扫描器，
//! 只返回本会话尚未见过的标题。每次扫描有超时；扫描失败或超时记日志后忽略。

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::collaborators::DisruptionScanner;
use crate::core::{Step, StepOrigin};
use crate::planning::DisruptionSignal;
use crate::tools::{DEMAND_FORECASTER, LOGISTICS_PLANNER};

pub struct DisruptionWatch {
    scanner: Arc<dyn DisruptionScanner>,
    base_keywords: Vec<String>,
    scan_timeout: Duration,
}

impl DisruptionWatch {
    pub fn new(
        scanner: Arc<dyn DisruptionScanner>,
        base_keywords: Vec<String>,
        scan_timeout: Duration,
    ) -> Self {
        Self {
            scanner,
            base_keywords,
            scan_timeout,
        }
    }

    /// 查询关键词：配置关键词在前，其后为历史中按首次出现顺序的产品与地点（去重）
    pub fn keywords(&self, history: &[Step]) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let mut push = |k: String| {
            let k = k.trim().to_string();
            if !k.is_empty() && !out.iter().any(|e| e.eq_ignore_ascii_case(&k)) {
                out.push(k);
            }
        };
        for k in &self.base_keywords {
            push(k.clone());
        }
        for step in history.iter().filter(|s| s.origin == StepOrigin::Oracle) {
            let input = &step.action_input;
            if step.action == DEMAND_FORECASTER {
                if let Some(id) = input.get("product_id").and_then(|v| v.as_u64()) {
                    push(format!("product {id} supply disruption"));
                }
            } else if step.action == LOGISTICS_PLANNER {
                for field in ["origin", "destination"] {
                    if let Some(place) = input.get(field).and_then(|v| v.as_str()) {
                        push(format!("{place} logistics disruption"));
                    }
                }
            }
        }
        out
    }

    /// 轮询一次；seen 为本会话已注入的标题，命中的新标题会加入其中
    pub async fn poll(&self, history: &[Step], seen: &mut HashSet<String>) -> Vec<DisruptionSignal> {
        let mut fresh = Vec::new();
        for keywords in self.keywords(history) {
            let signals = match tokio::time::timeout(self.scan_timeout, self.scanner.scan(&keywords)).await {
                Ok(Ok(s)) => s,
                Ok(Err(e)) => {
                    tracing::warn!(keywords = %keywords, error = %e, "Disruption scan failed, ignoring");
                    continue;
                }
                Err(_) => {
                    tracing::warn!(
                        keywords = %keywords,
                        timeout_ms = self.scan_timeout.as_millis() as u64,
                        "Disruption scan timed out, ignoring"
                    );
                    continue;
                }
            };
            for mut signal in signals {
                signal.headlines.retain(|h| seen.insert(h.clone()));
                if !signal.headlines.is_empty() {
                    fresh.push(signal);
                }
            }
        }
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{CollaboratorError, InMemoryDisruptionScanner};
    use crate::core::Observation;
    use async_trait::async_trait;
    use serde_json::json;

    const TIMEOUT: Duration = Duration::from_secs(5);

    /// 永远不返回的扫描器
    struct StalledScanner;

    #[async_trait]
    impl DisruptionScanner for StalledScanner {
        async fn scan(&self, _keywords: &str) -> Result<Vec<DisruptionSignal>, CollaboratorError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![])
        }
    }

    fn oracle_step(action: &str, input: serde_json::Value) -> Step {
        Step {
            origin: StepOrigin::Oracle,
            thought: None,
            action: action.to_string(),
            action_input: input,
            observation: Observation::Success { output: json!({}) },
        }
    }

    #[test]
    fn test_keywords_from_history() {
        let watch = DisruptionWatch::new(
            Arc::new(InMemoryDisruptionScanner::new()),
            vec!["port congestion".into()],
            TIMEOUT,
        );
        let history = vec![
            oracle_step(DEMAND_FORECASTER, json!({"product_id": 151, "forecast_days": 30})),
            oracle_step(LOGISTICS_PLANNER, json!({"origin": "Shanghai", "destination": "Rotterdam"})),
            oracle_step(DEMAND_FORECASTER, json!({"product_id": 151, "forecast_days": 60})),
        ];
        assert_eq!(
            watch.keywords(&history),
            vec![
                "port congestion".to_string(),
                "product 151 supply disruption".to_string(),
                "Shanghai logistics disruption".to_string(),
                "Rotterdam logistics disruption".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_poll_dedups_headlines() {
        let scanner = InMemoryDisruptionScanner::new()
            .with_batch(["Port strike in Rotterdam"]);
        let watch = DisruptionWatch::new(Arc::new(scanner), vec!["port strike".into()], TIMEOUT);
        let mut seen = HashSet::new();
        let first = watch.poll(&[], &mut seen).await;
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].headlines, vec!["Port strike in Rotterdam".to_string()]);
        let second = watch.poll(&[], &mut seen).await;
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_stalled_scan_times_out_per_keyword() {
        let watch = DisruptionWatch::new(
            Arc::new(StalledScanner),
            vec!["port strike".into(), "canal closure".into()],
            Duration::from_millis(200),
        );
        let started = std::time::Instant::now();
        let mut seen = HashSet::new();
        let signals = watch.poll(&[], &mut seen).await;
        assert!(signals.is_empty());
        assert!(seen.is_empty());
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
