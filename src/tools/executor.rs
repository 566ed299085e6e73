//! 工具执行器
//!
//! 持有只读 ToolRegistry、单次调用超时与重试策略：先做 Schema 校验，再在超时内调用工具；
//! UpstreamUnavailable（含超时）按指数退避重试，其它错误立即返回。每次调用输出结构化审计日志（JSON）。

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::time::{sleep, timeout};

use crate::core::RetryPolicy;
use crate::tools::{ToolError, ToolRegistry, ToolSpec};

/// 一次执行的结果与实际尝试次数
#[derive(Debug)]
pub struct ExecutionReport {
    pub result: Result<Value, ToolError>,
    pub attempts: u32,
}

pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            registry,
            timeout,
            retry,
        }
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.registry.tool_names()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.registry.specs()
    }

    /// 执行指定工具：未知工具与 Schema 不符均为 InvalidInput，不会调用工具
    pub async fn execute(&self, tool_name: &str, input: Value) -> ExecutionReport {
        let start = Instant::now();
        let args_preview = args_preview(&input);

        let Some(tool) = self.registry.get(tool_name) else {
            let err = ToolError::invalid_input(format!(
                "Unknown tool: {tool_name}. Available tools: {}",
                self.tool_names().join(", ")
            ));
            audit(tool_name, &Err(err.clone()), 0, start, &args_preview);
            return ExecutionReport {
                result: Err(err),
                attempts: 0,
            };
        };

        if let Err(err) = tool.validate(&input) {
            audit(tool_name, &Err(err.clone()), 0, start, &args_preview);
            return ExecutionReport {
                result: Err(err),
                attempts: 0,
            };
        }

        let mut attempt: u32 = 0;
        let result = loop {
            let outcome = match timeout(self.timeout, tool.call(input.clone())).await {
                Ok(r) => r,
                Err(_) => Err(ToolError::unavailable(format!(
                    "{tool_name} timed out after {}ms",
                    self.timeout.as_millis()
                ))),
            };
            attempt += 1;
            match outcome {
                Err(e) if e.kind.is_retryable() && attempt <= self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt - 1);
                    tracing::warn!(
                        tool = tool_name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Upstream unavailable, retrying"
                    );
                    sleep(delay).await;
                }
                other => break other,
            }
        };

        audit(tool_name, &result, attempt, start, &args_preview);
        ExecutionReport {
            result,
            attempts: attempt,
        }
    }
}

fn audit(
    tool_name: &str,
    result: &Result<Value, ToolError>,
    attempts: u32,
    start: Instant,
    args_preview: &str,
) {
    let (ok, outcome) = match result {
        Ok(_) => (true, "ok".to_string()),
        Err(e) => (false, e.kind.as_str().to_string()),
    };
    let audit = serde_json::json!({
        "event": "tool_audit",
        "tool": tool_name,
        "ok": ok,
        "outcome": outcome,
        "attempts": attempts,
        "duration_ms": start.elapsed().as_millis() as u64,
        "args_preview": args_preview,
    });
    tracing::info!(audit = %audit.to_string(), "tool");
}

fn args_preview(args: &Value) -> String {
    let s = args.to_string();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{Tool, ToolErrorKind};
    use async_trait::async_trait;
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Deserialize, JsonSchema)]
    struct PingInput {
        id: u32,
    }

    #[derive(Serialize, JsonSchema)]
    struct PingOutput {
        id: u32,
    }

    /// 前 fail_first 次返回指定错误
    struct FlakyTool {
        calls: Arc<AtomicU32>,
        fail_first: u32,
        kind: ToolErrorKind,
        hang: bool,
    }

    #[async_trait]
    impl Tool for FlakyTool {
        type Input = PingInput;
        type Output = PingOutput;

        fn name(&self) -> &str {
            "Ping"
        }

        fn description(&self) -> &str {
            "ping"
        }

        async fn invoke(&self, input: PingInput) -> Result<PingOutput, ToolError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if n < self.fail_first {
                return Err(ToolError::new(self.kind, "flaky"));
            }
            Ok(PingOutput { id: input.id })
        }
    }

    fn executor(fail_first: u32, kind: ToolErrorKind, max_retries: u32, hang: bool) -> (ToolExecutor, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let mut reg = ToolRegistry::new();
        reg.register(FlakyTool {
            calls: calls.clone(),
            fail_first,
            kind,
            hang,
        });
        let exec = ToolExecutor::new(
            Arc::new(reg),
            Duration::from_millis(50),
            RetryPolicy::new(max_retries, Duration::from_millis(1)),
        );
        (exec, calls)
    }

    #[tokio::test]
    async fn test_retries_unavailable_then_succeeds() {
        let (exec, calls) = executor(2, ToolErrorKind::UpstreamUnavailable, 3, false);
        let report = exec.execute("Ping", json!({"id": 7})).await;
        assert_eq!(report.result.unwrap(), json!({"id": 7}));
        assert_eq!(report.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_bound_then_surfaces() {
        let (exec, calls) = executor(10, ToolErrorKind::UpstreamUnavailable, 2, false);
        let report = exec.execute("Ping", json!({"id": 7})).await;
        assert_eq!(report.result.unwrap_err().kind, ToolErrorKind::UpstreamUnavailable);
        assert_eq!(report.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_rejected_not_retried() {
        let (exec, calls) = executor(10, ToolErrorKind::UpstreamRejected, 3, false);
        let report = exec.execute("Ping", json!({"id": 7})).await;
        assert_eq!(report.result.unwrap_err().kind, ToolErrorKind::UpstreamRejected);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_unavailable() {
        let (exec, calls) = executor(0, ToolErrorKind::UpstreamUnavailable, 1, true);
        let report = exec.execute("Ping", json!({"id": 1})).await;
        let err = report.result.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::UpstreamUnavailable);
        assert!(err.message.contains("timed out"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_tool_and_bad_input_not_invoked() {
        let (exec, calls) = executor(0, ToolErrorKind::UpstreamUnavailable, 3, false);
        let report = exec.execute("Pong", json!({"id": 1})).await;
        let err = report.result.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::InvalidInput);
        assert!(err.message.contains("Ping"));

        let report = exec.execute("Ping", json!({"id": "one"})).await;
        assert_eq!(report.result.unwrap_err().kind, ToolErrorKind::InvalidInput);
        assert_eq!(report.attempts, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
