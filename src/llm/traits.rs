//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / DeepSeek / Mock）实现 LlmClient::complete；RetryingLlmClient 为任意后端加上
//! 可重试错误的指数退避。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::sleep;

use crate::llm::Message;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("rate limited (retry after {retry_after_ms}ms)")]
    RateLimited { retry_after_ms: u64 },

    #[error("API error: {0}")]
    Api(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::Network(_) | LlmError::Timeout | LlmError::RateLimited { .. }
        )
    }
}

/// LLM 客户端 trait：非流式完成
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    /// 第 retry_count 次重试前的等待；溢出时封顶为 MAX_BACKOFF
    pub fn backoff(&self, retry_count: u32) -> Duration {
        let factor = 1u32.checked_shl(retry_count).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }
}

/// 单次重试等待上限
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// 带重试的 LLM 包装：Network / Timeout / RateLimited 退避重试，其余错误直接返回
pub struct RetryingLlmClient {
    inner: Arc<dyn LlmClient>,
    config: RetryConfig,
}

impl RetryingLlmClient {
    pub fn new(inner: Arc<dyn LlmClient>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl LlmClient for RetryingLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        let mut retry_count = 0;
        loop {
            match self.inner.complete(messages).await {
                Ok(s) => return Ok(s),
                Err(e) if e.is_retryable() && retry_count < self.config.max_retries => {
                    // 1s, 2s, 4s, ...；RateLimited 至少等待服务端给出的时长
                    let mut delay = self.config.backoff(retry_count);
                    if let LlmError::RateLimited { retry_after_ms } = &e {
                        delay = delay.max(Duration::from_millis(*retry_after_ms));
                    }
                    tracing::warn!(error = %e, retry = retry_count + 1, "LLM call failed, retrying");
                    sleep(delay).await;
                    retry_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        self.inner.token_usage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Flaky {
        calls: AtomicU32,
        fail_first: u32,
        error: LlmError,
    }

    #[async_trait]
    impl LlmClient for Flaky {
        async fn complete(&self, _messages: &[Message]) -> Result<String, LlmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err(self.error.clone())
            } else {
                Ok("ok".to_string())
            }
        }
    }

    fn cfg(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_retries_transient() {
        let inner = Arc::new(Flaky {
            calls: AtomicU32::new(0),
            fail_first: 2,
            error: LlmError::Timeout,
        });
        let client = RetryingLlmClient::new(inner.clone(), cfg(2));
        assert_eq!(client.complete(&[]).await.unwrap(), "ok");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_backoff_doubles_and_caps_without_overflow() {
        let c = RetryConfig {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        };
        assert_eq!(c.backoff(0), Duration::from_millis(500));
        assert_eq!(c.backoff(2), Duration::from_secs(2));
        assert_eq!(c.backoff(40), MAX_BACKOFF);

        let huge = RetryConfig {
            max_retries: 3,
            base_delay: Duration::from_millis(u64::MAX),
        };
        assert_eq!(huge.backoff(5), MAX_BACKOFF);
    }

    #[tokio::test]
    async fn test_api_error_not_retried() {
        let inner = Arc::new(Flaky {
            calls: AtomicU32::new(0),
            fail_first: 5,
            error: LlmError::Api("invalid key".into()),
        });
        let client = RetryingLlmClient::new(inner.clone(), cfg(3));
        assert!(client.complete(&[]).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }
}
