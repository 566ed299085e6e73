//! LLM 层：客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）

pub mod deepseek;
pub mod message;
pub mod mock;
pub mod openai;
pub mod traits;

pub use deepseek::{create_deepseek_client, DEEPSEEK_CHAT, DEEPSEEK_REASONER};
pub use message::{Message, Role};
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, TokenUsage};
pub use traits::{LlmClient, LlmError, RetryConfig, RetryingLlmClient};

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;

/// 根据配置与环境变量选择 LLM 后端（DeepSeek / OpenAI 兼容 / Mock），并包上重试
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let timeout = Duration::from_secs(cfg.llm.request_timeout_secs.max(1));
    let env_key = |name: &str| std::env::var(name).ok().filter(|k| !k.trim().is_empty());

    let inner: Arc<dyn LlmClient> = match provider.as_str() {
        "deepseek" => {
            let key = cfg
                .llm
                .api_key
                .clone()
                .or_else(|| env_key("DEEPSEEK_API_KEY"))
                .or_else(|| env_key("OPENAI_API_KEY"));
            match key {
                Some(key) => {
                    tracing::info!("Using DeepSeek LLM ({})", cfg.llm.model);
                    Arc::new(create_deepseek_client(Some(cfg.llm.model.as_str()), Some(key.as_str()), timeout))
                }
                None => {
                    tracing::warn!("No DeepSeek API key set, using Mock LLM");
                    return Arc::new(MockLlmClient::new());
                }
            }
        }
        "openai" => match cfg.llm.api_key.clone().or_else(|| env_key("OPENAI_API_KEY")) {
            Some(key) => {
                tracing::info!("Using OpenAI-compatible LLM ({})", cfg.llm.model);
                Arc::new(OpenAiClient::new(
                    cfg.llm.base_url.as_deref(),
                    &cfg.llm.model,
                    Some(key.as_str()),
                    timeout,
                ))
            }
            None => {
                tracing::warn!("No OpenAI API key set, using Mock LLM");
                return Arc::new(MockLlmClient::new());
            }
        },
        "mock" => return Arc::new(MockLlmClient::new()),
        other => {
            tracing::warn!(provider = other, "Unknown LLM provider, using Mock LLM");
            return Arc::new(MockLlmClient::new());
        }
    };

    Arc::new(RetryingLlmClient::new(
        inner,
        RetryConfig {
            max_retries: cfg.llm.max_retries,
            base_delay: Duration::from_millis(cfg.llm.retry_base_delay_ms),
        },
    ))
}
