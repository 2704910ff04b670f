//! LLM客户端 - 提供统一的LLM服务接口

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{config::LLMConfig, llm::client::utils::evaluate_befitting_model};

mod anthropic;
mod providers;
pub mod types;
pub mod utils;

use providers::ProviderClient;
use types::{CompletionOptions, ProviderError};

/// 文本补全能力
///
/// 流水线的各阶段只依赖该接口，不感知具体provider的请求与响应格式。
#[async_trait]
pub trait TextCompletionProvider: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ProviderError>;
}

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: &LLMConfig) -> Result<Self, ProviderError> {
        let client = ProviderClient::new(config)?;
        if !client.supports_web_search() {
            warn!(
                provider = %config.provider,
                "provider has no server-side web search; search queries fall back to model knowledge"
            );
        }
        Ok(Self {
            config: config.clone(),
            client,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_client(config: &LLMConfig, client: ProviderClient) -> Self {
        Self {
            config: config.clone(),
            client,
        }
    }

    /// 检查模型连接和功能是否正常
    pub async fn check_connection(&self) -> Result<(), ProviderError> {
        info!("checking model connection...");
        let options = CompletionOptions::new(16).with_system_prompt("You are a helpful assistant.");
        match self.complete("Hello", &options).await {
            Ok(_) => {
                info!("model connection ok");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "model connection failed");
                Err(e)
            }
        }
    }

    /// 通用重试逻辑，鉴权类错误不重试
    async fn retry_with_backoff<T, F, Fut>(&self, operation: F) -> Result<T, ProviderError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let max_retries = self.config.retry_attempts.max(1);
        let retry_delay_ms = self.config.retry_delay_ms;
        let mut retries = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    retries += 1;
                    warn!(
                        attempt = retries,
                        max_attempts = max_retries,
                        error = %err,
                        "model call failed"
                    );
                    if retries >= max_retries || !err.is_retryable() {
                        return Err(err);
                    }
                    tokio::time::sleep(Duration::from_millis(retry_delay_ms)).await;
                }
            }
        }
    }

    /// 在超时约束下用指定模型执行单次调用
    async fn complete_with_model(
        &self,
        model: &str,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        let timeout_seconds = self.config.timeout_seconds;
        let call = self.client.complete(model, prompt, options, &self.config);

        let text = tokio::time::timeout(Duration::from_secs(timeout_seconds), call)
            .await
            .map_err(|_| ProviderError::Timeout(timeout_seconds))??;

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl TextCompletionProvider for LLMClient {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        let (befitting_model, fallover_model) =
            evaluate_befitting_model(&self.config, prompt, options);
        debug!(
            model = %befitting_model,
            web_search = options.web_search,
            prompt_bytes = prompt.len(),
            "model call"
        );

        let result = self
            .retry_with_backoff(|| self.complete_with_model(&befitting_model, prompt, options))
            .await;

        match (result, fallover_model) {
            (Ok(text), _) => Ok(text),
            (Err(e), Some(model)) if e.is_retryable() => {
                warn!(
                    fallover_model = %model,
                    error = %e,
                    "all attempts failed, switching to fallover model"
                );
                self.retry_with_backoff(|| self.complete_with_model(&model, prompt, options))
                    .await
            }
            (Err(e), _) => Err(e),
        }
    }
}
