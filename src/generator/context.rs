use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::llm::{LLMClient, TextCompletionProvider};

#[derive(Clone)]
pub struct GeneratorContext {
    /// LLM调用器，用于与AI通信。
    pub llm_client: Arc<dyn TextCompletionProvider>,
    /// 配置
    pub config: Config,
}

impl GeneratorContext {
    /// 创建新的生成器上下文
    ///
    /// 配置校验在这里完成，失败时不会发出任何模型调用。
    pub fn new(mut config: Config) -> Result<Self> {
        config.validate()?;
        config.clamp_limits();
        let llm_client =
            LLMClient::new(&config.llm).context("Failed to initialize LLM client")?;

        Ok(Self::with_provider(config, Arc::new(llm_client)))
    }

    /// 使用外部提供的补全能力创建上下文
    pub fn with_provider(config: Config, llm_client: Arc<dyn TextCompletionProvider>) -> Self {
        Self { llm_client, config }
    }
}

/// 相邻两次外部调用之间的固定间隔
pub async fn pace(delay_ms: u64) {
    if delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}
