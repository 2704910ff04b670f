//! 单元测试用的补全能力替身

use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::Config;
use crate::llm::{CompletionOptions, ProviderError, TextCompletionProvider};

type Responder = dyn Fn(&str, &CompletionOptions) -> Result<String, ProviderError> + Send + Sync;

/// 按规则应答并记录每次调用的provider
pub struct MockProvider {
    responder: Box<Responder>,
    calls: Mutex<Vec<(String, CompletionOptions)>>,
}

impl MockProvider {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str, &CompletionOptions) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 所有调用都失败
    pub fn failing() -> Self {
        Self::new(|_, _| Err(ProviderError::Transport("connection refused".to_string())))
    }

    pub fn calls(&self) -> Vec<(String, CompletionOptions)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextCompletionProvider for MockProvider {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), options.clone()));
        (self.responder)(prompt, options)
    }
}

/// 不等待的测试配置
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.llm.api_key = "sk-test".to_string();
    config.pacing.search_delay_ms = 0;
    config.pacing.extract_delay_ms = 0;
    config.pacing.compose_delay_ms = 0;
    config
}
