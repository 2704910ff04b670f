//! LLM Provider支持模块

use rig::{
    client::CompletionClient,
    completion::Prompt,
    providers::gemini::completion::gemini_api_types::{AdditionalParameters, GenerationConfig},
};

use super::anthropic::AnthropicClient;
use super::types::{CompletionOptions, ProviderError};
use crate::config::{LLMConfig, LLMProvider};

/// 统一的Provider客户端枚举
///
/// Anthropic走原生Messages API以使用联网搜索，其余provider通过rig完成纯文本补全。
#[derive(Clone)]
pub enum ProviderClient {
    Anthropic(AnthropicClient),
    OpenAI(rig::providers::openai::Client),
    DeepSeek(rig::providers::deepseek::Client),
    OpenRouter(rig::providers::openrouter::Client),
    Gemini(rig::providers::gemini::Client),
    Ollama(rig::providers::ollama::Client),
    #[cfg(test)]
    Scripted(std::sync::Arc<ScriptedBackend>),
}

impl ProviderClient {
    /// 根据配置创建相应的provider客户端
    pub fn new(config: &LLMConfig) -> Result<Self, ProviderError> {
        match config.provider {
            LLMProvider::Anthropic => Ok(ProviderClient::Anthropic(AnthropicClient::new(config)?)),
            LLMProvider::OpenAI => {
                let client = rig::providers::openai::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build();
                Ok(ProviderClient::OpenAI(client))
            }
            LLMProvider::DeepSeek => {
                let client = rig::providers::deepseek::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build();
                Ok(ProviderClient::DeepSeek(client))
            }
            LLMProvider::OpenRouter => {
                let client = rig::providers::openrouter::Client::builder(&config.api_key).build();
                Ok(ProviderClient::OpenRouter(client))
            }
            LLMProvider::Gemini => {
                let client = rig::providers::gemini::Client::builder(&config.api_key)
                    .build()
                    .map_err(|e| ProviderError::Setup(e.to_string()))?;
                Ok(ProviderClient::Gemini(client))
            }
            LLMProvider::Ollama => {
                let client = rig::providers::ollama::Client::builder().build();
                Ok(ProviderClient::Ollama(client))
            }
        }
    }

    pub fn supports_web_search(&self) -> bool {
        matches!(self, ProviderClient::Anthropic(_))
    }

    /// 执行一次补全调用
    ///
    /// rig provider每次调用都会以当前的系统提示词与输出上限重新构建Agent。
    pub async fn complete(
        &self,
        model: &str,
        prompt: &str,
        options: &CompletionOptions,
        config: &LLMConfig,
    ) -> Result<String, ProviderError> {
        let preamble = options.system_prompt.as_str();
        let max_tokens: u64 = options.max_tokens.into();

        let result = match self {
            ProviderClient::Anthropic(client) => {
                return client.complete(model, prompt, options).await;
            }
            #[cfg(test)]
            ProviderClient::Scripted(backend) => {
                return backend.respond(model).await;
            }
            ProviderClient::OpenAI(client) => {
                let agent = client
                    .completion_model(model)
                    .completions_api()
                    .into_agent_builder()
                    .preamble(preamble)
                    .max_tokens(max_tokens)
                    .temperature(config.temperature)
                    .build();
                agent.prompt(prompt).await
            }
            ProviderClient::DeepSeek(client) => {
                let agent = client
                    .agent(model)
                    .preamble(preamble)
                    .max_tokens(max_tokens)
                    .temperature(config.temperature)
                    .build();
                agent.prompt(prompt).await
            }
            ProviderClient::OpenRouter(client) => {
                let agent = client
                    .agent(model)
                    .preamble(preamble)
                    .temperature(config.temperature)
                    .build();
                agent.prompt(prompt).await
            }
            ProviderClient::Gemini(client) => {
                let gen_cfg = GenerationConfig::default();
                let cfg = AdditionalParameters::default().with_config(gen_cfg);
                let params =
                    serde_json::to_value(cfg).map_err(|e| ProviderError::Setup(e.to_string()))?;

                let agent = client
                    .agent(model)
                    .preamble(preamble)
                    .max_tokens(max_tokens)
                    .temperature(config.temperature)
                    .additional_params(params)
                    .build();
                agent.prompt(prompt).await
            }
            ProviderClient::Ollama(client) => {
                let agent = client
                    .agent(model)
                    .preamble(preamble)
                    .max_tokens(max_tokens)
                    .temperature(config.temperature)
                    .build();
                agent.prompt(prompt).await
            }
        };

        result.map_err(|e| ProviderError::classify(e.to_string()))
    }
}

/// 按模型名应答的测试后端，记录每次调用使用的模型
#[cfg(test)]
pub struct ScriptedBackend {
    responder: Box<dyn Fn(&str) -> Result<String, ProviderError> + Send + Sync>,
    latency: std::time::Duration,
    models: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl ScriptedBackend {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            latency: std::time::Duration::ZERO,
            models: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn with_latency(mut self, latency: std::time::Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn models(&self) -> Vec<String> {
        self.models.lock().unwrap().clone()
    }

    async fn respond(&self, model: &str) -> Result<String, ProviderError> {
        self.models.lock().unwrap().push(model.to_string());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        (self.responder)(model)
    }
}
