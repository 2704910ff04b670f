//! Anthropic Messages API客户端，支持服务端联网搜索工具

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use super::types::{CompletionOptions, ProviderError};
use crate::config::LLMConfig;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const WEB_SEARCH_TOOL_TYPE: &str = "web_search_20250305";

#[derive(Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    temperature: f64,
    web_search_max_uses: u32,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    temperature: f64,
    messages: Vec<RequestMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// 响应内容块
///
/// 联网搜索会带回server_tool_use、web_search_tool_result等块，只保留text。
#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl AnthropicClient {
    pub fn new(config: &LLMConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ProviderError::Setup(e.to_string()))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            web_search_max_uses: config.web_search_max_uses,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    fn build_tools(&self, options: &CompletionOptions) -> Vec<Value> {
        if !options.web_search {
            return vec![];
        }
        vec![json!({
            "type": WEB_SEARCH_TOOL_TYPE,
            "name": "web_search",
            "max_uses": self.web_search_max_uses,
        })]
    }

    pub async fn complete(
        &self,
        model: &str,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        let system = Some(options.system_prompt.as_str()).filter(|s| !s.trim().is_empty());
        let request = MessagesRequest {
            model,
            max_tokens: options.max_tokens,
            system,
            temperature: self.temperature,
            messages: vec![RequestMessage {
                role: "user",
                content: prompt,
            }],
            tools: self.build_tools(options),
        };

        let response = self
            .http
            .post(self.endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(map_status_error(status.as_u16(), &body));
        }

        let parsed: MessagesResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        debug!(
            blocks = parsed.content.len(),
            stop_reason = parsed.stop_reason.as_deref().unwrap_or("unknown"),
            "anthropic response received"
        );

        Ok(collect_text(parsed))
    }
}

/// 拼接所有text块
fn collect_text(response: MessagesResponse) -> String {
    response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("")
}

fn map_status_error(status: u16, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.chars().take(300).collect());

    match status {
        401 | 403 => ProviderError::Auth(message),
        429 => ProviderError::RateLimited(message),
        _ => ProviderError::Http { status, message },
    }
}
