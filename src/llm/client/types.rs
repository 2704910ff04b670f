//! 模型调用的请求选项与错误类型

/// 单次补全调用的选项
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionOptions {
    /// 系统提示词，为空时不发送
    pub system_prompt: String,
    /// 是否启用联网搜索
    pub web_search: bool,
    /// 最大输出tokens
    pub max_tokens: u32,
}

impl CompletionOptions {
    pub fn new(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            ..Default::default()
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn with_web_search(mut self) -> Self {
        self.web_search = true;
        self
    }
}

/// 模型服务调用错误
///
/// 每一类都会被调用方（搜索、抽取、消息生成）在本地吸收，不会中断整个流程。
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("rate limited by provider: {0}")]
    RateLimited(String),

    #[error("authentication rejected by provider: {0}")]
    Auth(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("provider returned no text")]
    EmptyResponse,

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("provider client setup failed: {0}")]
    Setup(String),
}

impl ProviderError {
    /// 鉴权与初始化错误重试也不会成功
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ProviderError::Auth(_) | ProviderError::Setup(_))
    }

    /// 根据错误文本粗略归类，用于rig等只暴露字符串错误的provider
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("429") || lower.contains("rate limit") {
            ProviderError::RateLimited(message)
        } else if lower.contains("401") || lower.contains("403") || lower.contains("unauthorized")
        {
            ProviderError::Auth(message)
        } else {
            ProviderError::Transport(message)
        }
    }
}
