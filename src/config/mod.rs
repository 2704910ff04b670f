use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use tracing::warn;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "scout.toml";

/// 消息长度上限允许的最小值，再小就放不下一句完整的问候
pub const MIN_MESSAGE_CHARS: usize = 40;

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "anthropic")]
    #[default]
    Anthropic,
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "ollama")]
    Ollama,
}

impl LLMProvider {
    /// 是否支持服务端联网搜索
    pub fn supports_web_search(&self) -> bool {
        matches!(self, LLMProvider::Anthropic)
    }

    /// 是否需要API KEY
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LLMProvider::Ollama)
    }
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::OpenRouter => write!(f, "openrouter"),
            LLMProvider::Gemini => write!(f, "gemini"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" => Ok(LLMProvider::Anthropic),
            "openai" => Ok(LLMProvider::OpenAI),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "openrouter" => Ok(LLMProvider::OpenRouter),
            "gemini" => Ok(LLMProvider::Gemini),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 导出格式
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Default)]
pub enum ExportFormat {
    #[serde(rename = "csv")]
    #[default]
    Csv,
    #[serde(rename = "json")]
    Json,
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(format!("Unknown export format: {}", s)),
        }
    }
}

/// 配置层面的致命错误，在任何模型调用之前抛出
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("missing API key for provider `{provider}` (set --llm-api-key or ANTHROPIC_API_KEY)")]
    MissingApiKey { provider: LLMProvider },
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// 目标行业，多个方向用逗号或分号分隔
    pub target_industry: String,

    /// 目标地区
    pub target_region: String,

    /// 目标地区内需要单独检索的城市
    pub region_cities: Vec<String>,

    /// 发送方公司名称
    pub company_name: String,

    /// 发送方一句话介绍
    pub pitch: String,

    /// 每次搜索期望找到的投资人数量
    pub target_count: usize,

    /// 追加在规划结果之后的自定义查询
    pub custom_queries: Vec<String>,

    /// 查询数量上限
    pub max_queries: Option<usize>,

    /// 输出文件路径
    pub output_path: PathBuf,

    pub export_format: ExportFormat,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 调用间隔配置
    pub pacing: PacingConfig,

    /// 消息生成配置
    pub message: MessageConfig,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址
    pub api_base_url: String,

    /// 高能效模型，用于抽取与消息生成
    pub model_efficient: String,

    /// 高质量模型，用于联网搜索，以及作为efficient失效情况下的兜底
    pub model_powerful: String,

    /// 搜索调用的最大输出tokens
    pub max_tokens_search: u32,

    /// 抽取调用的最大输出tokens
    pub max_tokens_extract: u32,

    /// 消息生成调用的最大输出tokens
    pub max_tokens_compose: u32,

    /// 温度
    pub temperature: f64,

    /// 重试次数
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,

    /// 单次调用超时时间（秒）
    pub timeout_seconds: u64,

    /// 单次搜索调用内允许的联网搜索次数
    pub web_search_max_uses: u32,
}

/// 调用间隔配置（毫秒），用于遵守服务端限流
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PacingConfig {
    pub search_delay_ms: u64,
    pub extract_delay_ms: u64,
    pub compose_delay_ms: u64,
}

/// 消息生成配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct MessageConfig {
    /// 消息字符数上限（LinkedIn连接请求为300）
    pub max_chars: usize,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// 校验致命配置项，必须在任何模型调用之前执行
    ///
    /// 只有缺少凭据是致命的，其余取值问题由`clamp_limits`修正。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.provider.requires_api_key() && self.llm.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey {
                provider: self.llm.provider.clone(),
            });
        }
        Ok(())
    }

    /// 把超出允许范围的数值修正为可用值，并记录警告
    pub fn clamp_limits(&mut self) {
        if self.message.max_chars < MIN_MESSAGE_CHARS {
            warn!(
                configured = self.message.max_chars,
                used = MIN_MESSAGE_CHARS,
                "message.max_chars is too small, raising it"
            );
            self.message.max_chars = MIN_MESSAGE_CHARS;
        }
        if self.llm.timeout_seconds == 0 {
            let fallback = LLMConfig::default().timeout_seconds;
            warn!(used = fallback, "llm.timeout_seconds is zero, using the default");
            self.llm.timeout_seconds = fallback;
        }
    }

    /// 行业方向列表，空配置时回退到通用描述
    pub fn industry_descriptors(&self) -> Vec<String> {
        let descriptors: Vec<String> = self
            .target_industry
            .split([',', ';'])
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect();

        if descriptors.is_empty() {
            vec![String::from("technology startups")]
        } else {
            descriptors
        }
    }

    /// 目标地区，空配置时回退到默认值
    pub fn region(&self) -> String {
        let region = self.target_region.trim();
        if region.is_empty() {
            Config::default().target_region
        } else {
            region.to_string()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_industry: String::from("creator economy, social commerce, SaaS"),
            target_region: String::from("UAE"),
            region_cities: vec![
                "Dubai".to_string(),
                "Abu Dhabi".to_string(),
                "Sharjah".to_string(),
            ],
            company_name: String::from("Matchr"),
            pitch: String::from(
                "a swipe-first creator-brand matching platform that helps brands discover and partner with creators, powered by real audience intelligence",
            ),
            target_count: 15,
            custom_queries: vec![],
            max_queries: None,
            output_path: PathBuf::from("investors_research.csv"),
            export_format: ExportFormat::default(),
            llm: LLMConfig::default(),
            pacing: PacingConfig::default(),
            message: MessageConfig::default(),
            verbose: false,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: String::new(),
            api_base_url: String::from("https://api.anthropic.com"),
            model_efficient: String::from("claude-sonnet-4-20250514"),
            model_powerful: String::from("claude-sonnet-4-20250514"),
            max_tokens_search: 4000,
            max_tokens_extract: 6000,
            max_tokens_compose: 1000,
            temperature: 0.3,
            retry_attempts: 2,
            retry_delay_ms: 2000,
            timeout_seconds: 120,
            web_search_max_uses: 5,
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            search_delay_ms: 2000,
            extract_delay_ms: 1000,
            compose_delay_ms: 3000,
        }
    }
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self { max_chars: 300 }
    }
}
