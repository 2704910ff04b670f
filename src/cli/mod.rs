use crate::config::{Config, DEFAULT_CONFIG_FILE, ExportFormat, LLMProvider};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::warn;

/// Investor Scout - 由AI联网搜索驱动的投资人调研与外联消息生成工具
#[derive(Parser, Debug)]
#[command(name = "investor-scout")]
#[command(
    about = "Researches investors for a target industry and region with web-search-enabled LLMs, merges the findings into one record per investor and drafts a short personalized outreach message for each."
)]
#[command(version)]
pub struct Args {
    /// 配置文件路径，缺省时尝试当前目录下的scout.toml
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 目标行业，多个方向用逗号分隔
    #[arg(short = 'i', long)]
    pub target_industry: Option<String>,

    /// 目标地区
    #[arg(short = 'r', long)]
    pub target_region: Option<String>,

    /// 地区内的城市，可重复
    #[arg(long = "city")]
    pub cities: Vec<String>,

    /// 发起外联的公司名称
    #[arg(long)]
    pub company_name: Option<String>,

    /// 一句话介绍
    #[arg(long)]
    pub pitch: Option<String>,

    /// 每条查询希望找到的投资人数量
    #[arg(long)]
    pub target_count: Option<usize>,

    /// 额外的搜索查询，可重复
    #[arg(short = 'q', long = "query")]
    pub queries: Vec<String>,

    /// 查询数量上限
    #[arg(long)]
    pub max_queries: Option<usize>,

    /// 导出文件路径
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// 导出格式 (csv, json)
    #[arg(long)]
    pub format: Option<String>,

    /// LLM Provider (anthropic, openai, deepseek, openrouter, gemini, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// LLM API KEY
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// 高能效模型，用于抽取与消息生成
    #[arg(long)]
    pub model_efficient: Option<String>,

    /// 高质量模型，用于联网搜索，以及作为efficient失效情况下的兜底
    #[arg(long)]
    pub model_powerful: Option<String>,

    /// 外联消息的字符上限
    #[arg(long)]
    pub max_message_chars: Option<usize>,

    /// 相邻两次搜索之间的间隔（毫秒）
    #[arg(long)]
    pub search_delay_ms: Option<u64>,

    /// 相邻两次消息生成之间的间隔（毫秒）
    #[arg(long)]
    pub compose_delay_ms: Option<u64>,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,

    /// 日志格式
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Args {
    /// 将CLI参数转换为配置
    ///
    /// 配置文件读取失败是致命错误；未知的provider或格式只告警并保留原值。
    pub fn into_config(self) -> Result<Config> {
        let mut config = if let Some(config_path) = &self.config {
            // 如果显式指定了配置文件路径，从该路径加载
            Config::from_file(config_path)
                .with_context(|| format!("Cannot load config file {:?}", config_path))?
        } else {
            // 如果没有显式指定配置文件，尝试从默认位置加载
            let default_config_path = std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(DEFAULT_CONFIG_FILE);

            if default_config_path.exists() {
                Config::from_file(&default_config_path).with_context(|| {
                    format!("Cannot load default config file {:?}", default_config_path)
                })?
            } else {
                Config::default()
            }
        };

        // 调研目标
        if let Some(target_industry) = self.target_industry {
            config.target_industry = target_industry;
        }
        if let Some(target_region) = self.target_region {
            config.target_region = target_region;
        }
        if !self.cities.is_empty() {
            config.region_cities = self.cities;
        }
        if let Some(company_name) = self.company_name {
            config.company_name = company_name;
        }
        if let Some(pitch) = self.pitch {
            config.pitch = pitch;
        }
        if let Some(target_count) = self.target_count {
            config.target_count = target_count;
        }
        config.custom_queries.extend(self.queries);
        if let Some(max_queries) = self.max_queries {
            config.max_queries = Some(max_queries);
        }

        // 导出
        if let Some(output_path) = self.output_path {
            config.output_path = output_path;
        }
        if let Some(format_str) = self.format {
            if let Ok(format) = format_str.parse::<ExportFormat>() {
                config.export_format = format;
            } else {
                warn!(
                    format = %format_str,
                    using = %config.export_format,
                    "unknown export format, keeping the configured one"
                );
            }
        }

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            if let Ok(provider) = provider_str.parse::<LLMProvider>() {
                config.llm.provider = provider;
            } else {
                warn!(
                    provider = %provider_str,
                    using = %config.llm.provider,
                    "unknown provider, keeping the configured one"
                );
            }
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(model_efficient) = self.model_efficient {
            config.llm.model_efficient = model_efficient;
        }
        if let Some(model_powerful) = self.model_powerful {
            config.llm.model_powerful = model_powerful;
        }

        // 消息与节奏
        if let Some(max_message_chars) = self.max_message_chars {
            config.message.max_chars = max_message_chars;
        }
        if let Some(search_delay_ms) = self.search_delay_ms {
            config.pacing.search_delay_ms = search_delay_ms;
        }
        if let Some(compose_delay_ms) = self.compose_delay_ms {
            config.pacing.compose_delay_ms = compose_delay_ms;
        }

        config.verbose = config.verbose || self.verbose;

        Ok(config)
    }
}

/// 安装tracing订阅器；RUST_LOG优先于--verbose
pub fn init_tracing(verbose: bool, log_format: LogFormat) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = if verbose {
        "investor_scout=debug"
    } else {
        "investor_scout=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
