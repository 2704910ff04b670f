//! 结构化抽取阶段：把每条原始搜索结果转换为零到多条投资人记录

use chrono::{Local, NaiveDate};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::generator::context::{GeneratorContext, pace};
use crate::llm::{CompletionOptions, ProviderError};
use crate::types::{InvestorRecord, RawSearchResult};

pub mod json_fragment;
pub mod record_parser;

pub use json_fragment::{balanced_json_fragments, first_balanced_json};
use record_parser::{ExtractedInvestor, investor_objects};

/// 诊断日志中保留的原始文本长度
const RAW_PREVIEW_CHARS: usize = 500;

const EXTRACT_SYSTEM_PROMPT: &str = "You convert investor research notes into strict JSON. \
Return ONLY a JSON array of objects, no commentary. \
Omit linkedin_url and email when they are not present in the notes; never fabricate plausible-looking emails or URLs.";

/// 抽取失败的原因
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("extraction call failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("response contains no JSON array or object")]
    NoJson,

    #[error("JSON fragment could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 解析模型的抽取输出，永远不会失败：无法解析时返回空列表并记录原文
pub fn parse_investor_records(text: &str, date_added: NaiveDate) -> Vec<InvestorRecord> {
    match try_parse_investor_records(text, date_added) {
        Ok(records) => records,
        Err(e) => {
            warn!(
                error = %e,
                raw = %preview(text),
                "could not parse extraction output, yielding zero records"
            );
            vec![]
        }
    }
}

/// 严格版本：区分“没有JSON”和“JSON不合法”
///
/// 依次尝试每个括号配平的片段，第一个能解析且含投资人对象的片段胜出；
/// 引用标记`[1]`或`[based on ...]`这类旁注会被跳过。
pub fn try_parse_investor_records(
    text: &str,
    date_added: NaiveDate,
) -> Result<Vec<InvestorRecord>, ExtractionError> {
    let mut first_error = None;
    let mut found_json = false;

    for fragment in balanced_json_fragments(text) {
        let value: Value = match serde_json::from_str(fragment) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "skipping fragment that is not JSON");
                first_error.get_or_insert(e);
                continue;
            }
        };
        found_json = true;

        let objects = investor_objects(value);
        if objects.is_empty() {
            continue;
        }
        return Ok(objects
            .iter()
            .filter_map(|object| ExtractedInvestor::from_map(object).into_record(date_added))
            .collect());
    }

    if found_json {
        return Ok(vec![]);
    }
    Err(first_error.map_or(ExtractionError::NoJson, ExtractionError::Parse))
}

fn preview(text: &str) -> String {
    text.chars().take(RAW_PREVIEW_CHARS).collect()
}

/// 逐条调用模型进行结构化抽取
#[derive(Default)]
pub struct RecordExtractor;

impl RecordExtractor {
    /// 抽取单条原始结果；调用或解析失败都返回空列表
    pub async fn extract(
        &self,
        context: &GeneratorContext,
        raw: &RawSearchResult,
    ) -> Vec<InvestorRecord> {
        let options = CompletionOptions::new(context.config.llm.max_tokens_extract)
            .with_system_prompt(EXTRACT_SYSTEM_PROMPT);
        let prompt = build_extraction_prompt(raw);

        match context.llm_client.complete(&prompt, &options).await {
            Ok(text) => {
                let records = parse_investor_records(&text, Local::now().date_naive());
                debug!(query = %raw.query, records = records.len(), "extracted");
                records
            }
            Err(e) => {
                let error = ExtractionError::from(e);
                warn!(query = %raw.query, error = %error, "skipping search result");
                vec![]
            }
        }
    }

    /// 依次抽取所有原始结果，保持输入顺序
    pub async fn execute(
        &self,
        context: &GeneratorContext,
        raw_results: &[RawSearchResult],
    ) -> Vec<InvestorRecord> {
        let mut records = Vec::new();
        for (index, raw) in raw_results.iter().enumerate() {
            if index > 0 {
                pace(context.config.pacing.extract_delay_ms).await;
            }
            info!(query = %raw.query, "extracting {}/{}", index + 1, raw_results.len());
            records.extend(self.extract(context, raw).await);
        }
        info!(records = records.len(), "extraction stage finished");
        records
    }
}

fn build_extraction_prompt(raw: &RawSearchResult) -> String {
    format!(
        r#"Here are web search results about investors for the query "{query}":

{text}

Extract a structured list of the individual investors and firms mentioned.

For each investor, provide:
- full_name: Person or firm name
- title: Their role/title
- company: Company/Fund name
- linkedin_url: LinkedIn profile URL (omit if not in the results)
- email: Email address (omit if not in the results)
- location: City
- investment_focus: Sectors/stages they focus on
- portfolio_companies: Array of notable companies they have invested in
- source_url: Where this info came from

Return ONLY a valid JSON array of objects. No other text.
Example format:
[
  {{
    "full_name": "John Smith",
    "title": "Managing Partner",
    "company": "ABC Ventures",
    "linkedin_url": "https://linkedin.com/in/johnsmith",
    "location": "Dubai",
    "investment_focus": "Early-stage SaaS, fintech",
    "portfolio_companies": ["Company A", "Company B"],
    "source_url": "https://example.com"
  }}
]"#,
        query = raw.query,
        text = raw.text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::test_support::{MockProvider, fast_config};
    use crate::types::SearchQuery;
    use std::sync::Arc;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn test_parse_empty_string() {
        assert!(parse_investor_records("", date()).is_empty());
    }

    #[test]
    fn test_parse_plain_prose() {
        let text = "I could not find any investors matching that description.";
        assert!(parse_investor_records(text, date()).is_empty());
        assert!(matches!(
            try_parse_investor_records(text, date()),
            Err(ExtractionError::NoJson)
        ));
    }

    #[test]
    fn test_parse_valid_array() {
        let text = r#"[{"full_name": "Jane Doe", "company": "Acme Capital"},
                      {"full_name": "John Roe", "company": "Beta Fund"}]"#;
        let records = parse_investor_records(text, date());
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].full_name, "John Roe");
    }

    #[test]
    fn test_parse_valid_object() {
        let text = r#"{"full_name": "Jane Doe", "company": "Acme Capital"}"#;
        let records = parse_investor_records(text, date());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].company, "Acme Capital");
    }

    #[test]
    fn test_parse_json_embedded_in_prose() {
        let text = "Sure! Here is the list:\n```json\n[{\"full_name\": \"Jane Doe\", \"company\": \"Acme Capital\", \"email\": \"Not found\"}]\n```";
        let records = parse_investor_records(text, date());
        assert_eq!(records.len(), 1);
        assert!(records[0].email.is_none());
    }

    #[test]
    fn test_parse_balanced_but_invalid_json() {
        let text = "[{full_name: Jane}]";
        assert!(parse_investor_records(text, date()).is_empty());
        assert!(matches!(
            try_parse_investor_records(text, date()),
            Err(ExtractionError::Parse(_))
        ));
    }

    #[test]
    fn test_alias_next_to_canonical_key_keeps_object() {
        let text = r#"[{"full_name": "Jane Doe", "company": "Acme Capital",
                      "location": "Dubai, UAE", "city": "Dubai"},
                      {"full_name": "John Roe", "name": "John"}]"#;
        let records = parse_investor_records(text, date());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].location, "Dubai, UAE");
        assert_eq!(records[1].full_name, "John Roe");
    }

    #[test]
    fn test_citation_marker_before_array_is_skipped() {
        let text = "Sources [1]\n[{\"full_name\":\"Jane Doe\",\"company\":\"Acme Capital\"}]";
        let records = parse_investor_records(text, date());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].company, "Acme Capital");
    }

    #[test]
    fn test_bracketed_aside_before_array_is_skipped() {
        let text = "Here are the investors [based on the search notes]:\n```json\n[{\"full_name\": \"Jane Doe\", \"company\": \"Acme Capital\"}]\n```";
        let records = parse_investor_records(text, date());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].full_name, "Jane Doe");
    }

    #[test]
    fn test_first_valid_fragment_wins() {
        let text = r#"[{"full_name": "Jane Doe"}] and also [{"full_name": "John Roe"}]"#;
        let records = parse_investor_records(text, date());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].full_name, "Jane Doe");
    }

    #[test]
    fn test_json_without_investors_yields_zero() {
        assert!(matches!(
            try_parse_investor_records("No results [] found", date()),
            Ok(records) if records.is_empty()
        ));
    }

    #[tokio::test]
    async fn test_extract_provider_failure_yields_zero() {
        let context =
            GeneratorContext::with_provider(fast_config(), Arc::new(MockProvider::failing()));
        let raw = RawSearchResult::new(SearchQuery::new("q"), "notes");

        assert!(RecordExtractor.extract(&context, &raw).await.is_empty());
    }

    #[tokio::test]
    async fn test_execute_preserves_order_and_options() {
        let provider = Arc::new(MockProvider::new(|prompt, _| {
            if prompt.contains("first notes") {
                Ok(r#"[{"full_name": "Jane Doe", "company": "Acme Capital"}]"#.to_string())
            } else {
                Ok(r#"[{"full_name": "John Roe", "company": "Beta Fund"}]"#.to_string())
            }
        }));
        let context = GeneratorContext::with_provider(fast_config(), provider.clone());
        let raws = vec![
            RawSearchResult::new(SearchQuery::new("a"), "first notes"),
            RawSearchResult::new(SearchQuery::new("b"), "second notes"),
        ];

        let records = RecordExtractor.execute(&context, &raws).await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].full_name, "Jane Doe");
        assert_eq!(records[1].full_name, "John Roe");

        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        assert!(!calls[0].1.web_search);
        assert_eq!(calls[0].1.max_tokens, 6000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_extractions_are_paced() {
        let mut config = fast_config();
        config.pacing.extract_delay_ms = 1000;
        let context = GeneratorContext::with_provider(config, Arc::new(MockProvider::failing()));
        let raws = vec![
            RawSearchResult::new(SearchQuery::new("a"), "first"),
            RawSearchResult::new(SearchQuery::new("b"), "second"),
            RawSearchResult::new(SearchQuery::new("c"), "third"),
        ];

        let started = tokio::time::Instant::now();
        RecordExtractor.execute(&context, &raws).await;

        assert_eq!(started.elapsed(), std::time::Duration::from_millis(2000));
    }
}
