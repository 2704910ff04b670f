use tracing::{info, warn};

use crate::generator::context::{GeneratorContext, pace};
use crate::llm::CompletionOptions;
use crate::types::{RawSearchResult, SearchQuery};

const SEARCH_SYSTEM_PROMPT: &str = "You are an investor research assistant with web search. \
Describe only real, named investors (people or firms) that you actually found in search results and that match the query. \
Never invent names, email addresses or LinkedIn URLs; say \"Not found\" when a detail is not publicly available.";

/// 一次失败的查询及原因
#[derive(Debug, Clone)]
pub struct FailedQuery {
    pub query: SearchQuery,
    pub reason: String,
}

/// 一批查询的执行结果
#[derive(Debug, Default)]
pub struct SearchBatch {
    /// 成功查询的原始结果，顺序与输入一致
    pub results: Vec<RawSearchResult>,
    pub failures: Vec<FailedQuery>,
}

/// 逐条执行联网搜索
#[derive(Default)]
pub struct SearchExecutor;

impl SearchExecutor {
    /// 依次执行所有查询；单条失败只记录，不中断批次
    pub async fn execute(&self, context: &GeneratorContext, queries: &[SearchQuery]) -> SearchBatch {
        let mut batch = SearchBatch::default();
        let options = CompletionOptions::new(context.config.llm.max_tokens_search)
            .with_system_prompt(SEARCH_SYSTEM_PROMPT)
            .with_web_search();

        for (index, query) in queries.iter().enumerate() {
            if index > 0 {
                pace(context.config.pacing.search_delay_ms).await;
            }
            info!(query = %query, "searching {}/{}", index + 1, queries.len());

            let prompt = build_search_prompt(query, context.config.target_count);
            match context.llm_client.complete(&prompt, &options).await {
                Ok(text) if !text.trim().is_empty() => {
                    batch.results.push(RawSearchResult::new(query.clone(), text));
                }
                Ok(_) => {
                    warn!(query = %query, "search returned empty text, skipping");
                    batch.failures.push(FailedQuery {
                        query: query.clone(),
                        reason: "empty response".to_string(),
                    });
                }
                Err(e) => {
                    warn!(query = %query, error = %e, "search failed, skipping");
                    batch.failures.push(FailedQuery {
                        query: query.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            succeeded = batch.results.len(),
            failed = batch.failures.len(),
            "search stage finished"
        );
        batch
    }
}

fn build_search_prompt(query: &SearchQuery, target_count: usize) -> String {
    format!(
        r#"Search the web for: {query}

Find at least {target_count} specific investors matching this search.

For each investor, report:
1. Full name (person or firm)
2. Title/role
3. Company/Fund name
4. LinkedIn profile URL (only if found)
5. Email (only if publicly available)
6. Investment focus/sectors
7. Notable portfolio companies
8. Location
9. Source URL where the information was found

Provide detailed results with real names and companies."#,
        query = query,
        target_count = target_count.max(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::test_support::{MockProvider, fast_config};
    use crate::llm::ProviderError;
    use std::sync::Arc;

    fn queries(items: &[&str]) -> Vec<SearchQuery> {
        items.iter().map(|q| SearchQuery::new(*q)).collect()
    }

    #[tokio::test]
    async fn test_search_enables_web_search() {
        let provider = Arc::new(MockProvider::new(|_, _| Ok("Jane Doe, Acme Capital".to_string())));
        let context = GeneratorContext::with_provider(fast_config(), provider.clone());

        let batch = SearchExecutor
            .execute(&context, &queries(&["dubai vc"]))
            .await;

        assert_eq!(batch.results.len(), 1);
        assert_eq!(batch.results[0].query.as_str(), "dubai vc");
        let calls = provider.calls();
        assert!(calls[0].1.web_search);
        assert_eq!(calls[0].1.max_tokens, 4000);
        assert!(calls[0].0.contains("dubai vc"));
        assert!(calls[0].0.contains("at least 15"));
    }

    #[tokio::test]
    async fn test_failed_query_does_not_abort_batch() {
        let provider = Arc::new(MockProvider::new(|prompt, _| {
            if prompt.contains("broken") {
                Err(ProviderError::Timeout(30))
            } else {
                Ok("some investors".to_string())
            }
        }));
        let context = GeneratorContext::with_provider(fast_config(), provider);

        let batch = SearchExecutor
            .execute(&context, &queries(&["first", "broken", "third"]))
            .await;

        assert_eq!(batch.results.len(), 2);
        assert_eq!(batch.results[1].query.as_str(), "third");
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].query.as_str(), "broken");
        assert!(batch.failures[0].reason.contains("timed out"));
    }

    #[tokio::test]
    async fn test_empty_text_is_recorded_as_failure() {
        let provider = Arc::new(MockProvider::new(|_, _| Ok("   ".to_string())));
        let context = GeneratorContext::with_provider(fast_config(), provider);

        let batch = SearchExecutor.execute(&context, &queries(&["q"])).await;
        assert!(batch.results.is_empty());
        assert_eq!(batch.failures[0].reason, "empty response");
    }

    #[tokio::test]
    async fn test_all_failures_yield_empty_batch() {
        let provider = Arc::new(MockProvider::failing());
        let context = GeneratorContext::with_provider(fast_config(), provider);

        let batch = SearchExecutor
            .execute(&context, &queries(&["a", "b"]))
            .await;
        assert!(batch.results.is_empty());
        assert_eq!(batch.failures.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_searches_are_paced() {
        let mut config = fast_config();
        config.pacing.search_delay_ms = 2000;
        let provider = Arc::new(MockProvider::new(|_, _| Ok("notes".to_string())));
        let context = GeneratorContext::with_provider(config, provider);

        let started = tokio::time::Instant::now();
        SearchExecutor
            .execute(&context, &queries(&["a", "b", "c"]))
            .await;

        assert_eq!(started.elapsed(), std::time::Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_search_does_not_wait() {
        let mut config = fast_config();
        config.pacing.search_delay_ms = 2000;
        let context = GeneratorContext::with_provider(config, Arc::new(MockProvider::failing()));

        let started = tokio::time::Instant::now();
        SearchExecutor.execute(&context, &queries(&["a"])).await;

        assert_eq!(started.elapsed(), std::time::Duration::ZERO);
    }
}
