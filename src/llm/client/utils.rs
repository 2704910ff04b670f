use crate::config::LLMConfig;

use super::types::CompletionOptions;

/// 超过该长度的prompt直接交给高质量模型
const LARGE_PROMPT_BYTES: usize = 32 * 1024;

/// 为一次调用挑选模型，返回（首选模型，备选模型）
///
/// 联网搜索和大体量prompt直接使用高质量模型；其余调用优先使用高能效模型，
/// 失败后再以高质量模型兜底。
pub fn evaluate_befitting_model(
    llm_config: &LLMConfig,
    prompt: &str,
    options: &CompletionOptions,
) -> (String, Option<String>) {
    if options.web_search || options.system_prompt.len() + prompt.len() > LARGE_PROMPT_BYTES {
        return (llm_config.model_powerful.clone(), None);
    }

    let fallover = Some(llm_config.model_powerful.clone())
        .filter(|powerful| powerful != &llm_config.model_efficient);
    (llm_config.model_efficient.clone(), fallover)
}
