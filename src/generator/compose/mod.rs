//! 消息生成阶段：为每条合并后的记录写一条简短的个性化外联消息

use tracing::{debug, info, warn};

use crate::generator::context::{GeneratorContext, pace};
use crate::llm::CompletionOptions;
use crate::types::InvestorRecord;

pub mod message;
pub mod types;

use message::{addresses_investor, clean_generated, fallback_message, fit_to_ceiling};
use types::MessageSource;

const COMPOSE_SYSTEM_PROMPT: &str = "You write short, warm LinkedIn connection requests from a startup founder to an investor. \
Return only the message text, without quotes, labels or commentary.";

/// 消息生成阶段的结果
#[derive(Debug, Default)]
pub struct ComposeOutcome {
    /// 与输入顺序一致，每条都带有非空消息
    pub records: Vec<InvestorRecord>,
    pub generated: usize,
    pub fallbacks: usize,
    pub existing: usize,
}

impl ComposeOutcome {
    fn count(&mut self, source: MessageSource) {
        match source {
            MessageSource::Generated => self.generated += 1,
            MessageSource::Fallback => self.fallbacks += 1,
            MessageSource::Existing => self.existing += 1,
        }
    }
}

/// 外联消息生成器
#[derive(Default)]
pub struct MessageComposer;

impl MessageComposer {
    /// 依次为所有记录生成消息；已有消息的记录原样保留
    pub async fn execute(
        &self,
        context: &GeneratorContext,
        records: Vec<InvestorRecord>,
    ) -> ComposeOutcome {
        let mut outcome = ComposeOutcome::default();
        let total = records.len();
        let mut calls_made = 0usize;

        for (index, mut record) in records.into_iter().enumerate() {
            if record.is_messaged() {
                outcome.count(MessageSource::Existing);
                outcome.records.push(record);
                continue;
            }

            if calls_made > 0 {
                pace(context.config.pacing.compose_delay_ms).await;
            }
            calls_made += 1;

            info!(investor = %record.full_name, "composing message {}/{}", index + 1, total);
            let (message, source) = self.compose(context, &record).await;
            record.personalized_message = Some(message);
            outcome.count(source);
            outcome.records.push(record);
        }

        info!(
            generated = outcome.generated,
            fallbacks = outcome.fallbacks,
            existing = outcome.existing,
            "compose stage finished"
        );
        outcome
    }

    /// 为单条记录生成消息，任何失败都回退到模板消息
    pub async fn compose(
        &self,
        context: &GeneratorContext,
        record: &InvestorRecord,
    ) -> (String, MessageSource) {
        let max_chars = context.config.message.max_chars;
        let options = CompletionOptions::new(context.config.llm.max_tokens_compose)
            .with_system_prompt(COMPOSE_SYSTEM_PROMPT);
        let prompt = build_compose_prompt(record, context);

        match context.llm_client.complete(&prompt, &options).await {
            Ok(text) => {
                let fitted = fit_to_ceiling(&clean_generated(&text), max_chars);
                if fitted.is_empty() {
                    warn!(investor = %record.full_name, "empty message, using fallback");
                } else if !addresses_investor(&fitted, record) {
                    debug!(investor = %record.full_name, message = %fitted, "message ignores investor focus");
                    warn!(investor = %record.full_name, "message is not personalized, using fallback");
                } else {
                    return (fitted, MessageSource::Generated);
                }
            }
            Err(e) => {
                warn!(investor = %record.full_name, error = %e, "message generation failed, using fallback");
            }
        }

        (fallback_message(record, &context.config), MessageSource::Fallback)
    }
}

fn build_compose_prompt(record: &InvestorRecord, context: &GeneratorContext) -> String {
    let config = &context.config;
    let or_unknown = |text: &str| {
        if text.trim().is_empty() {
            "Unknown".to_string()
        } else {
            text.trim().to_string()
        }
    };
    let portfolio = if record.portfolio_companies.is_empty() {
        "Unknown".to_string()
    } else {
        record.portfolio_companies.join(", ")
    };
    let sender = if config.company_name.trim().is_empty() {
        "a startup".to_string()
    } else {
        config.company_name.trim().to_string()
    };

    format!(
        r#"Write a personalized LinkedIn connection request message (under {max_chars} characters) to this investor:

Name: {name}
Company: {company}
Title: {title}
Investment Focus: {focus}
Portfolio: {portfolio}

Context: I'm building {sender} - {pitch}

The message should:
- Be warm and professional
- Reference their specific investment focus or a portfolio company
- Briefly mention what I'm building
- Ask to connect
- Stay under {max_chars} characters

Return ONLY the message text, nothing else."#,
        max_chars = config.message.max_chars,
        name = or_unknown(&record.full_name),
        company = or_unknown(&record.company),
        title = or_unknown(&record.title),
        focus = or_unknown(&record.investment_focus),
        portfolio = portfolio,
        sender = sender,
        pitch = config.pitch.trim(),
    )
}
