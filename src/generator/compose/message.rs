//! 消息文本的清洗、校验、截断与模板兜底

use crate::config::Config;
use crate::types::InvestorRecord;
use crate::types::investor::normalize;

const ELLIPSIS: char = '…';

/// 清洗模型输出：去掉首尾空白、`Message:`前缀和包裹的引号
pub fn clean_generated(text: &str) -> String {
    let mut message = text.trim();

    for label in ["message:", "connection request:", "note:"] {
        if message.len() >= label.len()
            && message.is_char_boundary(label.len())
            && message[..label.len()].eq_ignore_ascii_case(label)
        {
            message = message[label.len()..].trim_start();
            break;
        }
    }

    for (open, close) in [('"', '"'), ('“', '”'), ('\'', '\'')] {
        if message.chars().count() >= 2 && message.starts_with(open) && message.ends_with(close) {
            message = &message[open.len_utf8()..message.len() - close.len_utf8()];
            message = message.trim();
            break;
        }
    }

    message.to_string()
}

/// 判断消息是否针对该投资人
///
/// 记录有投资方向或被投企业时，消息至少要提到其中之一；都没有时不做要求。
pub fn addresses_investor(message: &str, record: &InvestorRecord) -> bool {
    let portfolio: Vec<String> = record
        .portfolio_companies
        .iter()
        .map(|company| normalize(company))
        .filter(|company| !company.is_empty())
        .collect();
    let focus_terms = focus_terms(&record.investment_focus);

    if portfolio.is_empty() && focus_terms.is_empty() {
        return true;
    }

    let haystack = normalize(message);
    portfolio.iter().any(|company| haystack.contains(company.as_str()))
        || focus_terms.iter().any(|term| haystack.contains(term.as_str()))
}

/// 投资方向中的关键词（4个字符以上）
fn focus_terms(focus: &str) -> Vec<String> {
    focus
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() >= 4)
        .map(|word| word.to_lowercase())
        .collect()
}

/// 保证消息不超过字符上限，超出时在词边界截断并加省略号
pub fn fit_to_ceiling(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }

    let budget = max_chars - 1;
    let cut: String = text.chars().take(budget).collect();
    let shortened = match cut.rfind(char::is_whitespace) {
        Some(position) if cut[..position].chars().count() > budget / 2 => &cut[..position],
        _ => cut.as_str(),
    };

    let shortened = shortened.trim_end_matches(|c: char| c.is_whitespace() || ",;:-".contains(c));
    format!("{}{}", shortened, ELLIPSIS)
}

/// 由记录自身字段与发送方信息构造的模板消息，总是非空且不超过上限
pub fn fallback_message(record: &InvestorRecord, config: &Config) -> String {
    let max_chars = config.message.max_chars;
    let greeting = match record.first_name() {
        Some(name) => format!("Hi {},", name),
        None => "Hi there,".to_string(),
    };
    let sender = Some(config.company_name.trim())
        .filter(|name| !name.is_empty())
        .unwrap_or("a startup");
    let pitch = config.pitch.trim().trim_end_matches('.');

    let full_interest = interest_phrase(record, config, false);
    let short_interest = interest_phrase(record, config, true);

    let mut candidates = Vec::new();
    if !pitch.is_empty() {
        candidates.push(format!(
            "{} I've been following {}. I'm building {}, {}. Would love to connect.",
            greeting, full_interest, sender, pitch
        ));
    }
    candidates.push(format!(
        "{} I've been following {}. I'm building {} and would love to connect.",
        greeting, full_interest, sender
    ));
    candidates.push(format!(
        "{} I've been following {}. I'm building {} and would love to connect.",
        greeting, short_interest, sender
    ));
    candidates.push(format!(
        "{} I'm building {} and would love to connect.",
        greeting, sender
    ));

    candidates
        .iter()
        .find(|candidate| candidate.chars().count() <= max_chars)
        .cloned()
        .unwrap_or_else(|| fit_to_ceiling(&candidates[candidates.len() - 1], max_chars))
}

/// 描述投资人关注点的短语；short为true时只取第一个方向
fn interest_phrase(record: &InvestorRecord, config: &Config, short: bool) -> String {
    let focus = record.investment_focus.trim();
    let focus = if short {
        focus.split([',', ';']).next().unwrap_or(focus).trim()
    } else {
        focus
    };
    let portfolio = record
        .portfolio_companies
        .iter()
        .map(|company| company.trim())
        .find(|company| !company.is_empty());
    let company = record.company.trim();

    match (focus.is_empty(), portfolio) {
        (false, Some(portfolio)) if !short => {
            format!("your investments in {}, including {}", focus, portfolio)
        }
        (false, _) => format!("your investments in {}", focus),
        (true, Some(portfolio)) => format!("your backing of {}", portfolio),
        (true, None) if !company.is_empty() => format!("your work at {}", company),
        (true, None) => format!("your work in {}", config.industry_descriptors().join(", ")),
    }
}
