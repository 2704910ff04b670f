//! 把模型返回的JSON值宽松地转换为投资人记录

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::{Map, Value};

use crate::types::InvestorRecord;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("email regex")
});

static LINKEDIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://([a-z]{2,3}\.)?linkedin\.com/.+").expect("linkedin regex")
});

/// 模型在信息缺失时常用的占位值
const PLACEHOLDERS: &[&str] = &[
    "not found",
    "not available",
    "n/a",
    "na",
    "none",
    "null",
    "unknown",
    "-",
    "--",
    "tbd",
    "not publicly available",
];

/// 模型输出的单个投资人对象
///
/// 所有字段都可缺失；null、数字、数组等非预期类型会被宽松转换为文本。
/// 同一字段的规范键与别名可能同时出现，按顺序取第一个有内容的值。
#[derive(Debug, Default)]
pub struct ExtractedInvestor {
    pub full_name: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub linkedin_url: String,
    pub email: String,
    pub investment_focus: String,
    pub portfolio_companies: Vec<String>,
    pub source_url: String,
}

const FULL_NAME_KEYS: &[&str] = &["full_name", "name"];
const TITLE_KEYS: &[&str] = &["title", "role"];
const COMPANY_KEYS: &[&str] = &["company", "fund", "firm", "company_name"];
const LOCATION_KEYS: &[&str] = &["location", "city"];
const LINKEDIN_KEYS: &[&str] = &["linkedin_url", "linkedin"];
const EMAIL_KEYS: &[&str] = &["email"];
const FOCUS_KEYS: &[&str] = &["investment_focus", "focus", "sectors"];
const PORTFOLIO_KEYS: &[&str] = &["portfolio_companies", "portfolio"];
const SOURCE_KEYS: &[&str] = &["source_url", "source"];

impl ExtractedInvestor {
    /// 从JSON对象读取字段
    pub fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            full_name: text_field(map, FULL_NAME_KEYS),
            title: text_field(map, TITLE_KEYS),
            company: text_field(map, COMPANY_KEYS),
            location: text_field(map, LOCATION_KEYS),
            linkedin_url: text_field(map, LINKEDIN_KEYS),
            email: text_field(map, EMAIL_KEYS),
            investment_focus: text_field(map, FOCUS_KEYS),
            portfolio_companies: list_field(map, PORTFOLIO_KEYS),
            source_url: text_field(map, SOURCE_KEYS),
        }
    }

    /// 转换为记录；姓名与机构都为空的对象没有身份，返回None
    pub fn into_record(self, date_added: NaiveDate) -> Option<InvestorRecord> {
        let full_name = clean_text(&self.full_name);
        let company = clean_text(&self.company);
        if full_name.is_empty() && company.is_empty() {
            return None;
        }

        let mut record = InvestorRecord::new(full_name, company, date_added);
        record.title = clean_text(&self.title);
        record.location = clean_text(&self.location);
        record.investment_focus = clean_text(&self.investment_focus);
        record.portfolio_companies = self
            .portfolio_companies
            .iter()
            .map(|item| clean_text(item))
            .filter(|item| !item.is_empty())
            .collect();
        record.source_url = clean_text(&self.source_url);
        record.email = sanitize_email(&self.email);
        record.linkedin_url = sanitize_linkedin(&self.linkedin_url);
        Some(record)
    }
}

/// 从解析后的JSON值中取出投资人对象
///
/// 支持三种形态：对象数组；带姓名或机构的单个对象；
/// 包装对象（取第一个“对象数组”字段，如 `{"investors": [...]}`）。
pub fn investor_objects(value: Value) -> Vec<Map<String, Value>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        Value::Object(map) => {
            let has_identity = FULL_NAME_KEYS
                .iter()
                .chain(COMPANY_KEYS)
                .any(|key| map.contains_key(*key));
            if has_identity {
                return vec![map];
            }
            map.into_iter()
                .map(|(_, value)| value)
                .find(|value| {
                    value
                        .as_array()
                        .is_some_and(|items| items.iter().any(Value::is_object))
                })
                .map(investor_objects)
                .unwrap_or_default()
        }
        _ => vec![],
    }
}

fn is_placeholder(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    PLACEHOLDERS.contains(&lower.as_str())
}

/// 去除首尾空白，占位值视为空
fn clean_text(text: &str) -> String {
    let trimmed = text.trim();
    if is_placeholder(trimmed) {
        String::new()
    } else {
        trimmed.to_string()
    }
}

fn sanitize_email(raw: &str) -> Option<String> {
    let cleaned = clean_text(raw);
    let candidate = cleaned
        .strip_prefix("mailto:")
        .unwrap_or(&cleaned)
        .trim()
        .to_string();
    Some(candidate).filter(|email| EMAIL_REGEX.is_match(email))
}

fn sanitize_linkedin(raw: &str) -> Option<String> {
    let cleaned = clean_text(raw);
    let lower = cleaned.to_lowercase();
    let candidate = if lower.starts_with("linkedin.com/") || lower.starts_with("www.linkedin.com/")
    {
        format!("https://{}", cleaned)
    } else {
        cleaned
    };
    Some(candidate).filter(|url| LINKEDIN_REGEX.is_match(url))
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null | Value::Object(_) => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// 依次查找各个键，返回第一个非空且不是占位值的文本
fn text_field(map: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .map(value_to_text)
        .find(|text| !clean_text(text).is_empty())
        .unwrap_or_default()
}

fn list_field(map: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .map(value_to_list)
        .find(|items| items.iter().any(|item| !clean_text(item).is_empty()))
        .unwrap_or_default()
}

fn value_to_list(value: &Value) -> Vec<String> {
    let items: Vec<String> = match value {
        Value::Array(items) => items.iter().map(value_to_text).collect(),
        Value::String(s) => s.split([',', ';']).map(|item| item.trim().to_string()).collect(),
        other => vec![value_to_text(other)],
    };
    items.into_iter().filter(|item| !item.is_empty()).collect()
}
