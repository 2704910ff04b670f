use serde::{Deserialize, Serialize};

/// 一条搜索查询
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery(pub String);

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self(query.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 单条查询的原始搜索结果，仅在抽取阶段之前存在
#[derive(Debug, Clone)]
pub struct RawSearchResult {
    /// 产生该结果的查询，用于诊断
    pub query: SearchQuery,
    /// 模型返回的原始文本
    pub text: String,
}

impl RawSearchResult {
    pub fn new(query: SearchQuery, text: impl Into<String>) -> Self {
        Self {
            query,
            text: text.into(),
        }
    }
}
