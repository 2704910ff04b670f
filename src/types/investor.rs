use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 外联状态，取值与表格中的下拉选项保持一致
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutreachStatus {
    #[serde(rename = "Not contacted")]
    #[default]
    NotContacted,
    #[serde(rename = "Request sent")]
    RequestSent,
    #[serde(rename = "Accepted")]
    Accepted,
    #[serde(rename = "Meeting scheduled")]
    MeetingScheduled,
    #[serde(rename = "Passed")]
    Passed,
}

impl std::fmt::Display for OutreachStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutreachStatus::NotContacted => write!(f, "Not contacted"),
            OutreachStatus::RequestSent => write!(f, "Request sent"),
            OutreachStatus::Accepted => write!(f, "Accepted"),
            OutreachStatus::MeetingScheduled => write!(f, "Meeting scheduled"),
            OutreachStatus::Passed => write!(f, "Passed"),
        }
    }
}

impl std::str::FromStr for OutreachStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "not contacted" => Ok(OutreachStatus::NotContacted),
            "request sent" => Ok(OutreachStatus::RequestSent),
            "accepted" => Ok(OutreachStatus::Accepted),
            "meeting scheduled" => Ok(OutreachStatus::MeetingScheduled),
            "passed" => Ok(OutreachStatus::Passed),
            _ => Err(format!("Unknown outreach status: {}", s)),
        }
    }
}

/// 去重用的身份键：规范化后的（姓名，机构）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub name: String,
    pub company: String,
}

/// 大小写不敏感、折叠空白后的文本
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 投资人记录
///
/// 字段顺序即导出表格的列顺序。
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InvestorRecord {
    /// 姓名（个人或机构）
    pub full_name: String,

    /// 职位
    pub title: String,

    /// 所属机构/基金
    pub company: String,

    /// 所在城市
    pub location: String,

    /// LinkedIn主页，未知时为空
    pub linkedin_url: Option<String>,

    /// 公开邮箱，未知时为空
    pub email: Option<String>,

    /// 投资方向
    pub investment_focus: String,

    /// 代表性被投企业
    pub portfolio_companies: Vec<String>,

    /// 个性化外联消息，只由消息生成阶段写入
    pub personalized_message: Option<String>,

    pub outreach_status: OutreachStatus,

    pub date_added: NaiveDate,

    /// 信息来源
    pub source_url: String,
}

impl InvestorRecord {
    /// 创建仅包含身份字段的记录
    pub fn new(full_name: impl Into<String>, company: impl Into<String>, date_added: NaiveDate) -> Self {
        Self {
            full_name: full_name.into(),
            title: String::new(),
            company: company.into(),
            location: String::new(),
            linkedin_url: None,
            email: None,
            investment_focus: String::new(),
            portfolio_companies: Vec::new(),
            personalized_message: None,
            outreach_status: OutreachStatus::default(),
            date_added,
            source_url: String::new(),
        }
    }

    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey {
            name: normalize(&self.full_name),
            company: normalize(&self.company),
        }
    }

    /// 名字的第一个词，用于称呼
    pub fn first_name(&self) -> Option<&str> {
        self.full_name.split_whitespace().next()
    }

    pub fn is_messaged(&self) -> bool {
        self.personalized_message
            .as_deref()
            .is_some_and(|message| !message.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[test]
    fn test_identity_key_ignores_case_and_spacing() {
        let a = InvestorRecord::new("Jane  Doe", "Acme Capital", date());
        let b = InvestorRecord::new(" jane doe ", "ACME\tcapital", date());
        assert_eq!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn test_new_record_defaults() {
        let record = InvestorRecord::new("Jane Doe", "Acme Capital", date());
        assert_eq!(record.outreach_status, OutreachStatus::NotContacted);
        assert!(record.email.is_none());
        assert!(record.linkedin_url.is_none());
        assert!(!record.is_messaged());
        assert_eq!(record.first_name(), Some("Jane"));
    }

    #[test]
    fn test_outreach_status_round_trip_labels() {
        assert_eq!(OutreachStatus::NotContacted.to_string(), "Not contacted");
        assert_eq!(
            "meeting scheduled".parse::<OutreachStatus>().unwrap(),
            OutreachStatus::MeetingScheduled
        );
        assert!("ghosted".parse::<OutreachStatus>().is_err());

        let json = serde_json::to_string(&OutreachStatus::RequestSent).unwrap();
        assert_eq!(json, "\"Request sent\"");
    }

    #[test]
    fn test_blank_message_is_not_messaged() {
        let mut record = InvestorRecord::new("Jane Doe", "Acme Capital", date());
        record.personalized_message = Some("   ".to_string());
        assert!(!record.is_messaged());
    }
}
