//! 去重合并阶段
//!
//! 同一身份（规范化姓名 + 规范化机构）的记录合并为一条：逐字段取组内
//! 第一个非空值，被投企业列表按规范化文本取并集并保持首次出现的顺序。

use std::collections::HashMap;

use tracing::info;

use crate::types::InvestorRecord;
use crate::types::investor::{IdentityKey, normalize};

/// 无状态的记录合并器
pub struct RecordMerger;

impl RecordMerger {
    /// 合并全部记录，输出顺序为各身份首次出现的顺序
    pub fn merge_records(records: Vec<InvestorRecord>) -> Vec<InvestorRecord> {
        let total = records.len();
        let mut merged: Vec<InvestorRecord> = Vec::new();
        let mut positions: HashMap<IdentityKey, usize> = HashMap::new();

        for record in records {
            match positions.get(&record.identity_key()) {
                Some(&position) => Self::merge_into(&mut merged[position], record),
                None => {
                    positions.insert(record.identity_key(), merged.len());
                    merged.push(record);
                }
            }
        }

        info!(
            input = total,
            unique = merged.len(),
            "merged duplicate investor records"
        );
        merged
    }

    /// 把later合并进earlier，earlier中已有的非空值优先
    pub fn merge_into(earlier: &mut InvestorRecord, later: InvestorRecord) {
        fill_text(&mut earlier.full_name, later.full_name);
        fill_text(&mut earlier.title, later.title);
        fill_text(&mut earlier.company, later.company);
        fill_text(&mut earlier.location, later.location);
        fill_text(&mut earlier.investment_focus, later.investment_focus);
        fill_text(&mut earlier.source_url, later.source_url);
        fill_option(&mut earlier.linkedin_url, later.linkedin_url);
        fill_option(&mut earlier.email, later.email);
        fill_option(&mut earlier.personalized_message, later.personalized_message);

        for company in later.portfolio_companies {
            let key = normalize(&company);
            if key.is_empty() {
                continue;
            }
            if !earlier
                .portfolio_companies
                .iter()
                .any(|existing| normalize(existing) == key)
            {
                earlier.portfolio_companies.push(company);
            }
        }
    }
}

fn fill_text(slot: &mut String, candidate: String) {
    if slot.trim().is_empty() && !candidate.trim().is_empty() {
        *slot = candidate;
    }
}

fn fill_option(slot: &mut Option<String>, candidate: Option<String>) {
    let slot_empty = slot.as_deref().is_none_or(|value| value.trim().is_empty());
    let candidate_present = candidate
        .as_deref()
        .is_some_and(|value| !value.trim().is_empty());
    if slot_empty && candidate_present {
        *slot = candidate;
    }
}
