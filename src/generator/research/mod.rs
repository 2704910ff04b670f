// 调研阶段
// 1. planner：由行业/地区配置生成确定的查询列表（行业VC、城市、阶段、另类资本）
// 2. search_executor：逐条联网搜索，单条失败只记录不中断

use crate::generator::context::GeneratorContext;
use crate::types::SearchQuery;

pub mod planner;
pub mod search_executor;

pub use planner::plan_queries;
pub use search_executor::{FailedQuery, SearchBatch, SearchExecutor};

/// 执行调研阶段
pub async fn execute(context: &GeneratorContext, queries: &[SearchQuery]) -> SearchBatch {
    SearchExecutor.execute(context, queries).await
}
