use crate::config::Config;
use crate::generator::compose::MessageComposer;
use crate::generator::context::GeneratorContext;
use crate::generator::extraction::RecordExtractor;
use crate::generator::merge::RecordMerger;
use crate::generator::research::{self, FailedQuery, plan_queries};
use crate::types::{InvestorRecord, SearchQuery};

use anyhow::Result;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

/// 时间跟踪作用域
pub struct TimingScope {
    start_time: Instant,
    phase_start_times: Vec<(String, Instant)>,
    phase_durations: Vec<(String, Duration)>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            phase_start_times: Vec::new(),
            phase_durations: Vec::new(),
        }
    }

    /// 开始一个新的阶段计时
    pub fn start_phase(&mut self, phase_name: &str) {
        self.phase_start_times
            .push((phase_name.to_string(), Instant::now()));
    }

    /// 结束一个阶段的计时
    pub fn end_phase(&mut self, phase_name: &str) -> Option<Duration> {
        let position = self
            .phase_start_times
            .iter()
            .position(|(name, _)| name == phase_name)?;
        let (name, start_time) = self.phase_start_times.remove(position);
        let duration = start_time.elapsed();
        self.phase_durations.push((name, duration));
        Some(duration)
    }

    /// 获取总执行时间
    pub fn get_total_duration(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 按结束顺序排列的各阶段耗时
    pub fn get_phase_durations(&self) -> &[(String, Duration)] {
        &self.phase_durations
    }

    /// 获取格式化的执行时间报告
    pub fn generate_timing_report(&self) -> String {
        let mut report = format!(
            "Total time: {:.2}s\n",
            self.get_total_duration().as_secs_f64()
        );

        if !self.phase_durations.is_empty() {
            report.push_str("\nStage timings:\n");
            for (phase, duration) in &self.phase_durations {
                report.push_str(&format!("- {}: {:.3}s\n", phase, duration.as_secs_f64()));
            }
        }

        report
    }
}

/// 时间跟踪常量
pub struct TimingKeys;

impl TimingKeys {
    pub const SEARCH: &'static str = "search";
    pub const EXTRACT: &'static str = "extract";
    pub const MERGE: &'static str = "merge";
    pub const COMPOSE: &'static str = "compose";
    pub const OUTPUT: &'static str = "output";
}

/// 一次运行的结果与统计
#[derive(Debug, Default)]
pub struct RunReport {
    pub queries_planned: usize,
    pub failed_queries: Vec<FailedQuery>,
    pub raw_results: usize,
    /// 合并前抽取出的记录数
    pub extracted: usize,
    /// 合并后、带消息的最终记录，顺序即导出顺序
    pub records: Vec<InvestorRecord>,
    pub generated_messages: usize,
    pub fallback_messages: usize,
    pub existing_messages: usize,
    pub output_path: Option<PathBuf>,
    pub timing_report: String,
}

impl RunReport {
    pub fn with_linkedin(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.linkedin_url.is_some())
            .count()
    }

    pub fn with_email(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.email.is_some())
            .count()
    }

    /// 生成运行摘要
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Queries: {} planned, {} failed\n\
             Search results: {}\n\
             Records: {} extracted, {} unique\n\
             With LinkedIn: {}\n\
             With email: {}\n\
             Messages: {} generated, {} fallback, {} kept\n",
            self.queries_planned,
            self.failed_queries.len(),
            self.raw_results,
            self.extracted,
            self.records.len(),
            self.with_linkedin(),
            self.with_email(),
            self.generated_messages,
            self.fallback_messages,
            self.existing_messages,
        );
        for failed in &self.failed_queries {
            summary.push_str(&format!("  failed query \"{}\": {}\n", failed.query, failed.reason));
        }
        if let Some(path) = &self.output_path {
            summary.push_str(&format!("Saved to: {}\n", path.display()));
        }
        summary
    }
}

/// 依次执行 搜索 → 抽取 → 合并 → 消息生成，不写文件
///
/// 单条查询、抽取或消息的失败都在阶段内部吸收，因此这里不会返回错误。
pub async fn run_pipeline(context: &GeneratorContext, queries: &[SearchQuery]) -> RunReport {
    let mut timing_scope = TimingScope::new();
    let mut report = RunReport {
        queries_planned: queries.len(),
        ..Default::default()
    };

    timing_scope.start_phase(TimingKeys::SEARCH);
    let batch = research::execute(context, queries).await;
    timing_scope.end_phase(TimingKeys::SEARCH);
    report.raw_results = batch.results.len();
    report.failed_queries = batch.failures;

    timing_scope.start_phase(TimingKeys::EXTRACT);
    let extracted = RecordExtractor.execute(context, &batch.results).await;
    timing_scope.end_phase(TimingKeys::EXTRACT);
    report.extracted = extracted.len();

    timing_scope.start_phase(TimingKeys::MERGE);
    let merged = RecordMerger::merge_records(extracted);
    timing_scope.end_phase(TimingKeys::MERGE);

    timing_scope.start_phase(TimingKeys::COMPOSE);
    let outcome = MessageComposer.execute(context, merged).await;
    timing_scope.end_phase(TimingKeys::COMPOSE);

    report.records = outcome.records;
    report.generated_messages = outcome.generated;
    report.fallback_messages = outcome.fallbacks;
    report.existing_messages = outcome.existing;
    report.timing_report = timing_scope.generate_timing_report();
    report
}

/// 使用已构建的上下文执行完整流程并导出
pub async fn launch_with_context(context: &GeneratorContext) -> Result<RunReport> {
    let queries = plan_queries(&context.config);
    info!(queries = queries.len(), region = %context.config.region(), "planned search queries");

    let mut report = run_pipeline(context, &queries).await;

    let started = Instant::now();
    let path = crate::generator::outlet::save(context, &report.records).await?;
    report.output_path = Some(path);
    report.timing_report.push_str(&format!(
        "- {}: {:.3}s\n",
        TimingKeys::OUTPUT,
        started.elapsed().as_secs_f64()
    ));

    Ok(report)
}

/// 启动投资人调研工作流
///
/// 配置错误（例如缺少API key）在任何模型调用之前返回。
pub async fn launch(config: &Config) -> Result<RunReport> {
    let context = GeneratorContext::new(config.clone())?;
    launch_with_context(&context).await
}
