use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::ExportFormat;
use crate::generator::context::GeneratorContext;
use crate::types::InvestorRecord;

/// 导出表格的列，顺序固定
pub const CSV_COLUMNS: [&str; 12] = [
    "full_name",
    "title",
    "company",
    "location",
    "linkedin_url",
    "email",
    "investment_focus",
    "portfolio_companies",
    "personalized_message",
    "outreach_status",
    "date_added",
    "source_url",
];

/// 保存本次运行的记录，返回写入的文件路径
pub async fn save(context: &GeneratorContext, records: &[InvestorRecord]) -> Result<PathBuf> {
    let path = context.config.output_path.clone();
    match context.config.export_format {
        ExportFormat::Csv => CsvOutlet::new(path).save(records).await,
        ExportFormat::Json => JsonOutlet::new(path).save(records).await,
    }
}

pub trait Outlet {
    async fn save(&self, records: &[InvestorRecord]) -> Result<PathBuf>;
}

pub struct CsvOutlet {
    path: PathBuf,
}

impl CsvOutlet {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Outlet for CsvOutlet {
    async fn save(&self, records: &[InvestorRecord]) -> Result<PathBuf> {
        write_file(&self.path, &render_csv(records))?;
        info!(path = %self.path.display(), records = records.len(), "saved CSV export");
        Ok(self.path.clone())
    }
}

pub struct JsonOutlet {
    path: PathBuf,
}

impl JsonOutlet {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Outlet for JsonOutlet {
    async fn save(&self, records: &[InvestorRecord]) -> Result<PathBuf> {
        let content =
            serde_json::to_string_pretty(records).context("Failed to serialize records")?;
        write_file(&self.path, &content)?;
        info!(path = %self.path.display(), records = records.len(), "saved JSON export");
        Ok(self.path.clone())
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    // 确保父目录存在
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            fs::create_dir_all(parent_dir).with_context(|| {
                format!("Failed to create output directory: {}", parent_dir.display())
            })?;
        }
    }
    fs::write(path, content)
        .with_context(|| format!("Failed to write export file: {}", path.display()))
}

/// 渲染CSV文本：表头加每条记录一行
pub fn render_csv(records: &[InvestorRecord]) -> String {
    let mut output = String::new();
    push_row(&mut output, CSV_COLUMNS.iter().map(|column| column.to_string()));
    for record in records {
        push_row(&mut output, csv_fields(record).into_iter());
    }
    output
}

fn csv_fields(record: &InvestorRecord) -> Vec<String> {
    vec![
        record.full_name.clone(),
        record.title.clone(),
        record.company.clone(),
        record.location.clone(),
        record.linkedin_url.clone().unwrap_or_default(),
        record.email.clone().unwrap_or_default(),
        record.investment_focus.clone(),
        record.portfolio_companies.join(", "),
        record.personalized_message.clone().unwrap_or_default(),
        record.outreach_status.to_string(),
        record.date_added.format("%Y-%m-%d").to_string(),
        record.source_url.clone(),
    ]
}

fn push_row(output: &mut String, fields: impl Iterator<Item = String>) {
    let row = fields
        .map(|field| escape_field(&field))
        .collect::<Vec<_>>()
        .join(",");
    output.push_str(&row);
    output.push_str("\r\n");
}

/// RFC 4180：含逗号、引号或换行的字段用双引号包裹，内部引号加倍
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::test_support::{MockProvider, fast_config};
    use chrono::NaiveDate;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn record() -> InvestorRecord {
        let mut record = InvestorRecord::new(
            "Jane Doe",
            "Acme Capital",
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        );
        record.email = Some("jane@acme.vc".to_string());
        record.investment_focus = "SaaS, fintech".to_string();
        record.portfolio_companies = vec!["Tabby".to_string(), "Sarwa".to_string()];
        record.personalized_message = Some("Hi Jane, \"quick\" hello".to_string());
        record
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a, b"), "\"a, b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_render_csv() {
        let csv = render_csv(&[record()]);
        let lines: Vec<&str> = csv.split("\r\n").collect();

        assert_eq!(lines[0], CSV_COLUMNS.join(","));
        assert_eq!(
            lines[1],
            "Jane Doe,,Acme Capital,,,jane@acme.vc,\"SaaS, fintech\",\"Tabby, Sarwa\",\"Hi Jane, \"\"quick\"\" hello\",Not contacted,2025-03-01,"
        );
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_render_csv_header_only_when_empty() {
        assert_eq!(render_csv(&[]), format!("{}\r\n", CSV_COLUMNS.join(",")));
    }

    #[tokio::test]
    async fn test_save_csv_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = fast_config();
        config.output_path = temp_dir.path().join("out").join("investors.csv");
        let context = GeneratorContext::with_provider(config, Arc::new(MockProvider::failing()));

        let path = save(&context, &[record()]).await.unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("full_name,title,company"));
        assert!(content.contains("Acme Capital"));
    }

    #[tokio::test]
    async fn test_save_json() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = fast_config();
        config.output_path = temp_dir.path().join("investors.json");
        config.export_format = ExportFormat::Json;
        let context = GeneratorContext::with_provider(config, Arc::new(MockProvider::failing()));

        let path = save(&context, &[record()]).await.unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: Vec<InvestorRecord> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, vec![record()]);
    }
}
