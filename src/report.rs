//! 结果报告
//!
//! 把探测结果和运行汇总转换为结构化日志记录，并提供终端输出格式。

use crate::health::{CheckResult, RunSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::fmt::Write as _;

/// 日志记录级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for RecordLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordLevel::Info => "INFO",
            RecordLevel::Warn => "WARN",
            RecordLevel::Error => "ERROR",
        };
        write!(f, "{s}")
    }
}

/// 结构化日志记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// 时间戳（取自输入数据）
    pub timestamp: DateTime<Utc>,
    /// 级别
    pub level: RecordLevel,
    /// 产生记录的组件
    pub component: String,
    /// 消息
    pub message: String,
    /// 附加字段
    pub fields: Map<String, Value>,
}

/// 报告生成器
///
/// 同一输入总是得到同一记录。
pub struct Reporter;

impl Reporter {
    /// 单个探测结果的日志记录
    pub fn format_result(result: &CheckResult) -> LogRecord {
        let (level, message) = if result.success {
            (
                RecordLevel::Info,
                format!("{} [{}] 检测成功: {}", result.target_name, result.kind, result.detail),
            )
        } else {
            (
                RecordLevel::Error,
                format!("{} [{}] 检测失败: {}", result.target_name, result.kind, result.detail),
            )
        };

        let mut fields = Map::new();
        fields.insert("target".to_string(), json!(result.target_name));
        fields.insert("kind".to_string(), json!(result.kind.as_str()));
        fields.insert("address".to_string(), json!(result.address));
        if let Some(port) = result.port {
            fields.insert("port".to_string(), json!(port));
        }
        fields.insert("success".to_string(), json!(result.success));
        fields.insert("latency_ms".to_string(), json!(result.latency_ms()));
        fields.insert("detail".to_string(), json!(result.detail));
        if let Some(status_code) = result.status_code {
            fields.insert("status_code".to_string(), json!(status_code));
        }
        fields.insert("attempts".to_string(), json!(result.attempts));

        LogRecord {
            timestamp: result.timestamp,
            level,
            component: format!("probe.{}", result.kind.as_str()),
            message,
            fields,
        }
    }

    /// 运行汇总的日志记录
    pub fn format_summary(summary: &RunSummary) -> LogRecord {
        let level = if summary.all_passed() {
            RecordLevel::Info
        } else {
            RecordLevel::Warn
        };
        let message = format!(
            "检测完成: {} 个目标, {} 个成功, {} 个失败",
            summary.total_count,
            summary.passed_count(),
            summary.failed_count
        );

        let failed: Vec<&str> = summary
            .failed_results()
            .map(|r| r.target_name.as_str())
            .collect();

        let mut fields = Map::new();
        fields.insert("run_id".to_string(), json!(summary.run_id.to_string()));
        fields.insert("total".to_string(), json!(summary.total_count));
        fields.insert("passed".to_string(), json!(summary.passed_count()));
        fields.insert("failed".to_string(), json!(summary.failed_count));
        fields.insert("failed_targets".to_string(), json!(failed));
        fields.insert(
            "duration_ms".to_string(),
            json!(summary.duration().as_millis() as u64),
        );
        if let Some(avg) = summary.average_latency_ms() {
            fields.insert("avg_latency_ms".to_string(), json!(avg));
        }

        LogRecord {
            timestamp: summary.finished_at,
            level,
            component: "run".to_string(),
            message,
            fields,
        }
    }
}

/// 文本格式结果，每个目标一行
pub fn render_text(summary: &RunSummary) -> String {
    let mut out = String::new();
    for result in &summary.results {
        let icon = if result.success { "✓" } else { "✗" };
        let _ = writeln!(
            out,
            "{} {} [{}] {}ms - {}",
            icon,
            result.target_name,
            result.kind,
            result.latency_ms(),
            result.detail
        );
    }
    let _ = write!(
        out,
        "{}/{} 通过",
        summary.passed_count(),
        summary.total_count
    );
    out
}

/// 表格格式结果
pub fn render_table(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<24} {:<10} {:<8} {:<10} {}",
        "目标", "类型", "状态", "耗时", "详情"
    );
    let _ = writeln!(out, "{}", "-".repeat(80));

    for result in &summary.results {
        let status = if result.success { "正常" } else { "异常" };
        let _ = writeln!(
            out,
            "{:<24} {:<10} {:<8} {:<10} {}",
            result.target_name,
            result.kind.as_str(),
            status,
            format!("{}ms", result.latency_ms()),
            result.detail
        );
    }

    let _ = writeln!(out, "{}", "-".repeat(80));
    let _ = write!(
        out,
        "总计 {} 个, 失败 {} 个, 耗时 {}ms",
        summary.total_count,
        summary.failed_count,
        summary.duration().as_millis()
    );
    out
}
