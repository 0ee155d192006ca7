//! 告警判定
//!
//! 根据一次运行的汇总决定是否需要告警，并生成告警内容。本模块不做任何网络IO。

use crate::error::ConfigError;
use crate::health::{CheckResult, RunSummary};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;
use tracing::warn;
use uuid::Uuid;

const TEMPLATE_NAME: &str = "alert";

/// 告警内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPayload {
    /// 告警正文
    pub summary_text: String,
    /// 失败的目标名称集合
    pub failed_targets: BTreeSet<String>,
    /// 失败数量
    pub failed_count: usize,
    /// 总数量
    pub total_count: usize,
    /// 运行ID
    pub run_id: Uuid,
}

/// 告警判定器
///
/// 无状态：相同的汇总总是得到相同的结果。
#[derive(Default)]
pub struct AlertDispatcher {
    /// 自定义模板，未配置时使用内置文本
    templates: Option<Handlebars<'static>>,
}

impl AlertDispatcher {
    /// 创建告警判定器
    ///
    /// # 参数
    /// * `message_template` - 可选的 Handlebars 模板
    ///
    /// # 返回
    /// * 模板语法错误时返回 `ConfigError::TemplateError`
    pub fn new(message_template: Option<&str>) -> Result<Self, ConfigError> {
        let templates = match message_template {
            Some(template) => {
                let mut registry = Handlebars::new();
                registry.register_escape_fn(handlebars::no_escape);
                registry
                    .register_template_string(TEMPLATE_NAME, template)
                    .map_err(|e| ConfigError::TemplateError(e.to_string()))?;
                Some(registry)
            }
            None => None,
        };

        Ok(Self { templates })
    }

    /// 判定一次运行是否需要告警
    ///
    /// 没有失败时返回 None。
    pub fn evaluate(&self, summary: &RunSummary) -> Option<AlertPayload> {
        if summary.failed_count == 0 {
            return None;
        }

        let failed_targets: BTreeSet<String> = summary
            .failed_results()
            .map(|r| r.target_name.clone())
            .collect();

        Some(AlertPayload {
            summary_text: self.render(summary, &failed_targets),
            failed_targets,
            failed_count: summary.failed_count,
            total_count: summary.total_count,
            run_id: summary.run_id,
        })
    }

    fn render(&self, summary: &RunSummary, failed_targets: &BTreeSet<String>) -> String {
        let Some(registry) = &self.templates else {
            return Self::default_text(summary);
        };

        let failures: Vec<_> = summary
            .failed_results()
            .map(|r| {
                json!({
                    "name": r.target_name,
                    "kind": r.kind.as_str(),
                    "address": r.address,
                    "detail": r.detail,
                    "latency_ms": r.latency_ms(),
                })
            })
            .collect();
        let data = json!({
            "failed_count": summary.failed_count,
            "total_count": summary.total_count,
            "run_id": summary.run_id.to_string(),
            "failed_targets": failed_targets,
            "failures": failures,
        });

        match registry.render(TEMPLATE_NAME, &data) {
            Ok(text) => text,
            Err(e) => {
                warn!("告警模板渲染失败，使用默认格式: {}", e);
                Self::default_text(summary)
            }
        }
    }

    /// 内置告警文本
    fn default_text(summary: &RunSummary) -> String {
        let mut text = format!(
            "{}/{} checks failed:",
            summary.failed_count, summary.total_count
        );
        for result in summary.failed_results() {
            text.push('\n');
            text.push_str(&Self::failure_line(result));
        }
        text
    }

    fn failure_line(result: &CheckResult) -> String {
        format!("- {} [{}] {}", result.target_name, result.kind, result.detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CheckKind, Target};
    use crate::health::aggregate;
    use chrono::Utc;
    use std::time::Duration;

    fn summary(outcomes: &[(&str, CheckKind, bool, &str)]) -> RunSummary {
        let results = outcomes
            .iter()
            .map(|(name, kind, success, detail)| {
                let target = Target::new(*name, *kind, "example.com");
                if *success {
                    CheckResult::success(&target, Duration::from_millis(10), *detail)
                } else {
                    CheckResult::failure(&target, Duration::from_millis(10), *detail)
                }
            })
            .collect();
        let now = Utc::now();
        aggregate(results, now, now)
    }

    #[test]
    fn test_no_alert_when_all_pass() {
        let dispatcher = AlertDispatcher::default();
        let s = summary(&[
            ("a", CheckKind::Http, true, "200"),
            ("b", CheckKind::Dns, true, "1.2.3.4"),
        ]);
        assert!(dispatcher.evaluate(&s).is_none());
        assert!(dispatcher.evaluate(&summary(&[])).is_none());
    }

    #[test]
    fn test_alert_names_exactly_failing_targets() {
        let dispatcher = AlertDispatcher::default();
        let s = summary(&[
            ("up", CheckKind::Http, true, "200"),
            ("bad-host", CheckKind::Dns, false, "NXDOMAIN: nonexistent.invalid"),
            ("db", CheckKind::TcpPort, false, "connection refused"),
        ]);

        let payload = dispatcher.evaluate(&s).unwrap();

        let expected: BTreeSet<String> = ["bad-host", "db"].iter().map(|s| s.to_string()).collect();
        assert_eq!(payload.failed_targets, expected);
        assert_eq!(payload.failed_count, 2);
        assert_eq!(payload.total_count, 3);
        assert_eq!(payload.run_id, s.run_id);
        assert_eq!(
            payload.summary_text,
            "2/3 checks failed:\n- bad-host [dns] NXDOMAIN: nonexistent.invalid\n- db [tcp_port] connection refused"
        );
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let dispatcher = AlertDispatcher::default();
        let s = summary(&[("x", CheckKind::Ping, false, "100% packet loss")]);
        assert_eq!(dispatcher.evaluate(&s), dispatcher.evaluate(&s));
    }

    #[test]
    fn test_custom_template() {
        let dispatcher = AlertDispatcher::new(Some(
            "ALERT {{failed_count}} of {{total_count}}{{#each failures}} | {{name}}={{detail}}{{/each}}",
        ))
        .unwrap();
        let s = summary(&[
            ("ok", CheckKind::Http, true, "200"),
            ("api", CheckKind::Http, false, "bad status: HTTP 503 Service Unavailable"),
        ]);

        let payload = dispatcher.evaluate(&s).unwrap();
        assert_eq!(
            payload.summary_text,
            "ALERT 1 of 2 | api=bad status: HTTP 503 Service Unavailable"
        );
    }

    #[test]
    fn test_invalid_template_is_config_error() {
        let err = AlertDispatcher::new(Some("{{#each failures}} unclosed")).err().unwrap();
        assert!(matches!(err, ConfigError::TemplateError(_)));
    }
}
