//! 配置数据结构定义
//!
//! 定义配置文件的原始结构体和全局配置验证逻辑。目标列表的逐项验证由
//! [`TargetRegistry`](crate::config::TargetRegistry) 负责。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 主配置结构，包含全局配置、告警配置和目标列表
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 全局配置项
    #[serde(default)]
    pub global: GlobalConfig,
    /// 告警投递配置
    #[serde(default)]
    pub alerts: AlertConfig,
    /// 检测目标列表
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

/// 全局配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 日志文件路径（可选）
    pub log_file: Option<String>,
    /// 是否输出JSON格式日志
    #[serde(default)]
    pub json_logs: bool,
    /// 最大并发检测数
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_checks: usize,
    /// 失败重试次数
    #[serde(default)]
    pub retry_attempts: u32,
    /// 重试间隔（秒）
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: u64,
    /// 默认超时时间（秒），未配置时按检测类型取默认值
    pub default_timeout_seconds: Option<f64>,
    /// 全局请求头（仅HTTP检测）
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: None,
            json_logs: false,
            max_concurrent_checks: default_max_concurrent(),
            retry_attempts: 0,
            retry_delay_seconds: default_retry_delay(),
            default_timeout_seconds: None,
            headers: HashMap::new(),
        }
    }
}

/// 告警投递配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertConfig {
    /// Slack incoming webhook URL
    pub slack_webhook_url: Option<String>,
    /// 自定义告警消息模板（Handlebars语法）
    pub message_template: Option<String>,
    /// 投递超时时间（秒）
    #[serde(default = "default_alert_timeout")]
    pub timeout_seconds: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            slack_webhook_url: None,
            message_template: None,
            timeout_seconds: default_alert_timeout(),
        }
    }
}

/// 单个检测目标的原始配置
///
/// `kind` 保持为字符串，由注册表转换为 [`CheckKind`](crate::config::CheckKind)，
/// 以便未知类型能报告出具体的目标名称。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetConfig {
    /// 目标名称（缺省为 "<kind> <address>"）
    pub name: Option<String>,
    /// 检测类型
    pub kind: String,
    /// URL或主机名
    pub address: String,
    /// 端口（tcp_port 必填）
    pub port: Option<u16>,
    /// 超时时间（秒）
    pub timeout_seconds: Option<f64>,
    /// HTTP方法
    pub method: Option<String>,
    /// 期望的状态码列表（缺省为 200-299）
    pub expected_status_codes: Option<Vec<u16>>,
    /// 目标特定的请求头
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// 请求体（用于POST/PUT请求）
    pub body: Option<serde_json::Value>,
    /// ping 发送的回显请求数
    pub count: Option<u32>,
    /// 是否启用
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// 目标描述
    pub description: Option<String>,
}

// 默认值函数
fn default_log_level() -> String {
    "info".to_string()
}
fn default_max_concurrent() -> usize {
    50
}
fn default_retry_delay() -> u64 {
    1
}
fn default_alert_timeout() -> u64 {
    5
}
fn default_enabled() -> bool {
    true
}

/// 超时时间上限（秒）
pub const MAX_TIMEOUT_SECONDS: f64 = 3600.0;

/// 全局配置验证函数
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &Config) -> Result<(), String> {
    if config.global.max_concurrent_checks == 0 {
        return Err("最大并发检测数不能为0".to_string());
    }

    let valid_log_levels = ["debug", "info", "warn", "error"];
    if !valid_log_levels.contains(&config.global.log_level.as_str()) {
        return Err(format!(
            "无效的日志级别: {}，支持的级别: {:?}",
            config.global.log_level, valid_log_levels
        ));
    }

    if let Some(timeout) = config.global.default_timeout_seconds {
        if !timeout.is_finite() || timeout <= 0.0 || timeout > MAX_TIMEOUT_SECONDS {
            return Err(format!(
                "默认超时时间无效: {timeout}，有效范围 (0, {MAX_TIMEOUT_SECONDS}]"
            ));
        }
    }

    if let Some(ref url) = config.alerts.slack_webhook_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err("Slack webhook URL格式无效".to_string());
        }
    }

    if config.alerts.timeout_seconds == 0 {
        return Err("告警投递超时时间不能为0".to_string());
    }

    Ok(())
}
