//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Uptime Vitals - 基于配置的健康检测工具
#[derive(Parser, Debug, Clone)]
#[command(
    name = "uptime-vitals",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 配置文件路径
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径",
        env = "UPTIME_VITALS_CONFIG",
        global = true
    )]
    pub config: Option<PathBuf>,

    /// 日志级别（覆盖配置文件中的 log_level）
    #[arg(
        short,
        long,
        value_enum,
        help = "日志级别",
        env = "UPTIME_VITALS_LOG_LEVEL",
        global = true
    )]
    pub log_level: Option<LogLevel>,

    /// 日志文件（覆盖配置文件中的 log_file）
    #[arg(long, value_name = "FILE", help = "日志文件路径", global = true)]
    pub log_file: Option<PathBuf>,

    /// JSON格式日志
    #[arg(long, help = "以JSON格式输出日志", global = true)]
    pub json_logs: bool,

    /// 是否启用详细输出
    #[arg(short, long, help = "启用详细输出", global = true)]
    pub verbose: bool,

    /// 子命令
    #[command(subcommand)]
    pub command: Commands,
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum LogLevel {
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

/// 子命令定义
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// 执行一次检测
    Check {
        /// 目标名称（可选，不指定则检测全部启用的目标）
        #[arg(value_name = "TARGET", help = "目标名称")]
        target: Option<String>,

        /// 输出格式
        #[arg(short, long, value_enum, default_value = "text", help = "输出格式")]
        format: OutputFormat,

        /// 不投递告警
        #[arg(long, help = "只检测，不发送告警")]
        no_alert: bool,
    },

    /// 验证配置文件
    Validate,

    /// 初始化配置文件
    Init {
        /// 配置文件路径
        #[arg(
            value_name = "FILE",
            help = "配置文件路径",
            default_value = "config.toml"
        )]
        config_path: PathBuf,

        /// 是否覆盖现有文件
        #[arg(short, long, help = "覆盖现有文件")]
        force: bool,

        /// 配置模板类型
        #[arg(
            short,
            long,
            value_enum,
            default_value = "minimal",
            help = "配置模板类型"
        )]
        template: ConfigTemplate,
    },

    /// 显示版本信息
    Version {
        /// 输出格式
        #[arg(short, long, value_enum, default_value = "text", help = "输出格式")]
        format: OutputFormat,
    },

    /// 发送测试告警
    TestNotification {
        /// 测试消息内容
        #[arg(
            short,
            long,
            default_value = "uptime-vitals 测试消息",
            help = "测试消息内容"
        )]
        message: String,
    },
}

/// 输出格式枚举
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum OutputFormat {
    /// 文本格式
    Text,
    /// JSON格式
    Json,
    /// 表格格式
    Table,
}

/// 配置模板类型
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum ConfigTemplate {
    /// 最小模板
    Minimal,
    /// 完整模板
    Full,
}

impl Args {
    /// 获取配置文件路径
    pub fn get_config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::get_default_config_path)
    }

    /// 是否启用详细输出
    pub fn is_verbose(&self) -> bool {
        self.verbose || matches!(self.log_level, Some(LogLevel::Debug))
    }
}
