//! 日志系统模块
//!
//! 基于 tracing-subscriber 的控制台和文件日志，以及结构化报告记录的输出

use crate::config::GlobalConfig;
use crate::report::{LogRecord, RecordLevel};
use log::LevelFilter;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::filter::{Directive, LevelFilter as TracingLevel};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter, Layer, Registry};

/// 带过滤器的日志层
type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// 全局初始化结果，只初始化一次
static GLOBAL_LOGGING_STATE: OnceLock<Result<LogConfig, String>> = OnceLock::new();

/// 日志配置结构
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    /// 日志级别
    pub level: LevelFilter,
    /// 日志文件路径（可选，追加写入）
    pub file_path: Option<PathBuf>,
    /// 是否输出到控制台（标准错误）
    pub console: bool,
    /// 是否使用JSON格式
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            file_path: None,
            console: true,
            json_format: false,
        }
    }
}

impl LogConfig {
    /// 由全局配置构建
    pub fn from_global(global: &GlobalConfig) -> Self {
        Self {
            level: parse_level(&global.log_level).unwrap_or(LevelFilter::Info),
            file_path: global.log_file.as_ref().map(PathBuf::from),
            console: true,
            json_format: global.json_logs,
        }
    }

    /// 覆盖日志级别
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// 覆盖日志文件
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }
}

/// 解析日志级别字符串
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// 日志系统管理器
pub struct LoggingSystem;

impl LoggingSystem {
    /// 初始化日志系统
    ///
    /// 进程内只会真正初始化一次，之后的调用返回首次初始化的结果。
    ///
    /// # 参数
    /// * `config` - 日志配置
    pub fn setup_logging(config: LogConfig) -> anyhow::Result<()> {
        let state = GLOBAL_LOGGING_STATE.get_or_init(|| {
            Self::perform_initialization(&config)
                .map(|()| config.clone())
                .map_err(|e| e.to_string())
        });

        match state {
            Ok(_) => Ok(()),
            Err(e) => Err(anyhow::anyhow!("日志系统初始化失败: {}", e)),
        }
    }

    /// 是否已初始化
    pub fn is_initialized() -> bool {
        matches!(GLOBAL_LOGGING_STATE.get(), Some(Ok(_)))
    }

    fn perform_initialization(config: &LogConfig) -> anyhow::Result<()> {
        let layers = Self::build_layers(config)?;

        match registry().with(layers).try_init() {
            Ok(()) => {
                tracing::debug!("日志系统初始化完成: {:?}", config);
                Ok(())
            }
            Err(e) => {
                let error_msg = e.to_string();
                if error_msg.contains("already been set")
                    || error_msg.contains("already initialized")
                {
                    // 其他组件已经设置了全局subscriber
                    Ok(())
                } else {
                    Err(anyhow::anyhow!("tracing subscriber初始化失败: {}", error_msg))
                }
            }
        }
    }

    /// 根据配置构建控制台和文件日志层
    pub(crate) fn build_layers(config: &LogConfig) -> anyhow::Result<Vec<BoxedLayer>> {
        let mut layers: Vec<BoxedLayer> = Vec::new();

        if config.console {
            let layer = if config.json_format {
                fmt::layer()
                    .json()
                    .with_timer(fmt::time::ChronoUtc::rfc_3339())
                    .with_writer(std::io::stderr)
                    .with_filter(Self::build_filter(config.level))
                    .boxed()
            } else {
                fmt::layer()
                    .with_timer(fmt::time::ChronoUtc::rfc_3339())
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_filter(Self::build_filter(config.level))
                    .boxed()
            };
            layers.push(layer);
        }

        if let Some(file_path) = &config.file_path {
            let file = Self::open_log_file(file_path)?;
            let layer = if config.json_format {
                fmt::layer()
                    .json()
                    .with_timer(fmt::time::ChronoUtc::rfc_3339())
                    .with_writer(Mutex::new(file))
                    .with_filter(Self::build_filter(config.level))
                    .boxed()
            } else {
                fmt::layer()
                    .with_timer(fmt::time::ChronoUtc::rfc_3339())
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false)
                    .with_filter(Self::build_filter(config.level))
                    .boxed()
            };
            layers.push(layer);
        }

        Ok(layers)
    }

    /// 以追加模式打开日志文件，必要时创建父目录
    fn open_log_file(path: &Path) -> anyhow::Result<std::fs::File> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| anyhow::anyhow!("创建日志目录失败 {}: {}", parent.display(), e))?;
            }
        }

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| anyhow::anyhow!("打开日志文件失败 {}: {}", path.display(), e))
    }

    /// 配置级别作为基础，RUST_LOG 中的模块指令进一步细化
    fn build_filter(level: LevelFilter) -> EnvFilter {
        EnvFilter::from_default_env().add_directive(Self::convert_level_to_directive(level))
    }

    /// 将 log::LevelFilter 转换为 tracing 的指令
    fn convert_level_to_directive(level: LevelFilter) -> Directive {
        let level = match level {
            LevelFilter::Off => TracingLevel::OFF,
            LevelFilter::Error => TracingLevel::ERROR,
            LevelFilter::Warn => TracingLevel::WARN,
            LevelFilter::Info => TracingLevel::INFO,
            LevelFilter::Debug => TracingLevel::DEBUG,
            LevelFilter::Trace => TracingLevel::TRACE,
        };
        Directive::from(level)
    }
}

/// 把报告记录按其级别输出到 tracing
pub fn emit_record(record: &LogRecord) {
    let fields = serde_json::Value::Object(record.fields.clone()).to_string();
    let timestamp = record.timestamp.to_rfc3339();

    match record.level {
        RecordLevel::Info => tracing::info!(
            component = %record.component,
            recorded_at = %timestamp,
            fields = %fields,
            "{}",
            record.message
        ),
        RecordLevel::Warn => tracing::warn!(
            component = %record.component,
            recorded_at = %timestamp,
            fields = %fields,
            "{}",
            record.message
        ),
        RecordLevel::Error => tracing::error!(
            component = %record.component,
            recorded_at = %timestamp,
            fields = %fields,
            "{}",
            record.message
        ),
    }
}
