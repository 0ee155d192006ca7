//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use thiserror::Error;

/// Uptime Vitals 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum VitalsError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 通知相关错误
    #[error("通知错误: {0}")]
    Notification(#[from] NotificationError),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

impl VitalsError {
    /// 是否为配置错误（配置错误会在任何探测开始前中止本次运行）
    pub fn is_config_error(&self) -> bool {
        matches!(self, VitalsError::Config(_))
    }
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },

    /// 未知的检测类型
    #[error("目标 {target} 的检测类型 {kind} 未知，支持的类型: http, ping, dns, tcp_port")]
    UnknownKind { target: String, kind: String },

    /// TCP端口检测缺少端口
    #[error("目标 {target} 为 tcp_port 检测，但未配置 port")]
    MissingPort { target: String },

    /// 目标名称重复
    #[error("目标名称重复: {name}")]
    DuplicateTarget { name: String },

    /// 告警模板错误
    #[error("告警模板无效: {0}")]
    TemplateError(String),
}

/// 通知错误类型
#[derive(Error, Debug)]
pub enum NotificationError {
    /// 发送失败
    #[error("通知发送失败: {0}")]
    SendError(String),

    /// 配置错误
    #[error("通知配置错误: {0}")]
    ConfigError(String),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, VitalsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages_name_the_target() {
        let err = ConfigError::MissingPort {
            target: "secure-site".to_string(),
        };
        assert!(err.to_string().contains("secure-site"));
        assert!(err.to_string().contains("port"));

        let err = ConfigError::UnknownKind {
            target: "odd".to_string(),
            kind: "smtp".to_string(),
        };
        assert!(err.to_string().contains("smtp"));
        assert!(err.to_string().contains("odd"));
    }

    #[test]
    fn test_is_config_error() {
        let err: VitalsError = ConfigError::DuplicateTarget {
            name: "dup".to_string(),
        }
        .into();
        assert!(err.is_config_error());

        let err: VitalsError = NotificationError::SendError("boom".to_string()).into();
        assert!(!err.is_config_error());
    }
}
