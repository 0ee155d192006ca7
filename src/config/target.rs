//! 检测目标定义
//!
//! `Target` 是注册表加载后的不可变目标描述，`CheckKind` 是封闭的检测类型集合。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// 检测类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// HTTP/HTTPS 请求
    Http,
    /// ICMP ping
    Ping,
    /// DNS 解析
    Dns,
    /// TCP 端口连接
    TcpPort,
}

impl CheckKind {
    /// 配置和日志中使用的名称
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Http => "http",
            CheckKind::Ping => "ping",
            CheckKind::Dns => "dns",
            CheckKind::TcpPort => "tcp_port",
        }
    }

    /// 未配置超时时的默认超时时间
    pub fn default_timeout(&self) -> Duration {
        match self {
            CheckKind::Http => Duration::from_secs(5),
            CheckKind::Ping => Duration::from_secs(2),
            CheckKind::Dns => Duration::from_secs(2),
            CheckKind::TcpPort => Duration::from_secs(3),
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" | "https" => Ok(CheckKind::Http),
            "ping" | "icmp" => Ok(CheckKind::Ping),
            "dns" => Ok(CheckKind::Dns),
            "tcp_port" | "tcp" => Ok(CheckKind::TcpPort),
            other => Err(other.to_string()),
        }
    }
}

/// 默认的可接受HTTP状态码：200-299
pub fn default_expected_status_codes() -> Vec<u16> {
    (200..=299).collect()
}

/// 默认的 ping 回显请求数
pub const DEFAULT_PING_COUNT: u32 = 3;

/// 单个检测目标
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Target {
    /// 目标名称，在注册表内唯一
    pub name: String,
    /// 检测类型
    pub kind: CheckKind,
    /// URL或主机名
    pub address: String,
    /// 端口
    pub port: Option<u16>,
    /// 超时时间
    #[serde(serialize_with = "serialize_duration_ms")]
    pub timeout: Duration,
    /// HTTP方法
    pub method: String,
    /// 可接受的HTTP状态码
    pub expected_status_codes: Vec<u16>,
    /// 合并后的请求头
    pub headers: HashMap<String, String>,
    /// 请求体
    pub body: Option<serde_json::Value>,
    /// ping 回显请求数
    pub count: u32,
    /// 描述
    pub description: Option<String>,
}

impl Target {
    /// 创建带默认值的目标
    pub fn new(name: impl Into<String>, kind: CheckKind, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            address: address.into(),
            port: None,
            timeout: kind.default_timeout(),
            method: "GET".to_string(),
            expected_status_codes: default_expected_status_codes(),
            headers: HashMap::new(),
            body: None,
            count: DEFAULT_PING_COUNT,
            description: None,
        }
    }

    /// 设置端口
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// 设置超时时间
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 设置可接受的状态码
    pub fn with_expected_status_codes(mut self, codes: Vec<u16>) -> Self {
        self.expected_status_codes = codes;
        self
    }

    /// 设置HTTP方法
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// 设置 ping 回显请求数
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// 状态码是否可接受
    pub fn accepts_status(&self, status_code: u16) -> bool {
        self.expected_status_codes.contains(&status_code)
    }

    /// 用于日志展示的地址（含端口）
    pub fn endpoint(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.address, port),
            None => self.address.clone(),
        }
    }
}

fn serialize_duration_ms<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}
