//! 网络传输抽象
//!
//! 每种探测通过一个 trait 访问网络，生产环境使用 reqwest、系统 ping、
//! 系统解析器和 tokio TCP 实现，测试中可以替换为假实现。

use crate::config::Target;
use crate::error::VitalsError;
use async_trait::async_trait;
use reqwest::{Client, Method};
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::process::Command;

/// HTTP传输错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpTransportError {
    /// 请求超时
    #[error("timeout")]
    Timeout,
    /// 连接失败（拒绝、不可达、DNS失败、TLS失败等）
    #[error("connection error: {0}")]
    Connect(String),
    /// 请求无法构建
    #[error("request error: {0}")]
    InvalidRequest(String),
    /// 其他错误
    #[error("request failed: {0}")]
    Other(String),
}

/// HTTP传输trait
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// 发送请求并返回响应状态码
    ///
    /// # 参数
    /// * `target` - 检测目标（方法、地址、请求头、请求体）
    /// * `timeout` - 超时时间
    async fn execute(&self, target: &Target, timeout: Duration) -> Result<u16, HttpTransportError>;
}

/// 基于 reqwest 的HTTP传输
pub struct ReqwestTransport {
    /// HTTP客户端
    client: Client,
}

impl ReqwestTransport {
    /// 创建新的HTTP传输
    pub fn new() -> crate::error::Result<Self> {
        let client = Client::builder()
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .build()
            .map_err(|e| VitalsError::Other(anyhow::anyhow!("创建HTTP客户端失败: {e}")))?;

        Ok(Self { client })
    }

    /// 把 reqwest 错误归类为传输错误
    fn classify_error(error: &reqwest::Error) -> HttpTransportError {
        if error.is_timeout() {
            HttpTransportError::Timeout
        } else if error.is_connect() {
            HttpTransportError::Connect(Self::root_cause(error))
        } else if error.is_builder() || error.is_request() {
            HttpTransportError::InvalidRequest(Self::root_cause(error))
        } else {
            let error_str = error.to_string();
            if error_str.contains("dns") || error_str.contains("DNS") {
                HttpTransportError::Connect("DNS resolution failed".to_string())
            } else if error_str.contains("certificate")
                || error_str.contains("tls")
                || error_str.contains("ssl")
            {
                HttpTransportError::Connect("SSL/TLS certificate error".to_string())
            } else {
                HttpTransportError::Other(error_str)
            }
        }
    }

    /// 取最底层的错误描述，reqwest 的顶层信息通常只包含URL
    fn root_cause(error: &reqwest::Error) -> String {
        let mut source: &dyn std::error::Error = error;
        while let Some(next) = source.source() {
            source = next;
        }
        source.to_string()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, target: &Target, timeout: Duration) -> Result<u16, HttpTransportError> {
        let method = Method::from_str(&target.method.to_uppercase()).map_err(|_| {
            HttpTransportError::InvalidRequest(format!("invalid HTTP method {}", target.method))
        })?;

        let mut request = self
            .client
            .request(method, &target.address)
            .timeout(timeout);

        for (key, value) in &target.headers {
            request = request.header(key, value);
        }

        if let Some(body) = &target.body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Self::classify_error(&e))?;

        Ok(response.status().as_u16())
    }
}

/// ping 命令输出
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PingOutput {
    /// 进程是否以成功状态退出
    pub success: bool,
    /// 标准输出
    pub stdout: String,
    /// 标准错误
    pub stderr: String,
}

/// ping 执行trait
#[async_trait]
pub trait PingRunner: Send + Sync {
    /// 向主机发送 `count` 个回显请求，每个请求等待 `timeout`
    async fn ping(&self, host: &str, count: u32, timeout: Duration) -> std::io::Result<PingOutput>;
}

/// 调用系统 ping 工具
#[derive(Debug, Clone, Default)]
pub struct SystemPing;

impl SystemPing {
    /// 按平台构建 ping 参数
    pub fn args(host: &str, count: u32, timeout: Duration) -> Vec<String> {
        let millis = timeout.as_millis().max(1);
        if cfg!(target_os = "windows") {
            vec![
                "-n".to_string(),
                count.to_string(),
                "-w".to_string(),
                millis.to_string(),
                host.to_string(),
            ]
        } else if cfg!(target_os = "macos") {
            // macOS 的 -W 以毫秒为单位
            vec![
                "-c".to_string(),
                count.to_string(),
                "-W".to_string(),
                millis.to_string(),
                host.to_string(),
            ]
        } else {
            let secs = timeout.as_secs_f64().ceil().max(1.0) as u64;
            vec![
                "-c".to_string(),
                count.to_string(),
                "-W".to_string(),
                secs.to_string(),
                host.to_string(),
            ]
        }
    }
}

#[async_trait]
impl PingRunner for SystemPing {
    async fn ping(&self, host: &str, count: u32, timeout: Duration) -> std::io::Result<PingOutput> {
        let output = Command::new("ping")
            .args(Self::args(host, count, timeout))
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(PingOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// DNS解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// 域名不存在
    #[error("NXDOMAIN: {0}")]
    NxDomain(String),
    /// 服务器失败或临时失败
    #[error("SERVFAIL: {0}")]
    ServFail(String),
    /// 解析超时
    #[error("timeout")]
    Timeout,
    /// 其他解析错误
    #[error("resolver error: {0}")]
    Other(String),
}

impl ResolveError {
    /// 根据系统解析器返回的IO错误归类
    pub fn from_io(error: &std::io::Error) -> Self {
        let message = error.to_string();
        let lower = message.to_lowercase();

        if error.kind() == std::io::ErrorKind::TimedOut {
            ResolveError::Timeout
        } else if lower.contains("not known")
            || lower.contains("no such host")
            || lower.contains("nodename nor servname")
            || lower.contains("no address associated")
            || lower.contains("not found")
        {
            ResolveError::NxDomain(message)
        } else if lower.contains("temporary failure")
            || lower.contains("try again")
            || lower.contains("non-recoverable")
            || lower.contains("server failure")
        {
            ResolveError::ServFail(message)
        } else {
            ResolveError::Other(message)
        }
    }
}

/// DNS解析trait
#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// 解析主机名为IP地址列表
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError>;
}

/// 系统解析器（getaddrinfo）
#[derive(Debug, Clone, Default)]
pub struct SystemResolver;

#[async_trait]
impl DnsResolver for SystemResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        let addrs = tokio::net::lookup_host((host, 0))
            .await
            .map_err(|e| ResolveError::from_io(&e))?;

        let mut ips: Vec<IpAddr> = Vec::new();
        for addr in addrs {
            if !ips.contains(&addr.ip()) {
                ips.push(addr.ip());
            }
        }
        Ok(ips)
    }
}

/// TCP连接trait
#[async_trait]
pub trait TcpConnector: Send + Sync {
    /// 建立到 `host:port` 的连接，成功后立即关闭
    async fn connect(&self, host: &str, port: u16) -> std::io::Result<()>;
}

/// 基于 tokio 的TCP连接器
#[derive(Debug, Clone, Default)]
pub struct TokioConnector;

#[async_trait]
impl TcpConnector for TokioConnector {
    async fn connect(&self, host: &str, port: u16) -> std::io::Result<()> {
        TcpStream::connect((host, port)).await.map(drop)
    }
}
