//! 探测执行器分发
//!
//! 按 [`CheckKind`] 把目标分发到固定的四种执行器，并处理重试。

use crate::config::{CheckKind, GlobalConfig, Target};
use crate::error::Result;
use crate::health::dns::DnsProbe;
use crate::health::http::HttpProbe;
use crate::health::ping::PingProbe;
use crate::health::result::CheckResult;
use crate::health::tcp::TcpProbe;
use crate::health::transport::{
    DnsResolver, HttpTransport, PingRunner, ReqwestTransport, SystemPing, SystemResolver,
    TcpConnector, TokioConnector,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// 探测执行器trait
///
/// 实现不得返回错误：所有失败都以 `success = false` 的 [`CheckResult`] 表达。
#[async_trait]
pub trait Probe: Send + Sync {
    /// 在给定超时内探测目标
    async fn probe(&self, target: &Target, timeout: Duration) -> CheckResult;
}

/// 超时详情
pub(crate) fn timeout_detail(timeout: Duration) -> String {
    format!("timeout after {}ms", timeout.as_millis())
}

/// 各类探测使用的网络传输
#[derive(Clone)]
pub struct Transports {
    pub http: Arc<dyn HttpTransport>,
    pub ping: Arc<dyn PingRunner>,
    pub dns: Arc<dyn DnsResolver>,
    pub tcp: Arc<dyn TcpConnector>,
}

impl Transports {
    /// 生产环境传输
    pub fn system() -> Result<Self> {
        Ok(Self {
            http: Arc::new(ReqwestTransport::new()?),
            ping: Arc::new(SystemPing),
            dns: Arc::new(SystemResolver),
            tcp: Arc::new(TokioConnector),
        })
    }

    pub fn with_http(mut self, http: Arc<dyn HttpTransport>) -> Self {
        self.http = http;
        self
    }

    pub fn with_ping(mut self, ping: Arc<dyn PingRunner>) -> Self {
        self.ping = ping;
        self
    }

    pub fn with_dns(mut self, dns: Arc<dyn DnsResolver>) -> Self {
        self.dns = dns;
        self
    }

    pub fn with_tcp(mut self, tcp: Arc<dyn TcpConnector>) -> Self {
        self.tcp = tcp;
        self
    }
}

/// 探测执行器，持有四种检测的实现
pub struct ProbeExecutor {
    http: HttpProbe,
    ping: PingProbe,
    dns: DnsProbe,
    tcp: TcpProbe,
    /// 重试次数
    retry_attempts: u32,
    /// 重试间隔
    retry_delay: Duration,
}

impl ProbeExecutor {
    /// 使用指定传输创建执行器（不重试）
    pub fn new(transports: Transports) -> Self {
        Self {
            http: HttpProbe::new(transports.http),
            ping: PingProbe::new(transports.ping),
            dns: DnsProbe::new(transports.dns),
            tcp: TcpProbe::new(transports.tcp),
            retry_attempts: 0,
            retry_delay: Duration::ZERO,
        }
    }

    /// 使用生产环境传输创建执行器
    pub fn system() -> Result<Self> {
        Ok(Self::new(Transports::system()?))
    }

    /// 按全局配置设置重试策略
    pub fn with_global_config(self, global: &GlobalConfig) -> Self {
        self.with_retry(
            global.retry_attempts,
            Duration::from_secs(global.retry_delay_seconds),
        )
    }

    /// 设置重试策略
    pub fn with_retry(mut self, retry_attempts: u32, retry_delay: Duration) -> Self {
        self.retry_attempts = retry_attempts;
        self.retry_delay = retry_delay;
        self
    }

    fn executor_for(&self, kind: CheckKind) -> &dyn Probe {
        match kind {
            CheckKind::Http => &self.http,
            CheckKind::Ping => &self.ping,
            CheckKind::Dns => &self.dns,
            CheckKind::TcpPort => &self.tcp,
        }
    }

    /// 使用目标自身的超时时间探测
    pub async fn probe(&self, target: &Target) -> CheckResult {
        self.probe_with_timeout(target, target.timeout).await
    }

    /// 带超时和重试的探测
    ///
    /// 首次成功即返回；全部失败时返回最后一次的结果。
    pub async fn probe_with_timeout(&self, target: &Target, timeout: Duration) -> CheckResult {
        let executor = self.executor_for(target.kind);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = executor.probe(target, timeout).await;

            if result.success || attempt > self.retry_attempts {
                return result.with_attempts(attempt);
            }

            debug!(
                target = %target.name,
                attempt,
                detail = %result.detail,
                "探测失败，等待重试"
            );
            tokio::time::sleep(self.retry_delay).await;
        }
    }
}
