//! DNS探测执行器

use crate::config::Target;
use crate::health::executor::{timeout_detail, Probe};
use crate::health::result::CheckResult;
use crate::health::transport::{DnsResolver, ResolveError};
use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// DNS探测执行器
///
/// 在超时时间内解析出至少一个地址即为成功。
pub struct DnsProbe {
    resolver: Arc<dyn DnsResolver>,
}

impl DnsProbe {
    pub fn new(resolver: Arc<dyn DnsResolver>) -> Self {
        Self { resolver }
    }

    /// 从地址中取出要解析的主机名
    ///
    /// 支持裸主机名、`host:port` 以及URL。
    pub fn lookup_name(address: &str) -> String {
        let address = address.trim();

        if address.contains("://") {
            if let Some(host) = reqwest::Url::parse(address)
                .ok()
                .and_then(|url| url.host_str().map(str::to_string))
            {
                return host.trim_matches(|c| c == '[' || c == ']').to_string();
            }
        }

        if address.parse::<IpAddr>().is_ok() {
            return address.to_string();
        }

        match address.rsplit_once(':') {
            Some((host, port)) if !host.contains(':') && port.parse::<u16>().is_ok() => {
                host.to_string()
            }
            _ => address.to_string(),
        }
    }
}

#[async_trait]
impl Probe for DnsProbe {
    async fn probe(&self, target: &Target, timeout_duration: Duration) -> CheckResult {
        let host = Self::lookup_name(&target.address);

        let start_time = Instant::now();
        let outcome = timeout(timeout_duration, self.resolver.resolve(&host)).await;
        let latency = start_time.elapsed();

        match outcome {
            Ok(Ok(addrs)) if !addrs.is_empty() => {
                let detail = addrs
                    .iter()
                    .map(IpAddr::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                CheckResult::success(target, latency, detail)
            }
            Ok(Ok(_)) => CheckResult::failure(target, latency, format!("no addresses returned for {host}")),
            Ok(Err(ResolveError::Timeout)) | Err(_) => {
                CheckResult::failure(target, latency, timeout_detail(timeout_duration))
            }
            Ok(Err(e)) => CheckResult::failure(target, latency, e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckKind;

    struct FakeResolver {
        delay: Duration,
        answer: Result<Vec<IpAddr>, ResolveError>,
    }

    #[async_trait]
    impl DnsResolver for FakeResolver {
        async fn resolve(&self, _host: &str) -> Result<Vec<IpAddr>, ResolveError> {
            tokio::time::sleep(self.delay).await;
            self.answer.clone()
        }
    }

    fn probe(delay: Duration, answer: Result<Vec<IpAddr>, ResolveError>) -> DnsProbe {
        DnsProbe::new(Arc::new(FakeResolver { delay, answer }))
    }

    #[test]
    fn test_lookup_name() {
        assert_eq!(DnsProbe::lookup_name("example.com"), "example.com");
        assert_eq!(DnsProbe::lookup_name("example.com:443"), "example.com");
        assert_eq!(DnsProbe::lookup_name("https://api.github.com/v3"), "api.github.com");
        assert_eq!(DnsProbe::lookup_name("::1"), "::1");
        assert_eq!(DnsProbe::lookup_name("http://[::1]:8080/"), "::1");
    }

    #[tokio::test]
    async fn test_nxdomain() {
        let p = probe(
            Duration::ZERO,
            Err(ResolveError::NxDomain("nonexistent.invalid".to_string())),
        );
        let target = Target::new("bad-host", CheckKind::Dns, "nonexistent.invalid")
            .with_timeout(Duration::from_secs(2));

        let result = p.probe(&target, target.timeout).await;

        assert!(!result.success);
        assert!(result.detail.contains("NXDOMAIN"));
        assert_eq!(result.target_name, "bad-host");
    }

    #[tokio::test]
    async fn test_resolves_addresses() {
        let p = probe(
            Duration::ZERO,
            Ok(vec![
                "140.82.112.3".parse().unwrap(),
                "140.82.112.4".parse().unwrap(),
            ]),
        );
        let target = Target::new("github", CheckKind::Dns, "github.com");

        let result = p.probe(&target, target.timeout).await;

        assert!(result.success);
        assert_eq!(result.detail, "140.82.112.3, 140.82.112.4");
    }

    #[tokio::test]
    async fn test_empty_answer_is_failure() {
        let p = probe(Duration::ZERO, Ok(vec![]));
        let target = Target::new("empty", CheckKind::Dns, "empty.example");

        let result = p.probe(&target, target.timeout).await;
        assert!(!result.success);
        assert!(result.detail.contains("no addresses"));
    }

    #[tokio::test]
    async fn test_slow_resolver_times_out() {
        let p = probe(Duration::from_secs(10), Ok(vec!["127.0.0.1".parse().unwrap()]));
        let target = Target::new("slow", CheckKind::Dns, "slow.example")
            .with_timeout(Duration::from_millis(50));

        let result = p.probe(&target, target.timeout).await;
        assert!(!result.success);
        assert_eq!(result.detail, "timeout after 50ms");
    }

    #[tokio::test]
    async fn test_servfail() {
        let p = probe(
            Duration::ZERO,
            Err(ResolveError::ServFail("Temporary failure in name resolution".to_string())),
        );
        let target = Target::new("flaky", CheckKind::Dns, "flaky.example");

        let result = p.probe(&target, target.timeout).await;
        assert!(result.detail.starts_with("SERVFAIL"));
    }
}
