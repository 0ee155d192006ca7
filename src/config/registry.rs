//! 目标注册表
//!
//! 把解析后的配置转换为有序、已验证的 [`Target`] 列表

use crate::config::target::{default_expected_status_codes, CheckKind, Target, DEFAULT_PING_COUNT};
use crate::config::types::{Config, TargetConfig, MAX_TIMEOUT_SECONDS};
use crate::error::ConfigError;
use std::collections::HashSet;
use std::time::Duration;

const VALID_METHODS: [&str; 7] = ["GET", "POST", "PUT", "DELETE", "HEAD", "OPTIONS", "PATCH"];

/// 目标注册表，保持配置文件中的顺序
#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    targets: Vec<Target>,
}

impl TargetRegistry {
    /// 从配置加载目标
    ///
    /// 禁用的目标会被跳过。未知类型、缺少端口、名称重复或字段无效时返回
    /// [`ConfigError`]，此时不会执行任何探测。
    ///
    /// # 参数
    /// * `config` - 已解析的配置
    ///
    /// # 返回
    /// * `Result<Self, ConfigError>` - 注册表或配置错误
    pub fn load(config: &Config) -> Result<Self, ConfigError> {
        let default_timeout = config
            .global
            .default_timeout_seconds
            .map(|secs| parse_timeout(secs, "全局默认"))
            .transpose()?;

        let mut seen = HashSet::new();
        let mut targets = Vec::with_capacity(config.targets.len());

        for raw in config.targets.iter().filter(|t| t.enabled) {
            let mut target = build_target(raw, default_timeout)?;

            // 全局请求头在前，目标请求头覆盖同名项
            if target.kind == CheckKind::Http {
                let mut headers = config.global.headers.clone();
                headers.extend(target.headers.drain());
                target.headers = headers;
            }

            if !seen.insert(target.name.clone()) {
                return Err(ConfigError::DuplicateTarget { name: target.name });
            }
            targets.push(target);
        }

        if targets.is_empty() {
            return Err(ConfigError::ValidationError(
                "至少需要配置一个启用的检测目标".to_string(),
            ));
        }

        Ok(Self { targets })
    }

    /// 直接由目标列表构建（名称必须唯一）
    pub fn from_targets(targets: Vec<Target>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for target in &targets {
            if !seen.insert(target.name.as_str()) {
                return Err(ConfigError::DuplicateTarget {
                    name: target.name.clone(),
                });
            }
        }
        Ok(Self { targets })
    }

    /// 按名称查找目标
    pub fn get(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }

    /// 只保留指定名称的目标
    pub fn select(&self, name: &str) -> Option<Self> {
        self.get(name).map(|t| Self {
            targets: vec![t.clone()],
        })
    }

    /// 所有目标（注册顺序）
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Target> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl<'a> IntoIterator for &'a TargetRegistry {
    type Item = &'a Target;
    type IntoIter = std::slice::Iter<'a, Target>;

    fn into_iter(self) -> Self::IntoIter {
        self.targets.iter()
    }
}

/// 把秒数转换为超时时间，超出 (0, MAX_TIMEOUT_SECONDS] 时返回错误
fn parse_timeout(secs: f64, owner: &str) -> Result<Duration, ConfigError> {
    let invalid = || {
        ConfigError::ValidationError(format!(
            "{owner}超时时间无效: {secs}，有效范围 (0, {MAX_TIMEOUT_SECONDS}]"
        ))
    };

    if !secs.is_finite() || secs <= 0.0 || secs > MAX_TIMEOUT_SECONDS {
        return Err(invalid());
    }
    Duration::try_from_secs_f64(secs).map_err(|_| invalid())
}

/// 验证并转换单个目标配置
fn build_target(raw: &TargetConfig, default_timeout: Option<Duration>) -> Result<Target, ConfigError> {
    let provisional_name = raw
        .name
        .clone()
        .unwrap_or_else(|| format!("{} {}", raw.kind, raw.address));

    let kind: CheckKind = raw.kind.parse().map_err(|kind| ConfigError::UnknownKind {
        target: provisional_name.clone(),
        kind,
    })?;

    let name = match &raw.name {
        Some(name) if name.trim().is_empty() => {
            return Err(ConfigError::ValidationError("目标名称不能为空".to_string()));
        }
        Some(name) => name.trim().to_string(),
        None => format!("{} {}", kind, raw.address.trim()),
    };

    let address = raw.address.trim().to_string();
    if address.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "目标 {name} 的地址不能为空"
        )));
    }

    let timeout = match raw.timeout_seconds {
        Some(secs) => parse_timeout(secs, &format!("目标 {name} 的"))?,
        None => default_timeout.unwrap_or_else(|| kind.default_timeout()),
    };

    if raw.port == Some(0) {
        return Err(ConfigError::ValidationError(format!(
            "目标 {name} 的端口不能为0"
        )));
    }

    let mut target = Target::new(name.clone(), kind, address).with_timeout(timeout);
    target.port = raw.port;
    target.description = raw.description.clone();

    match kind {
        CheckKind::Http => {
            if !target.address.starts_with("http://") && !target.address.starts_with("https://") {
                return Err(ConfigError::ValidationError(format!(
                    "目标 {name} 的URL格式无效"
                )));
            }

            let method = raw
                .method
                .as_deref()
                .unwrap_or("GET")
                .trim()
                .to_ascii_uppercase();
            if !VALID_METHODS.contains(&method.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "目标 {name} 的HTTP方法 {method} 无效，支持的方法: {VALID_METHODS:?}"
                )));
            }
            target.method = method;

            let codes = raw
                .expected_status_codes
                .clone()
                .unwrap_or_else(default_expected_status_codes);
            if codes.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "目标 {name} 必须指定期望的状态码"
                )));
            }
            if let Some(code) = codes.iter().find(|c| !(100..=599).contains(*c)) {
                return Err(ConfigError::ValidationError(format!(
                    "目标 {name} 的状态码 {code} 无效"
                )));
            }
            target.expected_status_codes = codes;
            target.headers = raw.headers.clone();
            target.body = raw.body.clone();
        }
        CheckKind::Ping => {
            let count = raw.count.unwrap_or(DEFAULT_PING_COUNT);
            if count == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "目标 {name} 的 ping 次数不能为0"
                )));
            }
            target.count = count;
        }
        CheckKind::Dns => {}
        CheckKind::TcpPort => {
            if raw.port.is_none() {
                return Err(ConfigError::MissingPort { target: name });
            }
        }
    }

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Config {
        toml::from_str(content).expect("测试配置解析失败")
    }

    #[test]
    fn test_load_preserves_order_and_applies_defaults() {
        let config = parse(
            r#"
[[targets]]
name = "github-api"
kind = "http"
address = "https://api.github.com"
timeout_seconds = 5

[[targets]]
name = "bad-host"
kind = "dns"
address = "nonexistent.invalid"

[[targets]]
name = "secure-site"
kind = "tcp_port"
address = "github.com"
port = 443
timeout_seconds = 3

[[targets]]
kind = "ping"
address = "1.1.1.1"
"#,
        );

        let registry = TargetRegistry::load(&config).unwrap();
        let names: Vec<_> = registry.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["github-api", "bad-host", "secure-site", "ping 1.1.1.1"]);

        let http = registry.get("github-api").unwrap();
        assert_eq!(http.kind, CheckKind::Http);
        assert_eq!(http.timeout, Duration::from_secs(5));
        assert!(http.accepts_status(200));
        assert!(http.accepts_status(299));

        let dns = registry.get("bad-host").unwrap();
        assert_eq!(dns.timeout, CheckKind::Dns.default_timeout());

        let ping = registry.get("ping 1.1.1.1").unwrap();
        assert_eq!(ping.count, DEFAULT_PING_COUNT);
    }

    #[test]
    fn test_oversized_timeout_is_config_error() {
        let config = parse(
            r#"
[[targets]]
name = "slow-dns"
kind = "dns"
address = "example.com"
timeout_seconds = 1e30
"#,
        );

        let err = TargetRegistry::load(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(ref msg) if msg.contains("slow-dns")));

        let config = parse(
            r#"
[global]
default_timeout_seconds = 1e30

[[targets]]
name = "plain-dns"
kind = "dns"
address = "example.com"
"#,
        );

        let err = TargetRegistry::load(&config).unwrap_err();
        assert!(err.to_string().contains("超时时间无效"));
    }

    #[test]
    fn test_missing_port_for_tcp_target() {
        let config = parse(
            r#"
[[targets]]
name = "secure-site"
kind = "tcp_port"
address = "github.com"
"#,
        );

        let err = TargetRegistry::load(&config).unwrap_err();
        assert!(matches!(err, ConfigError::MissingPort { ref target } if target == "secure-site"));
    }

    #[test]
    fn test_unknown_kind() {
        let config = parse(
            r#"
[[targets]]
name = "mail"
kind = "smtp"
address = "mail.example.com"
"#,
        );

        let err = TargetRegistry::load(&config).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKind { ref kind, .. } if kind == "smtp"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let config = parse(
            r#"
[[targets]]
name = "api"
kind = "http"
address = "https://a.example.com"

[[targets]]
name = "api"
kind = "dns"
address = "b.example.com"
"#,
        );

        let err = TargetRegistry::load(&config).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateTarget { ref name } if name == "api"));
    }

    #[test]
    fn test_disabled_targets_are_skipped() {
        let config = parse(
            r#"
[[targets]]
name = "on"
kind = "dns"
address = "example.com"

[[targets]]
name = "off"
kind = "dns"
address = "example.org"
enabled = false
"#,
        );

        let registry = TargetRegistry::load(&config).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.get("off").is_none());
    }

    #[test]
    fn test_no_enabled_targets() {
        let config = parse(
            r#"
[[targets]]
name = "off"
kind = "dns"
address = "example.org"
enabled = false
"#,
        );

        let err = TargetRegistry::load(&config).unwrap_err();
        assert!(err.to_string().contains("至少需要配置一个启用的检测目标"));
    }

    #[test]
    fn test_http_validation() {
        let config = parse(
            r#"
[[targets]]
name = "no-scheme"
kind = "http"
address = "example.com"
"#,
        );
        assert!(TargetRegistry::load(&config)
            .unwrap_err()
            .to_string()
            .contains("URL格式无效"));

        let config = parse(
            r#"
[[targets]]
name = "bad-code"
kind = "http"
address = "https://example.com"
expected_status_codes = [999]
"#,
        );
        assert!(TargetRegistry::load(&config)
            .unwrap_err()
            .to_string()
            .contains("状态码"));

        let config = parse(
            r#"
[[targets]]
name = "bad-method"
kind = "http"
address = "https://example.com"
method = "FETCH"
"#,
        );
        assert!(TargetRegistry::load(&config)
            .unwrap_err()
            .to_string()
            .contains("HTTP方法"));
    }

    #[test]
    fn test_invalid_timeout() {
        let config = parse(
            r#"
[[targets]]
name = "zero"
kind = "dns"
address = "example.com"
timeout_seconds = 0
"#,
        );
        assert!(TargetRegistry::load(&config)
            .unwrap_err()
            .to_string()
            .contains("超时时间无效"));
    }

    #[test]
    fn test_global_defaults_and_header_merge() {
        let config = parse(
            r#"
[global]
default_timeout_seconds = 1.5

[global.headers]
"User-Agent" = "uptime-vitals"
"X-Env" = "global"

[[targets]]
name = "api"
kind = "http"
address = "https://example.com"
method = "post"
expected_status_codes = [200, 201]

[targets.headers]
"X-Env" = "target"
"#,
        );

        let registry = TargetRegistry::load(&config).unwrap();
        let api = registry.get("api").unwrap();
        assert_eq!(api.timeout, Duration::from_millis(1500));
        assert_eq!(api.method, "POST");
        assert_eq!(api.expected_status_codes, vec![200, 201]);
        assert_eq!(api.headers.get("X-Env").map(String::as_str), Some("target"));
        assert_eq!(
            api.headers.get("User-Agent").map(String::as_str),
            Some("uptime-vitals")
        );
    }

    #[test]
    fn test_select() {
        let registry = TargetRegistry::from_targets(vec![
            Target::new("a", CheckKind::Dns, "a.example.com"),
            Target::new("b", CheckKind::Dns, "b.example.com"),
        ])
        .unwrap();

        let only_b = registry.select("b").unwrap();
        assert_eq!(only_b.len(), 1);
        assert_eq!(only_b.targets()[0].name, "b");
        assert!(registry.select("c").is_none());
    }
}
