//! 检测结果数据结构
//!
//! 定义单次探测的标准化结果 `CheckResult`

use crate::config::{CheckKind, Target};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 单个目标的探测结果
///
/// 由探测执行器创建，创建后不再修改。失败的探测同样会产生结果，
/// 此时 `success` 为 false，`detail` 描述失败原因。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// 目标名称
    pub target_name: String,
    /// 检测类型
    pub kind: CheckKind,
    /// 目标地址
    pub address: String,
    /// 目标端口（如果适用）
    pub port: Option<u16>,
    /// 是否成功
    pub success: bool,
    /// 探测耗时
    #[serde(with = "duration_serde")]
    pub latency: Duration,
    /// 详情：状态码、解析地址或错误信息
    pub detail: String,
    /// HTTP状态码（仅HTTP检测）
    pub status_code: Option<u16>,
    /// 实际尝试次数
    pub attempts: u32,
    /// 检测时间戳
    pub timestamp: DateTime<Utc>,
}

impl CheckResult {
    /// 创建成功的结果
    pub fn success(target: &Target, latency: Duration, detail: impl Into<String>) -> Self {
        Self::new(target, true, latency, detail.into())
    }

    /// 创建失败的结果
    ///
    /// 空的详情会被替换为通用描述，保证失败结果总能说明原因。
    pub fn failure(target: &Target, latency: Duration, detail: impl Into<String>) -> Self {
        let mut detail = detail.into();
        if detail.trim().is_empty() {
            detail = "probe failed".to_string();
        }
        Self::new(target, false, latency, detail)
    }

    fn new(target: &Target, success: bool, latency: Duration, detail: String) -> Self {
        Self {
            target_name: target.name.clone(),
            kind: target.kind,
            address: target.address.clone(),
            port: target.port,
            success,
            latency,
            detail,
            status_code: None,
            attempts: 1,
            timestamp: Utc::now(),
        }
    }

    /// 设置HTTP状态码
    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// 设置尝试次数
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// 设置时间戳
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// 获取耗时（毫秒）
    pub fn latency_ms(&self) -> u64 {
        self.latency.as_millis() as u64
    }

    /// 转换为JSON字符串
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Duration序列化模块（毫秒）
pub(crate) mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
