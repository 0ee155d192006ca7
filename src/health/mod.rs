//! 健康检测模块
//!
//! 提供四种探测执行器、结果汇总和并发运行引擎

pub mod aggregator;
pub mod dns;
pub mod executor;
pub mod http;
pub mod ping;
pub mod result;
pub mod runner;
pub mod tcp;
pub mod transport;

// 重新导出主要类型
pub use aggregator::{aggregate, RunSummary};
pub use executor::{Probe, ProbeExecutor, Transports};
pub use result::CheckResult;
pub use runner::RunEngine;
pub use transport::{
    DnsResolver, HttpTransport, HttpTransportError, PingOutput, PingRunner, ReqwestTransport,
    ResolveError, SystemPing, SystemResolver, TcpConnector, TokioConnector,
};
