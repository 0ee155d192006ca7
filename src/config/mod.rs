//! 配置管理模块
//!
//! 提供配置文件解析、验证以及检测目标注册表

pub mod loader;
pub mod registry;
pub mod target;
pub mod types;

// 重新导出主要类型
pub use loader::{get_default_config_path, ConfigLoader, TomlConfigLoader};
pub use registry::TargetRegistry;
pub use target::{CheckKind, Target};
pub use types::{validate_config, AlertConfig, Config, GlobalConfig, TargetConfig};
