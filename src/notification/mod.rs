//! 通知模块
//!
//! 提供告警判定和 Slack 告警投递功能

pub mod dispatcher;
pub mod sender;
pub mod slack;

// 重新导出主要类型
pub use dispatcher::{AlertDispatcher, AlertPayload};
pub use sender::{create_sender, deliver, NoOpSender, NotificationSender};
pub use slack::SlackSender;
