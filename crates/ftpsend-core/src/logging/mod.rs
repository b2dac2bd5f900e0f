//! 日志模块
//!
//! 上传流程的结构化事件定义：{级别, 阶段, 消息}。
//! 事件通过注入的回调发出，不依赖全局终端状态。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 日志级别
///
/// 实现了 `PartialOrd` 以便过滤。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    /// 获取对应的 Emoji 图标
    pub fn icon(&self) -> &'static str {
        match self {
            LogLevel::Error => "❌",
            LogLevel::Warn => "⚠️",
            LogLevel::Info => "ℹ️",
            LogLevel::Debug => "🔍",
        }
    }

    /// 获取显示名称
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 上传流程阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// 读取配置
    Load,
    /// 规范化主机和路径
    Normalize,
    /// 前置条件校验
    Validate,
    /// 建立会话
    Connect,
    /// 文件传输
    Transfer,
    /// 关闭会话
    Close,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::Normalize => "normalize",
            Stage::Validate => "validate",
            Stage::Connect => "connect",
            Stage::Transfer => "transfer",
            Stage::Close => "close",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 上传事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadEvent {
    pub level: LogLevel,
    pub stage: Stage,
    pub message: String,
}

impl UploadEvent {
    pub fn new(level: LogLevel, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            level,
            stage,
            message: message.into(),
        }
    }

    pub fn info(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, stage, message)
    }

    pub fn debug(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Debug, stage, message)
    }

    pub fn error(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, stage, message)
    }
}

impl fmt::Display for UploadEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.stage, self.message)
    }
}
