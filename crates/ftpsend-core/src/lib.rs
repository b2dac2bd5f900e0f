//! ftpsend Core Library
//!
//! 通过 FTP 或 SFTP 将单个本地文件上传到远端主机。
//!
//! # 模块
//!
//! - **config**: 上传设置及配置文件读取 (JSON / TOML)
//! - **normalize**: 主机名与路径规范化
//! - **transport**: 传输抽象及 FTP / SFTP 实现
//! - **workflow**: 上传编排，结果分类
//! - **logging**: 结构化上传事件
//!
//! # 使用示例
//!
//! ```ignore
//! use ftpsend_core::{LogCallback, TransferSettings, Uploader};
//!
//! // 1. 读取设置
//! let mut settings = TransferSettings::load()?;
//!
//! // 2. 规范化并上传（只尝试一次）
//! let outcome = Uploader::network().run(&mut settings, &LogCallback);
//!
//! // 3. 检查结果
//! if !outcome.is_success() {
//!     eprintln!("{}", outcome);
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod transport;
pub mod workflow;

// Config re-exports
pub use config::{TransferSettings, parse_port};

// Error re-exports
pub use error::UploadError;

// Logging re-exports
pub use logging::{LogLevel, Stage, UploadEvent};

// Transport re-exports
pub use transport::{
    ConnectionParams, FileTransfer, NetworkTransport, Protocol, Session, TransferMode,
    TransferResult, Transport,
};

// Workflow re-exports
pub use workflow::{
    LogCallback, SimpleUploadCallback, UploadOutcome, UploadProgressCallback, Uploader,
};
