//! 错误类型
//!
//! 上传流程中的错误分类：校验、连接、传输、配置。

/// 上传错误
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// 必填字段缺失或格式错误（在任何网络活动之前检测）
    #[error("Validation failed: {0}")]
    Validation(String),

    /// 会话无法建立（认证失败、主机不可达、协议协商失败）
    #[error("Connection to {host} failed: {message}")]
    Connection { host: String, message: String },

    /// 会话已建立，但文件传输失败
    #[error("Transfer of {file} failed: {message}")]
    Transfer { file: String, message: String },

    #[error("Config error: {0}")]
    Config(String),
}

impl UploadError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn connection(host: impl Into<String>, message: impl ToString) -> Self {
        Self::Connection {
            host: host.into(),
            message: message.to_string(),
        }
    }

    pub fn transfer(file: impl Into<String>, message: impl ToString) -> Self {
        Self::Transfer {
            file: file.into(),
            message: message.to_string(),
        }
    }

    /// 错误发生的阶段
    pub fn stage(&self) -> crate::logging::Stage {
        use crate::logging::Stage;
        match self {
            UploadError::Validation(_) => Stage::Validate,
            UploadError::Connection { .. } => Stage::Connect,
            UploadError::Transfer { .. } => Stage::Transfer,
            UploadError::Config(_) => Stage::Load,
        }
    }
}

pub type Result<T> = std::result::Result<T, UploadError>;
