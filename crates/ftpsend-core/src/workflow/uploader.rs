//! 上传工作流
//!
//! 高层 API 封装完整的上传流程:
//! 1. 校验前置条件（主机、文件名、SFTP 指纹）
//! 2. 构建连接参数和远端/本地路径
//! 3. 打开会话，上传单个文件，无论成功失败都关闭会话
//! 4. 将结果分类为成功、校验失败或传输失败
//!
//! 每次调用只尝试一次，不重试。

use crate::config::TransferSettings;
use crate::error::{Result, UploadError};
use crate::logging::{LogLevel, Stage, UploadEvent};
use crate::normalize;
use crate::transport::{
    ConnectionParams, FileTransfer, NetworkTransport, Session, TransferMode, Transport,
};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// 上传进度回调
pub trait UploadProgressCallback: Send + Sync {
    /// 收到一个结构化事件
    fn on_event(&self, event: UploadEvent);
}

/// 上传结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// 上传成功，包含每个文件的传输记录
    Success { transfers: Vec<FileTransfer> },
    /// 前置条件不满足，未进行任何网络活动
    ValidationFailure(String),
    /// 连接或传输失败
    TransferFailure { stage: Stage, message: String },
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success { .. })
    }
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadOutcome::Success { transfers } => {
                let bytes: u64 = transfers.iter().map(|t| t.bytes).sum();
                write!(f, "uploaded {} file(s), {} bytes", transfers.len(), bytes)
            }
            UploadOutcome::ValidationFailure(message) => {
                write!(f, "validation failed: {}", message)
            }
            UploadOutcome::TransferFailure { stage, message } => {
                write!(f, "{} failed: {}", stage, message)
            }
        }
    }
}

/// 上传端工作流
pub struct Uploader<T: Transport> {
    transport: T,
}

impl Uploader<NetworkTransport> {
    /// 使用真实网络传输（FTP / SFTP）
    pub fn network() -> Self {
        Self::new(NetworkTransport::new())
    }
}

impl<T: Transport> Uploader<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// 规范化设置后上传
    pub fn run<C: UploadProgressCallback>(
        &self,
        settings: &mut TransferSettings,
        callback: &C,
    ) -> UploadOutcome {
        if let Err(e) = normalize::normalize(settings) {
            return validation_failure(Stage::Normalize, &e, callback);
        }
        callback.on_event(UploadEvent::debug(
            Stage::Normalize,
            format!(
                "host={} remote_dir={:?} local_dir={:?} file={:?}",
                settings.destination_host,
                settings.destination_directory,
                settings.local_file_directory,
                settings.local_file_name
            ),
        ));

        self.upload(settings, callback)
    }

    /// 上传已规范化的设置中描述的文件
    pub fn upload<C: UploadProgressCallback>(
        &self,
        settings: &TransferSettings,
        callback: &C,
    ) -> UploadOutcome {
        if let Err(e) = validate(settings) {
            return validation_failure(Stage::Validate, &e, callback);
        }

        let params = ConnectionParams::from_settings(settings);
        let remote = remote_path(settings);
        let local = local_path(settings);

        callback.on_event(UploadEvent::info(
            Stage::Connect,
            format!(
                "Connecting to {}:{} ({})",
                params.host,
                params.effective_port(),
                params.protocol
            ),
        ));

        let session = match self.transport.open_session(&params) {
            Ok(session) => session,
            Err(e) => return transfer_failure(&e, callback),
        };
        let mut guard = SessionGuard::new(session, callback);

        callback.on_event(UploadEvent::info(
            Stage::Transfer,
            format!(
                "Uploading {} to {}",
                local.display(),
                params.remote_url(&remote)
            ),
        ));

        let result = guard
            .session
            .upload_file(&local, &remote, TransferMode::Binary)
            .and_then(|result| result.check().map(|()| result));

        match result {
            Ok(result) => {
                for transfer in &result.transfers {
                    callback.on_event(UploadEvent::info(
                        Stage::Transfer,
                        format!(
                            "Upload of {} succeeded ({} bytes)",
                            transfer.remote_path, transfer.bytes
                        ),
                    ));
                }
                UploadOutcome::Success {
                    transfers: result.transfers,
                }
            }
            Err(e) => transfer_failure(&e, callback),
        }
    }
}

/// 前置条件校验
pub fn validate(settings: &TransferSettings) -> Result<()> {
    if settings.destination_host.trim().is_empty() {
        return Err(UploadError::validation("empty host"));
    }
    // `"file.txt/"` 规范化后为空，不能拼出远端路径
    if settings.local_file_name.trim().is_empty() {
        return Err(UploadError::validation("empty file name"));
    }
    if settings.use_secure_transport && settings.ssh_host_key_fingerprint.trim().is_empty() {
        return Err(UploadError::validation(format!(
            "SFTP requires the server SSH host key fingerprint for {}",
            settings.destination_host
        )));
    }
    Ok(())
}

/// 远端路径：目标目录 + 文件名
pub fn remote_path(settings: &TransferSettings) -> String {
    format!(
        "{}{}",
        settings.destination_directory, settings.local_file_name
    )
}

/// 本地路径：本地目录 + 平台分隔符 + 文件名
pub fn local_path(settings: &TransferSettings) -> PathBuf {
    Path::new(&settings.local_file_directory).join(&settings.local_file_name)
}

fn validation_failure<C: UploadProgressCallback>(
    stage: Stage,
    error: &UploadError,
    callback: &C,
) -> UploadOutcome {
    let message = match error {
        UploadError::Validation(message) => message.clone(),
        other => other.to_string(),
    };
    callback.on_event(UploadEvent::error(stage, error.to_string()));
    UploadOutcome::ValidationFailure(message)
}

fn transfer_failure<C: UploadProgressCallback>(
    error: &UploadError,
    callback: &C,
) -> UploadOutcome {
    if let UploadError::Validation(_) = error {
        return validation_failure(Stage::Validate, error, callback);
    }
    let stage = error.stage();
    callback.on_event(UploadEvent::error(stage, error.to_string()));
    UploadOutcome::TransferFailure {
        stage,
        message: error.to_string(),
    }
}

/// 会话作用域：离开作用域时关闭会话
struct SessionGuard<'a, C: UploadProgressCallback> {
    session: Box<dyn Session>,
    callback: &'a C,
}

impl<'a, C: UploadProgressCallback> SessionGuard<'a, C> {
    fn new(session: Box<dyn Session>, callback: &'a C) -> Self {
        Self { session, callback }
    }
}

impl<C: UploadProgressCallback> Drop for SessionGuard<'_, C> {
    fn drop(&mut self) {
        self.session.close();
        self.callback
            .on_event(UploadEvent::debug(Stage::Close, "Session closed"));
    }
}

/// 转发到 `log` 门面的回调
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCallback;

impl UploadProgressCallback for LogCallback {
    fn on_event(&self, event: UploadEvent) {
        log::log!(
            target: "ftpsend_core::upload",
            log::Level::from(event.level),
            "[{}] {}",
            event.stage,
            event.message
        );
    }
}

/// 简化的上传回调实现，事件通过通道转发
pub struct SimpleUploadCallback {
    tx: mpsc::UnboundedSender<UploadEvent>,
    min_level: LogLevel,
}

impl SimpleUploadCallback {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UploadEvent>) {
        Self::with_level(LogLevel::Debug)
    }

    /// 只转发不低于 `min_level` 的事件
    pub fn with_level(min_level: LogLevel) -> (Self, mpsc::UnboundedReceiver<UploadEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, min_level }, rx)
    }
}

impl UploadProgressCallback for SimpleUploadCallback {
    fn on_event(&self, event: UploadEvent) {
        if event.level <= self.min_level {
            let _ = self.tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> TransferSettings {
        TransferSettings {
            local_file_name: "report.csv".to_string(),
            local_file_directory: "data/".to_string(),
            destination_host: "example.com".to_string(),
            destination_directory: "/uploads/".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_paths() {
        let s = settings();
        assert_eq!(remote_path(&s), "/uploads/report.csv");
        assert_eq!(local_path(&s), Path::new("data").join("report.csv"));
    }

    #[test]
    fn test_paths_empty_directories() {
        let s = TransferSettings {
            local_file_directory: String::new(),
            destination_directory: String::new(),
            ..settings()
        };
        assert_eq!(remote_path(&s), "report.csv");
        assert_eq!(local_path(&s), PathBuf::from("report.csv"));
    }

    #[test]
    fn test_validate() {
        assert!(validate(&settings()).is_ok());

        let secure = TransferSettings {
            use_secure_transport: true,
            ssh_host_key_fingerprint: "  ".to_string(),
            ..settings()
        };
        assert!(matches!(validate(&secure), Err(UploadError::Validation(_))));

        let no_host = TransferSettings {
            destination_host: String::new(),
            ..settings()
        };
        assert!(validate(&no_host).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_file_name() {
        let s = TransferSettings {
            local_file_name: String::new(),
            ..settings()
        };
        let err = validate(&s).unwrap_err();
        assert!(matches!(err, UploadError::Validation(ref m) if m == "empty file name"));
    }

    #[test]
    fn test_simple_callback_filters_level() {
        let (callback, mut rx) = SimpleUploadCallback::with_level(LogLevel::Info);
        callback.on_event(UploadEvent::debug(Stage::Close, "hidden"));
        callback.on_event(UploadEvent::info(Stage::Transfer, "shown"));

        assert_eq!(rx.try_recv().unwrap().message, "shown");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_log_callback_without_logger() {
        // 未安装 logger 时事件被静默丢弃
        LogCallback.on_event(UploadEvent::error(Stage::Transfer, "ignored"));
    }

    #[test]
    fn test_outcome_display() {
        let failure = UploadOutcome::TransferFailure {
            stage: Stage::Connect,
            message: "refused".to_string(),
        };
        assert_eq!(failure.to_string(), "connect failed: refused");
        assert!(!failure.is_success());
        assert!(UploadOutcome::Success { transfers: vec![] }.is_success());
    }
}
