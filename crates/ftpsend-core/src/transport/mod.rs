//! 传输层
//!
//! 包含:
//! - `Transport` / `Session` 抽象（编排器唯一的网络依赖）
//! - FTP 实现 (suppaftp)
//! - SFTP 实现 (ssh2)，带主机密钥指纹校验

pub mod fingerprint;
pub mod ftp;
pub mod sftp;

pub use fingerprint::HostKeyFingerprint;
pub use ftp::FtpTransport;
pub use sftp::SftpTransport;

use crate::config::TransferSettings;
use crate::error::{Result, UploadError};
use std::fmt;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 传输协议
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Ftp,
    Sftp,
}

impl Protocol {
    pub fn default_port(&self) -> u16 {
        match self {
            Protocol::Ftp => 21,
            Protocol::Sftp => 22,
        }
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            Protocol::Ftp => "ftp",
            Protocol::Sftp => "sftp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Protocol::Ftp => "FTP",
            Protocol::Sftp => "SFTP",
        })
    }
}

/// 传输模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    #[default]
    Binary,
    Ascii,
}

/// 建立会话所需的连接参数
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub protocol: Protocol,
    pub host: String,
    /// 仅在显式配置时存在
    pub port: Option<u16>,
    pub user_name: String,
    pub password: String,
    /// 仅 SFTP 携带
    pub ssh_host_key_fingerprint: Option<String>,
    pub timeout: Option<Duration>,
}

impl ConnectionParams {
    /// 从已规范化的设置构建
    pub fn from_settings(settings: &TransferSettings) -> Self {
        let protocol = if settings.use_secure_transport {
            Protocol::Sftp
        } else {
            Protocol::Ftp
        };

        let ssh_host_key_fingerprint = match protocol {
            Protocol::Sftp => Some(settings.ssh_host_key_fingerprint.trim().to_string()),
            Protocol::Ftp => None,
        };

        Self {
            protocol,
            host: settings.destination_host.clone(),
            port: settings.port,
            user_name: settings.user_name.clone(),
            password: settings.password.clone(),
            ssh_host_key_fingerprint,
            timeout: settings.timeout_secs.map(Duration::from_secs),
        }
    }

    /// 实际使用的端口
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.protocol.default_port())
    }

    /// 远端文件的 URL 形式，仅用于日志
    ///
    /// 例如 `sftp://example.com:2222/uploads/report.csv`
    pub fn remote_url(&self, remote_path: &str) -> String {
        let authority = match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        };
        if remote_path.starts_with('/') {
            format!("{}://{}{}", self.protocol.scheme(), authority, remote_path)
        } else {
            format!("{}://{}/{}", self.protocol.scheme(), authority, remote_path)
        }
    }

    pub(crate) fn connection_error(&self, message: impl ToString) -> UploadError {
        UploadError::connection(self.host.clone(), message)
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user_name", &self.user_name)
            .field("password", &"***")
            .field("ssh_host_key_fingerprint", &self.ssh_host_key_fingerprint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// 单个文件的传输记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTransfer {
    pub local_path: PathBuf,
    pub remote_path: String,
    pub bytes: u64,
    /// 传输层报告的失败原因
    pub error: Option<String>,
}

impl FileTransfer {
    pub fn completed(local_path: &Path, remote_path: &str, bytes: u64) -> Self {
        Self {
            local_path: local_path.to_path_buf(),
            remote_path: remote_path.to_string(),
            bytes,
            error: None,
        }
    }

    pub fn failed(local_path: &Path, remote_path: &str, error: impl Into<String>) -> Self {
        Self {
            local_path: local_path.to_path_buf(),
            remote_path: remote_path.to_string(),
            bytes: 0,
            error: Some(error.into()),
        }
    }
}

/// 一次上传调用的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferResult {
    pub transfers: Vec<FileTransfer>,
}

impl TransferResult {
    pub fn single(transfer: FileTransfer) -> Self {
        Self {
            transfers: vec![transfer],
        }
    }

    /// 检查结果，第一个失败的文件转换为 `UploadError::Transfer`
    pub fn check(&self) -> Result<()> {
        match self.transfers.iter().find(|t| t.error.is_some()) {
            Some(failed) => Err(UploadError::transfer(
                failed.local_path.display().to_string(),
                failed.error.as_deref().unwrap_or_default(),
            )),
            None => Ok(()),
        }
    }
}

/// 已打开的传输会话
pub trait Session: Send {
    /// 上传单个文件
    fn upload_file(
        &mut self,
        local_path: &Path,
        remote_path: &str,
        mode: TransferMode,
    ) -> Result<TransferResult>;

    /// 关闭会话。可重复调用，不会失败。
    fn close(&mut self);
}

/// 传输能力
pub trait Transport: Send + Sync {
    fn open_session(&self, params: &ConnectionParams) -> Result<Box<dyn Session>>;
}

/// 按协议分派到 FTP 或 SFTP 实现
#[derive(Debug, Default, Clone, Copy)]
pub struct NetworkTransport {
    ftp: FtpTransport,
    sftp: SftpTransport,
}

impl NetworkTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for NetworkTransport {
    fn open_session(&self, params: &ConnectionParams) -> Result<Box<dyn Session>> {
        match params.protocol {
            Protocol::Ftp => self.ftp.open_session(params),
            Protocol::Sftp => self.sftp.open_session(params),
        }
    }
}

/// 解析主机地址
pub(crate) fn resolve(host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = (host, port).to_socket_addrs()?.collect();
    if addrs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no address found for {}", host),
        ));
    }
    Ok(addrs)
}

/// 建立 TCP 连接，配置了超时则逐个地址尝试
pub(crate) fn connect_tcp(host: &str, port: u16, timeout: Option<Duration>) -> io::Result<TcpStream> {
    let Some(timeout) = timeout else {
        return TcpStream::connect((host, port));
    };

    let mut last_err = None;
    for addr in resolve(host, port)? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no address")))
}
