//! FTP 传输 (suppaftp)

use super::{
    ConnectionParams, FileTransfer, Session, TransferMode, TransferResult, Transport, resolve,
};
use crate::error::{Result, UploadError};
use log::{debug, info, warn};
use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::Path;
use suppaftp::FtpStream;
use suppaftp::types::{FileType, FormatControl};

#[derive(Debug, Default, Clone, Copy)]
pub struct FtpTransport;

impl FtpTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for FtpTransport {
    fn open_session(&self, params: &ConnectionParams) -> Result<Box<dyn Session>> {
        let port = params.effective_port();
        info!("Connecting to {}:{} (FTP)", params.host, port);

        let mut stream = match params.timeout {
            Some(timeout) => {
                let addrs = resolve(&params.host, port).map_err(|e| params.connection_error(e))?;
                connect_first(addrs, |addr| FtpStream::connect_timeout(addr, timeout))
                    .map_err(|e| match e {
                        Some(e) => params.connection_error(e),
                        None => params.connection_error("no address"),
                    })?
            }
            None => FtpStream::connect((params.host.as_str(), port))
                .map_err(|e| params.connection_error(e))?,
        };

        if let Err(e) = stream.login(params.user_name.as_str(), params.password.as_str()) {
            let _ = stream.quit();
            return Err(params.connection_error(format!("login failed: {}", e)));
        }

        if let Some(welcome) = stream.get_welcome_msg() {
            debug!("Server welcome: {}", welcome.trim());
        }

        Ok(Box::new(FtpSession {
            stream: Some(stream),
        }))
    }
}

/// 依次尝试每个地址，返回第一个成功的连接
///
/// 全部失败时返回最后一个错误；没有地址时为 `None`。
fn connect_first<T, E>(
    addrs: impl IntoIterator<Item = SocketAddr>,
    mut connect: impl FnMut(SocketAddr) -> std::result::Result<T, E>,
) -> std::result::Result<T, Option<E>> {
    let mut last_err = None;
    for addr in addrs {
        match connect(addr) {
            Ok(conn) => return Ok(conn),
            Err(e) => {
                debug!("Connect to {} failed", addr);
                last_err = Some(e);
            }
        }
    }
    Err(last_err)
}

/// 已登录的 FTP 会话
pub struct FtpSession {
    /// 关闭后为 `None`
    stream: Option<FtpStream>,
}

impl Session for FtpSession {
    fn upload_file(
        &mut self,
        local_path: &Path,
        remote_path: &str,
        mode: TransferMode,
    ) -> Result<TransferResult> {
        let file_name = local_path.display().to_string();
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| UploadError::transfer(&file_name, "session already closed"))?;

        let file_type = match mode {
            TransferMode::Binary => FileType::Binary,
            TransferMode::Ascii => FileType::Ascii(FormatControl::Default),
        };
        stream
            .transfer_type(file_type)
            .map_err(|e| UploadError::transfer(&file_name, e))?;

        let local = File::open(local_path)
            .map_err(|e| UploadError::transfer(&file_name, format!("cannot open local file: {}", e)))?;
        let mut reader = BufReader::new(local);

        match stream.put_file(remote_path, &mut reader) {
            Ok(bytes) => {
                debug!("Wrote {} bytes to {}", bytes, remote_path);
                Ok(TransferResult::single(FileTransfer::completed(
                    local_path,
                    remote_path,
                    bytes,
                )))
            }
            // 服务器拒绝 (如 550) 记录在结果中，由调用方 check
            Err(e @ suppaftp::FtpError::UnexpectedResponse(_)) => Ok(TransferResult::single(
                FileTransfer::failed(local_path, remote_path, e.to_string()),
            )),
            Err(e) => Err(UploadError::transfer(&file_name, e)),
        }
    }

    fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.quit() {
                warn!("FTP quit failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Protocol;
    use std::time::Duration;

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_connect_first_falls_through_to_later_address() {
        let addrs = [addr("[::1]:21"), addr("127.0.0.1:21")];
        let mut tried = Vec::new();

        let result = connect_first(addrs, |a| {
            tried.push(a);
            if a.is_ipv6() { Err("refused") } else { Ok(a) }
        });

        assert_eq!(result, Ok(addr("127.0.0.1:21")));
        assert_eq!(tried, addrs);
    }

    #[test]
    fn test_connect_first_keeps_last_error() {
        let addrs = [addr("10.0.0.1:21"), addr("10.0.0.2:21")];
        let result: std::result::Result<(), _> =
            connect_first(addrs, |a| Err(format!("refused {}", a)));
        assert_eq!(result, Err(Some("refused 10.0.0.2:21".to_string())));
    }

    #[test]
    fn test_connect_first_without_addresses() {
        let result: std::result::Result<(), Option<&str>> =
            connect_first(Vec::<SocketAddr>::new(), |_| Ok(()));
        assert_eq!(result, Err(None));
    }

    #[test]
    fn test_timeout_connect_refused_is_connection_error() {
        // 先占用再释放一个本地端口，连接会被拒绝
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let params = ConnectionParams {
            protocol: Protocol::Ftp,
            host: "127.0.0.1".to_string(),
            port: Some(port),
            user_name: String::new(),
            password: String::new(),
            ssh_host_key_fingerprint: None,
            timeout: Some(Duration::from_secs(2)),
        };

        let err = FtpTransport::new().open_session(&params).err().unwrap();
        assert!(matches!(err, UploadError::Connection { ref host, .. } if host == "127.0.0.1"));
    }
}
