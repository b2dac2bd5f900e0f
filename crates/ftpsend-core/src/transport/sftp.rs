//! SFTP 传输 (ssh2)
//!
//! 连接流程: TCP 连接 -> SSH 握手 -> 主机密钥校验 -> 密码认证 -> SFTP 子系统

use super::{
    ConnectionParams, FileTransfer, HostKeyFingerprint, Session, TransferMode, TransferResult,
    Transport, connect_tcp,
};
use crate::error::{Result, UploadError};
use log::{debug, info, warn};
use std::fs::File;
use std::io;
use std::path::Path;

#[derive(Debug, Default, Clone, Copy)]
pub struct SftpTransport;

impl SftpTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for SftpTransport {
    fn open_session(&self, params: &ConnectionParams) -> Result<Box<dyn Session>> {
        let expected: HostKeyFingerprint = params
            .ssh_host_key_fingerprint
            .as_deref()
            .ok_or_else(|| params.connection_error("missing SSH host key fingerprint"))?
            .parse()
            .map_err(|e: String| params.connection_error(e))?;

        let port = params.effective_port();
        info!("Connecting to {}:{} (SFTP)", params.host, port);

        let tcp = connect_tcp(&params.host, port, params.timeout)
            .map_err(|e| params.connection_error(format!("TCP connect failed: {}", e)))?;

        let mut session = ssh2::Session::new()
            .map_err(|e| params.connection_error(format!("failed to create SSH session: {}", e)))?;
        if let Some(timeout) = params.timeout {
            session.set_timeout(u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX));
        }
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| params.connection_error(format!("SSH handshake failed: {}", e)))?;

        expected
            .verify(&session)
            .map_err(|e| params.connection_error(e))?;
        debug!("Host key verified: {}", expected);

        session
            .userauth_password(&params.user_name, &params.password)
            .map_err(|e| params.connection_error(format!("authentication failed: {}", e)))?;
        if !session.authenticated() {
            return Err(params.connection_error("authentication failed"));
        }

        let sftp = session
            .sftp()
            .map_err(|e| params.connection_error(format!("SFTP subsystem failed: {}", e)))?;

        Ok(Box::new(SftpSession {
            session,
            sftp: Some(sftp),
        }))
    }
}

/// 已认证的 SFTP 会话
pub struct SftpSession {
    session: ssh2::Session,
    /// 关闭后为 `None`
    sftp: Option<ssh2::Sftp>,
}

impl Session for SftpSession {
    fn upload_file(
        &mut self,
        local_path: &Path,
        remote_path: &str,
        mode: TransferMode,
    ) -> Result<TransferResult> {
        let file_name = local_path.display().to_string();
        let sftp = self
            .sftp
            .as_ref()
            .ok_or_else(|| UploadError::transfer(&file_name, "session already closed"))?;

        // SFTP 只有二进制传输
        if mode != TransferMode::Binary {
            debug!("SFTP ignores transfer mode {:?}", mode);
        }

        let mut local = File::open(local_path)
            .map_err(|e| UploadError::transfer(&file_name, format!("cannot open local file: {}", e)))?;
        let mut remote = sftp.create(Path::new(remote_path)).map_err(|e| {
            UploadError::transfer(&file_name, format!("cannot create {}: {}", remote_path, e))
        })?;

        let bytes = io::copy(&mut local, &mut remote)
            .map_err(|e| UploadError::transfer(&file_name, e))?;

        debug!("Wrote {} bytes to {}", bytes, remote_path);
        Ok(TransferResult::single(FileTransfer::completed(
            local_path,
            remote_path,
            bytes,
        )))
    }

    fn close(&mut self) {
        if self.sftp.take().is_none() {
            return;
        }
        if let Err(e) = self.session.disconnect(None, "ftpsend closing", None) {
            warn!("SSH disconnect failed: {}", e);
        }
    }
}
