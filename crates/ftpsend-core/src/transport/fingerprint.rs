//! SSH 主机密钥指纹
//!
//! 支持的写法：
//! - `SHA256:<base64>`（OpenSSH 默认输出）
//! - 不带前缀的 SHA-256 base64
//! - 冒号分隔的 MD5 十六进制 (`aa:bb:...`，可带 `MD5:` 前缀)
//!
//! 前面可以带密钥类型和位数，例如 `ssh-rsa 2048 aa:bb:...`，只取最后一段。

use base64::{Engine as _, engine::general_purpose};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostKeyFingerprint {
    Md5([u8; 16]),
    Sha256([u8; 32]),
}

impl HostKeyFingerprint {
    /// 对应的 ssh2 哈希类型
    pub fn hash_type(&self) -> ssh2::HashType {
        match self {
            HostKeyFingerprint::Md5(_) => ssh2::HashType::Md5,
            HostKeyFingerprint::Sha256(_) => ssh2::HashType::Sha256,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            HostKeyFingerprint::Md5(b) => b,
            HostKeyFingerprint::Sha256(b) => b,
        }
    }

    /// 与服务器密钥哈希比较
    pub fn matches(&self, actual: &[u8]) -> bool {
        self.as_bytes() == actual
    }

    /// 以相同格式展示服务器返回的哈希
    pub fn describe(&self, actual: &[u8]) -> String {
        match self {
            HostKeyFingerprint::Md5(_) => format_md5(actual),
            HostKeyFingerprint::Sha256(_) => format_sha256(actual),
        }
    }

    /// 校验已完成握手的 SSH 会话
    pub fn verify(&self, session: &ssh2::Session) -> Result<(), String> {
        let actual = session
            .host_key_hash(self.hash_type())
            .ok_or_else(|| "server host key hash unavailable".to_string())?;

        if self.matches(actual) {
            Ok(())
        } else {
            Err(format!(
                "host key mismatch: expected {}, got {}",
                self,
                self.describe(actual)
            ))
        }
    }
}

impl FromStr for HostKeyFingerprint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s
            .split_whitespace()
            .last()
            .ok_or_else(|| "empty SSH host key fingerprint".to_string())?;

        if let Some(rest) = strip_prefix_ignore_case(token, "SHA256:") {
            return parse_sha256(rest)
                .map(HostKeyFingerprint::Sha256)
                .ok_or_else(|| format!("invalid SHA256 fingerprint: {}", token));
        }

        let md5_part = strip_prefix_ignore_case(token, "MD5:").unwrap_or(token);
        if let Some(bytes) = parse_md5(md5_part) {
            return Ok(HostKeyFingerprint::Md5(bytes));
        }

        parse_sha256(token)
            .map(HostKeyFingerprint::Sha256)
            .ok_or_else(|| format!("unrecognized SSH host key fingerprint: {}", token))
    }
}

impl fmt::Display for HostKeyFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostKeyFingerprint::Md5(b) => f.write_str(&format_md5(b)),
            HostKeyFingerprint::Sha256(b) => f.write_str(&format_sha256(b)),
        }
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &s[prefix.len()..])
}

fn parse_md5(s: &str) -> Option<[u8; 16]> {
    let mut out = [0u8; 16];
    let mut parts = s.split(':');
    for byte in &mut out {
        let part = parts.next()?;
        if part.len() != 2 {
            return None;
        }
        *byte = u8::from_str_radix(part, 16).ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(out)
}

fn parse_sha256(s: &str) -> Option<[u8; 32]> {
    let decoded = general_purpose::STANDARD_NO_PAD
        .decode(s.trim_end_matches('='))
        .ok()?;
    decoded.try_into().ok()
}

fn format_md5(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

fn format_sha256(bytes: &[u8]) -> String {
    format!("SHA256:{}", general_purpose::STANDARD_NO_PAD.encode(bytes))
}
