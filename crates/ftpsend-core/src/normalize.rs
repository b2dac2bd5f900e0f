//! 设置规范化
//!
//! 将用户输入的主机名和路径改写为规范形式，下游逻辑无需再处理原始输入：
//! - 主机：无协议前缀，无结尾 `/`
//! - 远端目录：为空，或形如 `/path/.../`
//! - 本地目录：分隔符统一为 `/`，以 `/` 结尾

use crate::config::TransferSettings;
use crate::error::{Result, UploadError};
use regex::Regex;
use std::sync::LazyLock;

/// 协议前缀：`ftp://`、`sftp://` 或 `ftps://`
static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(ftp|sftp|ftps)://").expect("valid regex"));

/// 规范化目标主机
///
/// 去掉结尾的 `/`，再去掉开头的 `ftp://`、`sftp://` 或 `ftps://`（不区分大小写）。
pub fn normalize_host(settings: &mut TransferSettings) -> Result<()> {
    if settings.destination_host.trim().is_empty() {
        return Err(UploadError::validation("empty host"));
    }

    let host = settings.destination_host.as_str();
    let host = host.trim_end_matches('/');
    let host = SCHEME.replace(host, "");
    settings.destination_host = host.into_owned();
    Ok(())
}

/// 规范化目录路径
///
/// 空白输入原样返回（目录是可选的）。
pub fn normalize_directory(path: &str, is_remote: bool) -> String {
    if path.trim().is_empty() {
        return path.to_string();
    }

    let mut path = path.replace('\\', "/");

    if is_remote {
        path = SCHEME.replace(&path, "").into_owned();
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
    }

    if !path.ends_with('/') {
        path.push('/');
    }
    path
}

/// 规范化本地文件名
///
/// 以 `/` 结尾时，去掉该 `/` 并从其前面最后一个 `/` 处截断：
/// `"file.txt/"` 变成 `""`，`"dir/file.txt/"` 变成 `"dir"`。
/// 结果可能为空，由上传前的校验拒绝。
pub fn normalize_local_file_name(name: &str) -> Result<String> {
    if name.trim().is_empty() {
        return Err(UploadError::validation("empty file name"));
    }

    match name.strip_suffix('/') {
        Some(rest) => Ok(rest.rfind('/').map_or("", |idx| &rest[..idx]).to_string()),
        None => Ok(name.to_string()),
    }
}

/// 按顺序应用全部规范化：主机、目录、文件名
pub fn normalize(settings: &mut TransferSettings) -> Result<()> {
    normalize_host(settings)?;
    settings.destination_directory = normalize_directory(&settings.destination_directory, true);
    settings.local_file_directory = normalize_directory(&settings.local_file_directory, false);
    settings.local_file_name = normalize_local_file_name(&settings.local_file_name)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_settings(host: &str) -> TransferSettings {
        TransferSettings {
            destination_host: host.to_string(),
            ..Default::default()
        }
    }

    fn normalized_host(host: &str) -> String {
        let mut settings = host_settings(host);
        normalize_host(&mut settings).unwrap();
        settings.destination_host
    }

    #[test]
    fn test_host_strips_scheme_and_slash() {
        assert_eq!(normalized_host("sftp://example.com/"), "example.com");
        assert_eq!(normalized_host("ftp://example.com"), "example.com");
        assert_eq!(normalized_host("FTP://example.com/"), "example.com");
        assert_eq!(normalized_host("SFtp://example.com"), "example.com");
        assert_eq!(normalized_host("example.com/"), "example.com");
        assert_eq!(normalized_host("example.com"), "example.com");
    }

    #[test]
    fn test_host_idempotent() {
        let hosts = [
            "sftp://example.com/",
            "ftp://10.0.0.1",
            "Ftp://files.example.org/",
            "example.com/",
            "plain-host",
        ];
        for host in hosts {
            let once = normalized_host(host);
            let twice = normalized_host(&once);
            assert_eq!(once, twice, "host: {}", host);
            assert!(!once.ends_with('/'), "host: {}", host);
            assert!(!once.to_lowercase().starts_with("ftp://"), "host: {}", host);
            assert!(!once.to_lowercase().starts_with("sftp://"), "host: {}", host);
        }
    }

    #[test]
    fn test_host_strips_ftps_and_repeated_slashes() {
        assert_eq!(normalized_host("ftps://example.com/"), "example.com");
        assert_eq!(normalized_host("FTPS://example.com"), "example.com");
        assert_eq!(normalized_host("sftp://example.com//"), "example.com");

        for host in ["sftp://example.com//", "ftps://example.com///"] {
            let once = normalized_host(host);
            assert_eq!(normalized_host(&once), once, "host: {}", host);
        }
    }

    #[test]
    fn test_empty_host() {
        for host in ["", "   "] {
            let mut settings = host_settings(host);
            let err = normalize_host(&mut settings).unwrap_err();
            assert!(matches!(err, UploadError::Validation(ref m) if m == "empty host"));
        }
    }

    #[test]
    fn test_remote_directory() {
        assert_eq!(normalize_directory("uploads", true), "/uploads/");
        assert_eq!(normalize_directory("/uploads", true), "/uploads/");
        assert_eq!(normalize_directory("/uploads/", true), "/uploads/");
        assert_eq!(normalize_directory("a\\b\\c", true), "/a/b/c/");
        assert_eq!(normalize_directory("ftps://in/box", true), "/in/box/");
        assert_eq!(normalize_directory("SFTP://in", true), "/in/");
    }

    #[test]
    fn test_remote_directory_shape() {
        let inputs = ["x", "x/y", "\\x\\y", "/x/", "x\\y/", "ftp://x", "/"];
        for input in inputs {
            let out = normalize_directory(input, true);
            assert!(out.starts_with('/'), "{} -> {}", input, out);
            assert!(out.ends_with('/'), "{} -> {}", input, out);
            assert!(!out.contains('\\'), "{} -> {}", input, out);
        }
    }

    #[test]
    fn test_blank_directory_unchanged() {
        for input in ["", "  ", "\t"] {
            assert_eq!(normalize_directory(input, true), input);
            assert_eq!(normalize_directory(input, false), input);
        }
    }

    #[test]
    fn test_local_directory_keeps_scheme_and_relative() {
        assert_eq!(normalize_directory("C:\\data", false), "C:/data/");
        assert_eq!(normalize_directory("data", false), "data/");
        assert_eq!(normalize_directory("ftp://x", false), "ftp://x/");
    }

    #[test]
    fn test_local_file_name() {
        assert_eq!(normalize_local_file_name("report.csv").unwrap(), "report.csv");
        // 结尾 `/` 会截断整个后缀
        assert_eq!(normalize_local_file_name("file.txt/").unwrap(), "");
        assert_eq!(normalize_local_file_name("dir/file.txt/").unwrap(), "dir");
        assert_eq!(normalize_local_file_name("dir\\file.txt").unwrap(), "dir\\file.txt");
        assert!(normalize_local_file_name("").is_err());
        assert!(normalize_local_file_name("  ").is_err());
    }

    #[test]
    fn test_normalize_all() {
        let mut settings = TransferSettings {
            local_file_name: "report.csv".to_string(),
            local_file_directory: "C:\\data".to_string(),
            destination_host: "sftp://example.com/".to_string(),
            destination_directory: "uploads".to_string(),
            ..Default::default()
        };
        normalize(&mut settings).unwrap();
        assert_eq!(settings.destination_host, "example.com");
        assert_eq!(settings.destination_directory, "/uploads/");
        assert_eq!(settings.local_file_directory, "C:/data/");
        assert_eq!(settings.local_file_name, "report.csv");
    }

    #[test]
    fn test_normalize_stops_at_host() {
        let mut settings = TransferSettings {
            destination_directory: "uploads".to_string(),
            ..Default::default()
        };
        assert!(normalize(&mut settings).is_err());
        // 主机校验失败时目录未被改写
        assert_eq!(settings.destination_directory, "uploads");
    }
}
