//! 上传设置和配置文件读取
//!
//! 设置可以来自 JSON (`appsettings.json`) 或 TOML 文件，字段位于
//! `ftpDefaults` 段下。旧版工具的字段名作为别名同样可以识别。

use crate::error::{Result, UploadError};
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// 当前目录下的默认配置文件名
pub const APP_SETTINGS_FILE: &str = "appsettings.json";

/// 单次上传的设置
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransferSettings {
    /// 本地文件名（不含目录）
    pub local_file_name: String,
    /// 本地文件所在目录
    pub local_file_directory: String,
    /// 目标主机地址
    #[serde(alias = "destinationFtpSite")]
    pub destination_host: String,
    /// 目标目录，为空表示根目录
    #[serde(alias = "destinationFileDirectory")]
    pub destination_directory: String,
    #[serde(alias = "ftpUserName")]
    pub user_name: String,
    #[serde(alias = "ftpPassword")]
    pub password: String,
    /// 端口，`None` 表示使用协议默认端口
    #[serde(
        alias = "ftpPort",
        deserialize_with = "deserialize_port",
        skip_serializing_if = "Option::is_none"
    )]
    pub port: Option<u16>,
    /// true 使用 SFTP，false 使用 FTP
    #[serde(alias = "ftpIsSSL")]
    pub use_secure_transport: bool,
    /// 服务器 SSH 主机密钥指纹（仅 SFTP）
    #[serde(alias = "ftpSSHKey")]
    pub ssh_host_key_fingerprint: String,
    /// 传输超时（秒），原样传递给传输层
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl fmt::Debug for TransferSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferSettings")
            .field("local_file_name", &self.local_file_name)
            .field("local_file_directory", &self.local_file_directory)
            .field("destination_host", &self.destination_host)
            .field("destination_directory", &self.destination_directory)
            .field("user_name", &self.user_name)
            .field("password", &"***")
            .field("port", &self.port)
            .field("use_secure_transport", &self.use_secure_transport)
            .field("ssh_host_key_fingerprint", &self.ssh_host_key_fingerprint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// 配置文件结构
#[derive(Debug, Deserialize)]
struct SettingsFile {
    #[serde(rename = "ftpDefaults", alias = "ftp_defaults")]
    ftp_defaults: TransferSettings,
}

impl TransferSettings {
    /// 从指定文件加载设置
    ///
    /// `.json` 后缀按 JSON 解析，其余按 TOML 解析。
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            UploadError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let file: SettingsFile = if is_json {
            serde_json::from_str(&content).map_err(|e| {
                UploadError::Config(format!("failed to parse {}: {}", path.display(), e))
            })?
        } else {
            toml::from_str(&content).map_err(|e| {
                UploadError::Config(format!("failed to parse {}: {}", path.display(), e))
            })?
        };

        debug!("Loaded settings from {:?}", path);
        Ok(file.ftp_defaults)
    }

    /// 从默认位置加载设置
    ///
    /// 依次查找 `./appsettings.json` 和 `<config_dir>/ftpsend/settings.toml`。
    pub fn load() -> Result<Self> {
        let candidates = default_paths();
        match candidates.iter().find(|p| p.exists()) {
            Some(path) => Self::load_from(path),
            None => Err(UploadError::Config(format!(
                "no settings file found (looked for {})",
                candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

/// 默认配置文件候选路径
pub fn default_paths() -> Vec<PathBuf> {
    let user_config = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ftpsend")
        .join("settings.toml");
    vec![PathBuf::from(APP_SETTINGS_FILE), user_config]
}

/// 解析可选端口
///
/// 空白、无法解析或超出范围的值都视为未设置。
pub fn parse_port(input: &str) -> Option<u16> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

/// 端口既可以写成数字也可以写成字符串
fn deserialize_port<'de, D>(deserializer: D) -> std::result::Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortValue {
        Number(i64),
        Text(String),
    }

    Ok(match Option::<PortValue>::deserialize(deserializer)? {
        Some(PortValue::Number(n)) => u16::try_from(n).ok(),
        Some(PortValue::Text(s)) => parse_port(&s),
        None => None,
    })
}
