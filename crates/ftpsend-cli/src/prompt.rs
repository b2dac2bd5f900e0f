//! 交互式输入
//!
//! 选择读取方式的状态机: AwaitChoice -> Accepted | Rejected -> AwaitChoice
//! 空输入或 Y 表示读取配置文件，N 表示手动输入，其他输入重新提示。

use ftpsend_core::{TransferSettings, parse_port};
use std::io::{self, BufRead, Write};

/// 设置来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    SettingsFile,
    Manual,
}

/// 提示状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptState {
    AwaitChoice,
    Accepted(Choice),
    Rejected,
}

/// 根据一行输入决定下一个状态
pub fn classify(input: &str) -> PromptState {
    match input.trim().to_uppercase().as_str() {
        "" | "Y" => PromptState::Accepted(Choice::SettingsFile),
        "N" => PromptState::Accepted(Choice::Manual),
        _ => PromptState::Rejected,
    }
}

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// 询问设置来源，直到得到有效回答
    pub fn ask_choice(&mut self) -> io::Result<Choice> {
        let mut state = PromptState::AwaitChoice;
        loop {
            state = match state {
                PromptState::AwaitChoice => {
                    let answer = self.ask(
                        "Do you want to load the file and FTP information from the settings file? Y/N (Default is Y)",
                    )?;
                    classify(&answer)
                }
                PromptState::Rejected => {
                    writeln!(self.output, "Please answer Y or N.")?;
                    PromptState::AwaitChoice
                }
                PromptState::Accepted(choice) => return Ok(choice),
            };
        }
    }

    /// 逐项收集上传设置
    pub fn collect_settings(&mut self) -> io::Result<TransferSettings> {
        writeln!(self.output)?;

        let local_file_name = self.ask(
            "Enter the local filename (NOT INCLUDING THE DIRECTORY PATH) for the file you wish to upload:",
        )?;
        let local_file_directory = self.ask(
            "Enter the local directory (NOT INCLUDING THE FILENAME) for the file you wish to upload:",
        )?;
        let destination_host = self.ask("Enter the host address for the destination site:")?;
        let destination_directory = self.ask("Enter the file directory for the destination site:")?;
        let user_name = self.ask("Enter the user name for the destination site:")?;
        let password = self.ask_raw("Enter the password for the destination site:")?;
        let port = parse_port(&self.ask("(OPTIONAL) Enter the port for the destination site:")?);

        let secure = self.ask("Use SFTP (SSH) instead of plain FTP? y/N")?;
        let use_secure_transport = matches!(secure.to_lowercase().as_str(), "y" | "yes");
        let ssh_host_key_fingerprint = if use_secure_transport {
            self.ask("Enter the server SSH host key fingerprint (e.g. SHA256:...):")?
        } else {
            String::new()
        };

        Ok(TransferSettings {
            local_file_name,
            local_file_directory,
            destination_host,
            destination_directory,
            user_name,
            password,
            port,
            use_secure_transport,
            ssh_host_key_fingerprint,
            timeout_secs: None,
        })
    }

    /// 提问并返回去除首尾空白的回答
    fn ask(&mut self, question: &str) -> io::Result<String> {
        Ok(self.ask_raw(question)?.trim().to_string())
    }

    /// 提问并返回只去掉换行符的回答
    fn ask_raw(&mut self, question: &str) -> io::Result<String> {
        writeln!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before all settings were entered",
            ));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(""), PromptState::Accepted(Choice::SettingsFile));
        assert_eq!(classify(" y "), PromptState::Accepted(Choice::SettingsFile));
        assert_eq!(classify("n"), PromptState::Accepted(Choice::Manual));
        assert_eq!(classify("maybe"), PromptState::Rejected);
    }

    #[test]
    fn test_choice_reprompts_until_valid() {
        let mut p = prompter("what\nx\nN\n");
        assert_eq!(p.ask_choice().unwrap(), Choice::Manual);

        let output = String::from_utf8(p.output).unwrap();
        assert_eq!(output.matches("Please answer Y or N.").count(), 2);
    }

    #[test]
    fn test_choice_default_is_settings_file() {
        let mut p = prompter("\n");
        assert_eq!(p.ask_choice().unwrap(), Choice::SettingsFile);
    }

    #[test]
    fn test_choice_eof() {
        let mut p = prompter("");
        let err = p.ask_choice().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_collect_ftp_settings() {
        let mut p = prompter("report.csv\nC:\\data\nftp://example.com/\nuploads\nbob\n pw \nabc\n\n");
        let settings = p.collect_settings().unwrap();

        assert_eq!(settings.local_file_name, "report.csv");
        assert_eq!(settings.local_file_directory, "C:\\data");
        assert_eq!(settings.destination_host, "ftp://example.com/");
        assert_eq!(settings.destination_directory, "uploads");
        assert_eq!(settings.user_name, "bob");
        // 密码保留空白
        assert_eq!(settings.password, " pw ");
        // 无法解析的端口视为未设置
        assert_eq!(settings.port, None);
        assert!(!settings.use_secure_transport);
        assert!(settings.ssh_host_key_fingerprint.is_empty());
    }

    #[test]
    fn test_collect_sftp_settings() {
        let mut p = prompter("a.txt\n/tmp\nhost\n\nbob\npw\n2222\ny\nSHA256:abc\n");
        let settings = p.collect_settings().unwrap();

        assert_eq!(settings.port, Some(2222));
        assert!(settings.use_secure_transport);
        assert_eq!(settings.ssh_host_key_fingerprint, "SHA256:abc");
    }
}
