//! ftpsend CLI
//!
//! 命令行客户端：读取设置（配置文件或交互输入），上传单个文件。

mod prompt;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ftpsend_core::workflow::uploader::remote_path;
use ftpsend_core::{
    ConnectionParams, LogLevel, SimpleUploadCallback, TransferSettings, UploadEvent, Uploader,
    normalize,
};
use prompt::{Choice, Prompter};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ftpsend", version, about = "通过 FTP / SFTP 上传单个文件")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 上传文件
    Upload {
        /// 配置文件路径 (默认: ./appsettings.json 或 ~/.config/ftpsend/settings.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// 交互式输入全部设置
        #[arg(short, long, conflicts_with = "config")]
        interactive: bool,
    },
    /// 显示规范化后的设置（不连接）
    Show {
        /// 配置文件路径
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 桥接 log crate（ftpsend-core 使用）到 tracing
    let _ = tracing_log::LogTracer::init();

    // 初始化日志
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ftpsend_core=debug")),
        )
        .with_writer(io::stderr)
        .try_init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Upload {
            config,
            interactive,
        } => {
            let settings = obtain_settings(config, interactive)?;
            if !upload(settings).await? {
                std::process::exit(1);
            }
        }
        Commands::Show { config } => {
            let mut settings = load_settings(config)?;
            normalize::normalize(&mut settings)?;
            let params = ConnectionParams::from_settings(&settings);
            println!("{:#?}", settings);
            println!("目标: {}", params.remote_url(&remote_path(&settings)));
        }
    }

    Ok(())
}

fn load_settings(config: Option<PathBuf>) -> Result<TransferSettings> {
    let settings = match config {
        Some(path) => TransferSettings::load_from(&path)?,
        None => TransferSettings::load()?,
    };
    Ok(settings)
}

/// 按命令行参数决定设置来源；都未指定时交互询问
fn obtain_settings(config: Option<PathBuf>, interactive: bool) -> Result<TransferSettings> {
    if config.is_some() {
        return load_settings(config);
    }

    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());

    let choice = if interactive {
        Choice::Manual
    } else {
        prompter.ask_choice().context("读取输入失败")?
    };

    match choice {
        Choice::SettingsFile => load_settings(None),
        Choice::Manual => prompter.collect_settings().context("读取输入失败"),
    }
}

/// 执行一次上传，返回是否成功
async fn upload(mut settings: TransferSettings) -> Result<bool> {
    println!("📤 上传文件: {}", settings.local_file_name);

    let (callback, mut rx) = SimpleUploadCallback::new();
    let handle =
        tokio::task::spawn_blocking(move || Uploader::network().run(&mut settings, &callback));

    // 回调在上传结束时被释放，通道随之关闭
    while let Some(event) = rx.recv().await {
        report(&event);
    }

    let outcome = handle.await.context("上传任务异常退出")?;
    if outcome.is_success() {
        println!("✅ {}", outcome);
    } else {
        eprintln!("❌ {}", outcome);
    }
    Ok(outcome.is_success())
}

fn report(event: &UploadEvent) {
    let line = format_event(event);
    match event.level {
        LogLevel::Error => tracing::error!(stage = %event.stage, "{}", line),
        LogLevel::Warn => tracing::warn!(stage = %event.stage, "{}", line),
        LogLevel::Info => tracing::info!(stage = %event.stage, "{}", line),
        LogLevel::Debug => tracing::debug!(stage = %event.stage, "{}", line),
    }
}

/// 事件行：级别图标 + 消息
fn format_event(event: &UploadEvent) -> String {
    format!("{} {}", event.level.icon(), event.message)
}
