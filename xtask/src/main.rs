use anyhow::Result;
use clap::{Parser, Subcommand};
use xshell::{Shell, cmd};

#[derive(Parser)]
#[command(name = "xtask", about = "ftpsend 开发任务自动化")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 构建 CLI (release)
    Build,
    /// 以指定日志级别运行上传 (开发模式)
    Dev {
        /// 日志级别 (debug, info, warn, error)
        #[arg(short, long, default_value = "debug")]
        log_level: String,
        /// 配置文件 (不指定则交互式输入)
        #[arg(short, long)]
        config: Option<String>,
    },
    /// 安装到 /usr/local/bin
    Install,
    /// 卸载
    Uninstall,
    /// 打包发布 (tar.gz)
    Dist,
    /// 运行测试
    Test,
    /// 运行测试并生成覆盖率报告
    Coverage,
    /// 清理构建产物
    Clean,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;

    // 确保在项目根目录执行
    let project_root = std::env::var("CARGO_MANIFEST_DIR")
        .map(std::path::PathBuf::from)
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .map_or_else(std::env::current_dir, Ok)?;
    sh.change_dir(&project_root);

    match cli.command {
        Commands::Build => build(&sh)?,
        Commands::Dev { log_level, config } => dev(&sh, &log_level, config)?,
        Commands::Install => install(&sh)?,
        Commands::Uninstall => uninstall(&sh)?,
        Commands::Dist => dist(&sh)?,
        Commands::Test => test(&sh)?,
        Commands::Coverage => coverage(&sh)?,
        Commands::Clean => clean(&sh)?,
    }

    Ok(())
}

fn build(sh: &Shell) -> Result<()> {
    println!("🔨 构建 ftpsend...");
    cmd!(sh, "cargo build --release -p ftpsend-cli").run()?;
    println!("✅ 构建完成");
    Ok(())
}

fn dev(sh: &Shell, log_level: &str, config: Option<String>) -> Result<()> {
    println!("🚀 开发模式上传 (日志级别: {})...", log_level);

    let rust_log = format!("{level},ftpsend_core={level}", level = log_level);
    let _env = sh.push_env("RUST_LOG", rust_log);

    match config {
        Some(config) => cmd!(sh, "cargo run -p ftpsend-cli -- upload --config {config}").run()?,
        None => cmd!(sh, "cargo run -p ftpsend-cli -- upload").run()?,
    }
    Ok(())
}

fn install(sh: &Shell) -> Result<()> {
    println!("📦 安装 ftpsend...");

    build(sh)?;

    println!("📋 复制二进制文件...");
    cmd!(sh, "sudo cp target/release/ftpsend /usr/local/bin/").run()?;

    println!("✅ 安装完成");
    println!("   使用 'ftpsend --help' 查看命令");
    Ok(())
}

fn uninstall(sh: &Shell) -> Result<()> {
    println!("🗑️  卸载 ftpsend...");
    let _ = cmd!(sh, "sudo rm /usr/local/bin/ftpsend").run();
    println!("✅ 卸载完成");
    Ok(())
}

fn dist(sh: &Shell) -> Result<()> {
    println!("📦 打包发布...");

    build(sh)?;

    let version = env!("CARGO_PKG_VERSION");
    let dist_name = format!("ftpsend-{}-linux-x86_64", version);

    cmd!(sh, "mkdir -p dist/{dist_name}").run()?;
    cmd!(sh, "cp target/release/ftpsend dist/{dist_name}/").run()?;

    sh.change_dir("dist");
    cmd!(sh, "tar -czvf {dist_name}.tar.gz {dist_name}").run()?;

    println!("✅ 打包完成: dist/{}.tar.gz", dist_name);
    Ok(())
}

fn test(sh: &Shell) -> Result<()> {
    println!("🧪 运行测试...");
    cmd!(sh, "cargo test --workspace").run()?;
    println!("✅ 测试完成");
    Ok(())
}

fn coverage(sh: &Shell) -> Result<()> {
    println!("📊 运行测试覆盖率分析...");

    // 检查 cargo-tarpaulin 是否安装
    if cmd!(sh, "cargo tarpaulin --version").run().is_err() {
        println!("📦 安装 cargo-tarpaulin...");
        cmd!(sh, "cargo install cargo-tarpaulin").run()?;
    }

    println!("🔍 分析中...");
    cmd!(
        sh,
        "cargo tarpaulin --packages ftpsend-core --out Html --output-dir target/coverage"
    )
    .run()?;

    println!("✅ 覆盖率报告已生成");
    println!("   HTML 报告: target/coverage/tarpaulin-report.html");
    Ok(())
}

fn clean(sh: &Shell) -> Result<()> {
    println!("🧹 清理构建产物...");
    cmd!(sh, "cargo clean").run()?;
    cmd!(sh, "rm -rf dist").run()?;
    println!("✅ 清理完成");
    Ok(())
}
