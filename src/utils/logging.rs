/// 日志工具模块
///
/// 提供日志初始化和运行信息输出的辅助函数
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化日志
///
/// - 级别取自 `RUST_LOG`，未设置时为 `info`（调试模式为 `debug`）
/// - 调试模式下同时写入日志文件
pub fn init(debug: bool, log_file: &Path) -> Result<()> {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if debug {
        init_log_file(log_file)?;
        let file = OpenOptions::new().append(true).open(log_file)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::io::stderr.and(Mutex::new(file)))
            .try_init()
            .map_err(|e| anyhow::anyhow!("日志初始化失败: {}", e))?;
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow::anyhow!("日志初始化失败: {}", e))?;
    }
    Ok(())
}

/// 初始化日志文件（写入带时间的标题）
pub fn init_log_file(log_file_path: &Path) -> Result<()> {
    let log_header = format!(
        "{}\n风险计算日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 风险计算器批量模式");
    info!("🧮 计算器: {}", config.calculator);
    if let Some(input) = &config.input_path {
        info!("📄 输入文件: {}", input.display());
    }
    info!("⏱️ 加载等待: {}s", config.wait_secs);
    if config.debug {
        info!("🔍 调试模式已开启，日志文件: {}", config.log_file.display());
    }
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `computed`: 实际提交计算的样本数
/// - `skipped`: 因无效被跳过的样本数
/// - `output_path`: 结果文件路径
pub fn print_final_stats(computed: usize, skipped: usize, output_path: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 已计算: {}/{}", computed, computed + skipped);
    info!("⏭️ 已跳过: {}", skipped);
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", output_path.display());
}
