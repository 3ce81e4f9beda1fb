//! 比对两份结果文件
//!
//! 用法: `compare_results <first.json> <second.json>`
//!
//! 两份结果完全一致时退出码为 0，否则为 1。

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use death_finder::services::{compare, load_result_set};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [first_path, second_path] = args.as_slice() else {
        bail!("用法: compare_results <first.json> <second.json>");
    };
    let (first_path, second_path) = (PathBuf::from(first_path), PathBuf::from(second_path));

    let first = load_result_set(&first_path).await?;
    let second = load_result_set(&second_path).await?;
    let comparison = compare(&first, &second);

    for mismatch in &comparison.mismatches {
        warn!(
            "❌ 第 {} 条不一致: {:?} vs {:?}",
            mismatch.index, mismatch.first, mismatch.second
        );
    }
    if comparison.size_mismatch() {
        warn!(
            "⚠️ 条数不同: {} 有 {} 条, {} 有 {} 条",
            first_path.display(),
            comparison.first_len,
            second_path.display(),
            comparison.second_len
        );
    }

    if comparison.is_identical() {
        info!("✅ 两份结果一致 ({} 条)", comparison.first_len);
        Ok(ExitCode::SUCCESS)
    } else {
        info!("📊 共 {} 条不一致", comparison.mismatches.len());
        Ok(ExitCode::FAILURE)
    }
}
