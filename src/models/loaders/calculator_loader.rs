use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;

use crate::error::ExtractError;
use crate::models::calculator::Calculator;

/// 解析计算器 TOML 定义并检查是否自洽
pub fn parse_calculator(content: &str, origin: &str) -> Result<Calculator, ExtractError> {
    let calculator: Calculator =
        toml::from_str(content).map_err(|source| ExtractError::CalculatorParseFailed {
            origin: origin.to_string(),
            source,
        })?;
    calculator.validate(origin)?;
    Ok(calculator)
}

/// 从 TOML 文件加载计算器定义
pub async fn load_calculator_file(toml_file_path: &Path) -> Result<Calculator> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let calculator = parse_calculator(&content, &toml_file_path.display().to_string())
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    tracing::info!(
        "已加载计算器定义: {} ({} 个输入, {} 个选项)",
        calculator.name,
        calculator.inputs.len(),
        calculator.toggles.len()
    );
    Ok(calculator)
}
