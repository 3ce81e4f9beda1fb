//! 结果写入服务 - 业务能力层
//!
//! 只负责"写 output.json"能力，不关心流程

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::{debug, info};

use crate::error::{AppResult, PathError};
use crate::models::ResultSet;

/// 目标为目录时使用的文件名
pub const DEFAULT_OUTPUT_FILE: &str = "output.json";

/// 结果写入服务
#[derive(Debug, Clone)]
pub struct ResultWriter {
    output_path: PathBuf,
}

impl ResultWriter {
    /// 解析输出目标
    ///
    /// 目录 → `<目录>/output.json`；文件必须以 `.json` 结尾，否则在写入前报错
    pub fn for_target(target: impl AsRef<Path>) -> Result<Self, PathError> {
        let target = target.as_ref();
        let output_path = if target.is_dir() {
            target.join(DEFAULT_OUTPUT_FILE)
        } else if target.extension().and_then(|ext| ext.to_str()) == Some("json") {
            target.to_path_buf()
        } else {
            return Err(PathError::InvalidArgument {
                path: target.to_path_buf(),
                expected: "json",
            });
        };
        debug!("输出文件: {}", output_path.display());
        Ok(Self { output_path })
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// 写入结果集（4 空格缩进）
    pub async fn write(&self, results: &ResultSet) -> AppResult<()> {
        let mut buffer = Vec::new();
        let mut serializer =
            Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
        results.serialize(&mut serializer)?;
        buffer.push(b'\n');

        tokio::fs::write(&self.output_path, buffer)
            .await
            .map_err(|source| PathError::WriteFailed {
                path: self.output_path.clone(),
                source,
            })?;

        info!(
            "💾 已写入 {} 条结果: {}",
            results.len(),
            self.output_path.display()
        );
        Ok(())
    }
}
