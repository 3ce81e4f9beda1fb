//! CSV 读取
//!
//! 读出表头和按列名索引的行；不做任何业务校验

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::{ExtractError, PathError};

/// 一行数据（列名 → 原始文本）
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    line: usize,
    cells: HashMap<String, String>,
}

impl CsvRow {
    pub fn new(line: usize, cells: HashMap<String, String>) -> Self {
        Self { line, cells }
    }

    /// 在文件中的行号（表头为第 1 行）
    pub fn line(&self) -> usize {
        self.line
    }

    /// 读取某列原始文本，缺失时返回空串
    pub fn get(&self, column: &str) -> &str {
        self.cells.get(column).map(String::as_str).unwrap_or("")
    }
}

/// 整张表
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<CsvRow>,
}

/// 校验输入路径：扩展名为 .csv 且文件存在
pub fn validate_csv_path(path: &Path) -> Result<(), PathError> {
    if path.extension().and_then(|ext| ext.to_str()) != Some("csv") {
        return Err(PathError::WrongExtension {
            path: path.to_path_buf(),
            expected: "csv",
        });
    }
    if !path.is_file() {
        return Err(PathError::NotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// 读取 CSV 文件
pub async fn read_csv(path: &Path) -> Result<CsvTable, ExtractError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| ExtractError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
    parse_csv(&content, path)
}

/// 解析 CSV 文本
///
/// 支持 UTF-8 BOM、CRLF 和双引号包裹的字段（字段内可含逗号和换行）；空行会被跳过。
/// 少于表头的行，缺失的列按空串处理。
pub fn parse_csv(content: &str, path: &Path) -> Result<CsvTable, ExtractError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut records = split_records(content).into_iter();

    let headers: Vec<String> = match records.next() {
        Some((_, fields)) => fields.into_iter().map(|h| h.trim().to_string()).collect(),
        None => {
            return Err(ExtractError::EmptyFile {
                path: PathBuf::from(path),
            })
        }
    };

    let mut rows = Vec::new();
    for (line, values) in records {
        if values.len() != headers.len() {
            debug!(
                "第 {} 行有 {} 列，表头有 {} 列",
                line,
                values.len(),
                headers.len()
            );
        }
        let cells = headers
            .iter()
            .cloned()
            .zip(values.into_iter().chain(std::iter::repeat(String::new())))
            .collect();
        rows.push(CsvRow::new(line, cells));
    }

    Ok(CsvTable { headers, rows })
}

/// 把整个文本切分为记录：(起始行号, 字段)
///
/// 引号状态跨行保持，引号内的换行属于字段内容
fn split_records(content: &str) -> Vec<(usize, Vec<String>)> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut start_line = 1;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {}
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.is_empty() => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            '\n' if in_quotes => {
                current.push('\n');
                line += 1;
            }
            '\n' => {
                fields.push(std::mem::take(&mut current));
                push_record(&mut records, start_line, std::mem::take(&mut fields));
                line += 1;
                start_line = line;
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() || !fields.is_empty() {
        fields.push(current);
        push_record(&mut records, start_line, fields);
    }
    records
}

/// 空行不算记录
fn push_record(records: &mut Vec<(usize, Vec<String>)>, line: usize, fields: Vec<String>) {
    let blank = fields.len() == 1 && fields[0].trim().is_empty();
    if !blank {
        records.push((line, fields));
    }
}
