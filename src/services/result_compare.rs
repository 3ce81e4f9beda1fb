//! 结果比对服务 - 业务能力层
//!
//! 用于把一次运行的输出与另一份（例如人工录入的）结果逐条比对。
//! 单元格可以是数字、`null`，也可以是页面上抓下来的原始文本（如 `"< 5%"`）。

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::{parse_score, ResultPair, ResultSet};

/// 文件中的原始单元格
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCell {
    Number(f64),
    Text(String),
}

impl RawCell {
    fn normalize(self) -> Result<Option<f64>> {
        match self {
            RawCell::Number(value) => Ok(Some(value)),
            RawCell::Text(text) => Ok(parse_score(&text)?),
        }
    }
}

/// 比对差异
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    pub index: usize,
    pub first: ResultPair,
    pub second: ResultPair,
}

/// 比对结果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Comparison {
    pub mismatches: Vec<Mismatch>,
    pub first_len: usize,
    pub second_len: usize,
}

impl Comparison {
    pub fn size_mismatch(&self) -> bool {
        self.first_len != self.second_len
    }

    pub fn is_identical(&self) -> bool {
        self.mismatches.is_empty() && !self.size_mismatch()
    }
}

/// 从 JSON 文本解析并归一化结果集
pub fn parse_result_set(content: &str) -> Result<ResultSet> {
    let raw: Vec<(Option<RawCell>, Option<RawCell>)> =
        serde_json::from_str(content).context("结果文件格式无效，需要二元数组的数组")?;

    let mut results = ResultSet::with_capacity(raw.len());
    for (index, (first, second)) in raw.into_iter().enumerate() {
        let normalize = |cell: Option<RawCell>| -> Result<Option<f64>> {
            Ok(cell
                .map(RawCell::normalize)
                .transpose()
                .with_context(|| format!("第 {} 条结果无法解析", index))?
                .flatten())
        };
        results.push(ResultPair(normalize(first)?, normalize(second)?));
    }
    Ok(results)
}

/// 读取结果文件
pub async fn load_result_set(path: &Path) -> Result<ResultSet> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取结果文件: {}", path.display()))?;
    parse_result_set(&content).with_context(|| format!("无法解析结果文件: {}", path.display()))
}

/// 逐条比对两份结果（按较短的一份）
pub fn compare(first: &ResultSet, second: &ResultSet) -> Comparison {
    let mismatches = first
        .iter()
        .zip(second.iter())
        .enumerate()
        .filter(|(_, (a, b))| a != b)
        .map(|(index, (a, b))| Mismatch {
            index,
            first: *a,
            second: *b,
        })
        .collect();

    Comparison {
        mismatches,
        first_len: first.len(),
        second_len: second.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_cells() {
        let results = parse_result_set(r#"[[5.0, "12%"], ["< 1%", null], ["", " "]]"#).unwrap();
        assert_eq!(
            results.as_slice(),
            &[
                ResultPair(Some(5.0), Some(12.0)),
                ResultPair(Some(1.0), None),
                ResultPair::absent(),
            ]
        );
    }

    #[test]
    fn test_parse_rejects_bad_shape() {
        assert!(parse_result_set(r#"{"a": 1}"#).is_err());
        assert!(parse_result_set(r#"[["x", 1]]"#).is_err());
    }

    #[test]
    fn test_compare_reports_differences() {
        let first = ResultSet::from(vec![
            ResultPair(Some(5.0), Some(12.0)),
            ResultPair(Some(3.0), None),
            ResultPair::absent(),
        ]);
        let second = ResultSet::from(vec![
            ResultPair(Some(5.0), Some(12.0)),
            ResultPair(Some(4.0), None),
        ]);

        let comparison = compare(&first, &second);
        assert_eq!(comparison.mismatches.len(), 1);
        assert_eq!(comparison.mismatches[0].index, 1);
        assert!(comparison.size_mismatch());
        assert!(!comparison.is_identical());
    }

    #[test]
    fn test_compare_identical() {
        let set = ResultSet::from(vec![ResultPair(Some(1.0), Some(2.0))]);
        assert!(compare(&set, &set.clone()).is_identical());
    }
}
