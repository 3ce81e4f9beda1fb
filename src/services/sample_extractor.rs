//! 样本抽取服务 - 业务能力层
//!
//! 把 CSV 行转换为带校验标记的 `Sample`。行级问题只会让样本被标记为无效，
//! 不会向外抛出；被标记的行仍然保留，保证输出与输入按下标对齐。

use std::path::Path;

use tracing::{debug, info};

use crate::error::{AppResult, ExtractError};
use crate::models::{
    read_csv, validate_csv_path, Calculator, CsvRow, CsvTable, Sample, ToggleValue,
    ValidationRule,
};

/// 样本抽取服务
pub struct SampleExtractor<'a> {
    calculator: &'a Calculator,
    presence_rules: Vec<ValidationRule>,
    range_rules: Vec<ValidationRule>,
}

impl<'a> SampleExtractor<'a> {
    /// 按计算器定义创建抽取服务（规则只构建一次）
    pub fn new(calculator: &'a Calculator) -> Self {
        Self {
            calculator,
            presence_rules: calculator.presence_rules(),
            range_rules: calculator.range_rules(),
        }
    }

    /// 校验路径、读取文件并抽取全部样本
    pub async fn extract(&self, path: &Path) -> AppResult<Vec<Sample>> {
        validate_csv_path(path)?;
        let table = read_csv(path).await?;
        let samples = self.extract_table(&table, path)?;

        let valid = samples.iter().filter(|s| s.is_valid()).count();
        info!(
            "📄 读取 {} 行数据: 有效 {}, 无效 {}",
            samples.len(),
            valid,
            samples.len() - valid
        );
        Ok(samples)
    }

    /// 从已读取的表格抽取样本
    pub fn extract_table(&self, table: &CsvTable, path: &Path) -> Result<Vec<Sample>, ExtractError> {
        for column in self.calculator.required_columns() {
            if !table.headers.iter().any(|h| h == column) {
                return Err(ExtractError::MissingColumn {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                });
            }
        }

        Ok(table
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| self.to_sample(index, row))
            .collect())
    }

    /// 必填检查在前；任一必填为空时不再计算范围规则
    fn is_valid(&self, row: &CsvRow) -> bool {
        let failed = self
            .presence_rules
            .iter()
            .find(|rule| !rule.check(row))
            .or_else(|| self.range_rules.iter().find(|rule| !rule.check(row)));

        match failed {
            Some(rule) => {
                debug!("第 {} 行无效: {}", row.line(), rule.name());
                false
            }
            None => true,
        }
    }

    fn to_sample(&self, index: usize, row: &CsvRow) -> Sample {
        let valid = self.is_valid(row);

        let inputs = self
            .calculator
            .inputs
            .iter()
            .map(|rule| (rule.field.clone(), row.get(&rule.column).to_string()))
            .collect();

        let toggles = self
            .calculator
            .toggles
            .iter()
            .map(|rule| {
                let on = row.get(&rule.column).to_uppercase() == rule.truth.to_uppercase();
                (rule.field.clone(), ToggleValue::from_bool(on))
            })
            .collect();

        Sample::new(index, valid, inputs, toggles)
    }
}
