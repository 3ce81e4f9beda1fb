//! 计算器定义
//!
//! 每个计算器由一份 TOML 描述：页面地址、缩放、结果选择器，
//! 以及"输入框 / 二值控件 ↔ 表格列"的映射表和数值范围规则。

use std::collections::HashSet;

use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ExtractError};
use crate::models::loaders::{parse_calculator, CsvRow};

/// 内置计算器（名称 → TOML 定义）
static BUILTIN_CALCULATORS: phf::Map<&'static str, &'static str> = phf_map! {
    "framingham" => include_str!("../../calculators/framingham.toml"),
};

/// 数值范围（开区间）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub fn contains(&self, value: f64) -> bool {
        self.min < value && value < self.max
    }
}

/// 输入框映射：页面字段名 ← 表格列（原样复制文本）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRule {
    pub field: String,
    pub column: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub range: Option<NumericRange>,
}

/// 二值控件映射：列值（忽略大小写）等于 `truth` 时取 "1"，否则取 "0"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleRule {
    pub field: String,
    pub column: String,
    pub truth: String,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

/// 计算器定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculator {
    pub name: String,
    pub url: String,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    /// 结果计算中显示的加载指示器
    pub loading_indicator: String,
    pub primary_result: String,
    pub secondary_result: String,
    pub inputs: Vec<InputRule>,
    #[serde(default)]
    pub toggles: Vec<ToggleRule>,
}

fn default_zoom() -> f64 {
    1.0
}

/// 针对原始行的校验规则
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationRule {
    /// 必填列不能为空
    Present { column: String },
    /// 列值必须是落在范围内的数字
    InRange { column: String, range: NumericRange },
}

impl ValidationRule {
    /// 规则名（日志用）
    pub fn name(&self) -> String {
        match self {
            ValidationRule::Present { column } => format!("{} 必填", column),
            ValidationRule::InRange { column, range } => {
                format!("{} < {} < {}", range.min, column, range.max)
            }
        }
    }

    /// 对一行求值
    ///
    /// 范围规则遇到空值时视为通过：空值是否允许由 `Present` 规则决定
    pub fn check(&self, row: &CsvRow) -> bool {
        match self {
            ValidationRule::Present { column } => !row.get(column).is_empty(),
            ValidationRule::InRange { column, range } => {
                let raw = row.get(column);
                if raw.is_empty() {
                    return true;
                }
                raw.trim()
                    .parse::<f64>()
                    .map(|value| range.contains(value))
                    .unwrap_or(false)
            }
        }
    }
}

impl Calculator {
    /// 所有内置计算器名称
    pub fn available() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = BUILTIN_CALCULATORS.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// 按名称加载内置计算器
    pub fn builtin(name: &str) -> AppResult<Self> {
        let key = name.trim().to_lowercase();
        let source = BUILTIN_CALCULATORS
            .get(key.as_str())
            .ok_or_else(|| AppError::unsupported_calculator(name, &Self::available()))?;
        Ok(parse_calculator(source, &format!("内置:{}", key))?)
    }

    /// 表格中必须存在的列
    pub fn required_columns(&self) -> Vec<&str> {
        self.inputs
            .iter()
            .map(|rule| rule.column.as_str())
            .chain(self.toggles.iter().map(|rule| rule.column.as_str()))
            .collect()
    }

    /// 必填规则（在前）
    pub fn presence_rules(&self) -> Vec<ValidationRule> {
        self.inputs
            .iter()
            .filter(|rule| rule.required)
            .map(|rule| &rule.column)
            .chain(
                self.toggles
                    .iter()
                    .filter(|rule| rule.required)
                    .map(|rule| &rule.column),
            )
            .map(|column| ValidationRule::Present {
                column: column.clone(),
            })
            .collect()
    }

    /// 数值范围规则（在后）
    pub fn range_rules(&self) -> Vec<ValidationRule> {
        self.inputs
            .iter()
            .filter_map(|rule| {
                rule.range.map(|range| ValidationRule::InRange {
                    column: rule.column.clone(),
                    range,
                })
            })
            .collect()
    }

    /// 检查定义本身是否自洽
    pub fn validate(&self, origin: &str) -> Result<(), ExtractError> {
        let invalid = |reason: String| ExtractError::InvalidCalculator {
            origin: origin.to_string(),
            reason,
        };

        if self.inputs.is_empty() {
            return Err(invalid("至少需要一个输入字段".to_string()));
        }
        if self.zoom.is_nan() || self.zoom <= 0.0 {
            return Err(invalid(format!("缩放比例必须为正数: {}", self.zoom)));
        }

        let mut seen = HashSet::new();
        let fields = self
            .inputs
            .iter()
            .map(|rule| &rule.field)
            .chain(self.toggles.iter().map(|rule| &rule.field));
        for field in fields {
            if !seen.insert(field) {
                return Err(invalid(format!("字段重复: {}", field)));
            }
        }

        for rule in &self.inputs {
            if let Some(range) = rule.range {
                if range.min >= range.max {
                    return Err(invalid(format!(
                        "字段 {} 的范围无效: {} >= {}",
                        rule.field, range.min, range.max
                    )));
                }
            }
        }
        Ok(())
    }
}
