use std::fmt;

/// 二值控件取值，页面上对应 `value="1"` / `value="0"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToggleValue {
    On,
    Off,
}

impl ToggleValue {
    pub fn from_bool(on: bool) -> Self {
        if on {
            ToggleValue::On
        } else {
            ToggleValue::Off
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ToggleValue::On => "1",
            ToggleValue::Off => "0",
        }
    }
}

impl fmt::Display for ToggleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一行表格数据转换后的样本
///
/// `valid` 只在抽取时计算一次，之后只读
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    index: usize,
    valid: bool,
    inputs: Vec<(String, String)>,
    toggles: Vec<(String, ToggleValue)>,
}

impl Sample {
    pub(crate) fn new(
        index: usize,
        valid: bool,
        inputs: Vec<(String, String)>,
        toggles: Vec<(String, ToggleValue)>,
    ) -> Self {
        Self {
            index,
            valid,
            inputs,
            toggles,
        }
    }

    /// 在输入表中的位置（从 0 开始，不含表头）
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// 输入框取值，按计算器定义的顺序
    pub fn inputs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inputs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// 二值控件取值，按计算器定义的顺序
    pub fn toggles(&self) -> impl Iterator<Item = (&str, ToggleValue)> {
        self.toggles.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn input(&self, field: &str) -> Option<&str> {
        self.inputs().find(|(k, _)| *k == field).map(|(_, v)| v)
    }

    pub fn toggle(&self, field: &str) -> Option<ToggleValue> {
        self.toggles().find(|(k, _)| *k == field).map(|(_, v)| v)
    }
}
