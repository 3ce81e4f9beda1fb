//! 二值控件状态缓存
//!
//! 记录本次运行中每个控件最后一次点击的取值。每次运行重新创建，
//! 只由 `FormDriver` 修改，运行结束即丢弃。

use std::collections::HashMap;

use crate::models::ToggleValue;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ToggleState {
    applied: HashMap<String, ToggleValue>,
}

impl ToggleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 最后一次生效的取值
    pub fn last(&self, field: &str) -> Option<ToggleValue> {
        self.applied.get(field).copied()
    }

    /// 页面上的当前值与期望值不同（或尚未点击过）
    pub fn needs_change(&self, field: &str, desired: ToggleValue) -> bool {
        self.last(field) != Some(desired)
    }

    pub fn record(&mut self, field: &str, value: ToggleValue) {
        self.applied.insert(field.to_string(), value);
    }
}
