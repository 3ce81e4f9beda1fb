//! 样本处理上下文
//!
//! 封装"我正在处理第几个样本"这一信息

use std::fmt::Display;

/// 样本处理上下文（仅用于日志）
#[derive(Debug, Clone, Copy)]
pub struct SampleCtx {
    /// 样本在输入中的位置（从0开始）
    pub position: usize,

    /// 样本总数
    pub total: usize,
}

impl SampleCtx {
    pub fn new(position: usize, total: usize) -> Self {
        Self { position, total }
    }
}

impl Display for SampleCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[样本 {}/{}]", self.position + 1, self.total)
    }
}
