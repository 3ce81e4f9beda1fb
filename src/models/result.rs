use serde::{Deserialize, Serialize};

use crate::error::FormError;

/// 一个样本的两项结果，缺失时为 `None`（序列化为 `null`）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultPair(pub Option<f64>, pub Option<f64>);

impl ResultPair {
    /// 无效样本对应的结果
    pub fn absent() -> Self {
        ResultPair(None, None)
    }

    pub fn primary(&self) -> Option<f64> {
        self.0
    }

    pub fn secondary(&self) -> Option<f64> {
        self.1
    }

    pub fn is_absent(&self) -> bool {
        self.0.is_none() && self.1.is_none()
    }
}

/// 有序结果集，与输入样本一一对应
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet(Vec<ResultPair>);

impl ResultSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn push(&mut self, pair: ResultPair) {
        self.0.push(pair);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ResultPair> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResultPair> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[ResultPair] {
        &self.0
    }
}

impl From<Vec<ResultPair>> for ResultSet {
    fn from(pairs: Vec<ResultPair>) -> Self {
        Self(pairs)
    }
}

/// 把页面上显示的分数文本转换为数值
///
/// 去掉百分号、小于号和首尾空白；空文本视为缺失，其余无法解析的文本报错。
///
/// ```
/// use death_finder::models::parse_score;
/// assert_eq!(parse_score("< 5%").unwrap(), Some(5.0));
/// assert_eq!(parse_score("").unwrap(), None);
/// ```
pub fn parse_score(text: &str) -> Result<Option<f64>, FormError> {
    let cleaned = text.replace(['%', '<'], "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Ok(None);
    }
    cleaned
        .parse::<f64>()
        .map(Some)
        .map_err(|_| FormError::UnreadableResult {
            text: text.to_string(),
        })
}
