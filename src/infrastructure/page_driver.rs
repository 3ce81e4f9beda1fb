//! 页面驱动抽象 - 基础设施层
//!
//! 表单流程只通过 `PageDriver` 与浏览器打交道：导航、缩放、探测元素状态、
//! 清空并输入、激活控件、读取文本、释放会话。有界等待建立在 `probe` 之上。

use std::fmt;
use std::time::Duration;

use anyhow::Result;
use tokio::time::{sleep, Instant};

/// 元素定位方式
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// 按 `name` 属性定位
    Name(String),
    /// CSS 选择器
    Css(String),
}

impl Locator {
    pub fn name(name: impl Into<String>) -> Self {
        Locator::Name(name.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    /// 某个二值控件的具体取值，例如 `input[name='sex'][value='1']`
    pub fn toggle(field: &str, value: &str) -> Self {
        Locator::Css(format!("input[name='{}'][value='{}']", field, value))
    }

    /// 转换为 CSS 选择器
    pub fn to_css(&self) -> String {
        match self {
            Locator::Name(name) => format!("[name='{}']", name),
            Locator::Css(selector) => selector.clone(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Name(name) => write!(f, "name={}", name),
            Locator::Css(selector) => write!(f, "css={}", selector),
        }
    }
}

/// 等待条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    /// 元素存在于 DOM 中
    Present,
    /// 元素存在且可见
    Visible,
    /// 元素不存在或不可见
    Invisible,
}

impl WaitCondition {
    /// 传给页面脚本的模式名
    pub fn as_mode(self) -> &'static str {
        match self {
            WaitCondition::Present => "present",
            WaitCondition::Visible => "visible",
            WaitCondition::Invisible => "invisible",
        }
    }
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WaitCondition::Present => "存在",
            WaitCondition::Visible => "可见",
            WaitCondition::Invisible => "不可见",
        };
        write!(f, "{}", label)
    }
}

/// 页面驱动
///
/// 一个实例对应一个浏览器会话，调用方必须串行使用。
#[allow(async_fn_in_trait)]
pub trait PageDriver {
    /// 导航到指定 URL
    async fn navigate(&self, url: &str) -> Result<()>;

    /// 调整页面缩放，使所有控件都落在视口内
    async fn set_zoom(&self, zoom: f64) -> Result<()>;

    /// 立即检查一次元素是否满足条件
    async fn probe(&self, locator: &Locator, condition: WaitCondition) -> Result<bool>;

    /// 清空输入框并写入文本
    async fn clear_and_type(&self, locator: &Locator, text: &str) -> Result<()>;

    /// 激活（点击）控件
    async fn activate(&self, locator: &Locator) -> Result<()>;

    /// 读取元素的显示文本
    async fn read_text(&self, locator: &Locator) -> Result<String>;

    /// 释放底层会话
    async fn close(&mut self) -> Result<()>;

    /// 有界轮询等待
    ///
    /// # 返回
    /// 条件在 `timeout` 内满足返回 `true`，超时返回 `false`；探测本身失败时返回错误
    async fn wait_for(
        &self,
        locator: &Locator,
        condition: WaitCondition,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.probe(locator, condition).await? {
                return Ok(true);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            sleep(poll_interval.min(deadline - now)).await;
        }
    }
}
