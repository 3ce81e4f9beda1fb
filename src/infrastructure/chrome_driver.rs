//! Chromium 页面驱动 - 基础设施层
//!
//! `PageDriver` 的生产实现：所有 DOM 操作都通过 `JsExecutor` 以脚本形式执行，
//! 文本输入走真实的键盘事件，保证页面上的框架能感知到值的变化。

use anyhow::{anyhow, bail, Result};
use tracing::{debug, warn};

use crate::browser::BrowserSession;
use crate::infrastructure::{JsExecutor, Locator, PageDriver, WaitCondition};

/// 元素状态探测脚本
///
/// 可见性与 Selenium 的判断方式保持一致：display / visibility / 尺寸
const PROBE_BODY: &str = r#"
    const mode = __MODE__;
    if (!el) return mode === 'invisible';
    if (mode === 'present') return true;
    const style = window.getComputedStyle(el);
    const rect = el.getBoundingClientRect();
    const shown = style.display !== 'none'
        && style.visibility !== 'hidden'
        && (rect.width > 0 || rect.height > 0);
    return mode === 'visible' ? shown : !shown;
"#;

/// 基于 Chromium 的页面驱动
pub struct ChromeDriver {
    executor: JsExecutor,
    session: Option<BrowserSession>,
}

impl ChromeDriver {
    /// 接管一个浏览器会话
    pub fn new(session: BrowserSession) -> Self {
        let executor = JsExecutor::new(session.page().clone());
        Self {
            executor,
            session: Some(session),
        }
    }
}

impl PageDriver for ChromeDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        debug!("导航到: {}", url);
        self.executor.page().goto(url).await?;
        Ok(())
    }

    async fn set_zoom(&self, zoom: f64) -> Result<()> {
        self.executor
            .eval(format!("document.body.style.zoom = '{}'", zoom))
            .await?;
        Ok(())
    }

    async fn probe(&self, locator: &Locator, condition: WaitCondition) -> Result<bool> {
        let body = PROBE_BODY.replace("__MODE__", &serde_json::to_string(condition.as_mode())?);
        self.executor.eval_on(locator, &body).await
    }

    async fn clear_and_type(&self, locator: &Locator, text: &str) -> Result<()> {
        let cleared: bool = self
            .executor
            .eval_on(
                locator,
                r#"
                if (!el) return false;
                el.focus();
                el.value = '';
                el.dispatchEvent(new Event('input', { bubbles: true }));
                return true;
                "#,
            )
            .await?;
        if !cleared {
            bail!("元素不存在: {}", locator);
        }

        let element = self.executor.page().find_element(locator.to_css()).await?;
        element.click().await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn activate(&self, locator: &Locator) -> Result<()> {
        let clicked: bool = self
            .executor
            .eval_on(locator, "if (!el) return false; el.click(); return true;")
            .await?;
        if !clicked {
            bail!("元素不存在: {}", locator);
        }
        Ok(())
    }

    async fn read_text(&self, locator: &Locator) -> Result<String> {
        let text: Option<String> = self
            .executor
            .eval_on(locator, "return el ? el.innerText : null;")
            .await?;
        text.ok_or_else(|| anyhow!("元素不存在: {}", locator))
    }

    async fn close(&mut self) -> Result<()> {
        match self.session.take() {
            Some(session) => session.close().await,
            None => {
                warn!("浏览器会话已释放，忽略重复关闭");
                Ok(())
            }
        }
    }
}
