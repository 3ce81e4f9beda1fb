//! 浏览器会话
//!
//! 负责启动或连接浏览器，并在结束时保证释放

pub mod connection;
pub mod headless;

use anyhow::Result;
use chromiumoxide::{Browser, Page};
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub use connection::connect_to_browser_and_page;
pub use headless::{launch_browser, LaunchOptions};

/// 一次运行独占的浏览器会话
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    /// 浏览器进程由本程序启动（关闭时结束进程），否则只关闭页面
    owns_process: bool,
}

impl BrowserSession {
    pub(crate) fn new(browser: Browser, page: Page, handler: JoinHandle<()>, owns_process: bool) -> Self {
        Self {
            browser,
            page,
            handler,
            owns_process,
        }
    }

    /// 获取页面引用
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 释放会话
    ///
    /// 无论关闭是否成功，事件处理任务都会被终止
    pub async fn close(mut self) -> Result<()> {
        let result = if self.owns_process {
            debug!("关闭浏览器进程");
            match self.browser.close().await {
                Ok(_) => self.browser.wait().await.map(|_| ()).map_err(anyhow::Error::from),
                Err(e) => Err(e.into()),
            }
        } else {
            debug!("关闭页面（保留外部浏览器）");
            self.page.close().await.map_err(anyhow::Error::from)
        };
        self.handler.abort();
        info!("🔒 浏览器会话已释放");
        result
    }
}
