use std::path::PathBuf;

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::browser::BrowserSession;
use crate::error::BrowserError;

/// 浏览器启动参数
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// 调试模式下显示浏览器窗口
    pub debug: bool,
    /// 自定义浏览器可执行文件
    pub chrome_executable: Option<PathBuf>,
}

/// 启动浏览器并打开一个空白页面
pub async fn launch_browser(options: &LaunchOptions) -> Result<BrowserSession, BrowserError> {
    info!("🚀 启动浏览器 (调试模式: {})...", options.debug);

    let mut builder = BrowserConfig::builder();
    builder = if options.debug {
        builder.with_head()
    } else {
        builder.new_headless_mode().args(vec![
            "--disable-gpu",             // 无头模式禁用 GPU
            "--no-sandbox",              // 禁用沙盒，防止权限问题导致的崩溃
            "--disable-dev-shm-usage",   // 防止共享内存不足
        ])
    };
    if let Some(executable) = &options.chrome_executable {
        debug!("浏览器可执行文件: {}", executable.display());
        builder = builder.chrome_executable(executable);
    }

    let config = builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        BrowserError::ConfigurationFailed(e)
    })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        BrowserError::LaunchFailed { source: e }
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        BrowserError::PageCreationFailed { source: e }
    })?;

    Ok(BrowserSession::new(browser, page, handler_task, true))
}
