//! 批量样本处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次完整运行的资源管理。
//!
//! ## 核心流程
//!
//! 1. **应用初始化**：解析计算器、确定输出路径（此时尚未启动浏览器）
//! 2. **样本抽取**：读取 CSV 并标记有效/无效样本
//! 3. **浏览器会话**：启动无头浏览器，或连接到调试端口上已运行的浏览器
//! 4. **表单驱动**：委托 `FormDriver` 逐个计算样本
//! 5. **结果输出**：写出与输入行一一对应的 JSON 数组
//!
//! 任一步失败都不会写出部分结果。

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::browser::{self, BrowserSession, LaunchOptions};
use crate::config::Config;
use crate::infrastructure::{ChromeDriver, PageDriver};
use crate::models::{load_calculator_file, Calculator, ResultSet, Sample};
use crate::services::{ProgressTracker, ResultWriter, SampleExtractor};
use crate::utils::logging::{log_startup, print_final_stats};
use crate::workflow::{FormDriver, FormSettings};

/// 应用主结构
pub struct App {
    config: Config,
    calculator: Calculator,
    input_path: PathBuf,
    writer: ResultWriter,
}

/// 一次运行的统计
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// 实际提交计算的样本数
    pub computed: usize,
    /// 无效而跳过的样本数
    pub skipped: usize,
    /// 结果文件路径
    pub output_path: PathBuf,
}

impl App {
    /// 初始化应用
    ///
    /// 计算器名称和输出路径在这里就会被检查，出错时不会启动浏览器
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let input_path = config.require_input()?.clone();
        let calculator = resolve_calculator(&config).await?;
        let writer = ResultWriter::for_target(&config.output_path)?;
        info!("💾 输出文件: {}", writer.output_path().display());

        Ok(Self {
            config,
            calculator,
            input_path,
            writer,
        })
    }

    pub fn calculator(&self) -> &Calculator {
        &self.calculator
    }

    pub fn output_path(&self) -> &Path {
        self.writer.output_path()
    }

    /// 运行应用主逻辑（真实浏览器）
    pub async fn run(&self) -> Result<RunSummary> {
        let samples = self.load_samples().await?;

        let session = self.open_session().await?;
        let driver = ChromeDriver::new(session);

        self.process_samples(&samples, driver).await
    }

    /// 使用给定的页面驱动运行
    pub async fn run_with_driver<D: PageDriver>(&self, driver: D) -> Result<RunSummary> {
        let samples = self.load_samples().await?;
        self.process_samples(&samples, driver).await
    }

    /// 加载样本
    async fn load_samples(&self) -> Result<Vec<Sample>> {
        info!("\n📁 正在读取样本: {}", self.input_path.display());
        let extractor = SampleExtractor::new(&self.calculator);
        Ok(extractor.extract(&self.input_path).await?)
    }

    /// 启动或连接浏览器
    async fn open_session(&self) -> Result<BrowserSession> {
        let session = match self.config.browser_debug_port {
            Some(port) => {
                info!("🔌 连接到调试端口 {} 上的浏览器", port);
                browser::connect_to_browser_and_page(port).await?
            }
            None => {
                let options = LaunchOptions {
                    debug: self.config.debug,
                    chrome_executable: self.config.chrome_executable.clone(),
                };
                browser::launch_browser(&options).await?
            }
        };
        Ok(session)
    }

    /// 驱动表单并写出结果
    async fn process_samples<D: PageDriver>(
        &self,
        samples: &[Sample],
        driver: D,
    ) -> Result<RunSummary> {
        let settings = FormSettings::from(&self.config);
        let mut form = FormDriver::new(driver, &self.calculator, settings);
        let mut progress = ProgressTracker::new(self.config.show_progress);

        let results: ResultSet = form.run(samples, &mut progress).await?;
        self.writer.write(&results).await?;

        let computed = samples.iter().filter(|s| s.is_valid()).count();
        let summary = RunSummary {
            computed,
            skipped: samples.len() - computed,
            output_path: self.writer.output_path().to_path_buf(),
        };
        print_final_stats(summary.computed, summary.skipped, &summary.output_path);
        Ok(summary)
    }
}

/// 自定义定义文件优先，其次按名称查找内置计算器
async fn resolve_calculator(config: &Config) -> Result<Calculator> {
    match &config.calculator_file {
        Some(path) => load_calculator_file(path).await,
        None => Ok(Calculator::builtin(&config.calculator)?),
    }
}
