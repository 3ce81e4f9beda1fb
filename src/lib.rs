//! # Death Finder
//!
//! 用网页版风险计算器批量计算样本的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageDriver` - 导航、探测、输入、点击、读取文本
//! - `ChromeDriver` - 基于 chromiumoxide 的实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `SampleExtractor` - CSV 行 → 带校验标记的样本
//! - `ProgressTracker` - 进度条与剩余时间
//! - `ResultWriter` - 写出 JSON 结果
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个样本"的完整处理流程
//! - `FormDriver` - 状态机（打开 → 填写 → 等待 → 读取 → 关闭）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 一次运行的资源管理与调度
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::{connect_to_browser_and_page, launch_browser, BrowserSession, LaunchOptions};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{ChromeDriver, Locator, PageDriver, WaitCondition};
pub use models::{Calculator, ResultPair, ResultSet, Sample, ToggleValue};
pub use orchestrator::{App, RunSummary};
pub use workflow::{DriverState, FormDriver, FormSettings};
